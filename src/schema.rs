//! Table definitions. Ids are `BigInt` so every key maps to `i64`.

diesel::table! {
    bags (id) {
        id -> BigInt,
        sync_id -> Text,
        bean_id -> BigInt,
        roast_date -> Date,
        notes -> Nullable<Text>,
        is_complete -> Bool,
        is_active -> Bool,
        created_at -> Timestamp,
        last_modified_at -> Timestamp,
        is_deleted -> Bool,
    }
}

diesel::table! {
    beans (id) {
        id -> BigInt,
        sync_id -> Text,
        name -> Text,
        roaster -> Nullable<Text>,
        origin -> Nullable<Text>,
        notes -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamp,
        last_modified_at -> Timestamp,
        is_deleted -> Bool,
    }
}

diesel::table! {
    equipment (id) {
        id -> BigInt,
        sync_id -> Text,
        name -> Text,
        equipment_type -> Text,
        notes -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamp,
        last_modified_at -> Timestamp,
        is_deleted -> Bool,
    }
}

diesel::table! {
    shot_equipment (shot_id, equipment_id) {
        shot_id -> BigInt,
        equipment_id -> BigInt,
    }
}

diesel::table! {
    shot_records (id) {
        id -> BigInt,
        sync_id -> Text,
        pulled_at -> Timestamp,
        bag_id -> BigInt,
        machine_id -> Nullable<BigInt>,
        grinder_id -> Nullable<BigInt>,
        made_by_id -> Nullable<BigInt>,
        made_for_id -> Nullable<BigInt>,
        dose_in -> Double,
        grind_setting -> Text,
        expected_time -> Double,
        expected_output -> Double,
        drink_type -> Text,
        actual_time -> Nullable<Double>,
        actual_output -> Nullable<Double>,
        preinfusion_time -> Nullable<Double>,
        rating -> Nullable<Integer>,
        tasting_notes -> Nullable<Text>,
        last_modified_at -> Timestamp,
        is_deleted -> Bool,
    }
}

diesel::table! {
    user_profiles (id) {
        id -> BigInt,
        sync_id -> Text,
        name -> Text,
        avatar_path -> Nullable<Text>,
        created_at -> Timestamp,
        last_modified_at -> Timestamp,
        is_deleted -> Bool,
    }
}

diesel::joinable!(bags -> beans (bean_id));
diesel::joinable!(shot_equipment -> equipment (equipment_id));
diesel::joinable!(shot_equipment -> shot_records (shot_id));
diesel::joinable!(shot_records -> bags (bag_id));

diesel::allow_tables_to_appear_in_same_query!(
    bags,
    beans,
    equipment,
    shot_equipment,
    shot_records,
    user_profiles,
);
