//! Shot history queries.
//!
//! Page queries join the owning bag and bean, so the bean name and roast date
//! come back with the shot. Optional names (equipment, profiles, accessories)
//! are resolved afterwards with one `IN (...)` query per table for the whole
//! page.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::{BTreeSet, HashMap};

use crate::db::models::{NewShotRecord, ShotEquipment, ShotRecord, ShotUpdate};
use crate::db::scopes;
use crate::models::filter::ShotFilterCriteria;
use crate::models::ids::{BagId, BeanId, EquipmentId, ProfileId, ShotId};
use crate::models::shot::ShotRecordDto;
use crate::repos::{equipment as equipment_repo, profiles as profile_repo};
use crate::schema::{bags, beans, equipment, shot_equipment, shot_records};
use crate::utils::page_offset;

/// A shot plus its bag roast date, bean id and bean name.
pub type ShotRow = (ShotRecord, NaiveDate, i64, String);

/// Live shots joined to their bag and bean, boxed for further filtering.
macro_rules! live_shot_rows {
    () => {
        shot_records::table
            .inner_join(bags::table.inner_join(beans::table))
            .filter(scopes::shots::not_deleted())
            .select((ShotRecord::as_select(), bags::roast_date, beans::id, beans::name))
            .into_boxed()
    };
}

/// Narrow a boxed shot query (joined to `bags`) by the active filter dimensions.
macro_rules! apply_criteria {
    ($query:expr, $criteria:expr) => {{
        let mut query = $query;
        let criteria: &ShotFilterCriteria = $criteria;
        if !criteria.bean_ids().is_empty() {
            query = query.filter(bags::bean_id.eq_any(criteria.bean_id_values()));
        }
        if !criteria.made_for_ids().is_empty() {
            query = query.filter(shot_records::made_for_id.eq_any(criteria.made_for_id_values()));
        }
        if !criteria.ratings().is_empty() {
            query = query.filter(shot_records::rating.eq_any(criteria.rating_values()));
        }
        query
    }};
}

pub fn insert(conn: &mut SqliteConnection, row: &NewShotRecord, accessory_ids: &[i64]) -> QueryResult<ShotRecord> {
    conn.transaction(|conn| {
        let shot: ShotRecord = diesel::insert_into(shot_records::table)
            .values(row)
            .returning(ShotRecord::as_returning())
            .get_result(conn)?;
        let unique: BTreeSet<i64> = accessory_ids.iter().copied().collect();
        if !unique.is_empty() {
            let links = unique
                .into_iter()
                .map(|equipment_id| ShotEquipment {
                    shot_id: shot.id,
                    equipment_id,
                })
                .collect::<Vec<_>>();
            diesel::insert_into(shot_equipment::table).values(&links).execute(conn)?;
        }
        Ok(shot)
    })
}

pub fn get(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<ShotRecord>> {
    scopes::shots::live()
        .filter(shot_records::id.eq(id))
        .select(ShotRecord::as_select())
        .first(conn)
        .optional()
}

pub fn get_dto(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<ShotRecordDto>> {
    let rows: Vec<ShotRow> = live_shot_rows!().filter(shot_records::id.eq(id)).limit(1).load(conn)?;
    Ok(enrich(conn, rows)?.into_iter().next())
}

pub fn most_recent(conn: &mut SqliteConnection) -> QueryResult<Option<ShotRecordDto>> {
    let rows: Vec<ShotRow> = live_shot_rows!()
        .order((shot_records::pulled_at.desc(), shot_records::id.desc()))
        .limit(1)
        .load(conn)?;
    Ok(enrich(conn, rows)?.into_iter().next())
}

pub fn history(conn: &mut SqliteConnection, page_index: i64, page_size: i64) -> QueryResult<Vec<ShotRecordDto>> {
    filtered_history(conn, &ShotFilterCriteria::none(), page_index, page_size)
}

/// One zero-based page, newest first.
pub fn filtered_history(
    conn: &mut SqliteConnection,
    criteria: &ShotFilterCriteria,
    page_index: i64,
    page_size: i64,
) -> QueryResult<Vec<ShotRecordDto>> {
    if page_size <= 0 || page_index < 0 {
        return Ok(Vec::new());
    }
    let rows: Vec<ShotRow> = apply_criteria!(live_shot_rows!(), criteria)
        .order((shot_records::pulled_at.desc(), shot_records::id.desc()))
        .limit(page_size)
        .offset(page_offset(page_index, page_size))
        .load(conn)?;
    enrich(conn, rows)
}

pub fn total_count(conn: &mut SqliteConnection) -> QueryResult<i64> {
    scopes::shots::live().count().get_result(conn)
}

pub fn filtered_count(conn: &mut SqliteConnection, criteria: &ShotFilterCriteria) -> QueryResult<i64> {
    if !criteria.has_filters() {
        return total_count(conn);
    }
    let query = shot_records::table
        .inner_join(bags::table)
        .filter(scopes::shots::not_deleted())
        .into_boxed();
    apply_criteria!(query, criteria).count().get_result(conn)
}

/// Other shots from a bag, best rated first (unrated last), then newest.
pub fn ranked_for_bag(
    conn: &mut SqliteConnection,
    bag_id: i64,
    exclude_shot: Option<i64>,
    limit: i64,
) -> QueryResult<Vec<ShotRecordDto>> {
    let mut query = live_shot_rows!().filter(shot_records::bag_id.eq(bag_id));
    if let Some(id) = exclude_shot {
        query = query.filter(shot_records::id.ne(id));
    }
    // SQLite sorts NULL below every value, so DESC leaves unrated shots at the end.
    let rows: Vec<ShotRow> = query
        .order((
            shot_records::rating.desc(),
            shot_records::pulled_at.desc(),
            shot_records::id.desc(),
        ))
        .limit(limit.max(0))
        .load(conn)?;
    enrich(conn, rows)
}

/// Writes only the editable columns; see [`ShotUpdate`].
pub fn update(conn: &mut SqliteConnection, id: i64, changes: &ShotUpdate) -> QueryResult<usize> {
    diesel::update(shot_records::table.filter(shot_records::id.eq(id)).filter(scopes::shots::not_deleted()))
        .set(changes)
        .execute(conn)
}

pub fn set_rating(conn: &mut SqliteConnection, id: i64, rating: Option<i32>, now: NaiveDateTime) -> QueryResult<usize> {
    diesel::update(shot_records::table.filter(shot_records::id.eq(id)).filter(scopes::shots::not_deleted()))
        .set((shot_records::rating.eq(rating), shot_records::last_modified_at.eq(now)))
        .execute(conn)
}

pub fn soft_delete(conn: &mut SqliteConnection, id: i64, now: NaiveDateTime) -> QueryResult<usize> {
    diesel::update(shot_records::table.filter(shot_records::id.eq(id)).filter(scopes::shots::not_deleted()))
        .set((shot_records::is_deleted.eq(true), shot_records::last_modified_at.eq(now)))
        .execute(conn)
}

/// `(bag_id, rating, count)` over live shots of the given bags, one grouped query.
pub fn rating_counts_for_bags(conn: &mut SqliteConnection, bag_ids: &[i64]) -> QueryResult<Vec<(i64, Option<i32>, i64)>> {
    if bag_ids.is_empty() {
        return Ok(Vec::new());
    }
    shot_records::table
        .filter(scopes::shots::not_deleted())
        .filter(shot_records::bag_id.eq_any(bag_ids.to_vec()))
        .group_by((shot_records::bag_id, shot_records::rating))
        .select((shot_records::bag_id, shot_records::rating, count_star()))
        .load(conn)
}

pub fn rating_counts_for_bag(conn: &mut SqliteConnection, bag_id: i64) -> QueryResult<Vec<(Option<i32>, i64)>> {
    shot_records::table
        .filter(scopes::shots::not_deleted())
        .filter(shot_records::bag_id.eq(bag_id))
        .group_by(shot_records::rating)
        .select((shot_records::rating, count_star()))
        .load(conn)
}

/// `(rating, count)` over live shots in every live bag of a bean.
pub fn rating_counts_for_bean(conn: &mut SqliteConnection, bean_id: i64) -> QueryResult<Vec<(Option<i32>, i64)>> {
    shot_records::table
        .inner_join(bags::table)
        .filter(bags::bean_id.eq(bean_id))
        .filter(scopes::shots::not_deleted())
        .filter(scopes::bags::not_deleted())
        .group_by(shot_records::rating)
        .select((shot_records::rating, count_star()))
        .load(conn)
}

/// Accessory names per shot, alphabetical.
fn accessory_names(conn: &mut SqliteConnection, shot_ids: &[i64]) -> QueryResult<HashMap<i64, Vec<String>>> {
    if shot_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, String)> = shot_equipment::table
        .inner_join(equipment::table)
        .filter(shot_equipment::shot_id.eq_any(shot_ids.to_vec()))
        .select((shot_equipment::shot_id, equipment::name))
        .order((shot_equipment::shot_id.asc(), equipment::name.asc()))
        .load(conn)?;
    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    for (shot_id, name) in rows {
        map.entry(shot_id).or_default().push(name);
    }
    Ok(map)
}

/// Resolve optional names for a batch of rows with a fixed number of queries.
fn enrich(conn: &mut SqliteConnection, rows: Vec<ShotRow>) -> QueryResult<Vec<ShotRecordDto>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let equipment_ids = rows
        .iter()
        .flat_map(|(s, ..)| [s.machine_id, s.grinder_id])
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let profile_ids = rows
        .iter()
        .flat_map(|(s, ..)| [s.made_by_id, s.made_for_id])
        .flatten()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect::<Vec<_>>();
    let shot_ids = rows.iter().map(|(s, ..)| s.id).collect::<Vec<_>>();

    let equipment_names = equipment_repo::names_by_ids(conn, &equipment_ids)?;
    let profile_names = profile_repo::names_by_ids(conn, &profile_ids)?;
    let mut accessories = accessory_names(conn, &shot_ids)?;

    let lookup = |map: &HashMap<i64, String>, id: Option<i64>| id.and_then(|id| map.get(&id).cloned());

    Ok(rows
        .into_iter()
        .map(|(shot, roast_date, bean_id, bean_name)| ShotRecordDto {
            id: ShotId(shot.id),
            sync_id: shot.sync_id,
            pulled_at: shot.pulled_at,
            bag_id: BagId(shot.bag_id),
            bag_roast_date: roast_date,
            bean_id: BeanId(bean_id),
            bean_name,
            machine_id: shot.machine_id.map(EquipmentId),
            machine_name: lookup(&equipment_names, shot.machine_id),
            grinder_id: shot.grinder_id.map(EquipmentId),
            grinder_name: lookup(&equipment_names, shot.grinder_id),
            made_by_id: shot.made_by_id.map(ProfileId),
            made_by_name: lookup(&profile_names, shot.made_by_id),
            made_for_id: shot.made_for_id.map(ProfileId),
            made_for_name: lookup(&profile_names, shot.made_for_id),
            accessories: accessories.remove(&shot.id).unwrap_or_default(),
            dose_in: shot.dose_in,
            grind_setting: shot.grind_setting,
            expected_time: shot.expected_time,
            expected_output: shot.expected_output,
            drink_type: shot.drink_type,
            actual_time: shot.actual_time,
            actual_output: shot.actual_output,
            preinfusion_time: shot.preinfusion_time,
            rating: shot.rating,
            tasting_notes: shot.tasting_notes,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{EquipmentType, NewBag, NewBean, NewEquipment, NewUserProfile};
    use crate::models::rating::Rating;
    use crate::repos::{bags as bag_repo, beans as bean_repo, test_conn};
    use crate::utils::now_utc;
    use chrono::{Duration, NaiveDate};

    fn base_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn new_bag(conn: &mut SqliteConnection, bean: &str) -> (i64, i64) {
        let roast = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap();
        let (bean, bag) = bean_repo::insert_with_first_bag(conn, &NewBean::new(bean), roast).unwrap();
        (bean.id, bag.id)
    }

    fn shot_at(bag_id: i64, minutes: i64, dose: f64, rating: Option<i32>) -> NewShotRecord {
        let mut row = NewShotRecord::new(bag_id, dose, "2.5", 30.0, 36.0, "Espresso");
        row.pulled_at = base_time() + Duration::minutes(minutes);
        row.rating = rating;
        row
    }

    #[test]
    fn history_pages_newest_first() {
        let mut conn = test_conn();
        let (_, bag) = new_bag(&mut conn, "Guji");
        for (i, dose) in (18..=32).enumerate() {
            insert(&mut conn, &shot_at(bag, i as i64, dose as f64, None), &[]).unwrap();
        }
        assert_eq!(total_count(&mut conn).unwrap(), 15);

        let first = history(&mut conn, 0, 10).unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first.iter().map(|s| s.dose_in as i64).collect::<Vec<_>>(), (23..=32).rev().collect::<Vec<_>>());
        assert!(first.windows(2).all(|w| w[0].pulled_at >= w[1].pulled_at));

        let second = history(&mut conn, 1, 10).unwrap();
        assert_eq!(second.len(), 5);
        assert_eq!(second.iter().map(|s| s.dose_in as i64).collect::<Vec<_>>(), (18..=22).rev().collect::<Vec<_>>());

        assert!(history(&mut conn, 2, 10).unwrap().is_empty());
        assert!(history(&mut conn, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn deleted_shots_are_invisible_everywhere() {
        let mut conn = test_conn();
        let (_, bag) = new_bag(&mut conn, "Guji");
        let kept = insert(&mut conn, &shot_at(bag, 0, 18.0, Some(3)), &[]).unwrap();
        let newer = insert(&mut conn, &shot_at(bag, 10, 19.0, Some(5)), &[]).unwrap();
        soft_delete(&mut conn, newer.id, now_utc()).unwrap();

        assert_eq!(total_count(&mut conn).unwrap(), 1);
        assert_eq!(most_recent(&mut conn).unwrap().map(|s| s.id.0), Some(kept.id));
        assert_eq!(history(&mut conn, 0, 10).unwrap().len(), 1);
        assert!(get(&mut conn, newer.id).unwrap().is_none());
        assert!(get_dto(&mut conn, newer.id).unwrap().is_none());
        assert_eq!(rating_counts_for_bag(&mut conn, bag).unwrap(), vec![(Some(3), 1)]);

        let five_stars = ShotFilterCriteria::builder().rating(Rating::new(5).unwrap()).build();
        assert_eq!(filtered_count(&mut conn, &five_stars).unwrap(), 0);
        assert!(filtered_history(&mut conn, &five_stars, 0, 10).unwrap().is_empty());
    }

    #[test]
    fn most_recent_is_none_without_shots() {
        let mut conn = test_conn();
        assert!(most_recent(&mut conn).unwrap().is_none());
        assert_eq!(total_count(&mut conn).unwrap(), 0);
    }

    #[test]
    fn update_leaves_setup_fields_alone() {
        let mut conn = test_conn();
        let (_, bag) = new_bag(&mut conn, "Guji");
        let shot = insert(&mut conn, &shot_at(bag, 0, 18.0, None), &[]).unwrap();

        let changes = ShotUpdate {
            bag_id: bag,
            made_by_id: None,
            made_for_id: None,
            drink_type: "Cortado".to_string(),
            actual_time: Some(27.5),
            actual_output: Some(38.0),
            preinfusion_time: None,
            rating: Some(4),
            tasting_notes: Some("bright".to_string()),
            last_modified_at: now_utc(),
        };
        assert_eq!(update(&mut conn, shot.id, &changes).unwrap(), 1);

        let after = get(&mut conn, shot.id).unwrap().unwrap();
        assert_eq!(after.dose_in, 18.0);
        assert_eq!(after.expected_time, 30.0);
        assert_eq!(after.expected_output, 36.0);
        assert_eq!(after.grind_setting, "2.5");
        assert_eq!(after.pulled_at, shot.pulled_at);
        assert_eq!(after.actual_time, Some(27.5));
        assert_eq!(after.rating, Some(4));
        assert_eq!(after.drink_type, "Cortado");

        assert_eq!(update(&mut conn, 9999, &changes).unwrap(), 0);
    }

    #[test]
    fn filters_combine_across_dimensions() {
        let mut conn = test_conn();
        let (guji, guji_bag) = new_bag(&mut conn, "Guji");
        let (huila, huila_bag) = new_bag(&mut conn, "Huila");
        let (_, other_bag) = new_bag(&mut conn, "Other");
        let ana = profile_repo::insert(&mut conn, &NewUserProfile::new("Ana")).unwrap();

        let mut for_ana = shot_at(guji_bag, 0, 18.0, Some(5));
        for_ana.made_for_id = Some(ana.id);
        insert(&mut conn, &for_ana, &[]).unwrap();
        insert(&mut conn, &shot_at(guji_bag, 1, 18.0, Some(3)), &[]).unwrap();
        insert(&mut conn, &shot_at(huila_bag, 2, 18.0, Some(5)), &[]).unwrap();
        insert(&mut conn, &shot_at(other_bag, 3, 18.0, None), &[]).unwrap();

        let beans = ShotFilterCriteria::builder().bean(BeanId(guji)).bean(BeanId(huila)).build();
        assert_eq!(filtered_count(&mut conn, &beans).unwrap(), 3);

        let beans_and_five = ShotFilterCriteria::builder()
            .bean(BeanId(guji))
            .bean(BeanId(huila))
            .rating(Rating::new(5).unwrap())
            .build();
        let rows = filtered_history(&mut conn, &beans_and_five, 0, 10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bean_name, "Huila");

        let for_ana_only = ShotFilterCriteria::builder().made_for(ProfileId(ana.id)).build();
        let rows = filtered_history(&mut conn, &for_ana_only, 0, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].made_for_name.as_deref(), Some("Ana"));

        assert_eq!(filtered_count(&mut conn, &ShotFilterCriteria::none()).unwrap(), 4);
    }

    #[test]
    fn rows_are_enriched_with_names() {
        let mut conn = test_conn();
        let (_, bag) = new_bag(&mut conn, "Guji");
        let machine = equipment_repo::insert(&mut conn, &NewEquipment::new("Linea Mini", EquipmentType::Machine)).unwrap();
        let grinder = equipment_repo::insert(&mut conn, &NewEquipment::new("Niche", EquipmentType::Grinder)).unwrap();
        let tamper = equipment_repo::insert(&mut conn, &NewEquipment::new("Tamper", EquipmentType::Tamper)).unwrap();
        let screen = equipment_repo::insert(&mut conn, &NewEquipment::new("Screen", EquipmentType::PuckScreen)).unwrap();
        let ben = profile_repo::insert(&mut conn, &NewUserProfile::new("Ben")).unwrap();

        let mut row = shot_at(bag, 0, 18.0, Some(4));
        row.machine_id = Some(machine.id);
        row.grinder_id = Some(grinder.id);
        row.made_by_id = Some(ben.id);
        let shot = insert(&mut conn, &row, &[tamper.id, screen.id, tamper.id]).unwrap();

        let dto = get_dto(&mut conn, shot.id).unwrap().unwrap();
        assert_eq!(dto.bean_name, "Guji");
        assert_eq!(dto.bag_roast_date, NaiveDate::from_ymd_opt(2024, 4, 20).unwrap());
        assert_eq!(dto.machine_name.as_deref(), Some("Linea Mini"));
        assert_eq!(dto.grinder_name.as_deref(), Some("Niche"));
        assert_eq!(dto.made_by_name.as_deref(), Some("Ben"));
        assert_eq!(dto.made_for_name, None);
        assert_eq!(dto.accessories, vec!["Screen".to_string(), "Tamper".to_string()]);
    }

    #[test]
    fn ranked_for_bag_puts_best_first_and_unrated_last() {
        let mut conn = test_conn();
        let (_, bag) = new_bag(&mut conn, "Guji");
        let current = insert(&mut conn, &shot_at(bag, 0, 18.0, Some(2)), &[]).unwrap();
        insert(&mut conn, &shot_at(bag, 1, 18.5, None), &[]).unwrap();
        insert(&mut conn, &shot_at(bag, 2, 19.0, Some(5)), &[]).unwrap();
        insert(&mut conn, &shot_at(bag, 3, 19.5, Some(3)), &[]).unwrap();

        let ranked = ranked_for_bag(&mut conn, bag, Some(current.id), 10).unwrap();
        assert_eq!(ranked.iter().map(|s| s.rating).collect::<Vec<_>>(), vec![Some(5), Some(3), None]);
        assert_eq!(ranked_for_bag(&mut conn, bag, None, 2).unwrap().len(), 2);
    }

    #[test]
    fn grouped_counts_cover_all_requested_bags() {
        let mut conn = test_conn();
        let (bean, bag_a) = new_bag(&mut conn, "Guji");
        let bag_b = bag_repo::insert(&mut conn, &NewBag::new(bean, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()))
            .unwrap()
            .id;
        insert(&mut conn, &shot_at(bag_a, 0, 18.0, Some(4)), &[]).unwrap();
        insert(&mut conn, &shot_at(bag_a, 1, 18.0, Some(4)), &[]).unwrap();
        insert(&mut conn, &shot_at(bag_b, 2, 18.0, None), &[]).unwrap();

        let mut counts = rating_counts_for_bags(&mut conn, &[bag_a, bag_b]).unwrap();
        counts.sort();
        assert_eq!(counts, vec![(bag_a, Some(4), 2), (bag_b, None, 1)]);

        let mut bean_counts = rating_counts_for_bean(&mut conn, bean).unwrap();
        bean_counts.sort();
        assert_eq!(bean_counts, vec![(None, 1), (Some(4), 2)]);
        assert!(rating_counts_for_bags(&mut conn, &[]).unwrap().is_empty());
    }
}
