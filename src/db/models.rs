//! Diesel model structs for the journal entities.
//!
//! Every entity carries a `sync_id` (UUID v4), a `last_modified_at` timestamp
//! and an `is_deleted` flag. Timestamps are naive values holding UTC.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::schema;
use crate::utils::now_utc;

// Common drink types; `shot_records.drink_type` accepts any text.
pub mod drink_types {
    pub const ESPRESSO: &str = "Espresso";
    pub const RISTRETTO: &str = "Ristretto";
    pub const CORTADO: &str = "Cortado";
    pub const CAPPUCCINO: &str = "Cappuccino";
    pub const FLAT_WHITE: &str = "Flat White";
}

fn new_sync_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentType {
    Machine,
    Grinder,
    Tamper,
    PuckScreen,
    Other,
}

impl EquipmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentType::Machine => "Machine",
            EquipmentType::Grinder => "Grinder",
            EquipmentType::Tamper => "Tamper",
            EquipmentType::PuckScreen => "PuckScreen",
            EquipmentType::Other => "Other",
        }
    }

    /// Accessories are linked through `shot_equipment` rather than a dedicated column.
    pub fn is_accessory(&self) -> bool {
        !matches!(self, EquipmentType::Machine | EquipmentType::Grinder)
    }
}

impl fmt::Display for EquipmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Machine" => Ok(EquipmentType::Machine),
            "Grinder" => Ok(EquipmentType::Grinder),
            "Tamper" => Ok(EquipmentType::Tamper),
            "PuckScreen" => Ok(EquipmentType::PuckScreen),
            "Other" => Ok(EquipmentType::Other),
            other => Err(format!("unknown equipment type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::equipment)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Equipment {
    pub id: i64,
    pub sync_id: String,
    pub name: String,
    pub equipment_type: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

impl Equipment {
    /// Unknown type strings (written by an older client) read back as `Other`.
    pub fn kind(&self) -> EquipmentType {
        self.equipment_type.parse().unwrap_or(EquipmentType::Other)
    }
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::equipment)]
pub struct NewEquipment {
    pub sync_id: String,
    pub name: String,
    pub equipment_type: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

impl NewEquipment {
    pub fn new(name: impl Into<String>, kind: EquipmentType) -> Self {
        let now = now_utc();
        Self {
            sync_id: new_sync_id(),
            name: name.into(),
            equipment_type: kind.as_str().to_string(),
            notes: None,
            is_active: true,
            created_at: now,
            last_modified_at: now,
            is_deleted: false,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::equipment)]
#[diesel(treat_none_as_null = true)]
pub struct EquipmentChanges {
    pub name: String,
    pub equipment_type: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_modified_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::beans)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Bean {
    pub id: i64,
    pub sync_id: String,
    pub name: String,
    pub roaster: Option<String>,
    pub origin: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::beans)]
pub struct NewBean {
    pub sync_id: String,
    pub name: String,
    pub roaster: Option<String>,
    pub origin: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

impl NewBean {
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_utc();
        Self {
            sync_id: new_sync_id(),
            name: name.into(),
            roaster: None,
            origin: None,
            notes: None,
            is_active: true,
            created_at: now,
            last_modified_at: now,
            is_deleted: false,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::beans)]
#[diesel(treat_none_as_null = true)]
pub struct BeanChanges {
    pub name: String,
    pub roaster: Option<String>,
    pub origin: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_modified_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::bags)]
#[diesel(belongs_to(Bean))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Bag {
    pub id: i64,
    pub sync_id: String,
    pub bean_id: i64,
    pub roast_date: NaiveDate,
    pub notes: Option<String>,
    pub is_complete: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::bags)]
pub struct NewBag {
    pub sync_id: String,
    pub bean_id: i64,
    pub roast_date: NaiveDate,
    pub notes: Option<String>,
    pub is_complete: bool,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

impl NewBag {
    pub fn new(bean_id: i64, roast_date: NaiveDate) -> Self {
        let now = now_utc();
        Self {
            sync_id: new_sync_id(),
            bean_id,
            roast_date,
            notes: None,
            is_complete: false,
            is_active: true,
            created_at: now,
            last_modified_at: now,
            is_deleted: false,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::bags)]
#[diesel(treat_none_as_null = true)]
pub struct BagChanges {
    pub roast_date: NaiveDate,
    pub notes: Option<String>,
    pub is_active: bool,
    pub last_modified_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::user_profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserProfile {
    pub id: i64,
    pub sync_id: String,
    pub name: String,
    pub avatar_path: Option<String>,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::user_profiles)]
pub struct NewUserProfile {
    pub sync_id: String,
    pub name: String,
    pub avatar_path: Option<String>,
    pub created_at: NaiveDateTime,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

impl NewUserProfile {
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_utc();
        Self {
            sync_id: new_sync_id(),
            name: name.into(),
            avatar_path: None,
            created_at: now,
            last_modified_at: now,
            is_deleted: false,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::user_profiles)]
#[diesel(treat_none_as_null = true)]
pub struct ProfileChanges {
    pub name: String,
    pub avatar_path: Option<String>,
    pub last_modified_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Serialize, Deserialize)]
#[diesel(table_name = schema::shot_records)]
#[diesel(belongs_to(Bag))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ShotRecord {
    pub id: i64,
    pub sync_id: String,
    pub pulled_at: NaiveDateTime,
    pub bag_id: i64,
    pub machine_id: Option<i64>,
    pub grinder_id: Option<i64>,
    pub made_by_id: Option<i64>,
    pub made_for_id: Option<i64>,
    pub dose_in: f64,
    pub grind_setting: String,
    pub expected_time: f64,
    pub expected_output: f64,
    pub drink_type: String,
    pub actual_time: Option<f64>,
    pub actual_output: Option<f64>,
    pub preinfusion_time: Option<f64>,
    pub rating: Option<i32>,
    pub tasting_notes: Option<String>,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

#[derive(Debug, Clone, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::shot_records)]
pub struct NewShotRecord {
    pub sync_id: String,
    pub pulled_at: NaiveDateTime,
    pub bag_id: i64,
    pub machine_id: Option<i64>,
    pub grinder_id: Option<i64>,
    pub made_by_id: Option<i64>,
    pub made_for_id: Option<i64>,
    pub dose_in: f64,
    pub grind_setting: String,
    pub expected_time: f64,
    pub expected_output: f64,
    pub drink_type: String,
    pub actual_time: Option<f64>,
    pub actual_output: Option<f64>,
    pub preinfusion_time: Option<f64>,
    pub rating: Option<i32>,
    pub tasting_notes: Option<String>,
    pub last_modified_at: NaiveDateTime,
    pub is_deleted: bool,
}

impl NewShotRecord {
    /// Recipe-only shot pulled now; outcome fields start empty.
    pub fn new(
        bag_id: i64,
        dose_in: f64,
        grind_setting: impl Into<String>,
        expected_time: f64,
        expected_output: f64,
        drink_type: impl Into<String>,
    ) -> Self {
        let now = now_utc();
        Self {
            sync_id: new_sync_id(),
            pulled_at: now,
            bag_id,
            machine_id: None,
            grinder_id: None,
            made_by_id: None,
            made_for_id: None,
            dose_in,
            grind_setting: grind_setting.into(),
            expected_time,
            expected_output,
            drink_type: drink_type.into(),
            actual_time: None,
            actual_output: None,
            preinfusion_time: None,
            rating: None,
            tasting_notes: None,
            last_modified_at: now,
            is_deleted: false,
        }
    }
}

/// The editable subset of a shot. Setup fields (`pulled_at`, `dose_in`,
/// `grind_setting`, `expected_time`, `expected_output`) have no column here.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::shot_records)]
#[diesel(treat_none_as_null = true)]
pub struct ShotUpdate {
    pub bag_id: i64,
    pub made_by_id: Option<i64>,
    pub made_for_id: Option<i64>,
    pub drink_type: String,
    pub actual_time: Option<f64>,
    pub actual_output: Option<f64>,
    pub preinfusion_time: Option<f64>,
    pub rating: Option<i32>,
    pub tasting_notes: Option<String>,
    pub last_modified_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Insertable, Serialize, Deserialize)]
#[diesel(table_name = schema::shot_equipment)]
#[diesel(primary_key(shot_id, equipment_id))]
#[diesel(belongs_to(ShotRecord, foreign_key = shot_id))]
#[diesel(belongs_to(Equipment))]
pub struct ShotEquipment {
    pub shot_id: i64,
    pub equipment_id: i64,
}
