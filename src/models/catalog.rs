//! Inputs for the reference entities: beans, equipment, profiles.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::EquipmentType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBeanInput {
    pub name: String,
    #[serde(default)]
    pub roaster: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Roast date of the first bag; today when absent.
    #[serde(default)]
    pub first_roast_date: Option<NaiveDate>,
}

impl NewBeanInput {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            roaster: None,
            origin: None,
            notes: None,
            first_roast_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeanEdit {
    pub name: String,
    #[serde(default)]
    pub roaster: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEquipmentInput {
    pub name: String,
    pub kind: EquipmentType,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentEdit {
    pub name: String,
    pub kind: EquipmentType,
    #[serde(default)]
    pub notes: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInput {
    pub name: String,
    /// Reference to an avatar image stored elsewhere.
    #[serde(default)]
    pub avatar_path: Option<String>,
}
