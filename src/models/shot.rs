//! Shot transfer shapes: the enriched read model and the write inputs.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::ids::{BagId, BeanId, EquipmentId, ProfileId, ShotId};

/// A shot as shown in history, with every referenced name resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotRecordDto {
    pub id: ShotId,
    pub sync_id: String,
    pub pulled_at: NaiveDateTime,
    pub bag_id: BagId,
    pub bag_roast_date: NaiveDate,
    pub bean_id: BeanId,
    pub bean_name: String,
    pub machine_id: Option<EquipmentId>,
    pub machine_name: Option<String>,
    pub grinder_id: Option<EquipmentId>,
    pub grinder_name: Option<String>,
    pub made_by_id: Option<ProfileId>,
    pub made_by_name: Option<String>,
    pub made_for_id: Option<ProfileId>,
    pub made_for_name: Option<String>,
    pub accessories: Vec<String>,
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
}

impl ShotRecordDto {
    /// Brew ratio (output / dose) of the pulled shot, if the output was recorded.
    pub fn brew_ratio(&self) -> Option<f64> {
        self.actual_output
            .filter(|_| self.dose_in > 0.0)
            .map(|out| out / self.dose_in)
    }

    /// Seconds the shot ran over (positive) or under (negative) the target time.
    pub fn time_deviation(&self) -> Option<f64> {
        self.actual_time.map(|t| t - self.expected_time)
    }

    pub fn days_since_roast(&self) -> i64 {
        (self.pulled_at.date() - self.bag_roast_date).num_days()
    }
}

/// Everything needed to log a shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewShotInput {
    pub bag_id: BagId,
    /// Defaults to now.
    #[serde(default)]
    pub pulled_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub machine_id: Option<EquipmentId>,
    #[serde(default)]
    pub grinder_id: Option<EquipmentId>,
    #[serde(default)]
    pub accessory_ids: Vec<EquipmentId>,
    #[serde(default)]
    pub made_by_id: Option<ProfileId>,
    #[serde(default)]
    pub made_for_id: Option<ProfileId>,
    pub dose_in: f64,
    pub grind_setting: String,
    pub expected_time: f64,
    pub expected_output: f64,
    pub drink_type: String,
    #[serde(default)]
    pub actual_time: Option<f64>,
    #[serde(default)]
    pub actual_output: Option<f64>,
    #[serde(default)]
    pub preinfusion_time: Option<f64>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub tasting_notes: Option<String>,
}

impl NewShotInput {
    pub fn recipe(
        bag_id: BagId,
        dose_in: f64,
        grind_setting: impl Into<String>,
        expected_time: f64,
        expected_output: f64,
        drink_type: impl Into<String>,
    ) -> Self {
        Self {
            bag_id,
            pulled_at: None,
            machine_id: None,
            grinder_id: None,
            accessory_ids: Vec::new(),
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
        }
    }
}

/// The fields of a logged shot that may still change. Recipe setup
/// (time pulled, dose, grind, targets) is fixed once logged and has no place here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotEdit {
    pub bag_id: BagId,
    #[serde(default)]
    pub made_by_id: Option<ProfileId>,
    #[serde(default)]
    pub made_for_id: Option<ProfileId>,
    pub drink_type: String,
    #[serde(default)]
    pub actual_time: Option<f64>,
    #[serde(default)]
    pub actual_output: Option<f64>,
    #[serde(default)]
    pub preinfusion_time: Option<f64>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub tasting_notes: Option<String>,
}

impl From<&ShotRecordDto> for ShotEdit {
    fn from(shot: &ShotRecordDto) -> Self {
        Self {
            bag_id: shot.bag_id,
            made_by_id: shot.made_by_id,
            made_for_id: shot.made_for_id,
            drink_type: shot.drink_type.clone(),
            actual_time: shot.actual_time,
            actual_output: shot.actual_output,
            preinfusion_time: shot.preinfusion_time,
            rating: shot.rating,
            tasting_notes: shot.tasting_notes.clone(),
        }
    }
}
