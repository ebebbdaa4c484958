use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::models::Bag;
use crate::models::ids::{BagId, BeanId};

/// A bag with its bean's name, as listed in pickers and bean detail pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagSummary {
    pub id: BagId,
    pub bean_id: BeanId,
    pub bean_name: String,
    pub roast_date: NaiveDate,
    pub notes: Option<String>,
    pub is_complete: bool,
}

impl BagSummary {
    pub fn days_since_roast(&self, today: NaiveDate) -> i64 {
        (today - self.roast_date).num_days()
    }

    /// Picker label, e.g. "Ethiopia Guji (roasted 2024-03-01)".
    pub fn label(&self) -> String {
        format!("{} (roasted {})", self.bean_name, self.roast_date)
    }
}

impl From<(Bag, String)> for BagSummary {
    fn from((bag, bean_name): (Bag, String)) -> Self {
        Self {
            id: BagId(bag.id),
            bean_id: BeanId(bag.bean_id),
            bean_name,
            roast_date: bag.roast_date,
            notes: bag.notes,
            is_complete: bag.is_complete,
        }
    }
}

/// Input for a new roast batch of an existing bean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBagInput {
    pub bean_id: BeanId,
    pub roast_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagEdit {
    pub roast_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_and_age_come_from_roast_date() {
        let bag = BagSummary {
            id: BagId(3),
            bean_id: BeanId(1),
            bean_name: "Ethiopia Guji".to_string(),
            roast_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            notes: None,
            is_complete: false,
        };
        assert_eq!(bag.label(), "Ethiopia Guji (roasted 2024-03-01)");
        assert_eq!(bag.days_since_roast(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()), 14);
    }
}
