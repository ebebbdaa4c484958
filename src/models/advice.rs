//! Contract with the external shot-advice provider.
//!
//! The journal only assembles [`AdviceRequest`] and parses [`AdviceResponse`];
//! talking to the provider happens elsewhere.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::shot::ShotRecordDto;

/// Upper bound on past shots sent along with a request.
pub const MAX_HISTORY_SHOTS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeanContext {
    pub name: String,
    pub roaster: Option<String>,
    pub origin: Option<String>,
    pub roast_date: NaiveDate,
    pub days_since_roast: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceRequest {
    pub current_shot: ShotRecordDto,
    /// Other shots from the same bag, best rated first.
    pub history: Vec<ShotRecordDto>,
    pub bean: BeanContext,
    pub machine_name: Option<String>,
    pub grinder_name: Option<String>,
    pub accessories: Vec<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentParameter {
    Dose,
    GrindSetting,
    ShotTime,
    Output,
    Preinfusion,
    Temperature,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentDirection {
    Increase,
    Decrease,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotAdjustment {
    pub parameter: AdjustmentParameter,
    pub direction: AdjustmentDirection,
    /// Free-form amount, e.g. "0.5 g" or "two clicks finer".
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub rationale: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub success: bool,
    #[serde(default)]
    pub advice: Option<String>,
    #[serde(default)]
    pub adjustments: Vec<ShotAdjustment>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl AdviceResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            advice: None,
            adjustments: Vec::new(),
            error_message: Some(message.into()),
        }
    }

    /// Parse a provider payload; errors name the offending JSON path.
    pub fn from_json(payload: &str) -> Result<Self, String> {
        let de = &mut serde_json::Deserializer::from_str(payload);
        serde_path_to_error::deserialize(de).map_err(|e| format!("invalid advice response at `{}`: {}", e.path(), e.inner()))
    }

    pub fn has_content(&self) -> bool {
        self.advice.as_deref().is_some_and(|a| !a.trim().is_empty()) || !self.adjustments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_structured_adjustments() {
        let json = r#"{
            "success": true,
            "advice": "Grind a little finer.",
            "adjustments": [
                {"parameter": "grind_setting", "direction": "decrease", "amount": "1 step"},
                {"parameter": "dose", "direction": "keep"}
            ]
        }"#;
        let resp = AdviceResponse::from_json(json).expect("parse");
        assert!(resp.success);
        assert!(resp.has_content());
        assert_eq!(resp.adjustments.len(), 2);
        assert_eq!(resp.adjustments[0].parameter, AdjustmentParameter::GrindSetting);
        assert_eq!(resp.adjustments[1].amount, None);
    }

    #[test]
    fn parse_error_names_the_path() {
        let json = r#"{"success": true, "adjustments": [{"parameter": "pressure", "direction": "increase"}]}"#;
        let err = AdviceResponse::from_json(json).unwrap_err();
        assert!(err.contains("adjustments[0].parameter"), "{}", err);
    }

    #[test]
    fn failure_has_no_content() {
        let resp = AdviceResponse::failure("provider unavailable");
        assert!(!resp.success);
        assert!(!resp.has_content());
        assert_eq!(resp.error_message.as_deref(), Some("provider unavailable"));
    }
}
