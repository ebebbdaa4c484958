//! Contract with the external voice recognizer.
//!
//! The recognizer hands over a transcript plus an untyped parameter map;
//! [`CommandIntent::from_parameters`] turns that into one typed variant per
//! intent so the rest of the journal never reads string keys.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ValidationErrors;
use crate::models::rating::Rating;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCommandRequest {
    pub transcript: String,
    /// Recognizer confidence in 0.0..=1.0.
    pub confidence: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogShotParams {
    pub dose_in: Option<f64>,
    pub grind_setting: Option<String>,
    pub expected_time: Option<f64>,
    pub expected_output: Option<f64>,
    pub actual_time: Option<f64>,
    pub actual_output: Option<f64>,
    pub drink_type: Option<String>,
    pub rating: Option<Rating>,
    pub bean_name: Option<String>,
    pub made_for: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "parameters", rename_all = "snake_case")]
pub enum CommandIntent {
    LogShot(LogShotParams),
    RateLastShot {
        rating: Rating,
    },
    AddBean {
        name: String,
        roaster: Option<String>,
        origin: Option<String>,
    },
    AddBag {
        bean_name: String,
        roast_date: Option<NaiveDate>,
    },
    ShowHistory {
        bean_name: Option<String>,
    },
    Cancel,
    Unknown,
}

fn text(params: &BTreeMap<String, String>, key: &str) -> Option<String> {
    params
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required_text(errors: &mut ValidationErrors, params: &BTreeMap<String, String>, key: &str) -> String {
    text(params, key).unwrap_or_else(|| {
        errors.add(key, format!("{} is required", key));
        String::new()
    })
}

/// Accepts spoken forms like "18", "18.5g" or "27 seconds".
fn number(errors: &mut ValidationErrors, params: &BTreeMap<String, String>, key: &str) -> Option<f64> {
    let raw = text(params, key)?;
    let numeric: String = raw
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    match numeric.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
        _ => {
            errors.add(key, format!("{} is not a number: {}", key, raw));
            None
        }
    }
}

fn rating(errors: &mut ValidationErrors, params: &BTreeMap<String, String>, key: &str) -> Option<Rating> {
    let raw = text(params, key)?;
    match raw.parse::<i32>().ok().and_then(Rating::new) {
        Some(r) => Some(r),
        None => {
            errors.add(key, format!("{} must be between {} and {}", key, Rating::MIN, Rating::MAX));
            None
        }
    }
}

fn date(errors: &mut ValidationErrors, params: &BTreeMap<String, String>, key: &str) -> Option<NaiveDate> {
    let raw = text(params, key)?;
    match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(_) => {
            errors.add(key, format!("{} must be in YYYY-MM-DD format", key));
            None
        }
    }
}

impl CommandIntent {
    /// Convert the recognizer's intent name and parameter map.
    /// Unrecognised intent names become [`CommandIntent::Unknown`].
    pub fn from_parameters(intent: &str, params: &BTreeMap<String, String>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let parsed = match intent.trim().to_ascii_lowercase().as_str() {
            "log_shot" => CommandIntent::LogShot(LogShotParams {
                dose_in: number(&mut errors, params, "dose_in"),
                grind_setting: text(params, "grind_setting"),
                expected_time: number(&mut errors, params, "expected_time"),
                expected_output: number(&mut errors, params, "expected_output"),
                actual_time: number(&mut errors, params, "actual_time"),
                actual_output: number(&mut errors, params, "actual_output"),
                drink_type: text(params, "drink_type"),
                rating: rating(&mut errors, params, "rating"),
                bean_name: text(params, "bean_name"),
                made_for: text(params, "made_for"),
            }),
            "rate_last_shot" => match rating(&mut errors, params, "rating") {
                Some(r) => CommandIntent::RateLastShot { rating: r },
                None => {
                    if errors.field("rating").is_none() {
                        errors.add("rating", "rating is required");
                    }
                    CommandIntent::Unknown
                }
            },
            "add_bean" => CommandIntent::AddBean {
                name: required_text(&mut errors, params, "name"),
                roaster: text(params, "roaster"),
                origin: text(params, "origin"),
            },
            "add_bag" => CommandIntent::AddBag {
                bean_name: required_text(&mut errors, params, "bean_name"),
                roast_date: date(&mut errors, params, "roast_date"),
            },
            "show_history" => CommandIntent::ShowHistory {
                bean_name: text(params, "bean_name"),
            },
            "cancel" => CommandIntent::Cancel,
            _ => CommandIntent::Unknown,
        };
        if errors.is_empty() { Ok(parsed) } else { Err(errors) }
    }

    /// Intents that write to the journal.
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            CommandIntent::LogShot(_)
                | CommandIntent::RateLastShot { .. }
                | CommandIntent::AddBean { .. }
                | CommandIntent::AddBag { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            CommandIntent::LogShot(_) => "log_shot",
            CommandIntent::RateLastShot { .. } => "rate_last_shot",
            CommandIntent::AddBean { .. } => "add_bean",
            CommandIntent::AddBag { .. } => "add_bag",
            CommandIntent::ShowHistory { .. } => "show_history",
            CommandIntent::Cancel => "cancel",
            CommandIntent::Unknown => "unknown",
        }
    }
}

fn fmt_amount(v: f64) -> String {
    if v.fract() == 0.0 { format!("{:.0}", v) } else { format!("{:.1}", v) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceCommandResult {
    pub intent: CommandIntent,
    pub confirmation_text: String,
    pub requires_confirmation: bool,
    pub confidence: f32,
}

impl VoiceCommandResult {
    /// Mutating intents always need an explicit yes; read-only ones only
    /// when the recognizer was unsure.
    pub fn interpret(request: &VoiceCommandRequest, intent: CommandIntent, confidence_threshold: f32) -> Self {
        let requires_confirmation = match intent {
            CommandIntent::Unknown | CommandIntent::Cancel => false,
            ref i => i.is_mutating() || request.confidence < confidence_threshold,
        };
        let confirmation_text = confirmation_text(&intent, &request.transcript);
        Self {
            intent,
            confirmation_text,
            requires_confirmation,
            confidence: request.confidence,
        }
    }
}

fn confirmation_text(intent: &CommandIntent, transcript: &str) -> String {
    match intent {
        CommandIntent::LogShot(p) => {
            let mut parts = Vec::new();
            if let Some(d) = p.dose_in {
                parts.push(format!("{}g in", fmt_amount(d)));
            }
            if let Some(o) = p.actual_output.or(p.expected_output) {
                parts.push(format!("{}g out", fmt_amount(o)));
            }
            if let Some(t) = p.actual_time.or(p.expected_time) {
                parts.push(format!("{}s", fmt_amount(t)));
            }
            let drink = p.drink_type.as_deref().unwrap_or("shot");
            if parts.is_empty() {
                format!("Log a new {}?", drink)
            } else {
                format!("Log a new {}: {}?", drink, parts.join(", "))
            }
        }
        CommandIntent::RateLastShot { rating } => {
            format!("Rate your last shot {} out of {}?", rating.value(), Rating::MAX)
        }
        CommandIntent::AddBean { name, roaster, .. } => match roaster {
            Some(r) => format!("Add bean \"{}\" from {}?", name, r),
            None => format!("Add bean \"{}\"?", name),
        },
        CommandIntent::AddBag { bean_name, roast_date } => match roast_date {
            Some(d) => format!("Add a new bag of {} roasted {}?", bean_name, d),
            None => format!("Add a new bag of {}?", bean_name),
        },
        CommandIntent::ShowHistory { bean_name } => match bean_name {
            Some(b) => format!("Showing shot history for {}.", b),
            None => "Showing shot history.".to_string(),
        },
        CommandIntent::Cancel => "Cancelled.".to_string(),
        CommandIntent::Unknown => format!("Sorry, I didn't understand \"{}\".", transcript.trim()),
    }
}
