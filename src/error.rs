//! Error taxonomy shared by repositories and services.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field name -> every problem found with that field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_default().push(message.into());
    }

    /// Records an error for a required text field that is blank or too long.
    /// Limits apply to the trimmed value, which is what gets stored.
    pub fn check_text(&mut self, field: &str, value: &str, max_len: usize) {
        let value = value.trim();
        if value.is_empty() {
            self.add(field, format!("{} is required", field));
        } else if value.chars().count() > max_len {
            self.add(field, format!("{} must be at most {} characters", field, max_len));
        }
    }

    pub fn check_optional_text(&mut self, field: &str, value: Option<&str>, max_len: usize) {
        if let Some(v) = value
            && v.chars().count() > max_len
        {
            self.add(field, format!("{} must be at most {} characters", field, max_len));
        }
    }

    /// Records an error unless `0 < value <= max`.
    pub fn check_positive(&mut self, field: &str, value: f64, max: f64) {
        if !value.is_finite() || value <= 0.0 {
            self.add(field, format!("{} must be greater than 0", field));
        } else if value > max {
            self.add(field, format!("{} must be at most {}", field, max));
        }
    }

    pub fn check_optional_non_negative(&mut self, field: &str, value: Option<f64>, max: f64) {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                self.add(field, format!("{} must not be negative", field));
            } else if v > max {
                self.add(field, format!("{} must be at most {}", field, max));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), JournalError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(JournalError::Validation(self))
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = self
            .fields
            .iter()
            .map(|(field, msgs)| format!("{}: {}", field, msgs.join("; ")))
            .collect::<Vec<_>>();
        f.write_str(&parts.join(", "))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("migration error: {0}")]
    Migration(String),
    #[error("config error: {0}")]
    Config(String),
}

impl JournalError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        JournalError::NotFound { entity, id }
    }

    /// Single-field validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, message);
        JournalError::Validation(errors)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, JournalError::NotFound { .. })
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            JournalError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

pub type JournalResult<T> = Result<T, JournalError>;
