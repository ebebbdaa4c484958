//! Runtime configuration read from the process environment.

use crate::error::JournalError;

pub const DEFAULT_DATABASE_URL: &str = "espresso-journal.db";
pub const DEFAULT_POOL_SIZE: u32 = 4;
pub const DEFAULT_HISTORY_PAGE_SIZE: i64 = 20;
pub const DEFAULT_VOICE_CONFIDENCE_THRESHOLD: f32 = 0.75;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// SQLite file path, or `:memory:`.
    pub database_url: String,
    pub pool_size: u32,
    pub history_page_size: i64,
    /// Fill an empty journal with demo data on startup.
    pub seed_demo_data: bool,
    /// Recognizer confidence below which read-only voice commands are confirmed too.
    pub voice_confidence_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            history_page_size: DEFAULT_HISTORY_PAGE_SIZE,
            seed_demo_data: false,
            voice_confidence_threshold: DEFAULT_VOICE_CONFIDENCE_THRESHOLD,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, JournalError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, JournalError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Config::default();

        let database_url = get("DATABASE_URL").unwrap_or(defaults.database_url);

        let pool_size = match get("DB_POOL_SIZE") {
            Some(s) => match s.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(JournalError::Config("DB_POOL_SIZE must be a positive integer".to_string())),
            },
            None => defaults.pool_size,
        };

        let history_page_size = match get("HISTORY_PAGE_SIZE") {
            Some(s) => match s.parse::<i64>() {
                Ok(n) if n > 0 => n,
                _ => return Err(JournalError::Config("HISTORY_PAGE_SIZE must be a positive integer".to_string())),
            },
            None => defaults.history_page_size,
        };

        let seed_demo_data = get("SEED_DEMO_DATA")
            .map(|s| matches!(s.as_str(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(defaults.seed_demo_data);

        let voice_confidence_threshold = match get("VOICE_CONFIDENCE_THRESHOLD") {
            Some(s) => match s.parse::<f32>() {
                Ok(v) if (0.0..=1.0).contains(&v) => v,
                _ => {
                    return Err(JournalError::Config(
                        "VOICE_CONFIDENCE_THRESHOLD must be a number between 0 and 1".to_string(),
                    ));
                }
            },
            None => defaults.voice_confidence_threshold,
        };

        Ok(Config {
            database_url,
            pool_size,
            history_page_size,
            seed_demo_data,
            voice_confidence_threshold,
        })
    }
}
