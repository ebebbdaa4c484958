pub mod config;
pub mod db {
    pub mod models;
    pub mod pool;
    pub mod scopes;
}
pub mod env_file;
pub mod error;
pub mod models {
    pub mod advice;
    pub mod bag;
    pub mod catalog;
    pub mod filter;
    pub mod ids;
    pub mod page;
    pub mod rating;
    pub mod shot;
    pub mod voice;
}
pub mod repos;
pub mod schema;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{JournalError, JournalResult};
pub use services::Journal;
