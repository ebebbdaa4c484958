//! Services validate input and own the connection checkout; one pooled
//! connection per logical operation.

pub mod advice;
pub mod bags;
pub mod beans;
pub mod equipment;
pub mod fake_data;
pub mod profiles;
pub mod ratings;
pub mod shots;
pub mod voice;

use crate::config::Config;
use crate::db::pool::{self, DbPool};
use crate::error::JournalResult;

/// Every service over one shared pool.
#[derive(Clone)]
pub struct Journal {
    pub pool: DbPool,
    pub equipment: equipment::EquipmentService,
    pub beans: beans::BeanService,
    pub bags: bags::BagService,
    pub profiles: profiles::ProfileService,
    pub shots: shots::ShotService,
    pub ratings: ratings::RatingService,
    pub advice: advice::AdviceService,
    pub voice: voice::VoiceInterpreter,
}

impl Journal {
    pub fn new(pool: DbPool, cfg: &Config) -> Self {
        Self {
            equipment: equipment::EquipmentService::new(pool.clone()),
            beans: beans::BeanService::new(pool.clone()),
            bags: bags::BagService::new(pool.clone()),
            profiles: profiles::ProfileService::new(pool.clone()),
            shots: shots::ShotService::new(pool.clone()),
            ratings: ratings::RatingService::new(pool.clone()),
            advice: advice::AdviceService::new(pool.clone()),
            voice: voice::VoiceInterpreter::new(cfg.voice_confidence_threshold),
            pool,
        }
    }

    /// Open (and migrate) the store named by the config.
    pub fn open(cfg: &Config) -> JournalResult<Self> {
        let pool = pool::open(&cfg.database_url, cfg.pool_size)?;
        Ok(Self::new(pool, cfg))
    }

    pub fn in_memory() -> JournalResult<Self> {
        let pool = pool::open_in_memory()?;
        Ok(Self::new(pool, &Config::default()))
    }
}
