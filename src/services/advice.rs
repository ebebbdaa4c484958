use log::debug;

use crate::db::pool::{DbConn, DbPool};
use crate::error::{JournalError, JournalResult};
use crate::models::advice::{AdviceRequest, BeanContext, MAX_HISTORY_SHOTS};
use crate::models::ids::ShotId;
use crate::repos::{beans as bean_repo, shots as shot_repo};

/// Assembles the context sent to the advice provider for one shot.
#[derive(Clone)]
pub struct AdviceService {
    pool: DbPool,
}

impl AdviceService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> JournalResult<DbConn> {
        Ok(self.pool.get()?)
    }

    pub fn build_request(&self, shot_id: ShotId) -> JournalResult<AdviceRequest> {
        let mut conn = self.conn()?;
        let current = shot_repo::get_dto(&mut conn, shot_id.0)?.ok_or_else(|| JournalError::not_found("shot", shot_id.0))?;
        let bean = bean_repo::get(&mut conn, current.bean_id.0)?
            .ok_or_else(|| JournalError::not_found("bean", current.bean_id.0))?;
        let history = shot_repo::ranked_for_bag(&mut conn, current.bag_id.0, Some(shot_id.0), MAX_HISTORY_SHOTS as i64)?;
        debug!("Advice request for shot {}: {} past shot(s) from bag {}", shot_id, history.len(), current.bag_id);

        Ok(AdviceRequest {
            bean: BeanContext {
                name: bean.name,
                roaster: bean.roaster,
                origin: bean.origin,
                roast_date: current.bag_roast_date,
                days_since_roast: current.days_since_roast(),
            },
            machine_name: current.machine_name.clone(),
            grinder_name: current.grinder_name.clone(),
            accessories: current.accessories.clone(),
            history,
            current_shot: current,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::EquipmentType;
    use crate::db::pool::open_in_memory;
    use crate::models::catalog::{NewBeanInput, NewEquipmentInput};
    use crate::models::ids::{BagId, EquipmentId};
    use crate::models::shot::NewShotInput;
    use crate::services::{beans::BeanService, equipment::EquipmentService, shots::ShotService};
    use chrono::{Duration, NaiveDate};

    #[test]
    fn request_carries_ranked_history_and_bean_context() {
        let pool = open_in_memory().expect("pool");
        let mut bean = NewBeanInput::named("Kenya Nyeri");
        bean.roaster = Some("Tim Wendelboe".to_string());
        bean.first_roast_date = NaiveDate::from_ymd_opt(2024, 6, 1);
        let (_, bag) = BeanService::new(pool.clone()).create(&bean).unwrap();
        let grinder = EquipmentService::new(pool.clone())
            .create(&NewEquipmentInput {
                name: "EK43".to_string(),
                kind: EquipmentType::Grinder,
                notes: None,
            })
            .unwrap();
        let shots = ShotService::new(pool.clone());
        let start = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap().and_hms_opt(8, 0, 0).unwrap();

        let mut ids = Vec::new();
        for (i, rating) in [Some(3), None, Some(5), Some(4)].into_iter().enumerate() {
            let mut input = NewShotInput::recipe(BagId(bag.id), 18.0, "8", 30.0, 40.0, "Espresso");
            input.pulled_at = Some(start + Duration::hours(i as i64));
            input.grinder_id = Some(EquipmentId(grinder.id));
            input.rating = rating;
            ids.push(shots.create(&input).unwrap().id);
        }

        let request = AdviceService::new(pool).build_request(ids[3]).unwrap();
        assert_eq!(request.current_shot.id, ids[3]);
        assert_eq!(request.bean.name, "Kenya Nyeri");
        assert_eq!(request.bean.roaster.as_deref(), Some("Tim Wendelboe"));
        assert_eq!(request.bean.days_since_roast, 9);
        assert_eq!(request.grinder_name.as_deref(), Some("EK43"));
        assert_eq!(request.machine_name, None);
        let ranked = request.history.iter().map(|s| s.id).collect::<Vec<_>>();
        assert_eq!(ranked, vec![ids[2], ids[0], ids[1]]);
    }

    #[test]
    fn unknown_shot_is_not_found() {
        let svc = AdviceService::new(open_in_memory().expect("pool"));
        assert!(svc.build_request(ShotId(1)).unwrap_err().is_not_found());
    }
}
