use diesel::Connection;
use log::{debug, info};

use crate::db::models::{BagChanges, NewBag};
use crate::db::pool::{DbConn, DbPool};
use crate::error::{JournalError, JournalResult, ValidationErrors};
use crate::models::bag::{BagEdit, BagSummary, NewBagInput};
use crate::models::ids::{BagId, BeanId};
use crate::repos::{bags as repo, beans as bean_repo};
use crate::utils::now_utc;

pub const MAX_NOTES_LEN: usize = 500;

#[derive(Clone)]
pub struct BagService {
    pool: DbPool,
}

impl BagService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> JournalResult<DbConn> {
        Ok(self.pool.get()?)
    }

    fn summary(conn: &mut DbConn, id: i64) -> JournalResult<BagSummary> {
        repo::get_summary(conn, id)?.ok_or_else(|| JournalError::not_found("bag", id))
    }

    pub fn create(&self, input: &NewBagInput) -> JournalResult<BagSummary> {
        let mut conn = self.conn()?;
        if bean_repo::get(&mut conn, input.bean_id.0)?.is_none() {
            return Err(JournalError::not_found("bean", input.bean_id.0));
        }
        let mut errors = ValidationErrors::new();
        errors.check_optional_text("notes", input.notes.as_deref(), MAX_NOTES_LEN);
        errors.into_result()?;

        let mut row = NewBag::new(input.bean_id.0, input.roast_date);
        row.notes = input.notes.clone();
        let bag = repo::insert(&mut conn, &row)?;
        info!("Bag {} created for bean {} (roasted {})", bag.id, input.bean_id, bag.roast_date);
        Self::summary(&mut conn, bag.id)
    }

    pub fn get(&self, id: BagId) -> JournalResult<BagSummary> {
        let mut conn = self.conn()?;
        Self::summary(&mut conn, id.0)
    }

    pub fn update(&self, id: BagId, edit: &BagEdit) -> JournalResult<BagSummary> {
        let mut conn = self.conn()?;
        if repo::get(&mut conn, id.0)?.is_none() {
            return Err(JournalError::not_found("bag", id.0));
        }
        let mut errors = ValidationErrors::new();
        errors.check_optional_text("notes", edit.notes.as_deref(), MAX_NOTES_LEN);
        errors.into_result()?;
        let changes = BagChanges {
            roast_date: edit.roast_date,
            notes: edit.notes.clone(),
            is_active: edit.is_active,
            last_modified_at: now_utc(),
        };
        repo::update(&mut conn, id.0, &changes)?;
        Self::summary(&mut conn, id.0)
    }

    pub fn mark_complete(&self, id: BagId, complete: bool) -> JournalResult<BagSummary> {
        let mut conn = self.conn()?;
        if repo::set_complete(&mut conn, id.0, complete, now_utc())? == 0 {
            return Err(JournalError::not_found("bag", id.0));
        }
        info!("Bag {} marked {}", id, if complete { "complete" } else { "open" });
        Self::summary(&mut conn, id.0)
    }

    /// Bags of a bean, newest roast first. An unknown bean has no bags.
    pub fn summaries_for_bean(&self, bean_id: BeanId, include_completed: bool) -> JournalResult<Vec<BagSummary>> {
        let mut conn = self.conn()?;
        let bags = repo::summaries_for_bean(&mut conn, bean_id.0, include_completed)?;
        debug!("Bean {}: {} bag(s) (include_completed={})", bean_id, bags.len(), include_completed);
        Ok(bags)
    }

    pub fn active_for_shot_logging(&self) -> JournalResult<Vec<BagSummary>> {
        let mut conn = self.conn()?;
        Ok(repo::active_for_shot_logging(&mut conn)?)
    }

    pub fn most_recent_for_bean(&self, bean_id: BeanId) -> JournalResult<Option<BagSummary>> {
        let mut conn = self.conn()?;
        match repo::most_recent_for_bean(&mut conn, bean_id.0)? {
            Some(bag) => Ok(repo::get_summary(&mut conn, bag.id)?),
            None => Ok(None),
        }
    }

    /// Soft-delete the bag and its shots. A bean's last bag stays; delete the bean instead.
    pub fn delete(&self, id: BagId) -> JournalResult<()> {
        let mut conn = self.conn()?;
        conn.transaction::<_, JournalError, _>(|conn| {
            let bag = repo::get(conn, id.0)?.ok_or_else(|| JournalError::not_found("bag", id.0))?;
            if repo::live_count_for_bean(conn, bag.bean_id)? <= 1 {
                return Err(JournalError::invalid(
                    "bag",
                    "the last bag of a bean cannot be deleted; delete the bean instead",
                ));
            }
            repo::soft_delete_cascade(conn, id.0, now_utc())?;
            Ok(())
        })?;
        info!("Bag {} deleted with its shots", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::open_in_memory;
    use crate::models::catalog::NewBeanInput;
    use crate::services::beans::BeanService;
    use chrono::NaiveDate;

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn setup() -> (BagService, BeanId, BagId) {
        let pool = open_in_memory().expect("pool");
        let mut input = NewBeanInput::named("Colombia Huila");
        input.first_roast_date = Some(day(1, 10));
        let (bean, bag) = BeanService::new(pool.clone()).create(&input).unwrap();
        (BagService::new(pool), BeanId(bean.id), BagId(bag.id))
    }

    #[test]
    fn lifecycle_of_bags() {
        let (svc, bean, first) = setup();
        let second = svc
            .create(&NewBagInput {
                bean_id: bean,
                roast_date: day(2, 5),
                notes: Some("second batch".to_string()),
            })
            .unwrap();
        assert_eq!(second.bean_name, "Colombia Huila");

        let recent = svc.most_recent_for_bean(bean).unwrap().unwrap();
        assert_eq!(recent.id, second.id);

        svc.mark_complete(first, true).unwrap();
        let open = svc.summaries_for_bean(bean, false).unwrap();
        assert_eq!(open.iter().map(|b| b.id).collect::<Vec<_>>(), vec![second.id]);
        let all = svc.summaries_for_bean(bean, true).unwrap();
        assert_eq!(all.iter().map(|b| b.id).collect::<Vec<_>>(), vec![second.id, first]);
        assert_eq!(svc.active_for_shot_logging().unwrap().len(), 1);

        svc.delete(second.id).unwrap();
        assert!(svc.active_for_shot_logging().unwrap().is_empty());
        assert_eq!(svc.most_recent_for_bean(bean).unwrap().map(|b| b.id), Some(first));
    }

    #[test]
    fn bag_for_unknown_bean_is_not_found() {
        let (svc, _, _) = setup();
        let err = svc
            .create(&NewBagInput {
                bean_id: BeanId(999),
                roast_date: day(3, 1),
                notes: None,
            })
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(svc.summaries_for_bean(BeanId(999), true).unwrap().is_empty());
        assert!(svc.most_recent_for_bean(BeanId(999)).unwrap().is_none());
    }

    #[test]
    fn update_changes_roast_date() {
        let (svc, _, bag) = setup();
        let edited = svc
            .update(
                bag,
                &BagEdit {
                    roast_date: day(1, 12),
                    notes: None,
                    is_active: true,
                },
            )
            .unwrap();
        assert_eq!(edited.roast_date, day(1, 12));
        assert!(svc.mark_complete(BagId(999), true).unwrap_err().is_not_found());
    }

    #[test]
    fn last_bag_of_a_bean_cannot_be_deleted() {
        let (svc, bean, only) = setup();
        let err = svc.delete(only).unwrap_err();
        assert!(err.validation_errors().and_then(|v| v.field("bag")).is_some());
        assert_eq!(svc.summaries_for_bean(bean, true).unwrap().len(), 1);
        assert!(svc.delete(BagId(999)).unwrap_err().is_not_found());

        let second = svc
            .create(&NewBagInput {
                bean_id: bean,
                roast_date: day(2, 1),
                notes: None,
            })
            .unwrap();
        svc.delete(only).unwrap();
        assert!(svc.delete(second.id).unwrap_err().validation_errors().is_some());
        assert_eq!(svc.summaries_for_bean(bean, true).unwrap().len(), 1);
    }

    #[test]
    fn missing_bean_wins_over_invalid_notes() {
        let (svc, _, _) = setup();
        let err = svc
            .create(&NewBagInput {
                bean_id: BeanId(999),
                roast_date: day(3, 1),
                notes: Some("x".repeat(MAX_NOTES_LEN + 1)),
            })
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
