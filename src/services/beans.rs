use chrono::Utc;
use log::info;

use crate::db::models::{Bag, Bean, BeanChanges, NewBean};
use crate::db::pool::{DbConn, DbPool};
use crate::error::{JournalError, JournalResult, ValidationErrors};
use crate::models::catalog::{BeanEdit, NewBeanInput};
use crate::models::ids::BeanId;
use crate::repos::beans as repo;
use crate::utils::now_utc;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_ROASTER_LEN: usize = 100;
pub const MAX_ORIGIN_LEN: usize = 100;
pub const MAX_NOTES_LEN: usize = 500;

fn validate(name: &str, roaster: Option<&str>, origin: Option<&str>, notes: Option<&str>) -> JournalResult<()> {
    let mut errors = ValidationErrors::new();
    errors.check_text("name", name, MAX_NAME_LEN);
    errors.check_optional_text("roaster", roaster, MAX_ROASTER_LEN);
    errors.check_optional_text("origin", origin, MAX_ORIGIN_LEN);
    errors.check_optional_text("notes", notes, MAX_NOTES_LEN);
    errors.into_result()
}

#[derive(Clone)]
pub struct BeanService {
    pool: DbPool,
}

impl BeanService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> JournalResult<DbConn> {
        Ok(self.pool.get()?)
    }

    /// Create a bean and its first bag, roasted on `first_roast_date` or today.
    pub fn create(&self, input: &NewBeanInput) -> JournalResult<(Bean, Bag)> {
        validate(
            &input.name,
            input.roaster.as_deref(),
            input.origin.as_deref(),
            input.notes.as_deref(),
        )?;
        let mut row = NewBean::new(input.name.trim());
        row.roaster = input.roaster.clone();
        row.origin = input.origin.clone();
        row.notes = input.notes.clone();
        let roast_date = input.first_roast_date.unwrap_or_else(|| Utc::now().date_naive());

        let mut conn = self.conn()?;
        let (bean, bag) = repo::insert_with_first_bag(&mut conn, &row, roast_date)?;
        info!("Bean {} created ({}) with bag {} roasted {}", bean.id, bean.name, bag.id, roast_date);
        Ok((bean, bag))
    }

    pub fn get(&self, id: BeanId) -> JournalResult<Bean> {
        let mut conn = self.conn()?;
        repo::get(&mut conn, id.0)?.ok_or_else(|| JournalError::not_found("bean", id.0))
    }

    pub fn find_by_name(&self, name: &str) -> JournalResult<Option<Bean>> {
        let mut conn = self.conn()?;
        Ok(repo::find_by_name(&mut conn, name.trim())?)
    }

    pub fn list(&self, active_only: bool) -> JournalResult<Vec<Bean>> {
        let mut conn = self.conn()?;
        Ok(repo::list(&mut conn, active_only)?)
    }

    pub fn update(&self, id: BeanId, edit: &BeanEdit) -> JournalResult<Bean> {
        let mut conn = self.conn()?;
        if repo::get(&mut conn, id.0)?.is_none() {
            return Err(JournalError::not_found("bean", id.0));
        }
        validate(&edit.name, edit.roaster.as_deref(), edit.origin.as_deref(), edit.notes.as_deref())?;
        let changes = BeanChanges {
            name: edit.name.trim().to_string(),
            roaster: edit.roaster.clone(),
            origin: edit.origin.clone(),
            notes: edit.notes.clone(),
            is_active: edit.is_active,
            last_modified_at: now_utc(),
        };
        repo::update(&mut conn, id.0, &changes)?;
        repo::get(&mut conn, id.0)?.ok_or_else(|| JournalError::not_found("bean", id.0))
    }

    /// Soft-delete the bean along with its bags and their shots.
    pub fn delete(&self, id: BeanId) -> JournalResult<()> {
        let mut conn = self.conn()?;
        if repo::soft_delete_cascade(&mut conn, id.0, now_utc())? == 0 {
            return Err(JournalError::not_found("bean", id.0));
        }
        info!("Bean {} deleted with its bags and shots", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::open_in_memory;
    use chrono::NaiveDate;

    fn service() -> BeanService {
        BeanService::new(open_in_memory().expect("pool"))
    }

    #[test]
    fn create_adds_exactly_one_bag() {
        let svc = service();
        let roast = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut input = NewBeanInput::named("Ethiopia Guji");
        input.roaster = Some("Square Mile".to_string());
        input.first_roast_date = Some(roast);
        let (bean, bag) = svc.create(&input).unwrap();
        assert_eq!(bag.bean_id, bean.id);
        assert_eq!(bag.roast_date, roast);
        assert!(!bag.is_complete);
        assert_eq!(svc.get(BeanId(bean.id)).unwrap().roaster.as_deref(), Some("Square Mile"));
    }

    #[test]
    fn first_bag_defaults_to_today() {
        let (_, bag) = service().create(&NewBeanInput::named("House Blend")).unwrap();
        assert_eq!(bag.roast_date, Utc::now().date_naive());
    }

    #[test]
    fn reports_every_invalid_field() {
        let mut input = NewBeanInput::named("");
        input.origin = Some("o".repeat(MAX_ORIGIN_LEN + 1));
        input.notes = Some("n".repeat(MAX_NOTES_LEN + 1));
        let err = service().create(&input).unwrap_err();
        let fields = err.validation_errors().unwrap();
        assert!(fields.field("name").is_some());
        assert!(fields.field("origin").is_some());
        assert!(fields.field("notes").is_some());
        assert!(fields.field("roaster").is_none());
    }

    #[test]
    fn delete_hides_the_bean() {
        let svc = service();
        let (bean, _) = svc.create(&NewBeanInput::named("Kenya AA")).unwrap();
        svc.delete(BeanId(bean.id)).unwrap();
        assert!(svc.get(BeanId(bean.id)).unwrap_err().is_not_found());
        assert!(svc.list(false).unwrap().is_empty());
        assert!(svc.find_by_name("Kenya AA").unwrap().is_none());
    }

    #[test]
    fn update_rejects_missing_bean_before_validating() {
        let edit = BeanEdit {
            name: String::new(),
            roaster: None,
            origin: None,
            notes: None,
            is_active: true,
        };
        assert!(service().update(BeanId(404), &edit).unwrap_err().is_not_found());
    }
}
