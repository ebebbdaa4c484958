use log::info;

use crate::db::models::{Equipment, EquipmentChanges, EquipmentType, NewEquipment};
use crate::db::pool::{DbConn, DbPool};
use crate::error::{JournalError, JournalResult, ValidationErrors};
use crate::models::catalog::{EquipmentEdit, NewEquipmentInput};
use crate::models::ids::EquipmentId;
use crate::repos::equipment as repo;
use crate::utils::now_utc;

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_NOTES_LEN: usize = 500;

fn validate(name: &str, notes: Option<&str>) -> JournalResult<()> {
    let mut errors = ValidationErrors::new();
    errors.check_text("name", name, MAX_NAME_LEN);
    errors.check_optional_text("notes", notes, MAX_NOTES_LEN);
    errors.into_result()
}

#[derive(Clone)]
pub struct EquipmentService {
    pool: DbPool,
}

impl EquipmentService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> JournalResult<DbConn> {
        Ok(self.pool.get()?)
    }

    pub fn create(&self, input: &NewEquipmentInput) -> JournalResult<Equipment> {
        validate(&input.name, input.notes.as_deref())?;
        let mut row = NewEquipment::new(input.name.trim(), input.kind);
        row.notes = input.notes.clone();
        let mut conn = self.conn()?;
        let created = repo::insert(&mut conn, &row)?;
        info!("Equipment {} created ({}, {})", created.id, created.name, input.kind);
        Ok(created)
    }

    pub fn get(&self, id: EquipmentId) -> JournalResult<Equipment> {
        let mut conn = self.conn()?;
        repo::get(&mut conn, id.0)?.ok_or_else(|| JournalError::not_found("equipment", id.0))
    }

    pub fn list(&self, kind: Option<EquipmentType>, active_only: bool) -> JournalResult<Vec<Equipment>> {
        let mut conn = self.conn()?;
        Ok(repo::list(&mut conn, kind, active_only)?)
    }

    pub fn update(&self, id: EquipmentId, edit: &EquipmentEdit) -> JournalResult<Equipment> {
        let mut conn = self.conn()?;
        if repo::get(&mut conn, id.0)?.is_none() {
            return Err(JournalError::not_found("equipment", id.0));
        }
        validate(&edit.name, edit.notes.as_deref())?;
        let changes = EquipmentChanges {
            name: edit.name.trim().to_string(),
            equipment_type: edit.kind.as_str().to_string(),
            notes: edit.notes.clone(),
            is_active: edit.is_active,
            last_modified_at: now_utc(),
        };
        repo::update(&mut conn, id.0, &changes)?;
        repo::get(&mut conn, id.0)?.ok_or_else(|| JournalError::not_found("equipment", id.0))
    }

    pub fn delete(&self, id: EquipmentId) -> JournalResult<()> {
        let mut conn = self.conn()?;
        if repo::soft_delete(&mut conn, id.0, now_utc())? == 0 {
            return Err(JournalError::not_found("equipment", id.0));
        }
        info!("Equipment {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::open_in_memory;

    fn service() -> EquipmentService {
        EquipmentService::new(open_in_memory().expect("pool"))
    }

    #[test]
    fn create_update_delete() {
        let svc = service();
        let grinder = svc
            .create(&NewEquipmentInput {
                name: " Niche Zero ".to_string(),
                kind: EquipmentType::Grinder,
                notes: None,
            })
            .unwrap();
        assert_eq!(grinder.name, "Niche Zero");
        assert_eq!(grinder.kind(), EquipmentType::Grinder);

        let edited = svc
            .update(
                EquipmentId(grinder.id),
                &EquipmentEdit {
                    name: "Niche Duo".to_string(),
                    kind: EquipmentType::Grinder,
                    notes: Some("83mm burrs".to_string()),
                    is_active: false,
                },
            )
            .unwrap();
        assert_eq!(edited.notes.as_deref(), Some("83mm burrs"));
        assert!(svc.list(None, true).unwrap().is_empty());

        svc.delete(EquipmentId(grinder.id)).unwrap();
        assert!(svc.get(EquipmentId(grinder.id)).unwrap_err().is_not_found());
        assert!(svc.delete(EquipmentId(grinder.id)).unwrap_err().is_not_found());
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = service()
            .create(&NewEquipmentInput {
                name: "  ".to_string(),
                kind: EquipmentType::Tamper,
                notes: None,
            })
            .unwrap_err();
        assert!(err.validation_errors().and_then(|v| v.field("name")).is_some());
    }

    #[test]
    fn update_of_missing_equipment_is_not_found_even_with_bad_data() {
        let err = service()
            .update(
                EquipmentId(77),
                &EquipmentEdit {
                    name: String::new(),
                    kind: EquipmentType::Other,
                    notes: None,
                    is_active: true,
                },
            )
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
