use log::info;

use crate::db::models::{NewUserProfile, ProfileChanges, UserProfile};
use crate::db::pool::{DbConn, DbPool};
use crate::error::{JournalError, JournalResult, ValidationErrors};
use crate::models::catalog::ProfileInput;
use crate::models::ids::ProfileId;
use crate::repos::profiles as repo;
use crate::utils::now_utc;

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_AVATAR_PATH_LEN: usize = 500;

fn validate(input: &ProfileInput) -> JournalResult<()> {
    let mut errors = ValidationErrors::new();
    errors.check_text("name", &input.name, MAX_NAME_LEN);
    errors.check_optional_text("avatar_path", input.avatar_path.as_deref(), MAX_AVATAR_PATH_LEN);
    errors.into_result()
}

#[derive(Clone)]
pub struct ProfileService {
    pool: DbPool,
}

impl ProfileService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> JournalResult<DbConn> {
        Ok(self.pool.get()?)
    }

    pub fn create(&self, input: &ProfileInput) -> JournalResult<UserProfile> {
        validate(input)?;
        let mut row = NewUserProfile::new(input.name.trim());
        row.avatar_path = input.avatar_path.clone();
        let mut conn = self.conn()?;
        let created = repo::insert(&mut conn, &row)?;
        info!("Profile {} created ({})", created.id, created.name);
        Ok(created)
    }

    pub fn get(&self, id: ProfileId) -> JournalResult<UserProfile> {
        let mut conn = self.conn()?;
        repo::get(&mut conn, id.0)?.ok_or_else(|| JournalError::not_found("profile", id.0))
    }

    pub fn list(&self) -> JournalResult<Vec<UserProfile>> {
        let mut conn = self.conn()?;
        Ok(repo::list(&mut conn)?)
    }

    pub fn update(&self, id: ProfileId, input: &ProfileInput) -> JournalResult<UserProfile> {
        let mut conn = self.conn()?;
        if repo::get(&mut conn, id.0)?.is_none() {
            return Err(JournalError::not_found("profile", id.0));
        }
        validate(input)?;
        let changes = ProfileChanges {
            name: input.name.trim().to_string(),
            avatar_path: input.avatar_path.clone(),
            last_modified_at: now_utc(),
        };
        repo::update(&mut conn, id.0, &changes)?;
        repo::get(&mut conn, id.0)?.ok_or_else(|| JournalError::not_found("profile", id.0))
    }

    pub fn delete(&self, id: ProfileId) -> JournalResult<()> {
        let mut conn = self.conn()?;
        if repo::soft_delete(&mut conn, id.0, now_utc())? == 0 {
            return Err(JournalError::not_found("profile", id.0));
        }
        info!("Profile {} deleted", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::pool::open_in_memory;

    #[test]
    fn name_length_is_limited() {
        let svc = ProfileService::new(open_in_memory().unwrap());
        let err = svc
            .create(&ProfileInput {
                name: "x".repeat(MAX_NAME_LEN + 1),
                avatar_path: None,
            })
            .unwrap_err();
        assert!(err.validation_errors().is_some());

        let ok = svc
            .create(&ProfileInput {
                name: "Ana".to_string(),
                avatar_path: Some("avatars/ana.png".to_string()),
            })
            .unwrap();
        let renamed = svc
            .update(
                ProfileId(ok.id),
                &ProfileInput {
                    name: "Ana M.".to_string(),
                    avatar_path: None,
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Ana M.");
        assert_eq!(renamed.avatar_path, None);
        assert_eq!(svc.list().unwrap().len(), 1);
    }
}
