//! Logging, editing and browsing shots.
//!
//! Missing references are reported as `NotFound` before any field is
//! validated, so a caller can tell a stale id from bad input.

use log::{debug, info};
use std::collections::HashMap;

use crate::db::models::{EquipmentType, NewShotRecord, ShotUpdate};
use crate::db::pool::{DbConn, DbPool};
use crate::error::{JournalError, JournalResult, ValidationErrors};
use crate::models::filter::ShotFilterCriteria;
use crate::models::ids::{BagId, EquipmentId, ProfileId, ShotId};
use crate::models::page::Page;
use crate::models::rating::Rating;
use crate::models::shot::{NewShotInput, ShotEdit, ShotRecordDto};
use crate::repos::{bags as bag_repo, equipment as equipment_repo, profiles as profile_repo, shots as repo};
use crate::utils::now_utc;

pub const MAX_DOSE_G: f64 = 100.0;
pub const MAX_TIME_S: f64 = 300.0;
pub const MAX_OUTPUT_G: f64 = 200.0;
pub const MAX_PREINFUSION_S: f64 = 120.0;
pub const MAX_GRIND_SETTING_LEN: usize = 50;
pub const MAX_DRINK_TYPE_LEN: usize = 50;
pub const MAX_TASTING_NOTES_LEN: usize = 500;

/// Fields shared by new shots and edits.
struct Outcome<'a> {
    drink_type: &'a str,
    actual_time: Option<f64>,
    actual_output: Option<f64>,
    preinfusion_time: Option<f64>,
    rating: Option<i32>,
    tasting_notes: Option<&'a str>,
}

fn check_outcome(errors: &mut ValidationErrors, o: &Outcome<'_>) {
    errors.check_text("drink_type", o.drink_type, MAX_DRINK_TYPE_LEN);
    errors.check_optional_non_negative("actual_time", o.actual_time, MAX_TIME_S);
    errors.check_optional_non_negative("actual_output", o.actual_output, MAX_OUTPUT_G);
    errors.check_optional_non_negative("preinfusion_time", o.preinfusion_time, MAX_PREINFUSION_S);
    if let Some(r) = o.rating
        && Rating::new(r).is_none()
    {
        errors.add("rating", format!("rating must be between {} and {}", Rating::MIN, Rating::MAX));
    }
    errors.check_optional_text("tasting_notes", o.tasting_notes, MAX_TASTING_NOTES_LEN);
}

fn check_page(page_index: i64, page_size: i64) -> JournalResult<()> {
    let mut errors = ValidationErrors::new();
    if page_size <= 0 {
        errors.add("page_size", "page_size must be greater than 0");
    }
    if page_index < 0 {
        errors.add("page_index", "page_index must not be negative");
    }
    errors.into_result()
}

fn require_bag(conn: &mut DbConn, id: BagId) -> JournalResult<()> {
    match bag_repo::get(conn, id.0)? {
        Some(_) => Ok(()),
        None => Err(JournalError::not_found("bag", id.0)),
    }
}

fn require_profiles(conn: &mut DbConn, ids: &[Option<ProfileId>]) -> JournalResult<()> {
    let wanted = ids.iter().flatten().map(|p| p.0).collect::<Vec<_>>();
    let live = profile_repo::live_ids(conn, &wanted)?;
    match wanted.into_iter().find(|id| !live.contains(id)) {
        Some(missing) => Err(JournalError::not_found("profile", missing)),
        None => Ok(()),
    }
}

/// Existence of every referenced piece of equipment. Returns the kinds so the
/// caller can check roles.
fn require_equipment(conn: &mut DbConn, ids: &[EquipmentId]) -> JournalResult<HashMap<i64, EquipmentType>> {
    let wanted = ids.iter().map(|e| e.0).collect::<Vec<_>>();
    let kinds = equipment_repo::kinds_by_ids(conn, &wanted)?;
    match wanted.into_iter().find(|id| !kinds.contains_key(id)) {
        Some(missing) => Err(JournalError::not_found("equipment", missing)),
        None => Ok(kinds),
    }
}

fn check_role(
    errors: &mut ValidationErrors,
    kinds: &HashMap<i64, EquipmentType>,
    field: &str,
    id: Option<EquipmentId>,
    expected: EquipmentType,
) {
    if let Some(id) = id
        && let Some(kind) = kinds.get(&id.0)
        && *kind != expected
    {
        errors.add(field, format!("equipment {} is a {}, not a {}", id, kind, expected));
    }
}

#[derive(Clone)]
pub struct ShotService {
    pool: DbPool,
}

impl ShotService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> JournalResult<DbConn> {
        Ok(self.pool.get()?)
    }

    fn dto(conn: &mut DbConn, id: i64) -> JournalResult<ShotRecordDto> {
        repo::get_dto(conn, id)?.ok_or_else(|| JournalError::not_found("shot", id))
    }

    pub fn create(&self, input: &NewShotInput) -> JournalResult<ShotRecordDto> {
        let mut conn = self.conn()?;
        require_bag(&mut conn, input.bag_id)?;
        require_profiles(&mut conn, &[input.made_by_id, input.made_for_id])?;
        let referenced = input
            .machine_id
            .into_iter()
            .chain(input.grinder_id)
            .chain(input.accessory_ids.iter().copied())
            .collect::<Vec<_>>();
        let kinds = require_equipment(&mut conn, &referenced)?;

        let mut errors = ValidationErrors::new();
        errors.check_positive("dose_in", input.dose_in, MAX_DOSE_G);
        errors.check_text("grind_setting", &input.grind_setting, MAX_GRIND_SETTING_LEN);
        errors.check_positive("expected_time", input.expected_time, MAX_TIME_S);
        errors.check_positive("expected_output", input.expected_output, MAX_OUTPUT_G);
        check_outcome(
            &mut errors,
            &Outcome {
                drink_type: &input.drink_type,
                actual_time: input.actual_time,
                actual_output: input.actual_output,
                preinfusion_time: input.preinfusion_time,
                rating: input.rating,
                tasting_notes: input.tasting_notes.as_deref(),
            },
        );
        check_role(&mut errors, &kinds, "machine_id", input.machine_id, EquipmentType::Machine);
        check_role(&mut errors, &kinds, "grinder_id", input.grinder_id, EquipmentType::Grinder);
        if let Some(wrong) = input
            .accessory_ids
            .iter()
            .find(|id| kinds.get(&id.0).is_some_and(|k| !k.is_accessory()))
        {
            errors.add("accessory_ids", format!("equipment {} is not an accessory", wrong));
        }
        errors.into_result()?;

        let mut row = NewShotRecord::new(
            input.bag_id.0,
            input.dose_in,
            input.grind_setting.trim(),
            input.expected_time,
            input.expected_output,
            input.drink_type.trim(),
        );
        if let Some(at) = input.pulled_at {
            row.pulled_at = at;
        }
        row.machine_id = input.machine_id.map(|e| e.0);
        row.grinder_id = input.grinder_id.map(|e| e.0);
        row.made_by_id = input.made_by_id.map(|p| p.0);
        row.made_for_id = input.made_for_id.map(|p| p.0);
        row.actual_time = input.actual_time;
        row.actual_output = input.actual_output;
        row.preinfusion_time = input.preinfusion_time;
        row.rating = input.rating;
        row.tasting_notes = input.tasting_notes.clone();

        let accessory_ids = input.accessory_ids.iter().map(|e| e.0).collect::<Vec<_>>();
        let shot = repo::insert(&mut conn, &row, &accessory_ids)?;
        info!(
            "Shot {} logged on bag {} ({}g in, {} accessories)",
            shot.id,
            shot.bag_id,
            shot.dose_in,
            accessory_ids.len()
        );
        Self::dto(&mut conn, shot.id)
    }

    pub fn get(&self, id: ShotId) -> JournalResult<ShotRecordDto> {
        let mut conn = self.conn()?;
        Self::dto(&mut conn, id.0)
    }

    pub fn update(&self, id: ShotId, edit: &ShotEdit) -> JournalResult<ShotRecordDto> {
        let mut conn = self.conn()?;
        if repo::get(&mut conn, id.0)?.is_none() {
            return Err(JournalError::not_found("shot", id.0));
        }
        require_bag(&mut conn, edit.bag_id)?;
        require_profiles(&mut conn, &[edit.made_by_id, edit.made_for_id])?;

        let mut errors = ValidationErrors::new();
        check_outcome(
            &mut errors,
            &Outcome {
                drink_type: &edit.drink_type,
                actual_time: edit.actual_time,
                actual_output: edit.actual_output,
                preinfusion_time: edit.preinfusion_time,
                rating: edit.rating,
                tasting_notes: edit.tasting_notes.as_deref(),
            },
        );
        errors.into_result()?;

        let changes = ShotUpdate {
            bag_id: edit.bag_id.0,
            made_by_id: edit.made_by_id.map(|p| p.0),
            made_for_id: edit.made_for_id.map(|p| p.0),
            drink_type: edit.drink_type.trim().to_string(),
            actual_time: edit.actual_time,
            actual_output: edit.actual_output,
            preinfusion_time: edit.preinfusion_time,
            rating: edit.rating,
            tasting_notes: edit.tasting_notes.clone(),
            last_modified_at: now_utc(),
        };
        repo::update(&mut conn, id.0, &changes)?;
        info!("Shot {} updated", id);
        Self::dto(&mut conn, id.0)
    }

    /// Set or clear the rating of one shot.
    pub fn rate(&self, id: ShotId, rating: Option<Rating>) -> JournalResult<ShotRecordDto> {
        let mut conn = self.conn()?;
        if repo::set_rating(&mut conn, id.0, rating.map(|r| r.value()), now_utc())? == 0 {
            return Err(JournalError::not_found("shot", id.0));
        }
        info!("Shot {} rated {}", id, rating.map(|r| r.value().to_string()).unwrap_or_else(|| "-".to_string()));
        Self::dto(&mut conn, id.0)
    }

    /// Rate the newest shot. `None` when nothing has been logged yet.
    pub fn rate_last_shot(&self, rating: Rating) -> JournalResult<Option<ShotRecordDto>> {
        let last = {
            let mut conn = self.conn()?;
            repo::most_recent(&mut conn)?
        };
        match last {
            Some(shot) => self.rate(shot.id, Some(rating)).map(Some),
            None => Ok(None),
        }
    }

    pub fn most_recent(&self) -> JournalResult<Option<ShotRecordDto>> {
        let mut conn = self.conn()?;
        Ok(repo::most_recent(&mut conn)?)
    }

    pub fn total_count(&self) -> JournalResult<i64> {
        let mut conn = self.conn()?;
        Ok(repo::total_count(&mut conn)?)
    }

    pub fn filtered_count(&self, criteria: &ShotFilterCriteria) -> JournalResult<i64> {
        let mut conn = self.conn()?;
        Ok(repo::filtered_count(&mut conn, criteria)?)
    }

    pub fn history(&self, page_index: i64, page_size: i64) -> JournalResult<Page<ShotRecordDto>> {
        check_page(page_index, page_size)?;
        let mut conn = self.conn()?;
        let total = repo::total_count(&mut conn)?;
        let items = repo::history(&mut conn, page_index, page_size)?;
        debug!("History page {} (size {}): {} of {} shot(s)", page_index, page_size, items.len(), total);
        Ok(Page::new(items, page_index, page_size, total))
    }

    pub fn filtered_history(
        &self,
        criteria: &ShotFilterCriteria,
        page_index: i64,
        page_size: i64,
    ) -> JournalResult<Page<ShotRecordDto>> {
        check_page(page_index, page_size)?;
        let mut conn = self.conn()?;
        let total = repo::filtered_count(&mut conn, criteria)?;
        let items = repo::filtered_history(&mut conn, criteria, page_index, page_size)?;
        debug!(
            "Filtered history page {} ({} dimension(s)): {} of {} shot(s)",
            page_index,
            criteria.active_dimensions(),
            items.len(),
            total
        );
        Ok(Page::new(items, page_index, page_size, total))
    }

    pub fn delete(&self, id: ShotId) -> JournalResult<()> {
        let mut conn = self.conn()?;
        if repo::soft_delete(&mut conn, id.0, now_utc())? == 0 {
            return Err(JournalError::not_found("shot", id.0));
        }
        info!("Shot {} deleted", id);
        Ok(())
    }
}
