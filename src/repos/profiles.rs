use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;

use crate::db::models::{NewUserProfile, ProfileChanges, UserProfile};
use crate::db::scopes;
use crate::schema::user_profiles;

pub fn insert(conn: &mut SqliteConnection, row: &NewUserProfile) -> QueryResult<UserProfile> {
    diesel::insert_into(user_profiles::table)
        .values(row)
        .returning(UserProfile::as_returning())
        .get_result(conn)
}

pub fn get(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<UserProfile>> {
    scopes::profiles::live()
        .filter(user_profiles::id.eq(id))
        .select(UserProfile::as_select())
        .first(conn)
        .optional()
}

pub fn list(conn: &mut SqliteConnection) -> QueryResult<Vec<UserProfile>> {
    scopes::profiles::live()
        .select(UserProfile::as_select())
        .order((user_profiles::name.asc(), user_profiles::id.asc()))
        .load(conn)
}

pub fn find_by_name(conn: &mut SqliteConnection, name: &str) -> QueryResult<Option<UserProfile>> {
    scopes::profiles::live()
        .filter(user_profiles::name.eq(name.to_string()))
        .select(UserProfile::as_select())
        .first(conn)
        .optional()
}

pub fn update(conn: &mut SqliteConnection, id: i64, changes: &ProfileChanges) -> QueryResult<usize> {
    diesel::update(user_profiles::table.filter(user_profiles::id.eq(id)).filter(scopes::profiles::not_deleted()))
        .set(changes)
        .execute(conn)
}

pub fn soft_delete(conn: &mut SqliteConnection, id: i64, now: NaiveDateTime) -> QueryResult<usize> {
    diesel::update(user_profiles::table.filter(user_profiles::id.eq(id)).filter(scopes::profiles::not_deleted()))
        .set((user_profiles::is_deleted.eq(true), user_profiles::last_modified_at.eq(now)))
        .execute(conn)
}

/// Names for history display, deleted profiles included.
pub fn names_by_ids(conn: &mut SqliteConnection, ids: &[i64]) -> QueryResult<HashMap<i64, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, String)> = scopes::profiles::including_deleted()
        .filter(user_profiles::id.eq_any(ids.to_vec()))
        .select((user_profiles::id, user_profiles::name))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

pub fn live_ids(conn: &mut SqliteConnection, ids: &[i64]) -> QueryResult<Vec<i64>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    scopes::profiles::live()
        .filter(user_profiles::id.eq_any(ids.to_vec()))
        .select(user_profiles::id)
        .load(conn)
}
