use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::collections::HashMap;

use crate::db::models::{Equipment, EquipmentChanges, EquipmentType, NewEquipment};
use crate::db::scopes;
use crate::schema::equipment;

pub fn insert(conn: &mut SqliteConnection, row: &NewEquipment) -> QueryResult<Equipment> {
    diesel::insert_into(equipment::table)
        .values(row)
        .returning(Equipment::as_returning())
        .get_result(conn)
}

pub fn get(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<Equipment>> {
    scopes::equipment::live()
        .filter(equipment::id.eq(id))
        .select(Equipment::as_select())
        .first(conn)
        .optional()
}

pub fn list(conn: &mut SqliteConnection, kind: Option<EquipmentType>, active_only: bool) -> QueryResult<Vec<Equipment>> {
    let mut query = scopes::equipment::live().select(Equipment::as_select());
    if let Some(kind) = kind {
        query = query.filter(equipment::equipment_type.eq(kind.as_str()));
    }
    if active_only {
        query = query.filter(equipment::is_active.eq(true));
    }
    query.order((equipment::name.asc(), equipment::id.asc())).load(conn)
}

pub fn update(conn: &mut SqliteConnection, id: i64, changes: &EquipmentChanges) -> QueryResult<usize> {
    diesel::update(equipment::table.filter(equipment::id.eq(id)).filter(scopes::equipment::not_deleted()))
        .set(changes)
        .execute(conn)
}

/// Shots keep their reference; the equipment just stops showing up in lists.
pub fn soft_delete(conn: &mut SqliteConnection, id: i64, now: NaiveDateTime) -> QueryResult<usize> {
    diesel::update(equipment::table.filter(equipment::id.eq(id)).filter(scopes::equipment::not_deleted()))
        .set((equipment::is_deleted.eq(true), equipment::last_modified_at.eq(now)))
        .execute(conn)
}

/// Names for history display in one query. Deleted equipment is included on
/// purpose: old shots still show what they were pulled on.
pub fn names_by_ids(conn: &mut SqliteConnection, ids: &[i64]) -> QueryResult<HashMap<i64, String>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, String)> = scopes::equipment::including_deleted()
        .filter(equipment::id.eq_any(ids.to_vec()))
        .select((equipment::id, equipment::name))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

/// `(id, type)` for the live rows among `ids`.
pub fn kinds_by_ids(conn: &mut SqliteConnection, ids: &[i64]) -> QueryResult<HashMap<i64, EquipmentType>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(i64, String)> = scopes::equipment::live()
        .filter(equipment::id.eq_any(ids.to_vec()))
        .select((equipment::id, equipment::equipment_type))
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(|(id, kind)| (id, kind.parse().unwrap_or(EquipmentType::Other)))
        .collect())
}
