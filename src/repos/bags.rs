//! Bag queries. Summaries carry the bean name from the same joined query.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::db::models::{Bag, BagChanges, NewBag};
use crate::db::scopes;
use crate::models::bag::BagSummary;
use crate::schema::{bags, beans, shot_records};

pub fn insert(conn: &mut SqliteConnection, row: &NewBag) -> QueryResult<Bag> {
    diesel::insert_into(bags::table)
        .values(row)
        .returning(Bag::as_returning())
        .get_result(conn)
}

pub fn get(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<Bag>> {
    scopes::bags::live()
        .filter(bags::id.eq(id))
        .select(Bag::as_select())
        .first(conn)
        .optional()
}

pub fn get_summary(conn: &mut SqliteConnection, id: i64) -> QueryResult<Option<BagSummary>> {
    let row: Option<(Bag, String)> = bags::table
        .inner_join(beans::table)
        .filter(bags::id.eq(id))
        .filter(scopes::bags::not_deleted())
        .filter(scopes::beans::not_deleted())
        .select((Bag::as_select(), beans::name))
        .first(conn)
        .optional()?;
    Ok(row.map(BagSummary::from))
}

/// Bags of one bean, newest roast first. Backed by `idx_bags_bean_roast`.
pub fn summaries_for_bean(
    conn: &mut SqliteConnection,
    bean_id: i64,
    include_completed: bool,
) -> QueryResult<Vec<BagSummary>> {
    let mut query = bags::table
        .inner_join(beans::table)
        .filter(bags::bean_id.eq(bean_id))
        .filter(scopes::bags::not_deleted())
        .filter(scopes::beans::not_deleted())
        .select((Bag::as_select(), beans::name))
        .into_boxed();
    if !include_completed {
        query = query.filter(bags::is_complete.eq(false));
    }
    let rows: Vec<(Bag, String)> = query.order((bags::roast_date.desc(), bags::id.desc())).load(conn)?;
    Ok(rows.into_iter().map(BagSummary::from).collect())
}

/// Every open bag across all beans, newest roast first: the candidates when
/// logging a shot. Backed by `idx_bags_complete_roast`.
pub fn active_for_shot_logging(conn: &mut SqliteConnection) -> QueryResult<Vec<BagSummary>> {
    let rows: Vec<(Bag, String)> = bags::table
        .inner_join(beans::table)
        .filter(bags::is_complete.eq(false))
        .filter(scopes::bags::not_deleted())
        .filter(scopes::beans::not_deleted())
        .select((Bag::as_select(), beans::name))
        .order((bags::roast_date.desc(), bags::id.desc()))
        .load(conn)?;
    Ok(rows.into_iter().map(BagSummary::from).collect())
}

pub fn most_recent_for_bean(conn: &mut SqliteConnection, bean_id: i64) -> QueryResult<Option<Bag>> {
    scopes::bags::live()
        .filter(bags::bean_id.eq(bean_id))
        .select(Bag::as_select())
        .order((bags::roast_date.desc(), bags::id.desc()))
        .first(conn)
        .optional()
}

pub fn update(conn: &mut SqliteConnection, id: i64, changes: &BagChanges) -> QueryResult<usize> {
    diesel::update(bags::table.filter(bags::id.eq(id)).filter(scopes::bags::not_deleted()))
        .set(changes)
        .execute(conn)
}

pub fn set_complete(conn: &mut SqliteConnection, id: i64, complete: bool, now: NaiveDateTime) -> QueryResult<usize> {
    diesel::update(bags::table.filter(bags::id.eq(id)).filter(scopes::bags::not_deleted()))
        .set((bags::is_complete.eq(complete), bags::last_modified_at.eq(now)))
        .execute(conn)
}

/// Soft-delete a bag and its shots.
pub fn soft_delete_cascade(conn: &mut SqliteConnection, id: i64, now: NaiveDateTime) -> QueryResult<usize> {
    conn.transaction(|conn| {
        diesel::update(
            shot_records::table
                .filter(shot_records::bag_id.eq(id))
                .filter(scopes::shots::not_deleted()),
        )
        .set((shot_records::is_deleted.eq(true), shot_records::last_modified_at.eq(now)))
        .execute(conn)?;
        diesel::update(bags::table.filter(bags::id.eq(id)).filter(scopes::bags::not_deleted()))
            .set((bags::is_deleted.eq(true), bags::last_modified_at.eq(now)))
            .execute(conn)
    })
}

/// Live bags of a bean, completed ones included.
pub fn live_count_for_bean(conn: &mut SqliteConnection, bean_id: i64) -> QueryResult<i64> {
    scopes::bags::live()
        .filter(bags::bean_id.eq(bean_id))
        .count()
        .get_result(conn)
}
