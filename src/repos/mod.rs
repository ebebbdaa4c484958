//! Data access, one module per entity.
//!
//! Functions take a plain `&mut SqliteConnection` so callers decide the
//! transaction boundary; every read goes through [`crate::db::scopes`].

pub mod bags;
pub mod beans;
pub mod equipment;
pub mod profiles;
pub mod shots;

#[cfg(test)]
pub(crate) fn test_conn() -> diesel::SqliteConnection {
    use diesel::connection::SimpleConnection;
    use diesel::Connection;

    let mut conn = diesel::SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");
    conn.batch_execute("PRAGMA foreign_keys = ON;").expect("Failed to enable foreign keys");
    crate::db::pool::apply_migrations(&mut conn).expect("Failed to apply migrations");
    conn
}
