//! SQLite connection pool and embedded schema migrations.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PooledConnection};
use diesel::SqliteConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info};

use crate::error::{JournalError, JournalResult};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = PooledConnection<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub const MEMORY_DATABASE_URL: &str = ":memory:";

/// Applied to every connection the pool hands out.
#[derive(Debug, Clone, Copy)]
struct SqlitePragmas {
    wal: bool,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        // foreign_keys is per-connection in SQLite and off by default
        let mut pragmas = String::from("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;");
        if self.wal {
            pragmas.push_str(" PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;");
        }
        conn.batch_execute(&pragmas).map_err(diesel::r2d2::Error::QueryError)
    }
}

fn is_memory(database_url: &str) -> bool {
    database_url == MEMORY_DATABASE_URL || database_url.contains("mode=memory")
}

/// Build the pool without touching the schema.
pub fn build_pool(database_url: &str, max_size: u32) -> JournalResult<DbPool> {
    let memory = is_memory(database_url);
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let mut builder = Pool::builder().connection_customizer(Box::new(SqlitePragmas { wal: !memory }));
    if memory {
        // Every in-memory connection is its own database; keep exactly one alive forever.
        builder = builder.max_size(1).min_idle(Some(1)).idle_timeout(None).max_lifetime(None);
    } else {
        builder = builder.max_size(max_size.max(1));
    }
    let pool = builder.build(manager)?;
    debug!("Connection pool ready (url={}, max_size={})", database_url, pool.max_size());
    Ok(pool)
}

pub fn apply_migrations(conn: &mut SqliteConnection) -> JournalResult<Vec<String>> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| JournalError::Migration(e.to_string()))?;
    let names = applied.iter().map(|v| v.to_string()).collect::<Vec<_>>();
    if names.is_empty() {
        info!("Database schema is up to date; no migrations were applied");
    } else {
        info!("Applied {} database migration(s): {}", names.len(), names.join(", "));
    }
    Ok(names)
}

/// Open the journal store and bring its schema up to date.
pub fn open(database_url: &str, max_size: u32) -> JournalResult<DbPool> {
    let pool = build_pool(database_url, max_size)?;
    let mut conn = pool.get()?;
    apply_migrations(&mut conn)?;
    drop(conn);
    Ok(pool)
}

/// Fresh, migrated in-memory store.
pub fn open_in_memory() -> JournalResult<DbPool> {
    open(MEMORY_DATABASE_URL, 1)
}
