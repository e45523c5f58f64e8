//! Embedded schema migrations.
//!
//! Migrations are applied in order and tracked through SQLite's
//! `user_version` pragma, one transaction per step.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::{DbError, DbResult};

/// The four EAV tables and their cascade rules.
const V1_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS entities (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS properties (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        UNIQUE(entity_id, name)
    );

    CREATE TABLE IF NOT EXISTS instances (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        entity_id INTEGER NOT NULL REFERENCES entities(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS instance_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        property_id INTEGER NOT NULL REFERENCES properties(id) ON DELETE CASCADE,
        instance_id INTEGER NOT NULL REFERENCES instances(id) ON DELETE CASCADE,
        value TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL,
        UNIQUE(instance_id, property_id)
    );
";

/// Lookup indexes for the name-based queries.
const V2_INDEXES: &str = "
    CREATE INDEX IF NOT EXISTS idx_properties_name ON properties(name);
    CREATE INDEX IF NOT EXISTS idx_instances_entity ON instances(entity_id);
    CREATE INDEX IF NOT EXISTS idx_instance_data_property_value ON instance_data(property_id, value);
";

/// All migrations, in application order. Version `n` is `MIGRATIONS[n - 1]`.
pub const MIGRATIONS: &[&str] = &[V1_TABLES, V2_INDEXES];

/// Returns the schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> DbResult<usize> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    usize::try_from(version)
        .map_err(|_| DbError::Migration(format!("invalid schema version {version}")))
}

/// Brings the schema up to date. Safe to call on every open.
pub fn migrate(conn: &mut Connection) -> DbResult<()> {
    let current = schema_version(conn)?;
    if current > MIGRATIONS.len() {
        return Err(DbError::Migration(format!(
            "database schema version {current} is newer than supported version {}",
            MIGRATIONS.len()
        )));
    }
    if current == MIGRATIONS.len() {
        debug!(version = current, "schema up to date");
        return Ok(());
    }

    for (idx, sql) in MIGRATIONS.iter().enumerate().skip(current) {
        let version = idx + 1;
        let tx = conn.transaction()?;
        tx.execute_batch(sql)
            .map_err(|e| DbError::Migration(format!("step {version} failed: {e}")))?;
        tx.pragma_update(None, "user_version", version as i64)?;
        tx.commit()?;
        info!(version, "applied schema migration");
    }
    Ok(())
}
