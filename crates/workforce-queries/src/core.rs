//! Core-style procedures: raw DDL and multi-row inserts built from the
//! standalone table descriptors.

use rusqlite::params_from_iter;
use workforce_db::{AsyncEngine, MetaData, SyncEngine};
use workforce_models::{metadata_obj, WORKERS_TABLE};

use crate::error::QueryError;

/// Usernames written by [`insert_data`].
pub const SEED_USERNAMES: &[&str] = &["AO Bobr", "OOO Volk"];

/// Drops and recreates every table in `metadata`.
///
/// Destructive and unconditional. Statement echo is on for the duration and
/// restored afterwards. Concurrent callers are not coordinated.
pub fn recreate_tables(engine: &SyncEngine, metadata: &MetaData) -> Result<(), QueryError> {
    let previous = engine.set_echo(true);
    let result = metadata
        .drop_all(engine)
        .and_then(|()| metadata.create_all(engine));
    engine.set_echo(previous);
    result?;

    tracing::info!(tables = metadata.tables().len(), "recreated tables");
    Ok(())
}

/// Drops and recreates the tables of the standalone metadata registry.
pub fn create_tables(engine: &SyncEngine) -> Result<(), QueryError> {
    recreate_tables(engine, &metadata_obj())
}

/// Inserts one `workers` row per username with a single multi-row statement.
///
/// Returns the number of rows written. Not idempotent: repeated calls append
/// duplicates.
pub fn insert_workers(engine: &SyncEngine, usernames: &[&str]) -> Result<usize, QueryError> {
    if usernames.is_empty() {
        return Ok(0);
    }

    let sql = WORKERS_TABLE.insert_sql(&["username"], usernames.len());
    let conn = engine.connection()?;
    engine.log_statement(&sql);
    let inserted = conn.execute(&sql, params_from_iter(usernames.iter()))?;

    tracing::info!(rows = inserted, table = WORKERS_TABLE.name, "inserted rows");
    Ok(inserted)
}

/// Inserts the fixed seed workers.
pub fn insert_data(engine: &SyncEngine) -> Result<usize, QueryError> {
    insert_workers(engine, SEED_USERNAMES)
}

/// Asks the store for its version through the async engine.
pub async fn server_version(engine: &AsyncEngine) -> Result<String, QueryError> {
    Ok(engine.server_version().await?)
}
