//! Mapped-type procedures: inserts go through sessions, reads map rows back
//! into [`Worker`] and [`Resume`].

use rusqlite::params;
use workforce_db::{quote_ident, Database, ExecutionMode, Model, SyncEngine, Table};
use workforce_models::{metadata, Resume, Worker, RESUME};

use crate::core::recreate_tables;
use crate::error::QueryError;

/// Usernames written by [`insert_data`].
pub const SEED_USERNAMES: &[&str] = &["Bobr", "Volk"];

/// Drops and recreates the tables of the mapped-type metadata registry.
pub fn create_tables(engine: &SyncEngine) -> Result<(), QueryError> {
    recreate_tables(engine, &metadata())
}

/// Commits the fixed seed workers and returns their ids.
pub async fn insert_data(db: &Database, mode: ExecutionMode) -> Result<Vec<i64>, QueryError> {
    insert_workers(db, mode, SEED_USERNAMES).await
}

/// Commits one [`Worker`] per username in a single session and returns the
/// assigned ids in input order.
pub async fn insert_workers(
    db: &Database,
    mode: ExecutionMode,
    usernames: &[&str],
) -> Result<Vec<i64>, QueryError> {
    let workers: Vec<Worker> = usernames.iter().map(|name| Worker::new(*name)).collect();
    let ids = add_and_commit(db, mode, workers).await?;
    tracing::info!(rows = ids.len(), %mode, "inserted workers");
    Ok(ids)
}

/// Commits a single [`Resume`] and returns its id.
pub async fn insert_resume(
    db: &Database,
    mode: ExecutionMode,
    resume: Resume,
) -> Result<i64, QueryError> {
    let ids = add_and_commit(db, mode, vec![resume]).await?;
    let id = single_id(ids)?;
    tracing::info!(resume_id = id, %mode, "inserted resume");
    Ok(id)
}

pub(crate) fn single_id(ids: Vec<i64>) -> Result<i64, QueryError> {
    ids.into_iter().next().ok_or(QueryError::MissingRowId)
}

async fn add_and_commit<M>(
    db: &Database,
    mode: ExecutionMode,
    objs: Vec<M>,
) -> Result<Vec<i64>, QueryError>
where
    M: Model + Send + 'static,
{
    match mode {
        ExecutionMode::Blocking => {
            let sessions = db.sessions().clone();
            let ids = tokio::task::spawn_blocking(move || {
                let mut session = sessions.session()?;
                session.add_all(&objs);
                session.commit()
            })
            .await??;
            Ok(ids)
        }
        ExecutionMode::Async => {
            let mut session = db.async_sessions().session();
            session.add_all(&objs);
            Ok(session.commit().await?)
        }
    }
}

fn select_all<M: Model>(engine: &SyncEngine) -> Result<Vec<M>, QueryError> {
    let sql = M::table().select_sql();
    let conn = engine.connection()?;
    engine.log_statement(&sql);
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], M::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// All workers, ordered by id.
pub fn list_workers(engine: &SyncEngine) -> Result<Vec<Worker>, QueryError> {
    select_all(engine)
}

/// All resumes, ordered by id.
pub fn list_resumes(engine: &SyncEngine) -> Result<Vec<Resume>, QueryError> {
    select_all(engine)
}

/// Number of rows currently in `table`.
pub fn count_rows(engine: &SyncEngine, table: &Table) -> Result<i64, QueryError> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table.name));
    let conn = engine.connection()?;
    engine.log_statement(&sql);
    let count = conn.query_row(&sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Deletes a worker and, through the foreign key, every resume it owns.
///
/// Returns `false` if no worker had that id.
pub fn delete_worker(engine: &SyncEngine, id: i64) -> Result<bool, QueryError> {
    let table = Worker::table();
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?1",
        quote_ident(table.name),
        quote_ident("id")
    );
    let conn = engine.connection()?;
    engine.log_statement(&sql);
    let deleted = conn.execute(&sql, params![id])?;

    if deleted > 0 {
        tracing::info!(worker_id = id, "deleted worker");
    }
    Ok(deleted > 0)
}

/// Sets a resume's compensation. `updated_at` is refreshed by the store in
/// the same statement.
///
/// Returns `false` if no resume had that id.
pub fn update_compensation(
    engine: &SyncEngine,
    resume_id: i64,
    compensation: Option<i64>,
) -> Result<bool, QueryError> {
    let sql = RESUME.update_sql(&["compensation"]);
    let conn = engine.connection()?;
    engine.log_statement(&sql);
    let updated = conn.execute(&sql, params![compensation, resume_id])?;

    if updated > 0 {
        tracing::info!(resume_id, ?compensation, "updated compensation");
    }
    Ok(updated > 0)
}
