//! Unit-of-work sessions for both engines.
//!
//! A session collects mapped objects with [`Session::add`] and writes all of
//! them in one transaction on [`Session::commit`]. Dropping a session without
//! committing writes nothing.

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use thiserror::Error;

use crate::engine::{AsyncEngine, DbConnection, EngineError, SyncEngine};
use crate::model::{Model, PendingInsert, SqlValue};

/// Errors raised while committing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// No connection could be obtained from the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A statement on the blocking driver failed.
    #[error("session commit failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A statement on the async driver failed.
    #[error("async session commit failed: {0}")]
    Async(#[from] sqlx::Error),
}

/// Produces blocking [`Session`]s bound to one engine.
#[derive(Clone)]
pub struct SessionFactory {
    engine: SyncEngine,
}

impl SessionFactory {
    pub fn new(engine: SyncEngine) -> Self {
        Self { engine }
    }

    /// Opens a session holding one pooled connection until it is dropped.
    pub fn session(&self) -> Result<Session, SessionError> {
        Ok(Session {
            conn: self.engine.connection()?,
            engine: self.engine.clone(),
            pending: Vec::new(),
        })
    }
}

/// Blocking unit of work.
pub struct Session {
    conn: DbConnection,
    engine: SyncEngine,
    pending: Vec<PendingInsert>,
}

impl Session {
    /// Queues `obj` for insertion on the next commit.
    pub fn add<M: Model>(&mut self, obj: &M) {
        self.pending.push(PendingInsert::from_model(obj));
    }

    pub fn add_all<'a, M: Model + 'a>(&mut self, objs: impl IntoIterator<Item = &'a M>) {
        for obj in objs {
            self.add(obj);
        }
    }

    /// Number of objects waiting for commit.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Discards every queued object.
    pub fn rollback(&mut self) {
        self.pending.clear();
    }

    /// Inserts every queued object in one transaction and returns the
    /// assigned row ids in the order the objects were added.
    ///
    /// The queue is emptied even when the commit fails; nothing from a
    /// failed commit is written.
    pub fn commit(&mut self) -> Result<Vec<i64>, SessionError> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(pending.len());
        for row in &pending {
            let sql = row.sql();
            self.engine.log_statement(&sql);
            tx.execute(&sql, rusqlite::params_from_iter(row.values.iter()))?;
            ids.push(tx.last_insert_rowid());
        }
        tx.commit()?;

        tracing::debug!(rows = ids.len(), "committed session");
        Ok(ids)
    }
}

/// Produces [`AsyncSession`]s bound to one engine.
#[derive(Debug, Clone)]
pub struct AsyncSessionFactory {
    engine: AsyncEngine,
}

impl AsyncSessionFactory {
    pub fn new(engine: AsyncEngine) -> Self {
        Self { engine }
    }

    /// Opens a session. A connection is only acquired on commit.
    pub fn session(&self) -> AsyncSession {
        AsyncSession {
            engine: self.engine.clone(),
            pending: Vec::new(),
        }
    }
}

/// Async unit of work.
#[derive(Debug)]
pub struct AsyncSession {
    engine: AsyncEngine,
    pending: Vec<PendingInsert>,
}

impl AsyncSession {
    /// Queues `obj` for insertion on the next commit.
    pub fn add<M: Model>(&mut self, obj: &M) {
        self.pending.push(PendingInsert::from_model(obj));
    }

    pub fn add_all<'a, M: Model + 'a>(&mut self, objs: impl IntoIterator<Item = &'a M>) {
        for obj in objs {
            self.add(obj);
        }
    }

    /// Number of objects waiting for commit.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Discards every queued object.
    pub fn rollback(&mut self) {
        self.pending.clear();
    }

    /// Inserts every queued object in one transaction and returns the
    /// assigned row ids in the order the objects were added.
    pub async fn commit(&mut self) -> Result<Vec<i64>, SessionError> {
        let pending = std::mem::take(&mut self.pending);
        if pending.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.engine.pool().begin().await?;
        let mut ids = Vec::with_capacity(pending.len());
        for row in &pending {
            let sql = row.sql();
            self.engine.log_statement(&sql);
            let query = row
                .values
                .iter()
                .fold(sqlx::query(&sql), |query, value| bind_value(query, value));
            let result = query.execute(&mut *tx).await?;
            ids.push(result.last_insert_rowid());
        }
        tx.commit().await?;

        tracing::debug!(rows = ids.len(), "committed async session");
        Ok(ids)
    }
}

/// Binds one [`SqlValue`] onto an async query.
pub fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(None::<i64>),
        SqlValue::Integer(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{create_async_engine, create_sync_engine, EngineSettings};
    use crate::schema::{Column, ColumnType, MetaData, Table};

    static TAGS: Table = Table::new(
        "tags",
        &[
            Column::new("id", ColumnType::Integer).primary_key(),
            Column::new("label", ColumnType::VarChar(8)),
        ],
    );

    struct Tag(String);

    fn tag(label: &str) -> Tag {
        Tag(label.to_string())
    }

    impl Model for Tag {
        fn table() -> &'static Table {
            &TAGS
        }

        fn insert_values(&self) -> Vec<(&'static str, SqlValue)> {
            vec![("label", self.0.as_str().into())]
        }

        fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
            Ok(Tag(row.get(1)?))
        }
    }

    fn setup() -> (tempfile::TempDir, String, SyncEngine) {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let url = format!("sqlite://{}", dir.path().join("session.db").display());
        let engine = create_sync_engine(&url, &EngineSettings::default())
            .expect("engine creation should succeed");
        MetaData::new()
            .with_table(&TAGS)
            .create_all(&engine)
            .expect("create_all should succeed");
        (dir, url, engine)
    }

    fn count(engine: &SyncEngine) -> i64 {
        let conn = engine.connection().expect("should get connection");
        conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .expect("should count tags")
    }

    #[test]
    fn commit_inserts_pending_in_order() {
        let (_dir, _url, engine) = setup();
        let factory = SessionFactory::new(engine.clone());
        let mut session = factory.session().expect("should open session");

        session.add_all(&[tag("one"), tag("two")]);
        assert_eq!(session.pending(), 2);

        let ids = session.commit().expect("commit should succeed");
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(session.pending(), 0);
        assert_eq!(count(&engine), 2);
    }

    #[test]
    fn dropped_or_rolled_back_session_writes_nothing() {
        let (_dir, _url, engine) = setup();
        let factory = SessionFactory::new(engine.clone());

        {
            let mut session = factory.session().expect("should open session");
            session.add(&tag("gone"));
        }

        let mut session = factory.session().expect("should open session");
        session.add(&tag("gone"));
        session.rollback();
        assert!(session.commit().expect("empty commit should succeed").is_empty());

        assert_eq!(count(&engine), 0);
    }

    #[test]
    fn failed_commit_writes_nothing() {
        let (_dir, _url, engine) = setup();
        let factory = SessionFactory::new(engine.clone());
        let mut session = factory.session().expect("should open session");

        session.add(&tag("fine"));
        session.add(&tag("far too long for the column"));
        let err = session.commit().expect_err("length check should fail the commit");
        assert!(matches!(err, SessionError::Sqlite(_)), "unexpected error: {err:?}");

        assert_eq!(count(&engine), 0, "the whole transaction should roll back");
    }

    #[tokio::test]
    async fn async_commit_is_visible_to_sync_engine() {
        let (_dir, url, engine) = setup();
        let async_engine = create_async_engine(&url, &EngineSettings::default())
            .expect("engine creation should succeed");
        let factory = AsyncSessionFactory::new(async_engine);

        let mut session = factory.session();
        session.add_all(&[tag("a"), tag("b"), tag("c")]);
        let ids = session.commit().await.expect("commit should succeed");

        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(count(&engine), 3);
    }

    #[tokio::test]
    async fn failed_async_commit_writes_nothing() {
        let (_dir, url, engine) = setup();
        let async_engine = create_async_engine(&url, &EngineSettings::default())
            .expect("engine creation should succeed");
        let factory = AsyncSessionFactory::new(async_engine);

        let mut session = factory.session();
        session.add(&tag("fine"));
        session.add(&tag("far too long for the column"));
        let err = session
            .commit()
            .await
            .expect_err("length check should fail the commit");
        assert!(matches!(err, SessionError::Async(_)), "unexpected error: {err:?}");
        assert_eq!(session.pending(), 0);

        assert_eq!(count(&engine), 0, "the whole transaction should roll back");
    }
}
