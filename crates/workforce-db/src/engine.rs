//! Engine creation: pooled connectivity for the blocking and async drivers.
//!
//! Both engines talk to the same SQLite store through independent pools. The
//! blocking engine is an `r2d2` pool of `rusqlite` connections, the async
//! engine is a lazily-connecting `sqlx` pool. Neither retries, health-checks,
//! or reconnects; driver failures surface directly to the caller.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use thiserror::Error;

/// Pool sizing and connection tunables shared by both engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Connections the pool keeps open at rest.
    pub pool_size: u32,

    /// Extra connections the pool may open beyond `pool_size` under load.
    pub max_overflow: u32,

    /// Busy timeout for SQLite connections, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Whether executed statements are logged at `info` level.
    pub echo: bool,
}

impl EngineSettings {
    /// Upper bound on open connections: the base size plus the overflow.
    pub fn max_connections(&self) -> u32 {
        self.pool_size.saturating_add(self.max_overflow)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pool_size: 5,
            max_overflow: 10,
            busy_timeout_ms: 5_000,
            echo: false,
        }
    }
}

/// Connection strings for both drivers plus the shared engine tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Connection string for the blocking (`rusqlite`) driver.
    pub url_sync: String,

    /// Connection string for the async (`sqlx`) driver.
    pub url_async: String,

    /// Pool sizing and connection tunables.
    pub engine: EngineSettings,
}

/// A type alias for the blocking SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// A connection checked out of [`DbPool`].
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Errors that can occur when building or using an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Failed to build the blocking connection pool.
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[source] r2d2::Error),

    /// Failed to check a connection out of the blocking pool.
    #[error("failed to check out a pooled connection: {0}")]
    Checkout(#[source] r2d2::Error),

    /// A statement on the blocking driver failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The async driver rejected its options or a statement failed.
    #[error("async driver error: {0}")]
    Async(#[from] sqlx::Error),
}

/// Runtime-togglable statement logging flag, shared by clones of an engine.
#[derive(Debug, Clone, Default)]
struct Echo(Arc<AtomicBool>);

impl Echo {
    fn new(on: bool) -> Self {
        Self(Arc::new(AtomicBool::new(on)))
    }

    fn get(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn set(&self, on: bool) -> bool {
        self.0.swap(on, Ordering::Relaxed)
    }

    fn log(&self, engine: &'static str, sql: &str) {
        if self.get() {
            tracing::info!(engine, sql, "executing statement");
        } else {
            tracing::trace!(engine, sql, "executing statement");
        }
    }
}

/// Strips an optional `sqlite://` or `sqlite:` scheme from a connection string.
pub fn sqlite_path(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

/// Blocking engine: an `r2d2` pool of `rusqlite` connections.
#[derive(Clone)]
pub struct SyncEngine {
    pool: DbPool,
    echo: Echo,
}

impl SyncEngine {
    /// The underlying connection pool.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    /// Checks a connection out of the pool, blocking until one is free.
    pub fn connection(&self) -> Result<DbConnection, EngineError> {
        self.pool.get().map_err(EngineError::Checkout)
    }

    /// Whether statement echo is on.
    pub fn echo(&self) -> bool {
        self.echo.get()
    }

    /// Turns statement echo on or off, returning the previous setting.
    pub fn set_echo(&self, on: bool) -> bool {
        self.echo.set(on)
    }

    /// Logs `sql` the way this engine's echo setting asks for.
    pub fn log_statement(&self, sql: &str) {
        self.echo.log("sync", sql);
    }

    /// Returns the SQLite library version reported by the store.
    pub fn server_version(&self) -> Result<String, EngineError> {
        let conn = self.connection()?;
        let sql = "SELECT sqlite_version()";
        self.log_statement(sql);
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }
}

/// Async engine: a lazily-connecting `sqlx` SQLite pool.
#[derive(Debug, Clone)]
pub struct AsyncEngine {
    pool: SqlitePool,
    echo: Echo,
}

impl AsyncEngine {
    /// The underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Whether statement echo is on.
    pub fn echo(&self) -> bool {
        self.echo.get()
    }

    /// Turns statement echo on or off, returning the previous setting.
    pub fn set_echo(&self, on: bool) -> bool {
        self.echo.set(on)
    }

    /// Logs `sql` the way this engine's echo setting asks for.
    pub fn log_statement(&self, sql: &str) {
        self.echo.log("async", sql);
    }

    /// Returns the SQLite library version reported by the store.
    pub async fn server_version(&self) -> Result<String, EngineError> {
        let sql = "SELECT sqlite_version()";
        self.log_statement(sql);
        let (version,): (String,) = sqlx::query_as(sql).fetch_one(&self.pool).await?;
        Ok(version)
    }
}

/// Creates the blocking engine with WAL mode and foreign keys enabled.
///
/// The pool keeps `pool_size` idle connections and grows to
/// `pool_size + max_overflow` under load.
///
/// # Arguments
///
/// * `url` - SQLite path, optionally prefixed with `sqlite://`. `:memory:`
///   gives every pooled connection its own private database, so tests that
///   need shared state should use a file.
///
/// # Errors
///
/// Returns `EngineError::PoolInit` if the connection pool cannot be created.
pub fn create_sync_engine(url: &str, settings: &EngineSettings) -> Result<SyncEngine, EngineError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let busy_timeout_ms = settings.busy_timeout_ms;

    let manager = SqliteConnectionManager::file(sqlite_path(url))
        .with_flags(flags)
        .with_init(move |conn| {
            // In-memory databases report "memory" which is expected.
            let journal_mode: String =
                conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
            if journal_mode != "wal" && journal_mode != "memory" {
                return Err(rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                    Some(format!(
                        "failed to set WAL journal mode, got: {}",
                        journal_mode
                    )),
                ));
            }
            conn.execute_batch(&format!(
                "PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = {};",
                busy_timeout_ms
            ))
        });

    let pool = Pool::builder()
        .max_size(settings.max_connections())
        .min_idle(Some(settings.pool_size))
        .build(manager)
        .map_err(EngineError::PoolInit)?;

    tracing::debug!(
        pool_size = settings.pool_size,
        max_overflow = settings.max_overflow,
        "created sync engine"
    );

    Ok(SyncEngine {
        pool,
        echo: Echo::new(settings.echo),
    })
}

/// Creates the async engine. No connection is opened until first use.
///
/// Must be called from within a Tokio runtime: the pool spawns its
/// maintenance task on creation.
///
/// # Errors
///
/// Returns `EngineError::Async` if the connection string cannot be parsed.
pub fn create_async_engine(
    url: &str,
    settings: &EngineSettings,
) -> Result<AsyncEngine, EngineError> {
    let path = sqlite_path(url);
    let options = if path == ":memory:" {
        SqliteConnectOptions::from_str("sqlite::memory:")?
    } else {
        SqliteConnectOptions::new().filename(path)
    };
    let options = options
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(settings.busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(settings.max_connections())
        .min_connections(settings.pool_size)
        .connect_lazy_with(options);

    tracing::debug!(
        pool_size = settings.pool_size,
        max_overflow = settings.max_overflow,
        "created async engine"
    );

    Ok(AsyncEngine {
        pool,
        echo: Echo::new(settings.echo),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db() -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().expect("should create temp dir");
        let path = dir.path().join("engine.db");
        let url = format!("sqlite://{}", path.display());
        (dir, url)
    }

    #[test]
    fn sqlite_path_strips_scheme() {
        assert_eq!(sqlite_path("sqlite:///tmp/a.db"), "/tmp/a.db");
        assert_eq!(sqlite_path("sqlite://a.db"), "a.db");
        assert_eq!(sqlite_path("sqlite::memory:"), ":memory:");
        assert_eq!(sqlite_path("plain.db"), "plain.db");
    }

    #[test]
    fn max_connections_is_base_plus_overflow() {
        let settings = EngineSettings {
            pool_size: 5,
            max_overflow: 10,
            ..EngineSettings::default()
        };
        assert_eq!(settings.max_connections(), 15);

        let saturated = EngineSettings {
            pool_size: u32::MAX,
            max_overflow: 1,
            ..EngineSettings::default()
        };
        assert_eq!(saturated.max_connections(), u32::MAX);
    }

    #[test]
    fn create_sync_engine_configures_pool_and_pragmas() {
        let (_dir, url) = temp_db();
        let settings = EngineSettings {
            pool_size: 2,
            max_overflow: 3,
            busy_timeout_ms: 2_500,
            echo: false,
        };

        let engine = create_sync_engine(&url, &settings).expect("engine creation should succeed");
        assert_eq!(engine.pool().max_size(), 5, "max size should be base + overflow");
        assert_eq!(engine.pool().min_idle(), Some(2));

        let conn = engine.connection().expect("should get a connection");

        let mode: String = conn
            .query_row("PRAGMA journal_mode;", [], |row| row.get(0))
            .expect("should query journal_mode");
        assert_eq!(mode, "wal");

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .expect("should query foreign_keys");
        assert_eq!(fk, 1, "foreign keys should be enabled");

        let busy_timeout: i32 = conn
            .query_row("PRAGMA busy_timeout;", [], |row| row.get(0))
            .expect("should query busy_timeout");
        assert_eq!(busy_timeout, 2_500, "busy timeout should match settings");
    }

    #[test]
    fn set_echo_returns_previous_and_is_shared_by_clones() {
        let (_dir, url) = temp_db();
        let engine = create_sync_engine(&url, &EngineSettings::default())
            .expect("engine creation should succeed");
        let clone = engine.clone();

        assert!(!engine.echo());
        assert!(!engine.set_echo(true));
        assert!(clone.echo(), "clones share the echo flag");
        assert!(clone.set_echo(false));
        assert!(!engine.echo());
    }

    #[test]
    fn sync_server_version_reports_sqlite() {
        let (_dir, url) = temp_db();
        let engine = create_sync_engine(&url, &EngineSettings::default())
            .expect("engine creation should succeed");
        let version = engine.server_version().expect("version query should succeed");
        assert!(version.starts_with('3'), "unexpected sqlite version: {version}");
    }

    #[tokio::test]
    async fn create_async_engine_sizes_pool_and_connects_lazily() {
        let (_dir, url) = temp_db();
        let settings = EngineSettings {
            pool_size: 1,
            max_overflow: 4,
            ..EngineSettings::default()
        };

        let engine = create_async_engine(&url, &settings).expect("engine creation should succeed");
        assert_eq!(engine.pool().options().get_max_connections(), 5);
        assert_eq!(engine.pool().options().get_min_connections(), 1);

        let version = engine
            .server_version()
            .await
            .expect("version query should succeed");
        assert!(version.starts_with('3'), "unexpected sqlite version: {version}");

        let (fk,): (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(engine.pool())
            .await
            .expect("should query foreign_keys");
        assert_eq!(fk, 1, "foreign keys should be enabled");
    }
}
