//! The paired engines and session factories, built from one settings value.

use crate::engine::{
    create_async_engine, create_sync_engine, AsyncEngine, DatabaseSettings, EngineError,
    SyncEngine,
};
use crate::session::{AsyncSessionFactory, SessionFactory};

/// How a database operation reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionMode {
    /// Through the blocking engine, on Tokio's blocking thread pool.
    #[default]
    Blocking,
    /// Through the async engine.
    Async,
}

impl ExecutionMode {
    /// Returns the canonical string label for this mode.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Blocking => "blocking",
            Self::Async => "async",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExecutionMode {
    type Err = ParseExecutionModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blocking" | "sync" => Ok(Self::Blocking),
            "async" => Ok(Self::Async),
            _ => Err(ParseExecutionModeError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown execution mode string.
#[derive(Debug, Clone)]
pub struct ParseExecutionModeError(pub String);

impl std::fmt::Display for ParseExecutionModeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown execution mode: {}", self.0)
    }
}

impl std::error::Error for ParseExecutionModeError {}

/// Both engines and their session factories.
///
/// The two engines are independent pools against the same store; nothing
/// orders work submitted to one relative to the other.
#[derive(Clone)]
pub struct Database {
    sync_engine: SyncEngine,
    async_engine: AsyncEngine,
    sessions: SessionFactory,
    async_sessions: AsyncSessionFactory,
}

impl Database {
    /// Builds both engines from `settings`. Must be called from within a
    /// Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` if either pool cannot be created.
    pub fn connect(settings: &DatabaseSettings) -> Result<Self, EngineError> {
        let sync_engine = create_sync_engine(&settings.url_sync, &settings.engine)?;
        let async_engine = create_async_engine(&settings.url_async, &settings.engine)?;
        Ok(Self {
            sessions: SessionFactory::new(sync_engine.clone()),
            async_sessions: AsyncSessionFactory::new(async_engine.clone()),
            sync_engine,
            async_engine,
        })
    }

    pub fn sync_engine(&self) -> &SyncEngine {
        &self.sync_engine
    }

    pub fn async_engine(&self) -> &AsyncEngine {
        &self.async_engine
    }

    pub fn sessions(&self) -> &SessionFactory {
        &self.sessions
    }

    pub fn async_sessions(&self) -> &AsyncSessionFactory {
        &self.async_sessions
    }
}
