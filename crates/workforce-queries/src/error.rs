//! Error types for the query procedures.

use workforce_db::{EngineError, SchemaError, SessionError};

/// Errors that can occur while running a query procedure.
///
/// Driver and toolkit failures are carried unchanged as the source.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// A statement on the blocking driver failed.
    #[error("query database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An engine could not hand out a connection.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Creating or dropping tables failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Committing a session failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A commit reported no row id for an inserted object.
    #[error("commit returned no row id")]
    MissingRowId,

    /// A blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
