//! Database layer for the workforce demo.
//!
//! Provides the two engines (a blocking `r2d2`/`rusqlite` pool and an async
//! `sqlx` pool) over one SQLite store, the session factories that turn
//! mapped objects into committed rows, and the table metadata used to create
//! and drop the schema.
//!
//! # Design decisions
//!
//! - **Two drivers, one store**: the blocking and async engines are separate
//!   pools. They share nothing but the database file.
//! - **Pool sizing**: each pool keeps `pool_size` connections and may grow by
//!   `max_overflow` more under load.
//! - **Foreign keys on every connection**: cascading deletes depend on
//!   `PRAGMA foreign_keys`, which SQLite leaves off by default.
//! - **Storage-enforced bounds**: bounded text and enumerated columns render
//!   as CHECK constraints, since SQLite ignores declared lengths.

mod database;
mod engine;
mod model;
mod schema;
mod session;

pub use database::{Database, ExecutionMode, ParseExecutionModeError};
pub use engine::{
    create_async_engine, create_sync_engine, sqlite_path, AsyncEngine, DatabaseSettings,
    DbConnection, DbPool, EngineError, EngineSettings, SyncEngine,
};
pub use model::{Model, SqlValue};
pub use schema::{
    quote_ident, Column, ColumnType, ForeignKey, MetaData, ReferentialAction, SchemaError, Table,
};
pub use session::{bind_value, AsyncSession, AsyncSessionFactory, Session, SessionError, SessionFactory};
