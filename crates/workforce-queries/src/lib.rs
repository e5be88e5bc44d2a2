//! Table management and insert procedures for the workforce demo.
//!
//! Procedures come in two styles over the same schema:
//!
//! | Module | Builds statements from | Writes through |
//! |--------|------------------------|----------------|
//! | [`core`] | standalone table descriptors | raw multi-row `INSERT` on the blocking engine |
//! | [`orm`] | mapped types | sessions on either engine, picked by [`ExecutionMode`] |
//!
//! Table creation is destructive in both styles: every known table is
//! dropped and recreated.
//!
//! # Usage
//!
//! ```rust,ignore
//! use workforce_db::{Database, ExecutionMode};
//! use workforce_queries::{core, orm};
//!
//! let db = Database::connect(&settings)?;
//! core::create_tables(db.sync_engine())?;
//! core::insert_data(db.sync_engine())?;
//! let ids = orm::insert_data(&db, ExecutionMode::Async).await?;
//! ```
//!
//! [`ExecutionMode`]: workforce_db::ExecutionMode

pub mod core;
mod error;
pub mod orm;

pub use error::QueryError;
