//! Table descriptors with no mapped type, for raw DDL and core-style inserts.
//!
//! These describe the same storage contract as the mapped types in
//! [`crate::declarative`] but are registered in their own [`MetaData`].

use workforce_db::{Column, ColumnType, MetaData, ReferentialAction, Table};

use crate::declarative::{TITLE_MAX_LEN, UTC_NOW};
use crate::workload::Workload;

pub static WORKERS_TABLE: Table = Table::new(
    "workers",
    &[
        Column::new("id", ColumnType::Integer).primary_key(),
        Column::new("username", ColumnType::Text),
    ],
);

pub static RESUME_TABLE: Table = Table::new(
    "resume",
    &[
        Column::new("id", ColumnType::Integer).primary_key(),
        Column::new("title", ColumnType::VarChar(TITLE_MAX_LEN)),
        Column::new("compensation", ColumnType::Integer).nullable(),
        Column::new("workload", ColumnType::Enum(Workload::LITERALS)),
        Column::new("worker_id", ColumnType::Integer).references(
            "workers",
            "id",
            ReferentialAction::Cascade,
        ),
        Column::new("created_at", ColumnType::Timestamp).server_default(UTC_NOW),
        Column::new("updated_at", ColumnType::Timestamp)
            .server_default(UTC_NOW)
            .server_onupdate(UTC_NOW),
    ],
);

/// The standalone metadata registry.
pub fn metadata_obj() -> MetaData {
    MetaData::new()
        .with_table(&WORKERS_TABLE)
        .with_table(&RESUME_TABLE)
}
