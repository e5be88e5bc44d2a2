//! Mapped types for the `workers` and `resume` tables.

use serde::{Deserialize, Serialize};
use workforce_db::{Column, ColumnType, MetaData, Model, ReferentialAction, SqlValue, Table};

use crate::workload::Workload;

/// Server-side UTC "now", in SQLite's `YYYY-MM-DD HH:MM:SS` form.
pub const UTC_NOW: &str = "CURRENT_TIMESTAMP";

/// Maximum length of a resume title.
pub const TITLE_MAX_LEN: u32 = 256;

pub static WORKERS: Table = Table::new(
    "workers",
    &[
        Column::new("id", ColumnType::Integer).primary_key(),
        Column::new("username", ColumnType::Text),
    ],
);

pub static RESUME: Table = Table::new(
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

/// Metadata for every mapped table, referenced tables first.
pub fn metadata() -> MetaData {
    MetaData::new().with_table(&WORKERS).with_table(&RESUME)
}

/// A row of `workers`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    /// Assigned by the store on insert.
    pub id: Option<i64>,
    pub username: String,
}

impl Worker {
    /// A worker not yet written to the store.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: None,
            username: username.into(),
        }
    }
}

impl Model for Worker {
    fn table() -> &'static Table {
        &WORKERS
    }

    fn insert_values(&self) -> Vec<(&'static str, SqlValue)> {
        let mut values = Vec::with_capacity(2);
        if let Some(id) = self.id {
            values.push(("id", id.into()));
        }
        values.push(("username", self.username.as_str().into()));
        values
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            username: row.get("username")?,
        })
    }
}

/// A row of `resume`, owned by one worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resume {
    /// Assigned by the store on insert.
    pub id: Option<i64>,
    pub title: String,
    pub compensation: Option<i64>,
    pub workload: Workload,
    pub worker_id: i64,
    /// Assigned by the store on insert.
    pub created_at: Option<String>,
    /// Assigned by the store on insert and on every update.
    pub updated_at: Option<String>,
}

impl Resume {
    /// A resume not yet written to the store, with no compensation.
    pub fn new(title: impl Into<String>, workload: Workload, worker_id: i64) -> Self {
        Self {
            id: None,
            title: title.into(),
            compensation: None,
            workload,
            worker_id,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_compensation(self, compensation: Option<i64>) -> Self {
        Self {
            compensation,
            ..self
        }
    }
}

impl Model for Resume {
    fn table() -> &'static Table {
        &RESUME
    }

    fn insert_values(&self) -> Vec<(&'static str, SqlValue)> {
        let mut values = Vec::with_capacity(7);
        if let Some(id) = self.id {
            values.push(("id", id.into()));
        }
        values.push(("title", self.title.as_str().into()));
        values.push(("compensation", self.compensation.into()));
        values.push(("workload", self.workload.into()));
        values.push(("worker_id", self.worker_id.into()));
        // Unset timestamps fall back to the server default.
        if let Some(created_at) = &self.created_at {
            values.push(("created_at", created_at.as_str().into()));
        }
        if let Some(updated_at) = &self.updated_at {
            values.push(("updated_at", updated_at.as_str().into()));
        }
        values
    }

    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            title: row.get("title")?,
            compensation: row.get("compensation")?,
            workload: row.get("workload")?,
            worker_id: row.get("worker_id")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_orders_referenced_table_first() {
        let names: Vec<&str> = metadata().tables().iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["workers", "resume"]);
    }

    #[test]
    fn resume_ddl_carries_constraints() {
        let sql = RESUME.create_sql();
        assert!(sql.contains("\"title\" VARCHAR(256) NOT NULL CHECK (length(\"title\") <= 256)"));
        assert!(sql.contains("\"compensation\" INTEGER,"));
        assert!(sql.contains("CHECK (\"workload\" IN ('parttime', 'fulltime'))"));
        assert!(sql.contains("REFERENCES \"workers\"(\"id\") ON DELETE CASCADE"));
        assert!(sql.contains("\"created_at\" TIMESTAMP NOT NULL DEFAULT (CURRENT_TIMESTAMP)"));
    }

    #[test]
    fn new_objects_leave_key_and_timestamps_to_the_store() {
        let worker = Worker::new("Bobr");
        let columns: Vec<&str> = worker.insert_values().iter().map(|(c, _)| *c).collect();
        assert_eq!(columns, vec!["username"]);

        let resume = Resume::new("Engineer", Workload::FullTime, 1);
        let values = resume.insert_values();
        let columns: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
        assert_eq!(
            columns,
            vec!["title", "compensation", "workload", "worker_id"]
        );
        assert_eq!(values[1].1, SqlValue::Null, "absent compensation binds NULL");
        assert_eq!(values[2].1, SqlValue::Text("fulltime".to_string()));
    }

    #[test]
    fn update_statement_refreshes_updated_at() {
        let sql = RESUME.update_sql(&["compensation"]);
        assert!(sql.contains("\"updated_at\" = CURRENT_TIMESTAMP"), "{sql}");
        assert!(!sql.contains("\"created_at\" ="), "{sql}");
    }
}
