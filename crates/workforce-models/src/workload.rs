//! Employment workload, stored as one of two text literals.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use workforce_db::SqlValue;

/// How much of a week a position takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Workload {
    #[serde(rename = "parttime")]
    PartTime,
    #[serde(rename = "fulltime")]
    FullTime,
}

impl Workload {
    /// Every storage literal, in declaration order.
    pub const LITERALS: &'static [&'static str] = &["parttime", "fulltime"];

    /// Returns the storage literal for this workload.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PartTime => "parttime",
            Self::FullTime => "fulltime",
        }
    }
}

impl std::fmt::Display for Workload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Workload {
    type Err = ParseWorkloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parttime" => Ok(Self::PartTime),
            "fulltime" => Ok(Self::FullTime),
            _ => Err(ParseWorkloadError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown workload literal.
#[derive(Debug, Clone)]
pub struct ParseWorkloadError(pub String);

impl std::fmt::Display for ParseWorkloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown workload: {}", self.0)
    }
}

impl std::error::Error for ParseWorkloadError {}

impl From<Workload> for SqlValue {
    fn from(w: Workload) -> Self {
        SqlValue::Text(w.as_str().to_string())
    }
}

impl ToSql for Workload {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Workload {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literals_round_trip() {
        for literal in Workload::LITERALS {
            let workload: Workload = literal.parse().expect("known literal");
            assert_eq!(workload.as_str(), *literal);
            assert_eq!(workload.to_string(), *literal);
        }
    }

    #[test]
    fn unknown_literal_is_rejected() {
        let err = "contract".parse::<Workload>().expect_err("unknown literal");
        assert_eq!(err.to_string(), "unknown workload: contract");
        assert!("FullTime".parse::<Workload>().is_err(), "literals are case sensitive");
    }

    #[test]
    fn serde_uses_storage_literals() {
        let json = serde_json::to_string(&Workload::PartTime).expect("serialize");
        assert_eq!(json, "\"parttime\"");
        let parsed: Workload = serde_json::from_str("\"fulltime\"").expect("deserialize");
        assert_eq!(parsed, Workload::FullTime);
    }

    #[test]
    fn sqlite_reads_back_literal() {
        let conn = rusqlite::Connection::open_in_memory().expect("should open in-memory db");
        let read: Workload = conn
            .query_row("SELECT ?1", [Workload::FullTime], |row| row.get(0))
            .expect("should round trip through sqlite");
        assert_eq!(read, Workload::FullTime);

        let bad: rusqlite::Result<Workload> =
            conn.query_row("SELECT 'contract'", [], |row| row.get(0));
        assert!(bad.is_err());
    }
}
