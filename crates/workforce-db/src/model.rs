//! Declarative mapping: types that know which table they live in.

use rusqlite::types::{ToSql, ToSqlOutput, Value};

use crate::schema::Table;

/// A bound parameter value, usable by both drivers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(v) => ToSqlOutput::Owned(Value::Integer(*v)),
            SqlValue::Text(v) => ToSqlOutput::from(v.as_str()),
        })
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// A type mapped onto a [`Table`].
///
/// Implementors list the column values to write on insert; columns left out
/// (an unassigned primary key, server-defaulted timestamps) are filled in by
/// the store.
pub trait Model: Sized {
    /// The table this type is mapped onto.
    fn table() -> &'static Table;

    /// Column/value pairs to write when the object is inserted.
    fn insert_values(&self) -> Vec<(&'static str, SqlValue)>;

    /// Builds an object from a row selected with [`Table::select_sql`].
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self>;
}

/// One object waiting in a session, already reduced to its insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingInsert {
    pub(crate) table: &'static Table,
    pub(crate) columns: Vec<&'static str>,
    pub(crate) values: Vec<SqlValue>,
}

impl PendingInsert {
    pub(crate) fn from_model<M: Model>(obj: &M) -> Self {
        let (columns, values): (Vec<_>, Vec<_>) = obj.insert_values().into_iter().unzip();
        Self {
            table: M::table(),
            columns,
            values,
        }
    }

    pub(crate) fn sql(&self) -> String {
        if self.columns.is_empty() {
            format!(
                "INSERT INTO {} DEFAULT VALUES",
                crate::schema::quote_ident(self.table.name)
            )
        } else {
            self.table.insert_sql(&self.columns, 1)
        }
    }
}
