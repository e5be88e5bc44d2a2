//! Imperative schema descriptors: tables, columns, and the metadata registry.
//!
//! A [`Table`] is a `const`-constructible description of one table. A
//! [`MetaData`] collects tables in dependency order and issues the DDL to
//! create or drop all of them through a [`SyncEngine`].

use thiserror::Error;

use crate::engine::{EngineError, SyncEngine};

/// Referential action for foreign key constraints (`ON DELETE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferentialAction {
    /// Raise an error if any references exist.
    #[default]
    NoAction,
    /// Same as `NoAction`, checked immediately.
    Restrict,
    /// Delete referencing rows along with the referenced row.
    Cascade,
    /// Set referencing columns to NULL.
    SetNull,
}

impl ReferentialAction {
    /// Get the SQL representation of this action.
    pub const fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
        }
    }
}

/// Storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// 64-bit integer.
    Integer,
    /// Unbounded text.
    Text,
    /// Text bounded to the given number of characters.
    VarChar(u32),
    /// Text restricted to a closed set of literals.
    Enum(&'static [&'static str]),
    /// UTC timestamp stored as `YYYY-MM-DD HH:MM:SS` text.
    Timestamp,
}

impl ColumnType {
    fn sql_type(&self) -> String {
        match self {
            ColumnType::Integer => "INTEGER".to_string(),
            ColumnType::Text => "TEXT".to_string(),
            ColumnType::VarChar(len) => format!("VARCHAR({len})"),
            ColumnType::Enum(variants) => {
                let len = variants.iter().map(|v| v.len()).max().unwrap_or(0);
                format!("VARCHAR({len})")
            }
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
        }
    }

    // SQLite ignores declared lengths, so bounds are enforced with CHECKs.
    fn check_constraint(&self, column: &str) -> Option<String> {
        let column = quote_ident(column);
        match self {
            ColumnType::VarChar(len) => Some(format!("CHECK (length({column}) <= {len})")),
            ColumnType::Enum(variants) => {
                let literals: Vec<String> = variants
                    .iter()
                    .map(|v| format!("'{}'", v.replace('\'', "''")))
                    .collect();
                Some(format!("CHECK ({column} IN ({}))", literals.join(", ")))
            }
            _ => None,
        }
    }
}

/// Foreign key reference from one column to `table.column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
    pub on_delete: ReferentialAction,
}

/// One column of a [`Table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub primary_key: bool,
    pub nullable: bool,
    /// SQL expression the server evaluates when a row is inserted without
    /// this column.
    pub server_default: Option<&'static str>,
    /// SQL expression the server evaluates on every update of the row.
    pub server_onupdate: Option<&'static str>,
    pub foreign_key: Option<ForeignKey>,
}

impl Column {
    /// A non-null column with no default.
    pub const fn new(name: &'static str, ty: ColumnType) -> Self {
        Self {
            name,
            ty,
            primary_key: false,
            nullable: false,
            server_default: None,
            server_onupdate: None,
            foreign_key: None,
        }
    }

    pub const fn primary_key(self) -> Self {
        Self {
            primary_key: true,
            ..self
        }
    }

    pub const fn nullable(self) -> Self {
        Self {
            nullable: true,
            ..self
        }
    }

    pub const fn server_default(self, expr: &'static str) -> Self {
        Self {
            server_default: Some(expr),
            ..self
        }
    }

    pub const fn server_onupdate(self, expr: &'static str) -> Self {
        Self {
            server_onupdate: Some(expr),
            ..self
        }
    }

    pub const fn references(
        self,
        table: &'static str,
        column: &'static str,
        on_delete: ReferentialAction,
    ) -> Self {
        Self {
            foreign_key: Some(ForeignKey {
                table,
                column,
                on_delete,
            }),
            ..self
        }
    }

    fn definition(&self) -> String {
        let mut parts = vec![quote_ident(self.name), self.ty.sql_type()];
        if self.primary_key {
            parts.push("PRIMARY KEY".to_string());
        } else if !self.nullable {
            parts.push("NOT NULL".to_string());
        }
        if let Some(expr) = self.server_default {
            parts.push(format!("DEFAULT ({expr})"));
        }
        if let Some(check) = self.ty.check_constraint(self.name) {
            parts.push(check);
        }
        if let Some(fk) = self.foreign_key {
            parts.push(format!(
                "REFERENCES {}({}) ON DELETE {}",
                quote_ident(fk.table),
                quote_ident(fk.column),
                fk.on_delete.as_sql()
            ));
        }
        parts.join(" ")
    }
}

/// Quotes an identifier for SQLite, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A table descriptor, independent of any mapped type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: &'static [Column],
}

impl Table {
    pub const fn new(name: &'static str, columns: &'static [Column]) -> Self {
        Self { name, columns }
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The primary key column, if the table declares one.
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.primary_key)
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table.
    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.definition()))
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            quote_ident(self.name),
            columns.join(",\n")
        )
    }

    /// `DROP TABLE IF EXISTS` statement for this table.
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", quote_ident(self.name))
    }

    /// Multi-row `INSERT` with numbered placeholders, row-major.
    ///
    /// `rows` must be at least 1.
    pub fn insert_sql(&self, columns: &[&str], rows: usize) -> String {
        let names: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        let tuples: Vec<String> = (0..rows)
            .map(|row| {
                let placeholders: Vec<String> = (1..=columns.len())
                    .map(|i| format!("?{}", row * columns.len() + i))
                    .collect();
                format!("({})", placeholders.join(", "))
            })
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_ident(self.name),
            names.join(", "),
            tuples.join(", ")
        )
    }

    /// `UPDATE ... WHERE <pk> = ?` assigning `columns` from placeholders.
    ///
    /// Columns declared with a server on-update expression are re-assigned
    /// by that expression in the same statement. The key binds last; tables
    /// without a declared primary key are matched on `rowid`.
    pub fn update_sql(&self, columns: &[&str]) -> String {
        let key = self
            .primary_key()
            .map_or_else(|| "rowid".to_string(), |pk| quote_ident(pk.name));
        let mut assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ?{}", quote_ident(c), i + 1))
            .collect();
        assignments.extend(
            self.columns
                .iter()
                .filter(|c| !columns.contains(&c.name))
                .filter_map(|c| {
                    c.server_onupdate
                        .map(|expr| format!("{} = {expr}", quote_ident(c.name)))
                }),
        );
        format!(
            "UPDATE {} SET {} WHERE {key} = ?{}",
            quote_ident(self.name),
            assignments.join(", "),
            columns.len() + 1
        )
    }

    /// `SELECT` of every column ordered by primary key.
    pub fn select_sql(&self) -> String {
        let names: Vec<String> = self.columns.iter().map(|c| quote_ident(c.name)).collect();
        let order = self
            .primary_key()
            .map(|pk| format!(" ORDER BY {}", quote_ident(pk.name)))
            .unwrap_or_default();
        format!(
            "SELECT {} FROM {}{order}",
            names.join(", "),
            quote_ident(self.name)
        )
    }
}

/// Errors that can occur while creating or dropping tables.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// No connection could be obtained from the engine.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A DDL statement failed.
    #[error("ddl for table '{table}' failed: {source}")]
    Ddl {
        /// The table whose statement failed.
        table: String,
        /// The underlying SQLite error.
        source: rusqlite::Error,
    },
}

/// A registry of tables, kept in dependency order (referenced tables first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaData {
    tables: Vec<&'static Table>,
}

impl MetaData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table after those already present.
    pub fn with_table(mut self, table: &'static Table) -> Self {
        self.tables.push(table);
        self
    }

    pub fn tables(&self) -> &[&'static Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&'static Table> {
        self.tables.iter().copied().find(|t| t.name == name)
    }

    /// Creates every registered table that does not exist yet, in one
    /// transaction.
    pub fn create_all(&self, engine: &SyncEngine) -> Result<(), SchemaError> {
        let statements: Vec<(&str, String)> =
            self.tables.iter().map(|t| (t.name, t.create_sql())).collect();
        run_ddl(engine, &statements)?;
        tracing::debug!(tables = self.tables.len(), "created tables");
        Ok(())
    }

    /// Drops every registered table that exists, dependents first, in one
    /// transaction.
    pub fn drop_all(&self, engine: &SyncEngine) -> Result<(), SchemaError> {
        let statements: Vec<(&str, String)> = self
            .tables
            .iter()
            .rev()
            .map(|t| (t.name, t.drop_sql()))
            .collect();
        run_ddl(engine, &statements)?;
        tracing::debug!(tables = self.tables.len(), "dropped tables");
        Ok(())
    }
}

fn run_ddl(engine: &SyncEngine, statements: &[(&str, String)]) -> Result<(), SchemaError> {
    let mut conn = engine.connection()?;
    let tx = conn.transaction().map_err(|e| SchemaError::Ddl {
        table: String::new(),
        source: e,
    })?;

    for (table, sql) in statements {
        engine.log_statement(sql);
        tx.execute_batch(sql).map_err(|e| SchemaError::Ddl {
            table: (*table).to_string(),
            source: e,
        })?;
    }

    tx.commit().map_err(|e| SchemaError::Ddl {
        table: String::new(),
        source: e,
    })
}
