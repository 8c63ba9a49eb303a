use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};

use crate::storage::Storage;

/// Raw cell values as SQLite stores them
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Blob(_) => "blob",
        }
    }

    /// Textual form used when the value is bound as a key predicate.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null | Value::Blob(_) => None,
            Value::Integer(v) => Some(v.to_string()),
            Value::Real(v) => Some(v.to_string()),
            Value::Text(v) => Some(v.clone()),
        }
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::Integer(v),
            ValueRef::Real(v) => Value::Real(v),
            ValueRef::Text(v) => Value::Text(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Value::Blob(v.to_vec()),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Blob(v) => ToSqlOutput::Borrowed(ValueRef::Blob(v)),
        })
    }
}

/// Ordered column-value map produced by encoding one entity
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ColumnValues {
    pub values: Vec<(String, Value)>,
}

impl ColumnValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value, replacing an earlier value under the same name
    pub fn insert(&mut self, name: &str, value: Value) {
        match self.values.iter_mut().find(|(column, _)| column == name) {
            Some((_, existing)) => *existing = value,
            None => self.values.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(column, _)| column.as_str())
    }
}

/// One result row: named cells in select order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cell(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.cells.push((name.to_string(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Physical table definition used to create the table
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ColumnDefinition::sql)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({});",
            quote(&self.name),
            columns
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub constraints: Vec<ColumnConstraint>,
}

impl ColumnDefinition {
    fn sql(&self) -> String {
        let mut sql = format!("{} {}", quote(&self.name), self.data_type.sql());
        for constraint in &self.constraints {
            sql.push(' ');
            sql.push_str(constraint.sql());
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Text,
    Real,
    Blob,
}

impl DataType {
    pub fn sql(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Real => "REAL",
            DataType::Blob => "BLOB",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnConstraint {
    PrimaryKey,
}

impl ColumnConstraint {
    fn sql(&self) -> &'static str {
        match self {
            ColumnConstraint::PrimaryKey => "PRIMARY KEY",
        }
    }
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// [`Storage`] backed by one SQLite connection.
///
/// The connection sits behind a mutex so a single store can serve DAOs on
/// several threads; each call holds the lock for exactly one statement.
#[derive(Debug)]
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let path = path.as_ref();
        log::info!("opening sqlite store at path: {}", path.display());
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        log::info!("opening in-memory sqlite store");
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    pub fn user_version(&self) -> rusqlite::Result<u32> {
        self.lock()
            .query_row("PRAGMA user_version", [], |row| row.get(0))
    }

    pub fn set_user_version(&self, version: u32) -> rusqlite::Result<()> {
        self.lock().pragma_update(None, "user_version", version)
    }

    /// Names of the user tables present in the database.
    pub fn table_names(&self) -> rusqlite::Result<Vec<String>> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>();
        names
    }

    /// A poisoned lock still guards a valid connection; SQLite rolled back
    /// whatever statement the panicking thread had in flight.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn read_rows(
        conn: &Connection,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> rusqlite::Result<Vec<Row>> {
        log::trace!("{sql}");
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let rows = stmt.query_map(params, |row| {
            let mut cells = Vec::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                cells.push((name.clone(), Value::from(row.get_ref(index)?)));
            }
            Ok(Row { cells })
        })?;
        rows.collect()
    }
}

impl Storage for SqliteStore {
    type Error = rusqlite::Error;

    fn create_table(&self, table: &TableDefinition) -> rusqlite::Result<()> {
        let sql = table.create_sql();
        log::info!("creating table {}", table.name);
        log::trace!("{sql}");
        self.lock().execute_batch(&sql)
    }

    fn insert(&self, table: &str, values: &ColumnValues) -> rusqlite::Result<i64> {
        let conn = self.lock();
        let sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote(table))
        } else {
            let columns = values.columns().map(quote).collect::<Vec<_>>().join(", ");
            let placeholders = (1..=values.len())
                .map(|i| format!("?{i}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote(table),
                columns,
                placeholders
            )
        };
        log::trace!("{sql}");
        conn.execute(&sql, params_from_iter(values.values.iter().map(|(_, v)| v)))?;
        Ok(conn.last_insert_rowid())
    }

    fn update(
        &self,
        table: &str,
        values: &ColumnValues,
        column: &str,
        predicate: &Value,
    ) -> rusqlite::Result<usize> {
        if values.is_empty() {
            return Ok(0);
        }
        let assignments = values
            .columns()
            .enumerate()
            .map(|(i, name)| format!("{} = ?{}", quote(name), i + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote(table),
            assignments,
            quote(column),
            values.len() + 1
        );
        log::trace!("{sql}");
        let params = values
            .values
            .iter()
            .map(|(_, v)| v)
            .chain(std::iter::once(predicate));
        self.lock().execute(&sql, params_from_iter(params))
    }

    fn delete(&self, table: &str, column: &str, predicate: &Value) -> rusqlite::Result<usize> {
        let sql = format!("DELETE FROM {} WHERE {} = ?1", quote(table), quote(column));
        log::trace!("{sql}");
        self.lock().execute(&sql, [predicate])
    }

    fn query_one(
        &self,
        table: &str,
        column: &str,
        predicate: &Value,
    ) -> rusqlite::Result<Option<Row>> {
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1 LIMIT 1",
            quote(table),
            quote(column)
        );
        let conn = self.lock();
        let rows = Self::read_rows(&conn, &sql, &[predicate as &dyn ToSql])?;
        Ok(rows.into_iter().next())
    }

    fn query_all(&self, table: &str) -> rusqlite::Result<Vec<Row>> {
        let sql = format!("SELECT * FROM {}", quote(table));
        let conn = self.lock();
        Self::read_rows(&conn, &sql, &[])
    }
}
