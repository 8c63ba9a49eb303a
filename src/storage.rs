//! Storage collaborator interface.
//!
//! The mapper never talks SQL directly; every statement goes through an
//! implementation of [`Storage`]. [`SqliteStore`](crate::sqlite::SqliteStore)
//! is the implementation shipped with this crate.

use crate::sqlite::{ColumnValues, Row, TableDefinition, Value};

/// Executes single-table statements on behalf of a [`Dao`](crate::Dao).
///
/// Every method is one blocking statement. Atomicity and locking are whatever
/// the implementation provides for a single statement.
pub trait Storage: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create `table` unless it already exists.
    fn create_table(&self, table: &TableDefinition) -> Result<(), Self::Error>;

    /// Insert one row and return the row id assigned by the store.
    fn insert(&self, table: &str, values: &ColumnValues) -> Result<i64, Self::Error>;

    /// Overwrite `values` on rows where `column = predicate`. Returns the
    /// number of affected rows.
    fn update(
        &self,
        table: &str,
        values: &ColumnValues,
        column: &str,
        predicate: &Value,
    ) -> Result<usize, Self::Error>;

    /// Delete rows where `column = predicate`. Returns the number of
    /// affected rows.
    fn delete(&self, table: &str, column: &str, predicate: &Value) -> Result<usize, Self::Error>;

    /// First row where `column = predicate`, if any.
    fn query_one(
        &self,
        table: &str,
        column: &str,
        predicate: &Value,
    ) -> Result<Option<Row>, Self::Error>;

    /// Every row of `table`, in storage order.
    fn query_all(&self, table: &str) -> Result<Vec<Row>, Self::Error>;
}
