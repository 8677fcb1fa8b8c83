//! The database collaborator.
//!
//! Tally never talks to a driver directly. The executor hands finished SQL
//! and bound parameters to a [`Database`] and gets plain records back.

use serde::{Deserialize, Serialize};

use crate::model::{Record, Value};
use crate::sql::Dialect;

/// Errors raised by a database backend.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0} is not supported by this database")]
    Unsupported(String),

    #[error("{0}")]
    Other(String),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// A column of a table or view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// Synchronous access to a relational backend.
///
/// Calls block until the backend answers; timeouts and retries are the
/// implementation's business.
pub trait Database {
    /// Dialect used to render SQL for this backend.
    fn dialect(&self) -> Dialect;

    /// Run a query with positional parameters.
    fn fetch(&self, sql: &str, params: &[Value]) -> DatabaseResult<Vec<Record>>;

    /// Call a stored procedure with positional parameters.
    fn call_procedure(&self, name: &str, params: &[Value]) -> DatabaseResult<Vec<Record>>;

    /// Tables and views, sorted by name.
    fn list_tables(&self) -> DatabaseResult<Vec<String>>;

    /// Columns of `table` in declaration order.
    fn table_columns(&self, table: &str) -> DatabaseResult<Vec<ColumnInfo>>;
}

impl<D: Database + ?Sized> Database for &D {
    fn dialect(&self) -> Dialect {
        (**self).dialect()
    }

    fn fetch(&self, sql: &str, params: &[Value]) -> DatabaseResult<Vec<Record>> {
        (**self).fetch(sql, params)
    }

    fn call_procedure(&self, name: &str, params: &[Value]) -> DatabaseResult<Vec<Record>> {
        (**self).call_procedure(name, params)
    }

    fn list_tables(&self) -> DatabaseResult<Vec<String>> {
        (**self).list_tables()
    }

    fn table_columns(&self, table: &str) -> DatabaseResult<Vec<ColumnInfo>> {
        (**self).table_columns(table)
    }
}
