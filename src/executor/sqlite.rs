//! SQLite backend.

use std::path::Path;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params, params_from_iter, Connection, ToSql};

use super::database::{ColumnInfo, Database, DatabaseError, DatabaseResult};
use crate::model::{Record, Value};
use crate::sql::Dialect;

/// A SQLite database file or in-memory database.
pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing and demos).
    pub fn open_in_memory() -> DatabaseResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Run one or more statements without results (schema setup).
    pub fn execute_batch(&self, sql: &str) -> DatabaseResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteDatabase")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Database for SqliteDatabase {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn fetch(&self, sql: &str, params: &[Value]) -> DatabaseResult<Vec<Record>> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            let mut record = Record::with_capacity(columns.len());
            for (i, name) in columns.iter().enumerate() {
                record.insert(name.as_str(), from_sql_ref(row.get_ref(i)?));
            }
            records.push(record);
        }

        Ok(records)
    }

    fn call_procedure(&self, name: &str, _params: &[Value]) -> DatabaseResult<Vec<Record>> {
        Err(DatabaseError::Unsupported(format!(
            "Stored procedure call '{}'",
            name
        )))
    }

    fn list_tables(&self) -> DatabaseResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn table_columns(&self, table: &str) -> DatabaseResult<Vec<ColumnInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT name, type, \"notnull\" FROM pragma_table_info(?) ORDER BY cid",
        )?;
        let columns = stmt
            .query_map(params![table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    data_type: row.get(1)?,
                    nullable: row.get::<_, i64>(2)? == 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Bool(b) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(i64::from(*b))),
            Value::Int(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Float(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Date(_) | Value::DateTime(_) => {
                ToSqlOutput::Owned(rusqlite::types::Value::Text(self.to_display()))
            }
        })
    }
}

fn from_sql_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
