//! SQL dialect definitions and formatting rules.
//!
//! Report queries are written by users in the backend's own SQL, so Tally
//! only needs the dialect differences that show up in the SQL it generates
//! around them:
//!
//! - Identifier quoting: `"` (PG/DuckDB), `` ` `` (MySQL/SQLite), `[]` (T-SQL)
//! - Bind placeholders: `?` vs `$1` vs `@P1`
//! - Row limiting: `LIMIT n` vs `TOP n`
//! - Literal formatting for inlined SQL shown to users
//!
//! # Usage
//!
//! ```ignore
//! use tally::sql::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Postgres;
//! let quoted = dialect.quote_identifier("user");  // "user"
//! let ph = dialect.placeholder(1);                // $1
//! ```

mod duckdb;
pub mod helpers;
mod mysql;
mod postgres;
mod sqlite;
mod tsql;

pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use postgres::Postgres;
pub use sqlite::Sqlite;
pub use tsql::TSql;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::UnknownVariant;

/// SQL dialect trait - defines how generated SQL is rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, column, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a possibly schema-qualified name (`schema.table`), part by part.
    fn quote_qualified(&self, name: &str) -> String {
        name.split('.')
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    fn format_bool(&self, b: bool) -> &'static str;

    /// Format a NULL literal.
    fn format_null(&self) -> &'static str {
        "NULL"
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// Bind placeholder for the 1-based parameter `index`.
    ///
    /// - SQLite/MySQL/DuckDB: `?`
    /// - PostgreSQL: `$1`
    /// - T-SQL: `@P1`
    fn placeholder(&self, index: usize) -> String {
        let _ = index;
        "?".to_string()
    }

    // =========================================================================
    // Row Limiting
    // =========================================================================

    /// Limit `query` to at most `limit` rows.
    ///
    /// - Default: `<query>` then `LIMIT n` on its own line
    /// - T-SQL: `SELECT TOP n * FROM (<query>) AS ...` (override)
    fn apply_limit(&self, query: &str, limit: u64) -> String {
        format!("{}\nLIMIT {}", query, limit)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    DuckDb,
    Postgres,
    MySql,
    TSql,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Sqlite => &Sqlite,
            Dialect::DuckDb => &DuckDb,
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::TSql => &TSql,
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_null(&self) -> &'static str {
        self.dialect().format_null()
    }

    fn placeholder(&self, index: usize) -> String {
        self.dialect().placeholder(index)
    }

    fn apply_limit(&self, query: &str, limit: u64) -> String {
        self.dialect().apply_limit(query, limit)
    }
}

impl FromStr for Dialect {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "duckdb" | "duck" => Ok(Dialect::DuckDb),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "tsql" | "mssql" | "sqlserver" => Ok(Dialect::TSql),
            _ => Err(UnknownVariant {
                kind: "dialect",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}
