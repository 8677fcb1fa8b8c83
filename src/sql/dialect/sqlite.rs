//! SQLite SQL dialect.
//!
//! SQLite features:
//! - Backtick identifier quoting. A double-quoted name that matches no
//!   column is read as a string literal, backticks never are
//! - No boolean type (1/0)
//! - `?` positional parameters
//! - LIMIT ... OFFSET ... for pagination

use super::helpers;
use super::SqlDialect;

/// SQLite SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    // Uses default placeholder (?) and apply_limit (LIMIT n)
}
