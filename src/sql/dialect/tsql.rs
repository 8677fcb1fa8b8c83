//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL has significant differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - No native boolean in SELECT (1/0)
//! - TOP instead of LIMIT
//! - N'...' prefix for Unicode strings
//! - Named `@P1` parameters

use super::helpers;
use super::SqlDialect;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        // For safety, always use N prefix for non-ASCII
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn placeholder(&self, index: usize) -> String {
        helpers::placeholder_numbered("@P", index)
    }

    fn apply_limit(&self, query: &str, limit: u64) -> String {
        // TOP cannot be appended, and OFFSET FETCH needs an ORDER BY
        format!(
            "SELECT TOP {} * FROM (\n{}\n) AS {}",
            limit,
            query,
            self.quote_identifier("_preview")
        )
    }
}
