//! Checks and small rewrites on whole report statements.

use std::sync::LazyLock;

use regex::Regex;
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

use super::dialect::{Dialect, SqlDialect};
use super::filter::check_field_name;
use crate::model::QueryKind;

/// Statements a report may never start with.
pub const FORBIDDEN_KEYWORDS: &[&str] = &["DROP", "DELETE", "TRUNCATE", "INSERT", "UPDATE", "ALTER"];

static LIMIT_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\b").unwrap());

static CALL_STATEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^CALL\s+([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?)\s*(?:\(.*\))?\s*;?$")
        .unwrap()
});

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StatementError {
    #[error("Query cannot be empty")]
    Empty,

    #[error("Query cannot start with {0}")]
    Forbidden(&'static str),

    #[error("{kind} query must start with {keyword}")]
    MustStartWith {
        kind: QueryKind,
        keyword: &'static str,
    },

    #[error("Query does not parse: {0}")]
    Unparseable(String),

    #[error("Expected a single SELECT statement, found {0} statements")]
    MultipleStatements(usize),

    #[error("Statement is not a query")]
    NotAQuery,

    #[error("Invalid view name: '{0}'")]
    InvalidViewName(String),

    #[error("Invalid procedure call: '{0}'")]
    InvalidProcedure(String),
}

/// Check `query` is acceptable for a report of the given kind.
pub fn check_statement(query: &str, kind: QueryKind) -> Result<(), StatementError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(StatementError::Empty);
    }

    let upper = query.to_uppercase();
    let first_word = upper
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");
    if let Some(keyword) = FORBIDDEN_KEYWORDS.iter().copied().find(|k| *k == first_word) {
        return Err(StatementError::Forbidden(keyword));
    }

    match kind {
        QueryKind::Sql => {
            if !upper.starts_with("SELECT") {
                return Err(StatementError::MustStartWith {
                    kind,
                    keyword: "SELECT",
                });
            }
            check_single_query(query)
        }
        QueryKind::StoredProcedure => {
            if !upper.starts_with("CALL") {
                return Err(StatementError::MustStartWith {
                    kind,
                    keyword: "CALL",
                });
            }
            procedure_name(query)
                .map(|_| ())
                .ok_or_else(|| StatementError::InvalidProcedure(query.to_string()))
        }
        QueryKind::View => check_field_name(query)
            .map_err(|_| StatementError::InvalidViewName(query.to_string())),
    }
}

fn check_single_query(query: &str) -> Result<(), StatementError> {
    let statements = Parser::parse_sql(&GenericDialect {}, query)
        .map_err(|e| StatementError::Unparseable(e.to_string()))?;

    match statements.as_slice() {
        [Statement::Query(_)] => Ok(()),
        [_] => Err(StatementError::NotAQuery),
        other => Err(StatementError::MultipleStatements(other.len())),
    }
}

/// Procedure name from a `CALL name(...)` statement.
pub fn procedure_name(query: &str) -> Option<String> {
    CALL_STATEMENT
        .captures(query.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Limit a preview query unless it already limits itself.
pub fn with_preview_limit(query: &str, limit: u64, dialect: Dialect) -> String {
    let query = query.trim().trim_end_matches(';').trim_end();
    if LIMIT_KEYWORD.is_match(query) {
        query.to_string()
    } else {
        dialect.apply_limit(query, limit)
    }
}

/// `SELECT * FROM <view>` with the name quoted for `dialect`.
pub fn view_query(name: &str, dialect: Dialect) -> Result<String, StatementError> {
    let name = name.trim();
    check_field_name(name).map_err(|_| StatementError::InvalidViewName(name.to_string()))?;
    Ok(format!("SELECT * FROM {}", dialect.quote_qualified(name)))
}
