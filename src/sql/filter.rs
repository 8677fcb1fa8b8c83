//! Filter specs to SQL predicates.
//!
//! Two assemblers live here:
//!
//! ```text
//! FilterSpec ──┬── render_fragment / splice_filters ──► SQL text   (legacy)
//!              │
//!              └── build_predicates ──► Predicate[] ──► parameterize ──► sql + params
//! ```
//!
//! The legacy path interpolates values straight into the query text and
//! must only be used for display or for definitions that were written
//! against it. The executor always uses the parameterized path.

use std::sync::LazyLock;

use regex::Regex;

use super::dialect::{Dialect, SqlDialect};
use crate::model::{FilterOperator, FilterSpec, Value};

/// Result type for filter assembly.
pub type FilterResult<T> = Result<T, FilterError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("Invalid filter operator: '{0}'")]
    InvalidFilterOperator(String),

    #[error("Invalid field name: '{0}'")]
    InvalidFieldName(String),

    #[error("IN filter on '{0}' has no values")]
    EmptyInList(String),
}

/// Plain or `table.column` identifier.
static FIELD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap());

static WHERE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bWHERE\b").unwrap());

/// Reject anything that is not a plain identifier.
pub fn check_field_name(field: &str) -> FilterResult<()> {
    if FIELD_NAME.is_match(field) {
        Ok(())
    } else {
        Err(FilterError::InvalidFieldName(field.to_string()))
    }
}

// =============================================================================
// Legacy textual assembly
// =============================================================================

/// Render one filter as a SQL fragment.
///
/// Values are interpolated without escaping. Never feed this user input
/// that reaches a database.
pub fn render_fragment(filter: &FilterSpec) -> String {
    let field = &filter.field;
    let value = filter.value.as_deref().unwrap_or("");

    match filter.operator {
        FilterOperator::Eq => format!("{} = '{}'", field, value),
        FilterOperator::Ne => format!("{} != '{}'", field, value),
        FilterOperator::Gt => format!("{} > {}", field, value),
        FilterOperator::Lt => format!("{} < {}", field, value),
        FilterOperator::Like => format!("{} LIKE '%{}%'", field, value),
        FilterOperator::In => {
            let items = value.split(',').collect::<Vec<_>>().join("', '");
            format!("{} IN ('{}')", field, items)
        }
    }
}

/// Splice filter fragments into `base`.
///
/// Conditions go right after the first `WHERE` keyword, followed by `AND`,
/// or are appended as a new `WHERE` clause when the query has none.
pub fn splice_filters(base: &str, filters: &[FilterSpec]) -> String {
    if filters.is_empty() {
        return base.to_string();
    }

    let clause = filters
        .iter()
        .map(render_fragment)
        .collect::<Vec<_>>()
        .join(" AND ");

    match WHERE_KEYWORD.find(base) {
        Some(m) => format!(
            "{} {} AND{}",
            &base[..m.end()],
            clause,
            &base[m.end()..]
        ),
        None => format!("{} WHERE {}", base, clause),
    }
}

// =============================================================================
// Parameterized assembly
// =============================================================================

/// A filter condition with its values kept out of the SQL text.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub field: String,
    pub operator: FilterOperator,
    /// One value, or one per item for `IN`.
    pub params: Vec<Value>,
}

impl Predicate {
    /// Column name as seen from outside the wrapped query.
    ///
    /// `si.customer` is exposed by the derived table as `customer`.
    pub fn column(&self) -> &str {
        self.field.rsplit('.').next().unwrap_or(&self.field)
    }
}

/// Build predicates from filter specs.
pub fn build_predicates(filters: &[FilterSpec]) -> FilterResult<Vec<Predicate>> {
    filters.iter().map(build_predicate).collect()
}

fn build_predicate(filter: &FilterSpec) -> FilterResult<Predicate> {
    check_field_name(&filter.field)?;

    let raw = filter.value.as_deref().unwrap_or("");
    let params = match filter.operator {
        FilterOperator::Eq | FilterOperator::Ne => vec![Value::from(raw)],
        FilterOperator::Gt | FilterOperator::Lt => vec![parse_comparable(raw)],
        FilterOperator::Like => vec![Value::Text(format!("%{}%", raw))],
        FilterOperator::In => {
            let items: Vec<Value> = raw
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(Value::from)
                .collect();
            if items.is_empty() {
                return Err(FilterError::EmptyInList(filter.field.clone()));
            }
            items
        }
    };

    Ok(Predicate {
        field: filter.field.clone(),
        operator: filter.operator,
        params,
    })
}

/// `>` and `<` compare numerically when the value is a number.
fn parse_comparable(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::Int(i);
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::from(raw),
    }
}

/// SQL text plus the values bound to its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterizedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Wrap `base` as a derived table and filter it with bound parameters.
///
/// ```text
/// SELECT * FROM (
/// <base>
/// ) AS "_report" WHERE "f" = $1 AND "g" IN ($2, $3)
/// ```
///
/// `base` sits on lines of its own so a trailing `--` comment ends there.
pub fn parameterize(base: &str, predicates: &[Predicate], dialect: Dialect) -> ParameterizedQuery {
    if predicates.is_empty() {
        return ParameterizedQuery {
            sql: base.to_string(),
            params: Vec::new(),
        };
    }

    let mut params = Vec::new();
    let sql = assemble(base, predicates, dialect, |value| {
        params.push(value.clone());
        dialect.placeholder(params.len())
    });

    ParameterizedQuery { sql, params }
}

/// Same shape as [`parameterize`] with the values inlined as literals.
///
/// For showing users the statement; execute [`parameterize`] output instead.
pub fn inline(base: &str, predicates: &[Predicate], dialect: Dialect) -> String {
    if predicates.is_empty() {
        return base.to_string();
    }
    assemble(base, predicates, dialect, |value| literal(value, dialect))
}

fn assemble<F>(base: &str, predicates: &[Predicate], dialect: Dialect, mut bind: F) -> String
where
    F: FnMut(&Value) -> String,
{
    let base = base.trim().trim_end_matches(';').trim_end();

    let conditions = predicates
        .iter()
        .map(|predicate| {
            let column = dialect.quote_identifier(predicate.column());
            let op = match predicate.operator {
                FilterOperator::Eq => "=",
                FilterOperator::Ne => "<>",
                FilterOperator::Gt => ">",
                FilterOperator::Lt => "<",
                FilterOperator::Like => "LIKE",
                FilterOperator::In => {
                    let list = predicate
                        .params
                        .iter()
                        .map(&mut bind)
                        .collect::<Vec<_>>()
                        .join(", ");
                    return format!("{} IN ({})", column, list);
                }
            };
            let rhs = predicate
                .params
                .first()
                .map(&mut bind)
                .unwrap_or_else(|| dialect.format_null().to_string());
            format!("{} {} {}", column, op, rhs)
        })
        .collect::<Vec<_>>()
        .join(" AND ");

    format!(
        "SELECT * FROM (\n{}\n) AS {} WHERE {}",
        base,
        dialect.quote_identifier("_report"),
        conditions
    )
}

fn literal(value: &Value, dialect: Dialect) -> String {
    match value {
        Value::Null => dialect.format_null().to_string(),
        Value::Bool(b) => dialect.format_bool(*b).to_string(),
        Value::Int(_) | Value::Float(_) => value.to_display(),
        Value::Text(s) => dialect.quote_string(s),
        Value::Date(_) | Value::DateTime(_) => dialect.quote_string(&value.to_display()),
    }
}
