//! Enumerations shared by report definitions and the query pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::sql::filter::FilterError;

/// Error for a string that names none of an enum's variants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// How the report query text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QueryKind {
    /// A SELECT statement.
    #[default]
    #[serde(rename = "SQL", alias = "RAW_SQL")]
    Sql,
    /// A `CALL proc(...)` statement.
    #[serde(rename = "STORED_PROCEDURE")]
    StoredProcedure,
    /// The name of a view.
    #[serde(rename = "VIEW")]
    View,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Sql => "SQL",
            QueryKind::StoredProcedure => "STORED_PROCEDURE",
            QueryKind::View => "VIEW",
        }
    }
}

impl FromStr for QueryKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SQL" | "RAW_SQL" => Ok(QueryKind::Sql),
            "STORED_PROCEDURE" => Ok(QueryKind::StoredProcedure),
            "VIEW" => Ok(QueryKind::View),
            _ => Err(UnknownVariant::new("query kind", s)),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subtotal aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateOp {
    #[default]
    Sum,
    Avg,
    Count,
    Max,
    Min,
}

impl AggregateOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateOp::Sum => "SUM",
            AggregateOp::Avg => "AVG",
            AggregateOp::Count => "COUNT",
            AggregateOp::Max => "MAX",
            AggregateOp::Min => "MIN",
        }
    }
}

impl FromStr for AggregateOp {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SUM" => Ok(AggregateOp::Sum),
            "AVG" => Ok(AggregateOp::Avg),
            "COUNT" => Ok(AggregateOp::Count),
            "MAX" => Ok(AggregateOp::Max),
            "MIN" => Ok(AggregateOp::Min),
            _ => Err(UnknownVariant::new("aggregate operation", s)),
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied by a filter.
///
/// Deserializes through [`FromStr`], so JSON accepts the same spellings
/// (`<>`, any letter case) as the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum FilterOperator {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "IN")]
    In,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Lt => "<",
            FilterOperator::Like => "LIKE",
            FilterOperator::In => "IN",
        }
    }
}

impl FromStr for FilterOperator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "=" => Ok(FilterOperator::Eq),
            "!=" | "<>" => Ok(FilterOperator::Ne),
            ">" => Ok(FilterOperator::Gt),
            "<" => Ok(FilterOperator::Lt),
            "LIKE" => Ok(FilterOperator::Like),
            "IN" => Ok(FilterOperator::In),
            _ => Err(FilterError::InvalidFilterOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for FilterOperator {
    type Error = FilterError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a filter value is fixed in the definition or asked for at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FilterType {
    #[default]
    Static,
    #[serde(rename = "User Prompt", alias = "Prompt")]
    UserPrompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FieldType {
    #[default]
    Text,
    Number,
    Currency,
    Percent,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// CSS `text-align` value.
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}
