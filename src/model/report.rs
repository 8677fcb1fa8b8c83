// src/model/report.rs
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use inflector::Inflector;
use serde::{Deserialize, Deserializer, Serialize};

use super::types::{AggregateOp, Alignment, FieldType, FilterOperator, FilterType, QueryKind, SortOrder};
use crate::executor::QueryConfig;
use crate::sql::filter::{check_field_name, FilterError};
use crate::sql::statement::{check_statement, StatementError};

/// Why a report definition cannot run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Report name is required")]
    MissingName,

    #[error("Report query is required")]
    MissingQuery,

    #[error("Query validation error: {0}")]
    Statement(#[from] StatementError),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Filter on '{0}' is mandatory but has no value")]
    MissingFilterValue(String),

    #[error("Report '{0}' is disabled")]
    Disabled(String),
}

/// Errors reading or writing a definition file.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid report definition: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("Unknown sample report: {0}")]
    UnknownSample(String),
}

/// A report definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDefinition {
    pub report_name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form label for where the data comes from ("SQL Query", ...).
    #[serde(default)]
    pub data_source: Option<String>,
    #[serde(default)]
    pub query_type: QueryKind,
    pub report_query: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub grouping_fields: Vec<GroupingSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
    #[serde(default)]
    pub subtotal_config: Vec<SubtotalSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub field_name: String,
    #[serde(default)]
    pub display_label: Option<String>,
    #[serde(default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub alignment: Alignment,
    /// Number pattern (`###,##0.00`) or strftime pattern for dates.
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default = "default_true")]
    pub visible: bool,
}

impl ColumnSpec {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            display_label: None,
            field_type: FieldType::Text,
            width: None,
            alignment: Alignment::Left,
            format: None,
            visible: true,
        }
    }

    /// Display label, falling back to the title-cased field name.
    pub fn label(&self) -> String {
        match &self.display_label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => self.field_name.to_title_case(),
        }
    }
}

/// A grouping level. Deserializes from a bare field name or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "GroupingFieldRepr")]
pub struct GroupingSpec {
    pub field_name: String,
    /// Bucket order for this level under `group_order = "sorted"`.
    /// First-seen grouping ignores it and follows the query's row order.
    pub sort_order: SortOrder,
}

impl GroupingSpec {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            sort_order: SortOrder::Ascending,
        }
    }

    pub fn descending(mut self) -> Self {
        self.sort_order = SortOrder::Descending;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GroupingFieldRepr {
    Name(String),
    Spec {
        #[serde(alias = "field")]
        field_name: String,
        #[serde(default)]
        sort_order: SortOrder,
    },
}

impl From<GroupingFieldRepr> for GroupingSpec {
    fn from(repr: GroupingFieldRepr) -> Self {
        match repr {
            GroupingFieldRepr::Name(field_name) => GroupingSpec::new(field_name),
            GroupingFieldRepr::Spec {
                field_name,
                sort_order,
            } => GroupingSpec {
                field_name,
                sort_order,
            },
        }
    }
}

/// A single comparison condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    #[serde(alias = "field_name")]
    pub field: String,
    #[serde(default)]
    pub operator: FilterOperator,
    #[serde(
        default,
        alias = "filter_value",
        deserialize_with = "deserialize_filter_value"
    )]
    pub value: Option<String>,
    #[serde(default)]
    pub filter_type: FilterType,
    #[serde(default)]
    pub mandatory: bool,
}

impl FilterSpec {
    pub fn new(
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: Some(value.into()),
            filter_type: FilterType::Static,
            mandatory: false,
        }
    }

    /// A run-time prompt with no stored value.
    pub fn prompt(field: impl Into<String>, operator: FilterOperator) -> Self {
        Self {
            field: field.into(),
            operator,
            value: None,
            filter_type: FilterType::UserPrompt,
            mandatory: false,
        }
    }

    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }
}

/// Filter values arrive as strings in definitions, numbers in hand-written JSON.
fn deserialize_filter_value<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Array(items)) => Some(
            items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtotalSpec {
    pub field: String,
    #[serde(default)]
    pub operation: AggregateOp,
}

impl SubtotalSpec {
    pub fn new(field: impl Into<String>, operation: AggregateOp) -> Self {
        Self {
            field: field.into(),
            operation,
        }
    }

    /// Column name of the computed value in a subtotal row.
    pub fn output_field(&self) -> String {
        format!("{}_subtotal", self.field)
    }
}

fn default_true() -> bool {
    true
}

impl ReportDefinition {
    pub fn new(
        report_name: impl Into<String>,
        query_type: QueryKind,
        report_query: impl Into<String>,
    ) -> Self {
        Self {
            report_name: report_name.into(),
            description: String::new(),
            data_source: None,
            query_type,
            report_query: report_query.into(),
            enabled: true,
            columns: Vec::new(),
            grouping_fields: Vec::new(),
            filters: Vec::new(),
            subtotal_config: Vec::new(),
        }
    }

    /// Check the definition can be executed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.report_name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.report_query.trim().is_empty() {
            return Err(ValidationError::MissingQuery);
        }

        check_statement(&self.report_query, self.query_type)?;

        for filter in &self.filters {
            check_field_name(&filter.field)?;
        }

        Ok(())
    }

    /// Resolve filters against run-time prompt values.
    ///
    /// Prompt filters read `prompts[field]`, falling back to the stored
    /// value. Unset filters are dropped unless mandatory.
    pub fn query_config(
        &self,
        prompts: &HashMap<String, String>,
    ) -> Result<QueryConfig, ValidationError> {
        let mut filters = Vec::with_capacity(self.filters.len());

        for filter in &self.filters {
            let value = match filter.filter_type {
                FilterType::UserPrompt => prompts
                    .get(&filter.field)
                    .or(filter.value.as_ref())
                    .filter(|v| !v.trim().is_empty())
                    .cloned(),
                FilterType::Static => filter.value.clone(),
            };

            match value {
                Some(value) => filters.push(FilterSpec {
                    value: Some(value),
                    ..filter.clone()
                }),
                None if filter.mandatory => {
                    return Err(ValidationError::MissingFilterValue(filter.field.clone()))
                }
                None => {}
            }
        }

        Ok(QueryConfig {
            query: self.report_query.clone(),
            query_type: self.query_type,
            grouping_fields: self.grouping_fields.clone(),
            subtotal_fields: self.subtotal_config.clone(),
            filters,
        })
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.visible)
    }

    /// Copy of this definition under another name.
    pub fn cloned_as(&self, new_name: impl Into<String>) -> Self {
        Self {
            report_name: new_name.into(),
            ..self.clone()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, DefinitionError> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        check_filter_operators(&raw)?;
        Ok(serde_json::from_value(raw)?)
    }

    pub fn to_json(&self) -> Result<String, DefinitionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DefinitionError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), DefinitionError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Parse every `filters[].operator` string ahead of the typed decode.
///
/// serde only reports an unknown operator as a message; this keeps it
/// a [`FilterError::InvalidFilterOperator`].
pub(crate) fn check_filter_operators(raw: &serde_json::Value) -> Result<(), FilterError> {
    let filters = raw.get("filters").and_then(serde_json::Value::as_array);
    for operator in filters
        .into_iter()
        .flatten()
        .filter_map(|filter| filter.get("operator")?.as_str())
    {
        operator.parse::<FilterOperator>()?;
    }
    Ok(())
}
