//! Export of grouped report rows.
//!
//! ```text
//! AnnotatedRow[] + Layout ──► render_rows ──► RenderedRow[] ──┬── html
//!                                                             ├── csv
//!                                                             └── xlsx
//! AnnotatedRow[] ─────────────────────────────────────────────── json
//! ```
//!
//! Renderers never see raw values, only the text produced by the column's
//! formatting, except XLSX which writes plain numbers as numbers.

mod csv;
mod html;
mod xlsx;

use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::format::{format_currency_with, format_date, format_number, format_percentage};
use crate::grouping::{describe_key, subtotal_value, AnnotatedRow};
use crate::model::{Alignment, ColumnSpec, FieldType, ReportDefinition, UnknownVariant, Value};

/// Errors raised while rendering an export.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Html,
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Html => "text/html; charset=utf-8",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Json => "application/json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" | "htm" => Ok(ExportFormat::Html),
            "csv" => Ok(ExportFormat::Csv),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "json" => Ok(ExportFormat::Json),
            _ => Err(UnknownVariant::new("export format", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Formatting knobs shared by all renderers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub currency_symbol: String,
    /// Decimals for currency and percent columns.
    pub precision: usize,
    /// strftime pattern for date columns without their own format.
    pub date_format: String,
    /// Upper bound on spreadsheet column widths, in characters.
    pub max_column_width: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            currency_symbol: "$".to_string(),
            precision: 2,
            date_format: "%Y-%m-%d".to_string(),
            max_column_width: 50,
        }
    }
}

/// One rendered column.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutColumn {
    pub field: String,
    pub label: String,
    pub field_type: FieldType,
    pub alignment: Alignment,
    pub format: Option<String>,
}

impl From<&ColumnSpec> for LayoutColumn {
    fn from(spec: &ColumnSpec) -> Self {
        Self {
            field: spec.field_name.clone(),
            label: spec.label(),
            field_type: spec.field_type,
            alignment: spec.alignment,
            format: spec.format.clone(),
        }
    }
}

/// The columns an export renders, in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub columns: Vec<LayoutColumn>,
}

impl Layout {
    pub fn from_columns<'a>(columns: impl IntoIterator<Item = &'a ColumnSpec>) -> Self {
        Self {
            columns: columns.into_iter().map(LayoutColumn::from).collect(),
        }
    }

    /// Every key of every data row, in first-seen order, as text columns.
    pub fn infer(rows: &[AnnotatedRow]) -> Self {
        let mut fields: indexmap::IndexSet<&str> = indexmap::IndexSet::new();
        for record in rows.iter().filter_map(AnnotatedRow::as_data) {
            fields.extend(record.keys().filter(|k| !k.starts_with('_')));
        }
        Self {
            columns: fields
                .into_iter()
                .map(|field| LayoutColumn::from(&ColumnSpec::new(field)))
                .collect(),
        }
    }

    /// The report's visible columns, or the inferred layout if it declares none.
    pub fn for_report(report: &ReportDefinition, rows: &[AnnotatedRow]) -> Self {
        if report.columns.is_empty() {
            Self::infer(rows)
        } else {
            Self::from_columns(report.visible_columns())
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.label.as_str()).collect()
    }
}

/// A rendered export, ready to write or send.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `<title>_<YYYYmmdd_HHMMSS>.<ext>`, with path separators replaced.
pub fn file_name(title: &str, format: ExportFormat, timestamp: NaiveDateTime) -> String {
    let stem: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!(
        "{}_{}.{}",
        stem,
        timestamp.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Render `rows` as `format`.
pub fn export(
    title: &str,
    rows: &[AnnotatedRow],
    layout: &Layout,
    format: ExportFormat,
    options: &ExportOptions,
    timestamp: NaiveDateTime,
) -> ExportResult<ExportedFile> {
    let bytes = match format {
        ExportFormat::Html => html::render(title, rows, layout, options).into_bytes(),
        ExportFormat::Csv => csv::render(rows, layout, options).into_bytes(),
        ExportFormat::Xlsx => xlsx::render(title, rows, layout, options)?,
        ExportFormat::Json => serde_json::to_vec_pretty(rows)?,
    };

    tracing::info!(
        format = %format,
        rows = rows.len(),
        columns = layout.columns.len(),
        bytes = bytes.len(),
        "exported report"
    );

    Ok(ExportedFile {
        file_name: file_name(title, format, timestamp),
        content_type: format.content_type(),
        bytes,
    })
}

// =============================================================================
// Shared row rendering
// =============================================================================

/// A row reduced to display text.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RenderedRow {
    Data(Vec<String>),
    /// `field: value` pairs and the member count, spanning the row.
    GroupHeader(String),
    Subtotal(Vec<String>),
}

pub(crate) const SUBTOTAL_LABEL: &str = "Subtotal";

pub(crate) fn render_rows(
    rows: &[AnnotatedRow],
    layout: &Layout,
    options: &ExportOptions,
) -> Vec<RenderedRow> {
    rows.iter()
        .map(|row| match row {
            AnnotatedRow::Data(record) => RenderedRow::Data(
                layout
                    .columns
                    .iter()
                    .map(|column| {
                        record
                            .get(&column.field)
                            .map(|value| format_cell(value, column, options))
                            .unwrap_or_default()
                    })
                    .collect(),
            ),
            AnnotatedRow::GroupHeader { key, record_count } => {
                RenderedRow::GroupHeader(header_text(key, *record_count))
            }
            AnnotatedRow::Subtotal { values, .. } => RenderedRow::Subtotal(
                layout
                    .columns
                    .iter()
                    .enumerate()
                    .map(|(i, column)| {
                        match subtotal_value(values, &column.field) {
                            Some(value) => format_cell(value, column, options),
                            None if i == 0 => SUBTOTAL_LABEL.to_string(),
                            None => String::new(),
                        }
                    })
                    .collect(),
            ),
        })
        .collect()
}

pub(crate) fn header_text(key: &crate::model::Record, record_count: usize) -> String {
    let noun = if record_count == 1 { "record" } else { "records" };
    format!("{} ({} {})", describe_key(key), record_count, noun)
}

/// Format one value for a column.
pub fn format_cell(value: &Value, column: &LayoutColumn, options: &ExportOptions) -> String {
    match column.field_type {
        FieldType::Currency => {
            format_currency_with(value, &options.currency_symbol, options.precision)
        }
        FieldType::Percent => format_percentage(value, options.precision),
        FieldType::Date => format_date(
            value,
            column.format.as_deref().unwrap_or(&options.date_format),
        ),
        FieldType::Number => match &column.format {
            Some(pattern) => format_number(value, pattern),
            None => value.to_display(),
        },
        FieldType::Text => value.to_display(),
    }
}
