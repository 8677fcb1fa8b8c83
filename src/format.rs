//! Display formatting for report values, and summary statistics.

use std::fmt::Write;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;

use crate::grouping::AnnotatedRow;
use crate::model::Value;

/// `$1,234.50`. Values that are not numbers are returned as displayed.
pub fn format_currency(value: &Value, precision: usize) -> String {
    format_currency_with(value, "$", precision)
}

/// Currency with an explicit symbol: `€1,234.50`, `-$12.00`.
pub fn format_currency_with(value: &Value, symbol: &str, precision: usize) -> String {
    match value.as_number() {
        Some(n) => {
            let sign = if n < 0.0 { "-" } else { "" };
            format!("{}{}{}", sign, symbol, group_thousands(n.abs(), precision))
        }
        None => value.to_display(),
    }
}

/// `12.50%`. The value is already a percentage, it is not scaled.
pub fn format_percentage(value: &Value, precision: usize) -> String {
    match value.as_number() {
        Some(n) => format!("{:.*}%", precision, n),
        None => value.to_display(),
    }
}

/// Format a date with a strftime pattern.
///
/// Text is read as `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`. Anything else,
/// and any pattern chrono rejects, leaves the value as displayed.
pub fn format_date(value: &Value, pattern: &str) -> String {
    let formatted = match value {
        Value::Date(d) => write_checked(|out| write!(out, "{}", d.format(pattern))),
        Value::DateTime(dt) => write_checked(|out| write!(out, "{}", dt.format(pattern))),
        Value::Text(s) => {
            let s = s.trim();
            if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                write_checked(|out| write!(out, "{}", d.format(pattern)))
            } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                write_checked(|out| write!(out, "{}", dt.format(pattern)))
            } else {
                None
            }
        }
        _ => None,
    };
    formatted.unwrap_or_else(|| value.to_display())
}

// chrono reports a bad pattern as a fmt::Error from Display
fn write_checked<F>(f: F) -> Option<String>
where
    F: FnOnce(&mut String) -> std::fmt::Result,
{
    let mut out = String::new();
    f(&mut out).ok().map(|_| out)
}

/// Apply a spreadsheet-style number pattern such as `###,##0.00`.
///
/// Only the thousands separator and the number of decimals are honored.
pub fn format_number(value: &Value, pattern: &str) -> String {
    let Some(n) = value.as_number() else {
        return value.to_display();
    };
    let decimals = pattern
        .split_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| *c == '0' || *c == '#').count())
        .unwrap_or(0);

    if pattern.contains(',') {
        let sign = if n < 0.0 { "-" } else { "" };
        format!("{}{}", sign, group_thousands(n.abs(), decimals))
    } else {
        format!("{:.*}", decimals, n)
    }
}

/// Fixed decimals with `,` between thousands. `n` must be non-negative.
fn group_thousands(n: f64, precision: usize) -> String {
    let fixed = format!("{:.*}", precision, n);
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}.{}", grouped, f),
        None => grouped,
    }
}

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sum: f64,
    pub count: usize,
    pub avg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextStats {
    pub unique_values: usize,
}

/// Per-field summary of a result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReportStatistics {
    pub total_rows: usize,
    pub numeric_fields: IndexMap<String, NumericStats>,
    pub text_fields: IndexMap<String, TextStats>,
}

/// Summarize the data rows of a report.
///
/// Field kinds come from the first data row: a value that reads as a number
/// makes the field numeric. Null and empty values count as 0 in numeric
/// fields; values that are not numbers are skipped.
pub fn report_statistics(rows: &[AnnotatedRow]) -> ReportStatistics {
    let data: Vec<_> = rows.iter().filter_map(AnnotatedRow::as_data).collect();
    let Some(first) = data.first() else {
        return ReportStatistics::default();
    };

    let mut numeric: IndexMap<String, NumericStats> = IndexMap::new();
    let mut text: IndexMap<String, indexmap::IndexSet<String>> = IndexMap::new();

    for (field, value) in first.iter() {
        if field.starts_with('_') {
            continue;
        }
        if value.as_number().is_some() {
            numeric.insert(
                field.to_string(),
                NumericStats {
                    min: None,
                    max: None,
                    sum: 0.0,
                    count: 0,
                    avg: None,
                },
            );
        } else {
            text.insert(field.to_string(), indexmap::IndexSet::new());
        }
    }

    for record in &data {
        for (field, stats) in numeric.iter_mut() {
            let n = match record.get(field) {
                None | Some(Value::Null) => Some(0.0),
                Some(Value::Text(s)) if s.trim().is_empty() => Some(0.0),
                Some(v) => v.as_number(),
            };
            if let Some(n) = n {
                stats.sum += n;
                stats.count += 1;
                stats.min = Some(stats.min.map_or(n, |m| m.min(n)));
                stats.max = Some(stats.max.map_or(n, |m| m.max(n)));
            }
        }
        for (field, seen) in text.iter_mut() {
            if let Some(value) = record.get(field) {
                seen.insert(value.to_display());
            }
        }
    }

    for stats in numeric.values_mut() {
        if stats.count > 0 {
            stats.avg = Some(stats.sum / stats.count as f64);
        }
    }

    ReportStatistics {
        total_rows: data.len(),
        numeric_fields: numeric,
        text_fields: text
            .into_iter()
            .map(|(field, seen)| {
                (
                    field,
                    TextStats {
                        unique_values: seen.len(),
                    },
                )
            })
            .collect(),
    }
}
