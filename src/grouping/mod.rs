//! Grouping and subtotal engine.
//!
//! Turns a flat record set into a table with group markers:
//!
//! ```text
//! records ──► partition by key ──► per bucket:
//!                                    GroupHeader { key, record_count }
//!                                    Data(record) ...      (input order)
//!                                    Subtotal { key, values }   (if specs)
//! ```
//!
//! Buckets come out in the order their key was first seen. The engine is a
//! pure function of its input and holds no state between calls.

mod aggregate;
mod key;
mod row;

pub use row::{describe_key, subtotal_value, AnnotatedRow, RowKind};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{AggregateOp, GroupingSpec, Record, SortOrder, SubtotalSpec, Value};
use key::GroupKey;

/// Result type for grouping operations.
pub type GroupingResult<T> = Result<T, GroupingError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GroupingError {
    #[error("{op} of '{field}' has no numeric values in a group")]
    EmptyAggregation { field: String, op: AggregateOp },

    #[error("Record {row} is missing grouping field '{field}'")]
    MalformedRecord { row: usize, field: String },
}

/// What to do with a record that lacks a grouping field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    /// Use `""` as that key component.
    #[default]
    EmptyKey,
    Reject,
}

/// Order of buckets in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupOrder {
    #[default]
    FirstSeen,
    /// By key, honoring each grouping field's sort order.
    Sorted,
}

/// MAX/MIN over a group with no numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyExtremes {
    #[default]
    Fail,
    Zero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingOptions {
    pub missing_field: MissingFieldPolicy,
    pub group_order: GroupOrder,
    pub empty_extremes: EmptyExtremes,
}

/// Applies grouping with a fixed set of options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grouper {
    options: GroupingOptions,
}

struct Bucket {
    key_values: Vec<Value>,
    members: Vec<Record>,
}

impl Grouper {
    pub fn new(options: GroupingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GroupingOptions {
        &self.options
    }

    /// Group `records` by `fields`, emitting headers, members and subtotals.
    ///
    /// With no grouping fields the records come back unchanged.
    pub fn group(
        &self,
        records: Vec<Record>,
        fields: &[GroupingSpec],
        subtotals: &[SubtotalSpec],
    ) -> GroupingResult<Vec<AnnotatedRow>> {
        if fields.is_empty() {
            return Ok(records.into_iter().map(AnnotatedRow::Data).collect());
        }

        let record_count = records.len();
        let mut buckets: IndexMap<GroupKey, Bucket> = IndexMap::new();

        for (row, record) in records.into_iter().enumerate() {
            let key_values = self.key_values(row, &record, fields)?;
            buckets
                .entry(GroupKey::new(&key_values))
                .or_insert_with(|| Bucket {
                    key_values,
                    members: Vec::new(),
                })
                .members
                .push(record);
        }

        if self.options.group_order == GroupOrder::Sorted {
            buckets.sort_by(|_, a, _, b| compare_keys(&a.key_values, &b.key_values, fields));
        }

        tracing::debug!(
            records = record_count,
            groups = buckets.len(),
            subtotals = subtotals.len(),
            "grouped records"
        );

        let extra = if subtotals.is_empty() { 1 } else { 2 };
        let mut out = Vec::with_capacity(record_count + buckets.len() * extra);

        for (_, bucket) in buckets {
            let key: Record = fields
                .iter()
                .map(|f| f.field_name.clone())
                .zip(bucket.key_values)
                .collect();

            out.push(AnnotatedRow::GroupHeader {
                key: key.clone(),
                record_count: bucket.members.len(),
            });

            let values = if subtotals.is_empty() {
                None
            } else {
                let mut values = Record::with_capacity(subtotals.len());
                for spec in subtotals {
                    let value =
                        aggregate::aggregate(spec, &bucket.members, self.options.empty_extremes)?;
                    values.insert(spec.output_field(), value);
                }
                Some(values)
            };

            out.extend(bucket.members.into_iter().map(AnnotatedRow::Data));

            if let Some(values) = values {
                out.push(AnnotatedRow::Subtotal { key, values });
            }
        }

        Ok(out)
    }

    fn key_values(
        &self,
        row: usize,
        record: &Record,
        fields: &[GroupingSpec],
    ) -> GroupingResult<Vec<Value>> {
        fields
            .iter()
            .map(|spec| match record.get(&spec.field_name) {
                Some(value) => Ok(value.clone()),
                None => match self.options.missing_field {
                    MissingFieldPolicy::EmptyKey => Ok(Value::Text(String::new())),
                    MissingFieldPolicy::Reject => Err(GroupingError::MalformedRecord {
                        row,
                        field: spec.field_name.clone(),
                    }),
                },
            })
            .collect()
    }
}

fn compare_keys(a: &[Value], b: &[Value], fields: &[GroupingSpec]) -> std::cmp::Ordering {
    a.iter()
        .zip(b)
        .zip(fields)
        .map(|((x, y), spec)| match spec.sort_order {
            SortOrder::Ascending => x.compare(y),
            SortOrder::Descending => y.compare(x),
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(std::cmp::Ordering::Equal)
}

/// Group with default options.
///
/// ```
/// use tally::{apply_grouping, AnnotatedRow, Record};
/// use tally::model::{AggregateOp, SubtotalSpec};
///
/// let records = vec![
///     Record::from_iter([("dept", "A"), ("amt", "10")]),
///     Record::from_iter([("dept", "B"), ("amt", "5")]),
/// ];
/// let rows = apply_grouping(records, &["dept"], &[SubtotalSpec::new("amt", AggregateOp::Sum)])
///     .unwrap();
/// assert_eq!(rows.len(), 6);
/// assert!(matches!(rows[0], AnnotatedRow::GroupHeader { record_count: 1, .. }));
/// ```
pub fn apply_grouping<S: AsRef<str>>(
    records: Vec<Record>,
    group_fields: &[S],
    subtotal_specs: &[SubtotalSpec],
) -> GroupingResult<Vec<AnnotatedRow>> {
    let fields: Vec<GroupingSpec> = group_fields
        .iter()
        .map(|f| GroupingSpec::new(f.as_ref()))
        .collect();
    Grouper::default().group(records, &fields, subtotal_specs)
}
