//! Rows emitted by the grouping engine.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::{Record, Value};

/// Discriminator written as `_type` on marker rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Data,
    GroupHeader,
    Subtotal,
}

impl RowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowKind::Data => "DATA",
            RowKind::GroupHeader => "GROUP_HEADER",
            RowKind::Subtotal => "SUBTOTAL",
        }
    }
}

/// One row of grouped output.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotatedRow {
    /// A record from the query, unchanged.
    Data(Record),
    /// Start of a group.
    GroupHeader { key: Record, record_count: usize },
    /// End of a group: `<field>_subtotal` values in subtotal spec order.
    Subtotal { key: Record, values: Record },
}

impl AnnotatedRow {
    pub fn kind(&self) -> RowKind {
        match self {
            AnnotatedRow::Data(_) => RowKind::Data,
            AnnotatedRow::GroupHeader { .. } => RowKind::GroupHeader,
            AnnotatedRow::Subtotal { .. } => RowKind::Subtotal,
        }
    }

    pub fn is_marker(&self) -> bool {
        !matches!(self, AnnotatedRow::Data(_))
    }

    pub fn as_data(&self) -> Option<&Record> {
        match self {
            AnnotatedRow::Data(record) => Some(record),
            _ => None,
        }
    }

    /// Group key of a marker row.
    pub fn group_key(&self) -> Option<&Record> {
        match self {
            AnnotatedRow::Data(_) => None,
            AnnotatedRow::GroupHeader { key, .. } | AnnotatedRow::Subtotal { key, .. } => Some(key),
        }
    }
}

/// `region: North, year: 2024`
pub fn describe_key(key: &Record) -> String {
    key.iter()
        .map(|(field, value)| format!("{}: {}", field, value))
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<Record> for AnnotatedRow {
    fn from(record: Record) -> Self {
        AnnotatedRow::Data(record)
    }
}

impl Serialize for AnnotatedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AnnotatedRow::Data(record) => record.serialize(serializer),
            AnnotatedRow::GroupHeader { key, record_count } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("_type", RowKind::GroupHeader.as_str())?;
                map.serialize_entry("_group_key", key)?;
                map.serialize_entry("_record_count", record_count)?;
                map.end()
            }
            AnnotatedRow::Subtotal { key, values } => {
                let mut map = serializer.serialize_map(Some(values.len() + 2))?;
                map.serialize_entry("_type", RowKind::Subtotal.as_str())?;
                map.serialize_entry("_group_key", key)?;
                for (field, value) in values.iter() {
                    map.serialize_entry(field, value)?;
                }
                map.end()
            }
        }
    }
}

/// Value of `<field>_subtotal` in a subtotal row, if present.
pub fn subtotal_value<'a>(values: &'a Record, field: &str) -> Option<&'a Value> {
    values.get(&format!("{}_subtotal", field))
}
