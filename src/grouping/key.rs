//! Hashable group keys.
//!
//! `Value` holds floats, so it cannot key a map directly. Each key component
//! is normalized to a `KeyAtom` where numerically equal values collide:
//! `1`, `1.0` and `true` land in the same bucket, `"1"` does not.

use chrono::{NaiveDate, NaiveDateTime};

use crate::model::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum KeyAtom {
    Null,
    Int(i64),
    /// Non-integral float, by bit pattern.
    Float(u64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Text(String),
}

impl From<&Value> for KeyAtom {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => KeyAtom::Null,
            Value::Bool(b) => KeyAtom::Int(i64::from(*b)),
            Value::Int(i) => KeyAtom::Int(*i),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    KeyAtom::Int(*f as i64)
                } else {
                    KeyAtom::Float(f.to_bits())
                }
            }
            Value::Date(d) => KeyAtom::Date(*d),
            Value::DateTime(dt) => KeyAtom::DateTime(*dt),
            Value::Text(s) => KeyAtom::Text(s.clone()),
        }
    }
}

/// The tuple of key components for one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct GroupKey(Vec<KeyAtom>);

impl GroupKey {
    pub(crate) fn new(values: &[Value]) -> Self {
        Self(values.iter().map(KeyAtom::from).collect())
    }
}
