//! Per-bucket subtotal computation.

use super::{EmptyExtremes, GroupingError, GroupingResult};
use crate::model::{AggregateOp, Record, SubtotalSpec, Value};

/// Compute one subtotal over the members of a bucket.
///
/// | op    | reads                        | result               |
/// |-------|------------------------------|----------------------|
/// | SUM   | every member, non-numeric 0  | `Float`              |
/// | AVG   | numeric values only          | `Float`, 0 when none |
/// | COUNT | member count                 | `Int`                |
/// | MAX   | numeric values only          | `Float`              |
/// | MIN   | numeric values only          | `Float`              |
pub(crate) fn aggregate(
    spec: &SubtotalSpec,
    members: &[Record],
    empty_extremes: EmptyExtremes,
) -> GroupingResult<Value> {
    let numbers = || {
        members
            .iter()
            .filter_map(|record| record.get(&spec.field).and_then(Value::as_number))
    };

    let value = match spec.operation {
        AggregateOp::Sum => Value::Float(numbers().sum()),
        AggregateOp::Avg => {
            let (sum, count) = numbers().fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));
            Value::Float(if count == 0 { 0.0 } else { sum / count as f64 })
        }
        AggregateOp::Count => Value::Int(members.len() as i64),
        AggregateOp::Max => extreme(spec, numbers().reduce(f64::max), empty_extremes)?,
        AggregateOp::Min => extreme(spec, numbers().reduce(f64::min), empty_extremes)?,
    };

    Ok(value)
}

fn extreme(
    spec: &SubtotalSpec,
    found: Option<f64>,
    empty_extremes: EmptyExtremes,
) -> GroupingResult<Value> {
    match (found, empty_extremes) {
        (Some(n), _) => Ok(Value::Float(n)),
        (None, EmptyExtremes::Zero) => Ok(Value::Float(0.0)),
        (None, EmptyExtremes::Fail) => Err(GroupingError::EmptyAggregation {
            field: spec.field.clone(),
            op: spec.operation,
        }),
    }
}
