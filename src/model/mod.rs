//! Report definitions and the values they operate on.

pub mod report;
pub mod samples;
pub mod types;
pub mod value;

pub use report::{
    ColumnSpec, DefinitionError, FilterSpec, GroupingSpec, ReportDefinition, SubtotalSpec,
    ValidationError,
};
pub use types::{
    AggregateOp, Alignment, FieldType, FilterOperator, FilterType, QueryKind, SortOrder,
    UnknownVariant,
};
pub use value::{Record, Value};
