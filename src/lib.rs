//! # Tally
//!
//! Report definitions with grouped subtotals over SQL query results.
//!
//! ## Architecture
//!
//! A report is a named query (raw SQL, stored procedure or view) plus its
//! presentation metadata. Running a report flows through one pipeline:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              ReportDefinition (JSON file)                │
//! │  (query, columns, grouping, filters, subtotals)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validate + query_config]
//! ┌─────────────────────────────────────────────────────────┐
//! │                     QueryConfig                          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::filter - bound predicates]
//! ┌─────────────────────────────────────────────────────────┐
//! │        ParameterizedQuery → Database collaborator        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [grouping]
//! ┌─────────────────────────────────────────────────────────┐
//! │   AnnotatedRow stream (data, group headers, subtotals)   │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [export]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 HTML / CSV / XLSX / JSON                 │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod executor;
pub mod export;
pub mod format;
pub mod grouping;
pub mod logging;
pub mod model;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::executor::{Database, Executor, ExecutorOptions, QueryConfig, SqliteDatabase};
    pub use crate::export::{export, ExportFormat, ExportOptions, Layout};
    pub use crate::grouping::{apply_grouping, AnnotatedRow, Grouper, GroupingOptions};
    pub use crate::model::{
        AggregateOp, ColumnSpec, FilterOperator, FilterSpec, GroupingSpec, QueryKind, Record,
        ReportDefinition, SubtotalSpec, Value,
    };
    pub use crate::sql::{Dialect, SqlDialect};
}

pub use grouping::{apply_grouping, AnnotatedRow};
pub use model::{Record, ReportDefinition, Value};
