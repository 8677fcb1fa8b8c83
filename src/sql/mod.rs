//! SQL assembly around user-written report queries.
//!
//! Report queries are opaque text; this module only builds what goes
//! around them:
//!
//! - [`filter`] - Filter specs to predicates (parameterized) or legacy text
//! - [`statement`] - Statement checks, preview limits and view queries
//! - [`dialect`] - SQL dialect implementations

pub mod dialect;
pub mod filter;
pub mod statement;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use filter::{
    build_predicates, parameterize, render_fragment, splice_filters, FilterError, FilterResult,
    ParameterizedQuery, Predicate,
};
pub use statement::{check_statement, view_query, with_preview_limit, StatementError};
