//! Query dispatch.
//!
//! ```text
//! QueryConfig ──► check statement ──► prepare ──┬── SQL   : wrap + bind filters
//!                                               ├── VIEW  : SELECT * FROM view + bind filters
//!                                               └── PROC  : CALL name(filter values)
//!                        Database::fetch / call_procedure
//!                                     │
//!                                     ▼
//!                        Grouper::group ──► QueryOutcome
//! ```
//!
//! A failure anywhere returns an error; callers never see half-grouped rows.

mod database;
mod sqlite;

pub use database::{ColumnInfo, Database, DatabaseError, DatabaseResult};
pub use sqlite::SqliteDatabase;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::grouping::{AnnotatedRow, Grouper, GroupingError, GroupingOptions};
use crate::model::report::check_filter_operators;
use crate::model::{
    FilterSpec, GroupingSpec, QueryKind, Record, ReportDefinition, SubtotalSpec, ValidationError,
    Value,
};
use crate::sql::filter::{build_predicates, inline, parameterize, FilterError};
use crate::sql::statement::{
    check_statement, procedure_name, view_query, with_preview_limit, StatementError,
};
use crate::sql::Dialect;

/// Error type for query execution.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// The database rejected or failed the query.
    #[error("Query execution failed: {0}")]
    Execution(String),

    #[error("Query cannot be empty")]
    EmptyQuery,

    #[error("Invalid query config: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Statement(#[from] StatementError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Grouping(#[from] GroupingError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl From<DatabaseError> for QueryError {
    fn from(err: DatabaseError) -> Self {
        QueryError::Execution(err.to_string())
    }
}

pub type QueryResult<T> = Result<T, QueryError>;

/// Everything needed to run one query.
///
/// Field names follow the JSON accepted by the old `execute_query` endpoint,
/// so saved configs deserialize directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    pub query: String,
    #[serde(default)]
    pub query_type: QueryKind,
    #[serde(default)]
    pub grouping_fields: Vec<GroupingSpec>,
    #[serde(default)]
    pub subtotal_fields: Vec<SubtotalSpec>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

impl QueryConfig {
    pub fn new(query: impl Into<String>, query_type: QueryKind) -> Self {
        Self {
            query: query.into(),
            query_type,
            grouping_fields: Vec::new(),
            subtotal_fields: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> QueryResult<Self> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        check_filter_operators(&raw)?;
        Ok(serde_json::from_value(raw)?)
    }
}

/// What the executor will send to the database.
#[derive(Debug, Clone, PartialEq)]
pub enum Prepared {
    Query { sql: String, params: Vec<Value> },
    Procedure { name: String, params: Vec<Value> },
}

impl Prepared {
    pub fn params(&self) -> &[Value] {
        match self {
            Prepared::Query { params, .. } | Prepared::Procedure { params, .. } => params,
        }
    }
}

/// Grouped rows plus their count (markers included).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryOutcome {
    pub rows: Vec<AnnotatedRow>,
    pub count: usize,
}

/// The first rows of a limited query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub rows: Vec<Record>,
    /// Rows fetched before truncation (at most the preview limit).
    pub total_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorOptions {
    pub grouping: GroupingOptions,
    /// Row limit appended to preview queries.
    pub preview_limit: u64,
    /// Rows returned from a preview.
    pub preview_rows: usize,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            grouping: GroupingOptions::default(),
            preview_limit: 100,
            preview_rows: 10,
        }
    }
}

/// Runs report queries against a database.
pub struct Executor<D: Database> {
    db: D,
    options: ExecutorOptions,
}

impl<D: Database> Executor<D> {
    pub fn new(db: D) -> Self {
        Self::with_options(db, ExecutorOptions::default())
    }

    pub fn with_options(db: D, options: ExecutorOptions) -> Self {
        Self { db, options }
    }

    pub fn database(&self) -> &D {
        &self.db
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    /// Check the statement and build what will be sent to the database.
    pub fn prepare(&self, config: &QueryConfig) -> QueryResult<Prepared> {
        let query = config.query.trim();
        if query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        check_statement(query, config.query_type)?;

        let dialect = self.db.dialect();
        match config.query_type {
            QueryKind::Sql => {
                let predicates = build_predicates(&config.filters)?;
                let built = parameterize(query, &predicates, dialect);
                Ok(Prepared::Query {
                    sql: built.sql,
                    params: built.params,
                })
            }
            QueryKind::View => {
                let base = view_query(query, dialect)?;
                let predicates = build_predicates(&config.filters)?;
                let built = parameterize(&base, &predicates, dialect);
                Ok(Prepared::Query {
                    sql: built.sql,
                    params: built.params,
                })
            }
            QueryKind::StoredProcedure => {
                let name = procedure_name(query)
                    .ok_or_else(|| StatementError::InvalidProcedure(query.to_string()))?;
                let params = config
                    .filters
                    .iter()
                    .filter_map(|f| f.value.clone())
                    .map(Value::Text)
                    .collect();
                Ok(Prepared::Procedure { name, params })
            }
        }
    }

    /// Run a query config: filters, database call, then grouping.
    pub fn execute(&self, config: &QueryConfig) -> QueryResult<QueryOutcome> {
        let prepared = self.prepare(config)?;

        tracing::info!(
            kind = %config.query_type,
            filters = config.filters.len(),
            params = prepared.params().len(),
            "executing query"
        );

        let fetched = match &prepared {
            Prepared::Query { sql, params } => {
                tracing::debug!(sql = %sql, "fetch");
                self.db.fetch(sql, params)
            }
            Prepared::Procedure { name, params } => {
                tracing::debug!(procedure = %name, "call");
                self.db.call_procedure(name, params)
            }
        };

        let records = fetched.map_err(|e| {
            tracing::error!(error = %e, "query execution failed");
            QueryError::from(e)
        })?;
        let fetched_count = records.len();

        let rows = Grouper::new(self.options.grouping).group(
            records,
            &config.grouping_fields,
            &config.subtotal_fields,
        )?;
        let count = rows.len();

        tracing::info!(fetched = fetched_count, rows = count, "query complete");
        Ok(QueryOutcome { rows, count })
    }

    /// Validate a report, resolve its prompts and execute it.
    pub fn run_report(
        &self,
        report: &ReportDefinition,
        prompts: &HashMap<String, String>,
    ) -> QueryResult<QueryOutcome> {
        if !report.enabled {
            return Err(ValidationError::Disabled(report.report_name.clone()).into());
        }
        report.validate()?;
        let config = report.query_config(prompts)?;

        tracing::info!(report = %report.report_name, "running report");
        self.execute(&config)
    }

    /// Fetch a limited sample of a SELECT query.
    pub fn preview(&self, query: &str) -> QueryResult<Preview> {
        let query = query.trim();
        if query.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        check_statement(query, QueryKind::Sql)?;

        let sql = with_preview_limit(query, self.options.preview_limit, self.db.dialect());
        tracing::debug!(sql = %sql, "preview");

        let mut rows = self.db.fetch(&sql, &[])?;
        let total_count = rows.len();
        rows.truncate(self.options.preview_rows);

        Ok(Preview { rows, total_count })
    }

    /// Tables and views in the database.
    pub fn tables(&self) -> QueryResult<Vec<String>> {
        Ok(self.db.list_tables()?)
    }

    /// Columns of one table.
    pub fn columns(&self, table: &str) -> QueryResult<Vec<ColumnInfo>> {
        Ok(self.db.table_columns(table)?)
    }
}

/// Render a config's statement for `dialect` with literals inlined.
///
/// Display only. The executor binds values instead.
pub fn render_sql(config: &QueryConfig, dialect: Dialect) -> QueryResult<String> {
    let query = config.query.trim();
    check_statement(query, config.query_type)?;

    let predicates = build_predicates(&config.filters)?;
    match config.query_type {
        QueryKind::Sql => Ok(inline(query, &predicates, dialect)),
        QueryKind::View => Ok(inline(&view_query(query, dialect)?, &predicates, dialect)),
        QueryKind::StoredProcedure => Ok(query.to_string()),
    }
}
