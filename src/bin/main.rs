//! Tally CLI - run report definitions against a database
//!
//! Usage:
//!   tally run <report.json> [--db <file>] [--format <fmt>] [--output <path>] [--param k=v]...
//!   tally validate <report.json>
//!   tally sql <report.json> [--dialect <dialect>] [--param k=v]...
//!   tally preview <query> [--db <file>]
//!   tally tables [--db <file>]
//!   tally columns <table> [--db <file>]
//!   tally sample <name> [--output <path>]
//!   tally demo <file>
//!
//! Examples:
//!   tally demo demo.sqlite
//!   tally sample sales --output sales.json
//!   tally run sales.json --db demo.sqlite --format xlsx
//!   tally sql sales.json --dialect postgres --param customer=CUST-A

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tally::config::Settings;
use tally::executor::{render_sql, Executor, SqliteDatabase};
use tally::export::{export, ExportFormat, Layout};
use tally::format::report_statistics;
use tally::model::samples::{sample, DEMO_SCHEMA, SAMPLE_NAMES};
use tally::model::ReportDefinition;
use tally::sql::Dialect;

#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Tally - grouped, subtotalled reports over SQL query results")]
#[command(version)]
struct Cli {
    /// Config file (defaults to TALLY_CONFIG, ./tally.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a report and export the result
    Run {
        /// Path to the report definition (JSON)
        report: PathBuf,

        /// SQLite database file (overrides the config)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Export format: html, csv, xlsx or json
        #[arg(short, long, default_value = "html")]
        format: ExportFormat,

        /// Output file or directory (text formats print to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Prompt filter value as field=value
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Print column statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Validate a report definition without running it
    Validate {
        /// Path to the report definition (JSON)
        report: PathBuf,
    },

    /// Show the SQL a report would run, with filter values inlined
    Sql {
        /// Path to the report definition (JSON)
        report: PathBuf,

        /// SQL dialect to render (defaults to the config)
        #[arg(short, long)]
        dialect: Option<Dialect>,

        /// Prompt filter value as field=value
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// Preview the first rows of a SELECT query
    Preview {
        /// The SELECT statement
        query: String,

        /// SQLite database file (overrides the config)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// List tables and views
    Tables {
        /// SQLite database file (overrides the config)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// List the columns of a table
    Columns {
        /// Table or view name
        table: String,

        /// SQLite database file (overrides the config)
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Print a bundled sample report definition
    Sample {
        /// One of: sales, inventory, purchase
        name: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a SQLite database with the demo schema the samples query
    Demo {
        /// Database file to create or update
        db: PathBuf,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected field=value, got '{}'", s)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = settings.unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config file: {}", e);
        eprintln!("Using default configuration");
        Settings::default()
    });

    tally::logging::init(&settings.logging.level);

    let result = match cli.command {
        Commands::Run {
            report,
            db,
            format,
            output,
            params,
            stats,
        } => cmd_run(&settings, &report, db, format, output, params, stats),
        Commands::Validate { report } => cmd_validate(&report),
        Commands::Sql {
            report,
            dialect,
            params,
        } => cmd_sql(&settings, &report, dialect, params),
        Commands::Preview { query, db } => cmd_preview(&settings, &query, db),
        Commands::Tables { db } => cmd_tables(&settings, db),
        Commands::Columns { table, db } => cmd_columns(&settings, &table, db),
        Commands::Sample { name, output } => cmd_sample(&name, output),
        Commands::Demo { db } => cmd_demo(&db),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

type CmdResult = Result<(), String>;

fn load_report(path: &Path) -> Result<ReportDefinition, String> {
    ReportDefinition::from_file(path)
        .map_err(|e| format!("reading report '{}': {}", path.display(), e))
}

fn open_database(settings: &Settings, db: Option<PathBuf>) -> Result<SqliteDatabase, String> {
    let path = match db {
        Some(path) => path,
        None => settings
            .database_path()
            .map_err(|e| e.to_string())?
            .ok_or("no database given; pass --db or set [database] path in the config")?,
    };
    SqliteDatabase::open(&path).map_err(|e| format!("opening '{}': {}", path.display(), e))
}

fn cmd_run(
    settings: &Settings,
    report_path: &Path,
    db: Option<PathBuf>,
    format: ExportFormat,
    output: Option<PathBuf>,
    params: Vec<(String, String)>,
    stats: bool,
) -> CmdResult {
    let report = load_report(report_path)?;
    let database = open_database(settings, db)?;
    let executor = Executor::with_options(database, settings.executor_options());

    let prompts: HashMap<String, String> = params.into_iter().collect();
    let outcome = executor
        .run_report(&report, &prompts)
        .map_err(|e| e.to_string())?;

    if stats {
        let statistics = report_statistics(&outcome.rows);
        let json = serde_json::to_string_pretty(&statistics).map_err(|e| e.to_string())?;
        eprintln!("{}", json);
    }

    let layout = Layout::for_report(&report, &outcome.rows);
    let now = chrono::Local::now().naive_local();
    let file = export(
        &report.report_name,
        &outcome.rows,
        &layout,
        format,
        &settings.export,
        now,
    )
    .map_err(|e| e.to_string())?;

    let target = match output {
        Some(path) if path.is_dir() => path.join(&file.file_name),
        Some(path) => path,
        None if format == ExportFormat::Xlsx => PathBuf::from(&file.file_name),
        None => {
            print!("{}", String::from_utf8_lossy(&file.bytes));
            return Ok(());
        }
    };

    fs::write(&target, &file.bytes).map_err(|e| format!("writing '{}': {}", target.display(), e))?;
    println!("Wrote {} rows to {}", outcome.count, target.display());
    Ok(())
}

fn cmd_validate(report_path: &Path) -> CmdResult {
    let report = load_report(report_path)?;
    report.validate().map_err(|e| e.to_string())?;

    if !report.enabled {
        println!("OK: {} is valid (disabled)", report_path.display());
    } else {
        println!("OK: {} is valid", report_path.display());
    }
    Ok(())
}

fn cmd_sql(
    settings: &Settings,
    report_path: &Path,
    dialect: Option<Dialect>,
    params: Vec<(String, String)>,
) -> CmdResult {
    let report = load_report(report_path)?;
    report.validate().map_err(|e| e.to_string())?;

    let prompts: HashMap<String, String> = params.into_iter().collect();
    let config = report.query_config(&prompts).map_err(|e| e.to_string())?;
    let dialect = dialect.unwrap_or(settings.database.dialect);

    let sql = render_sql(&config, dialect).map_err(|e| e.to_string())?;
    println!("{}", sql);
    Ok(())
}

fn cmd_preview(settings: &Settings, query: &str, db: Option<PathBuf>) -> CmdResult {
    let database = open_database(settings, db)?;
    let executor = Executor::with_options(database, settings.executor_options());

    let preview = executor.preview(query).map_err(|e| e.to_string())?;
    let json = serde_json::to_string_pretty(&preview.rows).map_err(|e| e.to_string())?;
    println!("{}", json);
    eprintln!(
        "Showing {} of {} rows",
        preview.rows.len(),
        preview.total_count
    );
    Ok(())
}

fn cmd_tables(settings: &Settings, db: Option<PathBuf>) -> CmdResult {
    let executor = Executor::new(open_database(settings, db)?);
    let tables = executor.tables().map_err(|e| e.to_string())?;

    if tables.is_empty() {
        println!("No tables found.");
    }
    for table in tables {
        println!("{}", table);
    }
    Ok(())
}

fn cmd_columns(settings: &Settings, table: &str, db: Option<PathBuf>) -> CmdResult {
    let executor = Executor::new(open_database(settings, db)?);
    let columns = executor.columns(table).map_err(|e| e.to_string())?;

    if columns.is_empty() {
        return Err(format!("table '{}' not found", table));
    }
    for column in columns {
        let null = if column.nullable { "" } else { " NOT NULL" };
        println!("  {} {}{}", column.name, column.data_type, null);
    }
    Ok(())
}

fn cmd_sample(name: &str, output: Option<PathBuf>) -> CmdResult {
    let report = sample(name)
        .map_err(|e| format!("{} (available: {})", e, SAMPLE_NAMES.join(", ")))?;

    match output {
        Some(path) => {
            report
                .to_file(&path)
                .map_err(|e| format!("writing '{}': {}", path.display(), e))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", report.to_json().map_err(|e| e.to_string())?),
    }
    Ok(())
}

fn cmd_demo(db: &Path) -> CmdResult {
    let database =
        SqliteDatabase::open(db).map_err(|e| format!("opening '{}': {}", db.display(), e))?;
    database
        .execute_batch(DEMO_SCHEMA)
        .map_err(|e| e.to_string())?;

    println!("Created demo database at {}", db.display());
    Ok(())
}
