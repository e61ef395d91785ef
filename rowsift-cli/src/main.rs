use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rowsift_common::{Config, RowsiftError, TableConfig};
use rowsift_core::{open_table, resolve_table_paths, validate, Column, TableRegistry};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rowsift", version, about = "Filter and summarize dashboard tables")]
struct Cli {
    /// config file (defaults to $ROWSIFT_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// extra table files, directories or globs to register
    #[arg(long = "load", global = true)]
    load: Vec<String>,
    /// dashboard for tables given with --load
    #[arg(long = "load-dashboard", global = true)]
    load_dashboard: Option<String>,
    #[arg(long, global = true)]
    pretty: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SpecArgs {
    /// filter spec as JSON text
    #[arg(long, conflicts_with = "spec_file")]
    spec: Option<String>,
    /// file holding the filter spec
    #[arg(long)]
    spec_file: Option<PathBuf>,
}

impl SpecArgs {
    fn text(&self) -> anyhow::Result<Option<String>> {
        match (&self.spec, &self.spec_file) {
            (Some(s), _) => Ok(Some(s.clone())),
            (None, Some(path)) => std::fs::read_to_string(path)
                .map(Some)
                .with_context(|| format!("reading {}", path.display())),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List registered tables and their schemas
    Tables,
    /// Print the rows of a table that match a filter spec
    Filter {
        #[arg(long)]
        table: String,
        #[arg(long)]
        dashboard: Option<String>,
        #[command(flatten)]
        spec: SpecArgs,
    },
    /// Sorted distinct values of a column
    Values {
        #[arg(long)]
        column: String,
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        dashboard: Option<String>,
    },
    /// Range and increment of a numeric column
    NumericSpec {
        #[arg(long)]
        column: String,
        #[arg(long)]
        table: Option<String>,
        #[arg(long)]
        dashboard: Option<String>,
    },
    /// Check a filter spec without evaluating it
    Validate {
        #[command(flatten)]
        spec: SpecArgs,
    },
}

#[derive(Serialize)]
struct TableListing<'a> {
    table: &'a str,
    dashboard: Option<&'a str>,
    columns: &'a [Column],
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast_ref::<RowsiftError>() {
            Some(err) if err.is_client_error() => {
                eprintln!("{err}");
                ExitCode::from(2)
            }
            _ => {
                eprintln!("error: {e:#}");
                ExitCode::from(1)
            }
        },
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    init_tracing(&config);
    let pretty = cli.pretty || config.output.pretty;

    let mut tables = config.tables.clone();
    tables.extend(cli.load.iter().map(|path| TableConfig {
        name: None,
        dashboard: cli.load_dashboard.clone(),
        path: path.clone(),
    }));
    let registry = build_registry(&tables)?;

    match cli.command {
        Commands::Tables => {
            let tables = registry.tables();
            let listing: Vec<TableListing> = tables
                .iter()
                .map(|(key, columns)| TableListing {
                    table: &key.table,
                    dashboard: key.dashboard.as_deref(),
                    columns,
                })
                .collect();
            print_json(&listing, pretty)?;
        }
        Commands::Filter { table, dashboard, spec } => {
            let text = spec.text()?;
            let rows = registry.filtered_rows(&table, dashboard.as_deref(), text.as_deref())?;
            print_json(&rows, pretty)?;
        }
        Commands::Values { column, table, dashboard } => {
            let values = registry.all_values(&column, table.as_deref(), dashboard.as_deref())?;
            print_json(&values, pretty)?;
        }
        Commands::NumericSpec { column, table, dashboard } => {
            let spec = registry.numeric_spec(&column, table.as_deref(), dashboard.as_deref())?;
            print_json(&spec, pretty)?;
        }
        Commands::Validate { spec } => {
            let text = spec
                .text()?
                .ok_or_else(|| RowsiftError::BadRequest("one of --spec or --spec-file is required".into()))?;
            let json: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
                RowsiftError::BadRequest(format!("Bad Filter Specification: {text}.  Error {e}"))
            })?;
            validate(&json)?;
            println!("valid");
        }
    }
    Ok(())
}

/// RUST_LOG wins over the configured level; logs go to stderr.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_registry(tables: &[TableConfig]) -> anyhow::Result<TableRegistry> {
    let mut registry = TableRegistry::new();
    for entry in tables {
        let paths = resolve_table_paths(&entry.path)?;
        if paths.is_empty() {
            tracing::warn!(target: "rowsift", event = "no_tables_matched", path = %entry.path);
        }
        if entry.name.is_some() && paths.len() > 1 {
            return Err(RowsiftError::Config(format!(
                "{} matches {} files; name may only be set for a single table",
                entry.path,
                paths.len()
            ))
            .into());
        }
        for path in paths {
            let loaded = open_table(&path).with_context(|| format!("loading {}", path.display()))?;
            let name = entry.name.as_deref().unwrap_or(&loaded.name);
            registry.register(name, entry.dashboard.as_deref(), loaded.source)?;
        }
    }
    Ok(registry)
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}
