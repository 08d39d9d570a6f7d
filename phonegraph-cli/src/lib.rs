//! Command-line interface for loading the phone-call graph.
#![forbid(unsafe_code)]

mod error;

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use phonegraph_core::{Job, RecordKind, TransactionPolicy};
use phonegraph_data::{LoadPlan, LoadReport, SqliteSession};
use phonegraph_fs::{PathKind, inspect_path};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

pub use error::CliError;

const ARG_DATA_DIR: &str = "data-dir";
const ARG_COMPANIES: &str = "companies";
const ARG_PEOPLE: &str = "people";
const ARG_CONTRACTS: &str = "contracts";
const ARG_CALLS: &str = "calls";
const ARG_DATABASE: &str = "database";
const ARG_TRANSACTION_POLICY: &str = "transaction-policy";
const ENV_DATA_DIR: &str = "PHONEGRAPH_CMDS_LOAD_DATA_DIR";
const DEFAULT_DATABASE: &str = "phone_calls.db";

/// Run the phonegraph CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    init_logging(cli.verbose);
    match cli.command {
        Command::Load(args) => {
            let report = run_load(args)?;
            write_report(&report, cli.json, &mut io::stdout().lock())?;
        }
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run_load(args: LoadArgs) -> Result<LoadReport, CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = resolve_load_config(merged)?;
    execute_load(&config)
}

fn resolve_load_config(args: LoadArgs) -> Result<LoadConfig, CliError> {
    let config = LoadConfig::try_from(args)?;
    config.validate_sources()?;
    Ok(config)
}

fn execute_load(config: &LoadConfig) -> Result<LoadReport, CliError> {
    info!("loading phone-call graph into {}", config.database);
    let mut session = SqliteSession::open(&config.database)?;
    Ok(config.plan().run(&mut session)?)
}

fn write_report(report: &LoadReport, json: bool, out: &mut impl Write) -> Result<(), CliError> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report).map_err(CliError::SerializeReport)?;
        return writeln!(out).map_err(CliError::WriteOutput);
    }
    for job in &report.jobs {
        writeln!(
            out,
            "Inserted {} {} records from [ {} ]",
            job.records, job.kind, job.source
        )
        .map_err(CliError::WriteOutput)?;
    }
    writeln!(
        out,
        "Loaded {} records in {} jobs ({})",
        report.total_records(),
        report.jobs.len(),
        report.policy
    )
    .map_err(CliError::WriteOutput)
}

#[derive(Debug, Parser)]
#[command(
    name = "phonegraph",
    about = "Load phone-call records into a graph database",
    version
)]
struct Cli {
    /// Log every executed statement.
    #[arg(long, short, global = true)]
    verbose: bool,
    /// Print the load report as JSON.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load companies, people, contracts and calls, in that order.
    Load(LoadArgs),
}

/// CLI arguments for the `load` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Load the four phone-call sources into the graph database. \
                 Paths can come from CLI flags, configuration files, or \
                 environment variables; per-source flags override the files \
                 found under the data directory.",
    about = "Load the phone-call graph"
)]
#[ortho_config(prefix = "PHONEGRAPH")]
struct LoadArgs {
    /// Directory holding companies.xml, people.xml, contracts.xml and calls.xml.
    #[arg(long = ARG_DATA_DIR, value_name = "dir")]
    #[serde(default)]
    data_dir: Option<Utf8PathBuf>,
    /// Companies source, overriding the data directory.
    #[arg(long = ARG_COMPANIES, value_name = "path")]
    #[serde(default)]
    companies: Option<Utf8PathBuf>,
    /// People source, overriding the data directory.
    #[arg(long = ARG_PEOPLE, value_name = "path")]
    #[serde(default)]
    people: Option<Utf8PathBuf>,
    /// Contracts source, overriding the data directory.
    #[arg(long = ARG_CONTRACTS, value_name = "path")]
    #[serde(default)]
    contracts: Option<Utf8PathBuf>,
    /// Calls source, overriding the data directory.
    #[arg(long = ARG_CALLS, value_name = "path")]
    #[serde(default)]
    calls: Option<Utf8PathBuf>,
    /// SQLite database to load into; created when missing.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    database: Option<Utf8PathBuf>,
    /// Transaction granularity: `per-job` (default) or `per-record`.
    #[arg(long = ARG_TRANSACTION_POLICY, value_name = "policy")]
    #[serde(default)]
    transaction_policy: Option<TransactionPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoadConfig {
    companies: Utf8PathBuf,
    people: Utf8PathBuf,
    contracts: Utf8PathBuf,
    calls: Utf8PathBuf,
    database: Utf8PathBuf,
    policy: TransactionPolicy,
}

impl LoadConfig {
    fn sources(&self) -> [(&'static str, RecordKind, &Utf8Path); 4] {
        [
            (ARG_COMPANIES, RecordKind::Company, self.companies.as_path()),
            (ARG_PEOPLE, RecordKind::Person, self.people.as_path()),
            (ARG_CONTRACTS, RecordKind::Contract, self.contracts.as_path()),
            (ARG_CALLS, RecordKind::Call, self.calls.as_path()),
        ]
    }

    fn plan(&self) -> LoadPlan {
        let jobs = self
            .sources()
            .into_iter()
            .map(|(_, kind, path)| Job::new(path.to_path_buf(), kind))
            .collect();
        LoadPlan::new(jobs, self.policy)
    }

    fn validate_sources(&self) -> Result<(), CliError> {
        for (field, _, path) in self.sources() {
            Self::require_file(path, field)?;
        }
        Self::require_database_path(&self.database)
    }

    fn require_file(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
        match inspect_path(path) {
            Ok(PathKind::File) => Ok(()),
            Ok(PathKind::Missing) => Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }),
            Ok(PathKind::Directory | PathKind::Other) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field,
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn require_database_path(path: &Utf8Path) -> Result<(), CliError> {
        match inspect_path(path) {
            Ok(PathKind::File | PathKind::Missing) => Ok(()),
            Ok(PathKind::Directory | PathKind::Other) => Err(CliError::DatabasePathNotFile {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(CliError::InspectSourcePath {
                field: ARG_DATABASE,
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

impl TryFrom<LoadArgs> for LoadConfig {
    type Error = CliError;

    fn try_from(args: LoadArgs) -> Result<Self, Self::Error> {
        let LoadArgs {
            data_dir,
            companies,
            people,
            contracts,
            calls,
            database,
            transaction_policy,
        } = args;
        let data_dir = data_dir.as_deref();
        Ok(Self {
            companies: resolve_source(companies, data_dir, RecordKind::Company)?,
            people: resolve_source(people, data_dir, RecordKind::Person)?,
            contracts: resolve_source(contracts, data_dir, RecordKind::Contract)?,
            calls: resolve_source(calls, data_dir, RecordKind::Call)?,
            database: database.unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            policy: transaction_policy.unwrap_or_default(),
        })
    }
}

fn resolve_source(
    explicit: Option<Utf8PathBuf>,
    data_dir: Option<&Utf8Path>,
    kind: RecordKind,
) -> Result<Utf8PathBuf, CliError> {
    explicit
        .or_else(|| data_dir.map(|dir| dir.join(kind.file_name())))
        .ok_or(CliError::MissingArgument {
            field: ARG_DATA_DIR,
            env: ENV_DATA_DIR,
        })
}

#[cfg(test)]
mod tests;
