//! Error types emitted by the phonegraph CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use phonegraph_data::{LoadError, OpenStoreError};
use thiserror::Error;

/// Errors emitted by the phonegraph CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced source does not exist on disk.
    #[error("{field} path {path} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced source exists but is not a file.
    #[error("{field} path {path} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The database path names a directory or other non-file entry.
    #[error("database path {path} exists but is not a file")]
    DatabasePathNotFile { path: Utf8PathBuf },
    /// The graph database could not be opened.
    #[error(transparent)]
    OpenStore(#[from] OpenStoreError),
    /// A job failed; later jobs did not run.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// Serializing the load report failed.
    #[error("failed to serialize load report")]
    SerializeReport(#[source] serde_json::Error),
    /// Writing the load report failed.
    #[error("failed to write load report")]
    WriteOutput(#[source] std::io::Error),
}
