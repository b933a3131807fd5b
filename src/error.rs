//! Error taxonomy for an ingest run
//!
//! `Configuration`, `Connection` and an all-sources `SourceNotFound` abort the
//! run before any file is attempted. `Load` errors are per file and end up in
//! a [`LoadResult`](crate::report::LoadResult) instead of propagating.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    /// No usable source or database path could be resolved
    #[error("configuration error: {0}")]
    Configuration(String),

    /// One or more source directories are missing or not directories
    #[error("source directory not found: {}", display_paths(.paths))]
    SourceNotFound { paths: Vec<PathBuf> },

    /// A single file could not be loaded into its table
    #[error("failed to load {}: {message}", .path.display())]
    Load { path: PathBuf, message: String },

    /// The database file could not be opened
    #[error("failed to open database {}: {source}", .path.display())]
    Connection {
        path: PathBuf,
        #[source]
        source: duckdb::Error,
    },
}

impl IngestError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn load(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
