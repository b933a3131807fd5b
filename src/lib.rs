//! Tabload
//!
//! Loads the CSV and Parquet files found under source directories into a
//! local DuckDB database, one table per file.

pub mod cli;
pub mod config;
pub mod error;
pub mod etl;
pub mod report;
pub mod storage;
pub mod transform;
pub mod warehouse;

// Re-exports for convenience
pub use config::{PathArgs, Settings, SourceSpec};
pub use error::IngestError;
pub use etl::{Extractor, Loader, Pipeline, Transformer};
pub use report::{LoadResult, LoadStatus, RunSummary};
pub use storage::{DiscoveredFile, FileFormat, InputFormat, SourceScanner};
pub use transform::{TableNamer, TableTarget};
pub use warehouse::{DuckDbLoader, Warehouse};
