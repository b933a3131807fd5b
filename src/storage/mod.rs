//! Source file discovery
//!
//! This module finds the tabular files an ingest run will load:
//! - Format classification by extension
//! - Recursive, ordered directory traversal

mod discovery;
mod format;

pub use discovery::{DiscoveredFile, SourceScanner};
pub use format::{FileFormat, InputFormat};
