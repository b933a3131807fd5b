//! Core ETL (Extract, Transform, Load) abstractions
//!
//! This module provides the trait definitions an ingest run is built from:
//! files are extracted from source directories, transformed into table
//! targets, and loaded into the warehouse.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::{CancelFlag, Pipeline, Stage};
pub use transform::Transformer;
