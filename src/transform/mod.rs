//! Transformers applied between discovery and loading

mod table_namer;

pub use table_namer::{TableNamer, TableTarget};
