//! DuckDB warehouse access
//!
//! - [`Warehouse`]: the connection handle and the atomic replace primitive
//! - [`DuckDbLoader`]: the [`Loader`](crate::etl::Loader) used by ingest runs

mod connection;
mod loader;

pub use connection::Warehouse;
pub use loader::DuckDbLoader;
