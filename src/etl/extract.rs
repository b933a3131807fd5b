//! Extractor trait for data extraction from various sources

use eyre::Result;

/// Extractor trait for extracting items from a source
///
/// Implementors define how to enumerate items, e.g. files under a set of
/// directories. Extraction is synchronous; an ingest run is strictly
/// sequential.
///
/// # Example
/// ```no_run
/// use tabload::etl::Extractor;
/// use eyre::Result;
/// use std::path::PathBuf;
///
/// struct ListingExtractor {
///     path: PathBuf,
/// }
///
/// impl Extractor for ListingExtractor {
///     type Item = PathBuf;
///
///     fn extract(&self) -> Result<Vec<Self::Item>> {
///         Ok(std::fs::read_dir(&self.path)?
///             .filter_map(|e| e.ok())
///             .map(|e| e.path())
///             .collect())
///     }
/// }
/// ```
pub trait Extractor {
    /// The type of items extracted
    type Item;

    /// Extract items from the source
    ///
    /// # Errors
    /// Returns an error if no item can be produced at all (missing source,
    /// unreadable root, etc.)
    fn extract(&self) -> Result<Vec<Self::Item>>;
}
