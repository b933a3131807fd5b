//! Loader trait for loading data to destinations

use eyre::Result;

/// Loader trait for loading items into a destination one at a time
///
/// A loader owns whatever handle it writes through. [`open`](Loader::open)
/// acquires it, [`close`](Loader::close) releases it; the pipeline calls both
/// around the load loop. Implementors should also release the handle on drop.
///
/// # Example
/// ```no_run
/// use tabload::etl::Loader;
/// use eyre::Result;
/// use std::path::PathBuf;
///
/// struct FileLoader {
///     output_dir: PathBuf,
/// }
///
/// impl Loader for FileLoader {
///     type Item = String;
///
///     fn load(&mut self, item: &Self::Item) -> Result<u64> {
///         std::fs::write(self.output_dir.join(item), item)?;
///         Ok(1)
///     }
/// }
/// ```
pub trait Loader {
    /// The type of items to load
    type Item;

    /// Acquire the destination handle
    ///
    /// # Errors
    /// A failure here aborts the run before any item is loaded
    fn open(&mut self) -> Result<()> {
        Ok(())
    }

    /// Load a single item, returning the number of rows written
    ///
    /// # Errors
    /// Returns an error if this item could not be loaded. The destination
    /// must be left as it was before the call.
    fn load(&mut self, item: &Self::Item) -> Result<u64>;

    /// Release the destination handle
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
