//! Loader that replaces warehouse tables from source files

use super::Warehouse;
use crate::etl::Loader;
use crate::transform::TableTarget;

use eyre::Result;
use std::path::{Path, PathBuf};

/// Loads each [`TableTarget`] into a DuckDB database file
///
/// The database is opened once in [`open`](Loader::open) and shared by every
/// load in the run.
///
/// # Example
/// ```no_run
/// use tabload::etl::Loader;
/// use tabload::warehouse::DuckDbLoader;
///
/// # fn example(targets: Vec<tabload::transform::TableTarget>) -> eyre::Result<()> {
/// let mut loader = DuckDbLoader::new("warehouse.duckdb");
/// loader.open()?;
/// for target in &targets {
///     let rows = loader.load(target)?;
///     println!("{} rows into {}", rows, target.table_name);
/// }
/// loader.close()?;
/// # Ok(())
/// # }
/// ```
pub struct DuckDbLoader {
    database_path: PathBuf,
    warehouse: Option<Warehouse>,
}

impl DuckDbLoader {
    pub fn new(database_path: impl AsRef<Path>) -> Self {
        Self {
            database_path: database_path.as_ref().to_path_buf(),
            warehouse: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.warehouse.is_some()
    }
}

impl Loader for DuckDbLoader {
    type Item = TableTarget;

    fn open(&mut self) -> Result<()> {
        if self.warehouse.is_none() {
            let warehouse = Warehouse::open(&self.database_path)?;
            log::info!("Connected to database at {}", self.database_path.display());
            self.warehouse = Some(warehouse);
        }
        Ok(())
    }

    fn load(&mut self, item: &Self::Item) -> Result<u64> {
        let warehouse = self
            .warehouse
            .as_ref()
            .ok_or_else(|| eyre::eyre!("Database {} is not open", self.database_path.display()))?;
        Ok(warehouse.replace_table_from_file(item)?)
    }

    fn close(&mut self) -> Result<()> {
        if let Some(warehouse) = self.warehouse.take() {
            warehouse.close()?;
            log::debug!("Closed database {}", self.database_path.display());
        }
        Ok(())
    }
}
