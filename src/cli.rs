//! CLI helper functions

use crate::{
    config::{self, PathArgs, Settings},
    etl::{CancelFlag, Pipeline, Stage},
    report::RunSummary,
    storage::{InputFormat, SourceScanner},
    transform::TableNamer,
    warehouse::DuckDbLoader,
};
use eyre::Result;

/// Load every CSV and Parquet file under the resolved sources into DuckDB
///
/// Pipeline: SourceScanner → TableNamer → DuckDbLoader
///
/// Paths are resolved before anything touches the disk, so a configuration
/// error never creates or opens the database.
///
/// # Errors
/// Returns an error when paths cannot be resolved, every source directory is
/// missing, or the database cannot be opened. Failures of individual files
/// are reported in the returned [`RunSummary`].
pub fn ingest(
    args: PathArgs,
    settings: Settings,
    input_format: InputFormat,
    cancel: Option<CancelFlag>,
) -> Result<RunSummary> {
    log::debug!("Pipeline stage: {} -> {}", Stage::Init, Stage::ResolvingPaths);
    let spec = config::resolve(args, settings)?;

    for source in &spec.source_paths {
        log::info!("Source: {}", source.display());
    }
    log::info!("Database: {}", spec.database_path.display());
    log::debug!("Table prefix: {:?}", spec.table_prefix);

    let mut pipeline = Pipeline::new(
        SourceScanner::new(&spec.source_paths),
        TableNamer::new(spec.table_prefix.clone()),
        DuckDbLoader::new(&spec.database_path),
    )
    .with_input_format(input_format);

    if let Some(flag) = cancel {
        pipeline = pipeline.with_cancel_flag(flag);
    }

    pipeline.run()
}
