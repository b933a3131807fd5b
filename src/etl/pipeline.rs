//! Pipeline orchestration for ingest runs

use super::{Extractor, Loader, Transformer};
use crate::error::IngestError;
use crate::report::{LoadResult, RunSummary};
use crate::storage::{DiscoveredFile, InputFormat};
use crate::transform::TableTarget;

use eyre::Result;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared flag an interrupt handler sets to stop a run between files
pub type CancelFlag = Arc<AtomicBool>;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    ResolvingPaths,
    Discovering,
    Loading,
    Summarizing,
    Done,
    Aborted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::ResolvingPaths => "resolving paths",
            Self::Discovering => "discovering",
            Self::Loading => "loading",
            Self::Summarizing => "summarizing",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        write!(f, "{}", name)
    }
}

/// Ingest pipeline: discover files, name their tables, load them one by one
///
/// Files are loaded strictly in discovery order on a single loader
/// connection. A failed file is recorded and the run moves on; only
/// discovery or connection failures abort it. When two files map to the same
/// table the later one wins.
///
/// # Example
/// ```no_run
/// use tabload::etl::Pipeline;
/// use tabload::storage::SourceScanner;
/// use tabload::transform::TableNamer;
/// use tabload::warehouse::DuckDbLoader;
///
/// # fn example() -> eyre::Result<()> {
/// let mut pipeline = Pipeline::new(
///     SourceScanner::new(["data"]),
///     TableNamer::default(),
///     DuckDbLoader::new("warehouse.duckdb"),
/// );
///
/// let summary = pipeline.run()?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
    input_format: InputFormat,
    cancel: Option<CancelFlag>,
    stage: Stage,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor<Item = DiscoveredFile>,
    T: Transformer<Input = DiscoveredFile, Output = TableTarget>,
    L: Loader<Item = TableTarget>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
            input_format: InputFormat::default(),
            cancel: None,
            stage: Stage::Init,
        }
    }

    /// Only load files of this format; others are reported as skipped
    pub fn with_input_format(mut self, input_format: InputFormat) -> Self {
        self.input_format = input_format;
        self
    }

    /// Stop loading once `flag` is set; remaining files are reported as skipped
    pub fn with_cancel_flag(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run the pipeline to completion
    ///
    /// Steps:
    /// 1. Discover files
    /// 2. Derive a table target for each
    /// 3. Open the loader (skipped when nothing is loadable)
    /// 4. Load each target, recording a [`LoadResult`]
    /// 5. Close the loader and summarize
    ///
    /// # Errors
    /// Returns an error, leaving the pipeline in [`Stage::Aborted`], if
    /// discovery fails or the loader cannot be opened. Per-file failures are
    /// reported in the summary instead.
    pub fn run(&mut self) -> Result<RunSummary> {
        log::info!("Starting ingest pipeline");

        self.enter(Stage::Discovering);
        let files = match self.extractor.extract() {
            Ok(files) => files,
            Err(e) => return self.abort(e),
        };
        log::info!("Discovered {} data file(s)", files.len());

        let targets = match self.transformer.transform_many(files) {
            Ok(targets) => targets,
            Err(e) => return self.abort(e),
        };

        let input_format = self.input_format;
        let loadable = targets
            .iter()
            .any(|t| input_format.accepts(t.source_file.format));

        let (results, interrupted) = if loadable {
            if let Err(e) = self.loader.open() {
                return self.abort(e);
            }
            self.enter(Stage::Loading);
            let outcome = self.load_all(targets);
            if let Err(e) = self.loader.close() {
                log::warn!("Failed to close loader: {:#}", e);
            }
            outcome
        } else {
            if targets.is_empty() {
                log::warn!("No data files found, nothing to load");
            }
            let skipped = targets
                .into_iter()
                .map(|t| LoadResult::skipped(t, "input format filter"))
                .collect();
            (skipped, false)
        };

        self.enter(Stage::Summarizing);
        let summary = RunSummary::new(results, interrupted);
        log::info!(
            "Ingest complete: {} succeeded, {} skipped, {} failed",
            summary.succeeded,
            summary.skipped,
            summary.failed
        );

        self.enter(Stage::Done);
        Ok(summary)
    }

    fn load_all(&mut self, targets: Vec<TableTarget>) -> (Vec<LoadResult>, bool) {
        let mut results = Vec::with_capacity(targets.len());
        let mut loaded_from: HashMap<String, PathBuf> = HashMap::new();
        let mut interrupted = false;

        for target in targets {
            if !interrupted && self.is_cancelled() {
                log::warn!("Interrupted, skipping remaining files");
                interrupted = true;
            }
            if interrupted {
                results.push(LoadResult::skipped(target, "run interrupted"));
                continue;
            }

            let file = &target.source_file;
            if !self.input_format.accepts(file.format) {
                log::info!("Skipping {} (input format filter)", file.relative_name);
                results.push(LoadResult::skipped(target, "input format filter"));
                continue;
            }

            if let Some(previous) =
                loaded_from.insert(target.table_name.clone(), file.absolute_path.clone())
            {
                log::warn!(
                    "Table {} from {} is replaced by {}",
                    target.table_name,
                    previous.display(),
                    file.absolute_path.display()
                );
            }

            log::info!("Loading {} into {}", file.relative_name, target.table_name);
            match self.loader.load(&target) {
                Ok(rows) => {
                    log::info!("✓ Loaded {} row(s) into {}", rows, target.table_name);
                    results.push(LoadResult::success(target, rows));
                }
                Err(e) => {
                    let message = failure_message(&e);
                    log::error!(
                        "✗ Failed to load {}: {}",
                        target.source_file.absolute_path.display(),
                        message
                    );
                    results.push(LoadResult::failed(target, message));
                }
            }
        }

        (results, interrupted)
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    fn enter(&mut self, stage: Stage) {
        log::debug!("Pipeline stage: {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    fn abort<X>(&mut self, error: eyre::Report) -> Result<X> {
        self.enter(Stage::Aborted);
        // Release anything a partially opened loader may hold
        if let Err(e) = self.loader.close() {
            log::warn!("Failed to close loader: {:#}", e);
        }
        Err(error)
    }
}

/// The message stored in a failed [`LoadResult`]
fn failure_message(error: &eyre::Report) -> String {
    match error.downcast_ref::<IngestError>() {
        Some(IngestError::Load { message, .. }) => message.clone(),
        _ => format!("{:#}", error),
    }
}
