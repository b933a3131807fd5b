//! Per-file outcomes and the run summary

use crate::transform::TableTarget;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoadStatus {
    Success,
    Skipped,
    Failed,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "SUCCESS"),
            Self::Skipped => write!(f, "SKIPPED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// Outcome of one discovered file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadResult {
    pub target: TableTarget,
    pub row_count: Option<u64>,
    pub status: LoadStatus,
    /// Failure message, or the reason a file was skipped
    pub error: Option<String>,
}

impl LoadResult {
    pub fn success(target: TableTarget, row_count: u64) -> Self {
        Self {
            target,
            row_count: Some(row_count),
            status: LoadStatus::Success,
            error: None,
        }
    }

    pub fn skipped(target: TableTarget, reason: impl Into<String>) -> Self {
        Self {
            target,
            row_count: None,
            status: LoadStatus::Skipped,
            error: Some(reason.into()),
        }
    }

    pub fn failed(target: TableTarget, error: impl Into<String>) -> Self {
        Self {
            target,
            row_count: None,
            status: LoadStatus::Failed,
            error: Some(error.into()),
        }
    }
}

/// Aggregated outcome of a run; never persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// The run stopped early on an interrupt
    pub interrupted: bool,
    pub results: Vec<LoadResult>,
}

impl RunSummary {
    pub fn new(results: Vec<LoadResult>, interrupted: bool) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        let (succeeded, skipped, failed) = (
            count(LoadStatus::Success),
            count(LoadStatus::Skipped),
            count(LoadStatus::Failed),
        );
        Self {
            succeeded,
            skipped,
            failed,
            interrupted,
            results,
        }
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn failures(&self) -> impl Iterator<Item = &LoadResult> {
        self.results
            .iter()
            .filter(|r| r.status == LoadStatus::Failed)
    }

    /// Process exit code: 0 on full success (including nothing to do), 1 if
    /// any file failed or the run was interrupted
    pub fn exit_code(&self) -> u8 {
        if self.failed > 0 || self.interrupted {
            1
        } else {
            0
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} failed",
            self.succeeded, self.skipped, self.failed
        )?;
        if self.interrupted {
            write!(f, " (interrupted)")?;
        }
        for failure in self.failures() {
            write!(
                f,
                "\n  {}: {}",
                failure.target.source_file.absolute_path.display(),
                failure.error.as_deref().unwrap_or("unknown error")
            )?;
        }
        Ok(())
    }
}
