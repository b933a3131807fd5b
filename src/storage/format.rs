use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;

/// Tabular file formats the warehouse can load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// Classify a path by its extension (case-insensitive)
    ///
    /// Returns `None` for anything unsupported, including files without an
    /// extension.
    pub fn classify(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else if ext.eq_ignore_ascii_case("parquet") {
            Some(Self::Parquet)
        } else {
            None
        }
    }
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Parquet => write!(f, "parquet"),
        }
    }
}

/// Which discovered formats a run should load
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    Csv,
    Parquet,
    #[default]
    All,
}

impl InputFormat {
    pub fn accepts(&self, format: FileFormat) -> bool {
        match self {
            Self::All => true,
            Self::Csv => format == FileFormat::Csv,
            Self::Parquet => format == FileFormat::Parquet,
        }
    }
}
