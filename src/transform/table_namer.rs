//! Table name derivation
//!
//! Maps a discovered file to the table it is loaded into.

use crate::config::DEFAULT_TABLE_PREFIX;
use crate::etl::Transformer;
use crate::storage::DiscoveredFile;

use eyre::Result;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static INVALID_IDENT_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("valid identifier regex"));

/// A discovered file paired with the table it will replace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableTarget {
    pub table_name: String,
    pub source_file: DiscoveredFile,
}

/// Transformer that derives `prefix + file stem` table names
///
/// The prefix is always prepended. Every character outside `[A-Za-z0-9_]` is
/// replaced with `_` and the result is lower-cased, since the warehouse folds
/// identifier case anyway: `a.csv` and `A.csv` land in the same table.
///
/// # Example
/// ```
/// use tabload::transform::TableNamer;
///
/// let namer = TableNamer::default();
/// assert_eq!(namer.table_name("1sales"), "_1sales");
/// assert_eq!(namer.table_name("Cost Center (2024)"), "_cost_center__2024_");
/// ```
pub struct TableNamer {
    prefix: String,
}

impl TableNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Sanitized table name for a file stem
    pub fn table_name(&self, stem: &str) -> String {
        let raw = format!("{}{}", self.prefix, stem);
        let mut name = INVALID_IDENT_CHARS
            .replace_all(&raw, "_")
            .to_ascii_lowercase();

        // Only reachable with an empty prefix
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            name.insert(0, '_');
        }
        name
    }
}

impl Default for TableNamer {
    fn default() -> Self {
        Self::new(DEFAULT_TABLE_PREFIX)
    }
}

impl Transformer for TableNamer {
    type Input = DiscoveredFile;
    type Output = TableTarget;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(TableTarget {
            table_name: self.table_name(&input.stem()),
            source_file: input,
        })
    }
}
