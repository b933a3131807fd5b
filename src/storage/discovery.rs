//! Source directory traversal

use super::FileFormat;
use crate::error::IngestError;
use crate::etl::Extractor;

use eyre::Result;
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// A CSV or Parquet file found under a source directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredFile {
    pub absolute_path: PathBuf,
    pub format: FileFormat,
    /// Path relative to the source directory it was found in, `/`-separated
    pub relative_name: String,
}

impl DiscoveredFile {
    /// File name without its extension; invalid UTF-8 is replaced with `U+FFFD`
    pub fn stem(&self) -> Cow<'_, str> {
        self.absolute_path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default()
    }
}

/// Recursively discover loadable files under one or more source directories
///
/// Discovery holds no state between calls; every `extract()` walks the
/// directories again. Results are ordered by absolute path, byte-wise, so
/// repeated runs load tables in the same order.
///
/// # Example
/// ```no_run
/// use tabload::etl::Extractor;
/// use tabload::storage::SourceScanner;
///
/// # fn example() -> eyre::Result<()> {
/// let scanner = SourceScanner::new(["data/actuals", "data/commitments"]);
/// for file in scanner.extract()? {
///     println!("{} ({})", file.relative_name, file.format);
/// }
/// # Ok(())
/// # }
/// ```
pub struct SourceScanner {
    sources: Vec<PathBuf>,
}

impl SourceScanner {
    pub fn new<P: AsRef<Path>>(sources: impl IntoIterator<Item = P>) -> Self {
        Self {
            sources: sources
                .into_iter()
                .map(|p| p.as_ref().to_path_buf())
                .collect(),
        }
    }

    /// Discover every supported file below a single directory
    ///
    /// Hidden entries (names starting with `.`) are skipped, as are
    /// directories reached through symlinks. Symlinked files are followed.
    ///
    /// # Errors
    /// Returns [`IngestError::SourceNotFound`] if `dir` does not exist, is not
    /// a directory, or cannot be read.
    pub fn scan_dir(dir: impl AsRef<Path>) -> Result<Vec<DiscoveredFile>, IngestError> {
        let dir = dir.as_ref();
        let not_found = || IngestError::SourceNotFound {
            paths: vec![dir.to_path_buf()],
        };

        if !dir.is_dir() {
            return Err(not_found());
        }
        let root = std::path::absolute(dir).map_err(|_| not_found())?;
        let entries = std::fs::read_dir(&root).map_err(|_| not_found())?;

        let mut files = Vec::new();
        walk(&root, entries, &mut files);
        files.sort_by(|a, b| a.absolute_path.as_os_str().cmp(b.absolute_path.as_os_str()));
        Ok(files)
    }
}

fn walk(root: &Path, entries: std::fs::ReadDir, files: &mut Vec<DiscoveredFile>) {
    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();

        if entry.file_name().to_string_lossy().starts_with('.') {
            log::debug!("Skipping hidden entry {}", path.display());
            continue;
        }

        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            match std::fs::read_dir(&path) {
                Ok(children) => walk(root, children, files),
                Err(e) => log::warn!("Cannot read directory {}: {}", path.display(), e),
            }
            continue;
        }

        let is_file = if file_type.is_symlink() {
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => {
                    log::debug!("Not following directory symlink {}", path.display());
                    false
                }
                Ok(meta) => meta.is_file(),
                Err(_) => false,
            }
        } else {
            file_type.is_file()
        };

        if !is_file {
            continue;
        }

        let Some(format) = FileFormat::classify(&path) else {
            continue;
        };

        let relative_name = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        files.push(DiscoveredFile {
            absolute_path: path,
            format,
            relative_name,
        });
    }
}

impl Extractor for SourceScanner {
    type Item = DiscoveredFile;

    /// Scan all sources and merge them into one ordered list
    ///
    /// A missing source only produces a warning unless every source is
    /// missing. A file reached through overlapping sources is kept once.
    fn extract(&self) -> Result<Vec<Self::Item>> {
        let mut files = Vec::new();
        let mut missing = Vec::new();

        for source in &self.sources {
            match Self::scan_dir(source) {
                Ok(found) => {
                    log::debug!("Found {} file(s) in {}", found.len(), source.display());
                    files.extend(found);
                }
                Err(e) => {
                    log::warn!("Skipping source: {}", e);
                    missing.push(source.clone());
                }
            }
        }

        if missing.len() == self.sources.len() {
            return Err(IngestError::SourceNotFound { paths: missing }.into());
        }

        files.sort_by(|a, b| a.absolute_path.as_os_str().cmp(b.absolute_path.as_os_str()));
        files.dedup_by(|a, b| a.absolute_path == b.absolute_path);
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "id\n1\n").unwrap();
    }

    fn names(files: &[DiscoveredFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative_name.as_str()).collect()
    }

    #[test]
    fn test_unsupported_files_are_ignored() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "notes.txt");
        touch(temp.path(), "report.xlsx");
        touch(temp.path(), "nested/readme.md");

        let files = SourceScanner::scan_dir(temp.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_recursive_and_sorted() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "b.csv");
        touch(temp.path(), "a/z.parquet");
        touch(temp.path(), "A.CSV");

        let files = SourceScanner::scan_dir(temp.path()).unwrap();
        assert_eq!(names(&files), vec!["A.CSV", "a/z.parquet", "b.csv"]);
        assert_eq!(files[0].format, FileFormat::Csv);
        assert_eq!(files[1].format, FileFormat::Parquet);
        assert!(files.iter().all(|f| f.absolute_path.is_absolute()));
    }

    #[test]
    fn test_hidden_entries_are_skipped() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), ".~lock.orders.csv");
        touch(temp.path(), ".cache/orders.csv");
        touch(temp.path(), "orders.csv");

        let files = SourceScanner::scan_dir(temp.path()).unwrap();
        assert_eq!(names(&files), vec!["orders.csv"]);
    }

    #[test]
    fn test_missing_directory() {
        let temp = TempDir::new().unwrap();
        let err = SourceScanner::scan_dir(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, IngestError::SourceNotFound { .. }));
    }

    #[test]
    fn test_file_is_not_a_source() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "orders.csv");
        let err = SourceScanner::scan_dir(temp.path().join("orders.csv")).unwrap_err();
        assert!(matches!(err, IngestError::SourceNotFound { .. }));
    }

    #[test]
    fn test_extract_tolerates_some_missing_sources() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "good/orders.csv");

        let scanner = SourceScanner::new([temp.path().join("good"), temp.path().join("missing")]);
        let files = scanner.extract().unwrap();
        assert_eq!(names(&files), vec!["orders.csv"]);
    }

    #[test]
    fn test_extract_fails_when_all_sources_missing() {
        let temp = TempDir::new().unwrap();
        let scanner = SourceScanner::new([temp.path().join("x"), temp.path().join("y")]);

        let err = scanner.extract().unwrap_err();
        match err.downcast_ref::<IngestError>() {
            Some(IngestError::SourceNotFound { paths }) => assert_eq!(paths.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_extract_merges_and_dedups_overlapping_sources() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "z.csv");
        touch(temp.path(), "sub/a.csv");

        let scanner = SourceScanner::new([temp.path().to_path_buf(), temp.path().join("sub")]);
        let files = scanner.extract().unwrap();

        assert_eq!(files.len(), 2);
        assert!(files[0].absolute_path.ends_with("sub/a.csv"));
        assert!(files[1].absolute_path.ends_with("z.csv"));
    }

    #[test]
    fn test_extract_is_restartable() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "orders.csv");
        let scanner = SourceScanner::new([temp.path()]);

        assert_eq!(scanner.extract().unwrap().len(), 1);
        touch(temp.path(), "refunds.csv");
        assert_eq!(scanner.extract().unwrap().len(), 2);
    }

    #[test]
    fn test_stem() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "1sales.csv");
        let files = SourceScanner::scan_dir(temp.path()).unwrap();
        assert_eq!(files[0].stem(), "1sales");
    }

    #[cfg(unix)]
    #[test]
    fn test_stem_keeps_non_utf8_names_apart() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(OsStr::from_bytes(b"caf\xe9.csv")), "id\n1\n").unwrap();
        fs::write(temp.path().join(OsStr::from_bytes(b"na\xefve.csv")), "id\n1\n").unwrap();

        let files = SourceScanner::scan_dir(temp.path()).unwrap();
        let stems: Vec<_> = files.iter().map(|f| f.stem().into_owned()).collect();
        assert_eq!(stems, vec!["caf\u{fffd}", "na\u{fffd}ve"]);
    }
}
