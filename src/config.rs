//! Run configuration and path resolution
//!
//! Values given on the command line always win. When they are absent the
//! resolver falls back to `Settings`, a snapshot of `DATABASE_PATH` and
//! `PROJECT_PATH` taken once at startup.

use crate::error::IngestError;
use std::path::{Path, PathBuf};

/// Table prefix used when none is supplied
pub const DEFAULT_TABLE_PREFIX: &str = "_";

/// Environment-derived fallbacks for the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub database_path: Option<PathBuf>,
    pub project_path: Option<PathBuf>,
}

impl Settings {
    /// Snapshot `DATABASE_PATH` and `PROJECT_PATH` from the process environment
    ///
    /// Call after the dotenv file has been sourced.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let path = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            database_path: path("DATABASE_PATH"),
            project_path: path("PROJECT_PATH"),
        }
    }
}

/// Explicit, already-parsed command line values
#[derive(Debug, Clone, Default)]
pub struct PathArgs {
    pub source_paths: Vec<PathBuf>,
    pub table_prefix: Option<String>,
    pub database_path: Option<PathBuf>,
    pub project_path: Option<PathBuf>,
}

/// Validated configuration for a single run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Directories to scan, in the order given; never empty
    pub source_paths: Vec<PathBuf>,
    pub table_prefix: String,
    pub database_path: PathBuf,
}

/// Resolve a [`SourceSpec`] from explicit arguments and fallback settings
///
/// Sources are resolved before the database path is touched, so a run with no
/// usable source never creates any directory.
///
/// # Errors
/// Returns [`IngestError::Configuration`] when no source path or no database
/// path can be resolved, or when the database's parent directory cannot be
/// created.
pub fn resolve(args: PathArgs, settings: Settings) -> Result<SourceSpec, IngestError> {
    let project_path = args.project_path.or(settings.project_path);

    let source_paths = match (args.source_paths.is_empty(), &project_path) {
        (false, Some(project)) => args
            .source_paths
            .into_iter()
            .map(|p| if p.is_relative() { project.join(p) } else { p })
            .collect(),
        (false, None) => args.source_paths,
        (true, Some(project)) => {
            log::debug!("No --source-path given, using project path as the source");
            vec![project.clone()]
        }
        (true, None) => {
            return Err(IngestError::configuration(
                "no source path given and PROJECT_PATH is not set",
            ));
        }
    };

    let database_path = args
        .database_path
        .or(settings.database_path)
        .ok_or_else(|| {
            IngestError::configuration("no database path given and DATABASE_PATH is not set")
        })?;
    ensure_database_location(&database_path)?;

    let table_prefix = args
        .table_prefix
        .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());

    Ok(SourceSpec {
        source_paths,
        table_prefix,
        database_path,
    })
}

/// Check the database path is usable, creating its parent directory if needed
///
/// The database file itself is created by the backend on first connect.
fn ensure_database_location(database_path: &Path) -> Result<(), IngestError> {
    if database_path.is_dir() {
        return Err(IngestError::configuration(format!(
            "database path {} is a directory",
            database_path.display()
        )));
    }

    match database_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            log::info!("Creating database directory {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                IngestError::configuration(format!(
                    "cannot create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn settings(vars: &[(&str, &str)]) -> Settings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_settings_ignore_blank_values() {
        let s = settings(&[("DATABASE_PATH", "  "), ("PROJECT_PATH", "/srv/project")]);
        assert_eq!(s.database_path, None);
        assert_eq!(s.project_path, Some(PathBuf::from("/srv/project")));
    }

    #[test]
    fn test_explicit_arguments_win() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("cli.duckdb");
        let args = PathArgs {
            source_paths: vec![PathBuf::from("/data/raw")],
            table_prefix: Some("raw_".to_string()),
            database_path: Some(db.clone()),
            project_path: None,
        };
        let env = settings(&[("DATABASE_PATH", "/elsewhere/env.duckdb")]);

        let spec = resolve(args, env).unwrap();
        assert_eq!(spec.database_path, db);
        assert_eq!(spec.source_paths, vec![PathBuf::from("/data/raw")]);
        assert_eq!(spec.table_prefix, "raw_");
    }

    #[test]
    fn test_falls_back_to_settings() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("env.duckdb");
        let project = temp.path().join("project");
        let env = Settings {
            database_path: Some(db.clone()),
            project_path: Some(project.clone()),
        };

        let spec = resolve(PathArgs::default(), env).unwrap();
        assert_eq!(spec.database_path, db);
        assert_eq!(spec.source_paths, vec![project]);
        assert_eq!(spec.table_prefix, DEFAULT_TABLE_PREFIX);
    }

    #[test]
    fn test_relative_sources_join_project_path() {
        let temp = TempDir::new().unwrap();
        let args = PathArgs {
            source_paths: vec![PathBuf::from("actuals"), PathBuf::from("/abs/commits")],
            database_path: Some(temp.path().join("w.duckdb")),
            project_path: Some(PathBuf::from("/srv/project")),
            ..Default::default()
        };

        let spec = resolve(args, Settings::default()).unwrap();
        assert_eq!(
            spec.source_paths,
            vec![
                PathBuf::from("/srv/project/actuals"),
                PathBuf::from("/abs/commits")
            ]
        );
    }

    #[test]
    fn test_missing_source_is_configuration_error() {
        let temp = TempDir::new().unwrap();
        let db_dir = temp.path().join("not-created");
        let args = PathArgs {
            database_path: Some(db_dir.join("w.duckdb")),
            ..Default::default()
        };

        let err = resolve(args, Settings::default()).unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
        assert!(!db_dir.exists());
    }

    #[test]
    fn test_missing_database_is_configuration_error() {
        let args = PathArgs {
            source_paths: vec![PathBuf::from("/data")],
            ..Default::default()
        };
        let err = resolve(args, Settings::default()).unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
    }

    #[test]
    fn test_creates_database_parent_directory() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("nested/dir/w.duckdb");
        let args = PathArgs {
            source_paths: vec![PathBuf::from("/data")],
            database_path: Some(db.clone()),
            ..Default::default()
        };

        resolve(args, Settings::default()).unwrap();
        assert!(db.parent().unwrap().is_dir());
        assert!(!db.exists());
    }

    #[test]
    fn test_database_path_cannot_be_directory() {
        let temp = TempDir::new().unwrap();
        let args = PathArgs {
            source_paths: vec![PathBuf::from("/data")],
            database_path: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        let err = resolve(args, Settings::default()).unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
    }
}
