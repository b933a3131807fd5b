//! DuckDB warehouse handle

use crate::error::IngestError;
use crate::storage::{DiscoveredFile, FileFormat};
use crate::transform::TableTarget;

use duckdb::Connection;
use eyre::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// An open DuckDB database file
///
/// The connection is released by [`close`](Warehouse::close) or on drop,
/// whichever happens first.
pub struct Warehouse {
    path: PathBuf,
    conn: Connection,
}

impl Warehouse {
    /// Open (creating if absent) the database file at `path`
    ///
    /// # Errors
    /// Returns [`IngestError::Connection`] if DuckDB cannot open the file,
    /// e.g. because another process holds its lock.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path).map_err(|source| IngestError::Connection {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, conn })
    }

    /// Atomically replace `target.table_name` with the contents of its file
    ///
    /// CSV schemas are inferred by DuckDB's reader from the header and sampled
    /// rows; Parquet schemas come from the file footer. On any failure the
    /// transaction is rolled back and the previous table, if any, is left
    /// untouched.
    ///
    /// Returns the number of rows in the new table.
    pub fn replace_table_from_file(&self, target: &TableTarget) -> Result<u64, IngestError> {
        let file = &target.source_file;
        let table = &target.table_name;
        let load_error = |e: &dyn std::fmt::Display| IngestError::load(&file.absolute_path, e);

        if file.format == FileFormat::Csv && !has_header_line(&file.absolute_path)? {
            return Err(load_error(&"CSV file has no header row"));
        }

        let sql = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}",
            quote_ident(table),
            scan_expression(file)?
        );
        log::debug!("{}", sql);

        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| load_error(&e))?;

        let loaded = self
            .conn
            .execute_batch(&sql)
            .map_err(|e| load_error(&e))
            .and_then(|_| {
                let columns = self.column_count(table).map_err(|e| load_error(&e))?;
                if columns == 0 {
                    return Err(load_error(&"schema inference produced no columns"));
                }
                self.row_count(table).map_err(|e| load_error(&e))
            });

        match loaded {
            Ok(rows) => match self.conn.execute_batch("COMMIT") {
                Ok(()) => Ok(rows),
                Err(e) => {
                    self.rollback();
                    Err(load_error(&e))
                }
            },
            Err(e) => {
                self.rollback();
                Err(e)
            }
        }
    }

    fn rollback(&self) {
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            log::debug!("Rollback after failed load: {}", e);
        }
    }

    /// Number of rows in `table`
    pub fn row_count(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT count(*) FROM {}", quote_ident(table));
        let count: i64 = self
            .conn
            .query_row(&sql, [], |row| row.get(0))
            .with_context(|| format!("Failed to count rows of {}", table))?;
        Ok(count.max(0) as u64)
    }

    /// Number of columns of `table` in the main schema (0 if it does not exist)
    pub fn column_count(&self, table: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT count(*) FROM information_schema.columns \
                 WHERE table_schema = 'main' AND table_name = ?",
                duckdb::params![table],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to read columns of {}", table))?;
        Ok(count.max(0) as usize)
    }

    /// Names of all tables in the main schema, sorted
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to list tables")?;
        Ok(names)
    }

    /// Access the underlying connection for ad-hoc queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Close the connection, releasing the database file lock
    pub fn close(self) -> Result<()> {
        let path = self.path;
        self.conn
            .close()
            .map_err(|(_, e)| e)
            .with_context(|| format!("Failed to close database {}", path.display()))
    }
}

/// Quote an identifier for DuckDB
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Table function that reads exactly `file` with its format's reader
fn scan_expression(file: &DiscoveredFile) -> Result<String, IngestError> {
    let path = file
        .absolute_path
        .to_str()
        .ok_or_else(|| IngestError::load(&file.absolute_path, "path is not valid UTF-8"))?;
    let path = path_literal(path);
    Ok(match file.format {
        FileFormat::Csv => format!(
            "read_csv('{}', header = true, delim = ',', auto_detect = true)",
            path
        ),
        FileFormat::Parquet => format!("read_parquet('{}')", path),
    })
}

/// Escape `path` for a single-quoted SQL string that DuckDB also expands as a
/// glob: `*`, `?` and `[` become one-character classes so they match only
/// themselves
fn path_literal(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '\'' => escaped.push_str("''"),
            '*' | '?' | '[' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Whether the first line of a CSV file carries any content
fn has_header_line(path: &Path) -> Result<bool, IngestError> {
    let file = File::open(path).map_err(|e| IngestError::load(path, e))?;
    let mut first = Vec::new();
    BufReader::new(file)
        .read_until(b'\n', &mut first)
        .map_err(|e| IngestError::load(path, e))?;
    Ok(first.iter().any(|b| !b.is_ascii_whitespace()))
}
