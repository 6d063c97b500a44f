//! Tabular file extraction.
//!
//! Reads CSV, JSON and Parquet files into DataFrames. Failures surface as
//! typed errors so callers can tell "empty because no data" from "empty
//! because the read failed".

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{AnalyticsError, Result};

/// Extracts datasets from local files, resolving relative paths against a
/// configured data directory.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    data_dir: PathBuf,
}

impl FileExtractor {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Read a file, dispatching on its extension.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => self.read_csv(path),
            Some("json") => self.read_json(path),
            Some("parquet") => self.read_parquet(path),
            other => Err(AnalyticsError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Read a CSV file with header and schema inference.
    pub fn read_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = self.resolve(path.as_ref())?;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .try_into_reader_with_file_path(Some(path.clone()))
            .map_err(|e| read_failed(&path, e))?
            .finish()
            .map_err(|e| read_failed(&path, e))?;
        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "csv read"
        );
        Ok(df)
    }

    /// Read a JSON file (array of records).
    pub fn read_json(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = self.resolve(path.as_ref())?;
        let file = File::open(&path).map_err(|e| read_failed(&path, e))?;
        let df = JsonReader::new(file)
            .finish()
            .map_err(|e| read_failed(&path, e))?;
        info!(path = %path.display(), rows = df.height(), "json read");
        Ok(df)
    }

    /// Read a Parquet file.
    pub fn read_parquet(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = self.resolve(path.as_ref())?;
        let file = File::open(&path).map_err(|e| read_failed(&path, e))?;
        let df = ParquetReader::new(file)
            .finish()
            .map_err(|e| read_failed(&path, e))?;
        info!(path = %path.display(), rows = df.height(), "parquet read");
        Ok(df)
    }

    /// Read every `*.csv` in the data directory, keyed by file stem.
    pub fn read_all_csv(&self) -> Result<HashMap<String, DataFrame>> {
        let mut datasets = HashMap::new();
        for path in self.files_with_extension("csv")? {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("dataset")
                .to_string();
            datasets.insert(name, self.read_csv(&path)?);
        }
        info!(count = datasets.len(), "bulk csv extraction complete");
        Ok(datasets)
    }

    /// Files in the data directory with the given extension, sorted by name.
    pub fn files_with_extension(&self, extension: &str) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
            {
                files.push(path);
            }
        }
        files.sort();
        debug!(extension, count = files.len(), "directory scan");
        Ok(files)
    }

    /// Absolute paths pass through; everything else resolves against the
    /// data directory. A missing file is a read failure, not an empty result.
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let resolved = if path.exists() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        };
        if !resolved.exists() {
            return Err(AnalyticsError::ReadFailed {
                path: path.display().to_string(),
                reason: "file not found".to_string(),
            });
        }
        Ok(resolved)
    }
}

fn read_failed(path: &Path, error: impl std::fmt::Display) -> AnalyticsError {
    AnalyticsError::ReadFailed {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
}
