//! Exploratory dataset profiling.
//!
//! [`ExploratoryProfiler::analyze`] inspects a dataset and produces an
//! immutable [`ProfileReport`] with six fixed sections: basic info, data
//! types, missing values, descriptive statistics, unique values and
//! heuristic insights. Every sub-computation degrades gracefully on
//! degenerate input (zero rows, zero columns, all-missing columns).

mod insights;
mod statistics;

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::Local;
use polars::prelude::*;
use tracing::{debug, info};

use crate::error::{AnalyticsError, Result};
use crate::report::{ReportFormat, ReportWriter};
use crate::types::{
    BasicInfo, ColumnKind, ColumnType, ColumnUniqueness, DataTypes, DescriptiveStats, KindCount,
    MissingColumn, MissingValues, ProfileReport,
};
use crate::utils::{any_value_to_string, kind_of_series};

/// Columns with more distinct values than this omit the value sample.
const SAMPLE_DISTINCT_LIMIT: usize = 10;
/// At most this many sample values are kept per column.
const SAMPLE_SIZE: usize = 5;

/// Profiles datasets and keeps the produced reports indexed by name.
#[derive(Debug, Default)]
pub struct ExploratoryProfiler {
    results: HashMap<String, ProfileReport>,
}

impl ExploratoryProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the full analysis. The report is returned and also retained
    /// under `name` for later retrieval; the dataset itself is not kept.
    pub fn analyze(&mut self, df: &DataFrame, name: &str) -> Result<ProfileReport> {
        info!(dataset = name, rows = df.height(), "starting analysis");

        let report = ProfileReport {
            dataset: name.to_string(),
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            basic_info: Self::basic_info(df),
            data_types: Self::data_types(df),
            missing_values: Self::missing_values(df),
            descriptive_stats: Self::descriptive_stats(df)?,
            unique_values: Self::unique_values(df)?,
            insights: insights::generate_insights(df)?,
        };

        self.results.insert(name.to_string(), report.clone());
        debug!(dataset = name, "analysis complete");
        Ok(report)
    }

    /// Most recent report stored under the given dataset name.
    pub fn report(&self, name: &str) -> Option<&ProfileReport> {
        self.results.get(name)
    }

    /// Write a previously produced report through the given writer.
    pub fn export(
        &self,
        name: &str,
        writer: &ReportWriter,
        format: ReportFormat,
    ) -> Result<PathBuf> {
        let report = self
            .results
            .get(name)
            .ok_or_else(|| AnalyticsError::ReportNotFound(name.to_string()))?;
        writer.write(report, format)
    }

    /// Shape, approximate memory footprint and column list.
    pub fn basic_info(df: &DataFrame) -> BasicInfo {
        let bytes = df.estimated_size() as f64;
        BasicInfo {
            rows: df.height(),
            columns: df.width(),
            memory_usage_mb: (bytes / (1024.0 * 1024.0) * 100.0).round() / 100.0,
            column_names: df
                .get_column_names()
                .into_iter()
                .map(|n| n.to_string())
                .collect(),
        }
    }

    /// Column count per semantic kind plus the per-column assignment.
    pub fn data_types(df: &DataFrame) -> DataTypes {
        let details: Vec<ColumnType> = df
            .get_columns()
            .iter()
            .map(|col| ColumnType {
                name: col.name().to_string(),
                kind: kind_of_series(col.as_materialized_series()),
            })
            .collect();

        let summary = ColumnKind::ALL
            .iter()
            .filter_map(|kind| {
                let count = details.iter().filter(|c| c.kind == *kind).count();
                (count > 0).then_some(KindCount { kind: *kind, count })
            })
            .collect();

        DataTypes { summary, details }
    }

    /// Missing-cell totals and the per-column breakdown, descending by
    /// count with ties kept in column order.
    pub fn missing_values(df: &DataFrame) -> MissingValues {
        let rows = df.height();
        let cells = rows * df.width();

        let mut details: Vec<MissingColumn> = df
            .get_columns()
            .iter()
            .filter_map(|col| {
                let count = col.as_materialized_series().null_count();
                (count > 0).then(|| MissingColumn {
                    name: col.name().to_string(),
                    count,
                    percentage: (count as f64 / rows as f64) * 100.0,
                })
            })
            .collect();
        // Stable sort: equal counts stay in original column order.
        details.sort_by(|a, b| b.count.cmp(&a.count));

        let total_missing: usize = details.iter().map(|c| c.count).sum();
        let total_missing_pct = if cells == 0 {
            0.0
        } else {
            (total_missing as f64 / cells as f64) * 100.0
        };

        MissingValues {
            total_missing,
            total_missing_pct,
            columns_with_missing: details.len(),
            details,
        }
    }

    /// Summary statistics for the numeric columns, or the explicit
    /// no-numeric-columns marker.
    pub fn descriptive_stats(df: &DataFrame) -> Result<DescriptiveStats> {
        let numeric: Vec<&Series> = df
            .get_columns()
            .iter()
            .map(|c| c.as_materialized_series())
            .filter(|s| kind_of_series(s) == ColumnKind::Numeric)
            .collect();

        if numeric.is_empty() {
            return Ok(DescriptiveStats::NoNumericColumns);
        }

        let summaries = numeric
            .into_iter()
            .map(|series| statistics::summarize_numeric(series.name(), series))
            .collect::<Result<Vec<_>>>()?;
        Ok(DescriptiveStats::Computed(summaries))
    }

    /// Distinct-value counts per column, with a bounded first-appearance
    /// sample for low-cardinality columns.
    pub fn unique_values(df: &DataFrame) -> Result<Vec<ColumnUniqueness>> {
        let rows = df.height();
        let mut out = Vec::with_capacity(df.width());

        for col in df.get_columns() {
            let series = col.as_materialized_series();
            let non_null = series.drop_nulls();
            let distinct = non_null.n_unique()?;

            let sample = if distinct <= SAMPLE_DISTINCT_LIMIT {
                let mut seen: Vec<String> = Vec::new();
                for i in 0..non_null.len() {
                    let value = any_value_to_string(&non_null.get(i)?);
                    if !seen.contains(&value) {
                        seen.push(value);
                        if seen.len() == SAMPLE_SIZE {
                            break;
                        }
                    }
                }
                seen
            } else {
                Vec::new()
            };

            out.push(ColumnUniqueness {
                name: series.name().to_string(),
                distinct,
                unique_ratio: if rows == 0 {
                    0.0
                } else {
                    distinct as f64 / rows as f64
                },
                sample,
            });
        }

        Ok(out)
    }
}
