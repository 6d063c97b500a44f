//! Dataset cleaning and shaping operations.
//!
//! Every operation takes a dataset by reference and returns a **new**
//! dataset; the caller's copy is never mutated. Each call appends one entry
//! to the transformer's append-only audit log, so the log order is the
//! application order.

pub(crate) mod convert;

use chrono::Datelike;
use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{AnalyticsError, Result};
use crate::types::{ColumnKind, TransformationRecord};
use crate::utils::{
    bool_mode, fill_bool_nulls, fill_numeric_nulls, fill_string_nulls, kind_of_series,
    string_mode,
};

/// Placeholder used when a column has no mode to fill with.
const MODE_FALLBACK: &str = "Unknown";

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("static pattern"));
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static pattern"));

/// Policy for treating missing values. A closed set: anything outside it is
/// rejected at parse time instead of silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Remove every row containing a missing value.
    Drop,
    /// Numeric columns: fill with the per-column mean of present values.
    FillMean,
    /// Numeric columns: fill with the per-column median.
    FillMedian,
    /// Non-numeric columns: fill with the per-column mode.
    FillMode,
    /// Per column: numeric gets the median, everything else the mode.
    Auto,
}

impl MissingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::FillMean => "fill_mean",
            Self::FillMedian => "fill_median",
            Self::FillMode => "fill_mode",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MissingStrategy {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "drop" => Ok(Self::Drop),
            "fill_mean" => Ok(Self::FillMean),
            "fill_median" => Ok(Self::FillMedian),
            "fill_mode" => Ok(Self::FillMode),
            "auto" => Ok(Self::Auto),
            other => Err(AnalyticsError::InvalidStrategy(other.to_string())),
        }
    }
}

/// Applies cleaning operations and records each one in an audit log owned
/// by this instance.
#[derive(Debug, Default)]
pub struct DataTransformer {
    log: Vec<TransformationRecord>,
}

impl DataTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The audit log, in application order.
    pub fn log(&self) -> &[TransformationRecord] {
        &self.log
    }

    fn record(&mut self, operation: &str, details: serde_json::Value) {
        self.log.push(TransformationRecord::new(operation, details));
    }

    /// Normalise column names: lowercase, trim, strip punctuation, collapse
    /// whitespace runs to a single underscore.
    pub fn clean_column_names(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let original: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        let cleaned: Vec<String> = original.iter().map(|n| clean_name(n)).collect();

        let mut out = df.clone();
        out.set_column_names(cleaned.iter().map(|n| n.as_str()))?;

        self.record(
            "clean_column_names",
            json!({ "original": original, "new": cleaned }),
        );
        debug!("column names normalised");
        Ok(out)
    }

    /// Treat missing values according to the given strategy. A dataset with
    /// no missing values is returned unchanged, with the log still recording
    /// that nothing was found.
    pub fn handle_missing_values(
        &mut self,
        df: &DataFrame,
        strategy: MissingStrategy,
    ) -> Result<DataFrame> {
        let missing_before = total_missing(df);
        if missing_before == 0 {
            info!("no missing values found");
            self.record(
                "handle_missing_values",
                json!({
                    "strategy": strategy.as_str(),
                    "missing_before": 0,
                    "missing_after": 0,
                }),
            );
            return Ok(df.clone());
        }

        let out = match strategy {
            MissingStrategy::Drop => drop_rows_with_nulls(df)?,
            MissingStrategy::FillMean => fill_numeric_columns(df, NumericFill::Mean)?,
            MissingStrategy::FillMedian => fill_numeric_columns(df, NumericFill::Median)?,
            MissingStrategy::FillMode => fill_non_numeric_columns(df)?,
            MissingStrategy::Auto => fill_auto(df)?,
        };

        let missing_after = total_missing(&out);
        info!(
            strategy = strategy.as_str(),
            missing_before, missing_after, "missing values handled"
        );
        self.record(
            "handle_missing_values",
            json!({
                "strategy": strategy.as_str(),
                "missing_before": missing_before,
                "missing_after": missing_after,
            }),
        );
        Ok(out)
    }

    /// Drop rows that duplicate an earlier row, compared on the given column
    /// subset or on all columns. The first occurrence is kept and row order
    /// is preserved.
    pub fn remove_duplicates(
        &mut self,
        df: &DataFrame,
        subset: Option<&[String]>,
    ) -> Result<DataFrame> {
        if let Some(columns) = subset {
            for column in columns {
                if df.column(column).is_err() {
                    return Err(AnalyticsError::ColumnNotFound(column.clone()));
                }
            }
        }

        let before = df.height();
        let out = match subset {
            Some(columns) => {
                df.unique_stable(Some(columns.to_vec()), UniqueKeepStrategy::First, None)?
            }
            None => df.unique_stable::<&str, &str>(None, UniqueKeepStrategy::First, None)?,
        };
        let after = out.height();
        let removed = before - after;
        if removed > 0 {
            info!(removed, "duplicate rows removed");
        }

        self.record(
            "remove_duplicates",
            json!({ "before": before, "after": after, "removed": removed }),
        );
        Ok(out)
    }

    /// Best-effort dtype conversion for text columns: temporal first, then
    /// numeric. A column where either parse fails on any value is left
    /// untouched.
    pub fn convert_dtypes(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();
        let mut converted = serde_json::Map::new();

        let names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        for name in names {
            let series = out.column(&name)?.as_materialized_series().clone();
            if kind_of_series(&series) != ColumnKind::Text {
                continue;
            }

            if let Some(temporal) = convert::try_parse_temporal(&series)? {
                out.replace(&name, temporal)?;
                converted.insert(name.clone(), json!("temporal"));
                debug!(column = %name, "converted to temporal");
                continue;
            }
            if let Some(numeric) = convert::try_parse_numeric(&series) {
                out.replace(&name, numeric)?;
                converted.insert(name.clone(), json!("numeric"));
                debug!(column = %name, "converted to numeric");
            }
        }

        self.record("convert_dtypes", json!({ "converted": converted }));
        Ok(out)
    }

    /// Derive calendar feature columns (`_year`, `_month`, `_day`,
    /// `_dayofweek`, `_quarter`) from a date column, coercing it to a
    /// temporal type first when needed. A no-op when the column is absent.
    pub fn create_date_features(&mut self, df: &DataFrame, date_column: &str) -> Result<DataFrame> {
        if df.column(date_column).is_err() {
            self.record(
                "create_date_features",
                json!({ "column": date_column, "created": [] }),
            );
            return Ok(df.clone());
        }

        let mut out = df.clone();
        let series = out.column(date_column)?.as_materialized_series().clone();
        let temporal = convert::to_temporal(&series)?;
        out.replace(date_column, temporal.clone())?;

        let dates = convert::calendar_dates(&temporal)?;
        let created = [
            ("year", date_part(&dates, |d| d.year())),
            ("month", date_part(&dates, |d| d.month() as i32)),
            ("day", date_part(&dates, |d| d.day() as i32)),
            // Monday = 0, matching the usual day-of-week feature encoding.
            (
                "dayofweek",
                date_part(&dates, |d| d.weekday().num_days_from_monday() as i32),
            ),
            ("quarter", date_part(&dates, |d| (d.month0() / 3 + 1) as i32)),
        ];

        let mut created_names = Vec::with_capacity(created.len());
        for (suffix, values) in created {
            let name = format!("{}_{}", date_column, suffix);
            out.with_column(Series::new(name.as_str().into(), values))?;
            created_names.push(name);
        }

        info!(column = date_column, "date features created");
        self.record(
            "create_date_features",
            json!({ "column": date_column, "created": created_names }),
        );
        Ok(out)
    }
}

fn clean_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_WORD.replace_all(lowered.trim(), "");
    WHITESPACE_RUN
        .replace_all(stripped.trim(), "_")
        .into_owned()
}

fn total_missing(df: &DataFrame) -> usize {
    df.get_columns()
        .iter()
        .map(|c| c.as_materialized_series().null_count())
        .sum()
}

/// Keep only rows without any null cell.
fn drop_rows_with_nulls(df: &DataFrame) -> Result<DataFrame> {
    if df.width() == 0 {
        return Ok(df.clone());
    }

    // Accumulate per-row null counts, then keep rows where the count is zero.
    let mut null_counts = Series::new("nulls".into(), vec![0u32; df.height()]);
    for col in df.get_columns() {
        let null_int = col
            .as_materialized_series()
            .is_null()
            .cast(&DataType::UInt32)?;
        null_counts = (&null_counts + &null_int)?;
    }
    let null_counts = null_counts.cast(&DataType::Float64)?;
    let mask = null_counts.lt_eq(0.0)?;
    Ok(df.filter(&mask)?)
}

enum NumericFill {
    Mean,
    Median,
}

fn fill_numeric_columns(df: &DataFrame, fill: NumericFill) -> Result<DataFrame> {
    let mut out = df.clone();
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();

    for name in names {
        let series = out.column(&name)?.as_materialized_series().clone();
        if kind_of_series(&series) != ColumnKind::Numeric || series.null_count() == 0 {
            continue;
        }
        let value = match fill {
            NumericFill::Mean => series.mean(),
            NumericFill::Median => series.median(),
        };
        if let Some(value) = value {
            out.replace(&name, fill_numeric_nulls(&series, value)?)?;
        }
    }
    Ok(out)
}

fn fill_non_numeric_columns(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();

    for name in names {
        let series = out.column(&name)?.as_materialized_series().clone();
        if kind_of_series(&series) == ColumnKind::Numeric || series.null_count() == 0 {
            continue;
        }
        if let Some(filled) = fill_non_numeric_column(&series)? {
            out.replace(&name, filled)?;
        }
    }
    Ok(out)
}

/// Mode-style fill for one non-numeric column. Entirely-missing columns get
/// the literal placeholder, temporal columns use neighbouring values.
fn fill_non_numeric_column(series: &Series) -> Result<Option<Series>> {
    if series.null_count() == series.len() {
        let placeholder = vec![MODE_FALLBACK; series.len()];
        return Ok(Some(Series::new(series.name().clone(), placeholder)));
    }

    match kind_of_series(series) {
        ColumnKind::Text => {
            let value = string_mode(series).unwrap_or_else(|| MODE_FALLBACK.to_string());
            Ok(Some(fill_string_nulls(series, &value)?))
        }
        ColumnKind::Boolean => match bool_mode(series) {
            Some(value) => Ok(Some(fill_bool_nulls(series, value)?)),
            None => Ok(None),
        },
        ColumnKind::Temporal => {
            let filled = series.fill_null(FillNullStrategy::Forward(None))?;
            let filled = filled.fill_null(FillNullStrategy::Backward(None))?;
            Ok(Some(filled))
        }
        _ => Ok(None),
    }
}

fn fill_auto(df: &DataFrame) -> Result<DataFrame> {
    let mut out = df.clone();
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();

    for name in names {
        let series = out.column(&name)?.as_materialized_series().clone();
        if series.null_count() == 0 {
            continue;
        }
        if kind_of_series(&series) == ColumnKind::Numeric {
            if let Some(median) = series.median() {
                out.replace(&name, fill_numeric_nulls(&series, median)?)?;
            }
        } else if let Some(filled) = fill_non_numeric_column(&series)? {
            out.replace(&name, filled)?;
        }
    }
    Ok(out)
}

fn date_part<F>(dates: &[Option<chrono::NaiveDate>], part: F) -> Vec<Option<i32>>
where
    F: Fn(chrono::NaiveDate) -> i32,
{
    dates.iter().map(|d| d.map(&part)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    #[test]
    fn test_strategy_parsing_rejects_unknown() {
        assert_eq!(
            MissingStrategy::from_str("fill_median").unwrap(),
            MissingStrategy::FillMedian
        );
        let err = MissingStrategy::from_str("interpolate").unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidStrategy(_)));
    }

    #[test]
    fn test_clean_name_examples() {
        assert_eq!(clean_name("Customer ID!"), "customer_id");
        assert_eq!(clean_name("  Total   Value (USD) "), "total_value_usd");
        assert_eq!(clean_name("already_clean"), "already_clean");
    }

    #[test]
    fn test_clean_column_names_logs_rename() {
        let df = df!["Customer ID!" => [1i64, 2]].unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer.clean_column_names(&df).unwrap();
        assert_eq!(out.get_column_names()[0].as_str(), "customer_id");

        let record = &transformer.log()[0];
        assert_eq!(record.operation, "clean_column_names");
        assert_eq!(record.details["new"][0], "customer_id");
    }

    #[test]
    fn test_handle_missing_drop_removes_rows() {
        let df = df![
            "x" => [Some(1.0f64), None, Some(3.0)],
            "label" => [Some("a"), Some("b"), None],
        ]
        .unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer
            .handle_missing_values(&df, MissingStrategy::Drop)
            .unwrap();
        assert_eq!(out.height(), 1);
        assert_eq!(total_missing(&out), 0);
        // Original untouched.
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_handle_missing_fill_median_scenario() {
        // x = [1, missing, 3] -> median of {1, 3} is 2.
        let df = df!["x" => [Some(1.0f64), None, Some(3.0)]].unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer
            .handle_missing_values(&df, MissingStrategy::FillMedian)
            .unwrap();
        let x = out.column("x").unwrap();
        assert_eq!(x.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
        assert_eq!(x.get(1).unwrap().try_extract::<f64>().unwrap(), 2.0);
        assert_eq!(x.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_handle_missing_fill_mean() {
        let df = df!["x" => [Some(10.0f64), None, Some(20.0)]].unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer
            .handle_missing_values(&df, MissingStrategy::FillMean)
            .unwrap();
        let x = out.column("x").unwrap();
        assert_eq!(x.get(1).unwrap().try_extract::<f64>().unwrap(), 15.0);
    }

    #[test]
    fn test_handle_missing_fill_mode_and_fallback() {
        let df = df![
            "city" => [Some("Lisbon"), None, Some("Lisbon"), Some("Porto")],
            "empty" => [Option::<&str>::None, None, None, None],
            "x" => [Some(1.0f64), None, Some(2.0), Some(3.0)],
        ]
        .unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer
            .handle_missing_values(&df, MissingStrategy::FillMode)
            .unwrap();

        let city = out.column("city").unwrap();
        assert_eq!(
            crate::utils::any_value_to_string(&city.get(1).unwrap()),
            "Lisbon"
        );
        let empty = out.column("empty").unwrap();
        assert_eq!(
            crate::utils::any_value_to_string(&empty.get(0).unwrap()),
            "Unknown"
        );
        // Numeric columns are not touched by mode fill.
        assert_eq!(out.column("x").unwrap().null_count(), 1);
    }

    #[test]
    fn test_handle_missing_auto_mixed_columns() {
        let df = df![
            "x" => [Some(1.0f64), None, Some(3.0)],
            "label" => [Some("a"), Some("a"), None],
        ]
        .unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer
            .handle_missing_values(&df, MissingStrategy::Auto)
            .unwrap();
        assert_eq!(total_missing(&out), 0);
        let x = out.column("x").unwrap();
        assert_eq!(x.get(1).unwrap().try_extract::<f64>().unwrap(), 2.0);
        let label = out.column("label").unwrap();
        assert_eq!(
            crate::utils::any_value_to_string(&label.get(2).unwrap()),
            "a"
        );
    }

    #[test]
    fn test_handle_missing_noop_still_logged() {
        let df = df!["x" => [1.0f64, 2.0]].unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer
            .handle_missing_values(&df, MissingStrategy::Auto)
            .unwrap();
        assert_eq!(out.height(), 2);

        let record = &transformer.log()[0];
        assert_eq!(record.operation, "handle_missing_values");
        assert_eq!(record.details["missing_before"], 0);
        assert_eq!(record.details["missing_after"], 0);
    }

    #[test]
    fn test_remove_duplicates_scenario() {
        // 4 rows with 2 identical ones -> 3 remain, log records removed = 1.
        let df = df![
            "a" => [1i64, 2, 1, 3],
            "b" => ["x", "y", "x", "z"],
        ]
        .unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer.remove_duplicates(&df, None).unwrap();
        assert_eq!(out.height(), 3);

        let record = &transformer.log()[0];
        assert_eq!(record.details["before"], 4);
        assert_eq!(record.details["after"], 3);
        assert_eq!(record.details["removed"], 1);
    }

    #[test]
    fn test_remove_duplicates_is_idempotent() {
        let df = df![
            "a" => [1i64, 1, 2, 2, 3],
        ]
        .unwrap();
        let mut transformer = DataTransformer::new();
        let once = transformer.remove_duplicates(&df, None).unwrap();
        let twice = transformer.remove_duplicates(&once, None).unwrap();
        assert_eq!(once, twice);
        assert_eq!(transformer.log()[1].details["removed"], 0);
    }

    #[test]
    fn test_remove_duplicates_subset_keeps_first() {
        let df = df![
            "id" => [1i64, 1, 2],
            "note" => ["first", "second", "third"],
        ]
        .unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer
            .remove_duplicates(&df, Some(&["id".to_string()]))
            .unwrap();
        assert_eq!(out.height(), 2);
        let note = out.column("note").unwrap();
        assert_eq!(
            crate::utils::any_value_to_string(&note.get(0).unwrap()),
            "first"
        );
    }

    #[test]
    fn test_remove_duplicates_unknown_subset_column() {
        let df = df!["a" => [1i64]].unwrap();
        let mut transformer = DataTransformer::new();
        let err = transformer
            .remove_duplicates(&df, Some(&["ghost".to_string()]))
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::ColumnNotFound(_)));
        // Failed calls leave no log entry.
        assert!(transformer.log().is_empty());
    }

    #[test]
    fn test_convert_dtypes_temporal_then_numeric() {
        let df = df![
            "joined" => ["2024-01-01", "2024-02-15"],
            "amount" => ["10", "20"],
            "note" => ["hello", "world"],
        ]
        .unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer.convert_dtypes(&df).unwrap();

        assert!(matches!(
            out.column("joined").unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
        assert_eq!(out.column("amount").unwrap().dtype(), &DataType::Int64);
        assert_eq!(out.column("note").unwrap().dtype(), &DataType::String);

        let record = &transformer.log()[0];
        assert_eq!(record.details["converted"]["joined"], "temporal");
        assert_eq!(record.details["converted"]["amount"], "numeric");
        assert!(record.details["converted"].get("note").is_none());
    }

    #[test]
    fn test_convert_dtypes_partial_parse_leaves_column() {
        let df = df!["mixed" => ["1", "2", "three"]].unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer.convert_dtypes(&df).unwrap();
        assert_eq!(out.column("mixed").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn test_create_date_features() {
        let df = df!["signup" => ["2024-03-15", "2024-12-31"]].unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer.create_date_features(&df, "signup").unwrap();

        for suffix in ["year", "month", "day", "dayofweek", "quarter"] {
            assert!(out.column(&format!("signup_{}", suffix)).is_ok());
        }
        let year = out.column("signup_year").unwrap();
        assert_eq!(year.get(0).unwrap().try_extract::<i32>().unwrap(), 2024);
        let quarter = out.column("signup_quarter").unwrap();
        assert_eq!(quarter.get(0).unwrap().try_extract::<i32>().unwrap(), 1);
        assert_eq!(quarter.get(1).unwrap().try_extract::<i32>().unwrap(), 4);
        // 2024-03-15 is a Friday -> 4 with Monday = 0.
        let dow = out.column("signup_dayofweek").unwrap();
        assert_eq!(dow.get(0).unwrap().try_extract::<i32>().unwrap(), 4);
    }

    #[test]
    fn test_create_date_features_absent_column_is_noop() {
        let df = df!["a" => [1i64]].unwrap();
        let mut transformer = DataTransformer::new();
        let out = transformer.create_date_features(&df, "signup").unwrap();
        assert_eq!(out.width(), 1);
        assert_eq!(transformer.log()[0].details["created"], json!([]));
    }

    #[test]
    fn test_log_is_append_only_and_ordered() {
        let df = df!["A Col" => [Some(1.0f64), None]].unwrap();
        let mut transformer = DataTransformer::new();
        let df = transformer.clean_column_names(&df).unwrap();
        let df = transformer
            .handle_missing_values(&df, MissingStrategy::FillMedian)
            .unwrap();
        let _ = transformer.remove_duplicates(&df, None).unwrap();

        let operations: Vec<&str> = transformer
            .log()
            .iter()
            .map(|r| r.operation.as_str())
            .collect();
        assert_eq!(
            operations,
            vec![
                "clean_column_names",
                "handle_missing_values",
                "remove_duplicates"
            ]
        );
    }
}
