//! Strict type coercion for text columns.
//!
//! Conversion is all-or-nothing over the non-null values: one value that
//! fails to parse leaves the whole column untouched, so a column is never
//! half-converted or corrupted.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::error::{AnalyticsError, Result};
use crate::types::ColumnKind;
use crate::utils::kind_of_series;

/// Accepted datetime layouts, tried in order. Date-only layouts parse to
/// midnight so every temporal column shares one millisecond representation.
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d/%m/%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Parse one string as a datetime.
pub(crate) fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Try to reinterpret a text column as Datetime (millisecond unit).
/// `Ok(None)` when the column is not text, has no values, or any value
/// fails to parse.
pub(crate) fn try_parse_temporal(series: &Series) -> Result<Option<Series>> {
    if series.dtype() != &DataType::String {
        return Ok(None);
    }
    let ca = series.str()?;
    if ca.len() == series.null_count() {
        return Ok(None);
    }

    let mut millis: Vec<Option<i64>> = Vec::with_capacity(ca.len());
    for opt_val in ca.into_iter() {
        match opt_val {
            Some(val) => match parse_datetime(val) {
                Some(dt) => millis.push(Some(dt.and_utc().timestamp_millis())),
                None => return Ok(None),
            },
            None => millis.push(None),
        }
    }

    let parsed = Series::new(series.name().clone(), millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
    Ok(Some(parsed))
}

/// Try to reinterpret a text column as numeric: Int64 when every value is
/// integral, Float64 otherwise. `None` when the column is not text, has no
/// values, or any value fails to parse.
pub(crate) fn try_parse_numeric(series: &Series) -> Option<Series> {
    if series.dtype() != &DataType::String {
        return None;
    }
    let ca = series.str().ok()?;
    if ca.len() == series.null_count() {
        return None;
    }

    let mut ints: Option<Vec<Option<i64>>> = Some(Vec::with_capacity(ca.len()));
    let mut floats: Vec<Option<f64>> = Vec::with_capacity(ca.len());
    for opt_val in ca.into_iter() {
        match opt_val {
            Some(val) => {
                let trimmed = val.trim();
                let float_val: f64 = trimmed.parse().ok()?;
                floats.push(Some(float_val));
                if let Some(buffer) = ints.as_mut() {
                    match trimmed.parse::<i64>() {
                        Ok(int_val) => buffer.push(Some(int_val)),
                        Err(_) => ints = None,
                    }
                }
            }
            None => {
                floats.push(None);
                if let Some(buffer) = ints.as_mut() {
                    buffer.push(None);
                }
            }
        }
    }

    Some(match ints {
        Some(buffer) => Series::new(series.name().clone(), buffer),
        None => Series::new(series.name().clone(), floats),
    })
}

/// Coerce a column to a temporal type, failing with a typed error instead
/// of a partial conversion.
pub(crate) fn to_temporal(series: &Series) -> Result<Series> {
    if kind_of_series(series) == ColumnKind::Temporal {
        return Ok(series.clone());
    }
    try_parse_temporal(series)?.ok_or_else(|| AnalyticsError::TypeConversionFailed {
        column: series.name().to_string(),
        target: "datetime".to_string(),
        reason: "values do not parse as dates".to_string(),
    })
}

/// Calendar dates of a temporal column, in row order.
pub(crate) fn calendar_dates(series: &Series) -> Result<Vec<Option<NaiveDate>>> {
    let millis = series
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
        .cast(&DataType::Int64)?;
    let dates = millis
        .i64()?
        .into_iter()
        .map(|opt| {
            opt.and_then(chrono::DateTime::from_timestamp_millis)
                .map(|dt| dt.date_naive())
        })
        .collect();
    Ok(dates)
}
