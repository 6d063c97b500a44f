//! Shared helpers for dtype classification, value formatting and null
//! filling, used by both the profiler and the transformer.

use polars::prelude::*;

use crate::types::ColumnKind;

// =============================================================================
// Dtype classification
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is a temporal type.
#[inline]
pub fn is_temporal_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Datetime(_, _) | DataType::Date | DataType::Time
    )
}

/// Map a physical dtype to its semantic [`ColumnKind`].
pub fn kind_of_dtype(dtype: &DataType) -> ColumnKind {
    if is_numeric_dtype(dtype) {
        ColumnKind::Numeric
    } else if is_temporal_dtype(dtype) {
        ColumnKind::Temporal
    } else if matches!(dtype, DataType::Boolean) {
        ColumnKind::Boolean
    } else if matches!(dtype, DataType::String | DataType::Categorical(_, _)) {
        ColumnKind::Text
    } else {
        ColumnKind::Unknown
    }
}

/// Semantic kind of a Series.
pub fn kind_of_series(series: &Series) -> ColumnKind {
    kind_of_dtype(series.dtype())
}

// =============================================================================
// Value formatting
// =============================================================================

/// Render an AnyValue for report output. String values come back without the
/// surrounding quotes that their Display impl adds.
pub fn any_value_to_string(value: &AnyValue) -> String {
    match value {
        AnyValue::String(s) => (*s).to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => format!("{}", other),
    }
}

// =============================================================================
// Null filling
// =============================================================================

/// Fill null values in a numeric Series with a specific value. The result is
/// always Float64, mirroring the integer-to-float promotion of a mean fill.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let float_series = series.cast(&DataType::Float64)?;
    let ca = float_series.f64()?;
    let filled: Vec<f64> = ca
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a string Series with a specific value.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let ca = series.str()?;
    let filled: Vec<String> = ca
        .into_iter()
        .map(|v| v.unwrap_or(fill_value).to_string())
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Fill null values in a boolean Series with a specific value.
pub fn fill_bool_nulls(series: &Series, fill_value: bool) -> PolarsResult<Series> {
    let ca = series.bool()?;
    let filled: Vec<bool> = ca
        .into_iter()
        .map(|v| v.unwrap_or(fill_value))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

// =============================================================================
// Modes
// =============================================================================

/// Most frequent value of a string Series. Count ties break in favour of the
/// value that appeared first, which keeps repeated runs deterministic.
pub fn string_mode(series: &Series) -> Option<String> {
    let ca = series.str().ok()?;
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in ca.into_iter().flatten() {
        match counts.iter_mut().find(|(v, _)| v == value) {
            Some((_, n)) => *n += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }
    let mut best: Option<(String, usize)> = None;
    for (value, count) in counts {
        match &best {
            Some((_, top)) if *top >= count => {}
            _ => best = Some((value, count)),
        }
    }
    best.map(|(value, _)| value)
}

/// Most frequent value of a boolean Series, first-appearance tie-break.
pub fn bool_mode(series: &Series) -> Option<bool> {
    let ca = series.bool().ok()?;
    let mut first: Option<bool> = None;
    let (mut trues, mut falses) = (0usize, 0usize);
    for value in ca.into_iter().flatten() {
        if first.is_none() {
            first = Some(value);
        }
        if value {
            trues += 1;
        } else {
            falses += 1;
        }
    }
    match trues.cmp(&falses) {
        std::cmp::Ordering::Greater => Some(true),
        std::cmp::Ordering::Less => Some(false),
        std::cmp::Ordering::Equal => first,
    }
}

// =============================================================================
// Numeric extraction
// =============================================================================

/// Non-null values of a numeric Series as f64, in row order.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<f64>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_of_dtype() {
        assert_eq!(kind_of_dtype(&DataType::Int64), ColumnKind::Numeric);
        assert_eq!(kind_of_dtype(&DataType::Float32), ColumnKind::Numeric);
        assert_eq!(kind_of_dtype(&DataType::Date), ColumnKind::Temporal);
        assert_eq!(kind_of_dtype(&DataType::Boolean), ColumnKind::Boolean);
        assert_eq!(kind_of_dtype(&DataType::String), ColumnKind::Text);
        assert_eq!(kind_of_dtype(&DataType::Null), ColumnKind::Unknown);
    }

    #[test]
    fn test_any_value_to_string_unquotes() {
        let series = Series::new("s".into(), &["hello"]);
        let value = series.get(0).unwrap();
        assert_eq!(any_value_to_string(&value), "hello");
    }

    #[test]
    fn test_fill_numeric_nulls_promotes_to_float() {
        let series = Series::new("n".into(), &[Some(1i64), None, Some(3)]);
        let filled = fill_numeric_nulls(&series, 2.0).unwrap();
        assert_eq!(filled.dtype(), &DataType::Float64);
        assert_eq!(filled.null_count(), 0);
        assert_eq!(filled.get(1).unwrap().try_extract::<f64>().unwrap(), 2.0);
    }

    #[test]
    fn test_fill_string_nulls() {
        let series = Series::new("s".into(), &[Some("a"), None]);
        let filled = fill_string_nulls(&series, "Unknown").unwrap();
        assert_eq!(filled.null_count(), 0);
        assert_eq!(any_value_to_string(&filled.get(1).unwrap()), "Unknown");
    }

    #[test]
    fn test_string_mode_prefers_most_frequent() {
        let series = Series::new("s".into(), &["b", "a", "a", "c", "a"]);
        assert_eq!(string_mode(&series), Some("a".to_string()));
    }

    #[test]
    fn test_string_mode_tie_keeps_first_appearance() {
        let series = Series::new("s".into(), &["b", "a", "b", "a"]);
        assert_eq!(string_mode(&series), Some("b".to_string()));
    }

    #[test]
    fn test_string_mode_empty_is_none() {
        let series = Series::new("s".into(), Vec::<Option<&str>>::new());
        assert_eq!(string_mode(&series), None);
    }

    #[test]
    fn test_bool_mode() {
        let series = Series::new("b".into(), &[Some(true), Some(false), Some(true), None]);
        assert_eq!(bool_mode(&series), Some(true));
    }

    #[test]
    fn test_numeric_values_skips_nulls() {
        let series = Series::new("n".into(), &[Some(1.0f64), None, Some(3.0)]);
        assert_eq!(numeric_values(&series).unwrap(), vec![1.0, 3.0]);
    }
}
