//! Statistical helpers for column profiling.
//!
//! Degenerate inputs (empty columns, single values, zero variance) always
//! produce a defined neutral value instead of NaN or an error.

use polars::prelude::*;

use crate::error::Result;
use crate::types::NumericSummary;
use crate::utils::numeric_values;

/// Sample standard deviation (ddof = 1). Zero for fewer than two values.
pub(crate) fn sample_std(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Bias-corrected sample skewness. Zero for fewer than three values or a
/// constant column.
pub(crate) fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 3.0 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    let g1 = m3 / m2.powf(1.5);
    g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Bias-corrected excess kurtosis (normal = 0). Zero for fewer than four
/// values or a constant column.
pub(crate) fn excess_kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 4.0 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n;
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m4 = values.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;
    let g2 = m4 / (m2 * m2) - 3.0;
    ((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0))
}

/// Percentile with linear interpolation over an ascending-sorted slice.
/// Zero for an empty slice.
pub(crate) fn percentile(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = position - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

/// Pearson correlation over pairwise-complete rows of two numeric columns.
/// `None` when fewer than two complete pairs exist or a side has zero
/// variance.
pub(crate) fn pearson(left: &Series, right: &Series) -> Result<Option<f64>> {
    let xs = left.cast(&DataType::Float64)?;
    let ys = right.cast(&DataType::Float64)?;
    let xs = xs.f64()?;
    let ys = ys.f64()?;

    let pairs: Vec<(f64, f64)> = xs
        .into_iter()
        .zip(ys)
        .filter_map(|(x, y)| Some((x?, y?)))
        .collect();

    let n = pairs.len() as f64;
    if n < 2.0 {
        return Ok(None);
    }

    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return Ok(None);
    }
    Ok(Some(cov / (var_x.sqrt() * var_y.sqrt())))
}

/// Full summary for one numeric column.
pub(crate) fn summarize_numeric(name: &str, series: &Series) -> Result<NumericSummary> {
    let values = numeric_values(series)?;
    if values.is_empty() {
        return Ok(NumericSummary {
            name: name.to_string(),
            count: 0,
            min: 0.0,
            q25: 0.0,
            median: 0.0,
            q75: 0.0,
            max: 0.0,
            mean: 0.0,
            std: 0.0,
            skewness: 0.0,
            kurtosis: 0.0,
        });
    }

    let mut sorted = values.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mean = values.iter().sum::<f64>() / values.len() as f64;

    Ok(NumericSummary {
        name: name.to_string(),
        count: values.len(),
        min: sorted[0],
        q25: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.5),
        q75: percentile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
        mean,
        std: sample_std(&values, mean),
        skewness: skewness(&values),
        kurtosis: excess_kurtosis(&values),
    })
}
