//! Fixed-heuristic insight generation.
//!
//! The findings and their order are part of the report contract:
//! size, missingness, column-type split, duplicate rows, strong correlations.

use polars::prelude::*;

use crate::error::Result;
use crate::profiler::statistics::pearson;
use crate::types::ColumnKind;
use crate::utils::kind_of_series;

/// Absolute Pearson correlation above which a pair is reported.
const STRONG_CORRELATION: f64 = 0.7;
/// At most this many correlated pairs are listed.
const MAX_CORRELATED_PAIRS: usize = 3;

pub(crate) fn generate_insights(df: &DataFrame) -> Result<Vec<String>> {
    let mut insights = Vec::new();
    let rows = df.height();
    let columns = df.width();

    // 1. Size classification.
    insights.push(if rows > 10_000 {
        format!("Large dataset: {} rows", group_thousands(rows))
    } else if rows > 1_000 {
        format!("Medium dataset: {} rows", group_thousands(rows))
    } else {
        format!("Small dataset: {} rows", rows)
    });

    // 2. Missingness.
    let total_missing: usize = df
        .get_columns()
        .iter()
        .map(|c| c.as_materialized_series().null_count())
        .sum();
    if total_missing > 0 {
        let pct = (total_missing as f64 / (rows * columns) as f64) * 100.0;
        insights.push(format!("{:.1}% of cell values are missing", pct));
    } else {
        insights.push("No missing values".to_string());
    }

    // 3. Numeric vs categorical split.
    let numeric_cols: Vec<&Series> = df
        .get_columns()
        .iter()
        .map(|c| c.as_materialized_series())
        .filter(|s| kind_of_series(s) == ColumnKind::Numeric)
        .collect();
    let categorical = df
        .get_columns()
        .iter()
        .filter(|c| kind_of_series(c.as_materialized_series()) == ColumnKind::Text)
        .count();
    insights.push(format!(
        "{} numeric columns, {} categorical",
        numeric_cols.len(),
        categorical
    ));

    // 4. Fully-duplicate rows.
    if rows > 0 && columns > 0 {
        let unique_rows = df
            .unique_stable::<&str, &str>(None, UniqueKeepStrategy::First, None)?
            .height();
        let duplicates = rows - unique_rows;
        if duplicates > 0 {
            let pct = (duplicates as f64 / rows as f64) * 100.0;
            insights.push(format!("{} duplicate rows ({:.1}%)", duplicates, pct));
        }
    }

    // 5. Strongly correlated numeric pairs, in column order.
    if numeric_cols.len() > 1 {
        let mut pairs = Vec::new();
        'outer: for i in 0..numeric_cols.len() {
            for j in (i + 1)..numeric_cols.len() {
                if let Some(r) = pearson(numeric_cols[i], numeric_cols[j])? {
                    if r.abs() > STRONG_CORRELATION {
                        pairs.push(format!(
                            "{} x {}",
                            numeric_cols[i].name(),
                            numeric_cols[j].name()
                        ));
                        if pairs.len() == MAX_CORRELATED_PAIRS {
                            break 'outer;
                        }
                    }
                }
            }
        }
        if !pairs.is_empty() {
            insights.push(format!("Strong correlations: {}", pairs.join(", ")));
        }
    }

    Ok(insights)
}

/// Render a count with thousands separators ("12345" -> "12,345").
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(7), "7");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(12_345_678), "12,345,678");
    }

    #[test]
    fn test_insights_small_clean_dataset() {
        let df = df![
            "a" => [1.0f64, 2.0, 3.0],
            "label" => ["x", "y", "z"],
        ]
        .unwrap();
        let insights = generate_insights(&df).unwrap();
        assert!(insights[0].starts_with("Small dataset"));
        assert_eq!(insights[1], "No missing values");
        assert_eq!(insights[2], "1 numeric columns, 1 categorical");
        // No duplicates, no correlation entries.
        assert_eq!(insights.len(), 3);
    }

    #[test]
    fn test_insights_reports_missing_pct() {
        let df = df![
            "a" => [Some(1.0f64), None, Some(3.0), Some(4.0)],
        ]
        .unwrap();
        let insights = generate_insights(&df).unwrap();
        assert_eq!(insights[1], "25.0% of cell values are missing");
    }

    #[test]
    fn test_insights_counts_duplicates() {
        let df = df![
            "a" => [1i64, 1, 2, 3],
            "b" => ["x", "x", "y", "z"],
        ]
        .unwrap();
        let insights = generate_insights(&df).unwrap();
        assert!(insights.iter().any(|i| i == "1 duplicate rows (25.0%)"));
    }

    #[test]
    fn test_insights_flags_perfect_correlation() {
        let df = df![
            "a" => [1.0f64, 2.0, 3.0, 4.0],
            "b" => [2.0f64, 4.0, 6.0, 8.0],
        ]
        .unwrap();
        let insights = generate_insights(&df).unwrap();
        assert!(
            insights
                .iter()
                .any(|i| i.starts_with("Strong correlations:") && i.contains("a x b"))
        );
    }

    #[test]
    fn test_insights_empty_dataset_does_not_panic() {
        let df = DataFrame::empty();
        let insights = generate_insights(&df).unwrap();
        assert!(insights[0].starts_with("Small dataset"));
        assert_eq!(insights[1], "No missing values");
    }
}
