//! Integration tests for the analytics pipeline.
//!
//! These tests run the extractor, transformer, profiler, store and report
//! writer end to end against CSV fixtures.

use polars::prelude::*;
use pulse_analytics::{
    DataTransformer, DescriptiveStats, ExploratoryProfiler, FileExtractor, MissingStrategy,
    ReportFormat, ReportWriter, Settings, SqliteStore, WriteMode,
};
use std::path::PathBuf;

// ============================================================================
// Helper Functions
// ============================================================================

fn fixtures_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_fixture(filename: &str) -> DataFrame {
    FileExtractor::new(fixtures_path())
        .read_csv(filename)
        .expect("fixture should load")
}

fn total_missing(df: &DataFrame) -> usize {
    df.get_columns()
        .iter()
        .map(|c| c.as_materialized_series().null_count())
        .sum()
}

// ============================================================================
// Full Pipeline
// ============================================================================

#[test]
fn test_full_cleaning_pipeline_on_fixture() {
    let df = load_fixture("sales_subset.csv");
    assert_eq!(df.height(), 7);

    let mut transformer = DataTransformer::new();
    let df = transformer.clean_column_names(&df).unwrap();
    let df = transformer.convert_dtypes(&df).unwrap();
    let df = transformer
        .handle_missing_values(&df, MissingStrategy::Auto)
        .unwrap();
    let df = transformer.remove_duplicates(&df, None).unwrap();

    // Names normalised.
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|n| n.to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "order_id",
            "product_name",
            "unit_price",
            "quantity",
            "order_date",
            "region"
        ]
    );

    // Dates were recognised, missing values filled, one duplicate removed.
    assert!(matches!(
        df.column("order_date").unwrap().dtype(),
        DataType::Datetime(_, _)
    ));
    assert_eq!(total_missing(&df), 0);
    assert_eq!(df.height(), 6);

    // The audit log mirrors the application order.
    let operations: Vec<&str> = transformer
        .log()
        .iter()
        .map(|r| r.operation.as_str())
        .collect();
    assert_eq!(
        operations,
        vec![
            "clean_column_names",
            "convert_dtypes",
            "handle_missing_values",
            "remove_duplicates"
        ]
    );
    assert_eq!(transformer.log()[3].details["removed"], 1);
}

#[test]
fn test_profile_of_cleaned_fixture() {
    let df = load_fixture("sales_subset.csv");
    let mut transformer = DataTransformer::new();
    let df = transformer.clean_column_names(&df).unwrap();
    let df = transformer
        .handle_missing_values(&df, MissingStrategy::Auto)
        .unwrap();

    let mut profiler = ExploratoryProfiler::new();
    let report = profiler.analyze(&df, "sales").unwrap();

    assert_eq!(report.basic_info.rows, 7);
    assert_eq!(report.missing_values.total_missing, 0);
    assert_eq!(report.missing_values.total_missing_pct, 0.0);
    assert!(report.insights.iter().any(|i| i == "No missing values"));

    let DescriptiveStats::Computed(columns) = &report.descriptive_stats else {
        panic!("numeric columns exist");
    };
    assert!(columns.iter().any(|c| c.name == "unit_price"));
}

// ============================================================================
// Testable Properties from the Behaviour Contract
// ============================================================================

#[test]
fn test_analyze_twice_is_content_identical() {
    let df = load_fixture("sales_subset.csv");
    let mut profiler = ExploratoryProfiler::new();
    let first = profiler.analyze(&df, "sales").unwrap();
    let second = profiler.analyze(&df, "sales").unwrap();

    assert_eq!(first.basic_info, second.basic_info);
    assert_eq!(first.data_types, second.data_types);
    assert_eq!(first.missing_values, second.missing_values);
    assert_eq!(first.descriptive_stats, second.descriptive_stats);
    assert_eq!(first.unique_values, second.unique_values);
}

#[test]
fn test_missing_pct_bounds_on_fixture() {
    let df = load_fixture("sales_subset.csv");
    let missing = ExploratoryProfiler::missing_values(&df);
    assert!(missing.total_missing_pct > 0.0);
    assert!(missing.total_missing_pct <= 100.0);
    assert!(missing.total_missing > 0);
}

#[test]
fn test_unique_sample_bounds_on_fixture() {
    let df = load_fixture("sales_subset.csv");
    let unique = ExploratoryProfiler::unique_values(&df).unwrap();
    for column in &unique {
        assert!(column.sample.len() <= 5, "{} oversampled", column.name);
        if column.distinct > 10 {
            assert!(column.sample.is_empty());
        }
    }
}

#[test]
fn test_drop_strategy_leaves_no_missing() {
    let df = load_fixture("sales_subset.csv");
    let rows_before = df.height();
    let mut transformer = DataTransformer::new();
    let out = transformer
        .handle_missing_values(&df, MissingStrategy::Drop)
        .unwrap();
    assert_eq!(total_missing(&out), 0);
    assert!(out.height() <= rows_before);
}

#[test]
fn test_remove_duplicates_round_trip() {
    let df = load_fixture("sales_subset.csv");
    let mut transformer = DataTransformer::new();
    let once = transformer.remove_duplicates(&df, None).unwrap();
    let twice = transformer.remove_duplicates(&once, None).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_convert_dtypes_fixture_dates_and_passthrough() {
    let df = load_fixture("typed_strings.csv");
    let mut transformer = DataTransformer::new();
    let out = transformer.convert_dtypes(&df).unwrap();

    assert!(matches!(
        out.column("joined").unwrap().dtype(),
        DataType::Datetime(_, _)
    ));
    // Plain words stay text.
    assert_eq!(out.column("note").unwrap().dtype(), &DataType::String);
}

// ============================================================================
// Store Round-trips
// ============================================================================

#[test]
fn test_store_roundtrip_of_cleaned_dataset() {
    let tmp = tempfile::tempdir().unwrap();
    let settings = Settings::new(tmp.path());
    settings.ensure_directories().unwrap();

    let df = load_fixture("sales_subset.csv");
    let mut transformer = DataTransformer::new();
    let df = transformer.clean_column_names(&df).unwrap();
    let df = transformer
        .handle_missing_values(&df, MissingStrategy::Auto)
        .unwrap();

    let store = SqliteStore::from_settings(&settings);
    let written = store.write_table(&df, "sales", WriteMode::Replace).unwrap();
    assert_eq!(written, df.height());
    assert_eq!(store.list_tables().unwrap(), vec!["sales"]);

    let back = store.read_query("SELECT * FROM sales").unwrap();
    assert_eq!(back.shape(), df.shape());

    // A stored table can be profiled like any other dataset.
    let mut profiler = ExploratoryProfiler::new();
    let report = profiler.analyze(&back, "sales").unwrap();
    assert_eq!(report.basic_info.rows, df.height());
}

// ============================================================================
// Report Artifacts
// ============================================================================

#[test]
fn test_report_artifacts_from_fixture() {
    let tmp = tempfile::tempdir().unwrap();
    let df = load_fixture("sales_subset.csv");
    let mut profiler = ExploratoryProfiler::new();
    let report = profiler.analyze(&df, "sales_subset").unwrap();

    let writer = ReportWriter::new(tmp.path());
    let json_path = writer.write(&report, ReportFormat::Json).unwrap();
    let text_path = writer.write(&report, ReportFormat::Text).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["dataset"], "sales_subset");
    assert_eq!(json["basic_info"]["rows"], 7);

    let text = std::fs::read_to_string(&text_path).unwrap();
    assert!(text.contains("ANALYSIS REPORT - sales_subset"));
    assert!(text.contains("INSIGHTS:"));
}

// ============================================================================
// Extraction Failure Modes
// ============================================================================

#[test]
fn test_extractor_failures_are_typed() {
    let extractor = FileExtractor::new(fixtures_path());
    assert!(extractor.read_csv("absent.csv").is_err());
    assert!(extractor.read("sales_subset.parquet").is_err());
}
