//! Local Tabular Analytics Pipeline
//!
//! A polars-based library for profiling, cleaning and persisting tabular
//! datasets on a single machine.
//!
//! # Overview
//!
//! The pipeline is built from small, composable components:
//!
//! - **Profiling**: [`ExploratoryProfiler`] inspects a dataset and produces
//!   an immutable [`ProfileReport`] covering shape, types, missingness,
//!   descriptive statistics, unique values and heuristic insights.
//! - **Cleaning**: [`DataTransformer`] applies corrective operations
//!   (column-name normalisation, missing-value strategies, deduplication,
//!   type coercion, date-feature derivation) and keeps an append-only audit
//!   log of everything it did.
//! - **Extraction**: [`FileExtractor`] reads CSV, JSON and Parquet files
//!   with typed failures instead of silent empty results.
//! - **Persistence**: [`SqliteStore`] keeps datasets in a local SQLite
//!   database; [`ReportWriter`] writes timestamped report artifacts.
//! - **Automation**: [`AutomationDriver`] runs the recurring digest,
//!   backup and retention jobs on cron schedules.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use pulse_analytics::{
//!     DataTransformer, ExploratoryProfiler, FileExtractor, MissingStrategy,
//!     ReportFormat, ReportWriter, Settings,
//! };
//!
//! let settings = Settings::new("./workspace");
//! settings.ensure_directories()?;
//!
//! let extractor = FileExtractor::new(&settings.raw_data_dir);
//! let df = extractor.read("sales.csv")?;
//!
//! let mut transformer = DataTransformer::new();
//! let df = transformer.clean_column_names(&df)?;
//! let df = transformer.handle_missing_values(&df, MissingStrategy::Auto)?;
//! let df = transformer.remove_duplicates(&df, None)?;
//!
//! let mut profiler = ExploratoryProfiler::new();
//! let report = profiler.analyze(&df, "sales")?;
//!
//! ReportWriter::new(&settings.reports_dir).write(&report, ReportFormat::Json)?;
//! ```
//!
//! Execution is single-threaded and synchronous: every call runs to
//! completion and returns a new value, datasets are never mutated in place,
//! and the only mutable state is each transformer's own audit log.

pub mod automation;
pub mod error;
pub mod extract;
pub mod profiler;
pub mod report;
pub mod sample;
pub mod settings;
pub mod store;
pub mod transformer;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use automation::{AutomationDriver, ScheduledJob};
pub use error::{AnalyticsError, Result, ResultExt};
pub use extract::FileExtractor;
pub use profiler::ExploratoryProfiler;
pub use report::{ReportFormat, ReportWriter};
pub use settings::Settings;
pub use store::{SqliteStore, WriteMode};
pub use transformer::{DataTransformer, MissingStrategy};
pub use types::{
    BasicInfo, ColumnKind, ColumnType, ColumnUniqueness, DataTypes, DescriptiveStats, KindCount,
    MissingColumn, MissingValues, NumericSummary, ProfileReport, TransformationRecord,
};
pub use utils::{kind_of_dtype, kind_of_series};
