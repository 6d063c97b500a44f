//! Data model for profile reports and the transformation audit log.

use serde::{Deserialize, Serialize};

/// Semantic kind of a column, derived from its physical dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point numbers.
    Numeric,
    /// Strings and categoricals.
    Text,
    /// Dates, datetimes and times.
    Temporal,
    /// Booleans.
    Boolean,
    /// Anything else, including all-null columns.
    Unknown,
}

impl ColumnKind {
    /// All kinds, in the order report summaries list them.
    pub const ALL: [ColumnKind; 5] = [
        ColumnKind::Numeric,
        ColumnKind::Text,
        ColumnKind::Temporal,
        ColumnKind::Boolean,
        ColumnKind::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Temporal => "temporal",
            Self::Boolean => "boolean",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape, footprint and column list of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicInfo {
    pub rows: usize,
    pub columns: usize,
    /// Best-effort in-memory footprint in megabytes.
    pub memory_usage_mb: f64,
    pub column_names: Vec<String>,
}

/// Count of columns sharing one semantic kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCount {
    pub kind: ColumnKind,
    pub count: usize,
}

/// Per-column kind assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnType {
    pub name: String,
    pub kind: ColumnKind,
}

/// Column-kind summary plus the per-column assignment, in column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTypes {
    /// Kinds present in the dataset with their column counts.
    pub summary: Vec<KindCount>,
    pub details: Vec<ColumnType>,
}

/// Missing-value breakdown for one column (only columns with missing > 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingColumn {
    pub name: String,
    pub count: usize,
    /// Missing cells as a percentage of the row count.
    pub percentage: f64,
}

/// Dataset-wide missingness section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingValues {
    pub total_missing: usize,
    /// Missing cells over all cells, in percent; 0 for an empty dataset.
    pub total_missing_pct: f64,
    pub columns_with_missing: usize,
    /// Descending by count, ties broken by original column order.
    pub details: Vec<MissingColumn>,
}

/// Summary statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub name: String,
    /// Non-null observation count.
    pub count: usize,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub skewness: f64,
    /// Excess kurtosis (normal distribution = 0).
    pub kurtosis: f64,
}

/// Descriptive statistics over the numeric columns, or an explicit marker
/// that the dataset has none (distinct from "computed but empty").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "columns", rename_all = "snake_case")]
pub enum DescriptiveStats {
    NoNumericColumns,
    Computed(Vec<NumericSummary>),
}

/// Distinct-value summary for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnUniqueness {
    pub name: String,
    /// Distinct non-missing values.
    pub distinct: usize,
    /// Distinct count over row count; 0 for an empty dataset.
    pub unique_ratio: f64,
    /// Up to 5 values in first-appearance order; empty when distinct > 10.
    pub sample: Vec<String>,
}

/// Immutable result of one [`analyze`](crate::ExploratoryProfiler::analyze)
/// call. One report corresponds to exactly one dataset snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub dataset: String,
    /// Wall-clock generation time, `%Y-%m-%d %H:%M:%S`.
    pub generated_at: String,
    pub basic_info: BasicInfo,
    pub data_types: DataTypes,
    pub missing_values: MissingValues,
    pub descriptive_stats: DescriptiveStats,
    /// Per column, in column order.
    pub unique_values: Vec<ColumnUniqueness>,
    /// Heuristic findings in their fixed generation order.
    pub insights: Vec<String>,
}

/// One entry of a transformer's append-only audit log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationRecord {
    pub operation: String,
    pub details: serde_json::Value,
}

impl TransformationRecord {
    pub fn new(operation: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            operation: operation.into(),
            details,
        }
    }
}
