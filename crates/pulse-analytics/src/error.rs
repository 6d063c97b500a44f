//! Custom error types for the analytics pipeline.
//!
//! This module provides the error hierarchy using `thiserror`. Structural
//! problems (missing columns, bad strategies, failed reads) surface as typed
//! variants; statistical degeneracy is never an error and is handled by the
//! profiler itself.

use thiserror::Error;

/// The main error type for the analytics pipeline.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// Unknown missing-value strategy name.
    #[error("Unknown missing-value strategy '{0}' (expected drop, fill_mean, fill_median, fill_mode or auto)")]
    InvalidStrategy(String),

    /// File extension not handled by the extractor.
    #[error("Unsupported file format: '{0}'")]
    UnsupportedFormat(String),

    /// A file could not be read or parsed.
    #[error("Failed to read '{path}': {reason}")]
    ReadFailed { path: String, reason: String },

    /// Type coercion failed.
    #[error("Failed to convert column '{column}' to {target}: {reason}")]
    TypeConversionFailed {
        column: String,
        target: String,
        reason: String,
    },

    /// No stored report under the requested dataset name.
    #[error("No analysis found for dataset '{0}'")]
    ReportNotFound(String),

    /// Table already exists and the write mode forbids overwriting.
    #[error("Table '{0}' already exists")]
    TableExists(String),

    /// Table store operation failed.
    #[error("Store operation failed: {0}")]
    StoreFailed(String),

    /// A cron expression could not be parsed.
    #[error("Invalid schedule '{expression}': {reason}")]
    InvalidSchedule { expression: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite error wrapper.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AnalyticsError>,
    },
}

impl AnalyticsError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalyticsError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Check if this error stems from caller input rather than the
    /// environment (bad strategy, unknown column, unsupported format).
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::ColumnNotFound(_)
                | Self::InvalidStrategy(_)
                | Self::UnsupportedFormat(_)
                | Self::ReportNotFound(_)
        )
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AnalyticsError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_classification() {
        assert!(AnalyticsError::InvalidStrategy("median-ish".into()).is_invalid_input());
        assert!(AnalyticsError::ColumnNotFound("age".into()).is_invalid_input());
        assert!(!AnalyticsError::StoreFailed("disk full".into()).is_invalid_input());
    }

    #[test]
    fn test_with_context_preserves_source() {
        let err = AnalyticsError::ColumnNotFound("signup".into()).with_context("while profiling");
        let rendered = err.to_string();
        assert!(rendered.contains("while profiling"));
        assert!(matches!(
            err,
            AnalyticsError::WithContext { ref source, .. }
                if matches!(**source, AnalyticsError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_strategy_message_lists_alternatives() {
        let err = AnalyticsError::InvalidStrategy("interpolate".into());
        assert!(err.to_string().contains("fill_median"));
    }
}
