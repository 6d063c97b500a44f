//! Report artifact writer.
//!
//! Serializes profile reports to disk, either as pretty JSON or as a
//! human-readable text rendering. Destination names are timestamp-qualified
//! so a re-analysis never overwrites an earlier artifact.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use tracing::info;

use crate::error::Result;
use crate::types::ProfileReport;

/// Section names in their fixed rendering order.
const SECTIONS: [&str; 6] = [
    "basic_info",
    "data_types",
    "missing_values",
    "descriptive_stats",
    "unique_values",
    "insights",
];

/// Output format of a report artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Machine-readable pretty JSON.
    Json,
    /// Section-per-heading plain text.
    Text,
}

impl ReportFormat {
    fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "txt",
        }
    }
}

/// Writes report artifacts below one reports directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    reports_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(reports_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
        }
    }

    /// Write the report and return the artifact path.
    pub fn write(&self, report: &ProfileReport, format: ReportFormat) -> Result<PathBuf> {
        fs::create_dir_all(&self.reports_dir)?;

        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let base = format!("analysis_{}_{}", report.dataset, stamp);
        let path = self.available_path(&base, format.extension());

        let content = match format {
            ReportFormat::Json => serde_json::to_string_pretty(report)?,
            ReportFormat::Text => render_text(report)?,
        };
        let mut file = File::create(&path)?;
        file.write_all(content.as_bytes())?;

        info!(path = %path.display(), "report saved");
        Ok(path)
    }

    /// First non-existing path for the base name. Re-analyses within the
    /// same second get a numeric suffix instead of overwriting.
    fn available_path(&self, base: &str, extension: &str) -> PathBuf {
        let candidate = self.reports_dir.join(format!("{}.{}", base, extension));
        if !candidate.exists() {
            return candidate;
        }
        let mut counter = 1;
        loop {
            let candidate = self
                .reports_dir
                .join(format!("{}_{}.{}", base, counter, extension));
            if !candidate.exists() {
                return candidate;
            }
            counter += 1;
        }
    }
}

fn render_text(report: &ProfileReport) -> Result<String> {
    let value = serde_json::to_value(report)?;
    let mut out = String::new();
    out.push_str(&format!("ANALYSIS REPORT - {}\n", report.dataset));
    out.push_str(&format!("Generated at: {}\n", report.generated_at));
    out.push_str(&"=".repeat(50));
    out.push_str("\n\n");

    for section in SECTIONS {
        out.push_str(&format!("{}:\n", section.to_uppercase()));
        let body = value
            .get(section)
            .map(|v| serde_json::to_string_pretty(v))
            .transpose()?
            .unwrap_or_default();
        out.push_str(&body);
        out.push_str("\n\n");
    }
    Ok(out)
}
