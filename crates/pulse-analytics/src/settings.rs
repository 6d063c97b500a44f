//! Directory layout and bootstrap for the analytics workspace.
//!
//! All collaborators (extractor, store, report writer, automation) resolve
//! their paths through one [`Settings`] value so a pipeline run stays inside
//! a single root directory.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Filesystem layout for one analytics workspace.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Workspace root; every other path lives below it.
    pub root: PathBuf,
    /// Incoming raw files (`data/raw`).
    pub raw_data_dir: PathBuf,
    /// Cleaned datasets (`data/processed`).
    pub processed_data_dir: PathBuf,
    /// Database backups (`data/backups`).
    pub backups_dir: PathBuf,
    /// Generated report artifacts (`outputs/reports`).
    pub reports_dir: PathBuf,
    /// SQLite database file (`data/analytics.db`).
    pub db_path: PathBuf,
}

impl Settings {
    /// Build the layout below the given root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let data_dir = root.join("data");
        Self {
            raw_data_dir: data_dir.join("raw"),
            processed_data_dir: data_dir.join("processed"),
            backups_dir: data_dir.join("backups"),
            reports_dir: root.join("outputs").join("reports"),
            db_path: data_dir.join("analytics.db"),
            root,
        }
    }

    /// Create every directory of the layout if it does not exist yet.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.raw_data_dir,
            &self.processed_data_dir,
            &self.backups_dir,
            &self.reports_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_rooted() {
        let settings = Settings::new("/tmp/pulse");
        assert_eq!(settings.raw_data_dir, PathBuf::from("/tmp/pulse/data/raw"));
        assert_eq!(settings.db_path, PathBuf::from("/tmp/pulse/data/analytics.db"));
        assert_eq!(
            settings.reports_dir,
            PathBuf::from("/tmp/pulse/outputs/reports")
        );
    }

    #[test]
    fn test_ensure_directories_creates_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::new(tmp.path());
        settings.ensure_directories().unwrap();
        assert!(settings.raw_data_dir.is_dir());
        assert!(settings.processed_data_dir.is_dir());
        assert!(settings.backups_dir.is_dir());
        assert!(settings.reports_dir.is_dir());
    }
}
