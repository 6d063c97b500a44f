//! Scheduled maintenance jobs.
//!
//! Runs the recurring tasks of the pipeline: a daily digest of every stored
//! table, a weekly database backup, and retention cleanup of old artifacts.
//! Scheduling uses cron expressions checked on a one-minute tick.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use cron::Schedule;
use tracing::{error, info};

use crate::error::{AnalyticsError, Result};
use crate::profiler::ExploratoryProfiler;
use crate::settings::Settings;
use crate::store::SqliteStore;

/// Daily table digest at 18:00.
const DAILY_REPORT_SCHEDULE: &str = "0 0 18 * * * *";
/// Weekly backup, Monday 02:00.
const WEEKLY_BACKUP_SCHEDULE: &str = "0 0 2 * * MON *";
/// Retention cleanup, Sunday 03:00.
const CLEANUP_SCHEDULE: &str = "0 0 3 * * SUN *";

/// Backups older than this many days are pruned.
const BACKUP_RETENTION_DAYS: i64 = 30;
/// Text reports older than this many days are pruned.
const REPORT_RETENTION_DAYS: i64 = 7;

/// One cron-scheduled job.
#[derive(Debug)]
pub struct ScheduledJob {
    pub name: &'static str,
    schedule: Schedule,
    next_run: Option<DateTime<Utc>>,
}

impl ScheduledJob {
    pub fn new(name: &'static str, expression: &str) -> Result<Self> {
        let schedule =
            Schedule::from_str(expression).map_err(|e| AnalyticsError::InvalidSchedule {
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;
        let next_run = schedule.after(&Utc::now()).next();
        Ok(Self {
            name,
            schedule,
            next_run,
        })
    }

    /// Whether the next scheduled time has passed.
    pub fn is_due(&self) -> bool {
        matches!(self.next_run, Some(next) if next <= Utc::now())
    }

    /// Advance to the following occurrence.
    pub fn mark_executed(&mut self) {
        self.next_run = self.schedule.after(&Utc::now()).next();
    }
}

/// Drives the recurring jobs against the table store.
pub struct AutomationDriver {
    settings: Settings,
    store: SqliteStore,
    profiler: ExploratoryProfiler,
}

impl AutomationDriver {
    pub fn new(settings: Settings) -> Self {
        let store = SqliteStore::from_settings(&settings);
        Self {
            settings,
            store,
            profiler: ExploratoryProfiler::new(),
        }
    }

    /// Write the daily digest: shape and insights for every stored table,
    /// computed over at most 100 rows each.
    pub fn daily_report(&mut self) -> Result<PathBuf> {
        info!("generating daily report");
        std::fs::create_dir_all(&self.settings.reports_dir)?;

        let mut lines = vec![
            "=".repeat(60),
            format!("DAILY REPORT - {}", Local::now().format("%d/%m/%Y %H:%M")),
            "=".repeat(60),
            String::new(),
        ];

        for table in self.store.list_tables()? {
            let query = format!(
                "SELECT * FROM \"{}\" LIMIT 100",
                table.replace('"', "\"\"")
            );
            let df = self.store.read_query(&query)?;
            let report = self.profiler.analyze(&df, &table)?;

            lines.push(format!("Table: {}", table));
            lines.push(format!("  Rows: {}", report.basic_info.rows));
            lines.push(format!(
                "  Columns: {}",
                report.basic_info.column_names.join(", ")
            ));
            for insight in &report.insights {
                lines.push(format!("  - {}", insight));
            }
            lines.push(String::new());
        }

        let path = self
            .settings
            .reports_dir
            .join(format!("daily_report_{}.txt", Local::now().format("%Y%m%d")));
        std::fs::write(&path, lines.join("\n"))?;
        info!(path = %path.display(), "daily report saved");
        Ok(path)
    }

    /// Copy the database to a timestamped backup file.
    pub fn weekly_backup(&self) -> Result<PathBuf> {
        info!("starting weekly backup");
        self.store.backup()
    }

    /// Prune old backups and daily reports. Files whose names do not carry
    /// a parseable trailing date are skipped. Returns the removed count.
    pub fn clean_old_files(&self) -> Result<usize> {
        info!("cleaning old files");
        let today = Local::now().date_naive();
        let mut removed = 0;

        removed += prune_by_stem_date(
            &self.settings.backups_dir,
            "db",
            // analytics_backup_YYYYmmdd_HHMMSS.db: date is second to last.
            |stem| stem.split('_').rev().nth(1).map(|s| s.to_string()),
            today - Duration::days(BACKUP_RETENTION_DAYS),
        )?;
        removed += prune_by_stem_date(
            &self.settings.reports_dir,
            "txt",
            // daily_report_YYYYmmdd.txt: date is the last component.
            |stem| stem.split('_').next_back().map(|s| s.to_string()),
            today - Duration::days(REPORT_RETENTION_DAYS),
        )?;

        info!(removed, "cleanup complete");
        Ok(removed)
    }

    /// The standard job set with its cron expressions.
    pub fn standard_jobs() -> Result<Vec<ScheduledJob>> {
        Ok(vec![
            ScheduledJob::new("daily_report", DAILY_REPORT_SCHEDULE)?,
            ScheduledJob::new("weekly_backup", WEEKLY_BACKUP_SCHEDULE)?,
            ScheduledJob::new("clean_old_files", CLEANUP_SCHEDULE)?,
        ])
    }

    /// Run every due job once. Job failures are logged, not fatal.
    pub fn tick(&mut self, jobs: &mut [ScheduledJob]) {
        for job in jobs.iter_mut() {
            if !job.is_due() {
                continue;
            }
            let outcome = match job.name {
                "daily_report" => self.daily_report().map(|_| ()),
                "weekly_backup" => self.weekly_backup().map(|_| ()),
                "clean_old_files" => self.clean_old_files().map(|_| ()),
                other => {
                    error!(job = other, "unknown job");
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                error!(job = job.name, error = %e, "scheduled job failed");
            }
            job.mark_executed();
        }
    }

    /// Blocking scheduler loop: one immediate daily report, then a check
    /// every 60 seconds.
    pub fn run(&mut self) -> Result<()> {
        self.settings.ensure_directories()?;
        let mut jobs = Self::standard_jobs()?;

        info!("automation started");
        info!("  daily report: 18:00");
        info!("  weekly backup: Monday 02:00");
        info!("  cleanup: Sunday 03:00");

        self.daily_report()?;

        loop {
            self.tick(&mut jobs);
            std::thread::sleep(std::time::Duration::from_secs(60));
        }
    }
}

/// Delete files under `dir` with the given extension whose stem-derived
/// date is older than `cutoff`.
fn prune_by_stem_date<F>(dir: &Path, extension: &str, date_component: F, cutoff: NaiveDate) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    if !dir.exists() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches_ext {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(component) = date_component(stem) else {
            continue;
        };
        let Ok(file_date) = NaiveDate::parse_from_str(&component, "%Y%m%d") else {
            continue;
        };
        if file_date < cutoff {
            std::fs::remove_file(&path)?;
            info!(path = %path.display(), "old file removed");
            removed += 1;
        }
    }
    Ok(removed)
}
