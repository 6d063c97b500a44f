//! Local SQLite table store.
//!
//! Datasets persist as plain tables. Every operation opens and closes its
//! own connection; there is no pooling and no shared handle.

use std::path::PathBuf;

use chrono::Local;
use polars::prelude::*;
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, info};

use crate::error::{AnalyticsError, Result};
use crate::settings::Settings;
use crate::types::ColumnKind;
use crate::utils::{any_value_to_string, kind_of_series};

/// Behaviour when the target table already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Drop and recreate the table.
    Replace,
    /// Insert into the existing table.
    Append,
    /// Refuse to write.
    Fail,
}

/// SQLite-backed table store.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
    backups_dir: PathBuf,
}

impl SqliteStore {
    pub fn new(db_path: impl Into<PathBuf>, backups_dir: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            backups_dir: backups_dir.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.db_path, &settings.backups_dir)
    }

    fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Persist a dataset as a table. Returns the number of rows written.
    pub fn write_table(&self, df: &DataFrame, table: &str, mode: WriteMode) -> Result<usize> {
        let mut conn = self.connect()?;
        let exists = table_exists(&conn, table)?;

        match mode {
            WriteMode::Fail if exists => {
                return Err(AnalyticsError::TableExists(table.to_string()));
            }
            WriteMode::Replace if exists => {
                conn.execute(&format!("DROP TABLE {}", quote_ident(table)), [])?;
            }
            _ => {}
        }

        let recreate = !exists || mode == WriteMode::Replace;
        let columns: Vec<(String, Vec<SqlValue>)> = df
            .get_columns()
            .iter()
            .map(|col| {
                let series = col.as_materialized_series();
                Ok((series.name().to_string(), sql_values(series)?))
            })
            .collect::<Result<_>>()?;

        let tx = conn.transaction()?;
        if recreate {
            let column_defs: Vec<String> = df
                .get_columns()
                .iter()
                .map(|col| {
                    let series = col.as_materialized_series();
                    format!(
                        "{} {}",
                        quote_ident(series.name()),
                        sql_type(series)
                    )
                })
                .collect();
            tx.execute(
                &format!(
                    "CREATE TABLE {} ({})",
                    quote_ident(table),
                    column_defs.join(", ")
                ),
                [],
            )?;
        }

        if !columns.is_empty() {
            let placeholders: Vec<String> =
                (1..=columns.len()).map(|i| format!("?{}", i)).collect();
            let insert = format!(
                "INSERT INTO {} VALUES ({})",
                quote_ident(table),
                placeholders.join(", ")
            );
            let mut stmt = tx.prepare(&insert)?;
            for row in 0..df.height() {
                let values = columns.iter().map(|(_, col)| col[row].clone());
                stmt.execute(params_from_iter(values))?;
            }
            drop(stmt);
        }
        tx.commit()?;

        info!(table, rows = df.height(), "dataset written to store");
        Ok(df.height())
    }

    /// Run a query and materialise the result as a DataFrame. Per-column
    /// Rust types are inferred from the returned SQLite values.
    pub fn read_query(&self, sql: &str) -> Result<DataFrame> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();

        let mut raw: Vec<Vec<SqlValue>> = vec![Vec::new(); names.len()];
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (i, column) in raw.iter_mut().enumerate() {
                column.push(SqlValue::from(row.get_ref(i)?));
            }
        }

        let columns = names
            .iter()
            .zip(raw)
            .map(|(name, values)| column_from_sql(name, values))
            .collect::<Result<Vec<_>>>()?;
        let df = DataFrame::new(columns)?;
        debug!(rows = df.height(), "query returned");
        Ok(df)
    }

    /// Names of all tables in the database, alphabetically.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.connect()?;
        let mut stmt =
            conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Execute a non-SELECT statement. Returns affected row count.
    pub fn execute(&self, sql: &str) -> Result<usize> {
        let conn = self.connect()?;
        Ok(conn.execute(sql, [])?)
    }

    /// Copy the database file to a timestamped backup.
    pub fn backup(&self) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.backups_dir)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        let backup_path = self
            .backups_dir
            .join(format!("analytics_backup_{}.db", stamp));
        std::fs::copy(&self.db_path, &backup_path)
            .map_err(|e| AnalyticsError::StoreFailed(format!("backup failed: {}", e)))?;
        info!(path = %backup_path.display(), "backup created");
        Ok(backup_path)
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    Ok(stmt.exists([table])?)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// SQL column type for a series.
fn sql_type(series: &Series) -> &'static str {
    match kind_of_series(series) {
        ColumnKind::Numeric => {
            if matches!(series.dtype(), DataType::Float32 | DataType::Float64) {
                "REAL"
            } else {
                "INTEGER"
            }
        }
        ColumnKind::Boolean => "INTEGER",
        _ => "TEXT",
    }
}

/// Convert one series into SQLite values, in row order.
fn sql_values(series: &Series) -> Result<Vec<SqlValue>> {
    let values = match kind_of_series(series) {
        ColumnKind::Numeric => {
            if matches!(series.dtype(), DataType::Float32 | DataType::Float64) {
                let ca = series.cast(&DataType::Float64)?;
                ca.f64()?
                    .into_iter()
                    .map(|v| v.map_or(SqlValue::Null, SqlValue::Real))
                    .collect()
            } else {
                let ca = series.cast(&DataType::Int64)?;
                ca.i64()?
                    .into_iter()
                    .map(|v| v.map_or(SqlValue::Null, SqlValue::Integer))
                    .collect()
            }
        }
        ColumnKind::Boolean => series
            .bool()?
            .into_iter()
            .map(|v| v.map_or(SqlValue::Null, |b| SqlValue::Integer(b as i64)))
            .collect(),
        ColumnKind::Temporal => {
            let date_only = series.dtype() == &DataType::Date;
            let millis = series
                .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?
                .cast(&DataType::Int64)?;
            millis
                .i64()?
                .into_iter()
                .map(|v| {
                    v.and_then(chrono::DateTime::from_timestamp_millis)
                        .map_or(SqlValue::Null, |dt| {
                            let format = if date_only {
                                "%Y-%m-%d"
                            } else {
                                "%Y-%m-%d %H:%M:%S"
                            };
                            SqlValue::Text(dt.format(format).to_string())
                        })
                })
                .collect(),
        }
        _ => {
            let mut values = Vec::with_capacity(series.len());
            for i in 0..series.len() {
                let av = series.get(i)?;
                if matches!(av, AnyValue::Null) {
                    values.push(SqlValue::Null);
                } else {
                    values.push(SqlValue::Text(any_value_to_string(&av)));
                }
            }
            values
        }
    };
    Ok(values)
}

/// Build a polars column from raw SQLite values, inferring the type from
/// what actually came back.
fn column_from_sql(name: &str, values: Vec<SqlValue>) -> Result<Column> {
    let has_real = values.iter().any(|v| matches!(v, SqlValue::Real(_)));
    let has_int = values.iter().any(|v| matches!(v, SqlValue::Integer(_)));
    let has_text = values
        .iter()
        .any(|v| matches!(v, SqlValue::Text(_) | SqlValue::Blob(_)));

    let series = if has_text {
        let out: Vec<Option<String>> = values
            .into_iter()
            .map(|v| match v {
                SqlValue::Null => None,
                SqlValue::Text(s) => Some(s),
                SqlValue::Integer(i) => Some(i.to_string()),
                SqlValue::Real(f) => Some(f.to_string()),
                SqlValue::Blob(b) => Some(String::from_utf8_lossy(&b).into_owned()),
            })
            .collect();
        Series::new(name.into(), out)
    } else if has_real {
        let out: Vec<Option<f64>> = values
            .into_iter()
            .map(|v| match v {
                SqlValue::Real(f) => Some(f),
                SqlValue::Integer(i) => Some(i as f64),
                _ => None,
            })
            .collect();
        Series::new(name.into(), out)
    } else if has_int {
        let out: Vec<Option<i64>> = values
            .into_iter()
            .map(|v| match v {
                SqlValue::Integer(i) => Some(i),
                _ => None,
            })
            .collect();
        Series::new(name.into(), out)
    } else {
        // Empty result set or all-null column.
        let out: Vec<Option<String>> = values.into_iter().map(|_| None).collect();
        Series::new(name.into(), out)
    };
    Ok(series.into_column())
}
