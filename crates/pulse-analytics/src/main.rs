//! CLI entry point for the local analytics pipeline.

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use polars::prelude::*;
use pulse_analytics::{
    AutomationDriver, DataTransformer, ExploratoryProfiler, FileExtractor, MissingStrategy,
    ReportFormat, ReportWriter, Settings, SqliteStore, WriteMode, sample,
};
use std::fs::File;
use std::path::Path;
use tracing::info;

/// CLI-compatible missing-value strategy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliStrategy {
    /// Remove rows containing missing values
    Drop,
    /// Fill numeric columns with the mean
    FillMean,
    /// Fill numeric columns with the median
    FillMedian,
    /// Fill non-numeric columns with the mode
    FillMode,
    /// Median for numeric columns, mode for the rest
    Auto,
}

impl From<CliStrategy> for MissingStrategy {
    fn from(cli: CliStrategy) -> Self {
        match cli {
            CliStrategy::Drop => MissingStrategy::Drop,
            CliStrategy::FillMean => MissingStrategy::FillMean,
            CliStrategy::FillMedian => MissingStrategy::FillMedian,
            CliStrategy::FillMode => MissingStrategy::FillMode,
            CliStrategy::Auto => MissingStrategy::Auto,
        }
    }
}

/// CLI-compatible report format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    /// Pretty-printed JSON artifact
    Json,
    /// Human-readable text artifact
    Text,
}

impl From<CliFormat> for ReportFormat {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::Json => ReportFormat::Json,
            CliFormat::Text => ReportFormat::Text,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Local tabular analytics pipeline",
    long_about = "Profile, clean and persist tabular datasets on a single machine.\n\n\
                  EXAMPLES:\n  \
                  # Profile a CSV and save a JSON report\n  \
                  pulse-analytics profile -i data/raw/sales.csv\n\n  \
                  # Clean a dataset end to end\n  \
                  pulse-analytics clean -i sales.csv -o clean.csv --strategy auto --dedupe\n\n  \
                  # Generate seeded demo data\n  \
                  pulse-analytics seed --sales-rows 5000\n\n  \
                  # Run the scheduled jobs\n  \
                  pulse-analytics automate"
)]
struct Args {
    /// Workspace root holding data/, outputs/ and the SQLite database
    #[arg(long, default_value = ".", global = true)]
    data_root: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a dataset and write a report artifact
    Profile {
        /// Path to the input file (csv, json or parquet)
        #[arg(short, long)]
        input: String,

        /// Report key; defaults to the input file stem
        #[arg(short, long)]
        name: Option<String>,

        /// Artifact format
        #[arg(short, long, value_enum, default_value = "json")]
        format: CliFormat,

        /// Also persist the dataset to the table store
        #[arg(long)]
        to_store: bool,
    },

    /// Apply cleaning operations and write the result as CSV
    Clean {
        /// Path to the input file (csv, json or parquet)
        #[arg(short, long)]
        input: String,

        /// Path of the cleaned CSV output
        #[arg(short, long)]
        output: String,

        /// Normalise column names first
        #[arg(long)]
        clean_names: bool,

        /// Missing-value strategy to apply
        #[arg(short, long, value_enum)]
        strategy: Option<CliStrategy>,

        /// Remove duplicate rows
        #[arg(long)]
        dedupe: bool,

        /// Comma-separated column subset for duplicate detection
        #[arg(long, requires = "dedupe")]
        subset: Option<String>,

        /// Attempt temporal/numeric conversion of text columns
        #[arg(long)]
        convert_types: bool,

        /// Derive calendar feature columns from this date column
        #[arg(long)]
        date_features: Option<String>,
    },

    /// Run the scheduled daily/weekly jobs in the foreground
    Automate,

    /// Generate seeded demo data into the store and raw-data directory
    Seed {
        /// Rows in the sales table
        #[arg(long, default_value = "5000")]
        sales_rows: usize,

        /// Rows in the customers table
        #[arg(long, default_value = "1000")]
        customer_rows: usize,
    },
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);
    dotenv().ok();

    let settings = Settings::new(&args.data_root);
    settings.ensure_directories()?;

    match args.command {
        Command::Profile {
            input,
            name,
            format,
            to_store,
        } => run_profile(&settings, &input, name, format.into(), to_store),
        Command::Clean {
            input,
            output,
            clean_names,
            strategy,
            dedupe,
            subset,
            convert_types,
            date_features,
        } => run_clean(
            &settings,
            &input,
            &output,
            CleanOptions {
                clean_names,
                strategy: strategy.map(Into::into),
                dedupe,
                subset,
                convert_types,
                date_features,
            },
        ),
        Command::Automate => {
            let mut driver = AutomationDriver::new(settings);
            driver.run()?;
            Ok(())
        }
        Command::Seed {
            sales_rows,
            customer_rows,
        } => {
            sample::seed_workspace(&settings, sales_rows, customer_rows)?;
            println!("Seeded {} sales rows and {} customers", sales_rows, customer_rows);
            Ok(())
        }
    }
}

fn run_profile(
    settings: &Settings,
    input: &str,
    name: Option<String>,
    format: ReportFormat,
    to_store: bool,
) -> Result<()> {
    let extractor = FileExtractor::new(&settings.raw_data_dir);
    let df = extractor.read(input)?;
    let name = name.unwrap_or_else(|| file_stem(input));

    let mut profiler = ExploratoryProfiler::new();
    let report = profiler.analyze(&df, &name)?;

    let writer = ReportWriter::new(&settings.reports_dir);
    let path = writer.write(&report, format)?;

    println!("Report: {}", path.display());
    for insight in &report.insights {
        println!("  - {}", insight);
    }

    if to_store {
        let store = SqliteStore::from_settings(settings);
        let rows = store.write_table(&df, &name, WriteMode::Replace)?;
        info!(table = %name, rows, "dataset persisted");
    }
    Ok(())
}

struct CleanOptions {
    clean_names: bool,
    strategy: Option<MissingStrategy>,
    dedupe: bool,
    subset: Option<String>,
    convert_types: bool,
    date_features: Option<String>,
}

fn run_clean(settings: &Settings, input: &str, output: &str, options: CleanOptions) -> Result<()> {
    let extractor = FileExtractor::new(&settings.raw_data_dir);
    let mut df = extractor.read(input)?;

    let mut transformer = DataTransformer::new();
    if options.clean_names {
        df = transformer.clean_column_names(&df)?;
    }
    if options.convert_types {
        df = transformer.convert_dtypes(&df)?;
    }
    if let Some(strategy) = options.strategy {
        df = transformer.handle_missing_values(&df, strategy)?;
    }
    if options.dedupe {
        let subset: Option<Vec<String>> = options
            .subset
            .as_deref()
            .map(|s| s.split(',').map(|c| c.trim().to_string()).collect());
        df = transformer.remove_duplicates(&df, subset.as_deref())?;
    }
    if let Some(column) = options.date_features.as_deref() {
        df = transformer.create_date_features(&df, column)?;
    }

    let output_path = Path::new(output);
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)
        .map_err(|e| anyhow!("cannot create output '{}': {}", output, e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    println!("Cleaned dataset: {} ({} rows)", output, df.height());
    println!("Transformations applied:");
    for record in transformer.log() {
        println!("  - {}: {}", record.operation, record.details);
    }
    Ok(())
}

fn file_stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string()
}
