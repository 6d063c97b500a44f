//! Deterministic sample data for demos and smoke tests.
//!
//! Generates a seeded sales table and a customers table, persists both to
//! the store and drops CSV copies into the raw-data directory.

use std::fs::File;

use chrono::{Datelike, Duration, NaiveDate};
use polars::prelude::*;
use rand::prelude::*;
use tracing::info;

use crate::error::Result;
use crate::settings::Settings;
use crate::store::{SqliteStore, WriteMode};

const PRODUCTS: [&str; 5] = ["Laptop", "Mouse", "Keyboard", "Monitor", "Chair"];
const CATEGORIES: [&str; 3] = ["Electronics", "Peripherals", "Furniture"];
const REGIONS: [&str; 5] = ["North", "Northeast", "Midwest", "Southeast", "South"];
const FIRST_NAMES: [&str; 8] = [
    "John", "Mary", "Joseph", "Anna", "Carl", "Marina", "Peter", "Julia",
];
const LAST_NAMES: [&str; 6] = ["Silva", "Santos", "Oliveira", "Souza", "Ferreira", "Lima"];
const CITIES: [&str; 6] = [
    "Sao Paulo",
    "Rio de Janeiro",
    "Belo Horizonte",
    "Brasilia",
    "Salvador",
    "Fortaleza",
];
const STATES: [&str; 6] = ["SP", "RJ", "MG", "DF", "BA", "CE"];
const SEGMENTS: [&str; 3] = ["Retail", "Wholesale", "Corporate"];

/// Discount tiers with their sampling weights.
const DISCOUNTS: [(i64, f64); 5] = [(0, 0.5), (5, 0.2), (10, 0.15), (15, 0.1), (20, 0.05)];

/// Generate a seeded sales dataset with `n` rows.
pub fn generate_sales(n: usize) -> Result<DataFrame> {
    let mut rng = StdRng::seed_from_u64(42);
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid literal date");

    let mut dates = Vec::with_capacity(n);
    let mut products = Vec::with_capacity(n);
    let mut categories = Vec::with_capacity(n);
    let mut regions = Vec::with_capacity(n);
    let mut quantities = Vec::with_capacity(n);
    let mut unit_prices = Vec::with_capacity(n);
    let mut discounts = Vec::with_capacity(n);
    let mut customer_ids = Vec::with_capacity(n);
    let mut totals = Vec::with_capacity(n);
    let mut months = Vec::with_capacity(n);
    let mut years = Vec::with_capacity(n);
    let mut weekdays = Vec::with_capacity(n);

    for i in 0..n {
        let date = start + Duration::days(((i * 365) / n.max(1)) as i64);
        let quantity = rng.gen_range(1..50i64);
        let unit_price = round2(rng.gen_range(50.0..5000.0));
        let discount = weighted_discount(&mut rng);

        dates.push(date);
        products.push(*PRODUCTS.choose(&mut rng).expect("non-empty"));
        categories.push(*CATEGORIES.choose(&mut rng).expect("non-empty"));
        regions.push(*REGIONS.choose(&mut rng).expect("non-empty"));
        quantities.push(quantity);
        unit_prices.push(unit_price);
        discounts.push(discount);
        customer_ids.push(rng.gen_range(1000..9999i64));
        totals.push(round2(
            quantity as f64 * unit_price * (1.0 - discount as f64 / 100.0),
        ));
        months.push(date.month() as i32);
        years.push(date.year());
        weekdays.push(date.format("%A").to_string());
    }

    let columns = vec![
        date_series("date", &dates)?.into_column(),
        Series::new("product".into(), products).into_column(),
        Series::new("category".into(), categories).into_column(),
        Series::new("region".into(), regions).into_column(),
        Series::new("quantity".into(), quantities).into_column(),
        Series::new("unit_price".into(), unit_prices).into_column(),
        Series::new("discount".into(), discounts).into_column(),
        Series::new("customer_id".into(), customer_ids).into_column(),
        Series::new("total_value".into(), totals).into_column(),
        Series::new("month".into(), months).into_column(),
        Series::new("year".into(), years).into_column(),
        Series::new("weekday".into(), weekdays).into_column(),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Generate a seeded customers dataset with `n` rows.
pub fn generate_customers(n: usize) -> Result<DataFrame> {
    let mut rng = StdRng::seed_from_u64(42);
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid literal date");
    let span_days = 5 * 365;

    let mut ids = Vec::with_capacity(n);
    let mut names = Vec::with_capacity(n);
    let mut cities = Vec::with_capacity(n);
    let mut states = Vec::with_capacity(n);
    let mut segments = Vec::with_capacity(n);
    let mut signup_dates = Vec::with_capacity(n);
    let mut active = Vec::with_capacity(n);
    let mut scores = Vec::with_capacity(n);
    let mut credit_limits = Vec::with_capacity(n);

    for i in 0..n {
        ids.push(1000 + i as i64);
        names.push(format!(
            "{} {}",
            FIRST_NAMES.choose(&mut rng).expect("non-empty"),
            LAST_NAMES.choose(&mut rng).expect("non-empty")
        ));
        let place = rng.gen_range(0..CITIES.len());
        cities.push(CITIES[place]);
        states.push(STATES[place]);
        segments.push(*SEGMENTS.choose(&mut rng).expect("non-empty"));
        signup_dates.push(start + Duration::days(((i * span_days) / n.max(1)) as i64));
        active.push(rng.gen_bool(0.85));
        scores.push(rng.gen_range(0..100i64));
        credit_limits.push(round2(rng.gen_range(1000.0..50000.0)));
    }

    let columns = vec![
        Series::new("customer_id".into(), ids).into_column(),
        Series::new("name".into(), names).into_column(),
        Series::new("city".into(), cities).into_column(),
        Series::new("state".into(), states).into_column(),
        Series::new("segment".into(), segments).into_column(),
        date_series("signup_date", &signup_dates)?.into_column(),
        Series::new("active".into(), active).into_column(),
        Series::new("score".into(), scores).into_column(),
        Series::new("credit_limit".into(), credit_limits).into_column(),
    ];
    Ok(DataFrame::new(columns)?)
}

/// Generate both datasets, persist them to the store and write CSV copies
/// into the raw-data directory.
pub fn seed_workspace(settings: &Settings, sales_rows: usize, customer_rows: usize) -> Result<()> {
    settings.ensure_directories()?;
    let store = SqliteStore::from_settings(settings);

    let mut sales = generate_sales(sales_rows)?;
    let mut customers = generate_customers(customer_rows)?;

    store.write_table(&sales, "sales", WriteMode::Replace)?;
    store.write_table(&customers, "customers", WriteMode::Replace)?;

    for (df, file_name) in [
        (&mut sales, "sample_sales.csv"),
        (&mut customers, "sample_customers.csv"),
    ] {
        let path = settings.raw_data_dir.join(file_name);
        let mut file = File::create(&path)?;
        CsvWriter::new(&mut file).include_header(true).finish(df)?;
        info!(path = %path.display(), "sample csv written");
    }

    info!(sales_rows, customer_rows, "sample data generated");
    Ok(())
}

fn date_series(name: &str, dates: &[NaiveDate]) -> Result<Series> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid literal date");
    let days: Vec<i32> = dates.iter().map(|d| (*d - epoch).num_days() as i32).collect();
    Ok(Series::new(name.into(), days).cast(&DataType::Date)?)
}

fn weighted_discount(rng: &mut StdRng) -> i64 {
    let roll: f64 = rng.r#gen();
    let mut cumulative = 0.0;
    for (value, weight) in DISCOUNTS {
        cumulative += weight;
        if roll < cumulative {
            return value;
        }
    }
    DISCOUNTS[DISCOUNTS.len() - 1].0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
