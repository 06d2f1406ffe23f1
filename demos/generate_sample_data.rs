//! Generate sample input data for the interactive analysis binary.
//!
//! Writes `CPI.csv` and a `stock_folder/` with three synthetic instruments,
//! ten years of monthly rows ending at the default reference end date, so
//! `cargo run --bin inflation_analysis` works out of the box.
//!
//! Run with: `cargo run --example generate_sample_data`

use chrono::{Months, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::fs;
use std::io::Write;
use std::path::Path;

const MONTHS: usize = 120;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let end = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
    let dates: Vec<NaiveDate> = (0..MONTHS)
        .rev()
        .map(|back| end.checked_sub_months(Months::new(back as u32)).unwrap())
        .collect();

    let mut rng = StdRng::seed_from_u64(42);
    let cpi = simulate_cpi(&dates, &mut rng);
    write_cpi("CPI.csv", &dates, &cpi)?;
    println!("Wrote CPI.csv ({} rows)", dates.len());

    fs::create_dir_all("stock_folder")?;
    for (name, base, cpi_beta, noise) in [
        ("ALPHA", 120.0, 1.8, 2.5),
        ("BRAVO", 45.0, -0.6, 1.2),
        ("CHARLIE", 310.0, 0.2, 6.0),
    ] {
        let closes = simulate_stock(&cpi, base, cpi_beta, noise, &mut rng);
        let path = Path::new("stock_folder").join(format!("{}.csv", name));
        write_stock(&path, &dates, &closes)?;
        println!("Wrote {} ({} rows)", path.display(), dates.len());
    }

    Ok(())
}

/// CPI level: compounding drift with mild noise, starting near 100
fn simulate_cpi(dates: &[NaiveDate], rng: &mut StdRng) -> Vec<f64> {
    let monthly_inflation = Normal::new(0.0025, 0.0015).unwrap();
    let mut level = 100.0;
    dates
        .iter()
        .map(|_| {
            level *= 1.0 + monthly_inflation.sample(rng);
            level
        })
        .collect()
}

/// Stock close: a CPI-linked component plus a random walk
fn simulate_stock(
    cpi: &[f64],
    base: f64,
    cpi_beta: f64,
    noise: f64,
    rng: &mut StdRng,
) -> Vec<f64> {
    let shocks = Normal::new(0.0, noise).unwrap();
    let mut walk = 0.0;
    cpi.iter()
        .map(|level| {
            walk += shocks.sample(rng);
            (base + cpi_beta * (level - 100.0) + walk).max(1.0)
        })
        .collect()
}

fn write_cpi(path: &str, dates: &[NaiveDate], values: &[f64]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "Date,CPI")?;
    for (date, value) in dates.iter().zip(values.iter()) {
        writeln!(file, "{},{:.3}", date, value)?;
    }
    Ok(())
}

fn write_stock(path: &Path, dates: &[NaiveDate], closes: &[f64]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    writeln!(file, "Date,Close,Volume")?;
    for (date, close) in dates.iter().zip(closes.iter()) {
        writeln!(file, "{},{:.2},{}", date, close, 10_000)?;
    }
    Ok(())
}
