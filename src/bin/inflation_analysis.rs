//! Interactive stock-CPI correlation and price prediction session.
//!
//! Prompts for an expected-inflation scenario and a training tenure, runs
//! every stock in the configured folder through the analysis pipeline, and
//! prints per-stock status lines followed by a summary table. Loops until the
//! user quits.

use cpi_trade::analysis::{run_batch, ScenarioParams, StockOutcome};
use cpi_trade::config::AnalysisConfig;
use cpi_trade::tenure::Tenure;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

type Lines = io::Lines<io::StdinLock<'static>>;

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {}", error);
        std::process::exit(1);
    }
}

fn run() -> cpi_trade::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AnalysisConfig::load_or_default(config_path.as_deref())?;

    println!("Stock-CPI Correlation Analysis with Expected Inflation and Price Prediction");
    println!(
        "CPI file: {} | stock folder: {} | reference end date: {}",
        config.cpi_path.display(),
        config.stock_dir.display(),
        config.reference_end_date
    );
    println!("Enter 'q' at any prompt to quit.\n");

    let mut lines = io::stdin().lines();

    loop {
        let Some(expected_inflation) = prompt_inflation(&mut lines)? else {
            break;
        };
        let Some(tenure) = prompt_tenure(&mut lines)? else {
            break;
        };
        let scenario = ScenarioParams::new(expected_inflation, tenure)?;

        println!(
            "\nTraining model with Expected Inflation: {} and Tenure: {}...",
            scenario.expected_inflation, scenario.tenure
        );

        let summary = run_batch(&config, &scenario)?;
        if summary.is_empty() {
            println!(
                "No stock files found in '{}'.",
                config.stock_dir.display()
            );
        }
        for outcome in summary.iter() {
            print_outcome(outcome);
        }

        println!("\nCorrelation and Price Prediction Summary:");
        print!("{}", summary);

        if !prompt_continue(&mut lines)? {
            break;
        }
    }

    Ok(())
}

/// Read the expected upcoming inflation; re-prompts until the input is a
/// non-negative number. Returns `None` on quit or end of input.
fn prompt_inflation(lines: &mut Lines) -> cpi_trade::Result<Option<f64>> {
    loop {
        print!("Enter Expected Upcoming Inflation: ");
        io::stdout().flush()?;
        let Some(line) = next_line(lines)? else {
            return Ok(None);
        };
        match line.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => return Ok(Some(value)),
            _ => println!("Please enter a non-negative number."),
        }
    }
}

/// Read the training tenure; accepts the labels or the bare year counts.
/// Returns `None` on quit or end of input.
fn prompt_tenure(lines: &mut Lines) -> cpi_trade::Result<Option<Tenure>> {
    let labels: Vec<&str> = Tenure::ALL.iter().map(|t| t.label()).collect();
    loop {
        print!("Select Tenure for Training Model ({}): ", labels.join(" / "));
        io::stdout().flush()?;
        let Some(line) = next_line(lines)? else {
            return Ok(None);
        };
        match line.parse::<Tenure>() {
            Ok(tenure) => return Ok(Some(tenure)),
            Err(error) => println!("{}", error),
        }
    }
}

fn prompt_continue(lines: &mut Lines) -> cpi_trade::Result<bool> {
    print!("\nRun another scenario? [y/q]: ");
    io::stdout().flush()?;
    match next_line(lines)? {
        Some(line) => Ok(line.trim().eq_ignore_ascii_case("y")),
        None => Ok(false),
    }
}

/// Next input line, or `None` on end of input or an explicit quit
fn next_line(lines: &mut Lines) -> cpi_trade::Result<Option<String>> {
    match lines.next() {
        None => Ok(None),
        Some(line) => {
            let line = line?;
            if line.trim().eq_ignore_ascii_case("q") {
                Ok(None)
            } else {
                Ok(Some(line))
            }
        }
    }
}

fn correlation_line(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{}", v),
        None => "undefined (fewer than two varying observations)".to_string(),
    }
}

fn print_outcome(outcome: &StockOutcome) {
    match outcome {
        StockOutcome::Success(result) => {
            println!("\nTraining for {}...", result.stock);
            if result.dropped_nan > 0 {
                println!(
                    "Warning: NaN values found in 'CPI' column for {}. Dropped {} row(s).",
                    result.stock, result.dropped_nan
                );
            }
            println!(
                "Correlation between 'Close' and 'CPI Change' for {}: {}",
                result.stock,
                correlation_line(result.correlations.close_vs_cpi_change)
            );
            println!(
                "Actual Correlation between 'Close' and 'CPI' for {}: {}",
                result.stock,
                correlation_line(result.correlations.close_vs_cpi_level)
            );
            println!(
                "Predicted Price Change for Future Inflation (Linear Regression): {}",
                result.regression_price
            );
            println!(
                "Predicted Price Change for Future Inflation (ARIMA): {}",
                result.arima_price
            );
            println!(
                "Predicted Volatility for Future Inflation (GARCH): {}",
                result.garch_variance
            );
            println!(
                "Predicted Stock Price for Future Inflation (GARCH): {}",
                result.garch_price
            );
            println!(
                "Latest Actual Price for {}: {}",
                result.stock, result.latest_close
            );
        }
        StockOutcome::Failure { stock, reason } => {
            println!("\nTraining for {}...", stock);
            println!("Skipping {}: {}", stock, reason);
        }
    }
}
