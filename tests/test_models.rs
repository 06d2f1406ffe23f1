use approx::assert_relative_eq;
use chrono::NaiveDate;
use cpi_trade::data::{CpiSeries, StockSeries};
use cpi_trade::error::PipelineError;
use cpi_trade::merge::MergedSeries;
use cpi_trade::models::{AutoArima, Garch, InflationModel, LinearRegression};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn monthly(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2014, 1, 1).unwrap();
    (0..n)
        .map(|i| start.checked_add_months(chrono::Months::new(i as u32)).unwrap())
        .collect()
}

/// Merged series where close = slope * cpi, cpi strictly increasing
fn exact_line_series(n: usize, slope: f64) -> MergedSeries {
    let dates = monthly(n);
    let cpi_values: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
    let closes: Vec<f64> = cpi_values.iter().map(|c| slope * c).collect();

    let cpi =
        CpiSeries::from_parts(dates.clone(), cpi_values.into_iter().map(Some).collect())
            .unwrap();
    let stock =
        StockSeries::from_parts("line", dates, closes.into_iter().map(Some).collect())
            .unwrap();
    MergedSeries::build(&stock, &cpi)
}

fn noisy_series(n: usize, seed: u64) -> MergedSeries {
    let dates = monthly(n);
    let cpi_values: Vec<f64> = (0..n).map(|i| 100.0 * 1.003f64.powi(i as i32)).collect();

    let mut rng = StdRng::seed_from_u64(seed);
    let shocks = Normal::new(0.0, 1.5).unwrap();
    let mut price = 150.0;
    let closes: Vec<f64> = (0..n)
        .map(|_| {
            price += shocks.sample(&mut rng);
            price
        })
        .collect();

    let cpi =
        CpiSeries::from_parts(dates.clone(), cpi_values.into_iter().map(Some).collect())
            .unwrap();
    let stock =
        StockSeries::from_parts("noisy", dates, closes.into_iter().map(Some).collect())
            .unwrap();
    MergedSeries::build(&stock, &cpi)
}

#[test]
fn regression_recovers_exact_relationship() {
    let merged = exact_line_series(24, 2.0);
    let model = LinearRegression::new().train(&merged).unwrap();

    // close = 2 * cpi exactly, so the prediction at any x must be 2x.
    assert_relative_eq!(model.predict(0.03), 0.06, epsilon = 1e-6);
    assert_relative_eq!(model.predict(120.0), 240.0, epsilon = 1e-6);
}

#[test]
fn regression_fails_on_single_row() {
    let merged = exact_line_series(2, 2.0); // one row survives the merge
    assert_eq!(merged.len(), 1);
    let result = LinearRegression::new().train(&merged);
    assert!(matches!(result, Err(PipelineError::ModelFit(_))));
}

#[test]
fn auto_arima_continues_a_linear_trend() {
    // Closes follow an exact trend; the differenced series is constant, so
    // the best model forecasts the next step of the line.
    let dates = monthly(40);
    let closes: Vec<f64> = (1..=40).map(|v| v as f64 * 3.0).collect();
    let cpi_values: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();

    let cpi =
        CpiSeries::from_parts(dates.clone(), cpi_values.into_iter().map(Some).collect())
            .unwrap();
    let stock =
        StockSeries::from_parts("trend", dates, closes.into_iter().map(Some).collect())
            .unwrap();
    let merged = MergedSeries::build(&stock, &cpi);

    let model = AutoArima::default().train(&merged).unwrap();
    // First merged row is dropped, so the last close is 120 and the
    // continuation is 123.
    assert_relative_eq!(model.forecast_next(), 123.0, epsilon = 1e-4);
    assert!(model.aic().is_finite());
}

#[test]
fn auto_arima_fails_on_insufficient_data() {
    let merged = exact_line_series(4, 1.0);
    let result = AutoArima::default().train(&merged);
    assert!(matches!(result, Err(PipelineError::ModelFit(_))));
}

#[test]
fn garch_fits_merged_price_series() {
    let merged = noisy_series(72, 9);
    let model = Garch::garch11().train(&merged).unwrap();

    let variance = model.next_variance();
    assert!(variance > 0.0);
    assert!(variance.is_finite());
}

#[test]
fn garch_fails_on_flat_series() {
    let dates = monthly(30);
    let cpi_values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
    let cpi =
        CpiSeries::from_parts(dates.clone(), cpi_values.into_iter().map(Some).collect())
            .unwrap();
    let stock = StockSeries::from_parts(
        "flat",
        dates,
        std::iter::repeat(Some(10.0)).take(30).collect(),
    )
    .unwrap();
    let merged = MergedSeries::build(&stock, &cpi);

    let result = Garch::garch11().train(&merged);
    assert!(matches!(result, Err(PipelineError::ModelFit(_))));
}

#[test]
fn model_names_are_stable() {
    assert_eq!(LinearRegression::new().name(), "Linear Regression");
    assert_eq!(AutoArima::default().name(), "ARIMA (auto)");
    assert_eq!(Garch::garch11().name(), "GARCH(1,1)");
}
