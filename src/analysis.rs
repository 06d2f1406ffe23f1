//! The per-stock analysis pipeline and the batch over all discovered stocks

use crate::config::AnalysisConfig;
use crate::correlation::CorrelationReport;
use crate::data::{CpiSeries, DataLoader, StockSeries};
use crate::error::{PipelineError, Result};
use crate::merge::MergedSeries;
use crate::models::{AutoArima, Garch, InflationModel, LinearRegression};
use crate::tenure::Tenure;
use serde::Serialize;
use std::fmt;

/// User-supplied scenario: the expected upcoming inflation and the training
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScenarioParams {
    pub expected_inflation: f64,
    pub tenure: Tenure,
}

impl ScenarioParams {
    pub fn new(expected_inflation: f64, tenure: Tenure) -> Result<Self> {
        if !expected_inflation.is_finite() || expected_inflation < 0.0 {
            return Err(PipelineError::InvalidParameter(format!(
                "expected inflation must be a non-negative number, got {}",
                expected_inflation
            )));
        }
        Ok(Self {
            expected_inflation,
            tenure,
        })
    }
}

/// Outcome of one sub-model, kept per model so one model's failure does not
/// suppress the others' results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelOutcome {
    Value(f64),
    Failed(String),
}

impl ModelOutcome {
    fn from_result(result: Result<f64>) -> Self {
        match result {
            Ok(value) => ModelOutcome::Value(value),
            Err(error) => ModelOutcome::Failed(error.to_string()),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            ModelOutcome::Value(v) => Some(*v),
            ModelOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            ModelOutcome::Value(_) => None,
            ModelOutcome::Failed(reason) => Some(reason),
        }
    }
}

impl fmt::Display for ModelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelOutcome::Value(v) => write!(f, "{:.4}", v),
            ModelOutcome::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// Everything reported for one successfully analyzed stock
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub stock: String,
    /// Merged rows the models were fitted on
    pub rows: usize,
    /// Joined rows dropped for a missing CPI value; non-zero triggers the
    /// warning line in the UI
    pub dropped_nan: usize,
    pub correlations: CorrelationReport,
    /// Regression line evaluated at the expected-inflation input
    pub regression_price: ModelOutcome,
    /// One-step-ahead ARIMA forecast of the close series
    pub arima_price: ModelOutcome,
    /// One-step-ahead GARCH conditional-variance forecast
    pub garch_variance: ModelOutcome,
    /// Last close scaled by (1 + variance forecast)
    pub garch_price: ModelOutcome,
    pub latest_close: f64,
}

/// One row of the summary table: an analysis or the reason it failed
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StockOutcome {
    Success(AnalysisResult),
    Failure { stock: String, reason: String },
}

impl StockOutcome {
    pub fn stock(&self) -> &str {
        match self {
            StockOutcome::Success(result) => &result.stock,
            StockOutcome::Failure { stock, .. } => stock,
        }
    }

    pub fn as_success(&self) -> Option<&AnalysisResult> {
        match self {
            StockOutcome::Success(result) => Some(result),
            StockOutcome::Failure { .. } => None,
        }
    }
}

/// Ordered per-stock outcomes of one training run.
///
/// Built once per run as the output of a fold over the discovered stock
/// files; consumers only read it.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryTable {
    outcomes: Vec<StockOutcome>,
}

impl SummaryTable {
    pub fn new(outcomes: Vec<StockOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcomes(&self) -> &[StockOutcome] {
        &self.outcomes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StockOutcome> {
        self.outcomes.iter()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Serialization(e.to_string()))
    }
}

fn correlation_cell(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "undefined".to_string(),
    }
}

fn model_cell(outcome: &ModelOutcome) -> String {
    match outcome {
        ModelOutcome::Value(v) => format!("{:.4}", v),
        ModelOutcome::Failed(_) => "failed".to_string(),
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<16} {:>14} {:>12} {:>14} {:>14} {:>18} {:>14} {:>14}",
            "Stock",
            "Corr(CPI Chg)",
            "Corr(CPI)",
            "Price (LR)",
            "Price (ARIMA)",
            "Volatility(GARCH)",
            "Price (GARCH)",
            "Latest Close"
        )?;
        for outcome in &self.outcomes {
            match outcome {
                StockOutcome::Success(result) => writeln!(
                    f,
                    "{:<16} {:>14} {:>12} {:>14} {:>14} {:>18} {:>14} {:>14.4}",
                    result.stock,
                    correlation_cell(result.correlations.close_vs_cpi_change),
                    correlation_cell(result.correlations.close_vs_cpi_level),
                    model_cell(&result.regression_price),
                    model_cell(&result.arima_price),
                    model_cell(&result.garch_variance),
                    model_cell(&result.garch_price),
                    result.latest_close,
                )?,
                StockOutcome::Failure { stock, reason } => {
                    writeln!(f, "{:<16} {}", stock, reason)?
                }
            }
        }
        Ok(())
    }
}

/// Run the full pipeline for one stock: tenure filter, merge, correlations,
/// the three model fits, predictions.
///
/// The expected-inflation input is fed to the regression as if it were a CPI
/// level; see DESIGN.md before changing that.
pub fn analyze_stock(
    stock: &StockSeries,
    cpi: &CpiSeries,
    scenario: &ScenarioParams,
    reference_end_date: chrono::NaiveDate,
) -> Result<AnalysisResult> {
    let (start, end) = scenario.tenure.window(reference_end_date);
    let windowed = stock.restrict(start, end);
    let merged = MergedSeries::build(&windowed, cpi);

    let latest_close = merged.latest_close().ok_or_else(|| {
        PipelineError::Merge(format!(
            "no data: '{}' has no dates overlapping the CPI series in the selected window",
            stock.name()
        ))
    })?;

    let correlations = CorrelationReport::compute(&merged);

    let regression_price = ModelOutcome::from_result(
        LinearRegression::new()
            .train(&merged)
            .map(|model| model.predict(scenario.expected_inflation)),
    );

    let arima_price = ModelOutcome::from_result(
        AutoArima::default()
            .train(&merged)
            .map(|model| model.forecast_next()),
    );

    let (garch_variance, garch_price) = match Garch::garch11().train(&merged) {
        Ok(model) => {
            let variance = model.next_variance();
            (
                ModelOutcome::Value(variance),
                ModelOutcome::Value(latest_close * (1.0 + variance)),
            )
        }
        Err(error) => {
            let reason = error.to_string();
            (
                ModelOutcome::Failed(reason.clone()),
                ModelOutcome::Failed(reason),
            )
        }
    };

    Ok(AnalysisResult {
        stock: stock.name().to_string(),
        rows: merged.len(),
        dropped_nan: merged.dropped_nan(),
        correlations,
        regression_price,
        arima_price,
        garch_variance,
        garch_price,
        latest_close,
    })
}

/// Run the batch: load CPI once, discover the stock files, and fold every
/// file into a summary row.
///
/// A failing stock becomes a `Failure` row; it never aborts its siblings.
/// Stock files are re-read from disk on every call.
pub fn run_batch(config: &AnalysisConfig, scenario: &ScenarioParams) -> Result<SummaryTable> {
    let cpi = DataLoader::load_cpi(&config.cpi_path)?;
    let files = DataLoader::discover_stocks(&config.stock_dir)?;

    let outcomes = files
        .iter()
        .map(|path| {
            let fallback_name = || {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            };
            DataLoader::load_stock(path)
                .and_then(|stock| {
                    analyze_stock(&stock, &cpi, scenario, config.reference_end_date)
                })
                .map_or_else(
                    |error| StockOutcome::Failure {
                        stock: fallback_name(),
                        reason: error.to_string(),
                    },
                    StockOutcome::Success,
                )
        })
        .collect();

    Ok(SummaryTable::new(outcomes))
}
