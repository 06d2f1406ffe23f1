//! Ordinary least squares regression of Close on CPI level

use crate::error::{PipelineError, Result};
use crate::merge::MergedSeries;
use crate::models::InflationModel;
use statrs::statistics::Statistics;

/// Single-predictor OLS model: `close ~ cpi`
#[derive(Debug, Clone, Default)]
pub struct LinearRegression;

impl LinearRegression {
    pub fn new() -> Self {
        LinearRegression
    }
}

impl InflationModel for LinearRegression {
    type Trained = TrainedLinearRegression;

    fn train(&self, data: &MergedSeries) -> Result<TrainedLinearRegression> {
        TrainedLinearRegression::fit(&data.cpi_levels(), &data.closes())
    }

    fn name(&self) -> &str {
        "Linear Regression"
    }
}

/// Fitted regression line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainedLinearRegression {
    slope: f64,
    intercept: f64,
    r_squared: f64,
}

impl TrainedLinearRegression {
    /// Closed-form OLS over one predictor
    pub fn fit(x: &[f64], y: &[f64]) -> Result<TrainedLinearRegression> {
        if x.len() != y.len() {
            return Err(PipelineError::ModelFit(
                "regression inputs have different lengths".to_string(),
            ));
        }
        if x.len() < 2 {
            return Err(PipelineError::ModelFit(format!(
                "regression needs at least 2 observations, got {}",
                x.len()
            )));
        }

        let mean_x = x.mean();
        let mean_y = y.mean();

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (xi, yi) in x.iter().zip(y.iter()) {
            let dx = xi - mean_x;
            let dy = yi - mean_y;
            sxx += dx * dx;
            sxy += dx * dy;
            syy += dy * dy;
        }

        if sxx == 0.0 {
            return Err(PipelineError::ModelFit(
                "CPI level has zero variance, regression line is undetermined".to_string(),
            ));
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let r_squared = if syy == 0.0 { 1.0 } else { (sxy * sxy) / (sxx * syy) };

        Ok(TrainedLinearRegression {
            slope,
            intercept,
            r_squared,
        })
    }

    /// Evaluate the fitted line at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }
}
