//! Pearson correlation between closing prices and CPI measures

use crate::merge::MergedSeries;
use serde::Serialize;
use statrs::statistics::Statistics;

/// Pearson correlation coefficient of two equal-length samples.
///
/// Returns `None` whenever the coefficient is undefined: fewer than two
/// observations, mismatched lengths, or zero variance on either side. Never
/// returns NaN and never panics.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let mean_x = x.mean();
    let mean_y = y.mean();

    let mut covariance = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let r = covariance / (var_x.sqrt() * var_y.sqrt());
    r.is_finite().then_some(r)
}

/// The two informational correlations reported per stock
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CorrelationReport {
    /// Close vs. period-over-period CPI change
    pub close_vs_cpi_change: Option<f64>,
    /// Close vs. raw CPI level
    pub close_vs_cpi_level: Option<f64>,
}

impl CorrelationReport {
    pub fn compute(merged: &MergedSeries) -> CorrelationReport {
        let closes = merged.closes();
        CorrelationReport {
            close_vs_cpi_change: pearson(&closes, &merged.cpi_changes()),
            close_vs_cpi_level: pearson(&closes, &merged.cpi_levels()),
        }
    }
}
