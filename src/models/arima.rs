//! ARIMA forecasting with automatic order selection
//!
//! Orders are searched over a bounded (p, d, q) grid and ranked by AIC. Pure
//! AR terms are estimated by conditional least squares, pure MA terms by an
//! iterative residual regression, and mixed ARMA terms by the two-stage
//! Hannan-Rissanen procedure. Estimation runs on the mean-centered
//! differenced series; forecasts are re-integrated back to price units.

use crate::error::{PipelineError, Result};
use crate::merge::MergedSeries;
use crate::models::InflationModel;
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// Floor for the residual variance, so a perfect in-sample fit still yields a
/// finite log-likelihood.
const SIGMA2_FLOOR: f64 = 1e-12;

/// Non-seasonal ARIMA order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Observations required to attempt a fit of this order
    pub fn min_observations(self) -> usize {
        self.p + self.d + self.q + 8
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

/// Automatic ARIMA order search over the close series.
///
/// Univariate: only the close series' own autocorrelation structure is
/// modeled, CPI is not an exogenous regressor.
#[derive(Debug, Clone)]
pub struct AutoArima {
    max_p: usize,
    max_d: usize,
    max_q: usize,
}

impl Default for AutoArima {
    fn default() -> Self {
        Self {
            max_p: 3,
            max_d: 2,
            max_q: 3,
        }
    }
}

impl AutoArima {
    pub fn new(max_p: usize, max_d: usize, max_q: usize) -> Self {
        Self { max_p, max_d, max_q }
    }
}

impl InflationModel for AutoArima {
    type Trained = TrainedArima;

    /// Fit every order in the grid and keep the lowest-AIC model
    fn train(&self, data: &MergedSeries) -> Result<TrainedArima> {
        let closes = data.closes();
        let mut best: Option<TrainedArima> = None;

        for d in 0..=self.max_d {
            for p in 0..=self.max_p {
                for q in 0..=self.max_q {
                    if p == 0 && q == 0 {
                        continue;
                    }
                    let order = ArimaOrder::new(p, d, q);
                    if let Ok(model) = TrainedArima::fit(&closes, order) {
                        if best.as_ref().map_or(true, |b| model.aic() < b.aic()) {
                            best = Some(model);
                        }
                    }
                }
            }
        }

        best.ok_or_else(|| {
            PipelineError::ModelFit(format!(
                "no ARIMA order could be fitted to {} observations",
                closes.len()
            ))
        })
    }

    fn name(&self) -> &str {
        "ARIMA (auto)"
    }
}

/// Fitted ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArima {
    order: ArimaOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    /// Mean of the differenced series; estimation is done on centered values
    mean: f64,
    sigma2: f64,
    aic: f64,
    /// Original (undifferenced) series, for re-integration
    levels: Vec<f64>,
    /// Centered differenced series the coefficients were estimated on
    centered: Vec<f64>,
    /// Estimation residuals, aligned so the last element matches the last
    /// centered observation
    residuals: Vec<f64>,
}

impl TrainedArima {
    /// Fit a single fixed order
    pub fn fit(series: &[f64], order: ArimaOrder) -> Result<TrainedArima> {
        if series.len() < order.min_observations() {
            return Err(PipelineError::ModelFit(format!(
                "insufficient observations for {}: need at least {}, got {}",
                order,
                order.min_observations(),
                series.len()
            )));
        }

        let diffed = difference(series, order.d);
        let n = diffed.len();
        if n < order.p.max(order.q) + 4 {
            return Err(PipelineError::ModelFit(format!(
                "series too short after differencing for {}",
                order
            )));
        }

        let mean = diffed.iter().sum::<f64>() / n as f64;
        let centered: Vec<f64> = diffed.iter().map(|v| v - mean).collect();

        let (ar, ma, residuals) = if order.q == 0 {
            let (ar, residuals) = estimate_ar(&centered, order.p)?;
            (ar, Vec::new(), residuals)
        } else if order.p == 0 {
            let (ma, residuals) = estimate_ma(&centered, order.q)?;
            (Vec::new(), ma, residuals)
        } else {
            estimate_arma(&centered, order.p, order.q)?
        };

        if residuals.is_empty() {
            return Err(PipelineError::ModelFit(format!(
                "no residual degrees of freedom for {}",
                order
            )));
        }

        let m = residuals.len() as f64;
        let sigma2 =
            (residuals.iter().map(|r| r * r).sum::<f64>() / m).max(SIGMA2_FLOOR);
        let k = (order.p + order.q + 1) as f64;
        let log_likelihood =
            -0.5 * m * (1.0 + (2.0 * std::f64::consts::PI * sigma2).ln());
        let aic = -2.0 * log_likelihood + 2.0 * k;

        Ok(TrainedArima {
            order,
            ar,
            ma,
            mean,
            sigma2,
            aic,
            levels: series.to_vec(),
            centered,
            residuals,
        })
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    /// Forecast `horizon` steps ahead, in the units of the original series.
    ///
    /// Future shocks enter at their expectation of zero; differencing is
    /// undone level by level from the tail of the training series.
    pub fn forecast(&self, horizon: usize) -> Vec<f64> {
        let d = self.order.d;
        let mut tails: Vec<f64> = (0..d)
            .map(|k| {
                difference(&self.levels, k)
                    .last()
                    .copied()
                    .unwrap_or_default()
            })
            .collect();

        let mut history = self.centered.clone();
        let mut residuals = self.residuals.clone();
        let mut forecasts = Vec::with_capacity(horizon);

        for _ in 0..horizon {
            let mut value = 0.0;
            for (i, phi) in self.ar.iter().enumerate() {
                if history.len() > i {
                    value += phi * history[history.len() - 1 - i];
                }
            }
            for (i, theta) in self.ma.iter().enumerate() {
                if residuals.len() > i {
                    value += theta * residuals[residuals.len() - 1 - i];
                }
            }
            history.push(value);
            residuals.push(0.0);

            let mut level = value + self.mean;
            for k in (0..d).rev() {
                level += tails[k];
                tails[k] = level;
            }
            forecasts.push(level);
        }

        forecasts
    }

    /// One-step-ahead point forecast
    pub fn forecast_next(&self) -> f64 {
        self.forecast(1)
            .into_iter()
            .next()
            .unwrap_or_else(|| self.levels.last().copied().unwrap_or_default())
    }
}

/// Difference a series `d` times
fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() < 2 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Conditional least squares for a pure AR(p) on a centered series.
///
/// Returns the coefficients and the residuals for t = p..n.
fn estimate_ar(centered: &[f64], p: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = centered.len();
    if p == 0 || n < 2 * p + 2 {
        return Err(PipelineError::ModelFit(format!(
            "too few observations ({}) for AR({})",
            n, p
        )));
    }

    let rows = n - p;
    let mut design = Vec::with_capacity(rows * p);
    for t in p..n {
        for i in 1..=p {
            design.push(centered[t - i]);
        }
    }

    let x = DMatrix::from_row_slice(rows, p, &design);
    let y = DVector::from_iterator(rows, centered[p..].iter().copied());

    let beta = solve_least_squares(&x, &y)?;
    let fitted = &x * &beta;
    let residuals: Vec<f64> = (y - fitted).iter().copied().collect();

    Ok((beta.iter().copied().collect(), residuals))
}

/// Iterative estimation of a pure MA(q) on a centered series.
///
/// Residuals are recomputed against the current coefficients each round until
/// the coefficient vector stops moving.
fn estimate_ma(centered: &[f64], q: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = centered.len();
    if q == 0 || n < q + 4 {
        return Err(PipelineError::ModelFit(format!(
            "too few observations ({}) for MA({})",
            n, q
        )));
    }

    let mut coefficients = vec![0.0; q];
    let max_iterations = 100;
    let tolerance = 1e-6;

    for _ in 0..max_iterations {
        let residuals = ma_residuals(centered, &coefficients);

        let mut updated = vec![0.0; q];
        for i in 0..q {
            let mut numerator = 0.0;
            let mut denominator = 0.0;
            for t in (i + 1)..n {
                let lagged = residuals[t - i - 1];
                numerator += centered[t] * lagged;
                denominator += lagged * lagged;
            }
            if denominator > 0.0 {
                updated[i] = numerator / denominator;
            }
        }

        let movement: f64 = coefficients
            .iter()
            .zip(updated.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        coefficients = updated;
        if movement < tolerance {
            break;
        }
    }

    let residuals = ma_residuals(centered, &coefficients);
    Ok((coefficients, residuals))
}

/// Recursive residuals of an MA model over the full series
fn ma_residuals(centered: &[f64], coefficients: &[f64]) -> Vec<f64> {
    let q = coefficients.len();
    let mut residuals = vec![0.0; centered.len()];
    for t in 0..centered.len() {
        let mut ma_part = 0.0;
        for i in 0..q {
            if t > i {
                ma_part += coefficients[i] * residuals[t - i - 1];
            }
        }
        residuals[t] = centered[t] - ma_part;
    }
    residuals
}

/// Two-stage Hannan-Rissanen estimation of a mixed ARMA(p, q).
///
/// Stage one fits a long AR to approximate the innovations; stage two
/// regresses on lagged values and lagged approximate innovations jointly.
fn estimate_arma(
    centered: &[f64],
    p: usize,
    q: usize,
) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
    let n = centered.len();
    let long_order = (p + q).max(8).min(n.saturating_sub(2) / 3);
    if long_order == 0 {
        return Err(PipelineError::ModelFit(format!(
            "too few observations ({}) for ARMA({},{})",
            n, p, q
        )));
    }

    let (_, innovations) = estimate_ar(centered, long_order)?;
    // innovations[i] corresponds to centered[long_order + i]
    let start = p.max(long_order + q);
    if n <= start || n - start < p + q + 2 {
        return Err(PipelineError::ModelFit(format!(
            "too few observations ({}) for ARMA({},{})",
            n, p, q
        )));
    }

    let rows = n - start;
    let cols = p + q;
    let mut design = Vec::with_capacity(rows * cols);
    for t in start..n {
        for i in 1..=p {
            design.push(centered[t - i]);
        }
        for i in 1..=q {
            design.push(innovations[t - i - long_order]);
        }
    }

    let x = DMatrix::from_row_slice(rows, cols, &design);
    let y = DVector::from_iterator(rows, centered[start..].iter().copied());

    let beta = solve_least_squares(&x, &y)?;
    let fitted = &x * &beta;
    let residuals: Vec<f64> = (y - fitted).iter().copied().collect();

    let ar = beta.iter().take(p).copied().collect();
    let ma = beta.iter().skip(p).take(q).copied().collect();
    Ok((ar, ma, residuals))
}

/// Solve the normal equations for an OLS problem
fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<DVector<f64>> {
    let xtx = x.transpose() * x;
    let xty = x.transpose() * y;
    let inverse = xtx.try_inverse().ok_or_else(|| {
        PipelineError::ModelFit("singular normal equations in ARIMA estimation".to_string())
    })?;
    Ok(inverse * xty)
}
