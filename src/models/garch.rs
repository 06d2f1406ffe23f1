//! GARCH volatility model fitted by numerical maximum likelihood
//!
//! The series is demeaned with a constant mean, then (omega, alpha, beta) are
//! estimated by gradient ascent on the Gaussian log-likelihood with numerical
//! gradients, projecting back into the stationarity region when the
//! persistence drifts toward one. Optimization runs on variance-normalized
//! residuals so the step sizes are independent of the input scale; omega and
//! the conditional variances are scaled back afterwards.

use crate::error::{PipelineError, Result};
use crate::merge::MergedSeries;
use crate::models::InflationModel;

const MAX_ITERATIONS: usize = 500;
const LEARNING_RATE: f64 = 0.001;
const GRADIENT_EPS: f64 = 1e-5;
const CONVERGENCE_TOL: f64 = 1e-6;

/// GARCH model specification; `garch11` is the one the ensemble uses
#[derive(Debug, Clone)]
pub struct Garch {
    p: usize,
    q: usize,
    name: String,
}

impl Garch {
    pub fn new(p: usize, q: usize) -> Result<Self> {
        if p == 0 || q == 0 {
            return Err(PipelineError::InvalidParameter(
                "GARCH orders must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            name: format!("GARCH({},{})", p, q),
            p,
            q,
        })
    }

    /// Standard GARCH(1,1)
    pub fn garch11() -> Self {
        Self {
            name: "GARCH(1,1)".to_string(),
            p: 1,
            q: 1,
        }
    }
}

impl InflationModel for Garch {
    type Trained = TrainedGarch;

    /// Fit to the close series directly, as the pipeline feeds prices (not
    /// returns) into the volatility model.
    fn train(&self, data: &MergedSeries) -> Result<TrainedGarch> {
        TrainedGarch::fit(&data.closes(), self.p, self.q)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Fitted GARCH model
#[derive(Debug, Clone)]
pub struct TrainedGarch {
    p: usize,
    q: usize,
    mu: f64,
    omega: f64,
    alpha: Vec<f64>,
    beta: Vec<f64>,
    /// In-sample conditional variances, same units as the squared input
    conditional_var: Vec<f64>,
    residuals: Vec<f64>,
    log_likelihood: f64,
    aic: f64,
}

impl TrainedGarch {
    pub fn fit(series: &[f64], p: usize, q: usize) -> Result<TrainedGarch> {
        let n = series.len();
        if n < p.max(q) + 10 {
            return Err(PipelineError::ModelFit(format!(
                "insufficient observations for GARCH({},{}): need at least {}, got {}",
                p,
                q,
                p.max(q) + 10,
                n
            )));
        }

        let mu = series.iter().sum::<f64>() / n as f64;
        let residuals: Vec<f64> = series.iter().map(|v| v - mu).collect();
        let unconditional_var =
            residuals.iter().map(|r| r * r).sum::<f64>() / n as f64;
        if unconditional_var <= 0.0 {
            return Err(PipelineError::ModelFit(
                "series has zero variance, volatility is undetermined".to_string(),
            ));
        }

        // Normalize to unit variance so the optimizer's step sizes work the
        // same for price-level and return-level inputs.
        let scale = unconditional_var.sqrt();
        let normalized: Vec<f64> = residuals.iter().map(|r| r / scale).collect();

        let (omega_norm, alpha, beta) = optimize(&normalized, p, q);

        let omega = omega_norm * unconditional_var;
        let conditional_var =
            conditional_variance(&residuals, omega, &alpha, &beta, unconditional_var);
        let log_likelihood = gaussian_log_likelihood(&residuals, &conditional_var);

        let k = (1 + q + p + 1) as f64; // omega + alphas + betas + mu
        let aic = -2.0 * log_likelihood + 2.0 * k;

        Ok(TrainedGarch {
            p,
            q,
            mu,
            omega,
            alpha,
            beta,
            conditional_var,
            residuals,
            log_likelihood,
            aic,
        })
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn beta(&self) -> &[f64] {
        &self.beta
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    pub fn aic(&self) -> f64 {
        self.aic
    }

    /// Sum of the ARCH and GARCH coefficients
    pub fn persistence(&self) -> f64 {
        self.alpha.iter().sum::<f64>() + self.beta.iter().sum::<f64>()
    }

    pub fn is_stationary(&self) -> bool {
        self.persistence() < 1.0
    }

    /// One-step-ahead conditional variance forecast
    pub fn next_variance(&self) -> f64 {
        let n = self.residuals.len();
        let mut variance = self.omega;
        for (i, alpha) in self.alpha.iter().enumerate() {
            if n > i {
                variance += alpha * self.residuals[n - 1 - i].powi(2);
            }
        }
        for (i, beta) in self.beta.iter().enumerate() {
            if n > i {
                variance += beta * self.conditional_var[n - 1 - i];
            }
        }
        variance.max(0.0)
    }

    /// Multi-step conditional variance forecast; beyond the first step the
    /// forecast decays geometrically toward the long-run variance.
    pub fn variance_forecast(&self, horizon: usize) -> Vec<f64> {
        let persistence = self.persistence();
        let long_run = if persistence < 1.0 {
            self.omega / (1.0 - persistence)
        } else {
            self.conditional_var.last().copied().unwrap_or(self.omega)
        };

        let mut forecasts = Vec::with_capacity(horizon);
        let mut variance = self.next_variance();
        for step in 0..horizon {
            if step > 0 {
                variance = long_run + persistence * (variance - long_run);
            }
            forecasts.push(variance.max(0.0));
        }
        forecasts
    }
}

/// Conditional variance recursion over the sample
fn conditional_variance(
    residuals: &[f64],
    omega: f64,
    alpha: &[f64],
    beta: &[f64],
    initial_var: f64,
) -> Vec<f64> {
    let n = residuals.len();
    let mut sigma2 = vec![initial_var; n];

    for t in 1..n {
        let mut variance = omega;
        for (i, a) in alpha.iter().enumerate() {
            if t > i {
                variance += a * residuals[t - 1 - i].powi(2);
            } else {
                variance += a * initial_var;
            }
        }
        for (i, b) in beta.iter().enumerate() {
            if t > i {
                variance += b * sigma2[t - 1 - i];
            } else {
                variance += b * initial_var;
            }
        }
        sigma2[t] = variance.max(1e-12);
    }

    sigma2
}

fn gaussian_log_likelihood(residuals: &[f64], sigma2: &[f64]) -> f64 {
    let mut ll = 0.0;
    for (r, s2) in residuals.iter().zip(sigma2.iter()) {
        if *s2 > 0.0 {
            ll -= 0.5 * (s2.ln() + r * r / s2);
        }
    }
    ll - 0.5 * residuals.len() as f64 * (2.0 * std::f64::consts::PI).ln()
}

/// Gradient ascent on the log-likelihood with numerical gradients.
///
/// Works on unit-variance residuals; coefficients are clamped to their valid
/// ranges each step and rescaled when the persistence approaches one.
fn optimize(residuals: &[f64], p: usize, q: usize) -> (f64, Vec<f64>, Vec<f64>) {
    let mut omega = 0.1;
    let mut alpha = vec![0.1; q];
    let mut beta = vec![0.8 / p as f64; p];

    let objective = |omega: f64, alpha: &[f64], beta: &[f64]| {
        let sigma2 = conditional_variance(residuals, omega, alpha, beta, 1.0);
        gaussian_log_likelihood(residuals, &sigma2)
    };

    let mut previous = f64::NEG_INFINITY;
    for _ in 0..MAX_ITERATIONS {
        let current = objective(omega, &alpha, &beta);
        if (current - previous).abs() < CONVERGENCE_TOL {
            break;
        }
        previous = current;

        let gradient = (objective(omega + GRADIENT_EPS, &alpha, &beta) - current)
            / GRADIENT_EPS;
        omega = (omega + LEARNING_RATE * gradient).max(1e-8);

        for i in 0..q {
            let mut bumped = alpha.clone();
            bumped[i] += GRADIENT_EPS;
            let gradient = (objective(omega, &bumped, &beta) - current) / GRADIENT_EPS;
            alpha[i] = (alpha[i] + LEARNING_RATE * gradient).clamp(0.0, 0.999);
        }

        for i in 0..p {
            let mut bumped = beta.clone();
            bumped[i] += GRADIENT_EPS;
            let gradient = (objective(omega, &alpha, &bumped) - current) / GRADIENT_EPS;
            beta[i] = (beta[i] + LEARNING_RATE * gradient).clamp(0.0, 0.999);
        }

        let persistence: f64 = alpha.iter().sum::<f64>() + beta.iter().sum::<f64>();
        if persistence >= 0.999 {
            let shrink = 0.99 / persistence;
            for a in &mut alpha {
                *a *= shrink;
            }
            for b in &mut beta {
                *b *= shrink;
            }
        }
    }

    (omega, alpha, beta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn synthetic_garch_returns(n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(7);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let (omega, alpha, beta) = (0.0001, 0.1, 0.85);

        let mut returns = Vec::with_capacity(n);
        let mut sigma2: f64 = omega / (1.0 - alpha - beta);
        for _ in 0..n {
            let shock: f64 = normal.sample(&mut rng);
            let r = sigma2.sqrt() * shock;
            returns.push(r);
            sigma2 = omega + alpha * r * r + beta * sigma2;
        }
        returns
    }

    #[test]
    fn fits_synthetic_garch_process() {
        let returns = synthetic_garch_returns(500);
        let model = TrainedGarch::fit(&returns, 1, 1).unwrap();

        assert!(model.is_stationary());
        assert!(model.omega() > 0.0);
        assert!(model.next_variance() > 0.0);
    }

    #[test]
    fn fits_price_level_series() {
        // The pipeline hands the model raw closes; the fit must still
        // produce a positive variance at that scale.
        let mut rng = StdRng::seed_from_u64(11);
        let normal = Normal::new(0.0, 1.5).unwrap();
        let mut price = 120.0;
        let prices: Vec<f64> = (0..200)
            .map(|_| {
                price += normal.sample(&mut rng);
                price
            })
            .collect();

        let model = TrainedGarch::fit(&prices, 1, 1).unwrap();
        assert!(model.next_variance() > 0.0);
    }

    #[test]
    fn variance_forecast_approaches_long_run() {
        let returns = synthetic_garch_returns(500);
        let model = TrainedGarch::fit(&returns, 1, 1).unwrap();
        let forecasts = model.variance_forecast(50);
        let long_run = model.omega() / (1.0 - model.persistence());
        let last = forecasts.last().copied().unwrap();
        assert!((last - long_run).abs() < (forecasts[0] - long_run).abs() + 1e-12);
    }

    #[test]
    fn rejects_degenerate_series() {
        assert!(TrainedGarch::fit(&[1.0, 2.0, 3.0], 1, 1).is_err());
        let flat = vec![5.0; 50];
        assert!(matches!(
            TrainedGarch::fit(&flat, 1, 1),
            Err(PipelineError::ModelFit(_))
        ));
    }
}
