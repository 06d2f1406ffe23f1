//! # CPI Trade
//!
//! A Rust library for correlating equity closing prices with Consumer Price
//! Index (CPI) data and projecting next-period prices under a user-supplied
//! expected-inflation scenario.
//!
//! ## Features
//!
//! - CSV ingestion of one CPI series and a folder of per-stock price series
//! - Trailing tenure windows (1/3/5/10 years) anchored at a configured
//!   reference end date
//! - Inner-join merge on date with period-over-period CPI change
//! - NaN-safe Pearson correlations (close vs. CPI change, close vs. CPI level)
//! - Three independent one-step-ahead forecasters: OLS regression, ARIMA with
//!   automatic order selection, GARCH(1,1) volatility
//! - Per-stock and per-model failure isolation: one bad input never takes
//!   down the rest of the batch
//!
//! ## Quick Start
//!
//! ```no_run
//! use cpi_trade::analysis::{run_batch, ScenarioParams};
//! use cpi_trade::config::AnalysisConfig;
//! use cpi_trade::tenure::Tenure;
//!
//! fn main() -> cpi_trade::Result<()> {
//!     let config = AnalysisConfig::default();
//!     let scenario = ScenarioParams::new(0.03, Tenure::ThreeYears)?;
//!
//!     let summary = run_batch(&config, &scenario)?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod correlation;
pub mod data;
pub mod error;
pub mod merge;
pub mod models;
pub mod tenure;

// Re-export commonly used types
pub use crate::analysis::{
    analyze_stock, run_batch, AnalysisResult, ScenarioParams, StockOutcome, SummaryTable,
};
pub use crate::config::AnalysisConfig;
pub use crate::correlation::CorrelationReport;
pub use crate::data::{CpiSeries, DataLoader, StockSeries};
pub use crate::error::{PipelineError, Result};
pub use crate::merge::MergedSeries;
pub use crate::tenure::Tenure;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
