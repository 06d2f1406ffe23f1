//! Forecasting models fitted over the merged stock/CPI series

use crate::error::Result;
use crate::merge::MergedSeries;
use std::fmt::Debug;

/// A model specification that can be fitted to a merged series.
///
/// Fitting consumes only the merged rows; what a trained model predicts from
/// (a CPI scenario, its own history) is specific to the trained type, so the
/// prediction surface lives on `Self::Trained` rather than on this trait.
pub trait InflationModel: Debug {
    /// The fitted model produced by training
    type Trained;

    /// Fit the model to the merged series
    fn train(&self, data: &MergedSeries) -> Result<Self::Trained>;

    /// Name of the model, for display
    fn name(&self) -> &str;
}

pub mod arima;
pub mod garch;
pub mod linear_regression;

pub use arima::{ArimaOrder, AutoArima, TrainedArima};
pub use garch::{Garch, TrainedGarch};
pub use linear_regression::{LinearRegression, TrainedLinearRegression};
