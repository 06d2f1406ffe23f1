//! Analysis configuration: input locations and the reference end date

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for a batch analysis run.
///
/// The reference end date anchors the tenure window. It is deliberately a
/// configured value, never derived from the loaded data or the wall clock,
/// so the same inputs always produce the same window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Path of the CPI series file
    pub cpi_path: PathBuf,
    /// Directory holding one CSV file per instrument
    pub stock_dir: PathBuf,
    /// Latest date assumed present in the data; upper bound of every tenure window
    pub reference_end_date: NaiveDate,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cpi_path: PathBuf::from("CPI.csv"),
            stock_dir: PathBuf::from("stock_folder"),
            // Last date available in the original data set.
            reference_end_date: NaiveDate::from_ymd_opt(2023, 11, 1)
                .expect("valid constant date"),
        }
    }
}

impl AnalysisConfig {
    /// Read a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref()).map_err(|e| {
            PipelineError::Load(format!(
                "cannot read config '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        serde_json::from_str(&text).map_err(|e| {
            PipelineError::Load(format!(
                "invalid config '{}': {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Load a configuration from the given path, falling back to
    /// `cpi_trade.json` in the working directory, then to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let fallback = Path::new("cpi_trade.json");
                if fallback.exists() {
                    Self::from_file(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = AnalysisConfig::default();
        assert_eq!(config.cpi_path, PathBuf::from("CPI.csv"));
        assert_eq!(config.stock_dir, PathBuf::from("stock_folder"));
        assert_eq!(
            config.reference_end_date,
            NaiveDate::from_ymd_opt(2023, 11, 1).unwrap()
        );
    }

    #[test]
    fn json_round_trip() {
        let config = AnalysisConfig {
            cpi_path: PathBuf::from("data/cpi.csv"),
            stock_dir: PathBuf::from("data/stocks"),
            reference_end_date: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let parsed: AnalysisConfig =
            serde_json::from_str(r#"{"cpi_path": "other.csv"}"#).unwrap();
        assert_eq!(parsed.cpi_path, PathBuf::from("other.csv"));
        assert_eq!(parsed.stock_dir, AnalysisConfig::default().stock_dir);
    }
}
