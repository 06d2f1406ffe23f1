//! Training-window tenures

use crate::error::{PipelineError, Result};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trailing window of historical data used to train the models.
///
/// The set of tenures is fixed; each maps to a whole number of calendar years
/// ending at the configured reference end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tenure {
    OneYear,
    ThreeYears,
    FiveYears,
    TenYears,
}

impl Tenure {
    /// All tenures, in the order the selector presents them
    pub const ALL: [Tenure; 4] = [
        Tenure::OneYear,
        Tenure::ThreeYears,
        Tenure::FiveYears,
        Tenure::TenYears,
    ];

    /// Number of years the window spans
    pub fn years(self) -> u32 {
        match self {
            Tenure::OneYear => 1,
            Tenure::ThreeYears => 3,
            Tenure::FiveYears => 5,
            Tenure::TenYears => 10,
        }
    }

    /// Label shown in the tenure selector
    pub fn label(self) -> &'static str {
        match self {
            Tenure::OneYear => "1 year",
            Tenure::ThreeYears => "3 years",
            Tenure::FiveYears => "5 years",
            Tenure::TenYears => "10 years",
        }
    }

    /// Inclusive `[start, end]` window ending at `end_date`
    pub fn window(self, end_date: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = end_date
            .checked_sub_months(Months::new(self.years() * 12))
            .unwrap_or(NaiveDate::MIN);
        (start, end_date)
    }
}

impl fmt::Display for Tenure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tenure {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "1 year" | "1 years" | "1y" => Ok(Tenure::OneYear),
            "3" | "3 years" | "3 year" | "3y" => Ok(Tenure::ThreeYears),
            "5" | "5 years" | "5 year" | "5y" => Ok(Tenure::FiveYears),
            "10" | "10 years" | "10 year" | "10y" => Ok(Tenure::TenYears),
            other => Err(PipelineError::InvalidParameter(format!(
                "unknown tenure '{}', expected one of 1, 3, 5 or 10 years",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_digits() {
        assert_eq!("1 year".parse::<Tenure>().unwrap(), Tenure::OneYear);
        assert_eq!("3 years".parse::<Tenure>().unwrap(), Tenure::ThreeYears);
        assert_eq!("5".parse::<Tenure>().unwrap(), Tenure::FiveYears);
        assert_eq!("10Y".parse::<Tenure>().unwrap(), Tenure::TenYears);
        assert!("2 years".parse::<Tenure>().is_err());
    }

    #[test]
    fn window_subtracts_calendar_years() {
        let end = NaiveDate::from_ymd_opt(2023, 11, 1).unwrap();
        let (start, window_end) = Tenure::ThreeYears.window(end);
        assert_eq!(start, NaiveDate::from_ymd_opt(2020, 11, 1).unwrap());
        assert_eq!(window_end, end);
    }

    #[test]
    fn display_matches_selector_labels() {
        let labels: Vec<String> = Tenure::ALL.iter().map(|t| t.to_string()).collect();
        assert_eq!(labels, ["1 year", "3 years", "5 years", "10 years"]);
    }
}
