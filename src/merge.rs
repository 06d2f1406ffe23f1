//! Joining stock and CPI series and deriving the CPI change feature

use crate::data::{CpiSeries, StockSeries};
use chrono::NaiveDate;

/// One fully-populated row of the merged series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergedRow {
    pub date: NaiveDate,
    pub close: f64,
    pub cpi: f64,
    /// Fractional change of CPI from the prior retained row
    pub cpi_change: f64,
}

/// Inner join of a stock series and the CPI series on date, with the CPI
/// period-over-period change computed across retained rows.
///
/// Construction mirrors the merge step's row discipline: rows whose CPI value
/// is missing are dropped first (counted, so the caller can surface a
/// warning), the change is computed over what remains, and the first retained
/// row — which has no prior CPI to change from — is dropped along with any
/// row still missing a close. No row in the result contains a missing value.
#[derive(Debug, Clone)]
pub struct MergedSeries {
    rows: Vec<MergedRow>,
    dropped_nan: usize,
}

impl MergedSeries {
    /// Join `stock` and `cpi` on exact date equality
    pub fn build(stock: &StockSeries, cpi: &CpiSeries) -> MergedSeries {
        // Inner join; close stays optional until the final drop, so a row
        // missing its close still anchors the next row's CPI change.
        let mut joined: Vec<(NaiveDate, Option<f64>, f64)> = Vec::new();
        let mut dropped_nan = 0usize;

        for (date, close) in stock.dates().iter().zip(stock.closes().iter()) {
            match cpi.lookup(*date) {
                Some(Some(value)) => joined.push((*date, *close, value)),
                Some(None) => dropped_nan += 1,
                None => {}
            }
        }

        let mut rows = Vec::with_capacity(joined.len().saturating_sub(1));
        for (i, (date, close, cpi_value)) in joined.iter().enumerate() {
            if i == 0 {
                continue;
            }
            let close = match close {
                Some(c) => *c,
                None => continue,
            };
            let prior = joined[i - 1].2;
            rows.push(MergedRow {
                date: *date,
                close,
                cpi: *cpi_value,
                cpi_change: (cpi_value - prior) / prior,
            });
        }

        MergedSeries { rows, dropped_nan }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    /// Number of joined rows discarded for a missing CPI value
    pub fn dropped_nan(&self) -> usize {
        self.dropped_nan
    }

    pub fn closes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.close).collect()
    }

    pub fn cpi_levels(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.cpi).collect()
    }

    pub fn cpi_changes(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.cpi_change).collect()
    }

    /// Close of the most recent merged row
    pub fn latest_close(&self) -> Option<f64> {
        self.rows.last().map(|r| r.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CpiSeries, StockSeries};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly_dates(n: usize) -> Vec<NaiveDate> {
        (0..n).map(|i| date(2023, i as u32 + 1, 1)).collect()
    }

    #[test]
    fn missing_cpi_anchors_next_change_before_dropping() {
        // CPI 100, missing, 104: the missing row is dropped with a warning
        // and the change at the last row is measured against 100.
        let cpi = CpiSeries::from_parts(
            monthly_dates(3),
            vec![Some(100.0), None, Some(104.0)],
        )
        .unwrap();
        let stock = StockSeries::from_parts(
            "test",
            monthly_dates(3),
            vec![Some(10.0), Some(11.0), Some(12.0)],
        )
        .unwrap();

        let merged = MergedSeries::build(&stock, &cpi);
        assert_eq!(merged.dropped_nan(), 1);
        assert_eq!(merged.len(), 1);
        let row = merged.rows()[0];
        assert_eq!(row.date, date(2023, 3, 1));
        assert!((row.cpi_change - 0.04).abs() < 1e-12);
    }

    #[test]
    fn missing_close_drops_row_but_keeps_cpi_chain() {
        let cpi = CpiSeries::from_parts(
            monthly_dates(3),
            vec![Some(100.0), Some(102.0), Some(103.02)],
        )
        .unwrap();
        let stock = StockSeries::from_parts(
            "test",
            monthly_dates(3),
            vec![Some(10.0), None, Some(12.0)],
        )
        .unwrap();

        let merged = MergedSeries::build(&stock, &cpi);
        // Row 2 lost its close, but its CPI still anchors row 3's change.
        assert_eq!(merged.len(), 1);
        let row = merged.rows()[0];
        assert_eq!(row.close, 12.0);
        assert!((row.cpi_change - 0.01).abs() < 1e-12);
        assert_eq!(merged.dropped_nan(), 0);
    }
}
