//! Loading CPI and per-stock price series from CSV files

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Date formats accepted in textual date columns
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y"];

/// Consumer Price Index series.
///
/// Dates are strictly increasing and unique after load. Missing CPI cells are
/// kept as `None` so the merge step can drop them with a warning.
#[derive(Debug, Clone)]
pub struct CpiSeries {
    dates: Vec<NaiveDate>,
    values: Vec<Option<f64>>,
}

impl CpiSeries {
    /// Build a series from parallel date/value vectors, sorting by date and
    /// rejecting duplicate dates.
    pub fn from_parts(dates: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Result<Self> {
        let (dates, values) = sort_by_date(dates, values, "CPI")?;
        Ok(Self { dates, values })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Look up the CPI value for a date. Outer `None` means the date is not
    /// in the series; `Some(None)` means the date exists but its value is
    /// missing.
    pub fn lookup(&self, date: NaiveDate) -> Option<Option<f64>> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }
}

/// One instrument's closing-price series, paired with the name of the file it
/// came from. The pairing is explicit so the name travels with the data
/// through the whole pipeline.
#[derive(Debug, Clone)]
pub struct StockSeries {
    name: String,
    dates: Vec<NaiveDate>,
    closes: Vec<Option<f64>>,
}

impl StockSeries {
    /// Build a series from parallel date/close vectors, sorting by date and
    /// rejecting duplicate dates.
    pub fn from_parts(
        name: impl Into<String>,
        dates: Vec<NaiveDate>,
        closes: Vec<Option<f64>>,
    ) -> Result<Self> {
        let name = name.into();
        let (dates, closes) = sort_by_date(dates, closes, &name)?;
        Ok(Self {
            name,
            dates,
            closes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn closes(&self) -> &[Option<f64>] {
        &self.closes
    }

    /// Keep only rows whose date lies in the inclusive `[start, end]` window
    pub fn restrict(&self, start: NaiveDate, end: NaiveDate) -> StockSeries {
        let mut dates = Vec::new();
        let mut closes = Vec::new();
        for (date, close) in self.dates.iter().zip(self.closes.iter()) {
            if *date >= start && *date <= end {
                dates.push(*date);
                closes.push(*close);
            }
        }
        StockSeries {
            name: self.name.clone(),
            dates,
            closes,
        }
    }
}

/// Loader for CPI and stock CSV files
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load the CPI series from a CSV file with `Date` and `CPI` columns
    pub fn load_cpi<P: AsRef<Path>>(path: P) -> Result<CpiSeries> {
        let df = Self::read_frame(path.as_ref())?;
        let dates = date_column(&df)?;
        let cpi_name = find_column(&df, &["cpi"]).ok_or_else(|| {
            PipelineError::Load(format!(
                "no CPI column in '{}'",
                path.as_ref().display()
            ))
        })?;
        let values = numeric_column(&df, &cpi_name)?;
        CpiSeries::from_parts(dates, values)
    }

    /// Load one instrument from a CSV file with `Date` and `Close` columns.
    /// The series is named after the file stem.
    pub fn load_stock<P: AsRef<Path>>(path: P) -> Result<StockSeries> {
        let path = path.as_ref();
        let df = Self::read_frame(path)?;
        let dates = date_column(&df)?;
        let close_name = find_column(&df, &["close", "price"]).ok_or_else(|| {
            PipelineError::Load(format!("no Close column in '{}'", path.display()))
        })?;
        let closes = numeric_column(&df, &close_name)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        StockSeries::from_parts(name, dates, closes)
    }

    /// Enumerate every CSV file in a directory, one instrument per file, in
    /// lexicographic order so the summary table is stable across runs.
    pub fn discover_stocks<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            PipelineError::Load(format!(
                "cannot read stock directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_csv = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false);
            if path.is_file() && is_csv {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn read_frame(path: &Path) -> Result<DataFrame> {
        let file = File::open(path).map_err(|e| {
            PipelineError::Load(format!("cannot open '{}': {}", path.display(), e))
        })?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;
        Ok(df)
    }
}

/// Sort parallel vectors by date, rejecting duplicate dates
fn sort_by_date<T: Copy>(
    dates: Vec<NaiveDate>,
    values: Vec<T>,
    label: &str,
) -> Result<(Vec<NaiveDate>, Vec<T>)> {
    if dates.len() != values.len() {
        return Err(PipelineError::Load(format!(
            "{}: date and value columns have different lengths",
            label
        )));
    }

    let mut rows: Vec<(NaiveDate, T)> = dates.into_iter().zip(values).collect();
    rows.sort_by_key(|(date, _)| *date);

    for pair in rows.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(PipelineError::Load(format!(
                "{}: duplicate date {}",
                label, pair[0].0
            )));
        }
    }

    Ok(rows.into_iter().unzip())
}

/// Find the first column whose lowercase name contains one of the needles,
/// checking exact matches before substring matches.
fn find_column(df: &DataFrame, needles: &[&str]) -> Option<String> {
    let names = df.get_column_names();
    for needle in needles {
        for name in &names {
            if name.to_lowercase() == *needle {
                return Some(name.to_string());
            }
        }
        for name in &names {
            if name.to_lowercase().contains(needle) {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Extract and decode the date column of a frame
fn date_column(df: &DataFrame) -> Result<Vec<NaiveDate>> {
    let name = find_column(df, &["date", "time", "timestamp"])
        .ok_or_else(|| PipelineError::Load("no date column found in data".to_string()))?;
    let col = df.column(&name)?;

    match col.dtype() {
        DataType::Utf8 => col
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| {
                let text = cell.ok_or_else(|| {
                    PipelineError::Load(format!("missing date in row {}", row + 1))
                })?;
                parse_date(text).ok_or_else(|| {
                    PipelineError::Load(format!("unparseable date '{}' in row {}", text, row + 1))
                })
            })
            .collect(),
        DataType::Date => col
            .date()?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| {
                let days = cell.ok_or_else(|| {
                    PipelineError::Load(format!("missing date in row {}", row + 1))
                })?;
                Ok(epoch_date() + chrono::Duration::days(days as i64))
            })
            .collect(),
        DataType::Datetime(unit, _) => {
            let per_day: i64 = match unit {
                TimeUnit::Nanoseconds => 86_400_000_000_000,
                TimeUnit::Microseconds => 86_400_000_000,
                TimeUnit::Milliseconds => 86_400_000,
            };
            col.datetime()?
                .into_iter()
                .enumerate()
                .map(|(row, cell)| {
                    let ticks = cell.ok_or_else(|| {
                        PipelineError::Load(format!("missing date in row {}", row + 1))
                    })?;
                    Ok(epoch_date() + chrono::Duration::days(ticks.div_euclid(per_day)))
                })
                .collect()
        }
        other => Err(PipelineError::Load(format!(
            "column '{}' has unsupported date type {:?}",
            name, other
        ))),
    }
}

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid constant date")
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    None
}

/// Extract a numeric column, preserving nulls as `None`
fn numeric_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let col = df
        .column(name)
        .map_err(|e| PipelineError::Load(format!("column '{}' not found: {}", name, e)))?;

    match col.dtype() {
        DataType::Float64 => Ok(col.f64()?.into_iter().collect()),
        DataType::Float32 => Ok(col
            .f32()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        DataType::Int64 => Ok(col
            .i64()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        DataType::Int32 => Ok(col
            .i32()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        DataType::UInt64 => Ok(col
            .u64()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        DataType::UInt32 => Ok(col
            .u32()?
            .into_iter()
            .map(|v| v.map(|v| v as f64))
            .collect()),
        _ => Err(PipelineError::Load(format!(
            "column '{}' cannot be converted to f64",
            name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn from_parts_sorts_by_date() {
        let series = StockSeries::from_parts(
            "test",
            vec![date(2023, 3, 1), date(2023, 1, 1), date(2023, 2, 1)],
            vec![Some(3.0), Some(1.0), Some(2.0)],
        )
        .unwrap();
        assert_eq!(series.closes(), &[Some(1.0), Some(2.0), Some(3.0)]);
    }

    #[test]
    fn from_parts_rejects_duplicate_dates() {
        let result = CpiSeries::from_parts(
            vec![date(2023, 1, 1), date(2023, 1, 1)],
            vec![Some(100.0), Some(101.0)],
        );
        assert!(matches!(result, Err(PipelineError::Load(_))));
    }

    #[test]
    fn lookup_distinguishes_absent_from_missing() {
        let series = CpiSeries::from_parts(
            vec![date(2023, 1, 1), date(2023, 2, 1)],
            vec![Some(100.0), None],
        )
        .unwrap();
        assert_eq!(series.lookup(date(2023, 1, 1)), Some(Some(100.0)));
        assert_eq!(series.lookup(date(2023, 2, 1)), Some(None));
        assert_eq!(series.lookup(date(2023, 3, 1)), None);
    }

    #[test]
    fn restrict_is_inclusive_on_both_bounds() {
        let series = StockSeries::from_parts(
            "test",
            vec![
                date(2022, 12, 31),
                date(2023, 1, 1),
                date(2023, 6, 1),
                date(2023, 11, 1),
                date(2023, 11, 2),
            ],
            vec![Some(1.0); 5],
        )
        .unwrap();
        let windowed = series.restrict(date(2023, 1, 1), date(2023, 11, 1));
        assert_eq!(
            windowed.dates(),
            &[date(2023, 1, 1), date(2023, 6, 1), date(2023, 11, 1)]
        );
    }

    #[test]
    fn parses_supported_date_formats() {
        assert_eq!(parse_date("2023-01-05"), Some(date(2023, 1, 5)));
        assert_eq!(parse_date("2023-01-05 00:00:00"), Some(date(2023, 1, 5)));
        assert_eq!(parse_date("1/5/2023"), Some(date(2023, 1, 5)));
        assert_eq!(parse_date("5 Jan 2023"), None);
    }
}
