use chrono::NaiveDate;
use cpi_trade::data::DataLoader;
use cpi_trade::error::PipelineError;
use cpi_trade::tenure::Tenure;
use rstest::rstest;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn loads_stock_csv_named_after_file_stem() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "AAPL.csv",
        "Date,Open,Close,Volume\n\
         2023-01-01,99.0,103.0,1000\n\
         2023-02-01,103.0,106.0,1200\n\
         2023-03-01,106.0,108.0,1500\n",
    );

    let stock = DataLoader::load_stock(&path).unwrap();
    assert_eq!(stock.name(), "AAPL");
    assert_eq!(stock.len(), 3);
    assert_eq!(stock.closes()[0], Some(103.0));
    assert_eq!(stock.dates()[2], date(2023, 3, 1));
}

#[test]
fn loads_cpi_csv_preserving_missing_values() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "CPI.csv",
        "Date,CPI\n\
         2023-01-01,100.0\n\
         2023-02-01,\n\
         2023-03-01,104.0\n",
    );

    let cpi = DataLoader::load_cpi(&path).unwrap();
    assert_eq!(cpi.len(), 3);
    assert_eq!(cpi.values(), &[Some(100.0), None, Some(104.0)]);
}

#[test]
fn sorts_unsorted_rows_on_load() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "scrambled.csv",
        "Date,Close\n\
         2023-03-01,3.0\n\
         2023-01-01,1.0\n\
         2023-02-01,2.0\n",
    );

    let stock = DataLoader::load_stock(&path).unwrap();
    assert_eq!(
        stock.dates(),
        &[date(2023, 1, 1), date(2023, 2, 1), date(2023, 3, 1)]
    );
    assert_eq!(stock.closes(), &[Some(1.0), Some(2.0), Some(3.0)]);
}

#[test]
fn missing_file_is_a_load_error() {
    let result = DataLoader::load_cpi("definitely_not_here.csv");
    assert!(matches!(result, Err(PipelineError::Load(_))));
}

#[test]
fn file_without_date_column_is_a_load_error() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "no_dates.csv",
        "Close,Volume\n10.0,100\n11.0,200\n",
    );
    let result = DataLoader::load_stock(&path);
    assert!(matches!(result, Err(PipelineError::Load(_))));
}

#[test]
fn file_without_close_column_is_a_load_error() {
    let dir = tempdir().unwrap();
    let path = write_file(dir.path(), "no_close.csv", "Date,Volume\n2023-01-01,100\n");
    let result = DataLoader::load_stock(&path);
    assert!(matches!(result, Err(PipelineError::Load(_))));
}

#[test]
fn duplicate_dates_are_a_load_error() {
    let dir = tempdir().unwrap();
    let path = write_file(
        dir.path(),
        "dups.csv",
        "Date,Close\n2023-01-01,1.0\n2023-01-01,2.0\n",
    );
    let result = DataLoader::load_stock(&path);
    assert!(matches!(result, Err(PipelineError::Load(_))));
}

#[test]
fn discover_stocks_finds_only_csv_files_in_order() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "zeta.csv", "Date,Close\n2023-01-01,1.0\n");
    write_file(dir.path(), "alpha.csv", "Date,Close\n2023-01-01,1.0\n");
    write_file(dir.path(), "notes.txt", "not a data file\n");

    let files = DataLoader::discover_stocks(dir.path()).unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["alpha.csv", "zeta.csv"]);
}

#[test]
fn discover_stocks_missing_directory_is_a_load_error() {
    let result = DataLoader::discover_stocks("no_such_directory");
    assert!(matches!(result, Err(PipelineError::Load(_))));
}

#[rstest]
#[case(Tenure::OneYear, 2022)]
#[case(Tenure::ThreeYears, 2020)]
#[case(Tenure::FiveYears, 2018)]
#[case(Tenure::TenYears, 2013)]
fn tenure_windows_subtract_whole_years(#[case] tenure: Tenure, #[case] start_year: i32) {
    let end = date(2023, 11, 1);
    let (start, window_end) = tenure.window(end);
    assert_eq!(start, date(start_year, 11, 1));
    assert_eq!(window_end, end);
}
