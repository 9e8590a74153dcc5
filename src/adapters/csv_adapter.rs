//! CSV file series adapter.
//!
//! One file per instrument and timeframe: `<dir>/<CODE>_daily.csv` and
//! `<dir>/<CODE>_weekly.csv`. The header names the columns; `Date` and the
//! OHLCV columns are matched case-insensitively and every other column is
//! resolved through `Field::from_str`. Unknown columns are ignored.

use crate::domain::bar::{Field, IndicatorBar};
use crate::domain::error::ScoutError;
use crate::domain::series::IndicatorSeries;
use crate::ports::series_port::{SeriesPort, Timeframe};
use chrono::NaiveDate;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Column {
    Date,
    Open,
    High,
    Low,
    Close,
    Volume,
    Indicator(Field),
    Ignored,
}

impl Column {
    fn from_header(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "date" | "datetime" | "timestamp" => Column::Date,
            "open" => Column::Open,
            "high" => Column::High,
            "low" => Column::Low,
            "close" | "adj_close" => Column::Close,
            "volume" => Column::Volume,
            _ => name.parse::<Field>().map_or(Column::Ignored, Column::Indicator),
        }
    }
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str, timeframe: Timeframe) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", code, timeframe))
    }

    /// Parse one CSV document into date-sorted bars.
    pub fn parse(content: &str, source: &str) -> Result<Vec<IndicatorBar>, ScoutError> {
        let read_err = |reason: String| ScoutError::DataRead {
            path: source.to_string(),
            reason,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| read_err(format!("CSV header error: {}", e)))?;
        let columns: Vec<Column> = headers.iter().map(Column::from_header).collect();

        let ignored: Vec<&str> = headers
            .iter()
            .zip(&columns)
            .filter(|(_, c)| **c == Column::Ignored)
            .map(|(h, _)| h)
            .collect();
        if !ignored.is_empty() {
            debug!(source, ?ignored, "ignoring unknown columns");
        }

        let date_col = columns
            .iter()
            .position(|c| *c == Column::Date)
            .unwrap_or(0);
        for (required, name) in [
            (Column::Open, "open"),
            (Column::High, "high"),
            (Column::Low, "low"),
            (Column::Close, "close"),
        ] {
            if !columns.contains(&required) {
                return Err(read_err(format!("missing {} column", name)));
            }
        }

        let mut bars = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| read_err(format!("CSV parse error: {}", e)))?;
            let line = row + 2;

            let date_str = record
                .get(date_col)
                .ok_or_else(|| read_err(format!("line {}: missing date", line)))?;
            let date = parse_date(date_str)
                .ok_or_else(|| read_err(format!("line {}: invalid date '{}'", line, date_str)))?;

            let mut bar = IndicatorBar::new(date, 0.0, 0.0, 0.0, 0.0, 0.0);
            for (cell, column) in record.iter().zip(&columns) {
                let value = parse_cell(cell);
                match column {
                    Column::Open | Column::High | Column::Low | Column::Close => {
                        let price = value.ok_or_else(|| {
                            read_err(format!("line {}: invalid price '{}'", line, cell))
                        })?;
                        match column {
                            Column::Open => bar.open = price,
                            Column::High => bar.high = price,
                            Column::Low => bar.low = price,
                            _ => bar.close = price,
                        }
                    }
                    Column::Volume => bar.volume = value.unwrap_or(0.0),
                    Column::Indicator(field) => {
                        if let Some(v) = value {
                            bar.indicators.set(*field, v);
                        }
                    }
                    Column::Date | Column::Ignored => {}
                }
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    // tolerate a trailing time component
    let day = s.split([' ', 'T']).next().unwrap_or(s);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(day, fmt).ok())
}

/// Empty and NaN cells are missing values.
fn parse_cell(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

impl SeriesPort for CsvAdapter {
    fn load(&self, code: &str, timeframe: Timeframe) -> Result<IndicatorSeries, ScoutError> {
        let path = self.csv_path(code, timeframe);
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ScoutError::NoData {
                code: code.to_string(),
                timeframe: timeframe.to_string(),
            },
            _ => ScoutError::DataRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })?;

        let bars = Self::parse(&content, &path.display().to_string())?;
        debug!(code, %timeframe, bars = bars.len(), "loaded series");
        IndicatorSeries::new(bars).map_err(|source| ScoutError::InvalidSeries {
            code: code.to_string(),
            source,
        })
    }

    fn list_codes(&self, timeframe: Timeframe) -> Result<Vec<String>, ScoutError> {
        let read_err = |path: &Path, e: std::io::Error| ScoutError::DataRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        };
        let entries = fs::read_dir(&self.base_path).map_err(|e| read_err(&self.base_path, e))?;

        let suffix = format!("_{}.csv", timeframe);
        let mut codes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| read_err(&self.base_path, e))?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(code) = name.strip_suffix(&suffix) {
                codes.push(code.to_string());
            }
        }

        codes.sort();
        Ok(codes)
    }
}
