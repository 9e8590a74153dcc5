#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
pub use trendscout::domain::bar::{Field, IndicatorBar};
pub use trendscout::domain::scorer::{ScoredBar, ScoredSeries};
pub use trendscout::domain::series::IndicatorSeries;

pub fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + Duration::days(i as i64)
}

pub fn week(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap() + Duration::weeks(i as i64)
}

pub fn make_bar(date: NaiveDate, open: f64, close: f64, volume: f64) -> IndicatorBar {
    let high = open.max(close) + 0.5;
    let low = open.min(close) - 0.5;
    IndicatorBar::new(date, open, high, low, close, volume)
}

pub fn flat_bars(n: usize, close: f64) -> Vec<IndicatorBar> {
    (0..n).map(|i| make_bar(day(i), close, close, 1000.0)).collect()
}

pub fn series(bars: Vec<IndicatorBar>) -> IndicatorSeries {
    IndicatorSeries::new(bars).unwrap()
}

/// Steadily rising weekly bars with MA20 < MA60 < close, a trending DMI,
/// climbing OBV and positive EFI.
pub fn rising_weekly(n: usize) -> Vec<IndicatorBar> {
    (0..n)
        .map(|i| {
            let close = 50.0 + i as f64 * 0.5;
            make_bar(week(i), close - 0.3, close, 10_000.0)
                .with(Field::Ma20, close - 6.0)
                .with(Field::Ma60, close - 3.0)
                .with(Field::Adx, 32.0)
                .with(Field::PlusDi, 28.0)
                .with(Field::MinusDi, 12.0)
                .with(Field::Obv, 1_000.0 * i as f64)
                .with(Field::EfiEma13, 5_000.0)
        })
        .collect()
}

/// Daily series carrying only the fields the fast scorer reads.
pub fn scored_daily(closes: &[f64]) -> Vec<IndicatorBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let prev = if i == 0 { c } else { closes[i - 1] };
            make_bar(day(i), prev, c, 1000.0)
                .with(Field::Ma20, c * 0.98)
                .with(Field::Bias, 2.0)
                .with(Field::MacdHist, 0.5)
                .with(Field::K, 60.0)
                .with(Field::D, 50.0)
                .with(Field::Obv, 100.0 * i as f64)
        })
        .collect()
}

pub fn scored(points: &[(f64, Option<f64>)]) -> ScoredSeries {
    ScoredSeries::new(
        points
            .iter()
            .enumerate()
            .map(|(i, &(close, score))| ScoredBar {
                date: day(i),
                close,
                score,
            })
            .collect(),
    )
}

/// Write bars as `<dir>/<code>_<timeframe>.csv` with the given indicator columns.
pub fn write_csv(dir: &Path, code: &str, timeframe: &str, bars: &[IndicatorBar], fields: &[Field]) {
    let mut out = String::from("Date,Open,High,Low,Close,Volume");
    for f in fields {
        write!(out, ",{}", f).unwrap();
    }
    out.push('\n');
    for b in bars {
        write!(out, "{},{},{},{},{},{}", b.date, b.open, b.high, b.low, b.close, b.volume).unwrap();
        for f in fields {
            match b.indicators.get(*f) {
                Some(v) => write!(out, ",{}", v).unwrap(),
                None => out.push(','),
            }
        }
        out.push('\n');
    }
    fs::write(dir.join(format!("{}_{}.csv", code, timeframe)), out).unwrap();
}
