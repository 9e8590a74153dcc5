//! Indicator series access port trait.

use crate::domain::error::ScoutError;
use crate::domain::series::IndicatorSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Daily,
    Weekly,
}

impl Timeframe {
    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of precomputed indicator series, one per instrument and timeframe.
pub trait SeriesPort {
    fn load(&self, code: &str, timeframe: Timeframe) -> Result<IndicatorSeries, ScoutError>;

    /// Instrument codes with data for `timeframe`, sorted.
    fn list_codes(&self, timeframe: Timeframe) -> Result<Vec<String>, ScoutError>;
}
