//! Indicator bar representation.
//!
//! An `IndicatorBar` is one time step of OHLCV data together with the
//! indicator columns an upstream stage has already computed. The core only
//! reads bars; a missing or non-finite column reads back as `0.0`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Precomputed indicator columns carried by every bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Ma5,
    Ma10,
    Ma20,
    Ma60,
    Ma120,
    Ma240,
    BbUpper,
    BbLower,
    Atr,
    Rsi,
    K,
    D,
    Macd,
    MacdSignal,
    MacdHist,
    Obv,
    PlusDi,
    MinusDi,
    Adx,
    EfiEma13,
    EfiEma2,
    Bias,
    TdBuySetup,
    TdSellSetup,
}

impl Field {
    pub const COUNT: usize = 24;

    pub const ALL: [Field; Field::COUNT] = [
        Field::Ma5,
        Field::Ma10,
        Field::Ma20,
        Field::Ma60,
        Field::Ma120,
        Field::Ma240,
        Field::BbUpper,
        Field::BbLower,
        Field::Atr,
        Field::Rsi,
        Field::K,
        Field::D,
        Field::Macd,
        Field::MacdSignal,
        Field::MacdHist,
        Field::Obv,
        Field::PlusDi,
        Field::MinusDi,
        Field::Adx,
        Field::EfiEma13,
        Field::EfiEma2,
        Field::Bias,
        Field::TdBuySetup,
        Field::TdSellSetup,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Ma5 => "MA5",
            Field::Ma10 => "MA10",
            Field::Ma20 => "MA20",
            Field::Ma60 => "MA60",
            Field::Ma120 => "MA120",
            Field::Ma240 => "MA240",
            Field::BbUpper => "BB_UPPER",
            Field::BbLower => "BB_LOWER",
            Field::Atr => "ATR",
            Field::Rsi => "RSI",
            Field::K => "K",
            Field::D => "D",
            Field::Macd => "MACD",
            Field::MacdSignal => "MACD_SIGNAL",
            Field::MacdHist => "MACD_HIST",
            Field::Obv => "OBV",
            Field::PlusDi => "+DI",
            Field::MinusDi => "-DI",
            Field::Adx => "ADX",
            Field::EfiEma13 => "EFI_EMA13",
            Field::EfiEma2 => "EFI_EMA2",
            Field::Bias => "BIAS",
            Field::TdBuySetup => "TD_BUY_SETUP",
            Field::TdSellSetup => "TD_SELL_SETUP",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator column: {0}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    /// Case-insensitive; accepts the column spellings upstream stages use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        let field = match normalized.as_str() {
            "MA5" => Field::Ma5,
            "MA10" => Field::Ma10,
            "MA20" => Field::Ma20,
            "MA60" => Field::Ma60,
            "MA120" => Field::Ma120,
            "MA240" => Field::Ma240,
            "BB_UP" | "BB_UPPER" | "BOLLINGER_UPPER" => Field::BbUpper,
            "BB_LO" | "BB_LOWER" | "BOLLINGER_LOWER" => Field::BbLower,
            "ATR" => Field::Atr,
            "RSI" => Field::Rsi,
            "K" => Field::K,
            "D" => Field::D,
            "MACD" | "MACD_DIF" => Field::Macd,
            "SIGNAL" | "MACD_SIGNAL" | "MACD_DEM" => Field::MacdSignal,
            "HIST" | "MACD_HIST" | "MACD_OSC" => Field::MacdHist,
            "OBV" => Field::Obv,
            "+DI" | "PLUS_DI" | "PDI" => Field::PlusDi,
            // "-DI" normalizes to "_DI"
            "_DI" | "MINUS_DI" | "MDI" => Field::MinusDi,
            "ADX" => Field::Adx,
            "EFI_EMA13" | "EFI" => Field::EfiEma13,
            "EFI_EMA2" => Field::EfiEma2,
            "BIAS" => Field::Bias,
            "TD_BUY_SETUP" => Field::TdBuySetup,
            "TD_SELL_SETUP" => Field::TdSellSetup,
            _ => return Err(UnknownField(s.to_string())),
        };
        Ok(field)
    }
}

/// Sparse storage for the precomputed indicator columns of one bar.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorValues {
    slots: [Option<f64>; Field::COUNT],
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, value: f64) {
        self.slots[field.index()] = Some(value);
    }

    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, value);
        self
    }

    pub fn clear(&mut self, field: Field) {
        self.slots[field.index()] = None;
    }

    /// Raw lookup: `None` when the column is absent or non-finite.
    pub fn get(&self, field: Field) -> Option<f64> {
        self.slots[field.index()].filter(|v| v.is_finite())
    }

    pub fn is_present(&self, field: Field) -> bool {
        self.get(field).is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub indicators: IndicatorValues,
}

impl IndicatorBar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
            indicators: IndicatorValues::new(),
        }
    }

    /// Indicator value with missing/NaN defaulted to 0.
    pub fn value(&self, field: Field) -> f64 {
        self.indicators.get(field).unwrap_or(0.0)
    }

    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.indicators.set(field, value);
        self
    }

    /// |close - open|
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }

    pub fn upper_shadow(&self) -> f64 {
        self.high - self.body_top()
    }

    pub fn lower_shadow(&self) -> f64 {
        self.body_bottom() - self.low
    }

    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Midpoint of the candle body.
    pub fn body_mid(&self) -> f64 {
        (self.open + self.close) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> IndicatorBar {
        IndicatorBar::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            100.0,
            110.0,
            90.0,
            105.0,
            50_000.0,
        )
    }

    #[test]
    fn missing_field_reads_zero() {
        let bar = sample_bar();
        assert_eq!(bar.value(Field::Ma20), 0.0);
        assert!(!bar.indicators.is_present(Field::Ma20));
    }

    #[test]
    fn nan_field_reads_zero() {
        let bar = sample_bar().with(Field::Rsi, f64::NAN);
        assert_eq!(bar.value(Field::Rsi), 0.0);
        assert_eq!(bar.indicators.get(Field::Rsi), None);
    }

    #[test]
    fn infinite_field_reads_zero() {
        let bar = sample_bar().with(Field::Adx, f64::INFINITY);
        assert_eq!(bar.value(Field::Adx), 0.0);
    }

    #[test]
    fn set_and_clear() {
        let mut bar = sample_bar().with(Field::Ma60, 98.5);
        assert!((bar.value(Field::Ma60) - 98.5).abs() < f64::EPSILON);
        bar.indicators.clear(Field::Ma60);
        assert_eq!(bar.value(Field::Ma60), 0.0);
    }

    #[test]
    fn candle_geometry() {
        let bar = sample_bar();
        assert!((bar.body() - 5.0).abs() < f64::EPSILON);
        assert!(bar.is_bullish());
        assert!(!bar.is_bearish());
        assert!((bar.upper_shadow() - 5.0).abs() < f64::EPSILON);
        assert!((bar.lower_shadow() - 10.0).abs() < f64::EPSILON);
        assert!((bar.range() - 20.0).abs() < f64::EPSILON);
        assert!((bar.body_mid() - 102.5).abs() < f64::EPSILON);
    }

    #[test]
    fn field_parse_aliases() {
        assert_eq!("MA20".parse::<Field>().unwrap(), Field::Ma20);
        assert_eq!("bb_up".parse::<Field>().unwrap(), Field::BbUpper);
        assert_eq!("BB_Lo".parse::<Field>().unwrap(), Field::BbLower);
        assert_eq!("+DI".parse::<Field>().unwrap(), Field::PlusDi);
        assert_eq!("-DI".parse::<Field>().unwrap(), Field::MinusDi);
        assert_eq!("Hist".parse::<Field>().unwrap(), Field::MacdHist);
        assert_eq!("TD_Buy_Setup".parse::<Field>().unwrap(), Field::TdBuySetup);
        assert!("Tenkan".parse::<Field>().is_err());
    }

    #[test]
    fn field_display_round_trips_for_every_field() {
        for field in Field::ALL {
            assert_eq!(field.to_string().parse::<Field>().unwrap(), field);
        }
    }
}
