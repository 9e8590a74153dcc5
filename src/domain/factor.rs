//! Trend (weekly) and trigger (daily) factor scoring.
//!
//! Both scorers read only the window they are handed, so scoring a prefix of
//! a series yields the score as of that prefix's last bar.

use tracing::{debug, warn};

use crate::domain::bar::{Field, IndicatorBar};
use crate::domain::chips::{ChipFactors, RegimeModulator};
use crate::domain::divergence::{self, Divergence};
use crate::domain::patterns::{candle, chart};
use crate::domain::score::ScoreBreakdown;
use crate::domain::series::{last_two, mean_volume};

pub const TREND_MIN_BARS: usize = 5;
pub const TRIGGER_MIN_BARS: usize = 20;
pub const PRICE_VOLUME_MIN_DAILY: usize = 20;
pub const PRICE_VOLUME_MIN_WEEKLY: usize = 5;

const ADX_TRENDING: f64 = 25.0;
const BIAS_BAND: f64 = 10.0;

/// Factor scorer with a configurable divergence lookback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorScorer {
    pub divergence_lookback: usize,
}

impl Default for FactorScorer {
    fn default() -> Self {
        Self {
            divergence_lookback: divergence::DEFAULT_LOOKBACK,
        }
    }
}

pub fn score_trend(weekly: &[IndicatorBar]) -> ScoreBreakdown {
    FactorScorer::default().trend(weekly)
}

pub fn score_trigger(daily: &[IndicatorBar], trend_score: f64, chips: &ChipFactors) -> ScoreBreakdown {
    FactorScorer::default().trigger(daily, trend_score, chips)
}

impl FactorScorer {
    pub fn new(divergence_lookback: usize) -> Self {
        Self { divergence_lookback }
    }

    /// Weekly TrendScore.
    pub fn trend(&self, weekly: &[IndicatorBar]) -> ScoreBreakdown {
        if weekly.len() < TREND_MIN_BARS {
            warn!(bars = weekly.len(), "trend score needs {TREND_MIN_BARS} weekly bars");
            return ScoreBreakdown::insufficient(weekly.len(), TREND_MIN_BARS);
        }
        let Some((curr, _)) = last_two(weekly) else {
            return ScoreBreakdown::insufficient(weekly.len(), TREND_MIN_BARS);
        };
        let mut b = ScoreBreakdown::new();

        ma_structure(&mut b, curr);
        dmi(&mut b, curr, "weekly");

        let obv_then = weekly[weekly.len() - 5].value(Field::Obv);
        if curr.value(Field::Obv) > obv_then {
            b.add("obv_momentum", 1.0, "OBV higher than 5 weeks ago");
        } else {
            b.info("obv_momentum", "OBV not rising over 5 weeks");
        }

        let efi = curr.value(Field::EfiEma13);
        if efi > 0.0 {
            b.add("efi", 1.0, format!("weekly EFI positive ({efi:.0})"));
        } else if efi < 0.0 {
            b.add("efi", -1.0, format!("weekly EFI negative ({efi:.0})"));
        }

        chart::morphology(weekly).record_into(&mut b, "weekly");
        price_volume(&mut b, weekly, PRICE_VOLUME_MIN_WEEKLY);

        debug!(total = b.total, entries = b.len(), "trend score");
        b
    }

    /// Daily TriggerScore, with an optional chip sub-score scaled by the trend regime.
    pub fn trigger(&self, daily: &[IndicatorBar], trend_score: f64, chips: &ChipFactors) -> ScoreBreakdown {
        if daily.len() < TRIGGER_MIN_BARS {
            warn!(bars = daily.len(), "trigger score needs {TRIGGER_MIN_BARS} daily bars");
            return ScoreBreakdown::insufficient(daily.len(), TRIGGER_MIN_BARS);
        }
        let Some((curr, prev)) = last_two(daily) else {
            return ScoreBreakdown::insufficient(daily.len(), TRIGGER_MIN_BARS);
        };
        let mut b = ScoreBreakdown::new();

        ma20_position(&mut b, curr);
        bias_band(&mut b, curr);

        let efi = curr.value(Field::EfiEma13);
        if efi > 0.0 {
            b.add("efi", 1.0, "EFI positive, buyers in control");
            if efi > prev.value(Field::EfiEma13) {
                b.add("efi_acceleration", 0.5, "EFI buying force increasing");
            }
        } else if efi < 0.0 {
            b.add("efi", -1.0, "EFI negative, sellers in control");
        }

        macd_histogram(&mut b, curr, prev);
        self.divergence(&mut b, daily, Field::Macd, "MACD");

        kd_cross(&mut b, curr);

        let obv_then = daily[daily.len() - 3].value(Field::Obv);
        if curr.value(Field::Obv) > obv_then {
            b.add("obv_momentum", 1.0, "short-term OBV inflow");
        }
        self.divergence(&mut b, daily, Field::Obv, "OBV");

        dmi(&mut b, curr, "daily");
        self.divergence(&mut b, daily, Field::Rsi, "RSI");

        candle::candlestick_signals(daily).record_into(&mut b, "");
        chart::morphology(daily).record_into(&mut b, "");
        price_volume(&mut b, daily, PRICE_VOLUME_MIN_DAILY);
        td_setup(&mut b, curr);

        if !chips.is_none() {
            let modulator = RegimeModulator::from_trend(trend_score);
            debug!(%modulator, "applying chip sub-score");
            b.extend(modulator.apply(chips.score()));
        }

        debug!(total = b.total, entries = b.len(), "trigger score");
        b
    }

    fn divergence(&self, b: &mut ScoreBreakdown, bars: &[IndicatorBar], field: Field, name: &str) {
        let kind = divergence::detect(bars, field, self.divergence_lookback);
        if kind != Divergence::None {
            let label = format!("divergence.{}", name.to_ascii_lowercase());
            b.add(&label, kind.weight(), format!("{name} {kind}"));
        }
    }
}

fn ma_structure(b: &mut ScoreBreakdown, curr: &IndicatorBar) {
    let Some(ma20) = curr.indicators.get(Field::Ma20) else {
        b.info("ma_structure", "MA20 unavailable");
        return;
    };
    let ma60 = curr.indicators.get(Field::Ma60);
    let close = curr.close;

    if close > ma20 && ma60.is_some_and(|m| ma20 > m) {
        b.add("ma_structure", 2.0, "bullish alignment (close > MA20 > MA60)");
    } else if close > ma20 {
        b.add("ma_structure", 1.0, "close above MA20");
    } else if close < ma20 && ma60.is_some_and(|m| ma20 < m) {
        b.add("ma_structure", -2.0, "bearish alignment (close < MA20 < MA60)");
    } else {
        b.info("ma_structure", "moving averages tangled");
    }
}

fn dmi(b: &mut ScoreBreakdown, curr: &IndicatorBar, frame: &str) {
    let adx = curr.value(Field::Adx);
    if adx <= ADX_TRENDING {
        return;
    }
    let (plus, minus) = (curr.value(Field::PlusDi), curr.value(Field::MinusDi));
    if plus > minus {
        b.add("dmi", 1.0, format!("{frame} DMI uptrend (ADX {adx:.1}, +DI > -DI)"));
    } else if minus > plus {
        b.add("dmi", -1.0, format!("{frame} DMI downtrend (ADX {adx:.1}, -DI > +DI)"));
    }
}

fn ma20_position(b: &mut ScoreBreakdown, curr: &IndicatorBar) {
    let Some(ma20) = curr.indicators.get(Field::Ma20) else {
        return;
    };
    if curr.close > ma20 {
        b.add("ma20_position", 1.0, "close above daily MA20");
    } else if curr.close < ma20 {
        b.add("ma20_position", -1.0, "close below daily MA20");
    }
}

fn bias_band(b: &mut ScoreBreakdown, curr: &IndicatorBar) {
    let bias = curr.value(Field::Bias);
    if bias > 0.0 && bias < BIAS_BAND {
        b.add("bias", 1.0, format!("healthy bias ({bias:.1}%)"));
    } else if bias > BIAS_BAND {
        b.add("bias", -1.0, format!("overheated bias ({bias:.1}%)"));
    } else if bias < -BIAS_BAND {
        b.add("bias", 1.0, format!("oversold bias ({bias:.1}%)"));
    }
}

fn macd_histogram(b: &mut ScoreBreakdown, curr: &IndicatorBar, prev: &IndicatorBar) {
    let hist = curr.value(Field::MacdHist);
    if hist > 0.0 {
        b.add("macd_hist", 1.0, "MACD histogram positive");
        if hist > prev.value(Field::MacdHist) {
            b.add("macd_acceleration", 0.5, "MACD momentum accelerating");
        }
    } else if hist < 0.0 {
        b.add("macd_hist", -1.0, "MACD histogram negative");
    }
}

fn kd_cross(b: &mut ScoreBreakdown, curr: &IndicatorBar) {
    let (k, d) = (curr.value(Field::K), curr.value(Field::D));
    if k > d {
        b.add("kd", 1.0, "K above D");
    } else if k < d {
        b.add("kd", -1.0, "K below D");
    }
}

fn td_setup(b: &mut ScoreBreakdown, curr: &IndicatorBar) {
    match curr.value(Field::TdBuySetup) {
        c if c == 9.0 => b.add("td_setup", 2.0, "TD buy setup complete (9)"),
        c if c == 8.0 => b.add("td_setup", 0.5, "TD buy setup at 8"),
        _ => {}
    }
    match curr.value(Field::TdSellSetup) {
        c if c == 9.0 => b.add("td_setup", -2.0, "TD sell setup complete (9)"),
        c if c == 8.0 => b.add("td_setup", -0.5, "TD sell setup at 8"),
        _ => {}
    }
}

/// Price-volume relationship against the 5-bar average volume.
///
/// | price | volume vs 5-bar avg | delta |
/// |-------|---------------------|-------|
/// | up    | above               | +1    |
/// | up    | below               | -0.5  |
/// | down  | above               | -1    |
/// | down  | below               | +0.5  |
pub fn price_volume(b: &mut ScoreBreakdown, bars: &[IndicatorBar], min_bars: usize) {
    if bars.len() < min_bars.max(2) {
        return;
    }
    let (Some((curr, prev)), Some(avg)) = (last_two(bars), mean_volume(bars, 5)) else {
        return;
    };

    let price_up = curr.close > prev.close;
    let price_down = curr.close < prev.close;
    let vol_high = curr.volume > avg;
    let vol_low = curr.volume < avg;

    if price_up && vol_high {
        b.add("price_volume", 1.0, "price up on rising volume");
    } else if price_up && vol_low {
        b.add("price_volume", -0.5, "price up on shrinking volume");
    } else if price_down && vol_high {
        b.add("price_volume", -1.0, "price down on heavy volume");
    } else if price_down && vol_low {
        b.add("price_volume", 0.5, "price down on light volume, selling drying up");
    }
}
