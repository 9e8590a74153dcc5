//! Candlestick detectors.
//!
//! "Average body" is the 20-bar mean of |close - open|, current bar included.
//! Volume confirmation compares the evaluation bar with the bar before it.

use serde::Serialize;
use std::fmt;

use super::PatternSignal;
use crate::domain::bar::IndicatorBar;
use crate::domain::series::{mean_body, mean_volume};

pub const BODY_WINDOW: usize = 20;
pub const VOLUME_WINDOW: usize = 5;
pub const MIN_BARS: usize = 5;

/// Engulfing: body of the last bar contains the previous body, opposite colors.
pub fn engulfing(bars: &[IndicatorBar]) -> PatternSignal {
    let [.., prev, curr] = bars else {
        return PatternSignal::none();
    };
    let volume_up = curr.volume > prev.volume;

    if prev.is_bearish() && curr.is_bullish() && curr.open <= prev.close && curr.close >= prev.open {
        return if volume_up {
            PatternSignal::single("engulfing", 2.0, "bullish engulfing with rising volume")
        } else {
            PatternSignal::single("engulfing", 1.0, "bullish engulfing without volume")
        };
    }

    if prev.is_bullish() && curr.is_bearish() && curr.open >= prev.close && curr.close <= prev.open {
        return if volume_up {
            PatternSignal::single("engulfing", -2.0, "bearish engulfing with rising volume")
        } else {
            PatternSignal::single("engulfing", -1.5, "bearish engulfing")
        };
    }

    PatternSignal::none()
}

/// Morning star (bullish) / evening star (bearish), three bars.
pub fn star(bars: &[IndicatorBar]) -> PatternSignal {
    let Some(avg_body) = reference_body(bars) else {
        return PatternSignal::none();
    };
    let [.., first, middle, last] = bars else {
        return PatternSignal::none();
    };
    let volume_up = last.volume > middle.volume;

    match star_shape(first, middle, last, avg_body) {
        Some(Bias::Bullish) if volume_up => {
            PatternSignal::single("star", 2.0, "morning star with rising volume")
        }
        Some(Bias::Bullish) => PatternSignal::single("star", 1.5, "morning star"),
        Some(Bias::Bearish) if volume_up => {
            PatternSignal::single("star", -2.0, "evening star with rising volume")
        }
        Some(Bias::Bearish) => PatternSignal::single("star", -1.5, "evening star"),
        _ => PatternSignal::none(),
    }
}

fn star_shape(first: &IndicatorBar, middle: &IndicatorBar, last: &IndicatorBar, avg_body: f64) -> Option<Bias> {
    let long_first = first.body() > avg_body;
    let small_middle = middle.body() < 0.5 * avg_body;
    if !long_first || !small_middle {
        return None;
    }

    if first.is_bearish() && middle.body_top() <= first.close && last.is_bullish() && last.close >= first.body_mid() {
        return Some(Bias::Bullish);
    }
    if first.is_bullish() && middle.body_bottom() >= first.close && last.is_bearish() && last.close <= first.body_mid() {
        return Some(Bias::Bearish);
    }
    None
}

/// Volume over twice the 5-bar average with a body over 1.5x the 20-bar average.
pub fn explosive_volume(bars: &[IndicatorBar]) -> PatternSignal {
    let (Some(avg_volume), Some(avg_body)) = (mean_volume(bars, VOLUME_WINDOW), mean_body(bars, BODY_WINDOW)) else {
        return PatternSignal::none();
    };
    let Some(curr) = bars.last() else {
        return PatternSignal::none();
    };
    if avg_volume <= 0.0 || avg_body <= 0.0 {
        return PatternSignal::none();
    }

    let surge = curr.volume > 2.0 * avg_volume;
    let long_body = curr.body() > 1.5 * avg_body;
    if !(surge && long_body) {
        return PatternSignal::none();
    }

    let ratio = curr.volume / avg_volume;
    if curr.is_bullish() {
        PatternSignal::single(
            "explosive_volume",
            2.0,
            format!("explosive volume long bullish bar ({ratio:.1}x volume)"),
        )
    } else if curr.is_bearish() {
        PatternSignal::single(
            "explosive_volume",
            -2.0,
            format!("explosive volume long bearish bar ({ratio:.1}x volume)"),
        )
    } else {
        PatternSignal::none()
    }
}

/// Doji: informational only.
pub fn doji(bars: &[IndicatorBar]) -> PatternSignal {
    let Some(avg_body) = mean_body(bars, BODY_WINDOW) else {
        return PatternSignal::none();
    };
    let Some(curr) = bars.last() else {
        return PatternSignal::none();
    };
    if avg_body <= 0.0 || curr.body() >= 0.1 * avg_body {
        return PatternSignal::none();
    }

    let heavy = mean_volume(bars, VOLUME_WINDOW).is_some_and(|v| v > 0.0 && curr.volume > 2.0 * v);
    if heavy {
        PatternSignal::single("doji", 0.0, "doji on heavy volume, watch for a turn")
    } else {
        PatternSignal::single("doji", 0.0, "doji on light volume, market undecided")
    }
}

/// All candlestick detectors. Needs at least five bars.
pub fn candlestick_signals(bars: &[IndicatorBar]) -> PatternSignal {
    if bars.len() < MIN_BARS {
        return PatternSignal::none();
    }
    let mut signal = engulfing(bars);
    signal.merge(explosive_volume(bars));
    signal.merge(star(bars));
    signal.merge(doji(bars));
    signal
}

/// 20-bar average body, or the mean over all bars when fewer exist.
fn reference_body(bars: &[IndicatorBar]) -> Option<f64> {
    let n = bars.len().min(BODY_WINDOW);
    mean_body(bars, n).filter(|&b| b > 0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    Bullish,
    Bearish,
    Neutral,
}

/// Single-label classification of the last bar, strongest pattern wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandlePattern {
    Doji,
    MarubozuBull,
    MarubozuBear,
    Hammer,
    ShootingStar,
    HaramiBull,
    HaramiBear,
    PiercingLine,
    DarkCloudCover,
    EngulfingBull,
    EngulfingBear,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl CandlePattern {
    pub fn bias(self) -> Bias {
        match self {
            CandlePattern::Doji => Bias::Neutral,
            CandlePattern::MarubozuBull
            | CandlePattern::Hammer
            | CandlePattern::HaramiBull
            | CandlePattern::PiercingLine
            | CandlePattern::EngulfingBull
            | CandlePattern::MorningStar
            | CandlePattern::ThreeWhiteSoldiers => Bias::Bullish,
            CandlePattern::MarubozuBear
            | CandlePattern::ShootingStar
            | CandlePattern::HaramiBear
            | CandlePattern::DarkCloudCover
            | CandlePattern::EngulfingBear
            | CandlePattern::EveningStar
            | CandlePattern::ThreeBlackCrows => Bias::Bearish,
        }
    }

    /// Reversal patterns that carry the heavier fast-scorer weight.
    pub fn is_major(self) -> bool {
        matches!(
            self,
            CandlePattern::EngulfingBull
                | CandlePattern::EngulfingBear
                | CandlePattern::MorningStar
                | CandlePattern::EveningStar
        )
    }
}

impl fmt::Display for CandlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CandlePattern::Doji => "Doji",
            CandlePattern::MarubozuBull => "Marubozu (Bull)",
            CandlePattern::MarubozuBear => "Marubozu (Bear)",
            CandlePattern::Hammer => "Hammer",
            CandlePattern::ShootingStar => "Shooting Star",
            CandlePattern::HaramiBull => "Harami (Bull)",
            CandlePattern::HaramiBear => "Harami (Bear)",
            CandlePattern::PiercingLine => "Piercing Line",
            CandlePattern::DarkCloudCover => "Dark Cloud Cover",
            CandlePattern::EngulfingBull => "Engulfing (Bull)",
            CandlePattern::EngulfingBear => "Engulfing (Bear)",
            CandlePattern::MorningStar => "Morning Star",
            CandlePattern::EveningStar => "Evening Star",
            CandlePattern::ThreeWhiteSoldiers => "Three White Soldiers",
            CandlePattern::ThreeBlackCrows => "Three Black Crows",
        };
        f.write_str(name)
    }
}

/// Classify the last bar. Multi-bar patterns take precedence over single-bar ones.
pub fn classify(bars: &[IndicatorBar]) -> Option<CandlePattern> {
    let curr = bars.last()?;
    let prev = bars.len().checked_sub(2).map(|i| &bars[i]);
    let prev2 = bars.len().checked_sub(3).map(|i| &bars[i]);
    let avg_body = mean_body(bars, BODY_WINDOW);

    if let (Some(p2), Some(p)) = (prev2, prev) {
        if p2.is_bullish() && p.is_bullish() && curr.is_bullish() && curr.close > p.close && p.close > p2.close {
            return Some(CandlePattern::ThreeWhiteSoldiers);
        }
        if p2.is_bearish() && p.is_bearish() && curr.is_bearish() && curr.close < p.close && p.close < p2.close {
            return Some(CandlePattern::ThreeBlackCrows);
        }
        if let Some(body) = reference_body(bars) {
            match star_shape(p2, p, curr, body) {
                Some(Bias::Bullish) => return Some(CandlePattern::MorningStar),
                Some(Bias::Bearish) => return Some(CandlePattern::EveningStar),
                _ => {}
            }
        }
    }

    if let Some(p) = prev {
        let larger = curr.body() > p.body();
        if p.is_bearish() && curr.is_bullish() && curr.open <= p.close && curr.close >= p.open && larger {
            return Some(CandlePattern::EngulfingBull);
        }
        if p.is_bullish() && curr.is_bearish() && curr.open >= p.close && curr.close <= p.open && larger {
            return Some(CandlePattern::EngulfingBear);
        }
        if p.is_bullish() && curr.is_bearish() && curr.open > p.high && curr.close < p.body_mid() && curr.close > p.open {
            return Some(CandlePattern::DarkCloudCover);
        }
        if p.is_bearish() && curr.is_bullish() && curr.open < p.low && curr.close > p.body_mid() && curr.close < p.open {
            return Some(CandlePattern::PiercingLine);
        }
        let inside = curr.body() < p.body() && curr.high < p.high && curr.low > p.low;
        if inside && p.is_bullish() && curr.is_bearish() {
            return Some(CandlePattern::HaramiBear);
        }
        if inside && p.is_bearish() && curr.is_bullish() {
            return Some(CandlePattern::HaramiBull);
        }
    }

    let body = curr.body();
    if body > 0.0 && curr.upper_shadow() >= 2.0 * body && curr.lower_shadow() <= 0.5 * body {
        return Some(CandlePattern::ShootingStar);
    }
    if body > 0.0 && curr.lower_shadow() >= 2.0 * body && curr.upper_shadow() <= 0.5 * body {
        return Some(CandlePattern::Hammer);
    }
    if let Some(avg) = avg_body {
        let marubozu = curr.lower_shadow() < 0.1 * body && curr.upper_shadow() < 0.1 * body && body > 1.5 * avg;
        if marubozu && curr.is_bullish() {
            return Some(CandlePattern::MarubozuBull);
        }
        if marubozu && curr.is_bearish() {
            return Some(CandlePattern::MarubozuBear);
        }
    }
    if curr.range() > 0.0 && body <= 0.1 * curr.range() {
        return Some(CandlePattern::Doji);
    }
    None
}
