//! Pivot-based price/indicator divergence detection.
//!
//! Bottoms compare the two most recent price lows (bar `Low`) with the
//! indicator lows matched to them; tops compare price highs (bar `High`)
//! with matched indicator highs. Bottoms are evaluated first and win.

use serde::Serialize;
use std::fmt;

use crate::domain::bar::{Field, IndicatorBar};
use crate::domain::pivot::{find_pivots, nearest_within, PivotKind};
use crate::domain::series::tail;

pub const PIVOT_RADIUS: usize = 3;
pub const DEFAULT_LOOKBACK: usize = 30;

const STRONG_PRICE_MOVE: f64 = 0.03;
const STRONG_INDICATOR_MOVE: f64 = 0.10;
const ZERO_GUARD: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Divergence {
    None,
    Bull,
    BullStrong,
    BullWeak,
    Bear,
    BearStrong,
    BearWeak,
}

impl Divergence {
    /// Scoring weight: strong ±3, standard ±2, weak (hidden) ±1.
    pub fn weight(self) -> f64 {
        match self {
            Divergence::None => 0.0,
            Divergence::BullStrong => 3.0,
            Divergence::Bull => 2.0,
            Divergence::BullWeak => 1.0,
            Divergence::BearWeak => -1.0,
            Divergence::Bear => -2.0,
            Divergence::BearStrong => -3.0,
        }
    }

    pub fn is_bullish(self) -> bool {
        matches!(self, Divergence::Bull | Divergence::BullStrong | Divergence::BullWeak)
    }

    pub fn is_bearish(self) -> bool {
        matches!(self, Divergence::Bear | Divergence::BearStrong | Divergence::BearWeak)
    }
}

impl fmt::Display for Divergence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Divergence::None => "none",
            Divergence::Bull => "bullish divergence",
            Divergence::BullStrong => "strong bullish divergence",
            Divergence::BullWeak => "hidden bullish divergence",
            Divergence::Bear => "bearish divergence",
            Divergence::BearStrong => "strong bearish divergence",
            Divergence::BearWeak => "hidden bearish divergence",
        };
        f.write_str(s)
    }
}

/// Classify divergence between price and `field` over the last `lookback` bars.
pub fn detect(bars: &[IndicatorBar], field: Field, lookback: usize) -> Divergence {
    let window = tail(bars, lookback);
    let lows: Vec<f64> = window.iter().map(|b| b.low).collect();
    let highs: Vec<f64> = window.iter().map(|b| b.high).collect();
    let indicator: Vec<f64> = window.iter().map(|b| b.value(field)).collect();

    let bottom = match pivot_pair(&lows, &indicator, PivotKind::Low) {
        Some(pair) => classify_bottom(pair),
        None => Divergence::None,
    };
    if bottom != Divergence::None {
        return bottom;
    }

    match pivot_pair(&highs, &indicator, PivotKind::High) {
        Some(pair) => classify_top(pair),
        None => Divergence::None,
    }
}

/// Price and matched indicator values at the two most recent price pivots.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PivotPair {
    price_first: f64,
    price_second: f64,
    ind_first: f64,
    ind_second: f64,
}

fn pivot_pair(price: &[f64], indicator: &[f64], kind: PivotKind) -> Option<PivotPair> {
    let price_pivots = find_pivots(price, PIVOT_RADIUS, kind);
    let ind_pivots = find_pivots(indicator, PIVOT_RADIUS, kind);
    if price_pivots.len() < 2 || ind_pivots.len() < 2 {
        return None;
    }

    let first = price_pivots[price_pivots.len() - 2];
    let second = price_pivots[price_pivots.len() - 1];
    let ind_first = nearest_within(&ind_pivots, first, PIVOT_RADIUS)?;
    let ind_second = nearest_within(&ind_pivots, second, PIVOT_RADIUS)?;
    if ind_first == ind_second {
        return None;
    }

    Some(PivotPair {
        price_first: price[first],
        price_second: price[second],
        ind_first: indicator[ind_first],
        ind_second: indicator[ind_second],
    })
}

fn relative_change(from: f64, to: f64) -> Option<f64> {
    if from.abs() < ZERO_GUARD {
        return None;
    }
    let change = (to - from) / from.abs();
    change.is_finite().then_some(change)
}

fn classify_bottom(p: PivotPair) -> Divergence {
    if p.price_second < p.price_first && p.ind_second > p.ind_first {
        let price_drop = relative_change(p.price_first, p.price_second).map(|c| -c);
        let ind_rise = relative_change(p.ind_first, p.ind_second);
        match (price_drop, ind_rise) {
            (Some(drop), Some(rise)) if drop > STRONG_PRICE_MOVE && rise > STRONG_INDICATOR_MOVE => {
                Divergence::BullStrong
            }
            _ => Divergence::Bull,
        }
    } else if p.price_second > p.price_first && p.ind_second < p.ind_first {
        Divergence::BullWeak
    } else {
        Divergence::None
    }
}

fn classify_top(p: PivotPair) -> Divergence {
    if p.price_second > p.price_first && p.ind_second < p.ind_first {
        let price_rise = relative_change(p.price_first, p.price_second);
        let ind_fall = relative_change(p.ind_first, p.ind_second).map(|c| -c);
        match (price_rise, ind_fall) {
            (Some(rise), Some(fall)) if rise > STRONG_PRICE_MOVE && fall > STRONG_INDICATOR_MOVE => {
                Divergence::BearStrong
            }
            _ => Divergence::Bear,
        }
    } else if p.price_second < p.price_first && p.ind_second > p.ind_first {
        Divergence::BearWeak
    } else {
        Divergence::None
    }
}
