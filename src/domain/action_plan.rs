//! Entry zone, stop and target selection.
//!
//! Distances are measured from the entry basis: the midpoint of the entry
//! zone when the plan is actionable, the current close otherwise.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::domain::bar::{Field, IndicatorBar};
use crate::domain::scenario::{Scenario, ScenarioCode};
use crate::domain::series::{max_high, min_low, tail};

pub const MIN_BARS: usize = 20;

const TARGET_MARGIN: f64 = 1.02;
const FIB_EXTENSION: f64 = 1.618;
const FALLBACK_TARGET: f64 = 1.10;
const ATR_MULTIPLIER: f64 = 2.0;
const KEY_CANDLE_WINDOW: usize = 10;
const SWING_WINDOW: usize = 20;

/// Optimized buy/sell trigger thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub buy: f64,
    pub sell: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelMethod {
    Atr,
    MovingAverage,
    KeyCandle,
    SwingLow,
    NMeasure,
    Fibonacci,
    Ma60,
    Ma120,
    Ma240,
    PriorHigh,
    BollingerUpper,
    Fallback,
}

impl LevelMethod {
    fn is_resistance(self) -> bool {
        matches!(
            self,
            LevelMethod::Ma60
                | LevelMethod::Ma120
                | LevelMethod::Ma240
                | LevelMethod::PriorHigh
                | LevelMethod::BollingerUpper
        )
    }
}

impl fmt::Display for LevelMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LevelMethod::Atr => "ATR stop",
            LevelMethod::MovingAverage => "MA20 stop",
            LevelMethod::KeyCandle => "key candle stop",
            LevelMethod::SwingLow => "swing low stop",
            LevelMethod::NMeasure => "N-measure (1.0)",
            LevelMethod::Fibonacci => "Fibonacci extension (1.618)",
            LevelMethod::Ma60 => "MA60 resistance",
            LevelMethod::Ma120 => "MA120 resistance",
            LevelMethod::Ma240 => "MA240 resistance",
            LevelMethod::PriorHigh => "prior 20-bar high",
            LevelMethod::BollingerUpper => "Bollinger upper band",
            LevelMethod::Fallback => "10% fallback",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceLevel {
    pub method: LevelMethod,
    pub price: f64,
    pub description: String,
    pub is_recommended: bool,
}

impl PriceLevel {
    fn new(method: LevelMethod, price: f64, description: &str) -> Self {
        Self {
            method,
            price,
            description: description.to_string(),
            is_recommended: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionPlan {
    pub current_price: f64,
    pub scenario: ScenarioCode,
    pub strategy_text: String,
    pub is_actionable: bool,
    pub entry_low: f64,
    pub entry_high: f64,
    pub entry_desc: String,
    pub recommended_stop: f64,
    pub recommended_stop_method: Option<LevelMethod>,
    pub stop_candidates: Vec<PriceLevel>,
    pub recommended_target: f64,
    pub target_candidates: Vec<PriceLevel>,
    pub risk_reward_ratio: f64,
}

impl ActionPlan {
    /// Plan returned when fewer than 20 bars are available.
    pub fn empty(scenario: ScenarioCode) -> Self {
        Self {
            current_price: 0.0,
            scenario,
            strategy_text: "insufficient data".to_string(),
            is_actionable: false,
            entry_low: 0.0,
            entry_high: 0.0,
            entry_desc: String::new(),
            recommended_stop: 0.0,
            recommended_stop_method: None,
            stop_candidates: Vec::new(),
            recommended_target: 0.0,
            target_candidates: Vec::new(),
            risk_reward_ratio: 0.0,
        }
    }

    pub fn entry_basis(&self) -> f64 {
        if self.is_actionable {
            (self.entry_low + self.entry_high) / 2.0
        } else {
            self.current_price
        }
    }
}

struct Entry {
    code: ScenarioCode,
    actionable: bool,
    low: f64,
    high: f64,
    desc: &'static str,
}

/// Build the action plan for the last bar of `daily`.
pub fn plan(
    daily: &[IndicatorBar],
    scenario: &Scenario,
    trigger_score: f64,
    thresholds: Option<Thresholds>,
) -> ActionPlan {
    if daily.len() < MIN_BARS {
        debug!(bars = daily.len(), "action plan needs {MIN_BARS} bars");
        return ActionPlan::empty(scenario.code);
    }
    let Some(curr) = daily.last() else {
        return ActionPlan::empty(scenario.code);
    };
    let close = curr.close;

    let entry = entry_zone(daily, curr, scenario.code, trigger_score, thresholds);
    let basis = if entry.actionable {
        (entry.low + entry.high) / 2.0
    } else {
        close
    };

    let mut stops = stop_candidates(daily, curr, basis);
    let stop_method = recommend_stop(&mut stops, entry.code);
    let recommended_stop = stops
        .iter()
        .find(|s| s.is_recommended)
        .map_or(0.0, |s| s.price);

    let (targets, recommended_target) = if entry.actionable {
        let mut targets = target_candidates(daily, curr, basis);
        let target = recommend_target(&mut targets, daily, close, basis, entry.code);
        (targets, target)
    } else {
        (Vec::new(), 0.0)
    };

    let risk = basis - recommended_stop;
    let risk_reward_ratio = if entry.actionable && risk > 0.0 {
        let rr = (recommended_target - basis) / risk;
        if rr.is_finite() { rr } else { 0.0 }
    } else {
        0.0
    };

    let (entry_low, entry_high) = if entry.actionable {
        (entry.low, entry.high)
    } else {
        (0.0, 0.0)
    };

    ActionPlan {
        current_price: close,
        scenario: entry.code,
        strategy_text: strategy_text(entry.code, entry.actionable).to_string(),
        is_actionable: entry.actionable,
        entry_low,
        entry_high,
        entry_desc: entry.desc.to_string(),
        recommended_stop,
        recommended_stop_method: stop_method,
        stop_candidates: stops,
        recommended_target,
        target_candidates: targets,
        risk_reward_ratio,
    }
}

fn entry_zone(
    daily: &[IndicatorBar],
    curr: &IndicatorBar,
    code: ScenarioCode,
    trigger_score: f64,
    thresholds: Option<Thresholds>,
) -> Entry {
    let close = curr.close;

    if let Some(t) = thresholds {
        if trigger_score >= t.buy {
            return Entry {
                code: ScenarioCode::A,
                actionable: true,
                low: close * 0.99,
                high: close * 1.01,
                desc: "trigger at optimized buy threshold, enter near current price",
            };
        }
        if trigger_score <= t.sell {
            return Entry {
                code,
                actionable: false,
                low: 0.0,
                high: 0.0,
                desc: "trigger at optimized sell threshold, stand aside",
            };
        }
    }

    let v = |field: Field| curr.value(field);
    let (low, high, desc) = match code {
        ScenarioCode::A => {
            let (ma5, ma10) = (v(Field::Ma5), v(Field::Ma10));
            if ma5 > 0.0 && close > ma5 * 1.05 {
                (ma10, ma5, "wait for pullback (MA10-MA5)")
            } else {
                (ma5, close, "active entry (MA5-close)")
            }
        }
        ScenarioCode::B => {
            let support = [v(Field::Ma60), v(Field::Ma20)]
                .into_iter()
                .filter(|&v| v > 0.0)
                .reduce(f64::min)
                .unwrap_or(0.0);
            (support * 0.98, support * 1.02, "limit order at MA20/MA60 support")
        }
        ScenarioCode::C => {
            let swing = min_low(daily, SWING_WINDOW).unwrap_or(0.0);
            let bb_lower = v(Field::BbLower);
            let high = if bb_lower > swing { bb_lower } else { swing * 1.02 };
            (swing, high, "bottom fishing (swing low to Bollinger lower)")
        }
        ScenarioCode::D | ScenarioCode::N => {
            return Entry {
                code,
                actionable: false,
                low: 0.0,
                high: 0.0,
                desc: "no entry",
            };
        }
    };

    let low = if low > 0.0 { low } else { close };
    let high = if high > 0.0 { high } else { close };
    Entry {
        code,
        actionable: true,
        low: low.min(high),
        high: low.max(high),
        desc,
    }
}

fn stop_candidates(daily: &[IndicatorBar], curr: &IndicatorBar, basis: f64) -> Vec<PriceLevel> {
    let mut stops = Vec::new();

    if let Some(atr) = curr.indicators.get(Field::Atr).filter(|&a| a > 0.0) {
        stops.push(PriceLevel::new(
            LevelMethod::Atr,
            basis - ATR_MULTIPLIER * atr,
            "entry minus 2x ATR",
        ));
    }

    stops.push(PriceLevel::new(
        LevelMethod::MovingAverage,
        curr.value(Field::Ma20),
        "trend stop at MA20",
    ));

    // first bar wins on equal volume
    let key = tail(daily, KEY_CANDLE_WINDOW)
        .iter()
        .reduce(|best, b| if b.volume > best.volume { b } else { best });
    if let Some(key) = key {
        stops.push(PriceLevel::new(
            LevelMethod::KeyCandle,
            key.low,
            "low of the heaviest-volume bar in 10 bars",
        ));
    }

    if let Some(swing) = min_low(daily, SWING_WINDOW) {
        stops.push(PriceLevel::new(LevelMethod::SwingLow, swing, "lowest low of 20 bars"));
    }

    stops.retain(|s| s.price > 0.0 && s.price.is_finite());
    stops
}

fn recommend_stop(stops: &mut [PriceLevel], code: ScenarioCode) -> Option<LevelMethod> {
    let preferred = if code == ScenarioCode::C {
        LevelMethod::SwingLow
    } else {
        LevelMethod::Atr
    };
    let index = stops
        .iter()
        .position(|s| s.method == preferred)
        .or_else(|| stops.iter().position(|s| s.method == LevelMethod::SwingLow))?;
    stops[index].is_recommended = true;
    Some(stops[index].method)
}

fn target_candidates(daily: &[IndicatorBar], curr: &IndicatorBar, basis: f64) -> Vec<PriceLevel> {
    let wave = match (max_high(daily, SWING_WINDOW), min_low(daily, SWING_WINDOW)) {
        (Some(h), Some(l)) => h - l,
        _ => 0.0,
    };

    let mut targets = vec![
        PriceLevel::new(LevelMethod::NMeasure, basis + wave, "equal-wave projection"),
        PriceLevel::new(
            LevelMethod::Fibonacci,
            basis + FIB_EXTENSION * wave,
            "1.618 wave extension",
        ),
        PriceLevel::new(LevelMethod::Ma60, curr.value(Field::Ma60), "quarterly line overhead"),
        PriceLevel::new(LevelMethod::Ma120, curr.value(Field::Ma120), "half-year line overhead"),
        PriceLevel::new(LevelMethod::Ma240, curr.value(Field::Ma240), "annual line overhead"),
        PriceLevel::new(LevelMethod::BollingerUpper, curr.value(Field::BbUpper), "upper band pressure"),
    ];
    if let Some(high) = prior_high(daily) {
        targets.push(PriceLevel::new(LevelMethod::PriorHigh, high, "trapped supply at the prior high"));
    }

    targets.retain(|t| t.price.is_finite() && t.price > basis * TARGET_MARGIN);
    targets.sort_by(|a, b| a.price.total_cmp(&b.price));
    targets
}

/// Highest high of the 20 bars before the current one.
fn prior_high(daily: &[IndicatorBar]) -> Option<f64> {
    let (_, before) = daily.split_last()?;
    max_high(before, SWING_WINDOW)
}

fn recommend_target(
    targets: &mut Vec<PriceLevel>,
    daily: &[IndicatorBar],
    close: f64,
    basis: f64,
    code: ScenarioCode,
) -> f64 {
    let index = match code {
        ScenarioCode::A => {
            let breakout = prior_high(daily).is_some_and(|h| close > h * 1.05);
            let method = if breakout {
                LevelMethod::Fibonacci
            } else {
                LevelMethod::NMeasure
            };
            targets.iter().position(|t| t.method == method)
        }
        ScenarioCode::B => targets
            .iter()
            .position(|t| t.method == LevelMethod::BollingerUpper),
        // sorted ascending, so the first resistance is the nearest
        _ => targets.iter().position(|t| t.method.is_resistance()),
    };

    let index = match index.or(if targets.is_empty() { None } else { Some(0) }) {
        Some(i) => i,
        None => {
            targets.push(PriceLevel::new(
                LevelMethod::Fallback,
                basis * FALLBACK_TARGET,
                "no valid resistance, default 10% target",
            ));
            targets.len() - 1
        }
    };
    targets[index].is_recommended = true;
    targets[index].price
}

fn strategy_text(code: ScenarioCode, actionable: bool) -> &'static str {
    match (code, actionable) {
        (ScenarioCode::A, true) => "Aggressive entry: trend is strong, aim for the wave target. Add if MA5 holds on a retest.",
        (ScenarioCode::B, true) => "Wait for the signal: bulls are resting. Buy support or the breakout of the prior high.",
        (ScenarioCode::C, true) => "Rebound trade: counter-trend, high risk. Take profit into overhead resistance.",
        (ScenarioCode::D, _) => "Stay flat: no support below. Weak bounces that fail at MA10 can be shorted.",
        _ => "Observe: no clear direction, wait for confirmation.",
    }
}
