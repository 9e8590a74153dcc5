//! Per-bar trigger scoring strategies for historical replay.
//!
//! `FullTriggerScorer` runs the complete daily factor scorer on every causal
//! prefix. `FastTriggerScorer` is the reduced rule set used for threshold
//! search: MA20 position, BIAS band, MACD histogram sign, KD cross, one-bar
//! OBV momentum and a single candlestick classification. It skips EFI,
//! divergence, DMI, chart morphology, price-volume, TD counts and chips, so
//! its scores run lower in magnitude and are not interchangeable with the
//! full TriggerScore.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::domain::bar::{Field, IndicatorBar};
use crate::domain::chips::ChipFactors;
use crate::domain::factor::{FactorScorer, TRIGGER_MIN_BARS};
use crate::domain::patterns::candle::{self, Bias};
use crate::domain::series::{last_two, IndicatorSeries};

pub trait TriggerScorer {
    fn name(&self) -> &'static str;

    /// Score for the last bar of `window`, or `None` during warm-up.
    fn score(&self, window: &[IndicatorBar]) -> Option<f64>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FullTriggerScorer {
    pub factors: FactorScorer,
}

impl TriggerScorer for FullTriggerScorer {
    fn name(&self) -> &'static str {
        "full"
    }

    fn score(&self, window: &[IndicatorBar]) -> Option<f64> {
        if window.len() < TRIGGER_MIN_BARS {
            return None;
        }
        Some(self.factors.trigger(window, 0.0, &ChipFactors::None).total)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FastTriggerScorer;

impl TriggerScorer for FastTriggerScorer {
    fn name(&self) -> &'static str {
        "fast"
    }

    fn score(&self, window: &[IndicatorBar]) -> Option<f64> {
        if window.len() < TRIGGER_MIN_BARS {
            return None;
        }
        let (curr, prev) = last_two(window)?;
        let mut score = 0.0;

        if let Some(ma20) = curr.indicators.get(Field::Ma20) {
            score += sign(curr.close - ma20);
        }

        let bias = curr.value(Field::Bias);
        if bias > 0.0 && bias < 10.0 {
            score += 1.0;
        } else if bias > 10.0 {
            score -= 1.0;
        } else if bias < -10.0 {
            score += 1.0;
        }

        score += sign(curr.value(Field::MacdHist));
        score += sign(curr.value(Field::K) - curr.value(Field::D));

        if curr.value(Field::Obv) > prev.value(Field::Obv) {
            score += 1.0;
        }

        if let Some(pattern) = candle::classify(window) {
            let weight = if pattern.is_major() { 2.0 } else { 1.0 };
            match pattern.bias() {
                Bias::Bullish => score += weight,
                Bias::Bearish => score -= weight,
                Bias::Neutral => {}
            }
        }

        Some(score)
    }
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// One replayable bar: date, close and the trigger score as of that bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredBar {
    pub date: NaiveDate,
    pub close: f64,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoredSeries {
    pub bars: Vec<ScoredBar>,
}

impl ScoredSeries {
    pub fn new(bars: Vec<ScoredBar>) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Highest score present, if any bar is scored.
    pub fn max_score(&self) -> Option<f64> {
        self.bars.iter().filter_map(|b| b.score).reduce(f64::max)
    }
}

/// Score every bar of `series` on its causal prefix.
pub fn score_series(series: &IndicatorSeries, scorer: &dyn TriggerScorer) -> ScoredSeries {
    let bars = series
        .bars()
        .iter()
        .enumerate()
        .map(|(i, bar)| ScoredBar {
            date: bar.date,
            close: bar.close,
            score: scorer.score(series.prefix(i)),
        })
        .collect::<Vec<_>>();
    debug!(scorer = scorer.name(), bars = bars.len(), "scored series");
    ScoredSeries::new(bars)
}
