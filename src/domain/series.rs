//! Ordered indicator series and trailing-window helpers.
//!
//! Every detector in the core works on a `&[IndicatorBar]` whose last element
//! is the evaluation bar, so a causal window is just a prefix slice.

use crate::domain::bar::IndicatorBar;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SeriesError {
    #[error("bar {index} ({date}) is not after the previous bar")]
    OutOfOrder { index: usize, date: chrono::NaiveDate },
}

/// Bars ordered by strictly increasing date. Gaps are allowed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSeries {
    bars: Vec<IndicatorBar>,
}

impl IndicatorSeries {
    pub fn new(bars: Vec<IndicatorBar>) -> Result<Self, SeriesError> {
        for (i, pair) in bars.windows(2).enumerate() {
            if pair[1].date <= pair[0].date {
                return Err(SeriesError::OutOfOrder {
                    index: i + 1,
                    date: pair[1].date,
                });
            }
        }
        Ok(Self { bars })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn bars(&self) -> &[IndicatorBar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&IndicatorBar> {
        self.bars.last()
    }

    /// Causal window ending at `index` (inclusive).
    pub fn prefix(&self, index: usize) -> &[IndicatorBar] {
        let end = (index + 1).min(self.bars.len());
        &self.bars[..end]
    }
}

/// Last `n` bars (or all of them when fewer exist).
pub fn tail(bars: &[IndicatorBar], n: usize) -> &[IndicatorBar] {
    &bars[bars.len().saturating_sub(n)..]
}

/// Mean volume of the trailing `n` bars, current bar included.
pub fn mean_volume(bars: &[IndicatorBar], n: usize) -> Option<f64> {
    mean_of(bars, n, |b| b.volume)
}

/// Mean candle body of the trailing `n` bars, current bar included.
pub fn mean_body(bars: &[IndicatorBar], n: usize) -> Option<f64> {
    mean_of(bars, n, IndicatorBar::body)
}

fn mean_of(bars: &[IndicatorBar], n: usize, f: impl Fn(&IndicatorBar) -> f64) -> Option<f64> {
    if n == 0 || bars.len() < n {
        return None;
    }
    let sum: f64 = tail(bars, n).iter().map(f).sum();
    let mean = sum / n as f64;
    mean.is_finite().then_some(mean)
}

pub fn max_high(bars: &[IndicatorBar], n: usize) -> Option<f64> {
    tail(bars, n).iter().map(|b| b.high).reduce(f64::max)
}

pub fn min_low(bars: &[IndicatorBar], n: usize) -> Option<f64> {
    tail(bars, n).iter().map(|b| b.low).reduce(f64::min)
}

pub fn closes(bars: &[IndicatorBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}

/// `(current, previous)` for the last two bars.
pub fn last_two(bars: &[IndicatorBar]) -> Option<(&IndicatorBar, &IndicatorBar)> {
    match bars {
        [.., prev, curr] => Some((curr, prev)),
        _ => None,
    }
}
