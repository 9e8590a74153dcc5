//! Candlestick and chart pattern recognition.
//!
//! Every detector is a free function of a bar window whose last bar is the
//! evaluation bar; none of them reads past the end of the slice it is given.

pub mod candle;
pub mod chart;

use crate::domain::score::ScoreBreakdown;

/// One recognised pattern and its score contribution.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternHit {
    pub label: &'static str,
    pub delta: f64,
    pub note: String,
}

/// Result of running one or more detectors: `(score delta, messages)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternSignal {
    pub hits: Vec<PatternHit>,
}

impl PatternSignal {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn single(label: &'static str, delta: f64, note: impl Into<String>) -> Self {
        Self {
            hits: vec![PatternHit {
                label,
                delta,
                note: note.into(),
            }],
        }
    }

    pub fn score(&self) -> f64 {
        self.hits.iter().map(|h| h.delta).sum()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.hits.iter().map(|h| h.note.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn merge(&mut self, other: PatternSignal) {
        self.hits.extend(other.hits);
    }

    pub fn has(&self, label: &str) -> bool {
        self.hits.iter().any(|h| h.label == label)
    }

    /// Record every hit into `breakdown`, prefixing notes with `context`.
    pub fn record_into(self, breakdown: &mut ScoreBreakdown, context: &str) {
        for hit in self.hits {
            let note = if context.is_empty() {
                hit.note
            } else {
                format!("{context} {}", hit.note)
            };
            breakdown.add(hit.label, hit.delta, note);
        }
    }
}
