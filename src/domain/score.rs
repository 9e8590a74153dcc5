//! Additive score accumulation.
//!
//! A `ScoreBreakdown` keeps every contribution as a structured entry in
//! evaluation order; `total` is always the sum of the entry deltas.

use serde::Serialize;
use tracing::warn;

pub const INSUFFICIENT_DATA: &str = "insufficient_data";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreEntry {
    pub label: String,
    pub delta: f64,
    pub note: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total: f64,
    pub entries: Vec<ScoreEntry>,
    pub insufficient_data: bool,
}

impl ScoreBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Neutral result carrying an explicit insufficient-data marker.
    pub fn insufficient(have: usize, need: usize) -> Self {
        let mut breakdown = Self::new();
        breakdown.insufficient_data = true;
        breakdown.entries.push(ScoreEntry {
            label: INSUFFICIENT_DATA.to_string(),
            delta: 0.0,
            note: format!("have {have} bars, need {need}"),
        });
        breakdown
    }

    /// Append a contribution. Non-finite deltas are dropped.
    pub fn add(&mut self, label: &str, delta: f64, note: impl Into<String>) {
        if !delta.is_finite() {
            warn!(label, "dropping non-finite score contribution");
            return;
        }
        self.total += delta;
        self.entries.push(ScoreEntry {
            label: label.to_string(),
            delta,
            note: note.into(),
        });
    }

    /// Informational entry (zero delta).
    pub fn info(&mut self, label: &str, note: impl Into<String>) {
        self.add(label, 0.0, note);
    }

    /// Append all entries of another breakdown, preserving their order.
    pub fn extend(&mut self, other: ScoreBreakdown) {
        for entry in other.entries {
            self.add(&entry.label, entry.delta, entry.note);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the deltas recorded under `label`.
    pub fn contribution(&self, label: &str) -> f64 {
        self.entries
            .iter()
            .filter(|e| e.label == label)
            .map(|e| e.delta)
            .sum()
    }

    pub fn has(&self, label: &str) -> bool {
        self.entries.iter().any(|e| e.label == label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_is_sum_of_entries() {
        let mut b = ScoreBreakdown::new();
        b.add("a", 2.0, "two");
        b.add("b", -0.5, "minus half");
        b.info("c", "just saying");
        assert!((b.total - 1.5).abs() < f64::EPSILON);
        assert_eq!(b.len(), 3);
        let sum: f64 = b.entries.iter().map(|e| e.delta).sum();
        assert!((sum - b.total).abs() < f64::EPSILON);
    }

    #[test]
    fn order_is_preserved() {
        let mut b = ScoreBreakdown::new();
        b.add("first", 1.0, "");
        b.add("second", 1.0, "");
        b.add("third", 1.0, "");
        let labels: Vec<_> = b.entries.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[test]
    fn non_finite_delta_is_skipped() {
        let mut b = ScoreBreakdown::new();
        b.add("nan", f64::NAN, "");
        b.add("inf", f64::INFINITY, "");
        b.add("ok", 1.0, "");
        assert_eq!(b.len(), 1);
        assert!((b.total - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn insufficient_marker() {
        let b = ScoreBreakdown::insufficient(3, 20);
        assert!(b.insufficient_data);
        assert_eq!(b.total, 0.0);
        assert!(b.has(INSUFFICIENT_DATA));
        assert_eq!(b.entries[0].note, "have 3 bars, need 20");
    }

    #[test]
    fn extend_and_contribution() {
        let mut a = ScoreBreakdown::new();
        a.add("x", 1.0, "");
        let mut b = ScoreBreakdown::new();
        b.add("x", 0.5, "");
        b.add("y", -2.0, "");
        a.extend(b);
        assert!((a.total - (-0.5)).abs() < f64::EPSILON);
        assert!((a.contribution("x") - 1.5).abs() < f64::EPSILON);
        assert_eq!(a.contribution("missing"), 0.0);
    }
}
