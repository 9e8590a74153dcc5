//! TrendScore to trading scenario mapping.

use serde::Serialize;
use std::fmt;

use crate::domain::factor::TREND_MIN_BARS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScenarioCode {
    A,
    B,
    C,
    D,
    N,
}

impl fmt::Display for ScenarioCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScenarioCode::A => "A",
            ScenarioCode::B => "B",
            ScenarioCode::C => "C",
            ScenarioCode::D => "D",
            ScenarioCode::N => "N",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Offensive,
    Watch,
    Caution,
    Defensive,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub code: ScenarioCode,
    pub title: &'static str,
    pub severity: Severity,
    pub description: &'static str,
}

impl Scenario {
    pub fn from_code(code: ScenarioCode) -> Self {
        let (title, severity, description) = match code {
            ScenarioCode::A => (
                "Scenario A: strong offense",
                Severity::Offensive,
                "Weekly trend strongly bullish; follow the trend with full size.",
            ),
            ScenarioCode::B => (
                "Scenario B: pullback watch",
                Severity::Watch,
                "Long-term uptrend with short-term chop; wait for support to hold.",
            ),
            ScenarioCode::C => (
                "Scenario C: rebound trade",
                Severity::Caution,
                "Counter-trend bounce only; keep stops tight.",
            ),
            ScenarioCode::D => (
                "Scenario D: stay flat",
                Severity::Defensive,
                "Trend is down; do not try to catch the bottom.",
            ),
            ScenarioCode::N => (
                "Neutral: observing",
                Severity::Neutral,
                "Not enough weekly history for a trend call; stand aside.",
            ),
        };
        Self {
            code,
            title,
            severity,
            description,
        }
    }
}

/// Map a TrendScore to a scenario. `N` only when fewer than five weekly bars exist.
///
/// Ranges: `>= 3` A, `[1, 3)` B, `[-2, 0]` C, everything else D. Scores in
/// the open interval `(0, 1)` therefore land in D.
pub fn classify(trend_score: f64, weekly_bars: usize) -> Scenario {
    if weekly_bars < TREND_MIN_BARS {
        return Scenario::from_code(ScenarioCode::N);
    }
    let code = if trend_score >= 3.0 {
        ScenarioCode::A
    } else if (1.0..3.0).contains(&trend_score) {
        ScenarioCode::B
    } else if (-2.0..=0.0).contains(&trend_score) {
        ScenarioCode::C
    } else {
        ScenarioCode::D
    };
    Scenario::from_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(score: f64) -> ScenarioCode {
        classify(score, 52).code
    }

    #[test]
    fn integer_and_half_boundaries() {
        let cases = [
            (10.0, ScenarioCode::A),
            (3.0, ScenarioCode::A),
            (2.5, ScenarioCode::B),
            (2.999, ScenarioCode::B),
            (1.0, ScenarioCode::B),
            (0.5, ScenarioCode::D),
            (0.999, ScenarioCode::D),
            (0.0, ScenarioCode::C),
            (-0.0, ScenarioCode::C),
            (-0.5, ScenarioCode::C),
            (-2.0, ScenarioCode::C),
            (-2.5, ScenarioCode::D),
            (-2.001, ScenarioCode::D),
            (-10.0, ScenarioCode::D),
        ];
        for (score, expected) in cases {
            assert_eq!(code(score), expected, "score {score}");
        }
    }

    #[test]
    fn n_only_when_weekly_history_short() {
        assert_eq!(classify(5.0, 4).code, ScenarioCode::N);
        assert_eq!(classify(5.0, 0).code, ScenarioCode::N);
        assert_eq!(classify(5.0, 5).code, ScenarioCode::A);
    }

    #[test]
    fn non_finite_scores_fall_to_d() {
        assert_eq!(code(f64::NAN), ScenarioCode::D);
        assert_eq!(code(f64::INFINITY), ScenarioCode::A);
        assert_eq!(code(f64::NEG_INFINITY), ScenarioCode::D);
    }

    #[test]
    fn fixed_metadata() {
        let s = classify(1.5, 10);
        assert_eq!(s.severity, Severity::Watch);
        assert_eq!(s.title, "Scenario B: pullback watch");
    }
}
