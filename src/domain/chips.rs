//! Chip (ownership and positioning) factors.
//!
//! The two market schemas are mutually exclusive and resolved once when the
//! input is constructed; scoring dispatches on the variant.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::score::ScoreBreakdown;

/// Domestic institutional flow, margin and day-trading figures.
/// Percentages are in percent units (12.5 means 12.5%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomesticChips {
    pub foreign_net: Option<f64>,
    pub trust_net: Option<f64>,
    pub dealer_net: Option<f64>,
    pub trust_buy_streak: Option<u32>,
    pub margin_change_5d_pct: Option<f64>,
    pub margin_utilization_pct: Option<f64>,
    pub day_trade_ratio_pct: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsiderSentiment {
    Bullish,
    Neutral,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalystRating {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl AnalystRating {
    fn is_buy(self) -> bool {
        matches!(self, AnalystRating::StrongBuy | AnalystRating::Buy)
    }

    fn is_sell(self) -> bool {
        matches!(self, AnalystRating::StrongSell | AnalystRating::Sell)
    }
}

/// International ownership, short interest, insider and analyst data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternationalChips {
    pub institutional_pct_held: Option<f64>,
    pub institutional_change_pct: Option<f64>,
    pub short_pct_float: Option<f64>,
    pub days_to_cover: Option<f64>,
    pub short_change_pct: Option<f64>,
    pub insider_sentiment: Option<InsiderSentiment>,
    pub insider_buys: u32,
    pub insider_sells: u32,
    pub analyst_rating: Option<AnalystRating>,
    pub analyst_upside_pct: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "market", rename_all = "snake_case")]
pub enum ChipFactors {
    #[default]
    None,
    Domestic(DomesticChips),
    International(InternationalChips),
}

impl ChipFactors {
    pub fn is_none(&self) -> bool {
        matches!(self, ChipFactors::None)
    }

    /// Unscaled chip sub-score.
    pub fn score(&self) -> ScoreBreakdown {
        match self {
            ChipFactors::None => ScoreBreakdown::new(),
            ChipFactors::Domestic(d) => score_domestic(d),
            ChipFactors::International(i) => score_international(i),
        }
    }
}

fn score_domestic(c: &DomesticChips) -> ScoreBreakdown {
    let mut b = ScoreBreakdown::new();

    let flows = [c.foreign_net, c.trust_net, c.dealer_net];
    if flows.iter().any(Option::is_some) {
        let net: f64 = flows.iter().flatten().sum();
        if net > 0.0 {
            b.add("institutional_flow", 1.0, format!("three institutions net buying ({net:.0})"));
        } else if net < 0.0 {
            b.add("institutional_flow", -1.0, format!("three institutions net selling ({net:.0})"));
        }
    }

    if let Some(streak) = c.trust_buy_streak.filter(|&s| s >= 3) {
        b.add("trust_streak", 1.0, format!("investment trust buying {streak} days in a row"));
    }

    if let (Some(foreign), Some(trust)) = (c.foreign_net, c.trust_net) {
        if foreign > 0.0 && trust > 0.0 {
            b.add("joint_buying", 0.5, "foreign and trust buying together");
        }
    }

    match c.margin_change_5d_pct {
        Some(pct) if pct > 10.0 => {
            b.add("margin_change", -0.5, format!("margin balance up {pct:.1}% in 5 days, retail crowding"))
        }
        Some(pct) if pct < -10.0 => {
            b.add("margin_change", 0.5, format!("margin balance down {:.1}% in 5 days, chips cleaner", pct.abs()))
        }
        _ => {}
    }

    if let Some(pct) = c.margin_utilization_pct.filter(|&p| p > 60.0) {
        b.add("margin_utilization", -0.5, format!("margin utilisation high at {pct:.1}%"));
    }

    if let Some(pct) = c.day_trade_ratio_pct.filter(|&p| p > 40.0) {
        b.add("day_trading", -0.5, format!("day trading {pct:.1}% of volume, speculative"));
    }

    b
}

fn score_international(c: &InternationalChips) -> ScoreBreakdown {
    let mut b = ScoreBreakdown::new();

    match c.institutional_pct_held {
        Some(pct) if pct > 80.0 => b.add("institutional_holding", 1.5, format!("institutions hold {pct:.1}%")),
        Some(pct) if pct > 60.0 => b.add("institutional_holding", 1.0, format!("institutions hold {pct:.1}%")),
        Some(pct) if pct < 20.0 => {
            b.add("institutional_holding", -0.5, format!("institutions hold only {pct:.1}%"))
        }
        _ => {}
    }

    match c.institutional_change_pct {
        Some(pct) if pct > 5.0 => b.add("institutional_change", 1.0, format!("institutions adding {pct:.1}%")),
        Some(pct) if pct < -5.0 => {
            b.add("institutional_change", -1.0, format!("institutions trimming {:.1}%", pct.abs()))
        }
        _ => {}
    }

    match c.short_pct_float {
        Some(pct) if pct > 20.0 => b.add("short_interest", 0.5, format!("short interest {pct:.1}% of float, squeeze fuel")),
        Some(pct) if pct > 10.0 => b.info("short_interest", format!("short interest elevated at {pct:.1}%")),
        _ => {}
    }

    if let Some(days) = c.days_to_cover.filter(|&d| d > 5.0) {
        b.add("days_to_cover", 0.5, format!("{days:.1} days to cover"));
    }

    match c.short_change_pct {
        Some(pct) if pct < -20.0 => b.add("short_change", 0.5, "shorts covering"),
        Some(pct) if pct > 20.0 => b.add("short_change", -0.5, "shorts piling in"),
        _ => {}
    }

    match c.insider_sentiment {
        Some(InsiderSentiment::Bullish) if c.insider_buys > 3 => {
            b.add("insider", 1.5, format!("{} insider buys", c.insider_buys))
        }
        Some(InsiderSentiment::Bullish) => b.add("insider", 0.5, "insiders net buying"),
        Some(InsiderSentiment::Bearish) if c.insider_sells > 5 => {
            b.add("insider", -1.5, format!("{} insider sells", c.insider_sells))
        }
        Some(InsiderSentiment::Bearish) => b.add("insider", -0.5, "insiders net selling"),
        _ => {}
    }

    let upside = c.analyst_upside_pct;
    match c.analyst_rating {
        Some(r) if r.is_buy() && upside.is_some_and(|u| u > 20.0) => b.add(
            "analyst",
            1.0,
            format!("analysts rate buy with {:.1}% upside", upside.unwrap_or_default()),
        ),
        Some(r) if r.is_sell() => b.add("analyst", -1.0, "analysts rate sell"),
        _ => match upside {
            Some(u) if u > 30.0 => b.add("analyst", 0.5, format!("target implies {u:.1}% upside")),
            Some(u) if u < -10.0 => b.add("analyst", -0.5, format!("target implies {:.1}% downside", u.abs())),
            _ => {}
        },
    }

    b
}

/// Positive scale applied to the chip sub-score, set by the trend regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegimeModulator(f64);

impl RegimeModulator {
    pub fn from_trend(trend_score: f64) -> Self {
        if trend_score >= 3.0 {
            Self(1.5)
        } else if trend_score <= -2.0 {
            Self(0.5)
        } else {
            Self(1.0)
        }
    }

    pub fn factor(self) -> f64 {
        self.0
    }

    /// Scale every entry of `raw` by the modulator.
    pub fn apply(self, raw: ScoreBreakdown) -> ScoreBreakdown {
        let mut scaled = ScoreBreakdown::new();
        for entry in raw.entries {
            let note = if (self.0 - 1.0).abs() < f64::EPSILON {
                entry.note
            } else {
                format!("{} (x{})", entry.note, self.0)
            };
            scaled.add(&format!("chips.{}", entry.label), entry.delta * self.0, note);
        }
        scaled
    }
}

impl fmt::Display for RegimeModulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_scores_nothing() {
        assert!(ChipFactors::None.score().is_empty());
    }

    #[test]
    fn domestic_rules() {
        let chips = ChipFactors::Domestic(DomesticChips {
            foreign_net: Some(1200.0),
            trust_net: Some(300.0),
            dealer_net: Some(-100.0),
            trust_buy_streak: Some(4),
            margin_change_5d_pct: Some(-12.0),
            margin_utilization_pct: Some(65.0),
            day_trade_ratio_pct: Some(20.0),
        });
        let b = chips.score();
        // +1 flow, +1 streak, +0.5 joint, +0.5 margin drop, -0.5 utilisation
        assert!((b.total - 2.5).abs() < 1e-9);
        assert!(b.has("joint_buying"));
        assert!(!b.has("day_trading"));
    }

    #[test]
    fn domestic_missing_fields_are_skipped() {
        let b = ChipFactors::Domestic(DomesticChips::default()).score();
        assert!(b.is_empty());
    }

    #[test]
    fn international_rules() {
        let chips = ChipFactors::International(InternationalChips {
            institutional_pct_held: Some(85.0),
            short_pct_float: Some(12.0),
            insider_sentiment: Some(InsiderSentiment::Bearish),
            insider_sells: 8,
            analyst_rating: Some(AnalystRating::Buy),
            analyst_upside_pct: Some(25.0),
            ..Default::default()
        });
        let b = chips.score();
        // +1.5 holding, info short, -1.5 insider, +1 analyst
        assert!((b.total - 1.0).abs() < 1e-9);
        assert!(b.has("short_interest"));
        assert!((b.contribution("short_interest")).abs() < f64::EPSILON);
    }

    #[test]
    fn analyst_upside_without_rating() {
        let chips = ChipFactors::International(InternationalChips {
            analyst_rating: Some(AnalystRating::Hold),
            analyst_upside_pct: Some(-15.0),
            ..Default::default()
        });
        assert!((chips.score().total + 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn modulator_regimes() {
        assert_eq!(RegimeModulator::from_trend(3.0).factor(), 1.5);
        assert_eq!(RegimeModulator::from_trend(2.9).factor(), 1.0);
        assert_eq!(RegimeModulator::from_trend(-1.9).factor(), 1.0);
        assert_eq!(RegimeModulator::from_trend(-2.0).factor(), 0.5);
    }

    #[test]
    fn modulator_preserves_sign() {
        let mut raw = ScoreBreakdown::new();
        raw.add("institutional_flow", -1.0, "selling");
        raw.add("trust_streak", 1.0, "buying");
        for trend in [-5.0, 0.0, 5.0] {
            let scaled = RegimeModulator::from_trend(trend).apply(raw.clone());
            assert!(scaled.entries[0].delta < 0.0);
            assert!(scaled.entries[1].delta > 0.0);
        }
        let scaled = RegimeModulator::from_trend(4.0).apply(raw);
        assert!((scaled.contribution("chips.institutional_flow") + 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn tagged_json_round_trip() {
        let json = r#"{"market":"domestic","foreign_net":500.0,"trust_buy_streak":3}"#;
        let chips: ChipFactors = serde_json::from_str(json).unwrap();
        match &chips {
            ChipFactors::Domestic(d) => assert_eq!(d.trust_buy_streak, Some(3)),
            other => panic!("unexpected variant {other:?}"),
        }
        let json = r#"{"market":"international","insider_sentiment":"bullish","insider_buys":5}"#;
        let chips: ChipFactors = serde_json::from_str(json).unwrap();
        assert!((chips.score().total - 1.5).abs() < f64::EPSILON);
    }
}
