//! Advisory monitoring checklist. Never feeds back into scores or plans.

use serde::Serialize;

use crate::domain::bar::{Field, IndicatorBar};
use crate::domain::scenario::{Scenario, ScenarioCode};
use crate::domain::series::{last_two, max_high, mean_volume};

pub const MIN_BARS: usize = 60;

const KD_HIGH: f64 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonitoringChecklist {
    pub scenario: ScenarioCode,
    pub risk: Vec<String>,
    pub active: Vec<String>,
    pub future: Vec<String>,
}

impl MonitoringChecklist {
    pub fn empty(scenario: ScenarioCode) -> Self {
        Self {
            scenario,
            risk: Vec::new(),
            active: Vec::new(),
            future: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.risk.is_empty() && self.active.is_empty() && self.future.is_empty()
    }
}

pub fn generate(daily: &[IndicatorBar], scenario: &Scenario) -> MonitoringChecklist {
    let mut list = MonitoringChecklist::empty(scenario.code);
    if daily.len() < MIN_BARS {
        return list;
    }
    let Some((curr, prev)) = last_two(daily) else {
        return list;
    };
    let close = curr.close;
    let ma20 = curr.indicators.get(Field::Ma20);
    let ma60 = curr.indicators.get(Field::Ma60);

    // risk
    if let Some(ma) = ma20.filter(|&m| close < m) {
        list.risk.push(format!("close {close:.2} below MA20 {ma:.2}, short-term support lost"));
    }
    if let Some(ma) = ma60.filter(|&m| close < m) {
        list.risk.push(format!("close {close:.2} below MA60 {ma:.2}, medium-term trend broken"));
    }
    let heavy = mean_volume(daily, 5).is_some_and(|avg| avg > 0.0 && curr.volume > 2.0 * avg);
    if heavy && curr.is_bearish() {
        list.risk.push("explosive volume on a down bar, distribution risk".to_string());
    }
    let (k, d) = (curr.value(Field::K), curr.value(Field::D));
    let crossed_down = k < d && prev.value(Field::K) >= prev.value(Field::D);
    if crossed_down && d > KD_HIGH {
        list.risk.push(format!("KD death cross at high level (K {k:.1}, D {d:.1})"));
    }

    // active
    let before = &daily[..daily.len() - 1];
    if let Some(high) = max_high(before, 20).filter(|&h| close > h) {
        list.active.push(format!("breakout above the 20-bar high {high:.2}"));
    }
    if let Some(ma) = ma20.filter(|&m| close > m) {
        list.active.push(format!("holding above MA20 {ma:.2}"));
    }

    // future
    if let Some(ma) = ma20.filter(|&m| m > 0.0 && close > m * 1.05) {
        let pct = (close / ma - 1.0) * 100.0;
        list.future.push(format!("{pct:.1}% above MA20, wait for a 10-day pullback before adding"));
    }
    if let (Some(m20), Some(m60)) = (ma20, ma60) {
        if close > m20.min(m60) && close < m20.max(m60) {
            list.future.push("consolidating between MA60 and MA20, watch for a supported pullback".to_string());
        }
    }
    if ma60.is_some_and(|m| close < m) {
        list.future.push("below MA60, wait for a bottoming pattern or an MA20 reclaim".to_string());
    }

    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::classify;
    use chrono::{Duration, NaiveDate};

    fn bars(n: usize) -> Vec<IndicatorBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| IndicatorBar::new(start + Duration::days(i as i64), 100.0, 101.0, 99.0, 100.0, 1000.0))
            .collect()
    }

    #[test]
    fn short_history_is_empty() {
        let list = generate(&bars(59), &classify(3.0, 10));
        assert!(list.is_empty());
    }

    #[test]
    fn breakdown_risks() {
        let mut b = bars(70);
        let n = b.len();
        b[n - 1].open = 99.0;
        b[n - 1].close = 90.0;
        b[n - 1].volume = 5000.0;
        b[n - 1].indicators.set(Field::Ma20, 95.0);
        b[n - 1].indicators.set(Field::Ma60, 97.0);
        b[n - 1].indicators.set(Field::K, 82.0);
        b[n - 1].indicators.set(Field::D, 85.0);
        b[n - 2].indicators.set(Field::K, 88.0);
        b[n - 2].indicators.set(Field::D, 84.0);
        let list = generate(&b, &classify(-3.0, 10));
        assert_eq!(list.risk.len(), 4);
        assert!(list.active.is_empty());
        assert!(list.future.iter().any(|f| f.contains("bottoming")));
    }

    #[test]
    fn breakout_and_overextension() {
        let mut b = bars(70);
        let n = b.len();
        b[n - 1].close = 110.0;
        b[n - 1].high = 111.0;
        b[n - 1].indicators.set(Field::Ma20, 100.0);
        b[n - 1].indicators.set(Field::Ma60, 95.0);
        let list = generate(&b, &classify(4.0, 10));
        assert_eq!(list.active.len(), 2);
        assert!(list.risk.is_empty());
        assert_eq!(list.future.len(), 1);
        assert!(list.future[0].starts_with("10.0% above MA20"));
    }

    #[test]
    fn mid_range_consolidation() {
        let mut b = bars(70);
        let n = b.len();
        b[n - 1].indicators.set(Field::Ma20, 102.0);
        b[n - 1].indicators.set(Field::Ma60, 98.0);
        let list = generate(&b, &classify(1.5, 10));
        assert!(list.future.iter().any(|f| f.contains("between MA60 and MA20")));
    }
}
