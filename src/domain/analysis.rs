//! One-instrument analysis pass: trend, trigger, scenario, plan and checklist.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::domain::action_plan::{self, ActionPlan, Thresholds};
use crate::domain::checklist::{self, MonitoringChecklist};
use crate::domain::chips::ChipFactors;
use crate::domain::factor::FactorScorer;
use crate::domain::scenario::{self, Scenario};
use crate::domain::score::ScoreBreakdown;
use crate::domain::series::IndicatorSeries;

#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub code: String,
    pub weekly: IndicatorSeries,
    pub daily: IndicatorSeries,
    pub chips: ChipFactors,
    pub thresholds: Option<Thresholds>,
}

impl AnalysisInput {
    pub fn new(code: impl Into<String>, weekly: IndicatorSeries, daily: IndicatorSeries) -> Self {
        Self {
            code: code.into(),
            weekly,
            daily,
            chips: ChipFactors::None,
            thresholds: None,
        }
    }

    pub fn with_chips(mut self, chips: ChipFactors) -> Self {
        self.chips = chips;
        self
    }

    pub fn with_thresholds(mut self, thresholds: Option<Thresholds>) -> Self {
        self.thresholds = thresholds;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub code: String,
    /// Date of the last daily bar, when there is one.
    pub as_of: Option<NaiveDate>,
    pub trend: ScoreBreakdown,
    pub trigger: ScoreBreakdown,
    pub scenario: Scenario,
    pub plan: ActionPlan,
    pub checklist: MonitoringChecklist,
}

pub fn analyze(input: &AnalysisInput) -> AnalysisReport {
    analyze_with(&FactorScorer::default(), input)
}

/// Trend feeds the scenario and the chip modulator; trigger feeds the plan.
pub fn analyze_with(scorer: &FactorScorer, input: &AnalysisInput) -> AnalysisReport {
    let weekly = input.weekly.bars();
    let daily = input.daily.bars();

    let trend = scorer.trend(weekly);
    let trigger = scorer.trigger(daily, trend.total, &input.chips);
    let scenario = scenario::classify(trend.total, weekly.len());
    let plan = action_plan::plan(daily, &scenario, trigger.total, input.thresholds);
    let checklist = checklist::generate(daily, &scenario);

    debug!(
        code = %input.code,
        trend = trend.total,
        trigger = trigger.total,
        scenario = %scenario.code,
        actionable = plan.is_actionable,
        "analysis complete"
    );

    AnalysisReport {
        code: input.code.clone(),
        as_of: input.daily.last().map(|b| b.date),
        trend,
        trigger,
        scenario,
        plan,
        checklist,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::{Field, IndicatorBar};
    use crate::domain::scenario::ScenarioCode;
    use chrono::Duration;

    fn flat(n: usize, step_days: i64) -> IndicatorSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        IndicatorSeries::new(
            (0..n)
                .map(|i| {
                    IndicatorBar::new(start + Duration::days(i as i64 * step_days), 50.0, 51.0, 49.0, 50.0, 1000.0)
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn empty_inputs_degrade_to_neutral() {
        let report = analyze(&AnalysisInput::new("X", IndicatorSeries::empty(), IndicatorSeries::empty()));
        assert!(report.trend.insufficient_data);
        assert!(report.trigger.insufficient_data);
        assert_eq!(report.scenario.code, ScenarioCode::N);
        assert!(!report.plan.is_actionable);
        assert!(report.checklist.is_empty());
        assert_eq!(report.as_of, None);
    }

    #[test]
    fn bullish_weekly_structure_drives_scenario_a() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let weekly: Vec<IndicatorBar> = (0..30)
            .map(|i| {
                let close = 100.0 + i as f64 * 2.0;
                IndicatorBar::new(start + Duration::weeks(i), close - 1.0, close + 1.0, close - 2.0, close, 1000.0)
                    .with(Field::Ma20, close - 10.0)
                    .with(Field::Ma60, close - 20.0)
                    .with(Field::Adx, 30.0)
                    .with(Field::PlusDi, 30.0)
                    .with(Field::MinusDi, 10.0)
                    .with(Field::Obv, i as f64 * 100.0)
            })
            .collect();
        let input = AnalysisInput::new("2330", IndicatorSeries::new(weekly).unwrap(), flat(80, 1));
        let report = analyze(&input);
        assert!(report.trend.total >= 3.0, "trend {}", report.trend.total);
        assert_eq!(report.scenario.code, ScenarioCode::A);
        assert_eq!(report.plan.scenario, ScenarioCode::A);
        assert_eq!(report.checklist.scenario, ScenarioCode::A);
        assert!(report.as_of.is_some());
    }

    #[test]
    fn same_input_same_report() {
        let input = AnalysisInput::new("X", flat(30, 7), flat(90, 1));
        assert_eq!(analyze(&input), analyze(&input));
    }
}
