//! Simulator and optimizer behaviour over scored series.

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use trendscout::domain::backtest::{self, Action, BacktestConfig};
use trendscout::domain::optimizer::{self, DEFAULT_BUY_CANDIDATES, DEFAULT_SELL_CANDIDATES};
use trendscout::domain::scorer::{score_series, FastTriggerScorer, FullTriggerScorer, TriggerScorer};

#[test]
fn never_reaching_buy_threshold_is_flat() {
    let s = scored(&[(10.0, Some(1.0)), (11.0, Some(2.9)), (9.0, Some(-4.0)), (12.0, None)]);
    let report = backtest::run(&s, 3.0, -2.0, &BacktestConfig::default());
    assert!(report.trades.is_empty());
    assert_eq!(report.total_return_pct, 0.0);
    assert_eq!(report.win_rate_pct, 0.0);
    assert_eq!(report.max_drawdown_pct, 0.0);
    assert!(!report.still_holding);
    assert!(report.equity_curve.iter().all(|p| p.action == Action::Hold));
}

#[test]
fn low_scoring_series_selects_low_buy_candidate() {
    let points: Vec<(f64, Option<f64>)> = (0..40)
        .map(|i| (20.0 + i as f64, Some(if i % 3 == 0 { 2.0 } else { 0.5 })))
        .collect();
    let s = scored(&points);
    assert!(s.max_score().unwrap() <= 2.0);

    let result = optimizer::optimize(
        &s,
        &DEFAULT_BUY_CANDIDATES,
        &DEFAULT_SELL_CANDIDATES,
        &BacktestConfig::default(),
    )
    .unwrap();
    assert!(result.best.buy <= 2.0);
    assert!(result.report.total_return_pct > 0.0);
}

#[test]
fn fast_scorer_warms_up_for_nineteen_bars() {
    let closes: Vec<f64> = (0..40).map(|i| 50.0 + i as f64).collect();
    let daily = series(scored_daily(&closes));
    let scored = score_series(&daily, &FastTriggerScorer);
    assert_eq!(scored.len(), 40);
    assert!(scored.bars[..19].iter().all(|b| b.score.is_none()));
    assert!(scored.bars[19..].iter().all(|b| b.score.is_some()));

    let report = backtest::run(&scored, 3.0, -2.0, &BacktestConfig::default());
    assert_eq!(report.trades.len(), 1);
    assert_eq!(report.trades[0].entry_date, day(19));
    assert!(report.still_holding);
    assert_eq!(report.win_rate_pct, 0.0);
    assert!(report.total_return_pct > 0.0);
}

#[test]
fn both_scorers_share_the_warm_up_and_name_themselves() {
    let closes: Vec<f64> = (0..30).map(|i| 80.0 - (i % 7) as f64).collect();
    let daily = series(scored_daily(&closes));
    let full = FullTriggerScorer::default();
    let fast = FastTriggerScorer;
    assert_eq!(full.name(), "full");
    assert_eq!(fast.name(), "fast");

    let a = score_series(&daily, &full);
    let b = score_series(&daily, &fast);
    for (x, y) in a.bars.iter().zip(&b.bars) {
        assert_eq!(x.score.is_some(), y.score.is_some());
    }
}

#[test]
fn equity_tracks_position_value() {
    let config = BacktestConfig {
        initial_capital: 1000.0,
        fee_rate: 0.0,
        tax_rate: 0.0,
    };
    let s = scored(&[(10.0, Some(5.0)), (12.5, Some(0.0)), (8.0, Some(-5.0))]);
    let report = backtest::run(&s, 3.0, -2.0, &config);
    let equity: Vec<f64> = report.equity_curve.iter().map(|p| p.equity).collect();
    assert_relative_eq!(equity[0], 1000.0, epsilon = 1e-9);
    assert_relative_eq!(equity[1], 1250.0, epsilon = 1e-9);
    assert_relative_eq!(equity[2], 800.0, epsilon = 1e-9);
    assert_relative_eq!(report.max_drawdown_pct, -36.0, epsilon = 1e-9);
    assert_relative_eq!(report.total_return_pct, -20.0, epsilon = 1e-9);
}

fn scored_points() -> impl Strategy<Value = Vec<(f64, Option<f64>)>> {
    prop::collection::vec((1.0f64..500.0, prop::option::weighted(0.9, -5.0f64..5.0)), 1..120)
}

proptest! {
    #[test]
    fn at_most_one_position_and_costs_charged_once(
        points in scored_points(),
        buy in 0.5f64..4.0,
        sell in -4.0f64..-0.5,
        fee_rate in 0.0f64..0.01,
        tax_rate in 0.0f64..0.01,
    ) {
        let config = BacktestConfig { initial_capital: 100_000.0, fee_rate, tax_rate };
        let s = scored(&points);
        let r = backtest::run(&s, buy, sell, &config);

        prop_assert_eq!(r.equity_curve.len(), s.len());
        prop_assert!(r.trades.iter().rev().skip(1).all(|t| !t.is_open()));
        prop_assert_eq!(r.still_holding, r.trades.last().is_some_and(|t| t.is_open()));
        prop_assert_eq!(r.closed_trades + r.open_trades, r.trades.len());
        prop_assert!(r.open_trades <= 1);

        for pair in r.trades.windows(2) {
            prop_assert!(pair[0].exit_date.unwrap() < pair[1].entry_date);
        }

        let mut fees = 0.0;
        let mut tax = 0.0;
        for t in &r.trades {
            let notional = t.shares as f64 * t.entry_price;
            fees += t.cost_incl_fee - notional;
            if let (Some(exit), Some(exit_price)) = (t.exit_date, t.exit_price) {
                prop_assert!(exit > t.entry_date);
                prop_assert!(t.pnl.is_some() && t.return_pct.is_some());
                let revenue = t.shares as f64 * exit_price;
                fees += revenue * fee_rate;
                tax += revenue * tax_rate;
            } else {
                prop_assert!(t.exit_price.is_none() && t.pnl.is_none() && t.return_pct.is_none());
            }
        }
        prop_assert!((r.total_fees - fees).abs() < 1e-6);
        prop_assert!((r.total_tax - tax).abs() < 1e-6);

        prop_assert!(r.max_drawdown_pct <= 0.0);
        prop_assert!((0.0..=100.0).contains(&r.win_rate_pct));
    }

    #[test]
    fn optimizer_pick_dominates_grid(points in scored_points()) {
        let s = scored(&points);
        let config = BacktestConfig::default();
        let result = optimizer::optimize(&s, &DEFAULT_BUY_CANDIDATES, &DEFAULT_SELL_CANDIDATES, &config).unwrap();

        prop_assert!(DEFAULT_BUY_CANDIDATES.contains(&result.best.buy));
        prop_assert!(DEFAULT_SELL_CANDIDATES.contains(&result.best.sell));
        prop_assert_eq!(result.trials.len(), DEFAULT_BUY_CANDIDATES.len() * DEFAULT_SELL_CANDIDATES.len());
        for &buy in &DEFAULT_BUY_CANDIDATES {
            for &sell in &DEFAULT_SELL_CANDIDATES {
                let other = backtest::run(&s, buy, sell, &config);
                prop_assert!(result.report.total_return_pct >= other.total_return_pct);
            }
        }
        let replay = backtest::run(&s, result.best.buy, result.best.sell, &config);
        prop_assert_eq!(replay, result.report);
    }
}
