//! Exhaustive buy/sell threshold grid search.

use serde::Serialize;
use tracing::debug;

use crate::domain::action_plan::Thresholds;
use crate::domain::backtest::{self, BacktestConfig, BacktestReport};
use crate::domain::scorer::ScoredSeries;

pub const DEFAULT_BUY_CANDIDATES: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];
pub const DEFAULT_SELL_CANDIDATES: [f64; 4] = [-1.0, -2.0, -3.0, -4.0];

/// Summary of one (buy, sell) trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trial {
    pub buy: f64,
    pub sell: f64,
    pub total_return_pct: f64,
    pub win_rate_pct: f64,
    pub max_drawdown_pct: f64,
    pub trades: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub best: Thresholds,
    pub report: BacktestReport,
    pub trials: Vec<Trial>,
}

/// Run every pair in buy-major order and keep the highest total return.
/// Ties keep the earlier pair. `None` when either candidate list is empty.
pub fn optimize(
    scored: &ScoredSeries,
    buy_candidates: &[f64],
    sell_candidates: &[f64],
    config: &BacktestConfig,
) -> Option<OptimizationResult> {
    let mut best: Option<(Thresholds, BacktestReport)> = None;
    let mut trials = Vec::with_capacity(buy_candidates.len() * sell_candidates.len());

    for &buy in buy_candidates {
        for &sell in sell_candidates {
            let report = backtest::run(scored, buy, sell, config);
            debug!(buy, sell, total_return_pct = report.total_return_pct, "optimizer trial");
            trials.push(Trial {
                buy,
                sell,
                total_return_pct: report.total_return_pct,
                win_rate_pct: report.win_rate_pct,
                max_drawdown_pct: report.max_drawdown_pct,
                trades: report.trades.len(),
            });

            let better = match &best {
                None => true,
                Some((_, current)) => report.total_return_pct > current.total_return_pct,
            };
            if better {
                best = Some((Thresholds { buy, sell }, report));
            }
        }
    }

    best.map(|(best, report)| OptimizationResult { best, report, trials })
}
