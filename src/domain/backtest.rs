//! Flat-or-long trade simulation over a scored series.
//!
//! Fills happen at the bar close. A buy spends all cash net of the entry fee
//! on whole shares; a sell liquidates the position and pays fee plus tax.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::scorer::ScoredSeries;

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_FEE_RATE: f64 = 0.001425;
pub const DEFAULT_TAX_RATE: f64 = 0.003;
pub const DEFAULT_BUY_THRESHOLD: f64 = 3.0;
pub const DEFAULT_SELL_THRESHOLD: f64 = -2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Charged on both legs.
    pub fee_rate: f64,
    /// Charged on the sell leg only.
    pub tax_rate: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            fee_rate: DEFAULT_FEE_RATE,
            tax_rate: DEFAULT_TAX_RATE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Hold,
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub shares: u64,
    pub cost_incl_fee: f64,
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<f64>,
    pub pnl: Option<f64>,
    pub return_pct: Option<f64>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.exit_date.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    pub total_return_pct: f64,
    pub win_rate_pct: f64,
    /// Non-positive; -12.5 means a 12.5% peak-to-trough decline.
    pub max_drawdown_pct: f64,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub still_holding: bool,
    pub closed_trades: usize,
    pub open_trades: usize,
    pub final_equity: f64,
    pub total_fees: f64,
    pub total_tax: f64,
}

#[derive(Clone, Copy)]
enum State {
    Flat,
    Long { shares: u64 },
}

pub fn run(scored: &ScoredSeries, buy_threshold: f64, sell_threshold: f64, config: &BacktestConfig) -> BacktestReport {
    let mut cash = config.initial_capital;
    let mut state = State::Flat;
    let mut trades: Vec<Trade> = Vec::new();
    let mut equity_curve = Vec::with_capacity(scored.len());
    let mut total_fees = 0.0;
    let mut total_tax = 0.0;

    for bar in &scored.bars {
        let price = bar.close;
        let mut action = Action::Hold;

        if let Some(score) = bar.score {
            match state {
                State::Long { shares } if score <= sell_threshold => {
                    let revenue = shares as f64 * price;
                    let fee = revenue * config.fee_rate;
                    let tax = revenue * config.tax_rate;
                    let net = revenue - fee - tax;
                    cash += net;
                    total_fees += fee;
                    total_tax += tax;

                    if let Some(trade) = trades.last_mut() {
                        let pnl = net - trade.cost_incl_fee;
                        trade.exit_date = Some(bar.date);
                        trade.exit_price = Some(price);
                        trade.pnl = Some(pnl);
                        trade.return_pct = Some(pnl / trade.cost_incl_fee * 100.0);
                        debug!(date = %bar.date, price, pnl, "sell");
                    }
                    state = State::Flat;
                    action = Action::Sell;
                }
                State::Flat if score >= buy_threshold && price > 0.0 => {
                    let budget = cash / (1.0 + config.fee_rate);
                    let shares = (budget / price).floor() as u64;
                    if shares > 0 {
                        let cost = shares as f64 * price;
                        let fee = cost * config.fee_rate;
                        cash -= cost + fee;
                        total_fees += fee;
                        trades.push(Trade {
                            entry_date: bar.date,
                            entry_price: price,
                            shares,
                            cost_incl_fee: cost + fee,
                            exit_date: None,
                            exit_price: None,
                            pnl: None,
                            return_pct: None,
                        });
                        debug!(date = %bar.date, price, shares, "buy");
                        state = State::Long { shares };
                        action = Action::Buy;
                    }
                }
                _ => {}
            }
        }

        let holdings = match state {
            State::Flat => 0.0,
            State::Long { shares } => shares as f64 * price,
        };
        equity_curve.push(EquityPoint {
            date: bar.date,
            equity: cash + holdings,
            action,
        });
    }

    let final_equity = equity_curve.last().map_or(config.initial_capital, |p| p.equity);
    let total_return_pct = if config.initial_capital > 0.0 {
        (final_equity / config.initial_capital - 1.0) * 100.0
    } else {
        0.0
    };

    let closed: Vec<&Trade> = trades.iter().filter(|t| !t.is_open()).collect();
    let winners = closed.iter().filter(|t| t.pnl.is_some_and(|p| p > 0.0)).count();
    let win_rate_pct = if closed.is_empty() {
        0.0
    } else {
        winners as f64 / closed.len() as f64 * 100.0
    };
    let closed_trades = closed.len();
    let open_trades = trades.len() - closed_trades;

    BacktestReport {
        buy_threshold,
        sell_threshold,
        total_return_pct,
        win_rate_pct,
        max_drawdown_pct: max_drawdown_pct(&equity_curve),
        still_holding: matches!(state, State::Long { .. }),
        trades,
        equity_curve,
        closed_trades,
        open_trades,
        final_equity,
        total_fees,
        total_tax,
    }
}

/// Minimum of `equity / running_peak - 1`, in percent.
fn max_drawdown_pct(curve: &[EquityPoint]) -> f64 {
    let Some(first) = curve.first() else {
        return 0.0;
    };
    let mut peak = first.equity;
    let mut worst = 0.0_f64;
    for point in curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            worst = worst.min(point.equity / peak - 1.0);
        }
    }
    worst * 100.0
}
