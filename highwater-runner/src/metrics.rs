//! Result aggregation: pure functions over the trade tape and equity curve.
//!
//! Nothing here mutates its input; summarising the same run twice gives
//! identical output.

use std::collections::{HashMap, VecDeque};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use highwater_core::domain::{DailyEquitySnapshot, TradeAction, TradeReason, TradeRecord};
use highwater_core::engine::RunResult;

/// Trading days per year for annualisation.
pub const TRADING_DAYS: f64 = 252.0;

/// A buy matched with the sell that closed it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub id: String,
    pub name: String,
    pub buy_date: NaiveDate,
    pub sell_date: NaiveDate,
    pub shares: u64,
    pub buy_price: f64,
    pub sell_price: f64,
    /// Trading days between the two fills: the difference of their
    /// trading-calendar indices, so weekends and holidays do not count.
    pub hold_days: usize,
    /// Sell proceeds net of fees minus buy cost including fees.
    pub profit: f64,
    pub exit_reason: TradeReason,
}

impl ClosedTrade {
    pub fn is_winner(&self) -> bool {
        self.profit > 0.0
    }
}

/// Summary of one backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub initial_cash: f64,
    pub final_cash: f64,
    /// Final assets minus initial cash.
    pub total_return: f64,
    pub return_pct: f64,
    pub buy_count: usize,
    pub sell_count: usize,
    /// Completed round trips; equal to the sell count.
    pub completed_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate_pct: f64,
    /// Largest peak-to-trough fall of total assets, as a positive percentage.
    pub max_drawdown_pct: f64,
    pub total_fees: f64,
    pub fees_pct: f64,
    pub sharpe: f64,
    pub avg_hold_days: f64,
    pub max_concurrent_positions: usize,
    pub simulated_days: usize,
}

impl RunSummary {
    pub fn compute(result: &RunResult) -> Self {
        let closed = pair_trades(&result.trades);
        let wins = closed.iter().filter(|t| t.is_winner()).count();
        let buy_count = count_action(&result.trades, TradeAction::Buy);
        let sell_count = count_action(&result.trades, TradeAction::Sell);
        let curve = asset_curve(result.initial_cash, &result.equity);
        let total_return = result.final_cash - result.initial_cash;

        Self {
            initial_cash: result.initial_cash,
            final_cash: result.final_cash,
            total_return,
            return_pct: percent(total_return, result.initial_cash),
            buy_count,
            sell_count,
            completed_trades: sell_count,
            wins,
            losses: closed.len() - wins,
            win_rate_pct: percent(wins as f64, closed.len() as f64),
            max_drawdown_pct: -max_drawdown(&curve) * 100.0,
            total_fees: result.total_fees,
            fees_pct: percent(result.total_fees, result.initial_cash),
            sharpe: sharpe_ratio(&curve),
            avg_hold_days: avg_hold_days(&closed),
            max_concurrent_positions: result
                .equity
                .iter()
                .map(|s| s.open_positions)
                .max()
                .unwrap_or(0),
            simulated_days: result.simulated_days,
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Pair every sell with the oldest unmatched buy of the same instrument.
///
/// Sells with no open buy are ignored. Output is in sell order.
pub fn pair_trades(trades: &[TradeRecord]) -> Vec<ClosedTrade> {
    let mut open: HashMap<&str, VecDeque<&TradeRecord>> = HashMap::new();
    let mut closed = Vec::new();
    for trade in trades {
        match trade.action {
            TradeAction::Buy => open.entry(trade.id.as_str()).or_default().push_back(trade),
            TradeAction::Sell => {
                let Some(buy) = open.get_mut(trade.id.as_str()).and_then(VecDeque::pop_front)
                else {
                    continue;
                };
                closed.push(ClosedTrade {
                    id: trade.id.clone(),
                    name: trade.name.clone(),
                    buy_date: buy.date,
                    sell_date: trade.date,
                    shares: trade.shares,
                    buy_price: buy.price,
                    sell_price: trade.price,
                    hold_days: trade.day_index.saturating_sub(buy.day_index),
                    profit: trade.cash_flow() + buy.cash_flow(),
                    exit_reason: trade.reason,
                });
            }
        }
    }
    closed
}

/// Total assets by day, preceded by the initial cash.
pub fn asset_curve(initial_cash: f64, equity: &[DailyEquitySnapshot]) -> Vec<f64> {
    std::iter::once(initial_cash)
        .chain(equity.iter().map(|s| s.total_assets))
        .collect()
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 = 15% drawdown).
///
/// Returns 0.0 if equity is constant or monotonically increasing.
pub fn max_drawdown(curve: &[f64]) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }
    let mut peak = curve[0];
    let mut max_dd = 0.0_f64;

    for &eq in curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (eq - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Annualized Sharpe ratio with a zero risk-free rate.
///
/// Returns 0.0 if variance is zero or fewer than 2 returns.
pub fn sharpe_ratio(curve: &[f64]) -> f64 {
    let returns = daily_returns(curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean_f64(&returns) / std) * TRADING_DAYS.sqrt()
}

pub fn avg_hold_days(closed: &[ClosedTrade]) -> f64 {
    if closed.is_empty() {
        return 0.0;
    }
    closed.iter().map(|t| t.hold_days as f64).sum::<f64>() / closed.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

pub fn daily_returns(curve: &[f64]) -> Vec<f64> {
    curve
        .windows(2)
        .map(|w| {
            if w[0] > 0.0 {
                (w[1] - w[0]) / w[0]
            } else {
                0.0
            }
        })
        .collect()
}

fn count_action(trades: &[TradeRecord], action: TradeAction) -> usize {
    trades.iter().filter(|t| t.action == action).count()
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}
