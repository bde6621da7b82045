//! Trade ledger records.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

/// Why a fill happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeReason {
    BuySignal,
    /// Price fell at least the drop threshold below the buy price.
    StopLoss,
    /// Price fell at least the drop threshold below the high since entry.
    DrawdownStop,
    MaxHold,
    /// End-of-run liquidation.
    ForcedClose,
}

impl TradeReason {
    pub fn code(&self) -> &'static str {
        match self {
            TradeReason::BuySignal => "buy signal",
            TradeReason::StopLoss => "stop loss",
            TradeReason::DrawdownStop => "drawdown stop",
            TradeReason::MaxHold => "max hold",
            TradeReason::ForcedClose => "forced close",
        }
    }
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One executed fill. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: String,
    pub name: String,
    pub action: TradeAction,
    pub date: NaiveDate,
    pub day_index: usize,
    pub price: f64,
    pub shares: u64,
    /// price × shares
    pub amount: f64,
    pub commission: f64,
    pub stamp_tax: f64,
    pub transfer_fee: f64,
    pub total_fee: f64,
    pub cash_after: f64,
    pub reason: TradeReason,
}

impl TradeRecord {
    /// Cash effect of the fill: negative for buys, positive for sells.
    pub fn cash_flow(&self) -> f64 {
        match self.action {
            TradeAction::Buy => -(self.amount + self.total_fee),
            TradeAction::Sell => (self.amount - self.total_fee).max(0.0),
        }
    }
}
