//! Position ledger: cash, open positions, fees paid and the trade tape.
//!
//! All cash movement goes through `buy` and `sell`. A buy whose cost
//! (amount + commission + transfer fee) exceeds available cash is refused,
//! so cash cannot go negative through buying.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{DailyEquitySnapshot, Position, TradeAction, TradeReason, TradeRecord};

use super::fees::FeeModel;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    #[error("'{0}' is already held")]
    AlreadyHeld(String),
    #[error("'{0}' is not held")]
    NotHeld(String),
    #[error("buying '{id}' needs {needed:.2} but only {available:.2} is available")]
    InsufficientCash {
        id: String,
        needed: f64,
        available: f64,
    },
    #[error("invalid order for '{id}': {shares} shares at {price}")]
    InvalidOrder { id: String, shares: u64, price: f64 },
}

#[derive(Debug, Clone)]
pub struct PositionLedger {
    cash: f64,
    positions: BTreeMap<String, Position>,
    total_fees: f64,
    trades: Vec<TradeRecord>,
    fees: FeeModel,
}

impl PositionLedger {
    pub fn new(initial_cash: f64, fees: FeeModel) -> Self {
        Self {
            cash: initial_cash,
            positions: BTreeMap::new(),
            total_fees: 0.0,
            trades: Vec::new(),
            fees,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn total_fees(&self) -> f64 {
        self.total_fees
    }

    pub fn fees(&self) -> &FeeModel {
        &self.fees
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn positions(&self) -> &BTreeMap<String, Position> {
        &self.positions
    }

    pub fn position(&self, id: &str) -> Option<&Position> {
        self.positions.get(id)
    }

    pub fn position_mut(&mut self, id: &str) -> Option<&mut Position> {
        self.positions.get_mut(id)
    }

    pub fn holds(&self, id: &str) -> bool {
        self.positions.contains_key(id)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn position_value(&self) -> f64 {
        self.positions.values().map(Position::market_value).sum()
    }

    pub fn total_assets(&self) -> f64 {
        self.cash + self.position_value()
    }

    pub fn buy(
        &mut self,
        id: &str,
        name: &str,
        shares: u64,
        price: f64,
        date: NaiveDate,
        day_index: usize,
    ) -> Result<&TradeRecord, LedgerError> {
        if shares == 0 || !(price.is_finite() && price > 0.0) {
            return Err(LedgerError::InvalidOrder {
                id: id.to_string(),
                shares,
                price,
            });
        }
        if self.holds(id) {
            return Err(LedgerError::AlreadyHeld(id.to_string()));
        }

        let amount = price * shares as f64;
        let fees = self.fees.quote(amount, TradeAction::Buy);
        let cost = amount + fees.commission + fees.transfer_fee;
        if cost > self.cash {
            return Err(LedgerError::InsufficientCash {
                id: id.to_string(),
                needed: cost,
                available: self.cash,
            });
        }

        self.cash -= cost;
        self.total_fees += fees.total;
        self.positions.insert(
            id.to_string(),
            Position::open(id, name, shares, price, date, day_index),
        );
        self.trades.push(TradeRecord {
            id: id.to_string(),
            name: name.to_string(),
            action: TradeAction::Buy,
            date,
            day_index,
            price,
            shares,
            amount,
            commission: fees.commission,
            stamp_tax: fees.stamp_tax,
            transfer_fee: fees.transfer_fee,
            total_fee: fees.total,
            cash_after: self.cash,
            reason: TradeReason::BuySignal,
        });
        Ok(self.last_trade())
    }

    /// Close the whole position at `price`. Proceeds are credited net of fees
    /// and never go below zero.
    pub fn sell(
        &mut self,
        id: &str,
        price: f64,
        date: NaiveDate,
        day_index: usize,
        reason: TradeReason,
    ) -> Result<&TradeRecord, LedgerError> {
        let position = self
            .positions
            .remove(id)
            .ok_or_else(|| LedgerError::NotHeld(id.to_string()))?;

        let amount = price * position.shares as f64;
        let fees = self.fees.quote(amount, TradeAction::Sell);
        self.cash += (amount - fees.total).max(0.0);
        self.total_fees += fees.total;
        self.trades.push(TradeRecord {
            id: position.id,
            name: position.name,
            action: TradeAction::Sell,
            date,
            day_index,
            price,
            shares: position.shares,
            amount,
            commission: fees.commission,
            stamp_tax: fees.stamp_tax,
            transfer_fee: fees.transfer_fee,
            total_fee: fees.total,
            cash_after: self.cash,
            reason,
        });
        Ok(self.last_trade())
    }

    pub fn mark(&mut self, id: &str, price: f64) {
        if let Some(p) = self.positions.get_mut(id) {
            p.mark = price;
        }
    }

    pub fn snapshot(&self, date: NaiveDate) -> DailyEquitySnapshot {
        let position_value = self.position_value();
        DailyEquitySnapshot {
            date,
            cash: self.cash,
            position_value,
            total_assets: self.cash + position_value,
            open_positions: self.positions.len(),
        }
    }

    pub fn into_trades(self) -> Vec<TradeRecord> {
        self.trades
    }

    fn last_trade(&self) -> &TradeRecord {
        // push always precedes this call
        &self.trades[self.trades.len() - 1]
    }
}
