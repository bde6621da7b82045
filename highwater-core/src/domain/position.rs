//! Position: an open holding in one instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An open long position. At most one exists per instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: String,
    pub name: String,
    /// Always a positive multiple of the lot size.
    pub shares: u64,
    pub buy_price: f64,
    pub buy_date: NaiveDate,
    /// Calendar day index of the buy.
    pub buy_day: usize,
    /// Trading days held, counted on days the instrument traded.
    pub hold_days: usize,
    /// Highest price observed since entry (starts at the buy price).
    pub highest: f64,
    /// Latest mark used for valuation.
    pub mark: f64,
}

impl Position {
    pub fn open(
        id: impl Into<String>,
        name: impl Into<String>,
        shares: u64,
        price: f64,
        date: NaiveDate,
        day: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            shares,
            buy_price: price,
            buy_date: date,
            buy_day: day,
            hold_days: 0,
            highest: price,
            mark: price,
        }
    }

    pub fn market_value(&self) -> f64 {
        self.shares as f64 * self.mark
    }

    /// Advance one held day and raise the running high to `price` if higher.
    pub fn observe(&mut self, price: f64) {
        self.hold_days += 1;
        if price > self.highest {
            self.highest = price;
        }
    }
}
