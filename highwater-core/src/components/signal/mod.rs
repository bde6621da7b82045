//! Signal generation: per-instrument, one bar at a time.
//!
//! A generator owns only the state it has built from bars already passed
//! to `process_day`. It never receives a slice of the series, so it cannot
//! peek ahead.

pub mod breakout;

pub use breakout::BreakoutSignal;

use crate::domain::{Bar, Position, TradeReason};
use serde::{Deserialize, Serialize};

/// Decision emitted after a day's bar is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    Buy,
    Sell(TradeReason),
    Hold,
}

impl Signal {
    pub fn is_buy(&self) -> bool {
        matches!(self, Signal::Buy)
    }
}

pub trait SignalGenerator: Send + Sync {
    /// Human-readable name (e.g., "breakout").
    fn name(&self) -> &str;

    /// Bars that must be consumed before a buy can fire.
    fn warmup_bars(&self) -> usize;

    /// Forget all history.
    fn reset(&mut self);

    /// Consume the next bar (strictly increasing dates) and decide.
    fn process_day(&mut self, bar: &Bar, day_index: usize, position: Option<&Position>) -> Signal;

    /// Exit check for an open position at a quoted price. Consumes nothing.
    fn exit_reason(&self, position: &Position, price: f64) -> Option<TradeReason>;
}

/// Never trades.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSignal;

impl SignalGenerator for NullSignal {
    fn name(&self) -> &str {
        "null"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn reset(&mut self) {}

    fn process_day(&mut self, _bar: &Bar, _day_index: usize, _position: Option<&Position>) -> Signal {
        Signal::Hold
    }

    fn exit_reason(&self, _position: &Position, _price: f64) -> Option<TradeReason> {
        None
    }
}
