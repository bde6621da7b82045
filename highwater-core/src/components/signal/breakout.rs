//! Breakout buy / drop-stop sell signal.
//!
//! Buy: the close reaches 99.5% of the highest close of the previous
//! `lookback` bars (current bar excluded) and no position is held.
//!
//! Sell, checked in order:
//! 1. price at least `drop_pct` below the buy price → stop loss
//! 2. price at least `drop_pct` below the high since entry, once that high
//!    exceeds the buy price → drawdown stop
//! 3. holding days reached `max_hold_days` → max hold

use crate::domain::{Bar, Position, TradeReason};
use crate::indicators::RollingMax;

use super::{Signal, SignalGenerator};

pub const DEFAULT_LOOKBACK: usize = 300;
pub const DEFAULT_DROP_PCT: f64 = 0.06;
pub const DEFAULT_MAX_HOLD_DAYS: usize = 15;
pub const BREAKOUT_PROXIMITY: f64 = 0.995;

#[derive(Debug, Clone)]
pub struct BreakoutSignal {
    lookback: usize,
    drop_pct: f64,
    max_hold_days: usize,
    window: RollingMax,
}

impl Default for BreakoutSignal {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKBACK, DEFAULT_DROP_PCT, DEFAULT_MAX_HOLD_DAYS)
    }
}

impl BreakoutSignal {
    pub fn new(lookback: usize, drop_pct: f64, max_hold_days: usize) -> Self {
        Self {
            lookback,
            drop_pct,
            max_hold_days,
            window: RollingMax::new(lookback),
        }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn drop_pct(&self) -> f64 {
        self.drop_pct
    }

    pub fn max_hold_days(&self) -> usize {
        self.max_hold_days
    }

    fn is_breakout(&self, close: f64) -> bool {
        if !self.window.is_full() {
            return false;
        }
        match self.window.max() {
            Some(max) if max > 0.0 => close >= max * BREAKOUT_PROXIMITY,
            _ => false,
        }
    }
}

impl SignalGenerator for BreakoutSignal {
    fn name(&self) -> &str {
        "breakout"
    }

    fn warmup_bars(&self) -> usize {
        self.lookback
    }

    fn reset(&mut self) {
        self.window.reset();
    }

    fn process_day(&mut self, bar: &Bar, _day_index: usize, position: Option<&Position>) -> Signal {
        let signal = match position {
            Some(pos) => self
                .exit_reason(pos, bar.close)
                .map_or(Signal::Hold, Signal::Sell),
            None if self.is_breakout(bar.close) => Signal::Buy,
            None => Signal::Hold,
        };
        self.window.push(bar.close);
        signal
    }

    fn exit_reason(&self, position: &Position, price: f64) -> Option<TradeReason> {
        if position.buy_price > 0.0 {
            let drop = (position.buy_price - price) / position.buy_price;
            if drop >= self.drop_pct {
                return Some(TradeReason::StopLoss);
            }
        }
        if position.highest > position.buy_price && position.highest > 0.0 {
            let drawdown = (position.highest - price) / position.highest;
            if drawdown >= self.drop_pct {
                return Some(TradeReason::DrawdownStop);
            }
        }
        if position.hold_days >= self.max_hold_days {
            return Some(TradeReason::MaxHold);
        }
        None
    }
}
