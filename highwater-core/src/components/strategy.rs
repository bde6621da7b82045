//! Strategy: a selector paired with a per-instrument signal factory.
//!
//! `SelectorSpec` and `SignalSpec` are the serializable descriptions;
//! `Strategy::from_specs` turns them into runtime trait objects.

use serde::{Deserialize, Serialize};

use super::selector::{high_point, AllMarketSelector, HighPointSelector, StockSelector};
use super::signal::{breakout, BreakoutSignal, NullSignal, SignalGenerator};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SelectorSpec {
    HighPoint { lookback: usize, recent: usize },
    AllMarket,
}

impl Default for SelectorSpec {
    fn default() -> Self {
        SelectorSpec::HighPoint {
            lookback: high_point::DEFAULT_LOOKBACK,
            recent: high_point::DEFAULT_RECENT,
        }
    }
}

impl SelectorSpec {
    pub fn build(&self) -> Box<dyn StockSelector> {
        match *self {
            SelectorSpec::HighPoint { lookback, recent } => {
                Box::new(HighPointSelector::new(lookback, recent))
            }
            SelectorSpec::AllMarket => Box::new(AllMarketSelector),
        }
    }

    /// Bars of history the selector reads.
    pub fn lookback(&self) -> usize {
        match *self {
            SelectorSpec::HighPoint { lookback, .. } => lookback,
            SelectorSpec::AllMarket => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalSpec {
    Breakout {
        lookback: usize,
        drop_pct: f64,
        max_hold_days: usize,
    },
    Null,
}

impl Default for SignalSpec {
    fn default() -> Self {
        SignalSpec::Breakout {
            lookback: breakout::DEFAULT_LOOKBACK,
            drop_pct: breakout::DEFAULT_DROP_PCT,
            max_hold_days: breakout::DEFAULT_MAX_HOLD_DAYS,
        }
    }
}

impl SignalSpec {
    /// A fresh generator with empty history.
    pub fn build(&self) -> Box<dyn SignalGenerator> {
        match *self {
            SignalSpec::Breakout {
                lookback,
                drop_pct,
                max_hold_days,
            } => Box::new(BreakoutSignal::new(lookback, drop_pct, max_hold_days)),
            SignalSpec::Null => Box::new(NullSignal),
        }
    }
}

pub struct Strategy {
    pub selector: Box<dyn StockSelector>,
    pub signal: SignalSpec,
}

impl Strategy {
    pub fn from_specs(selector: &SelectorSpec, signal: &SignalSpec) -> Self {
        Self {
            selector: selector.build(),
            signal: signal.clone(),
        }
    }

    pub fn new_generator(&self) -> Box<dyn SignalGenerator> {
        let mut generator = self.signal.build();
        generator.reset();
        generator
    }
}
