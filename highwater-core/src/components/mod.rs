//! Strategy components: selectors, signal generators and their pairing.

pub mod selector;
pub mod signal;
pub mod strategy;

pub use selector::{AllMarketSelector, HighPointSelector, StockSelector};
pub use signal::{BreakoutSignal, NullSignal, Signal, SignalGenerator};
pub use strategy::{SelectorSpec, SignalSpec, Strategy};
