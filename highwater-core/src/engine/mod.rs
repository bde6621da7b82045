//! Backtest engine: configuration, fees, guards, sizing, ledger and the day loop.

pub mod config;
pub mod fees;
pub mod guards;
pub mod ledger;
pub mod loop_runner;
pub mod sizing;
pub mod state;

pub use config::{CapitalPolicy, ConfigError, EngineConfig};
pub use fees::{FeeBreakdown, FeeModel};
pub use guards::{BuyRejection, RejectionReason};
pub use ledger::{LedgerError, PositionLedger};
pub use loop_runner::{run_backtest, run_with_strategy};
pub use sizing::affordable_shares;
pub use state::{EngineState, RunResult};
