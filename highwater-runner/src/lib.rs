//! Highwater Runner: backtest orchestration on top of `highwater-core`.
//!
//! This crate provides:
//! - TOML configuration with content-addressed run ids
//! - CSV bar loading (parallel) with a synthetic fallback for offline runs
//! - Result aggregation: returns, win rate, drawdown, Sharpe, fees
//! - JSON, CSV and Markdown artifact export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;

pub use config::{BacktestConfig, ConfigFileError, DataSection, RunId};
pub use data_loader::{
    compute_dataset_hash, generate_synthetic, load_instruments, load_series, load_store,
    InstrumentInfo, LoadError, LoadOptions, LoadedData,
};
pub use export::{load_artifacts, save_artifacts};
pub use metrics::{pair_trades, ClosedTrade, RunSummary};
pub use runner::{
    load_data, run_backtest_from_store, run_from_config, BacktestResult, RunError, SCHEMA_VERSION,
};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn run_summary_is_send_sync() {
        assert_send::<RunSummary>();
        assert_sync::<RunSummary>();
    }

    #[test]
    fn backtest_result_is_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<BacktestConfig>();
        assert_sync::<BacktestConfig>();
        assert_send::<LoadOptions>();
        assert_sync::<LoadOptions>();
    }

    #[test]
    fn loaded_data_is_send_sync() {
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
    }
}
