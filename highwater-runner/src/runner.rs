//! Backtest runner: wires together data loading, the engine and aggregation.
//!
//! Two entry points:
//! - `run_from_config()`: loads bars from the configured data directory, then runs. Used by CLI.
//! - `run_backtest_from_store()`: takes pre-loaded data. Used for synthetic runs and tests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use highwater_core::domain::{DailyEquitySnapshot, TradeRecord};
use highwater_core::engine::{self, BuyRejection};

use crate::config::{BacktestConfig, ConfigFileError, RunId};
use crate::data_loader::{load_instruments, load_store, LoadError, LoadOptions, LoadedData};
use crate::metrics::{pair_trades, ClosedTrade, RunSummary};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigFileError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("engine rejected parameters: {0}")]
    Engine(#[from] engine::ConfigError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub instrument_count: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub summary: RunSummary,
    pub trades: Vec<TradeRecord>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity: Vec<DailyEquitySnapshot>,
    pub rejections: Vec<BuyRejection>,
    /// Instruments listed but not loaded, with the reason.
    #[serde(default)]
    pub skipped: Vec<(String, String)>,
    pub config: BacktestConfig,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load the instruments named by `config.data`.
pub fn load_data(config: &BacktestConfig) -> Result<LoadedData, RunError> {
    let instruments = load_instruments(&config.data.instruments)?;
    info!(
        listed = instruments.len(),
        dir = %config.data.dir.display(),
        "loading instruments"
    );
    Ok(load_store(
        &config.data.dir,
        &instruments,
        &LoadOptions::from(&config.data),
    )?)
}

/// Run a single backtest from a BacktestConfig, reading bars from disk.
pub fn run_from_config(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    let loaded = load_data(config)?;
    run_backtest_from_store(config, &loaded)
}

/// Run a backtest with pre-loaded data: no I/O.
pub fn run_backtest_from_store(
    config: &BacktestConfig,
    loaded: &LoadedData,
) -> Result<BacktestResult, RunError> {
    let engine_config = config.engine_config()?;
    let run_id = config.run_id(&loaded.dataset_hash)?;
    let _span = tracing::info_span!("run", run_id = %run_id.get(..12).unwrap_or(&run_id)).entered();

    let result = engine::run_backtest(&loaded.store, &engine_config)?;
    let summary = RunSummary::compute(&result);
    info!(
        return_pct = summary.return_pct,
        trades = summary.completed_trades,
        win_rate = summary.win_rate_pct,
        "run summarised"
    );

    let calendar = loaded.store.calendar();
    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash: loaded.dataset_hash.clone(),
        has_synthetic: loaded.has_synthetic,
        instrument_count: loaded.store.len(),
        start_date: calendar.get(result.start_day).copied(),
        end_date: calendar.last().copied(),
        closed_trades: pair_trades(&result.trades),
        summary,
        trades: result.trades,
        equity: result.equity,
        rejections: result.rejections,
        skipped: loaded.skipped.clone(),
        config: config.clone(),
    })
}
