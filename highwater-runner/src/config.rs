//! TOML backtest configuration.
//!
//! Every section is optional and falls back to the reference parameters:
//!
//! ```toml
//! [backtest]
//! initial_cash = 1000000.0
//! max_positions = 1
//! warmup_days = 500
//! reselect_every = 30   # 0 selects once
//!
//! [data]
//! dir = "data"
//! instruments = "data/instruments.csv"
//! min_bars = 1
//!
//! [selector]
//! type = "HIGH_POINT"
//! lookback = 500
//! recent = 15
//!
//! [signal]
//! type = "BREAKOUT"
//! lookback = 300
//! drop_pct = 0.06
//! max_hold_days = 15
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use highwater_core::components::{SelectorSpec, SignalSpec};
use highwater_core::engine::{self, CapitalPolicy, EngineConfig, FeeModel};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigFileError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to render TOML: {0}")]
    Render(#[from] toml::ser::Error),
    #[error("invalid engine parameters: {0}")]
    Invalid(#[from] engine::ConfigError),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_cash: f64,
    pub max_positions: usize,
    pub lot_size: u64,
    pub warmup_days: usize,
    /// Simulated days between selections; 0 selects once.
    pub reselect_every: usize,
}

impl Default for BacktestSection {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            initial_cash: engine.initial_cash,
            max_positions: engine.max_positions,
            lot_size: engine.lot_size,
            warmup_days: engine.warmup_days,
            reselect_every: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardSection {
    pub spike_threshold: f64,
    pub spike_lookback: usize,
    pub cooldown_days: usize,
    pub limit_move_threshold: f64,
}

impl Default for GuardSection {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            spike_threshold: engine.spike_threshold,
            spike_lookback: engine.spike_lookback,
            cooldown_days: engine.cooldown_days,
            limit_move_threshold: engine.limit_move_threshold,
        }
    }
}

/// Where daily bars live on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSection {
    /// Directory holding one `<id>.csv` per instrument.
    pub dir: PathBuf,
    /// `id,name` list of instruments to load.
    pub instruments: PathBuf,
    /// Skip instruments whose file is missing or malformed instead of failing.
    pub skip_bad: bool,
    /// Rescale prices after an open below 85% of the previous close.
    pub adjust_gaps: bool,
    /// Instruments with fewer usable bars are skipped (or fail the load).
    pub min_bars: usize,
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data"),
            instruments: PathBuf::from("data/instruments.csv"),
            skip_bad: true,
            adjust_gaps: false,
            min_bars: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub backtest: BacktestSection,
    pub capital: CapitalPolicy,
    pub selector: SelectorSpec,
    pub signal: SignalSpec,
    pub fees: FeeModel,
    pub guards: GuardSection,
    pub data: DataSection,
}

impl BacktestConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validated engine parameters.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigFileError> {
        let config = EngineConfig {
            initial_cash: self.backtest.initial_cash,
            max_positions: self.backtest.max_positions,
            lot_size: self.backtest.lot_size,
            capital: self.capital,
            fees: self.fees,
            selector: self.selector.clone(),
            signal: self.signal.clone(),
            warmup_days: self.backtest.warmup_days,
            reselect_every: (self.backtest.reselect_every > 0)
                .then_some(self.backtest.reselect_every),
            spike_threshold: self.guards.spike_threshold,
            spike_lookback: self.guards.spike_lookback,
            cooldown_days: self.guards.cooldown_days,
            limit_move_threshold: self.guards.limit_move_threshold,
        };
        config.validate()?;
        Ok(config)
    }

    /// Deterministic id over the engine parameters and the dataset.
    ///
    /// Data location is excluded: the same bars loaded from another
    /// directory produce the same id.
    pub fn run_id(&self, dataset_hash: &str) -> Result<RunId, ConfigFileError> {
        let engine = self.engine_config()?;
        let json = serde_json::to_string(&engine)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(json.as_bytes());
        hasher.update(dataset_hash.as_bytes());
        Ok(hasher.finalize().to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = BacktestConfig::from_toml("").unwrap();
        assert_eq!(config, BacktestConfig::default());
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.max_positions, 1);
        assert_eq!(engine.reselect_every, Some(30));
        assert_eq!(engine.fees.min_commission, 5.0);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let toml = r#"
[backtest]
initial_cash = 250000.0
max_positions = 3

[selector]
type = "ALL_MARKET"

[signal]
type = "BREAKOUT"
lookback = 120
drop_pct = 0.08
max_hold_days = 10

[capital]
type = "FRACTION_OF_EQUITY"
fraction = 0.3
"#;
        let config = BacktestConfig::from_toml(toml).unwrap();
        let engine = config.engine_config().unwrap();
        assert_eq!(engine.initial_cash, 250_000.0);
        assert_eq!(engine.max_positions, 3);
        assert_eq!(engine.lot_size, 100);
        assert_eq!(engine.selector, SelectorSpec::AllMarket);
        assert_eq!(
            engine.signal,
            SignalSpec::Breakout {
                lookback: 120,
                drop_pct: 0.08,
                max_hold_days: 10
            }
        );
        assert_eq!(engine.capital, CapitalPolicy::FractionOfEquity { fraction: 0.3 });
        assert_eq!(engine.spike_threshold, 0.07);
    }

    #[test]
    fn zero_reselect_selects_once() {
        let toml = r#"
[backtest]
reselect_every = 0
"#;
        let config = BacktestConfig::from_toml(toml).unwrap();
        assert_eq!(config.engine_config().unwrap().reselect_every, None);

        let config = BacktestConfig::from_toml("[backtest]\nreselect_every = 7\n").unwrap();
        assert_eq!(config.engine_config().unwrap().reselect_every, Some(7));
    }

    #[test]
    fn select_once_changes_run_id() {
        let periodic = BacktestConfig::default();
        let mut once = periodic.clone();
        once.backtest.reselect_every = 0;
        assert_ne!(periodic.run_id("abc").unwrap(), once.run_id("abc").unwrap());
        let rendered = once.to_toml().unwrap();
        assert_eq!(BacktestConfig::from_toml(&rendered).unwrap(), once);
    }

    #[test]
    fn min_bars_read_from_data_section() {
        let toml = r#"
[data]
dir = "bars"
min_bars = 500
"#;
        let config = BacktestConfig::from_toml(toml).unwrap();
        assert_eq!(config.data.min_bars, 500);
        assert!(config.data.skip_bad);
        assert_eq!(BacktestConfig::default().data.min_bars, 1);
    }

    #[test]
    fn invalid_parameters_rejected() {
        let toml = r#"
[backtest]
lot_size = 0
"#;
        let config = BacktestConfig::from_toml(toml).unwrap();
        assert!(matches!(config.engine_config(), Err(ConfigFileError::Invalid(_))));
    }

    #[test]
    fn malformed_toml_rejected() {
        assert!(matches!(
            BacktestConfig::from_toml("[backtest\n"),
            Err(ConfigFileError::Parse(_))
        ));
    }

    #[test]
    fn default_renders_and_reparses() {
        let rendered = BacktestConfig::default().to_toml().unwrap();
        let back = BacktestConfig::from_toml(&rendered).unwrap();
        assert_eq!(back, BacktestConfig::default());
    }

    #[test]
    fn run_id_deterministic() {
        let config = BacktestConfig::default();
        let id1 = config.run_id("abc").unwrap();
        let id2 = config.run_id("abc").unwrap();
        assert_eq!(id1, id2);
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn run_id_changes_with_params_and_data() {
        let config1 = BacktestConfig::default();
        let mut config2 = config1.clone();
        config2.backtest.max_positions = 2;
        assert_ne!(config1.run_id("abc").unwrap(), config2.run_id("abc").unwrap());
        assert_ne!(config1.run_id("abc").unwrap(), config1.run_id("def").unwrap());
    }

    #[test]
    fn run_id_ignores_data_location() {
        let config1 = BacktestConfig::default();
        let mut config2 = config1.clone();
        config2.data.dir = PathBuf::from("/elsewhere");
        assert_eq!(config1.run_id("abc").unwrap(), config2.run_id("abc").unwrap());
    }
}
