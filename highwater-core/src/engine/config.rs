//! Engine configuration and its validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::{SelectorSpec, SignalSpec};

use super::fees::FeeModel;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("fraction_of_equity must be in (0, 1], got {0}")]
    BadFraction(f64),
    #[error("selector recent window {recent} exceeds its lookback {lookback}")]
    RecentExceedsLookback { recent: usize, lookback: usize },
}

/// How much cash a single buy may spend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CapitalPolicy {
    /// Spend all available cash.
    #[default]
    AllCash,
    /// Spend at most `fraction` of the previous day's total assets.
    FractionOfEquity { fraction: f64 },
}

impl CapitalPolicy {
    pub fn budget(&self, cash: f64, total_assets: f64) -> f64 {
        match *self {
            CapitalPolicy::AllCash => cash,
            CapitalPolicy::FractionOfEquity { fraction } => cash.min(total_assets * fraction),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub initial_cash: f64,
    pub max_positions: usize,
    pub lot_size: u64,
    pub capital: CapitalPolicy,
    pub fees: FeeModel,
    pub selector: SelectorSpec,
    pub signal: SignalSpec,
    /// Calendar days used only to prime generators; trading starts after them.
    pub warmup_days: usize,
    /// Re-run selection every N simulated days; `None` selects once.
    pub reselect_every: Option<usize>,
    /// Single-day close-to-close rise that trips the buy breaker.
    pub spike_threshold: f64,
    /// Prior bars scanned by the breaker.
    pub spike_lookback: usize,
    /// Trading days a tripped or limit-locked instrument is barred from buying.
    pub cooldown_days: usize,
    /// Open-vs-previous-close move treated as a price-limit lock.
    pub limit_move_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_cash: 1_000_000.0,
            max_positions: 1,
            lot_size: 100,
            capital: CapitalPolicy::AllCash,
            fees: FeeModel::default(),
            selector: SelectorSpec::default(),
            signal: SignalSpec::default(),
            warmup_days: 500,
            reselect_every: None,
            spike_threshold: 0.07,
            spike_lookback: 5,
            cooldown_days: 50,
            limit_move_threshold: 0.095,
        }
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

impl EngineConfig {
    /// Rejects non-positive lookbacks, lot size, percentages and limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("initial_cash", self.initial_cash)?;
        positive("max_positions", self.max_positions as f64)?;
        positive("lot_size", self.lot_size as f64)?;
        positive("spike_threshold", self.spike_threshold)?;
        positive("limit_move_threshold", self.limit_move_threshold)?;
        positive("spike_lookback", self.spike_lookback as f64)?;
        if let Some(n) = self.reselect_every {
            positive("reselect_every", n as f64)?;
        }

        non_negative("fees.commission_rate", self.fees.commission_rate)?;
        non_negative("fees.min_commission", self.fees.min_commission)?;
        non_negative("fees.transfer_fee_rate", self.fees.transfer_fee_rate)?;
        non_negative("fees.stamp_tax_rate", self.fees.stamp_tax_rate)?;

        if let CapitalPolicy::FractionOfEquity { fraction } = self.capital {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(ConfigError::BadFraction(fraction));
            }
        }

        if let SelectorSpec::HighPoint { lookback, recent } = self.selector {
            positive("selector.lookback", lookback as f64)?;
            positive("selector.recent", recent as f64)?;
            if recent > lookback {
                return Err(ConfigError::RecentExceedsLookback { recent, lookback });
            }
        }

        if let SignalSpec::Breakout {
            lookback,
            drop_pct,
            max_hold_days,
        } = self.signal
        {
            positive("signal.lookback", lookback as f64)?;
            positive("signal.drop_pct", drop_pct)?;
            positive("signal.max_hold_days", max_hold_days as f64)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_lot_rejected() {
        let config = EngineConfig {
            lot_size: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive { field: "lot_size", .. })
        ));
    }

    #[test]
    fn zero_signal_lookback_rejected() {
        let config = EngineConfig {
            signal: SignalSpec::Breakout {
                lookback: 0,
                drop_pct: 0.06,
                max_hold_days: 15,
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_drop_rejected() {
        let config = EngineConfig {
            signal: SignalSpec::Breakout {
                lookback: 300,
                drop_pct: -0.06,
                max_hold_days: 15,
            },
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn recent_longer_than_lookback_rejected() {
        let config = EngineConfig {
            selector: SelectorSpec::HighPoint {
                lookback: 10,
                recent: 11,
            },
            ..EngineConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::RecentExceedsLookback {
                recent: 11,
                lookback: 10
            })
        );
    }

    #[test]
    fn bad_fraction_rejected() {
        let config = EngineConfig {
            capital: CapitalPolicy::FractionOfEquity { fraction: 1.5 },
            ..EngineConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BadFraction(1.5)));
    }

    #[test]
    fn zero_reselect_interval_rejected() {
        let config = EngineConfig {
            reselect_every: Some(0),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn fraction_policy_caps_budget() {
        let policy = CapitalPolicy::FractionOfEquity { fraction: 0.5 };
        assert_eq!(policy.budget(80_000.0, 100_000.0), 50_000.0);
        assert_eq!(policy.budget(30_000.0, 100_000.0), 30_000.0);
        assert_eq!(CapitalPolicy::AllCash.budget(30_000.0, 100_000.0), 30_000.0);
    }
}
