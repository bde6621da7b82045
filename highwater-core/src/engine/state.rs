//! Mutable engine state and the run result.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::{Signal, SignalGenerator, Strategy};
use crate::domain::{DailyEquitySnapshot, MarketStore, TradeRecord};

use super::config::EngineConfig;
use super::guards::{BuyRejection, RejectionReason};
use super::ledger::PositionLedger;

/// Everything that evolves day by day during a run.
pub struct EngineState {
    pub ledger: PositionLedger,
    /// One generator per instrument, keyed like the store.
    pub generators: BTreeMap<String, Box<dyn SignalGenerator>>,
    /// Latest buy decision per unheld instrument, formed at its last close.
    pub pending_buys: BTreeMap<String, Signal>,
    /// Instrument id → calendar day index until which buys are barred.
    pub cooldowns: BTreeMap<String, usize>,
    /// Current selection, in selector order.
    pub candidates: Vec<String>,
    pub equity: Vec<DailyEquitySnapshot>,
    pub rejections: Vec<BuyRejection>,
}

impl EngineState {
    pub fn new(config: &EngineConfig, store: &MarketStore, strategy: &Strategy) -> Self {
        let generators = store
            .ids()
            .into_iter()
            .map(|id| (id, strategy.new_generator()))
            .collect();
        Self {
            ledger: PositionLedger::new(config.initial_cash, config.fees),
            generators,
            pending_buys: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            candidates: Vec::new(),
            equity: Vec::new(),
            rejections: Vec::new(),
        }
    }

    /// Total assets at the previous close, or the starting cash.
    pub fn last_total_assets(&self, initial_cash: f64) -> f64 {
        self.equity
            .last()
            .map_or(initial_cash, |snap| snap.total_assets)
    }

    pub fn reject(&mut self, rejection: BuyRejection) {
        tracing::debug!(
            id = %rejection.id,
            date = %rejection.date,
            reason = %rejection.reason,
            "buy rejected"
        );
        self.rejections.push(rejection);
    }

    pub fn in_cooldown(&mut self, id: &str, day: usize) -> bool {
        match self.cooldowns.get(id) {
            Some(&until) if day < until => true,
            Some(_) => {
                self.cooldowns.remove(id);
                false
            }
            None => false,
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub initial_cash: f64,
    pub trades: Vec<TradeRecord>,
    pub equity: Vec<DailyEquitySnapshot>,
    /// Cash after end-of-run liquidation.
    pub final_cash: f64,
    pub total_fees: f64,
    pub rejections: Vec<BuyRejection>,
    pub cooldowns: BTreeMap<String, usize>,
    /// Calendar index of the first simulated day.
    pub start_day: usize,
    pub simulated_days: usize,
}

impl RunResult {
    pub fn rejections_by(&self, reason: RejectionReason) -> impl Iterator<Item = &BuyRejection> {
        self.rejections.iter().filter(move |r| r.reason == reason)
    }

    /// Reconcile cash against the tape: initial cash plus every fill's flow.
    pub fn verify_cash(&self) -> bool {
        let replayed = self
            .trades
            .iter()
            .fold(self.initial_cash, |cash, t| cash + t.cash_flow());
        let scale = self.initial_cash.abs().max(1.0);
        (replayed - self.final_cash).abs() <= 1e-9 * scale
    }
}
