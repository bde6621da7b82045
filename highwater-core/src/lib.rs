//! Highwater Core: price series, selection, signals, fees, ledger and the day loop.
//!
//! This crate contains the backtest simulation engine:
//! - Domain types (bars, price series, market store, positions, trades, snapshots)
//! - Rolling-window maximum and swing analysis
//! - Stock selectors and per-instrument signal generators
//! - A-share fee schedule, price-limit and spike guards, lot sizing
//! - The day-by-day event loop with end-of-run liquidation

pub mod components;
pub mod domain;
pub mod engine;
pub mod indicators;
