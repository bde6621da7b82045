//! Day-by-day event loop: the heart of the backtesting engine.
//!
//! The loop walks the whole trading calendar. Days before `warmup_days`
//! only prime the signal generators. Each simulated day then runs:
//! 0. Reselection: re-run the selector as of the previous day, when due
//! 1. Sell phase: exit checks at the open, fills at the open
//! 2. Buy phase: guards, then buys at the open from yesterday's signals
//! 3. Mark-to-market at the close
//! 4. Daily equity snapshot
//! 5. Signal feed: today's bar goes to every instrument's generator
//!
//! A buy decision is formed from a day's close and can only execute at a
//! later day's open. Whatever is still held after the last day is
//! liquidated at its last available close.

use tracing::info_span;

use crate::components::{Signal, Strategy};
use crate::domain::{MarketStore, TradeReason};

use super::config::{ConfigError, EngineConfig};
use super::guards::{has_recent_spike, is_limit_move, BuyRejection, RejectionReason};
use super::sizing::affordable_shares;
use super::state::{EngineState, RunResult};

const PROGRESS_EVERY: usize = 100;

/// Run a backtest with the selector and signal described by `config`.
pub fn run_backtest(store: &MarketStore, config: &EngineConfig) -> Result<RunResult, ConfigError> {
    config.validate()?;
    let strategy = Strategy::from_specs(&config.selector, &config.signal);
    Ok(run_with_strategy(store, config, &strategy))
}

/// Run a backtest with an already-assembled strategy.
///
/// The config is assumed valid; `run_backtest` is the checked entry point.
pub fn run_with_strategy(store: &MarketStore, config: &EngineConfig, strategy: &Strategy) -> RunResult {
    let _span = info_span!(
        "run_backtest",
        instruments = store.len(),
        calendar_days = store.calendar().len(),
        selector = strategy.selector.name(),
    )
    .entered();

    let ids = store.ids();
    let calendar = store.calendar();
    let start = config.warmup_days;
    let mut state = EngineState::new(config, store, strategy);

    for (day, &date) in calendar.iter().enumerate() {
        if day >= start {
            let simulated = day - start;

            // ─── Phase 0: Reselection ───
            let due = simulated == 0 || config.reselect_every.is_some_and(|n| simulated % n == 0);
            if due {
                state.candidates = match day.checked_sub(1) {
                    Some(as_of) => strategy.selector.select_as_of(store, &ids, as_of),
                    None => Vec::new(),
                };
                tracing::debug!(%date, candidates = state.candidates.len(), "selection refreshed");
            }

            sell_phase(store, config, &mut state, day);
            buy_phase(store, config, &mut state, day);

            // ─── Phase 3: Mark-to-market ───
            // An instrument without a bar today keeps its last mark.
            let held: Vec<String> = state.ledger.positions().keys().cloned().collect();
            for id in &held {
                if let Some(bar) = store.get(id).and_then(|s| s.bar_on(date)) {
                    state.ledger.mark(id, bar.close);
                }
            }

            // ─── Phase 4: Snapshot ───
            let snapshot = state.ledger.snapshot(date);
            state.equity.push(snapshot);

            if (simulated + 1) % PROGRESS_EVERY == 0 {
                tracing::info!(
                    %date,
                    day = simulated + 1,
                    cash = snapshot.cash,
                    total_assets = snapshot.total_assets,
                    positions = snapshot.open_positions,
                    "backtest progress"
                );
            }
        }

        // ─── Phase 5: Signal feed ───
        feed_signals(store, &mut state, day);
    }

    liquidate(store, &mut state);

    let simulated_days = calendar.len().saturating_sub(start);
    let EngineState {
        ledger,
        cooldowns,
        equity,
        rejections,
        ..
    } = state;
    let final_cash = ledger.cash();
    let total_fees = ledger.total_fees();
    let trades = ledger.into_trades();

    tracing::info!(
        trades = trades.len(),
        final_cash,
        total_fees,
        simulated_days,
        "backtest finished"
    );

    RunResult {
        initial_cash: config.initial_cash,
        trades,
        equity,
        final_cash,
        total_fees,
        rejections,
        cooldowns,
        start_day: start.min(calendar.len()),
        simulated_days,
    }
}

// ─── Phase 1: Sell ───────────────────────────────────────────────────

fn sell_phase(store: &MarketStore, config: &EngineConfig, state: &mut EngineState, day: usize) {
    let Some(date) = store.date_at(day) else {
        return;
    };
    let held: Vec<String> = state.ledger.positions().keys().cloned().collect();
    let mut exits = Vec::new();

    for id in held {
        let Some(series) = store.get(&id) else {
            continue;
        };
        let Some(index) = series.index_of(date) else {
            continue;
        };
        let open = series.bars()[index].open;
        let locked = is_limit_move(open, series.prev_close(index), config.limit_move_threshold);

        let reason = match (state.ledger.position(&id), state.generators.get(&id)) {
            (Some(pos), Some(generator)) => generator.exit_reason(pos, open),
            _ => None,
        };

        match reason {
            Some(reason) if !locked => exits.push((id, open, reason)),
            _ => {
                if let Some(pos) = state.ledger.position_mut(&id) {
                    pos.observe(open);
                    pos.mark = open;
                }
            }
        }
    }

    for (id, price, reason) in exits {
        match state.ledger.sell(&id, price, date, day, reason) {
            Ok(trade) => tracing::debug!(
                %id,
                %date,
                price,
                shares = trade.shares,
                %reason,
                cash = trade.cash_after,
                "sell"
            ),
            Err(err) => tracing::warn!(%id, %date, error = %err, "sell failed"),
        }
    }
}

// ─── Phase 2: Buy ────────────────────────────────────────────────────

fn buy_phase(store: &MarketStore, config: &EngineConfig, state: &mut EngineState, day: usize) {
    if state.ledger.open_count() >= config.max_positions {
        return;
    }
    let Some(date) = store.date_at(day) else {
        return;
    };

    let candidates = state.candidates.clone();
    let mut signals: Vec<(String, usize)> = Vec::new();

    for id in candidates {
        if state.ledger.holds(&id) || state.in_cooldown(&id, day) {
            continue;
        }
        let Some(series) = store.get(&id) else {
            continue;
        };
        let Some(index) = series.index_of(date) else {
            continue;
        };
        if has_recent_spike(series, index, config.spike_lookback, config.spike_threshold) {
            state.cooldowns.insert(id.clone(), day + config.cooldown_days);
            state.reject(BuyRejection {
                date,
                id,
                reason: RejectionReason::RecentSpike,
            });
            continue;
        }
        if state.pending_buys.get(&id).is_some_and(Signal::is_buy) {
            signals.push((id, index));
        }
    }

    for (k, (id, index)) in signals.iter().cloned().enumerate() {
        if state.ledger.open_count() >= config.max_positions {
            // capacity is gone for today; the rest keep their signals
            for (id, _) in &signals[k..] {
                state.reject(BuyRejection {
                    date,
                    id: id.clone(),
                    reason: RejectionReason::PositionLimit,
                });
            }
            break;
        }

        let Some(series) = store.get(&id) else {
            continue;
        };
        let open = series.bars()[index].open;

        if is_limit_move(open, series.prev_close(index), config.limit_move_threshold) {
            state.cooldowns.insert(id.clone(), day + config.cooldown_days);
            state.reject(BuyRejection {
                date,
                id,
                reason: RejectionReason::LimitLocked,
            });
            continue;
        }

        let budget = config
            .capital
            .budget(state.ledger.cash(), state.last_total_assets(config.initial_cash));
        let shares = affordable_shares(budget, open, config.lot_size, &config.fees);
        if shares == 0 {
            state.reject(BuyRejection {
                date,
                id,
                reason: RejectionReason::InsufficientCapital,
            });
            continue;
        }

        match state.ledger.buy(&id, series.name(), shares, open, date, day) {
            Ok(trade) => {
                tracing::debug!(
                    %id,
                    %date,
                    price = open,
                    shares,
                    cash = trade.cash_after,
                    "buy"
                );
                state.pending_buys.remove(&id);
            }
            Err(err) => {
                tracing::warn!(%id, %date, error = %err, "buy failed");
                state.reject(BuyRejection {
                    date,
                    id,
                    reason: RejectionReason::InsufficientCapital,
                });
            }
        }
    }
}

// ─── Phase 5: Signal feed ────────────────────────────────────────────

fn feed_signals(store: &MarketStore, state: &mut EngineState, day: usize) {
    let Some(date) = store.date_at(day) else {
        return;
    };
    for (id, series) in store.iter() {
        let Some(bar) = series.bar_on(date) else {
            continue;
        };
        let Some(generator) = state.generators.get_mut(id) else {
            continue;
        };
        let position = state.ledger.position(id);
        let signal = generator.process_day(bar, day, position);
        if position.is_none() && signal.is_buy() {
            state.pending_buys.insert(id.to_string(), signal);
        } else {
            state.pending_buys.remove(id);
        }
    }
}

// ─── End of run ──────────────────────────────────────────────────────

fn liquidate(store: &MarketStore, state: &mut EngineState) {
    let Some(last_day) = store.calendar().len().checked_sub(1) else {
        return;
    };
    let Some(last_date) = store.date_at(last_day) else {
        return;
    };
    let held: Vec<String> = state.ledger.positions().keys().cloned().collect();
    for id in held {
        let close = store
            .get(&id)
            .and_then(|s| s.last_index_on_or_before(last_date).map(|i| s.bars()[i].close));
        let price = match close {
            Some(price) => price,
            None => match state.ledger.position(&id) {
                Some(pos) => pos.mark,
                None => continue,
            },
        };
        if let Err(err) = state
            .ledger
            .sell(&id, price, last_date, last_day, TradeReason::ForcedClose)
        {
            tracing::warn!(%id, error = %err, "forced close failed");
        }
    }
}
