//! End-to-end day-loop scenarios on hand-built price paths.
//!
//! Every scenario uses 500 warmup days of flat prices at 100 followed by a
//! jump to 110, which the default high-point selector (500, 15) flags and
//! the breakout signal turns into a buy at the next open.

use chrono::NaiveDate;
use highwater_core::components::{SelectorSpec, SignalSpec};
use highwater_core::domain::{Bar, MarketStore, PriceSeries, TradeAction, TradeReason};
use highwater_core::engine::{
    run_backtest, CapitalPolicy, ConfigError, EngineConfig, FeeModel, RejectionReason,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).unwrap() + chrono::Duration::days(i as i64)
}

/// Series from (open, close) pairs on consecutive days.
fn series(id: &str, prices: &[(f64, f64)]) -> PriceSeries {
    let bars = prices
        .iter()
        .enumerate()
        .map(|(i, &(open, close))| Bar::new(day(i), open, close, open.max(close), open.min(close)))
        .collect();
    PriceSeries::new(id, format!("{id} Corp"), bars).unwrap()
}

/// 520 flat days at 100, a close of 110 on day 520, then `tail` from day 521.
fn jump_path(tail: &[(f64, f64)]) -> Vec<(f64, f64)> {
    let mut prices = vec![(100.0, 100.0); 520];
    prices.push((100.0, 110.0));
    prices.extend_from_slice(tail);
    prices
}

fn flat(price: f64, n: usize) -> Vec<(f64, f64)> {
    vec![(price, price); n]
}

/// Daily reselection and a breaker loose enough to tolerate the 10% jump.
fn config() -> EngineConfig {
    EngineConfig {
        initial_cash: 1_000_000.0,
        max_positions: 1,
        reselect_every: Some(1),
        spike_threshold: 0.2,
        ..EngineConfig::default()
    }
}

// ── Scenarios ────────────────────────────────────────────────────────

#[test]
fn breakout_buy_then_drawdown_stop() {
    let mut tail = vec![(110.0, 110.0), (120.0, 120.0)];
    tail.extend(flat(111.6, 18));
    let store = MarketStore::new(vec![series("AAA", &jump_path(&tail))]).unwrap();

    let result = run_backtest(&store, &config()).unwrap();

    assert_eq!(result.trades.len(), 2, "trades: {:?}", result.trades);
    let buy = &result.trades[0];
    assert_eq!(buy.action, TradeAction::Buy);
    assert_eq!(buy.date, day(521));
    assert_eq!(buy.price, 110.0);
    assert_eq!(buy.shares, 9_000);
    assert_eq!(buy.reason, TradeReason::BuySignal);

    let sell = &result.trades[1];
    assert_eq!(sell.action, TradeAction::Sell);
    assert_eq!(sell.date, day(523));
    assert_eq!(sell.price, 111.6);
    assert_eq!(sell.reason, TradeReason::DrawdownStop);

    // Same arithmetic, same order as the ledger
    let fees = FeeModel::default();
    let buy_amount = 110.0 * 9_000.0;
    let buy_fees = fees.quote(buy_amount, TradeAction::Buy);
    let mut cash = 1_000_000.0;
    cash -= buy_amount + buy_fees.commission + buy_fees.transfer_fee;
    let sell_amount = 111.6 * 9_000.0;
    let sell_fees = fees.quote(sell_amount, TradeAction::Sell);
    cash += sell_amount - sell_fees.total;

    assert_eq!(result.final_cash, cash);
    assert!(result.verify_cash());
    assert!((result.total_fees - (buy_fees.total + sell_fees.total)).abs() < 1e-9);
}

#[test]
fn equity_curve_covers_every_simulated_day() {
    let mut tail = vec![(110.0, 110.0), (120.0, 120.0)];
    tail.extend(flat(111.6, 18));
    let prices = jump_path(&tail);
    let store = MarketStore::new(vec![series("AAA", &prices)]).unwrap();

    let result = run_backtest(&store, &config()).unwrap();

    assert_eq!(result.start_day, 500);
    assert_eq!(result.simulated_days, prices.len() - 500);
    assert_eq!(result.equity.len(), prices.len() - 500);
    assert_eq!(result.equity[0].date, day(500));
    assert!(result.equity.windows(2).all(|w| w[0].date < w[1].date));

    // Held overnight on day 521 and marked at the close
    let held = &result.equity[521 - 500];
    assert_eq!(held.open_positions, 1);
    assert_eq!(held.position_value, 9_000.0 * 110.0);
    let after_jump = &result.equity[522 - 500];
    assert_eq!(after_jump.position_value, 9_000.0 * 120.0);
}

#[test]
fn cash_below_one_lot_never_trades() {
    let mut tail = vec![(110.0, 110.0)];
    tail.extend(flat(110.0, 10));
    let store = MarketStore::new(vec![series("AAA", &jump_path(&tail))]).unwrap();
    let config = EngineConfig {
        initial_cash: 5_000.0,
        ..config()
    };

    let result = run_backtest(&store, &config).unwrap();

    assert!(result.trades.is_empty());
    assert_eq!(result.final_cash, 5_000.0);
    assert!(result.equity.iter().all(|s| s.open_positions == 0));
    assert!(result
        .rejections_by(RejectionReason::InsufficientCapital)
        .any(|r| r.id == "AAA" && r.date == day(521)));
}

#[test]
fn position_limit_defers_second_signal() {
    let mut a_tail = vec![(110.0, 110.0)];
    a_tail.extend(flat(102.0, 19));
    let mut b_tail = vec![(110.0, 110.0)];
    b_tail.extend(flat(110.0, 19));
    let store = MarketStore::new(vec![
        series("AAA", &jump_path(&a_tail)),
        series("BBB", &jump_path(&b_tail)),
    ])
    .unwrap();

    let result = run_backtest(&store, &config()).unwrap();
    let t = &result.trades;

    assert_eq!((t[0].id.as_str(), t[0].action), ("AAA", TradeAction::Buy));
    assert_eq!(t[0].date, day(521));

    let limited: Vec<_> = result.rejections_by(RejectionReason::PositionLimit).collect();
    assert_eq!(limited.len(), 1);
    assert_eq!((limited[0].id.as_str(), limited[0].date), ("BBB", day(521)));
    assert!(!result.cooldowns.contains_key("BBB"));

    // AAA gaps down 7.3% below its buy price and is stopped out; the freed
    // slot goes to BBB the same morning.
    assert_eq!((t[1].id.as_str(), t[1].reason), ("AAA", TradeReason::StopLoss));
    assert_eq!(t[1].date, day(522));
    assert_eq!((t[2].id.as_str(), t[2].action), ("BBB", TradeAction::Buy));
    assert_eq!(t[2].date, day(522));

    // BBB then sits flat until the holding limit
    assert_eq!(t.len(), 4);
    assert_eq!((t[3].id.as_str(), t[3].reason), ("BBB", TradeReason::MaxHold));
    assert_eq!(t[3].date, day(538));
}

#[test]
fn recent_spike_trips_breaker() {
    let mut tail = vec![(110.0, 110.0)];
    tail.extend(flat(110.0, 10));
    let store = MarketStore::new(vec![series("AAA", &jump_path(&tail))]).unwrap();
    let config = EngineConfig {
        spike_threshold: 0.07,
        ..config()
    };

    let result = run_backtest(&store, &config).unwrap();

    assert!(result.trades.is_empty());
    let spikes: Vec<_> = result.rejections_by(RejectionReason::RecentSpike).collect();
    assert_eq!(spikes.len(), 1, "cooldown should suppress repeat checks");
    assert_eq!(spikes[0].date, day(521));
    assert_eq!(result.cooldowns.get("AAA"), Some(&(521 + 50)));
}

#[test]
fn limit_up_open_blocks_buy_and_cools_down() {
    // opens 10% above the 110 close
    let mut tail = vec![(121.0, 121.0)];
    tail.extend(flat(121.0, 5));
    let store = MarketStore::new(vec![series("AAA", &jump_path(&tail))]).unwrap();

    let result = run_backtest(&store, &config()).unwrap();

    assert!(result.trades.is_empty());
    let locked: Vec<_> = result.rejections_by(RejectionReason::LimitLocked).collect();
    assert_eq!(locked.len(), 1);
    assert_eq!(locked[0].date, day(521));
    assert_eq!(result.cooldowns.get("AAA"), Some(&(521 + 50)));
}

#[test]
fn limit_down_open_defers_sell() {
    // buy at 110 on day 521, then a 10% gap down: locked, no sale that day
    let mut tail = vec![(110.0, 110.0), (99.0, 99.0)];
    tail.extend(flat(99.0, 3));
    let store = MarketStore::new(vec![series("AAA", &jump_path(&tail))]).unwrap();

    let result = run_backtest(&store, &config()).unwrap();
    let sells: Vec<_> = result
        .trades
        .iter()
        .filter(|t| t.action == TradeAction::Sell)
        .collect();

    assert_eq!(sells.len(), 1);
    assert_eq!(sells[0].date, day(523));
    assert_eq!(sells[0].reason, TradeReason::StopLoss);
}

#[test]
fn open_positions_are_liquidated_at_last_close() {
    let mut tail = vec![(110.0, 110.0)];
    tail.extend(flat(111.0, 3));
    let store = MarketStore::new(vec![series("AAA", &jump_path(&tail))]).unwrap();

    let result = run_backtest(&store, &config()).unwrap();

    let last = result.trades.last().unwrap();
    assert_eq!(last.reason, TradeReason::ForcedClose);
    assert_eq!(last.price, 111.0);
    assert_eq!(last.date, day(524));
    assert!(result.verify_cash());
}

#[test]
fn missing_bar_carries_position_forward() {
    let mut a = jump_path(&[(110.0, 110.0), (112.0, 112.0), (113.0, 113.0)]);
    a.extend(flat(113.0, 3));
    // drop AAA's bar on day 522; BBB keeps the calendar day alive
    let aaa: Vec<Bar> = a
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != 522)
        .map(|(i, &(o, c))| Bar::new(day(i), o, c, o.max(c), o.min(c)))
        .collect();
    let store = MarketStore::new(vec![
        PriceSeries::new("AAA", "AAA Corp", aaa).unwrap(),
        series("BBB", &flat(50.0, a.len())),
    ])
    .unwrap();

    let result = run_backtest(&store, &config()).unwrap();

    let gap = &result.equity[522 - 500];
    assert_eq!(gap.open_positions, 1);
    assert_eq!(gap.position_value, 9_000.0 * 110.0);
}

#[test]
fn fraction_policy_limits_position_size() {
    let mut tail = vec![(110.0, 110.0)];
    tail.extend(flat(110.0, 3));
    let store = MarketStore::new(vec![series("AAA", &jump_path(&tail))]).unwrap();
    let config = EngineConfig {
        capital: CapitalPolicy::FractionOfEquity { fraction: 0.25 },
        ..config()
    };

    let result = run_backtest(&store, &config).unwrap();

    // 250,000 / 110 / 100 = 22 lots
    assert_eq!(result.trades[0].shares, 2_200);
}

#[test]
fn invalid_config_rejected_before_run() {
    let store = MarketStore::new(vec![series("AAA", &flat(100.0, 10))]).unwrap();
    let config = EngineConfig {
        signal: SignalSpec::Breakout {
            lookback: 0,
            drop_pct: 0.06,
            max_hold_days: 15,
        },
        ..config()
    };
    assert!(matches!(
        run_backtest(&store, &config),
        Err(ConfigError::NotPositive { .. })
    ));
}

#[test]
fn short_calendar_runs_no_days() {
    let store = MarketStore::new(vec![series("AAA", &flat(100.0, 100))]).unwrap();
    let result = run_backtest(&store, &config()).unwrap();
    assert_eq!(result.simulated_days, 0);
    assert!(result.equity.is_empty());
    assert_eq!(result.final_cash, 1_000_000.0);
}

#[test]
fn single_selection_misses_later_breakouts() {
    let mut tail = vec![(110.0, 110.0)];
    tail.extend(flat(110.0, 5));
    let store = MarketStore::new(vec![series("AAA", &jump_path(&tail))]).unwrap();
    let config = EngineConfig {
        reselect_every: None,
        ..config()
    };

    // selected once as of day 499, when nothing had broken out
    let result = run_backtest(&store, &config).unwrap();
    assert!(result.trades.is_empty());
}

#[test]
fn all_market_selector_trades_without_high_point() {
    let mut tail = vec![(110.0, 110.0)];
    tail.extend(flat(110.0, 3));
    let store = MarketStore::new(vec![series("AAA", &jump_path(&tail))]).unwrap();
    let config = EngineConfig {
        selector: SelectorSpec::AllMarket,
        reselect_every: None,
        ..config()
    };

    let result = run_backtest(&store, &config).unwrap();
    // the flat series already satisfies the breakout rule on day 500
    assert_eq!(result.trades[0].date, day(500));
    assert_eq!(result.trades[0].price, 100.0);
}

#[test]
fn penny_sell_never_drives_cash_negative() {
    // one lot at 0.05 costs 10.00005 with the minimum commission, and the
    // 4.70 stop-loss sale is smaller than that commission
    let mut prices = flat(0.05, 10);
    prices.push((0.047, 0.047));
    prices.extend(flat(0.047, 2));
    let store = MarketStore::new(vec![series("AAA", &prices)]).unwrap();
    let config = EngineConfig {
        initial_cash: 10.01,
        selector: SelectorSpec::AllMarket,
        signal: SignalSpec::Breakout {
            lookback: 3,
            drop_pct: 0.06,
            max_hold_days: 15,
        },
        warmup_days: 5,
        ..config()
    };

    let result = run_backtest(&store, &config).unwrap();

    let sells: Vec<_> = result
        .trades
        .iter()
        .filter(|t| t.action == TradeAction::Sell)
        .collect();
    assert!(!sells.is_empty(), "trades: {:?}", result.trades);
    for sell in &sells {
        assert!(sell.total_fee <= sell.amount + 1e-12, "{sell:?}");
        assert!(sell.cash_after >= 0.0, "{sell:?}");
    }
    for snap in &result.equity {
        assert!(snap.cash >= 0.0, "negative cash {} on {}", snap.cash, snap.date);
    }
    assert!(result.final_cash >= 0.0);
    assert!(result.verify_cash());
}
