//! Pre-trade guards: price-limit lock and recent-spike breaker.
//!
//! Both are pure functions over a series and an index into its own bars.
//! A failed buy guard produces a `BuyRejection` for diagnostics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// A close-to-close jump above the spike threshold in the prior bars.
    RecentSpike,
    /// The open is a limit move from the previous close.
    LimitLocked,
    /// Budget cannot cover one lot plus fees.
    InsufficientCapital,
    /// The portfolio is at its maximum number of positions.
    PositionLimit,
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RejectionReason::RecentSpike => "recent spike",
            RejectionReason::LimitLocked => "limit locked",
            RejectionReason::InsufficientCapital => "insufficient capital",
            RejectionReason::PositionLimit => "position limit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyRejection {
    pub date: NaiveDate,
    pub id: String,
    pub reason: RejectionReason,
}

/// True when `open` moved more than `threshold` from the previous close.
///
/// Without a usable previous close the move cannot be ruled out, so the
/// day counts as locked.
pub fn is_limit_move(open: f64, prev_close: Option<f64>, threshold: f64) -> bool {
    match prev_close {
        Some(prev) if prev > 0.0 => ((open - prev) / prev).abs() > threshold,
        _ => true,
    }
}

/// True when any of the `lookback` bars before `index` closed more than
/// `threshold` above its own previous close.
///
/// Returns false while fewer than `lookback` bars precede `index`.
pub fn has_recent_spike(series: &PriceSeries, index: usize, lookback: usize, threshold: f64) -> bool {
    if index < lookback {
        return false;
    }
    let bars = series.bars();
    (index - lookback..index)
        .filter(|&i| i > 0)
        .any(|i| {
            let prev = bars[i - 1].close;
            prev > 0.0 && (bars[i].close - prev) / prev > threshold
        })
}
