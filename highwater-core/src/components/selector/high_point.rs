//! High-point selector: the trailing-window maximum is recent.

use crate::domain::MarketStore;
use crate::indicators::RollingMax;

use super::StockSelector;

pub const DEFAULT_LOOKBACK: usize = 500;
pub const DEFAULT_RECENT: usize = 15;

/// Flags an instrument when the maximum close over the last `lookback`
/// visible bars occurred within the last `recent` of them.
///
/// Ties resolve to the earliest bar, so a flat window is never flagged.
/// Instruments with fewer than `lookback` visible bars are skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighPointSelector {
    pub lookback: usize,
    pub recent: usize,
}

impl Default for HighPointSelector {
    fn default() -> Self {
        Self {
            lookback: DEFAULT_LOOKBACK,
            recent: DEFAULT_RECENT,
        }
    }
}

impl HighPointSelector {
    pub fn new(lookback: usize, recent: usize) -> Self {
        Self { lookback, recent }
    }

    /// Whether the last `lookback` closes peak inside the recent tail.
    pub fn is_high_point(&self, closes: &[f64]) -> bool {
        if self.lookback == 0 || closes.len() < self.lookback {
            return false;
        }
        let window = &closes[closes.len() - self.lookback..];
        let mut rolling = RollingMax::new(self.lookback);
        for &c in window {
            rolling.push(c);
        }
        match rolling.argmax() {
            Some(pos) => pos + self.recent >= self.lookback,
            None => false,
        }
    }
}

impl StockSelector for HighPointSelector {
    fn name(&self) -> &str {
        "high_point"
    }

    fn select_as_of(&self, store: &MarketStore, ids: &[String], as_of: usize) -> Vec<String> {
        ids.iter()
            .filter(|id| {
                let Some(series) = store.get(id) else {
                    return false;
                };
                let Some(last) = store.visible_index(id, as_of) else {
                    return false;
                };
                let visible = &series.bars()[..=last];
                if visible.len() < self.lookback {
                    return false;
                }
                let closes: Vec<f64> = visible[visible.len() - self.lookback..]
                    .iter()
                    .map(|b| b.close)
                    .collect();
                self.is_high_point(&closes)
            })
            .cloned()
            .collect()
    }
}
