//! Stock selection: picks the candidate universe as of a historical day.
//!
//! Selectors are pure. `select_as_of` may only read bars dated on or before
//! `store.calendar()[as_of]`; `MarketStore::visible_index` enforces the cut.

pub mod all_market;
pub mod high_point;

pub use all_market::AllMarketSelector;
pub use high_point::HighPointSelector;

use crate::domain::MarketStore;

pub trait StockSelector: Send + Sync {
    fn name(&self) -> &str;

    /// Candidates among `ids`, in the order given.
    fn select_as_of(&self, store: &MarketStore, ids: &[String], as_of: usize) -> Vec<String>;
}
