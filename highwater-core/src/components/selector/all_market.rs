use crate::domain::MarketStore;

use super::StockSelector;

/// Selects every instrument.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllMarketSelector;

impl StockSelector for AllMarketSelector {
    fn name(&self) -> &str {
        "all_market"
    }

    fn select_as_of(&self, _store: &MarketStore, ids: &[String], _as_of: usize) -> Vec<String> {
        ids.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_all_ids_in_order() {
        let store = MarketStore::default();
        let ids = vec!["B".to_string(), "A".to_string()];
        assert_eq!(AllMarketSelector.select_as_of(&store, &ids, 0), ids);
    }
}
