//! MarketStore: every loaded series plus the merged trading calendar.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use thiserror::Error;

use super::series::PriceSeries;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("duplicate instrument id '{0}'")]
    DuplicateId(String),
}

/// Read-only market data arena handed to the engine.
///
/// The trading calendar is the sorted union of every series' dates; a
/// day index always refers to a position in this calendar.
#[derive(Debug, Clone, Default)]
pub struct MarketStore {
    series: BTreeMap<String, PriceSeries>,
    calendar: Vec<NaiveDate>,
}

impl MarketStore {
    pub fn new(series: Vec<PriceSeries>) -> Result<Self, StoreError> {
        let mut map = BTreeMap::new();
        let mut dates = BTreeSet::new();
        for s in series {
            dates.extend(s.bars().iter().map(|b| b.date));
            let id = s.id().to_string();
            if map.insert(id.clone(), s).is_some() {
                return Err(StoreError::DuplicateId(id));
            }
        }
        Ok(Self {
            series: map,
            calendar: dates.into_iter().collect(),
        })
    }

    pub fn get(&self, id: &str) -> Option<&PriceSeries> {
        self.series.get(id)
    }

    /// Instrument ids in sorted order.
    pub fn ids(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PriceSeries)> {
        self.series.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn calendar(&self) -> &[NaiveDate] {
        &self.calendar
    }

    pub fn date_at(&self, day_index: usize) -> Option<NaiveDate> {
        self.calendar.get(day_index).copied()
    }

    /// Index into `id`'s own bars of the last bar visible on calendar day
    /// `day_index`. Never looks past that day.
    pub fn visible_index(&self, id: &str, day_index: usize) -> Option<usize> {
        let date = self.date_at(day_index)?;
        self.get(id)?.last_index_on_or_before(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Bar;

    fn d(day: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(day)
    }

    fn series(id: &str, days: &[i64]) -> PriceSeries {
        let bars = days.iter().map(|&i| Bar::flat(d(i), 10.0)).collect();
        PriceSeries::new(id, id, bars).unwrap()
    }

    #[test]
    fn calendar_is_union_of_dates() {
        let store = MarketStore::new(vec![series("A", &[0, 2, 4]), series("B", &[1, 2, 3])]).unwrap();
        assert_eq!(store.calendar(), &[d(0), d(1), d(2), d(3), d(4)]);
        assert_eq!(store.ids(), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn visible_index_never_passes_the_day() {
        let store = MarketStore::new(vec![series("A", &[0, 2, 4]), series("B", &[1, 2, 3])]).unwrap();
        // calendar day 1 is d(1); A has no bar there, so its last visible bar is d(0)
        assert_eq!(store.visible_index("A", 1), Some(0));
        assert_eq!(store.visible_index("B", 0), None);
        assert_eq!(store.visible_index("B", 4), Some(2));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let err = MarketStore::new(vec![series("A", &[0]), series("A", &[1])]).unwrap_err();
        assert_eq!(err, StoreError::DuplicateId("A".into()));
    }
}
