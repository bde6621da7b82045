//! PriceSeries: an instrument's ordered daily bars with a date index.

use std::collections::HashMap;

use chrono::NaiveDate;
use thiserror::Error;

use super::bar::{Bar, BarError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("series '{id}' has no bars")]
    Empty { id: String },
    #[error("series '{id}': dates not strictly increasing at {date}")]
    Unordered { id: String, date: NaiveDate },
    #[error("series '{id}': {source}")]
    InvalidBar {
        id: String,
        #[source]
        source: BarError,
    },
}

/// Daily bars for one instrument, strictly increasing by date.
///
/// The date→index map is built once here so that every lookup the engine
/// performs during a run is O(1).
#[derive(Debug, Clone)]
pub struct PriceSeries {
    id: String,
    name: String,
    bars: Vec<Bar>,
    index: HashMap<NaiveDate, usize>,
}

impl PriceSeries {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        bars: Vec<Bar>,
    ) -> Result<Self, SeriesError> {
        let id = id.into();
        if bars.is_empty() {
            return Err(SeriesError::Empty { id });
        }

        let mut index = HashMap::with_capacity(bars.len());
        let mut prev: Option<NaiveDate> = None;
        for (i, bar) in bars.iter().enumerate() {
            bar.validate().map_err(|source| SeriesError::InvalidBar {
                id: id.clone(),
                source,
            })?;
            if prev.is_some_and(|p| bar.date <= p) {
                return Err(SeriesError::Unordered {
                    id,
                    date: bar.date,
                });
            }
            prev = Some(bar.date);
            index.insert(bar.date, i);
        }

        Ok(Self {
            id,
            name: name.into(),
            bars,
            index,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.index.get(&date).copied()
    }

    pub fn bar_on(&self, date: NaiveDate) -> Option<&Bar> {
        self.index_of(date).map(|i| &self.bars[i])
    }

    /// Close of the bar preceding `index`, if any.
    pub fn prev_close(&self, index: usize) -> Option<f64> {
        index
            .checked_sub(1)
            .and_then(|i| self.bars.get(i))
            .map(|b| b.close)
    }

    /// Index of the last bar dated on or before `date`.
    pub fn last_index_on_or_before(&self, date: NaiveDate) -> Option<usize> {
        let n = self.bars.partition_point(|b| b.date <= date);
        n.checked_sub(1)
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
