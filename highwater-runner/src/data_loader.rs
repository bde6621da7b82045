//! Bar loading for the runner.
//!
//! Real data is one `<id>.csv` per instrument under a data directory, with
//! header `date,open,close,high,low` and an optional trailing `volume`
//! column. The instrument list is a separate `id,name` CSV. Files are parsed
//! in parallel and assembled into an immutable `MarketStore`.
//!
//! Synthetic data is a developer-only mode for running without a data
//! directory. Results produced on it are tagged.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use highwater_core::domain::{Bar, MarketStore, PriceSeries, SeriesError, StoreError};

use crate::config::DataSection;

/// An open below this fraction of the previous close is treated as an
/// ex-rights gap when gap adjustment is on.
pub const GAP_RATIO: f64 = 0.85;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid bars: {0}")]
    Series(#[from] SeriesError),

    #[error("invalid market: {0}")]
    Store(#[from] StoreError),

    #[error("{path} has {bars} usable bars, need at least {min}")]
    TooShort { path: PathBuf, bars: usize, min: usize },

    #[error("no instrument could be loaded")]
    NoData,
}

/// One row of the instrument list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InstrumentInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    close: f64,
    high: f64,
    low: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Options controlling how bars are loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Log and skip instruments that fail to load instead of aborting.
    pub skip_bad: bool,
    /// Instruments with fewer usable bars than this are skipped.
    pub min_bars: usize,
    /// Rescale prices after ex-rights gaps (see [`GAP_RATIO`]).
    pub adjust_gaps: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            skip_bad: true,
            min_bars: 1,
            adjust_gaps: false,
        }
    }
}

impl From<&DataSection> for LoadOptions {
    fn from(data: &DataSection) -> Self {
        Self {
            skip_bad: data.skip_bad,
            min_bars: data.min_bars,
            adjust_gaps: data.adjust_gaps,
        }
    }
}

/// Result of loading bars, including provenance.
#[derive(Debug)]
pub struct LoadedData {
    pub store: MarketStore,
    /// BLAKE3 over every bar in id order.
    pub dataset_hash: String,
    /// Instruments that were listed but not loaded, with the reason.
    pub skipped: Vec<(String, String)>,
    pub has_synthetic: bool,
}

impl LoadedData {
    pub fn from_store(store: MarketStore, has_synthetic: bool) -> Self {
        let dataset_hash = compute_dataset_hash(&store);
        Self {
            store,
            dataset_hash,
            skipped: Vec::new(),
            has_synthetic,
        }
    }
}

pub fn load_instruments(path: &Path) -> Result<Vec<InstrumentInfo>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    reader
        .deserialize()
        .collect::<Result<Vec<InstrumentInfo>, _>>()
        .map_err(csv_err)
}

/// Path of an instrument's bar file.
pub fn series_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.csv"))
}

/// Load one instrument's bars.
///
/// Rows with zero volume are suspension days and are dropped.
pub fn load_series(
    dir: &Path,
    info: &InstrumentInfo,
    opts: &LoadOptions,
) -> Result<PriceSeries, LoadError> {
    let path = series_path(dir, &info.id);
    let csv_err = |source| LoadError::Csv {
        path: path.clone(),
        source,
    };
    let mut reader = csv::Reader::from_path(&path).map_err(csv_err)?;
    let mut rows = Vec::new();
    for row in reader.deserialize::<CsvBar>() {
        let row = row.map_err(csv_err)?;
        if row.volume == Some(0.0) {
            continue;
        }
        rows.push(row);
    }

    if rows.len() < opts.min_bars {
        return Err(LoadError::TooShort {
            path,
            bars: rows.len(),
            min: opts.min_bars,
        });
    }

    let bars = if opts.adjust_gaps {
        adjust_gaps(&rows)
    } else {
        rows.iter()
            .map(|r| Bar::new(r.date, r.open, r.close, r.high, r.low))
            .collect()
    };
    Ok(PriceSeries::new(info.id.clone(), info.name.clone(), bars)?)
}

/// Scale every bar after an ex-rights gap so that the series stays
/// continuous. Factors compound across gaps.
fn adjust_gaps(rows: &[CsvBar]) -> Vec<Bar> {
    let mut factor = 1.0;
    let mut prev_close: Option<f64> = None;
    rows.iter()
        .map(|r| {
            if let Some(prev) = prev_close {
                if r.open > 0.0 && r.open / prev < GAP_RATIO {
                    factor *= prev / r.open;
                }
            }
            prev_close = Some(r.close);
            Bar::new(
                r.date,
                r.open * factor,
                r.close * factor,
                r.high * factor,
                r.low * factor,
            )
        })
        .collect()
}

/// Load every listed instrument from `dir` into a market store.
pub fn load_store(
    dir: &Path,
    instruments: &[InstrumentInfo],
    opts: &LoadOptions,
) -> Result<LoadedData, LoadError> {
    let results: Vec<(&InstrumentInfo, Result<PriceSeries, LoadError>)> = instruments
        .par_iter()
        .map(|info| (info, load_series(dir, info, opts)))
        .collect();

    let mut series = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (info, result) in results {
        match result {
            Ok(s) => {
                debug!(id = %info.id, bars = s.len(), "loaded series");
                series.push(s);
            }
            Err(e) if opts.skip_bad => {
                warn!(id = %info.id, error = %e, "skipping instrument");
                skipped.push((info.id.clone(), e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    if series.is_empty() {
        return Err(LoadError::NoData);
    }

    let store = MarketStore::new(series)?;
    info!(
        instruments = store.len(),
        skipped = skipped.len(),
        days = store.calendar().len(),
        "market loaded"
    );
    let mut loaded = LoadedData::from_store(store, false);
    loaded.skipped = skipped;
    Ok(loaded)
}

/// Compute a deterministic BLAKE3 hash over all bar data.
///
/// Store iteration is ordered by id, so the hash does not depend on load
/// order.
pub fn compute_dataset_hash(store: &MarketStore) -> String {
    let mut hasher = blake3::Hasher::new();
    for (id, series) in store.iter() {
        hasher.update(id.as_bytes());
        hasher.update(series.name().as_bytes());
        for bar in series.bars() {
            hasher.update(bar.date.to_string().as_bytes());
            hasher.update(&bar.open.to_le_bytes());
            hasher.update(&bar.close.to_le_bytes());
            hasher.update(&bar.high.to_le_bytes());
            hasher.update(&bar.low.to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// Id of the n-th synthetic instrument.
pub fn synthetic_id(n: usize) -> String {
    format!("SYN{n:03}")
}

/// Generate `count` synthetic instruments with `days` weekday bars each.
pub fn generate_synthetic(
    count: usize,
    start: NaiveDate,
    days: usize,
) -> Result<LoadedData, LoadError> {
    warn!(count, days, "generating synthetic data, results will be tagged as synthetic");
    let series = (0..count)
        .map(|n| {
            let id = synthetic_id(n);
            let bars = synthetic_bars(&id, start, days);
            PriceSeries::new(id, format!("Synthetic {n}"), bars)
        })
        .collect::<Result<Vec<_>, _>>()?;
    if series.is_empty() {
        return Err(LoadError::NoData);
    }
    Ok(LoadedData::from_store(MarketStore::new(series)?, true))
}

/// A random walk from 10.0, deterministic per id.
fn synthetic_bars(id: &str, start: NaiveDate, days: usize) -> Vec<Bar> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let seed: [u8; 32] = *blake3::hash(id.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut bars = Vec::with_capacity(days);
    let mut price = 10.0_f64;
    let mut current = start;

    while bars.len() < days {
        let weekday = current.weekday();
        if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
            current += chrono::Duration::days(1);
            continue;
        }

        let open = price * (1.0 + rng.gen_range(-0.01..0.01));
        let close = (open * (1.0 + rng.gen_range(-0.03..0.031))).max(0.5);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        bars.push(Bar::new(current, open, close, high, low));

        price = close;
        current += chrono::Duration::days(1);
    }

    bars
}
