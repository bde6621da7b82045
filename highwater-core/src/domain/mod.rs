//! Domain types: bars, series, the market store, positions, trades, snapshots.

pub mod bar;
pub mod equity;
pub mod position;
pub mod series;
pub mod store;
pub mod trade;

pub use bar::{Bar, BarError};
pub use equity::DailyEquitySnapshot;
pub use position::Position;
pub use series::{PriceSeries, SeriesError};
pub use store::{MarketStore, StoreError};
pub use trade::{TradeAction, TradeReason, TradeRecord};
