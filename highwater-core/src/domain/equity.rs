use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// End-of-day account state. One per simulated trading day, in date order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyEquitySnapshot {
    pub date: NaiveDate,
    pub cash: f64,
    pub position_value: f64,
    pub total_assets: f64,
    pub open_positions: usize,
}
