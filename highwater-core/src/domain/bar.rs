//! Bar: one trading day of prices for one instrument.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a bar is rejected at load time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("{date}: {field} price {value} is not a positive finite number")]
    NonPositive {
        date: NaiveDate,
        field: &'static str,
        value: f64,
    },
    #[error("{date}: high {high} is below low {low}")]
    HighBelowLow { date: NaiveDate, high: f64, low: f64 },
}

/// Daily bar. Immutable once loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, close: f64, high: f64, low: f64) -> Self {
        Self {
            date,
            open,
            close,
            high,
            low,
        }
    }

    /// Bar whose four prices are all `price`. Handy for flat synthetic days.
    pub fn flat(date: NaiveDate, price: f64) -> Self {
        Self::new(date, price, price, price, price)
    }

    /// Checks that every price is positive and finite and that high >= low.
    pub fn validate(&self) -> Result<(), BarError> {
        for (field, value) in [
            ("open", self.open),
            ("close", self.close),
            ("high", self.high),
            ("low", self.low),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(BarError::NonPositive {
                    date: self.date,
                    field,
                    value,
                });
            }
        }
        if self.high < self.low {
            return Err(BarError::HighBelowLow {
                date: self.date,
                high: self.high,
                low: self.low,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            100.0,
            103.0,
            105.0,
            98.0,
        )
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate().is_ok());
    }

    #[test]
    fn zero_open_rejected() {
        let mut bar = sample_bar();
        bar.open = 0.0;
        assert!(matches!(
            bar.validate(),
            Err(BarError::NonPositive { field: "open", .. })
        ));
    }

    #[test]
    fn nan_close_rejected() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(bar.validate().is_err());
    }

    #[test]
    fn high_below_low_rejected() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(matches!(bar.validate(), Err(BarError::HighBelowLow { .. })));
    }

    #[test]
    fn bar_serialization_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
