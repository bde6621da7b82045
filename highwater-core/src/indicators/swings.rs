//! Turning points and swing sections of a close series.
//!
//! A turning point is a day where the day-over-day direction flips: a peak
//! when the close rose into it and falls after it, a trough the reverse.
//! A flat day counts as a down move.
//!
//! Swing sections group consecutive turning points into spans of at most
//! `max_span` bars and keep the span's highest and lowest points when their
//! ratio exceeds `min_ratio`, emitted in time order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnKind {
    Peak,
    Trough,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurningPoint {
    pub index: usize,
    pub price: f64,
    pub kind: TurnKind,
}

/// A qualifying swing: `start` precedes `end` in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwingSection {
    pub start: TurningPoint,
    pub end: TurningPoint,
}

impl SwingSection {
    pub fn is_rally(&self) -> bool {
        self.end.price > self.start.price
    }

    /// High over low of the pair.
    pub fn ratio(&self) -> f64 {
        let (hi, lo) = if self.is_rally() {
            (self.end.price, self.start.price)
        } else {
            (self.start.price, self.end.price)
        };
        if lo > 0.0 {
            hi / lo
        } else {
            0.0
        }
    }
}

pub const DEFAULT_MAX_SPAN: usize = 50;
pub const DEFAULT_MIN_RATIO: f64 = 1.2;

pub fn turning_points(closes: &[f64]) -> Vec<TurningPoint> {
    let rising = |i: usize| closes[i] > closes[i - 1];
    let mut points = Vec::new();
    for i in 1..closes.len().saturating_sub(1) {
        let into = rising(i);
        if into != rising(i + 1) {
            points.push(TurningPoint {
                index: i,
                price: closes[i],
                kind: if into { TurnKind::Peak } else { TurnKind::Trough },
            });
        }
    }
    points
}

pub fn swing_sections(points: &[TurningPoint], max_span: usize, min_ratio: f64) -> Vec<SwingSection> {
    let mut sections = Vec::new();
    let mut begin = 0;

    while begin < points.len() {
        let first = points[begin];
        let mut high = first;
        let mut low = first;
        let mut next = begin + 1;

        while next < points.len() && points[next].index - first.index <= max_span {
            let p = points[next];
            if p.price > high.price {
                high = p;
            } else if p.price < low.price {
                low = p;
            }
            next += 1;
        }

        if low.price > 0.0 && high.price / low.price > min_ratio {
            let (start, end) = if high.index < low.index {
                (high, low)
            } else {
                (low, high)
            };
            sections.push(SwingSection { start, end });
        }

        begin = next;
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_peak_and_trough() {
        let closes = [10.0, 11.0, 12.0, 11.0, 10.0, 13.0];
        let pts = turning_points(&closes);
        assert_eq!(pts.len(), 2);
        assert_eq!((pts[0].index, pts[0].kind), (2, TurnKind::Peak));
        assert_eq!((pts[1].index, pts[1].kind), (4, TurnKind::Trough));
    }

    #[test]
    fn monotonic_series_has_no_points() {
        let closes: Vec<f64> = (0..20).map(|i| 10.0 + i as f64).collect();
        assert!(turning_points(&closes).is_empty());
    }

    #[test]
    fn short_input_is_empty() {
        assert!(turning_points(&[]).is_empty());
        assert!(turning_points(&[1.0, 2.0]).is_empty());
    }

    #[test]
    fn large_swing_is_a_section() {
        // rally from 10 to 15 then back down
        let closes = [11.0, 10.0, 12.0, 15.0, 13.0, 14.0, 12.5];
        let pts = turning_points(&closes);
        let sections = swing_sections(&pts, 50, 1.2);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].start.price, 10.0);
        assert_eq!(sections[0].end.price, 15.0);
        assert!(sections[0].is_rally());
        assert!((sections[0].ratio() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn small_swings_are_ignored() {
        let closes = [10.0, 10.5, 10.2, 10.6, 10.1, 10.4, 10.0];
        let pts = turning_points(&closes);
        assert!(swing_sections(&pts, 50, 1.2).is_empty());
    }

    #[test]
    fn spans_are_bounded() {
        let points = vec![
            TurningPoint { index: 0, price: 10.0, kind: TurnKind::Trough },
            TurningPoint { index: 60, price: 20.0, kind: TurnKind::Peak },
            TurningPoint { index: 70, price: 10.0, kind: TurnKind::Trough },
        ];
        // first span only holds index 0; second holds 60 and 70
        let sections = swing_sections(&points, 50, 1.2);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].start.index, 60);
        assert_eq!(sections[0].end.index, 70);
        assert!(!sections[0].is_rally());
    }

    #[test]
    fn long_history_does_not_recurse() {
        let closes: Vec<f64> = (0..200_000)
            .map(|i| if i % 2 == 0 { 10.0 } else { 13.0 })
            .collect();
        let pts = turning_points(&closes);
        let sections = swing_sections(&pts, DEFAULT_MAX_SPAN, DEFAULT_MIN_RATIO);
        assert!(!sections.is_empty());
    }
}
