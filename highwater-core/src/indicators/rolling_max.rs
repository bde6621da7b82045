//! Sliding-window maximum over a stream of prices.
//!
//! A monotonic-decreasing deque of `(index, price)` pairs. Each push pops
//! smaller values off the back, appends, then evicts front entries that
//! have fallen out of the window. The front is always the window maximum.
//! Amortized O(1) per push.
//!
//! Equal prices are kept, so the front is the *earliest* occurrence of the
//! maximum.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RollingMax {
    window: usize,
    deque: VecDeque<(usize, f64)>,
    pushed: usize,
}

impl RollingMax {
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            deque: VecDeque::with_capacity(window),
            pushed: 0,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Number of values pushed since construction or the last reset.
    pub fn seen(&self) -> usize {
        self.pushed
    }

    /// True once a full window of values has been pushed.
    pub fn is_full(&self) -> bool {
        self.pushed >= self.window
    }

    pub fn push(&mut self, price: f64) {
        let index = self.pushed;
        self.pushed += 1;

        while self.deque.back().is_some_and(|&(_, p)| p < price) {
            self.deque.pop_back();
        }
        self.deque.push_back((index, price));
        while self
            .deque
            .front()
            .is_some_and(|&(i, _)| i + self.window <= index)
        {
            self.deque.pop_front();
        }
    }

    /// Maximum of the last `window` pushed values.
    pub fn max(&self) -> Option<f64> {
        self.deque.front().map(|&(_, p)| p)
    }

    /// Push index (0-based) of the earliest occurrence of the window maximum.
    pub fn argmax(&self) -> Option<usize> {
        self.deque.front().map(|&(i, _)| i)
    }

    pub fn reset(&mut self) {
        self.deque.clear();
        self.pushed = 0;
    }
}

/// Every index `i >= window - 1` whose price is the first maximum of the
/// window of `window` prices ending at `i`.
///
/// These are the days a price sets a fresh trailing high.
pub fn high_point_days(prices: &[f64], window: usize) -> Vec<usize> {
    let mut rolling = RollingMax::new(window);
    let mut days = Vec::new();
    for (i, &price) in prices.iter().enumerate() {
        rolling.push(price);
        if rolling.is_full() && rolling.argmax() == Some(i) {
            days.push(i);
        }
    }
    days
}
