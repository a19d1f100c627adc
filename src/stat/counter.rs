//! Rolling counter: sum of values added within the trailing window.

use std::time::Instant;
use crate::stat::window::{Buckets, RollingOpts, RollingWindow};

/// Sums values over the trailing `size × bucket_duration`.
#[derive(Debug)]
pub struct RollingCounter {
    window: RollingWindow,
}

impl RollingCounter {
    pub fn new(opts: RollingOpts) -> Self {
        Self {
            window: RollingWindow::new(opts),
        }
    }

    /// Create a counter whose first bucket starts at `start`.
    pub fn starting_at(opts: RollingOpts, start: Instant) -> Self {
        Self {
            window: RollingWindow::starting_at(opts, start),
        }
    }

    pub fn add(&self, value: i64) {
        self.add_at(value, Instant::now());
    }

    pub fn add_at(&self, value: i64, now: Instant) {
        self.window.record_at(now, |bucket| bucket.accumulate(value as f64));
    }

    /// Total of all values in the window.
    pub fn sum(&self) -> i64 {
        self.sum_at(Instant::now())
    }

    pub fn sum_at(&self, now: Instant) -> i64 {
        self.reduce_at(now, |buckets| sum_points(buckets) as i64)
    }

    /// Number of additions in the window.
    pub fn count(&self) -> i64 {
        self.count_at(Instant::now())
    }

    pub fn count_at(&self, now: Instant) -> i64 {
        self.reduce_at(now, |buckets| buckets.map(|b| b.count).sum())
    }

    /// `(sum, count)` read under one lock acquisition.
    pub fn summary_at(&self, now: Instant) -> (i64, i64) {
        self.reduce_at(now, |buckets| {
            buckets.fold((0i64, 0i64), |(sum, count), b| {
                (sum + b.points.iter().sum::<f64>() as i64, count + b.count)
            })
        })
    }

    /// Summarise the live buckets, oldest first.
    pub fn reduce_at<F, R>(&self, now: Instant, f: F) -> R
    where
        F: FnOnce(Buckets<'_>) -> R,
    {
        self.window.reduce_at(now, f)
    }

    pub fn opts(&self) -> RollingOpts {
        self.window.opts()
    }
}

fn sum_points(buckets: Buckets<'_>) -> f64 {
    buckets.flat_map(|b| b.points.iter()).sum()
}
