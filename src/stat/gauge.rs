//! Rolling gauge: every sample in the trailing window is kept so the mean
//! is exact.

use std::time::Instant;
use crate::stat::window::{Buckets, RollingOpts, RollingWindow};

/// Tracks samples over the trailing `size × bucket_duration`.
#[derive(Debug)]
pub struct RollingGauge {
    window: RollingWindow,
}

impl RollingGauge {
    pub fn new(opts: RollingOpts) -> Self {
        Self {
            window: RollingWindow::new(opts),
        }
    }

    pub fn starting_at(opts: RollingOpts, start: Instant) -> Self {
        Self {
            window: RollingWindow::starting_at(opts, start),
        }
    }

    pub fn add(&self, value: i64) {
        self.add_at(value, Instant::now());
    }

    pub fn add_at(&self, value: i64, now: Instant) {
        self.window.record_at(now, |bucket| bucket.append(value as f64));
    }

    /// Mean of the samples in the window, `0.0` when empty.
    pub fn avg(&self) -> f64 {
        self.avg_at(Instant::now())
    }

    pub fn avg_at(&self, now: Instant) -> f64 {
        self.summary_at(now).0
    }

    pub fn count(&self) -> i64 {
        self.count_at(Instant::now())
    }

    pub fn count_at(&self, now: Instant) -> i64 {
        self.reduce_at(now, |buckets| buckets.map(|b| b.count).sum())
    }

    pub fn sum_at(&self, now: Instant) -> f64 {
        self.reduce_at(now, |buckets| buckets.flat_map(|b| b.points.iter()).sum())
    }

    /// Largest sample in the window.
    pub fn max_at(&self, now: Instant) -> Option<f64> {
        self.reduce_at(now, |buckets| {
            buckets
                .flat_map(|b| b.points.iter().copied())
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
        })
    }

    /// `(mean, count)` read under one lock acquisition.
    pub fn summary_at(&self, now: Instant) -> (f64, i64) {
        self.reduce_at(now, |buckets| {
            let (total, count) = buckets.fold((0.0f64, 0i64), |(total, count), b| {
                (total + b.points.iter().sum::<f64>(), count + b.count)
            });
            if count == 0 {
                (0.0, 0)
            } else {
                (total / count as f64, count)
            }
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
