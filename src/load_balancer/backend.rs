//! Per-connection backend state.
//!
//! # Responsibilities
//! - Hold one ready connection with its address, weight and color
//! - Track call outcomes (0 = success, 1 = error) in a rolling counter
//! - Track call latency in a rolling gauge, in 100µs ticks
//! - Summarise both windows for telemetry and weight adjustment

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use serde::Serialize;
use crate::stat::{RollingCounter, RollingGauge, RollingOpts};

/// Unit of the latency window.
pub const LATENCY_TICK: Duration = Duration::from_micros(100);

const TICKS_PER_MS: f64 = 10.0;

/// Convert an elapsed duration into latency ticks.
pub fn latency_ticks(elapsed: Duration) -> i64 {
    (elapsed.as_nanos() / LATENCY_TICK.as_nanos()) as i64
}

/// Convert a (possibly fractional) tick count back into a duration.
pub fn ticks_to_duration(ticks: f64) -> Duration {
    if ticks <= 0.0 || !ticks.is_finite() {
        return Duration::ZERO;
    }
    Duration::from_nanos((ticks * LATENCY_TICK.as_nanos() as f64).round() as u64)
}

/// Health snapshot fed to weight adjusters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackendHealth {
    /// Configured weight.
    pub weight: u32,
    pub errors: i64,
    pub requests: i64,
    /// Mean latency in ticks.
    pub mean_latency: f64,
    pub latency_samples: i64,
}

impl BackendHealth {
    /// Share of requests in window that succeeded, `1.0` when idle.
    pub fn success_ratio(&self) -> f64 {
        if self.requests <= 0 {
            return 1.0;
        }
        (self.requests - self.errors).max(0) as f64 / self.requests as f64
    }
}

/// Telemetry view of one backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStats {
    pub address: String,
    pub color: String,
    pub weight: u32,
    /// Selections since the picker was built.
    pub picks: u64,
    /// Errors in the trailing window.
    pub errors: i64,
    /// Completed calls in the trailing window.
    pub requests: i64,
    /// Mean latency over the trailing window, in milliseconds.
    pub mean_latency_ms: f64,
}

/// A single ready backend.
#[derive(Debug)]
pub struct BackendState<C> {
    conn: C,
    address: String,
    weight: u32,
    color: String,
    errors: RollingCounter,
    latency: RollingGauge,
    picks: AtomicU64,
}

impl<C> BackendState<C> {
    /// Create backend state. `weight` is fixed for the lifetime of the value.
    pub fn new(
        conn: C,
        address: impl Into<String>,
        weight: u32,
        color: impl Into<String>,
        window: RollingOpts,
    ) -> Self {
        Self {
            conn,
            address: address.into(),
            weight,
            color: color.into(),
            errors: RollingCounter::new(window),
            latency: RollingGauge::new(window),
            picks: AtomicU64::new(0),
        }
    }

    pub fn conn(&self) -> &C {
        &self.conn
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn picks(&self) -> u64 {
        self.picks.load(Ordering::Relaxed)
    }

    pub(crate) fn mark_picked(&self) {
        self.picks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one finished call.
    pub fn record_outcome(&self, is_error: bool, latency: Duration) {
        self.record_outcome_at(is_error, latency, Instant::now());
    }

    pub fn record_outcome_at(&self, is_error: bool, latency: Duration, now: Instant) {
        self.errors.add_at(i64::from(is_error), now);
        self.latency.add_at(latency_ticks(latency), now);
    }

    /// `(errors, requests)` over the trailing window.
    pub fn error_summary(&self) -> (i64, i64) {
        self.error_summary_at(Instant::now())
    }

    pub fn error_summary_at(&self, now: Instant) -> (i64, i64) {
        self.errors.summary_at(now)
    }

    /// `(mean latency in ticks, samples)` over the trailing window.
    pub fn latency_summary(&self) -> (f64, i64) {
        self.latency_summary_at(Instant::now())
    }

    pub fn latency_summary_at(&self, now: Instant) -> (f64, i64) {
        self.latency.summary_at(now)
    }

    /// Mean latency over the trailing window.
    pub fn mean_latency(&self) -> Duration {
        ticks_to_duration(self.latency_summary().0)
    }

    pub fn health(&self) -> BackendHealth {
        let now = Instant::now();
        let (errors, requests) = self.error_summary_at(now);
        let (mean_latency, latency_samples) = self.latency_summary_at(now);
        BackendHealth {
            weight: self.weight,
            errors,
            requests,
            mean_latency,
            latency_samples,
        }
    }

    pub fn stats(&self) -> BackendStats {
        let health = self.health();
        BackendStats {
            address: self.address.clone(),
            color: self.color.clone(),
            weight: self.weight,
            picks: self.picks(),
            errors: health.errors,
            requests: health.requests,
            mean_latency_ms: health.mean_latency / TICKS_PER_MS,
        }
    }
}
