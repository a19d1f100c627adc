//! Weight adjustment from rolling health.
//!
//! # Responsibilities
//! - Map a backend's health snapshot to the weight used by smooth WRR
//! - Bound how often a group recomputes effective weights
//!
//! Groups without an adjuster use configured weights as-is.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use crate::load_balancer::backend::{ticks_to_duration, BackendHealth};

/// Derives an effective selection weight from backend health.
pub trait WeightAdjuster: Send + Sync + fmt::Debug {
    /// Effective weight; results below 1 are raised to 1.
    fn effective_weight(&self, health: &BackendHealth) -> u32;
}

/// Scales the configured weight by success ratio and latency.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthScaled {
    /// Calls needed in window before the success ratio is trusted.
    pub min_requests: i64,
    /// Mean latency above this target scales the weight down proportionally.
    pub latency_target: Option<Duration>,
}

impl Default for HealthScaled {
    fn default() -> Self {
        Self {
            min_requests: 20,
            latency_target: None,
        }
    }
}

impl WeightAdjuster for HealthScaled {
    fn effective_weight(&self, health: &BackendHealth) -> u32 {
        let mut factor = 1.0;

        if health.requests >= self.min_requests.max(1) {
            factor *= health.success_ratio();
        }

        if let Some(target) = self.latency_target {
            let mean = ticks_to_duration(health.mean_latency);
            if health.latency_samples > 0 && mean > target {
                factor *= target.as_secs_f64() / mean.as_secs_f64();
            }
        }

        ((health.weight as f64 * factor).round() as u32).max(1)
    }
}

/// An adjuster together with its refresh interval.
#[derive(Debug, Clone)]
pub struct AdaptiveWeights {
    pub adjuster: Arc<dyn WeightAdjuster>,
    pub update_interval: Duration,
}

impl AdaptiveWeights {
    pub fn new(adjuster: Arc<dyn WeightAdjuster>, update_interval: Duration) -> Self {
        Self {
            adjuster,
            update_interval,
        }
    }

    pub(crate) fn weight_for(&self, health: &BackendHealth) -> i64 {
        i64::from(self.adjuster.effective_weight(health).max(1))
    }
}
