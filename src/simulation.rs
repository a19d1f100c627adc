//! Synthetic traffic against a picker.
//!
//! Drives `pick` + completion with randomly injected failures and latencies
//! so weights, colors and window summaries can be inspected offline.

use std::collections::BTreeMap;
use std::time::Duration;
use rand::Rng;
use serde::Serialize;
use crate::load_balancer::{
    BackendStats, CallContext, CallError, Code, DoneInfo, Picker, WrrPicker,
};

/// Shape of the synthetic traffic.
#[derive(Debug, Clone)]
pub struct SimulationOptions {
    pub calls: usize,
    /// Color attached to every call, if any.
    pub color: Option<String>,
    /// Probability in `[0, 1]` that a call fails with `Unavailable`.
    pub error_rate: f64,
    /// Latencies are drawn uniformly from this range.
    pub latency: (Duration, Duration),
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            calls: 100,
            color: None,
            error_rate: 0.0,
            latency: (Duration::from_millis(1), Duration::from_millis(20)),
        }
    }
}

/// Outcome of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub calls: usize,
    pub failed_picks: usize,
    /// Selections per address.
    pub distribution: BTreeMap<String, usize>,
    /// First selections in order, to show interleaving.
    pub sequence: Vec<String>,
    pub backends: Vec<BackendStats>,
}

const SEQUENCE_HEAD: usize = 20;

pub fn run<C, R>(picker: &WrrPicker<C>, options: &SimulationOptions, rng: &mut R) -> SimulationReport
where
    C: Clone + Send + Sync,
    R: Rng,
{
    let ctx = match &options.color {
        Some(color) => CallContext::with_color(color.clone()),
        None => CallContext::new(),
    };
    let error_rate = if options.error_rate.is_nan() {
        0.0
    } else {
        options.error_rate.clamp(0.0, 1.0)
    };
    let (low, high) = options.latency;

    let mut distribution = BTreeMap::new();
    let mut sequence = Vec::with_capacity(SEQUENCE_HEAD.min(options.calls));
    let mut failed_picks = 0;

    for _ in 0..options.calls {
        let result = match picker.pick(&ctx) {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(error = %e, "Simulated pick failed");
                failed_picks += 1;
                continue;
            }
        };

        let address = result.done.backend().address().to_string();
        if sequence.len() < SEQUENCE_HEAD {
            sequence.push(address.clone());
        }
        *distribution.entry(address).or_insert(0) += 1;

        let latency = if high > low {
            rng.gen_range(low..=high)
        } else {
            low
        };
        let info = if rng.gen_bool(error_rate) {
            DoneInfo::failed(CallError::new(Code::Unavailable, "injected failure"))
        } else {
            DoneInfo::ok()
        };
        result.done.record(info.is_backend_error(), latency);
    }

    SimulationReport {
        calls: options.calls,
        failed_picks,
        distribution,
        sequence,
        backends: picker.stats(),
    }
}
