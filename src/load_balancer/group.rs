//! Smooth weighted round-robin over the members of one color.
//!
//! Each `next` adds every member's weight to its running value, picks the
//! largest (lowest index on ties) and subtracts the total weight from it.
//! Weights `{4, 2}` yield `A, B, A, A, B, A` and then repeat.

use std::sync::Arc;
use std::time::Instant;
use parking_lot::Mutex;
use crate::load_balancer::backend::BackendState;
use crate::load_balancer::weight::AdaptiveWeights;

#[derive(Debug)]
struct WrrState {
    weights: Vec<i64>,
    current: Vec<i64>,
    total: i64,
    adjusted_at: Instant,
}

/// Backends sharing one color tag.
#[derive(Debug)]
pub struct WeightedGroup<C> {
    color: String,
    members: Vec<Arc<BackendState<C>>>,
    state: Mutex<WrrState>,
    adaptive: Option<AdaptiveWeights>,
}

impl<C> WeightedGroup<C> {
    /// Create a group. Member order fixes the selection sequence.
    pub fn new(color: impl Into<String>, members: Vec<Arc<BackendState<C>>>) -> Self {
        let weights: Vec<i64> = members.iter().map(|m| i64::from(m.weight())).collect();
        let total = weights.iter().sum();
        Self {
            color: color.into(),
            state: Mutex::new(WrrState {
                current: vec![0; weights.len()],
                weights,
                total,
                adjusted_at: Instant::now(),
            }),
            members,
            adaptive: None,
        }
    }

    /// Recompute effective weights from member health at most once per
    /// `adaptive.update_interval`.
    pub fn with_adaptive(mut self, adaptive: AdaptiveWeights) -> Self {
        self.adaptive = Some(adaptive);
        self
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn members(&self) -> &[Arc<BackendState<C>>] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum of the weights currently used for selection.
    pub fn total_weight(&self) -> i64 {
        self.state.lock().total
    }

    /// Select the next member, `None` for an empty group.
    pub fn next(&self) -> Option<Arc<BackendState<C>>> {
        match self.members.len() {
            0 => return None,
            1 => return Some(self.members[0].clone()),
            _ => {}
        }

        let mut state = self.state.lock();
        if let Some(adaptive) = &self.adaptive {
            let now = Instant::now();
            if now.saturating_duration_since(state.adjusted_at) >= adaptive.update_interval {
                self.refresh_weights(&mut state, adaptive, now);
            }
        }

        let WrrState {
            weights,
            current,
            total,
            ..
        } = &mut *state;

        let mut best = 0;
        for i in 0..current.len() {
            current[i] += weights[i];
            if current[i] > current[best] {
                best = i;
            }
        }
        current[best] -= *total;

        Some(self.members[best].clone())
    }

    fn refresh_weights(&self, state: &mut WrrState, adaptive: &AdaptiveWeights, now: Instant) {
        let weights: Vec<i64> = self
            .members
            .iter()
            .map(|m| adaptive.weight_for(&m.health()))
            .collect();
        if weights != state.weights {
            tracing::debug!(color = %self.color, ?weights, "Effective weights updated");
        }
        state.total = weights.iter().sum();
        state.weights = weights;
        state.adjusted_at = now;
    }
}
