//! Per-call backend selection.
//!
//! # Responsibilities
//! - Resolve the call's color (call metadata, then process default)
//! - Fall back to the default group when the color has no members
//! - Delegate to the group's smooth WRR
//! - Hand out a completion handle that records the call outcome

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use crate::load_balancer::backend::{BackendState, BackendStats};
use crate::load_balancer::builder::DefaultColor;
use crate::load_balancer::error::PickError;
use crate::load_balancer::group::WeightedGroup;
use crate::load_balancer::metadata::CallContext;
use crate::load_balancer::status::DoneInfo;
use crate::observability::metrics;

/// Selects a connection for each outgoing call.
pub trait Picker<C>: Send + Sync {
    fn pick(&self, ctx: &CallContext) -> Result<PickResult<C>, PickError>;
}

/// A picked connection plus the hook to report its completion.
#[derive(Debug)]
pub struct PickResult<C> {
    pub conn: C,
    pub done: Done<C>,
}

/// Completion handle for one picked call.
///
/// Consumed on use, so an outcome is recorded at most once. Dropping it
/// records nothing.
pub struct Done<C> {
    backend: Arc<BackendState<C>>,
    started: Instant,
}

impl<C> Done<C> {
    pub fn new(backend: Arc<BackendState<C>>) -> Self {
        Self {
            backend,
            started: Instant::now(),
        }
    }

    /// Backend the call was routed to.
    pub fn backend(&self) -> &Arc<BackendState<C>> {
        &self.backend
    }

    /// Report completion; latency is measured from the pick.
    pub fn done(self, info: DoneInfo) {
        let elapsed = self.started.elapsed();
        self.record(info.is_backend_error(), elapsed);
    }

    /// Report completion with caller-side classification and timing.
    pub fn record(self, is_error: bool, elapsed: Duration) {
        self.backend.record_outcome(is_error, elapsed);
    }
}

impl<C> fmt::Debug for Done<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done")
            .field("address", &self.backend.address())
            .field("started", &self.started)
            .finish()
    }
}

/// Immutable snapshot of the ready set, partitioned by color.
#[derive(Debug)]
pub struct WrrPicker<C> {
    /// Always contains the default (empty color) group.
    groups: HashMap<String, WeightedGroup<C>>,
    default_color: Option<DefaultColor>,
}

impl<C> WrrPicker<C> {
    pub(crate) fn new(
        mut groups: HashMap<String, WeightedGroup<C>>,
        default_color: Option<DefaultColor>,
    ) -> Self {
        groups
            .entry(String::new())
            .or_insert_with(|| WeightedGroup::new("", Vec::new()));
        Self {
            groups,
            default_color,
        }
    }

    pub fn group(&self, color: &str) -> Option<&WeightedGroup<C>> {
        self.groups.get(color)
    }

    /// Groups sorted by color, default group first.
    pub fn groups(&self) -> Vec<&WeightedGroup<C>> {
        let mut groups: Vec<_> = self.groups.values().collect();
        groups.sort_by(|a, b| a.color().cmp(b.color()));
        groups
    }

    pub fn backend_count(&self) -> usize {
        self.groups.values().map(WeightedGroup::len).sum()
    }

    /// Per-backend telemetry, ordered by color then member position.
    pub fn stats(&self) -> Vec<BackendStats> {
        self.groups()
            .into_iter()
            .flat_map(|g| g.members().iter().map(|m| m.stats()))
            .collect()
    }

    fn select(&self, ctx: &CallContext) -> Result<Arc<BackendState<C>>, PickError> {
        let fallback = self.default_color.as_ref().and_then(DefaultColor::get);
        let color = ctx
            .color()
            .or_else(|| fallback.as_deref().map(String::as_str))
            .unwrap_or("");

        let group = match self.groups.get(color) {
            Some(group) if !group.is_empty() => Some(group),
            _ => {
                if !color.is_empty() {
                    tracing::debug!(color, "No backends for color, using default group");
                }
                self.groups.get("")
            }
        };

        match group.and_then(WeightedGroup::next) {
            Some(backend) => Ok(backend),
            None => {
                metrics::record_pick_failure(color);
                tracing::warn!(color, "No available backend");
                Err(PickError::NoAvailableBackend {
                    color: color.to_string(),
                })
            }
        }
    }
}

impl<C> Picker<C> for WrrPicker<C>
where
    C: Clone + Send + Sync,
{
    fn pick(&self, ctx: &CallContext) -> Result<PickResult<C>, PickError> {
        let backend = self.select(ctx)?;
        backend.mark_picked();
        metrics::record_pick(backend.color(), backend.address());
        Ok(PickResult {
            conn: backend.conn().clone(),
            done: Done::new(backend),
        })
    }
}
