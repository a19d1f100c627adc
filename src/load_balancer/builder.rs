//! Picker construction from the ready-connection set.
//!
//! # Responsibilities
//! - Read weight and color from each connection's metadata
//! - Substitute the default weight for missing or non-positive weights
//! - Partition backends into one group per color plus the default group
//! - Hand the process-wide default color to every picker it builds

use std::collections::HashMap;
use std::sync::Arc;
use arc_swap::ArcSwapOption;
use crate::load_balancer::backend::BackendState;
use crate::load_balancer::group::WeightedGroup;
use crate::load_balancer::metadata::ReadyConn;
use crate::load_balancer::picker::{Picker, WrrPicker};
use crate::load_balancer::weight::AdaptiveWeights;
use crate::observability::metrics;
use crate::stat::RollingOpts;

/// Weight applied when metadata is missing or non-positive.
pub const DEFAULT_WEIGHT: u32 = 10;

/// Builds a fresh picker whenever the ready set changes.
pub trait PickerBuilder<C>: Send + Sync {
    type Picker: Picker<C>;

    fn build(&self, ready: Vec<ReadyConn<C>>) -> Self::Picker;
}

/// Shared, swappable process-wide default color.
///
/// Read on every pick, so updates take effect without rebuilding pickers.
#[derive(Debug, Clone, Default)]
pub struct DefaultColor(Arc<ArcSwapOption<String>>);

impl DefaultColor {
    /// `None` or an empty string means no default color.
    pub fn new(color: Option<String>) -> Self {
        let cell = DefaultColor::default();
        if let Some(color) = color {
            cell.set(color);
        }
        cell
    }

    pub fn set(&self, color: impl Into<String>) {
        let color = color.into();
        if color.is_empty() {
            self.clear();
        } else {
            self.0.store(Some(Arc::new(color)));
        }
    }

    pub fn clear(&self) {
        self.0.store(None);
    }

    pub fn get(&self) -> Option<Arc<String>> {
        self.0.load_full()
    }
}

/// Options applied to every picker a builder produces.
#[derive(Debug, Clone)]
pub struct BuilderOptions {
    pub default_weight: u32,
    /// Shape of each backend's outcome and latency windows.
    pub window: RollingOpts,
    /// Health-driven weights; `None` keeps configured weights.
    pub adaptive: Option<AdaptiveWeights>,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            default_weight: DEFAULT_WEIGHT,
            window: RollingOpts::default(),
            adaptive: None,
        }
    }
}

/// Builds [`WrrPicker`]s.
#[derive(Debug, Clone, Default)]
pub struct WrrPickerBuilder {
    options: BuilderOptions,
    default_color: Option<DefaultColor>,
}

impl WrrPickerBuilder {
    pub fn new(options: BuilderOptions) -> Self {
        Self {
            options,
            default_color: None,
        }
    }

    pub fn with_default_color(mut self, color: DefaultColor) -> Self {
        self.default_color = Some(color);
        self
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    pub fn default_color(&self) -> Option<&DefaultColor> {
        self.default_color.as_ref()
    }

    fn weight_for(&self, addr: &str, weight: Option<i64>) -> u32 {
        let default_weight = self.options.default_weight.max(1);
        match weight {
            Some(w) if w > 0 => u32::try_from(w).unwrap_or(u32::MAX),
            Some(w) => {
                tracing::warn!(address = %addr, weight = w, default_weight, "Non-positive weight, using default");
                default_weight
            }
            None => {
                tracing::warn!(address = %addr, default_weight, "Missing balancer metadata, using default weight");
                default_weight
            }
        }
    }
}

impl<C> PickerBuilder<C> for WrrPickerBuilder
where
    C: Clone + Send + Sync,
{
    type Picker = WrrPicker<C>;

    fn build(&self, ready: Vec<ReadyConn<C>>) -> WrrPicker<C> {
        let total = ready.len();
        let mut members: HashMap<String, Vec<Arc<BackendState<C>>>> = HashMap::new();
        members.entry(String::new()).or_default();

        // 1. Group backends by color, keeping input order
        for ReadyConn { conn, address } in ready {
            let (weight, color) = match address.metadata {
                Some(md) => (Some(md.weight), md.color),
                None => (None, String::new()),
            };
            let weight = self.weight_for(&address.addr, weight);
            let backend = BackendState::new(conn, address.addr, weight, color.clone(), self.options.window);
            members.entry(color).or_default().push(Arc::new(backend));
        }

        // 2. One smooth WRR group per color
        let mut groups = HashMap::with_capacity(members.len());
        for (color, backends) in members {
            metrics::record_group_size(&color, backends.len());
            let mut group = WeightedGroup::new(color.clone(), backends);
            if let Some(adaptive) = &self.options.adaptive {
                group = group.with_adaptive(adaptive.clone());
            }
            groups.insert(color, group);
        }

        tracing::info!(
            backends = total,
            groups = groups.len(),
            window_ms = self.options.window.span().as_millis() as u64,
            "Picker built"
        );
        WrrPicker::new(groups, self.default_color.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::metadata::{Address, CallContext, Metadata};

    fn ready(addr: &'static str, weight: i64, color: &str) -> ReadyConn<&'static str> {
        ReadyConn::new(addr, Address::new(addr).with_metadata(Metadata::new(weight, color)))
    }

    #[test]
    fn test_partition_by_color() {
        let picker = WrrPickerBuilder::default().build(vec![
            ready("test1", 8, ""),
            ready("test2", 4, "red"),
            ready("test3", 2, "red"),
            ready("test4", 2, "purple"),
        ]);
        assert_eq!(picker.backend_count(), 4);
        assert_eq!(picker.group("").unwrap().len(), 1);
        assert_eq!(picker.group("red").unwrap().len(), 2);
        assert_eq!(picker.group("red").unwrap().total_weight(), 6);
        assert_eq!(picker.group("purple").unwrap().len(), 1);
    }

    #[test]
    fn test_default_group_always_present() {
        let picker = WrrPickerBuilder::default().build(vec![ready("a", 1, "red")]);
        assert!(picker.group("").unwrap().is_empty());
        // Unknown color falls back to an empty default group and fails.
        assert!(picker.pick(&CallContext::with_color("blue")).is_err());
        assert_eq!(picker.pick(&CallContext::with_color("red")).unwrap().conn, "a");
    }

    #[test]
    fn test_default_weight_policy() {
        let picker = WrrPickerBuilder::new(BuilderOptions {
            default_weight: 3,
            ..BuilderOptions::default()
        })
        .build(vec![
            ReadyConn::new("bare", Address::new("bare")),
            ready("zero", 0, ""),
            ready("negative", -5, ""),
            ready("heavy", 7, ""),
        ]);
        let weights: Vec<u32> = picker
            .group("")
            .unwrap()
            .members()
            .iter()
            .map(|m| m.weight())
            .collect();
        assert_eq!(weights, vec![3, 3, 3, 7]);
    }

    #[test]
    fn test_oversized_weight_saturates() {
        let picker = WrrPickerBuilder::default().build(vec![ready("big", i64::MAX, "")]);
        assert_eq!(picker.group("").unwrap().members()[0].weight(), u32::MAX);
    }

    #[test]
    fn test_rebuild_restarts_sequence() {
        let builder = WrrPickerBuilder::default();
        let set = || vec![ready("A", 4, ""), ready("B", 2, "")];

        let first = builder.build(set());
        let ctx = CallContext::new();
        assert_eq!(first.pick(&ctx).unwrap().conn, "A");
        assert_eq!(first.pick(&ctx).unwrap().conn, "B");

        let second = builder.build(set());
        let seq: Vec<_> = (0..6).map(|_| second.pick(&ctx).unwrap().conn).collect();
        assert_eq!(seq, vec!["A", "B", "A", "A", "B", "A"]);
    }

    #[test]
    fn test_default_color_cell() {
        let color = DefaultColor::new(Some("red".into()));
        assert_eq!(color.get().as_deref().map(String::as_str), Some("red"));
        color.set("");
        assert!(color.get().is_none());
        assert!(DefaultColor::new(Some(String::new())).get().is_none());
    }
}
