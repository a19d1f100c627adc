//! Applying reloaded configuration to a running balancer.
//!
//! # Responsibilities
//! - Rebuild the picker builder when picker options change
//! - Follow `balancer.default_color` unless the color was pinned at startup
//! - Rebuild the picker from the new ready set
//! - Zero metric series for colors and backends that disappeared

use std::collections::HashSet;
use std::sync::Arc;
use crate::config::schema::BalancerConfig;
use crate::load_balancer::{Balancer, DefaultColor, WrrPicker, WrrPickerBuilder};
use crate::observability::metrics;

/// What a reload changed beyond the ready set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// A new builder was installed.
    pub builder_replaced: bool,
    /// `balancer.stats_interval_secs` changed.
    pub stats_interval_changed: bool,
}

/// The config currently applied to a balancer.
pub struct LiveConfig {
    balancer: Arc<Balancer<String>>,
    default_color: DefaultColor,
    /// Set when the default color came from the command line.
    pinned_color: bool,
    current: BalancerConfig,
}

impl LiveConfig {
    /// Build the first picker from `config` and track it.
    ///
    /// The balancer's builder is expected to already reflect `config`'s
    /// picker options. Its default color handle is shared with every
    /// builder installed later.
    pub fn new(balancer: Arc<Balancer<String>>, pinned_color: bool, config: BalancerConfig) -> Self {
        let default_color = balancer.builder().default_color().cloned().unwrap_or_default();
        balancer.update(config.ready_set());
        Self {
            balancer,
            default_color,
            pinned_color,
            current: config,
        }
    }

    pub fn current(&self) -> &BalancerConfig {
        &self.current
    }

    pub fn default_color(&self) -> &DefaultColor {
        &self.default_color
    }

    /// Apply a reloaded config.
    pub fn apply(&mut self, config: BalancerConfig) -> ReloadOutcome {
        let previous = self.balancer.picker();
        self.apply_default_color(&config);

        let builder_replaced = self.current.balancer.builder_options_differ(&config.balancer);
        if builder_replaced {
            tracing::info!(
                default_weight = config.balancer.default_weight,
                window_size = config.balancer.window_size,
                window_bucket_ms = config.balancer.window_bucket_ms,
                adaptive = config.balancer.adaptive.is_some(),
                "Picker options changed, replacing builder"
            );
            let builder = WrrPickerBuilder::new(config.balancer.builder_options())
                .with_default_color(self.default_color.clone());
            self.balancer.reconfigure(builder, config.ready_set());
        } else {
            tracing::info!(backends = config.backends.len(), "Ready set changed, rebuilding picker");
            self.balancer.update(config.ready_set());
        }

        let stale = stale_series(&previous, &self.balancer.picker());
        for color in &stale.colors {
            metrics::retire_group(color);
        }
        for address in &stale.addresses {
            metrics::retire_backend(address);
        }

        if config.observability != self.current.observability {
            tracing::warn!("Observability settings changed; restart to apply them");
        }

        let stats_interval_changed =
            config.balancer.stats_interval_secs != self.current.balancer.stats_interval_secs;
        self.current = config;

        ReloadOutcome {
            builder_replaced,
            stats_interval_changed,
        }
    }

    fn apply_default_color(&self, config: &BalancerConfig) {
        let wanted = config.balancer.default_color.as_deref().unwrap_or("");
        if self.pinned_color {
            if config.balancer.default_color != self.current.balancer.default_color {
                tracing::debug!(color = wanted, "Default color pinned on the command line, ignoring config");
            }
            return;
        }
        if self.default_color.get().as_deref().map(String::as_str).unwrap_or("") != wanted {
            tracing::info!(color = wanted, "Default color changed");
        }
        self.default_color.set(wanted);
    }
}

/// Series exported for `old` with no counterpart in `new`.
#[derive(Debug, Default, PartialEq)]
struct StaleSeries {
    colors: Vec<String>,
    addresses: Vec<String>,
}

fn stale_series(old: &WrrPicker<String>, new: &WrrPicker<String>) -> StaleSeries {
    let live: HashSet<&str> = new
        .groups()
        .into_iter()
        .flat_map(|g| g.members().iter().map(|m| m.address()))
        .collect();

    let mut stale = StaleSeries::default();
    for group in old.groups() {
        if new.group(group.color()).is_none() {
            stale.colors.push(group.color().to_string());
        }
        for member in group.members() {
            if !live.contains(member.address()) {
                stale.addresses.push(member.address().to_string());
            }
        }
    }
    stale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::load_balancer::{CallContext, PickerBuilder};

    const INITIAL: &str = r#"
        [balancer]
        default_weight = 3

        [[backends]]
        address = "x:1"

        [[backends]]
        address = "y:1"
        color = "red"
    "#;

    const RELOADED: &str = r#"
        [balancer]
        default_weight = 7
        default_color = "red"

        [[backends]]
        address = "x:1"

        [[backends]]
        address = "y:1"
        color = "red"
    "#;

    fn start(config: &BalancerConfig, cli_color: Option<String>) -> LiveConfig {
        let pinned = cli_color.is_some();
        let color = DefaultColor::new(cli_color.or_else(|| config.balancer.default_color.clone()));
        let builder = WrrPickerBuilder::new(config.balancer.builder_options()).with_default_color(color);
        LiveConfig::new(Arc::new(Balancer::new(builder)), pinned, config.clone())
    }

    fn pick(live: &LiveConfig) -> String {
        live.balancer.pick(&CallContext::new()).unwrap().conn
    }

    #[test]
    fn test_reload_applies_picker_options_and_default_color() {
        let mut live = start(&parse_config(INITIAL).unwrap(), None);
        assert_eq!(live.balancer.picker().group("").unwrap().total_weight(), 3);
        assert_eq!(pick(&live), "x:1");

        let outcome = live.apply(parse_config(RELOADED).unwrap());
        assert!(outcome.builder_replaced);
        assert!(!outcome.stats_interval_changed);

        let picker = live.balancer.picker();
        assert_eq!(picker.group("").unwrap().total_weight(), 7);
        assert_eq!(picker.group("red").unwrap().total_weight(), 7);
        assert_eq!(pick(&live), "y:1");
        assert_eq!(live.current().balancer.default_weight, 7);
    }

    #[test]
    fn test_removing_default_color_clears_it() {
        let mut live = start(&parse_config(RELOADED).unwrap(), None);
        assert_eq!(pick(&live), "y:1");

        let mut config = parse_config(RELOADED).unwrap();
        config.balancer.default_color = None;
        let outcome = live.apply(config);
        assert!(!outcome.builder_replaced);
        assert!(live.default_color().get().is_none());
        assert_eq!(pick(&live), "x:1");
    }

    #[test]
    fn test_pinned_color_survives_reload() {
        let mut live = start(&parse_config(INITIAL).unwrap(), Some("red".into()));
        assert_eq!(pick(&live), "y:1");

        let mut config = parse_config(RELOADED).unwrap();
        config.balancer.default_color = Some("blue".into());
        live.apply(config);
        assert_eq!(live.default_color().get().as_deref().map(String::as_str), Some("red"));
        assert_eq!(pick(&live), "y:1");
    }

    #[test]
    fn test_backends_only_reload_keeps_builder() {
        let mut live = start(&parse_config(INITIAL).unwrap(), None);
        let mut config = parse_config(INITIAL).unwrap();
        config.backends.truncate(1);
        config.balancer.stats_interval_secs += 1;

        let outcome = live.apply(config);
        assert!(!outcome.builder_replaced);
        assert!(outcome.stats_interval_changed);
        assert_eq!(live.balancer.picker().backend_count(), 1);
        assert!(live.balancer.picker().group("red").is_none());
    }

    #[test]
    fn test_stale_series_lists_removed_colors_and_backends() {
        let before = parse_config(INITIAL).unwrap();
        let mut after = before.clone();
        after.backends.truncate(1);

        let builder = WrrPickerBuilder::default();
        let old: WrrPicker<String> = builder.build(before.ready_set());
        let new: WrrPicker<String> = builder.build(after.ready_set());

        assert_eq!(
            stale_series(&old, &new),
            StaleSeries {
                colors: vec!["red".to_string()],
                addresses: vec!["y:1".to_string()],
            }
        );
        assert_eq!(stale_series(&new, &new), StaleSeries::default());
    }
}
