//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::load_balancer::{
    AdaptiveWeights, Address, BuilderOptions, HealthScaled, Metadata, ReadyConn, DEFAULT_WEIGHT,
};
use crate::stat::RollingOpts;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BalancerConfig {
    /// Picker settings.
    pub balancer: PickerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Ready backends, in selection order.
    pub backends: Vec<BackendConfig>,
}

impl BalancerConfig {
    /// The backends as a ready set, using each address as its handle.
    pub fn ready_set(&self) -> Vec<ReadyConn<String>> {
        self.backends
            .iter()
            .map(|b| ReadyConn::new(b.address.clone(), b.to_address()))
            .collect()
    }
}

/// Picker configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Color used by calls that carry none.
    pub default_color: Option<String>,

    /// Weight for backends with missing or non-positive weights.
    pub default_weight: u32,

    /// Number of buckets in each rolling window.
    pub window_size: usize,

    /// Duration of one bucket in milliseconds.
    pub window_bucket_ms: u64,

    /// How often `watch` logs and publishes backend stats.
    pub stats_interval_secs: u64,

    /// Health-driven weights. Absent means static weights.
    pub adaptive: Option<AdaptiveConfig>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            default_color: None,
            default_weight: DEFAULT_WEIGHT,
            window_size: 10,
            window_bucket_ms: 100,
            stats_interval_secs: 5,
            adaptive: None,
        }
    }
}

impl PickerConfig {
    pub fn window(&self) -> RollingOpts {
        RollingOpts {
            size: self.window_size,
            bucket_duration: Duration::from_millis(self.window_bucket_ms),
        }
    }

    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            default_weight: self.default_weight,
            window: self.window(),
            adaptive: self.adaptive.as_ref().map(AdaptiveConfig::to_adaptive),
        }
    }

    /// Whether `other` would produce different [`BuilderOptions`].
    pub fn builder_options_differ(&self, other: &PickerConfig) -> bool {
        self.default_weight != other.default_weight
            || self.window_size != other.window_size
            || self.window_bucket_ms != other.window_bucket_ms
            || self.adaptive != other.adaptive
    }
}

/// Settings for [`HealthScaled`] weight adjustment.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    /// Calls needed in window before the error ratio counts.
    pub min_requests: i64,

    /// Latency target in milliseconds; slower backends lose weight.
    pub latency_target_ms: Option<u64>,

    /// Minimum time between weight recomputations in milliseconds.
    pub update_interval_ms: u64,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            min_requests: 20,
            latency_target_ms: None,
            update_interval_ms: 1000,
        }
    }
}

impl AdaptiveConfig {
    pub fn to_adaptive(&self) -> AdaptiveWeights {
        AdaptiveWeights::new(
            Arc::new(HealthScaled {
                min_requests: self.min_requests,
                latency_target: self.latency_target_ms.map(Duration::from_millis),
            }),
            Duration::from_millis(self.update_interval_ms),
        )
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Pretty-printed logs for humans
    #[default]
    Pretty,
    /// JSON logs for machine parsing
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(format!("Invalid log format: {}", s)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One ready backend.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend address (e.g., "10.0.0.1:9000").
    pub address: String,

    /// Weight; missing or non-positive values use the default weight.
    #[serde(default)]
    pub weight: Option<i64>,

    /// Color tag; empty means the default group.
    #[serde(default)]
    pub color: String,
}

impl BackendConfig {
    /// Resolver-style address; no metadata when neither weight nor color is set.
    pub fn to_address(&self) -> Address {
        let address = Address::new(self.address.clone());
        if self.weight.is_none() && self.color.is_empty() {
            return address;
        }
        address.with_metadata(Metadata::new(self.weight.unwrap_or(0), self.color.clone()))
    }
}
