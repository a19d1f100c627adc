//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BalancerConfig (validated, immutable)
//!     → builder options + ready set for the load balancer
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → reload.rs applies it to the running balancer
//!       (new builder if picker options changed, default color, ready set)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Non-positive backend weights are not rejected here; the picker
//!   builder substitutes the default weight

pub mod loader;
pub mod reload;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use reload::{LiveConfig, ReloadOutcome};
pub use schema::{
    AdaptiveConfig, BackendConfig, BalancerConfig, LogFormat, ObservabilityConfig, PickerConfig,
};
pub use validation::{validate_config, ValidationError};
