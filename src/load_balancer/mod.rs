//! Client-side load balancing for outgoing RPC calls.
//!
//! # Data Flow
//! ```text
//! Ready set changes (runtime)
//!     → builder.rs (partition by color, default weights)
//!     → picker.rs  (new immutable WrrPicker)
//!     → switch.rs  (atomic swap of the active picker)
//!
//! Per call:
//!     picker.rs resolve color (call metadata → default color → "")
//!     → group lookup, fallback to the default group
//!     → group.rs (smooth weighted round-robin)
//!     → (connection, completion handle)
//!
//! Call finished:
//!     completion handle → backend.rs (rolling error/latency windows)
//! ```
//!
//! # Design Decisions
//! - Pickers are never mutated after build; membership changes rebuild
//! - One lock per group guards the WRR accumulators
//! - Rolling statistics are for telemetry unless an adjuster is configured
//! - Malformed weights are defaulted, never rejected

pub mod backend;
pub mod builder;
pub mod error;
pub mod group;
pub mod metadata;
pub mod picker;
pub mod status;
pub mod switch;
pub mod weight;

pub use backend::{BackendHealth, BackendState, BackendStats};
pub use builder::{BuilderOptions, DefaultColor, PickerBuilder, WrrPickerBuilder, DEFAULT_WEIGHT};
pub use error::PickError;
pub use group::WeightedGroup;
pub use metadata::{Address, CallContext, Metadata, ReadyConn, COLOR_KEY};
pub use picker::{Done, PickResult, Picker, WrrPicker};
pub use status::{CallError, Code, DoneInfo};
pub use switch::Balancer;
pub use weight::{AdaptiveWeights, HealthScaled, WeightAdjuster};
