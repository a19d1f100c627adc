//! Client-side RPC load balancing.
//!
//! Smooth weighted round-robin over ready connections, with color-based
//! traffic steering and rolling per-backend error and latency windows.

pub mod config;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod simulation;
pub mod stat;

pub use config::BalancerConfig;
pub use lifecycle::Shutdown;
pub use load_balancer::{
    Balancer, CallContext, DefaultColor, DoneInfo, PickError, Picker, PickerBuilder, WrrPicker,
    WrrPickerBuilder,
};
