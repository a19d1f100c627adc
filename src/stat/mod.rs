//! Rolling window statistics.
//!
//! # Data Flow
//! ```text
//! Call completion
//!     → counter.rs (outcome 0/1 summed per bucket)
//!     → gauge.rs   (latency samples kept per bucket)
//!     → window.rs  (lazy bucket rotation, trailing N × D view)
//!
//! Telemetry read
//!     → window.rs rotates stale buckets
//!     → reduce over live buckets (oldest → newest)
//! ```
//!
//! # Design Decisions
//! - No background timer; rotation happens on the next add or read
//! - One lock per statistic, contention stays local to one backend
//! - Every operation has an `*_at(now)` form so callers can drive time

pub mod counter;
pub mod gauge;
pub mod window;

pub use counter::RollingCounter;
pub use gauge::RollingGauge;
pub use window::{Bucket, Buckets, RollingOpts, RollingWindow};
