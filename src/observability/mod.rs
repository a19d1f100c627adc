//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! load_balancer produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (pick counters, per-backend window gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metrics go through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Window summaries are pushed on the stats cadence, not per call

pub mod logging;
pub mod metrics;
