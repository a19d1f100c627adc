//! Lifecycle management for the `watch` command.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     broadcast → config reload loop and stats reporter exit
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
