//! Connection metadata and per-call context.
//!
//! # Responsibilities
//! - Describe a ready connection as handed over by the RPC runtime
//! - Carry call-scoped metadata (the routing color) into `pick`

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Metadata key holding the routing color of a call.
pub const COLOR_KEY: &str = "color";

/// Balancing metadata attached to a resolved address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metadata {
    /// Relative weight. Values <= 0 fall back to the builder default.
    pub weight: i64,
    /// Color tag; empty means the default group.
    pub color: String,
}

impl Metadata {
    pub fn new(weight: i64, color: impl Into<String>) -> Self {
        Self {
            weight,
            color: color.into(),
        }
    }
}

/// A resolved backend address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub addr: String,
    /// `None` when the resolver supplied no balancing metadata.
    pub metadata: Option<Metadata>,
}

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A connection the runtime reports as ready, together with its address.
#[derive(Debug, Clone)]
pub struct ReadyConn<C> {
    pub conn: C,
    pub address: Address,
}

impl<C> ReadyConn<C> {
    pub fn new(conn: C, address: Address) -> Self {
        Self { conn, address }
    }
}

/// Call-scoped metadata propagated from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    metadata: HashMap<String, String>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying an explicit routing color.
    pub fn with_color(color: impl Into<String>) -> Self {
        let mut ctx = Self::new();
        ctx.insert(COLOR_KEY, color);
        ctx
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Routing color of the call, ignoring empty values.
    pub fn color(&self) -> Option<&str> {
        self.get(COLOR_KEY).filter(|c| !c.is_empty())
    }
}

impl FromIterator<(String, String)> for CallContext {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            metadata: iter.into_iter().collect(),
        }
    }
}
