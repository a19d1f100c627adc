//! Shared helpers for integration tests.

use rpc_balancer::load_balancer::{Address, Metadata, ReadyConn};

/// A ready connection whose handle is its address.
pub fn ready(addr: &str, weight: i64, color: &str) -> ReadyConn<String> {
    ReadyConn::new(
        addr.to_string(),
        Address::new(addr).with_metadata(Metadata::new(weight, color)),
    )
}

/// The four-backend layout: one uncolored, two red, one purple.
#[allow(dead_code)]
pub fn colored_set() -> Vec<ReadyConn<String>> {
    vec![
        ready("test1", 8, ""),
        ready("test2", 4, "red"),
        ready("test3", 2, "red"),
        ready("test4", 2, "purple"),
    ]
}
