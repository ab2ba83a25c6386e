// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

pub mod fixtures;

use secnum::{HostDom, MemoryDom, NodeId};
use std::time::Duration;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// Visible text of every node, in order.
pub fn texts(dom: &MemoryDom, nodes: &[NodeId]) -> Vec<String> {
    nodes.iter().map(|n| dom.text_content(n)).collect()
}
