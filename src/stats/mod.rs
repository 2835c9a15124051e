//! Broadcast and viewer statistics

pub mod metrics;

pub use metrics::{BroadcastCounters, BroadcastStats, ViewerCounters, ViewerStats};
