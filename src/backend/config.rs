//! In-memory service configuration

use std::time::Duration;

use crate::config::MIN_INTERVAL;

/// Configuration for [`MemoryBackend`](super::MemoryBackend)
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Frames kept per stream before the oldest are pruned
    pub frame_retention: usize,

    /// Capacity of each live broadcast channel
    pub broadcast_capacity: usize,

    /// Presence rows older than this stop counting as viewers
    pub presence_expiry: Duration,

    /// How often the presence sweep recounts viewers
    pub sweep_interval: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            frame_retention: 50,
            broadcast_capacity: 64,
            // Three missed 15s heartbeats
            presence_expiry: Duration::from_secs(45),
            sweep_interval: Duration::from_secs(15),
        }
    }
}

impl BackendConfig {
    /// Set frame retention (at least 1)
    pub fn frame_retention(mut self, frames: usize) -> Self {
        self.frame_retention = frames.max(1);
        self
    }

    /// Set broadcast channel capacity (at least 1)
    pub fn broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity.max(1);
        self
    }

    /// Set the presence expiry window
    pub fn presence_expiry(mut self, expiry: Duration) -> Self {
        self.presence_expiry = expiry;
        self
    }

    /// Set the sweep interval (at least [`MIN_INTERVAL`])
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval.max(MIN_INTERVAL);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BackendConfig::default();

        assert_eq!(config.frame_retention, 50);
        assert_eq!(config.broadcast_capacity, 64);
        assert_eq!(config.presence_expiry, Duration::from_secs(45));
        assert_eq!(config.sweep_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_builder_clamps_zero() {
        let config = BackendConfig::default()
            .frame_retention(0)
            .broadcast_capacity(0)
            .sweep_interval(Duration::ZERO);

        assert_eq!(config.frame_retention, 1);
        assert_eq!(config.broadcast_capacity, 1);
        assert_eq!(config.sweep_interval, MIN_INTERVAL);
    }
}
