//! Pipeline timing and sizing

use std::time::Duration;

/// Lowest JPEG quality accepted by the sampler
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Highest JPEG quality accepted by the sampler
pub const MAX_JPEG_QUALITY: u8 = 100;

/// Shortest timer period accepted for any pipeline cadence
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration shared by broadcasters and viewers
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// How often the broadcaster samples the camera
    pub sample_interval: Duration,

    /// JPEG quality factor for published frames
    pub jpeg_quality: u8,

    /// Frames a viewer buffers before evicting the oldest
    pub buffer_capacity: usize,

    /// How often a viewer renders one buffered frame
    pub render_interval: Duration,

    /// How often a viewer refreshes its presence row
    pub heartbeat_interval: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(200), // 5 fps
            jpeg_quality: 70,
            buffer_capacity: 10,
            render_interval: Duration::from_millis(33), // ~30 fps
            heartbeat_interval: Duration::from_secs(15),
        }
    }
}

impl RelayConfig {
    /// Set the sampling interval (at least [`MIN_INTERVAL`])
    pub fn sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Set JPEG quality
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY);
        self
    }

    /// Set buffer capacity (at least one frame)
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity.max(1);
        self
    }

    /// Set the render interval (at least [`MIN_INTERVAL`])
    pub fn render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Set the presence heartbeat interval (at least [`MIN_INTERVAL`])
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval.max(MIN_INTERVAL);
        self
    }

    /// Latency added by a full buffer drained at the render cadence
    pub fn max_buffer_latency(&self) -> Duration {
        self.render_interval * self.buffer_capacity as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RelayConfig::default();

        assert_eq!(config.sample_interval, Duration::from_millis(200));
        assert_eq!(config.jpeg_quality, 70);
        assert_eq!(config.buffer_capacity, 10);
        assert_eq!(config.render_interval, Duration::from_millis(33));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_builder_jpeg_quality_clamped() {
        assert_eq!(RelayConfig::default().jpeg_quality(0).jpeg_quality, 1);
        assert_eq!(RelayConfig::default().jpeg_quality(255).jpeg_quality, 100);
        assert_eq!(RelayConfig::default().jpeg_quality(85).jpeg_quality, 85);
    }

    #[test]
    fn test_builder_buffer_capacity_min() {
        let config = RelayConfig::default().buffer_capacity(0);

        assert_eq!(config.buffer_capacity, 1);
    }

    #[test]
    fn test_builder_zero_intervals_clamped() {
        let config = RelayConfig::default()
            .sample_interval(Duration::ZERO)
            .render_interval(Duration::ZERO)
            .heartbeat_interval(Duration::ZERO);

        assert_eq!(config.sample_interval, MIN_INTERVAL);
        assert_eq!(config.render_interval, MIN_INTERVAL);
        assert_eq!(config.heartbeat_interval, MIN_INTERVAL);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RelayConfig::default()
            .sample_interval(Duration::from_millis(100))
            .render_interval(Duration::from_millis(20))
            .heartbeat_interval(Duration::from_secs(5))
            .buffer_capacity(4);

        assert_eq!(config.sample_interval, Duration::from_millis(100));
        assert_eq!(config.render_interval, Duration::from_millis(20));
        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.buffer_capacity, 4);
    }

    #[test]
    fn test_max_buffer_latency() {
        let config = RelayConfig::default();

        assert_eq!(config.max_buffer_latency(), Duration::from_millis(330));
    }
}
