//! Stream directory rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::frame::{StreamId, UserId};

/// Declared capture quality of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamQuality {
    #[serde(rename = "SD")]
    Sd,
    #[serde(rename = "HD")]
    Hd,
    #[serde(rename = "4K")]
    Uhd,
}

impl StreamQuality {
    /// Ideal capture size (width, height) requested from the camera
    pub fn ideal_resolution(&self) -> (u32, u32) {
        match self {
            StreamQuality::Sd => (640, 480),
            StreamQuality::Hd => (1280, 720),
            StreamQuality::Uhd => (1920, 1080),
        }
    }
}

impl Default for StreamQuality {
    fn default() -> Self {
        StreamQuality::Hd
    }
}

impl std::fmt::Display for StreamQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StreamQuality::Sd => "SD",
            StreamQuality::Hd => "HD",
            StreamQuality::Uhd => "4K",
        };
        f.write_str(s)
    }
}

/// Emergency severity tag shown next to a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmergencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for EmergencyLevel {
    fn default() -> Self {
        EmergencyLevel::Medium
    }
}

/// Kind of device the broadcaster streams from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Drone,
    Camera,
    Laptop,
}

impl Default for DeviceType {
    fn default() -> Self {
        DeviceType::Laptop
    }
}

/// How the capture device reaches the broadcaster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionMode {
    Wifi,
    Bluetooth,
}

impl Default for ConnectionMode {
    fn default() -> Self {
        ConnectionMode::Wifi
    }
}

/// Parameters supplied by a broadcaster when starting a stream
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StreamStart {
    pub stream_name: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub stream_quality: StreamQuality,
    pub emergency_level: EmergencyLevel,
    pub description: Option<String>,
    #[serde(default)]
    pub device_type: DeviceType,
    #[serde(default)]
    pub connection_mode: ConnectionMode,
}

impl StreamStart {
    /// Create start parameters with defaults for everything but name and location
    pub fn new(stream_name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            stream_name: stream_name.into(),
            location: location.into(),
            ..Default::default()
        }
    }

    /// Set the quality tier
    pub fn quality(mut self, quality: StreamQuality) -> Self {
        self.stream_quality = quality;
        self
    }

    /// Set the emergency level
    pub fn emergency_level(mut self, level: EmergencyLevel) -> Self {
        self.emergency_level = level;
        self
    }

    /// Set coordinates
    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Set the device type
    pub fn device(mut self, device_type: DeviceType) -> Self {
        self.device_type = device_type;
        self
    }
}

/// A row of the stream directory table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stream {
    pub id: StreamId,
    pub admin_id: UserId,
    pub stream_name: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub stream_quality: StreamQuality,
    pub emergency_level: EmergencyLevel,
    pub description: Option<String>,
    pub device_type: DeviceType,
    pub connection_mode: ConnectionMode,
    /// Derived by the service from presence recency
    pub viewer_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stream {
    /// Build a fresh active row owned by `admin_id`
    pub fn from_start(admin_id: UserId, start: &StreamStart) -> Self {
        let now = Utc::now();
        Self {
            id: StreamId::new(),
            admin_id,
            stream_name: start.stream_name.clone(),
            location: start.location.clone(),
            latitude: start.latitude,
            longitude: start.longitude,
            is_active: true,
            stream_quality: start.stream_quality,
            emergency_level: start.emergency_level,
            description: start.description.clone(),
            device_type: start.device_type,
            connection_mode: start.connection_mode,
            viewer_count: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Change notification from the stream directory table
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChange {
    Inserted(Stream),
    Updated(Stream),
    Deleted(StreamId),
}

impl StreamChange {
    /// Id of the row the change refers to
    pub fn stream_id(&self) -> StreamId {
        match self {
            StreamChange::Inserted(s) | StreamChange::Updated(s) => s.id,
            StreamChange::Deleted(id) => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_wire_names() {
        assert_eq!(serde_json::to_string(&StreamQuality::Uhd).unwrap(), "\"4K\"");
        assert_eq!(
            serde_json::from_str::<StreamQuality>("\"SD\"").unwrap(),
            StreamQuality::Sd
        );
        assert_eq!(StreamQuality::Hd.to_string(), "HD");
    }

    #[test]
    fn test_ideal_resolution() {
        assert_eq!(StreamQuality::Sd.ideal_resolution(), (640, 480));
        assert_eq!(StreamQuality::Hd.ideal_resolution(), (1280, 720));
        assert_eq!(StreamQuality::Uhd.ideal_resolution(), (1920, 1080));
    }

    #[test]
    fn test_start_defaults() {
        let start = StreamStart::new("Test Feed", "Kakinada");

        assert_eq!(start.device_type, DeviceType::Laptop);
        assert_eq!(start.connection_mode, ConnectionMode::Wifi);
        assert_eq!(start.stream_quality, StreamQuality::Hd);
        assert_eq!(start.emergency_level, EmergencyLevel::Medium);
    }

    #[test]
    fn test_from_start_is_active() {
        let admin = UserId::new();
        let start = StreamStart::new("Test Feed", "Kakinada")
            .quality(StreamQuality::Sd)
            .coordinates(16.99, 82.24);
        let stream = Stream::from_start(admin, &start);

        assert!(stream.is_active);
        assert_eq!(stream.admin_id, admin);
        assert_eq!(stream.viewer_count, 0);
        assert_eq!(stream.latitude, Some(16.99));
        assert_eq!(stream.created_at, stream.updated_at);
    }

    #[test]
    fn test_emergency_level_json() {
        let json = serde_json::to_string(&EmergencyLevel::Critical).unwrap();
        assert_eq!(json, "\"critical\"");
    }
}
