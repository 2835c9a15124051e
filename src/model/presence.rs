//! Viewer presence rows

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::frame::{StreamId, UserId};

/// One (stream, viewer) presence row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub stream_id: StreamId,
    #[serde(rename = "user_id")]
    pub viewer_id: UserId,
    pub last_seen: DateTime<Utc>,
}

impl PresenceRecord {
    pub fn new(stream_id: StreamId, viewer_id: UserId) -> Self {
        Self {
            stream_id,
            viewer_id,
            last_seen: Utc::now(),
        }
    }

    /// Whether this row still counts towards the viewer count at `now`
    pub fn is_fresh(&self, now: DateTime<Utc>, expiry: Duration) -> bool {
        match (now - self.last_seen).to_std() {
            Ok(age) => age <= expiry,
            // last_seen in the future (clock skew) counts as fresh
            Err(_) => true,
        }
    }
}
