//! Rows exchanged with the realtime service
//!
//! Three tables back the live stream feature:
//! - the stream directory (`Stream`), one row per broadcast
//! - the frame log (`Frame`), append-only encoded images
//! - viewer presence (`PresenceRecord`), upserted by heartbeats

pub mod frame;
pub mod presence;
pub mod stream;

pub use frame::{Frame, NewFrame, StreamId, UserId, FRAME_MIME};
pub use presence::PresenceRecord;
pub use stream::{
    ConnectionMode, DeviceType, EmergencyLevel, Stream, StreamChange, StreamQuality, StreamStart,
};
