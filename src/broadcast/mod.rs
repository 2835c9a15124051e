//! Broadcaster side of the relay
//!
//! ```text
//! camera ──► FrameSampler ──► encode_jpeg ──► FramePublisher ──► frame log
//!            (every 200ms)     (quality 70)    (insert once)
//! ```
//!
//! A [`BroadcastSession`] ties these together for one stream row.

pub mod encoder;
pub mod publisher;
pub mod sampler;
pub mod session;

pub use encoder::{encode_jpeg, EncodeError};
pub use publisher::{BroadcastEvent, FramePublisher};
pub use sampler::{FrameSampler, SampledFrame};
pub use session::BroadcastSession;
