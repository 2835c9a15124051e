//! Viewer side of the relay
//!
//! ```text
//! frame log ──► FrameSubscriber ──► FrameBuffer ──► RenderLoop ──► display
//!   (latest + live rows)            (10 frames)     (every 33ms)
//! ```
//!
//! A [`ViewerSession`] runs one of these pipelines per watched stream,
//! alongside a presence heartbeat.

pub mod buffer;
pub mod renderer;
pub mod session;
pub mod state;
pub mod subscriber;

pub use buffer::{FrameBuffer, PushOutcome};
pub use renderer::RenderLoop;
pub use session::ViewerSession;
pub use state::{ConnectionState, StateTracker};
pub use subscriber::FrameSubscriber;
