//! DroneX live frame relay
//!
//! Relays camera frames from a broadcaster to any number of viewers through
//! a realtime service, and serves the emergency assistant route.
//!
//! # Pipeline
//!
//! ```text
//! Broadcaster                    Realtime service                Viewer
//! ───────────                    ────────────────                ──────
//! camera                         stream directory ─────────────► StreamDirectory
//!   │ 200ms                      frame log ────── broadcast ───► FrameSubscriber
//!   ▼                            presence ◄────── heartbeat ──── PresenceTracker
//! FrameSampler ─► FramePublisher ─┘                                 │
//!   (JPEG q70)    (insert once)                                      ▼
//!                                                         FrameBuffer ─► RenderLoop
//!                                                          (10 frames)    (33ms)
//! ```
//!
//! Delivery is at-most-once and ordered by sequence number. Frames are
//! never retried; a viewer that falls behind skips ahead.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use dronex_relay::backend::MemoryBackend;
//! use dronex_relay::broadcast::BroadcastSession;
//! use dronex_relay::capture::TestPatternDevice;
//! use dronex_relay::config::RelayConfig;
//! use dronex_relay::directory::{Caller, StreamDirectory};
//! use dronex_relay::model::{StreamStart, UserId};
//! use dronex_relay::viewer::ViewerSession;
//!
//! # async fn example() -> dronex_relay::Result<()> {
//! let backend = Arc::new(MemoryBackend::new());
//! let directory = Arc::new(StreamDirectory::new(backend.clone()));
//! let config = RelayConfig::default();
//!
//! let device = TestPatternDevice::new(640, 480);
//! let (mut broadcast, _events) = BroadcastSession::start(
//!     directory,
//!     &device,
//!     Caller::admin(UserId::new()),
//!     StreamStart::new("Test Feed", "Depot"),
//!     &config,
//! )
//! .await?;
//!
//! let mut viewer = ViewerSession::new(backend, UserId::new(), config);
//! viewer.watch(broadcast.stream_id()).await;
//!
//! broadcast.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod assistant;
pub mod backend;
pub mod broadcast;
pub mod capture;
pub mod config;
pub mod directory;
pub mod error;
pub mod model;
pub mod presence;
pub mod server;
pub mod stats;
pub mod viewer;

pub use backend::{MemoryBackend, RealtimeBackend};
pub use broadcast::BroadcastSession;
pub use config::{AppConfig, RelayConfig};
pub use directory::{Caller, StreamDirectory};
pub use error::{Error, Result};
pub use server::AssistantServer;
pub use viewer::{ConnectionState, ViewerSession};
