//! Viewer session
//!
//! Watches one stream at a time. Each watch owns a subscription task, a
//! render task, a fresh buffer and a presence tracker; switching streams
//! tears all four down before the next set starts. A generation counter
//! shared with the tasks makes sure nothing from a torn-down watch reaches
//! the display or the connection state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::backend::RealtimeBackend;
use crate::config::RelayConfig;
use crate::model::{Frame, StreamId, UserId};
use crate::presence::PresenceTracker;
use crate::stats::{ViewerCounters, ViewerStats};

use super::buffer::FrameBuffer;
use super::renderer::RenderLoop;
use super::state::{ConnectionState, StateTracker};
use super::subscriber::FrameSubscriber;

/// Tasks belonging to the stream currently being watched
struct ActiveWatch {
    stream_id: StreamId,
    subscriber: JoinHandle<()>,
    renderer: JoinHandle<()>,
    presence: PresenceTracker,
}

/// A viewer's live display
pub struct ViewerSession {
    backend: Arc<dyn RealtimeBackend>,
    viewer_id: UserId,
    config: RelayConfig,
    display: Arc<watch::Sender<Option<Frame>>>,
    state: Arc<watch::Sender<ConnectionState>>,
    generation: Arc<AtomicU64>,
    counters: Arc<ViewerCounters>,
    active: Option<ActiveWatch>,
}

impl ViewerSession {
    pub fn new(backend: Arc<dyn RealtimeBackend>, viewer_id: UserId, config: RelayConfig) -> Self {
        let (display, _) = watch::channel(None);
        let (state, _) = watch::channel(ConnectionState::Idle);

        Self {
            backend,
            viewer_id,
            config,
            display: Arc::new(display),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
            counters: Arc::new(ViewerCounters::new()),
            active: None,
        }
    }

    /// Start watching `stream_id`, replacing any current watch
    pub async fn watch(&mut self, stream_id: StreamId) {
        self.teardown().await;

        let owner = self.generation.load(Ordering::Acquire);
        let buffer = Arc::new(Mutex::new(FrameBuffer::new(self.config.buffer_capacity)));
        let tracker = StateTracker::new(Arc::clone(&self.state), Arc::clone(&self.generation), owner);

        let subscriber = FrameSubscriber::new(
            Arc::clone(&self.backend),
            stream_id,
            Arc::clone(&buffer),
            tracker,
            Arc::clone(&self.counters),
        );
        let renderer = RenderLoop::new(
            buffer,
            Arc::clone(&self.display),
            Arc::clone(&self.generation),
            owner,
            Arc::clone(&self.counters),
        );
        let presence = PresenceTracker::spawn(
            Arc::clone(&self.backend),
            stream_id,
            self.viewer_id,
            self.config.heartbeat_interval,
        );

        self.active = Some(ActiveWatch {
            stream_id,
            subscriber: tokio::spawn(subscriber.run()),
            renderer: renderer.spawn(self.config.render_interval),
            presence,
        });

        tracing::info!(stream = %stream_id, viewer = %self.viewer_id, "Watching stream");
    }

    /// Start a new subscription to the current stream
    ///
    /// A failed subscription never recovers on its own; this is the way
    /// back from `ConnectionState::Error`.
    pub async fn reconnect(&mut self) -> bool {
        match self.stream_id() {
            Some(stream_id) => {
                self.watch(stream_id).await;
                true
            }
            None => false,
        }
    }

    /// Stop watching
    pub async fn stop(&mut self) {
        self.teardown().await;
        self.state.send_replace(ConnectionState::Idle);
    }

    /// Stream currently being watched
    pub fn stream_id(&self) -> Option<StreamId> {
        self.active.as_ref().map(|a| a.stream_id)
    }

    /// Frame currently on screen
    pub fn current_frame(&self) -> Option<Frame> {
        self.display.borrow().clone()
    }

    /// Watch the displayed frame
    pub fn display(&self) -> watch::Receiver<Option<Frame>> {
        self.display.subscribe()
    }

    /// Watch the connection state
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    /// Statistics across every watch of this session
    pub fn stats(&self) -> ViewerStats {
        self.counters.snapshot()
    }

    /// Heartbeats sent for the current watch
    pub fn heartbeats(&self) -> u64 {
        self.active.as_ref().map_or(0, |a| a.presence.heartbeats())
    }

    async fn teardown(&mut self) {
        // Bump first: anything the old tasks do from here on is ignored
        self.generation.fetch_add(1, Ordering::AcqRel);

        if let Some(active) = self.active.take() {
            active.subscriber.abort();
            active.renderer.abort();
            active.presence.leave().await;
            tracing::debug!(stream = %active.stream_id, "Stopped watching stream");
        }

        self.display.send_replace(None);
        self.state.send_replace(ConnectionState::Connecting);
    }
}

impl Drop for ViewerSession {
    fn drop(&mut self) {
        self.generation.fetch_add(1, Ordering::AcqRel);

        let Some(active) = self.active.take() else {
            return;
        };
        active.subscriber.abort();
        active.renderer.abort();

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(active.presence.leave());
        }
    }
}
