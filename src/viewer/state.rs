//! Viewer connection state
//!
//! ```text
//! Idle ──► Connecting ──► Connected
//!              │              │
//!              └──► Error ◄───┘
//! ```
//!
//! `Error` is terminal for a subscription. Recovery means starting a new
//! one (see `ViewerSession::reconnect`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// Connection state of a viewer subscription
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Not watching any stream
    #[default]
    Idle,
    /// Fetching the latest frame and opening the subscription
    Connecting,
    /// Receiving frames
    Connected,
    /// Subscription failed or closed
    Error(String),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ConnectionState::Error(_))
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

/// Writes state for one subscription generation
///
/// Updates are ignored once the session has moved to a newer generation,
/// so a torn-down subscription can never overwrite the state of its
/// replacement.
#[derive(Debug, Clone)]
pub struct StateTracker {
    tx: Arc<watch::Sender<ConnectionState>>,
    generation: Arc<AtomicU64>,
    owner: u64,
}

impl StateTracker {
    pub fn new(
        tx: Arc<watch::Sender<ConnectionState>>,
        generation: Arc<AtomicU64>,
        owner: u64,
    ) -> Self {
        Self {
            tx,
            generation,
            owner,
        }
    }

    fn is_current(&self) -> bool {
        self.generation.load(Ordering::Acquire) == self.owner
    }

    pub fn connecting(&self) {
        self.set(|state| {
            *state = ConnectionState::Connecting;
            true
        });
    }

    /// Mark connected; a subscription in `Error` stays there
    pub fn connected(&self) {
        self.set(|state| match state {
            ConnectionState::Error(_) | ConnectionState::Connected => false,
            _ => {
                *state = ConnectionState::Connected;
                true
            }
        });
    }

    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.set(|state| {
            *state = ConnectionState::Error(reason);
            true
        });
    }

    /// Current state
    pub fn get(&self) -> ConnectionState {
        self.tx.borrow().clone()
    }

    fn set(&self, apply: impl FnOnce(&mut ConnectionState) -> bool) {
        self.tx.send_if_modified(|state| self.is_current() && apply(state));
    }
}
