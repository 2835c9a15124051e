//! Broadcast session
//!
//! Owns everything a live broadcast holds: the camera (inside the sampler
//! task), the stream row, and the publishing loop. `stop`, drop, and a lost
//! camera all release the device and deactivate the row; a lost camera
//! does so from inside the task before reporting `CaptureLost`.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::capture::{open_with_fallback, CaptureConstraints, CaptureDevice};
use crate::config::MIN_INTERVAL;
use crate::config::RelayConfig;
use crate::directory::{Caller, StreamDirectory};
use crate::error::{Error, Result};
use crate::model::{Stream, StreamId, StreamStart};
use crate::stats::{BroadcastCounters, BroadcastStats};

use super::encoder::encode_jpeg;
use super::publisher::{BroadcastEvent, FramePublisher};
use super::sampler::FrameSampler;

/// A running broadcast
pub struct BroadcastSession {
    directory: Arc<StreamDirectory>,
    caller: Caller,
    stream: Stream,
    counters: Arc<BroadcastCounters>,
    events: mpsc::Sender<BroadcastEvent>,
    task: Option<JoinHandle<()>>,
}

impl BroadcastSession {
    /// Open the camera, create the stream row and start publishing
    ///
    /// The camera is opened first: if the device is refused or missing,
    /// no row is created. Returns the session and a receiver for its
    /// events.
    pub async fn start(
        directory: Arc<StreamDirectory>,
        device: &dyn CaptureDevice,
        caller: Caller,
        start: StreamStart,
        config: &RelayConfig,
    ) -> Result<(Self, mpsc::Receiver<BroadcastEvent>)> {
        if !caller.is_admin {
            return Err(Error::PermissionDenied("Only admins can start streams".into()));
        }

        let constraints = CaptureConstraints::for_quality(start.stream_quality);
        let source = open_with_fallback(device, &constraints).map_err(|e| {
            tracing::warn!(device = device.name(), error = %e, "Camera open failed");
            e
        })?;
        let (width, height) = source.resolution();

        // On failure the source drops here and the camera is released
        let stream = directory.start_stream(&caller, &start).await?;

        let counters = Arc::new(BroadcastCounters::new());
        let sampler = FrameSampler::new(source, config.jpeg_quality, Arc::clone(&counters));
        let publisher = FramePublisher::new(
            Arc::clone(directory.backend()),
            stream.id,
            Arc::clone(&counters),
        );

        let (tx, rx) = mpsc::channel(256);
        let task = tokio::spawn(run_sampler(
            sampler,
            publisher,
            Arc::clone(&directory),
            caller,
            config.sample_interval,
            tx.clone(),
        ));

        tracing::info!(
            stream = %stream.id,
            device = device.name(),
            width = width,
            height = height,
            quality = %stream.stream_quality,
            "Broadcast started"
        );
        let _ = tx.try_send(BroadcastEvent::Publishing(stream.id));

        Ok((
            Self {
                directory,
                caller,
                stream,
                counters,
                events: tx,
                task: Some(task),
            },
            rx,
        ))
    }

    /// Stream row as created
    pub fn stream(&self) -> &Stream {
        &self.stream
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream.id
    }

    /// Whether the sampler loop is still running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Current statistics
    pub fn stats(&self) -> BroadcastStats {
        self.counters.snapshot()
    }

    /// Stop sampling, release the camera and deactivate the row
    ///
    /// Idempotent: a second call only re-issues the deactivation.
    pub async fn stop(&mut self) -> Result<Stream> {
        if let Some(task) = self.task.take() {
            task.abort();
            // Wait for the task to unwind so the camera is released on return
            let _ = task.await;
        }

        let stream = self
            .directory
            .stop_stream(&self.caller, self.stream.id)
            .await?;
        self.stream = stream.clone();

        let stats = self.counters.snapshot();
        tracing::info!(
            stream = %stream.id,
            published = stats.frames_published,
            failed = stats.frames_failed,
            "Broadcast stopped"
        );
        let _ = self.events.try_send(BroadcastEvent::Stopped(stream.id));

        Ok(stream)
    }
}

impl Drop for BroadcastSession {
    fn drop(&mut self) {
        let Some(task) = self.task.take() else {
            return;
        };
        task.abort();

        // Best effort: deactivate the row if a runtime is still around
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let directory = Arc::clone(&self.directory);
            let caller = self.caller;
            let stream_id = self.stream.id;
            handle.spawn(async move {
                if let Err(e) = directory.stop_stream(&caller, stream_id).await {
                    tracing::warn!(stream = %stream_id, error = %e, "Deactivation on drop failed");
                }
            });
        } else {
            tracing::warn!(stream = %self.stream.id, "Broadcast dropped outside a runtime, row left active");
        }
    }
}

/// Sample at a fixed cadence and publish each frame once
///
/// Missed ticks are skipped rather than bursted, so a slow insert never
/// causes a catch-up flood. JPEG encoding runs on the blocking pool.
async fn run_sampler(
    mut sampler: FrameSampler,
    publisher: FramePublisher,
    directory: Arc<StreamDirectory>,
    caller: Caller,
    interval: std::time::Duration,
    events: mpsc::Sender<BroadcastEvent>,
) {
    let stream_id = publisher.stream_id();
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let lost = loop {
        ticker.tick().await;

        let raw = match sampler.capture() {
            Ok(Some(raw)) => raw,
            Ok(None) => continue,
            Err(e) if e.is_transient() => {
                tracing::warn!(stream = %stream_id, error = %e, "Frame sample failed");
                continue;
            }
            Err(e) => break e,
        };

        let (width, height) = (raw.width, raw.height);
        let quality = sampler.quality();
        match tokio::task::spawn_blocking(move || encode_jpeg(&raw, quality)).await {
            Ok(Ok(payload)) => {
                let frame = sampler.commit(width, height, payload);
                publisher.publish(frame.sequence, frame.payload).await;
            }
            Ok(Err(e)) => {
                tracing::warn!(stream = %stream_id, error = %e, "Frame encode failed");
            }
            Err(e) => {
                tracing::warn!(stream = %stream_id, error = %e, "Encode task failed");
            }
        }
    };

    tracing::error!(stream = %stream_id, error = %lost, "Capture lost");
    sampler.stop();

    if let Err(e) = directory.stop_stream(&caller, stream_id).await {
        tracing::warn!(stream = %stream_id, error = %e, "Deactivation after capture loss failed");
    }
    let _ = events.try_send(BroadcastEvent::CaptureLost(lost.user_message()));
}
