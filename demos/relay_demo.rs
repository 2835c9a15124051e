//! End-to-end relay demo
//!
//! Run with: cargo run --example relay_demo [SECONDS]
//!
//! Starts an in-memory realtime service, broadcasts a synthetic camera as
//! "Test Feed", and watches it from a viewer for the given number of
//! seconds (default 5), printing statistics once a second.
//!
//! Set `RUST_LOG=dronex_relay=debug` to see per-stream lifecycle logs.

use std::sync::Arc;
use std::time::Duration;

use dronex_relay::backend::MemoryBackend;
use dronex_relay::broadcast::{BroadcastEvent, BroadcastSession};
use dronex_relay::capture::TestPatternDevice;
use dronex_relay::config::RelayConfig;
use dronex_relay::directory::{Caller, StreamDirectory};
use dronex_relay::model::{EmergencyLevel, StreamQuality, StreamStart, UserId};
use dronex_relay::viewer::ViewerSession;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let seconds: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 5,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dronex_relay=info".parse()?),
        )
        .init();

    let backend = Arc::new(MemoryBackend::new());
    let sweep = backend.spawn_presence_sweep();
    let directory = Arc::new(StreamDirectory::new(backend.clone()));
    let sync = directory.spawn_sync().await?;
    let config = RelayConfig::default();

    let device = TestPatternDevice::new(640, 480).with_warmup(Duration::from_millis(300));
    let start = StreamStart::new("Test Feed", "Demo Depot")
        .quality(StreamQuality::Sd)
        .emergency_level(EmergencyLevel::High)
        .coordinates(16.98, 82.24);

    let (mut broadcast, mut events) = BroadcastSession::start(
        Arc::clone(&directory),
        &device,
        Caller::admin(UserId::new()),
        start,
        &config,
    )
    .await
    .map_err(|e| {
        eprintln!("{}", e.user_message());
        e
    })?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                BroadcastEvent::Publishing(id) => println!("Broadcasting stream {}", id),
                BroadcastEvent::CaptureLost(msg) => println!("Capture lost: {}", msg),
                BroadcastEvent::Stopped(id) => println!("Stream {} stopped", id),
            }
        }
    });

    let mut viewer = ViewerSession::new(backend.clone(), UserId::new(), config);
    if let Some(stream) = directory.select(broadcast.stream_id()).await {
        println!("Watching \"{}\" at {}", stream.stream_name, stream.location);
        viewer.watch(stream.id).await;
    }

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.tick().await;
    for _ in 0..seconds {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                println!("\nShutting down...");
                break;
            }
        }

        let sent = broadcast.stats();
        let seen = viewer.stats();
        let frame = viewer.current_frame();
        println!(
            "sent={} failed={} avg={}B | received={} rendered={} dropped={} state={} frame={:?} viewers={}",
            sent.frames_published,
            sent.frames_failed,
            sent.average_frame_size(),
            seen.frames_received,
            seen.frames_rendered,
            seen.frames_dropped(),
            viewer.connection_state(),
            frame.as_ref().map(|f| f.sequence),
            backend
                .stream(broadcast.stream_id())
                .await
                .map_or(0, |s| s.viewer_count),
        );
    }

    viewer.stop().await;
    let stream = broadcast.stop().await?;
    println!(
        "Final: {} frames published at {:.1} fps, stream active={}",
        broadcast.stats().frames_published,
        broadcast.stats().publish_rate(),
        stream.is_active
    );

    sync.abort();
    sweep.abort();
    Ok(())
}
