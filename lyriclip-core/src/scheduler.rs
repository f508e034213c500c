//! Fixed-interval loop driving the tracker and delivering emissions.

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clipboard::ClipboardSink;
use crate::playback::LyricEmission;
use crate::source::PlaybackDetector;
use crate::tracker::{PlaybackTracker, TrackerStatus};

/// Cloneable handle used to stop a running [`Scheduler`] from another task
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    cancel_token: CancellationToken,
}

impl SchedulerHandle {
    /// Wrap a token; cancelling it stops the scheduler that shares it
    #[must_use]
    pub const fn new(cancel_token: CancellationToken) -> Self {
        Self { cancel_token }
    }

    /// Ask the scheduler to stop. Safe to call any number of times.
    pub fn stop(&self) {
        if !self.cancel_token.is_cancelled() {
            info!("Stopping scheduler");
        }
        self.cancel_token.cancel();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// Polls the detector, feeds the tracker and routes emitted lines.
///
/// Ticks run strictly one after another: the detector call, tracker update
/// and clipboard write of one tick finish before the next sleep starts.
pub struct Scheduler {
    detector: Box<dyn PlaybackDetector>,
    tracker: PlaybackTracker,
    sink: Box<dyn ClipboardSink>,
    cancel_token: CancellationToken,
    emission_tx: broadcast::Sender<LyricEmission>,
    status_tx: watch::Sender<TrackerStatus>,
}

impl Scheduler {
    /// Create a new scheduler
    ///
    /// # Arguments
    /// * `detector` - Backend polled once per tick
    /// * `tracker` - State machine fed with each sample
    /// * `sink` - Clipboard that receives emitted lines while enabled
    /// * `cancel_token` - Optional external cancellation token for graceful shutdown
    pub fn new(
        detector: Box<dyn PlaybackDetector>,
        tracker: PlaybackTracker,
        sink: Box<dyn ClipboardSink>,
        cancel_token: Option<CancellationToken>,
    ) -> Self {
        let (emission_tx, _) = broadcast::channel(64);
        let (status_tx, _) = watch::channel(TrackerStatus::Idle);

        Self {
            detector,
            tracker,
            sink,
            cancel_token: cancel_token.unwrap_or_default(),
            emission_tx,
            status_tx,
        }
    }

    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle::new(self.cancel_token.clone())
    }

    /// Subscribe to emitted lyric lines
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LyricEmission> {
        self.emission_tx.subscribe()
    }

    /// Watch the tracker status, updated after every tick
    #[must_use]
    pub fn status(&self) -> watch::Receiver<TrackerStatus> {
        self.status_tx.subscribe()
    }

    /// Run the scheduler in a background task
    #[must_use]
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until stopped, then close the detector.
    ///
    /// The poll interval is measured from the end of one tick to the start of
    /// the next, so a slow tick (a lyrics fetch on a cache miss) delays the
    /// following one.
    pub async fn run(mut self) {
        info!(
            "Starting lyric scheduler (detector: {}, clipboard: {})",
            self.detector.name(),
            self.sink.name()
        );

        let cancel_token = self.cancel_token.clone();
        loop {
            let interval = self.tracker.settings().poll_interval();
            tokio::select! {
                () = cancel_token.cancelled() => {
                    info!("Scheduler shutting down gracefully");
                    break;
                }
                () = tokio::time::sleep(interval) => {
                    self.tick().await;
                }
            }
        }

        if let Err(e) = self.detector.close().await {
            warn!("Failed to close detector {}: {}", self.detector.name(), e);
        }
    }

    /// Perform one poll: sample, update the tracker, deliver any emission
    pub async fn tick(&mut self) -> Option<LyricEmission> {
        let sample = match self.detector.sample().await {
            Ok(sample) => Some(sample),
            Err(e) => {
                debug!("No playback sample from {}: {}", self.detector.name(), e);
                None
            }
        };

        let emission = self.tracker.update(sample.as_ref()).await;
        if let Some(ref emission) = emission {
            self.deliver(emission).await;
        }

        let status = self.tracker.status();
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });

        emission
    }

    async fn deliver(&self, emission: &LyricEmission) {
        if self.tracker.settings().clipboard_enabled() {
            // A failed write is not retried; the next line change writes again
            if let Err(e) = self.sink.write(&emission.text).await {
                warn!("Failed to update clipboard: {}", e);
            }
        }

        // No subscribers is fine
        let _ = self.emission_tx.send(emission.clone());
    }
}
