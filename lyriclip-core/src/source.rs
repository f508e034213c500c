//! Playback detection capability and the simulated detector.

use crate::error::Result;
use crate::playback::{PlaybackSample, SongIdentity};
use async_trait::async_trait;
use std::time::Instant;
use tracing::info;

/// Trait for backends that report what the user is currently playing.
///
/// The scheduler polls [`sample`](PlaybackDetector::sample) once per tick.
/// Implementations should:
///
/// - Return a [`PlaybackSample`] for the active song, or an error when no
///   song can be observed (nothing playing, player gone, backend failure)
/// - Report positions that only move backward when the user seeks
/// - Release any held resources in [`close`](PlaybackDetector::close)
///
/// # Example
///
/// ```ignore
/// let detector = PlayerctlDetector::new()?;
/// let sample = detector.sample().await?;
/// ```
#[async_trait]
pub trait PlaybackDetector: Send + Sync {
    /// Returns a human-readable name for this detector.
    fn name(&self) -> &'static str;

    /// Observe the current song and playback position.
    ///
    /// # Errors
    ///
    /// Returns an error if no playing song can be detected.
    async fn sample(&self) -> Result<PlaybackSample>;

    /// Release the backend. Called once when the scheduler stops.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails to shut down cleanly.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// Simulates a single song that started playing when the detector was created
pub struct DemoDetector {
    identity: SongIdentity,
    started_at: Instant,
}

impl DemoDetector {
    #[must_use]
    pub fn new(identity: SongIdentity) -> Self {
        Self {
            identity,
            started_at: Instant::now(),
        }
    }
}

#[async_trait]
impl PlaybackDetector for DemoDetector {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn sample(&self) -> Result<PlaybackSample> {
        Ok(PlaybackSample::playing(
            self.identity.clone(),
            self.started_at.elapsed(),
        ))
    }

    async fn close(&self) -> Result<()> {
        info!("Demo detector closed");
        Ok(())
    }
}
