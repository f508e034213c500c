use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to turn a lyrics document into a timeline
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("no timed lyric lines found")]
    EmptyResult,
}

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Failed to write config template to {path}: {source}")]
    ConfigTemplateWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // Detection errors
    #[error("No active playback")]
    NoActivePlayback,

    #[error("Playback detector {detector} failed: {reason}")]
    DetectorFailed { detector: String, reason: String },

    #[error("Playback detector unavailable: {reason}")]
    DetectorUnavailable { reason: String },

    // Lyrics errors
    #[error("Lyrics not found for track: {track} by {artist}")]
    LyricsNotFound { track: String, artist: String },

    #[error("Lyrics provider {provider} failed: {reason}")]
    LyricsProviderFailed { provider: String, reason: String },

    #[error("Lyrics provider {provider} timed out after {}s", timeout.as_secs())]
    FetchTimeout { provider: String, timeout: Duration },

    #[error("Failed to parse lyrics: {0}")]
    LyricsParse(#[from] ParseError),

    // Network errors
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Network request failed: {0}")]
    NetworkMiddlewareError(#[from] reqwest_middleware::Error),

    // Clipboard errors
    #[error("No clipboard backend available: {reason}")]
    ClipboardUnavailable { reason: String },

    #[error("Clipboard write via {backend} failed: {reason}")]
    ClipboardWriteFailed { backend: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CoreError {
    /// Whether this error means "lyrics could not be obtained for the song".
    ///
    /// Provider, network, timeout and parse failures all collapse into this
    /// single kind; the tracker treats them identically.
    #[must_use]
    pub const fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            Self::LyricsNotFound { .. }
                | Self::LyricsProviderFailed { .. }
                | Self::FetchTimeout { .. }
                | Self::LyricsParse(_)
                | Self::NetworkError(_)
                | Self::NetworkMiddlewareError(_)
        )
    }

    /// Whether this error means no playable song could be observed
    #[must_use]
    pub const fn is_detection_failure(&self) -> bool {
        matches!(
            self,
            Self::NoActivePlayback | Self::DetectorFailed { .. } | Self::DetectorUnavailable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
