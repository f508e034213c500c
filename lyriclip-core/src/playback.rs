use std::fmt;
use std::time::Duration;

/// Identifies a song by artist and title.
///
/// Used both as the lyrics cache key and to detect song changes. Comparison
/// is exact and case-sensitive; no normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SongIdentity {
    pub artist: String,
    pub title: String,
}

impl SongIdentity {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for SongIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.artist, self.title)
    }
}

/// One observation of the music player, taken once per tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSample {
    pub identity: SongIdentity,
    /// Current playback position
    pub position: Duration,
    pub is_playing: bool,
}

impl PlaybackSample {
    /// Create a sample for a song that is currently playing
    #[must_use]
    pub const fn playing(identity: SongIdentity, position: Duration) -> Self {
        Self {
            identity,
            position,
            is_playing: true,
        }
    }
}

/// Emitted when the active lyric line changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricEmission {
    pub text: String,
    /// Playback position as reported by the detector, before the offset
    pub raw_position: Duration,
}
