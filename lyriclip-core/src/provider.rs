use crate::error::CoreError;
use crate::playback::SongIdentity;
use async_trait::async_trait;

/// Query parameters for fetching lyrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricsQuery {
    /// Track name
    pub track_name: String,
    /// Artist name
    pub artist_name: String,
}

impl LyricsQuery {
    /// Create a new lyrics query
    pub fn new(track_name: impl Into<String>, artist_name: impl Into<String>) -> Self {
        Self {
            track_name: track_name.into(),
            artist_name: artist_name.into(),
        }
    }
}

impl From<&SongIdentity> for LyricsQuery {
    fn from(identity: &SongIdentity) -> Self {
        Self::new(&identity.title, &identity.artist)
    }
}

/// Raw timestamped lyrics returned by a provider
#[derive(Debug, Clone)]
pub struct FetchedLyrics {
    /// LRC document text, not yet parsed
    pub content: String,
    /// Provider-specific ID (e.g., LRCLIB's numeric ID as string)
    pub provider_id: String,
}

/// Trait for lyrics providers
#[async_trait]
pub trait LyricsProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &'static str;

    /// Fetch synced lyrics for a query
    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError>;
}
