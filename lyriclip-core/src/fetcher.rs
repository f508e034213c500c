//! Resolves a song to its lyric timeline through the cache and a provider.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::cache::LyricsCache;
use crate::error::{CoreError, Result};
use crate::lrc::LyricTimeline;
use crate::playback::SongIdentity;
use crate::provider::{LyricsProvider, LyricsQuery};

/// Default upper bound on a single provider fetch (10 seconds)
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Looks up lyrics in the cache, fetching and parsing them on a miss
pub struct LyricsFetcher {
    cache: Arc<LyricsCache>,
    provider: Arc<dyn LyricsProvider>,
    timeout: Duration,
}

impl LyricsFetcher {
    /// Create a new lyrics fetcher
    ///
    /// # Arguments
    /// * `cache` - Cache that successful fetches are published to
    /// * `provider` - Lyrics provider queried on a cache miss
    /// * `timeout` - Upper bound on a single fetch; expiry counts as a failed fetch
    pub fn new(
        cache: Arc<LyricsCache>,
        provider: Arc<dyn LyricsProvider>,
        timeout: Duration,
    ) -> Self {
        Self {
            cache,
            provider,
            timeout,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<LyricsCache> {
        &self.cache
    }

    /// Get the timeline for a song, from the cache or the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails, does not answer within the
    /// timeout, or returns a document without any timed lines.
    pub async fn resolve(&self, identity: &SongIdentity) -> Result<Arc<LyricTimeline>> {
        if let Some(cached) = self.cache.get(identity) {
            info!("Using cached lyrics for {}", identity);
            return Ok(cached);
        }

        let provider = self.provider.name();
        info!("Fetching lyrics for {} (provider: {})", identity, provider);

        let query = LyricsQuery::from(identity);
        let fetched = tokio::time::timeout(self.timeout, self.provider.fetch(&query))
            .await
            .map_err(|_| CoreError::FetchTimeout {
                provider: provider.to_string(),
                timeout: self.timeout,
            })??;

        debug!(
            "Received {} bytes of lyrics from {} (provider_id: {})",
            fetched.content.len(),
            provider,
            fetched.provider_id
        );

        let timeline = Arc::new(LyricTimeline::parse(&fetched.content)?);
        info!("Lyrics fetched successfully ({} lines)", timeline.len());

        self.cache.put(identity.clone(), Arc::clone(&timeline));
        Ok(timeline)
    }
}
