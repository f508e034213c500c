use async_trait::async_trait;
use lyriclip_core::{CoreError, FetchedLyrics, LyricsProvider, LyricsQuery};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const LRCLIB_API_URL: &str = "https://lrclib.net/api";

/// Default timeout for HTTP requests (10 seconds)
const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default number of retry attempts
const DEFAULT_MAX_RETRIES: u32 = 3;

/// LRCLIB.net lyrics provider
pub struct LrclibProvider {
    client: ClientWithMiddleware,
    base_url: String,
}

impl LrclibProvider {
    /// Create a new LRCLIB provider with default 10-second timeout and 3 retries.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new() -> Result<Self, CoreError> {
        Self::with_base_url(LRCLIB_API_URL)
    }

    /// Create a provider talking to an LRCLIB-compatible server at `base_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, CoreError> {
        let base_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("Lyriclip/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Wrap with retry middleware (exponential backoff)
        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(DEFAULT_MAX_RETRIES);
        let client = ClientBuilder::new(base_client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn get_url(&self, query: &LyricsQuery) -> String {
        format!(
            "{}/get?artist_name={}&track_name={}",
            self.base_url,
            urlencoding::encode(&query.artist_name),
            urlencoding::encode(&query.track_name)
        )
    }

    fn search_url(&self, query: &LyricsQuery) -> String {
        let search_query = format!("{} {}", query.artist_name, query.track_name);
        format!(
            "{}/search?q={}",
            self.base_url,
            urlencoding::encode(&search_query)
        )
    }

    fn not_found(query: &LyricsQuery) -> CoreError {
        CoreError::LyricsNotFound {
            track: query.track_name.clone(),
            artist: query.artist_name.clone(),
        }
    }

    fn status_error(&self, status: reqwest::StatusCode) -> CoreError {
        CoreError::LyricsProviderFailed {
            provider: self.name().to_string(),
            reason: format!("LRCLIB returned status: {status}"),
        }
    }
}

/// Response from LRCLIB API
/// Note: API returns additional fields (albumName, duration, plainLyrics) that we don't use;
/// serde ignores unknown fields by default.
#[derive(Debug, Deserialize)]
struct LrclibResponse {
    id: i64,
    #[serde(rename = "artistName", default)]
    artist_name: String,
    #[serde(rename = "trackName", default)]
    track_name: String,
    #[serde(default)]
    instrumental: bool,
    #[serde(rename = "syncedLyrics")]
    synced_lyrics: Option<String>,
}

impl LrclibResponse {
    /// Timestamped lyrics, if this record has any worth using
    fn into_synced(self) -> Option<FetchedLyrics> {
        if self.instrumental {
            debug!("Track is instrumental (lrclib id: {})", self.id);
            return None;
        }

        let synced = self.synced_lyrics.filter(|s| !s.trim().is_empty())?;
        Some(FetchedLyrics {
            content: synced,
            provider_id: self.id.to_string(),
        })
    }
}

/// First search result carrying synced lyrics
fn first_synced(results: Vec<LrclibResponse>) -> Option<FetchedLyrics> {
    results.into_iter().find_map(|result| {
        let (id, artist, track) = (result.id, result.artist_name.clone(), result.track_name.clone());
        let fetched = result.into_synced()?;
        info!("LRCLIB found match via search (id: {id}, {artist} - {track})");
        Some(fetched)
    })
}

#[async_trait]
impl LyricsProvider for LrclibProvider {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        info!(
            "Fetching lyrics from LRCLIB for: {} - {}",
            query.artist_name, query.track_name
        );

        let url = self.get_url(query);
        debug!("LRCLIB GET (exact match): {}", url);

        let response = self.client.get(&url).send().await?;
        debug!("LRCLIB response status: {}", response.status());

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            info!("LRCLIB exact match not found, trying search");
            return self.search_fallback(query).await;
        }

        if !response.status().is_success() {
            warn!("LRCLIB returned status: {}", response.status());
            return Err(self.status_error(response.status()));
        }

        let result: LrclibResponse = response.json().await?;
        info!("LRCLIB found match with id: {}", result.id);
        result.into_synced().ok_or_else(|| Self::not_found(query))
    }
}

impl LrclibProvider {
    async fn search_fallback(&self, query: &LyricsQuery) -> Result<FetchedLyrics, CoreError> {
        let url = self.search_url(query);
        debug!("LRCLIB GET (search): {}", url);

        let response = self.client.get(&url).send().await?;
        debug!("LRCLIB response status: {}", response.status());

        if !response.status().is_success() {
            warn!("LRCLIB search returned status: {}", response.status());
            return Err(self.status_error(response.status()));
        }

        let results: Vec<LrclibResponse> = response.json().await?;
        debug!("LRCLIB search returned {} results", results.len());
        first_synced(results).ok_or_else(|| Self::not_found(query))
    }
}
