//! Playback tracking state machine.
//!
//! The tracker is fed one observation per tick and decides whether the song
//! changed, whether lyrics must be resolved, and whether a new lyric line
//! became active. It performs no output itself; callers route the returned
//! [`LyricEmission`] to the clipboard or elsewhere.

use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

use crate::fetcher::LyricsFetcher;
use crate::lrc::LyricTimeline;
use crate::playback::{LyricEmission, PlaybackSample, SongIdentity};
use crate::settings::Settings;
use crate::time::format_position;

/// Lyrics state for the song being tracked
#[derive(Debug, Clone)]
enum SongLyrics {
    /// Fetch or parse failed; not retried until the song changes
    Unavailable,
    Available {
        timeline: Arc<LyricTimeline>,
        last_emitted: Option<String>,
    },
}

#[derive(Debug, Clone)]
struct ActiveSong {
    identity: SongIdentity,
    lyrics: SongLyrics,
}

#[derive(Debug, Clone, Default)]
enum TrackerState {
    #[default]
    Idle,
    Tracking(ActiveSong),
}

/// Snapshot of what the tracker is doing, for status display
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TrackerStatus {
    #[default]
    Idle,
    Playing {
        identity: SongIdentity,
        lyrics_available: bool,
        /// Most recently emitted line
        line: Option<String>,
    },
}

impl fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("No song detected"),
            Self::Playing {
                identity,
                line: Some(line),
                ..
            } => write!(f, "{identity}: {line}"),
            Self::Playing { identity, .. } => write!(f, "Playing: {identity}"),
        }
    }
}

/// State machine turning playback samples into lyric line changes
pub struct PlaybackTracker {
    state: TrackerState,
    fetcher: LyricsFetcher,
    settings: Arc<Settings>,
}

impl PlaybackTracker {
    #[must_use]
    pub fn new(fetcher: LyricsFetcher, settings: Arc<Settings>) -> Self {
        Self {
            state: TrackerState::Idle,
            fetcher,
            settings,
        }
    }

    /// Advance the state machine by one tick.
    ///
    /// `None`, or a sample that is not playing, means no song could be
    /// observed. Returns an emission only when the active line's text differs
    /// from the last one emitted for the current song.
    pub async fn update(&mut self, sample: Option<&PlaybackSample>) -> Option<LyricEmission> {
        let Some(sample) = sample.filter(|s| s.is_playing) else {
            if matches!(self.state, TrackerState::Tracking(_)) {
                info!("No song detected, clearing state");
                self.state = TrackerState::Idle;
            }
            return None;
        };

        if self.current_identity() != Some(&sample.identity) {
            self.enter_song(sample.identity.clone()).await;
        }

        // Read once so a concurrent change applies to the whole evaluation
        let offset = self.settings.lyric_offset();

        let TrackerState::Tracking(ActiveSong {
            lyrics:
                SongLyrics::Available {
                    timeline,
                    last_emitted,
                },
            ..
        }) = &mut self.state
        else {
            return None;
        };

        let line = offset
            .apply(sample.position)
            .and_then(|position| timeline.line_at(position))?;

        if last_emitted.as_deref() == Some(line.text.as_str()) {
            return None;
        }

        info!("[{}] {}", format_position(sample.position), line.text);
        *last_emitted = Some(line.text.clone());

        Some(LyricEmission {
            text: line.text.clone(),
            raw_position: sample.position,
        })
    }

    /// Switch to a new song and resolve its lyrics
    async fn enter_song(&mut self, identity: SongIdentity) {
        info!("New song detected: {}", identity);

        let lyrics = match self.fetcher.resolve(&identity).await {
            Ok(timeline) => SongLyrics::Available {
                timeline,
                last_emitted: None,
            },
            Err(e) => {
                warn!("Failed to fetch lyrics for {}: {}", identity, e);
                SongLyrics::Unavailable
            }
        };

        self.state = TrackerState::Tracking(ActiveSong { identity, lyrics });
    }

    #[must_use]
    pub fn current_identity(&self) -> Option<&SongIdentity> {
        match &self.state {
            TrackerState::Idle => None,
            TrackerState::Tracking(active) => Some(&active.identity),
        }
    }

    #[must_use]
    pub fn status(&self) -> TrackerStatus {
        match &self.state {
            TrackerState::Idle => TrackerStatus::Idle,
            TrackerState::Tracking(active) => {
                let (lyrics_available, line) = match &active.lyrics {
                    SongLyrics::Unavailable => (false, None),
                    SongLyrics::Available { last_emitted, .. } => (true, last_emitted.clone()),
                };
                TrackerStatus::Playing {
                    identity: active.identity.clone(),
                    lyrics_available,
                    line,
                }
            }
        }
    }

    #[must_use]
    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LyricsCache;
    use crate::error::{CoreError, Result};
    use crate::fetcher::DEFAULT_FETCH_TIMEOUT;
    use crate::provider::{FetchedLyrics, LyricsProvider, LyricsQuery};
    use crate::time::LyricOffset;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::time::Duration;

    const SCENARIO_LRC: &str = "[00:01.00]Hello\n[00:03.50]World\n[00:03.50]World (dup)\n";

    /// Serves lyrics per title and records how often each title was requested
    #[derive(Default)]
    struct MapProvider {
        lyrics: HashMap<String, String>,
        requests: Mutex<Vec<String>>,
    }

    impl MapProvider {
        fn with(mut self, title: &str, content: &str) -> Self {
            self.lyrics.insert(title.to_string(), content.to_string());
            self
        }

        fn requests_for(&self, title: &str) -> usize {
            self.requests.lock().iter().filter(|t| *t == title).count()
        }
    }

    #[async_trait]
    impl LyricsProvider for MapProvider {
        fn name(&self) -> &'static str {
            "map"
        }

        async fn fetch(&self, query: &LyricsQuery) -> Result<FetchedLyrics> {
            self.requests.lock().push(query.track_name.clone());
            self.lyrics
                .get(&query.track_name)
                .map(|content| FetchedLyrics {
                    content: content.clone(),
                    provider_id: query.track_name.clone(),
                })
                .ok_or_else(|| CoreError::LyricsNotFound {
                    track: query.track_name.clone(),
                    artist: query.artist_name.clone(),
                })
        }
    }

    fn tracker(provider: Arc<MapProvider>) -> PlaybackTracker {
        let fetcher = LyricsFetcher::new(
            Arc::new(LyricsCache::new()),
            provider,
            DEFAULT_FETCH_TIMEOUT,
        );
        PlaybackTracker::new(fetcher, Arc::new(Settings::default()))
    }

    fn sample(title: &str, millis: u64) -> PlaybackSample {
        PlaybackSample::playing(SongIdentity::new("Artist", title), Duration::from_millis(millis))
    }

    fn emitted(emission: Option<LyricEmission>) -> Option<String> {
        emission.map(|e| e.text)
    }

    #[tokio::test]
    async fn test_scenario_stream() {
        let provider = Arc::new(MapProvider::default().with("A", SCENARIO_LRC));
        let mut tracker = tracker(Arc::clone(&provider));

        let ticks = [
            Some(sample("A", 1000)),
            Some(sample("A", 1200)),
            Some(sample("A", 1200)),
            None,
            Some(sample("A", 1500)),
        ];

        let mut outputs = Vec::new();
        for tick in &ticks {
            outputs.push(emitted(tracker.update(tick.as_ref()).await));
        }

        assert_eq!(
            outputs,
            vec![
                Some("Hello".to_string()),
                None,
                None,
                None,
                Some("Hello".to_string()),
            ]
        );
        // Second entry into the song is served from the cache
        assert_eq!(provider.requests_for("A"), 1);
    }

    #[tokio::test]
    async fn test_nothing_emitted_before_first_line() {
        let provider = Arc::new(MapProvider::default().with("A", SCENARIO_LRC));
        let mut tracker = tracker(provider);

        assert_eq!(tracker.update(Some(&sample("A", 0))).await, None);
        assert_eq!(tracker.update(Some(&sample("A", 500))).await, None);
        assert_eq!(
            emitted(tracker.update(Some(&sample("A", 1000))).await),
            Some("Hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_repeated_sample_emits_once() {
        let provider = Arc::new(MapProvider::default().with("A", SCENARIO_LRC));
        let mut tracker = tracker(provider);
        let tick = sample("A", 4000);

        assert_eq!(
            emitted(tracker.update(Some(&tick)).await),
            Some("World (dup)".to_string())
        );
        for _ in 0..10 {
            assert_eq!(tracker.update(Some(&tick)).await, None);
        }
    }

    #[tokio::test]
    async fn test_emission_carries_raw_position() {
        let provider = Arc::new(MapProvider::default().with("A", SCENARIO_LRC));
        let mut tracker = tracker(provider);
        tracker
            .settings()
            .set_lyric_offset(LyricOffset::from_millis(500));

        let emission = tracker.update(Some(&sample("A", 3000))).await.unwrap();
        assert_eq!(emission.text, "World (dup)");
        assert_eq!(emission.raw_position, Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_positive_offset_matches_later_position() {
        let lrc = "[00:10.00]Ten\n[00:10.50]Ten and a half\n[00:11.00]Eleven";
        let provider = Arc::new(MapProvider::default().with("A", lrc));

        let mut unshifted = tracker(Arc::clone(&provider));
        let expected = emitted(unshifted.update(Some(&sample("A", 10_500))).await);

        let mut shifted = tracker(provider);
        shifted
            .settings()
            .set_lyric_offset(LyricOffset::from_millis(500));
        let actual = emitted(shifted.update(Some(&sample("A", 10_000))).await);

        assert_eq!(actual, expected);
        assert_eq!(actual, Some("Ten and a half".to_string()));
    }

    #[tokio::test]
    async fn test_negative_offset_shifts_earlier() {
        let lrc = "[00:05.00]Five\n[00:08.00]Eight";
        let provider = Arc::new(MapProvider::default().with("A", lrc));
        let mut tracker = tracker(provider);
        tracker
            .settings()
            .set_lyric_offset(LyricOffset::from_millis(-2000));

        // 9s - 2s = 7s -> "Five"
        assert_eq!(
            emitted(tracker.update(Some(&sample("A", 9000))).await),
            Some("Five".to_string())
        );
        // 10s - 2s = 8s -> "Eight"
        assert_eq!(
            emitted(tracker.update(Some(&sample("A", 10_000))).await),
            Some("Eight".to_string())
        );
    }

    #[tokio::test]
    async fn test_negative_adjusted_position_yields_nothing() {
        let provider = Arc::new(MapProvider::default().with("A", "[00:00.00]Start"));
        let mut tracker = tracker(provider);
        tracker
            .settings()
            .set_lyric_offset(LyricOffset::from_millis(-2000));

        assert_eq!(tracker.update(Some(&sample("A", 1000))).await, None);
        assert_eq!(
            emitted(tracker.update(Some(&sample("A", 2000))).await),
            Some("Start".to_string())
        );
    }

    #[tokio::test]
    async fn test_song_change_resets_last_emitted() {
        let provider = Arc::new(
            MapProvider::default()
                .with("A", "[00:00.00]Same words")
                .with("B", "[00:00.00]Same words"),
        );
        let mut tracker = tracker(provider);

        assert_eq!(
            emitted(tracker.update(Some(&sample("A", 100))).await),
            Some("Same words".to_string())
        );
        assert_eq!(
            emitted(tracker.update(Some(&sample("B", 0))).await),
            Some("Same words".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_not_retried_within_song() {
        let provider = Arc::new(MapProvider::default());
        let mut tracker = tracker(Arc::clone(&provider));

        for millis in [0, 300, 600, 900] {
            assert_eq!(tracker.update(Some(&sample("Missing", millis))).await, None);
        }
        assert_eq!(provider.requests_for("Missing"), 1);
        assert_eq!(
            tracker.status(),
            TrackerStatus::Playing {
                identity: SongIdentity::new("Artist", "Missing"),
                lyrics_available: false,
                line: None,
            }
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_retried_after_song_change() {
        let provider = Arc::new(MapProvider::default().with("A", SCENARIO_LRC));
        let mut tracker = tracker(Arc::clone(&provider));

        tracker.update(Some(&sample("Missing", 0))).await;
        tracker.update(Some(&sample("A", 0))).await;
        tracker.update(Some(&sample("Missing", 0))).await;

        assert_eq!(provider.requests_for("Missing"), 2);
    }

    #[tokio::test]
    async fn test_backward_seek_changes_line() {
        let provider = Arc::new(MapProvider::default().with("A", SCENARIO_LRC));
        let mut tracker = tracker(provider);

        assert_eq!(
            emitted(tracker.update(Some(&sample("A", 4000))).await),
            Some("World (dup)".to_string())
        );
        assert_eq!(
            emitted(tracker.update(Some(&sample("A", 1500))).await),
            Some("Hello".to_string())
        );
    }

    #[tokio::test]
    async fn test_seek_before_first_line_keeps_last_emitted() {
        let provider = Arc::new(MapProvider::default().with("A", SCENARIO_LRC));
        let mut tracker = tracker(provider);

        tracker.update(Some(&sample("A", 1500))).await;
        assert_eq!(tracker.update(Some(&sample("A", 200))).await, None);
        // Same line as before the seek: still debounced
        assert_eq!(tracker.update(Some(&sample("A", 1600))).await, None);
    }

    #[tokio::test]
    async fn test_paused_sample_resets_to_idle() {
        let provider = Arc::new(MapProvider::default().with("A", SCENARIO_LRC));
        let mut tracker = tracker(provider);

        tracker.update(Some(&sample("A", 1500))).await;
        let paused = PlaybackSample {
            is_playing: false,
            ..sample("A", 1500)
        };
        assert_eq!(tracker.update(Some(&paused)).await, None);
        assert_eq!(tracker.status(), TrackerStatus::Idle);
        assert!(tracker.current_identity().is_none());
    }

    #[tokio::test]
    async fn test_idle_no_sample_is_noop() {
        let provider = Arc::new(MapProvider::default());
        let mut tracker = tracker(provider);

        assert_eq!(tracker.update(None).await, None);
        assert_eq!(tracker.status(), TrackerStatus::Idle);
    }

    #[tokio::test]
    async fn test_offset_persists_across_songs() {
        let provider = Arc::new(
            MapProvider::default()
                .with("A", SCENARIO_LRC)
                .with("B", SCENARIO_LRC),
        );
        let mut tracker = tracker(provider);
        tracker
            .settings()
            .set_lyric_offset(LyricOffset::from_millis(1000));

        tracker.update(Some(&sample("A", 0))).await;
        tracker.update(None).await;
        assert_eq!(
            emitted(tracker.update(Some(&sample("B", 0))).await),
            Some("Hello".to_string())
        );
        assert_eq!(tracker.settings().lyric_offset().as_millis(), 1000);
    }

    #[test]
    fn test_status_display() {
        let identity = SongIdentity::new("Artist", "Song");
        assert_eq!(TrackerStatus::Idle.to_string(), "No song detected");
        assert_eq!(
            TrackerStatus::Playing {
                identity: identity.clone(),
                lyrics_available: true,
                line: None,
            }
            .to_string(),
            "Playing: Artist - Song"
        );
        assert_eq!(
            TrackerStatus::Playing {
                identity,
                lyrics_available: true,
                line: Some("Hello".to_string()),
            }
            .to_string(),
            "Artist - Song: Hello"
        );
    }
}
