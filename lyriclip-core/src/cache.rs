use crate::lrc::LyricTimeline;
use crate::playback::SongIdentity;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// In-memory lyrics cache keyed by song identity.
///
/// Entries are never evicted and never mutated once inserted. Timelines are
/// fully parsed before `put`, and the lock is only held long enough to swap an
/// `Arc` into the map, so readers never see a partially built timeline.
#[derive(Debug, Default)]
pub struct LyricsCache {
    entries: RwLock<HashMap<SongIdentity, Arc<LyricTimeline>>>,
}

impl LyricsCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the timeline for a song
    #[must_use]
    pub fn get(&self, identity: &SongIdentity) -> Option<Arc<LyricTimeline>> {
        self.entries.read().get(identity).cloned()
    }

    /// Publish a timeline for a song. An existing entry is replaced.
    pub fn put(&self, identity: SongIdentity, timeline: Arc<LyricTimeline>) {
        debug!(
            "Caching {} lyric lines for {}",
            timeline.len(),
            identity
        );
        self.entries.write().insert(identity, timeline);
    }

    #[must_use]
    pub fn contains(&self, identity: &SongIdentity) -> bool {
        self.entries.read().contains_key(identity)
    }

    /// Drop every cached timeline
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
