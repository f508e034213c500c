//! Runtime-adjustable settings shared between the scheduler and its controllers.

use crate::time::{DurationExt, LyricOffset};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

/// Default polling interval (300ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(300);

/// Settings read by the scheduler on every tick.
///
/// Each field is a single atomic, so a change made from another task is seen
/// whole on the next tick and never half-applied.
#[derive(Debug)]
pub struct Settings {
    poll_interval_ms: AtomicU64,
    offset_ms: AtomicI64,
    clipboard_enabled: AtomicBool,
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, LyricOffset::ZERO, true)
    }
}

impl Settings {
    #[must_use]
    pub fn new(poll_interval: Duration, offset: LyricOffset, clipboard_enabled: bool) -> Self {
        Self {
            poll_interval_ms: AtomicU64::new(poll_interval.as_millis_u64()),
            offset_ms: AtomicI64::new(offset.as_millis()),
            clipboard_enabled: AtomicBool::new(clipboard_enabled),
        }
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.load(Ordering::Acquire))
    }

    /// Change the polling interval. Zero is ignored.
    pub fn set_poll_interval(&self, interval: Duration) {
        let millis = interval.as_millis_u64();
        if millis == 0 {
            return;
        }
        self.poll_interval_ms.store(millis, Ordering::Release);
        info!("Poll interval updated to {}ms", millis);
    }

    #[must_use]
    pub fn lyric_offset(&self) -> LyricOffset {
        LyricOffset::from_millis(self.offset_ms.load(Ordering::Acquire))
    }

    pub fn set_lyric_offset(&self, offset: LyricOffset) {
        self.offset_ms.store(offset.as_millis(), Ordering::Release);
        info!("Lyric offset updated to {}", offset);
    }

    #[must_use]
    pub fn clipboard_enabled(&self) -> bool {
        self.clipboard_enabled.load(Ordering::Acquire)
    }

    pub fn set_clipboard_enabled(&self, enabled: bool) {
        self.clipboard_enabled.store(enabled, Ordering::Release);
        if enabled {
            info!("Clipboard updates enabled");
        } else {
            info!("Clipboard updates disabled");
        }
    }
}
