//! Time and duration conversion utilities.
//!
//! This module provides safe conversion functions for durations,
//! avoiding truncation issues with explicit saturation behavior, and the
//! signed [`LyricOffset`] applied to playback positions.

use std::fmt;
use std::time::Duration;

/// Extension trait for safe Duration conversions.
pub trait DurationExt {
    /// Convert duration to milliseconds as u64, saturating at `u64::MAX`.
    ///
    /// In practice, this is always safe because durations exceeding `u64::MAX`
    /// milliseconds would represent ~584 million years.
    fn as_millis_u64(&self) -> u64;

    /// Convert duration to milliseconds as i64, saturating at `i64::MAX`.
    fn as_millis_i64(&self) -> i64;
}

impl DurationExt for Duration {
    fn as_millis_u64(&self) -> u64 {
        u64::try_from(self.as_millis()).unwrap_or(u64::MAX)
    }

    fn as_millis_i64(&self) -> i64 {
        i64::try_from(self.as_millis()).unwrap_or(i64::MAX)
    }
}

/// Signed shift applied to the observed playback position before lyric lookup.
///
/// Positive values show lines earlier, negative values later.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LyricOffset {
    millis: i64,
}

impl LyricOffset {
    pub const ZERO: Self = Self { millis: 0 };

    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    #[must_use]
    pub const fn as_millis(self) -> i64 {
        self.millis
    }

    /// Shift `position` by this offset.
    ///
    /// Returns `None` when the result would fall before the start of the
    /// song; there is no line to show at a negative position.
    #[must_use]
    pub fn apply(self, position: Duration) -> Option<Duration> {
        let shift = Duration::from_millis(self.millis.unsigned_abs());
        if self.millis >= 0 {
            Some(position.saturating_add(shift))
        } else {
            position.checked_sub(shift)
        }
    }
}

impl fmt::Display for LyricOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis == 0 {
            return f.write_str("0s");
        }
        let sign = if self.millis < 0 { '-' } else { '+' };
        let abs = self.millis.unsigned_abs();
        write!(f, "{sign}{}.{:03}s", abs / 1000, abs % 1000)
    }
}

/// Format a playback position as `mm:ss` for log output
#[must_use]
pub fn format_position(position: Duration) -> String {
    let total_secs = position.as_secs();
    format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
}
