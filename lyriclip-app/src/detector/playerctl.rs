//! MPRIS playback detection through the `playerctl` command, used when the
//! session bus cannot be reached directly.

use async_trait::async_trait;
use lyriclip_core::{CoreError, PlaybackDetector, PlaybackSample, Result, SongIdentity};
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use crate::command::find_program;

const PLAYERCTL: &str = "playerctl";

/// Fields are tab-separated; titles may contain spaces and commas
const METADATA_FORMAT: &str = "{{status}}\t{{artist}}\t{{title}}\t{{position}}";

/// Reads the active MPRIS player via `playerctl metadata`
pub struct PlayerctlDetector {
    program: PathBuf,
}

impl PlayerctlDetector {
    /// Locate `playerctl` on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DetectorUnavailable`] if `playerctl` is not installed.
    pub fn new() -> Result<Self> {
        let program = find_program(PLAYERCTL).ok_or_else(|| CoreError::DetectorUnavailable {
            reason: format!("{PLAYERCTL} not found on PATH"),
        })?;
        info!("Using {} for playback detection", program.display());
        Ok(Self { program })
    }

    fn failure(reason: impl Into<String>) -> CoreError {
        CoreError::DetectorFailed {
            detector: PLAYERCTL.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PlaybackDetector for PlayerctlDetector {
    fn name(&self) -> &'static str {
        PLAYERCTL
    }

    async fn sample(&self) -> Result<PlaybackSample> {
        let out = Command::new(&self.program)
            .args(["metadata", "--format", METADATA_FORMAT])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| Self::failure(format!("failed to run: {e}")))?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            debug!("{} exited with {}: {}", PLAYERCTL, out.status, stderr.trim());
            return Err(CoreError::NoActivePlayback);
        }

        let stdout = String::from_utf8_lossy(&out.stdout);
        parse_metadata(&stdout)
    }
}

/// Parse one `status\tartist\ttitle\tposition` line; position is in microseconds
fn parse_metadata(output: &str) -> Result<PlaybackSample> {
    let line = output.lines().next().unwrap_or_default();
    let mut fields = line.split('\t');
    let (Some(status), Some(artist), Some(title), Some(position)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(PlayerctlDetector::failure(format!(
            "unexpected metadata output: {line:?}"
        )));
    };

    if status.trim() != "Playing" {
        return Err(CoreError::NoActivePlayback);
    }

    let (artist, title) = (artist.trim(), title.trim());
    if artist.is_empty() || title.is_empty() {
        return Err(PlayerctlDetector::failure("player reports no artist or title"));
    }

    let micros: u64 = position
        .trim()
        .parse()
        .map_err(|_| PlayerctlDetector::failure(format!("invalid position {position:?}")))?;

    Ok(PlaybackSample::playing(
        SongIdentity::new(artist, title),
        Duration::from_micros(micros),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_playing() {
        let sample =
            parse_metadata("Playing\tRick Astley\tNever Gonna Give You Up\t18810000\n").unwrap();
        assert!(sample.is_playing);
        assert_eq!(
            sample.identity,
            SongIdentity::new("Rick Astley", "Never Gonna Give You Up")
        );
        assert_eq!(sample.position, Duration::from_millis(18_810));
    }

    #[test]
    fn test_parse_keeps_punctuation_in_title() {
        let sample = parse_metadata("Playing\tAC/DC\tHell's Bells, Live\t0").unwrap();
        assert_eq!(sample.identity.artist, "AC/DC");
        assert_eq!(sample.identity.title, "Hell's Bells, Live");
    }

    #[test]
    fn test_paused_is_no_playback() {
        let err = parse_metadata("Paused\tArtist\tTitle\t5000000").unwrap_err();
        assert!(matches!(err, CoreError::NoActivePlayback));
    }

    #[test]
    fn test_missing_title_is_failure() {
        let err = parse_metadata("Playing\tArtist\t\t5000000").unwrap_err();
        assert!(matches!(err, CoreError::DetectorFailed { .. }));
        assert!(err.is_detection_failure());
    }

    #[test]
    fn test_bad_position_is_failure() {
        let err = parse_metadata("Playing\tArtist\tTitle\t").unwrap_err();
        assert!(matches!(err, CoreError::DetectorFailed { .. }));
    }

    #[test]
    fn test_truncated_output_is_failure() {
        assert!(parse_metadata("").is_err());
        assert!(parse_metadata("Playing\tArtist").is_err());
    }
}
