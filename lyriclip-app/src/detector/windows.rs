//! Windows media session detection through PowerShell and the
//! `GlobalSystemMediaTransportControlsSessionManager` WinRT API.

use lyriclip_core::{CoreError, PlaybackSample, Result, SongIdentity};
use serde::Deserialize;
use std::time::Duration;

#[cfg(windows)]
pub use session::WindowsMediaDetector;

/// Prints the current session as one JSON object, or `{}` when nothing is playing
#[cfg(windows)]
const MEDIA_SCRIPT: &str = r"
Add-Type -AssemblyName System.Runtime.WindowsRuntime
$asTask = [System.WindowsRuntimeSystemExtensions].GetMethods() | Where-Object {
    $_.Name -eq 'AsTask' -and $_.GetParameters().Count -eq 1 -and
    $_.GetParameters()[0].ParameterType.Name -eq 'IAsyncOperation`1'
} | Select-Object -First 1
function Await($operation, [Type]$type) {
    $task = $asTask.MakeGenericMethod($type).Invoke($null, @($operation))
    $null = $task.Wait(-1)
    $task.Result
}

$null = [Windows.Media.Control.GlobalSystemMediaTransportControlsSessionManager, Windows.Media.Control, ContentType = WindowsRuntime]
$manager = Await ([Windows.Media.Control.GlobalSystemMediaTransportControlsSessionManager]::RequestAsync()) ([Windows.Media.Control.GlobalSystemMediaTransportControlsSessionManager])
$session = $manager.GetCurrentSession()
if ($null -eq $session) {
    Write-Output '{}'
    exit
}

$props = Await ($session.TryGetMediaPropertiesAsync()) ([Windows.Media.Control.GlobalSystemMediaTransportControlsSessionMediaProperties])
$timeline = $session.GetTimelineProperties()
$isPlaying = $session.GetPlaybackInfo().PlaybackStatus -eq 4

# Timeline position is a snapshot taken at LastUpdatedTime
$position = $timeline.Position.TotalSeconds
if ($isPlaying) {
    $position += ([DateTimeOffset]::Now - $timeline.LastUpdatedTime).TotalSeconds
}

@{
    artist = $props.Artist
    title = $props.Title
    position = $position
    isPlaying = $isPlaying
} | ConvertTo-Json -Compress
";

#[cfg(windows)]
mod session {
    use super::{failure, parse_media_json, MEDIA_SCRIPT};
    use crate::command::find_program;
    use async_trait::async_trait;
    use lyriclip_core::{CoreError, PlaybackDetector, PlaybackSample, Result};
    use std::path::PathBuf;
    use tokio::process::Command;
    use tracing::info;

    const POWERSHELL: &str = "powershell.exe";

    /// Reads the current Windows media session by running a PowerShell script per poll
    pub struct WindowsMediaDetector {
        program: PathBuf,
    }

    impl WindowsMediaDetector {
        /// Locate PowerShell on `PATH`.
        ///
        /// # Errors
        ///
        /// Returns [`CoreError::DetectorUnavailable`] if `powershell.exe` is not installed.
        pub fn new() -> Result<Self> {
            let program =
                find_program(POWERSHELL).ok_or_else(|| CoreError::DetectorUnavailable {
                    reason: format!("{POWERSHELL} not found on PATH"),
                })?;
            info!("Using Windows media sessions for playback detection");
            Ok(Self { program })
        }
    }

    #[async_trait]
    impl PlaybackDetector for WindowsMediaDetector {
        fn name(&self) -> &'static str {
            "windows-media"
        }

        async fn sample(&self) -> Result<PlaybackSample> {
            let output = Command::new(&self.program)
                .args(["-NoProfile", "-NonInteractive", "-Command", MEDIA_SCRIPT])
                .kill_on_drop(true)
                .output()
                .await
                .map_err(|e| failure(format!("failed to run {POWERSHELL}: {e}")))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(failure(format!(
                    "{POWERSHELL} exited with {}: {}",
                    output.status,
                    stderr.trim()
                )));
            }

            parse_media_json(&String::from_utf8_lossy(&output.stdout))
        }
    }
}

fn failure(reason: impl Into<String>) -> CoreError {
    CoreError::DetectorFailed {
        detector: "windows-media".to_string(),
        reason: reason.into(),
    }
}

#[derive(Debug, Deserialize)]
struct MediaSession {
    #[serde(default)]
    artist: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    position: f64,
    #[serde(default, rename = "isPlaying")]
    is_playing: bool,
}

fn parse_media_json(output: &str) -> Result<PlaybackSample> {
    let session: MediaSession = serde_json::from_str(output.trim())
        .map_err(|e| failure(format!("invalid media session output: {e}")))?;

    let title = session.title.filter(|t| !t.trim().is_empty());
    let Some(title) = title.filter(|_| session.is_playing) else {
        return Err(CoreError::NoActivePlayback);
    };
    let Some(artist) = session.artist.filter(|a| !a.trim().is_empty()) else {
        return Err(failure("incomplete song information"));
    };

    let position = Duration::try_from_secs_f64(session.position).unwrap_or_default();
    Ok(PlaybackSample::playing(
        SongIdentity::new(artist.trim(), title.trim()),
        position,
    ))
}
