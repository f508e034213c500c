//! Platform playback detectors.

#[cfg(target_os = "linux")]
mod mpris;
#[cfg(not(windows))]
mod playerctl;
#[cfg(any(windows, test))]
mod windows;

use lyriclip_core::{PlaybackDetector, Result};

/// Connect to the platform's media session backend.
///
/// # Errors
///
/// Returns [`lyriclip_core::CoreError::DetectorUnavailable`] if no backend can be used.
#[cfg(windows)]
#[allow(clippy::unused_async)]
pub async fn detect() -> Result<Box<dyn PlaybackDetector>> {
    Ok(Box::new(windows::WindowsMediaDetector::new()?))
}

/// Connect to the platform's media session backend.
///
/// On Linux the session bus is read directly, with `playerctl` as the fallback
/// when the bus cannot be reached.
///
/// # Errors
///
/// Returns [`lyriclip_core::CoreError::DetectorUnavailable`] if no backend can be used.
#[cfg(not(windows))]
#[cfg_attr(not(target_os = "linux"), allow(clippy::unused_async))]
pub async fn detect() -> Result<Box<dyn PlaybackDetector>> {
    #[cfg(target_os = "linux")]
    match mpris::MprisDetector::connect().await {
        Ok(detector) => return Ok(Box::new(detector)),
        Err(e) => tracing::warn!("{e}; falling back to playerctl"),
    }

    Ok(Box::new(playerctl::PlayerctlDetector::new()?))
}
