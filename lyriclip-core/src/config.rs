use crate::error::{CoreError, Result};
use crate::fetcher::DEFAULT_FETCH_TIMEOUT;
use crate::playback::SongIdentity;
use crate::settings::{Settings, DEFAULT_POLL_INTERVAL};
use crate::time::{DurationExt, LyricOffset};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyriclipConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub lyrics: LyricsConfig,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub demo: DemoConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// How often to poll the player, in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis_u64()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsConfig {
    /// Shift applied to the playback position, in milliseconds (can be negative)
    #[serde(default)]
    pub offset_ms: i64,
    /// Give up on a lyrics request after this many seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

const fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}

impl Default for LyricsConfig {
    fn default() -> Self {
        Self {
            offset_ms: 0,
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_demo_artist")]
    pub artist: String,
    #[serde(default = "default_demo_title")]
    pub title: String,
}

fn default_demo_artist() -> String {
    "Rick Astley".to_string()
}

fn default_demo_title() -> String {
    "Never Gonna Give You Up".to_string()
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            artist: default_demo_artist(),
            title: default_demo_title(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to ~/.config/lyriclip/lyriclip.log
    #[serde(default)]
    pub enabled: bool,
}

impl LyriclipConfig {
    /// Get the config file path (~/.config/lyriclip/config.toml)
    #[must_use]
    pub fn config_path() -> PathBuf {
        crate::paths::config_path()
    }

    /// Load config from `path` (or the default location), writing the
    /// template and falling back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, parsed, or holds invalid values.
    pub fn load_or_create(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map_or_else(Self::config_path, Path::to_path_buf);

        if !config_path.exists() {
            match write_template(&config_path) {
                Ok(()) => info!("Created config template at {}", config_path.display()),
                Err(e) => warn!("{e}"),
            }
            return Ok(Self::default());
        }

        info!("Loading config from {}", config_path.display());
        let content = fs::read_to_string(&config_path)?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML config document
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or holds invalid values.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;

        if config.general.poll_interval_ms == 0 {
            config.general.poll_interval_ms = default_poll_interval();
        }
        if config.lyrics.fetch_timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "lyrics.fetch_timeout_secs must be greater than 0".to_string(),
            });
        }

        Ok(config)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.general.poll_interval_ms)
    }

    #[must_use]
    pub const fn lyric_offset(&self) -> LyricOffset {
        LyricOffset::from_millis(self.lyrics.offset_ms)
    }

    #[must_use]
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.lyrics.fetch_timeout_secs)
    }

    #[must_use]
    pub fn demo_identity(&self) -> SongIdentity {
        SongIdentity::new(&self.demo.artist, &self.demo.title)
    }

    /// Build the runtime settings this config starts with
    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings::new(
            self.poll_interval(),
            self.lyric_offset(),
            self.clipboard.enabled,
        )
    }
}

fn write_template(path: &Path) -> Result<()> {
    let to_error = |source| CoreError::ConfigTemplateWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_error)?;
    }
    fs::write(path, CONFIG_TEMPLATE).map_err(to_error)
}

pub const CONFIG_TEMPLATE: &str = r#"# Lyriclip Configuration
# ~/.config/lyriclip/config.toml

[general]
# How often the music player is polled, in milliseconds
poll_interval_ms = 300

[lyrics]
# Shift lyrics timing in milliseconds: positive shows lines earlier,
# negative shows them later
offset_ms = 0
# Give up on a lyrics request after this many seconds
fetch_timeout_secs = 10

[clipboard]
# Copy each new lyric line to the clipboard
enabled = true

[demo]
# Song simulated by --demo
artist = "Rick Astley"
title = "Never Gonna Give You Up"

[logging]
# Also write logs to ~/.config/lyriclip/lyriclip.log
enabled = false
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parses_to_defaults() {
        let config = LyriclipConfig::parse(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, LyriclipConfig::default());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = LyriclipConfig::parse("").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(300));
        assert_eq!(config.lyric_offset(), LyricOffset::ZERO);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert!(config.clipboard.enabled);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_partial_sections() {
        let config = LyriclipConfig::parse(
            r"
[lyrics]
offset_ms = -1500

[clipboard]
enabled = false
",
        )
        .unwrap();
        assert_eq!(config.lyric_offset().as_millis(), -1500);
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
        assert!(!config.clipboard.enabled);
        assert_eq!(config.general.poll_interval_ms, 300);
    }

    #[test]
    fn test_zero_poll_interval_replaced() {
        let config = LyriclipConfig::parse("[general]\npoll_interval_ms = 0\n").unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(300));
    }

    #[test]
    fn test_zero_fetch_timeout_rejected() {
        let err = LyriclipConfig::parse("[lyrics]\nfetch_timeout_secs = 0\n").unwrap_err();
        assert!(matches!(err, CoreError::ConfigInvalid { .. }));
    }

    #[test]
    fn test_malformed_toml() {
        let err = LyriclipConfig::parse("[general\npoll_interval_ms = ").unwrap_err();
        assert!(matches!(err, CoreError::ConfigParseError(_)));
    }

    #[test]
    fn test_settings_from_config() {
        let config = LyriclipConfig::parse(
            "[general]\npoll_interval_ms = 150\n[lyrics]\noffset_ms = 250\n[clipboard]\nenabled = false\n",
        )
        .unwrap();
        let settings = config.settings();
        assert_eq!(settings.poll_interval(), Duration::from_millis(150));
        assert_eq!(settings.lyric_offset().as_millis(), 250);
        assert!(!settings.clipboard_enabled());
    }

    #[test]
    fn test_demo_identity() {
        let config = LyriclipConfig::default();
        assert_eq!(
            config.demo_identity(),
            SongIdentity::new("Rick Astley", "Never Gonna Give You Up")
        );
    }

    #[test]
    fn test_load_or_create_writes_template() {
        let dir = std::env::temp_dir().join(format!("lyriclip-config-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = fs::remove_dir_all(&dir);

        let config = LyriclipConfig::load_or_create(Some(&path)).unwrap();
        assert_eq!(config, LyriclipConfig::default());
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);

        fs::write(&path, "[lyrics]\noffset_ms = 700\n").unwrap();
        let reloaded = LyriclipConfig::load_or_create(Some(&path)).unwrap();
        assert_eq!(reloaded.lyrics.offset_ms, 700);

        let _ = fs::remove_dir_all(&dir);
    }
}
