use clap::Parser;
use lyriclip_core::LyriclipConfig;
use std::path::PathBuf;

/// Keeps the currently playing lyric line on your clipboard
#[derive(Debug, Parser)]
#[command(name = "lyriclip", version, about)]
pub struct Cli {
    /// Config file to use instead of ~/.config/lyriclip/config.toml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Simulate a song instead of reading the system player
    #[arg(long)]
    pub demo: bool,

    /// Artist of the simulated song
    #[arg(long, requires = "demo")]
    pub artist: Option<String>,

    /// Title of the simulated song
    #[arg(long, requires = "demo")]
    pub title: Option<String>,

    /// Lyric offset in milliseconds (positive shows lines earlier)
    #[arg(long, value_name = "MS", allow_negative_numbers = true)]
    pub offset_ms: Option<i64>,

    /// Player poll interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Start with clipboard updates turned off
    #[arg(long)]
    pub no_clipboard: bool,
}

impl Cli {
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(LyriclipConfig::config_path)
    }

    /// Apply command-line values on top of the loaded config
    pub fn apply_overrides(&self, config: &mut LyriclipConfig) {
        if let Some(artist) = &self.artist {
            config.demo.artist.clone_from(artist);
        }
        if let Some(title) = &self.title {
            config.demo.title.clone_from(title);
        }
        if let Some(offset_ms) = self.offset_ms {
            config.lyrics.offset_ms = offset_ms;
        }
        if let Some(interval) = self.poll_interval_ms.filter(|ms| *ms > 0) {
            config.general.poll_interval_ms = interval;
        }
        if self.no_clipboard {
            config.clipboard.enabled = false;
        }
    }
}
