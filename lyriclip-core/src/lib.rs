pub mod cache;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod lrc;
pub mod paths;
pub mod playback;
pub mod provider;
pub mod scheduler;
pub mod settings;
pub mod source;
pub mod time;
pub mod tracker;

pub use cache::LyricsCache;
pub use clipboard::ClipboardSink;
pub use config::{
    ClipboardConfig, DemoConfig, GeneralConfig, LoggingConfig, LyricsConfig, LyriclipConfig,
    CONFIG_TEMPLATE,
};
pub use error::{CoreError, ParseError, Result};
pub use fetcher::{LyricsFetcher, DEFAULT_FETCH_TIMEOUT};
pub use lrc::{LyricLine, LyricTimeline};
pub use paths::{config_dir, config_path, log_file_path, CONFIG_DIR_NAME, CONFIG_FILE_NAME};
pub use playback::{LyricEmission, PlaybackSample, SongIdentity};
pub use provider::{FetchedLyrics, LyricsProvider, LyricsQuery};
pub use scheduler::{Scheduler, SchedulerHandle};
pub use settings::{Settings, DEFAULT_POLL_INTERVAL};
pub use source::{DemoDetector, PlaybackDetector};
pub use time::{format_position, DurationExt, LyricOffset};
pub use tracker::{PlaybackTracker, TrackerStatus};
