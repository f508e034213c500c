//! Line-based control console on stdin.
//!
//! Each command updates the shared [`Settings`]; the scheduler picks the new
//! values up on its next tick.

use lyriclip_core::{LyricOffset, SchedulerHandle, Settings, TrackerStatus};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const HELP: &str = "commands: offset <ms> | clipboard on|off | interval <ms> | status | help | quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Offset(LyricOffset),
    Clipboard(bool),
    Interval(Duration),
    Status,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for ConsoleCommand {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default().to_ascii_lowercase();
        let argument = words.next();

        match (command.as_str(), argument) {
            ("offset", Some(ms)) => ms
                .parse()
                .map(|ms| Self::Offset(LyricOffset::from_millis(ms)))
                .map_err(|_| CommandError::Usage("offset <milliseconds>, e.g. offset -500")),
            ("offset", None) => Err(CommandError::Usage("offset <milliseconds>, e.g. offset -500")),
            ("clipboard", Some("on")) => Ok(Self::Clipboard(true)),
            ("clipboard", Some("off")) => Ok(Self::Clipboard(false)),
            ("clipboard", _) => Err(CommandError::Usage("clipboard on|off")),
            ("interval", Some(ms)) => match ms.parse::<u64>() {
                Ok(ms) if ms > 0 => Ok(Self::Interval(Duration::from_millis(ms))),
                _ => Err(CommandError::Usage("interval <milliseconds greater than 0>")),
            },
            ("interval", None) => Err(CommandError::Usage("interval <milliseconds greater than 0>")),
            ("status", _) => Ok(Self::Status),
            ("help" | "?", _) => Ok(Self::Help),
            ("quit" | "exit", _) => Ok(Self::Quit),
            _ => Err(CommandError::Unknown(line.trim().to_string())),
        }
    }
}

impl ConsoleCommand {
    /// Carry out the command. Returns `false` when the console should stop.
    pub fn apply(
        self,
        settings: &Settings,
        handle: &SchedulerHandle,
        status: &watch::Receiver<TrackerStatus>,
    ) -> bool {
        match self {
            Self::Offset(offset) => settings.set_lyric_offset(offset),
            Self::Clipboard(enabled) => settings.set_clipboard_enabled(enabled),
            Self::Interval(interval) => settings.set_poll_interval(interval),
            Self::Status => {
                info!(
                    "{} (offset {}, clipboard {}, interval {}ms)",
                    *status.borrow(),
                    settings.lyric_offset(),
                    if settings.clipboard_enabled() { "on" } else { "off" },
                    settings.poll_interval().as_millis()
                );
            }
            Self::Help => info!("{}", HELP),
            Self::Quit => {
                handle.stop();
                return false;
            }
        }
        true
    }
}

/// Read commands from stdin until `quit`, end of input, or shutdown
pub async fn run(
    settings: Arc<Settings>,
    handle: SchedulerHandle,
    status: watch::Receiver<TrackerStatus>,
    cancel_token: CancellationToken,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            () = cancel_token.cancelled() => break,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) if line.trim().is_empty() => {}
            Ok(Some(line)) => match line.parse::<ConsoleCommand>() {
                Ok(command) => {
                    if !command.apply(&settings, &handle, &status) {
                        break;
                    }
                }
                Err(e) => warn!("{e} ({HELP})"),
            },
            Ok(None) => {
                debug!("Console input closed");
                break;
            }
            Err(e) => {
                warn!("Failed to read console input: {e}");
                break;
            }
        }
    }
}
