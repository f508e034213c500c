use async_trait::async_trait;
use lyriclip_core::{ClipboardSink, CoreError, Result};
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

use crate::command::find_in;

/// Clipboard tools in order of preference, with the arguments that make them read stdin
const BACKENDS: &[(&str, &[&str])] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
    ("pbcopy", &[]),
    ("clip.exe", &[]),
];

/// Writes the clipboard by piping text into a platform clipboard tool
#[derive(Debug)]
pub struct CommandClipboard {
    name: &'static str,
    program: PathBuf,
    args: &'static [&'static str],
}

impl CommandClipboard {
    /// Pick the first clipboard tool found on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ClipboardUnavailable`] if none of the supported tools is installed.
    pub fn detect() -> Result<Self> {
        let clipboard = Self::detect_in(std::env::var_os("PATH").as_deref())?;
        info!(
            "Using {} for clipboard writes",
            clipboard.program.display()
        );
        Ok(clipboard)
    }

    fn detect_in(path_var: Option<&OsStr>) -> Result<Self> {
        BACKENDS
            .iter()
            .find_map(|&(name, args)| {
                find_in(name, path_var).map(|program| Self {
                    name,
                    program,
                    args,
                })
            })
            .ok_or_else(|| CoreError::ClipboardUnavailable {
                reason: format!(
                    "none of {} found on PATH",
                    BACKENDS
                        .iter()
                        .map(|(name, _)| *name)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }

    fn failure(&self, reason: impl Into<String>) -> CoreError {
        CoreError::ClipboardWriteFailed {
            backend: self.name.to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ClipboardSink for CommandClipboard {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn write(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.failure(format!("failed to start: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.failure("stdin not captured"))?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| self.failure(format!("failed to write: {e}")))?;
        // Close stdin so the tool sees end of input
        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|e| self.failure(format!("failed to wait: {e}")))?;
        if status.success() {
            Ok(())
        } else {
            Err(self.failure(format!("exited with {status}")))
        }
    }
}

/// Stands in when no clipboard tool exists and clipboard updates start disabled
#[derive(Debug)]
pub struct UnavailableClipboard {
    reason: String,
}

#[async_trait]
impl ClipboardSink for UnavailableClipboard {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn write(&self, _text: &str) -> Result<()> {
        Err(CoreError::ClipboardUnavailable {
            reason: self.reason.clone(),
        })
    }
}

/// Choose the clipboard sink. A missing clipboard tool is fatal only when
/// clipboard updates are enabled at startup.
///
/// # Errors
///
/// Returns the detection error if clipboard updates are enabled.
pub fn select_sink(
    detected: Result<CommandClipboard>,
    enabled: bool,
) -> Result<Box<dyn ClipboardSink>> {
    match detected {
        Ok(clipboard) => Ok(Box::new(clipboard)),
        Err(CoreError::ClipboardUnavailable { reason }) if !enabled => {
            warn!("No clipboard tool available ({reason}); lines will only be logged");
            Ok(Box::new(UnavailableClipboard { reason }))
        }
        Err(e) => Err(e),
    }
}
