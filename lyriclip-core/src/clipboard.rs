use crate::error::Result;
use async_trait::async_trait;

/// Destination for emitted lyric lines
#[async_trait]
pub trait ClipboardSink: Send + Sync {
    /// Backend name for log output
    fn name(&self) -> &'static str;

    /// Replace the clipboard contents with `text`
    ///
    /// # Errors
    ///
    /// Returns an error if the clipboard could not be written.
    async fn write(&self, text: &str) -> Result<()>;
}
