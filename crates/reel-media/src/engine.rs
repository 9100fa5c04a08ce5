//! Embedded media engine seam.

use async_trait::async_trait;

use crate::command::FfmpegCommand;
use crate::error::MediaResult;
use crate::progress::EngineEventSender;

/// Contents of a file read back from working storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileData {
    Binary(Vec<u8>),
    Text(String),
}

impl FileData {
    /// Bytes if this is binary data.
    pub fn into_binary(self) -> Option<Vec<u8>> {
        match self {
            FileData::Binary(bytes) => Some(bytes),
            FileData::Text(_) => None,
        }
    }
}

/// A media engine with a flat working namespace and FFmpeg-style commands.
///
/// The namespace is shared by every caller; only one render may use it at
/// a time.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    /// Whether the engine is loaded and can execute commands.
    fn is_ready(&self) -> bool;

    /// Remove every file from working storage.
    async fn reset(&self) -> MediaResult<()>;

    async fn write_file(&self, name: &str, data: &[u8]) -> MediaResult<()>;

    async fn read_file(&self, name: &str) -> MediaResult<FileData>;

    /// Run a command, streaming progress and log lines to `events`.
    async fn exec(
        &self,
        command: &FfmpegCommand,
        events: Option<&EngineEventSender>,
    ) -> MediaResult<()>;
}
