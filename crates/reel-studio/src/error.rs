//! Studio error types.

use std::time::Duration;

use thiserror::Error;

use crate::render::RenderStage;

pub type StudioResult<T> = Result<T, StudioError>;

fn retry_hint(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs().max(1)),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("{0}")]
    EmptyInput(String),

    #[error("{0}")]
    NoResults(String),

    #[error("API rate limit exceeded{}. Generation has been stopped; wait a minute and try again.", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    #[error("Media engine is not loaded yet")]
    EngineNotReady,

    #[error("Video rendering failed during {stage}: {message}")]
    StageFailure { stage: RenderStage, message: String },

    #[error("Media engine returned unexpected data type for video")]
    UnsupportedOutputType,

    #[error("Generate scenes and provide narration audio before playing")]
    PreviewNotReady,

    #[error("A render is already in progress")]
    RenderInProgress,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("AI request failed: {0}")]
    AiFailed(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Playback failed: {0}")]
    Playback(String),

    #[error("Audio encoding failed: {0}")]
    Audio(#[from] hound::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] reel_storage::StorageError),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StudioError {
    pub fn empty_input(msg: impl Into<String>) -> Self {
        Self::EmptyInput(msg.into())
    }

    pub fn no_results(msg: impl Into<String>) -> Self {
        Self::NoResults(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn ai_failed(msg: impl Into<String>) -> Self {
        Self::AiFailed(msg.into())
    }

    pub fn fetch_failed(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn stage_failure(stage: RenderStage, msg: impl Into<String>) -> Self {
        Self::StageFailure {
            stage,
            message: msg.into(),
        }
    }

    /// Whether this is a rate-limit signal from an upstream API.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StudioError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failure_message_keeps_engine_text() {
        let err = StudioError::stage_failure(RenderStage::Muxing, "Invalid data found when processing input");
        assert_eq!(
            err.to_string(),
            "Video rendering failed during muxing: Invalid data found when processing input"
        );
    }

    #[test]
    fn test_rate_limit_message() {
        let err = StudioError::RateLimited {
            retry_after: Some(Duration::from_secs(17)),
        };
        assert!(err.to_string().contains("(retry after 17s)"));
        assert!(err.is_rate_limited());

        let err = StudioError::RateLimited { retry_after: None };
        assert!(err.to_string().starts_with("API rate limit exceeded. "));
    }
}
