//! Media acquisition seams and the per-source acquirers.
//!
//! The orchestrator only sees `PromptDecomposer` and `MediaAcquirer`. Rate
//! limits are classified by the adapters and surface as
//! `AcquireError::RateLimited`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use reel_models::{MediaSource, Scene};

use crate::error::StudioError;
use crate::gemini::GeminiClient;
use crate::pexels::PexelsClient;
use crate::prompts::styled_image_prompt;

/// Failure from a decomposition or acquisition call.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("rate limited by upstream API")]
    RateLimited { retry_after: Option<Duration> },

    #[error("{0}")]
    Failed(String),
}

impl AcquireError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

impl From<AcquireError> for StudioError {
    fn from(err: AcquireError) -> Self {
        match err {
            AcquireError::RateLimited { retry_after } => StudioError::RateLimited { retry_after },
            AcquireError::Failed(message) => StudioError::AiFailed(message),
        }
    }
}

/// Turns a script into ordered visual prompts.
#[async_trait]
pub trait PromptDecomposer: Send + Sync {
    async fn decompose(&self, script: &str) -> Result<Vec<String>, AcquireError>;
}

/// Fetches one visual asset for a prompt.
///
/// `Ok(None)` means the call succeeded but produced nothing usable.
#[async_trait]
pub trait MediaAcquirer: Send + Sync {
    fn source(&self) -> MediaSource;

    async fn acquire(&self, prompt: &str) -> Result<Option<Scene>, AcquireError>;
}

/// Generative image scenes. Prompts get the cinematic style suffix.
pub struct AiImageAcquirer {
    client: Arc<GeminiClient>,
}

impl AiImageAcquirer {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaAcquirer for AiImageAcquirer {
    fn source(&self) -> MediaSource {
        MediaSource::AiImage
    }

    async fn acquire(&self, prompt: &str) -> Result<Option<Scene>, AcquireError> {
        let url = self.client.generate_image(&styled_image_prompt(prompt)).await?;
        Ok(url.map(Scene::image))
    }
}

pub struct StockPhotoAcquirer {
    client: Arc<PexelsClient>,
}

impl StockPhotoAcquirer {
    pub fn new(client: Arc<PexelsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaAcquirer for StockPhotoAcquirer {
    fn source(&self) -> MediaSource {
        MediaSource::StockPhoto
    }

    async fn acquire(&self, prompt: &str) -> Result<Option<Scene>, AcquireError> {
        self.client.search_photo(prompt).await
    }
}

pub struct StockVideoAcquirer {
    client: Arc<PexelsClient>,
}

impl StockVideoAcquirer {
    pub fn new(client: Arc<PexelsClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl MediaAcquirer for StockVideoAcquirer {
    fn source(&self) -> MediaSource {
        MediaSource::StockVideo
    }

    async fn acquire(&self, prompt: &str) -> Result<Option<Scene>, AcquireError> {
        self.client.search_video(prompt).await
    }
}
