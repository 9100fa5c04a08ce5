//! Paced scene acquisition.
//!
//! Prompts are acquired strictly in order with a fixed delay between calls.
//! Scenes gathered before a failure are kept and handed back with the error.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::Instrument;

use reel_models::Scene;

use crate::acquire::{AcquireError, MediaAcquirer, PromptDecomposer};
use crate::error::StudioError;
use crate::logging::JobLogger;

/// A failed run together with the scenes acquired before it stopped.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct SceneGenerationError {
    pub scenes: Vec<Scene>,
    #[source]
    pub error: StudioError,
}

impl SceneGenerationError {
    fn new(scenes: Vec<Scene>, error: StudioError) -> Self {
        Self { scenes, error }
    }
}

/// Turns a script into an ordered scene sequence.
pub struct SceneOrchestrator {
    decomposer: Arc<dyn PromptDecomposer>,
    acquirer: Arc<dyn MediaAcquirer>,
    pacing: Duration,
    publisher: Arc<watch::Sender<Vec<Scene>>>,
}

impl SceneOrchestrator {
    pub fn new(
        decomposer: Arc<dyn PromptDecomposer>,
        acquirer: Arc<dyn MediaAcquirer>,
        pacing: Duration,
    ) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            decomposer,
            acquirer,
            pacing,
            publisher: Arc::new(tx),
        }
    }

    /// Publish the growing sequence on an existing channel.
    pub fn with_publisher(mut self, publisher: Arc<watch::Sender<Vec<Scene>>>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Observe the sequence as scenes are appended.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Scene>> {
        self.publisher.subscribe()
    }

    pub fn pacing(&self) -> Duration {
        self.pacing
    }

    /// Generate one scene per prompt decomposed from `script`.
    ///
    /// Dropping the returned future abandons the run; scenes already
    /// published stay visible to subscribers.
    pub async fn generate_scenes(&self, script: &str) -> Result<Vec<Scene>, SceneGenerationError> {
        let logger = JobLogger::fresh("generate_scenes");
        let span = logger.create_span();
        self.run(script, &logger).instrument(span).await
    }

    async fn run(&self, script: &str, logger: &JobLogger) -> Result<Vec<Scene>, SceneGenerationError> {
        if script.trim().is_empty() {
            return Err(SceneGenerationError::new(
                Vec::new(),
                StudioError::empty_input("Please enter a script to generate scenes"),
            ));
        }

        self.publisher.send_replace(Vec::new());
        let source = self.acquirer.source();
        logger.log_start(&format!("source={}", source));

        let prompts = self
            .decomposer
            .decompose(script)
            .await
            .map_err(|e| SceneGenerationError::new(Vec::new(), e.into()))?;

        if prompts.is_empty() {
            return Err(SceneGenerationError::new(
                Vec::new(),
                StudioError::no_results("No scene prompts could be generated from the script"),
            ));
        }
        logger.log_progress(&format!("{} scene prompts", prompts.len()));

        let mut scenes = Vec::with_capacity(prompts.len());
        for (index, prompt) in prompts.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pacing).await;
            }

            match self.acquirer.acquire(prompt).await {
                Ok(Some(scene)) => {
                    scenes.push(scene);
                    self.publisher.send_replace(scenes.clone());
                    crate::metrics::record_scene_acquired(source.as_str());
                    logger.log_progress(&format!("scene {}/{} acquired", index + 1, prompts.len()));
                }
                Ok(None) => {
                    crate::metrics::record_scene_skipped(source.as_str());
                    logger.log_warning(&format!(
                        "no usable media for prompt {}: {}",
                        index + 1,
                        prompt
                    ));
                }
                Err(AcquireError::RateLimited { retry_after }) => {
                    crate::metrics::record_rate_limit_abort(source.as_str());
                    logger.log_error(&format!(
                        "rate limited at prompt {}, keeping {} scenes",
                        index + 1,
                        scenes.len()
                    ));
                    return Err(SceneGenerationError::new(
                        scenes,
                        StudioError::RateLimited { retry_after },
                    ));
                }
                Err(AcquireError::Failed(message)) => {
                    logger.log_error(&format!("prompt {} failed: {}", index + 1, message));
                    return Err(SceneGenerationError::new(scenes, StudioError::AiFailed(message)));
                }
            }
        }

        if scenes.is_empty() {
            return Err(SceneGenerationError::new(
                scenes,
                StudioError::no_results("No media could be found for any scene"),
            ));
        }

        logger.log_completion(&format!("{} of {} scenes", scenes.len(), prompts.len()));
        Ok(scenes)
    }
}
