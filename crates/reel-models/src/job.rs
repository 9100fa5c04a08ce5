//! Render job definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::{Scene, TrackVolumes};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reasons a render job cannot start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobValidationError {
    #[error("no scenes to render")]
    NoScenes,

    #[error("narration audio is required")]
    NoNarration,
}

/// Everything needed to render one video.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderJob {
    pub id: JobId,
    pub scenes: Vec<Scene>,
    pub narration_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgm_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sfx_url: Option<String>,
    #[serde(default)]
    pub volumes: TrackVolumes,
    /// Script text attached to the uploaded video as metadata
    #[serde(default)]
    pub script_text: String,
    pub created_at: DateTime<Utc>,
}

impl RenderJob {
    pub fn new(scenes: Vec<Scene>, narration_url: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            scenes,
            narration_url: narration_url.into(),
            bgm_url: None,
            sfx_url: None,
            volumes: TrackVolumes::default(),
            script_text: String::new(),
            created_at: Utc::now(),
        }
    }

    /// Attach background music. Empty URLs (the `None` selection) are ignored.
    pub fn with_bgm(mut self, url: impl Into<String>) -> Self {
        self.bgm_url = non_empty(url.into());
        self
    }

    /// Attach a sound-effects bed. Empty URLs are ignored.
    pub fn with_sfx(mut self, url: impl Into<String>) -> Self {
        self.sfx_url = non_empty(url.into());
        self
    }

    pub fn with_volumes(mut self, volumes: TrackVolumes) -> Self {
        self.volumes = volumes;
        self
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script_text = script.into();
        self
    }

    pub fn validate(&self) -> Result<(), JobValidationError> {
        if self.scenes.is_empty() {
            return Err(JobValidationError::NoScenes);
        }
        if self.narration_url.trim().is_empty() {
            return Err(JobValidationError::NoNarration);
        }
        Ok(())
    }
}

fn non_empty(url: String) -> Option<String> {
    if url.trim().is_empty() {
        None
    } else {
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_generation() {
        let id1 = JobId::new();
        let id2 = JobId::new();
        assert_ne!(id1, id2);
        assert_eq!(JobId::from_string("abc").to_string(), "abc");
    }

    #[test]
    fn test_validation() {
        let job = RenderJob::new(vec![], "https://cdn/n.wav");
        assert_eq!(job.validate(), Err(JobValidationError::NoScenes));

        let job = RenderJob::new(vec![Scene::image("a")], " ");
        assert_eq!(job.validate(), Err(JobValidationError::NoNarration));

        let job = RenderJob::new(vec![Scene::image("a")], "https://cdn/n.wav");
        assert!(job.validate().is_ok());
    }

    #[test]
    fn test_placeholder_tracks_ignored() {
        let job = RenderJob::new(vec![Scene::image("a")], "n")
            .with_bgm("")
            .with_sfx("https://cdn/rain.wav");
        assert!(job.bgm_url.is_none());
        assert_eq!(job.sfx_url.as_deref(), Some("https://cdn/rain.wav"));
    }
}
