//! Shared data models for Reel Studio.
//!
//! This crate provides Serde-serializable types for:
//! - Scenes and the media sources that produce them
//! - Speakers and TTS voice assignment
//! - Audio tracks, volumes and sample libraries
//! - Render jobs and encoding configuration
//! - Durable asset kinds

pub mod asset;
pub mod audio;
pub mod encoding;
pub mod job;
pub mod scene;
pub mod speaker;

// Re-export common types
pub use asset::{AssetKind, StoredAsset};
pub use audio::{AudioAsset, TrackKind, TrackVolumes, Volume};
pub use encoding::EncodingConfig;
pub use job::{JobId, JobValidationError, RenderJob};
pub use scene::{MediaKind, MediaSource, Scene, DEFAULT_SCENE_DURATION_SECS};
pub use speaker::{
    speaker_labels, Speaker, SpeakerRoster, VoiceAssignment, PREFERRED_VOICES, TTS_VOICES,
};
