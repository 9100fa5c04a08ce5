//! Narrated slideshow studio.
//!
//! This crate provides:
//! - Gemini and Pexels adapters for prompts, images, stock media and speech
//! - The paced scene orchestrator
//! - Audio track management and the slideshow preview clock
//! - The render pipeline and thumbnail composition
//! - The `Studio` session tying them together

pub mod acquire;
pub mod assistant;
pub mod audio_tracks;
pub mod config;
pub mod error;
pub mod fetch;
pub mod gemini;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod pexels;
pub mod preview;
pub mod prompts;
pub mod render;
pub mod studio;
pub mod thumbnail;
pub mod wav;

#[cfg(test)]
pub(crate) mod testing;

pub use acquire::{AcquireError, MediaAcquirer, PromptDecomposer};
pub use assistant::{AudioSynthesizer, ScriptAssistant, SynthesizedAudio};
pub use audio_tracks::{AudioOutput, AudioTrack, AudioTrackManager, SilentOutput};
pub use config::StudioConfig;
pub use error::{StudioError, StudioResult};
pub use fetch::{AssetFetcher, HttpFetcher};
pub use gemini::GeminiClient;
pub use logging::JobLogger;
pub use orchestrator::{SceneGenerationError, SceneOrchestrator};
pub use pexels::PexelsClient;
pub use preview::{PreviewState, PreviewSynchronizer, PreviewTick};
pub use render::{RenderOutput, RenderPipeline, RenderProgress, RenderStage};
pub use studio::{Studio, StudioServices};
