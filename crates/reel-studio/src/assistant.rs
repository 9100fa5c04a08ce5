//! Text and audio generation seams used by the studio session.

use async_trait::async_trait;
use base64::Engine as _;

use reel_models::VoiceAssignment;

use crate::error::StudioResult;

/// Audio bytes produced by synthesis, with their container type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl SynthesizedAudio {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Inline `data:` URL playable by the preview and fetchable by the renderer.
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Opaque script transforms backed by a text model.
#[async_trait]
pub trait ScriptAssistant: Send + Sync {
    async fn enhance_script(&self, script: &str) -> StudioResult<String>;

    async fn write_script(&self, topic: &str) -> StudioResult<String>;

    async fn generate_title(&self, script: &str) -> StudioResult<String>;

    /// Speaker-labelled transcript with inline bracket tags.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> StudioResult<String>;
}

/// Speech and instrumental audio synthesis.
#[async_trait]
pub trait AudioSynthesizer: Send + Sync {
    /// Multi-speaker synthesis needs a speaker name on every assignment.
    async fn synthesize_speech(
        &self,
        text: &str,
        voices: &[VoiceAssignment],
    ) -> StudioResult<SynthesizedAudio>;

    async fn synthesize_instrumental(&self, prompt: &str) -> StudioResult<SynthesizedAudio>;
}
