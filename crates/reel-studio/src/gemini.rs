//! Gemini API client for scene prompts, images, speech and script tools.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use regex::Regex;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use reel_models::VoiceAssignment;

use crate::acquire::{AcquireError, PromptDecomposer};
use crate::assistant::{AudioSynthesizer, ScriptAssistant, SynthesizedAudio};
use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::prompts;
use crate::wav;

/// Errors from the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Gemini rate limit exceeded: {message}")]
    RateLimited {
        retry_after: Option<Duration>,
        message: String,
    },

    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Gemini API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid Gemini response: {0}")]
    InvalidResponse(String),

    #[error("Invalid Gemini request: {0}")]
    InvalidRequest(String),
}

impl From<GeminiError> for AcquireError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::RateLimited { retry_after, .. } => AcquireError::RateLimited { retry_after },
            other => AcquireError::Failed(other.to_string()),
        }
    }
}

impl From<GeminiError> for StudioError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::RateLimited { retry_after, .. } => StudioError::RateLimited { retry_after },
            other => StudioError::AiFailed(other.to_string()),
        }
    }
}

/// Model names per capability.
#[derive(Debug, Clone)]
pub struct GeminiModels {
    pub text: String,
    pub image: String,
    pub tts: String,
}

impl Default for GeminiModels {
    fn default() -> Self {
        let config = StudioConfig::default();
        Self {
            text: config.text_model,
            image: config.image_model,
            tts: config.tts_model,
        }
    }
}

/// Gemini API client.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    models: GeminiModels,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part::text(text)],
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(bytes),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    speech_config: Option<SpeechConfig>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeechConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    voice_config: Option<VoiceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multi_speaker_voice_config: Option<MultiSpeakerVoiceConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceConfig {
    prebuilt_voice_config: PrebuiltVoiceConfig,
}

impl VoiceConfig {
    fn prebuilt(voice: &str) -> Self {
        Self {
            prebuilt_voice_config: PrebuiltVoiceConfig {
                voice_name: voice.to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PrebuiltVoiceConfig {
    voice_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MultiSpeakerVoiceConfig {
    speaker_voice_configs: Vec<SpeakerVoiceConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SpeakerVoiceConfig {
    speaker: String,
    voice_config: VoiceConfig,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

fn retry_delay_regex() -> &'static Regex {
    static RETRY_DELAY: OnceLock<Regex> = OnceLock::new();
    RETRY_DELAY.get_or_init(|| {
        Regex::new(r#""retryDelay"\s*:\s*"(\d+(?:\.\d+)?)s""#).expect("retry delay regex is valid")
    })
}

fn retry_after_header(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn retry_delay_from_body(body: &str) -> Option<Duration> {
    retry_delay_regex()
        .captures(body)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(Duration::from_secs_f64)
}

/// Strip markdown code fences the model sometimes wraps JSON in.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

/// Parse the decomposer's JSON array of prompts. Blank entries are dropped.
fn parse_prompts(text: &str) -> Result<Vec<String>, GeminiError> {
    let prompts: Vec<String> = serde_json::from_str(strip_code_fences(text)).map_err(|e| {
        GeminiError::InvalidResponse(format!(
            "AI failed to generate valid scene prompts in the expected format: {}",
            e
        ))
    })?;
    Ok(prompts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect())
}

fn speech_config(voices: &[VoiceAssignment]) -> Result<SpeechConfig, GeminiError> {
    match voices {
        [] => Err(GeminiError::InvalidRequest("no voice configured".into())),
        [single] => Ok(SpeechConfig {
            voice_config: Some(VoiceConfig::prebuilt(&single.voice)),
            multi_speaker_voice_config: None,
        }),
        many => {
            let configs = many
                .iter()
                .map(|v| {
                    let speaker = v.speaker.clone().ok_or_else(|| {
                        GeminiError::InvalidRequest(
                            "speaker name is required for each voice in multi-speaker speech".into(),
                        )
                    })?;
                    Ok(SpeakerVoiceConfig {
                        speaker,
                        voice_config: VoiceConfig::prebuilt(&v.voice),
                    })
                })
                .collect::<Result<Vec<_>, GeminiError>>()?;
            Ok(SpeechConfig {
                voice_config: None,
                multi_speaker_voice_config: Some(MultiSpeakerVoiceConfig {
                    speaker_voice_configs: configs,
                }),
            })
        }
    }
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            models: GeminiModels::default(),
            client: Client::new(),
        }
    }

    pub fn with_models(mut self, models: GeminiModels) -> Self {
        self.models = models;
        self
    }

    /// Build a client from studio configuration. Requires `GEMINI_API_KEY`.
    pub fn from_config(config: &StudioConfig) -> StudioResult<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or_else(|| StudioError::config_error("GEMINI_API_KEY not set"))?;

        Ok(Self::new(api_key, config.gemini_base_url.clone()).with_models(GeminiModels {
            text: config.text_model.clone(),
            image: config.image_model.clone(),
            tts: config.tts_model.clone(),
        }))
    }

    async fn generate(&self, model: &str, request: &GenerateRequest) -> Result<Vec<Part>, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );
        debug!(model = %model, "Calling Gemini");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let header_delay = retry_after_header(response.headers());
            let body = response.text().await.unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
                let retry_after = header_delay.or_else(|| retry_delay_from_body(&body));
                warn!(model = %model, ?retry_after, "Gemini rate limit hit");
                return Err(GeminiError::RateLimited {
                    retry_after,
                    message: body,
                });
            }

            return Err(GeminiError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::InvalidResponse(format!("Failed to parse Gemini response: {}", e)))?;

        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts)
            .unwrap_or_default())
    }

    async fn generate_text(
        &self,
        input: Content,
        system_instruction: Option<&str>,
        response_mime_type: Option<&str>,
    ) -> Result<String, GeminiError> {
        let request = GenerateRequest {
            contents: vec![input],
            system_instruction: system_instruction.map(Content::text),
            generation_config: response_mime_type.map(|mime| GenerationConfig {
                response_mime_type: Some(mime.to_string()),
                ..Default::default()
            }),
        };

        let text: String = self
            .generate(&self.models.text, &request)
            .await?
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        if text.trim().is_empty() {
            return Err(GeminiError::InvalidResponse("No content in Gemini response".into()));
        }
        Ok(text)
    }

    /// Ordered visual prompts for a narration script.
    pub async fn scene_prompts(&self, script: &str) -> Result<Vec<String>, GeminiError> {
        let text = self
            .generate_text(
                Content::text(script),
                Some(prompts::SCENE_PROMPTS_INSTRUCTION),
                Some("application/json"),
            )
            .await?;
        parse_prompts(&text)
    }

    /// Generate an image, returned as a `data:` URL.
    ///
    /// Returns `Ok(None)` when the response carries no image part.
    pub async fn generate_image(&self, prompt: &str) -> Result<Option<String>, GeminiError> {
        let request = GenerateRequest {
            contents: vec![Content::text(prompt)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                ..Default::default()
            }),
        };

        let parts = self.generate(&self.models.image, &request).await?;
        Ok(parts
            .into_iter()
            .find_map(|p| p.inline_data)
            .map(|d| format!("data:{};base64,{}", d.mime_type, d.data)))
    }

    async fn synthesize(&self, text: &str, speech: SpeechConfig) -> Result<SynthesizedAudio, GeminiError> {
        let request = GenerateRequest {
            contents: vec![Content::text(text)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["AUDIO".to_string()]),
                speech_config: Some(speech),
                ..Default::default()
            }),
        };

        let inline = self
            .generate(&self.models.tts, &request)
            .await?
            .into_iter()
            .find_map(|p| p.inline_data)
            .ok_or_else(|| GeminiError::InvalidResponse("speech synthesis returned no audio".into()))?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| GeminiError::InvalidResponse(format!("invalid audio payload: {}", e)))?;

        if wav::is_raw_pcm(&inline.mime_type) {
            let rate = wav::sample_rate_from_mime(&inline.mime_type);
            let wav_bytes = wav::pcm16_to_wav(&bytes, rate, 1)
                .map_err(|e| GeminiError::InvalidResponse(e.to_string()))?;
            return Ok(SynthesizedAudio::new(wav_bytes, "audio/wav"));
        }
        Ok(SynthesizedAudio::new(bytes, inline.mime_type))
    }
}

#[async_trait]
impl PromptDecomposer for GeminiClient {
    async fn decompose(&self, script: &str) -> Result<Vec<String>, AcquireError> {
        Ok(self.scene_prompts(script).await?)
    }
}

#[async_trait]
impl ScriptAssistant for GeminiClient {
    async fn enhance_script(&self, script: &str) -> StudioResult<String> {
        let text = self
            .generate_text(Content::text(script), Some(prompts::SCRIPT_ENHANCER_INSTRUCTION), None)
            .await?;
        Ok(text.trim().to_string())
    }

    async fn write_script(&self, topic: &str) -> StudioResult<String> {
        let text = self
            .generate_text(Content::text(topic), Some(prompts::SCRIPT_WRITER_INSTRUCTION), None)
            .await?;
        Ok(text.trim().to_string())
    }

    async fn generate_title(&self, script: &str) -> StudioResult<String> {
        let text = self
            .generate_text(Content::text(script), Some(prompts::TITLE_INSTRUCTION), None)
            .await?;
        Ok(text.trim().to_string())
    }

    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> StudioResult<String> {
        let input = Content {
            parts: vec![
                Part::inline(mime_type, audio),
                Part::text(prompts::TRANSCRIPTION_INSTRUCTION),
            ],
        };
        let text = self.generate_text(input, None, None).await?;
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl AudioSynthesizer for GeminiClient {
    async fn synthesize_speech(
        &self,
        text: &str,
        voices: &[VoiceAssignment],
    ) -> StudioResult<SynthesizedAudio> {
        let speech = speech_config(voices)?;
        Ok(self.synthesize(text, speech).await?)
    }

    async fn synthesize_instrumental(&self, prompt: &str) -> StudioResult<SynthesizedAudio> {
        let speech = SpeechConfig {
            voice_config: Some(VoiceConfig::prebuilt(prompts::SOUNDSCAPE_VOICE)),
            multi_speaker_voice_config: None,
        };
        Ok(self.synthesize(&prompts::soundscape_prompt(prompt), speech).await?)
    }
}
