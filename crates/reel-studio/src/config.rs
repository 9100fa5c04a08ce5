//! Studio configuration.

use std::time::Duration;

use reel_models::{MediaSource, DEFAULT_SCENE_DURATION_SECS};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_PEXELS_BASE_URL: &str = "https://api.pexels.com/v1";

/// Studio configuration.
#[derive(Clone)]
pub struct StudioConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    /// Model for prompts, scripts, titles and transcription
    pub text_model: String,
    pub image_model: String,
    pub tts_model: String,
    pub pexels_api_key: Option<String>,
    pub pexels_base_url: String,
    /// Delay between generative image requests
    pub ai_pacing: Duration,
    /// Delay between stock search requests
    pub stock_pacing: Duration,
    /// Slideshow preview period
    pub preview_interval: Duration,
    /// Timeline duration of images and of videos without a duration
    pub default_scene_secs: f64,
    /// Working directory of the media engine
    pub work_dir: String,
    pub ffmpeg_timeout: Option<Duration>,
    /// Font file for thumbnail titles
    pub title_font_file: Option<String>,
    pub metrics_enabled: bool,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            text_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            tts_model: "gemini-2.5-flash-preview-tts".to_string(),
            pexels_api_key: None,
            pexels_base_url: DEFAULT_PEXELS_BASE_URL.to_string(),
            ai_pacing: MediaSource::AiImage.default_pacing(),
            stock_pacing: MediaSource::StockPhoto.default_pacing(),
            preview_interval: Duration::from_secs(5),
            default_scene_secs: DEFAULT_SCENE_DURATION_SECS,
            work_dir: "/tmp/reel".to_string(),
            ffmpeg_timeout: None,
            title_font_file: None,
            metrics_enabled: false,
        }
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for StudioConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudioConfig")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<set>"))
            .field("text_model", &self.text_model)
            .field("image_model", &self.image_model)
            .field("tts_model", &self.tts_model)
            .field("pexels_api_key", &self.pexels_api_key.as_ref().map(|_| "<set>"))
            .field("ai_pacing", &self.ai_pacing)
            .field("stock_pacing", &self.stock_pacing)
            .field("preview_interval", &self.preview_interval)
            .field("default_scene_secs", &self.default_scene_secs)
            .field("work_dir", &self.work_dir)
            .field("ffmpeg_timeout", &self.ffmpeg_timeout)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn env_millis(name: &str) -> Option<Duration> {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
}

impl StudioConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            gemini_api_key: env_string("GEMINI_API_KEY"),
            gemini_base_url: env_string("GEMINI_BASE_URL").unwrap_or(defaults.gemini_base_url),
            text_model: env_string("GEMINI_TEXT_MODEL").unwrap_or(defaults.text_model),
            image_model: env_string("GEMINI_IMAGE_MODEL").unwrap_or(defaults.image_model),
            tts_model: env_string("GEMINI_TTS_MODEL").unwrap_or(defaults.tts_model),
            pexels_api_key: env_string("PEXELS_API_KEY"),
            pexels_base_url: env_string("PEXELS_BASE_URL").unwrap_or(defaults.pexels_base_url),
            ai_pacing: env_millis("REEL_AI_PACING_MS").unwrap_or(defaults.ai_pacing),
            stock_pacing: env_millis("REEL_STOCK_PACING_MS").unwrap_or(defaults.stock_pacing),
            preview_interval: env_millis("REEL_PREVIEW_INTERVAL_MS")
                .unwrap_or(defaults.preview_interval),
            default_scene_secs: std::env::var("REEL_SCENE_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|s: &f64| s.is_finite() && *s > 0.0)
                .unwrap_or(defaults.default_scene_secs),
            work_dir: env_string("REEL_WORK_DIR").unwrap_or(defaults.work_dir),
            ffmpeg_timeout: std::env::var("REEL_FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            title_font_file: env_string("REEL_TITLE_FONT"),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(false),
        }
    }

    /// Delay between consecutive acquisition calls for `source`.
    pub fn pacing_for(&self, source: MediaSource) -> Duration {
        if source.is_generative() {
            self.ai_pacing
        } else {
            self.stock_pacing
        }
    }
}
