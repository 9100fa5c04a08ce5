//! Visual scenes and the sources that produce them.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Timeline duration for images and for videos that report no duration.
pub const DEFAULT_SCENE_DURATION_SECS: f64 = 5.0;

/// Kind of visual asset backing a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// File extension used when the asset is written to engine storage.
    pub fn file_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "png",
            MediaKind::Video => "mp4",
        }
    }
}

/// One visual scene in the slideshow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Scene {
    pub kind: MediaKind,
    /// Where the asset can be fetched from (http(s) or `data:` URL)
    pub source_url: String,
    /// Poster frame for video scenes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Source-reported duration (videos only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl Scene {
    /// Create an image scene.
    pub fn image(source_url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            source_url: source_url.into(),
            thumbnail_url: None,
            duration_seconds: None,
        }
    }

    /// Create a video scene.
    pub fn video(source_url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            source_url: source_url.into(),
            thumbnail_url: None,
            duration_seconds: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail_url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(thumbnail_url.into());
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    /// Duration this scene occupies on the rendered timeline.
    ///
    /// Images always use `default_secs`. Videos use their declared duration
    /// when it is a positive, finite number.
    pub fn timeline_duration(&self, default_secs: f64) -> f64 {
        match (self.kind, self.duration_seconds) {
            (MediaKind::Video, Some(d)) if d.is_finite() && d > 0.0 => d,
            _ => default_secs,
        }
    }

    /// Still image to show for this scene (thumbnail if any, else the source).
    pub fn still_url(&self) -> &str {
        self.thumbnail_url.as_deref().unwrap_or(&self.source_url)
    }

    /// Working-storage file name for the scene at `index`.
    pub fn input_file_name(&self, index: usize) -> String {
        format!("input_{}.{}", index, self.kind.file_extension())
    }
}

/// Where scene visuals come from. Chosen once before a run starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaSource {
    /// Generative AI images
    #[default]
    AiImage,
    /// Stock photo search
    StockPhoto,
    /// Stock video search
    StockVideo,
}

impl MediaSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaSource::AiImage => "ai_image",
            MediaSource::StockPhoto => "stock_photo",
            MediaSource::StockVideo => "stock_video",
        }
    }

    pub fn is_generative(&self) -> bool {
        matches!(self, MediaSource::AiImage)
    }

    /// Default delay between consecutive acquisition calls.
    pub fn default_pacing(&self) -> Duration {
        if self.is_generative() {
            Duration::from_secs(12)
        } else {
            Duration::from_millis(3500)
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "ai" | "ai_image" => Ok(MediaSource::AiImage),
            "stock_photo" | "photo" => Ok(MediaSource::StockPhoto),
            "stock_video" | "video" => Ok(MediaSource::StockVideo),
            other => Err(format!("unknown media source: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_duration() {
        assert_eq!(Scene::image("a.png").timeline_duration(5.0), 5.0);
        assert_eq!(Scene::image("a.png").with_duration(9.0).timeline_duration(5.0), 5.0);
        assert_eq!(Scene::video("a.mp4").timeline_duration(5.0), 5.0);
        assert_eq!(Scene::video("a.mp4").with_duration(7.5).timeline_duration(5.0), 7.5);
        assert_eq!(Scene::video("a.mp4").with_duration(0.0).timeline_duration(5.0), 5.0);
    }

    #[test]
    fn test_input_file_names() {
        assert_eq!(Scene::image("x").input_file_name(0), "input_0.png");
        assert_eq!(Scene::video("x").input_file_name(3), "input_3.mp4");
    }

    #[test]
    fn test_pacing_is_longer_for_generative_source() {
        assert!(MediaSource::AiImage.default_pacing() > MediaSource::StockPhoto.default_pacing());
        assert_eq!(
            MediaSource::StockPhoto.default_pacing(),
            MediaSource::StockVideo.default_pacing()
        );
    }

    #[test]
    fn test_media_source_parse() {
        assert_eq!("ai".parse::<MediaSource>().unwrap(), MediaSource::AiImage);
        assert_eq!("stock-video".parse::<MediaSource>().unwrap(), MediaSource::StockVideo);
        assert!("tape".parse::<MediaSource>().is_err());
    }

    #[test]
    fn test_scene_serialization() {
        let scene = Scene::video("https://cdn/v.mp4").with_thumbnail("https://cdn/v.jpg");
        let json = serde_json::to_value(&scene).unwrap();
        assert_eq!(json["kind"], "video");
        assert!(json.get("duration_seconds").is_none());
        assert_eq!(scene.still_url(), "https://cdn/v.jpg");
    }
}
