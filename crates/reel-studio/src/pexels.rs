//! Pexels stock photo and video search.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use reel_models::Scene;

use crate::acquire::AcquireError;
use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};

/// Pexels API client.
pub struct PexelsClient {
    api_key: String,
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct PhotoSearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    large2x: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoSearchResponse {
    #[serde(default)]
    videos: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct Video {
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    video_files: Vec<VideoFile>,
    #[serde(default)]
    video_pictures: Vec<VideoPicture>,
}

#[derive(Debug, Deserialize)]
struct VideoFile {
    #[serde(default)]
    quality: Option<String>,
    link: String,
}

#[derive(Debug, Deserialize)]
struct VideoPicture {
    picture: String,
}

impl Video {
    /// HD rendition when present, else the first file.
    fn into_scene(self) -> Option<Scene> {
        let file = self
            .video_files
            .iter()
            .find(|f| f.quality.as_deref() == Some("hd"))
            .or_else(|| self.video_files.first())?;

        let mut scene = Scene::video(file.link.clone());
        if let Some(picture) = self.video_pictures.first() {
            scene = scene.with_thumbnail(picture.picture.clone());
        }
        if let Some(duration) = self.duration {
            scene = scene.with_duration(duration);
        }
        Some(scene)
    }
}

impl PexelsClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    /// Build a client from studio configuration. Requires `PEXELS_API_KEY`.
    pub fn from_config(config: &StudioConfig) -> StudioResult<Self> {
        let api_key = config
            .pexels_api_key
            .clone()
            .ok_or_else(|| StudioError::config_error("PEXELS_API_KEY not set"))?;
        Ok(Self::new(api_key, config.pexels_base_url.clone()))
    }

    async fn search<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &str,
    ) -> Result<T, AcquireError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), endpoint);
        debug!(endpoint = %endpoint, query = %query, "Searching Pexels");

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.api_key)
            .query(&[("query", query), ("per_page", "1"), ("orientation", "landscape")])
            .send()
            .await
            .map_err(|e| AcquireError::failed(format!("Pexels request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs);
            warn!(?retry_after, "Pexels rate limit hit");
            return Err(AcquireError::RateLimited { retry_after });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AcquireError::failed(format!("Pexels API error: {} {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AcquireError::failed(format!("Failed to parse Pexels response: {}", e)))
    }

    /// First landscape photo for `query`, at the `large2x` rendition.
    ///
    /// A hit without that rendition counts as no result.
    pub async fn search_photo(&self, query: &str) -> Result<Option<Scene>, AcquireError> {
        let results: PhotoSearchResponse = self.search("/search", query).await?;
        Ok(results
            .photos
            .into_iter()
            .next()
            .and_then(|p| p.src.large2x)
            .filter(|url| !url.trim().is_empty())
            .map(Scene::image))
    }

    /// First landscape video for `query`.
    pub async fn search_video(&self, query: &str) -> Result<Option<Scene>, AcquireError> {
        let results: VideoSearchResponse = self.search("/videos/search", query).await?;
        Ok(results.videos.into_iter().next().and_then(Video::into_scene))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reel_models::MediaKind;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_search_photo_picks_large2x() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(header("Authorization", "pexels-key"))
            .and(query_param("query", "a lion at sunrise"))
            .and(query_param("per_page", "1"))
            .and(query_param("orientation", "landscape"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "photos": [{ "src": { "original": "o.jpg", "large2x": "https://img/l2x.jpg" } }]
            })))
            .mount(&server)
            .await;

        let client = PexelsClient::new("pexels-key", server.uri());
        let scene = client.search_photo("a lion at sunrise").await.unwrap().unwrap();
        assert_eq!(scene.kind, MediaKind::Image);
        assert_eq!(scene.source_url, "https://img/l2x.jpg");
    }

    #[tokio::test]
    async fn test_photo_without_large2x_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "photos": [{ "src": { "original": "https://img/o.jpg", "medium": "https://img/m.jpg" } }]
            })))
            .mount(&server)
            .await;

        let client = PexelsClient::new("pexels-key", server.uri());
        assert!(client.search_photo("a lion at sunrise").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_search_video_prefers_hd_and_keeps_thumbnail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "videos": [{
                    "duration": 12,
                    "video_files": [
                        { "quality": "sd", "link": "https://v/sd.mp4" },
                        { "quality": "hd", "link": "https://v/hd.mp4" }
                    ],
                    "video_pictures": [{ "picture": "https://v/p0.jpg" }, { "picture": "https://v/p1.jpg" }]
                }]
            })))
            .mount(&server)
            .await;

        let client = PexelsClient::new("pexels-key", server.uri());
        let scene = client.search_video("waves").await.unwrap().unwrap();
        assert_eq!(scene.kind, MediaKind::Video);
        assert_eq!(scene.source_url, "https://v/hd.mp4");
        assert_eq!(scene.thumbnail_url.as_deref(), Some("https://v/p0.jpg"));
        assert_eq!(scene.duration_seconds, Some(12.0));
    }

    #[tokio::test]
    async fn test_search_video_falls_back_to_first_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "videos": [{ "video_files": [{ "quality": "sd", "link": "https://v/sd.mp4" }] }]
            })))
            .mount(&server)
            .await;

        let client = PexelsClient::new("pexels-key", server.uri());
        let scene = client.search_video("waves").await.unwrap().unwrap();
        assert_eq!(scene.source_url, "https://v/sd.mp4");
        assert!(scene.thumbnail_url.is_none());
    }

    #[tokio::test]
    async fn test_empty_results_yield_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "photos": [] })))
            .mount(&server)
            .await;

        let client = PexelsClient::new("pexels-key", server.uri());
        assert!(client.search_photo("nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = PexelsClient::new("pexels-key", server.uri());
        let err = client.search_photo("lion").await.unwrap_err();
        assert!(matches!(err, AcquireError::RateLimited { retry_after: None }));
    }

    #[tokio::test]
    async fn test_server_error_is_generic() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = PexelsClient::new("pexels-key", server.uri());
        let err = client.search_video("lion").await.unwrap_err();
        assert!(matches!(err, AcquireError::Failed(_)));
    }
}
