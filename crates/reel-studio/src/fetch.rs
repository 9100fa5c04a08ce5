//! Asset fetching for render inputs and thumbnails.

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{StudioError, StudioResult};

/// Fetches the bytes behind a scene or audio URL.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> StudioResult<Vec<u8>>;
}

/// Fetcher for `http(s)` and inline `data:` URLs.
#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

/// Decode a `data:[<mime>][;base64],<payload>` URL.
pub fn decode_data_url(url: &str) -> StudioResult<Vec<u8>> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| StudioError::fetch_failed("not a data URL"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| StudioError::fetch_failed("malformed data URL"))?;

    if meta.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| StudioError::fetch_failed(format!("invalid base64 in data URL: {}", e)))
    } else {
        Ok(urlencoding::decode_binary(payload.as_bytes()).into_owned())
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> StudioResult<Vec<u8>> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }

        let parsed = Url::parse(url)
            .map_err(|e| StudioError::fetch_failed(format!("{}: invalid URL: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(StudioError::fetch_failed(format!(
                "{}: unsupported URL scheme {}",
                url,
                parsed.scheme()
            )));
        }

        debug!(url = %url, "Fetching asset");
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| StudioError::fetch_failed(format!("{}: {}", url, e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StudioError::fetch_failed(format!("{}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_decode_data_urls() {
        assert_eq!(decode_data_url("data:image/png;base64,aGVsbG8=").unwrap(), b"hello");
        assert_eq!(decode_data_url("data:text/plain,a%20b").unwrap(), b"a b");
        assert!(decode_data_url("data:image/png;base64").is_err());
        assert!(decode_data_url("https://example.com").is_err());
    }

    #[tokio::test]
    async fn test_fetch_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/scene.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"png-bytes".to_vec()))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new();
        let bytes = fetcher.fetch(&format!("{}/scene.png", server.uri())).await.unwrap();
        assert_eq!(bytes, b"png-bytes");
    }

    #[tokio::test]
    async fn test_fetch_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch(&format!("{}/missing.mp3", server.uri())).await.unwrap_err();
        assert!(matches!(err, StudioError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_fetch_data_url() {
        let fetcher = HttpFetcher::new();
        let bytes = fetcher.fetch("data:audio/wav;base64,UklGRg==").await.unwrap();
        assert_eq!(bytes, b"RIFF");
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_schemes() {
        let fetcher = HttpFetcher::new();
        let err = fetcher.fetch("memory://bgm/beat.wav").await.unwrap_err();
        assert!(err.to_string().contains("unsupported URL scheme memory"));
        assert!(fetcher.fetch("not a url").await.is_err());
    }
}
