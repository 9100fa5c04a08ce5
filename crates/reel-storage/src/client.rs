//! R2 client implementation.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use reel_models::{AssetKind, StoredAsset};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::store::{asset_key, asset_name_from_key, AssetStore, AssetUpload};

/// Longest expiry S3-style presigning accepts.
const MAX_PRESIGN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration for R2 client.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Public bucket domain; objects are served as `{base}/{key}`
    pub public_base_url: Option<String>,
    /// Lifetime of presigned URLs for private objects
    pub presign_ttl: Duration,
}

impl R2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("R2_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("R2_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("R2_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("R2_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("R2_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("R2_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("R2_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("R2_BUCKET_NAME not set"))?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("R2_PUBLIC_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim_end_matches('/').to_string()),
            presign_ttl: std::env::var("R2_PRESIGN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(MAX_PRESIGN_TTL)
                .min(MAX_PRESIGN_TTL),
        })
    }
}

/// Cloudflare R2 storage client.
#[derive(Clone)]
pub struct R2Client {
    client: Client,
    bucket: String,
    public_base_url: Option<String>,
    presign_ttl: Duration,
}

impl R2Client {
    /// Create a new R2 client from configuration.
    pub async fn new(config: R2Config) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Ok(Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_base_url: config.public_base_url,
            presign_ttl: config.presign_ttl,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = R2Config::from_env()?;
        Self::new(config).await
    }

    /// Upload bytes with user metadata. Metadata values are URL-encoded
    /// since S3 headers only carry ASCII.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
        metadata: impl IntoIterator<Item = (String, String)>,
    ) -> StorageResult<()> {
        debug!("Uploading {} bytes to {}", data.len(), key);

        let mut request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type);
        for (name, value) in metadata {
            request = request.metadata(name, urlencoding::encode(&value).into_owned());
        }

        request
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        Ok(())
    }

    /// Generate a presigned URL for GET (temporary, signed URL via S3 API).
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// List object keys under a prefix, following continuation tokens.
    pub async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        debug!("Listing objects with prefix: {}", prefix);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::list_failed(e.to_string()))?;

            for obj in response.contents() {
                let Some(key) = obj.key() else { continue };
                objects.push(ObjectInfo {
                    key: key.to_string(),
                    size: obj.size().unwrap_or(0) as u64,
                    last_modified: obj
                        .last_modified()
                        .and_then(|t| t.to_millis().ok())
                        .map(|ms| ms as u64),
                });
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(objects)
    }

    /// URL for an object: the public domain when available, else presigned.
    async fn object_url(&self, key: &str, public: bool) -> StorageResult<String> {
        match (&self.public_base_url, public) {
            (Some(base), true) => Ok(public_url(base, key)),
            _ => self.presign_get(key, self.presign_ttl).await,
        }
    }
}

/// Public URL of `key` under `base`, with each path segment escaped.
fn public_url(base: &str, key: &str) -> String {
    let path: Vec<String> = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("{}/{}", base, path.join("/"))
}

#[async_trait]
impl AssetStore for R2Client {
    async fn upload(&self, upload: AssetUpload) -> StorageResult<String> {
        let key = asset_key(upload.kind, &upload.file_name)?;
        let public = upload.make_public;
        self.upload_bytes(upload.data, &key, &upload.content_type, upload.metadata)
            .await?;
        info!(key = %key, public, "Uploaded asset");
        self.object_url(&key, public).await
    }

    async fn list(&self, kind: AssetKind) -> StorageResult<Vec<StoredAsset>> {
        let mut objects = self.list_keys(&format!("{}/", kind.prefix())).await?;
        objects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

        let mut assets = Vec::with_capacity(objects.len());
        for object in objects {
            if object.key.ends_with('/') {
                continue;
            }
            assets.push(StoredAsset {
                name: asset_name_from_key(&object.key),
                url: self.object_url(&object.key, true).await?,
            });
        }
        Ok(assets)
    }
}

/// Information about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp (milliseconds since epoch)
    pub last_modified: Option<u64>,
}
