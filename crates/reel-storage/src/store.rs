//! Asset store seam and key layout.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use reel_models::{AssetKind, StoredAsset};

use crate::error::{StorageError, StorageResult};

/// Longest metadata value kept on an upload, in characters.
///
/// Object stores cap the total size of user metadata, so long values such as
/// a full narration script are stored as an excerpt.
pub const MAX_METADATA_VALUE_CHARS: usize = 256;

/// A file to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetUpload {
    pub kind: AssetKind,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub make_public: bool,
    pub metadata: BTreeMap<String, String>,
}

impl AssetUpload {
    pub fn new(kind: AssetKind, file_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            kind,
            file_name: file_name.into(),
            content_type: kind.default_content_type().to_string(),
            data,
            make_public: false,
            metadata: BTreeMap::new(),
        }
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn public(mut self) -> Self {
        self.make_public = true;
        self
    }

    /// Attach a metadata entry, cut to [`MAX_METADATA_VALUE_CHARS`].
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), metadata_excerpt(value.into()));
        self
    }
}

fn metadata_excerpt(mut value: String) -> String {
    if let Some((cut, _)) = value.char_indices().nth(MAX_METADATA_VALUE_CHARS) {
        value.truncate(cut);
    }
    value
}

/// Durable storage for rendered videos and audio samples.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist an asset and return a URL it can be fetched from.
    async fn upload(&self, upload: AssetUpload) -> StorageResult<String>;

    /// Named references to every stored asset of `kind`, newest first.
    async fn list(&self, kind: AssetKind) -> StorageResult<Vec<StoredAsset>>;
}

/// Object key for an upload: `{prefix}/{unix_millis}-{file_name}`.
pub fn asset_key(kind: AssetKind, file_name: &str) -> StorageResult<String> {
    let name: String = file_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_control() { '_' } else { c })
        .collect();
    if name.is_empty() {
        return Err(StorageError::InvalidKey(file_name.to_string()));
    }
    Ok(format!(
        "{}/{}-{}",
        kind.prefix(),
        Utc::now().timestamp_millis(),
        name
    ))
}

/// Display name recovered from an object key.
pub fn asset_name_from_key(key: &str) -> String {
    let file = key.rsplit('/').next().unwrap_or(key);
    match file.split_once('-') {
        Some((stamp, rest)) if !stamp.is_empty() && stamp.chars().all(|c| c.is_ascii_digit()) => {
            rest.to_string()
        }
        _ => file.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_key_layout() {
        let key = asset_key(AssetKind::BackgroundMusic, "calm piano.wav").unwrap();
        assert!(key.starts_with("bgm/"));
        assert!(key.ends_with("-calm piano.wav"));
        assert_eq!(asset_name_from_key(&key), "calm piano.wav");
    }

    #[test]
    fn test_asset_key_sanitizes_separators() {
        let key = asset_key(AssetKind::Video, "a/b.mp4").unwrap();
        assert!(key.ends_with("-a_b.mp4"));
        assert!(asset_key(AssetKind::Video, "  ").is_err());
    }

    #[test]
    fn test_name_without_timestamp() {
        assert_eq!(asset_name_from_key("sfx/rain-loop.wav"), "rain-loop.wav");
        assert_eq!(asset_name_from_key("sfx/1700000000000-rain-loop.wav"), "rain-loop.wav");
    }

    #[test]
    fn test_upload_builder() {
        let upload = AssetUpload::new(AssetKind::Video, "output.mp4", vec![1, 2])
            .public()
            .metadata("script", "A lion at sunrise.");
        assert!(upload.make_public);
        assert_eq!(upload.content_type, "video/mp4");
        assert_eq!(upload.metadata["script"], "A lion at sunrise.");
    }

    #[test]
    fn test_long_metadata_is_cut_on_char_boundary() {
        let script = "Narrator: déjà vu. ".repeat(40);
        let upload = AssetUpload::new(AssetKind::Video, "output.mp4", vec![]).metadata("script", &script);
        let stored = &upload.metadata["script"];
        assert_eq!(stored.chars().count(), MAX_METADATA_VALUE_CHARS);
        assert!(script.starts_with(stored.as_str()));
    }
}
