//! In-memory asset store.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reel_models::{AssetKind, StoredAsset};
use tracing::debug;

use crate::error::StorageResult;
use crate::store::{asset_key, asset_name_from_key, AssetStore, AssetUpload};

/// Asset store that keeps uploads in process memory.
///
/// URLs use the `memory://` scheme and are only meaningful to this store.
#[derive(Debug, Default)]
pub struct MemoryAssetStore {
    objects: Mutex<Vec<(String, AssetUpload)>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn objects(&self) -> MutexGuard<'_, Vec<(String, AssetUpload)>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed an existing asset.
    pub fn with_asset(self, kind: AssetKind, file_name: &str) -> Self {
        let key = format!("{}/{}", kind.prefix(), file_name);
        self.objects()
            .push((key, AssetUpload::new(kind, file_name, Vec::new()).public()));
        self
    }

    /// Every upload so far, oldest first.
    pub fn uploads(&self) -> Vec<AssetUpload> {
        self.objects().iter().map(|(_, u)| u.clone()).collect()
    }

    fn url(key: &str) -> String {
        format!("memory://{}", key)
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn upload(&self, upload: AssetUpload) -> StorageResult<String> {
        let key = asset_key(upload.kind, &upload.file_name)?;
        debug!(key = %key, bytes = upload.data.len(), "Stored asset in memory");
        let url = Self::url(&key);
        self.objects().push((key, upload));
        Ok(url)
    }

    async fn list(&self, kind: AssetKind) -> StorageResult<Vec<StoredAsset>> {
        Ok(self
            .objects()
            .iter()
            .rev()
            .filter(|(_, upload)| upload.kind == kind)
            .map(|(key, _)| StoredAsset {
                name: asset_name_from_key(key),
                url: Self::url(key),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MAX_METADATA_VALUE_CHARS;

    #[tokio::test]
    async fn test_upload_then_list_newest_first() {
        let store = MemoryAssetStore::new().with_asset(AssetKind::BackgroundMusic, "old.wav");
        let url = store
            .upload(AssetUpload::new(AssetKind::BackgroundMusic, "new.wav", vec![0]))
            .await
            .unwrap();
        store
            .upload(AssetUpload::new(AssetKind::SoundEffects, "rain.wav", vec![0]))
            .await
            .unwrap();

        let listed = store.list(AssetKind::BackgroundMusic).await.unwrap();
        let names: Vec<_> = listed.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["new.wav", "old.wav"]);
        assert_eq!(listed[0].url, url);
        assert_eq!(store.uploads().len(), 3);
    }

    #[test]
    fn test_blank_name_rejected() {
        let store = MemoryAssetStore::new();
        let result = tokio_test::block_on(
            store.upload(AssetUpload::new(AssetKind::SoundEffects, "  ", vec![1])),
        );
        tokio_test::assert_err!(result);
        assert!(store.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_long_script_metadata_is_bounded() {
        let store = MemoryAssetStore::new();
        let script = "Host: the lion waits at dawn.\n".repeat(100);
        store
            .upload(
                AssetUpload::new(AssetKind::Video, "output.mp4", vec![0])
                    .metadata("script", script.as_str())
                    .metadata("job-id", "render-1"),
            )
            .await
            .unwrap();

        let stored = &store.uploads()[0].metadata;
        assert!(stored["script"].chars().count() <= MAX_METADATA_VALUE_CHARS);
        assert!(script.starts_with(stored["script"].as_str()));
        assert_eq!(stored["job-id"], "render-1");
    }
}
