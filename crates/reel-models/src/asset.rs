//! Durable asset kinds.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Category of asset held by the durable store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Video,
    Narration,
    BackgroundMusic,
    SoundEffects,
}

impl AssetKind {
    /// Key prefix (folder) under which assets of this kind are stored.
    pub fn prefix(&self) -> &'static str {
        match self {
            AssetKind::Video => "videos",
            AssetKind::Narration => "narration",
            AssetKind::BackgroundMusic => "bgm",
            AssetKind::SoundEffects => "sfx",
        }
    }

    /// Content type used when the uploader does not know better.
    pub fn default_content_type(&self) -> &'static str {
        match self {
            AssetKind::Video => "video/mp4",
            _ => "audio/wav",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A named reference to a stored asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StoredAsset {
    pub name: String,
    pub url: String,
}
