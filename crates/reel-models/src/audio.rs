//! Audio tracks, volumes and sample library entries.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::asset::AssetKind;

/// The three independent audio tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Narration,
    BackgroundMusic,
    SoundEffects,
}

impl TrackKind {
    pub const ALL: [TrackKind; 3] = [
        TrackKind::Narration,
        TrackKind::BackgroundMusic,
        TrackKind::SoundEffects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Narration => "narration",
            TrackKind::BackgroundMusic => "bgm",
            TrackKind::SoundEffects => "sfx",
        }
    }

    /// Optional tracks loop while previewing; narration plays once.
    pub fn loops_in_preview(&self) -> bool {
        !matches!(self, TrackKind::Narration)
    }

    /// Stored asset kind backing this track's sample library.
    pub fn asset_kind(&self) -> AssetKind {
        match self {
            TrackKind::Narration => AssetKind::Narration,
            TrackKind::BackgroundMusic => AssetKind::BackgroundMusic,
            TrackKind::SoundEffects => AssetKind::SoundEffects,
        }
    }

    /// Default volume when a session starts.
    pub fn default_volume(&self) -> Volume {
        match self {
            TrackKind::Narration => Volume::new(1.0),
            TrackKind::BackgroundMusic => Volume::new(0.5),
            TrackKind::SoundEffects => Volume::new(0.8),
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Linear gain in `[0, 1]`, shared by preview playback and the render mix.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Volume(f64);

impl Volume {
    /// Create a volume, clamping into `[0, 1]`. NaN becomes silence.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn get(&self) -> f64 {
        self.0
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self(1.0)
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-track gains for a render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrackVolumes {
    pub narration: Volume,
    pub background_music: Volume,
    pub sound_effects: Volume,
}

impl Default for TrackVolumes {
    fn default() -> Self {
        Self {
            narration: TrackKind::Narration.default_volume(),
            background_music: TrackKind::BackgroundMusic.default_volume(),
            sound_effects: TrackKind::SoundEffects.default_volume(),
        }
    }
}

impl TrackVolumes {
    pub fn get(&self, kind: TrackKind) -> Volume {
        match kind {
            TrackKind::Narration => self.narration,
            TrackKind::BackgroundMusic => self.background_music,
            TrackKind::SoundEffects => self.sound_effects,
        }
    }

    pub fn set(&mut self, kind: TrackKind, volume: Volume) {
        match kind {
            TrackKind::Narration => self.narration = volume,
            TrackKind::BackgroundMusic => self.background_music = volume,
            TrackKind::SoundEffects => self.sound_effects = volume,
        }
    }
}

/// Entry in a track's sample library.
///
/// The "no selection" placeholder has an empty URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AudioAsset {
    pub name: String,
    pub url: String,
}

impl AudioAsset {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The `None` entry at the head of every library.
    pub fn none() -> Self {
        Self::new("None", "")
    }

    pub fn is_placeholder(&self) -> bool {
        self.url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_clamps() {
        assert_eq!(Volume::new(1.7).get(), 1.0);
        assert_eq!(Volume::new(-0.2).get(), 0.0);
        assert_eq!(Volume::new(f64::NAN).get(), 0.0);
        assert_eq!(Volume::new(0.8).to_string(), "0.8");
        assert_eq!(Volume::new(1.0).to_string(), "1");
    }

    #[test]
    fn test_default_volumes() {
        let volumes = TrackVolumes::default();
        assert_eq!(volumes.narration.get(), 1.0);
        assert_eq!(volumes.background_music.get(), 0.5);
        assert_eq!(volumes.sound_effects.get(), 0.8);
    }

    #[test]
    fn test_track_looping() {
        assert!(!TrackKind::Narration.loops_in_preview());
        assert!(TrackKind::BackgroundMusic.loops_in_preview());
        assert!(TrackKind::SoundEffects.loops_in_preview());
    }

    #[test]
    fn test_placeholder() {
        assert!(AudioAsset::none().is_placeholder());
        assert!(!AudioAsset::new("beat.wav", "https://cdn/beat.wav").is_placeholder());
    }
}
