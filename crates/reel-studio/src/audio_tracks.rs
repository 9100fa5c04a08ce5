//! Audio tracks and their sample libraries.
//!
//! Each `AudioTrack` owns one playback element. The manager keeps the three
//! tracks, the per-track libraries and the single-track preview state.

use std::time::Duration;

use tracing::{debug, warn};

use reel_models::{AudioAsset, StoredAsset, TrackKind, TrackVolumes, Volume};

use crate::error::{StudioError, StudioResult};

/// A playback element (browser audio tag, native player, ...).
pub trait AudioOutput: Send {
    /// Replace the loaded source. `None` unloads.
    fn load(&mut self, url: Option<&str>);

    /// Start playing from the current position. May be rejected.
    fn play(&mut self) -> StudioResult<()>;

    fn pause(&mut self);

    fn seek(&mut self, position: Duration);

    fn set_volume(&mut self, volume: f64);

    fn set_looping(&mut self, looping: bool);

    fn has_ended(&self) -> bool;
}

/// Output that plays nothing. Used by the CLI and when no device exists.
#[derive(Debug, Default)]
pub struct SilentOutput {
    loaded: Option<String>,
    playing: bool,
}

impl SilentOutput {
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn loaded(&self) -> Option<&str> {
        self.loaded.as_deref()
    }
}

impl AudioOutput for SilentOutput {
    fn load(&mut self, url: Option<&str>) {
        self.loaded = url.map(str::to_string);
        self.playing = false;
    }

    fn play(&mut self) -> StudioResult<()> {
        if self.loaded.is_none() {
            self.playing = false;
            return Err(StudioError::Playback("no source loaded".into()));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn seek(&mut self, _position: Duration) {}

    fn set_volume(&mut self, _volume: f64) {}

    fn set_looping(&mut self, _looping: bool) {}

    fn has_ended(&self) -> bool {
        false
    }
}

/// One of the three audio tracks.
pub struct AudioTrack {
    kind: TrackKind,
    source: Option<String>,
    volume: Volume,
    is_playing: bool,
    output: Box<dyn AudioOutput>,
}

impl AudioTrack {
    pub fn new(kind: TrackKind, mut output: Box<dyn AudioOutput>) -> Self {
        let volume = kind.default_volume();
        output.set_volume(volume.get());
        Self {
            kind,
            source: None,
            volume,
            is_playing: false,
            output,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn volume(&self) -> Volume {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Start playback. Rejected playback is logged and leaves the track paused.
    pub fn play(&mut self) {
        if self.source.is_none() {
            return;
        }
        match self.output.play() {
            Ok(()) => self.is_playing = true,
            Err(e) => {
                warn!(track = %self.kind, error = %e, "Playback rejected");
                self.is_playing = false;
            }
        }
    }

    pub fn pause(&mut self) {
        self.output.pause();
        self.is_playing = false;
    }

    pub fn seek(&mut self, position: Duration) {
        self.output.seek(position);
    }

    /// Applies immediately, without interrupting playback.
    pub fn set_volume(&mut self, volume: Volume) {
        self.volume = volume;
        self.output.set_volume(volume.get());
    }

    fn set_looping(&mut self, looping: bool) {
        self.output.set_looping(looping);
    }

    fn set_source(&mut self, url: Option<String>) {
        self.pause();
        self.output.load(url.as_deref());
        self.source = url;
    }

    fn has_ended(&self) -> bool {
        self.output.has_ended()
    }
}

/// Owner of the narration, background-music and sound-effects tracks.
pub struct AudioTrackManager {
    narration: AudioTrack,
    background_music: AudioTrack,
    sound_effects: AudioTrack,
    bgm_library: Vec<AudioAsset>,
    sfx_library: Vec<AudioAsset>,
    previewing: Option<TrackKind>,
}

impl AudioTrackManager {
    /// Create the three tracks with outputs from `make_output`.
    pub fn new(make_output: impl Fn(TrackKind) -> Box<dyn AudioOutput>) -> Self {
        Self {
            narration: AudioTrack::new(TrackKind::Narration, make_output(TrackKind::Narration)),
            background_music: AudioTrack::new(
                TrackKind::BackgroundMusic,
                make_output(TrackKind::BackgroundMusic),
            ),
            sound_effects: AudioTrack::new(
                TrackKind::SoundEffects,
                make_output(TrackKind::SoundEffects),
            ),
            bgm_library: vec![AudioAsset::none()],
            sfx_library: vec![AudioAsset::none()],
            previewing: None,
        }
    }

    /// Tracks backed by [`SilentOutput`].
    pub fn silent() -> Self {
        Self::new(|_| Box::new(SilentOutput::default()) as Box<dyn AudioOutput>)
    }

    pub fn track(&self, kind: TrackKind) -> &AudioTrack {
        match kind {
            TrackKind::Narration => &self.narration,
            TrackKind::BackgroundMusic => &self.background_music,
            TrackKind::SoundEffects => &self.sound_effects,
        }
    }

    fn track_mut(&mut self, kind: TrackKind) -> &mut AudioTrack {
        match kind {
            TrackKind::Narration => &mut self.narration,
            TrackKind::BackgroundMusic => &mut self.background_music,
            TrackKind::SoundEffects => &mut self.sound_effects,
        }
    }

    fn tracks_mut(&mut self) -> [&mut AudioTrack; 3] {
        [
            &mut self.narration,
            &mut self.background_music,
            &mut self.sound_effects,
        ]
    }

    /// Sample library for `kind`. Narration has none.
    pub fn library(&self, kind: TrackKind) -> &[AudioAsset] {
        match kind {
            TrackKind::Narration => &[],
            TrackKind::BackgroundMusic => &self.bgm_library,
            TrackKind::SoundEffects => &self.sfx_library,
        }
    }

    fn library_mut(&mut self, kind: TrackKind) -> Option<&mut Vec<AudioAsset>> {
        match kind {
            TrackKind::Narration => None,
            TrackKind::BackgroundMusic => Some(&mut self.bgm_library),
            TrackKind::SoundEffects => Some(&mut self.sfx_library),
        }
    }

    /// Replace a library with stored assets, behind the `None` placeholder.
    pub fn set_library(&mut self, kind: TrackKind, assets: Vec<StoredAsset>) {
        if let Some(library) = self.library_mut(kind) {
            *library = std::iter::once(AudioAsset::none())
                .chain(assets.into_iter().map(|a| AudioAsset::new(a.name, a.url)))
                .collect();
        }
    }

    /// Insert a new asset right after the placeholder so it is reselectable.
    pub fn add_to_library(&mut self, kind: TrackKind, asset: AudioAsset) {
        if asset.is_placeholder() {
            return;
        }
        if let Some(library) = self.library_mut(kind) {
            library.retain(|a| !a.is_placeholder() && a.url != asset.url);
            library.insert(0, asset);
            library.insert(0, AudioAsset::none());
        }
    }

    /// Select a library entry by name. The placeholder clears the track.
    pub fn select_from_library(&mut self, kind: TrackKind, name: &str) -> StudioResult<()> {
        let asset = self
            .library(kind)
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| StudioError::no_results(format!("No {} sample named {}", kind, name)))?;

        let url = if asset.is_placeholder() { None } else { Some(asset.url) };
        self.set_source(kind, url);
        Ok(())
    }

    /// Replace a track's source. Its playback and any preview of it stop.
    pub fn set_source(&mut self, kind: TrackKind, url: Option<String>) {
        let url = url.filter(|u| !u.trim().is_empty());
        debug!(track = %kind, has_source = url.is_some(), "Track source changed");
        if self.previewing == Some(kind) {
            self.previewing = None;
        }
        self.track_mut(kind).set_source(url);
    }

    pub fn set_volume(&mut self, kind: TrackKind, volume: Volume) {
        self.track_mut(kind).set_volume(volume);
    }

    pub fn volumes(&self) -> TrackVolumes {
        let mut volumes = TrackVolumes::default();
        for kind in TrackKind::ALL {
            volumes.set(kind, self.track(kind).volume());
        }
        volumes
    }

    /// Track currently playing on its own, if any.
    pub fn previewing(&self) -> Option<TrackKind> {
        self.previewing
    }

    /// Start or stop a single-track preview. Every other track stops.
    ///
    /// Returns whether the track is now previewing. A track with no source
    /// never starts.
    pub fn toggle_preview(&mut self, kind: TrackKind) -> bool {
        if self.previewing == Some(kind) {
            self.track_mut(kind).pause();
            self.previewing = None;
            return false;
        }

        self.pause_all();
        let track = self.track_mut(kind);
        if track.source().is_none() {
            return false;
        }
        track.set_looping(kind.loops_in_preview());
        track.seek(Duration::ZERO);
        track.play();
        if track.is_playing() {
            self.previewing = Some(kind);
        }
        self.previewing.is_some()
    }

    /// Pause every track and end any single-track preview.
    pub fn pause_all(&mut self) {
        for track in self.tracks_mut() {
            track.pause();
        }
        self.previewing = None;
    }

    /// Rewind every track.
    pub fn seek_all(&mut self, position: Duration) {
        for track in self.tracks_mut() {
            track.seek(position);
        }
    }

    /// Play every track with a source, looping the optional ones.
    pub fn play_all(&mut self) {
        self.previewing = None;
        for track in self.tracks_mut() {
            let looping = track.kind().loops_in_preview();
            track.set_looping(looping);
            track.play();
        }
    }

    pub fn narration_ended(&self) -> bool {
        self.narration.has_ended()
    }
}

impl Default for AudioTrackManager {
    fn default() -> Self {
        Self::silent()
    }
}
