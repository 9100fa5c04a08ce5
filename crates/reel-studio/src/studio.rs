//! The studio session.
//!
//! `Studio` owns the script, speakers, scenes, audio tracks, preview and
//! render pipeline of one editing session. Every entry point takes explicit
//! inputs; no state lives outside the session.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use reel_media::filters::TitleStyle;
use reel_media::MediaEngine;
use reel_models::{
    AssetKind, AudioAsset, MediaSource, RenderJob, Scene, SpeakerRoster, TrackKind, Volume,
};
use reel_storage::{AssetStore, AssetUpload};

use crate::acquire::{MediaAcquirer, PromptDecomposer};
use crate::assistant::{AudioSynthesizer, ScriptAssistant};
use crate::audio_tracks::AudioTrackManager;
use crate::config::StudioConfig;
use crate::error::{StudioError, StudioResult};
use crate::fetch::AssetFetcher;
use crate::orchestrator::SceneOrchestrator;
use crate::preview::{PreviewState, PreviewSynchronizer, PreviewTick};
use crate::render::{RenderOutput, RenderPipeline, RenderProgress};

const MAX_TRACK_NAME_CHARS: usize = 30;

/// External collaborators of a studio session.
pub struct StudioServices {
    pub decomposer: Arc<dyn PromptDecomposer>,
    /// One acquirer per supported media source
    pub acquirers: Vec<Arc<dyn MediaAcquirer>>,
    pub assistant: Arc<dyn ScriptAssistant>,
    pub synthesizer: Arc<dyn AudioSynthesizer>,
    pub store: Arc<dyn AssetStore>,
    pub fetcher: Arc<dyn AssetFetcher>,
    pub engine: Arc<dyn MediaEngine>,
}

/// Library file name for a generated track: alphanumerics and spaces of the
/// prompt, at most 30 characters.
pub fn track_file_name(prompt: &str) -> String {
    let cleaned: String = prompt
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .take(MAX_TRACK_NAME_CHARS)
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "track.wav".to_string()
    } else {
        format!("{}.wav", cleaned)
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    let base = mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    match base.as_str() {
        "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/ogg" => "ogg",
        "audio/webm" => "webm",
        "audio/mp4" | "audio/aac" | "audio/x-m4a" => "m4a",
        _ => "bin",
    }
}

fn data_url(mime: &str, bytes: &[u8]) -> String {
    crate::assistant::SynthesizedAudio::new(bytes.to_vec(), mime).to_data_url()
}

/// One editing session.
pub struct Studio {
    config: StudioConfig,
    decomposer: Arc<dyn PromptDecomposer>,
    acquirers: Vec<Arc<dyn MediaAcquirer>>,
    assistant: Arc<dyn ScriptAssistant>,
    synthesizer: Arc<dyn AudioSynthesizer>,
    store: Arc<dyn AssetStore>,
    script: String,
    roster: SpeakerRoster,
    media_source: MediaSource,
    scenes: Vec<Scene>,
    scenes_tx: Arc<watch::Sender<Vec<Scene>>>,
    tracks: AudioTrackManager,
    preview: PreviewSynchronizer,
    title: Option<String>,
    thumbnail: Option<Vec<u8>>,
    pipeline: RenderPipeline,
}

impl Studio {
    pub fn new(config: StudioConfig, services: StudioServices) -> Self {
        let title_style = TitleStyle {
            font_file: config.title_font_file.clone(),
            ..Default::default()
        };
        let pipeline = RenderPipeline::new(services.engine, services.fetcher, services.store.clone())
            .with_default_scene_secs(config.default_scene_secs)
            .with_title_style(title_style);
        let (scenes_tx, _rx) = watch::channel(Vec::new());

        Self {
            preview: PreviewSynchronizer::new(config.preview_interval),
            config,
            decomposer: services.decomposer,
            acquirers: services.acquirers,
            assistant: services.assistant,
            synthesizer: services.synthesizer,
            store: services.store,
            script: String::new(),
            roster: SpeakerRoster::new(),
            media_source: MediaSource::default(),
            scenes: Vec::new(),
            scenes_tx: Arc::new(scenes_tx),
            tracks: AudioTrackManager::silent(),
            title: None,
            thumbnail: None,
            pipeline,
        }
    }

    /// Use playback elements other than the silent default.
    pub fn with_tracks(mut self, tracks: AudioTrackManager) -> Self {
        self.tracks = tracks;
        self
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    // ---- Script and speakers ----

    pub fn script(&self) -> &str {
        &self.script
    }

    /// Replace the script and re-extract speakers.
    ///
    /// A material change discards the scene sequence, the thumbnail and any
    /// running preview.
    pub fn set_script(&mut self, script: impl Into<String>) {
        let script = script.into();
        if script.trim() != self.script.trim() {
            self.stop_preview();
            self.clear_scenes();
            self.title = None;
            self.thumbnail = None;
        }
        self.script = script;
        self.roster.extract_from_script(&self.script);
    }

    pub fn roster(&self) -> &SpeakerRoster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut SpeakerRoster {
        &mut self.roster
    }

    fn require_script(&self, what: &str) -> StudioResult<&str> {
        let script = self.script.trim();
        if script.is_empty() {
            return Err(StudioError::empty_input(format!("Please enter a script to {}", what)));
        }
        Ok(script)
    }

    /// Rewrite the script with the enhancer and adopt the result.
    pub async fn enhance_script(&mut self) -> StudioResult<&str> {
        let script = self.require_script("enhance")?.to_string();
        let enhanced = self.assistant.enhance_script(&script).await?;
        self.set_script(enhanced);
        Ok(&self.script)
    }

    /// Write a new script for `topic` and adopt it.
    pub async fn write_script(&mut self, topic: &str) -> StudioResult<&str> {
        if topic.trim().is_empty() {
            return Err(StudioError::empty_input("Please enter a topic for the script"));
        }
        let script = self.assistant.write_script(topic.trim()).await?;
        self.set_script(script);
        Ok(&self.script)
    }

    pub async fn generate_title(&mut self) -> StudioResult<String> {
        let script = self.require_script("generate a title")?.to_string();
        let title = self.assistant.generate_title(&script).await?.trim().to_string();
        self.title = Some(title.clone());
        Ok(title)
    }

    // ---- Scenes ----

    pub fn media_source(&self) -> MediaSource {
        self.media_source
    }

    /// Choose where the next scene run gets its visuals.
    pub fn set_media_source(&mut self, source: MediaSource) {
        self.media_source = source;
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Observe scenes as a run appends them.
    pub fn subscribe_scenes(&self) -> watch::Receiver<Vec<Scene>> {
        self.scenes_tx.subscribe()
    }

    fn clear_scenes(&mut self) {
        self.scenes.clear();
        self.scenes_tx.send_replace(Vec::new());
        self.preview.rewind();
    }

    /// Rebuild the scene sequence from the script.
    ///
    /// On failure the scenes acquired before it are kept and the error is
    /// returned.
    pub async fn generate_scenes(&mut self) -> StudioResult<usize> {
        let acquirer = self
            .acquirers
            .iter()
            .find(|a| a.source() == self.media_source)
            .cloned()
            .ok_or_else(|| {
                StudioError::config_error(format!("No media acquirer for {}", self.media_source))
            })?;

        self.stop_preview();
        self.clear_scenes();
        self.thumbnail = None;

        let orchestrator = SceneOrchestrator::new(
            self.decomposer.clone(),
            acquirer,
            self.config.pacing_for(self.media_source),
        )
        .with_publisher(self.scenes_tx.clone());

        match orchestrator.generate_scenes(&self.script).await {
            Ok(scenes) => {
                self.scenes = scenes;
                Ok(self.scenes.len())
            }
            Err(failure) => {
                self.scenes = failure.scenes;
                Err(failure.error)
            }
        }
    }

    // ---- Narration ----

    /// Synthesize the script with the roster's voices and use it as narration.
    ///
    /// The audio is also persisted; a storage failure is logged only.
    pub async fn generate_narration(&mut self) -> StudioResult<String> {
        let script = self.require_script("generate narration")?.to_string();
        let voices = self.roster.voice_assignments();
        let audio = self.synthesizer.synthesize_speech(&script, &voices).await?;

        let upload = AssetUpload::new(
            AssetKind::Narration,
            format!("narration.{}", extension_for_mime(&audio.mime_type)),
            audio.bytes.clone(),
        )
        .content_type(audio.mime_type.clone())
        .metadata("script", script);
        if let Err(e) = self.store.upload(upload).await {
            warn!(error = %e, "Failed to persist narration");
        }

        let url = audio.to_data_url();
        self.set_track_source(TrackKind::Narration, Some(url.clone()));
        Ok(url)
    }

    /// Use a recording as narration. Its enhanced transcript becomes the script.
    pub async fn upload_narration(&mut self, bytes: &[u8], mime_type: &str) -> StudioResult<&str> {
        if bytes.is_empty() {
            return Err(StudioError::empty_input("The narration file is empty"));
        }
        self.set_track_source(TrackKind::Narration, Some(data_url(mime_type, bytes)));

        let transcript = self.assistant.transcribe(bytes, mime_type).await?;
        let script = self.assistant.enhance_script(&transcript).await?;
        self.set_script(script);
        Ok(&self.script)
    }

    // ---- Audio tracks ----

    pub fn tracks(&self) -> &AudioTrackManager {
        &self.tracks
    }

    /// Refresh the background-music and sound-effects libraries.
    pub async fn load_library(&mut self) {
        for kind in [TrackKind::BackgroundMusic, TrackKind::SoundEffects] {
            match self.store.list(kind.asset_kind()).await {
                Ok(assets) => {
                    info!(track = %kind, count = assets.len(), "Loaded sample library");
                    self.tracks.set_library(kind, assets);
                }
                Err(e) => warn!(track = %kind, error = %e, "Failed to load sample library"),
            }
        }
    }

    /// Replace a track's source. The slideshow preview stops.
    pub fn set_track_source(&mut self, kind: TrackKind, url: Option<String>) {
        self.stop_preview();
        self.tracks.set_source(kind, url);
    }

    pub fn select_track(&mut self, kind: TrackKind, name: &str) -> StudioResult<()> {
        self.stop_preview();
        self.tracks.select_from_library(kind, name)
    }

    /// Generate music or effects from a prompt, persist it and select it.
    pub async fn generate_track(&mut self, kind: TrackKind, prompt: &str) -> StudioResult<AudioAsset> {
        if kind == TrackKind::Narration {
            return Err(StudioError::config_error("Narration is generated from the script"));
        }
        if prompt.trim().is_empty() {
            return Err(StudioError::empty_input("Please describe the audio to generate"));
        }

        let audio = self.synthesizer.synthesize_instrumental(prompt.trim()).await?;
        let name = track_file_name(prompt);
        let upload = AssetUpload::new(kind.asset_kind(), name.clone(), audio.bytes)
            .content_type(audio.mime_type)
            .public()
            .metadata("prompt", prompt.trim());
        let url = self.store.upload(upload).await?;

        let asset = AudioAsset::new(name, url.clone());
        self.tracks.add_to_library(kind, asset.clone());
        self.set_track_source(kind, Some(url));
        Ok(asset)
    }

    /// Use an audio file for a track.
    ///
    /// Narration goes through [`Studio::upload_narration`]; other tracks are
    /// persisted and added to their library.
    pub async fn upload_track(
        &mut self,
        kind: TrackKind,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> StudioResult<AudioAsset> {
        if kind == TrackKind::Narration {
            let url = data_url(mime_type, &bytes);
            self.upload_narration(&bytes, mime_type).await?;
            return Ok(AudioAsset::new(file_name, url));
        }
        if bytes.is_empty() {
            return Err(StudioError::empty_input("The audio file is empty"));
        }

        let upload = AssetUpload::new(kind.asset_kind(), file_name, bytes)
            .content_type(mime_type)
            .public()
            .metadata("original-name", file_name);
        let url = self.store.upload(upload).await?;

        let asset = AudioAsset::new(file_name, url.clone());
        self.tracks.add_to_library(kind, asset.clone());
        self.set_track_source(kind, Some(url));
        Ok(asset)
    }

    /// Applies to live playback and to the next render.
    pub fn set_volume(&mut self, kind: TrackKind, volume: f64) {
        self.tracks.set_volume(kind, Volume::new(volume));
    }

    /// Start or stop one track on its own. The slideshow stops first.
    pub fn toggle_track_preview(&mut self, kind: TrackKind) -> bool {
        if self.preview.state() == PreviewState::Playing {
            self.preview.stop(&mut self.tracks);
        }
        self.tracks.toggle_preview(kind)
    }

    // ---- Preview ----

    pub fn preview_state(&self) -> PreviewState {
        self.preview.state()
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.scenes.get(self.preview.cursor())
    }

    pub fn play_preview(&mut self) -> StudioResult<()> {
        self.preview.play(self.scenes.len(), &mut self.tracks)
    }

    pub fn stop_preview(&mut self) {
        if self.preview.state() == PreviewState::Playing {
            self.preview.stop(&mut self.tracks);
        }
    }

    /// Wait for the next preview tick. `None` when stopped.
    pub async fn next_preview_tick(&mut self) -> Option<PreviewTick> {
        self.preview.next_tick(self.scenes.len(), &mut self.tracks).await
    }

    /// Play the slideshow to the end, reporting every tick.
    pub async fn run_preview(&mut self, mut on_tick: impl FnMut(PreviewTick)) -> StudioResult<()> {
        self.play_preview()?;
        while let Some(tick) = self.next_preview_tick().await {
            on_tick(tick);
            if tick == PreviewTick::Finished {
                break;
            }
        }
        Ok(())
    }

    // ---- Output ----

    pub fn thumbnail(&self) -> Option<&[u8]> {
        self.thumbnail.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Title card from the first scene and a generated title. Returns PNG bytes.
    pub async fn generate_thumbnail(&mut self) -> StudioResult<Vec<u8>> {
        if self.scenes.is_empty() {
            return Err(StudioError::empty_input(
                "Generate scenes before creating a thumbnail",
            ));
        }
        let title = self.generate_title().await?;
        let png = self.pipeline.thumbnail(&self.scenes[0], &title).await?;
        self.thumbnail = Some(png.clone());
        Ok(png)
    }

    /// Snapshot the session into a render job.
    pub fn build_render_job(&self) -> StudioResult<RenderJob> {
        if self.scenes.is_empty() {
            return Err(StudioError::empty_input("Generate scenes before rendering"));
        }
        let narration = self
            .tracks
            .track(TrackKind::Narration)
            .source()
            .ok_or_else(|| StudioError::empty_input("Narration audio is required to render"))?;

        let mut job = RenderJob::new(self.scenes.clone(), narration)
            .with_volumes(self.tracks.volumes())
            .with_script(self.script.clone());
        if let Some(url) = self.tracks.track(TrackKind::BackgroundMusic).source() {
            job = job.with_bgm(url);
        }
        if let Some(url) = self.tracks.track(TrackKind::SoundEffects).source() {
            job = job.with_sfx(url);
        }
        Ok(job)
    }

    pub async fn render(&self) -> StudioResult<RenderOutput> {
        let job = self.build_render_job()?;
        self.pipeline.render(&job).await
    }

    pub fn subscribe_render_progress(&self) -> watch::Receiver<RenderProgress> {
        self.pipeline.subscribe()
    }
}
