//! End-to-end studio session against in-memory collaborators.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use reel_media::{EngineEventSender, FfmpegCommand, FileData, MediaEngine, MediaError, MediaResult};
use reel_models::{AssetKind, MediaSource, Scene, TrackKind, VoiceAssignment};
use reel_storage::MemoryAssetStore;
use reel_studio::{
    AcquireError, AssetFetcher, AudioSynthesizer, MediaAcquirer, PreviewTick, PromptDecomposer,
    RenderStage, ScriptAssistant, Studio, StudioConfig, StudioError, StudioResult,
    StudioServices, SynthesizedAudio,
};

struct Prompts(Vec<&'static str>);

#[async_trait]
impl PromptDecomposer for Prompts {
    async fn decompose(&self, _script: &str) -> Result<Vec<String>, AcquireError> {
        Ok(self.0.iter().map(|p| p.to_string()).collect())
    }
}

/// Stock video search: the second prompt finds nothing.
struct StockVideos;

#[async_trait]
impl MediaAcquirer for StockVideos {
    fn source(&self) -> MediaSource {
        MediaSource::StockVideo
    }

    async fn acquire(&self, prompt: &str) -> Result<Option<Scene>, AcquireError> {
        if prompt.contains("empty") {
            return Ok(None);
        }
        Ok(Some(
            Scene::video(format!("https://videos/{}.mp4", prompt.replace(' ', "-")))
                .with_thumbnail(format!("https://videos/{}.jpg", prompt.replace(' ', "-")))
                .with_duration(7.5),
        ))
    }
}

/// Generative images that hit the quota on the second request.
struct QuotaImages {
    calls: Mutex<usize>,
}

#[async_trait]
impl MediaAcquirer for QuotaImages {
    fn source(&self) -> MediaSource {
        MediaSource::AiImage
    }

    async fn acquire(&self, prompt: &str) -> Result<Option<Scene>, AcquireError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls > 1 {
            return Err(AcquireError::RateLimited { retry_after: None });
        }
        Ok(Some(Scene::image(format!("https://img/{}.png", prompt.replace(' ', "-")))))
    }
}

struct Assistant;

#[async_trait]
impl ScriptAssistant for Assistant {
    async fn enhance_script(&self, script: &str) -> StudioResult<String> {
        Ok(script.replace("Guest:", "Guest: [excited]"))
    }

    async fn write_script(&self, topic: &str) -> StudioResult<String> {
        Ok(format!("Host: Today, {}.\nGuest: Finally.", topic))
    }

    async fn generate_title(&self, _script: &str) -> StudioResult<String> {
        Ok("SAVANNA DAWN".to_string())
    }

    async fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> StudioResult<String> {
        Ok("Host: hello".to_string())
    }
}

#[derive(Default)]
struct Voices {
    requests: Mutex<Vec<Vec<VoiceAssignment>>>,
}

#[async_trait]
impl AudioSynthesizer for Voices {
    async fn synthesize_speech(
        &self,
        _text: &str,
        voices: &[VoiceAssignment],
    ) -> StudioResult<SynthesizedAudio> {
        self.requests.lock().unwrap().push(voices.to_vec());
        Ok(SynthesizedAudio::new(b"RIFF-narration".to_vec(), "audio/wav"))
    }

    async fn synthesize_instrumental(&self, _prompt: &str) -> StudioResult<SynthesizedAudio> {
        Ok(SynthesizedAudio::new(b"RIFF-bed".to_vec(), "audio/wav"))
    }
}

struct EchoFetcher;

#[async_trait]
impl AssetFetcher for EchoFetcher {
    async fn fetch(&self, url: &str) -> StudioResult<Vec<u8>> {
        Ok(url.as_bytes().to_vec())
    }
}

/// Engine whose commands write `ok:<output>` to their output file.
#[derive(Default)]
struct Engine {
    files: Mutex<HashMap<String, Vec<u8>>>,
    commands: Mutex<Vec<FfmpegCommand>>,
}

impl Engine {
    fn text(&self, name: &str) -> String {
        let files = self.files.lock().unwrap();
        String::from_utf8(files.get(name).cloned().unwrap_or_default()).unwrap()
    }
}

#[async_trait]
impl MediaEngine for Engine {
    fn is_ready(&self) -> bool {
        true
    }

    async fn reset(&self) -> MediaResult<()> {
        self.files.lock().unwrap().clear();
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> MediaResult<()> {
        self.files.lock().unwrap().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> MediaResult<FileData> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .map(FileData::Binary)
            .ok_or_else(|| MediaError::FileNotFound(name.to_string()))
    }

    async fn exec(
        &self,
        command: &FfmpegCommand,
        _events: Option<&EngineEventSender>,
    ) -> MediaResult<()> {
        self.commands.lock().unwrap().push(command.clone());
        self.files
            .lock()
            .unwrap()
            .insert(command.output().to_string(), format!("ok:{}", command.output()).into_bytes());
        Ok(())
    }
}

struct Session {
    studio: Studio,
    engine: Arc<Engine>,
    store: Arc<MemoryAssetStore>,
    voices: Arc<Voices>,
}

fn session(prompts: Vec<&'static str>) -> Session {
    let engine = Arc::new(Engine::default());
    let store = Arc::new(
        MemoryAssetStore::new()
            .with_asset(AssetKind::BackgroundMusic, "savanna.wav")
            .with_asset(AssetKind::SoundEffects, "birds.wav"),
    );
    let voices = Arc::new(Voices::default());
    let services = StudioServices {
        decomposer: Arc::new(Prompts(prompts)),
        acquirers: vec![
            Arc::new(QuotaImages { calls: Mutex::new(0) }),
            Arc::new(StockVideos),
        ],
        assistant: Arc::new(Assistant),
        synthesizer: voices.clone(),
        store: store.clone(),
        fetcher: Arc::new(EchoFetcher),
        engine: engine.clone(),
    };
    let config = StudioConfig {
        preview_interval: Duration::from_secs(5),
        ..StudioConfig::default()
    };
    Session {
        studio: Studio::new(config, services),
        engine,
        store,
        voices,
    }
}

#[tokio::test(start_paused = true)]
async fn test_podcast_from_stock_video_to_rendered_reel() {
    let mut s = session(vec!["lion at sunrise", "empty plains", "herd crossing river"]);

    s.studio.write_script("the great migration").await.unwrap();
    s.studio.enhance_script().await.unwrap();
    assert!(s.studio.script().contains("Guest: [excited] Finally."));
    let names: Vec<_> = s
        .studio
        .roster()
        .speakers()
        .iter()
        .map(|sp| sp.display_name.clone())
        .collect();
    assert_eq!(names, vec!["Host", "Guest"]);

    s.studio.set_media_source(MediaSource::StockVideo);
    assert_eq!(s.studio.generate_scenes().await.unwrap(), 2);

    s.studio.generate_narration().await.unwrap();
    let voices = s.voices.requests.lock().unwrap().clone();
    assert_eq!(voices[0][0].speaker.as_deref(), Some("Host"));
    assert_eq!(voices[0][1].speaker.as_deref(), Some("Guest"));

    s.studio.load_library().await;
    s.studio.select_track(TrackKind::BackgroundMusic, "savanna.wav").unwrap();
    s.studio.select_track(TrackKind::SoundEffects, "birds.wav").unwrap();
    s.studio.set_volume(TrackKind::SoundEffects, 0.3);

    let mut ticks = Vec::new();
    s.studio.run_preview(|t| ticks.push(t)).await.unwrap();
    assert_eq!(ticks, vec![PreviewTick::Scene(1), PreviewTick::Finished]);

    let thumbnail = s.studio.generate_thumbnail().await.unwrap();
    assert_eq!(thumbnail, b"ok:thumbnail.png");
    assert_eq!(s.engine.text("thumbnail_source.png"), "https://videos/lion-at-sunrise.jpg");

    let progress = s.studio.subscribe_render_progress();
    let output = s.studio.render().await.unwrap();
    assert_eq!(progress.borrow().stage, RenderStage::Finalizing);

    assert_eq!(
        s.engine.text("concat.txt"),
        "file 'input_0.mp4'\nduration 7.5\nfile 'input_1.mp4'\nduration 7.5\nfile 'input_1.mp4'\n"
    );
    let mux = s.engine.commands.lock().unwrap().last().cloned().unwrap();
    let args = mux.build_args().join(" ");
    assert!(args.contains("[2:a]volume=0.3[sfx]"));
    assert!(args.contains("amix=inputs=3"));

    assert_eq!(output.size_bytes, "ok:output.mp4".len());
    let video = s
        .store
        .uploads()
        .into_iter()
        .find(|u| u.kind == AssetKind::Video)
        .unwrap();
    assert_eq!(video.file_name, format!("{}.mp4", output.job_id));
    assert_eq!(video.metadata.get("script").map(String::as_str), Some(s.studio.script()));
}

#[tokio::test(start_paused = true)]
async fn test_quota_abort_keeps_scenes_and_they_still_render() {
    let mut s = session(vec!["lion at sunrise", "herd crossing river"]);
    s.studio.set_script("A lion at sunrise.");

    let err = s.studio.generate_scenes().await.unwrap_err();
    assert!(matches!(err, StudioError::RateLimited { .. }));
    assert_eq!(s.studio.scenes().len(), 1);

    s.studio.generate_narration().await.unwrap();
    s.studio.render().await.unwrap();
    assert_eq!(
        s.engine.text("concat.txt"),
        "file 'input_0.png'\nduration 5\nfile 'input_0.png'\n"
    );
    let mux = s.engine.commands.lock().unwrap().last().cloned().unwrap();
    assert!(mux.build_args().join(" ").contains("[0:a]volume=1[a]"));
}

#[tokio::test]
async fn test_editing_the_script_invalidates_the_session() {
    let mut s = session(vec!["lion at sunrise"]);
    s.studio.set_media_source(MediaSource::StockVideo);
    s.studio.set_script("Host: one\nGuest: two");
    s.studio.generate_scenes().await.unwrap();
    s.studio.generate_thumbnail().await.unwrap();

    s.studio.set_script("Narrator: something else entirely");
    assert!(s.studio.scenes().is_empty());
    assert!(s.studio.thumbnail().is_none());
    assert_eq!(s.studio.roster().len(), 1);
    assert!(matches!(s.studio.render().await, Err(StudioError::EmptyInput(_))));
}
