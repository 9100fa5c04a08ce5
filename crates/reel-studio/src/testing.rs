//! Fakes for the studio's seams.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use reel_media::{FfmpegCommand, FileData, MediaEngine, MediaError, MediaResult};
use reel_models::{MediaSource, Scene, VoiceAssignment};

use crate::acquire::{AcquireError, MediaAcquirer, PromptDecomposer};
use crate::assistant::{AudioSynthesizer, ScriptAssistant, SynthesizedAudio};
use crate::audio_tracks::AudioOutput;
use crate::error::{StudioError, StudioResult};
use crate::fetch::AssetFetcher;

/// Decomposer returning a fixed prompt list.
pub(crate) struct FakeDecomposer {
    prompts: Vec<String>,
}

impl FakeDecomposer {
    pub(crate) fn new(prompts: &[&str]) -> Self {
        Self {
            prompts: prompts.iter().map(|p| p.to_string()).collect(),
        }
    }
}

#[async_trait]
impl PromptDecomposer for FakeDecomposer {
    async fn decompose(&self, _script: &str) -> Result<Vec<String>, AcquireError> {
        Ok(self.prompts.clone())
    }
}

/// Scripted result of one acquisition call.
pub(crate) enum Outcome {
    Found(Scene),
    Nothing,
    RateLimited,
    Fail,
}

/// Acquirer playing back scripted outcomes; unscripted calls find an image.
pub(crate) struct FakeAcquirer {
    source: MediaSource,
    outcomes: Mutex<VecDeque<Outcome>>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl FakeAcquirer {
    pub(crate) fn new(source: MediaSource, outcomes: Vec<Outcome>) -> Self {
        Self {
            source,
            outcomes: Mutex::new(outcomes.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaAcquirer for FakeAcquirer {
    fn source(&self) -> MediaSource {
        self.source
    }

    async fn acquire(&self, prompt: &str) -> Result<Option<Scene>, AcquireError> {
        self.calls.lock().unwrap().push((prompt.to_string(), Instant::now()));
        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(Outcome::Found(scene)) => Ok(Some(scene)),
            Some(Outcome::Nothing) => Ok(None),
            Some(Outcome::RateLimited) => Err(AcquireError::RateLimited {
                retry_after: Some(Duration::from_secs(30)),
            }),
            Some(Outcome::Fail) => Err(AcquireError::failed("upstream exploded")),
            None => Ok(Some(Scene::image(format!("https://img/{}.png", prompt)))),
        }
    }
}

/// Fetcher returning the URL bytes, or failing for listed URLs.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    failing: Vec<String>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub(crate) fn failing_on(url: &str) -> Self {
        Self {
            failing: vec![url.to_string()],
            fetched: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> StudioResult<Vec<u8>> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.failing.iter().any(|u| u == url) {
            return Err(StudioError::fetch_failed(format!("{}: 404 Not Found", url)));
        }
        Ok(url.as_bytes().to_vec())
    }
}

/// In-memory engine. Commands "produce" their output file.
pub(crate) struct FakeEngine {
    ready: AtomicBool,
    files: Mutex<HashMap<String, FileData>>,
    commands: Mutex<Vec<FfmpegCommand>>,
    failing_output: Mutex<Option<(String, String)>>,
    text_output: AtomicBool,
    resets: AtomicUsize,
    exec_delay: Option<Duration>,
}

impl FakeEngine {
    pub(crate) fn new() -> Self {
        Self {
            ready: AtomicBool::new(true),
            files: Mutex::new(HashMap::new()),
            commands: Mutex::new(Vec::new()),
            failing_output: Mutex::new(None),
            text_output: AtomicBool::new(false),
            resets: AtomicUsize::new(0),
            exec_delay: None,
        }
    }

    pub(crate) fn unloaded() -> Self {
        let engine = Self::new();
        engine.ready.store(false, Ordering::SeqCst);
        engine
    }

    pub(crate) fn with_exec_delay(mut self, delay: Duration) -> Self {
        self.exec_delay = Some(delay);
        self
    }

    /// Fail commands producing `output` with `message` as the engine error.
    pub(crate) fn fail_output(&self, output: &str, message: &str) {
        *self.failing_output.lock().unwrap() = Some((output.to_string(), message.to_string()));
    }

    pub(crate) fn produce_text_output(&self) {
        self.text_output.store(true, Ordering::SeqCst);
    }

    pub(crate) fn commands(&self) -> Vec<FfmpegCommand> {
        self.commands.lock().unwrap().clone()
    }

    pub(crate) fn file(&self, name: &str) -> Option<FileData> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub(crate) fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaEngine for FakeEngine {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn reset(&self) -> MediaResult<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.files.lock().unwrap().clear();
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> MediaResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(name.to_string(), FileData::Binary(data.to_vec()));
        Ok(())
    }

    async fn read_file(&self, name: &str) -> MediaResult<FileData> {
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| MediaError::FileNotFound(name.to_string()))
    }

    async fn exec(
        &self,
        command: &FfmpegCommand,
        _events: Option<&reel_media::EngineEventSender>,
    ) -> MediaResult<()> {
        if !self.is_ready() {
            return Err(MediaError::EngineNotReady);
        }
        self.commands.lock().unwrap().push(command.clone());
        if let Some(delay) = self.exec_delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self.failing_output.lock().unwrap().clone();
        if let Some((output, message)) = failing {
            if output == command.output() {
                return Err(MediaError::ffmpeg_failed(message, None, Some(1)));
            }
        }

        let data = if self.text_output.load(Ordering::SeqCst) && command.output() == "output.mp4" {
            FileData::Text("not a video".to_string())
        } else {
            FileData::Binary(format!("rendered:{}", command.output()).into_bytes())
        };
        self.files
            .lock()
            .unwrap()
            .insert(command.output().to_string(), data);
        Ok(())
    }
}

/// Assistant with canned answers that records what it was asked.
#[derive(Default)]
pub(crate) struct FakeAssistant {
    pub(crate) transcribed: Mutex<Vec<String>>,
}

#[async_trait]
impl ScriptAssistant for FakeAssistant {
    async fn enhance_script(&self, script: &str) -> StudioResult<String> {
        Ok(format!("{} [enhanced]", script.trim()))
    }

    async fn write_script(&self, topic: &str) -> StudioResult<String> {
        Ok(format!("Host: Let's talk about {}.\nGuest: [curious] Go on.", topic))
    }

    async fn generate_title(&self, _script: &str) -> StudioResult<String> {
        Ok("THE LAST ROAR".to_string())
    }

    async fn transcribe(&self, _audio: &[u8], mime_type: &str) -> StudioResult<String> {
        self.transcribed.lock().unwrap().push(mime_type.to_string());
        Ok("Host: Welcome back.\nGuest: [laughs] Thanks.".to_string())
    }
}

/// Synthesizer returning a tiny WAV-looking payload and recording requests.
#[derive(Default)]
pub(crate) struct FakeSynthesizer {
    pub(crate) speech_requests: Mutex<Vec<(String, Vec<VoiceAssignment>)>>,
    pub(crate) instrumental_prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl AudioSynthesizer for FakeSynthesizer {
    async fn synthesize_speech(
        &self,
        text: &str,
        voices: &[VoiceAssignment],
    ) -> StudioResult<SynthesizedAudio> {
        self.speech_requests
            .lock()
            .unwrap()
            .push((text.to_string(), voices.to_vec()));
        Ok(SynthesizedAudio::new(b"RIFFspeech".to_vec(), "audio/wav"))
    }

    async fn synthesize_instrumental(&self, prompt: &str) -> StudioResult<SynthesizedAudio> {
        self.instrumental_prompts.lock().unwrap().push(prompt.to_string());
        Ok(SynthesizedAudio::new(b"RIFFbed".to_vec(), "audio/wav"))
    }
}

/// Audio output recording every call into a shared log.
#[derive(Clone, Default)]
pub(crate) struct RecordingOutput {
    pub(crate) log: Arc<Mutex<Vec<String>>>,
    pub(crate) ended: Arc<AtomicBool>,
    pub(crate) reject_play: bool,
}

impl RecordingOutput {
    pub(crate) fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl AudioOutput for RecordingOutput {
    fn load(&mut self, url: Option<&str>) {
        self.record(format!("load:{}", url.unwrap_or("-")));
        self.ended.store(false, Ordering::SeqCst);
    }

    fn play(&mut self) -> StudioResult<()> {
        if self.reject_play {
            return Err(StudioError::Playback("autoplay rejected".into()));
        }
        self.record("play".into());
        Ok(())
    }

    fn pause(&mut self) {
        self.record("pause".into());
    }

    fn seek(&mut self, position: Duration) {
        self.record(format!("seek:{}", position.as_secs()));
        self.ended.store(false, Ordering::SeqCst);
    }

    fn set_volume(&mut self, volume: f64) {
        self.record(format!("volume:{}", volume));
    }

    fn set_looping(&mut self, looping: bool) {
        self.record(format!("loop:{}", looping));
    }

    fn has_ended(&self) -> bool {
        self.ended.load(Ordering::SeqCst)
    }
}
