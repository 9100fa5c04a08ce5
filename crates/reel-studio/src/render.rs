//! Render pipeline executor.
//!
//! Executes a [`RenderPlan`] against the media engine: materialize inputs,
//! concatenate visuals, mix and mux audio, then persist the output. One
//! render owns the engine's working storage at a time.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{watch, Mutex};
use tracing::{debug, info, Instrument};

use reel_media::filters::TitleStyle;
use reel_media::plan::{CONCAT_MANIFEST_FILE, OUTPUT_FILE};
use reel_media::{
    EngineEvent, EngineEventSender, FfmpegCommand, MediaEngine, MediaError, PlannedFetch, RenderPlan,
};
use reel_models::{AssetKind, EncodingConfig, JobId, RenderJob, Scene, DEFAULT_SCENE_DURATION_SECS};
use reel_storage::{AssetStore, AssetUpload};

use crate::error::{StudioError, StudioResult};
use crate::fetch::AssetFetcher;
use crate::logging::JobLogger;
use crate::thumbnail::compose_thumbnail;

/// Stage names used in failure messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    Materializing,
    Concatenating,
    Mixing,
    Muxing,
    Finalizing,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStage::Materializing => "materializing",
            RenderStage::Concatenating => "concatenating",
            RenderStage::Mixing => "mixing",
            RenderStage::Muxing => "muxing",
            RenderStage::Finalizing => "finalizing",
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage and completion ratio of the running render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderProgress {
    pub stage: RenderStage,
    /// Completion of the current stage in `[0, 1]`
    pub ratio: f64,
}

/// A finished render.
#[derive(Debug)]
pub struct RenderOutput {
    pub job_id: JobId,
    /// Local copy, deleted on drop
    pub local: tempfile::TempPath,
    /// Persisted asset URL
    pub url: String,
    pub size_bytes: usize,
}

/// Wrap an error from `stage`. Engine failures keep their message verbatim.
fn in_stage(stage: RenderStage) -> impl Fn(StudioError) -> StudioError {
    move |err| match err {
        StudioError::EngineNotReady
        | StudioError::Media(MediaError::EngineNotReady) => StudioError::EngineNotReady,
        StudioError::UnsupportedOutputType => StudioError::UnsupportedOutputType,
        StudioError::Media(MediaError::FfmpegFailed { message, .. }) => {
            StudioError::stage_failure(stage, message)
        }
        other => StudioError::stage_failure(stage, other.to_string()),
    }
}

/// Executes render plans on a shared media engine.
pub struct RenderPipeline {
    engine: Arc<dyn MediaEngine>,
    fetcher: Arc<dyn AssetFetcher>,
    store: Arc<dyn AssetStore>,
    encoding: EncodingConfig,
    default_scene_secs: f64,
    title_style: TitleStyle,
    lock: Mutex<()>,
    progress: watch::Sender<RenderProgress>,
}

impl RenderPipeline {
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        fetcher: Arc<dyn AssetFetcher>,
        store: Arc<dyn AssetStore>,
    ) -> Self {
        let (progress, _rx) = watch::channel(RenderProgress {
            stage: RenderStage::Materializing,
            ratio: 0.0,
        });
        Self {
            engine,
            fetcher,
            store,
            encoding: EncodingConfig::default(),
            default_scene_secs: DEFAULT_SCENE_DURATION_SECS,
            title_style: TitleStyle::default(),
            lock: Mutex::new(()),
            progress,
        }
    }

    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_default_scene_secs(mut self, secs: f64) -> Self {
        self.default_scene_secs = secs;
        self
    }

    pub fn with_title_style(mut self, style: TitleStyle) -> Self {
        self.title_style = style;
        self
    }

    pub fn engine(&self) -> &Arc<dyn MediaEngine> {
        &self.engine
    }

    pub fn subscribe(&self) -> watch::Receiver<RenderProgress> {
        self.progress.subscribe()
    }

    fn publish(&self, stage: RenderStage, ratio: f64) {
        self.progress.send_replace(RenderProgress {
            stage,
            ratio: ratio.clamp(0.0, 1.0),
        });
    }

    /// Render `job` into one muxed video and persist it.
    ///
    /// Fails with `RenderInProgress` while another render or thumbnail holds
    /// the engine. Re-invoking with the same job is safe.
    pub async fn render(&self, job: &RenderJob) -> StudioResult<RenderOutput> {
        let _guard = self.lock.try_lock().map_err(|_| StudioError::RenderInProgress)?;

        if !self.engine.is_ready() {
            return Err(StudioError::EngineNotReady);
        }
        let plan = RenderPlan::build(job, &self.encoding, self.default_scene_secs)
            .map_err(|e| StudioError::empty_input(format!("Cannot render: {}", e)))?;

        let logger = JobLogger::new(&job.id, "render");
        logger.log_start(&format!(
            "{} scenes, {} audio beds",
            plan.scenes.len(),
            plan.audio_beds.len()
        ));

        let started = Instant::now();
        let result = self.execute(job, &plan, &logger).instrument(logger.create_span()).await;

        match &result {
            Ok(output) => {
                crate::metrics::record_render_completed(started.elapsed().as_secs_f64());
                logger.log_completion(&format!("{} bytes at {}", output.size_bytes, output.url));
            }
            Err(e) => {
                let stage = match e {
                    StudioError::StageFailure { stage, .. } => stage.as_str(),
                    _ => "setup",
                };
                crate::metrics::record_render_failed(stage);
                logger.log_error(&e.to_string());
            }
        }
        result
    }

    async fn execute(
        &self,
        job: &RenderJob,
        plan: &RenderPlan,
        logger: &JobLogger,
    ) -> StudioResult<RenderOutput> {
        let stage = RenderStage::Materializing;
        self.publish(stage, 0.0);
        self.engine.reset().await.map_err(|e| in_stage(stage)(e.into()))?;
        let visuals: Vec<&PlannedFetch> = plan.visual_fetches().collect();
        for (i, fetch) in visuals.iter().enumerate() {
            self.materialize(fetch).await.map_err(in_stage(stage))?;
            self.publish(stage, (i + 1) as f64 / visuals.len() as f64);
        }
        logger.log_progress(&format!("materialized {} inputs", visuals.len()));

        let stage = RenderStage::Concatenating;
        self.publish(stage, 0.0);
        self.engine
            .write_file(CONCAT_MANIFEST_FILE, plan.manifest.render().as_bytes())
            .await
            .map_err(|e| in_stage(stage)(e.into()))?;
        self.run_command(&plan.concat_command(), stage, plan.timeline_ms())
            .await
            .map_err(in_stage(stage))?;
        logger.log_progress("visuals concatenated");

        let stage = RenderStage::Mixing;
        self.publish(stage, 0.0);
        for fetch in &plan.audio_beds {
            self.materialize(fetch).await.map_err(in_stage(stage))?;
        }
        debug!(filter = %plan.mix.filter_complex(), "Audio mix graph");

        let stage = RenderStage::Muxing;
        self.publish(stage, 0.0);
        self.run_command(&plan.mux_command(), stage, plan.timeline_ms())
            .await
            .map_err(in_stage(stage))?;
        logger.log_progress("audio mixed and muxed");

        let stage = RenderStage::Finalizing;
        self.publish(stage, 0.0);
        let output = self.finalize(job).await.map_err(in_stage(stage))?;
        self.publish(stage, 1.0);
        Ok(output)
    }

    async fn materialize(&self, fetch: &PlannedFetch) -> StudioResult<()> {
        let bytes = self.fetcher.fetch(&fetch.url).await?;
        self.engine.write_file(&fetch.file_name, &bytes).await?;
        Ok(())
    }

    /// Run one engine command, forwarding progress and log lines.
    async fn run_command(
        &self,
        command: &FfmpegCommand,
        stage: RenderStage,
        total_ms: i64,
    ) -> StudioResult<()> {
        let (events, mut rx) = EngineEventSender::channel(64);
        let engine = &self.engine;

        let exec = async move {
            let result = engine.exec(command, Some(&events)).await;
            drop(events);
            result
        };
        let forward = async {
            while let Some(event) = rx.recv().await {
                match event {
                    EngineEvent::Progress(progress) => self.publish(stage, progress.ratio(total_ms)),
                    EngineEvent::Log(line) => debug!(stage = %stage, "{}", line),
                }
            }
        };

        let (result, ()) = tokio::join!(exec, forward);
        result.map_err(StudioError::from)
    }

    async fn finalize(&self, job: &RenderJob) -> StudioResult<RenderOutput> {
        let bytes = self
            .engine
            .read_file(OUTPUT_FILE)
            .await?
            .into_binary()
            .ok_or(StudioError::UnsupportedOutputType)?;

        let local = tempfile::Builder::new()
            .prefix("reel-")
            .suffix(".mp4")
            .tempfile()?
            .into_temp_path();
        tokio::fs::write(&local, &bytes).await?;

        let size_bytes = bytes.len();
        let upload = AssetUpload::new(AssetKind::Video, format!("{}.mp4", job.id), bytes)
            .content_type("video/mp4")
            .public()
            .metadata("script", job.script_text.clone())
            .metadata("job-id", job.id.to_string());
        let url = self.store.upload(upload).await?;
        info!(job_id = %job.id, url = %url, "Render persisted");

        Ok(RenderOutput {
            job_id: job.id.clone(),
            local,
            url,
            size_bytes,
        })
    }

    /// Compose a title thumbnail from `scene`.
    ///
    /// Shares the render lock since it uses the same working storage.
    pub async fn thumbnail(&self, scene: &Scene, title: &str) -> StudioResult<Vec<u8>> {
        let _guard = self.lock.try_lock().map_err(|_| StudioError::RenderInProgress)?;
        if !self.engine.is_ready() {
            return Err(StudioError::EngineNotReady);
        }
        compose_thumbnail(
            self.engine.as_ref(),
            self.fetcher.as_ref(),
            scene,
            title,
            &self.title_style,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEngine, FakeFetcher};
    use reel_media::plan::CONCAT_VIDEO_FILE;
    use reel_media::FileData;
    use reel_models::{TrackVolumes, Volume};
    use reel_storage::MemoryAssetStore;
    use std::time::Duration;

    struct Harness {
        engine: Arc<FakeEngine>,
        fetcher: Arc<FakeFetcher>,
        store: Arc<MemoryAssetStore>,
        pipeline: RenderPipeline,
    }

    fn harness_with(engine: FakeEngine, fetcher: FakeFetcher) -> Harness {
        let engine = Arc::new(engine);
        let fetcher = Arc::new(fetcher);
        let store = Arc::new(MemoryAssetStore::new());
        let pipeline = RenderPipeline::new(engine.clone(), fetcher.clone(), store.clone());
        Harness {
            engine,
            fetcher,
            store,
            pipeline,
        }
    }

    fn harness() -> Harness {
        harness_with(FakeEngine::new(), FakeFetcher::default())
    }

    fn job() -> RenderJob {
        RenderJob::new(
            vec![Scene::image("https://img/0.png"), Scene::image("https://img/1.png")],
            "data:audio/wav;base64,UklGRg==",
        )
        .with_script("A lion at sunrise.")
    }

    #[tokio::test]
    async fn test_narration_only_render() {
        let h = harness();
        let output = h.pipeline.render(&job()).await.unwrap();

        assert_eq!(output.url, h.store.list(AssetKind::Video).await.unwrap()[0].url);
        assert_eq!(std::fs::read(&output.local).unwrap(), b"rendered:output.mp4");
        assert_eq!(output.size_bytes, b"rendered:output.mp4".len());

        let commands = h.engine.commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].output(), CONCAT_VIDEO_FILE);
        let mux = commands[1].build_args().join(" ");
        assert!(mux.contains("-filter_complex [0:a]volume=1[a]"));
        assert!(mux.contains("-map 1:v -map [a]"));

        assert_eq!(
            h.fetcher.fetched(),
            vec!["data:audio/wav;base64,UklGRg==", "https://img/0.png", "https://img/1.png"]
        );
        let manifest = h.engine.file(CONCAT_MANIFEST_FILE).unwrap();
        assert!(matches!(manifest, FileData::Binary(ref b) if String::from_utf8_lossy(b).contains("file 'input_1.png'")));

        let uploads = h.store.uploads();
        assert_eq!(uploads[0].metadata.get("script").map(String::as_str), Some("A lion at sunrise."));
        assert!(uploads[0].make_public);
        assert_eq!(uploads[0].content_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_full_mix_uses_track_gains() {
        let h = harness();
        let volumes = TrackVolumes {
            narration: Volume::new(1.0),
            background_music: Volume::new(0.5),
            sound_effects: Volume::new(0.8),
        };
        let job = job()
            .with_bgm("https://cdn/bgm.wav")
            .with_sfx("https://cdn/sfx.wav")
            .with_volumes(volumes);

        h.pipeline.render(&job).await.unwrap();

        let mux = h.engine.commands()[1].clone();
        assert_eq!(mux.input_paths(), vec!["narration.mp3", "bgm.mp3", "sfx.mp3", "temp_video.mp4"]);
        let args = mux.build_args().join(" ");
        assert!(args.contains(
            "[0:a]volume=1[nar];[1:a]volume=0.5[bgm];[2:a]volume=0.8[sfx];\
             [nar][bgm][sfx]amix=inputs=3:duration=longest"
        ));
        assert!(args.contains("-map 3:v"));
        assert!(h.engine.file("bgm.mp3").is_some());
        assert!(h.engine.file("sfx.mp3").is_some());
    }

    #[tokio::test]
    async fn test_engine_not_ready_fails_fast() {
        let h = harness_with(FakeEngine::unloaded(), FakeFetcher::default());
        let err = h.pipeline.render(&job()).await.unwrap_err();
        assert!(matches!(err, StudioError::EngineNotReady));
        assert!(h.fetcher.fetched().is_empty());
    }

    #[tokio::test]
    async fn test_missing_inputs_rejected() {
        let h = harness();
        let err = h.pipeline.render(&RenderJob::new(vec![], "https://cdn/n.wav")).await.unwrap_err();
        assert!(matches!(err, StudioError::EmptyInput(_)));

        let err = h
            .pipeline
            .render(&RenderJob::new(vec![Scene::image("a.png")], ""))
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::EmptyInput(_)));
        assert_eq!(h.engine.resets(), 0);
    }

    #[tokio::test]
    async fn test_engine_failure_keeps_message_with_stage_prefix() {
        let h = harness();
        h.engine.fail_output("output.mp4", "Invalid data found when processing input");

        let err = h.pipeline.render(&job()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Video rendering failed during muxing: Invalid data found when processing input"
        );
        assert!(h.store.uploads().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_materializing_stage() {
        let h = harness_with(FakeEngine::new(), FakeFetcher::failing_on("https://img/1.png"));
        let err = h.pipeline.render(&job()).await.unwrap_err();
        assert!(matches!(
            err,
            StudioError::StageFailure { stage: RenderStage::Materializing, .. }
        ));
        assert!(h.engine.commands().is_empty());
    }

    #[tokio::test]
    async fn test_text_output_is_unsupported() {
        let h = harness();
        h.engine.produce_text_output();
        let err = h.pipeline.render(&job()).await.unwrap_err();
        assert!(matches!(err, StudioError::UnsupportedOutputType));
    }

    #[tokio::test]
    async fn test_rerender_produces_independent_outputs() {
        let h = harness();
        let job = job();
        let first = h.pipeline.render(&job).await.unwrap();
        let second = h.pipeline.render(&job).await.unwrap();

        assert_ne!(first.local.to_path_buf(), second.local.to_path_buf());
        assert!(first.local.exists() && second.local.exists());
        assert_eq!(h.store.uploads().len(), 2);
        assert_eq!(h.engine.resets(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_render_is_rejected() {
        let h = harness_with(
            FakeEngine::new().with_exec_delay(Duration::from_secs(1)),
            FakeFetcher::default(),
        );
        let job = job();

        let (first, second) = tokio::join!(h.pipeline.render(&job), async {
            tokio::task::yield_now().await;
            h.pipeline.render(&job).await
        });
        assert!(first.is_ok());
        assert!(matches!(second, Err(StudioError::RenderInProgress)));
    }

    #[tokio::test]
    async fn test_progress_reaches_finalizing() {
        let h = harness();
        let rx = h.pipeline.subscribe();
        h.pipeline.render(&job()).await.unwrap();
        let progress = *rx.borrow();
        assert_eq!(progress.stage, RenderStage::Finalizing);
        assert_eq!(progress.ratio, 1.0);
    }
}
