//! Reel studio command line.
//!
//! Runs one session end to end: script, speakers, scenes, narration and the
//! final render.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reel_media::{FfmpegEngine, MediaEngine};
use reel_models::{MediaSource, TrackKind};
use reel_storage::{AssetStore, MemoryAssetStore, R2Client};
use reel_studio::acquire::{AiImageAcquirer, StockPhotoAcquirer, StockVideoAcquirer};
use reel_studio::{
    metrics, GeminiClient, HttpFetcher, MediaAcquirer, PexelsClient, RenderStage, Studio,
    StudioConfig, StudioServices,
};

#[derive(Debug, Parser)]
#[command(name = "reel-studio", version, about = "Turn a script into a narrated slideshow video")]
struct Args {
    /// Script text. Lines starting with `Name:` become speakers
    #[arg(long, conflicts_with_all = ["script_file", "topic"])]
    script: Option<String>,

    /// Read the script from a file
    #[arg(long, conflicts_with = "topic")]
    script_file: Option<PathBuf>,

    /// Have the assistant write a script about this topic
    #[arg(long)]
    topic: Option<String>,

    /// Rewrite the script with performance cues before use
    #[arg(long)]
    enhance: bool,

    /// Scene media source: ai, stock-photo or stock-video
    #[arg(long, default_value = "ai")]
    source: MediaSource,

    /// Background music URL
    #[arg(long)]
    bgm: Option<String>,

    /// Sound effects URL
    #[arg(long)]
    sfx: Option<String>,

    /// Generate background music from this description instead
    #[arg(long, conflicts_with = "bgm")]
    bgm_prompt: Option<String>,

    #[arg(long, default_value_t = 1.0)]
    narration_volume: f64,

    #[arg(long, default_value_t = 0.5)]
    bgm_volume: f64,

    #[arg(long, default_value_t = 0.8)]
    sfx_volume: f64,

    /// Also write a title thumbnail PNG here
    #[arg(long)]
    thumbnail: Option<PathBuf>,

    /// Where to copy the rendered MP4
    #[arg(long, short, default_value = "reel.mp4")]
    output: PathBuf,
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reel=info,reel_studio=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn build_store() -> Arc<dyn AssetStore> {
    match R2Client::from_env().await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!(error = %e, "R2 storage unavailable, keeping assets in memory");
            Arc::new(MemoryAssetStore::new())
        }
    }
}

async fn build_services(config: &StudioConfig) -> anyhow::Result<StudioServices> {
    let gemini = Arc::new(GeminiClient::from_config(config)?);

    let mut acquirers: Vec<Arc<dyn MediaAcquirer>> =
        vec![Arc::new(AiImageAcquirer::new(gemini.clone()))];
    match PexelsClient::from_config(config) {
        Ok(pexels) => {
            let pexels = Arc::new(pexels);
            acquirers.push(Arc::new(StockPhotoAcquirer::new(pexels.clone())));
            acquirers.push(Arc::new(StockVideoAcquirer::new(pexels)));
        }
        Err(e) => warn!(error = %e, "Stock media sources disabled"),
    }

    let mut engine = FfmpegEngine::new(&config.work_dir);
    if let Some(timeout) = config.ffmpeg_timeout {
        engine = engine.with_timeout(timeout);
    }
    engine.load().await.context("Failed to load the media engine")?;

    Ok(StudioServices {
        decomposer: gemini.clone(),
        acquirers,
        assistant: gemini.clone(),
        synthesizer: gemini,
        store: build_store().await,
        fetcher: Arc::new(HttpFetcher::new()),
        engine: Arc::new(engine) as Arc<dyn MediaEngine>,
    })
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = StudioConfig::from_env();
    info!("Studio config: {:?}", config);

    let _metrics = if config.metrics_enabled {
        Some(metrics::init_metrics()?)
    } else {
        None
    };

    let services = build_services(&config).await?;
    let mut studio = Studio::new(config, services);

    if let Some(topic) = &args.topic {
        studio.write_script(topic).await?;
    } else if let Some(path) = &args.script_file {
        let script = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        studio.set_script(script);
    } else if let Some(script) = &args.script {
        studio.set_script(script.clone());
    } else {
        bail!("Provide --script, --script-file or --topic");
    }
    if args.enhance {
        studio.enhance_script().await?;
    }

    for speaker in studio.roster().speakers() {
        info!(speaker = %speaker.display_name, voice = %speaker.voice_id, "Speaker");
    }

    studio.set_media_source(args.source);
    let mut scenes_rx = studio.subscribe_scenes();
    let watcher = tokio::spawn(async move {
        while scenes_rx.changed().await.is_ok() {
            let count = scenes_rx.borrow_and_update().len();
            if count > 0 {
                info!(scenes = count, "Scene acquired");
            }
        }
    });
    let generated = studio.generate_scenes().await;
    watcher.abort();
    let count = generated?;
    info!(scenes = count, source = %args.source, "Scenes ready");

    studio.generate_narration().await?;

    studio.load_library().await;
    if let Some(prompt) = &args.bgm_prompt {
        let asset = studio.generate_track(TrackKind::BackgroundMusic, prompt).await?;
        info!(name = %asset.name, "Background music generated");
    }
    if args.bgm.is_some() {
        studio.set_track_source(TrackKind::BackgroundMusic, args.bgm.clone());
    }
    if args.sfx.is_some() {
        studio.set_track_source(TrackKind::SoundEffects, args.sfx.clone());
    }
    studio.set_volume(TrackKind::Narration, args.narration_volume);
    studio.set_volume(TrackKind::BackgroundMusic, args.bgm_volume);
    studio.set_volume(TrackKind::SoundEffects, args.sfx_volume);

    if let Some(path) = &args.thumbnail {
        let png = studio.generate_thumbnail().await?;
        tokio::fs::write(path, png)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Thumbnail written");
    }

    let mut progress_rx = studio.subscribe_render_progress();
    let reporter = tokio::spawn(async move {
        let mut last = None;
        while progress_rx.changed().await.is_ok() {
            let progress = *progress_rx.borrow_and_update();
            if last != Some(progress.stage) {
                info!(stage = %progress.stage, "Rendering");
                last = Some(progress.stage);
            }
            if progress.stage == RenderStage::Finalizing && progress.ratio >= 1.0 {
                break;
            }
        }
    });
    let rendered = studio.render().await;
    reporter.abort();
    let output = rendered?;

    tokio::fs::copy(&output.local, &args.output)
        .await
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    info!(
        job_id = %output.job_id,
        size_bytes = output.size_bytes,
        path = %args.output.display(),
        "Video saved"
    );
    println!("{}", output.url);
    Ok(())
}

#[tokio::main]
async fn main() {
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("A rustls crypto provider was already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    info!("Starting reel-studio");

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
