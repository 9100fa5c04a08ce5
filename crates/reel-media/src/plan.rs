//! Deterministic render plans.
//!
//! A [`RenderPlan`] turns a [`RenderJob`] into working file names, the concat
//! manifest, the audio mix graph and the FFmpeg commands. It does no I/O, so
//! the same job always yields the same plan.

use reel_models::job::JobValidationError;
use reel_models::{EncodingConfig, RenderJob, TrackKind};

use crate::command::FfmpegCommand;
use crate::concat::ConcatManifest;
use crate::mix::{AudioMixGraph, MIX_OUTPUT_LABEL};

pub const NARRATION_FILE: &str = "narration.mp3";
pub const BGM_FILE: &str = "bgm.mp3";
pub const SFX_FILE: &str = "sfx.mp3";
pub const CONCAT_MANIFEST_FILE: &str = "concat.txt";
pub const CONCAT_VIDEO_FILE: &str = "temp_video.mp4";
pub const OUTPUT_FILE: &str = "output.mp4";

/// One remote asset to download into working storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFetch {
    pub file_name: String,
    pub url: String,
}

impl PlannedFetch {
    fn new(file_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderPlan {
    pub narration: PlannedFetch,
    /// Scene assets in sequence order
    pub scenes: Vec<PlannedFetch>,
    /// Background music then sound effects, when present
    pub audio_beds: Vec<PlannedFetch>,
    pub manifest: ConcatManifest,
    pub mix: AudioMixGraph,
    encoding: EncodingConfig,
}

impl RenderPlan {
    /// Plan a render. Images (and videos without a usable duration) last
    /// `default_scene_secs` on the timeline.
    pub fn build(
        job: &RenderJob,
        encoding: &EncodingConfig,
        default_scene_secs: f64,
    ) -> Result<Self, JobValidationError> {
        job.validate()?;

        let mut manifest = ConcatManifest::new();
        let scenes = job
            .scenes
            .iter()
            .enumerate()
            .map(|(i, scene)| {
                let file_name = scene.input_file_name(i);
                manifest.push(file_name.clone(), scene.timeline_duration(default_scene_secs));
                PlannedFetch::new(file_name, scene.source_url.clone())
            })
            .collect();

        let mut mix = AudioMixGraph::new(job.volumes.narration);
        let mut audio_beds = Vec::new();
        if let Some(url) = &job.bgm_url {
            mix = mix.with_track(TrackKind::BackgroundMusic, job.volumes.background_music);
            audio_beds.push(PlannedFetch::new(BGM_FILE, url.clone()));
        }
        if let Some(url) = &job.sfx_url {
            mix = mix.with_track(TrackKind::SoundEffects, job.volumes.sound_effects);
            audio_beds.push(PlannedFetch::new(SFX_FILE, url.clone()));
        }

        Ok(Self {
            narration: PlannedFetch::new(NARRATION_FILE, job.narration_url.clone()),
            scenes,
            audio_beds,
            manifest,
            mix,
            encoding: encoding.clone(),
        })
    }

    /// Visual timeline length in milliseconds.
    pub fn timeline_ms(&self) -> i64 {
        (self.manifest.total_duration() * 1000.0).round() as i64
    }

    /// Narration and scene downloads, in fetch order.
    pub fn visual_fetches(&self) -> impl Iterator<Item = &PlannedFetch> {
        std::iter::once(&self.narration).chain(self.scenes.iter())
    }

    /// Concatenate scene files into one continuous video stream.
    pub fn concat_command(&self) -> FfmpegCommand {
        FfmpegCommand::new(CONCAT_VIDEO_FILE)
            .input_with_args(["-f", "concat", "-safe", "0"], CONCAT_MANIFEST_FILE)
            .vsync("vfr")
            .pixel_format(self.encoding.pixel_format.clone())
    }

    /// Mix the audio tracks and mux them with the concatenated video.
    ///
    /// Audio inputs come first so their indices match the mix graph; the
    /// video stream is the last input.
    pub fn mux_command(&self) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new(OUTPUT_FILE).input(NARRATION_FILE);
        for bed in &self.audio_beds {
            cmd = cmd.input(bed.file_name.clone());
        }
        let video_index = self.mix.input_count();
        cmd.input(CONCAT_VIDEO_FILE)
            .filter_complex(self.mix.filter_complex())
            .map(format!("{}:v", video_index))
            .map(MIX_OUTPUT_LABEL)
            .encoding(&self.encoding)
    }
}
