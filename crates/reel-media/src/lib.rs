//! FFmpeg-backed media engine for slideshow rendering.
//!
//! This crate provides:
//! - The `MediaEngine` seam (working storage + command execution)
//! - An FFmpeg CLI implementation with progress parsing from `-progress pipe:2`
//! - Type-safe FFmpeg command building
//! - Concat manifests, audio mix graphs and the pure `RenderPlan`

pub mod command;
pub mod concat;
pub mod engine;
pub mod error;
pub mod ffmpeg;
pub mod filters;
pub mod mix;
pub mod plan;
pub mod progress;

pub use command::{check_ffmpeg, FfmpegCommand};
pub use concat::ConcatManifest;
pub use engine::{FileData, MediaEngine};
pub use error::{MediaError, MediaResult};
pub use ffmpeg::FfmpegEngine;
pub use mix::AudioMixGraph;
pub use plan::{PlannedFetch, RenderPlan};
pub use progress::{EngineEvent, EngineEventSender, FfmpegProgress};
