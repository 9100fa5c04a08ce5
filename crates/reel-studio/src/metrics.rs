//! Prometheus metrics for scene generation and rendering.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{StudioError, StudioResult};

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> StudioResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| StudioError::config_error(format!("Failed to install Prometheus recorder: {}", e)))
}

/// Metric names as constants for consistency.
pub mod names {
    // Scene generation
    pub const SCENES_ACQUIRED_TOTAL: &str = "reel_scenes_acquired_total";
    pub const SCENES_SKIPPED_TOTAL: &str = "reel_scenes_skipped_total";
    pub const RATE_LIMIT_ABORTS_TOTAL: &str = "reel_rate_limit_aborts_total";

    // Rendering
    pub const RENDERS_COMPLETED_TOTAL: &str = "reel_renders_completed_total";
    pub const RENDERS_FAILED_TOTAL: &str = "reel_renders_failed_total";
    pub const RENDER_DURATION_SECONDS: &str = "reel_render_duration_seconds";
}

pub fn record_scene_acquired(source: &str) {
    counter!(names::SCENES_ACQUIRED_TOTAL, "source" => source.to_string()).increment(1);
}

pub fn record_scene_skipped(source: &str) {
    counter!(names::SCENES_SKIPPED_TOTAL, "source" => source.to_string()).increment(1);
}

pub fn record_rate_limit_abort(source: &str) {
    counter!(names::RATE_LIMIT_ABORTS_TOTAL, "source" => source.to_string()).increment(1);
}

/// Record a finished render and its wall-clock duration.
pub fn record_render_completed(duration_secs: f64) {
    counter!(names::RENDERS_COMPLETED_TOTAL).increment(1);
    histogram!(names::RENDER_DURATION_SECONDS).record(duration_secs);
}

pub fn record_render_failed(stage: &str) {
    counter!(names::RENDERS_FAILED_TOTAL, "stage" => stage.to_string()).increment(1);
}
