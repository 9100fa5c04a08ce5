//! Lifecycle logging for scene runs and renders.
//!
//! Every line carries the run id, the operation and the time since the run
//! started, so interleaved runs can be told apart in aggregated logs.

use std::time::Instant;

use tracing::{error, info, warn, Span};

use reel_models::JobId;

#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: &'static str,
    started: Instant,
}

impl JobLogger {
    /// `operation` is a fixed name such as `"generate_scenes"` or `"render"`.
    pub fn new(job_id: &JobId, operation: &'static str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation,
            started: Instant::now(),
        }
    }

    /// Logger for a run that has no job of its own yet.
    pub fn fresh(operation: &'static str) -> Self {
        Self::new(&JobId::new(), operation)
    }

    fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            "{} started: {}", self.operation, message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            elapsed_ms = self.elapsed_ms(),
            "{}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            operation = self.operation,
            elapsed_ms = self.elapsed_ms(),
            "{}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = self.operation,
            elapsed_ms = self.elapsed_ms(),
            "{} failed: {}", self.operation, message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = self.operation,
            elapsed_ms = self.elapsed_ms(),
            "{} finished: {}", self.operation, message
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn operation(&self) -> &str {
        self.operation
    }

    /// Span covering the whole run.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("run", job_id = %self.job_id, operation = self.operation)
    }
}
