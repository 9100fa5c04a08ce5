//! FFmpeg CLI media engine backed by a local working directory.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use metrics::histogram;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::command::{check_ffmpeg, FfmpegCommand};
use crate::engine::{FileData, MediaEngine};
use crate::error::{MediaError, MediaResult};
use crate::progress::{is_progress_line, parse_progress_line, EngineEventSender, FfmpegProgress};

/// Stderr lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 20;

/// Media engine that runs the `ffmpeg` binary inside `work_dir`.
pub struct FfmpegEngine {
    work_dir: PathBuf,
    ffmpeg: OnceCell<PathBuf>,
    timeout: Option<Duration>,
}

impl FfmpegEngine {
    /// Create an engine over `work_dir`. It is not ready until [`load`](Self::load).
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ffmpeg: OnceCell::new(),
            timeout: None,
        }
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Locate the FFmpeg binary and create the working directory.
    pub async fn load(&self) -> MediaResult<()> {
        let path = check_ffmpeg()?;
        tokio::fs::create_dir_all(&self.work_dir).await?;
        info!(ffmpeg = %path.display(), work_dir = %self.work_dir.display(), "Media engine loaded");
        let _ = self.ffmpeg.set(path);
        Ok(())
    }

    /// Resolve a working-storage name to a path, rejecting anything that
    /// would escape the working directory.
    fn resolve(&self, name: &str) -> MediaResult<PathBuf> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\\');
        if !valid {
            return Err(MediaError::InvalidFileName(name.to_string()));
        }
        Ok(self.work_dir.join(name))
    }
}

#[async_trait]
impl MediaEngine for FfmpegEngine {
    fn is_ready(&self) -> bool {
        self.ffmpeg.initialized()
    }

    async fn reset(&self) -> MediaResult<()> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        let mut entries = tokio::fs::read_dir(&self.work_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(&path).await?;
            } else {
                tokio::fs::remove_file(&path).await?;
            }
        }
        debug!(work_dir = %self.work_dir.display(), "Working storage cleared");
        Ok(())
    }

    async fn write_file(&self, name: &str, data: &[u8]) -> MediaResult<()> {
        let path = self.resolve(name)?;
        tokio::fs::write(&path, data).await?;
        debug!(file = name, bytes = data.len(), "Wrote working file");
        Ok(())
    }

    async fn read_file(&self, name: &str) -> MediaResult<FileData> {
        let path = self.resolve(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(FileData::Binary(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(MediaError::FileNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exec(
        &self,
        command: &FfmpegCommand,
        events: Option<&EngineEventSender>,
    ) -> MediaResult<()> {
        let ffmpeg = self.ffmpeg.get().ok_or(MediaError::EngineNotReady)?;

        let args = command.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));
        let started = Instant::now();

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;
        let events = events.cloned();

        // Split stderr into progress snapshots and log lines
        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            let mut current = FfmpegProgress::default();
            let mut tail: Vec<String> = Vec::new();

            while let Ok(Some(line)) = lines.next_line().await {
                if is_progress_line(&line) {
                    if let Some(snapshot) = parse_progress_line(&line, &mut current) {
                        if let Some(events) = &events {
                            events.progress(snapshot);
                        }
                    }
                    continue;
                }
                if line.trim().is_empty() {
                    continue;
                }
                debug!(target: "reel_media::ffmpeg", "{}", line);
                if let Some(events) = &events {
                    events.log(line.clone());
                }
                if tail.len() == STDERR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
            tail
        });

        let status = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    warn!("FFmpeg timed out after {} seconds, killing process", timeout.as_secs());
                    let _ = child.kill().await;
                    return Err(MediaError::Timeout(timeout.as_secs()));
                }
            },
            None => child.wait().await?,
        };

        let tail = reader.await.unwrap_or_default();
        histogram!("reel_ffmpeg_exec_seconds").record(started.elapsed().as_secs_f64());

        if status.success() {
            return Ok(());
        }

        let message = tail
            .last()
            .cloned()
            .unwrap_or_else(|| "FFmpeg exited with non-zero status".to_string());
        Err(MediaError::ffmpeg_failed(
            message,
            Some(tail.join("\n")),
            status.code(),
        ))
    }
}
