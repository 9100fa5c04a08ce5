//! Concat demuxer manifests.

use std::fmt::Write;

/// Input list for FFmpeg's concat demuxer.
///
/// Every entry carries a `duration` line. The last file is listed a second
/// time so the demuxer honours its duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcatManifest {
    entries: Vec<(String, f64)>,
}

impl ConcatManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file_name: impl Into<String>, duration_secs: f64) {
        self.entries.push((file_name.into(), duration_secs));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all entry durations in seconds.
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|(_, d)| d).sum()
    }

    /// Manifest file contents.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (file, duration) in &self.entries {
            let _ = writeln!(out, "file '{}'", escape(file));
            let _ = writeln!(out, "duration {}", duration);
        }
        if let Some((last, _)) = self.entries.last() {
            let _ = writeln!(out, "file '{}'", escape(last));
        }
        out
    }
}

fn escape(file_name: &str) -> String {
    file_name.replace('\'', r"'\''")
}
