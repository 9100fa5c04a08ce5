//! FFmpeg command builder.

use std::path::PathBuf;

use reel_models::EncodingConfig;

use crate::error::{MediaError, MediaResult};

/// One `-i` input with the options that precede it.
#[derive(Debug, Clone, PartialEq)]
struct FfmpegInput {
    args: Vec<String>,
    path: String,
}

/// Builder for FFmpeg commands.
///
/// Paths are names inside the engine's working storage.
#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegCommand {
    inputs: Vec<FfmpegInput>,
    /// Output file name
    output: String,
    /// Output arguments (after all inputs)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing `output`.
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.into(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input file.
    pub fn input(self, path: impl Into<String>) -> Self {
        self.input_with_args(Vec::<String>::new(), path)
    }

    /// Add an input file preceded by input options (e.g. `-f concat`).
    pub fn input_with_args<I, S>(mut self, args: I, path: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push(FfmpegInput {
            args: args.into_iter().map(Into::into).collect(),
            path: path.into(),
        });
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Select a stream or filter output label for the output.
    pub fn map(self, spec: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(spec)
    }

    /// Set pixel format.
    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Set video sync method (e.g. `vfr`).
    pub fn vsync(self, mode: impl Into<String>) -> Self {
        self.output_arg("-vsync").output_arg(mode)
    }

    /// Apply codec, quality and bitrate settings.
    pub fn encoding(self, config: &EncodingConfig) -> Self {
        self.output_args(config.to_ffmpeg_args())
    }

    /// Extract single frame.
    pub fn single_frame(self) -> Self {
        self.output_arg("-frames:v").output_arg("1")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Input file names in `-i` order.
    pub fn input_paths(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| i.path.as_str()).collect()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.path.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.clone());

        args
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_builder() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input_with_args(["-f", "concat", "-safe", "0"], "concat.txt")
            .vsync("vfr")
            .pixel_format("yuv420p");

        assert_eq!(
            cmd.build_args(),
            vec![
                "-y", "-v", "error", "-progress", "pipe:2", "-f", "concat", "-safe", "0", "-i",
                "concat.txt", "-vsync", "vfr", "-pix_fmt", "yuv420p", "out.mp4"
            ]
        );
    }

    #[test]
    fn test_multiple_inputs_keep_order() {
        let cmd = FfmpegCommand::new("output.mp4")
            .input("narration.mp3")
            .input("bgm.mp3")
            .input("temp_video.mp4")
            .map("2:v")
            .map("[a]");

        assert_eq!(cmd.input_paths(), vec!["narration.mp3", "bgm.mp3", "temp_video.mp4"]);
        let args = cmd.build_args();
        let last_input = args.iter().rposition(|a| a == "-i").unwrap();
        assert_eq!(args[last_input + 1], "temp_video.mp4");
        assert_eq!(args.last().unwrap(), "output.mp4");
    }

    #[test]
    fn test_encoding_args() {
        let args = FfmpegCommand::new("o.mp4")
            .input("i.mp4")
            .encoding(&EncodingConfig::default())
            .build_args();
        assert!(args.windows(2).any(|w| w == ["-crf", "23"]));
        assert!(args.windows(2).any(|w| w == ["-b:a", "192k"]));
    }
}
