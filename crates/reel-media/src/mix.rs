//! Audio mix filter graphs.

use reel_models::{TrackKind, Volume};

/// Filter label of the mixed audio bus.
pub const MIX_OUTPUT_LABEL: &str = "[a]";

fn label(track: TrackKind) -> &'static str {
    match track {
        TrackKind::Narration => "nar",
        TrackKind::BackgroundMusic => "bgm",
        TrackKind::SoundEffects => "sfx",
    }
}

/// Per-track gain followed by a mix into one bus.
///
/// Input `i` of the graph is FFmpeg input `i`; narration is always input 0.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioMixGraph {
    inputs: Vec<(TrackKind, Volume)>,
}

impl AudioMixGraph {
    pub fn new(narration: Volume) -> Self {
        Self {
            inputs: vec![(TrackKind::Narration, narration)],
        }
    }

    /// Add an optional track as the next input.
    pub fn with_track(mut self, track: TrackKind, gain: Volume) -> Self {
        self.inputs.push((track, gain));
        self
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn tracks(&self) -> impl Iterator<Item = TrackKind> + '_ {
        self.inputs.iter().map(|(t, _)| *t)
    }

    /// `-filter_complex` value producing [`MIX_OUTPUT_LABEL`].
    ///
    /// Narration alone is a single gain stage. With more tracks every gain
    /// stage feeds one `amix` lasting as long as the longest input, with
    /// normalization off so the gains match preview loudness.
    pub fn filter_complex(&self) -> String {
        if let [(_, gain)] = self.inputs.as_slice() {
            return format!("[0:a]volume={}{}", gain, MIX_OUTPUT_LABEL);
        }

        let mut parts: Vec<String> = self
            .inputs
            .iter()
            .enumerate()
            .map(|(i, (track, gain))| format!("[{}:a]volume={}[{}]", i, gain, label(*track)))
            .collect();

        let bus: String = self
            .inputs
            .iter()
            .map(|(track, _)| format!("[{}]", label(*track)))
            .collect();

        parts.push(format!(
            "{}amix=inputs={}:duration=longest:dropout_transition=0:normalize=0{}",
            bus,
            self.inputs.len(),
            MIX_OUTPUT_LABEL
        ));
        parts.join(";")
    }
}
