//! Narration speakers and TTS voice assignment.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Full TTS voice catalog.
pub const TTS_VOICES: &[&str] = &[
    "Aoede", "Orus", "Kore", "Charon", "Puck", "Fenrir", "Zephyr", "Calypso", "Ligeia", "Tiamat",
    "Typhon",
];

/// Voices handed out first, in order, while they are still unused.
pub const PREFERRED_VOICES: &[&str] = &["Aoede", "Orus", "Kore", "Charon"];

const DEFAULT_SPEAKER_NAME: &str = "Speaker 1";

/// A labelled voice in the narration script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Speaker {
    pub id: u32,
    pub display_name: String,
    pub voice_id: String,
}

/// Voice configuration passed to speech synthesis.
///
/// `speaker` is `None` for single-speaker synthesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceAssignment {
    pub speaker: Option<String>,
    pub voice: String,
}

/// Ordered set of speakers, at most one per distinct label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerRoster {
    speakers: Vec<Speaker>,
    next_id: u32,
}

impl Default for SpeakerRoster {
    fn default() -> Self {
        Self {
            speakers: vec![Speaker {
                id: 1,
                display_name: DEFAULT_SPEAKER_NAME.to_string(),
                voice_id: PREFERRED_VOICES[0].to_string(),
            }],
            next_id: 2,
        }
    }
}

fn label_regex() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(r"(?m)^([A-Za-z0-9_]+):").expect("speaker label regex is valid")
    })
}

/// Unique leading `Name:` labels in order of first appearance.
///
/// A label is a single word at the very start of a line, so prose such as
/// `Note well: ...` or an indented `Name:` is not taken for a speaker.
pub fn speaker_labels(script: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    label_regex()
        .captures_iter(script)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Pick a voice for the speaker at `index` given voices already taken.
fn pick_voice(index: usize, used: &HashSet<String>) -> String {
    if let Some(preferred) = PREFERRED_VOICES.get(index) {
        if !used.contains(*preferred) {
            return preferred.to_string();
        }
    }
    TTS_VOICES
        .iter()
        .find(|v| !used.contains(**v))
        .unwrap_or(&TTS_VOICES[index % TTS_VOICES.len()])
        .to_string()
}

impl SpeakerRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn used_voices(&self) -> HashSet<String> {
        self.speakers.iter().map(|s| s.voice_id.clone()).collect()
    }

    /// Rebuild the roster from the labels found in `script`.
    ///
    /// Speakers whose label is still present keep their id and voice. When no
    /// labels are found a multi-speaker roster collapses to the default single
    /// speaker; a single-speaker roster is left alone.
    pub fn extract_from_script(&mut self, script: &str) {
        let labels = speaker_labels(script);

        if labels.is_empty() {
            if self.speakers.len() > 1 {
                let next_id = self.next_id;
                *self = Self::default();
                self.speakers[0].id = next_id;
                self.next_id = next_id + 1;
            }
            return;
        }

        let mut rebuilt: Vec<Option<Speaker>> = labels
            .iter()
            .map(|name| {
                self.speakers
                    .iter()
                    .find(|s| &s.display_name == name)
                    .cloned()
            })
            .collect();

        let mut used: HashSet<String> = rebuilt
            .iter()
            .flatten()
            .map(|s| s.voice_id.clone())
            .collect();

        for (index, slot) in rebuilt.iter_mut().enumerate() {
            if slot.is_none() {
                let voice = pick_voice(index, &used);
                used.insert(voice.clone());
                *slot = Some(Speaker {
                    id: self.allocate_id(),
                    display_name: labels[index].clone(),
                    voice_id: voice,
                });
            }
        }

        self.speakers = rebuilt.into_iter().flatten().collect();
    }

    /// Append a new `Speaker N` with the next preferred unused voice.
    pub fn add_speaker(&mut self) -> &Speaker {
        let index = self.speakers.len();
        let voice = pick_voice(index, &self.used_voices());
        let id = self.allocate_id();
        self.speakers.push(Speaker {
            id,
            display_name: format!("Speaker {}", index + 1),
            voice_id: voice,
        });
        &self.speakers[index]
    }

    /// Remove a speaker by id. Returns `true` if one was removed.
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.speakers.len();
        self.speakers.retain(|s| s.id != id);
        self.speakers.len() != before
    }

    pub fn rename(&mut self, id: u32, name: impl Into<String>) -> bool {
        match self.speakers.iter_mut().find(|s| s.id == id) {
            Some(speaker) => {
                speaker.display_name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn set_voice(&mut self, id: u32, voice: impl Into<String>) -> bool {
        match self.speakers.iter_mut().find(|s| s.id == id) {
            Some(speaker) => {
                speaker.voice_id = voice.into();
                true
            }
            None => false,
        }
    }

    /// Voice configuration for speech synthesis.
    pub fn voice_assignments(&self) -> Vec<VoiceAssignment> {
        match self.speakers.as_slice() {
            [single] => vec![VoiceAssignment {
                speaker: None,
                voice: single.voice_id.clone(),
            }],
            many => many
                .iter()
                .map(|s| VoiceAssignment {
                    speaker: Some(s.display_name.clone()),
                    voice: s.voice_id.clone(),
                })
                .collect(),
        }
    }
}
