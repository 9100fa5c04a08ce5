//! Slideshow preview clock.
//!
//! A single interval clock advances the scene cursor while the three audio
//! tracks play independently. There is no drift correction.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use reel_models::TrackKind;

use crate::audio_tracks::AudioTrackManager;
use crate::error::{StudioError, StudioResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Stopped,
    Playing,
}

/// What the clock did on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewTick {
    /// The cursor moved to this scene.
    Scene(usize),
    /// The last scene finished; the preview stopped and rewound.
    Finished,
}

/// Fixed-period clock. The first tick fires one period after start.
struct IntervalClock {
    interval: Interval,
}

impl IntervalClock {
    fn start(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

/// Drives the scene cursor and the audio tracks during preview.
pub struct PreviewSynchronizer {
    period: Duration,
    cursor: usize,
    clock: Option<IntervalClock>,
}

impl PreviewSynchronizer {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            cursor: 0,
            clock: None,
        }
    }

    pub fn state(&self) -> PreviewState {
        if self.clock.is_some() {
            PreviewState::Playing
        } else {
            PreviewState::Stopped
        }
    }

    /// Index of the visible scene.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Rewind to the first scene, for a new scene sequence.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }

    /// Start playback. Needs at least one scene and a narration source.
    ///
    /// Starting at the last scene, or after narration ended, rewinds the
    /// cursor and every track.
    pub fn play(&mut self, scene_count: usize, tracks: &mut AudioTrackManager) -> StudioResult<()> {
        if scene_count == 0 || tracks.track(TrackKind::Narration).source().is_none() {
            return Err(StudioError::PreviewNotReady);
        }
        if self.state() == PreviewState::Playing {
            return Ok(());
        }

        tracks.pause_all();
        if self.cursor + 1 >= scene_count || tracks.narration_ended() {
            self.cursor = 0;
            tracks.seek_all(Duration::ZERO);
        }
        tracks.play_all();
        self.clock = Some(IntervalClock::start(self.period));
        debug!(scene_count, cursor = self.cursor, "Preview started");
        Ok(())
    }

    /// Pause every track and drop the clock.
    pub fn stop(&mut self, tracks: &mut AudioTrackManager) {
        tracks.pause_all();
        if self.clock.take().is_some() {
            debug!(cursor = self.cursor, "Preview stopped");
        }
    }

    /// Wait for the next tick. `None` when stopped.
    pub async fn next_tick(
        &mut self,
        scene_count: usize,
        tracks: &mut AudioTrackManager,
    ) -> Option<PreviewTick> {
        self.clock.as_mut()?.tick().await;

        if self.cursor + 1 < scene_count {
            self.cursor += 1;
            Some(PreviewTick::Scene(self.cursor))
        } else {
            self.stop(tracks);
            self.cursor = 0;
            Some(PreviewTick::Finished)
        }
    }
}
