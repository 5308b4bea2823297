use std::sync::Arc;

use crate::audio_api::{AudioHost, EffectSpec, PlaybackRequest};
use crate::shared::TriggerEvent;

use super::trigger_table::TriggerTable;
use super::track::Track;

/// Turns trigger events into host playback requests.
///
/// Holds the robot-mode curve so every distorted trigger shares one table;
/// the host still builds a separate shaper node per request.
pub struct PlaybackDispatcher {
    curve: Arc<[f32]>,
}

impl PlaybackDispatcher {
    pub fn new(curve: Vec<f32>) -> Self {
        Self { curve: Arc::from(curve) }
    }

    pub fn curve(&self) -> &Arc<[f32]> {
        &self.curve
    }

    /// Request playback for every armed track with a sample at `event.step`.
    /// Returns the number of requests sent.
    pub fn dispatch<H: AudioHost + ?Sized>(
        &self,
        event: TriggerEvent,
        grid: &TriggerTable,
        tracks: &[Track],
        host: &mut H,
    ) -> usize {
        let mut sent = 0;
        for track in grid.armed_tracks(event.step) {
            // an armed step on an empty track is just silence
            let Some(state) = tracks.get(track) else { continue };
            let Some(buffer) = state.sample() else { continue };

            let effect = state
                .effect_mode()
                .then(|| EffectSpec::WaveShaper { curve: Arc::clone(&self.curve) });
            host.schedule_playback(PlaybackRequest {
                track,
                buffer: Arc::clone(buffer),
                start_time: event.time,
                effect,
            });
            sent += 1;
        }
        sent
    }
}
