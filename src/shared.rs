// Grid layout:
//
//            step 0 1 2 3 4 5 6 7
//   track 0       x . . . x . . .     each row owns one recorded sample
//   track 1       . . x . . . x .     and one robot (distortion) toggle
//   ...
//   track 5       . . . . . . . .
//
// The scheduler walks the columns left to right in eighth notes and wraps.
// Everything the control layer and the host exchange goes through the small
// value types in here and in audio_api.rs.

pub const NUM_TRACKS: usize = 6;
pub const NUM_STEPS: usize = 8;

// one scheduled column hit, at an absolute clock time in seconds
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerEvent {
    pub step: usize,
    pub time: f64,
}

impl TriggerEvent {
    pub fn new(step: usize, time: f64) -> Self {
        Self { step, time }
    }
}

// Seconds per step at a given tempo. Steps are eighth notes.
pub fn step_duration(bpm: f64) -> f64 {
    let seconds_per_beat = 60.0 / bpm;
    seconds_per_beat / 2.0
}

// Length of `loops` full passes over the grid.
pub fn loop_duration(bpm: f64, loops: u32) -> f64 {
    step_duration(bpm) * NUM_STEPS as f64 * loops as f64
}
