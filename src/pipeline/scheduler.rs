//! Lookahead scheduling.
//!
//! The caller ticks the scheduler every few tens of milliseconds with no
//! promise of punctuality. Each tick emits every step that falls inside the
//! window `now + schedule_ahead`, stamped with an absolute time taken from a
//! running accumulator rather than from `now`, so late ticks never drift the
//! beat. The host plays each step at its stamped time.

use crate::audio_api::Clock;
use crate::error::{EngineError, Result};
use crate::shared::{step_duration, TriggerEvent, NUM_STEPS};

pub const DEFAULT_SCHEDULE_AHEAD: f64 = 0.1;

// Outside this range a step is either too short to move the f64 note clock
// or so long that a bounce would need billions of frames.
pub const MIN_TEMPO_BPM: f64 = 1.0;
pub const MAX_TEMPO_BPM: f64 = 1000.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

#[derive(Clone, Debug)]
pub struct LookaheadScheduler {
    state: TransportState,
    current_step: usize,
    next_note_time: f64,
    tempo_bpm: f64,
    schedule_ahead: f64,
}

impl LookaheadScheduler {
    pub fn new(tempo_bpm: f64, schedule_ahead: f64) -> Result<Self> {
        check_tempo(tempo_bpm)?;
        Ok(Self {
            state: TransportState::Stopped,
            current_step: 0,
            next_note_time: 0.0,
            tempo_bpm,
            schedule_ahead,
        })
    }

    /// Rewind to step 0 at the clock's current time. Starting an already
    /// running scheduler does nothing.
    pub fn start<C: Clock + ?Sized>(&mut self, clock: &C) -> Result<()> {
        if self.state == TransportState::Running {
            return Ok(());
        }
        let now = clock.now().ok_or(EngineError::ClockUnavailable)?;
        self.current_step = 0;
        self.next_note_time = now;
        self.state = TransportState::Running;
        Ok(())
    }

    // Future ticks become no-ops. Whatever was already handed to the host
    // still plays.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
    }

    /// Applies from the next interval on; times already computed stay put.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<()> {
        check_tempo(bpm)?;
        self.tempo_bpm = bpm;
        Ok(())
    }

    pub fn tempo(&self) -> f64 {
        self.tempo_bpm
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TransportState::Running
    }

    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn next_note_time(&self) -> f64 {
        self.next_note_time
    }

    /// Emit every step due before `now + schedule_ahead`. Returns how many
    /// were emitted.
    pub fn tick(&mut self, now: f64, mut on_event: impl FnMut(TriggerEvent)) -> usize {
        if self.state != TransportState::Running {
            return 0;
        }
        if !now.is_finite() {
            log::warn!("ignoring scheduler tick at non-finite time {}", now);
            return 0;
        }

        let horizon = now + self.schedule_ahead;
        let mut emitted = 0;
        while self.next_note_time < horizon {
            on_event(TriggerEvent::new(self.current_step, self.next_note_time));
            self.advance();
            emitted += 1;
        }
        emitted
    }

    fn advance(&mut self) {
        self.next_note_time += step_duration(self.tempo_bpm);
        self.current_step = (self.current_step + 1) % NUM_STEPS;
    }
}

pub(crate) fn check_tempo(bpm: f64) -> Result<()> {
    if (MIN_TEMPO_BPM..=MAX_TEMPO_BPM).contains(&bpm) {
        Ok(())
    } else {
        Err(EngineError::InvalidTempo(bpm))
    }
}
