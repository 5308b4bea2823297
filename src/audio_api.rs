use std::sync::Arc;

pub use crate::audio::{Effect, EffectSpec, PcmBuffer};
use crate::error::Result;

/// Monotonic audio time in seconds. `None` means the clock cannot be read.
pub trait Clock {
    fn now(&self) -> Option<f64>;
}

/// One fire-and-forget request: play `buffer` at `start_time` on the host
/// clock, optionally through an effect. Nothing keeps a handle to it once it
/// has been submitted.
#[derive(Clone, Debug)]
pub struct PlaybackRequest {
    pub track: usize,
    pub buffer: Arc<PcmBuffer>,
    pub start_time: f64,
    pub effect: Option<EffectSpec>,
}

/// The slice of a host audio subsystem the sequencer needs.
pub trait AudioHost: Clock {
    /// Must not block and must not wait for `start_time`.
    fn schedule_playback(&mut self, request: PlaybackRequest);

    fn sample_rate(&self) -> u32;
}

/// Microphone (or any other) capture that hands back raw container bytes.
/// Dropping a handle without stopping it abandons the capture.
pub trait CaptureDevice {
    type Handle;

    fn start_capture(&mut self) -> Result<Self::Handle>;

    fn stop_capture(&mut self, handle: Self::Handle) -> Result<Vec<u8>>;
}

// What actually crosses into the mixer. The effect node is built on the
// control side so the audio thread never allocates one.
pub enum AudioCommand {
    Play {
        request: PlaybackRequest,
        effect: Option<Box<dyn Effect>>,
    },
}

impl AudioCommand {
    pub fn play(request: PlaybackRequest) -> Self {
        let effect = request.effect.as_ref().map(EffectSpec::to_effect);
        AudioCommand::Play { request, effect }
    }
}
