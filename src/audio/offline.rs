use crate::audio_api::{AudioCommand, AudioHost, Clock, PlaybackRequest};
use crate::error::Result;

use super::engine::Engine;
use super::frame::StereoFrame;
use super::pcm_buffer::PcmBuffer;

const RENDER_BLOCK: usize = 512;

/// A host with a virtual clock. Requests are collected as they are scheduled
/// and mixed afterwards in one go, as fast as the CPU allows.
pub struct OfflineHost {
    now: f64,
    sample_rate: u32,
    requests: Vec<PlaybackRequest>,
}

impl OfflineHost {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            now: 0.0,
            sample_rate,
            requests: Vec::new(),
        }
    }

    // The virtual clock only moves forward
    pub fn advance_to(&mut self, t: f64) {
        if t > self.now {
            self.now = t;
        }
    }

    pub fn requests(&self) -> &[PlaybackRequest] {
        &self.requests
    }

    /// Mix every collected request into exactly `duration_secs` of audio.
    pub fn render(self, duration_secs: f64, num_channels: u16, master_gain: f32) -> Result<PcmBuffer> {
        let total_frames = (duration_secs.max(0.0) * self.sample_rate as f64).ceil() as usize;
        let mut engine = Engine::new(self.sample_rate, master_gain);
        for request in self.requests {
            engine.handle_cmd(AudioCommand::play(request));
        }

        let mut mix = vec![StereoFrame::zero(); total_frames];
        for block in mix.chunks_mut(RENDER_BLOCK) {
            engine.render_block(block);
        }
        PcmBuffer::from_stereo_frames(self.sample_rate, num_channels, &mix)
    }
}

impl Clock for OfflineHost {
    fn now(&self) -> Option<f64> {
        Some(self.now)
    }
}

impl AudioHost for OfflineHost {
    fn schedule_playback(&mut self, request: PlaybackRequest) {
        self.requests.push(request);
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
