use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::audio_api::AudioCommand;

use super::effect::Effect;
use super::frame::StereoFrame;
use super::pcm_buffer::PcmBuffer;
use super::voice::Voice;

const VOICE_CAPACITY: usize = 64; // preallocated so a busy grid doesn't grow the pool mid-callback
const TRIGGER_GAIN: f32 = 1.0;

// submitted but not yet sounding
struct ScheduledVoice {
    start_frame: u64,
    buffer: Arc<PcmBuffer>,
    effect: Option<Box<dyn Effect>>,
}

struct PlayingVoice {
    delay: usize, // frames of silence before the voice starts inside the current block
    voice: Voice,
    buffer: Arc<PcmBuffer>,
    effect: Option<Box<dyn Effect>>,
}

/// The mix bus. Turns timed playback commands into audio, block by block,
/// and owns the frame counter the host clock is derived from.
pub struct Engine {
    sample_rate: u32,
    master_gain: f32,
    frames_rendered: u64,
    clock: Arc<AtomicU64>,
    pending: Vec<ScheduledVoice>,
    voices: Vec<PlayingVoice>,
    scratch: Vec<StereoFrame>,
}

impl Engine {
    pub fn new(sample_rate: u32, master_gain: f32) -> Self {
        Self {
            sample_rate,
            master_gain,
            frames_rendered: 0,
            clock: Arc::new(AtomicU64::new(0)),
            pending: Vec::with_capacity(VOICE_CAPACITY),
            voices: Vec::with_capacity(VOICE_CAPACITY),
            scratch: Vec::new(),
        }
    }

    // Frame counter shared with whoever reads the clock
    pub fn clock(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.clock)
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.voices.is_empty()
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Play { request, effect } => {
                // a start time already in the past plays right away
                let start_frame = (request.start_time.max(0.0) * self.sample_rate as f64).round() as u64;
                self.pending.push(ScheduledVoice {
                    start_frame,
                    buffer: request.buffer,
                    effect,
                });
            }
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        out.fill(StereoFrame::zero());
        let block_len = out.len();
        let block_start = self.frames_rendered;
        let block_end = block_start + block_len as u64;

        // wake up everything due before the end of this block
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].start_frame < block_end {
                let due = self.pending.swap_remove(i);
                let delay = due.start_frame.saturating_sub(block_start) as usize;
                self.voices.push(PlayingVoice {
                    delay,
                    voice: Voice::new(due.buffer.sample_rate(), self.sample_rate, TRIGGER_GAIN),
                    buffer: due.buffer,
                    effect: due.effect,
                });
            } else {
                i += 1;
            }
        }

        if self.scratch.len() < block_len {
            self.scratch.resize(block_len, StereoFrame::zero());
        }

        for pv in self.voices.iter_mut() {
            let offset = pv.delay.min(block_len);
            pv.delay -= offset;
            let span = block_len - offset;
            if span == 0 {
                continue;
            }

            let scratch = &mut self.scratch[..span];
            scratch.fill(StereoFrame::zero());
            let written = pv.voice.render_into(&pv.buffer, scratch);
            if let Some(fx) = pv.effect.as_mut() {
                fx.process(&mut scratch[..written]);
            }
            for (o, s) in out[offset..offset + written].iter_mut().zip(scratch.iter()) {
                o.left += s.left;
                o.right += s.right;
            }
        }
        self.voices.retain(|pv| pv.voice.active);

        if self.master_gain != 1.0 {
            for f in out.iter_mut() {
                *f = f.scaled(self.master_gain);
            }
        }

        self.frames_rendered = block_end;
        self.clock.store(block_end, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::PlaybackRequest;
    use crate::audio::EffectSpec;

    fn click(rate: u32) -> Arc<PcmBuffer> {
        Arc::new(PcmBuffer::mono(rate, vec![1.0, 0.5]).unwrap())
    }

    fn play(engine: &mut Engine, buffer: Arc<PcmBuffer>, start_time: f64, effect: Option<EffectSpec>) {
        engine.handle_cmd(AudioCommand::play(PlaybackRequest { track: 0, buffer, start_time, effect }));
    }

    #[test]
    fn voice_starts_on_its_exact_frame_across_blocks() {
        let mut engine = Engine::new(100, 1.0);
        play(&mut engine, click(100), 0.13, None); // frame 13

        let mut block = [StereoFrame::zero(); 10];
        engine.render_block(&mut block);
        assert!(block.iter().all(|f| *f == StereoFrame::zero()));

        engine.render_block(&mut block);
        assert_eq!(block[2], StereoFrame::zero());
        assert_eq!(block[3], StereoFrame::mono(1.0));
        assert_eq!(block[4], StereoFrame::mono(0.5));
        assert_eq!(block[5], StereoFrame::zero());
        assert!(engine.is_idle());
        assert_eq!(engine.clock().load(Ordering::Acquire), 20);
    }

    #[test]
    fn late_requests_start_immediately() {
        let mut engine = Engine::new(100, 1.0);
        let mut block = [StereoFrame::zero(); 4];
        engine.render_block(&mut block);
        play(&mut engine, click(100), 0.0, None);
        engine.render_block(&mut block);
        assert_eq!(block[0], StereoFrame::mono(1.0));
    }

    #[test]
    fn overlapping_voices_sum_and_master_gain_applies() {
        let mut engine = Engine::new(100, 0.5);
        play(&mut engine, click(100), 0.0, None);
        play(&mut engine, click(100), 0.0, None);
        let mut block = [StereoFrame::zero(); 2];
        engine.render_block(&mut block);
        assert_eq!(block[0], StereoFrame::mono(1.0));
        assert_eq!(block[1], StereoFrame::mono(0.5));
    }

    #[test]
    fn effect_is_applied_per_voice() {
        let mut engine = Engine::new(100, 1.0);
        let flat = EffectSpec::WaveShaper { curve: Arc::from(&[0.25f32, 0.25][..]) };
        play(&mut engine, click(100), 0.0, Some(flat));
        let mut block = [StereoFrame::zero(); 3];
        engine.render_block(&mut block);
        assert_eq!(block[0], StereoFrame::mono(0.25));
        assert_eq!(block[1], StereoFrame::mono(0.25));
        // the shaper only touches frames the voice actually produced
        assert_eq!(block[2], StereoFrame::zero());
    }
}
