use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::{AudioCommand, AudioHost, Clock, PlaybackRequest};

mod capture;
mod container;
mod effect;
mod engine;
mod frame;
mod offline;
mod pcm_buffer;
mod voice;

pub use capture::{MicCapture, MicRecording};
pub use container::{decode_container, encode_container, CONTAINER_EXTENSION};
pub use effect::{Effect, EffectSpec, WaveShaper};
pub use engine::Engine;
pub use frame::StereoFrame;
pub use offline::OfflineHost;
pub use pcm_buffer::PcmBuffer;

const COMMAND_QUEUE: usize = 1024;

/// Live host: a cpal output stream mixing whatever the sequencer schedules.
/// The clock is the number of frames the stream has rendered.
pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    clock: Arc<AtomicU64>,
    stream_failed: Arc<AtomicBool>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl Clock for AudioHandle {
    fn now(&self) -> Option<f64> {
        if self.stream_failed.load(Ordering::Acquire) {
            return None;
        }
        Some(self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64)
    }
}

impl AudioHost for AudioHandle {
    fn schedule_playback(&mut self, request: PlaybackRequest) {
        let track = request.track;
        if self.tx.try_send(AudioCommand::play(request)).is_err() {
            log::warn!("audio command queue full, dropped trigger for track {}", track);
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

pub fn start_audio(master_gain: f32) -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels().max(1) as usize;

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let engine = Engine::new(sample_rate, master_gain);
            let clock = engine.clock();
            let stream_failed = Arc::new(AtomicBool::new(false));

            let output_stream = build_output_stream_f32(
                &device, &config.into(), engine, rx, channels, Arc::clone(&stream_failed),
            )?;
            output_stream.play().context("failed to play output stream")?;
            log::info!("audio output running at {} Hz, {} channels", sample_rate, channels);

            Ok(AudioHandle {
                tx,
                clock,
                stream_failed,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {:?} (only f32 supported for now)", other),
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut engine: Engine,
    rx: Receiver<AudioCommand>,
    channels: usize,
    stream_failed: Arc<AtomicBool>,
) -> anyhow::Result<cpal::Stream> {
    let mut mix: Vec<StereoFrame> = Vec::with_capacity(4096);

    let err_fn = move |err: cpal::StreamError| {
        log::error!("audio output stream error: {err}");
        stream_failed.store(true, Ordering::Release);
    };

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            while let Ok(cmd) = rx.try_recv() { // pick up newly scheduled triggers
                engine.handle_cmd(cmd);
            }

            let n_frames = data.len() / channels;
            if mix.len() < n_frames {
                mix.resize(n_frames, StereoFrame::zero());
            }
            let frames = &mut mix[..n_frames];
            engine.render_block(frames);

            // spread the stereo bus over however many channels the device has
            for (out, f) in data.chunks_exact_mut(channels).zip(frames.iter()) {
                match out {
                    [mono] => *mono = 0.5 * (f.left + f.right),
                    [l, r, rest @ ..] => {
                        *l = f.left;
                        *r = f.right;
                        rest.fill(0.0);
                    }
                    [] => {}
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
