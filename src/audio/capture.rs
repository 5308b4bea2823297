use crossbeam_channel::Receiver;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::container::encode_container;
use super::pcm_buffer::PcmBuffer;
use crate::audio_api::CaptureDevice;
use crate::error::{EngineError, Result};

const CAPTURE_QUEUE: usize = 4096;

/// Microphone capture through the default cpal input device.
pub struct MicCapture {
    host: cpal::Host,
}

/// A running capture. Dropping it stops the input stream and discards
/// whatever was recorded.
pub struct MicRecording {
    stream: cpal::Stream,
    rx: Receiver<Vec<f32>>,
    channels: u16,
    sample_rate: u32,
}

impl MicCapture {
    pub fn new() -> Self {
        Self { host: cpal::default_host() }
    }
}

impl Default for MicCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureDevice for MicCapture {
    type Handle = MicRecording;

    fn start_capture(&mut self) -> Result<MicRecording> {
        let device = self
            .host
            .default_input_device()
            .ok_or_else(|| EngineError::PermissionDenied("no default input device".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|e| EngineError::PermissionDenied(e.to_string()))?;
        check_input_format(supported.sample_format())?;

        let config: cpal::StreamConfig = supported.into();
        let channels = config.channels;
        let sample_rate = config.sample_rate;
        let (tx, rx) = crossbeam_channel::bounded::<Vec<f32>>(CAPTURE_QUEUE);
        let mut overflowed = false;

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    if tx.try_send(data.to_vec()).is_err() && !overflowed {
                        overflowed = true; // once per recording
                        log::warn!("capture queue full, dropping microphone input");
                    }
                },
                |err| log::error!("audio input stream error: {err}"),
                None,
            )
            .map_err(|e| EngineError::PermissionDenied(e.to_string()))?;
        stream
            .play()
            .map_err(|e| EngineError::PermissionDenied(e.to_string()))?;

        log::info!("capturing from microphone at {} Hz, {} channels", sample_rate, channels);
        Ok(MicRecording { stream, rx, channels, sample_rate })
    }

    fn stop_capture(&mut self, handle: MicRecording) -> Result<Vec<u8>> {
        let MicRecording { stream, rx, channels, sample_rate } = handle;
        drop(stream); // no more callbacks after this

        let mut data = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            data.extend_from_slice(&chunk);
        }
        let buffer = PcmBuffer::from_interleaved(sample_rate, channels, &data)?;
        log::debug!("microphone capture stopped after {:.2}s", buffer.duration_secs());
        encode_container(&buffer)
    }
}

fn check_input_format(format: cpal::SampleFormat) -> Result<()> {
    if format == cpal::SampleFormat::F32 {
        Ok(())
    } else {
        Err(EngineError::UnsupportedDevice(format!(
            "unsupported input format {:?}, only f32 capture is handled",
            format
        )))
    }
}
