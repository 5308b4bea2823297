use std::path::Path;

use super::frame::StereoFrame;
use crate::error::{EngineError, Result};

/// Decoded float PCM, planar, tagged with its sample rate.
///
/// Buffers are never mutated once built; tracks and in-flight voices share
/// them behind an `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct PcmBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>, // one Vec per channel, all the same length
}

impl PcmBuffer {
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(EngineError::InvalidBuffer("sample rate must be positive".into()));
        }
        let Some(first) = channels.first() else {
            return Err(EngineError::InvalidBuffer("at least one channel required".into()));
        };
        if channels.len() > u16::MAX as usize {
            return Err(EngineError::InvalidBuffer(format!("too many channels: {}", channels.len())));
        }
        let frames = first.len();
        if channels.iter().any(|c| c.len() != frames) {
            return Err(EngineError::InvalidBuffer("channels differ in length".into()));
        }
        Ok(Self { sample_rate, channels })
    }

    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Result<Self> {
        Self::new(sample_rate, vec![samples])
    }

    pub fn silence(sample_rate: u32, num_channels: u16, frames: usize) -> Result<Self> {
        Self::new(sample_rate, vec![vec![0.0; frames]; num_channels as usize])
    }

    // Split frame-major interleaved data into channels. A trailing partial
    // frame is dropped.
    pub fn from_interleaved(sample_rate: u32, num_channels: u16, data: &[f32]) -> Result<Self> {
        let n = num_channels as usize;
        if n == 0 {
            return Err(EngineError::InvalidBuffer("at least one channel required".into()));
        }
        let mut channels = vec![Vec::with_capacity(data.len() / n); n];
        for frame in data.chunks_exact(n) {
            for (ch, &s) in channels.iter_mut().zip(frame) {
                ch.push(s);
            }
        }
        Self::new(sample_rate, channels)
    }

    // Fold mixed stereo frames down to the requested channel count.
    // Mono takes the average of left and right.
    pub fn from_stereo_frames(sample_rate: u32, num_channels: u16, frames: &[StereoFrame]) -> Result<Self> {
        let channels = match num_channels {
            0 => return Err(EngineError::InvalidBuffer("at least one channel required".into())),
            1 => vec![frames.iter().map(|f| 0.5 * (f.left + f.right)).collect()],
            n => {
                let left: Vec<f32> = frames.iter().map(|f| f.left).collect();
                let right: Vec<f32> = frames.iter().map(|f| f.right).collect();
                let mut channels = vec![left, right];
                // anything past stereo is silent on the bus
                channels.resize(n as usize, vec![0.0; frames.len()]);
                channels
            }
        };
        Self::new(sample_rate, channels)
    }

    // Load a WAV file from disk
    pub fn load_wav(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path)
            .map_err(|e| EngineError::DecodeFailure(format!("{}: {}", path.display(), e)))?;
        read_wav(reader).map_err(|e| EngineError::DecodeFailure(format!("{}: {}", path.display(), e)))
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn num_frames(&self) -> usize {
        self.channels[0].len()
    }

    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    pub fn duration_secs(&self) -> f64 {
        self.num_frames() as f64 / self.sample_rate as f64
    }

    // One frame as it lands on the stereo bus; mono is duplicated, extra
    // channels are ignored.
    #[inline]
    pub fn frame(&self, index: usize) -> StereoFrame {
        let left = self.channels[0][index];
        let right = self.channels.get(1).map_or(left, |c| c[index]);
        StereoFrame { left, right }
    }

    /// Samples in file order: frame by frame, channel by channel.
    pub fn interleaved(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.num_frames()).flat_map(move |i| self.channels.iter().map(move |c| c[i]))
    }
}

// Shared by file loading and container decoding
pub(crate) fn read_wav<R: std::io::Read>(reader: hound::WavReader<R>) -> std::result::Result<PcmBuffer, String> {
    let spec = reader.spec();
    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader // float, just pass it through
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.to_string())?,
        hound::SampleFormat::Int => { // int, convert to float
            let max = 2.0_f32.powi(spec.bits_per_sample as i32 - 1);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|x| x as f32 / max))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?
        }
    };
    PcmBuffer::from_interleaved(spec.sample_rate, spec.channels, &samples).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_round_trips_through_planar_storage() {
        let data = [0.1, -0.1, 0.2, -0.2, 0.3, -0.3];
        let buf = PcmBuffer::from_interleaved(48000, 2, &data).unwrap();
        assert_eq!(buf.num_frames(), 3);
        assert_eq!(buf.channel(1).unwrap(), &[-0.1, -0.2, -0.3]);
        assert_eq!(buf.interleaved().collect::<Vec<_>>(), data);
    }

    #[test]
    fn mismatched_channels_are_rejected() {
        let err = PcmBuffer::new(44100, vec![vec![0.0; 4], vec![0.0; 3]]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidBuffer(_)));
        assert!(PcmBuffer::new(0, vec![vec![0.0]]).is_err());
        assert!(PcmBuffer::new(44100, vec![]).is_err());
    }

    #[test]
    fn mono_frames_are_duplicated_on_the_bus() {
        let buf = PcmBuffer::mono(44100, vec![0.5]).unwrap();
        assert_eq!(buf.frame(0), StereoFrame { left: 0.5, right: 0.5 });
    }

    #[test]
    fn stereo_bus_folds_to_mono_by_averaging() {
        let frames = [StereoFrame { left: 1.0, right: 0.0 }];
        let buf = PcmBuffer::from_stereo_frames(44100, 1, &frames).unwrap();
        assert_eq!(buf.channel(0).unwrap(), &[0.5]);
    }
}
