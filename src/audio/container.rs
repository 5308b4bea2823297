// The host's native capture container: a 32-bit float WAV. Microphone
// captures and offline renders both come out of the host in this form; the
// export pipeline either passes it through untouched or decodes it back to
// PCM for the WAV and MP3 encoders.

use std::io::Cursor;

use super::pcm_buffer::{read_wav, PcmBuffer};
use crate::error::{EngineError, Result};

pub const CONTAINER_EXTENSION: &str = "container.wav";

pub fn encode_container(buffer: &PcmBuffer) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: buffer.num_channels(),
        sample_rate: buffer.sample_rate(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let to_err = |e: hound::Error| EngineError::Encode(format!("container: {e}"));

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).map_err(to_err)?;
        for s in buffer.interleaved() {
            writer.write_sample(s).map_err(to_err)?;
        }
        writer.finalize().map_err(to_err)?;
    }
    Ok(cursor.into_inner())
}

/// Turn raw container bytes back into PCM.
pub fn decode_container(bytes: &[u8]) -> Result<PcmBuffer> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| EngineError::DecodeFailure(e.to_string()))?;
    read_wav(reader).map_err(EngineError::DecodeFailure)
}
