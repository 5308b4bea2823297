// Canonical 44-byte-header PCM WAV, always 16 bits per sample.
//
//   0  "RIFF"   4  data_len + 36   8  "WAVE"
//  12  "fmt "  16  16             20  1 (PCM)     22  channels
//  24  rate    28  byte rate      32  block align 34  16
//  36  "data"  40  data_len       44  samples, interleaved, little-endian

use crate::audio::PcmBuffer;
use crate::error::{EngineError, Result};

use super::quantize_i16;

pub const WAV_HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u64 = 2;
const FORMAT_PCM: u16 = 1;

pub fn encode_wav(buffer: &PcmBuffer) -> Result<Vec<u8>> {
    let channels = buffer.num_channels();
    let sample_rate = buffer.sample_rate();
    let block_align = channels as u64 * BYTES_PER_SAMPLE;
    let data_len = buffer.num_frames() as u64 * block_align;

    let riff_len = to_u32(data_len + 36, "file")?;
    let byte_rate = to_u32(sample_rate as u64 * block_align, "byte rate")?;
    let block_align = u16::try_from(block_align)
        .map_err(|_| EngineError::Encode(format!("{} channels do not fit a WAV header", channels)))?;
    let data_len = to_u32(data_len, "data chunk")?;

    let mut out = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_len.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for s in buffer.interleaved() {
        out.extend_from_slice(&quantize_i16(s).to_le_bytes());
    }
    Ok(out)
}

fn to_u32(v: u64, what: &str) -> Result<u32> {
    u32::try_from(v).map_err(|_| EngineError::Encode(format!("{} too large for WAV ({} bytes)", what, v)))
}
