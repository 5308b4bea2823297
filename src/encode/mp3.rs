use std::fmt::Debug;

use mp3lame_encoder::{Bitrate, Builder, Encoder, FlushNoGap, MonoPcm};

use crate::audio::PcmBuffer;
use crate::error::{EngineError, Result};

use super::quantize_i16;

/// Samples per MPEG-1 layer III frame; the encoder is fed one frame's worth
/// at a time.
pub const MP3_BLOCK_SIZE: usize = 1152;
pub const SUPPORTED_BITRATES: [u32; 7] = [64, 96, 128, 160, 192, 256, 320];

const FLUSH_RESERVE: usize = 7200; // LAME wants at least this much room to flush

/// Block-oriented encoder: one call per block of PCM, one final flush. Either
/// may return nothing while the encoder is still buffering.
pub trait BlockEncoder {
    fn encode_block(&mut self, pcm: &[i16]) -> Result<Vec<u8>>;

    fn flush(&mut self) -> Result<Vec<u8>>;
}

/// Constant bitrate mono MP3 through libmp3lame.
pub struct LameEncoder {
    inner: Encoder,
}

impl LameEncoder {
    pub fn new(sample_rate: u32, bitrate_kbps: u32) -> Result<Self> {
        let mut builder = Builder::new()
            .ok_or_else(|| EngineError::Encode("could not allocate LAME encoder".into()))?;
        builder.set_num_channels(1).map_err(lame_err)?;
        builder.set_sample_rate(sample_rate).map_err(lame_err)?;
        builder.set_brate(bitrate(bitrate_kbps)?).map_err(lame_err)?;
        let inner = builder.build().map_err(lame_err)?;
        Ok(Self { inner })
    }
}

impl BlockEncoder for LameEncoder {
    fn encode_block(&mut self, pcm: &[i16]) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(pcm.len()));
        self.inner
            .encode_to_vec(MonoPcm(pcm), &mut out)
            .map_err(lame_err)?;
        Ok(out)
    }

    fn flush(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(FLUSH_RESERVE);
        self.inner
            .flush_to_vec::<FlushNoGap>(&mut out)
            .map_err(lame_err)?;
        Ok(out)
    }
}

pub(crate) fn bitrate(kbps: u32) -> Result<Bitrate> {
    let rate = match kbps {
        64 => Bitrate::Kbps64,
        96 => Bitrate::Kbps96,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => return Err(EngineError::Encode(format!("unsupported MP3 bitrate {} kbps", other))),
    };
    Ok(rate)
}

fn lame_err<E: Debug>(e: E) -> EngineError {
    EngineError::Encode(format!("lame: {:?}", e))
}

/// Mono MP3 of channel 0. Other channels are ignored, not mixed in.
pub fn encode_mp3(buffer: &PcmBuffer, bitrate_kbps: u32) -> Result<Vec<u8>> {
    let mut encoder = LameEncoder::new(buffer.sample_rate(), bitrate_kbps)?;
    encode_mp3_with(buffer, &mut encoder)
}

/// Quantize channel 0, feed it to `encoder` in `MP3_BLOCK_SIZE` blocks, flush
/// once, and join every non-empty chunk in the order it came back.
pub fn encode_mp3_with<E: BlockEncoder + ?Sized>(buffer: &PcmBuffer, encoder: &mut E) -> Result<Vec<u8>> {
    let pcm: Vec<i16> = buffer
        .channel(0)
        .unwrap_or_default()
        .iter()
        .map(|&s| quantize_i16(s))
        .collect();

    let mut chunks: Vec<Vec<u8>> = Vec::new();
    for block in pcm.chunks(MP3_BLOCK_SIZE) {
        let chunk = encoder.encode_block(block)?;
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
    }
    let tail = encoder.flush()?;
    if !tail.is_empty() {
        chunks.push(tail);
    }
    Ok(chunks.concat())
}
