//! Byte-level writers for the export formats.

mod mp3;
mod wav;

pub use mp3::{encode_mp3, encode_mp3_with, BlockEncoder, LameEncoder, MP3_BLOCK_SIZE, SUPPORTED_BITRATES};
pub use wav::{encode_wav, WAV_HEADER_LEN};

/// Float sample to 16-bit PCM: clamp to [-1, 1], scale negatives by 0x8000
/// and everything else by 0x7FFF, truncate toward zero. NaN becomes 0.
#[inline]
pub fn quantize_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_maps_to_i16_limits() {
        assert_eq!(quantize_i16(1.0), i16::MAX);
        assert_eq!(quantize_i16(-1.0), i16::MIN);
        assert_eq!(quantize_i16(4.0), i16::MAX);
        assert_eq!(quantize_i16(-4.0), i16::MIN);
    }

    #[test]
    fn scaling_truncates_toward_zero() {
        assert_eq!(quantize_i16(0.5), 16383); // 16383.5
        assert_eq!(quantize_i16(-0.5), -16384);
        assert_eq!(quantize_i16(-0.00001), 0); // -0.32768
        assert_eq!(quantize_i16(0.0), 0);
    }

    #[test]
    fn nan_is_silence() {
        assert_eq!(quantize_i16(f32::NAN), 0);
    }
}
