use super::frame::StereoFrame;
use super::pcm_buffer::PcmBuffer;

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

// One playing instance of a track's sample
#[derive(Clone, Debug)]
pub struct Voice {
    pub pos: f64,  // read position in source frames
    pub rate: f64, // source frames consumed per output frame
    pub gain: f32,
    pub active: bool,
}

impl Voice {
    pub fn new(source_rate: u32, output_rate: u32, gain: f32) -> Self {
        Self {
            pos: 0.0,
            rate: source_rate as f64 / output_rate as f64,
            gain,
            active: true,
        }
    }

    // Mix this voice into `out`, returning how many frames were written.
    // Buffers recorded at another rate are resampled on the fly.
    pub fn render_into(&mut self, buffer: &PcmBuffer, out: &mut [StereoFrame]) -> usize {
        if !self.active {
            return 0;
        }
        let len = buffer.num_frames();
        if len == 0 {
            self.active = false;
            return 0;
        }

        let mut written = 0;
        for frame in out.iter_mut() { // for each frame in the output buffer
            if self.pos >= len as f64 {
                self.active = false;
                break;
            }

            // read sample at current position
            let i = self.pos as usize;
            let frac = (self.pos - i as f64) as f32;
            let s0 = buffer.frame(i);
            let s1 = if i + 1 < len { buffer.frame(i + 1) } else { s0 };

            frame.left += lerp(s0.left, s1.left, frac) * self.gain;
            frame.right += lerp(s0.right, s1.right, frac) * self.gain;

            self.pos += self.rate;
            written += 1;
        }
        written
    }
}
