use std::sync::Arc;

use super::frame::StereoFrame;

// What a playback request asks the host to route through. The host turns the
// spec into a fresh node per trigger with `to_effect`.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectSpec {
    WaveShaper { curve: Arc<[f32]> },
}

impl EffectSpec {
    pub fn to_effect(&self) -> Box<dyn Effect> {
        match self {
            EffectSpec::WaveShaper { curve } => Box::new(WaveShaper::new(Arc::clone(curve))),
        }
    }
}

pub trait Effect: Send {
    fn process(&mut self, buf: &mut [StereoFrame]);
}

// waveshaper: maps each sample through a transfer table spanning [-1, 1]
pub struct WaveShaper {
    curve: Arc<[f32]>,
}

impl WaveShaper {
    pub fn new(curve: Arc<[f32]>) -> Self {
        Self { curve }
    }

    #[inline]
    fn shape(&self, x: f32) -> f32 {
        let n = self.curve.len();
        match n {
            0 => x,
            1 => self.curve[0],
            _ => {
                let last = (n - 1) as f32;
                let v = last * (x + 1.0) * 0.5;
                if v.is_nan() || v <= 0.0 {
                    self.curve[0]
                } else if v >= last {
                    self.curve[n - 1]
                } else {
                    let k = v as usize;
                    let frac = v - k as f32;
                    self.curve[k] * (1.0 - frac) + self.curve[k + 1] * frac
                }
            }
        }
    }
}

impl Effect for WaveShaper {
    fn process(&mut self, buf: &mut [StereoFrame]) {
        for f in buf.iter_mut() {
            f.left = self.shape(f.left);
            f.right = self.shape(f.right);
        }
    }
}
