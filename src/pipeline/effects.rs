// Robot mode transfer curve

use std::f64::consts::PI;

pub const DEFAULT_CURVE_SAMPLES: usize = 44100;
pub const ROBOT_AMOUNT: f64 = 400.0;

/// Waveshaper table: `(3 + k) * x * 20deg / (PI + k * |x|)` sampled at
/// `x = i * 2 / n - 1`, so it covers [-1, 1) and passes through zero at
/// `n / 2`. Pure; the same inputs always give the same table.
pub fn distortion_curve(amount: f64, n_samples: usize) -> Vec<f32> {
    let deg = PI / 180.0;
    (0..n_samples)
        .map(|i| {
            let x = i as f64 * 2.0 / n_samples as f64 - 1.0;
            ((3.0 + amount) * x * 20.0 * deg / (PI + amount * x.abs())) as f32
        })
        .collect()
}
