//! Additive Gaussian channel noise.

use rand::Rng;
use satlink_foundation::SignalBuffer;

/// Add zero-mean Gaussian noise to every sample.
///
/// The noise standard deviation is `noise_level` times the signal's peak
/// amplitude, so the level reads as a fraction of the signal's full swing.
/// Output samples are clamped back to [-1, 1].
///
/// `noise_level = 0` is a bit-for-bit identity: the generator is not
/// advanced at all, so a zero-noise run leaves the RNG stream untouched.
pub fn add_noise(signal: &SignalBuffer, noise_level: f32, rng: &mut impl Rng) -> SignalBuffer {
    if noise_level == 0.0 {
        return signal.clone();
    }

    let sigma = noise_level * signal.peak();
    let samples = signal
        .samples
        .iter()
        .map(|&s| (s + standard_normal(rng) * sigma).clamp(-1.0, 1.0))
        .collect();

    SignalBuffer::new(samples, signal.sample_rate)
}

/// Standard normal variate via the Box-Muller transform.
fn standard_normal(rng: &mut impl Rng) -> f32 {
    let u1: f32 = rng.gen_range(f32::EPSILON..1.0);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos()
}
