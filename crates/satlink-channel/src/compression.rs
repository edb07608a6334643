//! Compression artifacts: band-limiting, requantization, waveshaping,
//! temporal smearing.
//!
//! An order-sensitive sub-pipeline approximating lossy codec and channel
//! behavior. Each sub-effect consumes the previous one's output and is
//! skipped entirely when its parameter sits at the no-op value, so a
//! transparent configuration is bit-exact.

use satlink_foundation::SignalBuffer;

use crate::config::CompressionConfig;

/// Bit depths at or above this leave the signal untouched; an f32 sample
/// carries a 24-bit significand, so finer steps are not representable.
pub const NATIVE_RESOLUTION_BITS: u32 = 24;

/// Tap count for the low-pass FIR. Odd, so the filter is linear-phase with
/// an integer group delay that centered convolution cancels exactly.
const LOW_PASS_TAPS: usize = 129;

/// Apply the full artifact chain: band-limit, quantize, waveshape, smear.
///
/// Output has the same length and sample rate as the input.
pub fn apply_codec_artifacts(signal: &SignalBuffer, config: &CompressionConfig) -> SignalBuffer {
    let mut samples = signal.samples.clone();

    if config.bandwidth_hz < signal.nyquist_hz() {
        samples = low_pass(&samples, config.bandwidth_hz, signal.sample_rate);
    }

    if config.quantization_bits < NATIVE_RESOLUTION_BITS {
        samples = quantize(&samples, config.quantization_bits);
    }

    if config.harmonic_distortion_amount > 0.0 {
        samples = waveshape(&samples, config.harmonic_distortion_amount);
    }

    let smear_len = kernel_len(config.temporal_smear_ms, signal.sample_rate);
    if smear_len >= 2 {
        samples = smear(&samples, smear_len);
    }

    SignalBuffer::new(samples, signal.sample_rate)
}

/// Windowed-sinc FIR low-pass, Hamming window, unity DC gain.
fn low_pass(samples: &[f32], cutoff_hz: f32, sample_rate: u32) -> Vec<f32> {
    let taps = design_low_pass(cutoff_hz, sample_rate);
    convolve_centered(samples, &taps)
}

fn design_low_pass(cutoff_hz: f32, sample_rate: u32) -> Vec<f32> {
    let fc = cutoff_hz / sample_rate as f32; // normalized cutoff, cycles/sample
    let mid = (LOW_PASS_TAPS - 1) as f32 / 2.0;

    let mut taps: Vec<f32> = (0..LOW_PASS_TAPS)
        .map(|n| {
            let x = n as f32 - mid;
            let sinc = if x == 0.0 {
                2.0 * fc
            } else {
                (2.0 * std::f32::consts::PI * fc * x).sin() / (std::f32::consts::PI * x)
            };
            let window = 0.54
                - 0.46
                    * (2.0 * std::f32::consts::PI * n as f32 / (LOW_PASS_TAPS - 1) as f32).cos();
            sinc * window
        })
        .collect();

    // Normalize to unity gain at DC so the pass-band level is unchanged
    let dc_gain: f32 = taps.iter().sum();
    for tap in &mut taps {
        *tap /= dc_gain;
    }
    taps
}

/// Requantize to `2^bits` uniform levels across [-1, 1] and back.
///
/// Mid-tread rounding, the same shape as an integer codec's store/load
/// round trip. Fewer bits, coarser steps, higher quantization noise floor.
fn quantize(samples: &[f32], bits: u32) -> Vec<f32> {
    let levels = (1u64 << bits) as f32;
    let step = 2.0 / (levels - 1.0);

    samples
        .iter()
        .map(|&s| (((s + 1.0) / step).round() * step - 1.0).clamp(-1.0, 1.0))
        .collect()
}

/// Normalized tanh waveshaper: `f(x) = tanh(k * x) / k`.
///
/// Unity small-signal gain for every k, identity in the limit k -> 0, and
/// output magnitude bounded by `tanh(k) / k < 1`, so the shaped signal can
/// never leave the valid amplitude range. Odd-harmonic energy grows
/// monotonically with k.
fn waveshape(samples: &[f32], amount: f32) -> Vec<f32> {
    samples.iter().map(|&s| (amount * s).tanh() / amount).collect()
}

/// Smoothing kernel length in samples for the given smear width.
fn kernel_len(smear_ms: f32, sample_rate: u32) -> usize {
    ((smear_ms / 1000.0) * sample_rate as f32).round() as usize
}

/// Convolve with a Hann-shaped kernel normalized to unit sum.
///
/// Approximates echo/dispersion on the link; unit sum means no net gain
/// change, and centered convolution means no net delay.
fn smear(samples: &[f32], len: usize) -> Vec<f32> {
    let mut kernel: Vec<f32> = (0..len)
        .map(|n| {
            // Offset the Hann lobe so no tap is exactly zero
            let phase = 2.0 * std::f32::consts::PI * (n as f32 + 1.0) / (len as f32 + 1.0);
            0.5 * (1.0 - phase.cos())
        })
        .collect();

    let sum: f32 = kernel.iter().sum();
    for tap in &mut kernel {
        *tap /= sum;
    }

    convolve_centered(samples, &kernel)
}

/// Same-length convolution with the kernel centered on each output sample,
/// zero-padded at the edges. A symmetric kernel therefore introduces no
/// group delay, which keeps the output sample-aligned with the input.
fn convolve_centered(samples: &[f32], kernel: &[f32]) -> Vec<f32> {
    let half = (kernel.len() / 2) as isize;
    let len = samples.len() as isize;

    (0..len)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, &tap)| {
                    let j = i + k as isize - half;
                    if (0..len).contains(&j) {
                        samples[j as usize] * tap
                    } else {
                        0.0
                    }
                })
                .sum()
        })
        .collect()
}
