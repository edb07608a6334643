//! Perceptual speech quality estimate.
//!
//! A compact rendition of the perceptual evaluation procedure: level
//! alignment, Hann-windowed frame spectra, Bark-scale band grouping,
//! Zwicker-law loudness, and symmetric plus asymmetric disturbance
//! aggregation mapped onto a MOS-like scale. The full ITU cognitive model
//! (time alignment, bad-interval reprocessing) is out of proportion for
//! this core; the rendition preserves the procedure's shape, its rate
//! gating, and its output range.
//!
//! Defined only at 8000 Hz (narrowband) and 16000 Hz (wideband); any other
//! rate yields an unsupported-rate status for this metric alone.

use rustfft::{num_complex::Complex, FftPlanner};

use satlink_foundation::SignalBuffer;

use crate::types::{MetricFailure, MetricOutcome};

/// The only sample rates the perceptual model is defined for.
pub const SUPPORTED_RATES: [u32; 2] = [8000, 16000];

/// Analysis frame duration (256 samples at 8 kHz, 512 at 16 kHz).
const FRAME_DURATION_S: f32 = 0.032;

/// Zwicker loudness exponent.
const LOUDNESS_EXPONENT: f32 = 0.23;

/// Scale factor bringing normalized loudness differences onto the
/// disturbance range the output mapping expects.
const LOUDNESS_SCALE: f32 = 32.0;

/// Output mapping: MOS = 4.5 - 0.1 * d_sym - 0.0309 * d_asym.
const SYMMETRIC_WEIGHT: f32 = 0.1;
const ASYMMETRIC_WEIGHT: f32 = 0.0309;

/// Asymmetry factor shape: additions (degraded energy above reference) are
/// emphasized, mild factors are dropped, large ones capped.
const ASYMMETRY_EXPONENT: f32 = 1.2;
const ASYMMETRY_FLOOR: f32 = 3.0;
const ASYMMETRY_CAP: f32 = 12.0;

const MOS_MAX: f32 = 4.5;
const MOS_MIN: f32 = -0.5;

/// Compute the perceptual quality score for a degraded signal against its
/// clean reference. Both buffers must have the same length and sample rate
/// (the caller enforces this contract).
pub fn compute(reference: &SignalBuffer, degraded: &SignalBuffer) -> MetricOutcome {
    let rate = reference.sample_rate;
    if !SUPPORTED_RATES.contains(&rate) {
        return MetricOutcome::Unavailable(MetricFailure::UnsupportedSampleRate {
            rate,
            supported: SUPPORTED_RATES,
        });
    }

    let frame_len = (FRAME_DURATION_S * rate as f32).round() as usize;
    let hop = frame_len / 2;
    let minimum = frame_len + hop * 3;
    if reference.len() < minimum {
        return MetricOutcome::Unavailable(MetricFailure::TooShort {
            samples: reference.len(),
            minimum,
        });
    }

    // Global level alignment: play the degraded signal at the reference's
    // overall power before comparing loudness
    let ref_rms = reference.rms();
    let deg_rms = degraded.rms();
    let gain = if deg_rms > 0.0 { ref_rms / deg_rms } else { 1.0 };

    let bands = bark_bands(rate, frame_len);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(frame_len);
    let window = hann(frame_len);

    let ref_bands = band_powers(&reference.samples, 1.0, frame_len, hop, &window, fft.as_ref(), &bands);
    let deg_bands = band_powers(&degraded.samples, gain, frame_len, hop, &window, fft.as_ref(), &bands);

    // Normalize band powers so loudness operates near unity for the
    // reference's own energy
    let total: f64 = ref_bands.iter().flatten().map(|&p| p as f64).sum();
    let cells = (ref_bands.len() * bands.len()).max(1);
    let norm = (total / cells as f64).max(1e-12) as f32;

    let mut sym_accumulator = 0.0f64;
    let mut asym_accumulator = 0.0f64;
    let frame_count = ref_bands.len();

    for (ref_frame, deg_frame) in ref_bands.iter().zip(&deg_bands) {
        let mut sym = 0.0f32;
        let mut asym = 0.0f32;

        for (&pr, &pd) in ref_frame.iter().zip(deg_frame) {
            let lr = LOUDNESS_SCALE * (pr / norm).powf(LOUDNESS_EXPONENT);
            let ld = LOUDNESS_SCALE * (pd / norm).powf(LOUDNESS_EXPONENT);
            let difference = (ld - lr).abs();
            sym += difference;

            let factor = ((pd / norm + 1.0) / (pr / norm + 1.0)).powf(ASYMMETRY_EXPONENT);
            if factor >= ASYMMETRY_FLOOR {
                asym += difference * factor.min(ASYMMETRY_CAP);
            }
        }

        let band_count = ref_frame.len().max(1) as f32;
        sym /= band_count;
        asym /= band_count;

        sym_accumulator += (sym * sym) as f64;
        asym_accumulator += (asym * asym) as f64;
    }

    let d_sym = (sym_accumulator / frame_count as f64).sqrt() as f32;
    let d_asym = (asym_accumulator / frame_count as f64).sqrt() as f32;

    let mos = MOS_MAX - SYMMETRIC_WEIGHT * d_sym - ASYMMETRIC_WEIGHT * d_asym;
    MetricOutcome::Scored(mos.clamp(MOS_MIN, MOS_MAX))
}

fn hann(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| {
            0.5 * (1.0
                - (2.0 * std::f32::consts::PI * n as f32 / (len as f32 - 1.0)).cos())
        })
        .collect()
}

/// Frequency in Hz to the Bark scale (Zwicker).
fn hz_to_bark(hz: f32) -> f32 {
    13.0 * (0.00076 * hz).atan() + 3.5 * ((hz / 7500.0) * (hz / 7500.0)).atan()
}

/// Assign each FFT bin below Nyquist to a Bark-spaced band.
///
/// 42 bands at narrowband rate, 49 at wideband, matching the standard
/// procedure's band counts.
fn bark_bands(sample_rate: u32, fft_size: usize) -> Vec<Vec<usize>> {
    let band_count = if sample_rate == 16000 { 49 } else { 42 };
    let bin_hz = sample_rate as f32 / fft_size as f32;
    let bark_max = hz_to_bark(sample_rate as f32 / 2.0);

    let mut bands = vec![Vec::new(); band_count];
    for bin in 1..=fft_size / 2 {
        let bark = hz_to_bark(bin as f32 * bin_hz);
        let band = ((bark / bark_max) * band_count as f32) as usize;
        bands[band.min(band_count - 1)].push(bin);
    }
    bands
}

/// Per-frame Bark-band powers for a gain-adjusted signal.
fn band_powers(
    samples: &[f32],
    gain: f32,
    frame_len: usize,
    hop: usize,
    window: &[f32],
    fft: &dyn rustfft::Fft<f32>,
    bands: &[Vec<usize>],
) -> Vec<Vec<f32>> {
    let mut frames = Vec::new();
    let mut buffer = vec![Complex::new(0.0f32, 0.0); frame_len];

    let mut start = 0;
    while start + frame_len <= samples.len() {
        for ((slot, &s), &w) in buffer
            .iter_mut()
            .zip(&samples[start..start + frame_len])
            .zip(window)
        {
            *slot = Complex::new(s * gain * w, 0.0);
        }
        fft.process(&mut buffer);

        let powers = bands
            .iter()
            .map(|bins| bins.iter().map(|&b| buffer[b].norm_sqr()).sum())
            .collect();
        frames.push(powers);

        start += hop;
    }

    frames
}
