//! Short-time objective intelligibility.
//!
//! Implements the standard STOI procedure: both signals are cut into
//! overlapping Hann-windowed frames, silent reference frames are discarded,
//! frame spectra are grouped into one-third-octave bands, and the degraded
//! band envelopes are correlated against the reference envelopes over short
//! analysis segments. The averaged correlation is the score, roughly [0, 1].
//!
//! The metric is calibrated for 10 kHz-class sample rates; feeding it
//! appropriately rated signals (and any resampling) is the caller's
//! responsibility.

use rustfft::{num_complex::Complex, FftPlanner};

use satlink_foundation::SignalBuffer;

use crate::types::{MetricFailure, MetricOutcome};

/// One-third-octave bands, lowest centered at 150 Hz.
const BAND_COUNT: usize = 15;
const LOWEST_CENTER_HZ: f32 = 150.0;

/// Frames per analysis segment (384 ms at the nominal frame rate).
const SEGMENT_FRAMES: usize = 30;

/// Analysis frame duration (256 samples at 10 kHz).
const FRAME_DURATION_S: f32 = 0.0256;

/// Signal-to-distortion bound applied to the degraded envelope before
/// correlation.
const SDR_CLIP_DB: f32 = -15.0;

/// Reference frames more than this far below the loudest frame are treated
/// as silence and discarded.
const DYNAMIC_RANGE_DB: f32 = 40.0;

/// Compute the intelligibility score for a degraded signal against its
/// clean reference. Both buffers must have the same length and sample rate
/// (the caller enforces this contract).
pub fn compute(reference: &SignalBuffer, degraded: &SignalBuffer) -> MetricOutcome {
    let sample_rate = reference.sample_rate;
    let frame_len = (FRAME_DURATION_S * sample_rate as f32).round() as usize;
    let hop = frame_len / 2;
    let fft_size = (frame_len * 2).next_power_of_two();

    // Enough input for at least one full analysis segment, before any
    // silence removal
    let minimum = frame_len + hop * (SEGMENT_FRAMES - 1);
    if reference.len() < minimum {
        return MetricOutcome::Unavailable(MetricFailure::TooShort {
            samples: reference.len(),
            minimum,
        });
    }

    let window = hann(frame_len);
    let ref_frames = frame_signal(&reference.samples, frame_len, hop, &window);
    let deg_frames = frame_signal(&degraded.samples, frame_len, hop, &window);

    // Discard frames where the reference is effectively silent
    let energies: Vec<f32> = ref_frames.iter().map(|f| frame_energy(f)).collect();
    let max_energy = energies.iter().copied().fold(0.0f32, f32::max);
    let threshold = max_energy * 10.0f32.powf(-DYNAMIC_RANGE_DB / 10.0);
    let kept: Vec<usize> = energies
        .iter()
        .enumerate()
        .filter(|(_, &e)| e > threshold && e > 0.0)
        .map(|(i, _)| i)
        .collect();

    if kept.len() < SEGMENT_FRAMES {
        return MetricOutcome::Unavailable(MetricFailure::TooShort {
            samples: reference.len(),
            minimum,
        });
    }

    let bands = third_octave_bands(sample_rate, fft_size);

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(fft_size);

    // Band envelope matrices: [band][kept frame]
    let ref_envelopes = band_envelopes(&ref_frames, &kept, fft.as_ref(), fft_size, &bands);
    let deg_envelopes = band_envelopes(&deg_frames, &kept, fft.as_ref(), fft_size, &bands);

    // Correlate short envelope segments per band, average everything
    let clip = 10.0f32.powf(SDR_CLIP_DB / 20.0);
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for end in SEGMENT_FRAMES..=kept.len() {
        let start = end - SEGMENT_FRAMES;
        for band in 0..bands.len() {
            let x = &ref_envelopes[band][start..end];
            let y = &deg_envelopes[band][start..end];

            if let Some(d) = segment_correlation(x, y, clip) {
                sum += d as f64;
                count += 1;
            }
        }
    }

    if count == 0 {
        return MetricOutcome::Unavailable(MetricFailure::TooShort {
            samples: reference.len(),
            minimum,
        });
    }

    MetricOutcome::Scored((sum / count as f64) as f32)
}

fn hann(len: usize) -> Vec<f32> {
    (0..len)
        .map(|n| {
            0.5 * (1.0
                - (2.0 * std::f32::consts::PI * n as f32 / (len as f32 - 1.0)).cos())
        })
        .collect()
}

/// Cut the signal into overlapping windowed frames.
fn frame_signal(samples: &[f32], frame_len: usize, hop: usize, window: &[f32]) -> Vec<Vec<f32>> {
    let mut frames = Vec::new();
    let mut start = 0;
    while start + frame_len <= samples.len() {
        let frame = samples[start..start + frame_len]
            .iter()
            .zip(window)
            .map(|(&s, &w)| s * w)
            .collect();
        frames.push(frame);
        start += hop;
    }
    frames
}

fn frame_energy(frame: &[f32]) -> f32 {
    frame.iter().map(|&s| s * s).sum()
}

/// FFT bin ranges for each one-third-octave band that fits below Nyquist.
fn third_octave_bands(sample_rate: u32, fft_size: usize) -> Vec<std::ops::Range<usize>> {
    let bin_hz = sample_rate as f32 / fft_size as f32;
    let nyquist = sample_rate as f32 / 2.0;
    let edge_ratio = 2.0f32.powf(1.0 / 6.0);

    let mut bands = Vec::new();
    for k in 0..BAND_COUNT {
        let center = LOWEST_CENTER_HZ * 2.0f32.powf(k as f32 / 3.0);
        let low = center / edge_ratio;
        let high = (center * edge_ratio).min(nyquist);
        if low >= nyquist {
            break;
        }

        let low_bin = (low / bin_hz).ceil() as usize;
        let high_bin = ((high / bin_hz).ceil() as usize).min(fft_size / 2 + 1);
        if low_bin < high_bin {
            bands.push(low_bin..high_bin);
        }
    }
    bands
}

/// Per-band envelope amplitude for each kept frame.
fn band_envelopes(
    frames: &[Vec<f32>],
    kept: &[usize],
    fft: &dyn rustfft::Fft<f32>,
    fft_size: usize,
    bands: &[std::ops::Range<usize>],
) -> Vec<Vec<f32>> {
    let mut envelopes = vec![Vec::with_capacity(kept.len()); bands.len()];

    let mut buffer = vec![Complex::new(0.0f32, 0.0); fft_size];
    for &index in kept {
        buffer.iter_mut().for_each(|c| *c = Complex::new(0.0, 0.0));
        for (slot, &s) in buffer.iter_mut().zip(&frames[index]) {
            *slot = Complex::new(s, 0.0);
        }
        fft.process(&mut buffer);

        for (band, range) in bands.iter().enumerate() {
            let power: f32 = buffer[range.clone()].iter().map(|c| c.norm_sqr()).sum();
            envelopes[band].push(power.sqrt());
        }
    }

    envelopes
}

/// Correlation between a reference envelope segment and the normalized,
/// distortion-bounded degraded segment. `None` when the correlation is
/// undefined (constant envelope).
fn segment_correlation(x: &[f32], y: &[f32], clip: f32) -> Option<f32> {
    let x_norm = l2(x);
    let y_norm = l2(y);
    if x_norm == 0.0 {
        return None;
    }

    let scale = if y_norm > 0.0 { x_norm / y_norm } else { 0.0 };
    let bounded: Vec<f32> = y
        .iter()
        .zip(x)
        .map(|(&yi, &xi)| (yi * scale).min(xi * (1.0 + clip)))
        .collect();

    let mean_x = x.iter().sum::<f32>() / x.len() as f32;
    let mean_y = bounded.iter().sum::<f32>() / bounded.len() as f32;

    let mut covariance = 0.0f32;
    let mut var_x = 0.0f32;
    let mut var_y = 0.0f32;
    for (&xi, &yi) in x.iter().zip(&bounded) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denominator = (var_x * var_y).sqrt();
    if denominator == 0.0 {
        None
    } else {
        Some(covariance / denominator)
    }
}

fn l2(values: &[f32]) -> f32 {
    values.iter().map(|&v| v * v).sum::<f32>().sqrt()
}
