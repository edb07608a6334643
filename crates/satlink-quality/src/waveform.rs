//! Sample-level waveform comparison: SNR estimate, RMSE, correlation.

use crate::types::WaveformAnalysis;

/// Guard against division by zero in the SNR estimate.
const POWER_EPSILON: f64 = 1e-10;

/// Compare two equal-length waveforms sample by sample.
///
/// The SNR estimate treats the difference signal as noise; correlation is
/// Pearson's coefficient, reported as 0 when undefined (constant input).
/// Accumulation is in f64.
pub fn analyze(reference: &[f32], degraded: &[f32]) -> WaveformAnalysis {
    let len = reference.len() as f64;

    let signal_power: f64 = reference
        .iter()
        .map(|&s| {
            let s = s as f64;
            s * s
        })
        .sum::<f64>()
        / len;

    let noise_power: f64 = reference
        .iter()
        .zip(degraded)
        .map(|(&r, &d)| {
            let e = (r - d) as f64;
            e * e
        })
        .sum::<f64>()
        / len;

    let snr_db = 10.0 * (signal_power / (noise_power + POWER_EPSILON)).log10();
    let rmse = noise_power.sqrt();

    WaveformAnalysis {
        snr_db: snr_db as f32,
        rmse: rmse as f32,
        correlation: correlation(reference, degraded) as f32,
    }
}

fn correlation(reference: &[f32], degraded: &[f32]) -> f64 {
    let len = reference.len() as f64;
    let mean_r = reference.iter().map(|&s| s as f64).sum::<f64>() / len;
    let mean_d = degraded.iter().map(|&s| s as f64).sum::<f64>() / len;

    let mut covariance = 0.0f64;
    let mut variance_r = 0.0f64;
    let mut variance_d = 0.0f64;

    for (&r, &d) in reference.iter().zip(degraded) {
        let dr = r as f64 - mean_r;
        let dd = d as f64 - mean_d;
        covariance += dr * dd;
        variance_r += dr * dr;
        variance_d += dd * dd;
    }

    let denominator = (variance_r * variance_d).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        covariance / denominator
    }
}
