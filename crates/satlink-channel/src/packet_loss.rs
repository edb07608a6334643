//! Randomized segment dropout simulating lost transmission packets.

use rand::Rng;
use satlink_foundation::SignalBuffer;

/// Drop fixed-duration segments of the signal with independent probability
/// `loss_rate`, replacing each dropped segment with silence.
///
/// Segment boundaries are fixed and contiguous (the last segment may be
/// shorter); no concealment or interpolation is performed, and dropped
/// segments are zeroed rather than removed so the output always has the
/// same length as the input. Length preservation is what keeps a degraded
/// signal sample-aligned with its reference during evaluation.
///
/// `loss_rate = 0` is a bit-for-bit identity with no RNG draws;
/// `loss_rate = 1` silences the whole buffer.
pub fn drop_packets(
    signal: &SignalBuffer,
    loss_rate: f32,
    segment_ms: f32,
    rng: &mut impl Rng,
) -> SignalBuffer {
    if loss_rate == 0.0 {
        return signal.clone();
    }

    let segment_len =
        (((segment_ms / 1000.0) * signal.sample_rate as f32).round() as usize).max(1);

    let mut samples = signal.samples.clone();
    for segment in samples.chunks_mut(segment_len) {
        // rng.gen::<f64>() is in [0, 1), so a rate of exactly 1 always fires
        if rng.gen::<f64>() < f64::from(loss_rate) {
            segment.fill(0.0);
        }
    }

    SignalBuffer::new(samples, signal.sample_rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ramp(sample_rate: u32, samples: usize) -> SignalBuffer {
        // Strictly nonzero samples so dropped segments are unambiguous
        let samples = (0..samples)
            .map(|i| 0.1 + 0.8 * (i as f32 / samples as f32))
            .collect();
        SignalBuffer::new(samples, sample_rate)
    }

    #[test]
    fn test_zero_rate_is_identity_without_draws() {
        let signal = ramp(16000, 4800);
        let mut rng = StdRng::seed_from_u64(5);
        let out = drop_packets(&signal, 0.0, 100.0, &mut rng);

        assert_eq!(out, signal);
        let mut fresh = StdRng::seed_from_u64(5);
        assert_eq!(rng.gen::<u64>(), fresh.gen::<u64>());
    }

    #[test]
    fn test_full_loss_silences_everything() {
        let signal = ramp(16000, 4800);
        let mut rng = StdRng::seed_from_u64(5);
        let out = drop_packets(&signal, 1.0, 100.0, &mut rng);

        assert_eq!(out.len(), signal.len());
        assert!(out.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_length_always_preserved() {
        let signal = ramp(8000, 1234); // not a multiple of the segment length
        let mut rng = StdRng::seed_from_u64(5);
        let out = drop_packets(&signal, 0.5, 50.0, &mut rng);

        assert_eq!(out.len(), signal.len());
        assert_eq!(out.sample_rate, signal.sample_rate);
    }

    #[test]
    fn test_segments_drop_whole_or_not_at_all() {
        let signal = ramp(16000, 16000);
        let mut rng = StdRng::seed_from_u64(21);
        let out = drop_packets(&signal, 0.5, 100.0, &mut rng);

        let segment_len = 1600; // 100 ms @ 16 kHz
        for (index, segment) in out.samples.chunks(segment_len).enumerate() {
            let zeros = segment.iter().filter(|&&s| s == 0.0).count();
            assert!(
                zeros == 0 || zeros == segment.len(),
                "segment {index} partially dropped: {zeros}/{} zeroed",
                segment.len()
            );
        }
    }

    #[test]
    fn test_some_segments_survive_at_half_rate() {
        let signal = ramp(16000, 32000);
        let mut rng = StdRng::seed_from_u64(2);
        let out = drop_packets(&signal, 0.5, 100.0, &mut rng);

        let dropped = out
            .samples
            .chunks(1600)
            .filter(|seg| seg.iter().all(|&s| s == 0.0))
            .count();
        let total = out.samples.chunks(1600).count();

        assert!(dropped > 0, "expected at least one dropped segment");
        assert!(dropped < total, "expected at least one surviving segment");
    }

    #[test]
    fn test_same_seed_same_dropout_pattern() {
        let signal = ramp(16000, 16000);

        let mut rng_a = StdRng::seed_from_u64(77);
        let mut rng_b = StdRng::seed_from_u64(77);

        assert_eq!(
            drop_packets(&signal, 0.3, 80.0, &mut rng_a),
            drop_packets(&signal, 0.3, 80.0, &mut rng_b)
        );
    }

    #[test]
    fn test_sub_sample_segment_clamps_to_one() {
        // A segment shorter than one sample period still drops sample-by-sample
        let signal = ramp(8000, 64);
        let mut rng = StdRng::seed_from_u64(4);
        let out = drop_packets(&signal, 1.0, 0.01, &mut rng);

        assert_eq!(out.len(), signal.len());
        assert!(out.samples.iter().all(|&s| s == 0.0));
    }
}
