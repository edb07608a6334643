//! Objective speech quality evaluation.
//!
//! Scores a degraded signal against its clean reference with standardized
//! metrics: STOI (intelligibility), a PESQ-style perceptual quality
//! estimate, WER (transcript accuracy, when transcripts are supplied), and
//! sample-level waveform statistics. Metrics are computed independently;
//! each carries its own success/failure status, so one metric's
//! preconditions failing never hides the rest.
//!
//! The evaluator accepts any two comparable signals, not only simulator
//! output, which is what keeps it independently testable.
//!
//! # Example
//!
//! ```no_run
//! use satlink_quality::evaluate_audio;
//! use satlink_foundation::SignalBuffer;
//!
//! let reference = SignalBuffer::new(vec![0.0; 16000], 16000);
//! let degraded = reference.clone();
//!
//! let result = evaluate_audio(
//!     &reference,
//!     &degraded,
//!     Some("the quick brown fox"),
//!     Some("the quick fox"),
//! )?;
//!
//! if let Some(rating) = result.intelligibility_rating() {
//!     println!("intelligibility: {rating}");
//! }
//! # Ok::<(), satlink_quality::EvaluateError>(())
//! ```

pub mod pesq;
pub mod stoi;
pub mod types;
pub mod waveform;
pub mod wer;

pub use types::{
    EvaluateError, EvaluationResult, IntelligibilityRating, MetricFailure, MetricOutcome,
    WaveformAnalysis,
};

use tracing::{info, warn};

use satlink_foundation::SignalBuffer;

/// Evaluate a degraded signal against its clean reference.
///
/// Both buffers must be non-empty, equal in length, and share a sample
/// rate; violations are hard errors (no implicit resampling or truncation
/// — alignment policy belongs to the caller). The degradation stages
/// preserve length, so a mismatch here indicates a caller bug, not channel
/// behavior.
///
/// WER is computed only when both transcripts are present; otherwise the
/// result's `wer` field is `None`, which is deliberately distinct from a
/// perfect score.
pub fn evaluate_audio(
    reference: &SignalBuffer,
    degraded: &SignalBuffer,
    reference_transcript: Option<&str>,
    hypothesis_transcript: Option<&str>,
) -> Result<EvaluationResult, EvaluateError> {
    reference.validate()?;
    degraded.validate()?;

    if reference.sample_rate != degraded.sample_rate {
        return Err(EvaluateError::SampleRateMismatch {
            reference: reference.sample_rate,
            degraded: degraded.sample_rate,
        });
    }

    if reference.len() != degraded.len() {
        return Err(EvaluateError::LengthMismatch {
            reference: reference.len(),
            degraded: degraded.len(),
        });
    }

    info!(
        samples = reference.len(),
        sample_rate = reference.sample_rate,
        transcripts = reference_transcript.is_some() && hypothesis_transcript.is_some(),
        "evaluating degraded signal"
    );

    let stoi = stoi::compute(reference, degraded);
    if let Some(failure) = stoi.failure() {
        warn!(metric = "stoi", %failure, "metric unavailable");
    }

    let pesq = pesq::compute(reference, degraded);
    if let Some(failure) = pesq.failure() {
        warn!(metric = "pesq", %failure, "metric unavailable");
    }

    let wer = match (reference_transcript, hypothesis_transcript) {
        (Some(reference_text), Some(hypothesis_text)) => Some(MetricOutcome::Scored(
            wer::compute(reference_text, hypothesis_text),
        )),
        _ => None,
    };

    let waveform = waveform::analyze(&reference.samples, &degraded.samples);

    Ok(EvaluationResult {
        stoi,
        pesq,
        wer,
        waveform,
        reference_transcript: reference_transcript.map(str::to_owned),
        hypothesis_transcript: hypothesis_transcript.map(str::to_owned),
    })
}

/// Thin stateless wrapper over [`evaluate_audio`] for callers that prefer
/// an evaluator object.
#[derive(Debug, Clone, Copy, Default)]
pub struct QualityEvaluator;

impl QualityEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        reference: &SignalBuffer,
        degraded: &SignalBuffer,
        reference_transcript: Option<&str>,
        hypothesis_transcript: Option<&str>,
    ) -> Result<EvaluationResult, EvaluateError> {
        evaluate_audio(
            reference,
            degraded,
            reference_transcript,
            hypothesis_transcript,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satlink_foundation::SignalError;

    fn tone(sample_rate: u32, samples: usize) -> SignalBuffer {
        let samples = (0..samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                let contour = 0.6 + 0.4 * (2.0 * std::f32::consts::PI * 3.0 * t).sin();
                contour * 0.5 * (2.0 * std::f32::consts::PI * 440.0 * t).sin()
            })
            .collect();
        SignalBuffer::new(samples, sample_rate)
    }

    #[test]
    fn test_rejects_empty_signal() {
        let empty = SignalBuffer::new(vec![], 16000);
        let signal = tone(16000, 16000);

        assert_eq!(
            evaluate_audio(&empty, &signal, None, None),
            Err(EvaluateError::Signal(SignalError::Empty))
        );
    }

    #[test]
    fn test_rejects_rate_mismatch() {
        let reference = tone(16000, 16000);
        let degraded = tone(8000, 16000);

        assert_eq!(
            evaluate_audio(&reference, &degraded, None, None),
            Err(EvaluateError::SampleRateMismatch {
                reference: 16000,
                degraded: 8000,
            })
        );
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let reference = tone(16000, 16000);
        let degraded = tone(16000, 8000);

        assert_eq!(
            evaluate_audio(&reference, &degraded, None, None),
            Err(EvaluateError::LengthMismatch {
                reference: 16000,
                degraded: 8000,
            })
        );
    }

    #[test]
    fn test_wer_omitted_without_transcripts() {
        let signal = tone(16000, 32000);

        let result = evaluate_audio(&signal, &signal, None, None).unwrap();
        assert!(result.wer.is_none());
        assert!(result.reference_transcript.is_none());

        // A lone transcript is not enough either
        let result = evaluate_audio(&signal, &signal, Some("hello"), None).unwrap();
        assert!(result.wer.is_none());
    }

    #[test]
    fn test_transcripts_kept_for_audit() {
        let signal = tone(16000, 32000);
        let result =
            evaluate_audio(&signal, &signal, Some("alpha bravo"), Some("alpha bravo")).unwrap();

        assert_eq!(result.wer.as_ref().and_then(|w| w.score()), Some(0.0));
        assert_eq!(result.reference_transcript.as_deref(), Some("alpha bravo"));
        assert_eq!(result.hypothesis_transcript.as_deref(), Some("alpha bravo"));
    }

    #[test]
    fn test_evaluator_object_delegates() {
        let signal = tone(16000, 32000);
        let evaluator = QualityEvaluator::new();

        let via_object = evaluator.evaluate(&signal, &signal, None, None).unwrap();
        let via_function = evaluate_audio(&signal, &signal, None, None).unwrap();
        assert_eq!(via_object, via_function);
    }
}
