//! Types for evaluation results and per-metric outcomes.

use std::fmt;

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use satlink_foundation::SignalError;

/// Errors that abort an evaluation outright: the input contract is violated
/// and no metric can be trusted. Recoverable by the caller by re-aligning
/// the inputs; nothing is coerced silently.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluateError {
    #[error("signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("sample rate mismatch: reference {reference} Hz, degraded {degraded} Hz")]
    SampleRateMismatch { reference: u32, degraded: u32 },

    #[error("length mismatch: reference {reference} samples, degraded {degraded} samples")]
    LengthMismatch { reference: usize, degraded: usize },
}

/// Why a single metric could not be computed.
///
/// Carried inside the result rather than raised as an error, so one
/// metric's preconditions failing never suppresses the others.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MetricFailure {
    #[error("sample rate {rate} Hz unsupported for this metric (supported: {supported:?})")]
    UnsupportedSampleRate { rate: u32, supported: [u32; 2] },

    #[error("signal too short for analysis: {samples} samples, need at least {minimum}")]
    TooShort { samples: usize, minimum: usize },
}

/// Outcome of a single metric: a score, or the reason there is none.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MetricOutcome {
    /// The metric computed successfully.
    Scored(f32),
    /// The metric's preconditions failed; the rest of the evaluation is
    /// unaffected.
    Unavailable(MetricFailure),
}

impl MetricOutcome {
    /// The score, if one was computed.
    pub fn score(&self) -> Option<f32> {
        match self {
            MetricOutcome::Scored(score) => Some(*score),
            MetricOutcome::Unavailable(_) => None,
        }
    }

    /// The failure, if the metric could not be computed.
    pub fn failure(&self) -> Option<&MetricFailure> {
        match self {
            MetricOutcome::Scored(_) => None,
            MetricOutcome::Unavailable(failure) => Some(failure),
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, MetricOutcome::Scored(_))
    }
}

impl fmt::Display for MetricOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricOutcome::Scored(score) => write!(f, "{score:.3}"),
            MetricOutcome::Unavailable(failure) => write!(f, "unavailable ({failure})"),
        }
    }
}

/// Sample-level comparison statistics between reference and degraded.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaveformAnalysis {
    /// Signal-to-noise ratio estimate in dB, treating the sample-wise
    /// difference as noise.
    pub snr_db: f32,
    /// Root-mean-square error between the two waveforms.
    pub rmse: f32,
    /// Pearson correlation coefficient; 0 when undefined (a constant
    /// signal).
    pub correlation: f32,
}

/// Qualitative intelligibility band for a STOI score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum IntelligibilityRating {
    Excellent,
    Good,
    Moderate,
    Poor,
}

impl IntelligibilityRating {
    /// Band a STOI score: >= 0.9 excellent, >= 0.7 good, >= 0.5 moderate,
    /// below that poor.
    pub fn from_stoi(score: f32) -> Self {
        if score >= 0.9 {
            IntelligibilityRating::Excellent
        } else if score >= 0.7 {
            IntelligibilityRating::Good
        } else if score >= 0.5 {
            IntelligibilityRating::Moderate
        } else {
            IntelligibilityRating::Poor
        }
    }
}

impl fmt::Display for IntelligibilityRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IntelligibilityRating::Excellent => "excellent",
            IntelligibilityRating::Good => "good",
            IntelligibilityRating::Moderate => "moderate",
            IntelligibilityRating::Poor => "poor",
        };
        write!(f, "{label}")
    }
}

/// Immutable result of one evaluation call.
///
/// Metrics are independent: each carries its own outcome, and a missing
/// transcript pair leaves `wer` as `None` — "not computed" is deliberately
/// distinct from a perfect score of zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EvaluationResult {
    /// Short-time objective intelligibility, roughly [0, 1].
    pub stoi: MetricOutcome,
    /// Perceptual quality score, clamped to [-0.5, 4.5].
    pub pesq: MetricOutcome,
    /// Word error rate; `None` when transcripts were not supplied.
    pub wer: Option<MetricOutcome>,
    /// Sample-level waveform statistics.
    pub waveform: WaveformAnalysis,
    /// Transcript WER was computed against, kept for auditability.
    pub reference_transcript: Option<String>,
    /// Transcript WER was computed from, kept for auditability.
    pub hypothesis_transcript: Option<String>,
}

impl EvaluationResult {
    /// Qualitative band for the STOI score, when one was computed.
    pub fn intelligibility_rating(&self) -> Option<IntelligibilityRating> {
        self.stoi.score().map(IntelligibilityRating::from_stoi)
    }

    /// Whether the STOI score clears an acceptance threshold, when one was
    /// computed.
    pub fn passes_stoi_threshold(&self, threshold: f32) -> Option<bool> {
        self.stoi.score().map(|score| score >= threshold)
    }

    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        let wer = match &self.wer {
            Some(outcome) => format!("{outcome}"),
            None => "not computed".to_string(),
        };
        format!(
            "STOI {} | PESQ {} | WER {} | SNR {:.1} dB",
            self.stoi, self.pesq, wer, self.waveform.snr_db
        )
    }
}

impl fmt::Display for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let scored = MetricOutcome::Scored(0.85);
        assert!(scored.is_scored());
        assert_eq!(scored.score(), Some(0.85));
        assert!(scored.failure().is_none());

        let failed = MetricOutcome::Unavailable(MetricFailure::UnsupportedSampleRate {
            rate: 22050,
            supported: [8000, 16000],
        });
        assert!(!failed.is_scored());
        assert_eq!(failed.score(), None);
        assert!(failed.failure().is_some());
    }

    #[test]
    fn test_rating_bands() {
        assert_eq!(
            IntelligibilityRating::from_stoi(0.95),
            IntelligibilityRating::Excellent
        );
        assert_eq!(
            IntelligibilityRating::from_stoi(0.9),
            IntelligibilityRating::Excellent
        );
        assert_eq!(
            IntelligibilityRating::from_stoi(0.75),
            IntelligibilityRating::Good
        );
        assert_eq!(
            IntelligibilityRating::from_stoi(0.5),
            IntelligibilityRating::Moderate
        );
        assert_eq!(
            IntelligibilityRating::from_stoi(0.2),
            IntelligibilityRating::Poor
        );
    }

    #[test]
    fn test_failure_messages() {
        let failure = MetricFailure::UnsupportedSampleRate {
            rate: 22050,
            supported: [8000, 16000],
        };
        assert!(failure.to_string().contains("22050"));

        let failure = MetricFailure::TooShort {
            samples: 100,
            minimum: 4096,
        };
        assert!(failure.to_string().contains("4096"));
    }

    #[test]
    fn test_summary_distinguishes_missing_wer() {
        let result = EvaluationResult {
            stoi: MetricOutcome::Scored(0.8),
            pesq: MetricOutcome::Scored(3.2),
            wer: None,
            waveform: WaveformAnalysis {
                snr_db: 12.0,
                rmse: 0.05,
                correlation: 0.97,
            },
            reference_transcript: None,
            hypothesis_transcript: None,
        };
        assert!(result.summary().contains("not computed"));
        assert_eq!(result.passes_stoi_threshold(0.5), Some(true));
        assert_eq!(
            result.intelligibility_rating(),
            Some(IntelligibilityRating::Good)
        );
    }
}
