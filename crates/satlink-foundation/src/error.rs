use thiserror::Error;

/// Validation errors for signal buffers entering any stage or evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("signal buffer contains no samples")]
    Empty,

    #[error("sample rate must be positive, got {rate} Hz")]
    InvalidSampleRate { rate: u32 },
}
