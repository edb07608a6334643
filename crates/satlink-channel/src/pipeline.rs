//! Ordered application of the degradation stages.

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, info};

use satlink_foundation::{SignalBuffer, SignalError};

use crate::config::{ConfigError, TransmissionConfig};
use crate::{compression, noise, packet_loss};

/// Errors surfaced by a pipeline run. Every failure is typed and
/// recoverable by the caller; nothing at this layer is fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChannelError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("signal error: {0}")]
    Signal(#[from] SignalError),
}

/// Applies the degradation stages in a fixed, documented order:
/// noise, then packet loss, then compression artifacts.
///
/// The order is a design decision, not an accident of call sites:
/// additive noise and dropped packets model the channel itself, and the
/// compression artifacts model the receiver-side lossy processing that the
/// already-impaired signal passes through afterwards.
///
/// A pipeline never mutates its input buffer. Runs with the same
/// `random_seed` are bit-reproducible; unseeded runs draw fresh entropy.
pub struct TransmissionPipeline {
    config: TransmissionConfig,
}

impl TransmissionPipeline {
    pub fn new(config: TransmissionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransmissionConfig {
        &self.config
    }

    /// Degrade `signal` according to this pipeline's configuration.
    ///
    /// The configuration is validated against the signal's sample rate
    /// before any stage executes, so an invalid config can never leave a
    /// partially degraded result.
    pub fn run(&self, signal: &SignalBuffer) -> Result<SignalBuffer, ChannelError> {
        signal.validate()?;
        self.config.validate(signal.sample_rate)?;

        let mut rng = match self.config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        info!(
            samples = signal.len(),
            sample_rate = signal.sample_rate,
            seeded = self.config.random_seed.is_some(),
            "simulating satellite transmission"
        );

        let noisy = noise::add_noise(signal, self.config.noise_level, &mut rng);
        debug!(
            stage = "noise",
            noise_level = self.config.noise_level,
            peak_dbfs = noisy.peak_dbfs(),
            "stage applied"
        );

        let lossy = packet_loss::drop_packets(
            &noisy,
            self.config.packet_loss_rate,
            self.config.packet_segment_ms,
            &mut rng,
        );
        debug!(
            stage = "packet_loss",
            loss_rate = self.config.packet_loss_rate,
            segment_ms = self.config.packet_segment_ms,
            "stage applied"
        );

        let degraded = compression::apply_codec_artifacts(&lossy, &self.config.compression);
        debug!(
            stage = "compression",
            bandwidth_hz = self.config.compression.bandwidth_hz,
            quantization_bits = self.config.compression.quantization_bits,
            rms_dbfs = degraded.rms_dbfs(),
            "stage applied"
        );

        Ok(degraded)
    }
}

/// One-shot entry point: degrade `signal` under `config`.
pub fn simulate_transmission(
    signal: &SignalBuffer,
    config: &TransmissionConfig,
) -> Result<SignalBuffer, ChannelError> {
    TransmissionPipeline::new(config.clone()).run(signal)
}
