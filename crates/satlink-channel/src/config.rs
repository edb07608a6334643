//! Transmission configuration: defaults, builder, presets, validation.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration error raised before any stage runs.
///
/// Every numeric field is checked against its valid domain up front; an
/// out-of-domain value is rejected rather than clamped, so a pipeline never
/// partially applies a bad configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("noise_level must be finite and non-negative, got {value}")]
    NoiseLevel { value: f32 },

    #[error("packet_loss_rate must be within [0, 1], got {value}")]
    PacketLossRate { value: f32 },

    #[error("packet_segment_ms must be finite and positive, got {value}")]
    SegmentDuration { value: f32 },

    #[error("bandwidth_hz must be within (0, {nyquist}] at this sample rate, got {value}")]
    Bandwidth { value: f32, nyquist: f32 },

    #[error("quantization_bits must be at least 1, got {value}")]
    QuantizationBits { value: u32 },

    #[error("harmonic_distortion_amount must be finite and non-negative, got {value}")]
    HarmonicDistortion { value: f32 },

    #[error("temporal_smear_ms must be finite and non-negative, got {value}")]
    TemporalSmear { value: f32 },
}

/// Receiver-side lossy processing parameters.
///
/// Each sub-effect is independently toggleable by leaving its parameter at
/// the no-op value: `bandwidth_hz` at or above Nyquist, `quantization_bits`
/// at or above the native f32 resolution, zero distortion amount, zero smear
/// width.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompressionConfig {
    /// Low-pass cutoff approximating channel bandwidth restriction, Hz.
    pub bandwidth_hz: f32,

    /// Effective bit depth after lossy coding. Values at or above 24 bits
    /// (the f32 significand) leave the signal untouched.
    pub quantization_bits: u32,

    /// Strength of the nonlinear waveshaper. 0 = identity.
    pub harmonic_distortion_amount: f32,

    /// Width of the smoothing kernel approximating echo/dispersion, ms.
    /// 0 = identity.
    pub temporal_smear_ms: f32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            bandwidth_hz: 3400.0,
            quantization_bits: 12,
            harmonic_distortion_amount: 0.2,
            temporal_smear_ms: 4.0,
        }
    }
}

impl CompressionConfig {
    /// A configuration under which every sub-effect is a no-op.
    pub fn transparent(nyquist_hz: f32) -> Self {
        Self {
            bandwidth_hz: nyquist_hz,
            quantization_bits: 32,
            harmonic_distortion_amount: 0.0,
            temporal_smear_ms: 0.0,
        }
    }
}

/// Parameters for one simulated trip over the satellite link.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransmissionConfig {
    /// Controls injected noise standard deviation as a fraction of the
    /// signal's peak amplitude. 0 = no noise.
    pub noise_level: f32,

    /// Probability that a given segment is dropped, in [0, 1].
    pub packet_loss_rate: f32,

    /// Duration of each droppable segment, ms.
    pub packet_segment_ms: f32,

    /// Receiver-side compression artifacts.
    pub compression: CompressionConfig,

    /// When set, all stochastic stages are reproducible: two runs with the
    /// same seed produce bit-identical output.
    pub random_seed: Option<u64>,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            noise_level: 0.1,
            packet_loss_rate: 0.1,
            packet_segment_ms: 100.0,
            compression: CompressionConfig::default(),
            random_seed: None,
        }
    }
}

impl TransmissionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> TransmissionConfigBuilder {
        TransmissionConfigBuilder::default()
    }

    /// Nominal link conditions: light noise, rare loss, generous bandwidth.
    pub fn clear_sky() -> Self {
        Self {
            noise_level: 0.02,
            packet_loss_rate: 0.01,
            compression: CompressionConfig {
                bandwidth_hz: 7000.0,
                quantization_bits: 16,
                harmonic_distortion_amount: 0.05,
                temporal_smear_ms: 1.0,
            },
            ..Default::default()
        }
    }

    /// Marginal link: the defaults. Noticeable noise and loss, telephony
    /// bandwidth.
    pub fn degraded_link() -> Self {
        Self::default()
    }

    /// Deep fade: heavy noise, frequent loss, narrow pipe, coarse coding.
    pub fn severe_fade() -> Self {
        Self {
            noise_level: 0.4,
            packet_loss_rate: 0.3,
            packet_segment_ms: 60.0,
            compression: CompressionConfig {
                bandwidth_hz: 2000.0,
                quantization_bits: 6,
                harmonic_distortion_amount: 0.8,
                temporal_smear_ms: 12.0,
            },
            random_seed: None,
        }
    }

    /// Load overrides from environment variables on top of the defaults.
    ///
    /// Supported variables:
    /// - `SATLINK_NOISE_LEVEL`
    /// - `SATLINK_PACKET_LOSS_RATE`
    /// - `SATLINK_PACKET_SEGMENT_MS`
    /// - `SATLINK_BANDWIDTH_HZ`
    /// - `SATLINK_QUANTIZATION_BITS`
    /// - `SATLINK_HARMONIC_DISTORTION`
    /// - `SATLINK_TEMPORAL_SMEAR_MS`
    /// - `SATLINK_RANDOM_SEED`
    ///
    /// Unparseable values are ignored; domain checking still happens in
    /// [`TransmissionConfig::validate`] when the pipeline runs.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("SATLINK_NOISE_LEVEL") {
            if let Ok(level) = val.parse::<f32>() {
                config.noise_level = level;
            }
        }

        if let Ok(val) = std::env::var("SATLINK_PACKET_LOSS_RATE") {
            if let Ok(rate) = val.parse::<f32>() {
                config.packet_loss_rate = rate;
            }
        }

        if let Ok(val) = std::env::var("SATLINK_PACKET_SEGMENT_MS") {
            if let Ok(ms) = val.parse::<f32>() {
                config.packet_segment_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("SATLINK_BANDWIDTH_HZ") {
            if let Ok(hz) = val.parse::<f32>() {
                config.compression.bandwidth_hz = hz;
            }
        }

        if let Ok(val) = std::env::var("SATLINK_QUANTIZATION_BITS") {
            if let Ok(bits) = val.parse::<u32>() {
                config.compression.quantization_bits = bits;
            }
        }

        if let Ok(val) = std::env::var("SATLINK_HARMONIC_DISTORTION") {
            if let Ok(amount) = val.parse::<f32>() {
                config.compression.harmonic_distortion_amount = amount;
            }
        }

        if let Ok(val) = std::env::var("SATLINK_TEMPORAL_SMEAR_MS") {
            if let Ok(ms) = val.parse::<f32>() {
                config.compression.temporal_smear_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("SATLINK_RANDOM_SEED") {
            if let Ok(seed) = val.parse::<u64>() {
                config.random_seed = Some(seed);
            }
        }

        config
    }

    /// Check every field against its valid domain for the given sample rate.
    ///
    /// Called by the pipeline before any stage executes.
    pub fn validate(&self, sample_rate: u32) -> Result<(), ConfigError> {
        if !self.noise_level.is_finite() || self.noise_level < 0.0 {
            return Err(ConfigError::NoiseLevel {
                value: self.noise_level,
            });
        }

        if !self.packet_loss_rate.is_finite()
            || !(0.0..=1.0).contains(&self.packet_loss_rate)
        {
            return Err(ConfigError::PacketLossRate {
                value: self.packet_loss_rate,
            });
        }

        if !self.packet_segment_ms.is_finite() || self.packet_segment_ms <= 0.0 {
            return Err(ConfigError::SegmentDuration {
                value: self.packet_segment_ms,
            });
        }

        let nyquist = sample_rate as f32 / 2.0;
        let bandwidth = self.compression.bandwidth_hz;
        if !bandwidth.is_finite() || bandwidth <= 0.0 || bandwidth > nyquist {
            return Err(ConfigError::Bandwidth {
                value: bandwidth,
                nyquist,
            });
        }

        if self.compression.quantization_bits < 1 {
            return Err(ConfigError::QuantizationBits {
                value: self.compression.quantization_bits,
            });
        }

        let distortion = self.compression.harmonic_distortion_amount;
        if !distortion.is_finite() || distortion < 0.0 {
            return Err(ConfigError::HarmonicDistortion { value: distortion });
        }

        let smear = self.compression.temporal_smear_ms;
        if !smear.is_finite() || smear < 0.0 {
            return Err(ConfigError::TemporalSmear { value: smear });
        }

        Ok(())
    }
}

/// Builder for [`TransmissionConfig`].
#[derive(Debug, Default)]
pub struct TransmissionConfigBuilder {
    noise_level: Option<f32>,
    packet_loss_rate: Option<f32>,
    packet_segment_ms: Option<f32>,
    bandwidth_hz: Option<f32>,
    quantization_bits: Option<u32>,
    harmonic_distortion_amount: Option<f32>,
    temporal_smear_ms: Option<f32>,
    random_seed: Option<u64>,
}

impl TransmissionConfigBuilder {
    pub fn noise_level(mut self, level: f32) -> Self {
        self.noise_level = Some(level);
        self
    }

    pub fn packet_loss_rate(mut self, rate: f32) -> Self {
        self.packet_loss_rate = Some(rate);
        self
    }

    pub fn packet_segment_ms(mut self, ms: f32) -> Self {
        self.packet_segment_ms = Some(ms);
        self
    }

    pub fn bandwidth_hz(mut self, hz: f32) -> Self {
        self.bandwidth_hz = Some(hz);
        self
    }

    pub fn quantization_bits(mut self, bits: u32) -> Self {
        self.quantization_bits = Some(bits);
        self
    }

    pub fn harmonic_distortion_amount(mut self, amount: f32) -> Self {
        self.harmonic_distortion_amount = Some(amount);
        self
    }

    pub fn temporal_smear_ms(mut self, ms: f32) -> Self {
        self.temporal_smear_ms = Some(ms);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn build(self) -> TransmissionConfig {
        let defaults = TransmissionConfig::default();
        let compression_defaults = defaults.compression.clone();

        TransmissionConfig {
            noise_level: self.noise_level.unwrap_or(defaults.noise_level),
            packet_loss_rate: self.packet_loss_rate.unwrap_or(defaults.packet_loss_rate),
            packet_segment_ms: self
                .packet_segment_ms
                .unwrap_or(defaults.packet_segment_ms),
            compression: CompressionConfig {
                bandwidth_hz: self
                    .bandwidth_hz
                    .unwrap_or(compression_defaults.bandwidth_hz),
                quantization_bits: self
                    .quantization_bits
                    .unwrap_or(compression_defaults.quantization_bits),
                harmonic_distortion_amount: self
                    .harmonic_distortion_amount
                    .unwrap_or(compression_defaults.harmonic_distortion_amount),
                temporal_smear_ms: self
                    .temporal_smear_ms
                    .unwrap_or(compression_defaults.temporal_smear_ms),
            },
            random_seed: self.random_seed.or(defaults.random_seed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = TransmissionConfig::default();
        assert!(config.validate(16000).is_ok());
        assert!(config.validate(8000).is_ok());
    }

    #[test]
    fn test_presets_validate() {
        for config in [
            TransmissionConfig::clear_sky(),
            TransmissionConfig::degraded_link(),
            TransmissionConfig::severe_fade(),
        ] {
            assert!(config.validate(16000).is_ok(), "preset failed: {config:?}");
        }
    }

    #[test]
    fn test_clear_sky_bandwidth_needs_wideband_rate() {
        // 7 kHz cutoff is above the 4 kHz Nyquist of an 8 kHz signal
        let config = TransmissionConfig::clear_sky();
        assert!(matches!(
            config.validate(8000),
            Err(ConfigError::Bandwidth { .. })
        ));
    }

    #[test]
    fn test_rejects_loss_rate_above_one() {
        let config = TransmissionConfig {
            packet_loss_rate: 1.5,
            ..Default::default()
        };
        assert_eq!(
            config.validate(16000),
            Err(ConfigError::PacketLossRate { value: 1.5 })
        );
    }

    #[test]
    fn test_rejects_zero_quantization_bits() {
        let config = TransmissionConfig::builder().quantization_bits(0).build();
        assert_eq!(
            config.validate(16000),
            Err(ConfigError::QuantizationBits { value: 0 })
        );
    }

    #[test]
    fn test_rejects_non_finite_fields() {
        let config = TransmissionConfig {
            noise_level: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(16000),
            Err(ConfigError::NoiseLevel { .. })
        ));

        let config = TransmissionConfig::builder()
            .temporal_smear_ms(f32::INFINITY)
            .build();
        assert!(matches!(
            config.validate(16000),
            Err(ConfigError::TemporalSmear { .. })
        ));
    }

    #[test]
    fn test_rejects_negative_segment_duration() {
        let config = TransmissionConfig::builder().packet_segment_ms(-5.0).build();
        assert!(matches!(
            config.validate(16000),
            Err(ConfigError::SegmentDuration { .. })
        ));
    }

    #[test]
    fn test_builder_round_trip() {
        let config = TransmissionConfig::builder()
            .noise_level(0.25)
            .packet_loss_rate(0.05)
            .packet_segment_ms(40.0)
            .bandwidth_hz(3000.0)
            .quantization_bits(8)
            .harmonic_distortion_amount(0.5)
            .temporal_smear_ms(2.0)
            .random_seed(42)
            .build();

        assert_eq!(config.noise_level, 0.25);
        assert_eq!(config.packet_loss_rate, 0.05);
        assert_eq!(config.packet_segment_ms, 40.0);
        assert_eq!(config.compression.bandwidth_hz, 3000.0);
        assert_eq!(config.compression.quantization_bits, 8);
        assert_eq!(config.compression.harmonic_distortion_amount, 0.5);
        assert_eq!(config.compression.temporal_smear_ms, 2.0);
        assert_eq!(config.random_seed, Some(42));
    }

    #[test]
    fn test_builder_defaults_match_default() {
        assert_eq!(
            TransmissionConfig::builder().build(),
            TransmissionConfig::default()
        );
    }

    #[test]
    fn test_transparent_compression_validates_at_nyquist() {
        let config = TransmissionConfig {
            compression: CompressionConfig::transparent(8000.0),
            ..Default::default()
        };
        assert!(config.validate(16000).is_ok());
    }
}
