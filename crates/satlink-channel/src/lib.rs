//! Satellite-link audio degradation simulation.
//!
//! Given a clean speech signal, this crate synthesizes the distortions the
//! signal would experience over a lossy, bandwidth-constrained satellite
//! channel: additive Gaussian noise, randomized packet loss, and
//! compression artifacts (band-limiting, requantization, harmonic
//! distortion, temporal smearing). Stages are pure transforms over
//! [`SignalBuffer`]s and compose in one fixed, documented order.
//!
//! # Example
//!
//! ```no_run
//! use satlink_channel::{simulate_transmission, TransmissionConfig};
//! use satlink_foundation::SignalBuffer;
//!
//! let clean = SignalBuffer::new(vec![0.0; 16000], 16000);
//! let config = TransmissionConfig::builder()
//!     .noise_level(0.1)
//!     .packet_loss_rate(0.05)
//!     .random_seed(42)
//!     .build();
//!
//! let degraded = simulate_transmission(&clean, &config)?;
//! assert_eq!(degraded.len(), clean.len());
//! # Ok::<(), satlink_channel::ChannelError>(())
//! ```

pub mod compression;
pub mod config;
pub mod noise;
pub mod packet_loss;
pub mod pipeline;

pub use config::{CompressionConfig, ConfigError, TransmissionConfig, TransmissionConfigBuilder};
pub use pipeline::{simulate_transmission, ChannelError, TransmissionPipeline};

// The shared value type, re-exported for callers that only pull this crate
pub use satlink_foundation::SignalBuffer;
