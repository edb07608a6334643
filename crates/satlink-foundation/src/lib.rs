//! Foundation types for the SatLink degradation simulator and evaluator.
//!
//! This crate holds the value types shared by every stage of the system:
//! the [`SignalBuffer`] that carries audio between the channel simulator and
//! the quality evaluator, level helpers (peak/RMS/dBFS), and the base signal
//! validation errors.

pub mod error;
pub mod signal;

pub use error::SignalError;
pub use signal::{dbfs_to_linear, linear_to_dbfs, SignalBuffer};
