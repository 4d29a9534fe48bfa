//! # Transport Error Types
//!
//! Configuration problems detected by [`crate::TransportConfig::validate`]
//! and friends. The integrator itself never fails: degenerate numbers are
//! absorbed per particle.

use thiserror::Error;

/// Errors that can occur when validating transport configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// A parameter that must be non-negative was negative or not finite.
    #[error("invalid {name}: {value} (must be a finite value >= 0)")]
    NegativeParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },

    /// A parameter that must be strictly positive was not.
    #[error("invalid {name}: {value} (must be a finite value > 0)")]
    NonPositiveParameter {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f32,
    },

    /// Sub-step count of zero.
    #[error("sub-step count must be at least 1")]
    ZeroSubsteps,

    /// A vector parameter contained NaN or infinity.
    #[error("invalid {0}: vector components must be finite")]
    NonFiniteVector(&'static str),

    /// Source id does not exist.
    #[error("emission source not found: {0}")]
    SourceNotFound(usize),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
