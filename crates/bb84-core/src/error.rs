//! Error types for the core simulator.

use thiserror::Error;

/// Errors produced by parameter validation and the sifting statistics.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Bb84Error {
    /// The number of rounds must be at least one.
    #[error("n must be positive, got {0}")]
    InvalidRounds(usize),

    /// A probability parameter fell outside `[0, 1]` (or was NaN).
    #[error("{name} must be in [0, 1], got {value}")]
    ProbabilityOutOfRange {
        /// Parameter name (`p_noise`, `q_eve`).
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Noise model identifier is not one of `bitflip` / `depolarizing`.
    #[error("noise_model must be 'bitflip' or 'depolarizing', got '{0}'")]
    UnknownNoiseModel(String),

    /// Input sequences to sifting or statistics have different lengths.
    #[error("{context}: sequence lengths differ {lengths:?}")]
    ShapeMismatch {
        /// Operation that rejected its inputs.
        context: &'static str,
        /// Length of each input, in argument order.
        lengths: Vec<usize>,
    },
}

impl Bb84Error {
    /// True for the invalid-parameter family (raised before any round runs).
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(
            self,
            Self::InvalidRounds(_) | Self::ProbabilityOutOfRange { .. } | Self::UnknownNoiseModel(_)
        )
    }
}

/// Result type for core simulator operations.
pub type QkdResult<T> = Result<T, Bb84Error>;

/// Check that `value` is a probability. NaN is rejected.
pub(crate) fn check_probability(name: &'static str, value: f64) -> QkdResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Bb84Error::ProbabilityOutOfRange { name, value })
    }
}
