//! Noisy quantum channels acting on the qubit in transit.
//!
//! Both channels are convex mixtures of trace-one matrices, so they are
//! trace-preserving and completely positive for any `p ∈ [0, 1]`:
//!
//! - bit-flip:     ρ ↦ (1 − p)·ρ + p·XρX
//! - depolarizing: ρ ↦ (1 − p)·ρ + p·I/2
//!
//! The bit-flip channel leaves |±⟩ untouched (they are X eigenstates), so it
//! only produces errors on rounds prepared in the computational basis.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use ndarray::{Array2, array};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{Bb84Error, QkdResult, check_probability};
use crate::state::DensityMatrix;

static PAULI_X: LazyLock<Array2<Complex64>> = LazyLock::new(|| {
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);
    array![[zero, one], [one, zero]]
});

static MAXIMALLY_MIXED: LazyLock<DensityMatrix> = LazyLock::new(DensityMatrix::maximally_mixed);

/// The Pauli bit-flip operator X.
pub fn pauli_x() -> &'static Array2<Complex64> {
    &PAULI_X
}

/// Channel noise model applied to every transmitted qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NoiseModel {
    /// Pauli-X with probability p.
    #[serde(rename = "bitflip")]
    BitFlip,
    /// Replace the state with I/2 with probability p.
    #[default]
    #[serde(rename = "depolarizing")]
    Depolarizing,
}

impl NoiseModel {
    /// Both models.
    pub const ALL: [NoiseModel; 2] = [NoiseModel::BitFlip, NoiseModel::Depolarizing];

    /// Identifier used in configuration files and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            NoiseModel::BitFlip => "bitflip",
            NoiseModel::Depolarizing => "depolarizing",
        }
    }

    /// Apply this channel with noise probability `p_noise`.
    pub fn apply(self, rho: &DensityMatrix, p_noise: f64) -> QkdResult<DensityMatrix> {
        match self {
            NoiseModel::BitFlip => bit_flip(rho, p_noise),
            NoiseModel::Depolarizing => depolarizing(rho, p_noise),
        }
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoiseModel {
    type Err = Bb84Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bitflip" => Ok(NoiseModel::BitFlip),
            "depolarizing" => Ok(NoiseModel::Depolarizing),
            _ => Err(Bb84Error::UnknownNoiseModel(s.to_string())),
        }
    }
}

/// `(1 − p)·ρ + p·XρX`.
pub fn bit_flip(rho: &DensityMatrix, p_noise: f64) -> QkdResult<DensityMatrix> {
    check_probability("p_noise", p_noise)?;
    Ok(rho.mix(&rho.conjugate_by(pauli_x()), p_noise))
}

/// `(1 − p)·ρ + p·I/2`.
pub fn depolarizing(rho: &DensityMatrix, p_noise: f64) -> QkdResult<DensityMatrix> {
    check_probability("p_noise", p_noise)?;
    Ok(rho.mix(&MAXIMALLY_MIXED, p_noise))
}
