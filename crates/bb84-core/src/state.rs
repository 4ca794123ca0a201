//! BB84 qubit states and density matrices.
//!
//! The protocol uses two conjugate bases:
//!
//! | basis           | bit 0 | bit 1 |
//! |-----------------|-------|-------|
//! | computational   | \|0⟩  | \|1⟩  |
//! | diagonal        | \|+⟩  | \|−⟩  |
//!
//! The four kets, their density matrices and the per-basis projector pairs
//! are built once into a read-only table and exposed through accessor
//! functions. Density matrices are never mutated in place: every
//! transformation returns a new [`DensityMatrix`].

use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;
use std::sync::LazyLock;

use ndarray::{Array2, array};
use num_complex::Complex64;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Column vector of a single-qubit pure state.
pub type Ket = [Complex64; 2];

/// Measurement / preparation basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    /// Z eigenbasis {|0⟩, |1⟩} (basis index 0).
    Computational,
    /// X eigenbasis {|+⟩, |−⟩} (basis index 1).
    Diagonal,
}

impl Basis {
    /// Both bases, in index order.
    pub const ALL: [Basis; 2] = [Basis::Computational, Basis::Diagonal];

    /// Basis index: 0 for computational, 1 for diagonal.
    pub fn index(self) -> usize {
        match self {
            Basis::Computational => 0,
            Basis::Diagonal => 1,
        }
    }

    /// Inverse of [`Basis::index`]; any non-zero value maps to diagonal.
    pub fn from_index(index: u8) -> Self {
        if index == 0 {
            Basis::Computational
        } else {
            Basis::Diagonal
        }
    }

    /// Draw a basis uniformly at random (one binary draw).
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::from_index(draw_bit(rng))
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Computational => write!(f, "+"),
            Basis::Diagonal => write!(f, "x"),
        }
    }
}

/// Draw a uniform classical bit in {0, 1}.
pub fn draw_bit<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(0..2)
}

/// A 2×2 single-qubit density matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityMatrix {
    data: Array2<Complex64>,
}

impl DensityMatrix {
    /// Wrap a raw 2×2 matrix. The caller is responsible for it being a
    /// valid state; see [`DensityMatrix::is_valid`].
    ///
    /// # Panics
    /// Panics if `data` is not 2×2.
    pub fn from_matrix(data: Array2<Complex64>) -> Self {
        assert_eq!(data.dim(), (2, 2), "single-qubit density matrix must be 2x2");
        Self { data }
    }

    /// Pure state `|ψ⟩⟨ψ|`.
    pub fn from_ket(ket: &Ket) -> Self {
        let data = Array2::from_shape_fn((2, 2), |(i, j)| ket[i] * ket[j].conj());
        Self { data }
    }

    /// The maximally mixed state `I/2`.
    pub fn maximally_mixed() -> Self {
        Self {
            data: identity() * 0.5,
        }
    }

    /// Underlying matrix.
    pub fn matrix(&self) -> &Array2<Complex64> {
        &self.data
    }

    /// `Tr(ρ)`.
    pub fn trace(&self) -> Complex64 {
        self.data.diag().sum()
    }

    /// `Tr(op · ρ)`.
    pub fn expectation(&self, op: &Array2<Complex64>) -> Complex64 {
        op.dot(&self.data).diag().sum()
    }

    /// `U ρ U†`.
    pub fn conjugate_by(&self, unitary: &Array2<Complex64>) -> Self {
        let dagger = unitary.t().mapv(|z| z.conj());
        Self {
            data: unitary.dot(&self.data).dot(&dagger),
        }
    }

    /// Convex combination `(1 - w)·self + w·other`.
    pub fn mix(&self, other: &DensityMatrix, weight: f64) -> Self {
        Self {
            data: &self.data * (1.0 - weight) + &other.data * weight,
        }
    }

    /// Entry-wise check `ρ[i][j] == conj(ρ[j][i])` within `tol`.
    pub fn is_hermitian(&self, tol: f64) -> bool {
        (0..2).all(|i| (0..2).all(|j| (self.data[[i, j]] - self.data[[j, i]].conj()).norm() <= tol))
    }

    /// Hermitian, unit trace and positive semidefinite, all within `tol`.
    pub fn is_valid(&self, tol: f64) -> bool {
        let tr = self.trace();
        if (tr.re - 1.0).abs() > tol || tr.im.abs() > tol || !self.is_hermitian(tol) {
            return false;
        }
        // 2x2 Hermitian with positive trace is PSD iff det >= 0.
        let det = self.data[[0, 0]] * self.data[[1, 1]] - self.data[[0, 1]] * self.data[[1, 0]];
        det.re >= -tol
    }
}

/// 2×2 identity.
pub fn identity() -> Array2<Complex64> {
    let one = Complex64::new(1.0, 0.0);
    let zero = Complex64::new(0.0, 0.0);
    array![[one, zero], [zero, one]]
}

struct StateTable {
    /// Indexed `[basis][bit]`.
    kets: [[Ket; 2]; 2],
    /// `|ψ⟩⟨ψ|` for every ket; doubles as the projector onto that outcome.
    projectors: [[Array2<Complex64>; 2]; 2],
}

impl StateTable {
    fn build() -> Self {
        let one = Complex64::new(1.0, 0.0);
        let zero = Complex64::new(0.0, 0.0);
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);

        let kets = [[[one, zero], [zero, one]], [[h, h], [h, -h]]];
        let projectors = kets.map(|pair| pair.map(|ket| DensityMatrix::from_ket(&ket).data));
        Self { kets, projectors }
    }
}

static STATES: LazyLock<StateTable> = LazyLock::new(StateTable::build);

/// Ket for `(basis, bit)`. Any non-zero `bit` is treated as 1.
pub fn ket(basis: Basis, bit: u8) -> Ket {
    STATES.kets[basis.index()][bit_index(bit)]
}

/// Rank-1 projector onto outcome `bit` of `basis`.
pub fn projector(basis: Basis, bit: u8) -> &'static Array2<Complex64> {
    &STATES.projectors[basis.index()][bit_index(bit)]
}

/// Projector pair `[P0, P1]` of `basis`.
pub fn projectors(basis: Basis) -> &'static [Array2<Complex64>; 2] {
    &STATES.projectors[basis.index()]
}

/// Density matrix Alice sends for `(basis, bit)`.
pub fn prepare(basis: Basis, bit: u8) -> DensityMatrix {
    DensityMatrix {
        data: projector(basis, bit).clone(),
    }
}

fn bit_index(bit: u8) -> usize {
    debug_assert!(bit <= 1, "bit must be 0 or 1, got {bit}");
    usize::from(bit != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_prepared_states_are_valid() {
        for basis in Basis::ALL {
            for bit in 0..2 {
                let rho = prepare(basis, bit);
                assert!(rho.is_valid(TOL), "{basis:?}/{bit} invalid");
                // Pure: Tr(ρ²) = 1.
                assert!((rho.expectation(rho.matrix()).re - 1.0).abs() < TOL);
            }
        }
    }

    #[test]
    fn test_projector_pairs_are_complete() {
        for basis in Basis::ALL {
            let [p0, p1] = projectors(basis);
            let sum = p0 + p1;
            let id = identity();
            for (a, b) in sum.iter().zip(id.iter()) {
                assert!((a - b).norm() < TOL);
            }
        }
    }

    #[test]
    fn test_bases_are_mutually_unbiased() {
        for bit in 0..2 {
            let rho = prepare(Basis::Computational, bit);
            let p = rho.expectation(projector(Basis::Diagonal, 0)).re;
            assert!((p - 0.5).abs() < TOL);
        }
    }

    #[test]
    fn test_basis_index_roundtrip() {
        for basis in Basis::ALL {
            assert_eq!(Basis::from_index(basis.index() as u8), basis);
        }
    }

    #[test]
    fn test_maximally_mixed() {
        let rho = DensityMatrix::maximally_mixed();
        assert!(rho.is_valid(TOL));
        assert!((rho.trace().re - 1.0).abs() < TOL);
    }

    #[test]
    fn test_invalid_matrix_detected() {
        let rho = DensityMatrix::from_matrix(identity());
        assert!(!rho.is_valid(TOL));
    }
}
