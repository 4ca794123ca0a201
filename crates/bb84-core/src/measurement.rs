//! Projective measurement in a BB84 basis (Born rule).

use rand::Rng;

use crate::state::{Basis, DensityMatrix, projector};

/// Clamp a computed probability into `[0, 1]`, absorbing floating drift
/// such as `-1e-16` or `1 + 1e-16`.
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(0.0, 1.0)
}

/// Probability of observing `bit` when measuring `rho` in `basis`:
/// `Re Tr(P_bit · ρ)`, clamped.
pub fn born_probability(rho: &DensityMatrix, basis: Basis, bit: u8) -> f64 {
    clamp_probability(rho.expectation(projector(basis, bit)).re)
}

/// Measure `rho` in `basis`, consuming exactly one uniform draw from `rng`.
pub fn measure<R: Rng + ?Sized>(rho: &DensityMatrix, basis: Basis, rng: &mut R) -> u8 {
    let p0 = born_probability(rho, basis, 0);
    let u: f64 = rng.r#gen();
    if u < p0 { 0 } else { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::prepare;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_clamp_absorbs_drift() {
        assert_eq!(clamp_probability(-1e-16), 0.0);
        assert_eq!(clamp_probability(1.0 + 1e-16), 1.0);
        assert_eq!(clamp_probability(0.25), 0.25);
    }

    #[test]
    fn test_eigenstates_measure_deterministically() {
        let mut rng = StdRng::seed_from_u64(3);
        for basis in Basis::ALL {
            for bit in 0..2 {
                let rho = prepare(basis, bit);
                for _ in 0..200 {
                    assert_eq!(measure(&rho, basis, &mut rng), bit);
                }
            }
        }
    }

    #[test]
    fn test_consumes_exactly_one_draw() {
        let rho = prepare(Basis::Diagonal, 0);
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        measure(&rho, Basis::Computational, &mut a);
        let _: f64 = b.r#gen();
        assert_eq!(a.r#gen::<u64>(), b.r#gen::<u64>());
    }
}
