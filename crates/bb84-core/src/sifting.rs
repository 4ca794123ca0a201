//! Basis reconciliation and error statistics on the sifted key.
//!
//! All functions are pure. Inputs of unequal length are a caller bug and
//! are rejected with [`Bb84Error::ShapeMismatch`]; they are never truncated.
//! An empty sifted key is a legitimate outcome: its QBER is `NaN`.

use serde::{Deserialize, Serialize};

use crate::error::{Bb84Error, QkdResult};
use crate::state::Basis;

/// Keep the rounds where Alice's and Bob's bases agree, in round order.
pub fn sift<T: Copy>(
    alice_bits: &[T],
    bob_bits: &[T],
    alice_bases: &[Basis],
    bob_bases: &[Basis],
) -> QkdResult<(Vec<T>, Vec<T>)> {
    check_lengths(
        "sift",
        &[alice_bits.len(), bob_bits.len(), alice_bases.len(), bob_bases.len()],
    )?;

    let (alice, bob): (Vec<T>, Vec<T>) = alice_bits
        .iter()
        .zip(bob_bits)
        .zip(alice_bases.iter().zip(bob_bases))
        .filter(|(_, (a_basis, b_basis))| a_basis == b_basis)
        .map(|((&a, &b), _)| (a, b))
        .unzip();
    Ok((alice, bob))
}

/// Number of positions where the two sifted keys differ.
pub fn count_errors<T: PartialEq>(alice_sifted: &[T], bob_sifted: &[T]) -> QkdResult<usize> {
    check_lengths("count_errors", &[alice_sifted.len(), bob_sifted.len()])?;
    Ok(alice_sifted
        .iter()
        .zip(bob_sifted)
        .filter(|(a, b)| a != b)
        .count())
}

/// Fraction of differing positions; `NaN` when the sifted key is empty.
pub fn qber<T: PartialEq>(alice_sifted: &[T], bob_sifted: &[T]) -> QkdResult<f64> {
    check_lengths("qber", &[alice_sifted.len(), bob_sifted.len()])?;
    if alice_sifted.is_empty() {
        return Ok(f64::NAN);
    }
    let errors = count_errors(alice_sifted, bob_sifted)?;
    Ok(errors as f64 / alice_sifted.len() as f64)
}

/// QBER restricted to the sifted rounds of each basis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BasisQber {
    /// QBER over sifted rounds where both used the computational basis.
    pub computational: f64,
    /// QBER over sifted rounds where both used the diagonal basis.
    pub diagonal: f64,
}

impl BasisQber {
    /// QBER for one basis.
    pub fn get(&self, basis: Basis) -> f64 {
        match basis {
            Basis::Computational => self.computational,
            Basis::Diagonal => self.diagonal,
        }
    }
}

/// Split the sifted QBER by the shared basis.
///
/// Under the bit-flip channel only computational-basis rounds pick up
/// errors, which this breakdown makes visible.
pub fn qber_by_basis<T: Copy + PartialEq>(
    alice_bits: &[T],
    bob_bits: &[T],
    alice_bases: &[Basis],
    bob_bases: &[Basis],
) -> QkdResult<BasisQber> {
    check_lengths(
        "qber_by_basis",
        &[alice_bits.len(), bob_bits.len(), alice_bases.len(), bob_bases.len()],
    )?;

    let mut per_basis = [(0usize, 0usize); 2];
    for i in 0..alice_bits.len() {
        if alice_bases[i] != bob_bases[i] {
            continue;
        }
        let slot = &mut per_basis[alice_bases[i].index()];
        slot.0 += 1;
        if alice_bits[i] != bob_bits[i] {
            slot.1 += 1;
        }
    }

    let rate = |(sifted, errors): (usize, usize)| {
        if sifted == 0 {
            f64::NAN
        } else {
            errors as f64 / sifted as f64
        }
    };
    Ok(BasisQber {
        computational: rate(per_basis[0]),
        diagonal: rate(per_basis[1]),
    })
}

fn check_lengths(context: &'static str, lengths: &[usize]) -> QkdResult<()> {
    if lengths.windows(2).all(|w| w[0] == w[1]) {
        Ok(())
    } else {
        Err(Bb84Error::ShapeMismatch {
            context,
            lengths: lengths.to_vec(),
        })
    }
}
