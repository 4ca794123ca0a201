//! Intercept-resend eavesdropper.
//!
//! Eve measures the qubit in a uniformly random basis and forwards a fresh
//! eigenstate of that basis matching her outcome. Whenever her basis differs
//! from Alice's, the forwarded state is unbiased with respect to Alice's
//! basis and Bob's sifted bit is wrong half of the time.

use rand::Rng;
use tracing::trace;

use crate::measurement::measure;
use crate::state::{Basis, DensityMatrix, prepare};

/// Intercept `rho`, measure it and resend the collapsed state.
///
/// Consumes two draws from `rng`: Eve's basis, then her measurement.
pub fn intercept_resend<R: Rng + ?Sized>(rho: &DensityMatrix, rng: &mut R) -> DensityMatrix {
    let basis = Basis::random(rng);
    let bit = measure(rho, basis, rng);
    trace!(%basis, bit, "eve intercepted");
    prepare(basis, bit)
}
