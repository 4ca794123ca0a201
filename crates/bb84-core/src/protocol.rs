//! BB84 round simulator and protocol driver.
//!
//! Each round runs the same fixed sequence against one shared random source:
//!
//! ```text
//! IDLE → PREPARED → (EVE_INTERCEPTED | unchanged) → NOISE_APPLIED → MEASURED → DONE
//! ```
//!
//! Random draws per round, in order:
//! 1. Alice's bit, Alice's basis, Bob's basis (three binary draws)
//! 2. the intercept decision (one uniform draw, always consumed)
//! 3. Eve's basis and measurement (two draws, only when she intercepts)
//! 4. Bob's measurement (one uniform draw)
//!
//! Keeping this order fixed is what makes a seeded run reproducible
//! bit-for-bit. Rounds are never reordered or run concurrently.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::channel::NoiseModel;
use crate::error::{Bb84Error, QkdResult, check_probability};
use crate::eve::intercept_resend;
use crate::measurement::measure;
use crate::sifting::{BasisQber, count_errors, qber, qber_by_basis, sift};
use crate::state::{Basis, draw_bit, prepare};

/// Protocol parameters for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bb84Params {
    /// Number of rounds (qubits sent).
    pub n: usize,
    /// Channel noise probability.
    pub p_noise: f64,
    /// Probability that Eve intercepts any single round.
    pub q_eve: f64,
    /// Channel noise model.
    pub noise_model: NoiseModel,
    /// Seed for the random source; `None` draws one from OS entropy.
    pub seed: Option<u64>,
}

impl Default for Bb84Params {
    fn default() -> Self {
        Self {
            n: 50_000,
            p_noise: 0.0,
            q_eve: 0.0,
            noise_model: NoiseModel::Depolarizing,
            seed: Some(0),
        }
    }
}

impl Bb84Params {
    /// Noise-free, eavesdropper-free parameters for `n` rounds.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            ..Self::default()
        }
    }

    /// Set the channel noise probability.
    #[must_use]
    pub fn with_p_noise(mut self, p_noise: f64) -> Self {
        self.p_noise = p_noise;
        self
    }

    /// Set the interception probability.
    #[must_use]
    pub fn with_q_eve(mut self, q_eve: f64) -> Self {
        self.q_eve = q_eve;
        self
    }

    /// Set the noise model.
    #[must_use]
    pub fn with_noise_model(mut self, noise_model: NoiseModel) -> Self {
        self.noise_model = noise_model;
        self
    }

    /// Set (or clear) the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Reject parameters that would make the run meaningless.
    ///
    /// The noise model is a closed enum, so unknown identifiers are already
    /// rejected when parsed (see [`NoiseModel`]'s `FromStr`).
    pub fn validate(&self) -> QkdResult<()> {
        if self.n == 0 {
            return Err(Bb84Error::InvalidRounds(self.n));
        }
        check_probability("p_noise", self.p_noise)?;
        check_probability("q_eve", self.q_eve)?;
        Ok(())
    }

    /// Fresh random source for this run.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Raw per-round data, stored as parallel sequences of length `n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundRecord {
    /// Alice's raw key bits.
    pub alice_bits: Vec<u8>,
    /// Alice's preparation bases.
    pub alice_bases: Vec<Basis>,
    /// Bob's measurement bases.
    pub bob_bases: Vec<Basis>,
    /// Bob's measurement outcomes.
    pub bob_bits: Vec<u8>,
    /// Whether Eve intercepted the round.
    pub intercepted: Vec<bool>,
}

impl RoundRecord {
    /// Empty record with room for `n` rounds.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            alice_bits: Vec::with_capacity(n),
            alice_bases: Vec::with_capacity(n),
            bob_bases: Vec::with_capacity(n),
            bob_bits: Vec::with_capacity(n),
            intercepted: Vec::with_capacity(n),
        }
    }

    /// Number of rounds recorded.
    pub fn len(&self) -> usize {
        self.alice_bits.len()
    }

    /// True if no rounds have been recorded.
    pub fn is_empty(&self) -> bool {
        self.alice_bits.is_empty()
    }

    /// Number of rounds Eve intercepted.
    pub fn n_intercepted(&self) -> usize {
        self.intercepted.iter().filter(|&&hit| hit).count()
    }

    /// Sifted `(alice, bob)` key pair.
    pub fn sift(&self) -> QkdResult<(Vec<u8>, Vec<u8>)> {
        sift(
            &self.alice_bits,
            &self.bob_bits,
            &self.alice_bases,
            &self.bob_bases,
        )
    }

    /// Sifted QBER split by basis.
    pub fn qber_by_basis(&self) -> QkdResult<BasisQber> {
        qber_by_basis(
            &self.alice_bits,
            &self.bob_bits,
            &self.alice_bases,
            &self.bob_bases,
        )
    }

    fn push(&mut self, round: RoundOutcome) {
        self.alice_bits.push(round.alice_bit);
        self.alice_bases.push(round.alice_basis);
        self.bob_bases.push(round.bob_basis);
        self.bob_bits.push(round.bob_bit);
        self.intercepted.push(round.intercepted);
    }
}

/// Summary of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bb84Result {
    /// Sifted QBER; `NaN` when no round survived sifting.
    pub qber: f64,
    /// Rounds simulated.
    pub n_total: usize,
    /// Rounds whose bases matched.
    pub n_sifted: usize,
    /// Sifted rounds where Bob's bit differs from Alice's.
    pub n_errors: usize,
    /// Rounds Eve intercepted.
    pub n_intercepted: usize,
    /// The parameters that produced this result.
    pub params: Bb84Params,
}

impl Bb84Result {
    /// QBER, or `None` when undefined.
    pub fn qber_value(&self) -> Option<f64> {
        (!self.qber.is_nan()).then_some(self.qber)
    }

    /// `n_sifted / n_total`.
    pub fn sifted_fraction(&self) -> f64 {
        self.n_sifted as f64 / self.n_total as f64
    }
}

#[derive(Debug, Clone, Copy)]
struct RoundOutcome {
    alice_bit: u8,
    alice_basis: Basis,
    bob_basis: Basis,
    bob_bit: u8,
    intercepted: bool,
}

/// Run the protocol with a random source seeded from `params.seed`.
pub fn simulate(params: &Bb84Params) -> QkdResult<Bb84Result> {
    params.validate()?;
    let mut rng = params.rng();
    simulate_with_rng(params, &mut rng)
}

/// Run the protocol against a caller-supplied random source.
///
/// `params.seed` is ignored here; it is only echoed in the result.
pub fn simulate_with_rng<R: Rng + ?Sized>(
    params: &Bb84Params,
    rng: &mut R,
) -> QkdResult<Bb84Result> {
    let record = run_rounds(params, rng)?;
    summarize(params, &record)
}

/// Reduce a round record to its sifted statistics.
pub fn summarize(params: &Bb84Params, record: &RoundRecord) -> QkdResult<Bb84Result> {
    let (alice_sifted, bob_sifted) = record.sift()?;
    let n_errors = count_errors(&alice_sifted, &bob_sifted)?;
    let qber = qber(&alice_sifted, &bob_sifted)?;

    debug!(
        n_total = record.len(),
        n_sifted = alice_sifted.len(),
        n_errors,
        qber,
        "bb84 run finished"
    );

    Ok(Bb84Result {
        qber,
        n_total: record.len(),
        n_sifted: alice_sifted.len(),
        n_errors,
        n_intercepted: record.n_intercepted(),
        params: params.clone(),
    })
}

/// Simulate all `params.n` rounds and return the raw round record.
pub fn run_rounds<R: Rng + ?Sized>(params: &Bb84Params, rng: &mut R) -> QkdResult<RoundRecord> {
    params.validate()?;
    debug!(
        n = params.n,
        p_noise = params.p_noise,
        q_eve = params.q_eve,
        noise_model = %params.noise_model,
        seed = ?params.seed,
        "starting bb84 run"
    );

    let mut record = RoundRecord::with_capacity(params.n);
    for _ in 0..params.n {
        record.push(simulate_round(params, rng)?);
    }
    Ok(record)
}

fn simulate_round<R: Rng + ?Sized>(params: &Bb84Params, rng: &mut R) -> QkdResult<RoundOutcome> {
    let alice_bit = draw_bit(rng);
    let alice_basis = Basis::random(rng);
    let bob_basis = Basis::random(rng);

    let mut rho = prepare(alice_basis, alice_bit);

    let intercepted = rng.r#gen::<f64>() < params.q_eve;
    if intercepted {
        rho = intercept_resend(&rho, rng);
    }

    let rho = params.noise_model.apply(&rho, params.p_noise)?;
    let bob_bit = measure(&rho, bob_basis, rng);

    trace!(
        alice_bit,
        %alice_basis,
        %bob_basis,
        bob_bit,
        intercepted,
        "round done"
    );

    Ok(RoundOutcome {
        alice_bit,
        alice_basis,
        bob_basis,
        bob_bit,
        intercepted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let params = Bb84Params::new(10)
            .with_p_noise(0.1)
            .with_q_eve(0.2)
            .with_noise_model(NoiseModel::BitFlip)
            .with_seed(Some(9));
        assert_eq!(params.n, 10);
        assert_eq!(params.p_noise, 0.1);
        assert_eq!(params.q_eve, 0.2);
        assert_eq!(params.noise_model, NoiseModel::BitFlip);
        assert_eq!(params.seed, Some(9));
    }

    #[test]
    fn test_validate_rejects_bad_params() {
        assert_eq!(
            Bb84Params::new(0).validate(),
            Err(Bb84Error::InvalidRounds(0))
        );
        assert!(Bb84Params::new(1).with_p_noise(1.01).validate().is_err());
        assert!(Bb84Params::new(1).with_q_eve(-0.5).validate().is_err());
        assert!(Bb84Params::new(1).with_q_eve(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_record_lengths_match_n() {
        let params = Bb84Params::new(257).with_q_eve(0.5).with_p_noise(0.1);
        let record = run_rounds(&params, &mut params.rng()).unwrap();
        assert_eq!(record.len(), 257);
        assert_eq!(record.alice_bases.len(), 257);
        assert_eq!(record.bob_bases.len(), 257);
        assert_eq!(record.bob_bits.len(), 257);
        assert_eq!(record.intercepted.len(), 257);
    }

    #[test]
    fn test_summarize_matches_simulate() {
        let params = Bb84Params::new(300).with_q_eve(0.4).with_seed(Some(3));
        let record = run_rounds(&params, &mut params.rng()).unwrap();
        assert_eq!(
            summarize(&params, &record).unwrap(),
            simulate(&params).unwrap()
        );
    }

    #[test]
    fn test_zero_q_eve_never_intercepts() {
        let params = Bb84Params::new(500).with_p_noise(0.3);
        let result = simulate(&params).unwrap();
        assert_eq!(result.n_intercepted, 0);
    }

    #[test]
    fn test_qber_value_none_when_nan() {
        let result = Bb84Result {
            qber: f64::NAN,
            n_total: 1,
            n_sifted: 0,
            n_errors: 0,
            n_intercepted: 0,
            params: Bb84Params::new(1),
        };
        assert_eq!(result.qber_value(), None);
        assert_eq!(result.sifted_fraction(), 0.0);
    }
}
