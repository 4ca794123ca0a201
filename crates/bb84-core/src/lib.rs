//! Density-matrix simulation of the BB84 QKD protocol.
//!
//! Estimates the quantum bit error rate (QBER) of BB84 under channel noise
//! and an optional intercept-resend eavesdropper. Every round is simulated
//! at the level of a single-qubit density matrix:
//!
//! - **State model**: the four BB84 states and their projectors
//! - **Channels**: bit-flip and depolarizing noise
//! - **Measurement**: Born-rule sampling in either basis
//! - **Eavesdropper**: intercept-resend in a random basis
//! - **Driver**: N sequential rounds under one seeded random source
//! - **Sifting**: basis reconciliation, QBER and error counts
//!
//! The simulation stops at the raw QBER on sifted bits; error correction and
//! privacy amplification are not modelled.
//!
//! # Quick start
//!
//! ```rust
//! use bb84_core::{Bb84Params, NoiseModel, simulate};
//!
//! let params = Bb84Params::new(2_000)
//!     .with_p_noise(0.0)
//!     .with_q_eve(0.0)
//!     .with_noise_model(NoiseModel::Depolarizing)
//!     .with_seed(Some(7));
//!
//! let result = simulate(&params).unwrap();
//! assert_eq!(result.n_total, 2_000);
//! assert_eq!(result.n_errors, 0);
//! assert_eq!(result.params, params);
//! ```

pub mod channel;
pub mod error;
pub mod eve;
pub mod measurement;
pub mod protocol;
pub mod sifting;
pub mod state;

pub use channel::NoiseModel;
pub use error::{Bb84Error, QkdResult};
pub use protocol::{
    Bb84Params, Bb84Result, RoundRecord, run_rounds, simulate, simulate_with_rng, summarize,
};
pub use sifting::{BasisQber, count_errors, qber, qber_by_basis, sift};
pub use state::{Basis, DensityMatrix};
