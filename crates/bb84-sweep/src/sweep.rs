//! Parallel parameter sweep over the `(p_noise, q_eve)` grid.
//!
//! Every grid point is an independent call to [`bb84_core::simulate`] with
//! its own seeded random source, so points can run on any worker in any
//! order. Rows are sorted before they are returned, which makes the table
//! independent of scheduling and of the worker count.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bb84_core::{Bb84Result, NoiseModel, simulate};

use crate::config::SweepConfig;
use crate::error::{SweepError, SweepResult};

/// One row of the sweep table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    /// Rounds simulated.
    pub n: usize,
    /// Channel noise model.
    pub noise_model: NoiseModel,
    /// Seed used for this point.
    pub seed: Option<u64>,
    /// Channel noise probability.
    pub p_noise: f64,
    /// Interception probability.
    pub q_eve: f64,
    /// Sifted QBER (`NaN` when nothing survived sifting).
    pub qber: f64,
    /// Sifted rounds.
    pub n_sifted: usize,
    /// Sifted rounds in error.
    pub n_errors: usize,
}

impl From<&Bb84Result> for SweepRow {
    fn from(result: &Bb84Result) -> Self {
        Self {
            n: result.n_total,
            noise_model: result.params.noise_model,
            seed: result.params.seed,
            p_noise: result.params.p_noise,
            q_eve: result.params.q_eve,
            qber: result.qber,
            n_sifted: result.n_sifted,
            n_errors: result.n_errors,
        }
    }
}

/// Sweep results, sorted by `(p_noise, q_eve)` ascending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SweepTable {
    rows: Vec<SweepRow>,
}

impl SweepTable {
    /// Build a table from rows in any order.
    pub fn from_rows(mut rows: Vec<SweepRow>) -> Self {
        rows.sort_by(|a, b| {
            a.p_noise
                .total_cmp(&b.p_noise)
                .then(a.q_eve.total_cmp(&b.q_eve))
        });
        Self { rows }
    }

    /// All rows.
    pub fn rows(&self) -> &[SweepRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Noise model of the sweep (taken from the first row).
    pub fn noise_model(&self) -> Option<NoiseModel> {
        self.rows.first().map(|r| r.noise_model)
    }

    /// Distinct `p_noise` values, ascending.
    pub fn p_noise_values(&self) -> Vec<f64> {
        distinct(self.rows.iter().map(|r| r.p_noise))
    }

    /// Distinct `q_eve` values, ascending.
    pub fn q_eve_values(&self) -> Vec<f64> {
        distinct(self.rows.iter().map(|r| r.q_eve))
    }

    /// Row at exactly `(p_noise, q_eve)`.
    pub fn get(&self, p_noise: f64, q_eve: f64) -> Option<&SweepRow> {
        self.rows
            .iter()
            .find(|r| r.p_noise == p_noise && r.q_eve == q_eve)
    }

    /// Rows with `p_noise` equal to the grid value nearest `p_noise`,
    /// ordered by `q_eve`. Returns the selected value with the rows.
    pub fn slice_at_p(&self, p_noise: f64) -> Option<(f64, Vec<&SweepRow>)> {
        let selected = nearest(&self.p_noise_values(), p_noise)?;
        let rows = self.rows.iter().filter(|r| r.p_noise == selected).collect();
        Some((selected, rows))
    }

    /// Rows with `q_eve` equal to the grid value nearest `q_eve`,
    /// ordered by `p_noise`. Returns the selected value with the rows.
    pub fn slice_at_q(&self, q_eve: f64) -> Option<(f64, Vec<&SweepRow>)> {
        let selected = nearest(&self.q_eve_values(), q_eve)?;
        let rows = self.rows.iter().filter(|r| r.q_eve == selected).collect();
        Some((selected, rows))
    }
}

fn distinct(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(f64::total_cmp);
    v.dedup();
    v
}

fn nearest(values: &[f64], target: f64) -> Option<f64> {
    values
        .iter()
        .copied()
        .min_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()))
}

/// Run the sweep described by `config`.
pub fn run_sweep(config: &SweepConfig) -> SweepResult<SweepTable> {
    run_sweep_with_progress(config, |_, _| {})
}

/// Run the sweep, calling `progress(done, total)` after each grid point.
///
/// `progress` is called from worker threads, in completion order.
pub fn run_sweep_with_progress<F>(config: &SweepConfig, progress: F) -> SweepResult<SweepTable>
where
    F: Fn(usize, usize) + Sync,
{
    config.validate()?;

    let points = config.points();
    let total = points.len();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.unwrap_or(0))
        .build()
        .map_err(|e| SweepError::ThreadPool(e.to_string()))?;

    info!(
        points = total,
        n = config.n,
        noise_model = %config.noise_model,
        workers = pool.current_num_threads(),
        "starting sweep"
    );

    let done = AtomicUsize::new(0);
    let log_every = (total / 20).max(1);

    let rows = pool.install(|| {
        points
            .par_iter()
            .map(|&(p_noise, q_eve)| {
                let result = simulate(&config.params_at(p_noise, q_eve))?;
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                debug!(p_noise, q_eve, qber = result.qber, "grid point finished");
                if finished % log_every == 0 || finished == total {
                    info!(done = finished, total, "sweep progress");
                }
                progress(finished, total);
                Ok(SweepRow::from(&result))
            })
            .collect::<SweepResult<Vec<_>>>()
    })?;

    Ok(SweepTable::from_rows(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(p_noise: f64, q_eve: f64, qber: f64) -> SweepRow {
        SweepRow {
            n: 10,
            noise_model: NoiseModel::Depolarizing,
            seed: Some(1),
            p_noise,
            q_eve,
            qber,
            n_sifted: 5,
            n_errors: 0,
        }
    }

    #[test]
    fn test_from_rows_sorts() {
        let table = SweepTable::from_rows(vec![
            row(0.1, 0.5, 0.0),
            row(0.0, 1.0, 0.0),
            row(0.1, 0.0, 0.0),
            row(0.0, 0.0, 0.0),
        ]);
        let keys: Vec<(f64, f64)> = table.rows().iter().map(|r| (r.p_noise, r.q_eve)).collect();
        assert_eq!(keys, vec![(0.0, 0.0), (0.0, 1.0), (0.1, 0.0), (0.1, 0.5)]);
        assert_eq!(table.p_noise_values(), vec![0.0, 0.1]);
        assert_eq!(table.q_eve_values(), vec![0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_slice_picks_nearest_value() {
        let table = SweepTable::from_rows(vec![
            row(0.0, 0.0, 0.0),
            row(0.0, 1.0, 0.25),
            row(0.2, 0.0, 0.1),
            row(0.2, 1.0, 0.3),
        ]);
        let (p, rows) = table.slice_at_p(0.17).unwrap();
        assert_eq!(p, 0.2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].qber, 0.3);

        let (q, rows) = table.slice_at_q(0.4).unwrap();
        assert_eq!(q, 0.0);
        assert_eq!(rows.iter().map(|r| r.p_noise).collect::<Vec<_>>(), vec![0.0, 0.2]);
    }

    #[test]
    fn test_empty_table_has_no_slices() {
        let table = SweepTable::default();
        assert!(table.slice_at_p(0.0).is_none());
        assert!(table.noise_model().is_none());
    }
}
