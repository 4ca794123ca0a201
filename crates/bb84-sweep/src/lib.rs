//! Parameter sweeps for the BB84 simulator.
//!
//! Runs [`bb84_core::simulate`] over a grid of channel-noise and
//! interception probabilities in parallel, then persists or renders the
//! resulting QBER table.
//!
//! # Quick start
//!
//! ```
//! use bb84_sweep::{GridAxis, SweepConfig, render_heatmap, run_sweep, to_csv};
//!
//! let config = SweepConfig {
//!     n: 500,
//!     p_noise: GridAxis::linspace(0.0, 0.1, 3),
//!     q_eve: GridAxis::Values(vec![0.0, 1.0]),
//!     ..SweepConfig::default()
//! };
//!
//! let table = run_sweep(&config).unwrap();
//! assert_eq!(table.len(), 6);
//!
//! let csv = to_csv(&table);
//! assert!(csv.starts_with("n,noise_model,seed"));
//! println!("{}", render_heatmap(&table));
//! ```
//!
//! # Modules
//!
//! - [`config`]: YAML/env configuration of the grid
//! - [`sweep`]: parallel execution and the result table
//! - [`export`]: CSV and JSON persistence
//! - [`render`]: text heatmap and series views

pub mod config;
pub mod error;
pub mod export;
pub mod render;
pub mod sweep;

pub use config::{GridAxis, SweepConfig};
pub use error::{SweepError, SweepResult};
pub use export::{
    CSV_HEADER, ExportConfig, parse_csv, read_csv, to_csv, to_json, write_csv, write_json,
};
pub use render::{QBER_THRESHOLD, render_heatmap, render_series_fixed_p, render_series_fixed_q};
pub use sweep::{SweepRow, SweepTable, run_sweep, run_sweep_with_progress};
