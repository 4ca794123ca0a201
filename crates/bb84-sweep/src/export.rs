//! Export Module: CSV and JSON persistence of sweep tables.
//!
//! CSV columns, in order:
//!
//! ```text
//! n,noise_model,seed,p_noise,q_eve,qber,n_sifted,n_errors
//! ```
//!
//! An undefined QBER is written as `NaN` and an absent seed as an empty
//! field. JSON output writes an undefined QBER as `null`.

use serde::{Deserialize, Serialize};
use std::path::Path;

use bb84_core::NoiseModel;

use crate::error::{SweepError, SweepResult};
use crate::sweep::{SweepRow, SweepTable};

/// CSV header row.
pub const CSV_HEADER: &str = "n,noise_model,seed,p_noise,q_eve,qber,n_sifted,n_errors";

const CSV_COLUMNS: usize = 8;

/// Export configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Whether to pretty-print JSON output.
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Render a table as CSV text, header included.
pub fn to_csv(table: &SweepTable) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for row in table.rows() {
        let seed = row.seed.map(|s| s.to_string()).unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            row.n,
            row.noise_model,
            seed,
            row.p_noise,
            row.q_eve,
            row.qber,
            row.n_sifted,
            row.n_errors
        ));
    }
    csv
}

/// Write a table as CSV, creating missing parent directories.
pub fn write_csv(table: &SweepTable, path: &Path) -> SweepResult<()> {
    create_parent_dirs(path)?;
    std::fs::write(path, to_csv(table))
        .map_err(|e| SweepError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

/// Parse CSV text produced by [`to_csv`].
///
/// Blank lines are skipped. Rows are re-sorted by `(p_noise, q_eve)`.
pub fn parse_csv(contents: &str) -> SweepResult<SweepTable> {
    let mut lines = contents
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty());

    match lines.next() {
        Some((_, header)) if header.trim() == CSV_HEADER => {}
        Some((i, header)) => {
            return Err(SweepError::Parse {
                line: i + 1,
                message: format!("unexpected header '{}'", header.trim()),
            });
        }
        None => {
            return Err(SweepError::Parse {
                line: 1,
                message: "missing header".to_string(),
            });
        }
    }

    let rows = lines
        .map(|(i, line)| {
            parse_row(line).map_err(|message| SweepError::Parse {
                line: i + 1,
                message,
            })
        })
        .collect::<SweepResult<Vec<_>>>()?;

    Ok(SweepTable::from_rows(rows))
}

/// Read a CSV file produced by [`write_csv`].
pub fn read_csv(path: &Path) -> SweepResult<SweepTable> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| SweepError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    parse_csv(&contents)
}

/// Export a table to a JSON string.
pub fn to_json(table: &SweepTable, config: &ExportConfig) -> SweepResult<String> {
    if config.pretty {
        serde_json::to_string_pretty(table).map_err(SweepError::from)
    } else {
        serde_json::to_string(table).map_err(SweepError::from)
    }
}

/// Export a table to a JSON file, creating missing parent directories.
pub fn write_json(table: &SweepTable, path: &Path, config: &ExportConfig) -> SweepResult<()> {
    let json = to_json(table, config)?;
    create_parent_dirs(path)?;
    std::fs::write(path, json)
        .map_err(|e| SweepError::Io(format!("Failed to write {}: {}", path.display(), e)))
}

fn create_parent_dirs(path: &Path) -> SweepResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| SweepError::Io(format!("Failed to create {}: {}", parent.display(), e))),
        _ => Ok(()),
    }
}

fn parse_row(line: &str) -> Result<SweepRow, String> {
    let fields: Vec<&str> = line.trim().split(',').map(str::trim).collect();
    if fields.len() != CSV_COLUMNS {
        return Err(format!("expected {CSV_COLUMNS} fields, found {}", fields.len()));
    }

    let noise_model: NoiseModel = fields[1].parse().map_err(|e| format!("{e}"))?;
    let seed = match fields[2] {
        "" => None,
        s => Some(parse_field("seed", s)?),
    };

    Ok(SweepRow {
        n: parse_field("n", fields[0])?,
        noise_model,
        seed,
        p_noise: parse_field("p_noise", fields[3])?,
        q_eve: parse_field("q_eve", fields[4])?,
        qber: parse_field("qber", fields[5])?,
        n_sifted: parse_field("n_sifted", fields[6])?,
        n_errors: parse_field("n_errors", fields[7])?,
    })
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| format!("{name}: invalid value '{value}': {e}"))
}
