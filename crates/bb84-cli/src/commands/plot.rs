//! Plot command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use bb84_sweep::{read_csv, render_heatmap, render_series_fixed_p, render_series_fixed_q};

/// Execute the plot command.
pub fn execute(input: &Path, fixed_p: Option<f64>, fixed_q: Option<f64>) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("File not found: {}", input.display());
    }

    let table = read_csv(input)?;
    if table.is_empty() {
        anyhow::bail!("{} contains no sweep rows", input.display());
    }

    println!(
        "{} {} ({} rows)\n",
        style("→").cyan().bold(),
        style(input.display()).green(),
        table.len()
    );

    let rendered = match (fixed_p, fixed_q) {
        (Some(p), _) => render_series_fixed_p(&table, p),
        (None, Some(q)) => render_series_fixed_q(&table, q),
        (None, None) => render_heatmap(&table),
    };
    print!("{rendered}");

    Ok(())
}
