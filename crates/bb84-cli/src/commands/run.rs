//! Run command implementation.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use bb84_core::{Basis, Bb84Params, NoiseModel, run_rounds, summarize};
use bb84_sweep::QBER_THRESHOLD;

/// Execute the run command.
pub fn execute(
    n: usize,
    p_noise: f64,
    q_eve: f64,
    noise_model: &str,
    seed: Option<u64>,
    json: bool,
) -> Result<()> {
    let noise_model: NoiseModel = noise_model.parse()?;
    let params = Bb84Params::new(n)
        .with_p_noise(p_noise)
        .with_q_eve(q_eve)
        .with_noise_model(noise_model)
        .with_seed(seed);
    params.validate()?;

    if !json {
        println!(
            "{} Simulating {} rounds ({}, p_noise = {}, q_eve = {})",
            style("→").cyan().bold(),
            style(n).green(),
            style(noise_model).yellow(),
            p_noise,
            q_eve
        );
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Running rounds...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let record = run_rounds(&params, &mut params.rng())?;
    let result = summarize(&params, &record)?;
    let by_basis = record.qber_by_basis()?;
    spinner.finish_and_clear();

    if json {
        let out = serde_json::to_string_pretty(&result).context("Failed to serialize result")?;
        println!("{out}");
        return Ok(());
    }

    println!("\n{} Result:", style("✓").green().bold());
    match result.qber_value() {
        Some(qber) if qber >= QBER_THRESHOLD => println!(
            "  QBER:        {} (at or above the {QBER_THRESHOLD} threshold)",
            style(format!("{qber:.4}")).red().bold()
        ),
        Some(qber) => println!("  QBER:        {}", style(format!("{qber:.4}")).green()),
        None => println!("  QBER:        {}", style("undefined (nothing sifted)").dim()),
    }
    for basis in Basis::ALL {
        let value = by_basis.get(basis);
        if !value.is_nan() {
            println!("    basis {basis}:   {value:.4}");
        }
    }
    println!(
        "  Sifted:      {} / {} ({:.1}%)",
        result.n_sifted,
        result.n_total,
        result.sifted_fraction() * 100.0
    );
    println!("  Errors:      {}", result.n_errors);
    println!("  Intercepted: {}", result.n_intercepted);
    match result.params.seed {
        Some(seed) => println!("  Seed:        {seed}"),
        None => println!("  Seed:        {}", style("entropy").dim()),
    }

    Ok(())
}
