//! Sweep command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use bb84_core::NoiseModel;
use bb84_sweep::{
    ExportConfig, SweepConfig, render_heatmap, run_sweep_with_progress, write_csv, write_json,
};

/// Command-line overrides, applied on top of file and environment config.
#[derive(Debug, Default)]
pub struct Overrides {
    /// Rounds per grid point (`--n`).
    pub n: Option<usize>,
    /// Seed shared by every grid point (`--seed`).
    pub seed: Option<u64>,
    /// Noise model identifier (`--noise-model`), parsed on apply.
    pub noise_model: Option<String>,
    /// Worker threads (`--workers`).
    pub workers: Option<usize>,
}

impl Overrides {
    /// Apply the flags, then validate the merged configuration once.
    fn apply(&self, mut config: SweepConfig) -> Result<SweepConfig> {
        if let Some(n) = self.n {
            config.n = n;
        }
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(model) = &self.noise_model {
            config.noise_model = model.parse::<NoiseModel>()?;
        }
        if let Some(workers) = self.workers {
            config.workers = Some(workers);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Execute the sweep command.
pub fn execute(
    config_file: Option<&Path>,
    overrides: &Overrides,
    output: Option<&Path>,
    json: Option<&Path>,
) -> Result<()> {
    let config = SweepConfig::load_unvalidated(config_file)
        .context("Failed to load sweep configuration")?;
    let config = overrides.apply(config)?;

    let total = config.p_noise.len() * config.q_eve.len();
    println!(
        "{} Sweeping {} grid points ({} x {}), {} rounds each, {}",
        style("→").cyan().bold(),
        style(total).green(),
        config.p_noise.len(),
        config.q_eve.len(),
        config.n,
        style(config.noise_model).yellow()
    );

    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} points ({eta})")?
            .progress_chars("=> "),
    );

    let table = run_sweep_with_progress(&config, |done, _| progress.set_position(done as u64))?;
    progress.finish_and_clear();

    println!(
        "{} Finished {} grid points\n",
        style("✓").green().bold(),
        table.len()
    );
    print!("{}", render_heatmap(&table));

    if let Some(path) = output {
        write_csv(&table, path)?;
        println!(
            "\n{} CSV written to {}",
            style("✓").green().bold(),
            style(path.display()).cyan()
        );
    }

    if let Some(path) = json {
        write_json(&table, path, &ExportConfig::default())?;
        println!(
            "{} JSON written to {}",
            style("✓").green().bold(),
            style(path.display()).cyan()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config_values() {
        let overrides = Overrides {
            n: Some(10),
            seed: Some(4),
            noise_model: Some("bitflip".to_string()),
            workers: Some(3),
        };
        let config = overrides.apply(SweepConfig::default()).unwrap();
        assert_eq!(config.n, 10);
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.noise_model, NoiseModel::BitFlip);
        assert_eq!(config.workers, Some(3));
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let config = Overrides::default()
            .apply(SweepConfig::default())
            .unwrap();
        assert_eq!(config, SweepConfig::default());
    }

    #[test]
    fn test_flags_fix_invalid_file_values() {
        let file = SweepConfig::from_yaml("n: 0\nworkers: 0\n").unwrap();
        let overrides = Overrides {
            n: Some(25),
            workers: Some(1),
            ..Overrides::default()
        };
        let config = overrides.apply(file).unwrap();
        assert_eq!(config.n, 25);
        assert_eq!(config.workers, Some(1));
    }

    #[test]
    fn test_overrides_are_validated() {
        let overrides = Overrides {
            workers: Some(0),
            ..Overrides::default()
        };
        assert!(overrides.apply(SweepConfig::default()).is_err());

        let overrides = Overrides {
            noise_model: Some("amplitude".to_string()),
            ..Overrides::default()
        };
        assert!(overrides.apply(SweepConfig::default()).is_err());
    }
}
