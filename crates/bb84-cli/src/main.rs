//! BB84 Command-Line Interface
//!
//! Runs single BB84 simulations, parameter sweeps over channel noise and
//! eavesdropping probability, and renders saved sweep tables.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{plot, run, sweep, version};

/// BB84 - density-matrix QBER simulator for quantum key distribution
#[derive(Parser)]
#[command(name = "bb84")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one BB84 run and report its QBER
    Run {
        /// Number of rounds
        #[arg(short, long, default_value = "50000")]
        n: usize,

        /// Channel noise probability
        #[arg(short, long, default_value = "0.0")]
        p_noise: f64,

        /// Probability that Eve intercepts a round
        #[arg(short, long, default_value = "0.0")]
        q_eve: f64,

        /// Channel noise model (bitflip, depolarizing)
        #[arg(short = 'm', long, default_value = "depolarizing")]
        noise_model: String,

        /// Random seed
        #[arg(short, long, default_value = "0", conflicts_with = "unseeded")]
        seed: u64,

        /// Seed from system entropy instead of --seed
        #[arg(long)]
        unseeded: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sweep the (p_noise, q_eve) grid
    Sweep {
        /// YAML sweep configuration
        #[arg(short, long, env = "BB84_CONFIG")]
        config: Option<PathBuf>,

        /// Rounds per grid point
        #[arg(short, long)]
        n: Option<usize>,

        /// Seed shared by every grid point
        #[arg(short, long)]
        seed: Option<u64>,

        /// Channel noise model (bitflip, depolarizing)
        #[arg(short = 'm', long)]
        noise_model: Option<String>,

        /// Worker threads (defaults to all cores)
        #[arg(short, long)]
        workers: Option<usize>,

        /// CSV output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON output file
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Render a saved sweep table
    Plot {
        /// CSV file written by `bb84 sweep`
        #[arg(short, long)]
        input: PathBuf,

        /// Show QBER vs q_eve at the nearest p_noise
        #[arg(long, conflicts_with = "fixed_q")]
        fixed_p: Option<f64>,

        /// Show QBER vs p_noise at the nearest q_eve
        #[arg(long)]
        fixed_q: Option<f64>,
    },

    /// Show version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Run { .. } => "run",
            Commands::Sweep { .. } => "sweep",
            Commands::Plot { .. } => "plot",
            Commands::Version => "version",
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!(command = cli.command.name(), verbosity = cli.verbose, "dispatching command");

    // Execute command
    let result = match cli.command {
        Commands::Run {
            n,
            p_noise,
            q_eve,
            noise_model,
            seed,
            unseeded,
            json,
        } => run::execute(
            n,
            p_noise,
            q_eve,
            &noise_model,
            (!unseeded).then_some(seed),
            json,
        ),

        Commands::Sweep {
            config,
            n,
            seed,
            noise_model,
            workers,
            output,
            json,
        } => sweep::execute(
            config.as_deref(),
            &sweep::Overrides {
                n,
                seed,
                noise_model,
                workers,
            },
            output.as_deref(),
            json.as_deref(),
        ),

        Commands::Plot {
            input,
            fixed_p,
            fixed_q,
        } => plot::execute(&input, fixed_p, fixed_q),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
