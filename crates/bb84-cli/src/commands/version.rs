//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - density-matrix QBER simulator for BB84",
        style("bb84").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  bb84-core   States, channels, measurement and the round loop");
    println!("  bb84-sweep  Parallel parameter sweeps, CSV/JSON export, rendering");
    println!("  bb84-cli    Command-line interface");
    println!();
    println!("License: {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
