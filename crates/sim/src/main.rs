//! Grid-world driver for the HTN planning core.
//!
//! Loads a domain, places guards and raiders from a scenario file and lets
//! their NPC controllers fight it out. Run with: `cargo run -p htn-sim -- run`

mod commands;
mod output;
mod simulation;
mod world;

use anyhow::Result;
use clap::Parser;
use commands::{Check, Describe, Run};

/// HTN NPC simulator
#[derive(Parser)]
#[command(name = "htn-sim")]
#[command(about = "Plan and run NPC behaviour on a grid", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Run a scenario and print planner and executor events
    Run(Run),

    /// Print the decomposition tree under a goal
    Describe(Describe),

    /// Validate content files
    Check(Check),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(cmd) => cmd.execute(),
        Command::Describe(cmd) => cmd.execute(),
        Command::Check(cmd) => cmd.execute(),
    }
}
