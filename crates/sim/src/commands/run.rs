//! Run a scenario and print what the NPCs do.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use htn_content::ConfigLoader;
use npc_runtime::RuntimeConfig;
use tracing::info;

use super::{DEFAULT_DOMAIN, DEFAULT_SCENARIO, load_domain};
use crate::output::OutputFormat;
use crate::simulation::Simulation;
use crate::world::Scenario;

/// Run a scenario tick by tick
#[derive(Parser, Debug)]
pub struct Run {
    /// Domain file (RON)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_DOMAIN)]
    domain: PathBuf,

    /// Scenario file (RON)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_SCENARIO)]
    scenario: PathBuf,

    /// Runtime configuration (TOML); defaults apply when omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of ticks to simulate
    #[arg(short, long, default_value_t = 40)]
    ticks: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

impl Run {
    pub fn execute(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => ConfigLoader::load(path)?,
            None => RuntimeConfig::default(),
        };
        let (domain, providers) = load_domain(&self.domain)?;
        let scenario = Scenario::load(&self.scenario)?;
        let mut sim = Simulation::new(Arc::new(domain), Arc::new(providers), config, &scenario)?;

        info!(
            target: "htn_sim",
            agents = sim.npcs().len(),
            ticks = self.ticks,
            "simulation started"
        );

        while sim.tick() < self.ticks && !sim.is_settled() {
            let report = sim.step()?;
            for line in self.format.render(&report) {
                println!("{line}");
            }
        }

        if self.format == OutputFormat::Text {
            println!();
            println!("after {} ticks:", sim.tick());
            for (id, actor) in &sim.world().actors {
                println!(
                    "  {id} {} at {} hp {}{}",
                    actor.faction,
                    actor.position,
                    actor.hp,
                    if actor.armed { " (armed)" } else { "" }
                );
            }
        }
        Ok(())
    }
}
