//! Validate content files without running them.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;
use htn_content::ConfigLoader;

use super::{DEFAULT_DOMAIN, load_domain};
use crate::world::Scenario;

/// Validate a domain (and optionally a scenario and config)
#[derive(Parser, Debug)]
pub struct Check {
    /// Domain file (RON)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_DOMAIN)]
    domain: PathBuf,

    /// Scenario file (RON) whose goals must exist in the domain
    #[arg(short, long, value_name = "FILE")]
    scenario: Option<PathBuf>,

    /// Runtime configuration (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Check {
    pub fn execute(self) -> Result<()> {
        let (domain, providers) = load_domain(&self.domain)?;
        let goals: Vec<&str> = domain
            .task_ids()
            .filter(|id| domain.compound(id.as_str()).is_some())
            .map(|id| id.as_str())
            .collect();
        println!(
            "{}: {} tasks, {} providers, goals: {}",
            self.domain.display(),
            domain.len(),
            providers.len(),
            goals.join(", ")
        );

        if let Some(path) = &self.scenario {
            let scenario = Scenario::load(path)?;
            scenario.into_world()?;
            for (agent, goal) in scenario.goals() {
                if domain.compound(goal).is_none() {
                    bail!("{}: agent {agent} has unknown goal `{goal}`", path.display());
                }
            }
            println!("{}: {} agents", path.display(), scenario.goals().len());
        }

        if let Some(path) = &self.config {
            let config = ConfigLoader::load(path)?;
            println!(
                "{}: {} updates per tick, depth {}, {} methods",
                path.display(),
                config.max_updates_per_tick,
                config.planner.max_depth,
                config.planner.max_methods
            );
        }
        Ok(())
    }
}
