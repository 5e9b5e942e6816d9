//! Print the decomposition tree of a goal.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;

use super::{DEFAULT_DOMAIN, load_domain};

/// Print the task tree under a goal
#[derive(Parser, Debug)]
pub struct Describe {
    /// Compound task to describe
    #[arg(value_name = "GOAL")]
    goal: String,

    /// Domain file (RON)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_DOMAIN)]
    domain: PathBuf,
}

impl Describe {
    pub fn execute(self) -> Result<()> {
        let (domain, _) = load_domain(&self.domain)?;
        let Some(tree) = domain.describe(&self.goal) else {
            bail!("Unknown task `{}` in {}", self.goal, self.domain.display());
        };
        print!("{tree}");
        Ok(())
    }
}
