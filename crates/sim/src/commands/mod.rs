//! Command implementations for the simulator.
//!
//! Each command is a separate module that implements its own CLI args and
//! execution logic.

mod check;
mod describe;
mod run;

pub use check::Check;
pub use describe::Describe;
pub use run::Run;

use std::path::Path;

use anyhow::Result;
use htn::{Domain, ProviderRegistry};
use htn_content::DomainLoader;

use crate::world::{GridWorld, operators, providers};

pub(crate) const DEFAULT_DOMAIN: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/guard.ron");
pub(crate) const DEFAULT_SCENARIO: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/skirmish.ron");

/// Loads a domain file and validates it against the grid world's operators
/// and providers.
pub(crate) fn load_domain(path: &Path) -> Result<(Domain<GridWorld>, ProviderRegistry<GridWorld>)> {
    let providers = providers()?;
    let domain = DomainLoader::load_domain(path, &operators()?, &providers)?;
    Ok((domain, providers))
}
