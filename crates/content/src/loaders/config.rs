//! Runtime configuration loader.

use std::path::Path;

use npc_runtime::RuntimeConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for runtime configuration from TOML files.
///
/// Every field is optional; missing ones take their defaults.
///
/// ```toml
/// max_updates_per_tick = 32
///
/// [planner]
/// max_depth = 16
/// max_methods = 512
/// max_plan_cost = 40
///
/// [executor]
/// replan_interval = 5
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    pub fn load(path: &Path) -> LoadResult<RuntimeConfig> {
        let content = read_file(path)?;
        Self::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))
    }

    /// Parse config data from a TOML string.
    pub fn from_str(content: &str) -> LoadResult<RuntimeConfig> {
        let config: RuntimeConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}
