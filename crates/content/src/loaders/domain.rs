//! Domain definition loader.
//!
//! Loads a [`DomainSpec`] from RON. Parsing only checks the shape of the
//! data; [`DomainLoader::load_domain`] also validates it against the
//! collaborator's operators and providers.

use std::path::Path;

use htn::{Domain, OperatorRegistry, ProviderRegistry};

use crate::loaders::{LoadResult, read_file};
use crate::spec::DomainSpec;

/// Loader for HTN domains from RON files.
pub struct DomainLoader;

impl DomainLoader {
    /// Load a domain definition from a RON file.
    pub fn load(path: &Path) -> LoadResult<DomainSpec> {
        let content = read_file(path)?;
        Self::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Invalid domain {}: {}", path.display(), e))
    }

    /// Parse a domain definition from a RON string.
    pub fn from_str(content: &str) -> LoadResult<DomainSpec> {
        let spec: DomainSpec = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse domain RON: {}", e))?;

        Ok(spec)
    }

    /// Load a domain definition and build it.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed, or if the definitions
    /// do not form a valid domain (see [`htn::ConfigError`]).
    pub fn load_domain<W>(
        path: &Path,
        operators: &OperatorRegistry<W>,
        providers: &ProviderRegistry<W>,
    ) -> LoadResult<Domain<W>> {
        let spec = Self::load(path)?;
        spec.build(operators, providers)
            .map_err(|e| anyhow::anyhow!("Invalid domain {}: {}", path.display(), e))
    }
}
