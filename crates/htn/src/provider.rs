//! State providers: the readers that fill a blackboard from the simulation.
//!
//! Each provider owns a fixed set of keys. Ownership is exclusive: the
//! [`ProviderRegistry`] refuses a second provider claiming a key, so two
//! readers can never fight over the same fact.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::trace;

use crate::blackboard::Blackboard;
use crate::error::{BlackboardError, ConfigError};
use crate::key::{KeySchema, StateKey};
use crate::value::EntityId;

/// Populates blackboard keys from live simulation data.
///
/// Providers read the world (`&W`) and write only the blackboard; running one
/// twice against an unchanged world must produce the same blackboard.
pub trait StateProvider<W>: Send + Sync {
    /// Unique name, referenced by task services.
    fn name(&self) -> &'static str;

    /// Keys written by this provider.
    fn keys(&self) -> &[&'static str];

    /// Writes the current value of every owned key the provider can determine.
    ///
    /// Owned keys are unset before this is called, so a key the provider
    /// leaves alone reads as unset afterwards. Changing any other key fails
    /// the refresh with [`BlackboardError::NotOwned`] and leaves the
    /// blackboard as it was.
    fn refresh(&self, agent: EntityId, world: &W, bb: &mut Blackboard)
    -> Result<(), BlackboardError>;
}

struct Registered<W> {
    provider: Arc<dyn StateProvider<W>>,
    keys: Vec<StateKey>,
}

/// The validated set of providers used by a domain.
pub struct ProviderRegistry<W> {
    providers: Vec<Registered<W>>,
    by_name: HashMap<&'static str, usize>,
    owners: BTreeMap<StateKey, &'static str>,
}

impl<W> ProviderRegistry<W> {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            by_name: HashMap::new(),
            owners: BTreeMap::new(),
        }
    }

    /// Registers a provider.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::DuplicateProvider`] if the name is taken
    /// - [`ConfigError::DuplicateKeyOwner`] if another provider owns one of its keys
    pub fn register(&mut self, provider: Arc<dyn StateProvider<W>>) -> Result<(), ConfigError> {
        let name = provider.name();
        if self.by_name.contains_key(name) {
            return Err(ConfigError::DuplicateProvider(name.to_string()));
        }

        let keys: Vec<StateKey> = provider.keys().iter().copied().map(StateKey::from).collect();
        for key in &keys {
            if let Some(first) = self.owners.get(key) {
                return Err(ConfigError::DuplicateKeyOwner {
                    key: key.clone(),
                    first: first.to_string(),
                    second: name.to_string(),
                });
            }
        }

        for key in &keys {
            self.owners.insert(key.clone(), name);
        }
        self.by_name.insert(name, self.providers.len());
        self.providers.push(Registered { provider, keys });
        Ok(())
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(mut self, provider: impl StateProvider<W> + 'static) -> Result<Self, ConfigError> {
        self.register(Arc::new(provider))?;
        Ok(self)
    }

    /// Checks that every owned key is declared in `schema`.
    pub fn validate(&self, schema: &KeySchema) -> Result<(), ConfigError> {
        for (key, owner) in &self.owners {
            if !schema.contains(key.as_str()) {
                return Err(ConfigError::UnknownKey {
                    context: format!("provider `{owner}`"),
                    key: key.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Name of the provider owning `key`, if any.
    pub fn owner_of(&self, key: &str) -> Option<&'static str> {
        self.owners.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Refreshes every provider in registration order.
    ///
    /// Called once per planning cycle, never per search node.
    pub fn refresh_all(
        &self,
        agent: EntityId,
        world: &W,
        bb: &mut Blackboard,
    ) -> Result<(), BlackboardError> {
        for entry in &self.providers {
            Self::refresh_entry(entry, agent, world, bb)?;
        }
        Ok(())
    }

    /// Refreshes a single provider by name. Returns `false` if unknown.
    pub fn refresh_one(
        &self,
        name: &str,
        agent: EntityId,
        world: &W,
        bb: &mut Blackboard,
    ) -> Result<bool, BlackboardError> {
        match self.by_name.get(name) {
            Some(&index) => {
                Self::refresh_entry(&self.providers[index], agent, world, bb)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Unsets every provider-owned key (controller deactivation).
    pub fn reset_all(&self, bb: &mut Blackboard) {
        for key in self.owners.keys() {
            bb.clear(key.as_str());
        }
    }

    fn refresh_entry(
        entry: &Registered<W>,
        agent: EntityId,
        world: &W,
        bb: &mut Blackboard,
    ) -> Result<(), BlackboardError> {
        let mut scratch = bb.snapshot();
        for key in &entry.keys {
            scratch.clear(key.as_str());
        }
        entry.provider.refresh(agent, world, &mut scratch)?;

        let stray = bb
            .iter()
            .chain(scratch.iter())
            .map(|(key, _)| key)
            .filter(|key| !entry.keys.contains(key))
            .find(|key| bb.get(key.as_str()) != scratch.get(key.as_str()))
            .cloned();
        if let Some(key) = stray {
            return Err(BlackboardError::NotOwned {
                key,
                provider: entry.provider.name().to_string(),
            });
        }
        *bb = scratch;
        trace!(
            target: "htn::provider",
            provider = entry.provider.name(),
            agent = %agent,
            "refreshed"
        );
        Ok(())
    }
}

impl<W> Default for ProviderRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}
