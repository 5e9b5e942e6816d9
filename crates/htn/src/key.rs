//! Blackboard key identifiers and the key schema.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConfigError;
use crate::value::ValueKind;

/// Identifier of a blackboard key.
///
/// Keys are open-ended strings so new facts can be introduced from data
/// without touching the planner. Cloning is a reference count bump.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey(Arc<str>);

impl StateKey {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StateKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for StateKey {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl AsRef<str> for StateKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for StateKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for StateKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for StateKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = <String as serde::Deserialize>::deserialize(deserializer)?;
        Ok(Self::from(name))
    }
}

/// Canonical kind of every key a domain knows about.
///
/// Built once at startup and shared read-only by every blackboard of the
/// domain, so a key can never change type between agents or over time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeySchema {
    kinds: BTreeMap<StateKey, ValueKind>,
}

impl KeySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a key with its canonical kind.
    ///
    /// Declaring the same key twice is a configuration error, even with the
    /// same kind, so that two data files cannot silently share a fact.
    pub fn declare(&mut self, key: impl Into<StateKey>, kind: ValueKind) -> Result<(), ConfigError> {
        let key = key.into();
        if let Some(existing) = self.kinds.get(&key) {
            return Err(if *existing == kind {
                ConfigError::DuplicateKey(key)
            } else {
                ConfigError::ConflictingKeyKind {
                    key,
                    first: *existing,
                    second: kind,
                }
            });
        }
        self.kinds.insert(key, kind);
        Ok(())
    }

    /// Builder-style variant of [`declare`](Self::declare).
    pub fn with(mut self, key: impl Into<StateKey>, kind: ValueKind) -> Result<Self, ConfigError> {
        self.declare(key, kind)?;
        Ok(self)
    }

    pub fn kind_of(&self, key: &str) -> Option<ValueKind> {
        self.kinds.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.kinds.contains_key(key)
    }

    /// Looks up the interned key and its kind by name.
    pub fn resolve(&self, key: &str) -> Option<(&StateKey, ValueKind)> {
        self.kinds.get_key_value(key).map(|(k, v)| (k, *v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, ValueKind)> + '_ {
        self.kinds.iter().map(|(k, v)| (k, *v))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
