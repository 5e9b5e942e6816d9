//! Per-agent world state ("blackboard").
//!
//! The [`Blackboard`] is the planner's input and the target of task effects.
//! It has value semantics: [`Blackboard::snapshot`] returns an independent
//! copy, which is what the planner mutates while searching. Nothing a search
//! does to a snapshot can reach the live blackboard it was taken from.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::BlackboardError;
use crate::key::{KeySchema, StateKey};
use crate::value::{EntityId, Position, Value, ValueKind};

/// Typed key-value store holding an agent's beliefs.
#[derive(Clone)]
pub struct Blackboard {
    schema: Arc<KeySchema>,
    values: BTreeMap<StateKey, Value>,
}

impl Blackboard {
    /// Creates an empty blackboard: every declared key starts unset.
    pub fn new(schema: Arc<KeySchema>) -> Self {
        Self {
            schema,
            values: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    /// Reads a key. Unset and undeclared keys both read as `None`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).copied()
    }

    pub fn is_set(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Writes a key, returning the previous value.
    ///
    /// # Errors
    ///
    /// - [`BlackboardError::UndeclaredKey`] if the schema does not know `key`
    /// - [`BlackboardError::TypeMismatch`] if `value` is not of the key's kind
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<Option<Value>, BlackboardError> {
        let value = value.into();
        let (key, kind) = self
            .schema
            .resolve(key)
            .ok_or_else(|| BlackboardError::UndeclaredKey(StateKey::from(key)))?;

        if value.kind() != kind {
            return Err(BlackboardError::TypeMismatch {
                key: key.clone(),
                expected: kind,
                found: value.kind(),
            });
        }

        Ok(self.values.insert(key.clone(), value))
    }

    /// Returns a key to "unset", yielding whatever it held.
    pub fn clear(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Adds `delta` to a numeric key. An unset key counts as zero.
    ///
    /// Integer keys round the delta toward zero.
    pub fn add(&mut self, key: &str, delta: f64) -> Result<Value, BlackboardError> {
        let (interned, kind) = self
            .schema
            .resolve(key)
            .ok_or_else(|| BlackboardError::UndeclaredKey(StateKey::from(key)))?;

        let next = match (kind, self.values.get(key)) {
            (ValueKind::Int, Some(Value::Int(v))) => Value::Int(v.saturating_add(delta as i64)),
            (ValueKind::Int, _) => Value::Int(delta as i64),
            (ValueKind::Float, Some(Value::Float(v))) => Value::Float(v + delta as f32),
            (ValueKind::Float, _) => Value::Float(delta as f32),
            (kind, _) => {
                return Err(BlackboardError::NotNumeric {
                    key: interned.clone(),
                    kind,
                });
            }
        };

        self.values.insert(interned.clone(), next);
        Ok(next)
    }

    /// Produces an independent copy for speculative mutation.
    ///
    /// The copy shares only the immutable schema with `self`.
    pub fn snapshot(&self) -> Blackboard {
        self.clone()
    }

    /// Unsets every key.
    pub fn reset(&mut self) {
        self.values.clear();
    }

    /// Iterates over the keys that are currently set, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&StateKey, &Value)> + '_ {
        self.values.iter()
    }

    /// Number of keys currently set.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    pub fn entity(&self, key: &str) -> Option<EntityId> {
        self.get(key).and_then(|v| v.as_entity())
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_int())
    }

    pub fn float(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(|v| v.as_float())
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_flag())
    }

    pub fn coord(&self, key: &str) -> Option<Position> {
        self.get(key).and_then(|v| v.as_coord())
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }
}

/// Two blackboards are equal when they hold the same facts.
impl PartialEq for Blackboard {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl fmt::Debug for Blackboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<KeySchema> {
        let schema = KeySchema::new()
            .with("target", ValueKind::Entity)
            .and_then(|s| s.with("hp", ValueKind::Int))
            .and_then(|s| s.with("speed", ValueKind::Float))
            .and_then(|s| s.with("armed", ValueKind::Flag))
            .and_then(|s| s.with("home", ValueKind::Coord))
            .unwrap();
        Arc::new(schema)
    }

    #[test]
    fn unset_is_distinct_from_zero_values() {
        let mut bb = Blackboard::new(schema());
        assert_eq!(bb.get("target"), None);
        assert_eq!(bb.entity("target"), None);

        bb.set("target", EntityId(0)).unwrap();
        assert_eq!(bb.get("target"), Some(Value::Entity(EntityId(0))));

        bb.set("armed", false).unwrap();
        assert_eq!(bb.flag("armed"), Some(false));
        assert!(bb.is_set("armed"));
        assert!(!bb.is_set("hp"));
    }

    #[test]
    fn set_rejects_wrong_kind() {
        let mut bb = Blackboard::new(schema());
        let err = bb.set("hp", true).unwrap_err();
        assert_eq!(
            err,
            BlackboardError::TypeMismatch {
                key: StateKey::from("hp"),
                expected: ValueKind::Int,
                found: ValueKind::Flag,
            }
        );
        assert!(!bb.is_set("hp"));
    }

    #[test]
    fn set_rejects_undeclared_key() {
        let mut bb = Blackboard::new(schema());
        assert!(matches!(
            bb.set("mood", 3i64),
            Err(BlackboardError::UndeclaredKey(_))
        ));
        assert_eq!(bb.get("mood"), None);
    }

    #[test]
    fn clear_returns_key_to_unset() {
        let mut bb = Blackboard::new(schema());
        bb.set("home", Position::new(2, 3)).unwrap();
        assert_eq!(bb.clear("home"), Some(Value::Coord(Position::new(2, 3))));
        assert_eq!(bb.coord("home"), None);
        assert_eq!(bb.clear("home"), None);
    }

    #[test]
    fn snapshot_does_not_alias() {
        let mut live = Blackboard::new(schema());
        live.set("hp", 10i64).unwrap();

        let mut scratch = live.snapshot();
        scratch.set("hp", 1i64).unwrap();
        scratch.set("armed", true).unwrap();
        scratch.clear("hp");

        assert_eq!(live.int("hp"), Some(10));
        assert_eq!(live.flag("armed"), None);
        assert_ne!(live, scratch);
    }

    #[test]
    fn add_treats_unset_as_zero() {
        let mut bb = Blackboard::new(schema());
        assert_eq!(bb.add("hp", 5.0).unwrap(), Value::Int(5));
        assert_eq!(bb.add("hp", -2.0).unwrap(), Value::Int(3));
        assert_eq!(bb.add("speed", 0.5).unwrap(), Value::Float(0.5));
        assert!(matches!(
            bb.add("armed", 1.0),
            Err(BlackboardError::NotNumeric { .. })
        ));
    }
}
