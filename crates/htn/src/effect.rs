//! Task effects and costs.
//!
//! Effects describe the expected outcome of a primitive task. The planner
//! applies them to a scratch blackboard while searching; the executor applies
//! the same effects to the live blackboard once the task really succeeds.

use std::fmt;

use crate::blackboard::Blackboard;
use crate::condition::require_key;
use crate::error::{BlackboardError, ConfigError};
use crate::key::{KeySchema, StateKey};
use crate::value::Value;

/// A deterministic mutation of the blackboard.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Effect {
    Set(StateKey, Value),
    Clear(StateKey),
    /// Adds a delta to a numeric key (unset counts as zero).
    Add(StateKey, f64),
    /// Copies one key into another of the same kind; an unset source clears
    /// the destination.
    Copy { from: StateKey, to: StateKey },
}

impl Effect {
    /// The key this effect writes.
    pub fn target(&self) -> &StateKey {
        match self {
            Effect::Set(key, _) | Effect::Clear(key) | Effect::Add(key, _) => key,
            Effect::Copy { to, .. } => to,
        }
    }

    pub fn apply(&self, bb: &mut Blackboard) -> Result<(), BlackboardError> {
        match self {
            Effect::Set(key, value) => {
                bb.set(key.as_str(), *value)?;
            }
            Effect::Clear(key) => {
                bb.clear(key.as_str());
            }
            Effect::Add(key, delta) => {
                bb.add(key.as_str(), *delta)?;
            }
            Effect::Copy { from, to } => match bb.get(from.as_str()) {
                Some(value) => {
                    bb.set(to.as_str(), value)?;
                }
                None => {
                    bb.clear(to.as_str());
                }
            },
        }
        Ok(())
    }

    pub(crate) fn validate(&self, schema: &KeySchema, context: &str) -> Result<(), ConfigError> {
        match self {
            Effect::Set(key, value) => {
                let expected = require_key(schema, key, context)?;
                if expected != value.kind() {
                    return Err(ConfigError::KindMismatch {
                        context: context.to_string(),
                        key: key.clone(),
                        expected,
                        found: value.kind(),
                    });
                }
            }
            Effect::Clear(key) => {
                require_key(schema, key, context)?;
            }
            Effect::Add(key, _) => {
                let kind = require_key(schema, key, context)?;
                if !kind.is_numeric() {
                    return Err(ConfigError::NotNumeric {
                        context: context.to_string(),
                        key: key.clone(),
                        kind,
                    });
                }
            }
            Effect::Copy { from, to } => {
                let source = require_key(schema, from, context)?;
                let target = require_key(schema, to, context)?;
                if source != target {
                    return Err(ConfigError::KindMismatch {
                        context: context.to_string(),
                        key: to.clone(),
                        expected: target,
                        found: source,
                    });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Set(key, value) => write!(f, "{key} = {value}"),
            Effect::Clear(key) => write!(f, "clear {key}"),
            Effect::Add(key, delta) => write!(f, "{key} += {delta}"),
            Effect::Copy { from, to } => write!(f, "{to} = {from}"),
        }
    }
}

/// Applies effects in order, stopping at the first error.
pub fn apply_all(effects: &[Effect], bb: &mut Blackboard) -> Result<(), BlackboardError> {
    effects.iter().try_for_each(|e| e.apply(bb))
}

/// Cost of a primitive task, evaluated against the state it would run in.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaskCost {
    Fixed(u32),
    /// `base + per_unit * key`, where an unset or negative key counts as zero.
    Scaled {
        key: StateKey,
        base: u32,
        per_unit: f64,
    },
}

impl TaskCost {
    pub fn evaluate(&self, bb: &Blackboard) -> u32 {
        match self {
            TaskCost::Fixed(cost) => *cost,
            TaskCost::Scaled {
                key,
                base,
                per_unit,
            } => {
                let units = bb.number(key.as_str()).unwrap_or(0.0).max(0.0);
                let scaled = (units * per_unit.max(0.0)).round();
                base.saturating_add(scaled.min(f64::from(u32::MAX)) as u32)
            }
        }
    }

    pub(crate) fn validate(&self, schema: &KeySchema, context: &str) -> Result<(), ConfigError> {
        if let TaskCost::Scaled { key, .. } = self {
            let kind = require_key(schema, key, context)?;
            if !kind.is_numeric() {
                return Err(ConfigError::NotNumeric {
                    context: context.to_string(),
                    key: key.clone(),
                    kind,
                });
            }
        }
        Ok(())
    }
}

impl Default for TaskCost {
    fn default() -> Self {
        TaskCost::Fixed(1)
    }
}
