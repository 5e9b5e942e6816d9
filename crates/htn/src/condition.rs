//! Preconditions over the blackboard.
//!
//! Conditions are plain data so they can be loaded from content files and
//! validated against the key schema before any agent plans with them.
//! Evaluation is pure: it never mutates the blackboard.

use std::fmt;

use crate::blackboard::Blackboard;
use crate::error::ConfigError;
use crate::key::{KeySchema, StateKey};
use crate::value::Value;

/// Ordering operator for numeric comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Comparison {
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    Le,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    Ge,
}

impl Comparison {
    pub fn test(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Lt => lhs < rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }
}

/// A predicate over the blackboard.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Condition {
    /// Always holds. Useful as a catch-all method guard.
    Always,
    IsSet(StateKey),
    IsUnset(StateKey),
    /// Holds when the key is set and equal to the value.
    Equals(StateKey, Value),
    /// Holds when the key is unset or differs from the value.
    NotEquals(StateKey, Value),
    /// Numeric comparison; an unset key never satisfies it.
    Compare {
        key: StateKey,
        op: Comparison,
        value: f64,
    },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Evaluates the condition against `bb`.
    pub fn holds(&self, bb: &Blackboard) -> bool {
        match self {
            Condition::Always => true,
            Condition::IsSet(key) => bb.is_set(key.as_str()),
            Condition::IsUnset(key) => !bb.is_set(key.as_str()),
            Condition::Equals(key, value) => bb.get(key.as_str()).as_ref() == Some(value),
            Condition::NotEquals(key, value) => bb.get(key.as_str()).as_ref() != Some(value),
            Condition::Compare { key, op, value } => bb
                .number(key.as_str())
                .is_some_and(|lhs| op.test(lhs, *value)),
            Condition::All(conditions) => conditions.iter().all(|c| c.holds(bb)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.holds(bb)),
            Condition::Not(inner) => !inner.holds(bb),
        }
    }

    /// Checks every key the condition touches against the schema.
    pub(crate) fn validate(&self, schema: &KeySchema, context: &str) -> Result<(), ConfigError> {
        match self {
            Condition::Always => Ok(()),
            Condition::IsSet(key) | Condition::IsUnset(key) => {
                require_key(schema, key, context).map(|_| ())
            }
            Condition::Equals(key, value) | Condition::NotEquals(key, value) => {
                let expected = require_key(schema, key, context)?;
                if value.kind() != expected {
                    return Err(ConfigError::KindMismatch {
                        context: context.to_string(),
                        key: key.clone(),
                        expected,
                        found: value.kind(),
                    });
                }
                Ok(())
            }
            Condition::Compare { key, .. } => {
                let kind = require_key(schema, key, context)?;
                if !kind.is_numeric() {
                    return Err(ConfigError::NotNumeric {
                        context: context.to_string(),
                        key: key.clone(),
                        kind,
                    });
                }
                Ok(())
            }
            Condition::All(conditions) | Condition::Any(conditions) => conditions
                .iter()
                .try_for_each(|c| c.validate(schema, context)),
            Condition::Not(inner) => inner.validate(schema, context),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => write!(f, "always"),
            Condition::IsSet(key) => write!(f, "{key} is set"),
            Condition::IsUnset(key) => write!(f, "{key} is unset"),
            Condition::Equals(key, value) => write!(f, "{key} == {value}"),
            Condition::NotEquals(key, value) => write!(f, "{key} != {value}"),
            Condition::Compare { key, op, value } => write!(f, "{key} {op} {value}"),
            Condition::All(conditions) => write_joined(f, conditions, " and "),
            Condition::Any(conditions) => write_joined(f, conditions, " or "),
            Condition::Not(inner) => write!(f, "not ({inner})"),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
    write!(f, "(")?;
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{condition}")?;
    }
    write!(f, ")")
}

pub(crate) fn require_key(
    schema: &KeySchema,
    key: &StateKey,
    context: &str,
) -> Result<crate::value::ValueKind, ConfigError> {
    schema
        .kind_of(key.as_str())
        .ok_or_else(|| ConfigError::UnknownKey {
            context: context.to_string(),
            key: key.clone(),
        })
}

/// Returns true if every condition holds (an empty list always holds).
pub fn all_hold(conditions: &[Condition], bb: &Blackboard) -> bool {
    conditions.iter().all(|c| c.holds(bb))
}
