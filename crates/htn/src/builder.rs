//! Builder utilities for writing conditions and effects in code.
//!
//! Instead of spelling out `Condition::Equals("armed".into(), Value::Flag(true))`,
//! you can write `equals("armed", true)`.

use crate::condition::{Comparison, Condition};
use crate::effect::Effect;
use crate::key::StateKey;
use crate::value::Value;

/// Shorthand for `Condition::IsSet`.
#[inline]
pub fn is_set(key: impl Into<StateKey>) -> Condition {
    Condition::IsSet(key.into())
}

/// Shorthand for `Condition::IsUnset`.
#[inline]
pub fn is_unset(key: impl Into<StateKey>) -> Condition {
    Condition::IsUnset(key.into())
}

#[inline]
pub fn equals(key: impl Into<StateKey>, value: impl Into<Value>) -> Condition {
    Condition::Equals(key.into(), value.into())
}

#[inline]
pub fn not_equals(key: impl Into<StateKey>, value: impl Into<Value>) -> Condition {
    Condition::NotEquals(key.into(), value.into())
}

/// Numeric comparison, e.g. `compare("hp", Comparison::Lt, 30.0)`.
#[inline]
pub fn compare(key: impl Into<StateKey>, op: Comparison, value: f64) -> Condition {
    Condition::Compare {
        key: key.into(),
        op,
        value,
    }
}

#[inline]
pub fn not(condition: Condition) -> Condition {
    Condition::Not(Box::new(condition))
}

/// Shorthand for `Effect::Set`.
#[inline]
pub fn set(key: impl Into<StateKey>, value: impl Into<Value>) -> Effect {
    Effect::Set(key.into(), value.into())
}

/// Shorthand for `Effect::Clear`.
#[inline]
pub fn clear(key: impl Into<StateKey>) -> Effect {
    Effect::Clear(key.into())
}

#[inline]
pub fn add(key: impl Into<StateKey>, delta: f64) -> Effect {
    Effect::Add(key.into(), delta)
}

#[inline]
pub fn copy(from: impl Into<StateKey>, to: impl Into<StateKey>) -> Effect {
    Effect::Copy {
        from: from.into(),
        to: to.into(),
    }
}
