//! Error taxonomy for the planning core.
//!
//! - [`BlackboardError`]: a key was written with the wrong kind or was never
//!   declared. Programmer errors; domains are validated so they do not occur
//!   during planning of a well-formed domain.
//! - [`ConfigError`]: the task library or provider set is inconsistent.
//!   Detected while building, before anything can plan with it.
//! - [`PlanningError`]: the goal cannot be decomposed from the current state.
//!   Expected and recoverable; the executor returns the agent to idle.

use std::fmt;

use thiserror::Error;

use crate::key::StateKey;
use crate::task::TaskId;
use crate::value::ValueKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlackboardError {
    #[error("key `{key}` holds {expected} values, got {found}")]
    TypeMismatch {
        key: StateKey,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("key `{0}` is not declared in the schema")]
    UndeclaredKey(StateKey),

    #[error("key `{key}` holds {kind} values and cannot be used as a number")]
    NotNumeric { key: StateKey, kind: ValueKind },

    #[error("provider `{provider}` wrote key `{key}` which it does not own")]
    NotOwned { key: StateKey, provider: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("key `{0}` is declared more than once")]
    DuplicateKey(StateKey),

    #[error("key `{key}` declared as both {first} and {second}")]
    ConflictingKeyKind {
        key: StateKey,
        first: ValueKind,
        second: ValueKind,
    },

    #[error("task `{0}` is registered more than once")]
    DuplicateTask(TaskId),

    #[error("method `{method}` of `{parent}` references unknown task `{reference}`")]
    UnknownTask {
        parent: TaskId,
        method: String,
        reference: TaskId,
    },

    #[error("{context} references undeclared key `{key}`")]
    UnknownKey { context: String, key: StateKey },

    #[error("{context} uses a {found} value for key `{key}` which holds {expected} values")]
    KindMismatch {
        context: String,
        key: StateKey,
        expected: ValueKind,
        found: ValueKind,
    },

    #[error("{context} needs a numeric key but `{key}` holds {kind} values")]
    NotNumeric {
        context: String,
        key: StateKey,
        kind: ValueKind,
    },

    #[error("primitive task `{task}` uses unknown operator `{operator}`")]
    UnknownOperator { task: TaskId, operator: String },

    #[error("operator `{0}` is registered more than once")]
    DuplicateOperator(String),

    #[error("provider `{0}` is registered more than once")]
    DuplicateProvider(String),

    #[error("key `{key}` is owned by both `{first}` and `{second}`")]
    DuplicateKeyOwner {
        key: StateKey,
        first: String,
        second: String,
    },

    #[error("primitive task `{task}` binds unknown provider `{provider}`")]
    UnknownProvider { task: TaskId, provider: String },

    #[error("primitive task `{0}` applies its effects on startup and cannot use an additive effect")]
    AdditiveStartupEffect(TaskId),

    #[error("compound task `{0}` has no methods")]
    NoMethods(TaskId),

    #[error("method `{method}` of `{task}` has no subtasks")]
    EmptyMethod { task: TaskId, method: String },
}

/// Which search guard tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetLimit {
    Depth(usize),
    Methods(usize),
}

impl fmt::Display for BudgetLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetLimit::Depth(n) => write!(f, "max depth {n}"),
            BudgetLimit::Methods(n) => write!(f, "max explored methods {n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("goal `{0}` is not registered")]
    UnknownGoal(TaskId),

    #[error("goal `{0}` is a primitive task, not a compound task")]
    NotCompound(TaskId),

    #[error("no method sequence satisfies `{goal}` from the current state")]
    NoPlan { goal: TaskId },

    #[error("planning `{goal}` exceeded {limit} after {explored} methods (depth {depth})")]
    BudgetExceeded {
        goal: TaskId,
        limit: BudgetLimit,
        explored: usize,
        depth: usize,
    },

    #[error(transparent)]
    State(#[from] BlackboardError),
}

impl PlanningError {
    /// Returns true if the search was aborted by a budget guard.
    ///
    /// Budget overruns are handled like any other planning failure but point
    /// at a pathological task library, so callers log them louder.
    pub const fn is_budget_exceeded(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. })
    }
}
