//! Error types surfaced by the NPC runtime.
//!
//! Planning and execution failures are not errors here: they arrive as
//! [`ExecutorEvent`](htn::ExecutorEvent)s. These variants cover misuse of the
//! system API and broken blackboard writes.

use htn::{BlackboardError, EntityId, TaskId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("runtime requires a domain to be configured before building")]
    MissingDomain,

    #[error("agent {0} is already active")]
    AlreadyActive(EntityId),

    #[error("agent {0} is not active")]
    UnknownAgent(EntityId),

    #[error("goal `{0}` is not a compound task of the domain")]
    UnknownGoal(TaskId),

    #[error("blackboard of agent {agent} rejected a write")]
    Blackboard {
        agent: EntityId,
        #[source]
        source: BlackboardError,
    },
}
