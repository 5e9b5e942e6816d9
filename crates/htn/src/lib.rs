//! Hierarchical task network (HTN) planning for tick-driven NPCs.
//!
//! An agent's beliefs live on a typed [`Blackboard`]. A [`Planner`]
//! decomposes a goal (a [`CompoundTask`]) into an ordered list of primitive
//! tasks by depth-first search with backtracking over prioritized
//! [`Method`]s, simulating task effects on a scratch copy of the blackboard.
//! A [`PlanExecutor`] then runs the plan one primitive task per tick against
//! the live world and re-plans when a task fails or the goal changes.
//!
//! - **Deterministic**: equal priorities keep declaration order, so the same
//!   state and domain always produce the same plan
//! - **No aliasing**: search only ever mutates snapshots
//! - **Bounded**: depth and explored-method guards cap every search
//! - **Cooperative**: `Running` is the only suspension; nothing blocks
//!
//! # Architecture
//!
//! - [`Domain`]: immutable, validated task library shared by all agents
//! - [`StateProvider`]: fills blackboard keys from the simulation
//! - [`Operator`]: executes a primitive task against the simulation
//! - [`Planner`] / [`Plan`]: search and its result
//! - [`PlanExecutor`]: per-agent `Idle → Planning → Executing` state machine
//!
//! The simulation type is a generic parameter `W` throughout; the core never
//! inspects it.

pub mod blackboard;
pub mod builder;
pub mod condition;
pub mod config;
pub mod domain;
pub mod effect;
pub mod error;
pub mod executor;
pub mod key;
pub mod operator;
pub mod planner;
pub mod provider;
pub mod status;
pub mod task;
pub mod value;

pub use blackboard::Blackboard;
pub use condition::{Comparison, Condition};
pub use config::{ExecutorConfig, PlannerConfig};
pub use domain::{Domain, DomainBuilder};
pub use effect::{Effect, TaskCost};
pub use error::{BlackboardError, BudgetLimit, ConfigError, PlanningError};
pub use executor::{ExecutorContext, ExecutorEvent, ExecutorState, PlanExecutor, TaskFailure};
pub use key::{KeySchema, StateKey};
pub use operator::{Operator, OperatorContext, OperatorRegistry};
pub use planner::{Plan, PlanStats, PlannedStep, Planner};
pub use provider::{ProviderRegistry, StateProvider};
pub use status::{ShutdownReason, TaskStatus};
pub use task::{CompoundTask, Method, PrimitiveSpec, PrimitiveTask, ServiceBinding, Task, TaskId};
pub use value::{EntityId, Position, Value, ValueKind};
