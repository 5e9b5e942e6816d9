//! Executable side of primitive tasks.
//!
//! This module defines the [`Operator`] trait, the capability interface
//! through which a primitive task reaches into the simulation. The trait is
//! generic over the collaborator type `W` (the world), so the planning core
//! never needs to know what an attack or a step actually does.

use std::collections::HashMap;
use std::sync::Arc;

use crate::blackboard::Blackboard;
use crate::error::ConfigError;
use crate::status::{ShutdownReason, TaskStatus};
use crate::value::EntityId;

/// Everything an operator may touch while it runs.
pub struct OperatorContext<'a, W> {
    /// The agent executing the task.
    pub agent: EntityId,

    /// The agent's live blackboard. Operators may stash intermediate facts
    /// here (e.g. a chosen destination); the task's declared effects are
    /// applied by the executor on success.
    pub blackboard: &'a mut Blackboard,

    /// The collaborator performing the real game-world effect.
    pub world: &'a mut W,
}

/// Executes a primitive task against the live world.
///
/// Operators are shared by every agent using the same domain, so they hold
/// no per-agent state; anything an operator must remember between ticks goes
/// on the blackboard.
pub trait Operator<W>: Send + Sync {
    /// Called once when the task becomes the current step of a plan.
    fn startup(&self, _ctx: &mut OperatorContext<'_, W>) {}

    /// Advances the task by one tick.
    ///
    /// # Returns
    ///
    /// - `TaskStatus::Success` if the task completed
    /// - `TaskStatus::Failure` if it cannot complete
    /// - `TaskStatus::Running` if it needs to be ticked again
    fn update(&self, ctx: &mut OperatorContext<'_, W>) -> TaskStatus;

    /// Called once when the task stops being current, for whatever reason.
    fn shutdown(&self, _ctx: &mut OperatorContext<'_, W>, _reason: ShutdownReason) {}
}

/// Plain closures work as operators without lifecycle hooks.
impl<W, F> Operator<W> for F
where
    F: Fn(&mut OperatorContext<'_, W>) -> TaskStatus + Send + Sync,
{
    #[inline]
    fn update(&self, ctx: &mut OperatorContext<'_, W>) -> TaskStatus {
        self(ctx)
    }
}

/// Named operators supplied by the collaborator.
///
/// Primitive tasks loaded from data refer to operators by name; the domain
/// builder resolves those names here.
pub struct OperatorRegistry<W> {
    operators: HashMap<String, Arc<dyn Operator<W>>>,
}

impl<W> OperatorRegistry<W> {
    pub fn new() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    /// Registers an operator under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        operator: Arc<dyn Operator<W>>,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if self.operators.contains_key(&name) {
            return Err(ConfigError::DuplicateOperator(name));
        }
        self.operators.insert(name, operator);
        Ok(())
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with(
        mut self,
        name: impl Into<String>,
        operator: impl Operator<W> + 'static,
    ) -> Result<Self, ConfigError> {
        self.register(name, Arc::new(operator))?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Operator<W>>> {
        self.operators.get(name)
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    /// Registered names, sorted (for diagnostics).
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.operators.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<W> Default for OperatorRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}
