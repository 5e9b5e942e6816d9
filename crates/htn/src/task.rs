//! Task model: primitive tasks, compound tasks and their methods.
//!
//! Tasks form a closed set of two variants:
//! - [`PrimitiveTask`]: an atomic, executable step with preconditions,
//!   effects, a cost and an operator
//! - [`CompoundTask`]: a goal decomposed by one of its [`Method`]s into an
//!   ordered list of subtasks (primitive or compound)
//!
//! The data half of every task ([`PrimitiveSpec`], [`CompoundTask`]) is plain
//! data that can be loaded from content files; only the operator binding is
//! code, supplied by the collaborator through an
//! [`OperatorRegistry`](crate::OperatorRegistry).

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::blackboard::Blackboard;
use crate::condition::{Condition, all_hold};
use crate::effect::{Effect, TaskCost, apply_all};
use crate::error::BlackboardError;
use crate::operator::Operator;

/// Identifier of a primitive or compound task.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(Arc<str>);

impl TaskId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TaskId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TaskId {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Borrow<str> for TaskId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TaskId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for TaskId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = <String as serde::Deserialize>::deserialize(deserializer)?;
        Ok(Self::from(name))
    }
}

/// A provider refreshed periodically while a task is the current step.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ServiceBinding {
    /// Name of a registered [`StateProvider`](crate::StateProvider).
    pub provider: String,

    /// Minimum ticks between two refreshes. Zero refreshes every tick.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: u32,
}

/// Data half of a primitive task.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PrimitiveSpec {
    pub id: TaskId,

    /// Name of the operator that executes this task.
    pub operator: String,

    #[cfg_attr(feature = "serde", serde(default))]
    pub preconditions: Vec<Condition>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub effects: Vec<Effect>,

    #[cfg_attr(feature = "serde", serde(default))]
    pub cost: TaskCost,

    #[cfg_attr(feature = "serde", serde(default))]
    pub services: Vec<ServiceBinding>,

    /// Writes the values the planner computed for this step's effects into
    /// the live blackboard just before the operator starts, so the operator
    /// reuses them instead of recomputing them.
    #[cfg_attr(feature = "serde", serde(default))]
    pub apply_effects_on_startup: bool,
}

impl PrimitiveSpec {
    pub fn new(id: impl Into<TaskId>, operator: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            operator: operator.into(),
            preconditions: Vec::new(),
            effects: Vec::new(),
            cost: TaskCost::default(),
            services: Vec::new(),
            apply_effects_on_startup: false,
        }
    }

    /// Adds a precondition (builder pattern).
    pub fn when(mut self, condition: Condition) -> Self {
        self.preconditions.push(condition);
        self
    }

    /// Adds an effect (builder pattern).
    pub fn effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Sets the cost (builder pattern).
    pub fn cost(mut self, cost: TaskCost) -> Self {
        self.cost = cost;
        self
    }

    /// Seeds the planned effect values on startup (builder pattern).
    pub fn effects_on_startup(mut self) -> Self {
        self.apply_effects_on_startup = true;
        self
    }

    /// Binds a service (builder pattern).
    pub fn service(mut self, provider: impl Into<String>, cooldown: u32) -> Self {
        self.services.push(ServiceBinding {
            provider: provider.into(),
            cooldown,
        });
        self
    }
}

/// An immutable, registered primitive task.
pub struct PrimitiveTask<W> {
    spec: PrimitiveSpec,
    operator: Arc<dyn Operator<W>>,
}

impl<W> PrimitiveTask<W> {
    pub(crate) fn new(spec: PrimitiveSpec, operator: Arc<dyn Operator<W>>) -> Self {
        Self { spec, operator }
    }

    pub fn id(&self) -> &TaskId {
        &self.spec.id
    }

    pub fn spec(&self) -> &PrimitiveSpec {
        &self.spec
    }

    pub fn operator(&self) -> &dyn Operator<W> {
        self.operator.as_ref()
    }

    pub fn operator_name(&self) -> &str {
        &self.spec.operator
    }

    pub fn services(&self) -> &[ServiceBinding] {
        &self.spec.services
    }

    /// Pure predicate: do all preconditions hold?
    pub fn is_eligible(&self, bb: &Blackboard) -> bool {
        all_hold(&self.spec.preconditions, bb)
    }

    /// Applies the expected outcome to `bb` (scratch or live).
    pub fn apply_effects(&self, bb: &mut Blackboard) -> Result<(), BlackboardError> {
        apply_all(&self.spec.effects, bb)
    }

    pub fn applies_effects_on_startup(&self) -> bool {
        self.spec.apply_effects_on_startup
    }

    /// Non-negative cost of running this task in state `bb`.
    pub fn cost(&self, bb: &Blackboard) -> u32 {
        self.spec.cost.evaluate(bb)
    }
}

impl<W> fmt::Debug for PrimitiveTask<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrimitiveTask")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// A guarded, prioritized decomposition rule.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Method {
    pub name: String,

    /// Higher ranks are tried first; equal ranks keep declaration order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: i32,

    #[cfg_attr(feature = "serde", serde(default))]
    pub preconditions: Vec<Condition>,

    pub subtasks: Vec<TaskId>,
}

impl Method {
    pub fn new<I, T>(name: impl Into<String>, subtasks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TaskId>,
    {
        Self {
            name: name.into(),
            priority: 0,
            preconditions: Vec::new(),
            subtasks: subtasks.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the priority rank (builder pattern).
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a precondition (builder pattern).
    pub fn when(mut self, condition: Condition) -> Self {
        self.preconditions.push(condition);
        self
    }

    pub fn is_eligible(&self, bb: &Blackboard) -> bool {
        all_hold(&self.preconditions, bb)
    }
}

/// A goal and the methods that may achieve it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompoundTask {
    pub id: TaskId,
    pub methods: Vec<Method>,
}

impl CompoundTask {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            methods: Vec::new(),
        }
    }

    /// Appends a method (builder pattern).
    pub fn method(mut self, method: Method) -> Self {
        self.methods.push(method);
        self
    }

    /// Eligible methods in search order: descending priority, then
    /// declaration order. Each entry carries the method's rank, its position
    /// in that order among all methods, eligible or not.
    pub fn ranked_methods<'a>(&'a self, bb: &Blackboard) -> Vec<(usize, &'a Method)> {
        let mut ranked: Vec<&Method> = self.methods.iter().collect();
        // Stable sort keeps declaration order among equal priorities.
        ranked.sort_by(|a, b| b.priority.cmp(&a.priority));
        ranked
            .into_iter()
            .enumerate()
            .filter(|(_, m)| m.is_eligible(bb))
            .collect()
    }
}

/// A registered task, borrowed from a [`Domain`](crate::Domain).
pub enum Task<'a, W> {
    Primitive(&'a PrimitiveTask<W>),
    Compound(&'a CompoundTask),
}

impl<W> Clone for Task<'_, W> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<W> Copy for Task<'_, W> {}

impl<'a, W> Task<'a, W> {
    pub fn id(&self) -> &'a TaskId {
        match self {
            Task::Primitive(p) => p.id(),
            Task::Compound(c) => &c.id,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Task::Primitive(_))
    }
}
