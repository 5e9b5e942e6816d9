//! The task library ("domain"): a validated, immutable registry of tasks.
//!
//! A [`Domain`] is assembled once at startup through [`DomainBuilder`] and
//! never changes afterwards, so any number of agents may plan against it
//! concurrently. Building validates everything a search could trip over:
//! duplicate ids, dangling subtask references, unknown operators, keys that
//! are undeclared or used with the wrong kind, and services bound to
//! unknown providers.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::sync::Arc;

use tracing::debug;

use crate::blackboard::Blackboard;
use crate::effect::Effect;
use crate::error::ConfigError;
use crate::key::{KeySchema, StateKey};
use crate::operator::{Operator, OperatorRegistry};
use crate::provider::ProviderRegistry;
use crate::task::{CompoundTask, PrimitiveSpec, PrimitiveTask, Task, TaskId};
use crate::value::ValueKind;

enum Entry<W> {
    Primitive(PrimitiveTask<W>),
    Compound(CompoundTask),
}

/// Immutable task library shared by every agent.
pub struct Domain<W> {
    schema: Arc<KeySchema>,
    tasks: HashMap<TaskId, Entry<W>>,
    order: Vec<TaskId>,
}

impl<W> Domain<W> {
    pub fn builder() -> DomainBuilder<W> {
        DomainBuilder::new()
    }

    pub fn schema(&self) -> &Arc<KeySchema> {
        &self.schema
    }

    /// Creates an empty blackboard bound to this domain's key schema.
    pub fn new_blackboard(&self) -> Blackboard {
        Blackboard::new(Arc::clone(&self.schema))
    }

    pub fn task(&self, id: &str) -> Option<Task<'_, W>> {
        self.tasks.get(id).map(|entry| match entry {
            Entry::Primitive(p) => Task::Primitive(p),
            Entry::Compound(c) => Task::Compound(c),
        })
    }

    pub fn primitive(&self, id: &str) -> Option<&PrimitiveTask<W>> {
        match self.tasks.get(id) {
            Some(Entry::Primitive(p)) => Some(p),
            _ => None,
        }
    }

    pub fn compound(&self, id: &str) -> Option<&CompoundTask> {
        match self.tasks.get(id) {
            Some(Entry::Compound(c)) => Some(c),
            _ => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    /// Task ids in registration order (primitives first, then compounds).
    pub fn task_ids(&self) -> impl Iterator<Item = &TaskId> + '_ {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Renders the decomposition tree under `root` as indented text.
    ///
    /// Compound tasks already being expanded on the current branch are
    /// printed once more and marked `(recursive)` instead of being expanded
    /// again. Returns `None` if `root` is not registered.
    pub fn describe(&self, root: &str) -> Option<String> {
        let task = self.task(root)?;
        let mut out = String::new();
        let mut branch = HashSet::new();
        self.describe_task(task, 0, &mut branch, &mut out);
        Some(out)
    }

    fn describe_task<'a>(
        &'a self,
        task: Task<'a, W>,
        indent: usize,
        branch: &mut HashSet<&'a TaskId>,
        out: &mut String,
    ) {
        let pad = "    ".repeat(indent);
        match task {
            Task::Primitive(p) => {
                let _ = writeln!(out, "{pad}Primitive: {}", p.id());
                let _ = writeln!(out, "{pad}  operator: {}", p.operator_name());
            }
            Task::Compound(c) => {
                if !branch.insert(&c.id) {
                    let _ = writeln!(out, "{pad}Compound: {} (recursive)", c.id);
                    return;
                }
                let _ = writeln!(out, "{pad}Compound: {}", c.id);
                for (index, method) in c.methods.iter().enumerate() {
                    let _ = writeln!(
                        out,
                        "{pad}  method {index} `{}` (priority {}):",
                        method.name, method.priority
                    );
                    for subtask in &method.subtasks {
                        if let Some(sub) = self.task(subtask.as_str()) {
                            self.describe_task(sub, indent + 1, branch, out);
                        }
                    }
                }
                branch.remove(&c.id);
            }
        }
    }
}

/// Collects task definitions and validates them into a [`Domain`].
///
/// Registration errors are deferred: the first one is reported by
/// [`build`](Self::build), so definitions can be chained fluently.
pub struct DomainBuilder<W> {
    schema: KeySchema,
    primitives: Vec<(PrimitiveSpec, Option<Arc<dyn Operator<W>>>)>,
    compounds: Vec<CompoundTask>,
    error: Option<ConfigError>,
}

impl<W> DomainBuilder<W> {
    pub fn new() -> Self {
        Self {
            schema: KeySchema::new(),
            primitives: Vec::new(),
            compounds: Vec::new(),
            error: None,
        }
    }

    /// Declares a blackboard key.
    pub fn key(mut self, key: impl Into<StateKey>, kind: ValueKind) -> Self {
        if let Err(e) = self.schema.declare(key, kind) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Adds a primitive task with an explicit operator.
    pub fn primitive(mut self, spec: PrimitiveSpec, operator: impl Operator<W> + 'static) -> Self {
        self.primitives.push((spec, Some(Arc::new(operator))));
        self
    }

    /// Adds a primitive task whose operator is resolved by name at build time.
    pub fn primitive_spec(mut self, spec: PrimitiveSpec) -> Self {
        self.primitives.push((spec, None));
        self
    }

    pub fn compound(mut self, task: CompoundTask) -> Self {
        self.compounds.push(task);
        self
    }

    /// Builds a domain that needs no named operators and no providers.
    pub fn build(self) -> Result<Domain<W>, ConfigError> {
        self.build_with(&OperatorRegistry::new(), &ProviderRegistry::new())
    }

    /// Validates the definitions and builds the domain.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; the domain never becomes
    /// usable in an inconsistent state.
    pub fn build_with(
        self,
        operators: &OperatorRegistry<W>,
        providers: &ProviderRegistry<W>,
    ) -> Result<Domain<W>, ConfigError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        let schema = self.schema;
        providers.validate(&schema)?;

        let mut tasks: HashMap<TaskId, Entry<W>> = HashMap::new();
        let mut order = Vec::new();

        for (spec, explicit) in self.primitives {
            if tasks.contains_key(&spec.id) {
                return Err(ConfigError::DuplicateTask(spec.id));
            }

            let context = format!("primitive task `{}`", spec.id);
            for condition in &spec.preconditions {
                condition.validate(&schema, &context)?;
            }
            for effect in &spec.effects {
                effect.validate(&schema, &context)?;
            }
            // Success re-applies the effects after the startup write.
            if spec.apply_effects_on_startup
                && spec.effects.iter().any(|e| matches!(e, Effect::Add(..)))
            {
                return Err(ConfigError::AdditiveStartupEffect(spec.id));
            }
            spec.cost.validate(&schema, &context)?;

            for service in &spec.services {
                if !providers.contains(&service.provider) {
                    return Err(ConfigError::UnknownProvider {
                        task: spec.id.clone(),
                        provider: service.provider.clone(),
                    });
                }
            }

            let operator = match explicit {
                Some(op) => op,
                None => operators.get(&spec.operator).cloned().ok_or_else(|| {
                    ConfigError::UnknownOperator {
                        task: spec.id.clone(),
                        operator: spec.operator.clone(),
                    }
                })?,
            };

            let id = spec.id.clone();
            order.push(id.clone());
            tasks.insert(id, Entry::Primitive(PrimitiveTask::new(spec, operator)));
        }

        for task in &self.compounds {
            if tasks.contains_key(&task.id) || order[tasks.len()..].contains(&task.id) {
                return Err(ConfigError::DuplicateTask(task.id.clone()));
            }
            order.push(task.id.clone());
        }

        // Subtask references may point at any compound, including ones
        // registered later, so resolve them once every id is known.
        let known: HashSet<&TaskId> = order.iter().collect();
        for task in &self.compounds {
            if task.methods.is_empty() {
                return Err(ConfigError::NoMethods(task.id.clone()));
            }
            for method in &task.methods {
                if method.subtasks.is_empty() {
                    return Err(ConfigError::EmptyMethod {
                        task: task.id.clone(),
                        method: method.name.clone(),
                    });
                }
                let context = format!("method `{}` of `{}`", method.name, task.id);
                for condition in &method.preconditions {
                    condition.validate(&schema, &context)?;
                }
                for subtask in &method.subtasks {
                    if !known.contains(subtask) {
                        return Err(ConfigError::UnknownTask {
                            parent: task.id.clone(),
                            method: method.name.clone(),
                            reference: subtask.clone(),
                        });
                    }
                }
            }
        }

        for task in self.compounds {
            tasks.insert(task.id.clone(), Entry::Compound(task));
        }

        debug!(
            target: "htn::domain",
            tasks = tasks.len(),
            keys = schema.len(),
            providers = providers.len(),
            "domain built"
        );

        Ok(Domain {
            schema: Arc::new(schema),
            tasks,
            order,
        })
    }
}

impl<W> Default for DomainBuilder<W> {
    fn default() -> Self {
        Self::new()
    }
}
