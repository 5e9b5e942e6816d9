//! Depth-first, backtracking HTN planner.
//!
//! # Search
//!
//! Starting from the goal compound task, the planner tries eligible methods
//! in rank order. Each attempt works on its own snapshot of the scratch
//! state; a method that fails to expand is abandoned together with its
//! snapshot, and the partial plan and traversal record are truncated back to
//! where the attempt started. The live blackboard passed to
//! [`Planner::plan`] is only ever read.
//!
//! # Guards
//!
//! Search always completes within the call. Nesting deeper than
//! [`PlannerConfig::max_depth`] or attempting more than
//! [`PlannerConfig::max_methods`] methods aborts the whole search with
//! [`PlanningError::BudgetExceeded`].

use tracing::{debug, warn};

use crate::blackboard::Blackboard;
use crate::config::PlannerConfig;
use crate::domain::Domain;
use crate::error::{BlackboardError, BudgetLimit, PlanningError};
use crate::key::StateKey;
use crate::task::{CompoundTask, Method, PrimitiveTask, Task, TaskId};
use crate::value::{EntityId, Value};

/// Counters describing one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlanStats {
    /// Methods attempted, successful or not.
    pub explored: usize,
    /// Methods abandoned after being attempted.
    pub backtracks: usize,
    /// Deepest compound nesting reached (the goal is depth 1).
    pub depth: usize,
}

/// What the planner predicted for one primitive step.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedStep {
    /// Cost in the scratch state the step was planned in.
    pub cost: u32,
    /// Every key the step's effects wrote, with the value it was left at in
    /// the scratch state (`None` once cleared).
    pub writes: Vec<(StateKey, Option<Value>)>,
}

/// An ordered list of primitive tasks achieving a goal.
#[derive(Clone, Debug)]
pub struct Plan {
    goal: TaskId,
    tasks: Vec<TaskId>,
    steps: Vec<PlannedStep>,
    record: Vec<usize>,
    cost: u32,
    final_state: Blackboard,
    stats: PlanStats,
}

impl Plan {
    pub fn goal(&self) -> &TaskId {
        &self.goal
    }

    /// Primitive task ids in execution order.
    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    /// Planner prediction for the task at `index`.
    pub fn step(&self, index: usize) -> Option<&PlannedStep> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Rank of the method chosen at each compound expansion (0 for the
    /// compound's highest-priority method), in expansion order.
    pub fn record(&self) -> &[usize] {
        &self.record
    }

    /// Sum of the primitive costs, each evaluated in the scratch state it
    /// was planned in.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Scratch state after simulating every task of the plan.
    pub fn final_state(&self) -> &Blackboard {
        &self.final_state
    }

    pub fn stats(&self) -> PlanStats {
        self.stats
    }

    /// Returns true if this plan ranks above `other`.
    ///
    /// Records are compared position by position; the first differing
    /// method rank decides, lower winning. Identical records fall back to
    /// cost, so the same decomposition wins only if strictly cheaper. A
    /// record that is a prefix of the other ranks neither plan above.
    pub fn is_better_than(&self, other: &Plan) -> bool {
        match self.record.iter().zip(&other.record).find(|(a, b)| a != b) {
            Some((a, b)) => a < b,
            None => self.record.len() == other.record.len() && self.cost < other.cost,
        }
    }
}

/// Plans goals against a [`Domain`].
#[derive(Clone, Debug, Default)]
pub struct Planner {
    config: PlannerConfig,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Decomposes `goal` starting from a snapshot of `bb`.
    ///
    /// `bb` is not modified, so this is safe to call speculatively.
    ///
    /// # Errors
    ///
    /// - [`PlanningError::UnknownGoal`] / [`PlanningError::NotCompound`] for a
    ///   bad goal id
    /// - [`PlanningError::NoPlan`] if no method sequence applies
    /// - [`PlanningError::BudgetExceeded`] if a search guard tripped
    /// - [`PlanningError::State`] if an effect wrote a key with the wrong kind
    pub fn plan<W>(
        &self,
        domain: &Domain<W>,
        agent: EntityId,
        goal: &TaskId,
        bb: &Blackboard,
    ) -> Result<Plan, PlanningError> {
        let root = match domain.task(goal.as_str()) {
            Some(Task::Compound(c)) => c,
            Some(Task::Primitive(_)) => return Err(PlanningError::NotCompound(goal.clone())),
            None => return Err(PlanningError::UnknownGoal(goal.clone())),
        };

        let mut scratch = bb.snapshot();
        let mut search = Search {
            domain,
            config: &self.config,
            tasks: Vec::new(),
            steps: Vec::new(),
            record: Vec::new(),
            cost: 0,
            stats: PlanStats::default(),
        };

        match search.expand_compound(root, &mut scratch, 1) {
            Ok(true) => {
                debug!(
                    target: "htn::planner",
                    agent = %agent,
                    goal = %goal,
                    tasks = search.tasks.len(),
                    cost = search.cost,
                    explored = search.stats.explored,
                    backtracks = search.stats.backtracks,
                    "plan found"
                );
                Ok(Plan {
                    goal: goal.clone(),
                    tasks: search.tasks,
                    steps: search.steps,
                    record: search.record,
                    cost: search.cost,
                    final_state: scratch,
                    stats: search.stats,
                })
            }
            Ok(false) => {
                debug!(
                    target: "htn::planner",
                    agent = %agent,
                    goal = %goal,
                    explored = search.stats.explored,
                    "no plan"
                );
                Err(PlanningError::NoPlan { goal: goal.clone() })
            }
            Err(Abort::Budget(limit)) => {
                warn!(
                    target: "htn::planner",
                    agent = %agent,
                    goal = %goal,
                    %limit,
                    explored = search.stats.explored,
                    depth = search.stats.depth,
                    "planning budget exceeded"
                );
                Err(PlanningError::BudgetExceeded {
                    goal: goal.clone(),
                    limit,
                    explored: search.stats.explored,
                    depth: search.stats.depth,
                })
            }
            Err(Abort::State(e)) => Err(PlanningError::State(e)),
        }
    }
}

enum Abort {
    Budget(BudgetLimit),
    State(BlackboardError),
}

impl From<BlackboardError> for Abort {
    fn from(e: BlackboardError) -> Self {
        Abort::State(e)
    }
}

struct Search<'a, W> {
    domain: &'a Domain<W>,
    config: &'a PlannerConfig,
    tasks: Vec<TaskId>,
    steps: Vec<PlannedStep>,
    record: Vec<usize>,
    cost: u32,
    stats: PlanStats,
}

impl<W> Search<'_, W> {
    /// Expands `task` into `state`. On success `state` holds the result of
    /// the chosen method; on failure it is untouched.
    fn expand_compound(
        &mut self,
        task: &CompoundTask,
        state: &mut Blackboard,
        depth: usize,
    ) -> Result<bool, Abort> {
        if depth > self.config.max_depth {
            return Err(Abort::Budget(BudgetLimit::Depth(self.config.max_depth)));
        }
        self.stats.depth = self.stats.depth.max(depth);

        for (rank, method) in task.ranked_methods(state) {
            if self.stats.explored >= self.config.max_methods {
                return Err(Abort::Budget(BudgetLimit::Methods(self.config.max_methods)));
            }
            self.stats.explored += 1;

            let tasks_len = self.tasks.len();
            let record_len = self.record.len();
            let cost = self.cost;

            self.record.push(rank);
            let mut scratch = state.snapshot();
            if self.expand_method(method, &mut scratch, depth)? {
                *state = scratch;
                return Ok(true);
            }

            self.tasks.truncate(tasks_len);
            self.steps.truncate(tasks_len);
            self.record.truncate(record_len);
            self.cost = cost;
            self.stats.backtracks += 1;
        }

        Ok(false)
    }

    fn expand_method(
        &mut self,
        method: &Method,
        state: &mut Blackboard,
        depth: usize,
    ) -> Result<bool, Abort> {
        let domain = self.domain;
        for subtask in &method.subtasks {
            let expanded = match domain.task(subtask.as_str()) {
                Some(Task::Primitive(p)) => self.push_primitive(p, state)?,
                Some(Task::Compound(c)) => self.expand_compound(c, state, depth + 1)?,
                None => false,
            };
            if !expanded {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn push_primitive(
        &mut self,
        task: &PrimitiveTask<W>,
        state: &mut Blackboard,
    ) -> Result<bool, Abort> {
        if !task.is_eligible(state) {
            return Ok(false);
        }

        let step_cost = task.cost(state);
        let cost = self.cost.saturating_add(step_cost);
        if self.config.max_plan_cost.is_some_and(|ceiling| cost > ceiling) {
            return Ok(false);
        }

        task.apply_effects(state)?;
        let writes = task
            .spec()
            .effects
            .iter()
            .map(|effect| {
                let key = effect.target().clone();
                let value = state.get(key.as_str());
                (key, value)
            })
            .collect();

        self.tasks.push(task.id().clone());
        self.steps.push(PlannedStep {
            cost: step_cost,
            writes,
        });
        self.cost = cost;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::Condition;
    use crate::effect::{Effect, TaskCost};
    use crate::operator::OperatorContext;
    use crate::status::TaskStatus;
    use crate::task::{Method, PrimitiveSpec};
    use crate::value::{Value, ValueKind};

    struct World;

    fn noop(_: &mut OperatorContext<'_, World>) -> TaskStatus {
        TaskStatus::Success
    }

    fn ids(plan: &Plan) -> Vec<&str> {
        plan.tasks().iter().map(TaskId::as_str).collect()
    }

    fn domain() -> Domain<World> {
        Domain::builder()
            .key("armed", ValueKind::Flag)
            .key("ammo", ValueKind::Int)
            .primitive(
                PrimitiveSpec::new("draw", "draw").effect(Effect::Set("armed".into(), Value::Flag(true))),
                noop,
            )
            .primitive(
                PrimitiveSpec::new("shoot", "shoot")
                    .when(Condition::Equals("armed".into(), Value::Flag(true)))
                    .when(Condition::Compare {
                        key: "ammo".into(),
                        op: crate::condition::Comparison::Gt,
                        value: 0.0,
                    })
                    .effect(Effect::Add("ammo".into(), -1.0))
                    .cost(TaskCost::Fixed(3)),
                noop,
            )
            .primitive(PrimitiveSpec::new("punch", "punch"), noop)
            .compound(
                CompoundTask::new("attack")
                    .method(Method::new("ranged", ["draw", "shoot"]).priority(1))
                    .method(Method::new("melee", ["punch"])),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn effects_feed_later_preconditions() {
        let domain = domain();
        let mut bb = domain.new_blackboard();
        bb.set("ammo", 2i64).unwrap();

        let plan = Planner::default()
            .plan(&domain, EntityId(1), &"attack".into(), &bb)
            .unwrap();

        assert_eq!(ids(&plan), ["draw", "shoot"]);
        assert_eq!(plan.record(), [0]);
        assert_eq!(plan.cost(), 4);
        assert_eq!(plan.final_state().int("ammo"), Some(1));
        assert_eq!(
            plan.step(1),
            Some(&PlannedStep {
                cost: 3,
                writes: vec![("ammo".into(), Some(Value::Int(1)))],
            })
        );
        assert!(plan.step(2).is_none());
        assert_eq!(bb.int("ammo"), Some(2));
        assert!(!bb.is_set("armed"));
    }

    #[test]
    fn falls_back_when_subtask_is_ineligible() {
        let domain = domain();
        let bb = domain.new_blackboard();

        let plan = Planner::default()
            .plan(&domain, EntityId(1), &"attack".into(), &bb)
            .unwrap();

        assert_eq!(ids(&plan), ["punch"]);
        assert_eq!(plan.record(), [1]);
        assert_eq!(plan.stats().backtracks, 1);
        assert_eq!(plan.stats().explored, 2);
        assert!(!plan.final_state().is_set("armed"));
    }

    #[test]
    fn cost_ceiling_forces_cheaper_method() {
        let domain = domain();
        let mut bb = domain.new_blackboard();
        bb.set("ammo", 5i64).unwrap();

        let plan = Planner::new(PlannerConfig::new().with_max_plan_cost(2))
            .plan(&domain, EntityId(1), &"attack".into(), &bb)
            .unwrap();
        assert_eq!(ids(&plan), ["punch"]);
    }

    #[test]
    fn bad_goals() {
        let domain = domain();
        let bb = domain.new_blackboard();
        let planner = Planner::default();

        assert_eq!(
            planner.plan(&domain, EntityId(1), &"dance".into(), &bb).unwrap_err(),
            PlanningError::UnknownGoal("dance".into())
        );
        assert_eq!(
            planner.plan(&domain, EntityId(1), &"punch".into(), &bb).unwrap_err(),
            PlanningError::NotCompound("punch".into())
        );
    }

    #[test]
    fn method_budget_is_enforced() {
        let domain = domain();
        let bb = domain.new_blackboard();

        let err = Planner::new(PlannerConfig::new().with_max_methods(1))
            .plan(&domain, EntityId(1), &"attack".into(), &bb)
            .unwrap_err();

        assert!(err.is_budget_exceeded());
        assert!(matches!(
            err,
            PlanningError::BudgetExceeded {
                limit: BudgetLimit::Methods(1),
                explored: 1,
                ..
            }
        ));
    }

    fn plan_with_record(record: Vec<usize>) -> Plan {
        plan_with_cost(record, 0)
    }

    fn plan_with_cost(record: Vec<usize>, cost: u32) -> Plan {
        Plan {
            goal: "g".into(),
            tasks: Vec::new(),
            steps: Vec::new(),
            record,
            cost,
            final_state: domain().new_blackboard(),
            stats: PlanStats::default(),
        }
    }

    #[test]
    fn better_plan_compares_first_difference() {
        let running = plan_with_record(vec![1, 0, 2]);

        assert!(plan_with_record(vec![0, 5]).is_better_than(&running));
        assert!(plan_with_record(vec![1, 0, 1]).is_better_than(&running));
        assert!(!plan_with_record(vec![1, 0, 2]).is_better_than(&running));
        assert!(!plan_with_record(vec![1, 0]).is_better_than(&running));
        assert!(!plan_with_record(vec![2]).is_better_than(&running));
    }

    #[test]
    fn equal_records_prefer_cheaper_plan() {
        let running = plan_with_cost(vec![0, 1], 8);

        assert!(plan_with_cost(vec![0, 1], 5).is_better_than(&running));
        assert!(!plan_with_cost(vec![0, 1], 8).is_better_than(&running));
        assert!(!plan_with_cost(vec![0, 2], 1).is_better_than(&running));
        assert!(!plan_with_cost(vec![0], 1).is_better_than(&running));
        assert!(plan_with_cost(vec![0, 0], 20).is_better_than(&running));
    }
}
