//! Per-agent plan executor.
//!
//! [`PlanExecutor`] is a small state machine advanced once per simulation
//! tick:
//!
//! ```text
//! Idle ──assign_goal──▶ Planning ──plan found──▶ Executing ──last task──▶ Idle
//!   ▲                      │  ▲                      │
//!   └──────no plan─────────┘  └──failure/invalidate──┘
//! ```
//!
//! A planning tick only plans; the first task of a fresh plan starts on the
//! following tick. While executing, exactly one operator update runs per
//! tick. Goal changes and invalidation never interrupt a tick in progress:
//! they discard the plan immediately and the interrupted operator is shut
//! down at the start of the next tick.

use std::mem;

use tracing::{debug, warn};

use crate::blackboard::Blackboard;
use crate::config::ExecutorConfig;
use crate::domain::Domain;
use crate::error::{BlackboardError, PlanningError};
use crate::operator::OperatorContext;
use crate::planner::{Plan, PlannedStep, Planner};
use crate::provider::ProviderRegistry;
use crate::status::{ShutdownReason, TaskStatus};
use crate::task::{PrimitiveTask, TaskId};
use crate::value::EntityId;

/// Everything one executor tick needs, borrowed from the caller.
pub struct ExecutorContext<'a, W> {
    pub domain: &'a Domain<W>,
    pub planner: &'a Planner,
    pub providers: &'a ProviderRegistry<W>,
    pub blackboard: &'a mut Blackboard,
    pub world: &'a mut W,
}

/// Observable executor state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ExecutorState {
    Idle,
    Planning,
    Executing,
}

/// Why a task was abandoned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum TaskFailure {
    /// The operator returned `Failure`.
    Failed,
    /// Its preconditions no longer held against the live blackboard.
    Ineligible,
}

/// Something that happened during a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum ExecutorEvent {
    PlanFound {
        agent: EntityId,
        goal: TaskId,
        tasks: Vec<TaskId>,
        cost: u32,
    },
    PlanFailed {
        agent: EntityId,
        goal: TaskId,
        error: PlanningError,
    },
    PlanReplaced {
        agent: EntityId,
        goal: TaskId,
        tasks: Vec<TaskId>,
    },
    TaskStarted {
        agent: EntityId,
        task: TaskId,
    },
    TaskFinished {
        agent: EntityId,
        task: TaskId,
    },
    TaskFailed {
        agent: EntityId,
        task: TaskId,
        reason: TaskFailure,
    },
    GoalAchieved {
        agent: EntityId,
        goal: TaskId,
    },
}

impl ExecutorEvent {
    pub fn agent(&self) -> EntityId {
        match self {
            ExecutorEvent::PlanFound { agent, .. }
            | ExecutorEvent::PlanFailed { agent, .. }
            | ExecutorEvent::PlanReplaced { agent, .. }
            | ExecutorEvent::TaskStarted { agent, .. }
            | ExecutorEvent::TaskFinished { agent, .. }
            | ExecutorEvent::TaskFailed { agent, .. }
            | ExecutorEvent::GoalAchieved { agent, .. } => *agent,
        }
    }
}

#[derive(Debug)]
struct ActivePlan {
    plan: Plan,
    cursor: usize,
    started: bool,
    /// Ticks left before each service of the current task refreshes again.
    cooldowns: Vec<u32>,
    ticks_since_plan: u32,
}

impl ActivePlan {
    fn new(plan: Plan) -> Self {
        Self {
            plan,
            cursor: 0,
            started: false,
            cooldowns: Vec::new(),
            ticks_since_plan: 0,
        }
    }

    fn current(&self) -> Option<&TaskId> {
        self.plan.tasks().get(self.cursor)
    }

    fn advance(&mut self) {
        self.cursor += 1;
        self.started = false;
        self.cooldowns.clear();
    }
}

#[derive(Debug)]
enum Phase {
    Idle,
    Planning,
    Executing(ActivePlan),
}

/// Drives one agent's plans.
#[derive(Debug)]
pub struct PlanExecutor {
    config: ExecutorConfig,
    goal: Option<TaskId>,
    phase: Phase,
    /// Running task of a discarded plan, shut down on the next tick.
    interrupted: Option<TaskId>,
}

impl PlanExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            goal: None,
            phase: Phase::Idle,
            interrupted: None,
        }
    }

    pub fn state(&self) -> ExecutorState {
        match self.phase {
            Phase::Idle => ExecutorState::Idle,
            Phase::Planning => ExecutorState::Planning,
            Phase::Executing(_) => ExecutorState::Executing,
        }
    }

    /// The most recently assigned goal. Kept after the goal is achieved or
    /// found unachievable, so [`invalidate`](Self::invalidate) can retry it.
    pub fn goal(&self) -> Option<&TaskId> {
        self.goal.as_ref()
    }

    pub fn plan(&self) -> Option<&Plan> {
        match &self.phase {
            Phase::Executing(active) => Some(&active.plan),
            _ => None,
        }
    }

    /// Index of the current task within the plan.
    pub fn cursor(&self) -> Option<usize> {
        match &self.phase {
            Phase::Executing(active) => Some(active.cursor),
            _ => None,
        }
    }

    pub fn current_task(&self) -> Option<&TaskId> {
        match &self.phase {
            Phase::Executing(active) => active.current(),
            _ => None,
        }
    }

    /// Sets a new goal, discarding any current plan.
    pub fn assign_goal(&mut self, goal: impl Into<TaskId>) {
        self.goal = Some(goal.into());
        self.discard_plan();
        self.phase = Phase::Planning;
    }

    /// Forces a re-plan of the current goal from the live state.
    ///
    /// Does nothing if no goal was ever assigned.
    pub fn invalidate(&mut self) {
        if self.goal.is_some() {
            self.discard_plan();
            self.phase = Phase::Planning;
        }
    }

    /// Drops the goal and plan, shutting down the running task immediately.
    pub fn stop<W>(&mut self, agent: EntityId, ctx: ExecutorContext<'_, W>) {
        let mut ctx = ctx;
        self.goal = None;
        self.discard_plan();
        self.phase = Phase::Idle;
        self.shutdown_interrupted(agent, &mut ctx);
    }

    /// Advances the agent by one tick, appending what happened to `events`.
    ///
    /// Planning and execution failures are reported as events; only a
    /// blackboard type error (a broken provider or domain) is returned. In
    /// that case a started task is shut down with
    /// [`ShutdownReason::Failed`], a `TaskFailed` event is emitted and the
    /// agent is left idle with its goal kept.
    pub fn tick<W>(
        &mut self,
        agent: EntityId,
        ctx: ExecutorContext<'_, W>,
        events: &mut Vec<ExecutorEvent>,
    ) -> Result<(), BlackboardError> {
        let mut ctx = ctx;
        self.shutdown_interrupted(agent, &mut ctx);

        self.phase = match mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Idle => Phase::Idle,
            Phase::Planning => self.plan_goal(agent, &mut ctx, events)?,
            Phase::Executing(active) => self.execute(agent, active, &mut ctx, events)?,
        };
        Ok(())
    }

    fn discard_plan(&mut self) {
        if let Phase::Executing(active) = mem::replace(&mut self.phase, Phase::Idle) {
            if active.started {
                if let Some(task) = active.current() {
                    self.interrupted = Some(task.clone());
                }
            }
        }
    }

    fn shutdown_interrupted<W>(&mut self, agent: EntityId, ctx: &mut ExecutorContext<'_, W>) {
        let Some(id) = self.interrupted.take() else {
            return;
        };
        let domain = ctx.domain;
        if let Some(task) = domain.primitive(id.as_str()) {
            shutdown(task, agent, ctx, ShutdownReason::Interrupted);
        }
    }

    fn plan_goal<W>(
        &mut self,
        agent: EntityId,
        ctx: &mut ExecutorContext<'_, W>,
        events: &mut Vec<ExecutorEvent>,
    ) -> Result<Phase, BlackboardError> {
        let Some(goal) = self.goal.clone() else {
            return Ok(Phase::Idle);
        };

        ctx.providers.refresh_all(agent, &*ctx.world, ctx.blackboard)?;

        match ctx.planner.plan(ctx.domain, agent, &goal, ctx.blackboard) {
            Ok(plan) => {
                events.push(ExecutorEvent::PlanFound {
                    agent,
                    goal,
                    tasks: plan.tasks().to_vec(),
                    cost: plan.cost(),
                });
                Ok(Phase::Executing(ActivePlan::new(plan)))
            }
            Err(PlanningError::State(e)) => Err(e),
            Err(error) => {
                if !error.is_budget_exceeded() {
                    debug!(target: "htn::executor", agent = %agent, %error, "goal unachievable");
                }
                events.push(ExecutorEvent::PlanFailed { agent, goal, error });
                Ok(Phase::Idle)
            }
        }
    }

    fn execute<W>(
        &mut self,
        agent: EntityId,
        mut active: ActivePlan,
        ctx: &mut ExecutorContext<'_, W>,
        events: &mut Vec<ExecutorEvent>,
    ) -> Result<Phase, BlackboardError> {
        let domain = ctx.domain;

        let replanned = match self.periodic_replan(agent, &mut active, ctx) {
            Ok(better) => better,
            Err(e) => {
                abandon(&active, agent, ctx, events);
                return Err(e);
            }
        };
        if let Some(better) = replanned {
            if active.started {
                if let Some(task) = active.current().and_then(|id| domain.primitive(id.as_str())) {
                    shutdown(task, agent, ctx, ShutdownReason::BetterPlan);
                }
            }
            debug!(
                target: "htn::executor",
                agent = %agent,
                goal = %better.goal(),
                "switching to better plan"
            );
            events.push(ExecutorEvent::PlanReplaced {
                agent,
                goal: better.goal().clone(),
                tasks: better.tasks().to_vec(),
            });
            active = ActivePlan::new(better);
        }

        let Some(id) = active.current().cloned() else {
            events.push(ExecutorEvent::GoalAchieved {
                agent,
                goal: active.plan.goal().clone(),
            });
            return Ok(Phase::Idle);
        };
        let Some(task) = domain.primitive(id.as_str()) else {
            warn!(target: "htn::executor", agent = %agent, task = %id, "plan references unknown task");
            return Ok(Phase::Planning);
        };

        if !active.started {
            if !task.is_eligible(ctx.blackboard) {
                debug!(target: "htn::executor", agent = %agent, task = %id, "task no longer eligible");
                events.push(ExecutorEvent::TaskFailed {
                    agent,
                    task: id,
                    reason: TaskFailure::Ineligible,
                });
                return Ok(Phase::Planning);
            }

            if task.applies_effects_on_startup() {
                if let Some(step) = active.plan.step(active.cursor) {
                    write_planned(step, ctx.blackboard)?;
                }
            }

            task.operator().startup(&mut operator_context(agent, ctx));
            active.started = true;
            active.cooldowns = vec![0; task.services().len()];
            events.push(ExecutorEvent::TaskStarted {
                agent,
                task: id.clone(),
            });
        }

        if let Err(e) = run_services(task, agent, &mut active.cooldowns, ctx) {
            abandon(&active, agent, ctx, events);
            return Err(e);
        }

        match task.operator().update(&mut operator_context(agent, ctx)) {
            TaskStatus::Running => Ok(Phase::Executing(active)),
            TaskStatus::Success => {
                shutdown(task, agent, ctx, ShutdownReason::Finished);
                task.apply_effects(ctx.blackboard)?;
                events.push(ExecutorEvent::TaskFinished { agent, task: id });

                active.advance();
                if active.cursor >= active.plan.len() {
                    debug!(target: "htn::executor", agent = %agent, goal = %active.plan.goal(), "goal achieved");
                    events.push(ExecutorEvent::GoalAchieved {
                        agent,
                        goal: active.plan.goal().clone(),
                    });
                    Ok(Phase::Idle)
                } else {
                    Ok(Phase::Executing(active))
                }
            }
            TaskStatus::Failure => {
                shutdown(task, agent, ctx, ShutdownReason::Failed);
                debug!(target: "htn::executor", agent = %agent, task = %id, "task failed, replanning");
                events.push(ExecutorEvent::TaskFailed {
                    agent,
                    task: id,
                    reason: TaskFailure::Failed,
                });
                Ok(Phase::Planning)
            }
        }
    }

    /// Re-plans every `replan_interval` ticks and returns the fresh plan if
    /// it ranks above the running one.
    fn periodic_replan<W>(
        &self,
        agent: EntityId,
        active: &mut ActivePlan,
        ctx: &mut ExecutorContext<'_, W>,
    ) -> Result<Option<Plan>, BlackboardError> {
        let Some(interval) = self.config.replan_interval else {
            return Ok(None);
        };
        active.ticks_since_plan += 1;
        if active.ticks_since_plan < interval.max(1) {
            return Ok(None);
        }
        active.ticks_since_plan = 0;

        ctx.providers.refresh_all(agent, &*ctx.world, ctx.blackboard)?;
        match ctx.planner.plan(ctx.domain, agent, active.plan.goal(), ctx.blackboard) {
            Ok(plan) if plan.is_better_than(&active.plan) => Ok(Some(plan)),
            Ok(_) => Ok(None),
            Err(PlanningError::State(e)) => Err(e),
            Err(_) => Ok(None),
        }
    }
}

impl Default for PlanExecutor {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

fn operator_context<'b, W>(
    agent: EntityId,
    ctx: &'b mut ExecutorContext<'_, W>,
) -> OperatorContext<'b, W> {
    OperatorContext {
        agent,
        blackboard: &mut *ctx.blackboard,
        world: &mut *ctx.world,
    }
}

fn shutdown<W>(
    task: &PrimitiveTask<W>,
    agent: EntityId,
    ctx: &mut ExecutorContext<'_, W>,
    reason: ShutdownReason,
) {
    task.operator().shutdown(&mut operator_context(agent, ctx), reason);
}

/// Shuts down the started task of a plan dropped by a blackboard error.
fn abandon<W>(
    active: &ActivePlan,
    agent: EntityId,
    ctx: &mut ExecutorContext<'_, W>,
    events: &mut Vec<ExecutorEvent>,
) {
    if !active.started {
        return;
    }
    let Some(id) = active.current() else {
        return;
    };
    warn!(target: "htn::executor", agent = %agent, task = %id, "blackboard write rejected, abandoning task");
    let domain = ctx.domain;
    if let Some(task) = domain.primitive(id.as_str()) {
        shutdown(task, agent, ctx, ShutdownReason::Failed);
    }
    events.push(ExecutorEvent::TaskFailed {
        agent,
        task: id.clone(),
        reason: TaskFailure::Failed,
    });
}

/// Seeds the live blackboard with the values planned for a step.
fn write_planned(step: &PlannedStep, bb: &mut Blackboard) -> Result<(), BlackboardError> {
    for (key, value) in &step.writes {
        match value {
            Some(value) => {
                bb.set(key.as_str(), *value)?;
            }
            None => {
                bb.clear(key.as_str());
            }
        }
    }
    Ok(())
}

fn run_services<W>(
    task: &PrimitiveTask<W>,
    agent: EntityId,
    cooldowns: &mut [u32],
    ctx: &mut ExecutorContext<'_, W>,
) -> Result<(), BlackboardError> {
    for (service, remaining) in task.services().iter().zip(cooldowns.iter_mut()) {
        if *remaining > 0 {
            *remaining -= 1;
            continue;
        }
        ctx.providers
            .refresh_one(&service.provider, agent, &*ctx.world, ctx.blackboard)?;
        *remaining = service.cooldown;
    }
    Ok(())
}
