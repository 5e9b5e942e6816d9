//! Multi-agent orchestrator.
//!
//! [`NpcSystem`] owns one [`NpcController`] per active agent and advances
//! them from the simulation's tick loop. The domain and provider registry
//! are shared read-only; each agent's blackboard and plan are exclusive to
//! it.

use std::collections::BTreeMap;
use std::sync::Arc;

use htn::{
    BlackboardError, Domain, EntityId, ExecutorContext, ExecutorEvent, ExecutorState, Planner,
    ProviderRegistry, TaskId,
};
use tracing::{debug, error, info};

use crate::config::RuntimeConfig;
use crate::controller::NpcController;
use crate::error::{Result, RuntimeError};

/// Outcome of one [`NpcSystem::update`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Agents advanced this tick, in the order they ran.
    pub updated: Vec<EntityId>,
    /// Events emitted by those agents, in the order they happened.
    pub events: Vec<ExecutorEvent>,
    /// Agents whose tick was cut short by a rejected blackboard write.
    pub failures: Vec<(EntityId, BlackboardError)>,
}

impl TickReport {
    /// Turns the first rejected write into an error.
    ///
    /// A rejected write means a provider or domain is broken, so callers
    /// usually stop the simulation on it once the tick's events are handled.
    pub fn check(&self) -> Result<()> {
        match self.failures.first() {
            Some((agent, source)) => Err(RuntimeError::Blackboard {
                agent: *agent,
                source: source.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Drives every active NPC of a simulation.
pub struct NpcSystem<W> {
    config: RuntimeConfig,
    domain: Arc<Domain<W>>,
    providers: Arc<ProviderRegistry<W>>,
    planner: Planner,
    agents: BTreeMap<EntityId, NpcController>,
    /// First agent to advance on the next tick.
    cursor: Option<EntityId>,
    tick: u64,
}

impl<W> NpcSystem<W> {
    pub fn builder() -> NpcSystemBuilder<W> {
        NpcSystemBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn domain(&self) -> &Arc<Domain<W>> {
        &self.domain
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn is_active(&self, agent: EntityId) -> bool {
        self.agents.contains_key(&agent)
    }

    /// Active agents in ascending id order.
    pub fn agents(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.agents.keys().copied()
    }

    pub fn controller(&self, agent: EntityId) -> Option<&NpcController> {
        self.agents.get(&agent)
    }

    pub fn controller_mut(&mut self, agent: EntityId) -> Option<&mut NpcController> {
        self.agents.get_mut(&agent)
    }

    pub fn state(&self, agent: EntityId) -> Option<ExecutorState> {
        self.agents.get(&agent).map(|c| c.executor.state())
    }

    /// Activates an agent's controller with an empty blackboard and assigns
    /// its first goal. Planning happens on the next [`update`](Self::update).
    pub fn activate(&mut self, agent: EntityId, goal: impl Into<TaskId>) -> Result<()> {
        if self.agents.contains_key(&agent) {
            return Err(RuntimeError::AlreadyActive(agent));
        }
        let goal = self.check_goal(goal.into())?;

        let mut controller =
            NpcController::new(self.domain.new_blackboard(), self.config.executor.clone());
        controller.executor.assign_goal(goal.clone());
        self.agents.insert(agent, controller);

        info!(target: "npc::runtime", agent = %agent, goal = %goal, "agent activated");
        Ok(())
    }

    /// Deactivates an agent: the running task is shut down immediately,
    /// provider-owned keys are reset and the controller is destroyed.
    pub fn deactivate(&mut self, agent: EntityId, world: &mut W) -> Result<()> {
        let mut controller = self
            .agents
            .remove(&agent)
            .ok_or(RuntimeError::UnknownAgent(agent))?;

        let ctx = ExecutorContext {
            domain: &self.domain,
            planner: &self.planner,
            providers: &self.providers,
            blackboard: &mut controller.blackboard,
            world,
        };
        controller.executor.stop(agent, ctx);
        self.providers.reset_all(&mut controller.blackboard);

        if self.cursor == Some(agent) {
            self.cursor = self.agents.range(agent..).next().map(|(id, _)| *id);
        }

        info!(target: "npc::runtime", agent = %agent, "agent deactivated");
        Ok(())
    }

    /// Replaces an agent's goal, discarding its current plan.
    pub fn assign_goal(&mut self, agent: EntityId, goal: impl Into<TaskId>) -> Result<()> {
        let goal = self.check_goal(goal.into())?;
        let controller = self
            .agents
            .get_mut(&agent)
            .ok_or(RuntimeError::UnknownAgent(agent))?;

        debug!(target: "npc::runtime", agent = %agent, goal = %goal, "goal assigned");
        controller.executor.assign_goal(goal);
        Ok(())
    }

    /// Forces an agent to re-plan its goal from the live state.
    pub fn invalidate(&mut self, agent: EntityId) -> Result<()> {
        let controller = self
            .agents
            .get_mut(&agent)
            .ok_or(RuntimeError::UnknownAgent(agent))?;
        controller.executor.invalidate();
        Ok(())
    }

    /// Forces every agent to re-plan (e.g. after a large world change).
    pub fn invalidate_all(&mut self) {
        for controller in self.agents.values_mut() {
            controller.executor.invalidate();
        }
    }

    /// Advances up to `max_updates_per_tick` agents by one tick each.
    ///
    /// Agents run in ascending id order starting from where the previous
    /// tick stopped, wrapping around.
    ///
    /// An agent whose provider or effect writes a key with the wrong kind is
    /// listed in [`TickReport::failures`] and left idle; the rest of the
    /// batch still runs and every event is kept.
    pub fn update(&mut self, world: &mut W) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        let order = self.schedule();
        let budget = self.config.max_updates_per_tick.max(1);
        let (batch, rest) = order.split_at(order.len().min(budget));
        self.cursor = rest.first().or(order.first()).copied();

        for &agent in batch {
            let Some(controller) = self.agents.get_mut(&agent) else {
                continue;
            };
            let ctx = ExecutorContext {
                domain: &self.domain,
                planner: &self.planner,
                providers: &self.providers,
                blackboard: &mut controller.blackboard,
                world: &mut *world,
            };
            match controller.executor.tick(agent, ctx, &mut report.events) {
                Ok(()) => report.updated.push(agent),
                Err(source) => {
                    error!(target: "npc::runtime", agent = %agent, error = %source, "blackboard write rejected");
                    report.failures.push((agent, source));
                }
            }
        }

        debug!(
            target: "npc::runtime",
            tick = self.tick,
            updated = report.updated.len(),
            events = report.events.len(),
            failures = report.failures.len(),
            "tick complete"
        );
        report
    }

    /// All active agents, rotated so the cursor comes first.
    fn schedule(&self) -> Vec<EntityId> {
        let start = self.cursor.unwrap_or_default();
        self.agents
            .range(start..)
            .chain(self.agents.range(..start))
            .map(|(id, _)| *id)
            .collect()
    }

    fn check_goal(&self, goal: TaskId) -> Result<TaskId> {
        if self.domain.compound(goal.as_str()).is_none() {
            return Err(RuntimeError::UnknownGoal(goal));
        }
        Ok(goal)
    }
}

/// Builder for [`NpcSystem`].
pub struct NpcSystemBuilder<W> {
    config: RuntimeConfig,
    domain: Option<Arc<Domain<W>>>,
    providers: Option<Arc<ProviderRegistry<W>>>,
}

impl<W> NpcSystemBuilder<W> {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            domain: None,
            providers: None,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn domain(mut self, domain: Arc<Domain<W>>) -> Self {
        self.domain = Some(domain);
        self
    }

    /// Providers refreshed before each planning pass. Should be the registry
    /// the domain was validated against, so task services resolve.
    pub fn providers(mut self, providers: Arc<ProviderRegistry<W>>) -> Self {
        self.providers = Some(providers);
        self
    }

    pub fn build(self) -> Result<NpcSystem<W>> {
        let domain = self.domain.ok_or(RuntimeError::MissingDomain)?;
        let providers = self
            .providers
            .unwrap_or_else(|| Arc::new(ProviderRegistry::new()));

        Ok(NpcSystem {
            planner: Planner::new(self.config.planner.clone()),
            config: self.config,
            domain,
            providers,
            agents: BTreeMap::new(),
            cursor: None,
            tick: 0,
        })
    }
}

impl<W> Default for NpcSystemBuilder<W> {
    fn default() -> Self {
        Self::new()
    }
}
