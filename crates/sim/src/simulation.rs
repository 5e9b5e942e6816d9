//! A grid world paired with the NPC system that drives it.

use std::sync::Arc;

use anyhow::Result;
use htn::{Domain, EntityId, ExecutorEvent, ProviderRegistry};
use npc_runtime::{NpcSystem, RuntimeConfig, TickReport};
use tracing::info;

use crate::world::{GridWorld, Scenario};

pub struct Simulation {
    world: GridWorld,
    npcs: NpcSystem<GridWorld>,
}

impl Simulation {
    /// Builds the world from `scenario` and activates every actor that has
    /// a goal.
    pub fn new(
        domain: Arc<Domain<GridWorld>>,
        providers: Arc<ProviderRegistry<GridWorld>>,
        config: RuntimeConfig,
        scenario: &Scenario,
    ) -> Result<Self> {
        let world = scenario.into_world()?;
        let mut npcs = NpcSystem::builder()
            .config(config)
            .domain(domain)
            .providers(providers)
            .build()?;

        for (agent, goal) in scenario.goals() {
            npcs.activate(agent, goal)?;
        }

        Ok(Self { world, npcs })
    }

    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    pub fn npcs(&self) -> &NpcSystem<GridWorld> {
        &self.npcs
    }

    pub fn tick(&self) -> u64 {
        self.npcs.tick()
    }

    pub fn is_settled(&self) -> bool {
        self.world.is_settled()
    }

    /// Advances the world by one tick.
    ///
    /// Agents that achieved their goal start over on it. When an actor dies
    /// its controller is removed and every survivor re-plans. A rejected
    /// blackboard write fails the step once the tick's events are handled.
    pub fn step(&mut self) -> Result<TickReport> {
        let population = self.world.actors.len();
        let report = self.npcs.update(&mut self.world);

        for event in &report.events {
            if let ExecutorEvent::GoalAchieved { agent, .. } = event {
                self.npcs.invalidate(*agent)?;
            }
        }

        if self.world.actors.len() < population {
            let fallen: Vec<EntityId> = self
                .npcs
                .agents()
                .filter(|agent| self.world.actor(*agent).is_none())
                .collect();
            for agent in fallen {
                self.npcs.deactivate(agent, &mut self.world)?;
                info!(target: "htn_sim", agent = %agent, tick = report.tick, "agent fell");
            }
            self.npcs.invalidate_all();
        }

        report.check()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use htn::{ExecutorState, TaskId};
    use htn_content::{ConfigLoader, DomainLoader};

    use super::*;
    use crate::world::{Faction, operators, providers};

    fn data(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join(file)
    }

    fn skirmish() -> Simulation {
        let providers = providers().unwrap();
        let operators = operators().unwrap();
        let domain = DomainLoader::load_domain(&data("guard.ron"), &operators, &providers).unwrap();
        let config = ConfigLoader::load(&data("config.toml")).unwrap();
        let scenario = Scenario::load(&data("skirmish.ron")).unwrap();
        Simulation::new(Arc::new(domain), Arc::new(providers), config, &scenario).unwrap()
    }

    #[test]
    fn first_tick_plans_for_everyone() {
        let mut sim = skirmish();
        let report = sim.step().unwrap();

        let plans: Vec<(u32, Vec<&str>)> = report
            .events
            .iter()
            .filter_map(|event| match event {
                ExecutorEvent::PlanFound { agent, tasks, .. } => {
                    Some((agent.0, tasks.iter().map(TaskId::as_str).collect()))
                }
                _ => None,
            })
            .collect();

        assert_eq!(
            plans,
            [
                (1, vec!["fetch_weapon", "pick_up_weapon", "approach_target", "strike"]),
                (2, vec!["approach_target", "strike"]),
                (3, vec!["approach_target", "strike"]),
                (4, vec!["approach_target", "strike"]),
            ]
        );
        assert!(sim.npcs().agents().all(|a| sim.npcs().state(a) == Some(ExecutorState::Executing)));
    }

    #[test]
    fn skirmish_ends_with_one_faction_standing() {
        let mut sim = skirmish();
        while !sim.is_settled() && sim.tick() < 300 {
            sim.step().unwrap();
        }

        assert!(sim.is_settled(), "still fighting after {} ticks", sim.tick());
        assert!(sim.world().items.is_empty());
        assert_eq!(sim.npcs().len(), sim.world().actors.len());

        let survivors: Vec<Faction> = sim.world().actors.values().map(|a| a.faction).collect();
        assert!(!survivors.is_empty());
    }
}
