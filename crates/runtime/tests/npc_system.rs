use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use htn::builder::{compare, set};
use htn::{
    Blackboard, BlackboardError, Comparison, CompoundTask, Domain, EntityId, ExecutorEvent,
    ExecutorState, Method, Operator, OperatorContext, OperatorRegistry, PrimitiveSpec,
    ProviderRegistry, ShutdownReason, StateProvider, TaskStatus, ValueKind,
};
use npc_runtime::{NpcSystem, RuntimeConfig, RuntimeError};

#[derive(Default)]
struct Arena {
    positions: BTreeMap<EntityId, i64>,
    /// Agents whose position sensor reports garbage.
    jammed: BTreeSet<EntityId>,
    log: Vec<String>,
}

struct Step;

impl Operator<Arena> for Step {
    fn update(&self, ctx: &mut OperatorContext<'_, Arena>) -> TaskStatus {
        *ctx.world.positions.entry(ctx.agent).or_default() += 1;
        TaskStatus::Success
    }
}

struct Loiter;

impl Operator<Arena> for Loiter {
    fn update(&self, _: &mut OperatorContext<'_, Arena>) -> TaskStatus {
        TaskStatus::Running
    }

    fn shutdown(&self, ctx: &mut OperatorContext<'_, Arena>, reason: ShutdownReason) {
        ctx.world.log.push(format!("{} stop loiter {reason}", ctx.agent));
    }
}

struct SelfProvider;

impl StateProvider<Arena> for SelfProvider {
    fn name(&self) -> &'static str {
        "self"
    }

    fn keys(&self) -> &[&'static str] {
        &["x"]
    }

    fn refresh(&self, agent: EntityId, world: &Arena, bb: &mut Blackboard) -> Result<(), BlackboardError> {
        if world.jammed.contains(&agent) {
            bb.set("x", true)?;
        } else if let Some(&x) = world.positions.get(&agent) {
            bb.set("x", x)?;
        }
        Ok(())
    }
}

fn system(config: RuntimeConfig) -> NpcSystem<Arena> {
    let operators = OperatorRegistry::new()
        .with("step", Step)
        .and_then(|r| r.with("loiter", Loiter))
        .unwrap();
    let providers = ProviderRegistry::new().with(SelfProvider).unwrap();

    let domain = Domain::builder()
        .key("x", ValueKind::Int)
        .key("moved", ValueKind::Flag)
        .primitive_spec(
            PrimitiveSpec::new("step_right", "step")
                .when(compare("x", Comparison::Lt, 10.0))
                .effect(set("moved", true)),
        )
        .primitive_spec(PrimitiveSpec::new("loiter", "loiter"))
        .compound(CompoundTask::new("advance").method(Method::new("step", ["step_right"])))
        .compound(CompoundTask::new("hang_around").method(Method::new("idle", ["loiter"])))
        .build_with(&operators, &providers)
        .unwrap();

    NpcSystem::builder()
        .config(config)
        .domain(Arc::new(domain))
        .providers(Arc::new(providers))
        .build()
        .unwrap()
}

#[test]
fn budget_rotates_through_agents() {
    let mut npcs = system(RuntimeConfig::new().with_max_updates_per_tick(2));
    let mut arena = Arena::default();
    for id in 1..=5 {
        npcs.activate(EntityId(id), "hang_around").unwrap();
    }

    let order: Vec<Vec<u32>> = (0..4)
        .map(|_| {
            npcs.update(&mut arena)
                .updated
                .iter()
                .map(|id| id.0)
                .collect()
        })
        .collect();

    assert_eq!(order, [vec![1, 2], vec![3, 4], vec![5, 1], vec![2, 3]]);
    assert_eq!(npcs.tick(), 4);
}

#[test]
fn agents_plan_and_act_independently() {
    let mut npcs = system(RuntimeConfig::default());
    let mut arena = Arena::default();
    arena.positions.insert(EntityId(1), 3);
    arena.positions.insert(EntityId(2), 12);

    npcs.activate(EntityId(1), "advance").unwrap();
    npcs.activate(EntityId(2), "advance").unwrap();

    let report = npcs.update(&mut arena);
    assert_eq!(report.updated, [EntityId(1), EntityId(2)]);
    assert!(matches!(
        report.events.as_slice(),
        [
            ExecutorEvent::PlanFound { agent: EntityId(1), .. },
            ExecutorEvent::PlanFailed { agent: EntityId(2), .. },
        ]
    ));
    assert_eq!(npcs.state(EntityId(2)), Some(ExecutorState::Idle));

    let report = npcs.update(&mut arena);
    assert!(report.events.iter().all(|e| e.agent() == EntityId(1)));
    assert!(matches!(
        report.events.last(),
        Some(ExecutorEvent::GoalAchieved { .. })
    ));
    assert_eq!(arena.positions[&EntityId(1)], 4);
    assert_eq!(arena.positions[&EntityId(2)], 12);

    let bb = npcs.controller(EntityId(1)).unwrap().blackboard();
    assert_eq!(bb.flag("moved"), Some(true));
    assert_eq!(bb.int("x"), Some(3));
}

#[test]
fn deactivation_shuts_down_and_forgets_agent() {
    let mut npcs = system(RuntimeConfig::default());
    let mut arena = Arena::default();
    npcs.activate(EntityId(3), "hang_around").unwrap();
    npcs.update(&mut arena);
    npcs.update(&mut arena);

    npcs.deactivate(EntityId(3), &mut arena).unwrap();

    assert!(!npcs.is_active(EntityId(3)));
    assert_eq!(arena.log, ["#3 stop loiter interrupted"]);
    assert_eq!(
        npcs.deactivate(EntityId(3), &mut arena),
        Err(RuntimeError::UnknownAgent(EntityId(3)))
    );

    // Reactivation starts from an empty blackboard.
    npcs.activate(EntityId(3), "advance").unwrap();
    assert!(npcs.controller(EntityId(3)).unwrap().blackboard().is_empty());
}

#[test]
fn goal_change_takes_effect_next_tick() {
    let mut npcs = system(RuntimeConfig::default());
    let mut arena = Arena::default();
    arena.positions.insert(EntityId(1), 0);
    npcs.activate(EntityId(1), "hang_around").unwrap();
    npcs.update(&mut arena);
    npcs.update(&mut arena);

    npcs.assign_goal(EntityId(1), "advance").unwrap();
    assert_eq!(npcs.state(EntityId(1)), Some(ExecutorState::Planning));
    assert!(arena.log.is_empty());

    let report = npcs.update(&mut arena);
    assert_eq!(arena.log, ["#1 stop loiter interrupted"]);
    assert!(matches!(
        report.events.as_slice(),
        [ExecutorEvent::PlanFound { .. }]
    ));
}

#[test]
fn api_misuse_is_reported() {
    let mut npcs = system(RuntimeConfig::default());
    npcs.activate(EntityId(1), "advance").unwrap();

    assert_eq!(
        npcs.activate(EntityId(1), "advance"),
        Err(RuntimeError::AlreadyActive(EntityId(1)))
    );
    assert_eq!(
        npcs.activate(EntityId(2), "dance"),
        Err(RuntimeError::UnknownGoal("dance".into()))
    );
    assert_eq!(
        npcs.activate(EntityId(2), "loiter"),
        Err(RuntimeError::UnknownGoal("loiter".into()))
    );
    assert_eq!(
        npcs.invalidate(EntityId(9)),
        Err(RuntimeError::UnknownAgent(EntityId(9)))
    );
    assert_eq!(
        NpcSystem::<Arena>::builder().build().err(),
        Some(RuntimeError::MissingDomain)
    );
}

#[test]
fn rejected_write_keeps_the_rest_of_the_tick() {
    let mut npcs = system(RuntimeConfig::default());
    let mut arena = Arena::default();
    arena.positions.insert(EntityId(1), 0);
    arena.positions.insert(EntityId(2), 0);
    arena.jammed.insert(EntityId(1));

    npcs.activate(EntityId(1), "advance").unwrap();
    npcs.activate(EntityId(2), "advance").unwrap();

    let report = npcs.update(&mut arena);
    assert_eq!(report.updated, [EntityId(2)]);
    assert!(matches!(
        report.failures.as_slice(),
        [(EntityId(1), BlackboardError::TypeMismatch { .. })]
    ));
    assert!(matches!(
        report.events.as_slice(),
        [ExecutorEvent::PlanFound { agent: EntityId(2), .. }]
    ));
    assert!(matches!(
        report.check(),
        Err(RuntimeError::Blackboard { agent: EntityId(1), .. })
    ));

    let report = npcs.update(&mut arena);
    assert!(report.check().is_ok());
    assert!(matches!(
        report.events.last(),
        Some(ExecutorEvent::GoalAchieved { agent: EntityId(2), .. })
    ));
}
