use std::io::Write;

use htn::{
    Comparison, Condition, Effect, EntityId, OperatorContext, OperatorRegistry, Planner,
    ProviderRegistry, TaskCost, TaskId, TaskStatus, Value, ValueKind,
};
use htn_content::{ConfigLoader, DomainLoader};
use tempfile::NamedTempFile;

const GUARD_DOMAIN: &str = r#"
(
    keys: {
        "target": Entity,
        "hp": Int,
        "ammo": Int,
        "distance": Float,
        "alert": Flag,
    },
    primitives: [
        (
            id: "shoot",
            operator: "attack",
            preconditions: [
                IsSet("target"),
                Compare(key: "ammo", op: Gt, value: 0.0),
            ],
            effects: [Add("ammo", -1.0)],
            cost: Fixed(2),
        ),
        (
            id: "chase",
            operator: "move_to",
            preconditions: [IsSet("target")],
            effects: [Set("distance", Float(1.0))],
            cost: Scaled(key: "distance", base: 1, per_unit: 1.0),
            services: [(provider: "target", cooldown: 2)],
            apply_effects_on_startup: true,
        ),
        (
            id: "strike",
            operator: "attack",
            preconditions: [Compare(key: "distance", op: Le, value: 1.0)],
        ),
        (
            id: "raise_alarm",
            operator: "wait",
            preconditions: [Not(Equals("alert", Flag(true)))],
            effects: [Set("alert", Flag(true)), Clear("target")],
        ),
    ],
    compounds: [
        (
            id: "engage",
            methods: [
                (name: "ranged", priority: 2, subtasks: ["shoot"]),
                (name: "melee", priority: 1, subtasks: ["chase", "strike"]),
            ],
        ),
        (
            id: "guard",
            methods: [
                (
                    name: "fight",
                    priority: 1,
                    preconditions: [Any([
                        Compare(key: "hp", op: Ge, value: 20.0),
                        Equals("alert", Flag(true)),
                    ])],
                    subtasks: ["engage"],
                ),
                (name: "call_help", subtasks: ["raise_alarm"]),
            ],
        ),
    ],
)
"#;

struct World;

fn succeed(_: &mut OperatorContext<'_, World>) -> TaskStatus {
    TaskStatus::Success
}

fn operators() -> OperatorRegistry<World> {
    OperatorRegistry::new()
        .with("attack", succeed)
        .and_then(|r| r.with("move_to", succeed))
        .and_then(|r| r.with("wait", succeed))
        .unwrap()
}

struct TargetProvider;

impl htn::StateProvider<World> for TargetProvider {
    fn name(&self) -> &'static str {
        "target"
    }

    fn keys(&self) -> &[&'static str] {
        &["target", "distance"]
    }

    fn refresh(
        &self,
        _: EntityId,
        _: &World,
        _: &mut htn::Blackboard,
    ) -> Result<(), htn::BlackboardError> {
        Ok(())
    }
}

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn parses_every_condition_and_effect_form() {
    let spec = DomainLoader::from_str(GUARD_DOMAIN).unwrap();

    assert_eq!(spec.keys.len(), 5);
    assert_eq!(spec.keys["distance"], ValueKind::Float);

    let shoot = &spec.primitives[0];
    assert_eq!(
        shoot.preconditions[1],
        Condition::Compare {
            key: "ammo".into(),
            op: Comparison::Gt,
            value: 0.0,
        }
    );
    assert_eq!(shoot.cost, TaskCost::Fixed(2));

    let chase = &spec.primitives[1];
    assert_eq!(chase.services[0].provider, "target");
    assert_eq!(chase.services[0].cooldown, 2);
    assert!(chase.apply_effects_on_startup);
    assert!(!shoot.apply_effects_on_startup);

    let alarm = &spec.primitives[3];
    assert_eq!(alarm.effects[1], Effect::Clear("target".into()));
    assert_eq!(alarm.cost, TaskCost::Fixed(1));

    let goals: Vec<&str> = spec.goals().map(TaskId::as_str).collect();
    assert_eq!(goals, ["engage", "guard"]);
    assert_eq!(spec.compounds[1].methods[1].priority, 0);
}

#[test]
fn loaded_domain_plans() {
    let file = write_temp(GUARD_DOMAIN);
    let providers = ProviderRegistry::new().with(TargetProvider).unwrap();
    let domain = DomainLoader::load_domain(file.path(), &operators(), &providers).unwrap();

    let mut bb = domain.new_blackboard();
    bb.set("hp", 50i64).unwrap();
    bb.set("target", EntityId(9)).unwrap();
    bb.set("distance", 4.0f32).unwrap();

    let plan = Planner::default()
        .plan(&domain, EntityId(1), &"guard".into(), &bb)
        .unwrap();
    let tasks: Vec<&str> = plan.tasks().iter().map(TaskId::as_str).collect();
    assert_eq!(tasks, ["chase", "strike"]);
    assert_eq!(plan.cost(), 6);

    bb.set("hp", 5i64).unwrap();
    let plan = Planner::default()
        .plan(&domain, EntityId(1), &"guard".into(), &bb)
        .unwrap();
    assert_eq!(plan.tasks(), [TaskId::from("raise_alarm")]);
    assert_eq!(plan.final_state().get("alert"), Some(Value::Flag(true)));
    assert!(!plan.final_state().is_set("target"));
}

#[test]
fn unknown_provider_fails_validation() {
    let file = write_temp(GUARD_DOMAIN);
    let err = DomainLoader::load_domain(file.path(), &operators(), &ProviderRegistry::new())
        .err()
        .unwrap()
        .to_string();

    assert!(err.starts_with("Invalid domain"));
    assert!(err.contains("unknown provider `target`"));
}

#[test]
fn syntax_errors_name_the_file() {
    let file = write_temp("( keys: { \"hp\": Int, ");
    let err = DomainLoader::load(file.path()).unwrap_err().to_string();

    assert!(err.contains(&file.path().display().to_string()));
    assert!(err.contains("Failed to parse domain RON"));
}

#[test]
fn missing_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = ConfigLoader::load(&dir.path().join("absent.toml"))
        .unwrap_err()
        .to_string();
    assert!(err.starts_with("Failed to read file"));
}

#[test]
fn config_file_round_trip() {
    let file = write_temp(
        r#"
max_updates_per_tick = 16

[planner]
max_depth = 12
max_methods = 300
max_plan_cost = 40

[executor]
replan_interval = 4
"#,
    );

    let config = ConfigLoader::load(file.path()).unwrap();
    assert_eq!(config.max_updates_per_tick, 16);
    assert_eq!(config.planner.max_depth, 12);
    assert_eq!(config.planner.max_methods, 300);
    assert_eq!(config.planner.max_plan_cost, Some(40));
    assert_eq!(config.executor.replan_interval, Some(4));
}
