//! Operators the grid world exposes to domain files, by name:
//!
//! | Name | Effect in the world |
//! |------|---------------------|
//! | `move_to_target` | step toward `target_position` until adjacent |
//! | `move_to_item` | step onto `item_position` |
//! | `attack` | hit `target` every tick until it dies |
//! | `pick_up` | take `item` from the agent's tile |
//! | `wait` | do nothing for one tick |

use htn::{Operator, OperatorContext, OperatorRegistry, ShutdownReason, TaskStatus};
use tracing::{debug, info};

use super::{GridWorld, step_toward};

pub type Context<'a> = OperatorContext<'a, GridWorld>;

/// Builds the registry used to resolve operator names in domain files.
pub fn operators() -> Result<OperatorRegistry<GridWorld>, htn::ConfigError> {
    OperatorRegistry::new()
        .with(
            "move_to_target",
            MoveTo {
                destination: "target_position",
                stop_within: 1,
            },
        )?
        .with(
            "move_to_item",
            MoveTo {
                destination: "item_position",
                stop_within: 0,
            },
        )?
        .with("attack", Attack)?
        .with("pick_up", PickUp)?
        .with("wait", wait)
}

/// Walks toward the coordinate stored under `destination`.
pub struct MoveTo {
    pub destination: &'static str,
    pub stop_within: u32,
}

impl Operator<GridWorld> for MoveTo {
    fn update(&self, ctx: &mut Context<'_>) -> TaskStatus {
        let Some(destination) = ctx.blackboard.coord(self.destination) else {
            return TaskStatus::Failure;
        };
        let GridWorld { actors, .. } = &mut *ctx.world;
        let Some(actor) = actors.get_mut(&ctx.agent) else {
            return TaskStatus::Failure;
        };

        if actor.position.distance(destination) > self.stop_within {
            actor.position = step_toward(actor.position, destination);
            debug!(target: "htn_sim", agent = %ctx.agent, to = %actor.position, "moved");
        }

        if actor.position.distance(destination) <= self.stop_within {
            TaskStatus::Success
        } else {
            TaskStatus::Running
        }
    }
}

/// Melee attack on `target`. Armed actors hit for 3, others for 1.
pub struct Attack;

impl Operator<GridWorld> for Attack {
    fn update(&self, ctx: &mut Context<'_>) -> TaskStatus {
        let Some(target) = ctx.blackboard.entity("target") else {
            return TaskStatus::Failure;
        };
        let Some(attacker) = ctx.world.actor(ctx.agent).cloned() else {
            return TaskStatus::Failure;
        };
        let Some(victim) = ctx.world.actors.get_mut(&target) else {
            return TaskStatus::Failure;
        };
        if attacker.position.distance(victim.position) > 1 {
            return TaskStatus::Failure;
        }

        victim.hp -= if attacker.armed { 3 } else { 1 };
        if victim.hp > 0 {
            return TaskStatus::Running;
        }

        ctx.world.actors.remove(&target);
        info!(target: "htn_sim", agent = %ctx.agent, victim = %target, "defeated");
        TaskStatus::Success
    }

    fn shutdown(&self, ctx: &mut Context<'_>, reason: ShutdownReason) {
        if reason == ShutdownReason::Interrupted {
            debug!(target: "htn_sim", agent = %ctx.agent, "attack broken off");
        }
    }
}

/// Takes the item under the agent and arms it.
pub struct PickUp;

impl Operator<GridWorld> for PickUp {
    fn update(&self, ctx: &mut Context<'_>) -> TaskStatus {
        let Some(item) = ctx.blackboard.entity("item") else {
            return TaskStatus::Failure;
        };
        let GridWorld { actors, items, .. } = &mut *ctx.world;
        let (Some(actor), Some(found)) = (actors.get_mut(&ctx.agent), items.get(&item)) else {
            return TaskStatus::Failure;
        };
        if actor.position != found.position {
            return TaskStatus::Failure;
        }

        items.remove(&item);
        actor.armed = true;
        info!(target: "htn_sim", agent = %ctx.agent, item = %item, "picked up weapon");
        TaskStatus::Success
    }
}

fn wait(_: &mut Context<'_>) -> TaskStatus {
    TaskStatus::Success
}
