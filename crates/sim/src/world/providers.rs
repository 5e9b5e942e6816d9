//! Blackboard readers for the grid world.

use htn::{Blackboard, BlackboardError, EntityId, ProviderRegistry, StateProvider};

use super::GridWorld;

/// Builds the registry every agent in the sim shares.
pub fn providers() -> Result<ProviderRegistry<GridWorld>, htn::ConfigError> {
    ProviderRegistry::new()
        .with(SelfProvider)?
        .with(TargetProvider)?
        .with(InventoryProvider)
}

/// The agent's own position and health.
pub struct SelfProvider;

impl StateProvider<GridWorld> for SelfProvider {
    fn name(&self) -> &'static str {
        "self"
    }

    fn keys(&self) -> &[&'static str] {
        &["position", "hp"]
    }

    fn refresh(&self, agent: EntityId, world: &GridWorld, bb: &mut Blackboard) -> Result<(), BlackboardError> {
        if let Some(me) = world.actor(agent) {
            bb.set("position", me.position)?;
            bb.set("hp", me.hp)?;
        }
        Ok(())
    }
}

/// The nearest hostile actor.
pub struct TargetProvider;

impl StateProvider<GridWorld> for TargetProvider {
    fn name(&self) -> &'static str {
        "target"
    }

    fn keys(&self) -> &[&'static str] {
        &["target", "target_position", "target_distance"]
    }

    fn refresh(&self, agent: EntityId, world: &GridWorld, bb: &mut Blackboard) -> Result<(), BlackboardError> {
        let (Some(me), Some((id, target))) = (world.actor(agent), world.nearest_hostile(agent)) else {
            return Ok(());
        };
        bb.set("target", id)?;
        bb.set("target_position", target.position)?;
        bb.set("target_distance", i64::from(me.position.distance(target.position)))?;
        Ok(())
    }
}

/// Whether the agent is armed, and the nearest weapon if it is not.
pub struct InventoryProvider;

impl StateProvider<GridWorld> for InventoryProvider {
    fn name(&self) -> &'static str {
        "inventory"
    }

    fn keys(&self) -> &[&'static str] {
        &["armed", "item", "item_position", "item_distance"]
    }

    fn refresh(&self, agent: EntityId, world: &GridWorld, bb: &mut Blackboard) -> Result<(), BlackboardError> {
        let Some(me) = world.actor(agent) else {
            return Ok(());
        };
        bb.set("armed", me.armed)?;
        if me.armed {
            return Ok(());
        }
        if let Some((id, item)) = world.nearest_item(agent) {
            bb.set("item", id)?;
            bb.set("item_position", item.position)?;
            bb.set("item_distance", i64::from(me.position.distance(item.position)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use htn::{KeySchema, Position, Value, ValueKind};

    use super::*;
    use crate::world::{Actor, Faction, Item};

    fn schema() -> Arc<KeySchema> {
        let keys = [
            ("position", ValueKind::Coord),
            ("hp", ValueKind::Int),
            ("target", ValueKind::Entity),
            ("target_position", ValueKind::Coord),
            ("target_distance", ValueKind::Int),
            ("armed", ValueKind::Flag),
            ("item", ValueKind::Entity),
            ("item_position", ValueKind::Coord),
            ("item_distance", ValueKind::Int),
        ];
        let mut schema = KeySchema::new();
        for (key, kind) in keys {
            schema = schema.with(key, kind).unwrap();
        }
        Arc::new(schema)
    }

    fn world() -> GridWorld {
        let mut world = GridWorld {
            width: 10,
            height: 10,
            ..GridWorld::default()
        };
        world.actors.insert(
            EntityId(1),
            Actor {
                position: Position::new(1, 1),
                hp: 8,
                faction: Faction::Guard,
                armed: false,
            },
        );
        world.actors.insert(
            EntityId(2),
            Actor {
                position: Position::new(6, 3),
                hp: 4,
                faction: Faction::Raider,
                armed: false,
            },
        );
        world.items.insert(EntityId(10), Item { position: Position::new(2, 3) });
        world
    }

    #[test]
    fn refresh_fills_every_key() {
        let registry = providers().unwrap();
        let mut bb = Blackboard::new(schema());
        registry.refresh_all(EntityId(1), &world(), &mut bb).unwrap();

        assert_eq!(bb.coord("position"), Some(Position::new(1, 1)));
        assert_eq!(bb.int("hp"), Some(8));
        assert_eq!(bb.entity("target"), Some(EntityId(2)));
        assert_eq!(bb.int("target_distance"), Some(5));
        assert_eq!(bb.flag("armed"), Some(false));
        assert_eq!(bb.get("item"), Some(Value::Entity(EntityId(10))));
        assert_eq!(bb.int("item_distance"), Some(2));
    }

    #[test]
    fn armed_agents_do_not_see_items() {
        let registry = providers().unwrap();
        let mut world = world();
        let mut bb = Blackboard::new(schema());
        registry.refresh_all(EntityId(1), &world, &mut bb).unwrap();

        world.actors.get_mut(&EntityId(1)).unwrap().armed = true;
        world.actors.remove(&EntityId(2));
        registry.refresh_all(EntityId(1), &world, &mut bb).unwrap();

        assert_eq!(bb.flag("armed"), Some(true));
        assert!(!bb.is_set("item"));
        assert!(!bb.is_set("target"));
        assert!(!bb.is_set("target_distance"));
    }
}
