//! Scenario files: the starting layout of a grid world.
//!
//! A scenario places actors and items and names the goal each actor's NPC
//! controller starts with. Actors without a goal are part of the world but
//! are never activated.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use htn::{EntityId, Position};
use serde::{Deserialize, Serialize};

use super::{Actor, Faction, GridWorld, Item};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorSpec {
    pub id: EntityId,
    pub position: Position,
    pub hp: i64,
    pub faction: Faction,
    #[serde(default)]
    pub armed: bool,
    #[serde(default)]
    pub goal: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub id: EntityId,
    pub position: Position,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub width: i32,
    pub height: i32,
    pub actors: Vec<ActorSpec>,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        Self::from_str(&content).with_context(|| format!("Invalid scenario {}", path.display()))
    }

    pub fn from_str(content: &str) -> Result<Self> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse scenario RON: {}", e))
    }

    /// Agents to activate, in id order, with their starting goals.
    pub fn goals(&self) -> BTreeMap<EntityId, &str> {
        self.actors
            .iter()
            .filter_map(|a| a.goal.as_deref().map(|goal| (a.id, goal)))
            .collect()
    }

    /// Builds the initial world.
    ///
    /// # Errors
    ///
    /// Fails on duplicate ids or on placements outside the grid.
    pub fn into_world(&self) -> Result<GridWorld> {
        let mut world = GridWorld {
            width: self.width,
            height: self.height,
            ..GridWorld::default()
        };

        for spec in &self.actors {
            check_placement(&world, spec.id, spec.position)?;
            world.actors.insert(
                spec.id,
                Actor {
                    position: spec.position,
                    hp: spec.hp,
                    faction: spec.faction,
                    armed: spec.armed,
                },
            );
        }
        for spec in &self.items {
            check_placement(&world, spec.id, spec.position)?;
            world.items.insert(spec.id, Item { position: spec.position });
        }

        tracing::info!(
            target: "htn_sim",
            actors = world.actors.len(),
            items = world.items.len(),
            "world created"
        );
        Ok(world)
    }
}

fn check_placement(world: &GridWorld, id: EntityId, position: Position) -> Result<()> {
    if world.actors.contains_key(&id) || world.items.contains_key(&id) {
        bail!("duplicate entity id {id}");
    }
    if !world.in_bounds(position) {
        bail!("entity {id} at {position} is outside the {}x{} grid", world.width, world.height);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
(
    width: 6,
    height: 4,
    actors: [
        (id: 1, position: (x: 0, y: 0), hp: 10, faction: Guard, goal: Some("guard")),
        (id: 2, position: (x: 5, y: 3), hp: 4, faction: Raider),
    ],
    items: [(id: 7, position: (x: 2, y: 1))],
)
"#;

    #[test]
    fn parses_and_builds_world() {
        let scenario = Scenario::from_str(SMALL).unwrap();
        assert_eq!(scenario.goals(), BTreeMap::from([(EntityId(1), "guard")]));

        let world = scenario.into_world().unwrap();
        assert_eq!(world.actors.len(), 2);
        assert_eq!(world.actors[&EntityId(2)].faction, Faction::Raider);
        assert!(!world.actors[&EntityId(2)].armed);
        assert_eq!(world.items[&EntityId(7)].position, Position::new(2, 1));
    }

    #[test]
    fn rejects_bad_placements() {
        let mut scenario = Scenario::from_str(SMALL).unwrap();
        scenario.items[0].id = EntityId(2);
        let err = scenario.into_world().unwrap_err().to_string();
        assert_eq!(err, "duplicate entity id #2");

        let mut scenario = Scenario::from_str(SMALL).unwrap();
        scenario.actors[1].position = Position::new(6, 0);
        let err = scenario.into_world().unwrap_err().to_string();
        assert_eq!(err, "entity #2 at (6, 0) is outside the 6x4 grid");
    }
}
