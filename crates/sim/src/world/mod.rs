//! A small grid world used as the planning core's collaborator.
//!
//! Guards and raiders stand on a grid; weapons lie on the floor. Movement is
//! one 8-way step per tick in a straight line, with no obstacles.

pub mod operators;
pub mod providers;
pub mod scenario;

use std::collections::BTreeMap;

use htn::{EntityId, Position};

pub use operators::operators;
pub use providers::providers;
pub use scenario::{ActorSpec, ItemSpec, Scenario};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[derive(serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "snake_case")]
pub enum Faction {
    Guard,
    Raider,
}

impl Faction {
    pub fn is_hostile_to(self, other: Faction) -> bool {
        self != other
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Actor {
    pub position: Position,
    pub hp: i64,
    pub faction: Faction,
    pub armed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    pub position: Position,
}

#[derive(Clone, Debug, Default)]
pub struct GridWorld {
    pub width: i32,
    pub height: i32,
    pub actors: BTreeMap<EntityId, Actor>,
    pub items: BTreeMap<EntityId, Item>,
}

impl GridWorld {
    pub fn actor(&self, id: EntityId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Nearest living actor hostile to `agent`; ties go to the lowest id.
    pub fn nearest_hostile(&self, agent: EntityId) -> Option<(EntityId, &Actor)> {
        let me = self.actor(agent)?;
        self.actors
            .iter()
            .filter(|(id, other)| **id != agent && other.faction.is_hostile_to(me.faction))
            .min_by_key(|(id, other)| (me.position.distance(other.position), **id))
            .map(|(id, other)| (*id, other))
    }

    /// Nearest item on the floor; ties go to the lowest id.
    pub fn nearest_item(&self, agent: EntityId) -> Option<(EntityId, &Item)> {
        let me = self.actor(agent)?;
        self.items
            .iter()
            .min_by_key(|(id, item)| (me.position.distance(item.position), **id))
            .map(|(id, item)| (*id, item))
    }

    /// True once no two remaining actors are hostile to each other.
    pub fn is_settled(&self) -> bool {
        let mut factions = self.actors.values().map(|a| a.faction);
        match factions.next() {
            Some(first) => factions.all(|f| !f.is_hostile_to(first)),
            None => true,
        }
    }

    pub fn in_bounds(&self, position: Position) -> bool {
        (0..self.width).contains(&position.x) && (0..self.height).contains(&position.y)
    }
}

/// One 8-way step from `from` toward `to`.
pub fn step_toward(from: Position, to: Position) -> Position {
    Position::new(
        from.x + (to.x - from.x).signum(),
        from.y + (to.y - from.y).signum(),
    )
}
