//! Typed values stored on the blackboard.
//!
//! Every blackboard key holds exactly one [`ValueKind`] for its whole lifetime.
//! "Unset" is not a value: an unset key is simply absent and reads back as
//! `None`, so a zero entity id or a `false` flag never collides with it.

use std::fmt;

/// Unique identifier for any entity known to the simulation.
///
/// Agents are entities too; the same id addresses an agent's controller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discrete grid position expressed in tile coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: the number of 8-way steps between two tiles.
    pub fn distance(self, other: Position) -> u32 {
        let dx = (self.x - other.x).unsigned_abs();
        let dy = (self.y - other.y).unsigned_abs();
        dx.max(dy)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The canonical type of a blackboard key.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ValueKind {
    Entity,
    Int,
    Float,
    Flag,
    Coord,
}

impl ValueKind {
    /// Returns true for kinds that support ordering comparisons and deltas.
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

/// A typed blackboard value.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Entity(EntityId),
    Int(i64),
    Float(f32),
    Flag(bool),
    Coord(Position),
}

impl Value {
    pub const fn kind(&self) -> ValueKind {
        match self {
            Value::Entity(_) => ValueKind::Entity,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Flag(_) => ValueKind::Flag,
            Value::Coord(_) => ValueKind::Coord,
        }
    }

    /// Numeric view used by comparisons and costs; `None` for non-numeric kinds.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Int(v) => Some(v as f64),
            Value::Float(v) => Some(f64::from(v)),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityId> {
        match *self {
            Value::Entity(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match *self {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match *self {
            Value::Flag(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_coord(&self) -> Option<Position> {
        match *self {
            Value::Coord(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Entity(id) => write!(f, "{id}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Flag(v) => write!(f, "{v}"),
            Value::Coord(p) => write!(f, "{p}"),
        }
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::Entity(id)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Flag(v)
    }
}

impl From<Position> for Value {
    fn from(p: Position) -> Self {
        Value::Coord(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(Value::Entity(EntityId(0)).kind(), ValueKind::Entity);
        assert_eq!(Value::Int(0).kind(), ValueKind::Int);
        assert_eq!(Value::Float(0.0).kind(), ValueKind::Float);
        assert_eq!(Value::Flag(false).kind(), ValueKind::Flag);
        assert_eq!(Value::Coord(Position::ORIGIN).kind(), ValueKind::Coord);
    }

    #[test]
    fn numeric_view_only_for_numbers() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(Value::Flag(true).as_f64(), None);
        assert!(!ValueKind::Coord.is_numeric());
    }

    #[test]
    fn kind_parses_from_snake_case() {
        assert_eq!("coord".parse::<ValueKind>().unwrap(), ValueKind::Coord);
        assert_eq!("Entity".parse::<ValueKind>().unwrap(), ValueKind::Entity);
        assert!("vector".parse::<ValueKind>().is_err());
    }

    #[test]
    fn chebyshev_distance() {
        assert_eq!(Position::new(0, 0).distance(Position::new(3, -2)), 3);
        assert_eq!(Position::new(1, 1).distance(Position::new(1, 1)), 0);
    }
}
