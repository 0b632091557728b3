use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an entity, local entity (overlay) or avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Deterministic id, mostly useful for fixtures and scripted scenes.
    pub const fn from_u128(v: u128) -> Self {
        Self(Uuid::from_u128(v))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0)
    }
}

/// One of the two tracked hands.
///
/// Serialized as the wire index (`0` left, `1` right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    /// Both hands, left first. Per-hand arrays are indexed in this order.
    pub const BOTH: [Hand; 2] = [Hand::Left, Hand::Right];

    pub const fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }

    pub const fn from_index(index: usize) -> Option<Hand> {
        match index {
            0 => Some(Hand::Left),
            1 => Some(Hand::Right),
            _ => None,
        }
    }

    pub const fn other(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Hand {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index() as u8)
    }
}

impl<'de> Deserialize<'de> for Hand {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u8::deserialize(deserializer)?;
        Hand::from_index(raw as usize)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid hand index {raw}")))
    }
}

/// Spatial transform: position, rotation, scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// World-space pose of a controller or tracked joint, sampled once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HandPose {
    /// False when the device is not tracked this frame.
    pub valid: bool,
    pub transform: Transform,
}

impl HandPose {
    pub fn invalid() -> Self {
        Self::default()
    }

    pub fn at(position: Vec3, rotation: Quat) -> Self {
        Self {
            valid: true,
            transform: Transform {
                position,
                rotation,
                scale: Vec3::ONE,
            },
        }
    }

    pub fn position(&self) -> Vec3 {
        self.transform.position
    }

    pub fn orientation(&self) -> Quat {
        self.transform.rotation
    }

    /// The pose's local +Y axis in world space. Controller search rays point this way.
    pub fn up(&self) -> Vec3 {
        self.transform.rotation * Vec3::Y
    }
}
