use glam::Vec3;
use handspace_common::{EntityId, Hand};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The named ray pointers the dispatcher owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PointerId {
    LeftHand,
    RightHand,
    LeftHud,
    RightHud,
    Mouse,
}

impl PointerId {
    pub const ALL: [PointerId; 5] = [
        PointerId::LeftHand,
        PointerId::RightHand,
        PointerId::LeftHud,
        PointerId::RightHud,
        PointerId::Mouse,
    ];

    /// Pointers subject to the hand-laser delay setting.
    pub const HAND_LASERS: [PointerId; 4] = [
        PointerId::LeftHand,
        PointerId::RightHand,
        PointerId::LeftHud,
        PointerId::RightHud,
    ];

    pub fn primary(hand: Hand) -> Self {
        match hand {
            Hand::Left => PointerId::LeftHand,
            Hand::Right => PointerId::RightHand,
        }
    }

    /// The hand a hand-laser pointer belongs to; `None` for HUD and mouse pointers.
    pub fn laser_hand(self) -> Option<Hand> {
        match self {
            PointerId::LeftHand => Some(Hand::Left),
            PointerId::RightHand => Some(Hand::Right),
            _ => None,
        }
    }

    pub fn hud(hand: Hand) -> Self {
        match hand {
            Hand::Left => PointerId::LeftHud,
            Hand::Right => PointerId::RightHud,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PointerId::LeftHand => "leftHand",
            PointerId::RightHand => "rightHand",
            PointerId::LeftHud => "leftHud",
            PointerId::RightHud => "rightHud",
            PointerId::Mouse => "mouse",
        }
    }
}

impl fmt::Display for PointerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Mouse button reported with a pointer press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MouseButton {
    Primary,
    Secondary,
    Tertiary,
}

/// A press or release delivered through one of the named pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerEvent {
    pub pointer: PointerId,
    pub button: MouseButton,
}

impl PointerEvent {
    pub fn primary(pointer: PointerId) -> Self {
        Self {
            pointer,
            button: MouseButton::Primary,
        }
    }
}

/// What a pick ray intersected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PickKind {
    #[default]
    None,
    Entity,
    LocalEntity,
    Avatar,
    Hud,
}

/// The ray a hand's primary pointer searches along.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchRay {
    pub origin: Vec3,
    pub direction: Vec3,
    pub length: f32,
}

/// Most recent result of a named ray pointer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RayPick {
    pub kind: PickKind,
    pub object_id: Option<EntityId>,
    pub distance: f32,
    pub intersection: Vec3,
    /// Attached by the context builder for valid hands.
    pub search_ray: Option<SearchRay>,
}

impl RayPick {
    /// A pick that hit nothing.
    pub fn miss() -> Self {
        Self::default()
    }

    pub fn entity(id: EntityId, distance: f32, intersection: Vec3) -> Self {
        Self {
            kind: PickKind::Entity,
            object_id: Some(id),
            distance,
            intersection,
            search_ray: None,
        }
    }

    pub fn is_hit(&self) -> bool {
        self.kind != PickKind::None
    }

    /// The hit entity id when the pick intersected a (non-local) entity.
    pub fn entity_id(&self) -> Option<EntityId> {
        match self.kind {
            PickKind::Entity => self.object_id,
            _ => None,
        }
    }
}

/// The laser a module wants shown while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaserParams {
    pub hand: Hand,
    pub always_on: bool,
}

impl LaserParams {
    pub fn for_hand(hand: Hand) -> Self {
        Self {
            hand,
            always_on: false,
        }
    }
}

/// Pins a laser's end point to a target while a module holds it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaserLockInfo {
    pub target_id: EntityId,
    pub is_overlay: bool,
    pub hand: Hand,
    pub offset: Vec3,
}
