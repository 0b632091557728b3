use glam::{Quat, Vec3};
use handspace_common::EntityId;
use serde::{Deserialize, Serialize};

/// Grab-related properties of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GrabProperties {
    pub grabbable: bool,
    pub grab_kinematic: bool,
    pub grab_follows_controller: bool,
    pub triggerable: bool,
    pub equippable: bool,
    pub grab_delegate_to_parent: bool,
    pub equippable_left_position: Vec3,
    pub equippable_left_rotation: Quat,
    pub equippable_right_position: Vec3,
    pub equippable_right_rotation: Quat,
    pub equippable_indicator_url: String,
    pub equippable_indicator_scale: Vec3,
    pub equippable_indicator_offset: Vec3,
}

impl Default for GrabProperties {
    fn default() -> Self {
        Self {
            grabbable: true,
            grab_kinematic: true,
            grab_follows_controller: true,
            triggerable: false,
            equippable: false,
            grab_delegate_to_parent: true,
            equippable_left_position: Vec3::ZERO,
            equippable_left_rotation: Quat::IDENTITY,
            equippable_right_position: Vec3::ZERO,
            equippable_right_rotation: Quat::IDENTITY,
            equippable_indicator_url: String::new(),
            equippable_indicator_scale: Vec3::ONE,
            equippable_indicator_offset: Vec3::ZERO,
        }
    }
}

/// The fixed property subset fetched for every interaction candidate.
///
/// `distance` is filled in by the context builder: distance from the hand for
/// proximity and near-ray hits, `None` for fallback lookups (hand children and
/// running-module targets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityProperties {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub registration_point: Vec3,
    pub dimensions: Vec3,
    pub gravity: Vec3,
    pub local_position: Vec3,
    pub local_rotation: Quat,
    pub dynamic: bool,
    pub collisionless: bool,
    pub locked: bool,
    pub collides_with: String,
    pub shape_type: String,
    pub parent_id: Option<EntityId>,
    pub parent_joint_index: i32,
    pub density: f32,
    pub href: String,
    pub cloneable: bool,
    pub clone_dynamic: bool,
    pub grab: GrabProperties,
    pub user_data: String,
    pub avatar_entity: bool,
    pub owning_avatar_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl Default for EntityProperties {
    fn default() -> Self {
        Self {
            id: EntityId::from_u128(0),
            name: String::new(),
            entity_type: "Box".into(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            registration_point: Vec3::splat(0.5),
            dimensions: Vec3::splat(0.1),
            gravity: Vec3::ZERO,
            local_position: Vec3::ZERO,
            local_rotation: Quat::IDENTITY,
            dynamic: false,
            collisionless: false,
            locked: false,
            collides_with: "static,dynamic,kinematic,myAvatar,otherAvatar,".into(),
            shape_type: "box".into(),
            parent_id: None,
            parent_joint_index: -1,
            density: 1000.0,
            href: String::new(),
            cloneable: false,
            clone_dynamic: false,
            grab: GrabProperties::default(),
            user_data: String::new(),
            avatar_entity: false,
            owning_avatar_id: None,
            distance: None,
        }
    }
}

impl EntityProperties {
    pub fn new(id: EntityId, name: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            ..Self::default()
        }
    }

    /// Copy of these properties with the distance field set.
    pub fn with_distance(mut self, distance: f32) -> Self {
        self.distance = Some(distance);
        self
    }

    /// Distance used for ordering; fallback entries sort last.
    pub fn sort_distance(&self) -> f32 {
        self.distance.unwrap_or(f32::INFINITY)
    }
}
