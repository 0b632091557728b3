use glam::Vec3;
use handspace_common::{EntityId, Hand, HandPose};

use crate::pick::{LaserLockInfo, LaserParams, PointerId, RayPick};
use crate::properties::EntityProperties;

/// Proximity and property queries against the client's scene.
pub trait SpatialIndex {
    /// Entity ids whose position lies within `radius` of `center`, in any order.
    fn find_entities(&self, center: Vec3, radius: f32) -> Vec<EntityId>;

    /// Local entity (overlay) ids within `radius` of `center`, in any order.
    fn find_overlays(&self, center: Vec3, radius: f32) -> Vec<EntityId>;

    /// The dispatcher's property subset for `id`, or `None` if it no longer exists.
    fn entity_properties(&self, id: EntityId) -> Option<EntityProperties>;

    fn position(&self, id: EntityId) -> Option<Vec3> {
        self.entity_properties(id).map(|p| p.position)
    }

    /// Entities parented to the avatar's joints for `hand` (hand, controller and
    /// camera-relative controller joints).
    fn hand_children(&self, hand: Hand) -> Vec<EntityId>;
}

/// Latest results of the client's ray pointers.
pub trait RaycastProvider {
    fn latest_hit(&self, pointer: PointerId) -> RayPick;
}

/// Ids of the tablet UI surfaces, as currently reported by the display layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TabletIds {
    pub tablet: Option<EntityId>,
    pub tablet_screen: Option<EntityId>,
    pub home_button: Option<EntityId>,
    pub home_button_highlight: Option<EntityId>,
    pub mini_tablet: Option<EntityId>,
    /// The only hand allowed to reach the mini tablet.
    pub mini_tablet_hand: Option<Hand>,
}

/// Read-only avatar and display state, sampled each tick.
pub trait AvatarProvider {
    fn hand_pose(&self, hand: Hand) -> HandPose;

    fn sensor_to_world_scale(&self) -> f32;

    fn hmd_active(&self) -> bool;

    /// The local avatar's session id; control messages from anyone else are ignored.
    fn session_id(&self) -> EntityId;

    fn tablet_ids(&self) -> TabletIds;

    /// Index and thumb tip poses for hand-tracking pinch detection.
    fn finger_tips(&self, _hand: Hand) -> Option<(HandPose, HandPose)> {
        None
    }
}

/// Pointer and laser rendering layer, plus the outbound feedback the
/// dispatcher emits (haptics, local messages). The only collaborator the
/// dispatcher mutates.
pub trait PointerManager {
    fn set_pointer_enabled(&mut self, pointer: PointerId, enabled: bool);

    fn set_ignore_items(&mut self, pointer: PointerId, ids: &[EntityId]);

    fn set_laser_visible(&mut self, laser: LaserParams, visible: bool);

    /// `None` unlocks the laser end.
    fn lock_pointer_end(&mut self, laser: LaserParams, lock: Option<&LaserLockInfo>);

    /// Per-tick trigger state used to pick laser render states.
    fn update_render_state(&mut self, trigger_clicks: [bool; 2], trigger_values: [f32; 2]);

    fn set_delay(&mut self, pointer: PointerId, delay: f32);

    /// Remove every pointer created for the dispatcher.
    fn remove_pointers(&mut self);

    fn trigger_haptic_pulse(&mut self, hand: Hand, strength: f32, duration_ms: f32);

    /// Send a message to scripts on this client only.
    fn send_local_message(&mut self, channel: &str, data: &str);
}

/// The collaborators one tick works against.
pub struct Ports<'a> {
    pub spatial: &'a dyn SpatialIndex,
    pub rays: &'a dyn RaycastProvider,
    pub avatar: &'a dyn AvatarProvider,
    pub pointers: &'a mut dyn PointerManager,
}
