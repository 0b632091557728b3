use handspace_common::{EntityId, Hand, HandPose};
use handspace_input::HandInputs;
use handspace_ports::{EntityProperties, RayPick};
use std::collections::BTreeMap;

/// Everything modules may know about the current frame.
///
/// Built once per tick by [`SpatialContextBuilder`](crate::SpatialContextBuilder)
/// and shared read-only with every callback of that tick.
#[derive(Debug, Clone, Default)]
pub struct SpatialContext {
    pub(crate) tick: u64,
    pub(crate) inputs: HandInputs,
    pub(crate) hand_poses: [HandPose; 2],
    pub(crate) nearby_entities: [Vec<EntityProperties>; 2],
    pub(crate) properties_by_id: BTreeMap<EntityId, EntityProperties>,
    pub(crate) nearby_overlays: [Vec<EntityId>; 2],
    pub(crate) ray_picks: [RayPick; 2],
    pub(crate) hud_ray_picks: [RayPick; 2],
    pub(crate) mouse_ray_pick: RayPick,
}

impl SpatialContext {
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn inputs(&self) -> &HandInputs {
        &self.inputs
    }

    pub fn trigger_value(&self, hand: Hand) -> f32 {
        self.inputs.trigger_value(hand)
    }

    pub fn trigger_clicked(&self, hand: Hand) -> bool {
        self.inputs.trigger_clicked(hand)
    }

    pub fn secondary_value(&self, hand: Hand) -> f32 {
        self.inputs.secondary_value(hand)
    }

    pub fn hand_pose(&self, hand: Hand) -> &HandPose {
        &self.hand_poses[hand.index()]
    }

    /// Candidates near `hand`, closest first.
    pub fn nearby_entities(&self, hand: Hand) -> &[EntityProperties] {
        &self.nearby_entities[hand.index()]
    }

    /// Nearby overlays for `hand`, closest first.
    pub fn nearby_overlays(&self, hand: Hand) -> &[EntityId] {
        &self.nearby_overlays[hand.index()]
    }

    /// Properties of any entity gathered this tick: nearby candidates, near
    /// ray hits, hand children and running modules' targets.
    pub fn properties(&self, id: EntityId) -> Option<&EntityProperties> {
        self.properties_by_id.get(&id)
    }

    pub fn properties_by_id(&self) -> &BTreeMap<EntityId, EntityProperties> {
        &self.properties_by_id
    }

    pub fn ray_pick(&self, hand: Hand) -> &RayPick {
        &self.ray_picks[hand.index()]
    }

    pub fn hud_ray_pick(&self, hand: Hand) -> &RayPick {
        &self.hud_ray_picks[hand.index()]
    }

    pub fn mouse_ray_pick(&self) -> &RayPick {
        &self.mouse_ray_pick
    }
}
