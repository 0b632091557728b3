use glam::Vec3;
use handspace_common::{EntityId, Hand, HandPose};
use handspace_ports::{
    AvatarProvider, EntityProperties, PointerId, RayPick, RaycastProvider, SpatialIndex, TabletIds,
};
use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};

use crate::grid::SpatialGrid;

/// Default bucket size for proximity queries (meters).
const CELL_SIZE: f32 = 0.5;

/// Whether an object is a domain entity or a local entity (overlay).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Entity,
    Overlay,
}

#[derive(Debug, Clone)]
struct SceneObject {
    props: EntityProperties,
    kind: ObjectKind,
    attached_to: Option<Hand>,
}

/// In-memory scene: entities, overlays, avatar state and scripted ray hits.
///
/// Uses BTreeMap for deterministic iteration order. Raycast lookups are
/// counted per pointer so callers can assert which rays were consulted.
#[derive(Debug)]
pub struct SimScene {
    objects: BTreeMap<EntityId, SceneObject>,
    entity_grid: SpatialGrid,
    overlay_grid: SpatialGrid,
    poses: [HandPose; 2],
    finger_tips: [Option<(HandPose, HandPose)>; 2],
    scale: f32,
    hmd_active: bool,
    session_id: EntityId,
    tablet: TabletIds,
    hits: BTreeMap<PointerId, RayPick>,
    ray_queries: [Cell<usize>; 5],
}

impl Default for SimScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SimScene {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            entity_grid: SpatialGrid::new(CELL_SIZE),
            overlay_grid: SpatialGrid::new(CELL_SIZE),
            poses: [HandPose::invalid(); 2],
            finger_tips: [None; 2],
            scale: 1.0,
            hmd_active: false,
            session_id: EntityId::new(),
            tablet: TabletIds::default(),
            hits: BTreeMap::new(),
            ray_queries: Default::default(),
        }
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Add a domain entity. The id inside `props` is kept.
    pub fn spawn(&mut self, props: EntityProperties) -> EntityId {
        self.insert(props, ObjectKind::Entity)
    }

    /// Add a local entity (overlay), e.g. a tablet surface.
    pub fn spawn_overlay(&mut self, props: EntityProperties) -> EntityId {
        self.insert(props, ObjectKind::Overlay)
    }

    fn insert(&mut self, props: EntityProperties, kind: ObjectKind) -> EntityId {
        let id = props.id;
        if self.objects.contains_key(&id) {
            self.despawn(id);
        }
        self.grid_mut(kind).insert(id, props.position);
        tracing::trace!(%id, ?kind, "scene object added");
        self.objects.insert(
            id,
            SceneObject {
                props,
                kind,
                attached_to: None,
            },
        );
        id
    }

    fn grid_mut(&mut self, kind: ObjectKind) -> &mut SpatialGrid {
        match kind {
            ObjectKind::Entity => &mut self.entity_grid,
            ObjectKind::Overlay => &mut self.overlay_grid,
        }
    }

    /// Remove an object. Returns its properties if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityProperties> {
        let obj = self.objects.remove(&id)?;
        self.grid_mut(obj.kind).remove(id, obj.props.position);
        Some(obj.props)
    }

    pub fn move_to(&mut self, id: EntityId, position: Vec3) -> bool {
        let Some(obj) = self.objects.get(&id) else {
            return false;
        };
        let (kind, old) = (obj.kind, obj.props.position);
        let grid = self.grid_mut(kind);
        grid.remove(id, old);
        grid.insert(id, position);
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.props.position = position;
        }
        true
    }

    /// Parent an entity to a hand joint (or detach with `None`).
    pub fn attach_to_hand(&mut self, id: EntityId, hand: Option<Hand>) -> bool {
        match self.objects.get_mut(&id) {
            Some(obj) => {
                obj.attached_to = hand;
                true
            }
            None => false,
        }
    }

    pub fn set_hand_pose(&mut self, hand: Hand, pose: HandPose) {
        self.poses[hand.index()] = pose;
    }

    pub fn set_finger_tips(&mut self, hand: Hand, tips: Option<(HandPose, HandPose)>) {
        self.finger_tips[hand.index()] = tips;
    }

    pub fn set_sensor_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    pub fn set_hmd_active(&mut self, active: bool) {
        self.hmd_active = active;
    }

    pub fn set_session_id(&mut self, id: EntityId) {
        self.session_id = id;
    }

    pub fn set_tablet_ids(&mut self, tablet: TabletIds) {
        self.tablet = tablet;
    }

    pub fn set_ray_hit(&mut self, pointer: PointerId, pick: RayPick) {
        self.hits.insert(pointer, pick);
    }

    pub fn clear_ray_hits(&mut self) {
        self.hits.clear();
    }

    /// How many times `pointer`'s latest hit has been read.
    pub fn ray_queries(&self, pointer: PointerId) -> usize {
        self.ray_queries[pointer_slot(pointer)].get()
    }

    fn find_in(&self, kind: ObjectKind, center: Vec3, radius: f32) -> Vec<EntityId> {
        let grid = match kind {
            ObjectKind::Entity => &self.entity_grid,
            ObjectKind::Overlay => &self.overlay_grid,
        };
        let found: BTreeSet<EntityId> = grid
            .candidates(center, radius)
            .into_iter()
            .filter(|id| {
                self.objects
                    .get(id)
                    .is_some_and(|o| o.props.position.distance(center) <= radius)
            })
            .collect();
        found.into_iter().collect()
    }
}

fn pointer_slot(pointer: PointerId) -> usize {
    match pointer {
        PointerId::LeftHand => 0,
        PointerId::RightHand => 1,
        PointerId::LeftHud => 2,
        PointerId::RightHud => 3,
        PointerId::Mouse => 4,
    }
}

impl SpatialIndex for SimScene {
    fn find_entities(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.find_in(ObjectKind::Entity, center, radius)
    }

    fn find_overlays(&self, center: Vec3, radius: f32) -> Vec<EntityId> {
        self.find_in(ObjectKind::Overlay, center, radius)
    }

    fn entity_properties(&self, id: EntityId) -> Option<EntityProperties> {
        self.objects.get(&id).map(|o| o.props.clone())
    }

    fn hand_children(&self, hand: Hand) -> Vec<EntityId> {
        self.objects
            .iter()
            .filter(|(_, o)| o.kind == ObjectKind::Entity && o.attached_to == Some(hand))
            .map(|(id, _)| *id)
            .collect()
    }
}

impl RaycastProvider for SimScene {
    fn latest_hit(&self, pointer: PointerId) -> RayPick {
        let counter = &self.ray_queries[pointer_slot(pointer)];
        counter.set(counter.get() + 1);
        self.hits.get(&pointer).copied().unwrap_or_default()
    }
}

impl AvatarProvider for SimScene {
    fn hand_pose(&self, hand: Hand) -> HandPose {
        self.poses[hand.index()]
    }

    fn sensor_to_world_scale(&self) -> f32 {
        self.scale
    }

    fn hmd_active(&self) -> bool {
        self.hmd_active
    }

    fn session_id(&self) -> EntityId {
        self.session_id
    }

    fn tablet_ids(&self) -> TabletIds {
        self.tablet
    }

    fn finger_tips(&self, hand: Hand) -> Option<(HandPose, HandPose)> {
        self.finger_tips[hand.index()]
    }
}
