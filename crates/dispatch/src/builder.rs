use glam::Vec3;
use handspace_common::{EntityId, Hand};
use handspace_input::HandInputs;
use handspace_ports::{
    EntityProperties, PointerId, PointerManager, Ports, SearchRay, SpatialIndex, TabletIds,
};

use crate::config::DispatcherConfig;
use crate::context::SpatialContext;
use crate::running::RunningSet;

/// Last global enabled state pushed to the ray pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerSwitch {
    #[default]
    Unknown,
    Enabled,
    Disabled,
}

/// Assembles the per-tick [`SpatialContext`].
///
/// Gathering order matters: near ray hits are merged after the proximity
/// query and re-sorted, and fallback lookups (hand children, running
/// targets) only fill ids nothing else produced.
#[derive(Debug, Clone)]
pub struct SpatialContextBuilder {
    near_max_radius: f32,
    near_tablet_max_radius: f32,
    near_grab_pick_radius: f32,
    search_ray_length: f32,
    pointer_switch: PointerSwitch,
}

impl SpatialContextBuilder {
    pub fn new(config: &DispatcherConfig) -> Self {
        Self {
            near_max_radius: config.near_max_radius,
            near_tablet_max_radius: config.near_tablet_max_radius,
            near_grab_pick_radius: config.near_grab_pick_radius,
            search_ray_length: config.search_ray_length,
            pointer_switch: PointerSwitch::Unknown,
        }
    }

    pub fn pointer_switch(&self) -> PointerSwitch {
        self.pointer_switch
    }

    pub fn build(
        &mut self,
        ports: &mut Ports<'_>,
        inputs: HandInputs,
        running: &RunningSet,
        tick: u64,
    ) -> SpatialContext {
        let _span = tracing::debug_span!("build_context", tick).entered();
        let scale = ports.avatar.sensor_to_world_scale();
        let near_radius = self.near_max_radius * scale;
        let tablet = ports.avatar.tablet_ids();

        let mut ctx = SpatialContext {
            tick,
            inputs,
            ..SpatialContext::default()
        };

        for hand in Hand::BOTH {
            ctx.hand_poses[hand.index()] = ports.avatar.hand_pose(hand);
        }

        // Overlays near each hand.
        for hand in Hand::BOTH {
            let pose = ctx.hand_poses[hand.index()];
            if pose.valid {
                ctx.nearby_overlays[hand.index()] =
                    self.nearby_overlays(ports.spatial, hand, pose.position(), scale, &tablet);
            }
        }

        // Entities near each hand.
        for hand in Hand::BOTH {
            let pose = ctx.hand_poses[hand.index()];
            if !pose.valid {
                continue;
            }
            let origin = pose.position();
            for id in ports.spatial.find_entities(origin, near_radius) {
                let Some(props) = ports.spatial.entity_properties(id) else {
                    continue;
                };
                let distance = props.position.distance(origin);
                let props = props.with_distance(distance);
                ctx.properties_by_id.insert(id, props.clone());
                ctx.nearby_entities[hand.index()].push(props);
            }
        }

        self.sync_pointer_switch(ports.avatar.hmd_active(), ports.pointers);

        // Ray picks; a primary hit very close to the hand counts as nearby.
        let near_pick_radius = self.near_grab_pick_radius * scale;
        for hand in Hand::BOTH {
            let pose = ctx.hand_poses[hand.index()];
            if !pose.valid {
                continue;
            }
            let mut pick = ports.rays.latest_hit(PointerId::primary(hand));
            pick.search_ray = Some(SearchRay {
                origin: pose.position(),
                direction: pose.up(),
                length: self.search_ray_length,
            });
            ctx.hud_ray_picks[hand.index()] = ports.rays.latest_hit(PointerId::hud(hand));

            if let Some(id) = pick.entity_id() {
                if pick.distance < near_pick_radius {
                    if let Some(props) = ports.spatial.entity_properties(id) {
                        let list = &mut ctx.nearby_entities[hand.index()];
                        let kept = merge_nearby(list, props.with_distance(pick.distance));
                        ctx.properties_by_id.insert(id, kept);
                    }
                }
            }
            ctx.ray_picks[hand.index()] = pick;

            ctx.nearby_entities[hand.index()]
                .sort_by(|a, b| a.sort_distance().total_cmp(&b.sort_distance()));
        }
        ctx.mouse_ray_pick = ports.rays.latest_hit(PointerId::Mouse);

        // Held items can fall outside the search sphere during a snap turn.
        for hand in Hand::BOTH {
            for id in ports.spatial.hand_children(hand) {
                fill_missing(&mut ctx, ports.spatial, id);
            }
        }

        // Running modules can always refresh what they already hold.
        for id in running.all_targets() {
            fill_missing(&mut ctx, ports.spatial, id);
        }

        tracing::trace!(
            left = ctx.nearby_entities[0].len(),
            right = ctx.nearby_entities[1].len(),
            known = ctx.properties_by_id.len(),
            "context built"
        );
        ctx
    }

    /// Overlay ids within the coarse radius, with the tablet surfaces filtered
    /// through the tight radius. Closest first.
    fn nearby_overlays(
        &self,
        spatial: &dyn SpatialIndex,
        hand: Hand,
        origin: Vec3,
        scale: f32,
        tablet: &TabletIds,
    ) -> Vec<EntityId> {
        let mut ids = spatial.find_overlays(origin, self.near_max_radius * scale);

        let found = |target: Option<EntityId>, ids: &[EntityId]| {
            target.filter(|t| ids.contains(t))
        };
        let tablet_hit = found(tablet.tablet, &ids);
        let mini_hit = found(tablet.mini_tablet, &ids);

        if tablet_hit.is_some() || mini_hit.is_some() {
            let close = spatial.find_overlays(origin, self.near_tablet_max_radius * scale);
            if let Some(id) = tablet_hit {
                if !close.contains(&id) {
                    ids.retain(|o| *o != id);
                }
            }
            if let Some(id) = mini_hit {
                if !close.contains(&id) || tablet.mini_tablet_hand != Some(hand) {
                    ids.retain(|o| *o != id);
                }
            }
        }

        let mut keyed: Vec<(f32, EntityId)> = ids
            .into_iter()
            .map(|id| {
                let d = spatial
                    .position(id)
                    .map_or(f32::INFINITY, |p| p.distance(origin));
                (d, id)
            })
            .collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    /// Push the global pointer state only when the HMD state changes.
    fn sync_pointer_switch(&mut self, hmd_active: bool, pointers: &mut dyn PointerManager) {
        let wanted = if hmd_active {
            PointerSwitch::Enabled
        } else {
            PointerSwitch::Disabled
        };
        if self.pointer_switch == wanted {
            return;
        }
        for pointer in PointerId::ALL {
            pointers.set_pointer_enabled(pointer, hmd_active);
        }
        tracing::debug!(hmd_active, previous = ?self.pointer_switch, "ray pointers toggled");
        self.pointer_switch = wanted;
    }
}

/// Add `props` to a hand's list, keeping the closer entry if the id is already
/// there. Returns the entry that was kept.
fn merge_nearby(list: &mut Vec<EntityProperties>, props: EntityProperties) -> EntityProperties {
    match list.iter_mut().find(|p| p.id == props.id) {
        Some(existing) => {
            if props.sort_distance() < existing.sort_distance() {
                *existing = props;
            }
            existing.clone()
        }
        None => {
            list.push(props.clone());
            props
        }
    }
}

fn fill_missing(ctx: &mut SpatialContext, spatial: &dyn SpatialIndex, id: EntityId) {
    if ctx.properties_by_id.contains_key(&id) {
        return;
    }
    if let Some(props) = spatial.entity_properties(id) {
        ctx.properties_by_id.insert(id, props);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;
    use handspace_common::HandPose;
    use handspace_ports::RayPick;
    use handspace_scene::{RecordingPointers, SimScene};

    fn props(n: u128, pos: Vec3) -> EntityProperties {
        EntityProperties::new(EntityId::from_u128(n), format!("obj{n}"), pos)
    }

    fn build_with(
        builder: &mut SpatialContextBuilder,
        scene: &SimScene,
        pointers: &mut RecordingPointers,
        running: &RunningSet,
    ) -> SpatialContext {
        let mut ports = Ports {
            spatial: scene,
            rays: scene,
            avatar: scene,
            pointers,
        };
        builder.build(&mut ports, HandInputs::default(), running, 1)
    }

    fn build(scene: &SimScene) -> SpatialContext {
        let mut builder = SpatialContextBuilder::new(&DispatcherConfig::default());
        build_with(&mut builder, scene, &mut RecordingPointers::new(), &RunningSet::new())
    }

    fn left_hand_at_origin(scene: &mut SimScene) {
        scene.set_hand_pose(Hand::Left, HandPose::at(Vec3::ZERO, Quat::IDENTITY));
    }

    #[test]
    fn nearby_entities_sorted_with_distances() {
        let mut scene = SimScene::new();
        left_hand_at_origin(&mut scene);
        scene.spawn(props(1, Vec3::new(0.08, 0.0, 0.0)));
        scene.spawn(props(2, Vec3::new(0.02, 0.0, 0.0)));
        scene.spawn(props(3, Vec3::new(0.5, 0.0, 0.0)));

        let ctx = build(&scene);
        let near = ctx.nearby_entities(Hand::Left);
        assert_eq!(near.len(), 2);
        assert_eq!(near[0].id, EntityId::from_u128(2));
        assert!((near[0].distance.unwrap() - 0.02).abs() < 1e-5);
        assert!((near[1].distance.unwrap() - 0.08).abs() < 1e-5);
        assert!(ctx.properties(EntityId::from_u128(1)).is_some());
        assert!(ctx.properties(EntityId::from_u128(3)).is_none());
    }

    #[test]
    fn invalid_hand_gets_nothing() {
        let mut scene = SimScene::new();
        scene.spawn(props(1, Vec3::ZERO));
        scene.set_ray_hit(
            PointerId::LeftHand,
            RayPick::entity(EntityId::from_u128(1), 0.1, Vec3::ZERO),
        );

        let ctx = build(&scene);
        assert!(ctx.nearby_entities(Hand::Left).is_empty());
        assert!(ctx.nearby_overlays(Hand::Left).is_empty());
        assert!(!ctx.ray_pick(Hand::Left).is_hit());
        assert_eq!(scene.ray_queries(PointerId::LeftHand), 0);
        assert_eq!(scene.ray_queries(PointerId::Mouse), 1);
    }

    #[test]
    fn radius_scales_with_avatar() {
        let mut scene = SimScene::new();
        left_hand_at_origin(&mut scene);
        scene.spawn(props(1, Vec3::new(0.15, 0.0, 0.0)));
        assert!(build(&scene).nearby_entities(Hand::Left).is_empty());

        scene.set_sensor_scale(2.0);
        assert_eq!(build(&scene).nearby_entities(Hand::Left).len(), 1);
    }

    #[test]
    fn tablet_needs_tight_radius() {
        let mut scene = SimScene::new();
        left_hand_at_origin(&mut scene);
        let tablet = scene.spawn_overlay(props(10, Vec3::new(0.08, 0.0, 0.0)));
        let button = scene.spawn_overlay(props(11, Vec3::new(0.09, 0.0, 0.0)));
        scene.set_tablet_ids(TabletIds {
            tablet: Some(tablet),
            ..TabletIds::default()
        });

        assert_eq!(build(&scene).nearby_overlays(Hand::Left), &[button]);

        scene.move_to(tablet, Vec3::new(0.03, 0.0, 0.0));
        assert_eq!(build(&scene).nearby_overlays(Hand::Left), &[tablet, button]);
    }

    #[test]
    fn mini_tablet_only_for_its_hand() {
        let mut scene = SimScene::new();
        left_hand_at_origin(&mut scene);
        let mini = scene.spawn_overlay(props(12, Vec3::new(0.01, 0.0, 0.0)));
        scene.set_tablet_ids(TabletIds {
            mini_tablet: Some(mini),
            mini_tablet_hand: Some(Hand::Right),
            ..TabletIds::default()
        });
        assert!(build(&scene).nearby_overlays(Hand::Left).is_empty());

        scene.set_tablet_ids(TabletIds {
            mini_tablet: Some(mini),
            mini_tablet_hand: Some(Hand::Left),
            ..TabletIds::default()
        });
        assert_eq!(build(&scene).nearby_overlays(Hand::Left), &[mini]);
    }

    #[test]
    fn near_ray_hit_joins_nearby_without_duplicates() {
        let mut scene = SimScene::new();
        left_hand_at_origin(&mut scene);
        let close = scene.spawn(props(1, Vec3::new(0.05, 0.0, 0.0)));
        let ray_only = scene.spawn(props(2, Vec3::new(0.0, 0.2, 0.0)));

        scene.set_ray_hit(PointerId::LeftHand, RayPick::entity(ray_only, 0.2, Vec3::ZERO));
        let ctx = build(&scene);
        let ids: Vec<_> = ctx.nearby_entities(Hand::Left).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![close, ray_only]);

        scene.set_ray_hit(PointerId::LeftHand, RayPick::entity(close, 0.04, Vec3::ZERO));
        let ctx = build(&scene);
        let near = ctx.nearby_entities(Hand::Left);
        assert_eq!(near.len(), 1);
        assert!((near[0].distance.unwrap() - 0.04).abs() < 1e-5);
    }

    #[test]
    fn far_ray_hit_stays_out_of_nearby() {
        let mut scene = SimScene::new();
        left_hand_at_origin(&mut scene);
        let far = scene.spawn(props(1, Vec3::new(0.0, 3.0, 0.0)));
        scene.set_ray_hit(PointerId::LeftHand, RayPick::entity(far, 3.0, Vec3::ZERO));

        let ctx = build(&scene);
        assert!(ctx.nearby_entities(Hand::Left).is_empty());
        assert_eq!(ctx.ray_pick(Hand::Left).entity_id(), Some(far));
        let ray = ctx.ray_pick(Hand::Left).search_ray.unwrap();
        assert_eq!(ray.direction, Vec3::Y);
        assert_eq!(ray.length, 1000.0);
    }

    #[test]
    fn running_targets_and_hand_children_are_resolvable() {
        let mut scene = SimScene::new();
        left_hand_at_origin(&mut scene);
        let held = scene.spawn(props(1, Vec3::new(4.0, 0.0, 0.0)));
        let target = scene.spawn(props(2, Vec3::new(9.0, 0.0, 0.0)));
        scene.attach_to_hand(held, Some(Hand::Left));

        let mut running = RunningSet::new();
        running.insert("farGrab", None);
        running.set_targets("farGrab", vec![target, EntityId::from_u128(99)]);

        let mut builder = SpatialContextBuilder::new(&DispatcherConfig::default());
        let ctx = build_with(&mut builder, &scene, &mut RecordingPointers::new(), &running);
        assert!(ctx.properties(held).is_some());
        assert!(ctx.properties(target).is_some());
        assert!(ctx.properties(EntityId::from_u128(99)).is_none());
        assert!(ctx.nearby_entities(Hand::Left).is_empty());
    }

    #[test]
    fn pointer_switch_toggles_on_edges_only() {
        let mut scene = SimScene::new();
        let mut pointers = RecordingPointers::new();
        let running = RunningSet::new();
        let mut builder = SpatialContextBuilder::new(&DispatcherConfig::default());
        assert_eq!(builder.pointer_switch(), PointerSwitch::Unknown);

        build_with(&mut builder, &scene, &mut pointers, &running);
        assert_eq!(pointers.toggle_count(), PointerId::ALL.len());
        assert_eq!(pointers.is_enabled(PointerId::Mouse), Some(false));

        build_with(&mut builder, &scene, &mut pointers, &running);
        assert_eq!(pointers.toggle_count(), PointerId::ALL.len());

        scene.set_hmd_active(true);
        build_with(&mut builder, &scene, &mut pointers, &running);
        assert_eq!(pointers.toggle_count(), 2 * PointerId::ALL.len());
        assert_eq!(builder.pointer_switch(), PointerSwitch::Enabled);
        assert_eq!(pointers.is_enabled(PointerId::LeftHand), Some(true));
    }
}
