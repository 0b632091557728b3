//! Small interaction modules used by the scripted session.

use handspace_common::{EntityId, Hand};
use handspace_dispatch::{
    InteractionModule, ModuleError, Readiness, ResourceSlot, RunningValues, SpatialContext,
};
use handspace_ports::{LaserLockInfo, LaserParams, PickKind};

const TRIGGER_ON: f32 = 0.1;
const SECONDARY_ON: f32 = 0.9;

/// Grabs the closest grabbable entity while the trigger is clicked.
pub struct NearGrab {
    hand: Hand,
    slots: [ResourceSlot; 1],
    held: Option<EntityId>,
}

impl NearGrab {
    pub fn new(hand: Hand) -> Self {
        Self {
            hand,
            slots: [ResourceSlot::hand(hand)],
            held: None,
        }
    }
}

impl InteractionModule for NearGrab {
    fn priority(&self) -> i32 {
        5
    }

    fn required_slots(&self) -> &[ResourceSlot] {
        &self.slots
    }

    fn is_ready(&mut self, ctx: &SpatialContext, _dt: f32) -> Result<Readiness, ModuleError> {
        if !ctx.trigger_clicked(self.hand) {
            return Ok(Readiness::not_ready());
        }
        self.held = ctx
            .nearby_entities(self.hand)
            .iter()
            .find(|p| p.grab.grabbable && !p.locked)
            .map(|p| p.id);
        Ok(Readiness {
            active: self.held.is_some(),
        })
    }

    fn execution_step(
        &mut self,
        ctx: &SpatialContext,
        _dt: f32,
    ) -> Result<RunningValues, ModuleError> {
        let Some(id) = self.held else {
            return Ok(RunningValues::stopped());
        };
        if !ctx.trigger_clicked(self.hand) || ctx.properties(id).is_none() {
            self.held = None;
            return Ok(RunningValues::stopped());
        }
        Ok(RunningValues::running(vec![id]))
    }
}

/// Equips the closest equippable entity on a full secondary press.
pub struct Equip {
    hand: Hand,
    slots: [ResourceSlot; 2],
    equipped: Option<EntityId>,
}

impl Equip {
    pub fn new(hand: Hand) -> Self {
        Self {
            hand,
            slots: [ResourceSlot::hand(hand), ResourceSlot::hand_equip(hand)],
            equipped: None,
        }
    }
}

impl InteractionModule for Equip {
    fn priority(&self) -> i32 {
        6
    }

    fn required_slots(&self) -> &[ResourceSlot] {
        &self.slots
    }

    fn is_ready(&mut self, ctx: &SpatialContext, _dt: f32) -> Result<Readiness, ModuleError> {
        if ctx.secondary_value(self.hand) < SECONDARY_ON {
            return Ok(Readiness::not_ready());
        }
        self.equipped = ctx
            .nearby_entities(self.hand)
            .iter()
            .find(|p| p.grab.equippable)
            .map(|p| p.id);
        Ok(Readiness {
            active: self.equipped.is_some(),
        })
    }

    fn execution_step(
        &mut self,
        ctx: &SpatialContext,
        _dt: f32,
    ) -> Result<RunningValues, ModuleError> {
        let Some(id) = self.equipped else {
            return Ok(RunningValues::stopped());
        };
        // A second full press with the trigger held unequips.
        if ctx.trigger_clicked(self.hand) && ctx.secondary_value(self.hand) >= SECONDARY_ON {
            self.equipped = None;
            return Ok(RunningValues::stopped());
        }
        Ok(RunningValues::running(vec![id]))
    }
}

/// Points the hand laser at a distant entity and pins its end while the trigger is squeezed.
pub struct FarLaser {
    hand: Hand,
    slots: [ResourceSlot; 1],
    target: Option<EntityId>,
}

impl FarLaser {
    pub fn new(hand: Hand) -> Self {
        Self {
            hand,
            slots: [ResourceSlot::hand(hand)],
            target: None,
        }
    }
}

impl InteractionModule for FarLaser {
    fn priority(&self) -> i32 {
        20
    }

    fn required_slots(&self) -> &[ResourceSlot] {
        &self.slots
    }

    fn hand_laser(&self) -> Option<LaserParams> {
        Some(LaserParams::for_hand(self.hand))
    }

    fn is_ready(&mut self, ctx: &SpatialContext, _dt: f32) -> Result<Readiness, ModuleError> {
        self.target = None;
        if ctx.trigger_value(self.hand) < TRIGGER_ON {
            return Ok(Readiness::not_ready());
        }
        self.target = ctx.ray_pick(self.hand).entity_id();
        Ok(Readiness {
            active: self.target.is_some(),
        })
    }

    fn execution_step(
        &mut self,
        ctx: &SpatialContext,
        _dt: f32,
    ) -> Result<RunningValues, ModuleError> {
        let Some(id) = self.target else {
            return Ok(RunningValues::stopped());
        };
        if ctx.trigger_value(self.hand) < TRIGGER_ON {
            self.target = None;
            return Ok(RunningValues::stopped());
        }
        let pick = ctx.ray_pick(self.hand);
        let offset = ctx
            .properties(id)
            .map(|p| pick.intersection - p.position)
            .unwrap_or_default();
        let lock = LaserLockInfo {
            target_id: id,
            is_overlay: false,
            hand: self.hand,
            offset,
        };
        Ok(RunningValues::running(vec![id]).with_lock(lock))
    }
}

/// Tracks whatever the mouse ray is over.
#[derive(Default)]
pub struct MouseHover {
    hovered: Option<EntityId>,
}

impl InteractionModule for MouseHover {
    fn priority(&self) -> i32 {
        30
    }

    fn required_slots(&self) -> &[ResourceSlot] {
        &[ResourceSlot::Mouse]
    }

    fn is_ready(&mut self, ctx: &SpatialContext, _dt: f32) -> Result<Readiness, ModuleError> {
        let pick = ctx.mouse_ray_pick();
        self.hovered = match pick.kind {
            PickKind::Entity | PickKind::LocalEntity => pick.object_id,
            _ => None,
        };
        Ok(Readiness {
            active: self.hovered.is_some(),
        })
    }

    fn execution_step(
        &mut self,
        ctx: &SpatialContext,
        _dt: f32,
    ) -> Result<RunningValues, ModuleError> {
        let current = ctx.mouse_ray_pick().object_id;
        match (self.hovered, current) {
            (Some(hovered), Some(id)) if hovered == id => Ok(RunningValues::running(vec![id])),
            _ => {
                self.hovered = None;
                Ok(RunningValues::stopped())
            }
        }
    }
}
