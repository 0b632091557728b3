use handspace_common::EntityId;
use handspace_ports::{LaserLockInfo, LaserParams};

use crate::context::SpatialContext;
use crate::error::ModuleError;
use crate::slots::ResourceSlot;

/// Result of a readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Readiness {
    pub active: bool,
}

impl Readiness {
    pub fn ready() -> Self {
        Self { active: true }
    }

    pub fn not_ready() -> Self {
        Self { active: false }
    }
}

/// Result of an execution step.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunningValues {
    /// False stops the module this tick.
    pub active: bool,
    /// Entities the module is holding or targeting.
    pub targets: Vec<EntityId>,
    /// Where to pin the module's laser end, if anywhere.
    pub laser_lock: Option<LaserLockInfo>,
}

impl RunningValues {
    pub fn running(targets: Vec<EntityId>) -> Self {
        Self {
            active: true,
            targets,
            laser_lock: None,
        }
    }

    pub fn stopped() -> Self {
        Self::default()
    }

    pub fn with_lock(mut self, lock: LaserLockInfo) -> Self {
        self.laser_lock = Some(lock);
        self
    }
}

/// A pluggable behaviour competing for hand, head and mouse slots.
///
/// Modules share no state with each other; everything they learn about the
/// world comes from the [`SpatialContext`] passed to each callback.
pub trait InteractionModule {
    /// Lower values are asked first in the readiness poll.
    fn priority(&self) -> i32;

    /// Slots that must all be free for the module to start; owned while it runs.
    fn required_slots(&self) -> &[ResourceSlot];

    /// The laser shown while this module runs.
    fn hand_laser(&self) -> Option<LaserParams> {
        None
    }

    /// Asked each tick while idle and the required slots are free.
    fn is_ready(&mut self, ctx: &SpatialContext, dt: f32) -> Result<Readiness, ModuleError>;

    /// Called every tick while running, including the tick it started.
    fn execution_step(&mut self, ctx: &SpatialContext, dt: f32)
    -> Result<RunningValues, ModuleError>;
}
