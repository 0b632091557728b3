//! Scriptable module for scheduler tests.

use handspace_common::EntityId;
use handspace_ports::{LaserLockInfo, LaserParams};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::context::SpatialContext;
use crate::error::ModuleError;
use crate::module::{InteractionModule, Readiness, RunningValues};
use crate::slots::ResourceSlot;

/// Shared controls and call counters for one [`ScriptedModule`].
#[derive(Debug, Default)]
pub struct Script {
    pub ready: Cell<bool>,
    pub active: Cell<bool>,
    pub targets: RefCell<Vec<EntityId>>,
    pub lock: Cell<Option<LaserLockInfo>>,
    pub fail_ready: Cell<bool>,
    pub panic_ready: Cell<bool>,
    pub fail_step: Cell<bool>,
    pub panic_step: Cell<bool>,
    pub ready_calls: Cell<usize>,
    pub step_calls: Cell<usize>,
    /// Tick numbers seen by the execution step.
    pub step_ticks: RefCell<Vec<u64>>,
}

impl Script {
    pub fn set_ready(&self, ready: bool) {
        self.ready.set(ready);
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    pub fn set_targets(&self, targets: Vec<EntityId>) {
        *self.targets.borrow_mut() = targets;
    }
}

#[derive(Debug)]
pub struct ScriptedModule {
    priority: i32,
    slots: Vec<ResourceSlot>,
    laser: Option<LaserParams>,
    script: Rc<Script>,
}

impl ScriptedModule {
    /// A module that is ready and stays active until told otherwise.
    pub fn new(priority: i32, slots: &[ResourceSlot]) -> (Self, Rc<Script>) {
        let script = Rc::new(Script::default());
        script.ready.set(true);
        script.active.set(true);
        let module = Self {
            priority,
            slots: slots.to_vec(),
            laser: None,
            script: Rc::clone(&script),
        };
        (module, script)
    }

    pub fn with_laser(mut self, laser: LaserParams) -> Self {
        self.laser = Some(laser);
        self
    }
}

impl InteractionModule for ScriptedModule {
    fn priority(&self) -> i32 {
        self.priority
    }

    fn required_slots(&self) -> &[ResourceSlot] {
        &self.slots
    }

    fn hand_laser(&self) -> Option<LaserParams> {
        self.laser
    }

    fn is_ready(&mut self, _ctx: &SpatialContext, _dt: f32) -> Result<Readiness, ModuleError> {
        let s = &self.script;
        s.ready_calls.set(s.ready_calls.get() + 1);
        if s.panic_ready.get() {
            panic!("scripted readiness panic");
        }
        if s.fail_ready.get() {
            return Err(ModuleError::failed("scripted readiness failure"));
        }
        Ok(Readiness {
            active: s.ready.get(),
        })
    }

    fn execution_step(
        &mut self,
        ctx: &SpatialContext,
        _dt: f32,
    ) -> Result<RunningValues, ModuleError> {
        let s = &self.script;
        s.step_calls.set(s.step_calls.get() + 1);
        s.step_ticks.borrow_mut().push(ctx.tick());
        if s.panic_step.get() {
            panic!("scripted execution panic");
        }
        if s.fail_step.get() {
            return Err(ModuleError::failed("scripted execution failure"));
        }
        Ok(RunningValues {
            active: s.active.get(),
            targets: s.targets.borrow().clone(),
            laser_lock: s.lock.get(),
        })
    }
}
