use handspace_common::{EntityId, Hand};
use handspace_input::{ControllerAction, HandInputs, InputState};
use handspace_ports::{MouseButton, PointerEvent, PointerId, PointerManager, Ports};
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use crate::builder::SpatialContextBuilder;
use crate::config::DispatcherConfig;
use crate::context::SpatialContext;
use crate::control::{ControlMessage, ControlOutcome, IGNORE_CHANNEL, IgnoreLists};
use crate::error::{CallbackPhase, ConfigError, DispatchError, ModuleError, ModuleFault};
use crate::registry::{ModuleRegistry, RegistryView};
use crate::running::RunningSet;
use crate::slots::SlotTable;
use crate::timing::TickTimer;

/// Local channel told to go home when the tablet's home button is released on.
pub const HOME_CHANNEL: &str = "home";

const STYLUS_HAPTIC_STRENGTH: f32 = 1.0;
const STYLUS_HAPTIC_DURATION_MS: f32 = 20.0;

/// What changed during one tick.
#[derive(Debug, Default)]
pub struct TickReport {
    pub tick: u64,
    /// Seconds since the previous tick.
    pub dt: f32,
    /// Whether the priority order was rebuilt.
    pub resorted: bool,
    pub started: Vec<String>,
    /// Stopped by an inactive or faulting execution step.
    pub stopped: Vec<String>,
    /// Stopped because the module left the registry.
    pub evicted: Vec<String>,
    pub faults: Vec<ModuleFault>,
    /// Modules whose reported targets differ from the previous tick.
    pub target_changes: Vec<(String, Vec<EntityId>)>,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.started.is_empty()
            && self.stopped.is_empty()
            && self.evicted.is_empty()
            && self.faults.is_empty()
            && self.target_changes.is_empty()
    }
}

/// Frame scheduler: owns slot ownership, the running set and everything
/// else that persists between ticks.
#[derive(Debug)]
pub struct Dispatcher {
    config: DispatcherConfig,
    slots: SlotTable,
    view: RegistryView,
    running: RunningSet,
    builder: SpatialContextBuilder,
    timer: TickTimer,
    input: InputState,
    ignore: IgnoreLists,
    tablet_id: Option<EntityId>,
    tick: u64,
    torn_down: bool,
}

impl Dispatcher {
    /// Fails if `config` does not validate.
    pub fn new(config: DispatcherConfig, now: Instant) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(target_hz = config.target_hz, "dispatcher created");
        Ok(Self {
            slots: SlotTable::new(),
            view: RegistryView::new(),
            running: RunningSet::new(),
            builder: SpatialContextBuilder::new(&config),
            timer: TickTimer::from_config(&config, now),
            input: InputState::new(),
            ignore: IgnoreLists::new(),
            tablet_id: None,
            tick: 0,
            torn_down: false,
            config,
        })
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn slots(&self) -> &SlotTable {
        &self.slots
    }

    pub fn running(&self) -> &RunningSet {
        &self.running
    }

    /// Module names in readiness-poll order, as of the last re-sort.
    pub fn order(&self) -> &[String] {
        self.view.ordered()
    }

    pub fn timer(&self) -> &TickTimer {
        &self.timer
    }

    pub fn ignore_lists(&self) -> &IgnoreLists {
        &self.ignore
    }

    pub fn inputs(&self) -> HandInputs {
        self.input.snapshot()
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Feed a mapped controller event; visible to modules from the next tick.
    pub fn apply_input(&mut self, action: ControllerAction) {
        self.input.apply(action);
    }

    /// Handle an inbound message. Only the ignore-list channel from our own
    /// avatar is acted on.
    pub fn handle_message(
        &mut self,
        channel: &str,
        data: &str,
        sender: EntityId,
        ports: &mut Ports<'_>,
    ) -> ControlOutcome {
        if self.torn_down || channel != IGNORE_CHANNEL || sender != ports.avatar.session_id() {
            return ControlOutcome::Ignored;
        }
        let message = match ControlMessage::parse(data) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(%err, data, "dropping control message");
                return ControlOutcome::Dropped;
            }
        };
        let tablet = ports.avatar.tablet_ids();
        self.ignore.apply(&message, &tablet, ports.pointers)
    }

    /// A mouse release landed on `entity`. A primary release on the tablet's
    /// home button sends the home message. Returns whether it did.
    pub fn mouse_release_on(
        &self,
        entity: EntityId,
        button: MouseButton,
        ports: &mut Ports<'_>,
    ) -> bool {
        if self.torn_down || button != MouseButton::Primary {
            return false;
        }
        if ports.avatar.tablet_ids().home_button != Some(entity) {
            return false;
        }
        tracing::debug!(%entity, "home button released");
        ports.pointers.send_local_message(HOME_CHANNEL, &entity.to_string());
        true
    }

    /// A press arrived through one of the pointers. In HMD mode, a primary
    /// press from a hand laser whose web-surface module is running pulses
    /// that hand. Returns whether a pulse was sent.
    pub fn mouse_press_on(&self, event: PointerEvent, ports: &mut Ports<'_>) -> bool {
        if self.torn_down
            || event.button != MouseButton::Primary
            || !ports.avatar.hmd_active()
        {
            return false;
        }
        let Some(hand) = event.pointer.laser_hand() else {
            return false;
        };
        if !self.running.contains(&self.config.web_surface_lasers[hand.index()]) {
            return false;
        }
        ports
            .pointers
            .trigger_haptic_pulse(hand, STYLUS_HAPTIC_STRENGTH, STYLUS_HAPTIC_DURATION_MS);
        true
    }

    /// Set the laser delay on the four hand pointers.
    pub fn set_laser_delay(&mut self, delay: f32, pointers: &mut dyn PointerManager) {
        for pointer in PointerId::HAND_LASERS {
            pointers.set_delay(pointer, delay);
        }
        tracing::debug!(delay, "hand laser delay set");
    }

    /// Run one frame: rebuild the context, start ready modules, step running ones.
    pub fn tick(
        &mut self,
        registry: &mut dyn ModuleRegistry,
        ports: &mut Ports<'_>,
        now: Instant,
    ) -> TickReport {
        if self.torn_down {
            tracing::warn!("tick after teardown ignored");
            return TickReport {
                tick: self.tick,
                ..TickReport::default()
            };
        }
        self.tick += 1;
        let _span = tracing::info_span!("dispatch_tick", tick = self.tick).entered();

        let dt = self.timer.update(now);
        let mut report = TickReport {
            tick: self.tick,
            dt,
            ..TickReport::default()
        };

        self.refresh_tablet(ports);
        report.resorted = self.view.refresh(registry);

        if self.config.hand_tracking_click {
            for hand in Hand::BOTH {
                if let Some((index, thumb)) = ports.avatar.finger_tips(hand) {
                    self.input
                        .apply_pinch(hand, &index, &thumb, &self.config.pinch);
                }
            }
        }
        let inputs = self.input.snapshot();

        let ctx = self.builder.build(ports, inputs, &self.running, self.tick);
        self.poll_ready(registry, ports.pointers, &ctx, dt, &mut report);
        self.step_running(registry, ports.pointers, &ctx, dt, &mut report);
        ports
            .pointers
            .update_render_state(inputs.trigger_clicks, inputs.trigger_values);

        if !report.is_quiet() {
            tracing::trace!(
                started = ?report.started,
                stopped = ?report.stopped,
                evicted = ?report.evicted,
                faults = report.faults.len(),
                "tick summary"
            );
        }
        report
    }

    /// Release everything and remove the pointers. Callable once.
    pub fn teardown(&mut self, pointers: &mut dyn PointerManager) -> Result<(), DispatchError> {
        if self.torn_down {
            return Err(DispatchError::AlreadyTornDown);
        }
        self.torn_down = true;
        let drained = self.running.drain();
        for (name, state) in &drained {
            if let Some(laser) = state.laser {
                pointers.set_laser_visible(laser, false);
            }
            tracing::debug!(module = %name, "stopping for teardown");
        }
        let stopped = drained.len();
        let released = self.slots.release_all();
        // Lasers are hidden before the pointers they belong to are removed.
        pointers.remove_pointers();
        tracing::info!(stopped, released, ticks = self.tick, "dispatcher torn down");
        Ok(())
    }

    fn refresh_tablet(&mut self, ports: &mut Ports<'_>) {
        let current = ports.avatar.tablet_ids().tablet;
        if current.is_some() && current != self.tablet_id {
            self.tablet_id = current;
            tracing::debug!(tablet = ?current, "tablet changed, re-pushing ignore lists");
            self.ignore.push_all(ports.pointers);
        }
    }

    fn poll_ready(
        &mut self,
        registry: &mut dyn ModuleRegistry,
        pointers: &mut dyn PointerManager,
        ctx: &SpatialContext,
        dt: f32,
        report: &mut TickReport,
    ) {
        let _span = tracing::debug_span!("readiness_poll").entered();
        for name in self.view.ordered().to_vec() {
            if self.running.contains(&name) {
                continue;
            }
            let Some(module) = registry.module_mut(&name) else {
                continue;
            };
            if !self.slots.slots_available(module.required_slots()) {
                continue;
            }
            let ready = match guarded(&name, CallbackPhase::Readiness, || {
                module.is_ready(ctx, dt)
            }) {
                Ok(readiness) => readiness.active,
                Err(fault) => {
                    tracing::warn!(%fault, "readiness check faulted");
                    report.faults.push(fault);
                    false
                }
            };
            if !ready {
                continue;
            }

            self.slots.claim(&name, module.required_slots());
            let laser = module.hand_laser();
            self.running.insert(&name, laser);
            if let Some(laser) = laser {
                pointers.set_laser_visible(laser, true);
            }
            tracing::debug!(module = %name, "running");
            report.started.push(name);
        }
    }

    fn step_running(
        &mut self,
        registry: &mut dyn ModuleRegistry,
        pointers: &mut dyn PointerManager,
        ctx: &SpatialContext,
        dt: f32,
        report: &mut TickReport,
    ) {
        let _span = tracing::debug_span!("execution_steps").entered();
        for name in self.running.names() {
            let Some(module) = registry.module_mut(&name) else {
                tracing::debug!(module = %name, "module left the registry, evicting");
                self.stop(&name, pointers);
                report.evicted.push(name);
                continue;
            };
            // A module replaced under the same name may declare slots it never claimed.
            if !self.slots.owns_all(&name, module.required_slots()) {
                tracing::debug!(module = %name, "module no longer owns its slots, evicting");
                self.stop(&name, pointers);
                report.evicted.push(name);
                continue;
            }

            let laser = self.running.get(&name).and_then(|state| state.laser);
            match guarded(&name, CallbackPhase::Execution, || {
                module.execution_step(ctx, dt)
            }) {
                Ok(values) => {
                    if values.active {
                        if self.running.set_targets(&name, values.targets.clone()) {
                            tracing::debug!(module = %name, targets = ?values.targets, "targets changed");
                            report.target_changes.push((name.clone(), values.targets));
                        }
                    } else {
                        self.stop(&name, pointers);
                        report.stopped.push(name);
                    }
                    if let Some(laser) = laser {
                        pointers.lock_pointer_end(laser, values.laser_lock.as_ref());
                    }
                }
                Err(fault) => {
                    tracing::warn!(%fault, "execution step faulted, stopping module");
                    report.faults.push(fault);
                    self.stop(&name, pointers);
                    report.stopped.push(name);
                }
            }
        }
    }

    fn stop(&mut self, name: &str, pointers: &mut dyn PointerManager) {
        let freed = self.slots.release(name);
        if let Some(state) = self.running.remove(name) {
            if let Some(laser) = state.laser {
                pointers.set_laser_visible(laser, false);
            }
        }
        tracing::debug!(module = %name, freed, "stopping");
    }
}

/// Run a module callback, turning errors and panics into a [`ModuleFault`].
fn guarded<T>(
    module: &str,
    phase: CallbackPhase,
    f: impl FnOnce() -> Result<T, ModuleError>,
) -> Result<T, ModuleFault> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(ModuleFault::Callback {
            module: module.to_string(),
            phase,
            source,
        }),
        Err(payload) => Err(ModuleFault::Panicked {
            module: module.to_string(),
            phase,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModuleTable;
    use crate::slots::ResourceSlot;
    use crate::testing::{Script, ScriptedModule};
    use glam::{Quat, Vec3};
    use handspace_common::HandPose;
    use handspace_ports::{LaserLockInfo, LaserParams, TabletIds};
    use handspace_scene::{PointerCall, RecordingPointers, SimScene};
    use std::rc::Rc;
    use std::time::Duration;

    struct Harness {
        scene: SimScene,
        pointers: RecordingPointers,
        table: ModuleTable,
        dispatcher: Dispatcher,
        now: Instant,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_config(DispatcherConfig::default())
        }

        fn with_config(config: DispatcherConfig) -> Self {
            let now = Instant::now();
            Self {
                scene: SimScene::new(),
                pointers: RecordingPointers::new(),
                table: ModuleTable::new(),
                dispatcher: Dispatcher::new(config, now).unwrap(),
                now,
            }
        }

        fn add(&mut self, name: &str, priority: i32, slots: &[ResourceSlot]) -> Rc<Script> {
            let (module, script) = ScriptedModule::new(priority, slots);
            self.table.enable(name, module);
            script
        }

        fn add_with_laser(
            &mut self,
            name: &str,
            priority: i32,
            slots: &[ResourceSlot],
            hand: Hand,
        ) -> Rc<Script> {
            let (module, script) = ScriptedModule::new(priority, slots);
            self.table
                .enable(name, module.with_laser(LaserParams::for_hand(hand)));
            script
        }

        fn tick(&mut self) -> TickReport {
            self.now += Duration::from_millis(16);
            let mut ports = Ports {
                spatial: &self.scene,
                rays: &self.scene,
                avatar: &self.scene,
                pointers: &mut self.pointers,
            };
            self.dispatcher.tick(&mut self.table, &mut ports, self.now)
        }

        fn message(&mut self, channel: &str, data: &str, sender: EntityId) -> ControlOutcome {
            let mut ports = Ports {
                spatial: &self.scene,
                rays: &self.scene,
                avatar: &self.scene,
                pointers: &mut self.pointers,
            };
            self.dispatcher.handle_message(channel, data, sender, &mut ports)
        }

        fn mouse_release(&mut self, entity: EntityId, button: MouseButton) -> bool {
            let mut ports = Ports {
                spatial: &self.scene,
                rays: &self.scene,
                avatar: &self.scene,
                pointers: &mut self.pointers,
            };
            self.dispatcher.mouse_release_on(entity, button, &mut ports)
        }

        fn mouse_press(&mut self, event: PointerEvent) -> bool {
            let mut ports = Ports {
                spatial: &self.scene,
                rays: &self.scene,
                avatar: &self.scene,
                pointers: &mut self.pointers,
            };
            self.dispatcher.mouse_press_on(event, &mut ports)
        }

        fn assert_slot_invariants(&self) {
            for (name, _) in self.dispatcher.running().iter() {
                let module = self.table.module(name).expect("running module is registered");
                assert!(
                    self.dispatcher.slots().owns_all(name, module.required_slots()),
                    "{name} runs without its slots"
                );
            }
            for (slot, owner) in self.dispatcher.slots().iter() {
                if let Some(owner) = owner {
                    assert!(self.dispatcher.running().contains(owner), "{slot} owned by idle {owner}");
                }
            }
        }
    }

    use ResourceSlot::{LeftHand, LeftHandEquip, RightHand};

    #[test]
    fn higher_priority_claims_first() {
        let mut h = Harness::new();
        let b = h.add("b", 5, &[LeftHand]);
        let a = h.add("a", 1, &[LeftHand, RightHand]);

        let report = h.tick();
        assert!(report.resorted);
        assert_eq!(report.started, vec!["a".to_string()]);
        assert_eq!(h.dispatcher.slots().owner(LeftHand), Some("a"));
        assert_eq!(a.ready_calls.get(), 1);
        assert_eq!(b.ready_calls.get(), 0, "b is not polled while its slot is taken");
        h.assert_slot_invariants();
    }

    #[test]
    fn equal_priorities_poll_in_name_order() {
        let mut h = Harness::new();
        h.add("zeta", 3, &[LeftHand]);
        h.add("alpha", 3, &[LeftHand]);
        let report = h.tick();
        assert_eq!(report.started, vec!["alpha".to_string()]);
    }

    #[test]
    fn grab_blocks_equip_until_it_stops() {
        let mut h = Harness::new();
        let grab = h.add("grabLeft", 1, &[LeftHand]);
        let equip = h.add("equipLeft", 2, &[LeftHand, LeftHandEquip]);

        h.tick();
        assert!(h.dispatcher.running().contains("grabLeft"));
        assert!(!h.dispatcher.running().contains("equipLeft"));

        for _ in 0..3 {
            h.tick();
            assert!(!h.dispatcher.running().contains("equipLeft"));
            h.assert_slot_invariants();
        }
        assert_eq!(equip.ready_calls.get(), 0);

        grab.set_active(false);
        grab.set_ready(false);
        let report = h.tick();
        assert_eq!(report.stopped, vec!["grabLeft".to_string()]);
        assert!(h.dispatcher.slots().is_free(LeftHand));

        let report = h.tick();
        assert_eq!(report.started, vec!["equipLeft".to_string()]);
        assert_eq!(h.dispatcher.slots().owner(LeftHandEquip), Some("equipLeft"));
        h.assert_slot_invariants();
    }

    #[test]
    fn started_module_runs_same_tick() {
        let mut h = Harness::new();
        let s = h.add("grab", 1, &[LeftHand]);
        h.tick();
        assert_eq!(*s.step_ticks.borrow(), vec![1]);
        h.tick();
        assert_eq!(*s.step_ticks.borrow(), vec![1, 2]);
        assert_eq!(s.ready_calls.get(), 1, "running modules are not polled");
    }

    #[test]
    fn inactive_step_releases_everything_same_tick() {
        let mut h = Harness::new();
        let s = h.add_with_laser("farGrab", 1, &[RightHand], Hand::Right);
        s.set_targets(vec![EntityId::from_u128(3)]);

        let report = h.tick();
        assert_eq!(report.target_changes.len(), 1);
        assert!(h.pointers.laser_visible(Hand::Right));
        assert_eq!(h.dispatcher.running().targets("farGrab"), Some(&[EntityId::from_u128(3)][..]));

        s.set_active(false);
        s.set_ready(false);
        let report = h.tick();
        assert_eq!(report.stopped, vec!["farGrab".to_string()]);
        assert!(h.dispatcher.slots().is_free(RightHand));
        assert_eq!(h.dispatcher.running().targets("farGrab"), None);
        assert!(!h.pointers.laser_visible(Hand::Right));
    }

    #[test]
    fn removed_module_is_evicted_without_another_step() {
        let mut h = Harness::new();
        let s = h.add_with_laser("grab", 1, &[LeftHand], Hand::Left);
        h.tick();
        assert_eq!(s.step_calls.get(), 1);

        assert!(h.table.disable("grab"));
        let report = h.tick();
        assert_eq!(report.evicted, vec!["grab".to_string()]);
        assert!(report.resorted);
        assert_eq!(s.step_calls.get(), 1);
        assert!(h.dispatcher.slots().is_free(LeftHand));
        assert!(h.dispatcher.running().is_empty());
        assert!(!h.pointers.laser_visible(Hand::Left));
    }

    #[test]
    fn replaced_module_without_its_new_slots_is_evicted() {
        let mut h = Harness::new();
        let old = h.add_with_laser("grab", 1, &[LeftHand], Hand::Left);
        h.tick();
        assert_eq!(old.step_calls.get(), 1);

        let wider = h.add("grab", 1, &[LeftHand, RightHand]);
        let right = h.add("right", 5, &[RightHand]);
        let report = h.tick();

        assert_eq!(report.started, vec!["right".to_string()]);
        assert_eq!(report.evicted, vec!["grab".to_string()]);
        assert_eq!(wider.step_calls.get(), 0);
        assert!(!h.dispatcher.running().contains("grab"));
        assert!(h.dispatcher.slots().is_free(LeftHand));
        assert_eq!(h.dispatcher.slots().owner(RightHand), Some("right"));
        assert!(!h.pointers.laser_visible(Hand::Left));
        h.assert_slot_invariants();

        // RightHand stays taken, so the wider module is not polled.
        h.tick();
        assert_eq!(wider.ready_calls.get(), 0);
        assert_eq!(right.step_calls.get(), 2);
        h.assert_slot_invariants();
    }

    #[test]
    fn rejects_invalid_config() {
        let config = DispatcherConfig {
            high_jitter_ms: -1.0,
            ..DispatcherConfig::default()
        };
        assert!(matches!(
            Dispatcher::new(config, Instant::now()),
            Err(ConfigError::Invalid {
                field: "high_jitter_ms",
                ..
            })
        ));
    }

    #[test]
    fn readiness_fault_counts_as_not_ready() {
        let mut h = Harness::new();
        let bad = h.add("bad", 1, &[LeftHand]);
        bad.fail_ready.set(true);
        let good = h.add("good", 2, &[LeftHand]);

        let report = h.tick();
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].module(), "bad");
        assert_eq!(report.faults[0].phase(), CallbackPhase::Readiness);
        assert_eq!(report.started, vec!["good".to_string()]);
        assert_eq!(good.step_calls.get(), 1);
    }

    #[test]
    fn readiness_panic_is_caught() {
        let mut h = Harness::new();
        let s = h.add("panicky", 1, &[LeftHand]);
        s.panic_ready.set(true);
        let report = h.tick();
        assert!(matches!(report.faults[0], ModuleFault::Panicked { .. }));
        assert!(h.dispatcher.running().is_empty());
        assert!(h.dispatcher.slots().is_free(LeftHand));
    }

    #[test]
    fn execution_fault_stops_module() {
        let mut h = Harness::new();
        let failing = h.add("failing", 1, &[LeftHand]);
        let panicking = h.add("panicking", 2, &[RightHand]);
        let other = h.add("other", 3, &[ResourceSlot::Head]);
        h.tick();
        assert_eq!(h.dispatcher.running().len(), 3);

        failing.fail_step.set(true);
        failing.set_ready(false);
        panicking.panic_step.set(true);
        panicking.set_ready(false);
        let report = h.tick();

        assert_eq!(report.faults.len(), 2);
        assert!(report.faults.iter().all(|f| f.phase() == CallbackPhase::Execution));
        assert!(h.dispatcher.slots().is_free(LeftHand));
        assert!(h.dispatcher.slots().is_free(RightHand));
        assert!(h.dispatcher.running().contains("other"));
        assert_eq!(other.step_calls.get(), 2);
        h.assert_slot_invariants();
    }

    #[test]
    fn laser_end_follows_lock_info() {
        let mut h = Harness::new();
        let s = h.add_with_laser("farTrigger", 1, &[LeftHand], Hand::Left);
        let lock = LaserLockInfo {
            target_id: EntityId::from_u128(8),
            is_overlay: false,
            hand: Hand::Left,
            offset: Vec3::ZERO,
        };
        s.lock.set(Some(lock));
        h.tick();
        assert_eq!(h.pointers.laser_lock(Hand::Left), Some(lock));

        s.lock.set(None);
        h.tick();
        assert_eq!(h.pointers.laser_lock(Hand::Left), None);
    }

    #[test]
    fn render_state_pushed_every_tick() {
        let mut h = Harness::new();
        h.dispatcher.apply_input(ControllerAction::TriggerClick {
            hand: Hand::Right,
            clicked: true,
        });
        h.tick();
        h.tick();
        let pushes: Vec<_> = h
            .pointers
            .calls()
            .iter()
            .filter_map(|c| match c {
                PointerCall::RenderState { clicks, .. } => Some(*clicks),
                _ => None,
            })
            .collect();
        assert_eq!(pushes, vec![[false, true], [false, true]]);
    }

    #[test]
    fn control_messages_need_our_session_and_channel() {
        let mut h = Harness::new();
        let me = EntityId::from_u128(1);
        h.scene.set_session_id(me);
        let id = EntityId::from_u128(42);
        let add = format!(r#"{{"action":"add","id":"{}"}}"#, id.0);

        assert_eq!(h.message(IGNORE_CHANNEL, &add, EntityId::from_u128(2)), ControlOutcome::Ignored);
        assert_eq!(h.message("Other-Channel", &add, me), ControlOutcome::Ignored);
        assert!(h.dispatcher.ignore_lists().global().is_empty());

        assert_eq!(h.message(IGNORE_CHANNEL, &add, me), ControlOutcome::Applied);
        assert_eq!(h.pointers.ignore_items(PointerId::LeftHand), &[id]);
    }

    #[test]
    fn malformed_message_changes_nothing() {
        let mut h = Harness::new();
        let me = EntityId::from_u128(1);
        h.scene.set_session_id(me);
        h.add("grab", 1, &[LeftHand]);
        h.tick();
        let owners: Vec<_> = h.dispatcher.slots().iter().map(|(s, o)| (s, o.map(String::from))).collect();
        h.pointers.take_calls();

        let outcome = h.message(IGNORE_CHANNEL, "{\"action\":", me);
        assert_eq!(outcome, ControlOutcome::Dropped);
        let after: Vec<_> = h.dispatcher.slots().iter().map(|(s, o)| (s, o.map(String::from))).collect();
        assert_eq!(owners, after);
        assert!(h.pointers.calls().is_empty());
        assert_eq!(h.dispatcher.ignore_lists(), &IgnoreLists::new());
    }

    #[test]
    fn new_tablet_repushes_ignore_lists() {
        let mut h = Harness::new();
        let me = EntityId::from_u128(1);
        h.scene.set_session_id(me);
        let ignored = EntityId::from_u128(50);
        h.message(IGNORE_CHANNEL, &format!(r#"{{"action":"add","id":"{}"}}"#, ignored.0), me);
        h.tick();
        h.pointers.take_calls();

        h.scene.set_tablet_ids(TabletIds {
            tablet: Some(EntityId::from_u128(9)),
            ..TabletIds::default()
        });
        h.tick();
        let pushes = h.pointers.take_calls().into_iter().filter(|c| matches!(c, PointerCall::IgnoreItems { .. })).count();
        assert_eq!(pushes, 2);

        h.tick();
        let pushes = h.pointers.take_calls().into_iter().filter(|c| matches!(c, PointerCall::IgnoreItems { .. })).count();
        assert_eq!(pushes, 0);
    }

    #[test]
    fn laser_delay_goes_to_hand_pointers() {
        let mut h = Harness::new();
        h.dispatcher.set_laser_delay(0.3, &mut h.pointers);
        let delays: Vec<_> = h
            .pointers
            .calls()
            .iter()
            .filter_map(|c| match c {
                PointerCall::Delay { pointer, .. } => Some(*pointer),
                _ => None,
            })
            .collect();
        assert_eq!(delays, PointerId::HAND_LASERS.to_vec());
    }

    #[test]
    fn teardown_hides_lasers_before_removing_pointers() {
        let mut h = Harness::new();
        h.add_with_laser("farGrab", 1, &[RightHand], Hand::Right);
        h.tick();
        h.pointers.take_calls();

        h.dispatcher.teardown(&mut h.pointers).unwrap();
        let calls = h.pointers.take_calls();
        assert_eq!(
            calls,
            vec![
                PointerCall::LaserVisible {
                    laser: LaserParams::for_hand(Hand::Right),
                    visible: false,
                },
                PointerCall::RemoveAll,
            ]
        );
    }

    #[test]
    fn home_button_release_sends_home() {
        let mut h = Harness::new();
        let home = EntityId::from_u128(77);
        h.scene.set_tablet_ids(TabletIds {
            home_button: Some(home),
            ..TabletIds::default()
        });

        assert!(!h.mouse_release(home, MouseButton::Secondary));
        assert!(!h.mouse_release(EntityId::from_u128(78), MouseButton::Primary));
        assert!(h.pointers.local_messages().is_empty());

        assert!(h.mouse_release(home, MouseButton::Primary));
        let data = home.to_string();
        assert_eq!(h.pointers.local_messages(), vec![(HOME_CHANNEL, data.as_str())]);
    }

    #[test]
    fn web_laser_press_pulses_its_hand_in_hmd() {
        let mut h = Harness::new();
        h.add("RightWebSurfaceLaserInput", 1, &[RightHand]);
        h.tick();
        let press = PointerEvent::primary(PointerId::RightHand);

        assert!(!h.mouse_press(press), "desktop mode");
        h.scene.set_hmd_active(true);
        assert!(h.mouse_press(press));
        assert!(!h.mouse_press(PointerEvent::primary(PointerId::LeftHand)));
        assert!(!h.mouse_press(PointerEvent {
            pointer: PointerId::RightHand,
            button: MouseButton::Secondary,
        }));
        assert!(!h.mouse_press(PointerEvent::primary(PointerId::Mouse)));
        assert_eq!(h.pointers.haptic_pulses(), vec![Hand::Right]);
    }

    #[test]
    fn teardown_happens_once() {
        let mut h = Harness::new();
        let s = h.add("grab", 1, &[LeftHand]);
        h.tick();

        h.dispatcher.teardown(&mut h.pointers).unwrap();
        assert!(h.pointers.is_removed());
        assert_eq!(h.dispatcher.slots().free_count(), ResourceSlot::COUNT);
        assert!(h.dispatcher.running().is_empty());
        assert!(matches!(
            h.dispatcher.teardown(&mut h.pointers),
            Err(DispatchError::AlreadyTornDown)
        ));

        let report = h.tick();
        assert!(report.is_quiet());
        assert_eq!(s.step_calls.get(), 1);
        assert_eq!(h.dispatcher.ticks(), 1);
    }

    #[test]
    fn pinch_drives_trigger_when_enabled() {
        let config = DispatcherConfig {
            hand_tracking_click: true,
            ..DispatcherConfig::default()
        };
        let mut h = Harness::with_config(config);
        let index = HandPose::at(Vec3::ZERO, Quat::IDENTITY);
        let thumb = HandPose::at(Vec3::new(0.01, 0.0, 0.0), Quat::IDENTITY);
        h.scene.set_finger_tips(Hand::Left, Some((index, thumb)));
        h.tick();
        assert!(h.dispatcher.inputs().trigger_clicked(Hand::Left));

        let apart = HandPose::at(Vec3::new(0.05, 0.0, 0.0), Quat::IDENTITY);
        h.scene.set_finger_tips(Hand::Left, Some((index, apart)));
        h.tick();
        assert!(!h.dispatcher.inputs().trigger_clicked(Hand::Left));
    }

    #[test]
    fn pinch_needs_tracked_tips() {
        let config = DispatcherConfig {
            hand_tracking_click: true,
            ..DispatcherConfig::default()
        };
        let mut h = Harness::with_config(config);
        let untracked = HandPose::invalid();
        h.scene.set_finger_tips(Hand::Right, Some((untracked, untracked)));
        h.tick();
        assert!(!h.dispatcher.inputs().trigger_clicked(Hand::Right));
    }

    #[test]
    fn pinch_ignored_by_default() {
        let mut h = Harness::new();
        let index = HandPose::at(Vec3::ZERO, Quat::IDENTITY);
        h.scene.set_finger_tips(Hand::Left, Some((index, index)));
        h.tick();
        assert!(!h.dispatcher.inputs().trigger_clicked(Hand::Left));
    }

    #[test]
    fn report_carries_dt() {
        let mut h = Harness::new();
        let report = h.tick();
        assert!((report.dt - 0.016).abs() < 1e-4);
        assert_eq!(report.tick, 1);
        assert_eq!(h.dispatcher.timer().stats().intervals, 1);
    }
}
