//! Scripted simulation session: a small scene, the demo modules and a
//! repeating timeline of controller input, ray hits and control messages.

use glam::{Quat, Vec3};
use handspace_common::{EntityId, Hand, HandPose};
use handspace_dispatch::{
    ConfigError, ControlOutcome, Dispatcher, DispatcherConfig, IGNORE_CHANNEL, ModuleTable,
    TickReport,
};
use handspace_input::StandardInput;
use handspace_ports::{
    EntityProperties, GrabProperties, PointerId, Ports, RayPick, TabletIds,
};
use handspace_scene::{RecordingPointers, SimScene};
use handspace_tools::DebugPanel;
use std::time::Instant;

use crate::modules::{Equip, FarLaser, MouseHover, NearGrab};

/// Timeline length in ticks; the script repeats after this.
pub const SCRIPT_PERIOD: u64 = 120;

const CUBE: EntityId = EntityId::from_u128(0x100);
const PEN: EntityId = EntityId::from_u128(0x101);
const BILLBOARD: EntityId = EntityId::from_u128(0x102);
const TABLET: EntityId = EntityId::from_u128(0x200);
const TABLET_SCREEN: EntityId = EntityId::from_u128(0x201);
const HOME_BUTTON: EntityId = EntityId::from_u128(0x202);
const AVATAR: EntityId = EntityId::from_u128(0x1);
const STRANGER: EntityId = EntityId::from_u128(0x2);

enum Step {
    Input(StandardInput, f32),
    RayHit(PointerId, Option<EntityId>),
    Message { data: String, sender: EntityId },
    Hmd(bool),
}

fn message(data: impl Into<String>) -> Step {
    Step::Message {
        data: data.into(),
        sender: AVATAR,
    }
}

fn script(phase: u64) -> Vec<Step> {
    use StandardInput::*;
    match phase {
        1 => vec![Step::Hmd(true)],
        5 => vec![Step::Input(LTClick, 1.0), Step::Input(LT, 1.0)],
        8 => vec![message(r#"{"action":"tablet","hand":0,"blacklist":true}"#)],
        20 => vec![Step::Input(LTClick, 0.0), Step::Input(LT, 0.0)],
        25 => vec![Step::Input(LB, 1.0)],
        27 => vec![Step::Input(LB, 0.0)],
        40 => vec![Step::Input(LTClick, 1.0), Step::Input(LB, 1.0)],
        42 => vec![Step::Input(LTClick, 0.0), Step::Input(LB, 0.0)],
        50 => vec![
            Step::RayHit(PointerId::RightHand, Some(BILLBOARD)),
            Step::Input(RT, 0.8),
        ],
        70 => vec![Step::Input(RT, 0.0), Step::RayHit(PointerId::RightHand, None)],
        75 => vec![Step::RayHit(PointerId::Mouse, Some(BILLBOARD))],
        90 => vec![Step::RayHit(PointerId::Mouse, None)],
        95 => vec![message(r#"{"action":"add","id":"#)],
        96 => vec![Step::Message {
            data: format!(r#"{{"action":"add","id":"{}"}}"#, PEN.0),
            sender: STRANGER,
        }],
        100 => vec![message(format!(r#"{{"action":"add","id":"{}"}}"#, BILLBOARD.0))],
        110 => vec![
            message(format!(r#"{{"action":"remove","id":"{}"}}"#, BILLBOARD.0)),
            message(r#"{"action":"tablet","hand":0,"blacklist":false}"#),
        ],
        _ => Vec::new(),
    }
}

fn build_scene() -> SimScene {
    let mut scene = SimScene::new();
    scene.set_session_id(AVATAR);

    let left = Vec3::new(-0.3, 1.2, 0.3);
    let right = Vec3::new(0.3, 1.2, 0.3);
    scene.set_hand_pose(Hand::Left, HandPose::at(left, Quat::IDENTITY));
    scene.set_hand_pose(
        Hand::Right,
        HandPose::at(right, Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
    );

    let mut cube = EntityProperties::new(CUBE, "cube", left + Vec3::new(0.04, 0.0, 0.0));
    cube.dynamic = true;
    scene.spawn(cube);

    let mut pen = EntityProperties::new(PEN, "pen", left + Vec3::new(0.0, 0.06, 0.0));
    pen.grab = GrabProperties {
        equippable: true,
        ..GrabProperties::default()
    };
    scene.spawn(pen);

    let mut billboard = EntityProperties::new(BILLBOARD, "billboard", Vec3::new(0.3, 1.2, -4.0));
    billboard.grab.grabbable = false;
    scene.spawn(billboard);

    for (id, name, offset) in [
        (TABLET, "tablet", -0.08),
        (TABLET_SCREEN, "tabletScreen", -0.085),
        (HOME_BUTTON, "homeButton", -0.09),
    ] {
        scene.spawn_overlay(EntityProperties::new(id, name, left + Vec3::new(0.0, offset, 0.0)));
    }
    scene
}

fn ray_pick_for(scene: &SimScene, id: EntityId, origin: Vec3) -> Option<RayPick> {
    use handspace_ports::SpatialIndex;
    let position = scene.position(id)?;
    Some(RayPick::entity(id, position.distance(origin), position))
}

/// Outcome counters for the whole run.
#[derive(Debug, Default)]
pub struct SessionTotals {
    pub started: usize,
    pub stopped: usize,
    pub evicted: usize,
    pub faults: usize,
    pub messages_applied: usize,
    pub messages_dropped: usize,
    pub messages_ignored: usize,
}

pub struct Session {
    scene: SimScene,
    pointers: RecordingPointers,
    table: ModuleTable,
    dispatcher: Dispatcher,
    panel: DebugPanel,
    totals: SessionTotals,
    tablet_shown: bool,
}

impl Session {
    pub fn new(config: DispatcherConfig, start: Instant) -> Result<Self, ConfigError> {
        let mut table = ModuleTable::new();
        for hand in Hand::BOTH {
            table.enable(format!("nearGrab{}", title(hand)), NearGrab::new(hand));
            table.enable(format!("equip{}", title(hand)), Equip::new(hand));
            table.enable(format!("farLaser{}", title(hand)), FarLaser::new(hand));
        }
        table.enable("mouseHover", MouseHover::default());

        Ok(Self {
            scene: build_scene(),
            pointers: RecordingPointers::new(),
            table,
            dispatcher: Dispatcher::new(config, start)?,
            panel: DebugPanel::default(),
            totals: SessionTotals::default(),
            tablet_shown: false,
        })
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn panel(&self) -> &DebugPanel {
        &self.panel
    }

    pub fn totals(&self) -> &SessionTotals {
        &self.totals
    }

    /// Apply the script for the coming tick, then run it.
    pub fn step(&mut self, now: Instant) -> TickReport {
        let phase = (self.dispatcher.ticks() + 1) % SCRIPT_PERIOD;
        for step in script(phase) {
            self.apply(step);
        }

        let mut ports = Ports {
            spatial: &self.scene,
            rays: &self.scene,
            avatar: &self.scene,
            pointers: &mut self.pointers,
        };
        let report = self.dispatcher.tick(&mut self.table, &mut ports, now);
        self.panel.record(&report);
        self.totals.started += report.started.len();
        self.totals.stopped += report.stopped.len();
        self.totals.evicted += report.evicted.len();
        self.totals.faults += report.faults.len();
        report
    }

    fn apply(&mut self, step: Step) {
        match step {
            Step::Input(input, value) => {
                tracing::debug!(%input, value, "scripted input");
                self.dispatcher.apply_input(input.to_action(value));
            }
            Step::RayHit(pointer, target) => {
                let origin = match pointer {
                    PointerId::LeftHand | PointerId::LeftHud => self.scene_hand(Hand::Left),
                    PointerId::RightHand | PointerId::RightHud => self.scene_hand(Hand::Right),
                    PointerId::Mouse => Vec3::new(0.0, 1.6, 0.5),
                };
                let pick = target
                    .and_then(|id| ray_pick_for(&self.scene, id, origin))
                    .unwrap_or_default();
                self.scene.set_ray_hit(pointer, pick);
            }
            Step::Message { data, sender } => {
                let mut ports = Ports {
                    spatial: &self.scene,
                    rays: &self.scene,
                    avatar: &self.scene,
                    pointers: &mut self.pointers,
                };
                match self
                    .dispatcher
                    .handle_message(IGNORE_CHANNEL, &data, sender, &mut ports)
                {
                    ControlOutcome::Applied | ControlOutcome::Unchanged => {
                        self.totals.messages_applied += 1
                    }
                    ControlOutcome::Dropped => self.totals.messages_dropped += 1,
                    ControlOutcome::Ignored => self.totals.messages_ignored += 1,
                }
            }
            Step::Hmd(active) => {
                self.scene.set_hmd_active(active);
                if active && !self.tablet_shown {
                    self.scene.set_tablet_ids(TabletIds {
                        tablet: Some(TABLET),
                        tablet_screen: Some(TABLET_SCREEN),
                        home_button: Some(HOME_BUTTON),
                        ..TabletIds::default()
                    });
                    self.tablet_shown = true;
                }
            }
        }
    }

    fn scene_hand(&self, hand: Hand) -> Vec3 {
        use handspace_ports::AvatarProvider;
        self.scene.hand_pose(hand).position()
    }

    /// Tear the dispatcher down, removing every pointer.
    pub fn finish(&mut self) -> Result<(), handspace_dispatch::DispatchError> {
        self.dispatcher.teardown(&mut self.pointers)
    }

    pub fn pointers_removed(&self) -> bool {
        self.pointers.is_removed()
    }
}

fn title(hand: Hand) -> &'static str {
    match hand {
        Hand::Left => "Left",
        Hand::Right => "Right",
    }
}
