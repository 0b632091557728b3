use handspace_common::{EntityId, Hand};
use handspace_ports::{LaserLockInfo, LaserParams, PointerId, PointerManager};
use std::collections::BTreeMap;

/// One call made against the pointer manager.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerCall {
    Enabled { pointer: PointerId, enabled: bool },
    IgnoreItems { pointer: PointerId, ids: Vec<EntityId> },
    LaserVisible { laser: LaserParams, visible: bool },
    LockEnd { laser: LaserParams, lock: Option<LaserLockInfo> },
    RenderState { clicks: [bool; 2], values: [f32; 2] },
    Delay { pointer: PointerId, delay: f32 },
    RemoveAll,
    Haptic { hand: Hand, strength: f32, duration_ms: f32 },
    LocalMessage { channel: String, data: String },
}

/// Pointer manager that records every call and tracks the resulting state.
#[derive(Debug, Default)]
pub struct RecordingPointers {
    calls: Vec<PointerCall>,
    enabled: BTreeMap<PointerId, bool>,
    ignore: BTreeMap<PointerId, Vec<EntityId>>,
    visible: [bool; 2],
    locks: [Option<LaserLockInfo>; 2],
    removed: bool,
}

impl RecordingPointers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[PointerCall] {
        &self.calls
    }

    /// Drain the call log, keeping the tracked state.
    pub fn take_calls(&mut self) -> Vec<PointerCall> {
        std::mem::take(&mut self.calls)
    }

    /// `None` until the pointer was explicitly enabled or disabled.
    pub fn is_enabled(&self, pointer: PointerId) -> Option<bool> {
        self.enabled.get(&pointer).copied()
    }

    pub fn ignore_items(&self, pointer: PointerId) -> &[EntityId] {
        self.ignore.get(&pointer).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn laser_visible(&self, hand: Hand) -> bool {
        self.visible[hand.index()]
    }

    pub fn laser_lock(&self, hand: Hand) -> Option<LaserLockInfo> {
        self.locks[hand.index()]
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn haptic_pulses(&self) -> Vec<Hand> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PointerCall::Haptic { hand, .. } => Some(*hand),
                _ => None,
            })
            .collect()
    }

    /// Local messages sent so far, as `(channel, data)`.
    pub fn local_messages(&self) -> Vec<(&str, &str)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                PointerCall::LocalMessage { channel, data } => {
                    Some((channel.as_str(), data.as_str()))
                }
                _ => None,
            })
            .collect()
    }

    /// Number of enable/disable calls recorded so far.
    pub fn toggle_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, PointerCall::Enabled { .. }))
            .count()
    }
}

impl PointerManager for RecordingPointers {
    fn set_pointer_enabled(&mut self, pointer: PointerId, enabled: bool) {
        self.enabled.insert(pointer, enabled);
        self.calls.push(PointerCall::Enabled { pointer, enabled });
    }

    fn set_ignore_items(&mut self, pointer: PointerId, ids: &[EntityId]) {
        self.ignore.insert(pointer, ids.to_vec());
        self.calls.push(PointerCall::IgnoreItems {
            pointer,
            ids: ids.to_vec(),
        });
    }

    fn set_laser_visible(&mut self, laser: LaserParams, visible: bool) {
        self.visible[laser.hand.index()] = visible;
        self.calls.push(PointerCall::LaserVisible { laser, visible });
    }

    fn lock_pointer_end(&mut self, laser: LaserParams, lock: Option<&LaserLockInfo>) {
        self.locks[laser.hand.index()] = lock.copied();
        self.calls.push(PointerCall::LockEnd {
            laser,
            lock: lock.copied(),
        });
    }

    fn update_render_state(&mut self, clicks: [bool; 2], values: [f32; 2]) {
        self.calls.push(PointerCall::RenderState { clicks, values });
    }

    fn set_delay(&mut self, pointer: PointerId, delay: f32) {
        self.calls.push(PointerCall::Delay { pointer, delay });
    }

    fn remove_pointers(&mut self) {
        self.removed = true;
        self.enabled.clear();
        self.calls.push(PointerCall::RemoveAll);
    }

    fn trigger_haptic_pulse(&mut self, hand: Hand, strength: f32, duration_ms: f32) {
        self.calls.push(PointerCall::Haptic {
            hand,
            strength,
            duration_ms,
        });
    }

    fn send_local_message(&mut self, channel: &str, data: &str) {
        self.calls.push(PointerCall::LocalMessage {
            channel: channel.to_string(),
            data: data.to_string(),
        });
    }
}
