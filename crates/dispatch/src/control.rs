use handspace_common::{EntityId, Hand};
use handspace_ports::{PointerId, PointerManager, TabletIds};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ControlError;

/// Inbound channel carrying ray-pick ignore-list updates.
pub const IGNORE_CHANNEL: &str = "Hifi-Hand-RayPick-Blacklist";

/// A parsed ignore-list update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ControlMessage {
    Add { id: EntityId },
    Remove { id: EntityId },
    Tablet {
        #[serde(deserialize_with = "left_or_right", default = "right_hand")]
        hand: Hand,
        #[serde(default)]
        blacklist: bool,
    },
}

/// Only a numeric `0` selects the left hand; any other value, or none, means right.
fn left_or_right<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Hand, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(if raw.as_f64() == Some(0.0) {
        Hand::Left
    } else {
        Hand::Right
    })
}

fn right_hand() -> Hand {
    Hand::Right
}

impl ControlMessage {
    pub fn parse(data: &str) -> Result<Self, ControlError> {
        Ok(serde_json::from_str(data)?)
    }
}

/// What happened to an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// State changed and the affected pointers were updated.
    Applied,
    /// Well-formed but already in effect.
    Unchanged,
    /// Wrong channel or untrusted sender.
    Ignored,
    /// Could not be parsed.
    Dropped,
}

/// Ids the hand ray pointers must not hit: a global list plus per-hand tablet entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreLists {
    global: Vec<EntityId>,
    tablet: [Vec<EntityId>; 2],
}

impl IgnoreLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn global(&self) -> &[EntityId] {
        &self.global
    }

    pub fn tablet(&self, hand: Hand) -> &[EntityId] {
        &self.tablet[hand.index()]
    }

    /// Returns true if `id` was not yet ignored.
    pub fn add(&mut self, id: EntityId) -> bool {
        if self.global.contains(&id) {
            return false;
        }
        self.global.push(id);
        true
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.global.len();
        self.global.retain(|g| *g != id);
        self.global.len() != before
    }

    /// Ignore the tablet surfaces for `hand`, or stop ignoring them.
    pub fn set_tablet(&mut self, hand: Hand, ignore: bool, ids: &TabletIds) {
        self.tablet[hand.index()] = if ignore {
            [
                ids.tablet,
                ids.tablet_screen,
                ids.home_button,
                ids.home_button_highlight,
            ]
            .into_iter()
            .flatten()
            .collect()
        } else {
            Vec::new()
        };
    }

    /// The full list for one hand's primary pointer: global entries, then tablet entries.
    pub fn for_hand(&self, hand: Hand) -> Vec<EntityId> {
        let mut ids = self.global.clone();
        ids.extend(self.tablet[hand.index()].iter().copied());
        ids
    }

    pub fn push_hand(&self, hand: Hand, pointers: &mut dyn PointerManager) {
        pointers.set_ignore_items(PointerId::primary(hand), &self.for_hand(hand));
    }

    pub fn push_all(&self, pointers: &mut dyn PointerManager) {
        for hand in Hand::BOTH {
            self.push_hand(hand, pointers);
        }
    }

    pub fn apply(
        &mut self,
        message: &ControlMessage,
        tablet: &TabletIds,
        pointers: &mut dyn PointerManager,
    ) -> ControlOutcome {
        match *message {
            ControlMessage::Add { id } => {
                if !self.add(id) {
                    return ControlOutcome::Unchanged;
                }
                tracing::debug!(%id, "ray pick ignore added");
                self.push_all(pointers);
            }
            ControlMessage::Remove { id } => {
                if !self.remove(id) {
                    return ControlOutcome::Unchanged;
                }
                tracing::debug!(%id, "ray pick ignore removed");
                self.push_all(pointers);
            }
            ControlMessage::Tablet { hand, blacklist } => {
                self.set_tablet(hand, blacklist, tablet);
                tracing::debug!(%hand, blacklist, "tablet ignore updated");
                self.push_hand(hand, pointers);
            }
        }
        ControlOutcome::Applied
    }
}
