use handspace_common::Hand;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An exclusively ownable interaction resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceSlot {
    Head,
    LeftHand,
    RightHand,
    LeftHandTrigger,
    RightHandTrigger,
    LeftHandEquip,
    RightHandEquip,
    Mouse,
}

impl ResourceSlot {
    pub const COUNT: usize = 8;

    pub const ALL: [ResourceSlot; Self::COUNT] = [
        ResourceSlot::Head,
        ResourceSlot::LeftHand,
        ResourceSlot::RightHand,
        ResourceSlot::LeftHandTrigger,
        ResourceSlot::RightHandTrigger,
        ResourceSlot::LeftHandEquip,
        ResourceSlot::RightHandEquip,
        ResourceSlot::Mouse,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn hand(hand: Hand) -> Self {
        match hand {
            Hand::Left => ResourceSlot::LeftHand,
            Hand::Right => ResourceSlot::RightHand,
        }
    }

    pub const fn hand_trigger(hand: Hand) -> Self {
        match hand {
            Hand::Left => ResourceSlot::LeftHandTrigger,
            Hand::Right => ResourceSlot::RightHandTrigger,
        }
    }

    pub const fn hand_equip(hand: Hand) -> Self {
        match hand {
            Hand::Left => ResourceSlot::LeftHandEquip,
            Hand::Right => ResourceSlot::RightHandEquip,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ResourceSlot::Head => "head",
            ResourceSlot::LeftHand => "leftHand",
            ResourceSlot::RightHand => "rightHand",
            ResourceSlot::LeftHandTrigger => "leftHandTrigger",
            ResourceSlot::RightHandTrigger => "rightHandTrigger",
            ResourceSlot::LeftHandEquip => "leftHandEquip",
            ResourceSlot::RightHandEquip => "rightHandEquip",
            ResourceSlot::Mouse => "mouse",
        }
    }
}

impl fmt::Display for ResourceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown resource slot: {0}")]
pub struct UnknownSlot(pub String);

impl FromStr for ResourceSlot {
    type Err = UnknownSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceSlot::ALL
            .into_iter()
            .find(|slot| slot.name() == s)
            .ok_or_else(|| UnknownSlot(s.to_string()))
    }
}

/// Ownership table for every resource slot: free, or the owning module's name.
///
/// Touched only by the scheduler between callbacks, so the
/// check-then-claim pair needs no locking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotTable {
    owners: [Option<String>; ResourceSlot::COUNT],
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff every slot in `required` is free.
    pub fn slots_available(&self, required: &[ResourceSlot]) -> bool {
        required.iter().all(|slot| self.is_free(*slot))
    }

    /// Mark every slot in `required` as owned by `name`.
    ///
    /// Callers check [`slots_available`](Self::slots_available) first in the same tick.
    pub fn claim(&mut self, name: &str, required: &[ResourceSlot]) {
        debug_assert!(
            required
                .iter()
                .all(|s| self.owner(*s).is_none_or(|owner| owner == name)),
            "claiming an owned slot"
        );
        for slot in required {
            self.owners[slot.index()] = Some(name.to_string());
        }
    }

    /// Free every slot currently owned by `name`. Returns how many were freed.
    pub fn release(&mut self, name: &str) -> usize {
        let mut freed = 0;
        for owner in &mut self.owners {
            if owner.as_deref() == Some(name) {
                *owner = None;
                freed += 1;
            }
        }
        freed
    }

    /// Free every slot. Returns how many were owned.
    pub fn release_all(&mut self) -> usize {
        let mut freed = 0;
        for owner in &mut self.owners {
            if owner.take().is_some() {
                freed += 1;
            }
        }
        freed
    }

    pub fn is_free(&self, slot: ResourceSlot) -> bool {
        self.owners[slot.index()].is_none()
    }

    pub fn owner(&self, slot: ResourceSlot) -> Option<&str> {
        self.owners[slot.index()].as_deref()
    }

    pub fn owned_by(&self, name: &str) -> Vec<ResourceSlot> {
        ResourceSlot::ALL
            .into_iter()
            .filter(|slot| self.owner(*slot) == Some(name))
            .collect()
    }

    pub fn owns_all(&self, name: &str, required: &[ResourceSlot]) -> bool {
        required.iter().all(|slot| self.owner(*slot) == Some(name))
    }

    /// Every slot with its owner, in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceSlot, Option<&str>)> + '_ {
        ResourceSlot::ALL
            .into_iter()
            .map(|slot| (slot, self.owner(slot)))
    }

    pub fn free_count(&self) -> usize {
        self.owners.iter().filter(|o| o.is_none()).count()
    }
}
