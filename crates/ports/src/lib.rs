//! Collaborator contracts: everything the dispatcher reads from or pushes to
//! the surrounding client.
//!
//! # Invariants
//! - Read-side collaborators are sampled at most once per query per tick.
//! - Only the pointer manager receives mutations.

mod contracts;
mod pick;
mod properties;

pub use contracts::{AvatarProvider, PointerManager, Ports, RaycastProvider, SpatialIndex, TabletIds};
pub use pick::{
    LaserLockInfo, LaserParams, MouseButton, PickKind, PointerEvent, PointerId, RayPick, SearchRay,
};
pub use properties::{EntityProperties, GrabProperties};

pub fn crate_info() -> &'static str {
    concat!("handspace-ports v", env!("CARGO_PKG_VERSION"))
}
