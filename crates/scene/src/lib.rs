//! Simulation scene: an in-memory stand-in for the client's entity tree, ray
//! pointers, avatar state and laser rendering.
//!
//! # Invariants
//! - Proximity queries are exact (sphere test) after a coarse grid lookup.
//! - Query results are returned in id order so scripted runs are reproducible.

mod grid;
mod pointers;
mod scene;

pub use grid::{CellCoord, SpatialGrid};
pub use pointers::{PointerCall, RecordingPointers};
pub use scene::{ObjectKind, SimScene};

pub fn crate_info() -> &'static str {
    concat!("handspace-scene v", env!("CARGO_PKG_VERSION"))
}
