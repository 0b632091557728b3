//! Developer tooling: dispatcher inspector and the bounded debug panel.
//!
//! # Invariants
//! - Tools only read dispatcher state; nothing here feeds back into a tick.

pub mod inspector;
pub mod panel;

pub use inspector::{DispatchInspector, DispatchSummary, RunningInfo, SlotInfo};
pub use panel::DebugPanel;

pub fn crate_info() -> &'static str {
    concat!("handspace-tools v", env!("CARGO_PKG_VERSION"))
}
