//! Interaction dispatcher: decides each frame which interaction module controls
//! each hand, the head and the mouse, and hands every module the same spatial
//! snapshot.
//!
//! # Invariants
//! - Every resource slot has at most one owner.
//! - A module is running iff it owns all of its required slots.
//! - The spatial context is rebuilt each tick and never mutated by modules.
//! - A faulting module never stops the tick; nothing here is fatal.

pub mod builder;
pub mod config;
pub mod context;
pub mod control;
pub mod error;
pub mod module;
pub mod registry;
pub mod running;
pub mod runner;
pub mod scheduler;
pub mod slots;
pub mod timing;

#[cfg(test)]
mod testing;

pub use builder::{PointerSwitch, SpatialContextBuilder};
pub use config::DispatcherConfig;
pub use context::SpatialContext;
pub use control::{ControlMessage, ControlOutcome, IGNORE_CHANNEL, IgnoreLists};
pub use error::{CallbackPhase, ConfigError, ControlError, DispatchError, ModuleError, ModuleFault};
pub use module::{InteractionModule, Readiness, RunningValues};
pub use registry::{ModuleRegistry, ModuleTable, RegistryView};
pub use running::{ModuleRunState, RunningSet};
pub use runner::run_fixed_interval;
pub use scheduler::{Dispatcher, HOME_CHANNEL, TickReport};
pub use slots::{ResourceSlot, SlotTable, UnknownSlot};
pub use timing::{TickTimer, TimingStats};

pub fn crate_info() -> &'static str {
    concat!("handspace-dispatch v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("dispatch"));
    }
}
