//! Controller input: standard controller channels mapped to per-hand actions.
//!
//! # Invariants
//! - Modules never see raw channels, only the per-tick [`HandInputs`] snapshot.
//! - Hand-tracking pinch writes the same values a physical trigger would.

pub mod action;
pub mod pinch;
pub mod state;

pub use action::{ControllerAction, InputError, StandardInput};
pub use pinch::{PinchEdge, PinchThresholds};
pub use state::{HandInputs, InputState};

pub fn crate_info() -> &'static str {
    concat!("handspace-input v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("input"));
    }
}
