use handspace_common::{Hand, HandPose};
use serde::Serialize;

use crate::action::ControllerAction;
use crate::pinch::{PinchEdge, PinchThresholds};

/// Per-hand input values as seen by modules during one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct HandInputs {
    pub trigger_values: [f32; 2],
    pub trigger_clicks: [bool; 2],
    pub secondary_values: [f32; 2],
}

impl HandInputs {
    pub fn trigger_value(&self, hand: Hand) -> f32 {
        self.trigger_values[hand.index()]
    }

    pub fn trigger_clicked(&self, hand: Hand) -> bool {
        self.trigger_clicks[hand.index()]
    }

    pub fn secondary_value(&self, hand: Hand) -> f32 {
        self.secondary_values[hand.index()]
    }
}

/// Latest controller values, updated as mapped channel events arrive.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    current: HandInputs,
    /// Whether a hand's click was produced by a hand-tracking pinch.
    tracker_clicked: [bool; 2],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, action: ControllerAction) {
        match action {
            ControllerAction::TriggerPress { hand, value } => {
                self.current.trigger_values[hand.index()] = value;
            }
            ControllerAction::TriggerClick { hand, clicked } => {
                self.current.trigger_clicks[hand.index()] = clicked;
            }
            ControllerAction::SecondaryPress { hand, value } => {
                self.current.secondary_values[hand.index()] = value;
            }
            ControllerAction::Noop => {}
        }
    }

    /// Feed one hand's finger-tip poses through the pinch detector.
    pub fn apply_pinch(
        &mut self,
        hand: Hand,
        index_tip: &HandPose,
        thumb_tip: &HandPose,
        thresholds: &PinchThresholds,
    ) {
        let i = hand.index();
        let edge = thresholds.evaluate(
            index_tip.position(),
            thumb_tip.position(),
            index_tip.valid && thumb_tip.valid,
            self.tracker_clicked[i],
        );
        match edge {
            PinchEdge::Press => {
                if !self.tracker_clicked[i] {
                    tracing::debug!(%hand, "pinch click");
                }
                self.current.trigger_clicks[i] = true;
                self.current.trigger_values[i] = 1.0;
                self.tracker_clicked[i] = true;
            }
            PinchEdge::Release => {
                tracing::debug!(%hand, "pinch release");
                self.current.trigger_clicks[i] = false;
                self.current.trigger_values[i] = 0.0;
                self.tracker_clicked[i] = false;
            }
            PinchEdge::Hold => {}
        }
    }

    pub fn is_tracker_clicked(&self, hand: Hand) -> bool {
        self.tracker_clicked[hand.index()]
    }

    pub fn snapshot(&self) -> HandInputs {
        self.current
    }
}
