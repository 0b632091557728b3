use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Hysteresis thresholds for treating an index/thumb pinch as a trigger click.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchThresholds {
    /// Tips closer than this (meters) start a click.
    pub on_below: f32,
    /// A tracker-driven click is released once tips are farther than this.
    pub off_above: f32,
}

impl Default for PinchThresholds {
    fn default() -> Self {
        Self {
            on_below: 0.016,
            off_above: 0.035,
        }
    }
}

/// Outcome of evaluating one hand's tip distance against the thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchEdge {
    Press,
    Release,
    Hold,
}

impl PinchThresholds {
    /// `tracker_clicked` is whether the current click was set by a previous pinch.
    /// Only tracked tips can press; releasing goes by distance alone.
    pub fn evaluate(
        &self,
        index_tip: Vec3,
        thumb_tip: Vec3,
        tips_valid: bool,
        tracker_clicked: bool,
    ) -> PinchEdge {
        let distance = index_tip.distance(thumb_tip);
        if tips_valid && distance < self.on_below {
            PinchEdge::Press
        } else if tracker_clicked && distance > self.off_above {
            PinchEdge::Release
        } else {
            PinchEdge::Hold
        }
    }
}
