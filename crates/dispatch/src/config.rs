use handspace_input::PinchThresholds;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Dispatcher configuration: tick rate, query radii and diagnostics switches.
///
/// Radii are in meters at avatar scale 1 and are multiplied by the avatar's
/// sensor-to-world scale each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Target tick rate.
    pub target_hz: f32,
    /// Radius for nearby entity and overlay queries.
    pub near_max_radius: f32,
    /// Tighter radius the tablet and mini tablet must be inside to count as nearby.
    pub near_tablet_max_radius: f32,
    /// Primary-ray entity hits closer than this are merged into the nearby list.
    pub near_grab_pick_radius: f32,
    /// Length of the search ray attached to each valid hand's primary pick.
    pub search_ray_length: f32,
    /// Interval deviation counted as high jitter.
    pub high_jitter_ms: f32,
    /// Interval deviation counted as very high jitter.
    pub very_high_jitter_ms: f32,
    /// Number of recent tick intervals kept for average/min/max.
    pub timing_history: usize,
    /// Log the tick rate every N ticks; 0 disables.
    pub fps_report_interval: u64,
    /// Drive trigger clicks from hand-tracking pinches.
    pub hand_tracking_click: bool,
    pub pinch: PinchThresholds,
    /// Per-hand module names (left, right) whose running state makes a primary
    /// laser press on a web surface fire a stylus haptic pulse.
    pub web_surface_lasers: [String; 2],
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            target_hz: 60.0,
            near_max_radius: 0.1,
            near_tablet_max_radius: 0.05,
            near_grab_pick_radius: 0.25,
            search_ray_length: 1000.0,
            high_jitter_ms: 1.0,
            very_high_jitter_ms: 5.0,
            timing_history: 120,
            fps_report_interval: 0,
            hand_tracking_click: false,
            pinch: PinchThresholds::default(),
            web_surface_lasers: [
                "LeftWebSurfaceLaserInput".into(),
                "RightWebSurfaceLaserInput".into(),
            ],
        }
    }
}

impl DispatcherConfig {
    /// Target interval between ticks. Zero when `target_hz` is not a usable rate.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f32(1.0 / self.target_hz).unwrap_or(Duration::ZERO)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded dispatcher config");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_hz.is_finite() && self.target_hz > 0.0) {
            return Err(ConfigError::Invalid {
                field: "target_hz",
                reason: format!("must be positive, got {}", self.target_hz),
            });
        }
        let radii = [
            ("near_max_radius", self.near_max_radius),
            ("near_tablet_max_radius", self.near_tablet_max_radius),
            ("near_grab_pick_radius", self.near_grab_pick_radius),
            ("search_ray_length", self.search_ray_length),
        ];
        for (field, value) in radii {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        if self.near_tablet_max_radius > self.near_max_radius {
            return Err(ConfigError::Invalid {
                field: "near_tablet_max_radius",
                reason: "must not exceed near_max_radius".into(),
            });
        }
        for (field, value) in [
            ("high_jitter_ms", self.high_jitter_ms),
            ("very_high_jitter_ms", self.very_high_jitter_ms),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative number, got {value}"),
                });
            }
        }
        if self.very_high_jitter_ms < self.high_jitter_ms {
            return Err(ConfigError::Invalid {
                field: "very_high_jitter_ms",
                reason: "must be at least high_jitter_ms".into(),
            });
        }
        if self.timing_history == 0 {
            return Err(ConfigError::Invalid {
                field: "timing_history",
                reason: "must keep at least one interval".into(),
            });
        }
        if self.pinch.off_above < self.pinch.on_below {
            return Err(ConfigError::Invalid {
                field: "pinch",
                reason: "off_above must be at least on_below".into(),
            });
        }
        Ok(())
    }
}
