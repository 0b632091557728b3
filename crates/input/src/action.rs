use handspace_common::Hand;
use std::fmt;
use std::str::FromStr;

/// A per-hand input change produced by the controller mapping.
///
/// The dispatcher consumes actions, never raw channel events, so a physical
/// trigger and a hand-tracking pinch drive the same state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControllerAction {
    /// Analog trigger travel in `[0, 1]`.
    TriggerPress { hand: Hand, value: f32 },
    /// Trigger fully clicked / released.
    TriggerClick { hand: Hand, clicked: bool },
    /// Bumper or grip travel in `[0, 1]`.
    SecondaryPress { hand: Hand, value: f32 },
    /// No-op (channel not bound).
    Noop,
}

/// Standard controller channels the dispatcher peeks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardInput {
    RT,
    RTClick,
    LT,
    LTClick,
    RB,
    LB,
    LeftGrip,
    RightGrip,
}

impl StandardInput {
    pub const ALL: [StandardInput; 8] = [
        StandardInput::RT,
        StandardInput::RTClick,
        StandardInput::LT,
        StandardInput::LTClick,
        StandardInput::RB,
        StandardInput::LB,
        StandardInput::LeftGrip,
        StandardInput::RightGrip,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StandardInput::RT => "RT",
            StandardInput::RTClick => "RTClick",
            StandardInput::LT => "LT",
            StandardInput::LTClick => "LTClick",
            StandardInput::RB => "RB",
            StandardInput::LB => "LB",
            StandardInput::LeftGrip => "LeftGrip",
            StandardInput::RightGrip => "RightGrip",
        }
    }

    /// Map a raw channel value onto the action it drives.
    ///
    /// Bumper and grip both feed the secondary value of their hand. Click
    /// channels treat any non-zero value as clicked.
    pub fn to_action(self, value: f32) -> ControllerAction {
        match self {
            StandardInput::RT => ControllerAction::TriggerPress {
                hand: Hand::Right,
                value,
            },
            StandardInput::LT => ControllerAction::TriggerPress {
                hand: Hand::Left,
                value,
            },
            StandardInput::RTClick => ControllerAction::TriggerClick {
                hand: Hand::Right,
                clicked: value != 0.0,
            },
            StandardInput::LTClick => ControllerAction::TriggerClick {
                hand: Hand::Left,
                clicked: value != 0.0,
            },
            StandardInput::RB | StandardInput::RightGrip => ControllerAction::SecondaryPress {
                hand: Hand::Right,
                value,
            },
            StandardInput::LB | StandardInput::LeftGrip => ControllerAction::SecondaryPress {
                hand: Hand::Left,
                value,
            },
        }
    }
}

impl fmt::Display for StandardInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors from parsing controller channel names.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("unknown controller channel: {0}")]
    UnknownChannel(String),
}

impl FromStr for StandardInput {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StandardInput::ALL
            .into_iter()
            .find(|input| input.name() == s)
            .ok_or_else(|| InputError::UnknownChannel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_channels_map_to_their_hand() {
        assert_eq!(
            StandardInput::LT.to_action(0.4),
            ControllerAction::TriggerPress {
                hand: Hand::Left,
                value: 0.4
            }
        );
        assert_eq!(
            StandardInput::RTClick.to_action(1.0),
            ControllerAction::TriggerClick {
                hand: Hand::Right,
                clicked: true
            }
        );
    }

    #[test]
    fn bumper_and_grip_share_secondary() {
        let bumper = StandardInput::LB.to_action(0.7);
        let grip = StandardInput::LeftGrip.to_action(0.7);
        assert_eq!(bumper, grip);
        assert!(matches!(
            StandardInput::RightGrip.to_action(1.0),
            ControllerAction::SecondaryPress {
                hand: Hand::Right,
                ..
            }
        ));
    }

    #[test]
    fn channel_names_parse() {
        for input in StandardInput::ALL {
            assert_eq!(input.name().parse::<StandardInput>().unwrap(), input);
        }
        assert!("Thumbstick".parse::<StandardInput>().is_err());
    }
}
