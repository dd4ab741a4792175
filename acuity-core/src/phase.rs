use serde::{Deserialize, Serialize};

/// Which eye is uncovered during a measurement block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub fn label(&self) -> &'static str {
        match self {
            Eye::Left => "left",
            Eye::Right => "right",
        }
    }
}

/// Session phases in their fixed presentation order.
///
/// The scheduler only ever moves forward through this sequence; `Complete`
/// is terminal and generates no trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SessionPhase {
    #[default]
    Practice,
    LeftActive,
    LeftPassive,
    RightActive,
    RightPassive,
    Complete,
}

impl SessionPhase {
    pub fn next(&self) -> Option<Self> {
        use SessionPhase::*;
        Some(match self {
            Practice => LeftActive,
            LeftActive => LeftPassive,
            LeftPassive => RightActive,
            RightActive => RightPassive,
            RightPassive => Complete,
            Complete => return None,
        })
    }

    pub fn eye(&self) -> Option<Eye> {
        match self {
            SessionPhase::LeftActive | SessionPhase::LeftPassive => Some(Eye::Left),
            SessionPhase::RightActive | SessionPhase::RightPassive => Some(Eye::Right),
            _ => None,
        }
    }

    /// Passive blocks present streams but never solicit a response.
    pub fn requires_response(&self) -> bool {
        matches!(
            self,
            SessionPhase::Practice | SessionPhase::LeftActive | SessionPhase::RightActive
        )
    }

    /// Active measurement blocks drive the staircase; practice only does so
    /// when the configuration opts in.
    pub fn is_adaptive(&self) -> bool {
        matches!(self, SessionPhase::LeftActive | SessionPhase::RightActive)
    }

    pub fn is_practice(&self) -> bool {
        matches!(self, SessionPhase::Practice)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionPhase::Complete)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Practice => "practice",
            SessionPhase::LeftActive => "left_eye_response",
            SessionPhase::LeftPassive => "left_eye_no_response",
            SessionPhase::RightActive => "right_eye_response",
            SessionPhase::RightPassive => "right_eye_no_response",
            SessionPhase::Complete => "complete",
        }
    }
}
