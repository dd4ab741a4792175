use std::time::Duration;

/// Sloan letters used as targets.
pub const SLOAN_LETTERS: [char; 10] = ['C', 'D', 'H', 'K', 'N', 'F', 'R', 'S', 'V', 'Z'];

/// Distractor digits; 0 is excluded for its letter-like shape.
pub const DIGIT_DISTRACTORS: [char; 9] = ['1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// One element of an RSVP stream: a single symbol shown for a fixed
/// duration at one screen location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StimulusFrame {
    pub symbol: char,
    pub is_target: bool,
    pub duration: Duration,
}

impl StimulusFrame {
    pub fn distractor(symbol: char, duration: Duration) -> Self {
        StimulusFrame {
            symbol,
            is_target: false,
            duration,
        }
    }

    pub fn target(symbol: char, duration: Duration) -> Self {
        StimulusFrame {
            symbol,
            is_target: true,
            duration,
        }
    }
}
