pub mod logmar;
pub mod outcome;
pub mod phase;
pub mod stimulus;

pub use logmar::LogMar;
pub use outcome::{TrialOutcome, TrialRecord};
pub use phase::{Eye, SessionPhase};
pub use stimulus::{StimulusFrame, DIGIT_DISTRACTORS, SLOAN_LETTERS};
