use crate::logmar::LogMar;
use crate::phase::Eye;
use serde::{Deserialize, Serialize};

/// Classification of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrialOutcome {
    /// Correct target letter reported within the response window.
    Hit,
    /// No report, or a report after the window closed.
    Miss,
    /// A wrong letter reported within the window.
    FalseResponse,
    /// Passive-block trial; never enters accuracy tallies.
    NoResponse,
}

impl TrialOutcome {
    /// Whether the outcome counts toward accuracy and staircase updates.
    pub fn is_scored(&self) -> bool {
        !matches!(self, TrialOutcome::NoResponse)
    }

    pub fn is_correct(&self) -> bool {
        matches!(self, TrialOutcome::Hit)
    }
}

/// Recorded result per trial, persisted one line at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialRecord {
    pub participant: String,
    pub eye: Option<Eye>,
    pub block: String,
    /// 1-based index within the block.
    pub trial_index: usize,
    pub logmar: LogMar,
    pub target: char,
    pub outcome: TrialOutcome,
    /// Latency from target-frame onset, absent for misses and passive trials.
    pub response_latency_ms: Option<u64>,
}
