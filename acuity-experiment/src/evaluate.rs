use acuity_core::TrialOutcome;
use std::time::Duration;

/// A captured key press, timestamped in nanoseconds on the session clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseEvent {
    pub key: char,
    pub at_ns: u64,
}

/// Classifies one trial.
///
/// `response` carries the pressed key and its latency re-based to
/// target-frame onset; detection latency is anchored to when the target
/// appeared, not to stream start. An event past the window is identical to
/// no event at all. Passive trials are always `NoResponse` and never enter
/// accuracy tallies.
pub fn classify(
    target: char,
    requires_response: bool,
    response: Option<(char, Duration)>,
    window: Duration,
) -> TrialOutcome {
    if !requires_response {
        return TrialOutcome::NoResponse;
    }
    match response {
        Some((key, latency)) if latency <= window => {
            if key.eq_ignore_ascii_case(&target) {
                TrialOutcome::Hit
            } else {
                TrialOutcome::FalseResponse
            }
        }
        _ => TrialOutcome::Miss,
    }
}
