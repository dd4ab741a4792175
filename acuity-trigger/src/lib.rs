//! Hardware trigger port for EEG/timing synchronization.
//!
//! Codes are single bytes written to an external recording device. Delivery
//! is best effort: a missing or wedged device must never stall the
//! presentation clock, so transports carry short write timeouts and report
//! failure through `Result` rather than blocking or panicking.

pub mod port;

pub use port::{NullTrigger, SerialTrigger, TriggerError, TriggerPort};

/// Event markers written to the recording hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerCode {
    /// Onset of the first stream item.
    TrialStart = 1,
    TargetOnset = 2,
    /// End of stream, onset of the post-stream fixation.
    StreamEnd = 3,
    BlockStart = 4,
    Response = 5,
}

impl TriggerCode {
    pub fn value(self) -> u8 {
        self as u8
    }
}
