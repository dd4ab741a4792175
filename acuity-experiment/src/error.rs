use crate::scheduler::{InputError, RenderError};
use crate::session::PersistError;
use acuity_core::LogMar;
use thiserror::Error;

/// Rejected before any block starts; a session never runs on a bad setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("target alphabet is empty")]
    EmptyTargets,
    #[error("at least two distractor symbols are required")]
    TooFewDistractors,
    #[error("symbol {0:?} appears in both the target and distractor sets")]
    OverlappingAlphabets(char),
    #[error("stream length {0} leaves no room for a surrounded target")]
    StreamTooShort(usize),
    #[error("target position range {min}..={max} must lie strictly inside a {len}-item stream")]
    TargetRange { min: usize, max: usize, len: usize },
    #[error("{0} must be nonzero")]
    ZeroDuration(&'static str),
    #[error("per-block trial count must be nonzero")]
    NoTrials,
    #[error("staircase step must be positive")]
    NonPositiveStep,
    #[error("staircase floor {floor} must be below ceiling {ceiling}")]
    InvertedSizeRange { floor: LogMar, ceiling: LogMar },
    #[error("staircase start {start} lies outside [{floor}, {ceiling}]")]
    StartOutOfRange {
        start: LogMar,
        floor: LogMar,
        ceiling: LogMar,
    },
    #[error("staircase rule counts must be nonzero")]
    ZeroRule,
}

/// Session-level failures. A response timeout is an outcome, never an
/// error; trigger-device loss is logged and degraded, never raised.
#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("no response device connected but block {0} requires responses")]
    ResponseDeviceMissing(&'static str),
    #[error(transparent)]
    Persistence(#[from] PersistError),
    #[error("generated stream violates an invariant: {0}")]
    StreamInvariant(String),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("session cancelled by operator")]
    Cancelled,
}
