//! Experiment controller for an RSVP visual-acuity task.
//!
//! The scheduler walks a fixed sequence of practice and per-eye blocks,
//! presenting rapid symbol streams whose size is driven by an adaptive
//! LogMAR staircase. Rendering, response capture, and trigger transport
//! are collaborator traits supplied by the caller.

pub mod config;
pub mod error;
pub mod evaluate;
pub mod scheduler;
pub mod session;
pub mod staircase;
pub mod stream;

pub use config::{ExperimentConfig, StaircaseConfig};
pub use error::{ConfigError, ExperimentError};
pub use evaluate::{classify, ResponseEvent};
pub use scheduler::{
    BlockScheduler, BlockSummary, CancelToken, InputError, RenderError, Renderer, ResponseInput,
    SessionSummary,
};
pub use session::{PersistError, SessionRecord};
pub use staircase::Staircase;
pub use stream::{StreamGenerator, Trial};
