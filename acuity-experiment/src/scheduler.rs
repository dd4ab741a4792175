use crate::config::ExperimentConfig;
use crate::error::ExperimentError;
use crate::evaluate::{classify, ResponseEvent};
use crate::session::SessionRecord;
use crate::staircase::Staircase;
use crate::stream::StreamGenerator;
use acuity_core::{Eye, LogMar, SessionPhase, StimulusFrame, TrialOutcome, TrialRecord};
use acuity_timing::Timer;
use acuity_trigger::{TriggerCode, TriggerPort};
use log::{debug, info, warn};
use rand::Rng;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("renderer failure: {0}")]
pub struct RenderError(#[from] pub std::io::Error);

#[derive(Debug, Error)]
#[error("response capture failure: {0}")]
pub struct InputError(#[from] pub std::io::Error);

/// Stimulus presentation seam. Implementations own the display and block
/// for the requested duration, synchronized to their own refresh.
pub trait Renderer {
    fn present_frame(&mut self, frame: &StimulusFrame, size: LogMar) -> Result<(), RenderError>;
    fn present_fixation(&mut self, duration: Duration) -> Result<(), RenderError>;
}

/// Response capture seam.
pub trait ResponseInput {
    fn is_connected(&self) -> bool;
    /// Waits up to `window` for a key press; `None` on timeout.
    fn await_response(&mut self, window: Duration) -> Result<Option<ResponseEvent>, InputError>;
}

/// Operator abort flag, checked at trial boundaries only; a running frame
/// always completes.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub block: String,
    pub trials: usize,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub participant: String,
    pub blocks: Vec<BlockSummary>,
    pub left_threshold: Option<LogMar>,
    pub right_threshold: Option<LogMar>,
    pub total_trials: usize,
}

/// Drives the whole session: practice, then response and passive blocks
/// per eye, in fixed order. Owns the session context (config, staircase,
/// record) and is the sole writer of the record.
pub struct BlockScheduler<T: Timer, R: Rng> {
    config: ExperimentConfig,
    timer: T,
    rng: R,
    generator: StreamGenerator,
    staircase: Staircase,
    record: SessionRecord,
    phase: SessionPhase,
    cancel: CancelToken,
    trigger_warned: bool,
    left_threshold: Option<LogMar>,
    right_threshold: Option<LogMar>,
}

impl<T: Timer, R: Rng> BlockScheduler<T, R> {
    pub fn new(
        config: ExperimentConfig,
        record: SessionRecord,
        timer: T,
        rng: R,
    ) -> Result<Self, ExperimentError> {
        config.validate()?;
        let generator = StreamGenerator::from_config(&config);
        let staircase = Staircase::new(&config.staircase);
        Ok(Self {
            config,
            timer,
            rng,
            generator,
            staircase,
            record,
            phase: SessionPhase::default(),
            cancel: CancelToken::new(),
            trigger_warned: false,
            left_threshold: None,
            right_threshold: None,
        })
    }

    /// Handle for the operator control surface; cancelling takes effect
    /// before the next trial's frames begin.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn record(&self) -> &SessionRecord {
        &self.record
    }

    pub fn run(
        &mut self,
        renderer: &mut dyn Renderer,
        input: &mut dyn ResponseInput,
        trigger: &mut dyn TriggerPort,
    ) -> Result<SessionSummary, ExperimentError> {
        // Responsive blocks are always part of the fixed sequence, so a
        // missing capture device is fatal up front.
        if !input.is_connected() {
            return Err(ExperimentError::ResponseDeviceMissing(
                SessionPhase::Practice.label(),
            ));
        }

        while !self.phase.is_terminal() {
            self.run_block(renderer, input, trigger)?;
            let finished = self.phase;
            if let (true, Some(eye)) = (finished.is_adaptive(), finished.eye()) {
                let threshold = self.staircase.threshold();
                info!("{} eye threshold: LogMAR {threshold}", eye.label());
                match eye {
                    Eye::Left => self.left_threshold = Some(threshold),
                    Eye::Right => self.right_threshold = Some(threshold),
                }
            }
            self.phase = finished.next().unwrap_or(SessionPhase::Complete);
        }

        self.record.finalize()?;
        info!("session complete: {} trials recorded", self.record.len());
        Ok(self.summary())
    }

    fn run_block(
        &mut self,
        renderer: &mut dyn Renderer,
        input: &mut dyn ResponseInput,
        trigger: &mut dyn TriggerPort,
    ) -> Result<(), ExperimentError> {
        let phase = self.phase;
        let trials = self.block_trials(phase);
        info!("block {} starting, {} trials", phase.label(), trials);
        self.emit(trigger, TriggerCode::BlockStart);

        // Each eye gets a fresh staircase; the passive block that follows
        // presents at the size the active block converged on.
        if phase.is_adaptive() {
            self.staircase = Staircase::new(&self.config.staircase);
        }

        for index in 1..=trials {
            if self.cancel.is_cancelled() {
                info!("session cancelled before trial {index} of {}", phase.label());
                return Err(ExperimentError::Cancelled);
            }
            self.run_trial(phase, index, renderer, input, trigger)?;
        }
        Ok(())
    }

    fn run_trial(
        &mut self,
        phase: SessionPhase,
        index: usize,
        renderer: &mut dyn Renderer,
        input: &mut dyn ResponseInput,
        trigger: &mut dyn TriggerPort,
    ) -> Result<(), ExperimentError> {
        let size = self.staircase.current();
        let frame_duration = self.frame_duration(phase);
        let trial = self.generator.next_trial(&mut self.rng, size, frame_duration)?;
        debug!(
            "trial {index} of {}: target {} at position {}, LogMAR {size}",
            phase.label(),
            trial.target,
            trial.target_position
        );

        renderer.present_fixation(Duration::from_millis(self.config.fixation_pre_ms))?;

        let mut target_onset_ns = self.timer.now_ns();
        for (frame_index, frame) in trial.frames.iter().enumerate() {
            if frame_index == 0 {
                self.emit(trigger, TriggerCode::TrialStart);
            }
            if frame.is_target {
                target_onset_ns = self.timer.now_ns();
                self.emit(trigger, TriggerCode::TargetOnset);
            }
            renderer.present_frame(frame, size)?;
        }
        self.emit(trigger, TriggerCode::StreamEnd);

        let post_stream_ms = if phase.requires_response() {
            self.config.fixation_post_response_ms
        } else {
            self.config.fixation_post_passive_ms
        };
        renderer.present_fixation(Duration::from_millis(post_stream_ms))?;

        let window = self.config.response_window();
        let response = if phase.requires_response() {
            // The window is anchored to target onset; part of it has
            // already elapsed during the tail of the stream.
            let spent = self.timer.elapsed(target_onset_ns);
            let remaining = window.saturating_sub(spent);
            let event = input.await_response(remaining)?;
            if event.is_some() {
                self.emit(trigger, TriggerCode::Response);
            }
            event.map(|ev| {
                let latency = Duration::from_nanos(ev.at_ns.saturating_sub(target_onset_ns));
                (ev.key, latency)
            })
        } else {
            None
        };

        let outcome = classify(trial.target, phase.requires_response(), response, window);

        let adaptive = phase.is_adaptive() || (phase.is_practice() && self.config.practice_adaptive);
        if adaptive && outcome.is_scored() {
            self.staircase.update(outcome.is_correct());
        }

        let latency_ms = match outcome {
            TrialOutcome::Hit | TrialOutcome::FalseResponse => {
                response.map(|(_, latency)| latency.as_millis() as u64)
            }
            _ => None,
        };
        self.record.append(TrialRecord {
            participant: self.config.participant.clone(),
            eye: phase.eye(),
            block: phase.label().to_string(),
            trial_index: index,
            logmar: size,
            target: trial.target,
            outcome,
            response_latency_ms: latency_ms,
        })?;
        info!(
            "trial {index}/{} in {}: {:?} at LogMAR {size}",
            self.block_trials(phase),
            phase.label(),
            outcome
        );
        Ok(())
    }

    fn block_trials(&self, phase: SessionPhase) -> usize {
        if phase.is_practice() {
            self.config.practice_trials
        } else {
            self.config.trials_per_block
        }
    }

    fn frame_duration(&self, phase: SessionPhase) -> Duration {
        if phase.is_practice() {
            self.config.practice_frame_duration()
        } else {
            self.config.frame_duration()
        }
    }

    /// Trigger loss is non-fatal; warn once, then degrade quietly.
    fn emit(&mut self, trigger: &mut dyn TriggerPort, code: TriggerCode) {
        if let Err(err) = trigger.send(code) {
            if self.trigger_warned {
                debug!("trigger {} dropped: {err}", code.value());
            } else {
                warn!("trigger channel unavailable, continuing without hardware sync: {err}");
                self.trigger_warned = true;
            }
        }
    }

    fn summary(&self) -> SessionSummary {
        let mut blocks = Vec::new();
        let mut phase = Some(SessionPhase::default());
        while let Some(current) = phase {
            if current.is_terminal() {
                break;
            }
            let label = current.label();
            blocks.push(BlockSummary {
                block: label.to_string(),
                trials: self.record.records().iter().filter(|r| r.block == label).count(),
                accuracy: self.record.block_accuracy(label),
            });
            phase = current.next();
        }
        SessionSummary {
            participant: self.config.participant.clone(),
            blocks,
            left_threshold: self.left_threshold,
            right_threshold: self.right_threshold,
            total_trials: self.record.len(),
        }
    }
}
