use crate::config::ExperimentConfig;
use crate::error::ExperimentError;
use acuity_core::{LogMar, StimulusFrame};
use rand::Rng;
use std::time::Duration;

/// One generated RSVP trial. The size is fixed at generation time and is
/// never adjusted retroactively.
#[derive(Debug, Clone)]
pub struct Trial {
    pub target: char,
    pub target_position: usize,
    pub frames: Vec<StimulusFrame>,
    pub logmar: LogMar,
    pub frame_duration: Duration,
}

/// Builds trial streams: one target letter surrounded by digit distractors
/// with no immediate symbol repeats. Every request is a fresh random draw;
/// reproducibility comes from seeding the injected `Rng`, not from replay.
#[derive(Debug, Clone)]
pub struct StreamGenerator {
    targets: Vec<char>,
    distractors: Vec<char>,
    stream_len: usize,
    pos_min: usize,
    pos_max: usize,
}

impl StreamGenerator {
    pub fn from_config(config: &ExperimentConfig) -> Self {
        Self {
            targets: config.targets.clone(),
            distractors: config.distractors.clone(),
            stream_len: config.stream_len,
            pos_min: config.target_pos_min,
            pos_max: config.target_pos_max,
        }
    }

    pub fn next_trial<R: Rng>(
        &self,
        rng: &mut R,
        logmar: LogMar,
        frame_duration: Duration,
    ) -> Result<Trial, ExperimentError> {
        let target = self.targets[rng.random_range(0..self.targets.len())];
        let target_position = rng.random_range(self.pos_min..=self.pos_max);

        let mut frames = Vec::with_capacity(self.stream_len);
        let mut previous: Option<char> = None;
        for index in 0..self.stream_len {
            if index == target_position {
                frames.push(StimulusFrame::target(target, frame_duration));
                previous = Some(target);
            } else {
                let mut symbol = self.distractors[rng.random_range(0..self.distractors.len())];
                while previous == Some(symbol) {
                    symbol = self.distractors[rng.random_range(0..self.distractors.len())];
                }
                frames.push(StimulusFrame::distractor(symbol, frame_duration));
                previous = Some(symbol);
            }
        }

        let trial = Trial {
            target,
            target_position,
            frames,
            logmar,
            frame_duration,
        };
        self.check_invariants(&trial)?;
        Ok(trial)
    }

    /// A violation here is a configuration bug and must never reach
    /// rendering.
    fn check_invariants(&self, trial: &Trial) -> Result<(), ExperimentError> {
        let target_count = trial.frames.iter().filter(|f| f.is_target).count();
        if target_count != 1 {
            return Err(ExperimentError::StreamInvariant(format!(
                "{target_count} target frames in stream"
            )));
        }
        if trial.target_position == 0 || trial.target_position >= trial.frames.len() - 1 {
            return Err(ExperimentError::StreamInvariant(format!(
                "target at unmasked position {} of {}",
                trial.target_position,
                trial.frames.len()
            )));
        }
        if trial.frames.len() != self.stream_len {
            return Err(ExperimentError::StreamInvariant(format!(
                "stream has {} frames, expected {}",
                trial.frames.len(),
                self.stream_len
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> StreamGenerator {
        StreamGenerator::from_config(&ExperimentConfig::default())
    }

    #[test]
    fn exactly_one_interior_target() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let trial = gen
                .next_trial(&mut rng, LogMar::new(0.5), Duration::from_millis(100))
                .unwrap();
            let targets: Vec<_> = trial
                .frames
                .iter()
                .enumerate()
                .filter(|(_, f)| f.is_target)
                .collect();
            assert_eq!(targets.len(), 1);
            let (pos, frame) = targets[0];
            assert_eq!(pos, trial.target_position);
            assert_eq!(frame.symbol, trial.target);
            assert!(pos >= 3 && pos <= 8);
        }
    }

    #[test]
    fn no_adjacent_symbol_repeats() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let trial = gen
                .next_trial(&mut rng, LogMar::new(0.5), Duration::from_millis(100))
                .unwrap();
            for pair in trial.frames.windows(2) {
                assert_ne!(pair[0].symbol, pair[1].symbol);
            }
        }
    }

    #[test]
    fn frames_carry_size_and_duration() {
        let gen = generator();
        let mut rng = StdRng::seed_from_u64(1);
        let duration = Duration::from_millis(150);
        let trial = gen
            .next_trial(&mut rng, LogMar::new(0.7), duration)
            .unwrap();
        assert_eq!(trial.logmar, LogMar::new(0.7));
        assert!(trial.frames.iter().all(|f| f.duration == duration));
    }

    #[test]
    fn same_seed_reproduces_the_stream() {
        let gen = generator();
        let duration = Duration::from_millis(100);
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let ta = gen.next_trial(&mut a, LogMar::new(0.5), duration).unwrap();
        let tb = gen.next_trial(&mut b, LogMar::new(0.5), duration).unwrap();
        assert_eq!(ta.frames, tb.frames);
        assert_eq!(ta.target, tb.target);
    }

    #[test]
    fn repeated_requests_are_fresh_draws() {
        let gen = generator();
        let duration = Duration::from_millis(100);
        let mut rng = StdRng::seed_from_u64(3);
        let first = gen.next_trial(&mut rng, LogMar::new(0.5), duration).unwrap();
        let any_different = (0..20).any(|_| {
            let next = gen.next_trial(&mut rng, LogMar::new(0.5), duration).unwrap();
            next.frames != first.frames
        });
        assert!(any_different);
    }
}
