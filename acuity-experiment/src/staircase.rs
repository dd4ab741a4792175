use crate::config::StaircaseConfig;
use acuity_core::LogMar;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Down,
    Up,
}

/// Adaptive LogMAR staircase.
///
/// Stepping down (smaller, harder) requires `down_count` consecutive
/// correct responses; any error steps up immediately. Every adjustment is
/// clamped to `[floor, ceiling]`. A direction change records a reversal at
/// the pre-step size; once `reversal_limit` reversals and `min_trials`
/// scored trials have accumulated the staircase freezes so the remaining
/// trials sample a stable threshold.
#[derive(Debug, Clone)]
pub struct Staircase {
    config: StaircaseConfig,
    current: LogMar,
    consecutive_correct: usize,
    direction: Option<Direction>,
    reversals: Vec<LogMar>,
    scored_trials: usize,
}

impl Staircase {
    pub fn new(config: &StaircaseConfig) -> Self {
        Self {
            config: config.clone(),
            current: config.start,
            consecutive_correct: 0,
            direction: None,
            reversals: Vec::new(),
            scored_trials: 0,
        }
    }

    /// Size for the next trial. Never mutates.
    pub fn current(&self) -> LogMar {
        self.current
    }

    pub fn reversal_count(&self) -> usize {
        self.reversals.len()
    }

    pub fn converged(&self) -> bool {
        self.reversals.len() >= self.config.reversal_limit
            && self.scored_trials >= self.config.min_trials
    }

    /// Applies one scored outcome. Call exactly once per scored trial;
    /// passive and non-adaptive trials must not reach here.
    pub fn update(&mut self, correct: bool) {
        if self.converged() {
            self.scored_trials += 1;
            return;
        }
        self.scored_trials += 1;

        if correct {
            self.consecutive_correct += 1;
            if self.consecutive_correct >= self.config.down_count {
                self.consecutive_correct = 0;
                self.shift(Direction::Down);
            }
        } else {
            self.consecutive_correct = 0;
            self.shift(Direction::Up);
        }
    }

    /// Threshold estimate: mean of the last `reversal_limit` reversal
    /// sizes, or the current size while reversals are still scarce.
    pub fn threshold(&self) -> LogMar {
        let wanted = self.config.reversal_limit;
        if self.reversals.len() >= wanted {
            let tail = &self.reversals[self.reversals.len() - wanted..];
            let mean = tail.iter().map(LogMar::value).sum::<f64>() / wanted as f64;
            LogMar::new(mean)
        } else {
            self.current
        }
    }

    fn shift(&mut self, direction: Direction) {
        if self.direction.is_some_and(|prev| prev != direction) {
            self.reversals.push(self.current);
            debug!(
                "staircase reversal {} at LogMAR {}",
                self.reversals.len(),
                self.current
            );
        }
        self.direction = Some(direction);
        let next = match direction {
            Direction::Down => self.current.stepped_down(self.config.step),
            Direction::Up => self.current.stepped_up(self.config.step),
        };
        self.current = next.clamped(self.config.floor, self.config.ceiling);
    }
}
