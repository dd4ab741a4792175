use crate::error::ConfigError;
use acuity_core::{LogMar, DIGIT_DISTRACTORS, SLOAN_LETTERS};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Adaptive staircase parameters.
///
/// The exact rule is deliberately configurable: defaults follow the
/// 2-correct-down / 1-error-up convention with the reversal and minimum
/// trial counts used by the lab's existing protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaircaseConfig {
    pub start: LogMar,
    /// Size change per adjustment, in LogMAR units.
    pub step: f64,
    /// Consecutive correct responses required before stepping down.
    pub down_count: usize,
    pub floor: LogMar,
    pub ceiling: LogMar,
    /// Reversals after which the staircase converges and freezes.
    pub reversal_limit: usize,
    /// Scored trials required before convergence can be declared.
    pub min_trials: usize,
}

impl Default for StaircaseConfig {
    fn default() -> Self {
        Self {
            start: LogMar::new(1.0),
            step: 0.1,
            down_count: 2,
            floor: LogMar::new(-0.3),
            ceiling: LogMar::new(1.0),
            reversal_limit: 2,
            min_trials: 10,
        }
    }
}

/// Every tunable of a session, validated once before any block starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub participant: String,
    pub targets: Vec<char>,
    pub distractors: Vec<char>,
    pub stream_len: usize,
    /// Inclusive target position range; validation keeps it strictly inside
    /// the stream so the target is always masked on both sides.
    pub target_pos_min: usize,
    pub target_pos_max: usize,
    pub frame_ms: u64,
    /// Practice runs slower than measurement blocks.
    pub practice_frame_ms: u64,
    pub practice_trials: usize,
    pub trials_per_block: usize,
    pub fixation_pre_ms: u64,
    pub fixation_post_response_ms: u64,
    pub fixation_post_passive_ms: u64,
    /// Response window measured from target-frame onset.
    pub response_window_ms: u64,
    /// Whether practice outcomes drive the staircase.
    pub practice_adaptive: bool,
    pub staircase: StaircaseConfig,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            participant: String::new(),
            targets: SLOAN_LETTERS.to_vec(),
            distractors: DIGIT_DISTRACTORS.to_vec(),
            stream_len: 16,
            target_pos_min: 3,
            target_pos_max: 8,
            frame_ms: 100,
            practice_frame_ms: 150,
            practice_trials: 2,
            trials_per_block: 40,
            fixation_pre_ms: 700,
            fixation_post_response_ms: 500,
            fixation_post_passive_ms: 1000,
            response_window_ms: 4000,
            practice_adaptive: false,
            staircase: StaircaseConfig::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }

    pub fn practice_frame_duration(&self) -> Duration {
        Duration::from_millis(self.practice_frame_ms)
    }

    pub fn response_window(&self) -> Duration {
        Duration::from_millis(self.response_window_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::EmptyTargets);
        }
        // A single distractor could never satisfy the no-adjacent-repeat
        // rule across consecutive distractor frames.
        if self.distractors.len() < 2 {
            return Err(ConfigError::TooFewDistractors);
        }
        if let Some(shared) = self.targets.iter().find(|c| self.distractors.contains(c)) {
            return Err(ConfigError::OverlappingAlphabets(*shared));
        }
        if self.stream_len < 3 {
            return Err(ConfigError::StreamTooShort(self.stream_len));
        }
        if self.target_pos_min < 1
            || self.target_pos_max > self.stream_len - 2
            || self.target_pos_min > self.target_pos_max
        {
            return Err(ConfigError::TargetRange {
                min: self.target_pos_min,
                max: self.target_pos_max,
                len: self.stream_len,
            });
        }
        if self.frame_ms == 0 {
            return Err(ConfigError::ZeroDuration("frame_ms"));
        }
        if self.practice_frame_ms == 0 {
            return Err(ConfigError::ZeroDuration("practice_frame_ms"));
        }
        if self.response_window_ms == 0 {
            return Err(ConfigError::ZeroDuration("response_window_ms"));
        }
        if self.trials_per_block == 0 {
            return Err(ConfigError::NoTrials);
        }
        let stair = &self.staircase;
        if stair.step <= 0.0 {
            return Err(ConfigError::NonPositiveStep);
        }
        if stair.floor >= stair.ceiling {
            return Err(ConfigError::InvertedSizeRange {
                floor: stair.floor,
                ceiling: stair.ceiling,
            });
        }
        if stair.start < stair.floor || stair.start > stair.ceiling {
            return Err(ConfigError::StartOutOfRange {
                start: stair.start,
                floor: stair.floor,
                ceiling: stair.ceiling,
            });
        }
        if stair.down_count == 0 || stair.reversal_limit == 0 {
            return Err(ConfigError::ZeroRule);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ExperimentConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_target_on_stream_edge() {
        let mut config = ExperimentConfig::default();
        config.target_pos_min = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TargetRange { .. })
        ));

        let mut config = ExperimentConfig::default();
        config.target_pos_max = config.stream_len - 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TargetRange { .. })
        ));
    }

    #[test]
    fn rejects_degenerate_alphabets() {
        let mut config = ExperimentConfig::default();
        config.targets.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyTargets)));

        let mut config = ExperimentConfig::default();
        config.distractors = vec!['1'];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooFewDistractors)
        ));

        let mut config = ExperimentConfig::default();
        config.targets.push('7');
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OverlappingAlphabets('7'))
        ));
    }

    #[test]
    fn rejects_bad_staircase() {
        let mut config = ExperimentConfig::default();
        config.staircase.step = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::NonPositiveStep)));

        let mut config = ExperimentConfig::default();
        config.staircase.floor = LogMar::new(2.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedSizeRange { .. })
        ));

        let mut config = ExperimentConfig::default();
        config.staircase.start = LogMar::new(-1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StartOutOfRange { .. })
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = ExperimentConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let back: ExperimentConfig = serde_json::from_str(&text).unwrap();
        assert!(back.validate().is_ok());
        assert_eq!(back.stream_len, config.stream_len);
        assert_eq!(back.targets, config.targets);
    }
}
