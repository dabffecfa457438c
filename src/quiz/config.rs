use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use log::info;

use crate::quiz::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterConfig {
    /// Thumb tip to wrist distance above which the thumb is extended,
    /// in the same units as the landmark coordinates.
    pub thumb_distance_threshold: f32,
    /// How far a fingertip must sit above its middle joint to count.
    pub finger_vertical_margin: f32,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            thumb_distance_threshold: 60.0,
            finger_vertical_margin: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizerConfig {
    pub tick_interval: Duration,
    /// Hold time after which a steady count becomes a selection.
    pub confirmation_threshold: Duration,
    /// Classify on every n-th unlocked tick only. 1 classifies every tick.
    pub frame_stride: u32,
}

impl StabilizerConfig {
    /// Zero durations or a zero stride would stall or crash the sampling loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Zero("tick interval"));
        }
        if self.confirmation_threshold.is_zero() {
            return Err(ConfigError::Zero("confirmation threshold"));
        }
        if self.frame_stride == 0 {
            return Err(ConfigError::Zero("frame stride"));
        }
        Ok(())
    }

    /// Steady readings needed before a count is confirmed.
    pub fn readings_to_confirm(&self) -> u32 {
        // The first reading only starts the hold, each later one adds a tick
        let tick = self.tick_interval.as_nanos().max(1);
        let readings = self.confirmation_threshold.as_nanos().div_ceil(tick) + 1;
        u32::try_from(readings).unwrap_or(u32::MAX)
    }
}

impl Default for StabilizerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            confirmation_threshold: Duration::from_secs(2),
            frame_stride: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuizConfig {
    pub counter: CounterConfig,
    pub stabilizer: StabilizerConfig,
    /// Pause between a confirmed answer and the next question.
    pub next_question_delay: Duration,
    pub points_per_correct_answer: u32,
    /// JSON quiz content replacing the built-in habit quiz.
    pub questions_path: Option<PathBuf>,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            counter: CounterConfig::default(),
            stabilizer: StabilizerConfig::default(),
            next_question_delay: Duration::from_millis(1500),
            points_per_correct_answer: 10,
            questions_path: None,
        }
    }
}

impl QuizConfig {
    /// Defaults overridden by `QUIZ_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            counter: CounterConfig {
                thumb_distance_threshold: try_load(
                    &lookup,
                    "QUIZ_THUMB_DISTANCE_THRESHOLD",
                    defaults.counter.thumb_distance_threshold,
                )?,
                finger_vertical_margin: try_load(
                    &lookup,
                    "QUIZ_FINGER_VERTICAL_MARGIN",
                    defaults.counter.finger_vertical_margin,
                )?,
            },
            stabilizer: StabilizerConfig {
                tick_interval: Duration::from_millis(try_load(
                    &lookup,
                    "QUIZ_TICK_INTERVAL_MS",
                    defaults.stabilizer.tick_interval.as_millis() as u64,
                )?),
                confirmation_threshold: seconds(try_load(
                    &lookup,
                    "QUIZ_CONFIRMATION_THRESHOLD_S",
                    defaults.stabilizer.confirmation_threshold.as_secs_f64(),
                )?)?,
                frame_stride: try_load(
                    &lookup,
                    "QUIZ_FRAME_STRIDE",
                    defaults.stabilizer.frame_stride,
                )?,
            },
            next_question_delay: Duration::from_millis(try_load(
                &lookup,
                "QUIZ_NEXT_QUESTION_DELAY_MS",
                defaults.next_question_delay.as_millis() as u64,
            )?),
            points_per_correct_answer: try_load(
                &lookup,
                "QUIZ_POINTS_PER_CORRECT_ANSWER",
                defaults.points_per_correct_answer,
            )?,
            questions_path: lookup("QUIZ_QUESTIONS_PATH").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stabilizer.validate()
    }
}

pub(crate) fn try_load<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + Display,
{
    match lookup(key) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn seconds(value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::Invalid {
        key: "QUIZ_CONFIRMATION_THRESHOLD_S".to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_reference_values() {
        let config = QuizConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, QuizConfig::default());
        assert_eq!(config.stabilizer.tick_interval, Duration::from_millis(100));
        assert_eq!(config.stabilizer.confirmation_threshold, Duration::from_secs(2));
        assert_eq!(config.next_question_delay, Duration::from_millis(1500));
        assert_eq!(config.counter.thumb_distance_threshold, 60.0);
        assert_eq!(config.counter.finger_vertical_margin, 20.0);
        assert_eq!(config.points_per_correct_answer, 10);
    }

    #[test]
    fn overrides_from_environment() {
        let config = QuizConfig::from_lookup(lookup(&[
            ("QUIZ_TICK_INTERVAL_MS", "50"),
            ("QUIZ_CONFIRMATION_THRESHOLD_S", "1.5"),
            ("QUIZ_FRAME_STRIDE", "1"),
            ("QUIZ_POINTS_PER_CORRECT_ANSWER", " 25 "),
            ("QUIZ_QUESTIONS_PATH", "quiz.json"),
        ]))
        .unwrap();

        assert_eq!(config.stabilizer.tick_interval, Duration::from_millis(50));
        assert_eq!(config.stabilizer.confirmation_threshold, Duration::from_millis(1500));
        assert_eq!(config.stabilizer.frame_stride, 1);
        assert_eq!(config.points_per_correct_answer, 25);
        assert_eq!(config.questions_path, Some(PathBuf::from("quiz.json")));
    }

    #[test]
    fn malformed_value_names_the_key() {
        let err = QuizConfig::from_lookup(lookup(&[("QUIZ_FINGER_VERTICAL_MARGIN", "wide")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: "QUIZ_FINGER_VERTICAL_MARGIN".to_string(),
                value: "wide".to_string(),
            }
        );
    }

    #[test]
    fn negative_threshold_is_invalid() {
        let err = QuizConfig::from_lookup(lookup(&[("QUIZ_CONFIRMATION_THRESHOLD_S", "-1")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn zero_stride_is_rejected() {
        let err = QuizConfig::from_lookup(lookup(&[("QUIZ_FRAME_STRIDE", "0")])).unwrap_err();
        assert_eq!(err, ConfigError::Zero("frame stride"));
    }

    #[test]
    fn hand_built_stabilizer_config_is_checked() {
        let config = StabilizerConfig {
            tick_interval: Duration::ZERO,
            ..StabilizerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("tick interval")));

        let config = QuizConfig {
            stabilizer: StabilizerConfig {
                frame_stride: 0,
                ..StabilizerConfig::default()
            },
            ..QuizConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::Zero("frame stride")));
    }

    #[test]
    fn readings_to_confirm_counts_the_starting_reading() {
        assert_eq!(StabilizerConfig::default().readings_to_confirm(), 21);

        let uneven = StabilizerConfig {
            tick_interval: Duration::from_millis(400),
            confirmation_threshold: Duration::from_millis(1500),
            frame_stride: 1,
        };
        assert_eq!(uneven.readings_to_confirm(), 5);
    }
}
