use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use rand::Rng;

use crate::quiz::config::{try_load, StabilizerConfig};
use crate::quiz::error::{CaptureError, ConfigError};
use crate::quiz::fingers::Hand;
use crate::quiz::source::{HandPose, LandmarkSource};
use crate::quiz::OPTIONS_PER_QUESTION;

/// Knobs for the simulated hand used when no camera is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    /// Planned option per question; `None` answers every question correctly.
    pub answers: Option<Vec<usize>>,
    /// Captures each planned pose stays up for.
    pub hold_frames: usize,
    /// Chance that a single capture fails.
    pub failure_rate: f64,
    /// Largest random offset added to every coordinate.
    pub jitter: f32,
    /// Time one capture takes.
    pub latency: Duration,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            answers: None,
            hold_frames: 30,
            failure_rate: 0.0,
            jitter: 3.0,
            latency: Duration::from_millis(30),
        }
    }
}

impl DemoConfig {
    /// Reads `QUIZ_DEMO_*` overrides. Each pose must stay up long enough for
    /// `stabilizer` to confirm it.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        stabilizer: &StabilizerConfig,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let answers = match lookup("QUIZ_DEMO_ANSWERS") {
            Some(letters) => Some(parse_answers(&letters)?),
            None => None,
        };
        let failure_rate: f64 = try_load(&lookup, "QUIZ_DEMO_FAILURE_RATE", defaults.failure_rate)?;
        if !(0.0..=1.0).contains(&failure_rate) {
            return Err(ConfigError::Invalid {
                key: "QUIZ_DEMO_FAILURE_RATE".to_string(),
                value: failure_rate.to_string(),
            });
        }

        let hold_frames: usize = try_load(&lookup, "QUIZ_DEMO_HOLD_FRAMES", defaults.hold_frames)?;
        if hold_frames < stabilizer.readings_to_confirm() as usize {
            return Err(ConfigError::Invalid {
                key: "QUIZ_DEMO_HOLD_FRAMES".to_string(),
                value: hold_frames.to_string(),
            });
        }

        Ok(Self {
            answers,
            hold_frames,
            failure_rate,
            jitter: try_load(&lookup, "QUIZ_DEMO_JITTER", defaults.jitter)?,
            latency: Duration::from_millis(try_load(
                &lookup,
                "QUIZ_DEMO_LATENCY_MS",
                defaults.latency.as_millis() as u64,
            )?),
        })
    }
}

/// Parses option letters such as `"B, A, c"` into option indices.
pub fn parse_answers(letters: &str) -> Result<Vec<usize>, ConfigError> {
    letters
        .split(',')
        .map(str::trim)
        .filter(|letter| !letter.is_empty())
        .map(|letter| {
            let mut chars = letter.chars();
            match (chars.next().map(|c| c.to_ascii_uppercase()), chars.next()) {
                (Some(c @ 'A'..='Z'), None) if ((c as u8 - b'A') as usize) < OPTIONS_PER_QUESTION => {
                    Ok((c as u8 - b'A') as usize)
                }
                _ => Err(ConfigError::Invalid {
                    key: "QUIZ_DEMO_ANSWERS".to_string(),
                    value: letters.to_string(),
                }),
            }
        })
        .collect()
}

/// A hand that lowers, then holds up `answer + 1` fingers for every planned
/// answer, with noisy coordinates and the odd dropped frame.
#[derive(Debug)]
pub struct SimulatedHand {
    script: Mutex<VecDeque<Option<HandPose>>>,
    jitter: f32,
    failure_rate: f64,
    latency: Duration,
}

impl SimulatedHand {
    pub fn new(answers: &[usize], config: &DemoConfig) -> Self {
        let script = answers
            .iter()
            .flat_map(|&answer| {
                std::iter::repeat(None)
                    .take(2)
                    .chain(std::iter::repeat(Some(HandPose::showing(answer as u8 + 1))).take(config.hold_frames))
            })
            .collect();

        Self {
            script: Mutex::new(script),
            jitter: config.jitter,
            failure_rate: config.failure_rate,
            latency: config.latency,
        }
    }

    pub fn remaining_frames(&self) -> usize {
        self.script.lock().map(|script| script.len()).unwrap_or(0)
    }

    fn next_frame(&self) -> Result<Vec<Hand>, CaptureError> {
        let mut rng = rand::thread_rng();
        if self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate) {
            return Err(CaptureError::Frame("simulated dropped frame".to_string()));
        }

        let pose = self
            .script
            .lock()
            .map_err(|_| CaptureError::Frame("script poisoned".to_string()))?
            .pop_front()
            .flatten();
        let Some(pose) = pose else {
            return Ok(Vec::new());
        };

        let mut hand = pose.landmarks();
        if self.jitter > 0.0 {
            for point in hand.iter_mut() {
                point.x += rng.gen_range(-self.jitter..=self.jitter);
                point.y += rng.gen_range(-self.jitter..=self.jitter);
            }
        }
        Ok(vec![hand])
    }
}

impl LandmarkSource for SimulatedHand {
    async fn initialize(&self) -> Result<(), CaptureError> {
        if self.remaining_frames() == 0 {
            return Err(CaptureError::Unavailable("no gestures scripted".to_string()));
        }
        Ok(())
    }

    async fn capture(&self) -> Result<Vec<Hand>, CaptureError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.next_frame()
    }
}
