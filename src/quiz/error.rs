use thiserror::Error;

use super::controller::Phase;

/// A landmark set that cannot be classified. Only ever costs one frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("expected 21 landmarks, got {0}")]
    WrongLandmarkCount(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The capture or inference pipeline could not be brought up.
    #[error("detection unavailable: {0}")]
    Unavailable(String),

    /// A single capture call failed; the next one may succeed.
    #[error("frame capture failed: {0}")]
    Frame(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StartError {
    #[error("cannot start: {0}")]
    DetectionUnavailable(CaptureError),

    #[error("cannot start while {0:?}")]
    AlreadyRunning(Phase),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Start(#[from] StartError),

    #[error("no quiz session running ({0:?})")]
    NotActive(Phase),

    #[error("gesture detection stopped before the quiz was finished")]
    Interrupted,
}

#[derive(Error, Debug)]
pub enum QuizError {
    #[error("quiz has no questions")]
    Empty,

    #[error("question {index} has {found} answers, expected {expected}")]
    WrongAnswerCount {
        index: usize,
        found: usize,
        expected: usize,
    },

    #[error("question {index} has {found} correct answers, expected exactly one")]
    AmbiguousCorrectAnswer { index: usize, found: usize },

    #[error("failed to decode quiz: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: String, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}
