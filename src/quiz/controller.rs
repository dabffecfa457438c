use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time;

use crate::quiz::config::QuizConfig;
use crate::quiz::error::{ConfigError, SessionError, StartError};
use crate::quiz::fingers::FingerCounter;
use crate::quiz::ledger::RewardSink;
use crate::quiz::source::LandmarkSource;
use crate::quiz::stabilizer::{GestureStabilizer, GestureStatus, StabilizerEvent};
use crate::quiz::{option_letter, Question, Quiz, OPTIONS_PER_QUESTION};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Hand detection failed to come up; `start` will try again.
    NotReady,
    Idle,
    Active(usize),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEvent {
    pub question_index: usize,
    pub option_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerReview {
    pub question_index: usize,
    pub chosen: usize,
    pub correct: usize,
}

impl AnswerReview {
    pub fn is_correct(&self) -> bool {
        self.chosen == self.correct
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    pub score: u32,
    pub total: u32,
    pub reward: u32,
    pub review: Vec<AnswerReview>,
}

/// Feedback for whoever renders the quiz.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    Gesture {
        question_index: usize,
        status: GestureStatus,
    },
    Selected(SelectionEvent),
    Completed(SessionResult),
}

enum Step {
    Next,
    Done(SessionResult),
}

pub struct QuizController<S, R> {
    quiz: Quiz,
    source: Arc<S>,
    stabilizer: GestureStabilizer<S>,
    ledger: R,
    next_question_delay: Duration,
    points_per_correct_answer: u32,
    ready: bool,
    phase: Phase,
    question_index: usize,
    answers: Vec<usize>,
    result: Option<SessionResult>,
    selections: Option<UnboundedReceiver<StabilizerEvent>>,
    feedback: UnboundedSender<QuizEvent>,
}

impl<S: LandmarkSource, R: RewardSink> QuizController<S, R> {
    pub fn new(
        quiz: Quiz,
        source: Arc<S>,
        ledger: R,
        config: &QuizConfig,
    ) -> Result<(Self, UnboundedReceiver<QuizEvent>), ConfigError> {
        config.validate()?;
        let (feedback, feedback_rx) = mpsc::unbounded_channel();
        let stabilizer = GestureStabilizer::new(
            source.clone(),
            FingerCounter::new(&config.counter),
            config.stabilizer,
        )?;

        let controller = Self {
            quiz,
            source,
            stabilizer,
            ledger,
            next_question_delay: config.next_question_delay,
            points_per_correct_answer: config.points_per_correct_answer,
            ready: false,
            phase: Phase::Idle,
            question_index: 0,
            answers: Vec::new(),
            result: None,
            selections: None,
            feedback,
        };

        Ok((controller, feedback_rx))
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub fn answers(&self) -> &[usize] {
        &self.answers
    }

    /// The outcome of the last completed session, computed once on completion.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Active(index) => self.quiz.questions.get(index),
            _ => None,
        }
    }

    pub fn ledger(&self) -> &R {
        &self.ledger
    }

    /// Brings detection up if needed and begins at the first question.
    pub async fn start(&mut self) -> Result<(), StartError> {
        match self.phase {
            Phase::Idle | Phase::NotReady => {}
            phase => {
                warn!("Ignoring start while {phase:?}");
                return Err(StartError::AlreadyRunning(phase));
            }
        }

        if !self.ready {
            if let Err(e) = self.source.initialize().await {
                error!("Hand detection failed to start: {e}");
                self.phase = Phase::NotReady;
                return Err(StartError::DetectionUnavailable(e));
            }
            info!("Hand detection ready");
            self.ready = true;
        }

        self.answers.clear();
        self.result = None;
        self.question_index = 0;
        self.phase = Phase::Active(0);
        self.selections = Some(self.stabilizer.start());

        info!("Quiz started with {} questions", self.quiz.len());
        Ok(())
    }

    /// Drives the session until the last question is answered.
    pub async fn run(&mut self) -> Result<SessionResult, SessionError> {
        loop {
            let Some(selections) = self.selections.as_mut() else {
                return Err(SessionError::NotActive(self.phase));
            };

            let Some(event) = selections.recv().await else {
                warn!("Gesture detection stopped during question {}", self.question_index + 1);
                self.selections = None;
                return Err(SessionError::Interrupted);
            };

            match event {
                StabilizerEvent::Status(status) => self.emit(QuizEvent::Gesture {
                    question_index: self.question_index,
                    status,
                }),
                StabilizerEvent::Confirmed { option_index } => match self.select(option_index) {
                    Some(Step::Next) => {
                        time::sleep(self.next_question_delay).await;
                        self.advance();
                    }
                    Some(Step::Done(result)) => return Ok(result),
                    None => {}
                },
            }
        }
    }

    pub async fn play(&mut self) -> Result<SessionResult, SessionError> {
        self.start().await?;
        self.run().await
    }

    /// Drops the current or finished session and returns to `Idle`.
    pub fn reset(&mut self) {
        self.stabilizer.stop();
        self.selections = None;
        self.answers.clear();
        self.question_index = 0;
        self.result = None;
        self.phase = Phase::Idle;
    }

    /// Records a confirmed selection for the current question.
    fn select(&mut self, option_index: usize) -> Option<Step> {
        let Phase::Active(index) = self.phase else {
            warn!("Ignoring selection while {:?}", self.phase);
            return None;
        };
        if self.answers.len() > index {
            warn!("Question {} is already answered", index + 1);
            return None;
        }
        if option_index >= OPTIONS_PER_QUESTION {
            warn!("Ignoring out of range option {option_index}");
            return None;
        }

        self.answers.push(option_index);
        self.stabilizer.lock();
        info!(
            "Option {} selected for question {}",
            option_letter(option_index),
            index + 1
        );
        self.emit(QuizEvent::Selected(SelectionEvent {
            question_index: index,
            option_index,
        }));

        if index == self.quiz.last_index() {
            Some(Step::Done(self.complete()))
        } else {
            Some(Step::Next)
        }
    }

    /// Moves past an answered question and re-arms the stabilizer.
    fn advance(&mut self) {
        let Phase::Active(index) = self.phase else {
            return;
        };
        if self.answers.len() != index + 1 {
            return;
        }

        self.stabilizer.unlock();
        self.question_index = index + 1;
        self.phase = Phase::Active(index + 1);
        info!("Question {} of {}", index + 2, self.quiz.len());
    }

    fn complete(&mut self) -> SessionResult {
        self.stabilizer.stop();
        self.selections = None;

        let score = self.quiz.score(&self.answers) as u32;
        let review = self
            .quiz
            .questions
            .iter()
            .zip(&self.answers)
            .enumerate()
            .filter_map(|(question_index, (question, &chosen))| {
                question.correct_option().map(|correct| AnswerReview {
                    question_index,
                    chosen,
                    correct,
                })
            })
            .collect();
        let result = SessionResult {
            score,
            total: self.quiz.len() as u32,
            reward: score.saturating_mul(self.points_per_correct_answer),
            review,
        };

        self.phase = Phase::Completed;
        info!(
            "Quiz completed! Score {}/{}, earned {} XP",
            result.score, result.total, result.reward
        );
        self.ledger.award(&result);
        self.result = Some(result.clone());
        self.emit(QuizEvent::Completed(result.clone()));

        result
    }

    fn emit(&self, event: QuizEvent) {
        // Nobody listening is fine, the quiz runs headless in tests
        let _ = self.feedback.send(event);
    }
}
