pub mod config;
pub mod controller;
pub mod error;
pub mod fingers;
pub mod habits;
pub mod ledger;
pub mod simulated;
pub mod source;
pub mod stabilizer;
pub mod ticker;

use std::io::Read;

use error::QuizError;

/// Every question is answered by showing 1 to 4 fingers.
pub const OPTIONS_PER_QUESTION: usize = 4;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Quiz {
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn new(questions: Vec<Question>) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::Empty);
        }

        for (index, question) in questions.iter().enumerate() {
            if question.answers.len() != OPTIONS_PER_QUESTION {
                return Err(QuizError::WrongAnswerCount {
                    index,
                    found: question.answers.len(),
                    expected: OPTIONS_PER_QUESTION,
                });
            }

            let correct = question.answers.iter().filter(|a| a.is_correct).count();
            if correct != 1 {
                return Err(QuizError::AmbiguousCorrectAnswer {
                    index,
                    found: correct,
                });
            }
        }

        Ok(Self { questions })
    }

    /// Decodes a JSON array of questions and validates it like [`Quiz::new`].
    pub fn from_reader(reader: impl Read) -> Result<Self, QuizError> {
        let questions: Vec<Question> = serde_json::from_reader(reader)?;
        Self::new(questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn last_index(&self) -> usize {
        self.questions.len().saturating_sub(1)
    }

    /// Number of positions where the chosen option is the correct one.
    /// Answers past the end of the quiz are ignored.
    pub fn score(&self, answers: &[usize]) -> usize {
        self.questions
            .iter()
            .zip(answers)
            .filter(|(question, answer)| question.correct_option() == Some(**answer))
            .count()
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Question {
    pub text: String,
    pub answers: Vec<Answer>,
}

impl Question {
    pub fn new(text: String, answers: Vec<Answer>) -> Self {
        Self { text, answers }
    }

    pub fn correct_option(&self) -> Option<usize> {
        self.answers.iter().position(|a| a.is_correct)
    }
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Answer {
    pub text: String,
    pub is_correct: bool,
}

impl Answer {
    pub fn new(text: String, is_correct: bool) -> Self {
        Self { text, is_correct }
    }
}

/// `0 => 'A'`, `1 => 'B'` and so on.
pub fn option_letter(option_index: usize) -> char {
    (b'A' + (option_index % 26) as u8) as char
}
