use crate::quiz::error::QuizError;
use crate::quiz::{Answer, Question, Quiz};

const HABIT_QUESTIONS: [(&str, [&str; 4], usize); 5] = [
    (
        "What's the primary benefit of habit tracking?",
        [
            "Impressing others",
            "Building consistency",
            "Earning virtual rewards only",
            "Taking more time in your day",
        ],
        1,
    ),
    (
        "How does gamification improve habit formation?",
        [
            "By increasing motivation through rewards",
            "By making habits more complex",
            "By removing the need for discipline",
            "By replacing habits with games",
        ],
        0,
    ),
    (
        "What feature helps most with accountability?",
        [
            "Colorful interface",
            "Premium subscription",
            "Community support",
            "Automatic tracking",
        ],
        2,
    ),
    (
        "Which tracking method is most effective for new habits?",
        [
            "Tracking only when you remember",
            "Daily consistent tracking",
            "Monthly reviews",
            "No tracking at all",
        ],
        1,
    ),
    (
        "What's a key element of successful habit formation?",
        [
            "Setting extremely difficult goals",
            "Changing many habits at once",
            "Starting with small, achievable steps",
            "Focusing only on results, not process",
        ],
        2,
    ),
];

/// The habit knowledge quiz shipped with the app.
pub fn habit_quiz() -> Result<Quiz, QuizError> {
    let questions = HABIT_QUESTIONS
        .iter()
        .map(|(text, options, correct)| {
            let answers = options
                .iter()
                .enumerate()
                .map(|(i, option)| Answer::new(option.to_string(), i == *correct))
                .collect();
            Question::new(text.to_string(), answers)
        })
        .collect();

    Quiz::new(questions)
}
