mod quiz;

use std::{env, fs::File, sync::Arc, time::Duration};

use dotenv::dotenv;
use log::{debug, error, info};
use quiz::{
    config::QuizConfig,
    controller::{QuizController, QuizEvent},
    habits::habit_quiz,
    ledger::XpLedger,
    option_letter,
    simulated::{DemoConfig, SimulatedHand},
    Quiz,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Upper bound for one simulated session, in case the script never confirms.
const SESSION_TIMEOUT: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> HandlerResult {
    let dotenv_loaded = dotenv().is_ok();

    pretty_env_logger::init();
    log::info!("Starting gesture quiz...");
    if !dotenv_loaded {
        info!("No .env file found, using the process environment");
    }

    let config = QuizConfig::from_env()?;
    let quiz = match &config.questions_path {
        Some(path) => {
            info!("Loading questions from {}", path.display());
            Quiz::from_reader(File::open(path)?)?
        }
        None => habit_quiz()?,
    };
    info!("{} questions loaded", quiz.len());

    let demo = DemoConfig::from_lookup(|key| env::var(key).ok(), &config.stabilizer)?;
    let answers = match &demo.answers {
        Some(answers) => answers.clone(),
        None => quiz
            .questions
            .iter()
            .filter_map(|question| question.correct_option())
            .collect(),
    };
    let hand = Arc::new(SimulatedHand::new(&answers, &demo));

    let (mut controller, mut feedback) = QuizController::new(quiz, hand, XpLedger::new(), &config)?;

    let reporter = tokio::spawn(async move {
        while let Some(event) = feedback.recv().await {
            report(event);
        }
    });

    println!("Show 1-4 fingers to select options A-D, hold for 2 seconds to confirm");
    let outcome = tokio::time::timeout(SESSION_TIMEOUT, controller.play()).await;
    match outcome {
        Ok(finished) => {
            finished?;
        }
        Err(elapsed) => {
            if let Some(question) = controller.current_question() {
                error!(
                    "No answer confirmed for question {}: {}",
                    controller.question_index() + 1,
                    question.text
                );
            }
            error!(
                "Giving up in phase {:?} after {} of {} answers",
                controller.phase(),
                controller.answers().len(),
                controller.quiz().len()
            );
            controller.reset();
            return Err(elapsed.into());
        }
    }
    print_summary(&controller);

    controller.reset();
    drop(controller);
    reporter.await?;

    Ok(())
}

fn print_summary(controller: &QuizController<SimulatedHand, XpLedger>) {
    let Some(result) = controller.result() else {
        return;
    };

    println!("Quiz completed! Your score: {}/{}", result.score, result.total);
    println!("Correct answers:");
    for review in &result.review {
        let question = &controller.quiz().questions[review.question_index];
        println!(
            "  {} {} Answer: {} (you chose {})",
            if review.is_correct() { "✓" } else { "✗" },
            question.text,
            option_letter(review.correct),
            option_letter(review.chosen),
        );
    }

    let ledger = controller.ledger();
    println!("+{} XP earned!", result.reward);
    println!(
        "Level {} ({} XP, {:.0}% to the next level), {} XP earned in total",
        ledger.level(),
        ledger.experience(),
        ledger.progress() * 100.0,
        ledger.total_earned()
    );
}

fn report(event: QuizEvent) {
    match event {
        QuizEvent::Gesture {
            question_index,
            status,
        } => debug!(
            "Question {}: fingers {}, option {}, hold {:.0}%",
            question_index + 1,
            status.finger_count,
            status
                .selected_option
                .map(option_letter)
                .unwrap_or('-'),
            status.progress * 100.0
        ),
        QuizEvent::Selected(selection) => info!(
            "Option {} selected for question {}!",
            option_letter(selection.option_index),
            selection.question_index + 1
        ),
        QuizEvent::Completed(result) => info!("Quiz completed! You earned {} XP!", result.reward),
    }
}
