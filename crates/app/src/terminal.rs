//! Line-oriented front end: renders questions and reads choices from stdin.

use std::error::Error;

use quiz_core::model::{QuizSettings, SessionType};
use services::{
    AnswerOutcome, AppServices, Completion, QuizSession, SessionOpening, WeeklyOverview,
    WrongQuestionItem,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Resolve a typed answer: the exact choice text, or else a 1-based choice number.
///
/// Text wins so numeric choices ("2", "4", ...) are picked by what the user typed.
pub fn pick_choice<'c>(input: &str, choices: &'c [String]) -> Option<&'c str> {
    let trimmed = input.trim();
    if let Some(exact) = choices.iter().map(String::as_str).find(|c| *c == trimmed) {
        return Some(exact);
    }
    let n = trimmed.parse::<usize>().ok()?;
    n.checked_sub(1).and_then(|i| choices.get(i)).map(String::as_str)
}

fn render_closed(settings: &QuizSettings) {
    let window = settings.window();
    println!(
        "No test is open right now (tests start at {} and {}).",
        window.morning_start().format("%H:%M"),
        window.evening_start().format("%H:%M")
    );
}

fn render_header(session: &QuizSession) {
    match session.key().session_type() {
        SessionType::Morning => println!("🌅 Good morning, time for the morning test"),
        SessionType::Evening => println!("🌙 Good evening, time for the evening test"),
    }
}

fn render_completion(completion: Completion) {
    if completion.celebrate {
        println!();
        println!("👑 Harikasın 👑  {}/{} correct", completion.correct, completion.total);
        println!();
    } else {
        println!("🎉 Session complete: {}/{} correct", completion.correct, completion.total);
    }
}

pub fn render_overview(overview: &WeeklyOverview) {
    println!("📊 Last 7 days");
    for day in &overview.days {
        println!(
            "  {}  {:>3}  {}",
            day.date.format("%Y-%m-%d"),
            day.correct,
            "█".repeat(usize::try_from(day.correct).unwrap_or(0).min(40))
        );
    }
    println!("🏆 Weekly total: {}", overview.total);
    println!("❌ Mistake pool: {}", overview.wrong_pool);
}

pub fn render_wrong_questions(items: &[WrongQuestionItem]) {
    if items.is_empty() {
        println!("No mistakes recorded yet.");
        return;
    }
    for item in items {
        match &item.question {
            Some(q) => {
                println!("[{}] {} ({})", item.id, q.prompt(), item.recorded_on);
                println!("    answer: {}", q.answer());
            }
            None => println!("[{}] no longer in the bank ({})", item.id, item.recorded_on),
        }
    }
}

/// Run the daily test until it is finalized, the window closes, or stdin ends.
///
/// Every step re-resolves the session the way a page reload would, so crossing into a
/// new session key mid-way starts the new session.
pub async fn run_quiz(services: &AppServices) -> Result<(), Box<dyn Error>> {
    let quiz = services.quiz_loop();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    render_overview(&services.overview().weekly_overview().await?);
    println!();

    let mut previous: Option<QuizSession> = None;
    loop {
        let previous_key = previous.as_ref().map(QuizSession::key);
        let mut session = match quiz.open_session(previous.take()).await? {
            SessionOpening::Closed => {
                render_closed(services.settings());
                return Ok(());
            }
            SessionOpening::Exhausted { .. } => {
                println!("🎉 All questions completed!");
                return Ok(());
            }
            SessionOpening::Ready(session) => session,
        };
        if previous_key != Some(session.key()) {
            render_header(&session);
        }

        if let Some(completion) = quiz.completion(&session) {
            render_completion(completion);
            return Ok(());
        }

        let Some(question) = session.current_question().cloned() else {
            return Ok(());
        };
        println!();
        println!("Question {}: {}", session.current_index() + 1, question.prompt());
        for (i, choice) in question.choices().iter().enumerate() {
            println!("  {}) {choice}", i + 1);
        }

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        match pick_choice(&line, question.choices()) {
            Some(choice) => {
                let result = quiz.answer_current(&mut session, choice).await?;
                if let AnswerOutcome::TryAgain { .. } = result.outcome {
                    println!("Wrong, let's try again.");
                }
            }
            None => println!("Pick a number between 1 and {}.", question.choices().len()),
        }
        previous = Some(session);
    }
}
