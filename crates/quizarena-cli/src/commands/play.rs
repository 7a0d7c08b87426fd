use clap::Args;
use quizarena_core::{
    question::{FALSE, TRUE},
    Config, CoreError, Difficulty, Event, LeaderboardLog, PowerUpKind, Question, QuestionKind,
    QuestionLifecycle, Resolution, Session, SharedLifecycle,
};
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

const LEADERBOARD_SIZE: usize = 10;

#[derive(Args)]
pub struct PlayArgs {
    /// Player nickname
    #[arg(long)]
    nickname: String,
    /// Avatar shown on the leaderboard
    #[arg(long, default_value = "🤖")]
    avatar: String,
    /// Question category (defaults to quiz.default_category)
    #[arg(long)]
    category: Option<String>,
    /// easy, medium or hard (defaults to quiz.default_difficulty)
    #[arg(long)]
    difficulty: Option<Difficulty>,
    /// Number of questions to play
    #[arg(long, default_value_t = 5)]
    rounds: u32,
    /// Serve questions from a JSON file instead of the HTTP provider
    #[arg(long)]
    bank: Option<PathBuf>,
    /// Write the final session and leaderboard as JSON
    #[arg(long)]
    export: Option<PathBuf>,
}

#[derive(Serialize)]
struct Export<'a> {
    session: &'a Session,
    leaderboard: &'a LeaderboardLog,
}

enum Input {
    TimedOut(Option<Resolution>),
    Line(std::io::Result<Option<String>>),
}

pub fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(play(args))
}

async fn play(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let provider = super::provider(&config, args.bank.as_deref())?;
    let session = Session::register_with(&args.nickname, &args.avatar, config.power_ups)?;
    let category = args
        .category
        .clone()
        .unwrap_or_else(|| config.quiz.default_category.clone());
    let difficulty = args.difficulty.unwrap_or(config.quiz.default_difficulty);

    let shared = SharedLifecycle::new(
        QuestionLifecycle::new(session, provider)
            .with_config(config.lifecycle())
            .with_achievements(config.achievement_engine()),
    );

    {
        let lifecycle = shared.lock().await;
        let session = lifecycle.session();
        println!("Welcome, {} {}!", session.avatar(), session.nickname());
    }
    println!("Commands while a question is open: hint, freeze, double, time.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    for round in 1..=args.rounds {
        if !stdin_open {
            break;
        }
        println!("── Question {round}/{} ──", args.rounds);
        let question = match shared.request_question(&category, difficulty).await {
            Ok(q) => q,
            Err(e) => {
                println!("Failed to generate question: {e}");
                render_events(&shared).await;
                continue;
            }
        };

        let Some(question_id) = shared.lock().await.current_question_id() else {
            continue;
        };
        print_question(&question, &shared).await;
        let mut timer = shared.spawn_expiry_timer(question_id);

        let resolution = loop {
            let input = tokio::select! {
                res = &mut timer => Input::TimedOut(res.ok().flatten()),
                line = lines.next_line() => Input::Line(line),
            };

            match input {
                Input::TimedOut(res) => break res,
                Input::Line(Err(e)) => {
                    timer.abort();
                    return Err(e.into());
                }
                // stdin closed; let the clock run out.
                Input::Line(Ok(None)) => {
                    stdin_open = false;
                    break (&mut timer).await.ok().flatten();
                }
                Input::Line(Ok(Some(line))) => {
                    let line = line.trim();
                    match line {
                        "" => continue,
                        "hint" | "freeze" | "double" | "time" => {
                            handle_command(&shared, line).await;
                            render_events(&shared).await;
                        }
                        answer => {
                            let answer = match_choice(&question, answer);
                            match shared.submit_answer(&answer).await {
                                Some(res) => {
                                    timer.abort();
                                    break Some(res);
                                }
                                // The timer got there first.
                                None => break (&mut timer).await.ok().flatten(),
                            }
                        }
                    }
                }
            }
        };

        if let Some(res) = resolution {
            print_resolution(&res);
        }
        render_events(&shared).await;
        println!();
    }

    let lifecycle = shared.lock().await;
    print_summary(lifecycle.session(), lifecycle.leaderboard());

    if let Some(path) = &args.export {
        let export = Export {
            session: lifecycle.session(),
            leaderboard: lifecycle.leaderboard(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&export)?)?;
        println!("Session exported to {}", path.display());
    }
    Ok(())
}

async fn handle_command(shared: &SharedLifecycle, command: &str) {
    let mut lifecycle = shared.lock().await;
    let outcome = match command {
        "hint" => lifecycle.request_hint().map(|hint| format!("🧠 {hint}")),
        "freeze" => lifecycle
            .use_freeze()
            .map(|left| format!("❄️  Clock extended: {}s left", left.as_secs())),
        "double" => lifecycle
            .use_double()
            .map(|()| "✨ Double points armed".to_string()),
        _ => Ok(format!(
            "⏳ {}s left",
            lifecycle.time_remaining().unwrap_or_default().as_secs()
        )),
    };
    match outcome {
        Ok(message) => println!("{message}"),
        Err(CoreError::PowerUpUnavailable(kind)) => println!("No {kind} power-ups left."),
        Err(e) => println!("{e}"),
    }
}

/// Accept an option (case-insensitive), t/f, or an option number.
///
/// Option text wins over numbering so numeric options stay answerable.
fn match_choice(question: &Question, input: &str) -> String {
    let choices = question.choices();
    if let Some(choice) = choices.iter().find(|c| c.eq_ignore_ascii_case(input)) {
        return choice.to_string();
    }
    if question.kind() == QuestionKind::TrueFalse {
        match input.to_lowercase().as_str() {
            "t" => return TRUE.to_string(),
            "f" => return FALSE.to_string(),
            _ => {}
        }
    }
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| choices.get(i))
        .map(|c| c.to_string())
        .unwrap_or_else(|| input.to_string())
}

async fn print_question(question: &Question, shared: &SharedLifecycle) {
    let lifecycle = shared.lock().await;
    println!("{}", question.text());
    for (i, choice) in question.choices().iter().enumerate() {
        println!("  {}. {choice}", i + 1);
    }
    let power_ups = lifecycle.session().power_ups();
    let inventory = PowerUpKind::ALL
        .iter()
        .map(|k| format!("{k} {}", power_ups.get(*k)))
        .collect::<Vec<_>>()
        .join(", ");
    println!(
        "⏳ {}s | difficulty {}/5 | power-ups: {inventory}",
        lifecycle.time_remaining().unwrap_or_default().as_secs(),
        question.difficulty()
    );
}

fn print_resolution(res: &Resolution) {
    if res.timed_out {
        println!("⏰ Time's up! The answer was {}.", res.correct_answer());
    } else if res.correct {
        println!("✅ Correct! +{} points. {}", res.points_awarded, res.explanation());
    } else {
        println!(
            "❌ Incorrect. The answer was {}. {}",
            res.correct_answer(),
            res.explanation()
        );
    }
    if res.streak > 1 {
        println!("🔥 Streak: {}", res.streak);
    }
}

async fn render_events(shared: &SharedLifecycle) {
    let events = shared.lock().await.drain_events();
    for event in events {
        match event {
            Event::PowerUpGranted { kind, count, .. } => {
                println!("🎁 Streak bonus: +{count} {kind}");
            }
            Event::BadgeEarned { badge, .. } => println!("🏅 Badge earned: {badge}"),
            Event::GenerationFailed { reason, .. } => tracing::debug!(%reason, "generation failed"),
            _ => {}
        }
    }
}

fn print_summary(session: &Session, leaderboard: &LeaderboardLog) {
    let stats = session.stats();
    println!("══ Final results for {} {} ══", session.avatar(), session.nickname());
    println!(
        "Score {} | correct {}/{} ({:.0}%) | timed out {} | best streak {}",
        session.score(),
        stats.correct,
        stats.answered,
        stats.accuracy_pct,
        stats.timed_out,
        stats.best_streak
    );
    if !session.badges().is_empty() {
        let badges: Vec<&str> = session.badges().iter().map(|b| b.as_str()).collect();
        println!("Badges: {}", badges.join(", "));
    }

    println!("\n🏆 Leaderboard");
    for (rank, entry) in leaderboard.top(LEADERBOARD_SIZE).iter().enumerate() {
        println!(
            "{:>2}. {} {:<16} {:>5}  {}",
            rank + 1,
            entry.avatar,
            entry.nickname,
            entry.score,
            entry.category
        );
    }
}
