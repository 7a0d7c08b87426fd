use clap::Args;
use quizarena_core::{Config, Difficulty};
use std::path::PathBuf;

#[derive(Args)]
pub struct AskArgs {
    /// Question category (defaults to quiz.default_category)
    #[arg(long)]
    category: Option<String>,
    /// easy, medium or hard (defaults to quiz.default_difficulty)
    #[arg(long)]
    difficulty: Option<Difficulty>,
    /// Serve questions from a JSON file instead of the HTTP provider
    #[arg(long)]
    bank: Option<PathBuf>,
}

pub fn run(args: AskArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let provider = super::provider(&config, args.bank.as_deref())?;
    let category = args.category.unwrap_or(config.quiz.default_category);
    let difficulty = args.difficulty.unwrap_or(config.quiz.default_difficulty);

    let rt = tokio::runtime::Runtime::new()?;
    let question = rt.block_on(provider.fetch(&category, difficulty))?;
    println!("{}", serde_json::to_string_pretty(&question)?);
    Ok(())
}
