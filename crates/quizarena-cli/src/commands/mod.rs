pub mod ask;
pub mod config;
pub mod play;

use std::path::Path;
use std::sync::Arc;

use quizarena_core::{Config, GroqProvider, QuestionBank, QuestionProvider};

/// Offline bank when a file is given, otherwise the configured HTTP provider.
pub fn provider(
    config: &Config,
    bank: Option<&Path>,
) -> Result<Arc<dyn QuestionProvider>, Box<dyn std::error::Error>> {
    match bank {
        Some(path) => Ok(Arc::new(QuestionBank::load(path)?)),
        None => Ok(Arc::new(GroqProvider::from_config(&config.provider)?)),
    }
}
