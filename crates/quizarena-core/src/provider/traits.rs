use async_trait::async_trait;

use crate::error::GenerationFailure;
use crate::question::{Difficulty, Question};

/// Source of trivia questions.
///
/// Implementations make a single attempt per call. Retry policy belongs to
/// the caller, which also decides how long to wait.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Short identifier used in logs (e.g. "groq", "bank").
    fn name(&self) -> &str;

    /// Produce one validated question for `category` at `difficulty`.
    async fn fetch(&self, category: &str, difficulty: Difficulty)
        -> Result<Question, GenerationFailure>;
}
