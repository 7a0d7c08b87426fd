//! Offline provider serving a fixed list of questions in rotation.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::traits::QuestionProvider;
use crate::error::{GenerationFailure, Result};
use crate::question::{Difficulty, Question, QuestionPayload};

#[derive(Debug, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
    cursor: AtomicUsize,
}

impl QuestionBank {
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Parse a JSON array of question payloads.
    ///
    /// The whole bank is rejected if any entry is invalid; the reason names
    /// the offending index.
    pub fn from_json_str(json: &str) -> Result<Self, GenerationFailure> {
        let payloads: Vec<QuestionPayload> =
            serde_json::from_str(json).map_err(|e| GenerationFailure::invalid(e.to_string()))?;
        let questions = payloads
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                Question::try_from(p)
                    .map_err(|e| GenerationFailure::invalid(format!("entry {i}: {e}")))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self::new(questions))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&content)?)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[async_trait]
impl QuestionProvider for QuestionBank {
    fn name(&self) -> &str {
        "bank"
    }

    async fn fetch(
        &self,
        _category: &str,
        _difficulty: Difficulty,
    ) -> Result<Question, GenerationFailure> {
        if self.questions.is_empty() {
            return Err(GenerationFailure::EmptyBank);
        }
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.questions.len();
        Ok(self.questions[i].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BANK: &str = r#"[
        {"question": "Water boils at 100C at sea level.", "type": "true_false",
         "correct_answer": "True", "explanation": "At 1 atm.", "difficulty": 1},
        {"question": "Largest planet?", "type": "multiple_choice",
         "options": ["Mars", "Jupiter"], "correct_answer": "Jupiter",
         "explanation": "By mass and volume.", "difficulty": 2, "hint": "Gas giant"}
    ]"#;

    #[tokio::test]
    async fn serves_questions_round_robin() {
        let bank = QuestionBank::from_json_str(BANK).unwrap();
        assert_eq!(bank.len(), 2);
        let a = bank.fetch("Science", Difficulty::Easy).await.unwrap();
        let b = bank.fetch("Science", Difficulty::Easy).await.unwrap();
        let c = bank.fetch("Science", Difficulty::Easy).await.unwrap();
        assert_eq!(a.text(), "Water boils at 100C at sea level.");
        assert_eq!(b.text(), "Largest planet?");
        assert_eq!(c, a);
    }

    #[tokio::test]
    async fn empty_bank_fails() {
        let bank = QuestionBank::default();
        let err = bank.fetch("Science", Difficulty::Easy).await.unwrap_err();
        assert_eq!(err, GenerationFailure::EmptyBank);
    }

    #[test]
    fn invalid_entry_rejects_bank() {
        let json = BANK.replace(r#""correct_answer": "Jupiter""#, r#""correct_answer": "Pluto""#);
        let err = QuestionBank::from_json_str(&json).unwrap_err();
        assert!(err.reason().contains("entry 1"));
    }
}
