//! Question model and payload validation.
//!
//! A [`Question`] can only be built through validation, so every value of
//! the type upholds the answer invariant: `correct_answer` is one of the
//! options for multiple choice, or `"True"`/`"False"` for true/false.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::GenerationFailure;

pub const TRUE: &str = "True";
pub const FALSE: &str = "False";

/// Requested difficulty sent to the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty '{other}' (expected easy, medium or hard)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    TrueFalse,
}

/// Raw provider payload, before invariants are checked.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionPayload {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
    pub difficulty: u8,
    #[serde(default)]
    pub hint: String,
}

/// A validated, immutable trivia question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionPayload")]
pub struct Question {
    #[serde(rename = "question")]
    text: String,
    #[serde(rename = "type")]
    kind: QuestionKind,
    options: Vec<String>,
    correct_answer: String,
    explanation: String,
    difficulty: u8,
    hint: String,
}

impl Question {
    pub const MIN_DIFFICULTY: u8 = 1;
    pub const MAX_DIFFICULTY: u8 = 5;

    pub fn multiple_choice(
        text: impl Into<String>,
        options: Vec<String>,
        correct_answer: impl Into<String>,
        explanation: impl Into<String>,
        difficulty: u8,
        hint: impl Into<String>,
    ) -> Result<Self, GenerationFailure> {
        Self::try_from(QuestionPayload {
            question: text.into(),
            kind: QuestionKind::MultipleChoice,
            options,
            correct_answer: correct_answer.into(),
            explanation: explanation.into(),
            difficulty,
            hint: hint.into(),
        })
    }

    pub fn true_false(
        text: impl Into<String>,
        correct_answer: bool,
        explanation: impl Into<String>,
        difficulty: u8,
        hint: impl Into<String>,
    ) -> Result<Self, GenerationFailure> {
        Self::try_from(QuestionPayload {
            question: text.into(),
            kind: QuestionKind::TrueFalse,
            options: Vec::new(),
            correct_answer: if correct_answer { TRUE } else { FALSE }.to_string(),
            explanation: explanation.into(),
            difficulty,
            hint: hint.into(),
        })
    }

    /// Parse and validate a JSON document in the provider's question shape.
    pub fn from_json(json: &str) -> Result<Self, GenerationFailure> {
        serde_json::from_str(json).map_err(|e| GenerationFailure::invalid(e.to_string()))
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    /// Stored options. Empty for true/false questions.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Answers a player can pick from, in display order.
    pub fn choices(&self) -> Vec<&str> {
        match self.kind {
            QuestionKind::MultipleChoice => self.options.iter().map(String::as_str).collect(),
            QuestionKind::TrueFalse => vec![TRUE, FALSE],
        }
    }

    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    pub fn explanation(&self) -> &str {
        &self.explanation
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}

impl TryFrom<QuestionPayload> for Question {
    type Error = GenerationFailure;

    fn try_from(payload: QuestionPayload) -> Result<Self, Self::Error> {
        let text = payload.question.trim().to_string();
        if text.is_empty() {
            return Err(GenerationFailure::invalid("question text is empty"));
        }

        if !(Self::MIN_DIFFICULTY..=Self::MAX_DIFFICULTY).contains(&payload.difficulty) {
            return Err(GenerationFailure::invalid(format!(
                "difficulty {} outside {}..={}",
                payload.difficulty,
                Self::MIN_DIFFICULTY,
                Self::MAX_DIFFICULTY
            )));
        }

        let (options, correct_answer) = match payload.kind {
            QuestionKind::MultipleChoice => {
                let options: Vec<String> =
                    payload.options.iter().map(|o| o.trim().to_string()).collect();
                if options.len() < 2 {
                    return Err(GenerationFailure::invalid(format!(
                        "multiple choice needs at least 2 options, got {}",
                        options.len()
                    )));
                }
                if options.iter().any(String::is_empty) {
                    return Err(GenerationFailure::invalid("option text is empty"));
                }
                let mut seen = HashSet::new();
                if let Some(dup) = options.iter().find(|o| !seen.insert(o.as_str())) {
                    return Err(GenerationFailure::invalid(format!("duplicate option '{dup}'")));
                }
                let correct = payload.correct_answer.trim().to_string();
                if !options.contains(&correct) {
                    return Err(GenerationFailure::invalid(format!(
                        "correct_answer '{correct}' is not one of the options"
                    )));
                }
                (options, correct)
            }
            QuestionKind::TrueFalse => {
                let correct = match payload.correct_answer.trim().to_ascii_lowercase().as_str() {
                    "true" => TRUE,
                    "false" => FALSE,
                    other => {
                        return Err(GenerationFailure::invalid(format!(
                            "true/false correct_answer must be True or False, got '{other}'"
                        )))
                    }
                };
                (Vec::new(), correct.to_string())
            }
        };

        Ok(Self {
            text,
            kind: payload.kind,
            options,
            correct_answer,
            explanation: payload.explanation.trim().to_string(),
            difficulty: payload.difficulty,
            hint: payload.hint.trim().to_string(),
        })
    }
}
