//! Core error types for quizarena-core.
//!
//! Every failure the core can report is recoverable: after any error the
//! lifecycle is left `Idle` with an unchanged score, or unchanged in
//! `AwaitingAnswer` for power-up misuse.

use std::path::PathBuf;
use thiserror::Error;

use crate::session::PowerUpKind;

/// Core error type for quizarena-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The question provider failed or returned an unusable payload.
    #[error("Question generation failed: {0}")]
    Generation(#[from] GenerationFailure),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Registration with an empty or blank nickname
    #[error("Nickname must not be empty")]
    InvalidNickname,

    /// `request_question` called while a question is still pending
    #[error("A question is already active")]
    QuestionAlreadyActive,

    /// Power-up used with no question on screen
    #[error("No active question")]
    NoActiveQuestion,

    #[error("No {0} power-ups left")]
    PowerUpUnavailable(PowerUpKind),

    #[error("The {0} power-up is already active for this question")]
    PowerUpAlreadyArmed(PowerUpKind),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a question could not be produced.
///
/// Carries a human-readable reason; callers decide whether to retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationFailure {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("provider unreachable: {0}")]
    Unreachable(String),

    /// Provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Payload did not deserialize or violated question invariants.
    #[error("invalid question payload: {0}")]
    InvalidPayload(String),

    /// Provider is missing credentials or other required settings.
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Offline bank has nothing to serve.
    #[error("question bank is empty")]
    EmptyBank,
}

impl GenerationFailure {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidPayload(reason.into())
    }

    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

impl From<reqwest::Error> for GenerationFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            GenerationFailure::InvalidPayload(err.to_string())
        } else {
            GenerationFailure::Unreachable(err.to_string())
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_failure_reason_is_readable() {
        let failure = GenerationFailure::invalid("correct_answer not among options");
        assert_eq!(
            failure.reason(),
            "invalid question payload: correct_answer not among options"
        );
    }

    #[test]
    fn core_error_wraps_generation_failure() {
        let err: CoreError = GenerationFailure::EmptyBank.into();
        assert!(matches!(err, CoreError::Generation(GenerationFailure::EmptyBank)));
        assert_eq!(err.to_string(), "Question generation failed: question bank is empty");
    }

    #[test]
    fn power_up_errors_name_the_kind() {
        let err = CoreError::PowerUpUnavailable(PowerUpKind::Hint);
        assert_eq!(err.to_string(), "No hint power-ups left");
    }
}
