//! # Quiz Arena Core Library
//!
//! Business logic for a single-player, time-limited trivia session. The
//! CLI is a thin layer over this crate; rendering, audio and pacing are left
//! to the caller.
//!
//! ## Architecture
//!
//! - **Question Lifecycle**: a wall-clock state machine
//!   (`Idle -> AwaitingAnswer -> Resolving -> Idle`) that guarantees exactly
//!   one resolution per question, even when a submission races the timer
//! - **Scoring**: pure computation of points, streak and bonus hints
//! - **Achievements**: declarative badge rule table
//! - **Providers**: question sources (Groq chat completions, offline bank)
//! - **Config**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`QuestionLifecycle`]: core state machine
//! - [`SharedLifecycle`]: async wrapper with an expiry timer
//! - [`Session`]: per-player record
//! - [`QuestionProvider`]: trait for question sources

pub mod achievements;
pub mod config;
pub mod error;
pub mod events;
pub mod leaderboard;
pub mod lifecycle;
pub mod provider;
pub mod question;
pub mod scoring;
pub mod session;

pub use achievements::{AchievementEngine, AchievementRule, Criterion};
pub use config::Config;
pub use error::{ConfigError, CoreError, GenerationFailure};
pub use events::Event;
pub use leaderboard::{LeaderboardEntry, LeaderboardLog};
pub use lifecycle::{
    Clock, LifecycleConfig, LifecycleState, ManualClock, QuestionLifecycle, Resolution,
    SharedLifecycle, SystemClock,
};
pub use provider::{GroqProvider, QuestionBank, QuestionProvider};
pub use question::{Difficulty, Question, QuestionKind};
pub use scoring::{AnswerEvent, ScoreDelta, ScoringRules, SubmittedAnswer};
pub use session::{BadgeId, HistoryEntry, PowerUpKind, PowerUps, Session, SessionStats};
