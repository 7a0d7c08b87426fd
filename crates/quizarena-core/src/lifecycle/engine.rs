//! Question lifecycle state machine.
//!
//! The lifecycle is wall-clock based and runs no threads of its own. The
//! presentation loop calls `request_question` / `submit_answer`, and a timer
//! (or periodic `tick()`) calls `expire()` once time is up.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> AwaitingAnswer -> Resolving -> Idle
//! ```
//!
//! `Resolving` only exists inside a single `&mut self` call. The active slot
//! is taken before scoring starts, so a second `submit_answer` or `expire`
//! for the same question finds it empty and does nothing.
//!
//! ## Usage
//!
//! ```ignore
//! let mut lifecycle = QuestionLifecycle::new(session, provider);
//! lifecycle.request_question("Science", Difficulty::Medium).await?;
//! // Either the player answers...
//! let resolution = lifecycle.submit_answer("Paris");
//! // ...or the timer fires.
//! let resolution = lifecycle.expire();
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::clock::{Clock, SystemClock};
use crate::achievements::AchievementEngine;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::leaderboard::{LeaderboardEntry, LeaderboardLog};
use crate::provider::QuestionProvider;
use crate::question::{Difficulty, Question};
use crate::scoring::{self, AnswerEvent, ScoringRules, SubmittedAnswer};
use crate::session::{BadgeId, HistoryEntry, PowerUpKind, Session};

pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(20);
pub const DEFAULT_FREEZE_EXTENSION: Duration = Duration::from_secs(10);
const NO_HINT: &str = "No hint available";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Idle,
    AwaitingAnswer,
    /// Transient: scoring and bookkeeping for the question just answered.
    Resolving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub time_limit: Duration,
    pub freeze_extension: Duration,
    pub scoring: ScoringRules,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            time_limit: DEFAULT_TIME_LIMIT,
            freeze_extension: DEFAULT_FREEZE_EXTENSION,
            scoring: ScoringRules::default(),
        }
    }
}

/// The single question slot, populated between issue and resolution.
#[derive(Debug, Clone)]
pub struct ActiveQuestion {
    id: Uuid,
    question: Question,
    category: String,
    difficulty: Difficulty,
    started_at: DateTime<Utc>,
    extension: Duration,
    hint_revealed: bool,
    freeze_used: bool,
    double_armed: bool,
}

impl ActiveQuestion {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn double_armed(&self) -> bool {
        self.double_armed
    }

    pub fn freeze_used(&self) -> bool {
        self.freeze_used
    }

    fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        (now - self.started_at).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Outcome of one resolved question, for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub question_id: Uuid,
    pub question: Question,
    pub submitted: SubmittedAnswer,
    pub correct: bool,
    pub timed_out: bool,
    pub elapsed: Duration,
    pub points_awarded: u32,
    pub streak: u32,
    pub hints_granted: u32,
    pub new_badges: Vec<BadgeId>,
}

impl Resolution {
    pub fn correct_answer(&self) -> &str {
        self.question.correct_answer()
    }

    pub fn explanation(&self) -> &str {
        self.question.explanation()
    }
}

pub struct QuestionLifecycle {
    session: Session,
    leaderboard: LeaderboardLog,
    provider: Arc<dyn QuestionProvider>,
    clock: Arc<dyn Clock>,
    achievements: AchievementEngine,
    config: LifecycleConfig,
    state: LifecycleState,
    slot: Option<ActiveQuestion>,
    events: Vec<Event>,
}

impl QuestionLifecycle {
    /// Create an idle lifecycle for a registered session.
    pub fn new(session: Session, provider: Arc<dyn QuestionProvider>) -> Self {
        Self {
            session,
            leaderboard: LeaderboardLog::new(),
            provider,
            clock: Arc::new(SystemClock),
            achievements: AchievementEngine::default(),
            config: LifecycleConfig::default(),
            state: LifecycleState::Idle,
            slot: None,
            events: Vec::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_config(mut self, config: LifecycleConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_achievements(mut self, achievements: AchievementEngine) -> Self {
        self.achievements = achievements;
        self
    }

    /// Continue appending to an existing log.
    pub fn with_leaderboard(mut self, leaderboard: LeaderboardLog) -> Self {
        self.leaderboard = leaderboard;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn leaderboard(&self) -> &LeaderboardLog {
        &self.leaderboard
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    pub fn active(&self) -> Option<&ActiveQuestion> {
        self.slot.as_ref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.slot.as_ref().map(|a| &a.question)
    }

    pub fn current_question_id(&self) -> Option<Uuid> {
        self.slot.as_ref().map(|a| a.id)
    }

    /// Time left on the active question, `None` when idle.
    ///
    /// `max(limit + freeze extension - elapsed, 0)`.
    pub fn time_remaining(&self) -> Option<Duration> {
        let active = self.slot.as_ref()?;
        let budget = self.config.time_limit + active.extension;
        Some(budget.saturating_sub(active.elapsed(self.clock.now())))
    }

    pub fn is_expired(&self) -> bool {
        self.time_remaining().is_some_and(|d| d.is_zero())
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            question_id: self.current_question_id(),
            remaining_ms: self.time_remaining().map(|d| d.as_millis() as u64),
            score: self.session.score(),
            streak: self.session.streak(),
            at: self.clock.now(),
        }
    }

    /// Take all events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Fetch a question and start its timer.
    ///
    /// Only valid while idle. A provider failure leaves the lifecycle idle
    /// and is returned as [`CoreError::Generation`]; nothing is retried.
    pub async fn request_question(
        &mut self,
        category: &str,
        difficulty: Difficulty,
    ) -> Result<Question> {
        if self.state != LifecycleState::Idle {
            return Err(CoreError::QuestionAlreadyActive);
        }

        match self.provider.fetch(category, difficulty).await {
            Ok(question) => {
                let id = Uuid::new_v4();
                let started_at = self.clock.now();
                info!(
                    %id,
                    category,
                    %difficulty,
                    provider = self.provider.name(),
                    "question issued"
                );
                self.slot = Some(ActiveQuestion {
                    id,
                    question: question.clone(),
                    category: category.to_string(),
                    difficulty,
                    started_at,
                    extension: Duration::ZERO,
                    hint_revealed: false,
                    freeze_used: false,
                    double_armed: false,
                });
                self.state = LifecycleState::AwaitingAnswer;
                self.events.push(Event::QuestionIssued {
                    question_id: id,
                    category: category.to_string(),
                    difficulty,
                    time_limit_secs: self.config.time_limit.as_secs(),
                    at: started_at,
                });
                Ok(question)
            }
            Err(failure) => {
                warn!(category, reason = %failure, "question generation failed");
                self.events.push(Event::GenerationFailed {
                    category: category.to_string(),
                    reason: failure.reason(),
                    at: self.clock.now(),
                });
                Err(failure.into())
            }
        }
    }

    /// Score the player's answer.
    ///
    /// Returns `None` when no question is active (a late duplicate after
    /// the timer already resolved it). If the deadline has passed at the
    /// moment of the call, the answer is discarded and the question is
    /// resolved as a timeout instead.
    pub fn submit_answer(&mut self, answer: &str) -> Option<Resolution> {
        let Some(remaining) = self.time_remaining() else {
            debug!("answer submitted with no active question; ignoring");
            return None;
        };
        if remaining.is_zero() {
            debug!("answer arrived after the deadline; resolving as timeout");
            return self.resolve(SubmittedAnswer::Timeout);
        }
        self.resolve(SubmittedAnswer::Answer(answer.to_string()))
    }

    /// Resolve the active question as timed out.
    ///
    /// No-op unless a question is active and its time is up.
    pub fn expire(&mut self) -> Option<Resolution> {
        match self.time_remaining() {
            None => None,
            Some(remaining) if !remaining.is_zero() => {
                debug!(remaining_ms = remaining.as_millis() as u64, "expire called early; ignoring");
                None
            }
            Some(_) => self.resolve(SubmittedAnswer::Timeout),
        }
    }

    /// Expire only if `question_id` is still the active question.
    pub fn expire_question(&mut self, question_id: Uuid) -> Option<Resolution> {
        if self.current_question_id() != Some(question_id) {
            return None;
        }
        self.expire()
    }

    /// Call periodically. Returns the timeout resolution once time is up.
    pub fn tick(&mut self) -> Option<Resolution> {
        if self.is_expired() {
            self.expire()
        } else {
            None
        }
    }

    /// Spend a hint and return the hint text.
    ///
    /// The first reveal per question costs one hint; asking again for the
    /// same question returns the text without charging.
    pub fn request_hint(&mut self) -> Result<String> {
        self.ensure_live()?;
        let Some(active) = self.slot.as_mut() else {
            return Err(CoreError::NoActiveQuestion);
        };
        if !active.hint_revealed {
            self.session.spend(PowerUpKind::Hint)?;
            active.hint_revealed = true;
            self.events.push(Event::PowerUpUsed {
                question_id: active.id,
                kind: PowerUpKind::Hint,
                remaining: self.session.power_ups().hint,
                at: self.clock.now(),
            });
        }
        let hint = active.question.hint();
        Ok(if hint.is_empty() { NO_HINT } else { hint }.to_string())
    }

    /// Extend the active question's deadline. Returns the new time remaining.
    pub fn use_freeze(&mut self) -> Result<Duration> {
        self.ensure_live()?;
        let extension = self.config.freeze_extension;
        let Some(active) = self.slot.as_mut() else {
            return Err(CoreError::NoActiveQuestion);
        };
        if active.freeze_used {
            return Err(CoreError::PowerUpAlreadyArmed(PowerUpKind::Freeze));
        }
        self.session.spend(PowerUpKind::Freeze)?;
        active.freeze_used = true;
        active.extension += extension;
        self.events.push(Event::PowerUpUsed {
            question_id: active.id,
            kind: PowerUpKind::Freeze,
            remaining: self.session.power_ups().freeze,
            at: self.clock.now(),
        });
        self.time_remaining().ok_or(CoreError::NoActiveQuestion)
    }

    /// Double the points for the active question if it is answered correctly.
    pub fn use_double(&mut self) -> Result<()> {
        self.ensure_live()?;
        let Some(active) = self.slot.as_mut() else {
            return Err(CoreError::NoActiveQuestion);
        };
        if active.double_armed {
            return Err(CoreError::PowerUpAlreadyArmed(PowerUpKind::Double));
        }
        self.session.spend(PowerUpKind::Double)?;
        active.double_armed = true;
        self.events.push(Event::PowerUpUsed {
            question_id: active.id,
            kind: PowerUpKind::Double,
            remaining: self.session.power_ups().double,
            at: self.clock.now(),
        });
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Power-ups need a question that is still answerable.
    fn ensure_live(&self) -> Result<()> {
        match self.time_remaining() {
            Some(remaining) if !remaining.is_zero() => Ok(()),
            _ => Err(CoreError::NoActiveQuestion),
        }
    }

    fn resolve(&mut self, submitted: SubmittedAnswer) -> Option<Resolution> {
        // Taking the slot is the single point that makes resolution exactly-once.
        let active = self.slot.take()?;
        self.state = LifecycleState::Resolving;

        let now = self.clock.now();
        let elapsed = active.elapsed(now);
        let event = AnswerEvent {
            question: active.question,
            submitted,
            elapsed,
            double_points: active.double_armed,
        };

        let delta = scoring::score(&self.session, &event, &self.config.scoring);
        self.session.apply(
            &delta,
            HistoryEntry {
                question_text: event.question.text().to_string(),
                category: active.category.clone(),
                correct: delta.correct,
                timed_out: delta.timed_out,
                points: delta.points_awarded,
                timestamp: now,
            },
        );

        let earned = self.achievements.evaluate(&self.session);
        let new_badges = self.session.award(earned);

        self.leaderboard.append(LeaderboardEntry {
            nickname: self.session.nickname().to_string(),
            score: self.session.score(),
            avatar: self.session.avatar().to_string(),
            category: active.category,
            timestamp: now,
        });

        info!(
            id = %active.id,
            correct = delta.correct,
            timed_out = delta.timed_out,
            points = delta.points_awarded,
            streak = delta.streak_after,
            "question resolved"
        );

        if delta.hints_granted > 0 {
            self.events.push(Event::PowerUpGranted {
                kind: PowerUpKind::Hint,
                count: delta.hints_granted,
                at: now,
            });
        }
        self.events.push(Event::QuestionResolved {
            question_id: active.id,
            correct: delta.correct,
            timed_out: delta.timed_out,
            points_awarded: delta.points_awarded,
            score: self.session.score(),
            streak: self.session.streak(),
            at: now,
        });
        for badge in &new_badges {
            info!(%badge, "badge earned");
            self.events.push(Event::BadgeEarned {
                badge: badge.clone(),
                at: now,
            });
        }

        self.state = LifecycleState::Idle;
        Some(Resolution {
            question_id: active.id,
            question: event.question,
            submitted: event.submitted,
            correct: delta.correct,
            timed_out: delta.timed_out,
            elapsed: event.elapsed,
            points_awarded: delta.points_awarded,
            streak: delta.streak_after,
            hints_granted: delta.hints_granted,
            new_badges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationFailure;
    use crate::lifecycle::clock::ManualClock;
    use crate::provider::QuestionBank;

    fn paris() -> Question {
        Question::multiple_choice(
            "What is the capital of France?",
            vec!["London".into(), "Paris".into(), "Rome".into()],
            "Paris",
            "Paris has been the capital since the 5th century.",
            3,
            "City of Light",
        )
        .unwrap()
    }

    fn lifecycle(clock: &ManualClock) -> QuestionLifecycle {
        let session = Session::register("ada", "🦊").unwrap();
        let provider = Arc::new(QuestionBank::new(vec![paris()]));
        QuestionLifecycle::new(session, provider).with_clock(Arc::new(clock.clone()))
    }

    #[tokio::test]
    async fn request_moves_to_awaiting_answer() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        assert_eq!(lc.state(), LifecycleState::Idle);
        assert!(lc.time_remaining().is_none());

        lc.request_question("Geography", Difficulty::Easy).await.unwrap();
        assert_eq!(lc.state(), LifecycleState::AwaitingAnswer);
        assert_eq!(lc.time_remaining(), Some(DEFAULT_TIME_LIMIT));
        assert_eq!(lc.current_question().unwrap().text(), "What is the capital of France?");

        let events = lc.drain_events();
        assert!(matches!(events.as_slice(), [Event::QuestionIssued { .. }]));
        assert!(lc.drain_events().is_empty());
    }

    #[tokio::test]
    async fn request_while_active_is_rejected() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        lc.request_question("Geography", Difficulty::Easy).await.unwrap();
        let err = lc.request_question("Geography", Difficulty::Easy).await.unwrap_err();
        assert!(matches!(err, CoreError::QuestionAlreadyActive));
    }

    #[tokio::test]
    async fn provider_failure_stays_idle() {
        let clock = ManualClock::default();
        let session = Session::register("ada", "").unwrap();
        let mut lc = QuestionLifecycle::new(session, Arc::new(QuestionBank::new(Vec::new())))
            .with_clock(Arc::new(clock));

        let err = lc.request_question("Science", Difficulty::Hard).await.unwrap_err();
        assert!(matches!(err, CoreError::Generation(GenerationFailure::EmptyBank)));
        assert_eq!(lc.state(), LifecycleState::Idle);
        assert!(lc.current_question().is_none());
        assert!(matches!(lc.drain_events().as_slice(), [Event::GenerationFailed { .. }]));
    }

    #[tokio::test]
    async fn correct_answer_resolves_and_returns_to_idle() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        lc.request_question("Geography", Difficulty::Medium).await.unwrap();
        clock.advance_ms(4_000);

        let res = lc.submit_answer("Paris").unwrap();
        assert!(res.correct);
        assert_eq!(res.points_awarded, 30);
        assert_eq!(res.elapsed, Duration::from_secs(4));
        assert_eq!(res.explanation(), "Paris has been the capital since the 5th century.");
        assert_eq!(res.new_badges, vec![BadgeId::from("first-correct")]);

        assert_eq!(lc.state(), LifecycleState::Idle);
        assert!(lc.current_question().is_none());
        assert_eq!(lc.session().score(), 30);
        assert_eq!(lc.session().correct_answers(), 1);
        assert_eq!(lc.session().history().len(), 1);
        assert_eq!(lc.leaderboard().len(), 1);
        assert_eq!(lc.leaderboard().entries()[0].category, "Geography");
    }

    #[tokio::test]
    async fn second_submission_is_a_no_op() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        lc.request_question("Geography", Difficulty::Medium).await.unwrap();

        assert!(lc.submit_answer("Rome").is_some());
        assert!(lc.submit_answer("Paris").is_none());
        assert!(lc.expire().is_none());
        assert_eq!(lc.session().history().len(), 1);
        assert_eq!(lc.leaderboard().len(), 1);
        assert_eq!(lc.session().score(), 0);
    }

    #[tokio::test]
    async fn expire_before_deadline_is_ignored() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        lc.request_question("Geography", Difficulty::Medium).await.unwrap();
        clock.advance_ms(10_000);
        assert!(lc.expire().is_none());
        assert!(lc.tick().is_none());
        assert_eq!(lc.state(), LifecycleState::AwaitingAnswer);
    }

    #[tokio::test]
    async fn tick_expires_after_deadline() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        lc.request_question("Geography", Difficulty::Medium).await.unwrap();
        clock.advance_ms(20_000);
        assert_eq!(lc.time_remaining(), Some(Duration::ZERO));

        let res = lc.tick().unwrap();
        assert!(res.timed_out);
        assert_eq!(res.submitted, SubmittedAnswer::Timeout);
        assert!(lc.tick().is_none());
    }

    #[tokio::test]
    async fn hint_charges_once_per_question() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        lc.request_question("Geography", Difficulty::Medium).await.unwrap();

        assert_eq!(lc.request_hint().unwrap(), "City of Light");
        assert_eq!(lc.request_hint().unwrap(), "City of Light");
        assert_eq!(lc.session().power_ups().hint, 2);
    }

    #[tokio::test]
    async fn power_ups_need_a_live_question() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        assert!(matches!(lc.request_hint(), Err(CoreError::NoActiveQuestion)));

        lc.request_question("Geography", Difficulty::Medium).await.unwrap();
        clock.advance_ms(25_000);
        assert!(matches!(lc.use_double(), Err(CoreError::NoActiveQuestion)));
        assert_eq!(lc.session().power_ups().double, 1);
    }

    #[tokio::test]
    async fn freeze_extends_deadline_once() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        lc.request_question("Geography", Difficulty::Medium).await.unwrap();
        clock.advance_ms(15_000);

        let remaining = lc.use_freeze().unwrap();
        assert_eq!(remaining, Duration::from_secs(15));
        assert!(matches!(
            lc.use_freeze(),
            Err(CoreError::PowerUpAlreadyArmed(PowerUpKind::Freeze))
        ));

        clock.advance_ms(12_000);
        let res = lc.submit_answer("Paris").unwrap();
        assert!(res.correct);
    }

    #[tokio::test]
    async fn double_points_applies_to_correct_answer() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        lc.request_question("Geography", Difficulty::Medium).await.unwrap();
        lc.use_double().unwrap();
        assert_eq!(lc.session().power_ups().double, 0);

        let res = lc.submit_answer("Paris").unwrap();
        assert_eq!(res.points_awarded, 60);
        assert_eq!(lc.session().score(), 60);
    }

    #[tokio::test]
    async fn snapshot_reports_remaining_time() {
        let clock = ManualClock::default();
        let mut lc = lifecycle(&clock);
        lc.request_question("Geography", Difficulty::Medium).await.unwrap();
        clock.advance_ms(5_000);
        match lc.snapshot() {
            Event::StateSnapshot {
                state,
                remaining_ms,
                ..
            } => {
                assert_eq!(state, LifecycleState::AwaitingAnswer);
                assert_eq!(remaining_ms, Some(15_000));
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
