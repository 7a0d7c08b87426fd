//! Player session record.
//!
//! A [`Session`] is owned by exactly one lifecycle. Its fields are only
//! changed by scoring, achievement evaluation and power-up consumption;
//! everything outside the crate gets read-only accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{CoreError, Result};
use crate::scoring::ScoreDelta;

pub const DEFAULT_AVATAR: &str = "🤖";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerUpKind {
    Hint,
    Freeze,
    Double,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Hint, PowerUpKind::Freeze, PowerUpKind::Double];

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerUpKind::Hint => "hint",
            PowerUpKind::Freeze => "freeze",
            PowerUpKind::Double => "double",
        }
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Consumable inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerUps {
    pub hint: u32,
    pub freeze: u32,
    pub double: u32,
}

impl Default for PowerUps {
    fn default() -> Self {
        Self {
            hint: 3,
            freeze: 1,
            double: 1,
        }
    }
}

impl PowerUps {
    pub fn get(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::Hint => self.hint,
            PowerUpKind::Freeze => self.freeze,
            PowerUpKind::Double => self.double,
        }
    }

    fn slot_mut(&mut self, kind: PowerUpKind) -> &mut u32 {
        match kind {
            PowerUpKind::Hint => &mut self.hint,
            PowerUpKind::Freeze => &mut self.freeze,
            PowerUpKind::Double => &mut self.double,
        }
    }

    fn add(&mut self, kind: PowerUpKind, count: u32) {
        let slot = self.slot_mut(kind);
        *slot = slot.saturating_add(count);
    }

    /// Decrement by one; `false` when none are left.
    fn take(&mut self, kind: PowerUpKind) -> bool {
        let slot = self.slot_mut(kind);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

/// Permanent achievement flag.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BadgeId(String);

impl BadgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BadgeId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question_text: String,
    pub category: String,
    pub correct: bool,
    pub timed_out: bool,
    pub points: u32,
    pub timestamp: DateTime<Utc>,
}

/// Aggregates derived from the answer history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub answered: usize,
    pub correct: usize,
    pub timed_out: usize,
    pub accuracy_pct: f64,
    pub best_streak: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    nickname: String,
    avatar: String,
    score: u32,
    correct_answers: u32,
    streak: u32,
    #[serde(default)]
    best_streak: u32,
    power_ups: PowerUps,
    badges: BTreeSet<BadgeId>,
    history: Vec<HistoryEntry>,
}

impl Session {
    /// Register a player with the default starting inventory.
    ///
    /// A blank avatar falls back to [`DEFAULT_AVATAR`].
    pub fn register(nickname: &str, avatar: &str) -> Result<Self> {
        Self::register_with(nickname, avatar, PowerUps::default())
    }

    pub fn register_with(nickname: &str, avatar: &str, power_ups: PowerUps) -> Result<Self> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(CoreError::InvalidNickname);
        }
        let avatar = match avatar.trim() {
            "" => DEFAULT_AVATAR,
            a => a,
        };
        Ok(Self {
            nickname: nickname.to_string(),
            avatar: avatar.to_string(),
            score: 0,
            correct_answers: 0,
            streak: 0,
            best_streak: 0,
            power_ups,
            badges: BTreeSet::new(),
            history: Vec::new(),
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn avatar(&self) -> &str {
        &self.avatar
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    pub fn power_ups(&self) -> PowerUps {
        self.power_ups
    }

    pub fn badges(&self) -> &BTreeSet<BadgeId> {
        &self.badges
    }

    pub fn has_badge(&self, badge: &BadgeId) -> bool {
        self.badges.contains(badge)
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Correct answers recorded for `category`.
    pub fn correct_in_category(&self, category: &str) -> usize {
        self.history
            .iter()
            .filter(|h| h.correct && h.category == category)
            .count()
    }

    pub fn stats(&self) -> SessionStats {
        let answered = self.history.len();
        let correct = self.history.iter().filter(|h| h.correct).count();
        let timed_out = self.history.iter().filter(|h| h.timed_out).count();
        let accuracy_pct = if answered == 0 {
            0.0
        } else {
            correct as f64 / answered as f64 * 100.0
        };
        SessionStats {
            answered,
            correct,
            timed_out,
            accuracy_pct,
            best_streak: self.best_streak,
        }
    }

    // ── Mutations (crate-internal) ───────────────────────────────────

    /// Apply a scoring result and record it in the history.
    pub(crate) fn apply(&mut self, delta: &ScoreDelta, entry: HistoryEntry) {
        self.score = self.score.saturating_add(delta.points_awarded);
        self.correct_answers = self
            .correct_answers
            .saturating_add(delta.correct_answers_increment);
        self.streak = delta.streak_after;
        self.best_streak = self.best_streak.max(self.streak);
        if delta.hints_granted > 0 {
            self.power_ups.add(PowerUpKind::Hint, delta.hints_granted);
        }
        self.history.push(entry);
    }

    pub(crate) fn spend(&mut self, kind: PowerUpKind) -> Result<()> {
        if self.power_ups.take(kind) {
            Ok(())
        } else {
            Err(CoreError::PowerUpUnavailable(kind))
        }
    }

    /// Union `badges` into the session. Returns the ones not held before.
    pub(crate) fn award(&mut self, badges: impl IntoIterator<Item = BadgeId>) -> Vec<BadgeId> {
        badges
            .into_iter()
            .filter(|b| self.badges.insert(b.clone()))
            .collect()
    }
}
