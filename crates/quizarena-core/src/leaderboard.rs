//! Append-only leaderboard log.
//!
//! Entries are stored in append order and never edited. Ranking is a view
//! computed at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub nickname: String,
    pub score: u32,
    pub avatar: String,
    pub category: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeaderboardLog {
    entries: Vec<LeaderboardEntry>,
}

impl LeaderboardLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&mut self, entry: LeaderboardEntry) {
        self.entries.push(entry);
    }

    /// Entries in append order.
    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descending score; ties keep append order.
    pub fn ranked(&self) -> Vec<&LeaderboardEntry> {
        let mut view: Vec<&LeaderboardEntry> = self.entries.iter().collect();
        view.sort_by(|a, b| b.score.cmp(&a.score));
        view
    }

    pub fn top(&self, n: usize) -> Vec<&LeaderboardEntry> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}
