use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::LifecycleState;
use crate::question::Difficulty;
use crate::session::{BadgeId, PowerUpKind};

/// Every state change in the lifecycle produces an Event.
/// The presentation layer drains them and decides its own pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    QuestionIssued {
        question_id: Uuid,
        category: String,
        difficulty: Difficulty,
        time_limit_secs: u64,
        at: DateTime<Utc>,
    },
    GenerationFailed {
        category: String,
        reason: String,
        at: DateTime<Utc>,
    },
    PowerUpUsed {
        question_id: Uuid,
        kind: PowerUpKind,
        remaining: u32,
        at: DateTime<Utc>,
    },
    PowerUpGranted {
        kind: PowerUpKind,
        count: u32,
        at: DateTime<Utc>,
    },
    QuestionResolved {
        question_id: Uuid,
        correct: bool,
        timed_out: bool,
        points_awarded: u32,
        score: u32,
        streak: u32,
        at: DateTime<Utc>,
    },
    BadgeEarned {
        badge: BadgeId,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: LifecycleState,
        question_id: Option<Uuid>,
        remaining_ms: Option<u64>,
        score: u32,
        streak: u32,
        at: DateTime<Utc>,
    },
}
