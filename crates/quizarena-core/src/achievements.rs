//! Badge rules.
//!
//! Achievements are a flat table of `criterion -> badge`, evaluated the same
//! way after every resolution. Category mastery expands to one badge per
//! category (`category-master:Science`).

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::session::{BadgeId, Session};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Criterion {
    StreakAtLeast { streak: u32 },
    CorrectAtLeast { count: u32 },
    /// `count` correct answers within a single category.
    CategoryCorrectAtLeast { count: u32 },
    ScoreAtLeast { score: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRule {
    pub badge: String,
    pub criterion: Criterion,
}

impl AchievementRule {
    pub fn new(badge: impl Into<String>, criterion: Criterion) -> Self {
        Self {
            badge: badge.into(),
            criterion,
        }
    }

    /// Badges this rule grants for the session's current state.
    pub fn earned(&self, session: &Session) -> Vec<BadgeId> {
        match self.criterion {
            Criterion::StreakAtLeast { streak } => {
                self.flag(session.streak() >= streak)
            }
            Criterion::CorrectAtLeast { count } => {
                self.flag(session.correct_answers() >= count)
            }
            Criterion::ScoreAtLeast { score } => self.flag(session.score() >= score),
            Criterion::CategoryCorrectAtLeast { count } => {
                let mut per_category: HashMap<&str, u32> = HashMap::new();
                for entry in session.history().iter().filter(|h| h.correct) {
                    *per_category.entry(entry.category.as_str()).or_default() += 1;
                }
                per_category
                    .into_iter()
                    .filter(|(_, n)| *n >= count)
                    .map(|(category, _)| BadgeId::new(format!("{}:{category}", self.badge)))
                    .collect()
            }
        }
    }

    fn flag(&self, hit: bool) -> Vec<BadgeId> {
        if hit {
            vec![BadgeId::new(self.badge.clone())]
        } else {
            Vec::new()
        }
    }
}

/// Baseline rule set.
pub fn default_rules() -> Vec<AchievementRule> {
    vec![
        AchievementRule::new("first-correct", Criterion::CorrectAtLeast { count: 1 }),
        AchievementRule::new("scholar", Criterion::CorrectAtLeast { count: 10 }),
        AchievementRule::new("sage", Criterion::CorrectAtLeast { count: 50 }),
        AchievementRule::new("hot-streak", Criterion::StreakAtLeast { streak: 5 }),
        AchievementRule::new("unstoppable", Criterion::StreakAtLeast { streak: 10 }),
        AchievementRule::new(
            "category-master",
            Criterion::CategoryCorrectAtLeast { count: 5 },
        ),
        AchievementRule::new("high-roller", Criterion::ScoreAtLeast { score: 500 }),
    ]
}

#[derive(Debug, Clone)]
pub struct AchievementEngine {
    rules: Vec<AchievementRule>,
}

impl Default for AchievementEngine {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl AchievementEngine {
    pub fn new(rules: Vec<AchievementRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AchievementRule] {
        &self.rules
    }

    /// Badges earned by the current state that the session does not hold yet.
    pub fn evaluate(&self, session: &Session) -> BTreeSet<BadgeId> {
        self.rules
            .iter()
            .flat_map(|rule| rule.earned(session))
            .filter(|badge| !session.has_badge(badge))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::ScoreDelta;
    use crate::session::HistoryEntry;
    use chrono::Utc;

    fn answer(session: &mut Session, category: &str, correct: bool) {
        let streak_after = if correct { session.streak() + 1 } else { 0 };
        let delta = ScoreDelta {
            correct,
            timed_out: false,
            points_awarded: if correct { 10 } else { 0 },
            streak_after,
            hints_granted: 0,
            correct_answers_increment: u32::from(correct),
        };
        let entry = HistoryEntry {
            question_text: "Q".into(),
            category: category.into(),
            correct,
            timed_out: false,
            points: delta.points_awarded,
            timestamp: Utc::now(),
        };
        session.apply(&delta, entry);
    }

    #[test]
    fn first_correct_answer_earns_badge() {
        let engine = AchievementEngine::default();
        let mut session = Session::register("ada", "").unwrap();
        assert!(engine.evaluate(&session).is_empty());

        answer(&mut session, "Science", true);
        let earned = engine.evaluate(&session);
        assert_eq!(earned, BTreeSet::from([BadgeId::from("first-correct")]));
    }

    #[test]
    fn evaluating_twice_never_duplicates() {
        let engine = AchievementEngine::default();
        let mut session = Session::register("ada", "").unwrap();
        answer(&mut session, "Science", true);

        let first = engine.evaluate(&session);
        session.award(first.clone());
        let second = engine.evaluate(&session);
        session.award(second.clone());

        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(session.badges().len(), 1);
    }

    #[test]
    fn streak_milestone_and_category_mastery() {
        let engine = AchievementEngine::default();
        let mut session = Session::register("ada", "").unwrap();
        for _ in 0..5 {
            answer(&mut session, "History", true);
        }
        let earned = engine.evaluate(&session);
        assert!(earned.contains(&BadgeId::from("hot-streak")));
        assert!(earned.contains(&BadgeId::from("category-master:History")));
        assert!(!earned.contains(&BadgeId::from("category-master:Science")));
    }

    #[test]
    fn badges_survive_streak_reset() {
        let engine = AchievementEngine::default();
        let mut session = Session::register("ada", "").unwrap();
        for _ in 0..5 {
            answer(&mut session, "History", true);
        }
        let earned = engine.evaluate(&session);
        session.award(earned);
        answer(&mut session, "History", false);

        assert_eq!(session.streak(), 0);
        assert!(session.has_badge(&BadgeId::from("hot-streak")));
        assert!(engine.evaluate(&session).is_empty());
    }

    #[test]
    fn custom_rule_table() {
        let engine = AchievementEngine::new(vec![AchievementRule::new(
            "tiny",
            Criterion::ScoreAtLeast { score: 10 },
        )]);
        let mut session = Session::register("ada", "").unwrap();
        answer(&mut session, "Science", true);
        assert_eq!(engine.evaluate(&session), BTreeSet::from([BadgeId::from("tiny")]));
    }
}
