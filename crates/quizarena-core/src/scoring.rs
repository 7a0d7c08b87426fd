//! Answer scoring.
//!
//! [`score`] is a pure function: it reads the session and the answer event
//! and describes what should change. The lifecycle applies the result.
//!
//! ## Rules
//!
//! | Outcome   | Points                         | Streak | Hint bonus                     |
//! |-----------|--------------------------------|--------|--------------------------------|
//! | correct   | 10 × difficulty (× 2 if armed) | +1     | +1 when streak % interval == 0 |
//! | incorrect | 0                              | 0      | none                           |
//! | timeout   | 0                              | 0      | none                           |

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::question::Question;
use crate::session::Session;

pub const POINTS_PER_DIFFICULTY: u32 = 10;
pub const DEFAULT_HINT_BONUS_INTERVAL: u32 = 3;

/// What the player submitted, or the timeout marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SubmittedAnswer {
    Answer(String),
    Timeout,
}

/// Produced exactly once per question instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerEvent {
    pub question: Question,
    pub submitted: SubmittedAnswer,
    pub elapsed: Duration,
    /// Double-points power-up was armed for this question.
    #[serde(default)]
    pub double_points: bool,
}

impl AnswerEvent {
    pub fn is_correct(&self) -> bool {
        match &self.submitted {
            SubmittedAnswer::Answer(answer) => self.question.is_correct(answer),
            SubmittedAnswer::Timeout => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    /// Every streak multiple of this grants one hint. 0 disables the bonus.
    pub hint_bonus_interval: u32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            hint_bonus_interval: DEFAULT_HINT_BONUS_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDelta {
    pub correct: bool,
    pub timed_out: bool,
    pub points_awarded: u32,
    pub streak_after: u32,
    pub hints_granted: u32,
    pub correct_answers_increment: u32,
}

pub fn score(session: &Session, event: &AnswerEvent, rules: &ScoringRules) -> ScoreDelta {
    let correct = event.is_correct();
    let timed_out = event.submitted == SubmittedAnswer::Timeout;

    if !correct {
        return ScoreDelta {
            correct,
            timed_out,
            points_awarded: 0,
            streak_after: 0,
            hints_granted: 0,
            correct_answers_increment: 0,
        };
    }

    let mut points = POINTS_PER_DIFFICULTY * u32::from(event.question.difficulty());
    if event.double_points {
        points *= 2;
    }

    // Streak moves by exactly one, so at most one multiple is crossed.
    let streak_after = session.streak().saturating_add(1);
    let hints_granted = match rules.hint_bonus_interval {
        0 => 0,
        n if streak_after % n == 0 => 1,
        _ => 0,
    };

    ScoreDelta {
        correct,
        timed_out,
        points_awarded: points,
        streak_after,
        hints_granted,
        correct_answers_increment: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::HistoryEntry;
    use chrono::Utc;
    use proptest::prelude::*;

    fn question(difficulty: u8) -> Question {
        Question::multiple_choice(
            "2 + 2?",
            vec!["3".into(), "4".into(), "5".into()],
            "4",
            "Basic arithmetic.",
            difficulty,
            "Even number",
        )
        .unwrap()
    }

    fn event(difficulty: u8, submitted: SubmittedAnswer) -> AnswerEvent {
        AnswerEvent {
            question: question(difficulty),
            submitted,
            elapsed: Duration::from_secs(5),
            double_points: false,
        }
    }

    fn answer(s: &str) -> SubmittedAnswer {
        SubmittedAnswer::Answer(s.to_string())
    }

    fn record(session: &mut Session, delta: &ScoreDelta) {
        let entry = HistoryEntry {
            question_text: "2 + 2?".into(),
            category: "Math".into(),
            correct: delta.correct,
            timed_out: delta.timed_out,
            points: delta.points_awarded,
            timestamp: Utc::now(),
        };
        session.apply(delta, entry);
    }

    #[test]
    fn correct_answer_scores_ten_per_difficulty() {
        let session = Session::register("ada", "").unwrap();
        let delta = score(&session, &event(3, answer("4")), &ScoringRules::default());
        assert!(delta.correct);
        assert_eq!(delta.points_awarded, 30);
        assert_eq!(delta.streak_after, 1);
        assert_eq!(delta.correct_answers_increment, 1);
        assert_eq!(delta.hints_granted, 0);
    }

    #[test]
    fn double_points_only_on_correct() {
        let session = Session::register("ada", "").unwrap();
        let mut ev = event(2, answer("4"));
        ev.double_points = true;
        assert_eq!(score(&session, &ev, &ScoringRules::default()).points_awarded, 40);

        ev.submitted = answer("5");
        assert_eq!(score(&session, &ev, &ScoringRules::default()).points_awarded, 0);
    }

    #[test]
    fn timeout_is_always_incorrect() {
        let mut session = Session::register("ada", "").unwrap();
        let rules = ScoringRules::default();
        let d = score(&session, &event(1, answer("4")), &rules);
        record(&mut session, &d);
        assert_eq!(session.streak(), 1);

        let d = score(&session, &event(1, SubmittedAnswer::Timeout), &rules);
        assert!(!d.correct);
        assert!(d.timed_out);
        assert_eq!(d.points_awarded, 0);
        assert_eq!(d.streak_after, 0);
        assert_eq!(d.hints_granted, 0);
    }

    #[test]
    fn third_correct_in_a_row_grants_one_hint() {
        let mut session = Session::register("ada", "").unwrap();
        let rules = ScoringRules::default();
        let mut grants = Vec::new();
        for _ in 0..3 {
            let d = score(&session, &event(1, answer("4")), &rules);
            grants.push(d.hints_granted);
            record(&mut session, &d);
        }
        assert_eq!(grants, vec![0, 0, 1]);
        assert_eq!(session.power_ups().hint, 4);
    }

    #[test]
    fn zero_interval_disables_bonus() {
        let session = Session::register("ada", "").unwrap();
        let rules = ScoringRules { hint_bonus_interval: 0 };
        let d = score(&session, &event(1, answer("4")), &rules);
        assert_eq!(d.hints_granted, 0);
    }

    proptest! {
        #[test]
        fn streak_and_hint_bonus_follow_sequence(outcomes in proptest::collection::vec(any::<bool>(), 0..40)) {
            let mut session = Session::register("ada", "").unwrap();
            let rules = ScoringRules::default();
            let start_hints = session.power_ups().hint;
            let mut expected_streak = 0u32;
            let mut expected_bonus = 0u32;

            for correct in outcomes {
                let submitted = if correct { answer("4") } else { SubmittedAnswer::Timeout };
                let d = score(&session, &event(1, submitted), &rules);
                if correct {
                    expected_streak += 1;
                    if expected_streak % 3 == 0 {
                        expected_bonus += 1;
                        prop_assert_eq!(d.hints_granted, 1);
                    } else {
                        prop_assert_eq!(d.hints_granted, 0);
                    }
                } else {
                    expected_streak = 0;
                    prop_assert_eq!(d.hints_granted, 0);
                }
                record(&mut session, &d);
                prop_assert_eq!(session.streak(), expected_streak);
            }
            prop_assert_eq!(session.power_ups().hint, start_hints + expected_bonus);
        }
    }
}
