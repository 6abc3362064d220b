use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Successful repetitions needed before a card leaves the learning phase.
pub const REVIEW_THRESHOLD: i32 = 3;

// Interval (in days) at which a reviewed card counts as mastered.
pub const MASTERY_INTERVAL_DAYS: i64 = 21;

/// Self-reported recall quality for a single review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grade {
    Again,
    Hard,
    Good,
    Easy,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid grade '{0}' (expected: again, hard, good, or easy)")]
pub struct ParseGradeError(String);

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Again => "again",
            Grade::Hard => "hard",
            Grade::Good => "good",
            Grade::Easy => "easy",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Grade::Again => "Again",
            Grade::Hard => "Hard",
            Grade::Good => "Good",
            Grade::Easy => "Easy",
        }
    }

    // Hard advances the streak but is not a confident recall, so only
    // good/easy count toward session accuracy.
    pub fn is_correct(&self) -> bool {
        matches!(self, Grade::Good | Grade::Easy)
    }
}

impl FromStr for Grade {
    type Err = ParseGradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "again" | "a" | "1" => Ok(Grade::Again),
            "hard" | "h" | "2" => Ok(Grade::Hard),
            "good" | "g" | "3" => Ok(Grade::Good),
            "easy" | "e" | "4" => Ok(Grade::Easy),
            _ => Err(ParseGradeError(s.to_string())),
        }
    }
}

// Author-assigned difficulty label, independent of scheduling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
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

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "med" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckCategory {
    Vocabulary,
    Grammar,
    Phrases,
    Culture,
    Custom,
}

impl DeckCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeckCategory::Vocabulary => "vocabulary",
            DeckCategory::Grammar => "grammar",
            DeckCategory::Phrases => "phrases",
            DeckCategory::Culture => "culture",
            DeckCategory::Custom => "custom",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeckCategory::Vocabulary => "Vocabulary",
            DeckCategory::Grammar => "Grammar",
            DeckCategory::Phrases => "Phrases",
            DeckCategory::Culture => "Culture",
            DeckCategory::Custom => "Custom",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vocabulary" | "vocab" => Some(DeckCategory::Vocabulary),
            "grammar" => Some(DeckCategory::Grammar),
            "phrases" | "phrase" => Some(DeckCategory::Phrases),
            "culture" => Some(DeckCategory::Culture),
            "custom" => Some(DeckCategory::Custom),
            _ => None,
        }
    }
}

// Derived learning phase of a card. Never stored; always computed from
// repetition and interval (see Card::phase).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardPhase {
    New,
    Learning,
    Review,
    Mastered,
}

impl CardPhase {
    pub fn label(&self) -> &'static str {
        match self {
            CardPhase::New => "New",
            CardPhase::Learning => "Learning",
            CardPhase::Review => "Review",
            CardPhase::Mastered => "Mastered",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub deck_id: i64,
    pub front: String,
    pub back: String,
    pub hint: Option<String>,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    /// Days until the next scheduled review.
    pub interval: i64,
    /// Successful reviews in the current streak; reset to 0 on a lapse.
    pub repetition: i32,
    /// Interval growth multiplier. Never drops below 1.3.
    pub ease_factor: f64,
    pub next_review: DateTime<Utc>,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// Derives the card's phase from its scheduling state.
    ///
    /// Branches are checked in order, so every card lands in exactly one
    /// phase: repetition 0 is New no matter how large the interval, and only
    /// cards past the review threshold can count as Mastered.
    pub fn phase(&self) -> CardPhase {
        if self.repetition == 0 {
            CardPhase::New
        } else if self.repetition < REVIEW_THRESHOLD {
            CardPhase::Learning
        } else if self.interval < MASTERY_INTERVAL_DAYS {
            CardPhase::Review
        } else {
            CardPhase::Mastered
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: DeckCategory,
    pub level: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-phase card counts for one deck, recomputed from scratch whenever a
/// card changes. The four buckets always sum to `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckCounts {
    pub total: usize,
    pub new: usize,
    pub learning: usize,
    pub review: usize,
    pub mastered: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeckWithCounts {
    pub deck: Deck,
    pub counts: DeckCounts,
    pub due: usize,
}

// A finished study session, kept as an analytics record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub id: i64,
    pub deck_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub cards_studied: i32,
    pub correct_answers: i32,
}

impl StudySession {
    /// Rounded percentage of correct answers; 0 for an empty session.
    pub fn accuracy(&self) -> i32 {
        if self.cards_studied == 0 {
            0
        } else {
            ((self.correct_answers as f64 / self.cards_studied as f64) * 100.0).round() as i32
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.ended_at - self.started_at).num_minutes()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub card_count: i64,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod grade_tests {
        use super::*;

        #[test]
        fn as_str_returns_correct_values() {
            assert_eq!(Grade::Again.as_str(), "again");
            assert_eq!(Grade::Hard.as_str(), "hard");
            assert_eq!(Grade::Good.as_str(), "good");
            assert_eq!(Grade::Easy.as_str(), "easy");
        }

        #[test]
        fn label_returns_human_readable() {
            assert_eq!(Grade::Again.label(), "Again");
            assert_eq!(Grade::Hard.label(), "Hard");
            assert_eq!(Grade::Good.label(), "Good");
            assert_eq!(Grade::Easy.label(), "Easy");
        }

        #[test]
        fn parse_full_names() {
            assert_eq!("again".parse(), Ok(Grade::Again));
            assert_eq!("hard".parse(), Ok(Grade::Hard));
            assert_eq!("good".parse(), Ok(Grade::Good));
            assert_eq!("easy".parse(), Ok(Grade::Easy));
        }

        #[test]
        fn parse_short_aliases() {
            assert_eq!("a".parse(), Ok(Grade::Again));
            assert_eq!("h".parse(), Ok(Grade::Hard));
            assert_eq!("g".parse(), Ok(Grade::Good));
            assert_eq!("e".parse(), Ok(Grade::Easy));
        }

        #[test]
        fn parse_study_keys() {
            assert_eq!("1".parse(), Ok(Grade::Again));
            assert_eq!("2".parse(), Ok(Grade::Hard));
            assert_eq!("3".parse(), Ok(Grade::Good));
            assert_eq!("4".parse(), Ok(Grade::Easy));
        }

        #[test]
        fn parse_case_insensitive() {
            assert_eq!("AGAIN".parse(), Ok(Grade::Again));
            assert_eq!("Good".parse(), Ok(Grade::Good));
        }

        #[test]
        fn parse_invalid_fails() {
            assert!("perfect".parse::<Grade>().is_err());
            assert!("".parse::<Grade>().is_err());
            assert!("5".parse::<Grade>().is_err());
        }

        #[test]
        fn parse_error_names_the_input() {
            let err = "meh".parse::<Grade>().unwrap_err();
            assert!(err.to_string().contains("'meh'"));
        }

        #[test]
        fn only_good_and_easy_are_correct() {
            assert!(!Grade::Again.is_correct());
            assert!(!Grade::Hard.is_correct());
            assert!(Grade::Good.is_correct());
            assert!(Grade::Easy.is_correct());
        }
    }

    mod difficulty_tests {
        use super::*;

        #[test]
        fn as_str_returns_correct_values() {
            assert_eq!(Difficulty::Easy.as_str(), "easy");
            assert_eq!(Difficulty::Medium.as_str(), "medium");
            assert_eq!(Difficulty::Hard.as_str(), "hard");
        }

        #[test]
        fn from_str_valid_inputs() {
            assert_eq!(Difficulty::from_str("easy"), Some(Difficulty::Easy));
            assert_eq!(Difficulty::from_str("medium"), Some(Difficulty::Medium));
            assert_eq!(Difficulty::from_str("med"), Some(Difficulty::Medium));
            assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(Difficulty::from_str("extreme"), None);
            assert_eq!(Difficulty::from_str(""), None);
        }

        #[test]
        fn label_returns_human_readable() {
            assert_eq!(Difficulty::Easy.label(), "Easy");
            assert_eq!(Difficulty::Medium.label(), "Medium");
            assert_eq!(Difficulty::Hard.label(), "Hard");
        }
    }

    mod category_tests {
        use super::*;

        #[test]
        fn as_str_returns_correct_values() {
            assert_eq!(DeckCategory::Vocabulary.as_str(), "vocabulary");
            assert_eq!(DeckCategory::Grammar.as_str(), "grammar");
            assert_eq!(DeckCategory::Phrases.as_str(), "phrases");
            assert_eq!(DeckCategory::Culture.as_str(), "culture");
            assert_eq!(DeckCategory::Custom.as_str(), "custom");
        }

        #[test]
        fn from_str_valid_inputs() {
            assert_eq!(
                DeckCategory::from_str("vocabulary"),
                Some(DeckCategory::Vocabulary)
            );
            assert_eq!(
                DeckCategory::from_str("vocab"),
                Some(DeckCategory::Vocabulary)
            );
            assert_eq!(
                DeckCategory::from_str("grammar"),
                Some(DeckCategory::Grammar)
            );
            assert_eq!(
                DeckCategory::from_str("phrase"),
                Some(DeckCategory::Phrases)
            );
            assert_eq!(
                DeckCategory::from_str("Culture"),
                Some(DeckCategory::Culture)
            );
            assert_eq!(DeckCategory::from_str("custom"), Some(DeckCategory::Custom));
        }

        #[test]
        fn from_str_invalid_returns_none() {
            assert_eq!(DeckCategory::from_str("history"), None);
            assert_eq!(DeckCategory::from_str(""), None);
        }

        #[test]
        fn label_returns_human_readable() {
            assert_eq!(DeckCategory::Vocabulary.label(), "Vocabulary");
            assert_eq!(DeckCategory::Custom.label(), "Custom");
        }
    }

    mod phase_tests {
        use super::*;

        fn make_card(repetition: i32, interval: i64) -> Card {
            Card {
                id: 1,
                deck_id: 1,
                front: "front".to_string(),
                back: "back".to_string(),
                hint: None,
                tags: vec![],
                difficulty: Difficulty::Medium,
                interval,
                repetition,
                ease_factor: 2.5,
                next_review: Utc::now(),
                last_reviewed: None,
                created_at: Utc::now(),
            }
        }

        #[test]
        fn zero_repetition_is_new() {
            assert_eq!(make_card(0, 1).phase(), CardPhase::New);
        }

        #[test]
        fn zero_repetition_is_new_even_with_large_interval() {
            // Repetition is checked first, so an imported card with a big
            // interval but no streak still counts as New.
            assert_eq!(make_card(0, 100).phase(), CardPhase::New);
        }

        #[test]
        fn below_threshold_is_learning() {
            assert_eq!(make_card(1, 3).phase(), CardPhase::Learning);
            assert_eq!(make_card(2, 8).phase(), CardPhase::Learning);
        }

        #[test]
        fn learning_wins_over_long_interval() {
            assert_eq!(make_card(1, 25).phase(), CardPhase::Learning);
        }

        #[test]
        fn at_threshold_with_short_interval_is_review() {
            assert_eq!(make_card(REVIEW_THRESHOLD, 20).phase(), CardPhase::Review);
            assert_eq!(make_card(10, 1).phase(), CardPhase::Review);
        }

        #[test]
        fn long_interval_past_threshold_is_mastered() {
            assert_eq!(
                make_card(REVIEW_THRESHOLD, MASTERY_INTERVAL_DAYS).phase(),
                CardPhase::Mastered
            );
            assert_eq!(make_card(12, 180).phase(), CardPhase::Mastered);
        }

        #[test]
        fn mastery_boundary_is_exclusive_below() {
            assert_eq!(
                make_card(5, MASTERY_INTERVAL_DAYS - 1).phase(),
                CardPhase::Review
            );
        }

        #[test]
        fn label_returns_human_readable() {
            assert_eq!(CardPhase::New.label(), "New");
            assert_eq!(CardPhase::Learning.label(), "Learning");
            assert_eq!(CardPhase::Review.label(), "Review");
            assert_eq!(CardPhase::Mastered.label(), "Mastered");
        }
    }

    mod study_session_tests {
        use super::*;
        use chrono::Duration;

        fn make_session(cards_studied: i32, correct_answers: i32) -> StudySession {
            let now = Utc::now();
            StudySession {
                id: 1,
                deck_id: 1,
                started_at: now,
                ended_at: now + Duration::minutes(10),
                cards_studied,
                correct_answers,
            }
        }

        #[test]
        fn accuracy_zero_cards() {
            assert_eq!(make_session(0, 0).accuracy(), 0);
        }

        #[test]
        fn accuracy_all_correct() {
            assert_eq!(make_session(10, 10).accuracy(), 100);
        }

        #[test]
        fn accuracy_half_correct() {
            assert_eq!(make_session(10, 5).accuracy(), 50);
        }

        #[test]
        fn accuracy_rounds_to_nearest() {
            // 2/3 = 66.66.. rounds up, 1/3 = 33.33.. rounds down
            assert_eq!(make_session(3, 2).accuracy(), 67);
            assert_eq!(make_session(3, 1).accuracy(), 33);
        }

        #[test]
        fn accuracy_none_correct() {
            assert_eq!(make_session(8, 0).accuracy(), 0);
        }

        #[test]
        fn duration_in_minutes() {
            assert_eq!(make_session(1, 1).duration_minutes(), 10);
        }
    }

    mod json_output_tests {
        use super::*;

        #[test]
        fn ok_with_string() {
            let output = JsonOutput::ok("test data");
            assert!(output.success);
            assert_eq!(output.data, Some("test data"));
            assert!(output.error.is_none());
        }

        #[test]
        fn ok_with_number() {
            let output = JsonOutput::ok(42);
            assert!(output.success);
            assert_eq!(output.data, Some(42));
            assert!(output.error.is_none());
        }

        #[test]
        fn err_with_string() {
            let output = JsonOutput::<()>::err("something went wrong");
            assert!(!output.success);
            assert!(output.data.is_none());
            assert_eq!(output.error, Some("something went wrong".to_string()));
        }

        #[test]
        fn serializes_ok_correctly() {
            let output = JsonOutput::ok("test");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":true"));
            assert!(json.contains("\"data\":\"test\""));
            assert!(json.contains("\"error\":null"));
        }

        #[test]
        fn serializes_err_correctly() {
            let output = JsonOutput::<()>::err("error");
            let json = serde_json::to_string(&output).unwrap();
            assert!(json.contains("\"success\":false"));
            assert!(json.contains("\"data\":null"));
            assert!(json.contains("\"error\":\"error\""));
        }

        #[test]
        fn serializes_grade_lowercase() {
            let json = serde_json::to_string(&Grade::Again).unwrap();
            assert_eq!(json, "\"again\"");
        }
    }
}
