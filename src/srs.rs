use chrono::{DateTime, Duration, Utc};

use crate::models::{Card, CardPhase, DeckCounts, Grade};

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;

// Hard cap on the scheduling horizon (~100 years). Keeps interval growth
// from overflowing date arithmetic.
pub const MAX_INTERVAL_DAYS: i64 = 36_500;

const HARD_MULTIPLIER: f64 = 1.2;
const EASY_BONUS: f64 = 1.3;
const LAPSE_EASE_PENALTY: f64 = 0.20;
const HARD_EASE_PENALTY: f64 = 0.15;
const EASY_EASE_REWARD: f64 = 0.15;

/// Applies one graded review to a card and returns the rescheduled card.
///
/// Pure function of (card, grade, now): the stored card is untouched and the
/// same inputs always produce the same output, so callers decide when (and
/// whether) to persist the result.
///
/// An `Again` lapse resets the streak, drops the ease factor and brings the
/// card back immediately. Any passing grade extends the streak and grows the
/// interval by a grade-dependent multiplier, always by at least one day.
pub fn review(card: &Card, grade: Grade, now: DateTime<Utc>) -> Card {
    let mut next = card.clone();

    match grade {
        Grade::Again => {
            next.repetition = 0;
            next.interval = 1;
            next.ease_factor = clamp_ease(card.ease_factor - LAPSE_EASE_PENALTY);
        }
        Grade::Hard => {
            next.repetition = card.repetition + 1;
            next.ease_factor = clamp_ease(card.ease_factor - HARD_EASE_PENALTY);
            next.interval = grow_interval(card.interval, HARD_MULTIPLIER);
        }
        Grade::Good => {
            next.repetition = card.repetition + 1;
            next.interval = grow_interval(card.interval, card.ease_factor);
        }
        Grade::Easy => {
            next.repetition = card.repetition + 1;
            next.ease_factor = clamp_ease(card.ease_factor + EASY_EASE_REWARD);
            next.interval = grow_interval(card.interval, next.ease_factor * EASY_BONUS);
        }
    }

    next.last_reviewed = Some(now);
    next.next_review = match grade {
        Grade::Again => now,
        _ => now + Duration::days(next.interval),
    };
    next
}

fn clamp_ease(ease: f64) -> f64 {
    ease.max(MIN_EASE_FACTOR)
}

// Grows an interval by `multiplier`, rounded to whole days. The result is
// always strictly larger than the old interval (until the cap).
fn grow_interval(interval: i64, multiplier: f64) -> i64 {
    let grown = (interval as f64 * multiplier).round() as i64;
    grown.max(interval + 1).min(MAX_INTERVAL_DAYS)
}

/// A card is due when its next review time has arrived. Cards that were
/// never passed (repetition 0) are always due.
pub fn is_due(card: &Card, now: DateTime<Utc>) -> bool {
    card.repetition == 0 || card.next_review <= now
}

/// Filters a deck's cards down to the ones due at `now`, keeping deck order.
pub fn due_cards(cards: &[Card], now: DateTime<Utc>) -> Vec<Card> {
    cards.iter().filter(|c| is_due(c, now)).cloned().collect()
}

/// Recomputes a deck's per-phase counters from its full card list.
pub fn deck_counts(cards: &[Card]) -> DeckCounts {
    let mut counts = DeckCounts {
        total: cards.len(),
        ..DeckCounts::default()
    };
    for card in cards {
        match card.phase() {
            CardPhase::New => counts.new += 1,
            CardPhase::Learning => counts.learning += 1,
            CardPhase::Review => counts.review += 1,
            CardPhase::Mastered => counts.mastered += 1,
        }
    }
    counts
}

/// Running tally for one study session.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    pub cards_studied: i32,
    pub correct_answers: i32,
    pub started_at: DateTime<Utc>,
}

impl SessionTracker {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            cards_studied: 0,
            correct_answers: 0,
            started_at: now,
        }
    }

    pub fn record_grade(&mut self, grade: Grade) {
        self.cards_studied += 1;
        if grade.is_correct() {
            self.correct_answers += 1;
        }
    }

    /// Rounded percentage of correct answers; 0 before any card is graded.
    pub fn accuracy(&self) -> i32 {
        if self.cards_studied == 0 {
            0
        } else {
            ((self.correct_answers as f64 / self.cards_studied as f64) * 100.0).round() as i32
        }
    }

    pub fn duration(&self, now: DateTime<Utc>) -> Duration {
        now - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap()
    }

    fn make_card(repetition: i32, interval: i64, ease_factor: f64) -> Card {
        Card {
            id: 1,
            deck_id: 1,
            front: "perro".to_string(),
            back: "dog".to_string(),
            hint: None,
            tags: vec![],
            difficulty: Difficulty::Medium,
            interval,
            repetition,
            ease_factor,
            next_review: fixed_now(),
            last_reviewed: None,
            created_at: fixed_now(),
        }
    }

    fn fresh_card() -> Card {
        make_card(0, 1, INITIAL_EASE_FACTOR)
    }

    mod review_tests {
        use super::*;

        #[test]
        fn is_deterministic() {
            let card = make_card(2, 6, 2.2);
            let now = fixed_now();
            let a = review(&card, Grade::Good, now);
            let b = review(&card, Grade::Good, now);
            assert_eq!(a.interval, b.interval);
            assert_eq!(a.repetition, b.repetition);
            assert_eq!(a.ease_factor, b.ease_factor);
            assert_eq!(a.next_review, b.next_review);
        }

        #[test]
        fn good_on_fresh_card() {
            let now = fixed_now();
            let card = review(&fresh_card(), Grade::Good, now);
            assert_eq!(card.repetition, 1);
            assert_eq!(card.interval, 3);
            assert_eq!(card.ease_factor, INITIAL_EASE_FACTOR);
            assert_eq!(card.next_review, now + Duration::days(3));
        }

        #[test]
        fn hard_on_fresh_card() {
            let now = fixed_now();
            let card = review(&fresh_card(), Grade::Hard, now);
            assert_eq!(card.repetition, 1);
            // 1 * 1.2 rounds to 1; growth still bumps to 2
            assert_eq!(card.interval, 2);
            assert!((card.ease_factor - 2.35).abs() < 1e-9);
        }

        #[test]
        fn easy_on_fresh_card() {
            let now = fixed_now();
            let card = review(&fresh_card(), Grade::Easy, now);
            assert_eq!(card.repetition, 1);
            // 1 * (2.65 * 1.3) = 3.445 rounds to 3
            assert_eq!(card.interval, 3);
            assert!((card.ease_factor - 2.65).abs() < 1e-9);
        }

        #[test]
        fn again_resets_streak_and_comes_back_today() {
            let now = fixed_now();
            let card = review(&make_card(5, 30, 2.5), Grade::Again, now);
            assert_eq!(card.repetition, 0);
            assert_eq!(card.interval, 1);
            assert!((card.ease_factor - 2.3).abs() < 1e-9);
            assert_eq!(card.next_review, now);
            assert!(is_due(&card, now));
        }

        #[test]
        fn interval_grows_strictly_on_every_passing_grade() {
            for grade in [Grade::Hard, Grade::Good, Grade::Easy] {
                for interval in [1, 2, 5, 13, 100] {
                    let card = make_card(3, interval, 2.5);
                    let updated = review(&card, grade, fixed_now());
                    assert!(
                        updated.interval > interval,
                        "{:?} on interval {} gave {}",
                        grade,
                        interval,
                        updated.interval
                    );
                }
            }
        }

        #[test]
        fn repetition_increments_on_passing_grades() {
            for grade in [Grade::Hard, Grade::Good, Grade::Easy] {
                let card = review(&make_card(4, 10, 2.0), grade, fixed_now());
                assert_eq!(card.repetition, 5);
            }
        }

        #[test]
        fn ease_never_drops_below_floor() {
            let mut card = fresh_card();
            for _ in 0..20 {
                card = review(&card, Grade::Again, fixed_now());
                assert!(card.ease_factor >= MIN_EASE_FACTOR);
            }
            assert_eq!(card.ease_factor, MIN_EASE_FACTOR);

            let mut card = fresh_card();
            for _ in 0..20 {
                card = review(&card, Grade::Hard, fixed_now());
                assert!(card.ease_factor >= MIN_EASE_FACTOR);
            }
            assert_eq!(card.ease_factor, MIN_EASE_FACTOR);
        }

        #[test]
        fn good_streak_walks_through_phases() {
            let now = fixed_now();
            let mut card = fresh_card();
            assert_eq!(card.phase(), CardPhase::New);

            card = review(&card, Grade::Good, now);
            assert_eq!(card.interval, 3);
            assert_eq!(card.phase(), CardPhase::Learning);

            card = review(&card, Grade::Good, now);
            // 3 * 2.5 = 7.5 rounds to 8
            assert_eq!(card.interval, 8);
            assert_eq!(card.phase(), CardPhase::Learning);

            card = review(&card, Grade::Good, now);
            assert_eq!(card.interval, 20);
            assert_eq!(card.phase(), CardPhase::Review);

            card = review(&card, Grade::Good, now);
            assert_eq!(card.interval, 50);
            assert_eq!(card.phase(), CardPhase::Mastered);
        }

        #[test]
        fn interval_is_capped() {
            let card = review(&make_card(50, MAX_INTERVAL_DAYS - 1, 2.5), Grade::Easy, fixed_now());
            assert_eq!(card.interval, MAX_INTERVAL_DAYS);

            let card = review(&make_card(51, MAX_INTERVAL_DAYS, 2.5), Grade::Good, fixed_now());
            assert_eq!(card.interval, MAX_INTERVAL_DAYS);
        }

        #[test]
        fn every_grade_records_last_reviewed() {
            let now = fixed_now();
            for grade in [Grade::Again, Grade::Hard, Grade::Good, Grade::Easy] {
                let card = review(&fresh_card(), grade, now);
                assert_eq!(card.last_reviewed, Some(now));
            }
        }

        #[test]
        fn passing_grade_pushes_card_out_of_due_set() {
            let now = fixed_now();
            let card = review(&fresh_card(), Grade::Good, now);
            assert!(!is_due(&card, now));
            assert!(is_due(&card, now + Duration::days(card.interval)));
        }
    }

    mod due_tests {
        use super::*;

        #[test]
        fn new_card_is_always_due() {
            let mut card = fresh_card();
            card.next_review = fixed_now() + Duration::days(30);
            assert!(is_due(&card, fixed_now()));
        }

        #[test]
        fn due_at_exact_boundary() {
            let mut card = make_card(2, 4, 2.5);
            card.next_review = fixed_now();
            assert!(is_due(&card, fixed_now()));
        }

        #[test]
        fn future_card_is_not_due() {
            let mut card = make_card(2, 4, 2.5);
            card.next_review = fixed_now() + Duration::seconds(1);
            assert!(!is_due(&card, fixed_now()));
        }

        #[test]
        fn filter_keeps_deck_order() {
            let now = fixed_now();
            let mut overdue = make_card(1, 1, 2.5);
            overdue.id = 1;
            overdue.next_review = now - Duration::days(1);

            let mut future = make_card(1, 1, 2.5);
            future.id = 2;
            future.next_review = now + Duration::days(1);

            let mut at_boundary = make_card(1, 1, 2.5);
            at_boundary.id = 3;
            at_boundary.next_review = now;

            let mut never_passed = make_card(0, 1, 2.5);
            never_passed.id = 4;

            let mut long_overdue = make_card(4, 30, 2.5);
            long_overdue.id = 5;
            long_overdue.next_review = now - Duration::days(10);

            let cards = vec![overdue, future, at_boundary, never_passed, long_overdue];
            let due: Vec<i64> = due_cards(&cards, now).iter().map(|c| c.id).collect();
            assert_eq!(due, vec![1, 3, 4, 5]);
        }

        #[test]
        fn filter_without_grading_returns_the_same_set() {
            let now = fixed_now();
            let mut overdue = make_card(2, 3, 2.5);
            overdue.id = 1;
            overdue.next_review = now - Duration::days(2);

            let mut never_passed = make_card(0, 1, 2.5);
            never_passed.id = 2;

            let mut future = make_card(3, 10, 2.5);
            future.id = 3;
            future.next_review = now + Duration::days(5);

            let cards = vec![overdue, never_passed, future];
            let first: Vec<i64> = due_cards(&cards, now).iter().map(|c| c.id).collect();
            let second: Vec<i64> = due_cards(&cards, now).iter().map(|c| c.id).collect();
            assert_eq!(first, vec![1, 2]);
            assert_eq!(first, second);
        }

        #[test]
        fn empty_deck_gives_empty_due_set() {
            assert!(due_cards(&[], fixed_now()).is_empty());
        }
    }

    mod counts_tests {
        use super::*;

        #[test]
        fn empty_deck_counts_are_zero() {
            assert_eq!(deck_counts(&[]), DeckCounts::default());
        }

        #[test]
        fn buckets_partition_the_deck() {
            let cards = vec![
                make_card(0, 1, 2.5),
                make_card(0, 50, 2.5),
                make_card(1, 3, 2.5),
                make_card(2, 25, 2.5),
                make_card(3, 8, 2.5),
                make_card(3, 21, 2.5),
                make_card(7, 120, 2.5),
            ];
            let counts = deck_counts(&cards);
            assert_eq!(counts.total, 7);
            assert_eq!(counts.new, 2);
            assert_eq!(counts.learning, 2);
            assert_eq!(counts.review, 1);
            assert_eq!(counts.mastered, 2);
            assert_eq!(
                counts.new + counts.learning + counts.review + counts.mastered,
                counts.total
            );
        }

        #[test]
        fn recount_after_review_moves_one_card() {
            let now = fixed_now();
            let mut cards = vec![make_card(0, 1, 2.5), make_card(3, 25, 2.5)];
            let before = deck_counts(&cards);
            assert_eq!(before.new, 1);
            assert_eq!(before.mastered, 1);

            cards[0] = review(&cards[0], Grade::Good, now);
            let after = deck_counts(&cards);
            assert_eq!(after.new, 0);
            assert_eq!(after.learning, 1);
            assert_eq!(after.mastered, 1);
            assert_eq!(after.total, 2);
        }
    }

    mod tracker_tests {
        use super::*;

        #[test]
        fn empty_session_has_zero_accuracy() {
            let tracker = SessionTracker::start(fixed_now());
            assert_eq!(tracker.cards_studied, 0);
            assert_eq!(tracker.accuracy(), 0);
        }

        #[test]
        fn only_good_and_easy_count_as_correct() {
            let mut tracker = SessionTracker::start(fixed_now());
            tracker.record_grade(Grade::Again);
            tracker.record_grade(Grade::Hard);
            tracker.record_grade(Grade::Good);
            tracker.record_grade(Grade::Easy);
            assert_eq!(tracker.cards_studied, 4);
            assert_eq!(tracker.correct_answers, 2);
            assert_eq!(tracker.accuracy(), 50);
        }

        #[test]
        fn accuracy_rounds_to_nearest_percent() {
            let mut tracker = SessionTracker::start(fixed_now());
            tracker.record_grade(Grade::Good);
            tracker.record_grade(Grade::Good);
            tracker.record_grade(Grade::Again);
            assert_eq!(tracker.accuracy(), 67);
        }

        #[test]
        fn duration_measures_from_start() {
            let tracker = SessionTracker::start(fixed_now());
            let later = fixed_now() + Duration::minutes(25);
            assert_eq!(tracker.duration(later).num_minutes(), 25);
        }
    }
}
