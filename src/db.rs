use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Result};
use std::path::Path;

use crate::models::{
    Card, Deck, DeckCategory, DeckWithCounts, Difficulty, Grade, StudySession, Tag,
};
use crate::srs;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS decks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT,
                category TEXT NOT NULL DEFAULT 'custom' CHECK(category IN ('vocabulary', 'grammar', 'phrases', 'culture', 'custom')),
                level TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS cards (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                deck_id INTEGER NOT NULL,
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                hint TEXT,
                difficulty TEXT NOT NULL DEFAULT 'medium' CHECK(difficulty IN ('easy', 'medium', 'hard')),
                interval INTEGER NOT NULL DEFAULT 1,
                repetition INTEGER NOT NULL DEFAULT 0,
                ease_factor REAL NOT NULL DEFAULT 2.5,
                next_review TEXT NOT NULL DEFAULT (datetime('now')),
                last_reviewed TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS card_tags (
                card_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                PRIMARY KEY (card_id, tag_id),
                FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS review_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                card_id INTEGER NOT NULL,
                grade TEXT NOT NULL CHECK(grade IN ('again', 'hard', 'good', 'easy')),
                reviewed_at TEXT NOT NULL DEFAULT (datetime('now')),
                notes TEXT,
                FOREIGN KEY (card_id) REFERENCES cards(id) ON DELETE CASCADE
            );

            -- One row per finished study session
            CREATE TABLE IF NOT EXISTS study_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                deck_id INTEGER NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT NOT NULL,
                cards_studied INTEGER NOT NULL DEFAULT 0,
                correct_answers INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_cards_deck ON cards(deck_id);
            CREATE INDEX IF NOT EXISTS idx_cards_next_review ON cards(next_review);
            CREATE INDEX IF NOT EXISTS idx_card_tags_card ON card_tags(card_id);
            CREATE INDEX IF NOT EXISTS idx_card_tags_tag ON card_tags(tag_id);
            CREATE INDEX IF NOT EXISTS idx_history_card ON review_history(card_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_deck ON study_sessions(deck_id);
            "#,
        )?;

        // Run migrations for existing databases
        self.migrate()?;

        // Create indexes on migrated columns (after migration ensures columns exist)
        self.conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_cards_difficulty ON cards(difficulty);",
        )?;

        Ok(())
    }

    // Handle schema migrations for existing databases
    fn migrate(&self) -> Result<()> {
        // Check if hint column exists in cards table
        let has_hint: bool = self
            .conn
            .prepare("SELECT hint FROM cards LIMIT 1")
            .is_ok();

        if !has_hint {
            self.conn.execute_batch(
                r#"
                ALTER TABLE cards ADD COLUMN hint TEXT;
                ALTER TABLE cards ADD COLUMN difficulty TEXT NOT NULL DEFAULT 'medium';
                "#,
            )?;
        }

        Ok(())
    }

    // Deck operations
    pub fn add_deck(
        &self,
        name: &str,
        description: Option<&str>,
        category: DeckCategory,
        level: Option<&str>,
    ) -> Result<i64> {
        let now = Utc::now();
        self.conn.execute(
            r#"
            INSERT INTO decks (name, description, category, level, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![name, description, category.as_str(), level, now.to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_deck(&self, id: i64) -> Result<Option<Deck>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, category, level, created_at FROM decks WHERE id = ?1",
        )?;

        let deck = stmt.query_row(params![id], |row| {
            let category_str: String = row.get(3)?;
            let created_str: String = row.get(5)?;
            Ok(Deck {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                category: DeckCategory::from_str(&category_str).unwrap_or(DeckCategory::Custom),
                level: row.get(4)?,
                created_at: parse_ts(5, created_str)?,
            })
        });

        match deck {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn list_decks(&self, category: Option<DeckCategory>) -> Result<Vec<Deck>> {
        let decks: Vec<Deck> = if let Some(cat) = category {
            let mut stmt = self.conn.prepare(
                r#"
                SELECT id, name, description, category, level, created_at
                FROM decks
                WHERE category = ?1
                ORDER BY name
                "#,
            )?;

            let rows = stmt.query_map(params![cat.as_str()], |row| {
                let category_str: String = row.get(3)?;
                let created_str: String = row.get(5)?;
                Ok(Deck {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    category: DeckCategory::from_str(&category_str)
                        .unwrap_or(DeckCategory::Custom),
                    level: row.get(4)?,
                    created_at: parse_ts(5, created_str)?,
                })
            })?;
            rows.collect::<Result<Vec<_>>>()?
        } else {
            let mut stmt = self.conn.prepare(
                "SELECT id, name, description, category, level, created_at FROM decks ORDER BY name",
            )?;

            let rows = stmt.query_map([], |row| {
                let category_str: String = row.get(3)?;
                let created_str: String = row.get(5)?;
                Ok(Deck {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    category: DeckCategory::from_str(&category_str)
                        .unwrap_or(DeckCategory::Custom),
                    level: row.get(4)?,
                    created_at: parse_ts(5, created_str)?,
                })
            })?;
            rows.collect::<Result<Vec<_>>>()?
        };

        Ok(decks)
    }

    pub fn list_decks_with_counts(
        &self,
        category: Option<DeckCategory>,
        now: DateTime<Utc>,
    ) -> Result<Vec<DeckWithCounts>> {
        let decks = self.list_decks(category)?;
        let mut result = Vec::with_capacity(decks.len());

        for deck in decks {
            let cards = self.list_cards(deck.id)?;
            let due = cards.iter().filter(|c| srs::is_due(c, now)).count();
            result.push(DeckWithCounts {
                deck,
                counts: srs::deck_counts(&cards),
                due,
            });
        }

        Ok(result)
    }

    pub fn get_deck_with_counts(
        &self,
        deck_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<DeckWithCounts>> {
        let deck = match self.get_deck(deck_id)? {
            Some(d) => d,
            None => return Ok(None),
        };

        let cards = self.list_cards(deck_id)?;
        let due = cards.iter().filter(|c| srs::is_due(c, now)).count();

        Ok(Some(DeckWithCounts {
            deck,
            counts: srs::deck_counts(&cards),
            due,
        }))
    }

    pub fn delete_deck(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM decks WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Card operations
    pub fn add_card(
        &self,
        deck_id: i64,
        front: &str,
        back: &str,
        hint: Option<&str>,
        difficulty: Difficulty,
        tags: &[String],
    ) -> Result<i64> {
        let now = Utc::now();

        // New cards start with a clean scheduling state and are due immediately
        self.conn.execute(
            r#"
            INSERT INTO cards (deck_id, front, back, hint, difficulty, interval, repetition, ease_factor, next_review, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, 1, 0, ?6, ?7, ?7)
            "#,
            params![
                deck_id,
                front,
                back,
                hint,
                difficulty.as_str(),
                srs::INITIAL_EASE_FACTOR,
                now.to_rfc3339()
            ],
        )?;
        let card_id = self.conn.last_insert_rowid();

        for tag in tags {
            let tag_id = self.get_or_create_tag(tag)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO card_tags (card_id, tag_id) VALUES (?1, ?2)",
                params![card_id, tag_id],
            )?;
        }

        Ok(card_id)
    }

    pub fn get_card(&self, id: i64) -> Result<Option<Card>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, deck_id, front, back, hint, difficulty, interval, repetition,
                   ease_factor, next_review, last_reviewed, created_at
            FROM cards
            WHERE id = ?1
            "#,
        )?;

        let card = stmt.query_row(params![id], |row| {
            let difficulty_str: String = row.get(5)?;
            let next_review_str: String = row.get(9)?;
            let last_reviewed_str: Option<String> = row.get(10)?;
            let created_str: String = row.get(11)?;
            Ok(Card {
                id: row.get(0)?,
                deck_id: row.get(1)?,
                front: row.get(2)?,
                back: row.get(3)?,
                hint: row.get(4)?,
                tags: vec![],
                difficulty: Difficulty::from_str(&difficulty_str).unwrap_or(Difficulty::Medium),
                interval: row.get(6)?,
                repetition: row.get(7)?,
                ease_factor: row.get(8)?,
                next_review: parse_ts(9, next_review_str)?,
                last_reviewed: last_reviewed_str.map(|s| parse_ts(10, s)).transpose()?,
                created_at: parse_ts(11, created_str)?,
            })
        });

        match card {
            Ok(mut c) => {
                c.tags = self.get_card_tags(id)?;
                Ok(Some(c))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // Creation order (id ascending) is the deck's study order.
    pub fn list_cards(&self, deck_id: i64) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, deck_id, front, back, hint, difficulty, interval, repetition,
                   ease_factor, next_review, last_reviewed, created_at
            FROM cards
            WHERE deck_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map(params![deck_id], |row| {
            let difficulty_str: String = row.get(5)?;
            let next_review_str: String = row.get(9)?;
            let last_reviewed_str: Option<String> = row.get(10)?;
            let created_str: String = row.get(11)?;
            Ok(Card {
                id: row.get(0)?,
                deck_id: row.get(1)?,
                front: row.get(2)?,
                back: row.get(3)?,
                hint: row.get(4)?,
                tags: vec![],
                difficulty: Difficulty::from_str(&difficulty_str).unwrap_or(Difficulty::Medium),
                interval: row.get(6)?,
                repetition: row.get(7)?,
                ease_factor: row.get(8)?,
                next_review: parse_ts(9, next_review_str)?,
                last_reviewed: last_reviewed_str.map(|s| parse_ts(10, s)).transpose()?,
                created_at: parse_ts(11, created_str)?,
            })
        })?;
        let mut cards = rows.collect::<Result<Vec<_>>>()?;

        for card in &mut cards {
            card.tags = self.get_card_tags(card.id)?;
        }

        Ok(cards)
    }

    pub fn delete_card(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM cards WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn update_card_tags(&self, card_id: i64, tags: &[String]) -> Result<()> {
        // Remove existing tags
        self.conn.execute(
            "DELETE FROM card_tags WHERE card_id = ?1",
            params![card_id],
        )?;

        // Add new tags
        for tag in tags {
            let tag_id = self.get_or_create_tag(tag)?;
            self.conn.execute(
                "INSERT OR IGNORE INTO card_tags (card_id, tag_id) VALUES (?1, ?2)",
                params![card_id, tag_id],
            )?;
        }

        Ok(())
    }

    // Writes a card's scheduling state back to storage.
    pub fn save_card(&self, card: &Card) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE cards
            SET interval = ?1,
                repetition = ?2,
                ease_factor = ?3,
                next_review = ?4,
                last_reviewed = ?5
            WHERE id = ?6
            "#,
            params![
                card.interval,
                card.repetition,
                card.ease_factor,
                card.next_review.to_rfc3339(),
                card.last_reviewed.map(|dt| dt.to_rfc3339()),
                card.id
            ],
        )?;
        Ok(())
    }

    // Scheduling operations
    pub fn due_cards(&self, deck_id: i64, now: DateTime<Utc>) -> Result<Vec<Card>> {
        let cards = self.list_cards(deck_id)?;
        Ok(srs::due_cards(&cards, now))
    }

    /// Applies a graded review to a card, persists the rescheduled state and
    /// appends a history row. Returns `None` when the card does not exist.
    pub fn record_review(
        &self,
        card_id: i64,
        grade: Grade,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<Card>> {
        let card = match self.get_card(card_id)? {
            Some(c) => c,
            None => return Ok(None),
        };

        let updated = srs::review(&card, grade, now);
        self.save_card(&updated)?;
        self.log_review(card_id, grade, notes, now)?;

        Ok(Some(updated))
    }

    // Appends a history row without touching the card. For callers that ran
    // the transition themselves and already saved the card.
    pub fn log_review(
        &self,
        card_id: i64,
        grade: Grade,
        notes: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO review_history (card_id, grade, reviewed_at, notes) VALUES (?1, ?2, ?3, ?4)",
            params![card_id, grade.as_str(), now.to_rfc3339(), notes],
        )?;
        Ok(())
    }

    // Study session operations
    pub fn record_study_session(
        &self,
        deck_id: i64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        cards_studied: i32,
        correct_answers: i32,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO study_sessions (deck_id, started_at, ended_at, cards_studied, correct_answers)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                deck_id,
                started_at.to_rfc3339(),
                ended_at.to_rfc3339(),
                cards_studied,
                correct_answers
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<(StudySession, String)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.deck_id, s.started_at, s.ended_at, s.cards_studied, s.correct_answers, d.name
            FROM study_sessions s
            JOIN decks d ON s.deck_id = d.id
            ORDER BY s.ended_at DESC, s.id DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            let started_str: String = row.get(2)?;
            let ended_str: String = row.get(3)?;
            Ok((
                StudySession {
                    id: row.get(0)?,
                    deck_id: row.get(1)?,
                    started_at: parse_ts(2, started_str)?,
                    ended_at: parse_ts(3, ended_str)?,
                    cards_studied: row.get(4)?,
                    correct_answers: row.get(5)?,
                },
                row.get(6)?,
            ))
        })?;

        rows.collect()
    }

    // Tag operations
    fn get_or_create_tag(&self, name: &str) -> Result<i64> {
        // Try to get existing tag
        let existing: Result<i64> =
            self.conn
                .query_row("SELECT id FROM tags WHERE name = ?1", params![name], |row| {
                    row.get(0)
                });

        match existing {
            Ok(id) => Ok(id),
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                self.conn
                    .execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
                Ok(self.conn.last_insert_rowid())
            }
            Err(e) => Err(e),
        }
    }

    fn get_card_tags(&self, card_id: i64) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tg.name
            FROM tags tg
            JOIN card_tags ct ON tg.id = ct.tag_id
            WHERE ct.card_id = ?1
            ORDER BY tg.name
            "#,
        )?;

        let rows = stmt.query_map(params![card_id], |row| row.get(0))?;
        let tags = rows.collect::<Result<Vec<String>>>()?;

        Ok(tags)
    }

    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT tg.id, tg.name, COUNT(ct.card_id) as card_count
            FROM tags tg
            LEFT JOIN card_tags ct ON tg.id = ct.tag_id
            GROUP BY tg.id, tg.name
            ORDER BY tg.name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
                card_count: row.get(2)?,
            })
        })?;
        let tags = rows.collect::<Result<Vec<_>>>()?;

        Ok(tags)
    }

    pub fn get_stats(&self, now: DateTime<Utc>) -> Result<Stats> {
        let total_decks: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM decks", [], |row| row.get(0))?;

        let total_reviews: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM review_history", [], |row| row.get(0))?;

        let sessions_recorded: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM study_sessions", [], |row| row.get(0))?;

        // Phase buckets and the due count come from the same functions the
        // deck views use.
        let cards = self.all_cards()?;
        let counts = srs::deck_counts(&cards);
        let due_now = cards.iter().filter(|c| srs::is_due(c, now)).count() as i64;

        Ok(Stats {
            total_decks,
            total_cards: counts.total as i64,
            total_reviews,
            sessions_recorded,
            due_now,
            new_cards: counts.new as i64,
            learning_cards: counts.learning as i64,
            review_cards: counts.review as i64,
            mastered_cards: counts.mastered as i64,
        })
    }

    // Tags are skipped here; the stats math only reads scheduling fields.
    fn all_cards(&self) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, deck_id, front, back, hint, difficulty, interval, repetition,
                   ease_factor, next_review, last_reviewed, created_at
            FROM cards
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let difficulty_str: String = row.get(5)?;
            let next_review_str: String = row.get(9)?;
            let last_reviewed_str: Option<String> = row.get(10)?;
            let created_str: String = row.get(11)?;
            Ok(Card {
                id: row.get(0)?,
                deck_id: row.get(1)?,
                front: row.get(2)?,
                back: row.get(3)?,
                hint: row.get(4)?,
                tags: vec![],
                difficulty: Difficulty::from_str(&difficulty_str).unwrap_or(Difficulty::Medium),
                interval: row.get(6)?,
                repetition: row.get(7)?,
                ease_factor: row.get(8)?,
                next_review: parse_ts(9, next_review_str)?,
                last_reviewed: last_reviewed_str.map(|s| parse_ts(10, s)).transpose()?,
                created_at: parse_ts(11, created_str)?,
            })
        })?;

        rows.collect()
    }
}

// The app writes RFC 3339; rows created through SQL defaults carry SQLite's
// "YYYY-MM-DD HH:MM:SS" form. Accept both, always as UTC.
fn parse_ts(idx: usize, raw: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
                .map(|naive| Utc.from_utc_datetime(&naive))
        })
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[derive(Debug, Clone)]
pub struct Stats {
    pub total_decks: i64,
    pub total_cards: i64,
    pub total_reviews: i64,
    pub sessions_recorded: i64,
    pub due_now: i64,
    pub new_cards: i64,
    pub learning_cards: i64,
    pub review_cards: i64,
    pub mastered_cards: i64,
}
