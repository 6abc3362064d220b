mod db;
mod models;
mod srs;
mod tui;

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use db::Database;
use models::{DeckCategory, Difficulty, Grade, JsonOutput};

const DEFAULT_DB_NAME: &str = "cram.db";

#[derive(Parser)]
#[command(name = "cram")]
#[command(about = "A spaced-repetition flashcard CLI for language learners")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage decks
    #[command(subcommand)]
    Deck(DeckCommands),

    /// Manage cards
    #[command(subcommand)]
    Card(CardCommands),

    /// List all tags
    Tags,

    /// Show study statistics
    Stats,

    /// List cards due for review in a deck
    Due {
        /// Deck ID
        deck_id: i64,
    },

    /// Grade a card review and reschedule it
    Review {
        /// Card ID
        id: i64,

        /// Recall grade: again/hard/good/easy
        #[arg(long, short)]
        grade: String,

        /// Optional notes about the review
        #[arg(long, short)]
        notes: Option<String>,
    },

    /// Launch interactive terminal UI
    Tui,
}

#[derive(Subcommand)]
enum DeckCommands {
    /// List all decks
    List {
        /// Filter by category
        #[arg(long, short)]
        category: Option<String>,
    },

    /// Add a new deck
    Add {
        /// Deck name
        name: String,

        /// Deck description
        #[arg(long, short)]
        description: Option<String>,

        /// Category: vocabulary/grammar/phrases/culture/custom
        #[arg(long, short)]
        category: Option<String>,

        /// Language level (e.g. A2, B1)
        #[arg(long, short)]
        level: Option<String>,
    },

    /// Show deck details and card counts
    Show {
        /// Deck ID
        id: i64,
    },

    /// Delete a deck and its cards
    Delete {
        /// Deck ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum CardCommands {
    /// List cards in a deck
    List {
        /// Deck ID
        deck_id: i64,
    },

    /// Add a new card to a deck
    Add {
        /// Deck ID
        deck_id: i64,

        /// Front side (prompt)
        #[arg(long, short)]
        front: String,

        /// Back side (answer)
        #[arg(long, short)]
        back: String,

        /// Optional hint shown before the answer
        #[arg(long)]
        hint: Option<String>,

        /// Difficulty: easy/medium/hard
        #[arg(long, short)]
        difficulty: Option<String>,

        /// Comma-separated tags
        #[arg(long, short)]
        tags: Option<String>,
    },

    /// Show card details and scheduling state
    Show {
        /// Card ID
        id: i64,
    },

    /// Delete a card
    Delete {
        /// Card ID
        id: i64,
    },

    /// Update card tags
    Tag {
        /// Card ID
        id: i64,

        /// Comma-separated tags (replaces existing)
        #[arg(long, short)]
        tags: String,
    },
}

fn get_db_path() -> PathBuf {
    resolve_db_path(std::env::var("CRAM_DB").ok(), dirs::config_dir())
}

// Separated from the env/dirs lookups so tests don't touch process globals.
fn resolve_db_path(env_override: Option<String>, config_dir: Option<PathBuf>) -> PathBuf {
    if let Some(path) = env_override {
        return PathBuf::from(path);
    }

    let config_dir = config_dir.unwrap_or_else(|| PathBuf::from(".")).join("cram");

    std::fs::create_dir_all(&config_dir).ok();
    config_dir.join(DEFAULT_DB_NAME)
}

fn parse_category(s: &str) -> Result<DeckCategory, String> {
    DeckCategory::from_str(s).ok_or_else(|| {
        format!(
            "Invalid category '{}'. Use: vocabulary, grammar, phrases, culture, or custom",
            s
        )
    })
}

fn parse_difficulty(s: &str) -> Result<Difficulty, String> {
    Difficulty::from_str(s)
        .ok_or_else(|| format!("Invalid difficulty '{}'. Use: easy, medium, or hard", s))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_path = get_db_path();
    let db = Database::open(&db_path)?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Deck(deck_cmd) => match deck_cmd {
            DeckCommands::List { category } => {
                let filter = match category {
                    Some(s) => Some(parse_category(&s)?),
                    None => None,
                };
                let decks = db.list_decks_with_counts(filter, Utc::now())?;

                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&decks))?);
                } else if decks.is_empty() {
                    println!("No decks found.");
                } else {
                    println!(
                        "{:<5} {:<25} {:<12} {:>6} {:>5} {:>9}",
                        "ID", "NAME", "CATEGORY", "CARDS", "DUE", "MASTERED"
                    );
                    println!("{}", "-".repeat(70));
                    for dwc in decks {
                        println!(
                            "{:<5} {:<25} {:<12} {:>6} {:>5} {:>9}",
                            dwc.deck.id,
                            truncate(&dwc.deck.name, 23),
                            dwc.deck.category.label(),
                            dwc.counts.total,
                            dwc.due,
                            dwc.counts.mastered
                        );
                    }
                }
            }

            DeckCommands::Add {
                name,
                description,
                category,
                level,
            } => {
                let category = match category {
                    Some(s) => parse_category(&s)?,
                    None => DeckCategory::Custom,
                };

                let id = db.add_deck(&name, description.as_deref(), category, level.as_deref())?;

                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "id": id,
                            "name": name
                        })))?
                    );
                } else {
                    println!("Added deck '{}' with ID: {}", name, id);
                }
            }

            DeckCommands::Show { id } => {
                if let Some(dwc) = db.get_deck_with_counts(id, Utc::now())? {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&dwc))?);
                    } else {
                        println!("Deck: {}", dwc.deck.name);
                        println!("ID: {}", dwc.deck.id);
                        if let Some(desc) = &dwc.deck.description {
                            println!("Description: {}", desc);
                        }
                        println!("Category: {}", dwc.deck.category.label());
                        if let Some(level) = &dwc.deck.level {
                            println!("Level: {}", level);
                        }
                        println!("Created: {}", dwc.deck.created_at);
                        println!();
                        println!("--- Cards ---");
                        println!("Total: {}", dwc.counts.total);
                        println!(
                            "New: {}  Learning: {}  Review: {}  Mastered: {}",
                            dwc.counts.new,
                            dwc.counts.learning,
                            dwc.counts.review,
                            dwc.counts.mastered
                        );
                        println!("Due now: {}", dwc.due);
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Deck not found"))?
                    );
                } else {
                    println!("Deck not found.");
                }
            }

            DeckCommands::Delete { id } => {
                if db.delete_deck(id)? {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                    } else {
                        println!("Deck {} deleted.", id);
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Deck not found"))?
                    );
                } else {
                    println!("Deck not found.");
                }
            }
        },

        Commands::Card(card_cmd) => match card_cmd {
            CardCommands::List { deck_id } => {
                let now = Utc::now();
                let cards = db.list_cards(deck_id)?;

                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&cards))?);
                } else if cards.is_empty() {
                    println!("No cards in this deck.");
                } else {
                    println!("{:<5} {:<30} {:<30} {:<9} DUE", "ID", "FRONT", "BACK", "PHASE");
                    println!("{}", "-".repeat(80));
                    for card in &cards {
                        let due = if srs::is_due(card, now) { "yes" } else { "-" };
                        println!(
                            "{:<5} {:<30} {:<30} {:<9} {}",
                            card.id,
                            truncate(&card.front, 28),
                            truncate(&card.back, 28),
                            card.phase().label(),
                            due
                        );
                    }
                }
            }

            CardCommands::Add {
                deck_id,
                front,
                back,
                hint,
                difficulty,
                tags,
            } => {
                let difficulty = match difficulty {
                    Some(s) => parse_difficulty(&s)?,
                    None => Difficulty::Medium,
                };
                let tag_list: Vec<String> = tags
                    .map(|t| t.split(',').map(|s| s.trim().to_string()).collect())
                    .unwrap_or_default();

                if db.get_deck(deck_id)?.is_none() {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::<()>::err("Deck not found"))?
                        );
                    } else {
                        println!("Deck not found.");
                    }
                } else {
                    let id = db.add_card(
                        deck_id,
                        &front,
                        &back,
                        hint.as_deref(),
                        difficulty,
                        &tag_list,
                    )?;

                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "id": id,
                                "front": front
                            })))?
                        );
                    } else {
                        println!("Added card '{}' with ID: {}", front, id);
                    }
                }
            }

            CardCommands::Show { id } => {
                if let Some(card) = db.get_card(id)? {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&card))?);
                    } else {
                        println!("Card: {}", card.front);
                        println!("ID: {}", card.id);
                        println!("Back: {}", card.back);
                        if let Some(hint) = &card.hint {
                            println!("Hint: {}", hint);
                        }
                        println!("Difficulty: {}", card.difficulty.label());
                        println!(
                            "Tags: {}",
                            if card.tags.is_empty() {
                                "-".to_string()
                            } else {
                                card.tags.join(", ")
                            }
                        );
                        println!("Created: {}", card.created_at);

                        println!();
                        println!("--- Scheduling ---");
                        println!("Phase: {}", card.phase().label());
                        println!("Interval: {} days", card.interval);
                        println!("Streak: {}", card.repetition);
                        println!("Ease factor: {:.2}", card.ease_factor);
                        if let Some(last) = &card.last_reviewed {
                            println!("Last reviewed: {}", last);
                        }
                        println!("Next review: {}", card.next_review);
                        if srs::is_due(&card, Utc::now()) {
                            println!("Due now.");
                        }
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Card not found"))?
                    );
                } else {
                    println!("Card not found.");
                }
            }

            CardCommands::Delete { id } => {
                if db.delete_card(id)? {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                    } else {
                        println!("Card {} deleted.", id);
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Card not found"))?
                    );
                } else {
                    println!("Card not found.");
                }
            }

            CardCommands::Tag { id, tags } => {
                let tag_list: Vec<String> =
                    tags.split(',').map(|s| s.trim().to_string()).collect();

                if db.get_card(id)?.is_some() {
                    db.update_card_tags(id, &tag_list)?;
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
                    } else {
                        println!("Updated tags for card {}.", id);
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Card not found"))?
                    );
                } else {
                    println!("Card not found.");
                }
            }
        },

        Commands::Tags => {
            let tags = db.list_tags()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&tags))?);
            } else if tags.is_empty() {
                println!("No tags found.");
            } else {
                println!("{:<5} {:<30} CARDS", "ID", "TAG");
                println!("{}", "-".repeat(50));
                for tag in tags {
                    println!("{:<5} {:<30} {}", tag.id, tag.name, tag.card_count);
                }
            }
        }

        Commands::Stats => {
            let stats = db.get_stats(Utc::now())?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "total_decks": stats.total_decks,
                        "total_cards": stats.total_cards,
                        "total_reviews": stats.total_reviews,
                        "sessions_recorded": stats.sessions_recorded,
                        "due_now": stats.due_now,
                        "new_cards": stats.new_cards,
                        "learning_cards": stats.learning_cards,
                        "review_cards": stats.review_cards,
                        "mastered_cards": stats.mastered_cards
                    })))?
                );
            } else {
                println!("=== Study Statistics ===");
                println!("Total decks: {}", stats.total_decks);
                println!("Total cards: {}", stats.total_cards);
                println!("Total reviews: {}", stats.total_reviews);
                println!("Study sessions: {}", stats.sessions_recorded);
                println!("Due for review: {}", stats.due_now);
                println!();
                println!(
                    "New: {}  Learning: {}  Review: {}  Mastered: {}",
                    stats.new_cards, stats.learning_cards, stats.review_cards, stats.mastered_cards
                );
            }
        }

        Commands::Due { deck_id } => {
            let now = Utc::now();
            let cards = db.due_cards(deck_id, now)?;

            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&cards))?);
            } else if cards.is_empty() {
                println!("No cards due in this deck.");
            } else {
                println!("{:<5} {:<40} PHASE", "ID", "FRONT");
                println!("{}", "-".repeat(60));
                for card in &cards {
                    println!(
                        "{:<5} {:<40} {}",
                        card.id,
                        truncate(&card.front, 38),
                        card.phase().label()
                    );
                }
                println!();
                println!("Review a card with:");
                println!("  cram review <id> --grade <again|hard|good|easy>");
            }
        }

        Commands::Review { id, grade, notes } => {
            let grade = grade.parse::<Grade>()?;

            match db.record_review(id, grade, notes.as_deref(), Utc::now())? {
                Some(card) => {
                    if cli.json {
                        println!("{}", serde_json::to_string(&JsonOutput::ok(&card))?);
                    } else {
                        println!("Review recorded for card {}.", id);
                        println!("Phase: {}", card.phase().label());
                        println!("Interval: {} days", card.interval);
                        println!("Next review: {}", card.next_review);
                    }
                }
                None => {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::<()>::err("Card not found"))?
                        );
                    } else {
                        println!("Card not found.");
                    }
                }
            }
        }

        Commands::Tui => {
            tui::run(db)?;
        }
    }

    Ok(())
}

// Cuts on char boundaries; fronts and deck names are routinely non-ASCII.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
