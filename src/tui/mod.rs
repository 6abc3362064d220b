mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::db::{Database, Stats};
use crate::models::{Card, DeckWithCounts, Grade, StudySession};
use crate::srs::{self, SessionTracker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Decks,
    DeckDetail,
    Study,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Dashboard => View::Decks,
            View::Decks => View::Dashboard,
            View::DeckDetail => View::Decks,
            View::Study => View::Study,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Dashboard => View::Decks,
            View::Decks => View::Dashboard,
            View::DeckDetail => View::Decks,
            View::Study => View::Study,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

/// State of one in-flight study session. The queue is built once from the
/// deck's due cards and walked front to back; a card graded `Again` stays due
/// but is not re-queued within the same session.
pub struct StudyState {
    pub deck_id: i64,
    pub deck_name: String,
    pub queue: Vec<Card>,
    pub position: usize,
    pub revealed: bool,
    pub tracker: SessionTracker,
    pub save_error: Option<String>,
    pub finished: bool,
}

impl StudyState {
    pub fn current_card(&self) -> Option<&Card> {
        self.queue.get(self.position)
    }
}

pub struct App {
    db: Database,
    pub view: View,
    pub decks: StatefulList<DeckWithCounts>,
    pub selected_deck: Option<DeckWithCounts>,
    pub selected_deck_cards: Vec<Card>,
    pub stats: Stats,
    pub due_decks: Vec<DeckWithCounts>,
    pub recent_sessions: Vec<(StudySession, String)>, // session + deck name
    pub study: Option<StudyState>,
    pub filter_name: Option<String>,
    pub filter_input: String,
    pub filter_mode: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database) -> Result<Self, Box<dyn std::error::Error>> {
        let now = Utc::now();
        let stats = db.get_stats(now)?;
        let decks_data = db.list_decks_with_counts(None, now)?;
        let due_decks = decks_data
            .iter()
            .filter(|d| d.due > 0)
            .take(5)
            .cloned()
            .collect();
        let recent_sessions = db.recent_sessions(5)?;

        Ok(Self {
            db,
            view: View::Dashboard,
            decks: StatefulList::with_items(decks_data),
            selected_deck: None,
            selected_deck_cards: Vec::new(),
            stats,
            due_decks,
            recent_sessions,
            study: None,
            filter_name: None,
            filter_input: String::new(),
            filter_mode: false,
            should_quit: false,
        })
    }

    pub fn refresh_data(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let now = Utc::now();
        self.stats = self.db.get_stats(now)?;
        self.recent_sessions = self.db.recent_sessions(5)?;
        self.reload_decks()?;

        let selected_id = self.selected_deck.as_ref().map(|d| d.deck.id);
        if let Some(id) = selected_id {
            self.selected_deck = self.db.get_deck_with_counts(id, now)?;
            self.selected_deck_cards = if self.selected_deck.is_some() {
                self.db.list_cards(id)?
            } else {
                Vec::new()
            };
        }
        Ok(())
    }

    fn reload_decks(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let all = self.db.list_decks_with_counts(None, Utc::now())?;
        self.due_decks = all.iter().filter(|d| d.due > 0).take(5).cloned().collect();

        let decks = match &self.filter_name {
            Some(filter) => {
                let needle = filter.to_lowercase();
                all.into_iter()
                    .filter(|d| d.deck.name.to_lowercase().contains(&needle))
                    .collect()
            }
            None => all,
        };
        self.decks = StatefulList::with_items(decks);
        Ok(())
    }

    fn apply_filter(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.filter_input.is_empty() {
            self.filter_name = None;
        } else {
            self.filter_name = Some(self.filter_input.clone());
        }
        self.reload_decks()
    }

    fn select_deck(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(dwc) = self.decks.selected_item() {
            self.selected_deck = Some(dwc.clone());
            self.selected_deck_cards = self.db.list_cards(dwc.deck.id)?;
            self.view = View::DeckDetail;
        }
        Ok(())
    }

    fn close_deck_detail(&mut self) {
        self.view = View::Decks;
        self.selected_deck = None;
        self.selected_deck_cards.clear();
    }

    fn start_study(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let target = match self.view {
            View::Decks => self.decks.selected_item().cloned(),
            View::DeckDetail => self.selected_deck.clone(),
            _ => None,
        };
        let Some(dwc) = target else {
            return Ok(());
        };

        let now = Utc::now();
        let queue = self.db.due_cards(dwc.deck.id, now)?;
        let finished = queue.is_empty();
        self.study = Some(StudyState {
            deck_id: dwc.deck.id,
            deck_name: dwc.deck.name,
            queue,
            position: 0,
            revealed: false,
            tracker: SessionTracker::start(now),
            save_error: None,
            finished,
        });
        self.view = View::Study;
        Ok(())
    }

    fn grade_current(&mut self, grade: Grade) {
        let now = Utc::now();
        let Some(study) = self.study.as_mut() else {
            return;
        };
        if !study.revealed {
            return;
        }
        let Some(card) = study.queue.get(study.position) else {
            return;
        };

        let updated = srs::review(card, grade, now);

        // Optimistic update: the session keeps moving on the locally computed
        // state even when the write fails.
        let mut saved = self.db.save_card(&updated);
        if saved.is_ok() {
            saved = self.db.log_review(updated.id, grade, None, now);
        }
        study.save_error = saved.err().map(|e| format!("Save failed: {}", e));

        study.tracker.record_grade(grade);
        study.queue[study.position] = updated;
        study.position += 1;
        study.revealed = false;

        if study.position >= study.queue.len() {
            study.finished = true;
            let recorded = self.db.record_study_session(
                study.deck_id,
                study.tracker.started_at,
                now,
                study.tracker.cards_studied,
                study.tracker.correct_answers,
            );
            if let Err(e) = recorded {
                study.save_error = Some(format!("Save failed: {}", e));
            }
        }
    }

    fn end_study(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(study) = self.study.take() {
            // An abandoned session still counts the cards already graded; a
            // finished one was recorded when the queue ran out.
            if !study.finished && study.tracker.cards_studied > 0 {
                self.db.record_study_session(
                    study.deck_id,
                    study.tracker.started_at,
                    Utc::now(),
                    study.tracker.cards_studied,
                    study.tracker.correct_answers,
                )?;
            }
        }
        self.refresh_data()?;
        self.view = if self.selected_deck.is_some() {
            View::DeckDetail
        } else {
            View::Decks
        };
        Ok(())
    }

    fn handle_study_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        if key == KeyCode::Char('q') {
            self.end_study()?;
            self.should_quit = true;
            return Ok(());
        }

        let at_summary = self
            .study
            .as_ref()
            .map(|s| s.finished || s.queue.is_empty())
            .unwrap_or(true);

        if at_summary {
            if matches!(key, KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ')) {
                self.end_study()?;
            }
            return Ok(());
        }

        match key {
            KeyCode::Esc => self.end_study()?,
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Some(study) = self.study.as_mut() {
                    study.revealed = true;
                }
            }
            KeyCode::Char('1') | KeyCode::Char('a') => self.grade_current(Grade::Again),
            KeyCode::Char('2') | KeyCode::Char('h') => self.grade_current(Grade::Hard),
            KeyCode::Char('3') | KeyCode::Char('g') => self.grade_current(Grade::Good),
            KeyCode::Char('4') | KeyCode::Char('e') => self.grade_current(Grade::Easy),
            _ => {}
        }
        Ok(())
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        // Handle filter mode input (vim-like / search)
        if self.filter_mode {
            match key {
                KeyCode::Esc => {
                    self.filter_mode = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filter_mode = false;
                    self.apply_filter()?;
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                }
                _ => {}
            }
            return Ok(());
        }

        // The study view owns its keys; numbers and letters grade cards there.
        if self.view == View::Study {
            return self.handle_study_key(key);
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            // Refresh: Ctrl+r (vim-like redo/refresh)
            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            // Search/filter: / (vim search)
            KeyCode::Char('/') if self.view == View::Decks => {
                self.filter_mode = true;
                self.filter_input.clear();
            }

            KeyCode::Esc => match self.view {
                View::DeckDetail => self.close_deck_detail(),
                View::Decks if self.filter_name.is_some() => {
                    self.filter_name = None;
                    self.filter_input.clear();
                    self.reload_decks()?;
                }
                _ => {}
            },

            // Navigation between views: h/l (left/right like vim)
            KeyCode::Char('h') | KeyCode::Left => match self.view {
                View::DeckDetail => self.close_deck_detail(),
                _ => self.view = self.view.prev(),
            },
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Decks => self.select_deck()?,
                _ => self.view = self.view.next(),
            },

            // Tab still works for quick view switching
            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => {
                self.view = self.view.prev();
            }

            // List navigation: j/k (vim up/down)
            KeyCode::Char('j') | KeyCode::Down => {
                if self.view == View::Decks {
                    self.decks.next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.view == View::Decks {
                    self.decks.previous();
                }
            }

            // Jump to top/bottom: g/G
            KeyCode::Char('g') => {
                if self.view == View::Decks && !self.decks.items.is_empty() {
                    self.decks.selected = Some(0);
                }
            }
            KeyCode::Char('G') => {
                if self.view == View::Decks && !self.decks.items.is_empty() {
                    self.decks.selected = Some(self.decks.items.len() - 1);
                }
            }

            // Enter to select (like vim Enter in quickfix)
            KeyCode::Enter => {
                if self.view == View::Decks {
                    self.select_deck()?;
                }
            }

            // Start a study session on the selected deck
            KeyCode::Char('s') => match self.view {
                View::Decks | View::DeckDetail => self.start_study()?,
                _ => {}
            },

            _ => {}
        }
        Ok(())
    }
}

pub fn run(db: Database) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app state
    let mut app = App::new(db)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
