use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9), // Stats + Due decks row
            Constraint::Min(0),    // Recent sessions
        ])
        .split(area);

    // Top row: Stats and Due Decks side by side
    let top_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);

    draw_stats(f, app, top_chunks[0]);
    draw_due_decks(f, app, top_chunks[1]);
    draw_recent_sessions(f, app, chunks[1]);
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;

    let text = vec![
        Line::from(vec![
            Span::styled("Decks: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.total_decks),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled("Cards: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.total_cards),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Reviews: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.total_reviews),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Due: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.due_now),
                Style::default().fg(if stats.due_now > 0 {
                    Color::Yellow
                } else {
                    Color::White
                }),
            ),
        ]),
        Line::from(vec![
            Span::styled("Mastered: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.mastered_cards),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::styled("New/Learning/Review: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!(
                    "{}/{}/{}",
                    stats.new_cards, stats.learning_cards, stats.review_cards
                ),
                Style::default().fg(Color::Cyan),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_due_decks(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .due_decks
        .iter()
        .enumerate()
        .map(|(i, dwc)| {
            let bar = mastery_bar(&dwc.counts);
            let style = if dwc.counts.new > 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Yellow)
            };

            ListItem::new(Line::from(vec![
                Span::styled(format!("{}. ", i + 1), Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{:<22}", truncate(&dwc.deck.name, 20)), style),
                Span::styled(bar, Style::default().fg(Color::Green)),
                Span::styled(
                    format!(" {} due", dwc.due),
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Due Decks ")
        .title_style(Style::default().fg(Color::Yellow));

    if items.is_empty() {
        let paragraph = Paragraph::new("Nothing due right now")
            .style(Style::default().fg(Color::Green))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        let list = List::new(items).block(block);
        f.render_widget(list, area);
    }
}

fn draw_recent_sessions(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .recent_sessions
        .iter()
        .map(|(session, deck_name)| {
            let accuracy = session.accuracy();
            let accuracy_color = if accuracy >= 80 {
                Color::Green
            } else if accuracy >= 50 {
                Color::Yellow
            } else {
                Color::Red
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<10}", session.started_at.format("%b %d")),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<22}", truncate(deck_name, 20)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>3} cards  ", session.cards_studied),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:>3}%", accuracy),
                    Style::default().fg(accuracy_color),
                ),
                Span::styled(
                    format!("  {} min", session.duration_minutes()),
                    Style::default().fg(Color::Gray),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recent Sessions ")
        .title_style(Style::default().fg(Color::Magenta));

    if items.is_empty() {
        let paragraph = Paragraph::new("No sessions yet. Pick a deck and press 's' to study!")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        let list = List::new(items).block(block);
        f.render_widget(list, area);
    }
}

// Ten-cell bar showing the mastered share of a deck.
fn mastery_bar(counts: &crate::models::DeckCounts) -> String {
    if counts.total == 0 {
        return "░".repeat(10);
    }
    let filled = (counts.mastered * 10) / counts.total;
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

// Cuts on char boundaries; deck names are routinely non-ASCII.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
