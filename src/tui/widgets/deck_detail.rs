use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::models::{CardPhase, DeckWithCounts};
use crate::srs;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(dwc) = &app.selected_deck else {
        let block = Block::default().borders(Borders::ALL).title(" Deck Detail ");
        let paragraph = Paragraph::new("No deck selected").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header info
            Constraint::Length(4), // Progress counters
            Constraint::Min(0),    // Cards
        ])
        .split(area);

    draw_header(f, dwc, chunks[0]);
    draw_progress(f, dwc, chunks[1]);
    draw_cards(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, dwc: &DeckWithCounts, area: Rect) {
    let description = dwc.deck.description.as_deref().unwrap_or("No description");
    let level = dwc.deck.level.as_deref().unwrap_or("-");

    let text = vec![
        Line::from(vec![
            Span::styled("Description: ", Style::default().fg(Color::Gray)),
            Span::styled(description, Style::default().fg(Color::White)),
        ]),
        Line::from(vec![
            Span::styled("Category: ", Style::default().fg(Color::Gray)),
            Span::styled(dwc.deck.category.label(), Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled("Level: ", Style::default().fg(Color::Gray)),
            Span::styled(level, Style::default().fg(Color::Cyan)),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", dwc.deck.name))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_progress(f: &mut Frame, dwc: &DeckWithCounts, area: Rect) {
    let counts = &dwc.counts;

    let text = vec![
        Line::from(vec![
            Span::styled("New: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{}", counts.new), Style::default().fg(Color::Red)),
            Span::raw("  "),
            Span::styled("Learning: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", counts.learning),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("  "),
            Span::styled("Review: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", counts.review),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("  "),
            Span::styled("Mastered: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", counts.mastered),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![
            Span::styled("Total: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", counts.total),
                Style::default().fg(Color::White),
            ),
            Span::raw("  "),
            Span::styled("Due now: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", dwc.due),
                Style::default().fg(if dwc.due > 0 {
                    Color::Yellow
                } else {
                    Color::White
                }),
            ),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Progress ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block);
    f.render_widget(paragraph, area);
}

fn draw_cards(f: &mut Frame, app: &App, area: Rect) {
    let now = Utc::now();
    let items: Vec<ListItem> = app
        .selected_deck_cards
        .iter()
        .map(|card| {
            let phase = card.phase();
            let phase_color = match phase {
                CardPhase::New => Color::Red,
                CardPhase::Learning => Color::Yellow,
                CardPhase::Review => Color::Cyan,
                CardPhase::Mastered => Color::Green,
            };

            let (next_color, next_text) = if srs::is_due(card, now) {
                (Color::Red, "due now".to_string())
            } else {
                (Color::White, card.next_review.format("%b %d").to_string())
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<30}", truncate(&card.front, 28)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<10}", phase.label()),
                    Style::default().fg(phase_color),
                ),
                Span::styled(
                    format!("{:>4}d  ", card.interval),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(next_text, Style::default().fg(next_color)),
            ]))
        })
        .collect();

    let title = if app.selected_deck_cards.is_empty() {
        " Cards (none) ".to_string()
    } else {
        format!(" Cards ({}) ", app.selected_deck_cards.len())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Magenta));

    if items.is_empty() {
        let paragraph = Paragraph::new("No cards yet. Add some with 'cram card add'.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
    } else {
        let list = List::new(items).block(block);
        f.render_widget(list, area);
    }
}

// Cuts on char boundaries; card fronts are routinely non-ASCII.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
