use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let title = if let Some(name) = &app.filter_name {
        format!(" Decks (filter: {}) ", name)
    } else {
        " Decks ".to_string()
    };

    let items: Vec<ListItem> = app
        .decks
        .items
        .iter()
        .map(|dwc| {
            let counts = &dwc.counts;
            let (due_color, due_text) = if dwc.due > 0 {
                (Color::Yellow, format!("{} due", dwc.due))
            } else {
                (Color::DarkGray, "-".to_string())
            };

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<28}", truncate(&dwc.deck.name, 26)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:<12}", dwc.deck.category.label()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:>5}  ", counts.total),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!(
                        "{:>3}/{:>3}/{:>3}/{:>3}  ",
                        counts.new, counts.learning, counts.review, counts.mastered
                    ),
                    Style::default().fg(Color::Green),
                ),
                Span::styled(due_text, Style::default().fg(due_color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(Style::default().fg(Color::Cyan));

    // Header
    let header = Line::from(vec![
        Span::styled(
            format!("{:<28}", "Name"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{:<12}", "Category"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Cards  ",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "  N/  L/  R/  M  ",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Due",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.decks.selected);

    // Render header separately at the top of content area
    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(ratatui::widgets::Paragraph::new(header), header_area);

    // Adjust list area to account for header
    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };

    f.render_stateful_widget(list, list_area, &mut state);
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
