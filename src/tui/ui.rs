use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{dashboard, deck_detail, decks, study};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Decks"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Decks | View::DeckDetail | View::Study => 1,
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(" Cram "))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Decks => decks::draw(f, app, area),
        View::DeckDetail => deck_detail::draw(f, app, area),
        View::Study => study::draw(f, app, area),
    }
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if app.filter_mode {
        vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(&app.filter_input),
            Span::styled("█", Style::default().fg(Color::Yellow)),
            Span::raw(" | "),
            Span::styled("<CR>", Style::default().fg(Color::Cyan)),
            Span::raw(" Apply  "),
            Span::styled("<Esc>", Style::default().fg(Color::Cyan)),
            Span::raw(" Cancel"),
        ]
    } else {
        let mut spans = Vec::new();

        match app.view {
            View::Dashboard => {
                spans.extend(vec![
                    Span::styled("h/l", Style::default().fg(Color::Cyan)),
                    Span::raw(" Views  "),
                    Span::styled("^r", Style::default().fg(Color::Cyan)),
                    Span::raw(" Refresh  "),
                ]);
            }
            View::Decks => {
                spans.extend(vec![
                    Span::styled("h/l", Style::default().fg(Color::Cyan)),
                    Span::raw(" Views  "),
                    Span::styled("j/k", Style::default().fg(Color::Cyan)),
                    Span::raw(" Nav  "),
                    Span::styled("g/G", Style::default().fg(Color::Cyan)),
                    Span::raw(" Top/Bot  "),
                    Span::styled("l/<CR>", Style::default().fg(Color::Cyan)),
                    Span::raw(" Open  "),
                    Span::styled("s", Style::default().fg(Color::Cyan)),
                    Span::raw(" Study  "),
                    Span::styled("/", Style::default().fg(Color::Cyan)),
                    Span::raw(" Filter  "),
                ]);
                if app.filter_name.is_some() {
                    spans.extend(vec![
                        Span::styled("<Esc>", Style::default().fg(Color::Cyan)),
                        Span::raw(" Clear  "),
                    ]);
                }
            }
            View::DeckDetail => {
                spans.extend(vec![
                    Span::styled("h/<Esc>", Style::default().fg(Color::Cyan)),
                    Span::raw(" Back  "),
                    Span::styled("s", Style::default().fg(Color::Cyan)),
                    Span::raw(" Study  "),
                    Span::styled("^r", Style::default().fg(Color::Cyan)),
                    Span::raw(" Refresh  "),
                ]);
            }
            View::Study => {
                let at_summary = app
                    .study
                    .as_ref()
                    .map(|s| s.finished || s.queue.is_empty())
                    .unwrap_or(true);
                if at_summary {
                    spans.extend(vec![
                        Span::styled("<CR>", Style::default().fg(Color::Cyan)),
                        Span::raw(" Done  "),
                    ]);
                } else {
                    let revealed = app.study.as_ref().map(|s| s.revealed).unwrap_or(false);
                    if revealed {
                        spans.extend(vec![
                            Span::styled("1", Style::default().fg(Color::Red)),
                            Span::raw(" Again  "),
                            Span::styled("2", Style::default().fg(Color::Yellow)),
                            Span::raw(" Hard  "),
                            Span::styled("3", Style::default().fg(Color::Green)),
                            Span::raw(" Good  "),
                            Span::styled("4", Style::default().fg(Color::Cyan)),
                            Span::raw(" Easy  "),
                        ]);
                    } else {
                        spans.extend(vec![
                            Span::styled("<Space>", Style::default().fg(Color::Cyan)),
                            Span::raw(" Reveal  "),
                        ]);
                    }
                    spans.extend(vec![
                        Span::styled("<Esc>", Style::default().fg(Color::Cyan)),
                        Span::raw(" End  "),
                    ]);
                }
            }
        }

        spans.extend(vec![
            Span::styled("q", Style::default().fg(Color::Cyan)),
            Span::raw(" Quit"),
        ]);

        spans
    };

    let help = Paragraph::new(Line::from(help_text)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
