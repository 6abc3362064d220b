use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::tui::{App, StudyState};

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(study) = &app.study else {
        let block = Block::default().borders(Borders::ALL).title(" Study ");
        let paragraph = Paragraph::new("No study session in progress").block(block);
        f.render_widget(paragraph, area);
        return;
    };

    if study.finished || study.queue.is_empty() {
        draw_summary(f, study, area);
    } else {
        draw_card(f, study, area);
    }
}

fn draw_card(f: &mut Frame, study: &StudyState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Queue progress
            Constraint::Min(8),    // Front
            Constraint::Min(8),    // Back
            Constraint::Length(1), // Save errors
        ])
        .split(area);

    draw_queue_progress(f, study, chunks[0]);

    let Some(card) = study.current_card() else {
        return;
    };

    let mut front_lines = vec![Line::from(""), Line::from(card.front.as_str())];
    if let Some(hint) = &card.hint {
        front_lines.push(Line::from(""));
        front_lines.push(Line::from(Span::styled(
            format!("Hint: {}", hint),
            Style::default().fg(Color::DarkGray),
        )));
    }

    let front_block = Block::default()
        .borders(Borders::ALL)
        .title(" Front ")
        .title_style(Style::default().fg(Color::Cyan));
    let front = Paragraph::new(front_lines)
        .block(front_block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(front, chunks[1]);

    let back_block = Block::default()
        .borders(Borders::ALL)
        .title(" Back ")
        .title_style(Style::default().fg(Color::Green));
    let back = if study.revealed {
        Paragraph::new(vec![Line::from(""), Line::from(card.back.as_str())])
            .block(back_block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
    } else {
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Press <Space> to reveal",
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(back_block)
        .alignment(Alignment::Center)
    };
    f.render_widget(back, chunks[2]);

    draw_save_error(f, study, chunks[3]);
}

fn draw_queue_progress(f: &mut Frame, study: &StudyState, area: Rect) {
    let total = study.queue.len();
    let done = study.position.min(total);
    let ratio = if total == 0 {
        0.0
    } else {
        done as f64 / total as f64
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Studying {} ", study.deck_name)),
        )
        .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray))
        .ratio(ratio)
        .label(format!("Card {} of {}", (done + 1).min(total), total));

    f.render_widget(gauge, area);
}

fn draw_summary(f: &mut Frame, study: &StudyState, area: Rect) {
    let tracker = &study.tracker;
    let accuracy = tracker.accuracy();
    let minutes = tracker.duration(Utc::now()).num_minutes();

    let accuracy_color = if accuracy >= 80 {
        Color::Green
    } else if accuracy >= 50 {
        Color::Yellow
    } else {
        Color::Red
    };

    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled(
            if study.queue.is_empty() {
                "Nothing due in this deck right now"
            } else {
                "Session complete!"
            },
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Cards studied: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", tracker.cards_studied),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Correct: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", tracker.correct_answers),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Accuracy: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}%", accuracy),
                Style::default().fg(accuracy_color),
            ),
        ]),
        Line::from(vec![
            Span::styled("Duration: ", Style::default().fg(Color::Gray)),
            Span::styled(format!("{} min", minutes), Style::default().fg(Color::White)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Press <CR> to continue",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if let Some(err) = &study.save_error {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            err.as_str(),
            Style::default().fg(Color::Red),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", study.deck_name))
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn draw_save_error(f: &mut Frame, study: &StudyState, area: Rect) {
    if let Some(err) = &study.save_error {
        let line = Paragraph::new(Span::styled(
            err.as_str(),
            Style::default().fg(Color::Red),
        ));
        f.render_widget(line, area);
    }
}
