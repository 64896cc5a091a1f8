pub mod widgets;

use crate::app::{App, Focus, InputMode, LoadStatus};
use crate::ui::widgets::Pane;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

/// Screen regions. Shared by drawing and mouse hit-testing so both agree on
/// where the graph lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    pub input: Rect,
    pub profile: Rect,
    pub stats: Rect,
    pub table: Rect,
    pub graph: Rect,
    pub status: Rect,
}

pub fn areas(area: Rect) -> ScreenAreas {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(area);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(rows[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(5),
            Constraint::Min(5),
        ])
        .split(body[0]);

    ScreenAreas {
        input: rows[0],
        profile: left[0],
        stats: left[1],
        table: left[2],
        graph: body[1],
        status: rows[2],
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    let areas = areas(frame.area());

    render_input(frame, areas.input, app);
    app.profile.render(frame, areas.profile, false);
    app.stats.render(frame, areas.stats, false);
    app.table
        .render(frame, areas.table, app.focus == Focus::Table);
    app.graph
        .render(frame, areas.graph, app.focus == Focus::Graph);
    render_status(frame, areas.status, app);
}

fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let editing = app.mode == InputMode::Query;
    let border_style = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };

    let block = Block::default()
        .title(" User (@handle, id or profile URL) ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let line = if editing {
        Line::from(vec![
            Span::styled(app.input.clone(), Style::default().fg(Color::White)),
            Span::styled("▏", Style::default().fg(Color::Yellow)),
        ])
    } else if app.input.is_empty() {
        Line::from(Span::styled(
            "press u to look up a user",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(Span::styled(
            app.input.clone(),
            Style::default().fg(Color::Cyan),
        ))
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let state = match &app.status {
        LoadStatus::Idle => Span::styled("idle", Style::default().fg(Color::DarkGray)),
        LoadStatus::Loading(query) => Span::styled(
            format!("loading {}...", query),
            Style::default().fg(Color::Yellow),
        ),
        LoadStatus::Loaded(query) => {
            Span::styled(format!("loaded {}", query), Style::default().fg(Color::Green))
        }
        LoadStatus::Failed(message) => Span::styled(
            message.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };

    let hints = match app.mode {
        InputMode::Normal => {
            " | q quit  u user  / search  tab focus  1-3 list  s/n/f/g sort  r reverse  o open"
        }
        InputMode::Query => " | enter load  esc cancel",
        InputMode::Search => " | enter keep  esc clear",
    };

    let line = Line::from(vec![
        state,
        Span::styled(hints, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
