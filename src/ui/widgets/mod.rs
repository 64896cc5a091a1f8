pub mod follows_table;
pub mod graph_view;
pub mod profile;
pub mod stats;

use crate::api::FollowSnapshot;
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem},
};
use std::sync::Arc;

/// What a pane is told whenever the loaded graph changes.
#[derive(Debug, Clone)]
pub enum PanelData {
    Loading,
    Loaded(Arc<FollowSnapshot>),
    Error(String),
}

pub trait Pane {
    fn render(&self, frame: &mut Frame, area: Rect, focused: bool);

    fn update_data(&mut self, data: &PanelData);

    fn scroll_up(&mut self) {}

    fn scroll_down(&mut self) {}
}

pub(crate) fn pane_block(title: &str, focused: bool) -> Block<'static> {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::White)
    };

    Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Single-line placeholder used for loading, error and empty states.
pub(crate) fn render_message(frame: &mut Frame, area: Rect, block: Block<'static>, message: String) {
    let list = List::new(vec![ListItem::new(message)]).block(block);
    frame.render_widget(list, area);
}
