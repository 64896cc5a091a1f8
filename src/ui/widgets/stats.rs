use crate::api::{FollowSnapshot, PageStats};
use crate::ui::widgets::{Pane, PanelData, pane_block, render_message};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::sync::Arc;

pub struct StatsPanel {
    title: String,
    snapshot: Option<Arc<FollowSnapshot>>,
    loading: bool,
    error: Option<String>,
}

impl StatsPanel {
    pub fn new() -> Self {
        Self {
            title: "Stats".to_string(),
            snapshot: None,
            loading: false,
            error: None,
        }
    }

    pub fn lines(&self) -> Vec<Line<'static>> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };
        let graph = &snapshot.graph;

        let count = |label: &str, value: usize, color: Color| {
            vec![
                Span::styled(format!("{}: ", label), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    value.to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
            ]
        };

        let mut counts = Vec::new();
        counts.extend(count("Followers", graph.followers.len(), Color::Red));
        counts.extend(count("Following", graph.followings.len(), Color::Cyan));
        counts.extend(count("Mutual", graph.mutual_follows.len(), Color::Blue));

        vec![
            Line::from(counts),
            pages_line("followers", snapshot.pages.followers),
            pages_line("following", snapshot.pages.followings),
        ]
    }
}

impl Default for StatsPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn pages_line(label: &str, stats: PageStats) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!("{} pages: {}", label, stats.pages_fetched),
        Style::default().fg(Color::DarkGray),
    )];
    if stats.truncated {
        spans.push(Span::styled(
            " (truncated)",
            Style::default().fg(Color::Yellow),
        ));
    }
    Line::from(spans)
}

impl Pane for StatsPanel {
    fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = pane_block(&self.title, focused);

        if self.loading {
            render_message(frame, area, block, "Loading...".to_string());
            return;
        }

        if let Some(ref error) = self.error {
            render_message(frame, area, block, format!("Error: {}", error));
            return;
        }

        if self.snapshot.is_none() {
            render_message(frame, area, block, "No data".to_string());
            return;
        }

        frame.render_widget(Paragraph::new(self.lines()).block(block), area);
    }

    fn update_data(&mut self, data: &PanelData) {
        self.loading = false;
        match data {
            PanelData::Loaded(snapshot) => {
                self.snapshot = Some(Arc::clone(snapshot));
                self.error = None;
            }
            PanelData::Error(e) => {
                self.snapshot = None;
                self.error = Some(e.clone());
            }
            PanelData::Loading => {
                self.snapshot = None;
                self.error = None;
                self.loading = true;
            }
        }
    }
}
