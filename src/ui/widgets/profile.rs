use crate::api::{CenterUser, ChannelInfo, Entity, FollowSnapshot};
use crate::ui::widgets::{Pane, PanelData, pane_block, render_message};
use chrono::{DateTime, Utc};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::sync::Arc;

pub struct ProfilePanel {
    title: String,
    snapshot: Option<Arc<FollowSnapshot>>,
    loading: bool,
    error: Option<String>,
}

impl ProfilePanel {
    pub fn new() -> Self {
        Self {
            title: "Profile".to_string(),
            snapshot: None,
            loading: false,
            error: None,
        }
    }

    pub fn center(&self) -> Option<&CenterUser> {
        self.snapshot.as_ref().map(|s| &s.center)
    }

    /// Profile body wrapped to `width` columns, followed by live and schedule info.
    pub fn lines(&self, width: usize) -> Vec<Line<'static>> {
        let Some(snapshot) = &self.snapshot else {
            return Vec::new();
        };
        let center = &snapshot.center;

        let mut lines = vec![Line::from(vec![
            Span::styled(
                center.nickname.clone(),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" @{}", center.tag), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("  #{}", center.id), Style::default().fg(Color::DarkGray)),
        ])];

        match &snapshot.profile {
            Some(profile) => lines.extend(profile_lines(profile, width)),
            None => lines.push(Line::from(Span::styled(
                "Profile unavailable",
                Style::default().fg(Color::DarkGray),
            ))),
        }

        let last_live_at = snapshot
            .profile
            .as_ref()
            .and_then(|p| p.last_live_at.as_deref());
        lines.extend(channel_lines(snapshot.channel.as_ref(), last_live_at));
        lines
    }
}

impl Default for ProfilePanel {
    fn default() -> Self {
        Self::new()
    }
}

fn profile_lines(profile: &Entity, width: usize) -> Vec<Line<'static>> {
    let mut flags = Vec::new();
    if profile.is_verified {
        flags.push(Span::styled("✔ verified  ", Style::default().fg(Color::Green)));
    }
    if profile.is_live == Some(true) {
        flags.push(Span::styled(
            "● LIVE  ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    if let Some(joined) = profile.date_joined.as_deref() {
        flags.push(Span::styled(
            format!("joined {}", format_date(joined)),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{} followers", profile.follower_count),
            Style::default().fg(Color::Red),
        ),
        Span::raw("  "),
        Span::styled(
            format!("{} following", profile.following_count),
            Style::default().fg(Color::Cyan),
        ),
    ])];

    if !flags.is_empty() {
        lines.push(Line::from(flags));
    }

    if !profile.description.is_empty() {
        lines.push(Line::default());
        for wrapped in textwrap::wrap(&profile.description, width.max(10)) {
            lines.push(Line::from(Span::styled(
                wrapped.into_owned(),
                Style::default().fg(Color::White),
            )));
        }
    }
    lines
}

const MAX_SCHEDULES: usize = 3;

fn channel_lines(channel: Option<&ChannelInfo>, last_live_at: Option<&str>) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    if let Some(url) = channel.and_then(ChannelInfo::live_url) {
        lines.push(Line::from(vec![
            Span::styled(
                "● on air ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(url, Style::default().fg(Color::Cyan)),
        ]));
    }

    // The channel's latest cast wins over the profile timestamp.
    let recent = channel.and_then(|c| c.recent_live.as_ref());
    let last_live = match (recent, last_live_at) {
        (Some(live), _) => Some(format!(
            "last live {}  {}",
            format_time(&live.created),
            live.title
        )),
        (None, Some(at)) => Some(format!("last live {}", format_time(at))),
        (None, None) => None,
    };
    if let Some(text) = last_live {
        lines.push(Line::from(Span::styled(
            text,
            Style::default().fg(Color::DarkGray),
        )));
    }

    let schedules = channel.map(|c| c.schedules.as_slice()).unwrap_or_default();
    if !schedules.is_empty() {
        lines.push(Line::from(Span::styled(
            "Schedule",
            Style::default().fg(Color::Yellow),
        )));
        for schedule in schedules.iter().take(MAX_SCHEDULES) {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {}  ", format_time(&schedule.schedule_date)),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(schedule.title.clone()),
            ]));
        }
    }

    if !lines.is_empty() {
        lines.insert(0, Line::default());
    }
    lines
}

/// `2021-03-04T05:06:07Z` becomes `2021-03-04`; anything unparseable is
/// shown as-is.
fn format_date(raw: &str) -> String {
    format_rfc3339(raw, "%Y-%m-%d")
}

fn format_time(raw: &str) -> String {
    format_rfc3339(raw, "%Y-%m-%d %H:%M")
}

fn format_rfc3339(raw: &str, fmt: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).format(fmt).to_string())
        .unwrap_or_else(|_| raw.to_string())
}

impl Pane for ProfilePanel {
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
            render_message(frame, area, block, "No user loaded".to_string());
            return;
        }

        let width = block.inner(area).width as usize;
        frame.render_widget(Paragraph::new(self.lines(width)).block(block), area);
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
