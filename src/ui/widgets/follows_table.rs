use crate::api::{Entity, FollowSnapshot};
use crate::graph::Relationship;
use crate::ui::widgets::{Pane, PanelData, pane_block, render_message};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Cell, Paragraph, Row, Table, TableState, Tabs},
};
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableTab {
    Mutual,
    Followers,
    Followings,
}

impl TableTab {
    pub const ALL: [TableTab; 3] = [TableTab::Mutual, TableTab::Followers, TableTab::Followings];

    fn label(self) -> &'static str {
        match self {
            TableTab::Mutual => "Mutual",
            TableTab::Followers => "Followers",
            TableTab::Followings => "Following",
        }
    }

    fn index(self) -> usize {
        match self {
            TableTab::Mutual => 0,
            TableTab::Followers => 1,
            TableTab::Followings => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Fetch order.
    Order,
    Nickname,
    FollowerCount,
    FollowingCount,
}

impl SortKey {
    fn next(self) -> Self {
        match self {
            SortKey::Order => SortKey::Nickname,
            SortKey::Nickname => SortKey::FollowerCount,
            SortKey::FollowerCount => SortKey::FollowingCount,
            SortKey::FollowingCount => SortKey::Order,
        }
    }

    fn label(self) -> &'static str {
        match self {
            SortKey::Order => "order",
            SortKey::Nickname => "name",
            SortKey::FollowerCount => "followers",
            SortKey::FollowingCount => "following",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

pub struct FollowsTable {
    title: String,
    snapshot: Option<Arc<FollowSnapshot>>,
    tab: TableTab,
    search: String,
    sort_key: SortKey,
    sort_dir: SortDir,
    table_state: TableState,
    loading: bool,
    error: Option<String>,
}

impl FollowsTable {
    pub fn new() -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));

        Self {
            title: "Follows".to_string(),
            snapshot: None,
            tab: TableTab::Mutual,
            search: String::new(),
            sort_key: SortKey::Order,
            sort_dir: SortDir::Asc,
            table_state,
            loading: false,
            error: None,
        }
    }

    pub fn set_tab(&mut self, tab: TableTab) {
        self.tab = tab;
        self.table_state.select(Some(0));
    }

    pub fn push_search_char(&mut self, c: char) {
        self.search.push(c);
        self.table_state.select(Some(0));
    }

    pub fn pop_search_char(&mut self) {
        self.search.pop();
        self.table_state.select(Some(0));
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.table_state.select(Some(0));
    }

    pub fn cycle_sort(&mut self) {
        self.sort_key = self.sort_key.next();
        self.sort_dir = SortDir::Asc;
    }

    /// Sorting by the active key again flips the direction.
    pub fn sort_by(&mut self, key: SortKey) {
        if key == self.sort_key {
            self.toggle_direction();
        } else {
            self.sort_key = key;
            self.sort_dir = SortDir::Asc;
        }
    }

    pub fn toggle_direction(&mut self) {
        self.sort_dir = match self.sort_dir {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        };
    }

    fn source_list(&self) -> &[Entity] {
        let Some(snapshot) = &self.snapshot else {
            return &[];
        };
        match self.tab {
            TableTab::Mutual => &snapshot.graph.mutual_follows,
            TableTab::Followers => &snapshot.graph.followers,
            TableTab::Followings => &snapshot.graph.followings,
        }
    }

    /// Rows of the active tab after search and sort.
    pub fn rows(&self) -> Vec<&Entity> {
        let needle = self.search.to_lowercase();
        let mut rows: Vec<&Entity> = self
            .source_list()
            .iter()
            .filter(|e| {
                needle.is_empty()
                    || e.nickname.to_lowercase().contains(&needle)
                    || e.tag.to_lowercase().contains(&needle)
            })
            .collect();

        let desc = self.sort_dir == SortDir::Desc;
        match self.sort_key {
            SortKey::Order => {
                if desc {
                    rows.reverse();
                }
            }
            // Ties keep fetch order in both directions.
            key => rows.sort_by(|a, b| {
                let ord = compare(key, a, b);
                if desc { ord.reverse() } else { ord }
            }),
        }
        rows
    }

    pub fn relationship(&self, entity: &Entity) -> Relationship {
        self.snapshot
            .as_ref()
            .map(|s| s.graph.relationship(entity.id))
            .unwrap_or(Relationship::None)
    }

    pub fn selected_entity(&self) -> Option<&Entity> {
        let idx = self.table_state.selected()?;
        self.rows().get(idx).copied()
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = TableTab::ALL
            .iter()
            .map(|tab| {
                let count = self
                    .snapshot
                    .as_ref()
                    .map(|s| match tab {
                        TableTab::Mutual => s.graph.mutual_follows.len(),
                        TableTab::Followers => s.graph.followers.len(),
                        TableTab::Followings => s.graph.followings.len(),
                    })
                    .unwrap_or(0);
                Line::from(format!("{} {}", tab.label(), count))
            })
            .collect();

        let tabs = Tabs::new(titles)
            .select(self.tab.index())
            .highlight_style(
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            );
        frame.render_widget(tabs, area);
    }

    fn render_controls(&self, frame: &mut Frame, area: Rect) {
        let arrow = match self.sort_dir {
            SortDir::Asc => "▲",
            SortDir::Desc => "▼",
        };
        let line = Line::from(vec![
            Span::styled("sort: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{} {}", self.sort_key.label(), arrow),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled("  search: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                if self.search.is_empty() {
                    "(name / @tag)".to_string()
                } else {
                    self.search.clone()
                },
                Style::default().fg(Color::White),
            ),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect, shown: usize) {
        let (followers, followings, mutual) = self
            .snapshot
            .as_ref()
            .map(|s| {
                (
                    s.graph.followers.len(),
                    s.graph.followings.len(),
                    s.graph.mutual_follows.len(),
                )
            })
            .unwrap_or((0, 0, 0));
        let footer = format!(
            "shown {} | followers {} | following {} | mutual {}",
            shown, followers, followings, mutual
        );
        frame.render_widget(
            Paragraph::new(footer).style(Style::default().fg(Color::DarkGray)),
            area,
        );
    }
}

fn compare(key: SortKey, a: &Entity, b: &Entity) -> Ordering {
    match key {
        SortKey::Order => Ordering::Equal,
        SortKey::Nickname => a.nickname.to_lowercase().cmp(&b.nickname.to_lowercase()),
        SortKey::FollowerCount => a.follower_count.cmp(&b.follower_count),
        SortKey::FollowingCount => a.following_count.cmp(&b.following_count),
    }
}

impl Default for FollowsTable {
    fn default() -> Self {
        Self::new()
    }
}

fn relationship_marker(relationship: Relationship) -> Span<'static> {
    match relationship {
        Relationship::Mutual => Span::styled("●", Style::default().fg(Color::Blue)),
        Relationship::Follower => Span::styled("●", Style::default().fg(Color::Red)),
        Relationship::Following => Span::styled("●", Style::default().fg(Color::Cyan)),
        Relationship::None => Span::styled("○", Style::default().fg(Color::DarkGray)),
    }
}

impl Pane for FollowsTable {
    fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let block = pane_block(&self.title, focused);

        if self.loading && self.snapshot.is_none() {
            render_message(frame, area, block, "Loading...".to_string());
            return;
        }

        if let Some(ref error) = self.error {
            render_message(frame, area, block, format!("Error: {}", error));
            return;
        }

        if self.snapshot.is_none() {
            render_message(frame, area, block, "No user loaded. Press u to search.".to_string());
            return;
        }

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(inner);

        self.render_tabs(frame, chunks[0]);
        self.render_controls(frame, chunks[1]);

        let rows = self.rows();
        let shown = rows.len();
        let header = Row::new(vec!["", "User", "Followers", "Following"]).style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

        let body: Vec<Row> = rows
            .into_iter()
            .map(|e| {
                let user = Line::from(vec![
                    Span::styled(e.nickname.clone(), Style::default().fg(Color::White)),
                    Span::styled(format!(" @{}", e.tag), Style::default().fg(Color::DarkGray)),
                ]);
                Row::new(vec![
                    Cell::from(relationship_marker(self.relationship(e))),
                    Cell::from(user),
                    Cell::from(e.follower_count.to_string()),
                    Cell::from(e.following_count.to_string()),
                ])
            })
            .collect();

        if body.is_empty() {
            frame.render_widget(
                Paragraph::new("No data").style(Style::default().fg(Color::DarkGray)),
                chunks[2],
            );
        } else {
            let table = Table::new(
                body,
                [
                    Constraint::Length(2),
                    Constraint::Min(12),
                    Constraint::Length(10),
                    Constraint::Length(10),
                ],
            )
            .header(header)
            .row_highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );

            let mut state = self.table_state.clone();
            frame.render_stateful_widget(table, chunks[2], &mut state);
        }

        self.render_footer(frame, chunks[3], shown);
    }

    fn update_data(&mut self, data: &PanelData) {
        self.loading = false;
        match data {
            PanelData::Loaded(snapshot) => {
                self.snapshot = Some(Arc::clone(snapshot));
                self.error = None;
                self.table_state.select(Some(0));
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

    fn scroll_up(&mut self) {
        if let Some(selected) = self.table_state.selected() {
            if selected > 0 {
                self.table_state.select(Some(selected - 1));
            }
        }
    }

    fn scroll_down(&mut self) {
        if let Some(selected) = self.table_state.selected() {
            if selected < self.rows().len().saturating_sub(1) {
                self.table_state.select(Some(selected + 1));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::PagesSummary;
    use crate::api::testing::entity;
    use crate::api::CenterUser;
    use crate::graph::FollowGraph;

    fn named(id: u64, nickname: &str, tag: &str, followers: u64) -> Entity {
        let mut e = entity(id);
        e.nickname = nickname.to_string();
        e.tag = tag.to_string();
        e.follower_count = followers;
        e
    }

    fn snapshot() -> Arc<FollowSnapshot> {
        let followers = vec![
            named(1, "Charlie", "charlie_c", 50),
            named(2, "alice", "al", 10),
            named(3, "Bob", "bobby", 30),
        ];
        let followings = vec![named(2, "alice", "al", 10), named(4, "Dave", "dave", 5)];
        Arc::new(FollowSnapshot {
            user_id: 123,
            center: CenterUser::placeholder(123),
            profile: None,
            channel: None,
            graph: FollowGraph::new(followers, followings),
            pages: PagesSummary::default(),
        })
    }

    fn loaded_table() -> FollowsTable {
        let mut table = FollowsTable::new();
        table.update_data(&PanelData::Loaded(snapshot()));
        table
    }

    fn ids(rows: &[&Entity]) -> Vec<u64> {
        rows.iter().map(|e| e.id).collect()
    }

    #[test]
    fn test_initial_state() {
        let table = FollowsTable::new();
        assert_eq!(table.tab, TableTab::Mutual);
        assert!(table.rows().is_empty());
        assert!(table.selected_entity().is_none());
    }

    #[test]
    fn test_tabs_select_lists() {
        let mut table = loaded_table();
        assert_eq!(ids(&table.rows()), vec![2]);
        table.set_tab(TableTab::Followers);
        assert_eq!(ids(&table.rows()), vec![1, 2, 3]);
        table.set_tab(TableTab::Followings);
        assert_eq!(ids(&table.rows()), vec![2, 4]);
    }

    #[test]
    fn test_search_matches_nickname_and_tag_case_insensitive() {
        let mut table = loaded_table();
        table.set_tab(TableTab::Followers);
        for c in "BOB".chars() {
            table.push_search_char(c);
        }
        assert_eq!(ids(&table.rows()), vec![3]);

        table.clear_search();
        table.push_search_char('_');
        assert_eq!(ids(&table.rows()), vec![1]);

        table.pop_search_char();
        assert_eq!(table.rows().len(), 3);
    }

    #[test]
    fn test_sort_keys_and_direction() {
        let mut table = loaded_table();
        table.set_tab(TableTab::Followers);

        table.sort_by(SortKey::Nickname);
        assert_eq!(ids(&table.rows()), vec![2, 3, 1]);

        table.sort_by(SortKey::Nickname);
        assert_eq!(ids(&table.rows()), vec![1, 3, 2]);

        table.sort_by(SortKey::FollowerCount);
        assert_eq!(ids(&table.rows()), vec![2, 3, 1]);
    }

    #[test]
    fn test_order_desc_reverses_fetch_order() {
        let mut table = loaded_table();
        table.set_tab(TableTab::Followers);
        table.toggle_direction();
        assert_eq!(ids(&table.rows()), vec![3, 2, 1]);
    }

    #[test]
    fn test_descending_sort_keeps_ties_in_fetch_order() {
        let followers: Vec<Entity> = [(1, 5), (2, 10), (3, 5), (4, 10)]
            .iter()
            .map(|&(id, count)| named(id, "same", "same", count))
            .collect();
        let mut table = FollowsTable::new();
        table.update_data(&PanelData::Loaded(Arc::new(FollowSnapshot {
            user_id: 123,
            center: CenterUser::placeholder(123),
            profile: None,
            channel: None,
            graph: FollowGraph::new(followers, Vec::new()),
            pages: PagesSummary::default(),
        })));
        table.set_tab(TableTab::Followers);

        table.sort_by(SortKey::FollowerCount);
        assert_eq!(ids(&table.rows()), vec![1, 3, 2, 4]);
        table.sort_by(SortKey::FollowerCount);
        assert_eq!(ids(&table.rows()), vec![2, 4, 1, 3]);

        table.sort_by(SortKey::Nickname);
        assert_eq!(ids(&table.rows()), vec![1, 2, 3, 4]);
        table.toggle_direction();
        assert_eq!(ids(&table.rows()), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_cycle_sort_wraps() {
        let mut table = FollowsTable::new();
        for _ in 0..4 {
            table.cycle_sort();
        }
        assert_eq!(table.sort_key, SortKey::Order);
        assert_eq!(table.sort_dir, SortDir::Asc);
    }

    #[test]
    fn test_relationship_markers() {
        let mut table = loaded_table();
        table.set_tab(TableTab::Followers);
        let rows = table.rows();
        let kinds: Vec<Relationship> = rows.iter().map(|e| table.relationship(e)).collect();
        assert_eq!(
            kinds,
            vec![
                Relationship::Follower,
                Relationship::Mutual,
                Relationship::Follower
            ]
        );
    }

    #[test]
    fn test_scroll_and_selection() {
        let mut table = loaded_table();
        table.set_tab(TableTab::Followers);
        assert_eq!(table.selected_entity().map(|e| e.id), Some(1));
        table.scroll_down();
        table.scroll_down();
        table.scroll_down();
        assert_eq!(table.selected_entity().map(|e| e.id), Some(3));
        table.scroll_up();
        assert_eq!(table.selected_entity().map(|e| e.id), Some(2));
    }

    #[test]
    fn test_loading_and_error_clear_previous_data() {
        let mut table = loaded_table();
        table.update_data(&PanelData::Loading);
        assert!(table.loading);
        assert!(table.rows().is_empty());

        table.update_data(&PanelData::Loaded(snapshot()));
        table.update_data(&PanelData::Error("boom".to_string()));
        assert_eq!(table.error.as_deref(), Some("boom"));
        assert!(table.rows().is_empty());
        assert!(!table.loading);
    }
}
