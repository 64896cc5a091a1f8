use crate::api::{Entity, SpoonClient};
use crate::config::LayoutConfig;
use crate::error::FetchError;
use crate::message::FetchMessage;
use crate::query::UserQuery;
use crate::ui::widgets::follows_table::{FollowsTable, SortKey, TableTab};
use crate::ui::widgets::graph_view::GraphView;
use crate::ui::widgets::profile::ProfilePanel;
use crate::ui::widgets::stats::StatsPanel;
use crate::ui::widgets::{Pane, PanelData};
use crate::ui;
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use futures::future::{AbortHandle, Aborted, abortable};
use ratatui::{Terminal, backend::Backend, layout::Rect};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const PROFILE_BASE: &str = "https://www.spooncast.net/jp";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Query,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Table,
    Graph,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Idle,
    Loading(String),
    Loaded(String),
    Failed(String),
}

pub struct App {
    client: Arc<SpoonClient>,
    pub(crate) profile: ProfilePanel,
    pub(crate) stats: StatsPanel,
    pub(crate) table: FollowsTable,
    pub(crate) graph: GraphView,
    pub(crate) focus: Focus,
    pub(crate) mode: InputMode,
    pub(crate) input: String,
    pub(crate) status: LoadStatus,
    current: Option<UserQuery>,
    request_id: u64,
    inflight: Option<AbortHandle>,
    tx: mpsc::UnboundedSender<FetchMessage>,
    rx: mpsc::UnboundedReceiver<FetchMessage>,
    area: Rect,
    should_quit: bool,
}

impl App {
    pub fn new(client: SpoonClient, layout: &LayoutConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            client: Arc::new(client),
            profile: ProfilePanel::new(),
            stats: StatsPanel::new(),
            table: FollowsTable::new(),
            graph: GraphView::new(layout.radial(), layout.drag_margin),
            focus: Focus::Table,
            mode: InputMode::Normal,
            input: String::new(),
            status: LoadStatus::Idle,
            current: None,
            request_id: 0,
            inflight: None,
            tx,
            rx,
            area: Rect::default(),
            should_quit: false,
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Parse `input` and start loading it. An unparseable query is reported in
    /// the status line and leaves the current graph alone.
    pub fn submit(&mut self, input: &str) {
        match UserQuery::parse(input) {
            Ok(query) => self.start_query(query),
            Err(e) => {
                warn!(input, error = %e, "rejected user query");
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    /// Cancel whatever is in flight, clear the panes and load `query` in the
    /// background.
    pub fn start_query(&mut self, query: UserQuery) {
        if let Some(handle) = self.inflight.take() {
            debug!(request_id = self.request_id, "aborting previous load");
            handle.abort();
        }

        self.request_id += 1;
        let request_id = self.request_id;
        info!(request_id, query = %query, "loading user");

        self.broadcast(PanelData::Loading);
        self.status = LoadStatus::Loading(query.to_string());
        self.current = Some(query.clone());

        let client = Arc::clone(&self.client);
        let tx = self.tx.clone();
        let (task, handle) = abortable(async move { client.load(&query).await });
        self.inflight = Some(handle);

        tokio::spawn(async move {
            let outcome = match task.await {
                Ok(result) => result,
                Err(Aborted) => Err(FetchError::Cancelled),
            };
            // The receiver only goes away when the app exits.
            let _ = tx.send(FetchMessage {
                request_id,
                outcome,
            });
        });
    }

    pub fn handle_message(&mut self, message: FetchMessage) {
        if message.request_id != self.request_id {
            debug!(
                request_id = message.request_id,
                current = self.request_id,
                "dropping stale result"
            );
            return;
        }
        self.inflight = None;
        let label = self
            .current
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();

        match message.outcome {
            Ok(snapshot) => {
                self.broadcast(PanelData::Loaded(Arc::new(snapshot)));
                self.status = LoadStatus::Loaded(label);
            }
            Err(FetchError::Cancelled) => {}
            Err(e) => {
                warn!(query = %label, error = %e, "load failed");
                self.broadcast(PanelData::Error(e.to_string()));
                self.status = LoadStatus::Failed(e.to_string());
            }
        }
    }

    fn broadcast(&mut self, data: PanelData) {
        self.profile.update_data(&data);
        self.stats.update_data(&data);
        self.table.update_data(&data);
        self.graph.update_data(&data);
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.rx.try_recv() {
            self.handle_message(message);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.mode {
            InputMode::Normal => self.handle_normal_key(key),
            InputMode::Query => self.handle_query_key(key),
            InputMode::Search => self.handle_search_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('u') => {
                self.mode = InputMode::Query;
                self.input.clear();
            }
            KeyCode::Char('/') => {
                self.mode = InputMode::Search;
                self.focus = Focus::Table;
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Table => Focus::Graph,
                    Focus::Graph => Focus::Table,
                };
            }
            KeyCode::Char('1') => self.table.set_tab(TableTab::Mutual),
            KeyCode::Char('2') => self.table.set_tab(TableTab::Followers),
            KeyCode::Char('3') => self.table.set_tab(TableTab::Followings),
            KeyCode::Char('s') => self.table.cycle_sort(),
            KeyCode::Char('r') => self.table.toggle_direction(),
            KeyCode::Char('n') => self.table.sort_by(SortKey::Nickname),
            KeyCode::Char('f') => self.table.sort_by(SortKey::FollowerCount),
            KeyCode::Char('g') => self.table.sort_by(SortKey::FollowingCount),
            KeyCode::Char('j') | KeyCode::Down => self.table.scroll_down(),
            KeyCode::Char('k') | KeyCode::Up => self.table.scroll_up(),
            KeyCode::Char('o') => self.open_selected(),
            KeyCode::Esc => self.table.clear_search(),
            _ => {}
        }
    }

    fn handle_query_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.mode = InputMode::Normal;
                let input = self.input.clone();
                self.submit(&input);
            }
            KeyCode::Esc => self.mode = InputMode::Normal,
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.mode = InputMode::Normal,
            KeyCode::Esc => {
                self.table.clear_search();
                self.mode = InputMode::Normal;
            }
            KeyCode::Backspace => self.table.pop_search_char(),
            KeyCode::Char(c) => self.table.push_search_char(c),
            _ => {}
        }
    }

    pub fn handle_mouse(&mut self, event: MouseEvent) {
        let areas = ui::areas(self.area);
        if let MouseEventKind::Down(MouseButton::Left) = event.kind {
            if contains(areas.graph, event.column, event.row) {
                self.focus = Focus::Graph;
            } else if contains(areas.table, event.column, event.row) {
                self.focus = Focus::Table;
            }
        }
        self.graph.handle_mouse(areas.graph, event);
    }

    /// Live page of the selected row, or of the loaded user when nothing is
    /// selected.
    pub fn selected_url(&self) -> Option<String> {
        if let Some(entity) = self.table.selected_entity() {
            return Some(entity_url(entity));
        }
        self.profile.center().map(|center| {
            if center.tag.is_empty() {
                format!("{}/profile/{}", PROFILE_BASE, center.id)
            } else {
                format!("{}/live/@{}", PROFILE_BASE, center.tag)
            }
        })
    }

    fn open_selected(&mut self) {
        let Some(url) = self.selected_url() else {
            return;
        };
        if let Err(e) = open::that(&url) {
            warn!(url = %url, error = %e, "failed to open browser");
            self.status = LoadStatus::Failed(format!("could not open {}", url));
        }
    }

    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        while !self.should_quit {
            let mut area = self.area;
            terminal.draw(|frame| {
                area = frame.area();
                ui::draw(frame, self);
            })?;
            self.area = area;

            self.drain_messages();

            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }
        }

        if let Some(handle) = self.inflight.take() {
            handle.abort();
        }
        Ok(())
    }
}

fn entity_url(entity: &Entity) -> String {
    if entity.tag.is_empty() {
        format!("{}/profile/{}", PROFILE_BASE, entity.id)
    } else {
        format!("{}/live/@{}", PROFILE_BASE, entity.tag)
    }
}

fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x && column < area.x + area.width && row >= area.y && row < area.y + area.height
}
