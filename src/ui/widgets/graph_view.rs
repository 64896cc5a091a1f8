use crate::layout::{GraphScene, NODE_RADIUS, Point, RadialLayout, Role};
use crate::ui::widgets::{Pane, PanelData, pane_block, render_message};
use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    symbols::Marker,
    text::Span,
    widgets::canvas::{Canvas, Circle, Line as CanvasLine},
};

/// Above this many nodes only the centre and the dragged node are labelled.
const LABEL_LIMIT: usize = 24;
const LABEL_CHARS: usize = 12;

pub fn role_color(role: Role) -> Color {
    match role {
        Role::Center => Color::Magenta,
        Role::Mutual => Color::Blue,
        Role::Follower => Color::Red,
        Role::Following => Color::Cyan,
    }
}

pub struct GraphView {
    title: String,
    layout: RadialLayout,
    drag_margin: f64,
    scene: Option<GraphScene>,
    loading: bool,
    error: Option<String>,
}

impl GraphView {
    pub fn new(layout: RadialLayout, drag_margin: f64) -> Self {
        Self {
            title: "Graph".to_string(),
            layout,
            drag_margin,
            scene: None,
            loading: false,
            error: None,
        }
    }

    pub fn scene(&self) -> Option<&GraphScene> {
        self.scene.as_ref()
    }

    fn inner(area: Rect) -> Rect {
        pane_block("", false).inner(area)
    }

    /// Canvas coordinates of the middle of terminal cell `(column, row)`.
    /// Cells outside `area` still map, so a drag can run past the border.
    pub fn cell_to_canvas(&self, area: Rect, column: u16, row: u16) -> Option<Point> {
        let inner = Self::inner(area);
        if inner.width == 0 || inner.height == 0 {
            return None;
        }
        let canvas = self.layout.canvas();
        let col = f64::from(column) - f64::from(inner.x) + 0.5;
        let row = f64::from(row) - f64::from(inner.y) + 0.5;
        Some(Point::new(
            col * canvas.width / f64::from(inner.width),
            row * canvas.height / f64::from(inner.height),
        ))
    }

    /// A click must land within one cell of a node to grab it.
    pub fn hit_radius(&self, area: Rect) -> f64 {
        let inner = Self::inner(area);
        let canvas = self.layout.canvas();
        let cell_w = canvas.width / f64::from(inner.width.max(1));
        let cell_h = canvas.height / f64::from(inner.height.max(1));
        NODE_RADIUS.max(cell_w).max(cell_h)
    }

    fn contains(area: Rect, column: u16, row: u16) -> bool {
        let inner = Self::inner(area);
        column >= inner.x
            && column < inner.x + inner.width
            && row >= inner.y
            && row < inner.y + inner.height
    }

    /// Feed a left-button mouse event into the drag session. Returns true when
    /// the scene changed or a drag started or ended.
    pub fn handle_mouse(&mut self, area: Rect, event: MouseEvent) -> bool {
        let hit_radius = self.hit_radius(area);
        let Some(pointer) = self.cell_to_canvas(area, event.column, event.row) else {
            return false;
        };
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !Self::contains(area, event.column, event.row) {
                    return false;
                }
                let Some(id) = scene.node_at(pointer, hit_radius).map(|n| n.id.clone()) else {
                    return false;
                };
                scene.pointer_down(&id, pointer)
            }
            MouseEventKind::Drag(MouseButton::Left) => scene.pointer_move(pointer).is_some(),
            MouseEventKind::Up(MouseButton::Left) => scene.pointer_up().is_some(),
            _ => false,
        }
    }
}

impl Pane for GraphView {
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

        let Some(scene) = &self.scene else {
            render_message(frame, area, block, "No graph".to_string());
            return;
        };

        let canvas = scene.canvas();
        let height = canvas.height;
        let lines = scene.connections();
        let dragged = scene.drag_state().node_id();
        let show_all_labels = scene.nodes().len() <= LABEL_LIMIT;

        let labels: Vec<(Point, String, Color)> = scene
            .nodes()
            .iter()
            .filter(|n| {
                show_all_labels || n.role == Role::Center || Some(n.id.as_str()) == dragged
            })
            .map(|n| {
                let label: String = n.subject.nickname().chars().take(LABEL_CHARS).collect();
                (n.position, label, role_color(n.role))
            })
            .collect();

        // Layout coordinates grow downwards, canvas coordinates grow upwards.
        let widget = Canvas::default()
            .block(block)
            .marker(Marker::Braille)
            .x_bounds([0.0, canvas.width])
            .y_bounds([0.0, height])
            .paint(|ctx| {
                for line in &lines {
                    let end = line.end();
                    ctx.draw(&CanvasLine::new(
                        line.start.x,
                        height - line.start.y,
                        end.x,
                        height - end.y,
                        Color::DarkGray,
                    ));
                }
                ctx.layer();
                for node in scene.nodes() {
                    ctx.draw(&Circle {
                        x: node.position.x,
                        y: height - node.position.y,
                        radius: node.role.radius(),
                        color: role_color(node.role),
                    });
                }
                ctx.layer();
                for (position, label, color) in &labels {
                    ctx.print(
                        position.x,
                        height - position.y,
                        Span::styled(label.clone(), Style::default().fg(*color)),
                    );
                }
            });

        frame.render_widget(widget, area);
    }

    fn update_data(&mut self, data: &PanelData) {
        self.loading = false;
        match data {
            PanelData::Loaded(snapshot) => {
                let nodes = self.layout.from_graph(&snapshot.center, &snapshot.graph);
                match self.scene.as_mut() {
                    Some(scene) => scene.rebuild(nodes),
                    None => {
                        self.scene = Some(
                            GraphScene::new(self.layout.canvas(), nodes)
                                .with_drag_margin(self.drag_margin),
                        )
                    }
                }
                self.error = None;
            }
            PanelData::Error(e) => {
                self.scene = None;
                self.error = Some(e.clone());
            }
            PanelData::Loading => {
                self.scene = None;
                self.error = None;
                self.loading = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::PagesSummary;
    use crate::api::testing::entity;
    use crate::api::{CenterUser, FollowSnapshot};
    use crate::graph::FollowGraph;
    use crate::layout::{Canvas, DRAG_MARGIN, RingPolicy};
    use crossterm::event::KeyModifiers;
    use ratatui::{Terminal, backend::TestBackend};
    use std::sync::Arc;

    // 70x35 inner cells over a 700x700 canvas: 10 units per column, 20 per row.
    const AREA: Rect = Rect {
        x: 0,
        y: 0,
        width: 72,
        height: 37,
    };

    fn view() -> GraphView {
        let layout = RadialLayout::new(
            Canvas::new(700.0, 700.0),
            RingPolicy::Proportional { margin: 80.0 },
        );
        let mut view = GraphView::new(layout, DRAG_MARGIN);
        view.update_data(&PanelData::Loaded(Arc::new(FollowSnapshot {
            user_id: 123,
            center: CenterUser::placeholder(123),
            profile: None,
            channel: None,
            graph: FollowGraph::new(vec![entity(1), entity(2)], vec![entity(2), entity(3)]),
            pages: PagesSummary::default(),
        })));
        view
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn center_position(view: &GraphView) -> Point {
        view.scene().unwrap().node("center-123").unwrap().position
    }

    #[test]
    fn test_cell_to_canvas() {
        let view = view();
        assert_eq!(view.cell_to_canvas(AREA, 1, 1), Some(Point::new(5.0, 10.0)));
        assert_eq!(
            view.cell_to_canvas(AREA, 36, 18),
            Some(Point::new(355.0, 350.0))
        );
        assert!(view.cell_to_canvas(Rect::new(0, 0, 2, 2), 0, 0).is_none());
    }

    #[test]
    fn test_hit_radius_covers_a_cell() {
        let view = view();
        assert_eq!(view.hit_radius(AREA), 20.0);
    }

    #[test]
    fn test_mouse_drag_moves_center() {
        let mut view = view();
        assert!(view.handle_mouse(AREA, mouse(MouseEventKind::Down(MouseButton::Left), 36, 18)));
        assert!(view.handle_mouse(AREA, mouse(MouseEventKind::Drag(MouseButton::Left), 46, 18)));
        assert_eq!(center_position(&view), Point::new(450.0, 350.0));

        assert!(view.handle_mouse(AREA, mouse(MouseEventKind::Up(MouseButton::Left), 46, 18)));
        assert!(!view.handle_mouse(AREA, mouse(MouseEventKind::Drag(MouseButton::Left), 60, 18)));
        assert_eq!(center_position(&view), Point::new(450.0, 350.0));
    }

    #[test]
    fn test_drag_past_border_is_clamped() {
        let mut view = view();
        view.handle_mouse(AREA, mouse(MouseEventKind::Down(MouseButton::Left), 36, 18));
        view.handle_mouse(AREA, mouse(MouseEventKind::Drag(MouseButton::Left), 200, 0));
        assert_eq!(center_position(&view), Point::new(650.0, 50.0));
    }

    #[test]
    fn test_click_on_empty_space_ignored() {
        let mut view = view();
        assert!(!view.handle_mouse(AREA, mouse(MouseEventKind::Down(MouseButton::Left), 1, 1)));
        assert!(!view.handle_mouse(AREA, mouse(MouseEventKind::Down(MouseButton::Right), 36, 18)));
        assert!(!view.scene().unwrap().drag_state().is_dragging());
    }

    #[test]
    fn test_reload_resets_positions() {
        let mut view = view();
        view.handle_mouse(AREA, mouse(MouseEventKind::Down(MouseButton::Left), 36, 18));
        view.handle_mouse(AREA, mouse(MouseEventKind::Drag(MouseButton::Left), 46, 18));

        view.update_data(&PanelData::Loaded(Arc::new(FollowSnapshot {
            user_id: 123,
            center: CenterUser::placeholder(123),
            profile: None,
            channel: None,
            graph: FollowGraph::default(),
            pages: PagesSummary::default(),
        })));
        assert_eq!(center_position(&view), Point::new(350.0, 350.0));
        assert_eq!(view.scene().unwrap().nodes().len(), 1);
    }

    #[test]
    fn test_error_drops_scene() {
        let mut view = view();
        view.update_data(&PanelData::Error("HTTP 500".to_string()));
        assert!(view.scene().is_none());
        assert!(!view.handle_mouse(AREA, mouse(MouseEventKind::Down(MouseButton::Left), 36, 18)));
    }

    #[test]
    fn test_render_smoke() {
        let view = view();
        let mut terminal = Terminal::new(TestBackend::new(AREA.width, AREA.height)).unwrap();
        terminal
            .draw(|frame| view.render(frame, frame.area(), true))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let rendered: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(rendered.contains("Graph"));
        assert!(rendered.contains("User 123"));
    }
}
