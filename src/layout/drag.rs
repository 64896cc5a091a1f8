use super::edges::{connection_line, ConnectionLine};
use super::{Canvas, LayoutNode, Point, Role, DRAG_MARGIN};
use tracing::debug;

/// Pointer drag session. At most one node is dragged at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        node_id: String,
        /// Pointer position relative to the node when the drag started.
        offset: Point,
    },
}

impl DragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, DragState::Dragging { .. })
    }

    pub fn node_id(&self) -> Option<&str> {
        match self {
            DragState::Dragging { node_id, .. } => Some(node_id),
            DragState::Idle => None,
        }
    }
}

/// Node positions plus the drag session that may move them. Owns the only
/// writable copy of the positions.
#[derive(Debug, Clone)]
pub struct GraphScene {
    canvas: Canvas,
    nodes: Vec<LayoutNode>,
    drag: DragState,
    drag_margin: f64,
}

impl GraphScene {
    pub fn new(canvas: Canvas, nodes: Vec<LayoutNode>) -> Self {
        Self {
            canvas,
            nodes,
            drag: DragState::Idle,
            drag_margin: DRAG_MARGIN,
        }
    }

    pub fn with_drag_margin(mut self, margin: f64) -> Self {
        self.drag_margin = margin;
        self
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Replace every node with a fresh layout. Ends any drag in progress.
    pub fn rebuild(&mut self, nodes: Vec<LayoutNode>) {
        self.drag = DragState::Idle;
        self.nodes = nodes;
    }

    /// Closest node whose centre lies within `hit_radius` of `pointer`.
    pub fn node_at(&self, pointer: Point, hit_radius: f64) -> Option<&LayoutNode> {
        self.nodes
            .iter()
            .map(|n| (n, n.position.distance(pointer)))
            .filter(|(_, d)| *d <= hit_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(n, _)| n)
    }

    /// Start dragging `node_id`. Refused while another drag is active or when
    /// the node does not exist.
    pub fn pointer_down(&mut self, node_id: &str, pointer: Point) -> bool {
        if self.drag.is_dragging() {
            return false;
        }
        let Some(node) = self.node(node_id) else {
            return false;
        };

        let offset = pointer - node.position;
        self.drag = DragState::Dragging {
            node_id: node_id.to_string(),
            offset,
        };
        debug!(node = node_id, "drag started");
        true
    }

    /// Move the dragged node under the pointer, kept inside the canvas margin.
    /// Returns the node's new position, or `None` when nothing is dragged.
    pub fn pointer_move(&mut self, pointer: Point) -> Option<Point> {
        let DragState::Dragging { node_id, offset } = &self.drag else {
            return None;
        };

        let target = self.canvas.clamp(pointer - *offset, self.drag_margin);
        let node = self.nodes.iter_mut().find(|n| &n.id == node_id)?;
        node.position = target;
        Some(target)
    }

    /// End the drag session, returning the id of the node that was dragged.
    pub fn pointer_up(&mut self) -> Option<String> {
        match std::mem::take(&mut self.drag) {
            DragState::Dragging { node_id, .. } => {
                debug!(node = %node_id, "drag ended");
                Some(node_id)
            }
            DragState::Idle => None,
        }
    }

    /// One line from the centre node's edge to every other node's edge.
    pub fn connections(&self) -> Vec<ConnectionLine> {
        let Some(center) = self.nodes.iter().find(|n| n.role == Role::Center) else {
            return Vec::new();
        };

        self.nodes
            .iter()
            .filter(|n| n.role != Role::Center)
            .map(|n| {
                connection_line(
                    center.position,
                    n.position,
                    Role::Center.radius(),
                    n.role.radius(),
                    n.role,
                )
            })
            .collect()
    }
}
