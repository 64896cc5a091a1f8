use super::{Canvas, LayoutNode, NodeSubject, Point, Role};
use crate::api::{CenterUser, Entity};
use crate::graph::FollowGraph;
use std::collections::HashSet;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// How ring radii derive from the canvas size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RingPolicy {
    /// `min(W, H) / 2 - margin` scaled by 0.85 (outer) and 0.45 (inner).
    Proportional { margin: f64 },
    /// `min(W, H) * 0.35` for the outer ring, 0.6 of that for the inner one.
    Simple,
}

impl RingPolicy {
    /// `(outer, inner)` radii.
    pub fn radii(&self, canvas: Canvas) -> (f64, f64) {
        let short_side = canvas.width.min(canvas.height);
        match *self {
            RingPolicy::Proportional { margin } => {
                let max_radius = (short_side / 2.0 - margin).max(0.0);
                (max_radius * 0.85, max_radius * 0.45)
            }
            RingPolicy::Simple => {
                let outer = short_side * 0.35;
                (outer, outer * 0.6)
            }
        }
    }
}

/// Places the queried user in the middle, followers on the outer ring and
/// the remaining followings on the inner ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialLayout {
    canvas: Canvas,
    rings: RingPolicy,
    inner_offset: bool,
}

impl RadialLayout {
    pub fn new(canvas: Canvas, rings: RingPolicy) -> Self {
        Self {
            canvas,
            rings,
            inner_offset: true,
        }
    }

    /// Rotate the inner ring by half a slot so it does not line up with the
    /// outer one.
    pub fn with_inner_offset(mut self, inner_offset: bool) -> Self {
        self.inner_offset = inner_offset;
        self
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    pub fn radii(&self) -> (f64, f64) {
        self.rings.radii(self.canvas)
    }

    pub fn from_graph(&self, center: &CenterUser, graph: &FollowGraph) -> Vec<LayoutNode> {
        let inner = graph.non_mutual_followings();
        self.initialize_nodes(center, &graph.followers, &inner, &graph.mutual_ids())
    }

    /// `outer` entries listed in `mutual_ids` are tagged [`Role::Mutual`].
    /// `inner` is expected to exclude mutual follows already on the outer ring.
    pub fn initialize_nodes(
        &self,
        center: &CenterUser,
        outer: &[Entity],
        inner: &[Entity],
        mutual_ids: &HashSet<u64>,
    ) -> Vec<LayoutNode> {
        let origin = self.canvas.center();
        let (outer_radius, inner_radius) = self.radii();
        let mut nodes = Vec::with_capacity(1 + outer.len() + inner.len());

        nodes.push(LayoutNode {
            id: format!("center-{}", center.id),
            position: origin,
            role: Role::Center,
            subject: NodeSubject::Center(center.clone()),
        });

        let n = outer.len();
        for (i, entity) in outer.iter().enumerate() {
            let role = if mutual_ids.contains(&entity.id) {
                Role::Mutual
            } else {
                Role::Follower
            };
            nodes.push(LayoutNode {
                id: format!("follower-{}", entity.id),
                position: ring_point(origin, outer_radius, i, n, 0.0),
                role,
                subject: NodeSubject::Account(entity.clone()),
            });
        }

        let n = inner.len();
        let offset = if self.inner_offset && n > 0 {
            PI / n as f64
        } else {
            0.0
        };
        for (i, entity) in inner.iter().enumerate() {
            nodes.push(LayoutNode {
                id: format!("following-{}", entity.id),
                position: ring_point(origin, inner_radius, i, n, offset),
                role: Role::Following,
                subject: NodeSubject::Account(entity.clone()),
            });
        }

        nodes
    }
}

/// Slot `i` of `n` on a ring, starting straight up.
fn ring_point(origin: Point, radius: f64, i: usize, n: usize, offset: f64) -> Point {
    let angle = (i as f64 / n as f64) * TAU - FRAC_PI_2 + offset;
    Point::new(
        origin.x + radius * angle.cos(),
        origin.y + radius * angle.sin(),
    )
}
