//! Pure coordinate computation for the follow diagram. Nothing here knows how
//! nodes are drawn.

pub mod drag;
pub mod edges;
pub mod radial;

pub use drag::{DragState, GraphScene};
pub use edges::{connection_line, ConnectionLine};
pub use radial::{RadialLayout, RingPolicy};

use crate::api::{CenterUser, Entity};
use std::ops::{Add, Sub};

/// Space kept between the canvas edge and the outer ring.
pub const RING_MARGIN: f64 = 80.0;
/// Space a dragged node must keep from the canvas edge.
pub const DRAG_MARGIN: f64 = 50.0;
pub const CENTER_RADIUS: f64 = 20.0;
pub const NODE_RADIUS: f64 = 12.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Keep `p` at least `margin` away from every edge. On a canvas smaller
    /// than twice the margin both axes collapse to `margin`.
    pub fn clamp(&self, p: Point, margin: f64) -> Point {
        Point::new(
            p.x.min(self.width - margin).max(margin),
            p.y.min(self.height - margin).max(margin),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Center,
    Follower,
    Following,
    Mutual,
}

impl Role {
    pub fn radius(self) -> f64 {
        match self {
            Role::Center => CENTER_RADIUS,
            _ => NODE_RADIUS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeSubject {
    Center(CenterUser),
    Account(Entity),
}

impl NodeSubject {
    pub fn nickname(&self) -> &str {
        match self {
            NodeSubject::Center(user) => &user.nickname,
            NodeSubject::Account(entity) => &entity.nickname,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub position: Point,
    pub role: Role,
    pub subject: NodeSubject,
}
