use super::{Point, Role};

/// A connector stored the way a renderer places it: an origin, a length and
/// a rotation in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionLine {
    pub start: Point,
    pub length: f64,
    pub angle_deg: f64,
    pub role: Role,
}

impl ConnectionLine {
    pub fn end(&self) -> Point {
        let angle = self.angle_deg.to_radians();
        Point::new(
            self.start.x + self.length * angle.cos(),
            self.start.y + self.length * angle.sin(),
        )
    }
}

/// Segment from the edge of the circle at `from` to the edge of the circle
/// at `to`, rather than centre to centre.
pub fn connection_line(
    from: Point,
    to: Point,
    start_inset: f64,
    end_inset: f64,
    role: Role,
) -> ConnectionLine {
    let angle = (to.y - from.y).atan2(to.x - from.x);
    let (sin, cos) = angle.sin_cos();

    let start = Point::new(from.x + cos * start_inset, from.y + sin * start_inset);
    let end = Point::new(to.x - cos * end_inset, to.y - sin * end_inset);

    ConnectionLine {
        start,
        length: start.distance(end),
        angle_deg: angle.to_degrees(),
        role,
    }
}
