use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchors {
    pub source: Side,
    pub target: Side,
}

/// Picks the attachment sides for an edge from `source` to `target`.
///
/// Horizontally dominant pairs connect left/right, everything else connects
/// top/bottom. `|dx| == |dy|` takes the vertical branch. The target side is
/// always the opposite of the source side.
pub fn route(source: Point, target: Point) -> Anchors {
    let dx = target.x - source.x;
    let dy = target.y - source.y;

    let source_side = if dx.abs() > dy.abs() {
        if dx > 0.0 { Side::Right } else { Side::Left }
    } else if dy > 0.0 {
        Side::Bottom
    } else {
        Side::Top
    };

    Anchors {
        source: source_side,
        target: source_side.opposite(),
    }
}

/// Endpoints of a floating edge between two circular nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EdgeParams {
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl EdgeParams {
    pub fn start(&self) -> Point {
        Point::new(self.sx, self.sy)
    }

    pub fn end(&self) -> Point {
        Point::new(self.tx, self.ty)
    }
}

/// Projects the centre-to-centre line onto the border of each node, so the
/// edge starts and ends where it crosses the circles instead of at the
/// centres.
pub fn floating_endpoints(
    source: Point,
    source_radius: f64,
    target: Point,
    target_radius: f64,
) -> EdgeParams {
    let start = border_point(source, source_radius, target);
    let end = border_point(target, target_radius, source);
    EdgeParams {
        sx: start.x,
        sy: start.y,
        tx: end.x,
        ty: end.y,
    }
}

fn border_point(center: Point, radius: f64, toward: Point) -> Point {
    let angle = (toward.y - center.y).atan2(toward.x - center.x);
    Point {
        x: center.x + radius * angle.cos(),
        y: center.y + radius * angle.sin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn horizontal_routes() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(800.0, -250.0);
        assert_eq!(
            route(a, b),
            Anchors {
                source: Side::Right,
                target: Side::Left
            }
        );
        assert_eq!(
            route(b, a),
            Anchors {
                source: Side::Left,
                target: Side::Right
            }
        );
    }

    #[test]
    fn vertical_routes() {
        let top = Point::new(800.0, -250.0);
        let bottom = Point::new(800.0, 250.0);
        assert_eq!(route(top, bottom).source, Side::Bottom);
        assert_eq!(route(bottom, top).source, Side::Top);
    }

    #[test]
    fn ties_take_the_vertical_branch() {
        let anchors = route(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        assert_eq!(anchors.source, Side::Bottom);
        assert_eq!(anchors.target, Side::Top);

        let same = route(Point::new(5.0, 5.0), Point::new(5.0, 5.0));
        assert_eq!(same.source, Side::Top);
        assert_eq!(same.target, Side::Bottom);
    }

    #[test]
    fn target_side_is_always_opposite() {
        let points = [
            Point::new(0.0, 0.0),
            Point::new(800.0, -250.0),
            Point::new(-30.0, 400.0),
            Point::new(12.0, -12.0),
            Point::new(-600.0, 10.0),
        ];
        for &a in &points {
            for &b in &points {
                let anchors = route(a, b);
                assert_eq!(anchors.target, anchors.source.opposite());
            }
        }
    }

    #[test]
    fn floating_endpoints_sit_on_the_border() {
        let params = floating_endpoints(Point::new(0.0, 0.0), 50.0, Point::new(300.0, 0.0), 25.0);
        assert!(close(params.sx, 50.0) && close(params.sy, 0.0));
        assert!(close(params.tx, 275.0) && close(params.ty, 0.0));

        let diagonal = floating_endpoints(Point::new(0.0, 0.0), 10.0, Point::new(30.0, 40.0), 10.0);
        assert!(close(diagonal.sx, 6.0) && close(diagonal.sy, 8.0));
        assert!(close(diagonal.tx, 24.0) && close(diagonal.ty, 32.0));
    }
}
