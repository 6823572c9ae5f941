use crate::chart::{ScreenPoint, Viewport};

/// Where the infinite line through `a` and `b` crosses a viewport edge.
///
/// `t` is the line parameter: 0 at `a`, 1 at `b`, negative behind `a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeHit {
    pub point: ScreenPoint,
    pub t: f64,
}

/// Distance from `p` to the segment `a`-`b` via clamped projection.
pub fn point_to_segment_distance(p: ScreenPoint, a: ScreenPoint, b: ScreenPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(ScreenPoint::new(a.x + t * dx, a.y + t * dy))
}

/// Up to four crossings of the line through `a` and `b` with the viewport
/// edges, checked left, right, top, bottom. Corners may appear twice.
pub fn line_edge_intersections(a: ScreenPoint, b: ScreenPoint, viewport: Viewport) -> Vec<EdgeHit> {
    let (w, h) = (viewport.width, viewport.height);
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let mut hits = Vec::with_capacity(4);

    if dx != 0.0 {
        for edge_x in [0.0, w] {
            let t = (edge_x - a.x) / dx;
            let y = a.y + t * dy;
            if (0.0..=h).contains(&y) {
                hits.push(EdgeHit {
                    point: ScreenPoint::new(edge_x, y),
                    t,
                });
            }
        }
    }
    if dy != 0.0 {
        for edge_y in [0.0, h] {
            let t = (edge_y - a.y) / dy;
            let x = a.x + t * dx;
            if (0.0..=w).contains(&x) {
                hits.push(EdgeHit {
                    point: ScreenPoint::new(x, edge_y),
                    t,
                });
            }
        }
    }
    hits
}

/// The edge hit farthest ahead of `a` in the direction of `b`.
pub fn farthest_forward(hits: &[EdgeHit]) -> Option<ScreenPoint> {
    hits.iter()
        .filter(|hit| hit.t > 0.0)
        .max_by(|l, r| l.t.total_cmp(&r.t))
        .map(|hit| hit.point)
}

/// The edge hit farthest behind `a`.
pub fn farthest_backward(hits: &[EdgeHit]) -> Option<ScreenPoint> {
    hits.iter()
        .filter(|hit| hit.t < 0.0)
        .min_by(|l, r| l.t.total_cmp(&r.t))
        .map(|hit| hit.point)
}

/// Angle of `a`→`b` in degrees, counter-clockwise positive on screen.
pub fn compute_angle(a: ScreenPoint, b: ScreenPoint) -> f64 {
    (-(b.y - a.y)).atan2(b.x - a.x).to_degrees()
}
