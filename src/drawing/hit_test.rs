use crate::chart::ScreenPoint;
use crate::drawing::geometry::point_to_segment_distance;
use crate::drawing::types::{Drawing, DrawingId, DrawingKind, ScreenAnchors};

/// Which part of the selected drawing a pointer-down grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragHandle {
    A,
    B,
    Body,
}

/// An in-progress drag, captured at pointer-down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    pub drawing: DrawingId,
    pub handle: DragHandle,
    pub start: ScreenPoint,
    /// Screen anchors of the drawing when the drag started.
    pub origin: ScreenAnchors,
}

/// Pixel distance from `p` to a drawing's body, or `None` when point A is
/// not on screen.
pub fn distance(kind: DrawingKind, screen: &ScreenAnchors, p: ScreenPoint) -> Option<f64> {
    let a = screen.a?;
    let dist = match kind {
        DrawingKind::HorizontalLine => (p.y - a.y).abs(),
        DrawingKind::VerticalLine => (p.x - a.x).abs(),
        DrawingKind::CrossLine => (p.y - a.y).abs().min((p.x - a.x).abs()),
        DrawingKind::HorizontalRay => {
            if p.x >= a.x {
                (p.y - a.y).abs()
            } else {
                p.distance_to(a)
            }
        }
        DrawingKind::TrendLine
        | DrawingKind::Ray
        | DrawingKind::InfoLine
        | DrawingKind::ExtendedLine
        | DrawingKind::TrendAngle => match screen.b {
            Some(b) => point_to_segment_distance(p, a, b),
            None => f64::INFINITY,
        },
    };
    Some(dist)
}

/// The drawing nearest to `p` strictly within `threshold`. Ties keep the
/// earliest drawing.
pub fn nearest<'a>(
    drawings: impl IntoIterator<Item = &'a Drawing>,
    p: ScreenPoint,
    threshold: f64,
) -> Option<DrawingId> {
    let mut best = threshold;
    let mut best_id = None;
    for drawing in drawings {
        let Some(dist) = distance(drawing.kind, &drawing.screen, p) else {
            continue;
        };
        if dist < best {
            best = dist;
            best_id = Some(drawing.id);
        }
    }
    best_id
}

/// Classify a pointer-down on `drawing`.
///
/// Endpoint B wins over A when both are within `handle_radius`; the body is
/// only considered when neither endpoint matched.
pub fn grab(
    drawing: &Drawing,
    p: ScreenPoint,
    handle_radius: f64,
    body_threshold: f64,
) -> Option<DragHandle> {
    let a = drawing.screen.a?;

    let mut handle = None;
    if p.distance_to(a) < handle_radius {
        handle = Some(DragHandle::A);
    }
    if drawing
        .screen
        .b
        .is_some_and(|b| p.distance_to(b) < handle_radius)
    {
        handle = Some(DragHandle::B);
    }
    if handle.is_some() {
        return handle;
    }

    distance(drawing.kind, &drawing.screen, p)
        .filter(|&dist| dist < body_threshold)
        .map(|_| DragHandle::Body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drawing::types::Stroke;
    use crate::model::ChartPoint;

    fn pt(x: f64, y: f64) -> ScreenPoint {
        ScreenPoint::new(x, y)
    }

    fn drawing(id: u64, kind: DrawingKind, a: ScreenPoint, b: Option<ScreenPoint>) -> Drawing {
        Drawing {
            id: DrawingId(id),
            kind,
            point_a: ChartPoint::new(0, 0.0),
            point_b: b.map(|_| ChartPoint::new(1, 0.0)),
            stroke: Stroke::new("#2962FF", 2.0),
            angle: None,
            screen: ScreenAnchors { a: Some(a), b },
        }
    }

    #[test]
    fn per_kind_distances() {
        let screen = ScreenAnchors {
            a: Some(pt(50.0, 50.0)),
            b: None,
        };
        let p = pt(80.0, 44.0);
        assert_eq!(distance(DrawingKind::HorizontalLine, &screen, p), Some(6.0));
        assert_eq!(distance(DrawingKind::VerticalLine, &screen, p), Some(30.0));
        assert_eq!(distance(DrawingKind::CrossLine, &screen, p), Some(6.0));
        assert_eq!(distance(DrawingKind::HorizontalRay, &screen, p), Some(6.0));
        // left of the origin the ray measures straight-line distance
        assert_eq!(
            distance(DrawingKind::HorizontalRay, &screen, pt(46.0, 47.0)),
            Some(5.0)
        );
        assert_eq!(
            distance(DrawingKind::TrendLine, &screen, p),
            Some(f64::INFINITY)
        );
    }

    #[test]
    fn off_screen_anchor_is_not_hittable() {
        let screen = ScreenAnchors { a: None, b: None };
        assert_eq!(distance(DrawingKind::HorizontalLine, &screen, pt(0.0, 0.0)), None);
    }

    #[test]
    fn nearest_is_strict_and_prefers_closest() {
        let drawings = vec![
            drawing(1, DrawingKind::HorizontalLine, pt(0.0, 100.0), None),
            drawing(2, DrawingKind::HorizontalLine, pt(0.0, 104.0), None),
        ];
        assert_eq!(nearest(&drawings, pt(10.0, 103.0), 12.0), Some(DrawingId(2)));
        assert_eq!(nearest(&drawings, pt(10.0, 116.0), 12.0), None);
        // exactly at the threshold does not count
        assert_eq!(nearest(&drawings, pt(10.0, 88.0), 12.0), None);
    }

    #[test]
    fn equal_distances_keep_first_drawing() {
        let drawings = vec![
            drawing(1, DrawingKind::HorizontalLine, pt(0.0, 100.0), None),
            drawing(2, DrawingKind::HorizontalLine, pt(0.0, 110.0), None),
        ];
        assert_eq!(nearest(&drawings, pt(10.0, 105.0), 12.0), Some(DrawingId(1)));
    }

    #[test]
    fn grab_prefers_b_then_a_then_body() {
        let line = drawing(1, DrawingKind::TrendLine, pt(0.0, 0.0), Some(pt(8.0, 0.0)));
        // within 10px of both endpoints
        assert_eq!(grab(&line, pt(5.0, 0.0), 10.0, 10.0), Some(DragHandle::B));

        let line = drawing(1, DrawingKind::TrendLine, pt(0.0, 0.0), Some(pt(100.0, 0.0)));
        assert_eq!(grab(&line, pt(3.0, 3.0), 10.0, 10.0), Some(DragHandle::A));
        assert_eq!(grab(&line, pt(97.0, 2.0), 10.0, 10.0), Some(DragHandle::B));
        assert_eq!(grab(&line, pt(50.0, 6.0), 10.0, 10.0), Some(DragHandle::Body));
        assert_eq!(grab(&line, pt(50.0, 12.0), 10.0, 10.0), None);
    }

    #[test]
    fn grab_one_click_drawing_body() {
        let hline = drawing(1, DrawingKind::HorizontalLine, pt(20.0, 40.0), None);
        assert_eq!(grab(&hline, pt(300.0, 45.0), 10.0, 10.0), Some(DragHandle::Body));
        assert_eq!(grab(&hline, pt(22.0, 41.0), 10.0, 10.0), Some(DragHandle::A));
    }
}
