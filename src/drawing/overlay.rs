use serde::Serialize;

use crate::chart::{ScreenPoint, Viewport};
use crate::drawing::geometry::{
    compute_angle, farthest_backward, farthest_forward, line_edge_intersections,
};
use crate::drawing::registry::DrawingRegistry;
use crate::drawing::types::{Drawing, DrawingKind, Preview, ScreenAnchors, Stroke};

const ENDPOINT_RADIUS: f64 = 4.0;
const HANDLE_SIZE: f64 = 8.0;
const HANDLE_FILL: &str = "#ffffff";
const HANDLE_LINE_WIDTH: f64 = 1.5;
const ANGLE_ARC_RADIUS: f64 = 20.0;

/// One primitive of the overlay, in screen pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    Line {
        from: ScreenPoint,
        to: ScreenPoint,
        color: String,
        width: f64,
    },
    /// Angles in radians, measured like a canvas arc.
    Arc {
        center: ScreenPoint,
        radius: f64,
        start_angle: f64,
        end_angle: f64,
        anticlockwise: bool,
        color: String,
        width: f64,
    },
    Dot {
        center: ScreenPoint,
        radius: f64,
        color: String,
    },
    /// Square selection handle centred on an endpoint.
    Handle {
        center: ScreenPoint,
        size: f64,
        fill: String,
        stroke: String,
        width: f64,
    },
    Label {
        at: ScreenPoint,
        text: String,
        color: String,
    },
}

/// Borrowed view of anything the overlay can paint.
struct Figure<'a> {
    kind: DrawingKind,
    screen: ScreenAnchors,
    prices: (f64, Option<f64>),
    angle: Option<f64>,
    stroke: &'a Stroke,
    selected: bool,
}

/// Paint every committed drawing in creation order, then the preview on top.
///
/// Screen caches must be current; see [`DrawingRegistry::update_screen_coords`].
pub fn render(
    registry: &DrawingRegistry,
    preview: Option<(&Preview, &Stroke)>,
    viewport: Viewport,
) -> Vec<Shape> {
    let mut out = Vec::new();
    for drawing in registry.iter() {
        render_drawing(drawing, registry.is_selected(drawing.id), viewport, &mut out);
    }
    if let Some((preview, stroke)) = preview {
        render_preview(preview, stroke, viewport, &mut out);
    }
    out
}

pub fn render_drawing(drawing: &Drawing, selected: bool, viewport: Viewport, out: &mut Vec<Shape>) {
    render_figure(
        Figure {
            kind: drawing.kind,
            screen: drawing.screen,
            prices: (drawing.point_a.price, drawing.point_b.map(|b| b.price)),
            angle: drawing.angle,
            stroke: &drawing.stroke,
            selected,
        },
        viewport,
        out,
    );
}

pub fn render_preview(preview: &Preview, stroke: &Stroke, viewport: Viewport, out: &mut Vec<Shape>) {
    render_figure(
        Figure {
            kind: preview.kind,
            screen: preview.screen,
            prices: (preview.point_a.price, Some(preview.point_b.price)),
            angle: None,
            stroke,
            selected: false,
        },
        viewport,
        out,
    );
}

/// `+Δ (pct%)` between the two prices of an info line.
pub fn info_label(price_a: f64, price_b: f64) -> String {
    let delta = price_b - price_a;
    let pct = if price_a != 0.0 {
        format!("{:.2}", delta / price_a * 100.0)
    } else {
        "0".to_string()
    };
    let sign = if delta >= 0.0 { "+" } else { "" };
    format!("{sign}{delta:.2} ({pct}%)")
}

fn render_figure(fig: Figure<'_>, viewport: Viewport, out: &mut Vec<Shape>) {
    let Some(a) = fig.screen.a else {
        return;
    };
    let (w, h) = (viewport.width, viewport.height);
    let color = fig.stroke.color.as_str();
    let width = if fig.selected {
        fig.stroke.width + 1.0
    } else {
        fig.stroke.width
    };
    let line = |from: ScreenPoint, to: ScreenPoint| Shape::Line {
        from,
        to,
        color: color.to_string(),
        width,
    };

    match fig.kind {
        DrawingKind::HorizontalLine => {
            out.push(line(ScreenPoint::new(0.0, a.y), ScreenPoint::new(w, a.y)));
        }
        DrawingKind::VerticalLine => {
            out.push(line(ScreenPoint::new(a.x, 0.0), ScreenPoint::new(a.x, h)));
        }
        DrawingKind::CrossLine => {
            out.push(line(ScreenPoint::new(0.0, a.y), ScreenPoint::new(w, a.y)));
            out.push(line(ScreenPoint::new(a.x, 0.0), ScreenPoint::new(a.x, h)));
        }
        DrawingKind::HorizontalRay => {
            out.push(line(a, ScreenPoint::new(w, a.y)));
        }
        DrawingKind::TrendLine
        | DrawingKind::Ray
        | DrawingKind::InfoLine
        | DrawingKind::ExtendedLine
        | DrawingKind::TrendAngle => {
            let Some(b) = fig.screen.b else {
                push_handles(&fig, out);
                return;
            };
            match fig.kind {
                DrawingKind::Ray => {
                    let hits = line_edge_intersections(a, b, viewport);
                    out.push(line(a, farthest_forward(&hits).unwrap_or(b)));
                }
                DrawingKind::ExtendedLine => {
                    let hits = line_edge_intersections(a, b, viewport);
                    out.push(line(
                        farthest_backward(&hits).unwrap_or(a),
                        farthest_forward(&hits).unwrap_or(b),
                    ));
                }
                DrawingKind::InfoLine => {
                    out.push(line(a, b));
                    if let (price_a, Some(price_b)) = fig.prices {
                        out.push(Shape::Label {
                            at: ScreenPoint::new((a.x + b.x) / 2.0 + 6.0, (a.y + b.y) / 2.0 - 6.0),
                            text: info_label(price_a, price_b),
                            color: color.to_string(),
                        });
                    }
                }
                DrawingKind::TrendAngle => {
                    out.push(line(a, b));
                    let angle = fig.angle.unwrap_or_else(|| compute_angle(a, b));
                    out.push(Shape::Arc {
                        center: a,
                        radius: ANGLE_ARC_RADIUS,
                        start_angle: 0.0,
                        end_angle: -angle.to_radians(),
                        anticlockwise: angle > 0.0,
                        color: color.to_string(),
                        width,
                    });
                    out.push(Shape::Label {
                        at: ScreenPoint::new(a.x + ANGLE_ARC_RADIUS + 4.0, a.y - 4.0),
                        text: format!("{angle:.1}°"),
                        color: color.to_string(),
                    });
                }
                _ => out.push(line(a, b)),
            }
            for center in [a, b] {
                out.push(Shape::Dot {
                    center,
                    radius: ENDPOINT_RADIUS,
                    color: color.to_string(),
                });
            }
        }
    }

    push_handles(&fig, out);
}

fn push_handles(fig: &Figure<'_>, out: &mut Vec<Shape>) {
    if !fig.selected {
        return;
    }
    for center in [fig.screen.a, fig.screen.b].into_iter().flatten() {
        out.push(Shape::Handle {
            center,
            size: HANDLE_SIZE,
            fill: HANDLE_FILL.to_string(),
            stroke: fig.stroke.color.clone(),
            width: HANDLE_LINE_WIDTH,
        });
    }
}
