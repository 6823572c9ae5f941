//! Freehand annotations: geometry, placement, hit-testing and rendering.

pub mod geometry;
pub mod hit_test;
pub mod overlay;
pub mod placement;
pub mod registry;
pub mod types;

pub use placement::{Placement, PlacementOutcome, PlacementState};
pub use registry::DrawingRegistry;
pub use types::{Drawing, DrawingId, DrawingKind, Preview, ScreenAnchors, Stroke};

pub const DEFAULT_COLOR: &str = "#2962FF";
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;
pub const PREVIEW_LINE_WIDTH: f64 = 1.5;

/// Styling and pointer tolerances for the drawing engine, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSettings {
    pub stroke: Stroke,
    pub preview_stroke: Stroke,
    /// Click selection picks the nearest drawing strictly closer than this.
    pub select_threshold: f64,
    pub context_menu_threshold: f64,
    /// Body distance that starts a whole-drawing drag.
    pub drag_threshold: f64,
    /// Endpoint grab radius.
    pub handle_radius: f64,
}

impl Default for DrawingSettings {
    fn default() -> Self {
        Self {
            stroke: Stroke::new(DEFAULT_COLOR, DEFAULT_LINE_WIDTH),
            preview_stroke: Stroke::new(DEFAULT_COLOR, PREVIEW_LINE_WIDTH),
            select_threshold: 12.0,
            context_menu_threshold: 10.0,
            drag_threshold: 10.0,
            handle_radius: 10.0,
        }
    }
}
