use error_stack::{Report, bail};

use crate::chart::{Chart, ScreenPoint};
use crate::dataset::Dataset;
use crate::drawing::geometry::compute_angle;
use crate::drawing::hit_test::{self, DragState};
use crate::drawing::overlay::{self, Shape};
use crate::drawing::{
    DrawingId, DrawingKind, DrawingRegistry, DrawingSettings, Placement, PlacementOutcome,
    ScreenAnchors,
};
use crate::error::DrawingError;
use crate::indicator::params::IndicatorKind;
use crate::model::ChartPoint;
use crate::registry::IndicatorRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Delete,
    Backspace,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub alt: bool,
    /// Focus is in a text input or select; shortcuts are suppressed.
    pub editable_target: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            alt: false,
            editable_target: false,
        }
    }

    pub fn alt(key: char) -> Self {
        Self {
            key: Key::Char(key),
            alt: true,
            editable_target: false,
        }
    }
}

/// What a left click on the chart did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickResult {
    /// Tool active but the position has no time or price.
    Ignored,
    /// First point of a two-click tool placed.
    Started,
    Created(DrawingId),
    Selected(DrawingId),
    Deselected,
}

/// One chart with its data, indicators and drawings.
///
/// Everything is driven from the caller's thread: input events mutate the
/// session and mark the overlay dirty, [`ChartSession::repaint`] produces
/// the frame.
pub struct ChartSession<C: Chart> {
    chart: C,
    dataset: Dataset,
    indicators: IndicatorRegistry,
    drawings: DrawingRegistry,
    placement: Placement,
    drag: Option<DragState>,
    settings: DrawingSettings,
    overlay_attached: bool,
    needs_repaint: bool,
}

impl<C: Chart> ChartSession<C> {
    pub fn new(chart: C, settings: DrawingSettings) -> Self {
        Self {
            chart,
            dataset: Dataset::default(),
            indicators: IndicatorRegistry::new(),
            drawings: DrawingRegistry::new(),
            placement: Placement::new(),
            drag: None,
            settings,
            overlay_attached: false,
            needs_repaint: false,
        }
    }

    pub fn chart(&self) -> &C {
        &self.chart
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn indicators(&self) -> &IndicatorRegistry {
        &self.indicators
    }

    pub fn drawings(&self) -> &DrawingRegistry {
        &self.drawings
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn settings(&self) -> &DrawingSettings {
        &self.settings
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }

    pub fn needs_repaint(&self) -> bool {
        self.needs_repaint
    }

    /// Swap in a new symbol/interval and recompute every indicator.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = dataset;
        self.chart.set_candles(&self.dataset.candles);
        self.indicators.refresh_all(&self.dataset, &mut self.chart);
        self.request_repaint();
        tracing::info!(
            candles = self.dataset.len(),
            indicators = self.indicators.len(),
            "dataset changed"
        );
    }

    // ── Indicators ───────────────────────────────────────────────────────────

    pub fn add_indicator(&mut self, kind: IndicatorKind) -> Option<String> {
        self.indicators.add(kind, &self.dataset, &mut self.chart)
    }

    pub fn remove_indicator(&mut self, id: &str) -> bool {
        self.indicators.remove(id, &mut self.chart)
    }

    pub fn update_indicator(&mut self, id: &str, raw: &str) -> bool {
        self.indicators
            .update_parameters(id, raw, &self.dataset, &mut self.chart)
    }

    pub fn set_indicator_color(&mut self, id: &str, color: &str) -> bool {
        self.indicators.set_color(id, color, &mut self.chart)
    }

    // ── Tools ────────────────────────────────────────────────────────────────

    pub fn activate_tool(&mut self, tool: DrawingKind) {
        if self.placement.activate(tool) {
            self.request_repaint();
        }
        tracing::debug!(tool = %tool, "drawing tool activated");
    }

    pub fn deactivate_tool(&mut self) {
        if self.placement.deactivate() {
            self.request_repaint();
        }
    }

    pub fn toggle_tool(&mut self, tool: DrawingKind) {
        if self.placement.toggle(tool) {
            self.request_repaint();
        }
        tracing::debug!(active = ?self.placement.active_tool(), "drawing tool toggled");
    }

    // ── Pointer and keyboard ─────────────────────────────────────────────────

    /// Left click: place with the active tool, otherwise select.
    pub fn click(&mut self, p: ScreenPoint) -> ClickResult {
        if self.placement.active_tool().is_some() {
            let point = self.chart.screen_to_chart(p);
            return match self.placement.click(point) {
                PlacementOutcome::Ignored => {
                    tracing::debug!(x = p.x, y = p.y, "click has no chart position");
                    ClickResult::Ignored
                }
                PlacementOutcome::Started => {
                    self.ensure_overlay();
                    self.request_repaint();
                    ClickResult::Started
                }
                PlacementOutcome::Commit {
                    kind,
                    point_a,
                    point_b,
                } => ClickResult::Created(self.commit(kind, point_a, point_b)),
            };
        }

        match self.drawings.hit_test(p, self.settings.select_threshold) {
            Some(id) => {
                self.drawings.select(id);
                self.request_repaint();
                ClickResult::Selected(id)
            }
            None => {
                self.drawings.deselect_all();
                self.request_repaint();
                ClickResult::Deselected
            }
        }
    }

    /// The preview's second point follows the crosshair.
    pub fn crosshair_move(&mut self, p: ScreenPoint) {
        if self.placement.preview().is_none() {
            return;
        }
        if let Some(point) = self.chart.screen_to_chart(p) {
            self.placement.track(point);
            self.request_repaint();
        }
    }

    /// Start dragging the selected drawing. Returns whether a drag began.
    pub fn pointer_down(&mut self, p: ScreenPoint) -> bool {
        if self.placement.active_tool().is_some() {
            return false;
        }
        let Some(drawing) = self.drawings.selected_drawing() else {
            return false;
        };
        let Some(handle) = hit_test::grab(
            drawing,
            p,
            self.settings.handle_radius,
            self.settings.drag_threshold,
        ) else {
            return false;
        };

        self.drag = Some(DragState {
            drawing: drawing.id,
            handle,
            start: p,
            origin: drawing.screen,
        });
        tracing::debug!(id = %drawing.id, ?handle, "drag started");
        true
    }

    pub fn pointer_move(&mut self, p: ScreenPoint) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        if !self.drawings.apply_drag(&drag, p, &self.chart) {
            self.drag = None;
            return false;
        }
        self.request_repaint();
        true
    }

    pub fn pointer_up(&mut self) -> bool {
        self.drag.take().is_some()
    }

    /// Right click: select the drawing under the pointer for its menu.
    pub fn context_menu(&mut self, p: ScreenPoint) -> Option<DrawingId> {
        let id = self
            .drawings
            .hit_test(p, self.settings.context_menu_threshold)?;
        self.drawings.select(id);
        self.request_repaint();
        Some(id)
    }

    /// Returns whether the key was consumed.
    pub fn key(&mut self, event: KeyEvent) -> bool {
        if event.editable_target {
            return false;
        }
        match event.key {
            Key::Escape => {
                self.deactivate_tool();
                self.drawings.deselect_all();
                self.request_repaint();
                true
            }
            Key::Delete | Key::Backspace => self.delete_selected(),
            Key::Char(c) if event.alt => match DrawingKind::from_shortcut(c) {
                Some(tool) => {
                    self.toggle_tool(tool);
                    true
                }
                None => false,
            },
            Key::Char(_) => false,
        }
    }

    // ── Drawings ─────────────────────────────────────────────────────────────

    /// Commit a drawing directly from chart points.
    pub fn place(
        &mut self,
        kind: DrawingKind,
        point_a: ChartPoint,
        point_b: Option<ChartPoint>,
    ) -> Result<DrawingId, Report<DrawingError>> {
        if kind.is_two_click() && point_b.is_none() {
            bail!(DrawingError::MissingPoint {
                kind: kind.to_string(),
            });
        }
        let point_b = point_b.filter(|_| kind.is_two_click());
        Ok(self.commit(kind, point_a, point_b))
    }

    pub fn delete_drawing(&mut self, id: DrawingId) -> bool {
        let deleted = self.drawings.delete(id);
        if deleted {
            self.request_repaint();
        }
        deleted
    }

    pub fn delete_selected(&mut self) -> bool {
        match self.drawings.selected() {
            Some(id) => self.delete_drawing(id),
            None => false,
        }
    }

    /// Remove every drawing; the next one gets id 1 again.
    pub fn clear_drawings(&mut self) {
        self.drawings.clear();
        self.drag = None;
        self.request_repaint();
        tracing::info!("drawings cleared");
    }

    /// Recolor the selected drawing, or set the color for new drawings when
    /// nothing is selected.
    pub fn set_drawing_color(&mut self, color: &str) {
        let selected = self.drawings.selected();
        match selected.and_then(|id| self.drawings.get_mut(id)) {
            Some(drawing) => {
                drawing.stroke.color = color.to_string();
                self.request_repaint();
            }
            None => self.settings.stroke.color = color.to_string(),
        }
    }

    /// Refresh screen caches from the current transforms and paint the
    /// overlay.
    pub fn repaint(&mut self) -> Vec<Shape> {
        self.drawings.update_screen_coords(&self.chart);
        if let Some(preview) = self.placement.preview_mut() {
            preview.update_screen(&self.chart);
        }
        self.needs_repaint = false;

        let preview = self
            .placement
            .preview()
            .map(|p| (p, &self.settings.preview_stroke));
        overlay::render(&self.drawings, preview, self.chart.viewport())
    }

    fn commit(
        &mut self,
        kind: DrawingKind,
        point_a: ChartPoint,
        point_b: Option<ChartPoint>,
    ) -> DrawingId {
        self.ensure_overlay();
        let id = self
            .drawings
            .create(kind, point_a, point_b, self.settings.stroke.clone());

        if kind == DrawingKind::TrendAngle {
            let angle = ScreenAnchors::resolve(&self.chart, &point_a, point_b.as_ref())
                .segment()
                .map(|(a, b)| compute_angle(a, b));
            if let Some(drawing) = self.drawings.get_mut(id) {
                drawing.angle = angle;
            }
        }

        self.request_repaint();
        tracing::info!(id = %id, kind = %kind, "drawing placed");
        id
    }

    fn ensure_overlay(&mut self) {
        if !self.overlay_attached {
            self.chart.attach_overlay();
            self.overlay_attached = true;
        }
    }

    fn request_repaint(&mut self) {
        self.needs_repaint = true;
        if self.overlay_attached {
            self.chart.request_overlay_update();
        }
    }
}
