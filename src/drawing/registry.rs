use crate::chart::{CoordinateTransform, ScreenPoint};
use crate::drawing::hit_test::{self, DragHandle, DragState};
use crate::drawing::types::{Drawing, DrawingId, DrawingKind, ScreenAnchors, Stroke};
use crate::model::ChartPoint;

/// Committed drawings in creation order plus the single selection.
#[derive(Debug, Default)]
pub struct DrawingRegistry {
    drawings: Vec<Drawing>,
    selected: Option<DrawingId>,
    last_id: u64,
}

impl DrawingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        kind: DrawingKind,
        point_a: ChartPoint,
        point_b: Option<ChartPoint>,
        stroke: Stroke,
    ) -> DrawingId {
        self.last_id += 1;
        let id = DrawingId(self.last_id);
        self.drawings.push(Drawing {
            id,
            kind,
            point_a,
            point_b,
            stroke,
            angle: None,
            screen: ScreenAnchors::default(),
        });
        tracing::debug!(id = %id, kind = %kind, "drawing created");
        id
    }

    /// Remove a drawing, clearing the selection if it pointed at it.
    pub fn delete(&mut self, id: DrawingId) -> bool {
        let Some(index) = self.drawings.iter().position(|d| d.id == id) else {
            return false;
        };
        self.drawings.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        tracing::debug!(id = %id, "drawing deleted");
        true
    }

    /// Select `id`, replacing any previous selection. An unknown id leaves
    /// nothing selected.
    pub fn select(&mut self, id: DrawingId) -> bool {
        self.selected = self.get(id).map(|d| d.id);
        self.selected.is_some()
    }

    pub fn deselect_all(&mut self) {
        self.selected = None;
    }

    /// Drop every drawing and restart ids at 1.
    pub fn clear(&mut self) {
        self.drawings.clear();
        self.selected = None;
        self.last_id = 0;
    }

    pub fn selected(&self) -> Option<DrawingId> {
        self.selected
    }

    pub fn selected_drawing(&self) -> Option<&Drawing> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn is_selected(&self, id: DrawingId) -> bool {
        self.selected == Some(id)
    }

    pub fn get(&self, id: DrawingId) -> Option<&Drawing> {
        self.drawings.iter().find(|d| d.id == id)
    }

    pub fn get_mut(&mut self, id: DrawingId) -> Option<&mut Drawing> {
        self.drawings.iter_mut().find(|d| d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Drawing> {
        self.drawings.iter()
    }

    pub fn len(&self) -> usize {
        self.drawings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drawings.is_empty()
    }

    /// Recompute every drawing's screen cache from its chart points.
    pub fn update_screen_coords<T: CoordinateTransform + ?Sized>(&mut self, transform: &T) {
        for drawing in &mut self.drawings {
            drawing.update_screen(transform);
        }
    }

    /// Nearest drawing to `p` by cached screen position.
    pub fn hit_test(&self, p: ScreenPoint, threshold: f64) -> Option<DrawingId> {
        hit_test::nearest(&self.drawings, p, threshold)
    }

    /// Apply a pointer move to the dragged drawing. Positions that do not
    /// map back to chart space leave that endpoint where it was.
    ///
    /// Returns `false` when the drawing no longer exists.
    pub fn apply_drag<T: CoordinateTransform + ?Sized>(
        &mut self,
        drag: &DragState,
        p: ScreenPoint,
        transform: &T,
    ) -> bool {
        let Some(drawing) = self.get_mut(drag.drawing) else {
            return false;
        };

        match drag.handle {
            DragHandle::A => {
                if let Some(point) = transform.screen_to_chart(p) {
                    drawing.point_a = point;
                }
            }
            DragHandle::B => {
                if let (Some(point_b), Some(point)) =
                    (drawing.point_b.as_mut(), transform.screen_to_chart(p))
                {
                    *point_b = point;
                }
            }
            DragHandle::Body => {
                let (dx, dy) = (p.x - drag.start.x, p.y - drag.start.y);
                let Some(origin_a) = drag.origin.a else {
                    return true;
                };
                if let Some(point) = transform.screen_to_chart(origin_a.offset(dx, dy)) {
                    drawing.point_a = point;
                }
                if let (Some(point_b), Some(origin_b)) = (drawing.point_b.as_mut(), drag.origin.b) {
                    if let Some(point) = transform.screen_to_chart(origin_b.offset(dx, dy)) {
                        *point_b = point;
                    }
                }
            }
        }
        true
    }
}
