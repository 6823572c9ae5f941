use crate::drawing::types::{DrawingKind, Preview};
use crate::model::ChartPoint;

/// Where the active tool is in its placement cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlacementState {
    /// No tool active; clicks select drawings.
    #[default]
    Idle,
    /// Waiting for the first point (or the only one for one-click tools).
    PlacingA { tool: DrawingKind },
    /// First point placed; the preview follows the pointer.
    PlacingB { tool: DrawingKind, preview: Preview },
}

/// What a placement click produced.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementOutcome {
    /// No tool active, or the click had no chart position.
    Ignored,
    /// A two-click tool got its first point.
    Started,
    /// A drawing is ready to be committed.
    Commit {
        kind: DrawingKind,
        point_a: ChartPoint,
        point_b: Option<ChartPoint>,
    },
}

/// Placement state machine for the drawing tools.
#[derive(Debug, Clone, Default)]
pub struct Placement {
    state: PlacementState,
}

impl Placement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PlacementState {
        &self.state
    }

    pub fn active_tool(&self) -> Option<DrawingKind> {
        match &self.state {
            PlacementState::Idle => None,
            PlacementState::PlacingA { tool } | PlacementState::PlacingB { tool, .. } => {
                Some(*tool)
            }
        }
    }

    pub fn preview(&self) -> Option<&Preview> {
        match &self.state {
            PlacementState::PlacingB { preview, .. } => Some(preview),
            _ => None,
        }
    }

    pub fn preview_mut(&mut self) -> Option<&mut Preview> {
        match &mut self.state {
            PlacementState::PlacingB { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Start placing with `tool`. Returns whether a pending preview was dropped.
    pub fn activate(&mut self, tool: DrawingKind) -> bool {
        let had_preview = self.preview().is_some();
        self.state = PlacementState::PlacingA { tool };
        had_preview
    }

    /// Return to `Idle`. Returns whether a pending preview was dropped.
    pub fn deactivate(&mut self) -> bool {
        let had_preview = self.preview().is_some();
        self.state = PlacementState::Idle;
        had_preview
    }

    /// Deactivate when `tool` is already active, otherwise activate it.
    /// Returns whether a pending preview was dropped.
    pub fn toggle(&mut self, tool: DrawingKind) -> bool {
        if self.active_tool() == Some(tool) {
            self.deactivate()
        } else {
            self.activate(tool)
        }
    }

    /// Feed a click resolved to chart space.
    pub fn click(&mut self, point: Option<ChartPoint>) -> PlacementOutcome {
        let Some(point) = point else {
            return PlacementOutcome::Ignored;
        };

        match std::mem::take(&mut self.state) {
            PlacementState::Idle => PlacementOutcome::Ignored,
            PlacementState::PlacingA { tool } if tool.is_one_click() => {
                self.state = PlacementState::PlacingA { tool };
                PlacementOutcome::Commit {
                    kind: tool,
                    point_a: point,
                    point_b: None,
                }
            }
            PlacementState::PlacingA { tool } => {
                self.state = PlacementState::PlacingB {
                    tool,
                    preview: Preview::new(tool, point),
                };
                PlacementOutcome::Started
            }
            PlacementState::PlacingB { tool, preview } => {
                self.state = PlacementState::PlacingA { tool };
                PlacementOutcome::Commit {
                    kind: tool,
                    point_a: preview.point_a,
                    point_b: Some(point),
                }
            }
        }
    }

    /// Move the preview's second point. Returns whether a preview exists.
    pub fn track(&mut self, point: ChartPoint) -> bool {
        match self.preview_mut() {
            Some(preview) => {
                preview.point_b = point;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(t: i64, price: f64) -> Option<ChartPoint> {
        Some(ChartPoint::new(t, price))
    }

    #[test]
    fn idle_ignores_clicks() {
        let mut placement = Placement::new();
        assert_eq!(placement.click(at(1, 10.0)), PlacementOutcome::Ignored);
        assert_eq!(placement.state(), &PlacementState::Idle);
    }

    #[test]
    fn one_click_tool_commits_and_stays_armed() {
        let mut placement = Placement::new();
        placement.activate(DrawingKind::HorizontalLine);
        for price in [10.0, 20.0] {
            assert_eq!(
                placement.click(at(1, price)),
                PlacementOutcome::Commit {
                    kind: DrawingKind::HorizontalLine,
                    point_a: ChartPoint::new(1, price),
                    point_b: None,
                }
            );
            assert_eq!(
                placement.state(),
                &PlacementState::PlacingA {
                    tool: DrawingKind::HorizontalLine
                }
            );
        }
    }

    #[test]
    fn two_click_tool_previews_then_commits() {
        let mut placement = Placement::new();
        placement.activate(DrawingKind::TrendLine);

        assert_eq!(placement.click(at(1, 10.0)), PlacementOutcome::Started);
        assert!(placement.track(ChartPoint::new(3, 12.0)));
        assert_eq!(placement.preview().unwrap().point_b, ChartPoint::new(3, 12.0));

        assert_eq!(
            placement.click(at(5, 15.0)),
            PlacementOutcome::Commit {
                kind: DrawingKind::TrendLine,
                point_a: ChartPoint::new(1, 10.0),
                point_b: Some(ChartPoint::new(5, 15.0)),
            }
        );
        assert!(placement.preview().is_none());
        assert_eq!(placement.active_tool(), Some(DrawingKind::TrendLine));
    }

    #[test]
    fn unresolved_click_changes_nothing() {
        let mut placement = Placement::new();
        placement.activate(DrawingKind::Ray);
        placement.click(at(1, 1.0));
        assert_eq!(placement.click(None), PlacementOutcome::Ignored);
        assert!(placement.preview().is_some());
    }

    #[test]
    fn switching_tools_drops_preview() {
        let mut placement = Placement::new();
        placement.activate(DrawingKind::InfoLine);
        placement.click(at(1, 1.0));
        assert!(placement.activate(DrawingKind::VerticalLine));
        assert!(placement.preview().is_none());
        assert!(!placement.track(ChartPoint::new(2, 2.0)));
    }

    #[test]
    fn toggle_deactivates_the_active_tool() {
        let mut placement = Placement::new();
        placement.toggle(DrawingKind::CrossLine);
        assert_eq!(placement.active_tool(), Some(DrawingKind::CrossLine));
        placement.toggle(DrawingKind::CrossLine);
        assert_eq!(placement.active_tool(), None);
    }
}
