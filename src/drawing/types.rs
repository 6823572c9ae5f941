use std::fmt;
use std::str::FromStr;

use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::chart::{CoordinateTransform, ScreenPoint};
use crate::error::DrawingError;
use crate::model::ChartPoint;

/// Identifier of a committed drawing, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DrawingId(pub u64);

impl fmt::Display for DrawingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Available drawing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DrawingKind {
    #[serde(rename = "trendline")]
    TrendLine,
    #[serde(rename = "ray")]
    Ray,
    #[serde(rename = "infoline")]
    InfoLine,
    #[serde(rename = "extendedline")]
    ExtendedLine,
    #[serde(rename = "trendangle")]
    TrendAngle,
    #[serde(rename = "hline")]
    HorizontalLine,
    #[serde(rename = "hray")]
    HorizontalRay,
    #[serde(rename = "vline")]
    VerticalLine,
    #[serde(rename = "crossline")]
    CrossLine,
}

impl DrawingKind {
    pub const ALL: [DrawingKind; 9] = [
        Self::TrendLine,
        Self::Ray,
        Self::InfoLine,
        Self::ExtendedLine,
        Self::TrendAngle,
        Self::HorizontalLine,
        Self::HorizontalRay,
        Self::VerticalLine,
        Self::CrossLine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrendLine => "trendline",
            Self::Ray => "ray",
            Self::InfoLine => "infoline",
            Self::ExtendedLine => "extendedline",
            Self::TrendAngle => "trendangle",
            Self::HorizontalLine => "hline",
            Self::HorizontalRay => "hray",
            Self::VerticalLine => "vline",
            Self::CrossLine => "crossline",
        }
    }

    /// Placed with a single click; only point A is used.
    pub fn is_one_click(&self) -> bool {
        matches!(
            self,
            Self::HorizontalLine | Self::HorizontalRay | Self::VerticalLine | Self::CrossLine
        )
    }

    pub fn is_two_click(&self) -> bool {
        !self.is_one_click()
    }

    /// Tool toggled by Alt+`key`.
    pub fn from_shortcut(key: char) -> Option<Self> {
        match key.to_ascii_lowercase() {
            't' => Some(Self::TrendLine),
            'h' => Some(Self::HorizontalLine),
            'j' => Some(Self::HorizontalRay),
            'v' => Some(Self::VerticalLine),
            'c' => Some(Self::CrossLine),
            _ => None,
        }
    }
}

impl fmt::Display for DrawingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawingKind {
    type Err = Report<DrawingError>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                Report::new(DrawingError::UnknownKind {
                    kind: s.to_string(),
                })
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
}

impl Stroke {
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
        }
    }
}

/// Screen positions derived from a drawing's chart points on the last
/// repaint. `None` where the point is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScreenAnchors {
    pub a: Option<ScreenPoint>,
    pub b: Option<ScreenPoint>,
}

impl ScreenAnchors {
    pub fn resolve<T: CoordinateTransform + ?Sized>(
        transform: &T,
        a: &ChartPoint,
        b: Option<&ChartPoint>,
    ) -> Self {
        Self {
            a: transform.chart_to_screen(a),
            b: b.and_then(|b| transform.chart_to_screen(b)),
        }
    }

    /// Both endpoints, when both resolved.
    pub fn segment(&self) -> Option<(ScreenPoint, ScreenPoint)> {
        Some((self.a?, self.b?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Drawing {
    pub id: DrawingId,
    pub kind: DrawingKind,
    pub point_a: ChartPoint,
    pub point_b: Option<ChartPoint>,
    pub stroke: Stroke,
    /// Captured at commit for `trendangle`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub angle: Option<f64>,
    #[serde(skip)]
    pub screen: ScreenAnchors,
}

impl Drawing {
    pub fn update_screen<T: CoordinateTransform + ?Sized>(&mut self, transform: &T) {
        self.screen = ScreenAnchors::resolve(transform, &self.point_a, self.point_b.as_ref());
    }
}

/// The uncommitted two-click drawing following the pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub kind: DrawingKind,
    pub point_a: ChartPoint,
    pub point_b: ChartPoint,
    pub screen: ScreenAnchors,
}

impl Preview {
    pub fn new(kind: DrawingKind, point: ChartPoint) -> Self {
        Self {
            kind,
            point_a: point,
            point_b: point,
            screen: ScreenAnchors::default(),
        }
    }

    pub fn update_screen<T: CoordinateTransform + ?Sized>(&mut self, transform: &T) {
        self.screen = ScreenAnchors::resolve(transform, &self.point_a, Some(&self.point_b));
    }
}
