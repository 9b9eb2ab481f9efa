//! Overlay geometry for detections and ruler annotations.
//!
//! Everything produced here is in surface-local display space. The viewer
//! translates it by the surface origin when painting.

use egui::{vec2, Color32, Pos2};

use crate::detection::{Detection, DetectionId};
use crate::mapper::to_display_space;
use crate::ruler::RulerPoint;
use crate::scaling::ScaleFactors;

/// Crosshair arm length and label offset, in display units.
pub const CROSSHAIR_ARM: f32 = 8.0;
pub const LABEL_OFFSET: f32 = 8.0;

pub const MATCHED_COLOR: Color32 = Color32::from_rgb(34, 197, 94);
pub const FALLBACK_COLOR: Color32 = Color32::from_rgb(249, 115, 22);
pub const RULER_COLOR: Color32 = Color32::from_rgb(250, 204, 21);

/// Interaction emphasis, ordered by visual weight.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Emphasis {
    Normal,
    Hovered,
    Selected,
}

impl Emphasis {
    pub fn of(
        id: DetectionId,
        hovered: Option<DetectionId>,
        selected: Option<DetectionId>,
    ) -> Self {
        if selected == Some(id) {
            Emphasis::Selected
        } else if hovered == Some(id) {
            Emphasis::Hovered
        } else {
            Emphasis::Normal
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub color: Color32,
    pub width: f32,
    pub opacity: f32,
    pub dashed: bool,
}

impl StrokeStyle {
    pub fn for_detection(matched_request: bool, emphasis: Emphasis) -> Self {
        let color = if matched_request {
            MATCHED_COLOR
        } else {
            FALLBACK_COLOR
        };
        let (width, opacity) = match emphasis {
            Emphasis::Normal => (2.0, 0.7),
            Emphasis::Hovered => (3.0, 0.85),
            Emphasis::Selected => (4.0, 1.0),
        };
        Self {
            color,
            width,
            opacity,
            dashed: emphasis == Emphasis::Selected,
        }
    }

    /// Stroke color with the opacity applied.
    pub fn effective_color(&self) -> Color32 {
        self.color.gamma_multiply(self.opacity)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crosshair {
    pub center: Pos2,
    pub arm: f32,
}

impl Crosshair {
    /// Horizontal then vertical segment.
    pub fn segments(&self) -> [[Pos2; 2]; 2] {
        let c = self.center;
        [
            [c - vec2(self.arm, 0.0), c + vec2(self.arm, 0.0)],
            [c - vec2(0.0, self.arm), c + vec2(0.0, self.arm)],
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    /// Bottom-left corner of the text.
    pub anchor: Pos2,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectionOverlay {
    pub id: DetectionId,
    /// Closed outline: top-left, top-right, bottom-right, bottom-left.
    pub polygon: [Pos2; 4],
    pub corner_markers: [Pos2; 4],
    pub crosshair: Option<Crosshair>,
    pub label: Label,
    pub style: StrokeStyle,
    pub emphasis: Emphasis,
    /// Vertices were unusable and the bounding box is drawn instead.
    pub degraded: bool,
}

impl DetectionOverlay {
    pub fn contains(&self, point: Pos2) -> bool {
        polygon_contains(&self.polygon, point)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RulerOverlay {
    pub markers: Vec<Pos2>,
    pub line: Option<[Pos2; 2]>,
    pub label: Option<Label>,
}

/// One complete overlay for a frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverlayFrame {
    pub detections: Vec<DetectionOverlay>,
    pub ruler: RulerOverlay,
}

impl OverlayFrame {
    /// Topmost detection under `point`. Later overlays are drawn on top.
    pub fn hit_test(&self, point: Pos2) -> Option<DetectionId> {
        self.detections
            .iter()
            .rev()
            .find(|overlay| overlay.contains(point))
            .map(|overlay| overlay.id)
    }

    pub fn get(&self, id: DetectionId) -> Option<&DetectionOverlay> {
        self.detections.iter().find(|overlay| overlay.id == id)
    }
}

pub fn label_text(detection: &Detection) -> String {
    format!("{} {}%", detection.class_name, detection.confidence_percent())
}

/// Geometry for one detection, or `None` when it has no drawable outline.
pub fn render_detection(
    detection: &Detection,
    factors: ScaleFactors,
    emphasis: Emphasis,
) -> Option<DetectionOverlay> {
    let Some(outline) = detection.outline() else {
        log::warn!("detection {} has no finite geometry, skipping", detection.id);
        return None;
    };
    let polygon = outline.points.map(|p| to_display_space(p, factors));
    let crosshair = (emphasis == Emphasis::Selected).then(|| Crosshair {
        center: to_display_space(detection.center(), factors),
        arm: CROSSHAIR_ARM,
    });
    Some(DetectionOverlay {
        id: detection.id,
        polygon,
        corner_markers: polygon,
        crosshair,
        label: Label {
            anchor: polygon[0] - vec2(0.0, LABEL_OFFSET),
            text: label_text(detection),
        },
        style: StrokeStyle::for_detection(detection.matched_request, emphasis),
        emphasis,
        degraded: outline.degraded,
    })
}

pub fn render_detections(
    detections: &[Detection],
    factors: ScaleFactors,
    hovered: Option<DetectionId>,
    selected: Option<DetectionId>,
) -> Vec<DetectionOverlay> {
    detections
        .iter()
        .filter_map(|d| render_detection(d, factors, Emphasis::of(d.id, hovered, selected)))
        .collect()
}

/// Markers for placed points, the connecting line and the distance label at
/// its midpoint once the measurement is complete.
pub fn render_ruler(
    points: &[RulerPoint],
    factors: ScaleFactors,
    distance_text: Option<String>,
) -> RulerOverlay {
    let markers: Vec<Pos2> = points
        .iter()
        .map(|p| to_display_space(p.image, factors))
        .collect();
    let line = match markers.as_slice() {
        [a, b] => Some([*a, *b]),
        _ => None,
    };
    let label = line.zip(distance_text).map(|([a, b], text)| Label {
        anchor: a + (b - a) * 0.5 - vec2(0.0, LABEL_OFFSET),
        text,
    });
    RulerOverlay {
        markers,
        line,
        label,
    }
}

/// Even-odd point-in-polygon test.
pub fn polygon_contains(polygon: &[Pos2], point: Pos2) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
