//! Detector result model.
//!
//! Everything here is read-only input produced by the remote detector. All
//! coordinates are in image space (original, unscaled pixels).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{InspectorError, Result};

pub type DetectionId = u32;

/// Maximum distance, in image pixels, between the vertex hull and the
/// bounding box before the vertices are considered inconsistent.
const VERTEX_TOLERANCE: f32 = 1.0;

// ── Geometry primitives ─────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn is_finite(&self) -> bool {
        self.x1.is_finite() && self.y1.is_finite() && self.x2.is_finite() && self.y2.is_finite()
    }

    /// Same box with `x1 <= x2` and `y1 <= y2` enforced.
    pub fn normalized(&self) -> Self {
        Self {
            x1: self.x1.min(self.x2),
            y1: self.y1.min(self.y2),
            x2: self.x1.max(self.x2),
            y2: self.y1.max(self.y2),
        }
    }

    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).abs()
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).abs()
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Corners in outline order: top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        let b = self.normalized();
        [
            Point::new(b.x1, b.y1),
            Point::new(b.x2, b.y1),
            Point::new(b.x2, b.y2),
            Point::new(b.x1, b.y2),
        ]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertices {
    #[serde(alias = "topLeft")]
    pub top_left: Point,
    #[serde(alias = "topRight")]
    pub top_right: Point,
    #[serde(alias = "bottomLeft")]
    pub bottom_left: Point,
    #[serde(alias = "bottomRight")]
    pub bottom_right: Point,
}

impl Vertices {
    pub fn from_bounding_box(bbox: &BoundingBox) -> Self {
        let [tl, tr, br, bl] = bbox.corners();
        Self {
            top_left: tl,
            top_right: tr,
            bottom_left: bl,
            bottom_right: br,
        }
    }

    /// Vertices in outline traversal order.
    pub fn outline_order(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    fn is_finite(&self) -> bool {
        self.outline_order().iter().all(Point::is_finite)
    }

    /// Whether the axis-aligned hull of the vertices matches `bbox`.
    fn fits(&self, bbox: &BoundingBox) -> bool {
        let pts = self.outline_order();
        let min_x = pts.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = pts.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = pts.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = pts.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
        let b = bbox.normalized();
        (min_x - b.x1).abs() <= VERTEX_TOLERANCE
            && (max_x - b.x2).abs() <= VERTEX_TOLERANCE
            && (min_y - b.y1).abs() <= VERTEX_TOLERANCE
            && (max_y - b.y2).abs() <= VERTEX_TOLERANCE
    }

    /// Whether the outline is a convex quadrilateral traversed clockwise on
    /// screen (y down), starting from the top-left-most corner.
    fn is_ordered(&self) -> bool {
        let pts = self.outline_order();
        let turns_clockwise = (0..4).all(|i| {
            let (a, b, c) = (pts[i], pts[(i + 1) % 4], pts[(i + 2) % 4]);
            let cross = (b.x - a.x) * (c.y - b.y) - (b.y - a.y) * (c.x - b.x);
            cross > 0.0
        });
        let lead = self.top_left.x + self.top_left.y;
        let top_left_leads = pts
            .iter()
            .all(|p| lead <= p.x + p.y + VERTEX_TOLERANCE);
        turns_clockwise && top_left_leads
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

// ── Detection ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: DetectionId,
    #[serde(alias = "className")]
    pub class_name: String,
    pub confidence: f32,
    #[serde(alias = "boundingBox")]
    pub bounding_box: BoundingBox,
    pub vertices: Vertices,
    #[serde(alias = "centerPoint")]
    pub center_point: Point,
    pub dimensions: Dimensions,
    pub area: f32,
    #[serde(alias = "matchedRequest", default)]
    pub matched_request: bool,
}

/// The polygon a detection should be drawn with.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Outline {
    /// Image-space points: top-left, top-right, bottom-right, bottom-left.
    pub points: [Point; 4],
    /// True when the vertices were rejected and the bbox rectangle is used.
    pub degraded: bool,
}

impl Detection {
    /// Builds a detection whose derived fields are consistent with `bbox`.
    pub fn from_bounding_box(
        id: DetectionId,
        class_name: impl Into<String>,
        confidence: f32,
        bbox: BoundingBox,
        matched_request: bool,
    ) -> Self {
        let bbox = bbox.normalized();
        let dimensions = Dimensions {
            width: bbox.width(),
            height: bbox.height(),
        };
        Self {
            id,
            class_name: class_name.into(),
            confidence,
            bounding_box: bbox,
            vertices: Vertices::from_bounding_box(&bbox),
            center_point: bbox.center(),
            dimensions,
            area: dimensions.width * dimensions.height,
            matched_request,
        }
    }

    /// Outline to render, or `None` when not even the bbox is usable.
    pub fn outline(&self) -> Option<Outline> {
        if !self.bounding_box.is_finite() {
            return None;
        }
        if self.vertices.is_finite()
            && self.vertices.fits(&self.bounding_box)
            && self.vertices.is_ordered()
        {
            Some(Outline {
                points: self.vertices.outline_order(),
                degraded: false,
            })
        } else {
            Some(Outline {
                points: self.bounding_box.corners(),
                degraded: true,
            })
        }
    }

    pub fn center(&self) -> Point {
        if self.center_point.is_finite() {
            self.center_point
        } else {
            self.bounding_box.center()
        }
    }

    pub fn confidence_percent(&self) -> i64 {
        (self.confidence * 100.0).round() as i64
    }
}

// ── Result envelope ─────────────────────────────────────────────────────────

/// Pixel extents of the original image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageExtents {
    pub width: f32,
    pub height: f32,
}

impl ImageExtents {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn to_vec2(self) -> egui::Vec2 {
        egui::vec2(self.width, self.height)
    }

    pub fn longest_side(&self) -> f32 {
        self.width.max(self.height)
    }
}

/// One response from the detector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(default)]
    pub detections: Vec<Detection>,
    pub image_dimensions: ImageExtents,
    #[serde(default)]
    pub matching_objects_found: u32,
    #[serde(default)]
    pub total_objects_found: u32,
    #[serde(default)]
    pub used_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_image_base64: Option<String>,
}

impl DetectionResult {
    /// A result with no detections, for showing an image on its own.
    pub fn empty(image_dimensions: ImageExtents) -> Self {
        Self {
            detections: Vec::new(),
            image_dimensions,
            matching_objects_found: 0,
            total_objects_found: 0,
            used_fallback: false,
            annotated_image_base64: None,
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(InspectorError::ResultDecode)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| InspectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let result = Self::from_json(&text)?;
        log::debug!(
            "loaded {} detections from {}",
            result.detections.len(),
            path.display()
        );
        Ok(result)
    }

    pub fn get(&self, id: DetectionId) -> Option<&Detection> {
        self.detections.iter().find(|d| d.id == id)
    }

    pub fn has_annotated_reference(&self) -> bool {
        self.annotated_image_base64
            .as_deref()
            .is_some_and(|s| !s.is_empty())
    }

    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} of {} objects match the request",
            self.matching_objects_found, self.total_objects_found
        );
        if self.used_fallback {
            text.push_str(" (no requested class found, showing all detections)");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "detections": [{
            "id": 0,
            "class_name": "car",
            "confidence": 0.873,
            "bounding_box": {"x1": 100, "y1": 200, "x2": 300, "y2": 400},
            "vertices": {
                "top_left": {"x": 100, "y": 200},
                "top_right": {"x": 300, "y": 200},
                "bottom_left": {"x": 100, "y": 400},
                "bottom_right": {"x": 300, "y": 400}
            },
            "center_point": {"x": 200, "y": 300},
            "dimensions": {"width": 200, "height": 200},
            "area": 40000,
            "matched_request": true
        }],
        "image_dimensions": {"width": 1920, "height": 1080},
        "matching_objects_found": 1,
        "total_objects_found": 1,
        "used_fallback": false
    }"#;

    #[test]
    fn parses_snake_case_result() {
        let result = DetectionResult::from_json(SAMPLE).unwrap();
        assert_eq!(result.detections.len(), 1);
        assert_eq!(result.image_dimensions, ImageExtents::new(1920.0, 1080.0));
        assert!(!result.has_annotated_reference());
        let det = &result.detections[0];
        assert_eq!(det.class_name, "car");
        assert_eq!(det.confidence_percent(), 87);
        assert!(det.matched_request);
    }

    #[test]
    fn parses_camel_case_detection() {
        let json = r#"{
            "id": 7, "className": "dog", "confidence": 0.5,
            "boundingBox": {"x1": 0, "y1": 0, "x2": 10, "y2": 20},
            "vertices": {
                "topLeft": {"x": 0, "y": 0}, "topRight": {"x": 10, "y": 0},
                "bottomLeft": {"x": 0, "y": 20}, "bottomRight": {"x": 10, "y": 20}
            },
            "centerPoint": {"x": 5, "y": 10},
            "dimensions": {"width": 10, "height": 20},
            "area": 200, "matchedRequest": false
        }"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.id, 7);
        assert_eq!(det.vertices.bottom_right, Point::new(10.0, 20.0));
    }

    #[test]
    fn tolerates_empty_detections() {
        let result =
            DetectionResult::from_json(r#"{"image_dimensions": {"width": 10, "height": 10}}"#)
                .unwrap();
        assert!(result.detections.is_empty());
        assert_eq!(result.summary(), "0 of 0 objects match the request");
    }

    #[test]
    fn rejects_missing_dimensions() {
        assert!(DetectionResult::from_json(r#"{"detections": []}"#).is_err());
    }

    fn cat(bbox: BoundingBox) -> Detection {
        Detection::from_bounding_box(1, "cat", 0.9, bbox, true)
    }

    #[test]
    fn derived_fields_follow_bbox() {
        let det = Detection::from_bounding_box(
            1,
            "cat",
            0.9,
            BoundingBox::new(300.0, 400.0, 100.0, 200.0),
            false,
        );
        assert_eq!(det.bounding_box, BoundingBox::new(100.0, 200.0, 300.0, 400.0));
        assert_eq!(det.center_point, Point::new(200.0, 300.0));
        assert_eq!(det.dimensions.width, 200.0);
        assert_eq!(det.area, 40000.0);
    }

    #[test]
    fn inconsistent_vertices_fall_back_to_bbox() {
        let mut det = cat(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        assert!(!det.outline().unwrap().degraded);

        det.vertices.top_right = Point::new(50.0, 0.0);
        let outline = det.outline().unwrap();
        assert!(outline.degraded);
        assert_eq!(outline.points[1], Point::new(10.0, 0.0));

        det.vertices.top_right = Point::new(f32::NAN, 0.0);
        assert!(det.outline().unwrap().degraded);
    }

    #[test]
    fn mislabeled_corners_fall_back_to_bbox() {
        let mut det = cat(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        std::mem::swap(&mut det.vertices.top_left, &mut det.vertices.top_right);
        let outline = det.outline().unwrap();
        assert!(outline.degraded);
        assert_eq!(outline.points, det.bounding_box.corners());
    }

    #[test]
    fn relabeled_start_corner_falls_back_to_bbox() {
        let mut det = cat(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        // Same clockwise square, but traversal starts at the bottom-right.
        det.vertices = Vertices {
            top_left: Point::new(10.0, 10.0),
            top_right: Point::new(0.0, 10.0),
            bottom_right: Point::new(0.0, 0.0),
            bottom_left: Point::new(10.0, 0.0),
        };
        assert!(det.outline().unwrap().degraded);
    }

    #[test]
    fn rotated_vertices_inside_bbox_are_kept() {
        let mut det = cat(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        det.vertices = Vertices {
            top_left: Point::new(5.0, 0.0),
            top_right: Point::new(10.0, 5.0),
            bottom_right: Point::new(5.0, 10.0),
            bottom_left: Point::new(0.0, 5.0),
        };
        assert!(!det.outline().unwrap().degraded);
    }

    #[test]
    fn non_finite_bbox_has_no_outline() {
        let mut det = cat(BoundingBox::new(0.0, 0.0, 10.0, 10.0));
        det.bounding_box.x2 = f32::INFINITY;
        assert!(det.outline().is_none());
    }

    #[test]
    fn non_finite_center_uses_bbox_midpoint() {
        let mut det = cat(BoundingBox::new(0.0, 0.0, 10.0, 20.0));
        det.center_point = Point::new(f32::NAN, 1.0);
        assert_eq!(det.center(), Point::new(5.0, 10.0));
    }

    #[test]
    fn summary_mentions_fallback() {
        let mut result = DetectionResult::from_json(SAMPLE).unwrap();
        result.used_fallback = true;
        assert!(result.summary().contains("showing all detections"));
    }
}
