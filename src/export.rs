//! Clipboard text for detection coordinates.

use serde_json::{json, Value};

use crate::detection::{Detection, DetectionResult, ImageExtents, Point};
use crate::error::{InspectorError, Result};
use crate::format::{convert_value, format_point, format_value, Axis, CoordinateFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportField {
    BoundingBox,
    Center,
    Vertices,
    Dimensions,
}

impl ExportField {
    pub const ALL: [ExportField; 4] = [
        ExportField::BoundingBox,
        ExportField::Center,
        ExportField::Vertices,
        ExportField::Dimensions,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExportField::BoundingBox => "bounding box",
            ExportField::Center => "center",
            ExportField::Vertices => "vertices",
            ExportField::Dimensions => "dimensions",
        }
    }
}

pub fn detection_text(
    detection: &Detection,
    field: ExportField,
    format: CoordinateFormat,
    extents: ImageExtents,
) -> String {
    match field {
        ExportField::BoundingBox => {
            let b = detection.bounding_box;
            format!(
                "{}, {}",
                format_point(Point::new(b.x1, b.y1), format, extents),
                format_point(Point::new(b.x2, b.y2), format, extents)
            )
        }
        ExportField::Center => format_point(detection.center(), format, extents),
        ExportField::Vertices => {
            let v = detection.vertices;
            [
                ("top_left", v.top_left),
                ("top_right", v.top_right),
                ("bottom_right", v.bottom_right),
                ("bottom_left", v.bottom_left),
            ]
            .iter()
            .map(|(name, p)| format!("{name}: {}", format_point(*p, format, extents)))
            .collect::<Vec<_>>()
            .join("\n")
        }
        ExportField::Dimensions => format!(
            "{} x {}",
            format_value(detection.dimensions.width, Axis::X, format, extents),
            format_value(detection.dimensions.height, Axis::Y, format, extents)
        ),
    }
}

fn number(value: f32, axis: Axis, format: CoordinateFormat, extents: ImageExtents) -> Value {
    let converted = convert_value(value, axis, format, extents);
    match format {
        CoordinateFormat::Pixels => json!(converted as i64),
        _ => json!(converted),
    }
}

fn point_json(p: Point, format: CoordinateFormat, extents: ImageExtents) -> Value {
    json!({
        "x": number(p.x, Axis::X, format, extents),
        "y": number(p.y, Axis::Y, format, extents),
    })
}

pub fn detection_json(
    detection: &Detection,
    format: CoordinateFormat,
    extents: ImageExtents,
) -> Value {
    let b = detection.bounding_box;
    let v = detection.vertices;
    json!({
        "id": detection.id,
        "class_name": detection.class_name,
        "confidence": detection.confidence,
        "matched_request": detection.matched_request,
        "bounding_box": {
            "x1": number(b.x1, Axis::X, format, extents),
            "y1": number(b.y1, Axis::Y, format, extents),
            "x2": number(b.x2, Axis::X, format, extents),
            "y2": number(b.y2, Axis::Y, format, extents),
        },
        "vertices": {
            "top_left": point_json(v.top_left, format, extents),
            "top_right": point_json(v.top_right, format, extents),
            "bottom_right": point_json(v.bottom_right, format, extents),
            "bottom_left": point_json(v.bottom_left, format, extents),
        },
        "center": point_json(detection.center(), format, extents),
        "dimensions": {
            "width": number(detection.dimensions.width, Axis::X, format, extents),
            "height": number(detection.dimensions.height, Axis::Y, format, extents),
        },
    })
}

/// All detections of a result as pretty JSON in the given format.
pub fn result_json(result: &DetectionResult, format: CoordinateFormat) -> Result<String> {
    let extents = result.image_dimensions;
    let detections: Vec<Value> = result
        .detections
        .iter()
        .map(|d| detection_json(d, format, extents))
        .collect();
    let document = json!({
        "format": format,
        "image_dimensions": {
            "width": extents.width,
            "height": extents.height,
        },
        "detections": detections,
    });
    serde_json::to_string_pretty(&document).map_err(InspectorError::Export)
}
