//! Textual coordinate representations.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::detection::{ImageExtents, Point};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordinateFormat {
    #[default]
    Pixels,
    Percentage,
    Normalized,
}

impl CoordinateFormat {
    pub const ALL: [CoordinateFormat; 3] = [
        CoordinateFormat::Pixels,
        CoordinateFormat::Percentage,
        CoordinateFormat::Normalized,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CoordinateFormat::Pixels => "Pixels",
            CoordinateFormat::Percentage => "Percentage",
            CoordinateFormat::Normalized => "Normalized",
        }
    }

    /// Unit shown next to a formatted value. Percentages carry their own `%`.
    pub fn unit(&self) -> &'static str {
        match self {
            CoordinateFormat::Pixels => "px",
            CoordinateFormat::Percentage | CoordinateFormat::Normalized => "",
        }
    }

    pub fn next(self) -> Self {
        match self {
            CoordinateFormat::Pixels => CoordinateFormat::Percentage,
            CoordinateFormat::Percentage => CoordinateFormat::Normalized,
            CoordinateFormat::Normalized => CoordinateFormat::Pixels,
        }
    }
}

impl fmt::Display for CoordinateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for CoordinateFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pixels" | "px" => Ok(CoordinateFormat::Pixels),
            "percentage" | "percent" | "%" => Ok(CoordinateFormat::Percentage),
            "normalized" | "norm" => Ok(CoordinateFormat::Normalized),
            other => Err(format!("unknown coordinate format: {other}")),
        }
    }
}

/// Which image extent a value is measured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    /// Direction-less length such as a ruler distance; uses the longest side.
    Magnitude,
}

impl Axis {
    fn extent(self, extents: ImageExtents) -> f32 {
        match self {
            Axis::X => extents.width,
            Axis::Y => extents.height,
            Axis::Magnitude => extents.longest_side(),
        }
    }
}

pub fn format_value(
    value: f32,
    axis: Axis,
    format: CoordinateFormat,
    extents: ImageExtents,
) -> String {
    format_ratio(value, axis.extent(extents), format)
}

/// `x, y` with each component normalised against its own axis.
pub fn format_point(point: Point, format: CoordinateFormat, extents: ImageExtents) -> String {
    format!(
        "{}, {}",
        format_value(point.x, Axis::X, format, extents),
        format_value(point.y, Axis::Y, format, extents)
    )
}

/// Area relative to the whole image in the relative formats.
pub fn format_area(area: f32, format: CoordinateFormat, extents: ImageExtents) -> String {
    format_ratio(area, extents.width * extents.height, format)
}

fn format_ratio(value: f32, extent: f32, format: CoordinateFormat) -> String {
    match format {
        CoordinateFormat::Pixels => format!("{}", round_to_int(value)),
        CoordinateFormat::Percentage => {
            format!("{:.1}%", round_places(ratio(value, extent) * 100.0, 1))
        }
        CoordinateFormat::Normalized => format!("{:.3}", round_places(ratio(value, extent), 3)),
    }
}

/// Rounds to `places` decimals; negative zero comes back as zero.
fn round_places(value: f32, places: i32) -> f32 {
    let scale = 10f32.powi(places);
    (value * scale).round() / scale + 0.0
}

/// Appends the format's unit, if it has one.
pub fn with_unit(text: String, format: CoordinateFormat) -> String {
    match format.unit() {
        "" => text,
        unit => format!("{text} {unit}"),
    }
}

/// Numeric form of [`format_value`], used when exporting structured data.
pub fn convert_value(
    value: f32,
    axis: Axis,
    format: CoordinateFormat,
    extents: ImageExtents,
) -> f64 {
    let ratio = ratio(value, axis.extent(extents)) as f64;
    match format {
        CoordinateFormat::Pixels => round_to_int(value) as f64,
        CoordinateFormat::Percentage => (ratio * 1000.0).round() / 10.0 + 0.0,
        CoordinateFormat::Normalized => (ratio * 1000.0).round() / 1000.0 + 0.0,
    }
}

fn round_to_int(value: f32) -> i64 {
    if value.is_finite() {
        value.round() as i64
    } else {
        0
    }
}

// A zero extent has no meaningful relative position.
fn ratio(value: f32, extent: f32) -> f32 {
    if extent > 0.0 && value.is_finite() {
        value / extent
    } else {
        0.0
    }
}
