//! Conversions between pointer, display and image coordinates.
//!
//! Pointer positions arrive in client space (window coordinates). The display
//! surface is the rectangle the scaled image occupies; display space is that
//! rectangle's local coordinate system. Image space is original pixels.

use egui::{pos2, Pos2, Rect};

use crate::detection::{ImageExtents, Point};
use crate::scaling::ScaleFactors;

/// Client point to image space. Without a mounted surface, or with an empty
/// one, the origin is returned.
pub fn to_image_space(client: Pos2, surface: Option<Rect>, image: ImageExtents) -> Point {
    let Some(rect) = surface else {
        return Point::new(0.0, 0.0);
    };
    if rect.width() <= 0.0 || rect.height() <= 0.0 {
        return Point::new(0.0, 0.0);
    }
    Point::new(
        (client.x - rect.left()) / rect.width() * image.width,
        (client.y - rect.top()) / rect.height() * image.height,
    )
}

/// Image point to surface-local display coordinates.
pub fn to_display_space(image_point: Point, factors: ScaleFactors) -> Pos2 {
    pos2(image_point.x * factors.x, image_point.y * factors.y)
}

/// Client point to surface-local display coordinates.
pub fn to_surface_local(client: Pos2, surface: Rect) -> Pos2 {
    pos2(client.x - surface.left(), client.y - surface.top())
}

/// Surface-local display coordinates back to client space, for painting.
pub fn to_client_space(local: Pos2, surface: Rect) -> Pos2 {
    surface.min + local.to_vec2()
}
