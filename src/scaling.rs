//! Fit-to-viewport scaling from image space into display space.

use egui::Vec2;

use crate::detection::ImageExtents;

/// Multipliers taking image coordinates to display coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleFactors {
    pub x: f32,
    pub y: f32,
}

impl ScaleFactors {
    pub const IDENTITY: ScaleFactors = ScaleFactors { x: 1.0, y: 1.0 };

    pub fn between(image: ImageExtents, display: ImageExtents) -> Self {
        if image.width <= 0.0 || image.height <= 0.0 {
            return Self::IDENTITY;
        }
        Self {
            x: display.width / image.width,
            y: display.height / image.height,
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        egui::vec2(self.x, self.y)
    }
}

impl Default for ScaleFactors {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Display extents for an image under a height cap. Never upscales. A cap
/// that is not a positive finite number is ignored.
pub fn compute_display_extents(
    image: ImageExtents,
    max_height: f32,
    exact_dimensions: bool,
) -> ImageExtents {
    let usable_cap = max_height.is_finite() && max_height > 0.0;
    if exact_dimensions || !usable_cap || image.height <= max_height || image.height <= 0.0 {
        return image;
    }
    let width = (max_height * image.width / image.height).round();
    ImageExtents::new(width, max_height)
}

/// Inputs to one scaling computation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleInputs {
    pub image: ImageExtents,
    pub max_height: f32,
    pub exact_dimensions: bool,
}

/// Result of the most recent completed recomputation. Extents and factors
/// are always replaced together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleSnapshot {
    pub inputs: ScaleInputs,
    pub display: ImageExtents,
    pub factors: ScaleFactors,
}

impl ScaleSnapshot {
    pub fn compute(inputs: ScaleInputs) -> Self {
        let display =
            compute_display_extents(inputs.image, inputs.max_height, inputs.exact_dimensions);
        let factors = if inputs.exact_dimensions {
            ScaleFactors::IDENTITY
        } else {
            ScaleFactors::between(inputs.image, display)
        };
        Self {
            inputs,
            display,
            factors,
        }
    }
}

/// Holds the current scale snapshot and recomputes it when any input changes.
#[derive(Clone, Debug)]
pub struct ScalingEngine {
    snapshot: ScaleSnapshot,
}

impl ScalingEngine {
    pub fn new(image: ImageExtents, max_height: f32, exact_dimensions: bool) -> Self {
        Self {
            snapshot: ScaleSnapshot::compute(ScaleInputs {
                image,
                max_height,
                exact_dimensions,
            }),
        }
    }

    pub fn snapshot(&self) -> ScaleSnapshot {
        self.snapshot
    }

    pub fn factors(&self) -> ScaleFactors {
        self.snapshot.factors
    }

    pub fn display_extents(&self) -> ImageExtents {
        self.snapshot.display
    }

    pub fn image_extents(&self) -> ImageExtents {
        self.snapshot.inputs.image
    }

    pub fn set_image(&mut self, image: ImageExtents) -> bool {
        self.update(ScaleInputs {
            image,
            ..self.snapshot.inputs
        })
    }

    pub fn set_max_height(&mut self, max_height: f32) -> bool {
        self.update(ScaleInputs {
            max_height,
            ..self.snapshot.inputs
        })
    }

    pub fn set_exact_dimensions(&mut self, exact_dimensions: bool) -> bool {
        self.update(ScaleInputs {
            exact_dimensions,
            ..self.snapshot.inputs
        })
    }

    /// Returns whether the snapshot changed.
    fn update(&mut self, inputs: ScaleInputs) -> bool {
        if inputs == self.snapshot.inputs {
            return false;
        }
        let next = ScaleSnapshot::compute(inputs);
        log::debug!(
            "display extents {}x{} (scale {:.4}, {:.4})",
            next.display.width,
            next.display.height,
            next.factors.x,
            next.factors.y
        );
        self.snapshot = next;
        true
    }
}
