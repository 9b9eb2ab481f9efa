//! Geometric overlay and interaction engine for inspecting object-detection
//! results on top of the source image.

pub mod clipboard;
pub mod config;
pub mod detection;
pub mod error;
pub mod export;
pub mod format;
pub mod interaction;
pub mod mapper;
pub mod render;
pub mod ruler;
pub mod scaling;
pub mod session;

pub use detection::{Detection, DetectionId, DetectionResult, ImageExtents};
pub use error::{InspectorError, Result};
pub use format::CoordinateFormat;
pub use session::Session;
