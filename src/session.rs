//! One inspection session: a detection result plus everything derived from
//! it. The viewer drives it with pointer events and reads back an
//! [`OverlayFrame`] and text to draw.

use std::time::{Duration, Instant};

use egui::{Pos2, Rect};

use crate::clipboard::{copy_with_notice, CopyNotice, CopyOutcome, TextClipboard};
use crate::config::{DisplayConfig, ViewerConfig};
use crate::detection::{Detection, DetectionId, DetectionResult, ImageExtents};
use crate::export::{detection_text, result_json, ExportField};
use crate::format::{format_area, format_point, format_value, with_unit, Axis, CoordinateFormat};
use crate::interaction::{ClickOutcome, InteractionController};
use crate::mapper::{to_image_space, to_surface_local};
use crate::render::{label_text, render_detections, render_ruler, OverlayFrame};
use crate::scaling::{ScaleFactors, ScalingEngine};

pub struct Session {
    result: DetectionResult,
    scaling: ScalingEngine,
    controller: InteractionController,
    display_config: DisplayConfig,
    notice_ttl: Duration,
    /// Client rect of the mounted display surface.
    surface: Option<Rect>,
    notice: Option<CopyNotice>,
}

impl Session {
    pub fn new(result: DetectionResult, config: &ViewerConfig, viewport_height: f32) -> Self {
        let display_config = config.display.clone();
        let scaling = ScalingEngine::new(
            result.image_dimensions,
            display_config.max_height_for(viewport_height),
            display_config.exact_dimensions,
        );
        let controller = InteractionController::new(
            result.detections.iter().map(|d| d.id),
            display_config.coordinate_format,
        );
        Self {
            result,
            scaling,
            controller,
            display_config,
            notice_ttl: config.notice.duration(),
            surface: None,
            notice: None,
        }
    }

    /// Replaces the detection set. All interaction state tied to the old set
    /// is dropped before anything can be rendered from the new one.
    pub fn load_result(&mut self, result: DetectionResult) {
        self.scaling.set_image(result.image_dimensions);
        self.controller
            .replace_detections(result.detections.iter().map(|d| d.id));
        log::info!(
            "showing {} detections on {}x{} image",
            result.detections.len(),
            result.image_dimensions.width,
            result.image_dimensions.height
        );
        self.result = result;
    }

    /// Drops hover, selection, popup and ruler points for the current set,
    /// e.g. when the underlying image is swapped.
    pub fn reset_interaction(&mut self) {
        self.controller
            .replace_detections(self.result.detections.iter().map(|d| d.id));
    }

    pub fn result(&self) -> &DetectionResult {
        &self.result
    }

    pub fn detection(&self, id: DetectionId) -> Option<&Detection> {
        self.result.get(id)
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    // ── Scaling ─────────────────────────────────────────────────────────

    pub fn viewport_resized(&mut self, viewport_height: f32) {
        self.scaling
            .set_max_height(self.display_config.max_height_for(viewport_height));
    }

    pub fn set_exact_dimensions(&mut self, exact: bool) {
        self.display_config.exact_dimensions = exact;
        self.scaling.set_exact_dimensions(exact);
    }

    pub fn exact_dimensions(&self) -> bool {
        self.display_config.exact_dimensions
    }

    pub fn image_extents(&self) -> ImageExtents {
        self.scaling.image_extents()
    }

    pub fn display_extents(&self) -> ImageExtents {
        self.scaling.display_extents()
    }

    pub fn factors(&self) -> ScaleFactors {
        self.scaling.factors()
    }

    // ── Surface and pointer ─────────────────────────────────────────────

    pub fn mount_surface(&mut self, client_rect: Rect) {
        self.surface = Some(client_rect);
    }

    pub fn unmount_surface(&mut self) {
        self.surface = None;
    }

    pub fn surface(&self) -> Option<Rect> {
        self.surface
    }

    pub fn pointer_moved(&mut self, client: Pos2) {
        let image = to_image_space(client, self.surface, self.image_extents());
        let hit = self.hit_test(client);
        self.controller.pointer_moved(client, image, hit);
    }

    pub fn pointer_left(&mut self) {
        self.controller.pointer_left();
    }

    pub fn clicked(&mut self, client: Pos2) -> ClickOutcome {
        let image = to_image_space(client, self.surface, self.image_extents());
        let display = self
            .surface
            .map(|rect| to_surface_local(client, rect))
            .unwrap_or(Pos2::ZERO);
        let hit = self.hit_test(client);
        let outcome = self.controller.clicked(client, display, image, hit);
        log::debug!("click at {client:?}: {outcome:?}");
        outcome
    }

    fn hit_test(&self, client: Pos2) -> Option<DetectionId> {
        let rect = self.surface?;
        self.frame().hit_test(to_surface_local(client, rect))
    }

    // ── Commands ────────────────────────────────────────────────────────

    pub fn select(&mut self, id: DetectionId) {
        self.controller.select(id);
    }

    pub fn close_popup(&mut self) {
        self.controller.close_popup();
    }

    pub fn toggle_ruler_mode(&mut self) {
        self.controller.toggle_ruler_mode();
    }

    pub fn clear_ruler(&mut self) {
        self.controller.clear_ruler();
    }

    pub fn set_format(&mut self, format: CoordinateFormat) {
        self.controller.set_format(format);
    }

    pub fn cycle_format(&mut self) {
        self.controller.cycle_format();
    }

    pub fn format(&self) -> CoordinateFormat {
        self.controller.format()
    }

    // ── Output ──────────────────────────────────────────────────────────

    /// Overlay geometry for the current state, in surface-local coordinates.
    pub fn frame(&self) -> OverlayFrame {
        let factors = self.factors();
        let detections = render_detections(
            &self.result.detections,
            factors,
            self.controller.hovered(),
            self.controller.selected(),
        );
        let ruler = render_ruler(
            self.controller.ruler().points(),
            factors,
            self.ruler_distance_label(),
        );
        OverlayFrame { detections, ruler }
    }

    pub fn ruler_distance_text(&self) -> Option<String> {
        let distance = self.controller.ruler().distance()?;
        Some(format_value(
            distance,
            Axis::Magnitude,
            self.format(),
            self.image_extents(),
        ))
    }

    /// Ruler distance with its unit, for on-screen labels.
    pub fn ruler_distance_label(&self) -> Option<String> {
        self.ruler_distance_text()
            .map(|text| with_unit(text, self.format()))
    }

    /// Live pointer position in image space, formatted.
    pub fn pointer_readout(&self) -> Option<String> {
        let pointer = self.controller.pointer()?;
        Some(format_point(pointer.image, self.format(), self.image_extents()))
    }

    pub fn tooltip_lines(&self, id: DetectionId) -> Vec<String> {
        let Some(detection) = self.detection(id) else {
            return Vec::new();
        };
        let format = self.format();
        let extents = self.image_extents();
        let mut lines = vec![label_text(detection)];
        if let Some(pointer) = self.controller.pointer() {
            lines.push(format!("Pointer: {}", format_point(pointer.image, format, extents)));
        }
        lines.push(format!(
            "Size: {}",
            detection_text(detection, ExportField::Dimensions, format, extents)
        ));
        lines
    }

    /// Rows shown in the coordinate popup.
    pub fn popup_rows(&self, id: DetectionId) -> Vec<(&'static str, String)> {
        let Some(detection) = self.detection(id) else {
            return Vec::new();
        };
        let format = self.format();
        let extents = self.image_extents();
        let matched = if detection.matched_request {
            "requested"
        } else {
            "fallback"
        };
        vec![
            ("Class", detection.class_name.clone()),
            ("Confidence", format!("{}%", detection.confidence_percent())),
            ("Match", matched.to_string()),
            (
                "Bounding box",
                detection_text(detection, ExportField::BoundingBox, format, extents),
            ),
            (
                "Center",
                detection_text(detection, ExportField::Center, format, extents),
            ),
            (
                "Size",
                detection_text(detection, ExportField::Dimensions, format, extents),
            ),
            ("Area", format_area(detection.area, format, extents)),
        ]
    }

    // ── Clipboard ───────────────────────────────────────────────────────

    pub fn copy_field(
        &mut self,
        clipboard: &mut dyn TextClipboard,
        id: DetectionId,
        field: ExportField,
        now: Instant,
    ) {
        let Some(detection) = self.detection(id) else {
            return;
        };
        let text = detection_text(detection, field, self.format(), self.image_extents());
        self.notice = Some(copy_with_notice(
            clipboard,
            &text,
            field.label(),
            now,
            self.notice_ttl,
        ));
    }

    pub fn copy_all(&mut self, clipboard: &mut dyn TextClipboard, now: Instant) {
        self.notice = Some(match result_json(&self.result, self.format()) {
            Ok(text) => copy_with_notice(clipboard, &text, "all detections", now, self.notice_ttl),
            Err(err) => {
                log::warn!("export failed: {err}");
                CopyNotice::new(
                    CopyOutcome::NotCopied,
                    "all detections",
                    now,
                    self.notice_ttl,
                )
            }
        });
    }

    pub fn copy_ruler(&mut self, clipboard: &mut dyn TextClipboard, now: Instant) {
        let Some(text) = self.ruler_distance_text() else {
            return;
        };
        self.notice = Some(copy_with_notice(
            clipboard,
            &text,
            "distance",
            now,
            self.notice_ttl,
        ));
    }

    pub fn notice(&self, now: Instant) -> Option<&CopyNotice> {
        self.notice.as_ref().filter(|notice| notice.is_live(now))
    }
}
