use std::time::Instant;

use approx::assert_abs_diff_eq;
use egui::{pos2, vec2, Rect};

use detection_inspector::clipboard::{CopyOutcome, TextClipboard};
use detection_inspector::config::ViewerConfig;
use detection_inspector::detection::{BoundingBox, Detection};
use detection_inspector::format::{format_value, Axis};
use detection_inspector::interaction::InteractionPhase;
use detection_inspector::render::FALLBACK_COLOR;
use detection_inspector::ruler::RulerPhase;
use detection_inspector::{
    CoordinateFormat, DetectionResult, ImageExtents, InspectorError, Session,
};

struct RecordingClipboard {
    copied: Vec<String>,
    fail: bool,
}

impl TextClipboard for RecordingClipboard {
    fn copy_text(&mut self, text: &str) -> detection_inspector::Result<()> {
        if self.fail {
            return Err(InspectorError::Clipboard("no display".into()));
        }
        self.copied.push(text.to_owned());
        Ok(())
    }
}

fn detection(id: u32, class: &str, confidence: f32, bbox: [f32; 4], matched: bool) -> Detection {
    let [x1, y1, x2, y2] = bbox;
    Detection::from_bounding_box(id, class, confidence, BoundingBox::new(x1, y1, x2, y2), matched)
}

fn street_scene() -> DetectionResult {
    DetectionResult {
        detections: vec![
            detection(1, "car", 0.92, [100.0, 200.0, 300.0, 400.0], true),
            detection(2, "person", 0.81, [900.0, 300.0, 1000.0, 700.0], true),
            detection(3, "bicycle", 0.35, [1400.0, 600.0, 1700.0, 900.0], false),
        ],
        image_dimensions: ImageExtents::new(1920.0, 1080.0),
        matching_objects_found: 2,
        total_objects_found: 3,
        used_fallback: false,
        annotated_image_base64: None,
    }
}

/// 600px height cap, surface mounted at (40, 60).
fn mounted_session(result: DetectionResult) -> Session {
    let mut config = ViewerConfig::default();
    config.display.max_height = Some(600.0);
    let mut session = Session::new(result, &config, 1000.0);
    let size = session.display_extents().to_vec2();
    session.mount_surface(Rect::from_min_size(pos2(40.0, 60.0), size));
    session
}

fn client_for_image(session: &Session, x: f32, y: f32) -> egui::Pos2 {
    let f = session.factors();
    session.surface().unwrap().min + vec2(x * f.x, y * f.y)
}

#[test]
fn full_hd_image_fits_six_hundred_pixels() {
    let session = mounted_session(street_scene());
    assert_eq!(session.display_extents(), ImageExtents::new(1067.0, 600.0));
    let f = session.factors();
    assert_abs_diff_eq!(f.x, 0.5557, epsilon = 1e-3);
    assert_abs_diff_eq!(f.y, 0.5556, epsilon = 1e-3);
}

#[test]
fn selected_detection_geometry_in_display_space() {
    let mut session = mounted_session(street_scene());
    session.select(1);
    let frame = session.frame();
    let car = frame.get(1).unwrap();

    assert_abs_diff_eq!(car.polygon[0].x, 55.6, epsilon = 0.1);
    assert_abs_diff_eq!(car.polygon[0].y, 111.1, epsilon = 0.1);
    let crosshair = car.crosshair.unwrap();
    assert_abs_diff_eq!(crosshair.center.x, 111.1, epsilon = 0.1);
    assert_abs_diff_eq!(crosshair.center.y, 166.7, epsilon = 0.1);
    assert!(car.style.dashed);
    assert!(frame.get(2).unwrap().crosshair.is_none());
}

#[test]
fn ruler_distance_in_each_format() {
    let mut session = mounted_session(street_scene());
    session.toggle_ruler_mode();
    session.clicked(client_for_image(&session, 0.0, 0.0));
    session.clicked(client_for_image(&session, 300.0, 400.0));
    assert_eq!(session.controller().ruler_phase(), Some(RulerPhase::Complete));

    assert_eq!(session.ruler_distance_text().as_deref(), Some("500"));
    session.set_format(CoordinateFormat::Normalized);
    assert_eq!(session.ruler_distance_text().as_deref(), Some("0.260"));
    session.set_format(CoordinateFormat::Percentage);
    assert_eq!(session.ruler_distance_text().as_deref(), Some("26.0%"));
}

#[test]
fn third_ruler_click_starts_over() {
    let mut session = mounted_session(street_scene());
    session.toggle_ruler_mode();
    session.clicked(client_for_image(&session, 0.0, 0.0));
    session.clicked(client_for_image(&session, 300.0, 400.0));
    session.clicked(client_for_image(&session, 50.0, 50.0));

    let points = session.controller().ruler().points();
    assert_eq!(points.len(), 1);
    assert_abs_diff_eq!(points[0].image.x, 50.0, epsilon = 0.01);
    assert_eq!(session.ruler_distance_text(), None);
}

#[test]
fn new_result_clears_selection_and_ruler() {
    let mut session = mounted_session(street_scene());
    session.clicked(client_for_image(&session, 950.0, 500.0));
    assert_eq!(session.controller().selected(), Some(2));
    session.toggle_ruler_mode();
    session.clicked(client_for_image(&session, 10.0, 10.0));
    assert_eq!(session.controller().ruler().points().len(), 1);

    session.load_result(street_scene());
    assert_eq!(session.controller().selected(), None);
    assert_eq!(session.controller().popup(), None);
    assert!(session.controller().ruler().points().is_empty());
}

#[test]
fn hover_select_and_dismiss_flow() {
    let mut session = mounted_session(street_scene());
    let over_bicycle = client_for_image(&session, 1500.0, 700.0);

    session.pointer_moved(over_bicycle);
    assert_eq!(session.controller().phase(), InteractionPhase::Hovering(3));
    assert_eq!(session.controller().tooltip().unwrap().anchor, over_bicycle);

    session.clicked(over_bicycle);
    assert_eq!(
        session.controller().phase(),
        InteractionPhase::PopupOpen(3, over_bicycle)
    );
    assert_eq!(session.frame().get(3).unwrap().style.color, FALLBACK_COLOR);

    session.clicked(client_for_image(&session, 1200.0, 100.0));
    assert_eq!(session.controller().phase(), InteractionPhase::Idle);

    session.pointer_left();
    assert!(session.controller().tooltip().is_none());
    assert!(session.pointer_readout().is_none());
}

#[test]
fn empty_result_renders_nothing_and_never_hits() {
    let mut session = mounted_session(DetectionResult::empty(ImageExtents::new(800.0, 600.0)));
    assert!(session.frame().detections.is_empty());
    session.pointer_moved(pos2(100.0, 100.0));
    assert_eq!(session.controller().hovered(), None);
}

#[test]
fn copying_uses_current_format() {
    let mut session = mounted_session(street_scene());
    let mut clipboard = RecordingClipboard {
        copied: Vec::new(),
        fail: false,
    };
    let now = Instant::now();
    session.set_format(CoordinateFormat::Percentage);
    session.copy_field(
        &mut clipboard,
        1,
        detection_inspector::export::ExportField::Center,
        now,
    );
    assert_eq!(clipboard.copied, vec!["10.4%, 27.8%".to_string()]);

    clipboard.fail = true;
    session.copy_field(
        &mut clipboard,
        1,
        detection_inspector::export::ExportField::Center,
        now,
    );
    assert_eq!(session.notice(now).unwrap().outcome, CopyOutcome::NotCopied);
    assert_eq!(clipboard.copied.len(), 1);
}

#[test]
fn formatter_reference_values() {
    let extents = ImageExtents::new(1000.0, 1000.0);
    assert_eq!(format_value(123.456, Axis::X, CoordinateFormat::Percentage, extents), "12.3%");
    assert_eq!(format_value(123.456, Axis::X, CoordinateFormat::Normalized, extents), "0.123");
    assert_eq!(format_value(123.456, Axis::X, CoordinateFormat::Pixels, extents), "123");
}

#[test]
fn bundled_demo_result_loads() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/street_result.json");
    let result = DetectionResult::load(&path).unwrap();
    assert_eq!(result.detections.len(), 3);
    assert_eq!(result.summary(), "2 of 3 objects match the request");
    let session = mounted_session(result);
    assert!(session.frame().detections.iter().all(|d| !d.degraded));
}
