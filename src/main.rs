use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use image::DynamicImage;

use detection_inspector::clipboard::{ArboardClipboard, CopyOutcome};
use detection_inspector::config::ViewerConfig;
use detection_inspector::export::ExportField;
use detection_inspector::mapper::to_client_space;
use detection_inspector::render::{OverlayFrame, RULER_COLOR};
use detection_inspector::{
    CoordinateFormat, DetectionId, DetectionResult, ImageExtents, InspectorError, Session,
};

const DEFAULT_VIEWPORT_HEIGHT: f32 = 800.0;
const CORNER_MARKER_RADIUS: f32 = 3.0;
const LABEL_FONT_SIZE: f32 = 12.0;

// ── CLI ─────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "detection-inspector",
    about = "Inspect object detections on their source image"
)]
struct Args {
    /// Source image the detections were computed on
    #[arg(long)]
    image: Option<PathBuf>,
    /// Detector response (JSON)
    #[arg(long)]
    result: Option<PathBuf>,
    /// Viewer config (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Show the image at its original pixel size
    #[arg(long)]
    exact_dimensions: bool,
    /// Initial coordinate format: pixels, percentage or normalized
    #[arg(long)]
    format: Option<CoordinateFormat>,
}

// ── Popup actions ───────────────────────────────────────────────────────────

enum PopupAction {
    Copy(DetectionId, ExportField),
    Close,
}

// ── App ─────────────────────────────────────────────────────────────────────

struct InspectorApp {
    config: ViewerConfig,
    image_path: Option<PathBuf>,
    raw_image: Option<DynamicImage>,
    texture: Option<egui::TextureHandle>,
    session: Option<Session>,
    clipboard: ArboardClipboard,
    viewport_height: f32,
    load_error: Option<String>,
}

impl InspectorApp {
    fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            image_path: None,
            raw_image: None,
            texture: None,
            session: None,
            clipboard: ArboardClipboard::new(),
            viewport_height: DEFAULT_VIEWPORT_HEIGHT,
            load_error: None,
        }
    }

    fn open_image(&mut self, path: &Path) -> Result<()> {
        let img = image::open(path)
            .map_err(InspectorError::ImageDecode)
            .with_context(|| format!("cannot open image {}", path.display()))?;
        let extents = ImageExtents::new(img.width() as f32, img.height() as f32);
        log::info!("opened image {} ({}x{})", path.display(), img.width(), img.height());

        if let Some(session) = self.session.as_mut() {
            if session.result().detections.is_empty() {
                session.load_result(DetectionResult::empty(extents));
            } else {
                if session.image_extents() != extents {
                    log::warn!(
                        "image is {}x{} but detections refer to {}x{}",
                        extents.width,
                        extents.height,
                        session.image_extents().width,
                        session.image_extents().height
                    );
                }
                session.reset_interaction();
            }
        } else {
            self.session = Some(Session::new(
                DetectionResult::empty(extents),
                &self.config,
                self.viewport_height,
            ));
        }

        self.image_path = Some(path.to_path_buf());
        self.raw_image = Some(img);
        self.texture = None;
        Ok(())
    }

    fn open_result(&mut self, path: &Path) -> Result<()> {
        let result = DetectionResult::load(path)
            .with_context(|| format!("cannot load detections from {}", path.display()))?;
        if let Some(session) = self.session.as_mut() {
            session.load_result(result);
        } else {
            self.session = Some(Session::new(result, &self.config, self.viewport_height));
        }
        Ok(())
    }

    fn report(&mut self, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.load_error = None,
            Err(err) => {
                log::error!("{err:#}");
                self.load_error = Some(format!("{err:#}"));
            }
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        if let Some(ref img) = self.raw_image {
            let rgba = img.to_rgba8();
            let size = [rgba.width() as usize, rgba.height() as usize];
            let pixels = rgba.as_flat_samples();
            let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
            self.texture =
                Some(ctx.load_texture("image", color_image, egui::TextureOptions::LINEAR));
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        ctx.input(|i| {
            if i.key_pressed(egui::Key::R) {
                session.toggle_ruler_mode();
            }
            if i.key_pressed(egui::Key::F) {
                session.cycle_format();
            }
            if i.key_pressed(egui::Key::Escape) {
                session.close_popup();
            }
        });
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open image…").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Image", &["png", "jpg", "jpeg", "bmp", "webp"])
                    .pick_file()
                {
                    let outcome = self.open_image(&path);
                    self.report(outcome);
                }
            }
            if ui.button("Open detections…").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Detections", &["json"])
                    .pick_file()
                {
                    let outcome = self.open_result(&path);
                    self.report(outcome);
                }
            }

            let Some(session) = self.session.as_mut() else {
                return;
            };

            ui.separator();
            let mut ruler_on = session.controller().ruler_mode();
            if ui.toggle_value(&mut ruler_on, "Ruler").changed() {
                session.toggle_ruler_mode();
            }
            if ui.button("Clear ruler").clicked() {
                session.clear_ruler();
            }
            if session.controller().ruler().distance().is_some()
                && ui.button("Copy distance").clicked()
            {
                session.copy_ruler(&mut self.clipboard, Instant::now());
            }

            ui.separator();
            let mut format = session.format();
            for candidate in CoordinateFormat::ALL {
                ui.selectable_value(&mut format, candidate, candidate.label());
            }
            if format != session.format() {
                session.set_format(format);
            }

            ui.separator();
            let mut exact = session.exact_dimensions();
            if ui.checkbox(&mut exact, "Exact dimensions").changed() {
                session.set_exact_dimensions(exact);
            }

            ui.separator();
            if ui.button("Copy all").clicked() {
                session.copy_all(&mut self.clipboard, Instant::now());
            }
        });
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(ref err) = self.load_error {
                ui.colored_label(egui::Color32::from_rgb(239, 68, 68), err.as_str());
                ui.separator();
            }
            let Some(session) = self.session.as_ref() else {
                ui.label("Open an image and a detection result to begin");
                return;
            };
            let display = session.display_extents();
            let factors = session.factors();
            ui.label(format!(
                "Display {}x{} (scale {:.4}, {:.4})",
                display.width, display.height, factors.x, factors.y
            ));
            ui.separator();
            match session.pointer_readout() {
                Some(text) => ui.label(format!("Pointer: {text}")),
                None => ui.label("Pointer: –"),
            };
            if let Some(distance) = session.ruler_distance_label() {
                ui.separator();
                ui.label(format!("Distance: {distance}"));
            }
            if let Some(notice) = session.notice(Instant::now()) {
                ui.separator();
                let color = match notice.outcome {
                    CopyOutcome::Copied => egui::Color32::from_rgb(34, 197, 94),
                    CopyOutcome::NotCopied => egui::Color32::from_rgb(239, 68, 68),
                };
                ui.colored_label(color, notice.message());
            }
        });
    }

    fn detection_list(&mut self, ui: &mut egui::Ui) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        ui.heading("Detections");
        ui.label(session.result().summary());
        if session.result().has_annotated_reference() {
            ui.small("Annotated reference image available");
        }
        ui.separator();

        let selected = session.controller().selected();
        let rows: Vec<(DetectionId, String, i64, bool)> = session
            .result()
            .detections
            .iter()
            .map(|d| (d.id, d.class_name.clone(), d.confidence_percent(), d.matched_request))
            .collect();
        let mut clicked = None;

        TableBuilder::new(ui)
            .striped(true)
            .column(Column::auto())
            .column(Column::remainder())
            .column(Column::auto())
            .column(Column::auto())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                header.col(|ui| {
                    ui.strong("Class");
                });
                header.col(|ui| {
                    ui.strong("Conf.");
                });
                header.col(|ui| {
                    ui.strong("Match");
                });
            })
            .body(|mut body| {
                for (id, class_name, confidence, matched) in &rows {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(id.to_string());
                        });
                        row.col(|ui| {
                            if ui
                                .selectable_label(selected == Some(*id), class_name.as_str())
                                .clicked()
                            {
                                clicked = Some(*id);
                            }
                        });
                        row.col(|ui| {
                            ui.label(format!("{confidence}%"));
                        });
                        row.col(|ui| {
                            ui.label(if *matched { "yes" } else { "fallback" });
                        });
                    });
                }
            });

        if let Some(id) = clicked {
            session.select(id);
        }
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let size = session.display_extents().to_vec2();
        egui::ScrollArea::both().show(ui, |ui| {
            let (response, painter) = ui.allocate_painter(size, egui::Sense::click());
            let surface = response.rect;
            session.mount_surface(surface);

            painter.rect_filled(surface, 0.0, egui::Color32::from_gray(40));
            if let Some(ref tex) = self.texture {
                painter.image(
                    tex.id(),
                    surface,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            match response.hover_pos() {
                Some(pos) => session.pointer_moved(pos),
                None if session.controller().pointer().is_some() => session.pointer_left(),
                None => {}
            }
            if response.clicked() {
                if let Some(pos) = response.interact_pointer_pos() {
                    session.clicked(pos);
                }
            }

            paint_overlay(&painter, &session.frame(), surface);
        });
    }

    fn popup(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(popup) = session.controller().popup() else {
            return;
        };
        let rows = session.popup_rows(popup.detection_id);
        let mut action = None;

        egui::Area::new(egui::Id::new("coordinate_popup"))
            .fixed_pos(popup.anchor + egui::vec2(12.0, 12.0))
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    egui::Grid::new("coordinate_rows").num_columns(2).show(ui, |ui| {
                        for (name, value) in &rows {
                            ui.strong(*name);
                            ui.label(value.as_str());
                            ui.end_row();
                        }
                    });
                    ui.separator();
                    ui.horizontal(|ui| {
                        for field in ExportField::ALL {
                            if ui.small_button(format!("Copy {}", field.label())).clicked() {
                                action = Some(PopupAction::Copy(popup.detection_id, field));
                            }
                        }
                        if ui.small_button("Close").clicked() {
                            action = Some(PopupAction::Close);
                        }
                    });
                });
            });

        let Some(session) = self.session.as_mut() else {
            return;
        };
        match action {
            Some(PopupAction::Copy(id, field)) => {
                session.copy_field(&mut self.clipboard, id, field, Instant::now())
            }
            Some(PopupAction::Close) => session.close_popup(),
            None => {}
        }
    }

    fn tooltip(&self, ctx: &egui::Context) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(tooltip) = session.controller().tooltip() else {
            return;
        };
        let lines = session.tooltip_lines(tooltip.detection_id);
        egui::Area::new(egui::Id::new("hover_tooltip"))
            .fixed_pos(tooltip.anchor + egui::vec2(14.0, 14.0))
            .order(egui::Order::Tooltip)
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    for line in &lines {
                        ui.label(line.as_str());
                    }
                });
            });
    }
}

// ── Painting ────────────────────────────────────────────────────────────────

fn paint_label(painter: &egui::Painter, anchor: egui::Pos2, text: &str, background: egui::Color32) {
    let galley = painter.layout_no_wrap(
        text.to_owned(),
        egui::FontId::proportional(LABEL_FONT_SIZE),
        egui::Color32::WHITE,
    );
    let rect = egui::Align2::LEFT_BOTTOM.anchor_size(anchor, galley.size());
    painter.rect_filled(rect.expand(2.0), 2.0, background);
    painter.galley(rect.min, galley, egui::Color32::WHITE);
}

fn paint_overlay(painter: &egui::Painter, frame: &OverlayFrame, surface: egui::Rect) {
    let to_client = |p: egui::Pos2| to_client_space(p, surface);

    for overlay in &frame.detections {
        let color = overlay.style.effective_color();
        let stroke = egui::Stroke::new(overlay.style.width, color);
        let points: Vec<egui::Pos2> = overlay.polygon.iter().map(|p| to_client(*p)).collect();

        if overlay.style.dashed {
            let mut closed = points.clone();
            closed.push(points[0]);
            painter.extend(egui::Shape::dashed_line(&closed, stroke, 6.0, 4.0));
        } else {
            painter.add(egui::Shape::closed_line(points, stroke));
        }

        for corner in &overlay.corner_markers {
            painter.circle_filled(to_client(*corner), CORNER_MARKER_RADIUS, color);
        }

        if let Some(crosshair) = overlay.crosshair {
            for [a, b] in crosshair.segments() {
                painter.line_segment([to_client(a), to_client(b)], egui::Stroke::new(2.0, color));
            }
        }

        paint_label(painter, to_client(overlay.label.anchor), &overlay.label.text, color);
    }

    let ruler = &frame.ruler;
    if let Some([a, b]) = ruler.line {
        painter.line_segment([to_client(a), to_client(b)], egui::Stroke::new(2.0, RULER_COLOR));
    }
    for marker in &ruler.markers {
        painter.circle_stroke(to_client(*marker), 5.0, egui::Stroke::new(2.0, RULER_COLOR));
        painter.circle_filled(to_client(*marker), 2.0, RULER_COLOR);
    }
    if let Some(ref label) = ruler.label {
        paint_label(
            painter,
            to_client(label.anchor),
            &label.text,
            egui::Color32::from_black_alpha(200),
        );
    }
}

// ── eframe App impl ─────────────────────────────────────────────────────────

impl eframe::App for InspectorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_texture(ctx);

        let viewport_height = ctx.screen_rect().height();
        if viewport_height != self.viewport_height {
            self.viewport_height = viewport_height;
            if let Some(session) = self.session.as_mut() {
                session.viewport_resized(viewport_height);
            }
        }

        self.handle_keys(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status_bar(ui));
        egui::SidePanel::right("detections")
            .default_width(280.0)
            .show(ctx, |ui| self.detection_list(ui));
        egui::CentralPanel::default().show(ctx, |ui| self.canvas(ui));

        self.tooltip(ctx);
        self.popup(ctx);

        if let Some(session) = self.session.as_ref() {
            if session.notice(Instant::now()).is_some() {
                ctx.request_repaint_after(Duration::from_millis(250));
            }
        }
    }
}

// ── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = ViewerConfig::load(args.config.as_deref()).context("cannot load config")?;
    if args.exact_dimensions {
        config.display.exact_dimensions = true;
    }
    if let Some(format) = args.format {
        config.display.coordinate_format = format;
    }

    let mut app = InspectorApp::new(config);
    if let Some(ref path) = args.result {
        app.open_result(path)?;
    }
    if let Some(ref path) = args.image {
        app.open_image(path)?;
    }

    let title = match app.image_path.as_deref().and_then(Path::file_name) {
        Some(name) => format!("detection-inspector - {}", name.to_string_lossy()),
        None => "detection-inspector".to_string(),
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_title(&title),
        ..Default::default()
    };

    eframe::run_native(&title, options, Box::new(move |_cc| Ok(Box::new(app))))
        .map_err(|err| anyhow!("viewer failed: {err}"))
}
