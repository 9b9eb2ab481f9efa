//! Hover, selection, popup and ruler state machine.
//!
//! The controller is fed already-resolved pointer events: the client
//! position, its image-space translation and the detection under it (if
//! any). It never looks at geometry itself.

use std::collections::HashSet;

use egui::Pos2;

use crate::detection::{DetectionId, Point};
use crate::format::CoordinateFormat;
use crate::ruler::{Ruler, RulerPhase, RulerPoint};

/// Coordinate popup opened by clicking a detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Popup {
    pub detection_id: DetectionId,
    /// Client position of the click that opened it.
    pub anchor: Pos2,
}

/// Hover tooltip. Follows the pointer, not the shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tooltip {
    pub detection_id: DetectionId,
    pub anchor: Pos2,
}

/// Last known pointer position over the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub client: Pos2,
    pub image: Point,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionPhase {
    Idle,
    Hovering(DetectionId),
    Selected(DetectionId),
    PopupOpen(DetectionId, Pos2),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClickOutcome {
    Selected(DetectionId),
    Cleared,
    Measured(RulerPhase),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionState {
    pub hovered: Option<DetectionId>,
    pub selected: Option<DetectionId>,
    pub popup: Option<Popup>,
    pub ruler_mode: bool,
    pub ruler: Ruler,
    pub coordinate_format: CoordinateFormat,
    pub pointer: Option<PointerSample>,
}

#[derive(Clone, Debug, Default)]
pub struct InteractionController {
    state: InteractionState,
    known_ids: HashSet<DetectionId>,
}

impl InteractionController {
    pub fn new(ids: impl IntoIterator<Item = DetectionId>, format: CoordinateFormat) -> Self {
        Self {
            state: InteractionState {
                coordinate_format: format,
                ..InteractionState::default()
            },
            known_ids: ids.into_iter().collect(),
        }
    }

    /// Switches to a new detection set. Hover, selection, popup, ruler
    /// points and the pointer sample are dropped; ruler mode and the
    /// coordinate format are preferences and survive.
    pub fn replace_detections(&mut self, ids: impl IntoIterator<Item = DetectionId>) {
        self.known_ids = ids.into_iter().collect();
        self.state = InteractionState {
            ruler_mode: self.state.ruler_mode,
            coordinate_format: self.state.coordinate_format,
            ..InteractionState::default()
        };
        log::debug!("interaction state reset for {} detections", self.known_ids.len());
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    // ── Pointer events ──────────────────────────────────────────────────

    pub fn pointer_moved(&mut self, client: Pos2, image: Point, hit: Option<DetectionId>) {
        self.state.pointer = Some(PointerSample { client, image });
        self.state.hovered = hit.filter(|id| self.known_ids.contains(id));
    }

    /// Pointer left the rendering surface.
    pub fn pointer_left(&mut self) {
        self.state.hovered = None;
        self.state.pointer = None;
    }

    pub fn clicked(
        &mut self,
        client: Pos2,
        display: Pos2,
        image: Point,
        hit: Option<DetectionId>,
    ) -> ClickOutcome {
        if self.state.ruler_mode {
            self.state.ruler.add_point(RulerPoint::new(display, image));
            return ClickOutcome::Measured(self.state.ruler.phase());
        }
        match hit.filter(|id| self.known_ids.contains(id)) {
            Some(id) => {
                self.state.selected = Some(id);
                self.state.popup = Some(Popup {
                    detection_id: id,
                    anchor: client,
                });
                ClickOutcome::Selected(id)
            }
            None => {
                self.clear_selection();
                ClickOutcome::Cleared
            }
        }
    }

    // ── Commands ────────────────────────────────────────────────────────

    /// Selects from outside the surface (e.g. a list). No popup is opened.
    pub fn select(&mut self, id: DetectionId) {
        if self.known_ids.contains(&id) {
            self.state.selected = Some(id);
            self.state.popup = None;
        }
    }

    pub fn clear_selection(&mut self) {
        self.state.selected = None;
        self.state.popup = None;
    }

    pub fn close_popup(&mut self) {
        self.state.popup = None;
    }

    /// Entering ruler mode starts a fresh measurement; leaving keeps it.
    pub fn set_ruler_mode(&mut self, on: bool) {
        if on && !self.state.ruler_mode {
            self.state.ruler.clear();
        }
        self.state.ruler_mode = on;
    }

    pub fn toggle_ruler_mode(&mut self) {
        self.set_ruler_mode(!self.state.ruler_mode);
    }

    pub fn clear_ruler(&mut self) {
        self.state.ruler.clear();
    }

    pub fn set_format(&mut self, format: CoordinateFormat) {
        self.state.coordinate_format = format;
    }

    pub fn cycle_format(&mut self) {
        self.state.coordinate_format = self.state.coordinate_format.next();
    }

    // ── Derived views ───────────────────────────────────────────────────
    // Ids absent from the current detection set read as "nothing".

    pub fn hovered(&self) -> Option<DetectionId> {
        self.state.hovered.filter(|id| self.known_ids.contains(id))
    }

    pub fn selected(&self) -> Option<DetectionId> {
        self.state.selected.filter(|id| self.known_ids.contains(id))
    }

    pub fn popup(&self) -> Option<Popup> {
        self.state
            .popup
            .filter(|popup| self.known_ids.contains(&popup.detection_id))
    }

    pub fn tooltip(&self) -> Option<Tooltip> {
        let detection_id = self.hovered()?;
        let pointer = self.state.pointer?;
        Some(Tooltip {
            detection_id,
            anchor: pointer.client,
        })
    }

    pub fn pointer(&self) -> Option<PointerSample> {
        self.state.pointer
    }

    pub fn ruler_mode(&self) -> bool {
        self.state.ruler_mode
    }

    pub fn ruler(&self) -> &Ruler {
        &self.state.ruler
    }

    /// Ruler progress, or `None` outside ruler mode.
    pub fn ruler_phase(&self) -> Option<RulerPhase> {
        self.state.ruler_mode.then(|| self.state.ruler.phase())
    }

    pub fn format(&self) -> CoordinateFormat {
        self.state.coordinate_format
    }

    pub fn phase(&self) -> InteractionPhase {
        if let Some(popup) = self.popup() {
            InteractionPhase::PopupOpen(popup.detection_id, popup.anchor)
        } else if let Some(id) = self.selected() {
            InteractionPhase::Selected(id)
        } else if let Some(id) = self.hovered() {
            InteractionPhase::Hovering(id)
        } else {
            InteractionPhase::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn controller() -> InteractionController {
        InteractionController::new([1, 2, 3], CoordinateFormat::Pixels)
    }

    fn img(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn hover_tracks_live_pointer() {
        let mut c = controller();
        c.pointer_moved(pos2(10.0, 10.0), img(20.0, 20.0), Some(2));
        assert_eq!(c.phase(), InteractionPhase::Hovering(2));
        c.pointer_moved(pos2(15.0, 12.0), img(30.0, 24.0), Some(2));
        assert_eq!(c.tooltip().unwrap().anchor, pos2(15.0, 12.0));
        c.pointer_moved(pos2(90.0, 90.0), img(180.0, 180.0), None);
        assert!(c.tooltip().is_none());
        assert!(c.pointer().is_some());
    }

    #[test]
    fn leaving_surface_clears_hover_and_pointer() {
        let mut c = controller();
        c.pointer_moved(pos2(10.0, 10.0), img(20.0, 20.0), Some(1));
        c.pointer_left();
        assert_eq!(c.hovered(), None);
        assert_eq!(c.pointer(), None);
        assert_eq!(c.phase(), InteractionPhase::Idle);
    }

    #[test]
    fn click_on_detection_opens_popup() {
        let mut c = controller();
        let outcome = c.clicked(pos2(5.0, 6.0), pos2(5.0, 6.0), img(10.0, 12.0), Some(3));
        assert_eq!(outcome, ClickOutcome::Selected(3));
        assert_eq!(c.selected(), Some(3));
        assert_eq!(c.phase(), InteractionPhase::PopupOpen(3, pos2(5.0, 6.0)));
    }

    #[test]
    fn background_click_clears_selection() {
        let mut c = controller();
        c.clicked(pos2(5.0, 6.0), pos2(5.0, 6.0), img(10.0, 12.0), Some(3));
        let outcome = c.clicked(pos2(50.0, 60.0), pos2(50.0, 60.0), img(100.0, 120.0), None);
        assert_eq!(outcome, ClickOutcome::Cleared);
        assert_eq!(c.selected(), None);
        assert_eq!(c.popup(), None);
    }

    #[test]
    fn ruler_clicks_do_not_select() {
        let mut c = controller();
        c.set_ruler_mode(true);
        let outcome = c.clicked(pos2(1.0, 1.0), pos2(1.0, 1.0), img(2.0, 2.0), Some(1));
        assert_eq!(outcome, ClickOutcome::Measured(RulerPhase::Arming(1)));
        assert_eq!(c.selected(), None);
        c.clicked(pos2(3.0, 1.0), pos2(3.0, 1.0), img(6.0, 2.0), None);
        assert_eq!(c.ruler_phase(), Some(RulerPhase::Complete));
        let outcome = c.clicked(pos2(9.0, 9.0), pos2(9.0, 9.0), img(18.0, 18.0), None);
        assert_eq!(outcome, ClickOutcome::Measured(RulerPhase::Arming(1)));
        assert_eq!(c.ruler().points()[0].image, img(18.0, 18.0));
    }

    #[test]
    fn entering_ruler_mode_clears_points_leaving_keeps_them() {
        let mut c = controller();
        c.set_ruler_mode(true);
        c.clicked(pos2(1.0, 1.0), pos2(1.0, 1.0), img(2.0, 2.0), None);
        c.toggle_ruler_mode();
        assert!(!c.ruler_mode());
        assert_eq!(c.ruler().points().len(), 1);
        assert_eq!(c.ruler_phase(), None);
        c.toggle_ruler_mode();
        assert!(c.ruler().points().is_empty());
    }

    #[test]
    fn hover_coexists_with_ruler_mode() {
        let mut c = controller();
        c.set_ruler_mode(true);
        c.pointer_moved(pos2(10.0, 10.0), img(20.0, 20.0), Some(1));
        assert_eq!(c.hovered(), Some(1));
    }

    #[test]
    fn format_change_keeps_everything_else() {
        let mut c = controller();
        c.clicked(pos2(5.0, 6.0), pos2(5.0, 6.0), img(10.0, 12.0), Some(3));
        let before = c.state().clone();
        c.cycle_format();
        assert_eq!(c.format(), CoordinateFormat::Percentage);
        assert_eq!(c.state().selected, before.selected);
        assert_eq!(c.state().popup, before.popup);
    }

    #[test]
    fn replacing_detections_drops_interaction_state() {
        let mut c = controller();
        c.set_format(CoordinateFormat::Normalized);
        c.clicked(pos2(5.0, 6.0), pos2(5.0, 6.0), img(10.0, 12.0), Some(2));
        c.set_ruler_mode(true);
        c.clicked(pos2(1.0, 1.0), pos2(1.0, 1.0), img(2.0, 2.0), None);

        c.replace_detections([10, 11]);
        assert_eq!(c.selected(), None);
        assert_eq!(c.popup(), None);
        assert!(c.ruler().points().is_empty());
        assert!(c.ruler_mode());
        assert_eq!(c.format(), CoordinateFormat::Normalized);
    }

    #[test]
    fn unknown_ids_read_as_nothing() {
        let mut c = controller();
        c.pointer_moved(pos2(1.0, 1.0), img(1.0, 1.0), Some(99));
        assert_eq!(c.hovered(), None);
        c.clicked(pos2(1.0, 1.0), pos2(1.0, 1.0), img(1.0, 1.0), Some(99));
        assert_eq!(c.popup(), None);
        c.select(42);
        assert_eq!(c.selected(), None);
    }

    #[test]
    fn select_from_list_has_no_popup() {
        let mut c = controller();
        c.select(1);
        assert_eq!(c.phase(), InteractionPhase::Selected(1));
    }
}
