//! Two-point distance measurement in image space.

use egui::Pos2;

use crate::detection::Point;

pub const MAX_RULER_POINTS: usize = 2;

/// A measurement point captured in both spaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RulerPoint {
    pub display: Pos2,
    pub image: Point,
}

impl RulerPoint {
    pub fn new(display: Pos2, image: Point) -> Self {
        Self { display, image }
    }
}

pub fn distance(a: &RulerPoint, b: &RulerPoint) -> f32 {
    let dx = b.image.x - a.image.x;
    let dy = b.image.y - a.image.y;
    (dx * dx + dy * dy).sqrt()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RulerPhase {
    Arming(usize),
    Complete,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Ruler {
    points: Vec<RulerPoint>,
}

impl Ruler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a point. A full ruler is restarted with only the new point
    /// rather than dropping its oldest point.
    pub fn add_point(&mut self, point: RulerPoint) {
        if self.points.len() >= MAX_RULER_POINTS {
            log::debug!("ruler full, restarting measurement");
            self.points.clear();
        }
        self.points.push(point);
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn points(&self) -> &[RulerPoint] {
        &self.points
    }

    pub fn phase(&self) -> RulerPhase {
        if self.points.len() >= MAX_RULER_POINTS {
            RulerPhase::Complete
        } else {
            RulerPhase::Arming(self.points.len())
        }
    }

    /// Image-space distance once both points are placed.
    pub fn distance(&self) -> Option<f32> {
        match self.points.as_slice() {
            [a, b] => Some(distance(a, b)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::pos2;

    fn point(x: f32, y: f32) -> RulerPoint {
        RulerPoint::new(pos2(x / 2.0, y / 2.0), Point::new(x, y))
    }

    #[test]
    fn measures_in_image_space() {
        let mut ruler = Ruler::new();
        ruler.add_point(point(0.0, 0.0));
        assert_eq!(ruler.distance(), None);
        ruler.add_point(point(300.0, 400.0));
        assert_eq!(ruler.distance(), Some(500.0));
    }

    #[test]
    fn display_positions_do_not_affect_distance() {
        let a = RulerPoint::new(pos2(0.0, 0.0), Point::new(0.0, 0.0));
        let b = RulerPoint::new(pos2(1.0, 1.0), Point::new(30.0, 40.0));
        assert_eq!(distance(&a, &b), 50.0);
    }

    #[test]
    fn third_point_restarts_measurement() {
        let mut ruler = Ruler::new();
        let p3 = point(7.0, 8.0);
        ruler.add_point(point(1.0, 2.0));
        ruler.add_point(point(3.0, 4.0));
        ruler.add_point(p3);
        assert_eq!(ruler.points(), &[p3]);
        assert_eq!(ruler.phase(), RulerPhase::Arming(1));
    }

    #[test]
    fn phase_tracks_point_count() {
        let mut ruler = Ruler::new();
        assert_eq!(ruler.phase(), RulerPhase::Arming(0));
        ruler.add_point(point(1.0, 1.0));
        ruler.add_point(point(2.0, 2.0));
        assert_eq!(ruler.phase(), RulerPhase::Complete);
        ruler.clear();
        assert_eq!(ruler.phase(), RulerPhase::Arming(0));
    }
}
