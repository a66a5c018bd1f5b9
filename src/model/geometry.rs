//! Axis-aligned cuboid geometry: face areas, masked areas, and fit checks.

use serde::Serialize;

use super::face::{Face, FaceMap};

/// Outer dimensions of a rectangular body in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cuboid {
    pub length_m: f64,
    pub width_m: f64,
    pub height_m: f64,
}

impl Cuboid {
    pub fn new(length_m: f64, width_m: f64, height_m: f64) -> Self {
        Self {
            length_m,
            width_m,
            height_m,
        }
    }

    pub fn volume_m3(&self) -> f64 {
        self.length_m * self.width_m * self.height_m
    }

    /// Area of a single face in m².
    pub fn face_area_m2(&self, face: Face) -> f64 {
        match face {
            Face::Top | Face::Bottom => self.length_m * self.width_m,
            Face::North | Face::South => self.length_m * self.height_m,
            Face::East | Face::West => self.width_m * self.height_m,
        }
    }

    pub fn face_areas(&self) -> FaceMap<f64> {
        FaceMap::from_fn(|face| self.face_area_m2(face))
    }

    pub fn surface_area_m2(&self) -> f64 {
        self.face_areas().sum()
    }

    /// Sum of the face areas selected by `mask`.
    pub fn masked_area_m2(&self, mask: &FaceMap<bool>) -> f64 {
        mask.iter()
            .filter(|(_, on)| *on)
            .map(|(face, _)| self.face_area_m2(face))
            .sum()
    }

    /// Whether `self` fits inside `other` without rotation.
    pub fn fits_within(&self, other: &Cuboid) -> bool {
        self.length_m <= other.length_m
            && self.width_m <= other.width_m
            && self.height_m <= other.height_m
    }

    /// Whether every dimension is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.length_m, self.width_m, self.height_m]
            .iter()
            .all(|d| d.is_finite() && *d > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_areas_follow_orientation() {
        let c = Cuboid::new(0.9, 0.6, 0.3);
        assert!((c.face_area_m2(Face::Top) - 0.54).abs() < 1e-12);
        assert!((c.face_area_m2(Face::North) - 0.27).abs() < 1e-12);
        assert!((c.face_area_m2(Face::West) - 0.18).abs() < 1e-12);
    }

    #[test]
    fn surface_area_of_box_shell() {
        // 2 × (1.0·0.7 + 1.0·0.4 + 0.7·0.4) = 2.76 m²
        let c = Cuboid::new(1.0, 0.7, 0.4);
        assert!((c.surface_area_m2() - 2.76).abs() < 1e-12);
    }

    #[test]
    fn masked_area_skips_cleared_faces() {
        let c = Cuboid::new(0.9, 0.6, 0.3);
        let mut mask = FaceMap::all();
        mask[Face::Bottom] = false;
        let expected = c.surface_area_m2() - c.face_area_m2(Face::Bottom);
        assert!((c.masked_area_m2(&mask) - expected).abs() < 1e-12);
    }

    #[test]
    fn fits_and_validity() {
        let battery = Cuboid::new(0.9, 0.6, 0.3);
        let container = Cuboid::new(1.0, 0.7, 0.4);
        assert!(battery.fits_within(&container));
        assert!(!container.fits_within(&battery));
        assert!(!Cuboid::new(0.0, 1.0, 1.0).is_valid());
        assert!(!Cuboid::new(f64::NAN, 1.0, 1.0).is_valid());
    }
}
