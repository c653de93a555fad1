//! Puzzle pieces: centroid-anchored contours with rotation and completion.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::geom2::{centroid_or_mean, Affine2, Point};

/// One piece. `points` are relative to the centroid `(x, y)`; the index of a
/// piece in its session's array is its identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PuzzlePiece {
    pub points: Vec<Point>,
    pub x: f64,
    pub y: f64,
    /// Degrees, counterclockwise.
    pub rotation: f64,
    /// Rotation assigned when the piece was scattered.
    pub original_rotation: f64,
    pub is_completed: bool,
}

impl PuzzlePiece {
    /// Anchor a world-space fragment at its area centroid.
    pub fn from_world(ring: &[Point]) -> Option<Self> {
        let c = centroid_or_mean(ring)?;
        Some(Self {
            points: ring.iter().map(|p| p.with_vec(p.vec() - c)).collect(),
            x: c.x,
            y: c.y,
            rotation: 0.0,
            original_rotation: 0.0,
            is_completed: false,
        })
    }

    #[inline]
    pub fn position(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    #[inline]
    pub fn set_position(&mut self, p: Vector2<f64>) {
        self.x = p.x;
        self.y = p.y;
    }

    /// Completed pieces are locked in place.
    #[inline]
    pub fn is_selectable(&self) -> bool {
        !self.is_completed
    }

    /// Contour in canvas coordinates, with rotation applied about the centroid.
    pub fn world_points(&self) -> Vec<Point> {
        let c = self.position();
        let rot = Affine2::rotation_about(Vector2::zeros(), self.rotation);
        self.points
            .iter()
            .map(|p| p.with_vec(rot.apply_vector(p.vec()) + c))
            .collect()
    }

    /// Contour in canvas coordinates as if the rotation were undone.
    pub fn unrotated_world_points(&self) -> Vec<Point> {
        let c = self.position();
        self.points.iter().map(|p| p.with_vec(p.vec() + c)).collect()
    }

    /// Empty pieces and non-finite coordinates cannot be transformed safely.
    pub fn is_well_formed(&self) -> bool {
        !self.points.is_empty()
            && self.x.is_finite()
            && self.y.is_finite()
            && self.rotation.is_finite()
            && self.points.iter().all(Point::is_finite)
    }
}

/// Map an angle in degrees to `[0, 360)`.
#[inline]
pub fn normalize_degrees(deg: f64) -> f64 {
    let r = deg.rem_euclid(360.0);
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Vec<Point> {
        vec![
            Point::original(0.0, 0.0),
            Point::original(2.0, 0.0),
            Point::original(2.0, 2.0),
            Point::original(0.0, 2.0),
        ]
    }

    #[test]
    fn anchored_at_centroid() {
        let p = PuzzlePiece::from_world(&unit_square()).unwrap();
        assert!((p.x - 1.0).abs() < 1e-12 && (p.y - 1.0).abs() < 1e-12);
        assert!((p.points[0].x + 1.0).abs() < 1e-12);
        assert!(p.points.iter().all(|q| q.is_original));
        assert!(p.is_selectable());
        assert!(PuzzlePiece::from_world(&[]).is_none());
    }

    #[test]
    fn world_points_rotate_about_centroid() {
        let mut p = PuzzlePiece::from_world(&unit_square()).unwrap();
        p.rotation = 90.0;
        let w = p.world_points();
        // (0,0) is (-1,-1) from the centroid; +90° maps it to (1,-1)
        assert!((w[0].x - 2.0).abs() < 1e-12 && (w[0].y - 0.0).abs() < 1e-12);
        assert_eq!(p.unrotated_world_points(), unit_square());
    }

    #[test]
    fn well_formed_rejects_nan_and_empty() {
        let mut p = PuzzlePiece::from_world(&unit_square()).unwrap();
        assert!(p.is_well_formed());
        p.points[1].y = f64::NAN;
        assert!(!p.is_well_formed());
        p.points.clear();
        assert!(!p.is_well_formed());
    }

    #[test]
    fn degrees_wrap() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert_eq!(normalize_degrees(45.0), 45.0);
    }
}
