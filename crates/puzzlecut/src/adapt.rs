//! Center-relative scaling between canvas sizes.
//!
//! Model
//! - `s = min(to) / min(from)`; a canvas point maps to
//!   `c_to + s · (p − c_from)`, i.e. the affine map `M = s·I`, `t = c_to − s·c_from`.
//! - Offsets that are not anchored to the canvas (centroid-relative piece
//!   vertices) only see the linear part `M`.
//! - Rotation, completion and every other non-geometric field pass through.
//!
//! This is the single rescale path for the shape, unscattered pieces and
//! (through `preserve`) scattered pieces.

use std::fmt;

use nalgebra::{Matrix2, Vector2};
use tracing::warn;

use crate::geom2::{Affine2, CanvasSize, Point};
use crate::piece::PuzzlePiece;
use crate::shape::Shape;

/// Adaptation failures.
#[derive(Clone, Debug, PartialEq)]
pub enum AdaptError {
    /// A canvas size is zero, negative or non-finite.
    InvalidCanvas { role: &'static str, size: CanvasSize },
    /// An element has no points.
    Empty,
    /// An element carries NaN or infinite coordinates.
    NonFinite,
}

impl fmt::Display for AdaptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCanvas { role, size } => write!(
                f,
                "invalid {role} canvas {}x{} (must be finite and positive)",
                size.width, size.height
            ),
            Self::Empty => write!(f, "element has no points"),
            Self::NonFinite => write!(f, "element has non-finite coordinates"),
        }
    }
}

impl std::error::Error for AdaptError {}

/// Center-relative scale transform from one canvas to another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CenterScale {
    pub from: CanvasSize,
    pub to: CanvasSize,
    pub scale: f64,
    map: Affine2,
}

impl CenterScale {
    pub fn between(from: CanvasSize, to: CanvasSize) -> Result<Self, AdaptError> {
        if !from.is_valid() {
            return Err(AdaptError::InvalidCanvas { role: "source", size: from });
        }
        if !to.is_valid() {
            return Err(AdaptError::InvalidCanvas { role: "target", size: to });
        }
        let scale = to.min_edge() / from.min_edge();
        let map = Affine2 {
            m: Matrix2::identity() * scale,
            t: to.center() - from.center() * scale,
        };
        Ok(Self { from, to, scale, map })
    }

    /// `from == to`: callers skip the arithmetic entirely.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// Canvas point.
    #[inline]
    pub fn point(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.map.apply(p)
    }

    /// Canvas-independent offset.
    #[inline]
    pub fn offset(&self, v: Vector2<f64>) -> Vector2<f64> {
        self.map.apply_vector(v)
    }

    pub fn inverse(&self) -> Self {
        // both sizes were validated on construction
        let scale = 1.0 / self.scale;
        Self {
            from: self.to,
            to: self.from,
            scale,
            map: Affine2 {
                m: Matrix2::identity() * scale,
                t: self.from.center() - self.to.center() * scale,
            },
        }
    }
}

/// Anything with canvas-anchored geometry.
pub trait Adaptable: Clone {
    /// Transform one element; rejects empty or non-finite input.
    fn adapt_with(&self, cs: &CenterScale) -> Result<Self, AdaptError>;
}

impl Adaptable for Point {
    fn adapt_with(&self, cs: &CenterScale) -> Result<Self, AdaptError> {
        if !self.is_finite() {
            return Err(AdaptError::NonFinite);
        }
        Ok(self.with_vec(cs.point(self.vec())))
    }
}

impl Adaptable for Shape {
    fn adapt_with(&self, cs: &CenterScale) -> Result<Self, AdaptError> {
        if self.points.is_empty() {
            return Err(AdaptError::Empty);
        }
        let points = self
            .points
            .iter()
            .map(|p| p.adapt_with(cs))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Shape {
            kind: self.kind,
            points,
        })
    }
}

impl Adaptable for PuzzlePiece {
    fn adapt_with(&self, cs: &CenterScale) -> Result<Self, AdaptError> {
        if self.points.is_empty() {
            return Err(AdaptError::Empty);
        }
        if !self.is_well_formed() {
            return Err(AdaptError::NonFinite);
        }
        let mut out = self.clone();
        out.set_position(cs.point(self.position()));
        for p in &mut out.points {
            *p = p.with_vec(cs.offset(p.vec()));
        }
        Ok(out)
    }
}

/// Rescale every element from `from` to `to`.
///
/// Invalid canvas sizes fail the whole call. A malformed element is logged and
/// passed through unchanged while the rest of the batch is still adapted.
/// `from == to` returns the input as-is.
pub fn adapt<T: Adaptable>(
    elements: &[T],
    from: CanvasSize,
    to: CanvasSize,
) -> Result<Vec<T>, AdaptError> {
    let cs = CenterScale::between(from, to)?;
    if cs.is_identity() {
        return Ok(elements.to_vec());
    }
    Ok(adapt_each(elements, &cs))
}

pub(crate) fn adapt_each<T: Adaptable>(elements: &[T], cs: &CenterScale) -> Vec<T> {
    elements
        .iter()
        .enumerate()
        .map(|(index, e)| match e.adapt_with(cs) {
            Ok(adapted) => adapted,
            Err(err) => {
                warn!(index, %err, "element skipped during adaptation");
                e.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;
    use proptest::prelude::*;

    fn piece_at(x: f64, y: f64) -> PuzzlePiece {
        PuzzlePiece {
            points: vec![
                Point::original(-5.0, -5.0),
                Point::new(5.0, -5.0),
                Point::original(0.0, 5.0),
            ],
            x,
            y,
            rotation: 30.0,
            original_rotation: 90.0,
            is_completed: true,
        }
    }

    #[test]
    fn doubling_a_square_canvas() {
        let cs = CenterScale::between(CanvasSize::square(100.0), CanvasSize::square(200.0)).unwrap();
        assert_eq!(cs.scale, 2.0);
        assert_eq!(cs.point(vector![75.0, 75.0]), vector![150.0, 150.0]);
        let adapted = adapt(&[piece_at(75.0, 75.0)], cs.from, cs.to).unwrap();
        assert_eq!((adapted[0].x, adapted[0].y), (150.0, 150.0));
        assert_eq!(adapted[0].points[0].vec(), vector![-10.0, -10.0]);
        assert!(adapted[0].points[0].is_original && !adapted[0].points[1].is_original);
    }

    #[test]
    fn non_geometric_fields_pass_through() {
        let p = piece_at(10.0, 20.0);
        let out = adapt(&[p.clone()], CanvasSize::new(300.0, 200.0), CanvasSize::new(640.0, 480.0))
            .unwrap();
        assert_eq!(out[0].rotation, p.rotation);
        assert_eq!(out[0].original_rotation, p.original_rotation);
        assert_eq!(out[0].is_completed, p.is_completed);
    }

    #[test]
    fn shorter_edge_drives_the_scale() {
        let cs = CenterScale::between(CanvasSize::new(1000.0, 500.0), CanvasSize::new(400.0, 800.0))
            .unwrap();
        assert!((cs.scale - 0.8).abs() < 1e-15);
        // the old center lands on the new center
        let c = cs.point(vector![500.0, 250.0]);
        assert!((c - vector![200.0, 400.0]).norm() < 1e-12);
    }

    #[test]
    fn invalid_canvas_is_rejected() {
        let ok = CanvasSize::square(100.0);
        for bad in [
            CanvasSize::new(0.0, 100.0),
            CanvasSize::new(100.0, -1.0),
            CanvasSize::new(f64::NAN, 100.0),
            CanvasSize::new(f64::INFINITY, 100.0),
        ] {
            assert!(matches!(
                adapt(&[piece_at(1.0, 1.0)], ok, bad),
                Err(AdaptError::InvalidCanvas { role: "target", .. })
            ));
            assert!(matches!(
                adapt(&[piece_at(1.0, 1.0)], bad, ok),
                Err(AdaptError::InvalidCanvas { role: "source", .. })
            ));
        }
    }

    #[test]
    fn malformed_elements_are_isolated() {
        let mut bad = piece_at(1.0, 1.0);
        bad.points[0].x = f64::NAN;
        let empty = PuzzlePiece {
            points: Vec::new(),
            ..piece_at(3.0, 3.0)
        };
        let good = piece_at(75.0, 75.0);
        let out = adapt(
            &[bad.clone(), good, empty.clone()],
            CanvasSize::square(100.0),
            CanvasSize::square(200.0),
        )
        .unwrap();
        assert_eq!(out[0].x, bad.x);
        assert!(out[0].points[0].x.is_nan());
        assert_eq!((out[1].x, out[1].y), (150.0, 150.0));
        assert_eq!(out[2], empty);
        let cs = CenterScale::between(CanvasSize::square(1.0), CanvasSize::square(2.0)).unwrap();
        assert_eq!(empty.adapt_with(&cs), Err(AdaptError::Empty));
        assert_eq!(bad.adapt_with(&cs), Err(AdaptError::NonFinite));
    }

    #[test]
    fn shapes_adapt_absolute_points() {
        let shape = Shape {
            kind: crate::shape::ShapeType::Polygon,
            points: vec![
                Point::original(0.0, 0.0),
                Point::original(100.0, 0.0),
                Point::original(100.0, 100.0),
            ],
        };
        let out = adapt(&[shape], CanvasSize::square(100.0), CanvasSize::square(50.0)).unwrap();
        assert_eq!(out[0].points[1].vec(), vector![50.0, 0.0]);
    }

    #[test]
    fn inverse_undoes_the_map() {
        let cs = CenterScale::between(CanvasSize::new(800.0, 600.0), CanvasSize::new(1280.0, 720.0))
            .unwrap();
        let back = cs.inverse();
        let p = vector![123.0, 456.0];
        assert!((back.point(cs.point(p)) - p).norm() < 1e-9);
        assert_eq!(back.from, cs.to);
    }

    fn canvas() -> impl Strategy<Value = CanvasSize> {
        (50.0f64..4000.0, 50.0f64..4000.0).prop_map(|(w, h)| CanvasSize::new(w, h))
    }

    proptest! {
        #[test]
        fn same_canvas_is_exact_identity(size in canvas(), x in -1e4f64..1e4, y in -1e4f64..1e4) {
            let p = piece_at(x, y);
            let out = adapt(&[p.clone()], size, size).unwrap();
            prop_assert_eq!(&out[0], &p);
        }

        #[test]
        fn there_and_back_round_trips(a in canvas(), b in canvas(), x in 0.0f64..4000.0, y in 0.0f64..4000.0) {
            let p = piece_at(x, y);
            let there = adapt(&[p.clone()], a, b).unwrap();
            let back = adapt(&there, b, a).unwrap();
            prop_assert!((back[0].x - p.x).abs() < 1e-6);
            prop_assert!((back[0].y - p.y).abs() < 1e-6);
            for (q, r) in back[0].points.iter().zip(&p.points) {
                prop_assert!((q.vec() - r.vec()).norm() < 1e-9);
            }
            prop_assert_eq!(back[0].rotation, p.rotation);
        }
    }
}
