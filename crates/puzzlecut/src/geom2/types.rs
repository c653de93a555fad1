//! Basic 2D value types shared by the generator, cutter and adapters.
//!
//! - `Point`: contour vertex, tagged with whether it came from the generated shape.
//! - `Bounds`: derived extent of a point set (never stored).
//! - `CanvasSize`: rendering surface in device-independent pixels.
//! - `GeomCfg`: centralizes the tolerances used by the splitter and checks.
//! - `Affine2`: `x ↦ M x + t`, the carrier of every canvas transform.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

/// Contour vertex. `is_original` is false for vertices introduced by a cut.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub is_original: bool,
}

impl Point {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            is_original: false,
        }
    }
    #[inline]
    pub fn original(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            is_original: true,
        }
    }
    #[inline]
    pub fn vec(&self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }
    /// Same tag, new coordinates.
    #[inline]
    pub fn with_vec(&self, v: Vector2<f64>) -> Self {
        Self {
            x: v.x,
            y: v.y,
            is_original: self.is_original,
        }
    }
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned extent of a point set plus its center and diagonal length.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub diagonal: f64,
}

impl Bounds {
    /// `None` for an empty slice or when any coordinate is non-finite.
    pub fn of(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut min_x = first.x;
        let mut max_x = first.x;
        let mut min_y = first.y;
        let mut max_y = first.y;
        for p in points {
            if !p.is_finite() {
                return None;
            }
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        let w = max_x - min_x;
        let h = max_y - min_y;
        Some(Self {
            min_x,
            max_x,
            min_y,
            max_y,
            center_x: (min_x + max_x) / 2.0,
            center_y: (min_y + max_y) / 2.0,
            diagonal: (w * w + h * h).sqrt(),
        })
    }
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }
    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
    #[inline]
    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(self.center_x, self.center_y)
    }
}

/// Rendering surface size in device-independent pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    #[inline]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
    #[inline]
    pub fn square(edge: f64) -> Self {
        Self::new(edge, edge)
    }
    #[inline]
    pub fn center(&self) -> Vector2<f64> {
        Vector2::new(self.width / 2.0, self.height / 2.0)
    }
    #[inline]
    pub fn min_edge(&self) -> f64 {
        self.width.min(self.height)
    }
    /// Finite and strictly positive on both axes.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GeomCfg {
    /// Vertices closer than this to a cut line count as lying on it.
    pub eps_on_line: f64,
    /// Consecutive vertices closer than this are merged.
    pub eps_merge: f64,
    /// Fragments with smaller absolute area are dropped by the splitter.
    pub min_area: f64,
    /// Line nudges tried before a degenerate cut is skipped for a fragment.
    pub max_nudges: u32,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_on_line: 1e-7,
            eps_merge: 1e-9,
            min_area: 1e-9,
            max_nudges: 8,
        }
    }
}

/// 2D affine map: `x ↦ M x + t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Affine2 {
    pub m: Matrix2<f64>,
    pub t: Vector2<f64>,
}

impl Affine2 {
    /// Counterclockwise rotation by `deg` degrees about `center`.
    pub fn rotation_about(center: Vector2<f64>, deg: f64) -> Self {
        let th = deg.to_radians();
        let (s, c) = th.sin_cos();
        let m = Matrix2::new(c, -s, s, c);
        Self {
            m,
            t: center - m * center,
        }
    }
    #[inline]
    pub fn apply(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.m * p + self.t
    }
    /// Linear part only; for offsets that are not anchored to the origin.
    #[inline]
    pub fn apply_vector(&self, v: Vector2<f64>) -> Vector2<f64> {
        self.m * v
    }
}
