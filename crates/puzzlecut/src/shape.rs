//! Procedural target contours (polygon, cloud, jagged).
//!
//! Model
//! - Every family walks the angle monotonically around the logical canvas
//!   center and varies only the radius, so contours are star-shaped and simple
//!   by construction.
//! - Size is fixed relative to the logical canvas (`diameter_frac` of its
//!   shorter edge) and never rescaled afterwards; the adaptation layer is what
//!   maps the logical frame onto the real canvas.

use std::f64::consts::TAU;
use std::fmt;
use std::str::FromStr;

use nalgebra::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geom2::{signed_area, Bounds, CanvasSize, Point};

/// Contour family.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Polygon,
    Cloud,
    Jagged,
}

impl ShapeType {
    pub const ALL: [ShapeType; 3] = [ShapeType::Polygon, ShapeType::Cloud, ShapeType::Jagged];

    /// Case-insensitive; anything unrecognized maps to `Polygon`.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloud" => Self::Cloud,
            "jagged" => Self::Jagged,
            _ => Self::Polygon,
        }
    }
}

impl FromStr for ShapeType {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lossy(s))
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Polygon => "polygon",
            Self::Cloud => "cloud",
            Self::Jagged => "jagged",
        };
        f.write_str(s)
    }
}

/// Closed contour in logical canvas coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeType,
    pub points: Vec<Point>,
}

impl Shape {
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of(&self.points)
    }
    pub fn area(&self) -> f64 {
        signed_area(&self.points).abs()
    }
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Generator configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeCfg {
    /// Edge of the square logical canvas.
    pub logical_size: f64,
    /// Nominal contour diameter as a fraction of the logical canvas's shorter edge.
    pub diameter_frac: f64,
    /// Polygon vertex count is drawn from `[polygon_min_vertices, polygon_max_vertices)`.
    pub polygon_min_vertices: usize,
    pub polygon_max_vertices: usize,
    /// Vertex count of the cloud and jagged contours.
    pub curve_vertices: usize,
    /// Relative amplitude `A` of the cloud's radial wobble.
    pub cloud_amplitude: f64,
    /// Jagged radii are drawn from `r·[1 - jitter, 1 + jitter]`.
    pub jagged_jitter: f64,
}

impl Default for ShapeCfg {
    fn default() -> Self {
        Self {
            logical_size: 1000.0,
            diameter_frac: 0.3,
            polygon_min_vertices: 5,
            polygon_max_vertices: 13,
            curve_vertices: 200,
            cloud_amplitude: 0.15,
            jagged_jitter: 0.2,
        }
    }
}

impl ShapeCfg {
    pub fn logical_canvas(&self) -> CanvasSize {
        CanvasSize::square(self.logical_size)
    }
    /// Nominal radius `r`.
    pub fn radius(&self) -> f64 {
        self.logical_canvas().min_edge() * self.diameter_frac / 2.0
    }
}

/// Produces contours centered on the logical canvas.
#[derive(Clone, Debug, Default)]
pub struct ShapeGenerator {
    cfg: ShapeCfg,
}

impl ShapeGenerator {
    pub fn new(cfg: ShapeCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &ShapeCfg {
        &self.cfg
    }

    pub fn generate<R: Rng>(&self, kind: ShapeType, rng: &mut R) -> Shape {
        let center = self.cfg.logical_canvas().center();
        let r = self.cfg.radius();
        let radii = match kind {
            ShapeType::Polygon => self.polygon_radii(r, rng),
            ShapeType::Cloud => self.cloud_radii(r, rng),
            ShapeType::Jagged => self.jagged_radii(r, rng),
        };
        Shape {
            kind,
            points: radial_ring(center, &radii),
        }
    }

    fn polygon_radii<R: Rng>(&self, r: f64, rng: &mut R) -> Vec<f64> {
        let lo = self.cfg.polygon_min_vertices.max(3);
        let hi = self.cfg.polygon_max_vertices.max(lo + 1);
        let n = rng.gen_range(lo..hi);
        (0..n).map(|_| rng.gen_range(0.8 * r..=r)).collect()
    }

    fn cloud_radii<R: Rng>(&self, r: f64, rng: &mut R) -> Vec<f64> {
        let n = self.cfg.curve_vertices.max(3);
        let k = rng.gen_range(2..6) as f64;
        let a = self.cfg.cloud_amplitude;
        (0..n)
            .map(|i| {
                let th = TAU * i as f64 / n as f64;
                r * (1.0 + a * (k * th).sin() + 0.5 * a * (1.5 * k * th).cos())
            })
            .collect()
    }

    fn jagged_radii<R: Rng>(&self, r: f64, rng: &mut R) -> Vec<f64> {
        let n = self.cfg.curve_vertices.max(3);
        let j = self.cfg.jagged_jitter.clamp(0.0, 0.9);
        (0..n)
            .map(|_| r * (1.0 + rng.gen_range(-j..=j)))
            .collect()
    }
}

/// Evenly spaced angles, one radius per vertex, counterclockwise.
fn radial_ring(center: Vector2<f64>, radii: &[f64]) -> Vec<Point> {
    let n = radii.len();
    radii
        .iter()
        .enumerate()
        .map(|(i, &rad)| {
            let th = TAU * i as f64 / n as f64;
            Point::original(center.x + rad * th.cos(), center.y + rad * th.sin())
        })
        .collect()
}
