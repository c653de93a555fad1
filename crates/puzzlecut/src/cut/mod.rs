//! Cut generation and the cutting engine.
//!
//! Purpose
//! - Produce batches of random cut lines spanning a shape's bounds
//!   (`build_extra_cuts`) and split the shape into pieces along them,
//!   topping up with compensating cuts when fragmentation falls short
//!   (`CuttingEngine`).
//!
//! Conventions
//! - A `Cut` is consumed as the infinite line through its endpoints. Generated
//!   endpoints always lie outside the shape's bounding box, so inside the
//!   shape the segment and the line coincide.

mod engine;

pub use engine::{CutCfg, CutReport, CuttingEngine};

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use nalgebra::Vector2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::geom2::{Bounds, Line};

/// How cut lines are oriented.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutType {
    /// Alternating vertical and horizontal lines.
    #[default]
    Straight,
    /// Lines at roughly 20°–70° off the axes.
    Diagonal,
    /// Lines at any angle.
    Curve,
}

impl CutType {
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "diagonal" => Self::Diagonal,
            "curve" => Self::Curve,
            _ => Self::Straight,
        }
    }
}

impl FromStr for CutType {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse_lossy(s))
    }
}

impl fmt::Display for CutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Straight => "straight",
            Self::Diagonal => "diagonal",
            Self::Curve => "curve",
        };
        f.write_str(s)
    }
}

/// Cut segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(rename = "type")]
    pub kind: CutType,
}

impl Cut {
    fn from_center_dir(center: Vector2<f64>, dir: Vector2<f64>, half_len: f64, kind: CutType) -> Self {
        let a = center - dir * half_len;
        let b = center + dir * half_len;
        Self {
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
            kind,
        }
    }

    pub fn line(&self) -> Option<Line> {
        Line::through(Vector2::new(self.x1, self.y1), Vector2::new(self.x2, self.y2))
    }
}

/// Fraction of the bounds' extent by which straight cuts may leave the center.
const STRAIGHT_SPREAD: f64 = 0.35;
/// Fraction of the bounds' diagonal by which angled cuts may leave the center.
const ANGLED_SPREAD: f64 = 0.25;

/// Build `count` cuts across `bounds`.
///
/// `offset` is the index of the first cut within its round; straight cuts use
/// it to keep the vertical/horizontal alternation going across batches.
pub fn build_extra_cuts<R: Rng>(
    bounds: &Bounds,
    kind: CutType,
    count: usize,
    offset: usize,
    rng: &mut R,
) -> Vec<Cut> {
    let center = bounds.center();
    // endpoints well outside the box
    let half_len = bounds.diagonal.max(1e-9);
    (0..count)
        .map(|i| match kind {
            CutType::Straight => {
                if (offset + i) % 2 == 0 {
                    let dx = rng.gen_range(-STRAIGHT_SPREAD..=STRAIGHT_SPREAD) * bounds.width();
                    let c = Vector2::new(center.x + dx, center.y);
                    Cut::from_center_dir(c, Vector2::new(0.0, 1.0), half_len, kind)
                } else {
                    let dy = rng.gen_range(-STRAIGHT_SPREAD..=STRAIGHT_SPREAD) * bounds.height();
                    let c = Vector2::new(center.x, center.y + dy);
                    Cut::from_center_dir(c, Vector2::new(1.0, 0.0), half_len, kind)
                }
            }
            CutType::Diagonal => {
                let base = if rng.gen::<bool>() { 0.0 } else { PI / 2.0 };
                let th = base + rng.gen_range(20f64.to_radians()..=70f64.to_radians());
                angled_cut(center, th, bounds.diagonal, half_len, kind, rng)
            }
            CutType::Curve => {
                let th = rng.gen_range(0.0..PI);
                angled_cut(center, th, bounds.diagonal, half_len, kind, rng)
            }
        })
        .collect()
}

fn angled_cut<R: Rng>(
    center: Vector2<f64>,
    th: f64,
    diagonal: f64,
    half_len: f64,
    kind: CutType,
    rng: &mut R,
) -> Cut {
    let dir = Vector2::new(th.cos(), th.sin());
    let normal = Vector2::new(-dir.y, dir.x);
    let shift = rng.gen_range(-ANGLED_SPREAD..=ANGLED_SPREAD) * diagonal;
    Cut::from_center_dir(center + normal * shift, dir, half_len, kind)
}
