//! 2D geometry primitives for contours and pieces.
//!
//! Purpose
//! - Value types (`Point`, `Bounds`, `CanvasSize`, `Affine2`) and tolerances (`GeomCfg`).
//! - Ring helpers: area, centroid, containment with tolerance.
//! - The line splitter used by the cutter (`split_by_line`, `split_polygon`).
//!
//! Conventions
//! - Rings are implicitly closed (last vertex connects to first).
//! - Canvas coordinates: x to the right, y down; rotations are in degrees.

mod split;
mod types;
mod util;

pub use split::{split_by_line, split_polygon, Line};
pub use types::{Affine2, Bounds, CanvasSize, GeomCfg, Point};
pub use util::{
    area_centroid, centroid_or_mean, contains_with_tolerance, dedup_ring, distance_to_boundary,
    distance_to_segment, point_in_polygon, signed_area,
};
