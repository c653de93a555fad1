//! Geometry and adaptation engine for a shape-cutting puzzle.
//!
//! Layout
//! - `geom2`: value types, ring helpers and the line splitter.
//! - `shape`, `cut`, `piece`: generate a contour on the logical canvas and cut
//!   it into centroid-anchored pieces.
//! - `adapt`, `preserve`: center-relative rescaling, and drift-free
//!   rescaling of scattered pieces from a frozen snapshot.
//! - `session`: one game round wired end to end.
//!
//! Randomness is always injected (`R: Rng`) so every layout is reproducible
//! from a seed.

pub mod adapt;
pub mod config;
pub mod cut;
pub mod geom2;
pub mod piece;
pub mod preserve;
pub mod session;
pub mod shape;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use nalgebra::{Matrix2 as Mat2, Vector2 as Vec2};

/// Common exports for callers.
pub mod prelude {
    pub use crate::adapt::{adapt, AdaptError, Adaptable, CenterScale};
    pub use crate::config::{ConfigError, EngineConfig};
    pub use crate::cut::{build_extra_cuts, Cut, CutCfg, CutReport, CutType, CuttingEngine};
    pub use crate::geom2::{Affine2, Bounds, CanvasSize, GeomCfg, Point};
    pub use crate::piece::PuzzlePiece;
    pub use crate::preserve::{AbsoluteState, PieceUpdate, StateError, StatePreservationEngine};
    pub use crate::session::{PuzzleSession, SessionError};
    pub use crate::shape::{Shape, ShapeCfg, ShapeGenerator, ShapeType};
    pub use nalgebra::{Matrix2 as Mat2, Vector2 as Vec2};
}
