//! Drift-free adaptation of scattered pieces.
//!
//! Purpose
//! - Freeze each piece's absolute state at scatter time, anchored to the
//!   canvas size of that moment, and derive every later layout from that
//!   snapshot in one hop (`scatter canvas → new canvas`). Chained rescales
//!   never feed into each other, so error cannot accumulate and a transient
//!   bad measurement cannot poison later passes.
//!
//! Lifecycle
//! - `save_absolute_states` on scatter, `update_absolute_state` on every
//!   intentional move/rotate/complete, `clear` on reset.
//! - Passes are synchronous and replace the whole piece array; callers must
//!   not run two passes against one engine concurrently.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::adapt::{AdaptError, Adaptable, CenterScale};
use crate::geom2::{CanvasSize, Point};
use crate::piece::PuzzlePiece;

/// Canonical state of one piece, in scatter-canvas coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteState {
    pub absolute_x: f64,
    pub absolute_y: f64,
    pub absolute_rotation: f64,
    pub is_completed: bool,
    pub scatter_canvas_size: CanvasSize,
    /// Centroid-relative contour at scatter scale.
    pub points: Vec<Point>,
    /// Milliseconds since the Unix epoch of the last capture or update.
    pub timestamp: u64,
}

impl AbsoluteState {
    fn position(&self) -> Vector2<f64> {
        Vector2::new(self.absolute_x, self.absolute_y)
    }

    /// The piece as it should look on `canvas`.
    fn project(&self, base: &PuzzlePiece, canvas: CanvasSize) -> Result<PuzzlePiece, AdaptError> {
        let snapshot = PuzzlePiece {
            points: self.points.clone(),
            x: self.absolute_x,
            y: self.absolute_y,
            rotation: self.absolute_rotation,
            original_rotation: base.original_rotation,
            is_completed: self.is_completed,
        };
        let cs = CenterScale::between(self.scatter_canvas_size, canvas)?;
        if cs.is_identity() {
            if !snapshot.is_well_formed() {
                return Err(AdaptError::NonFinite);
            }
            return Ok(snapshot);
        }
        snapshot.adapt_with(&cs)
    }
}

/// Partial update from the interaction layer. Positions are in the canvas the
/// engine last adapted to.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PieceUpdate {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub rotation: Option<f64>,
    pub is_completed: Option<bool>,
}

impl PieceUpdate {
    pub fn moved_to(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }
    pub fn rotated(rotation: f64) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }
    pub fn completed_at(x: f64, y: f64, rotation: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            rotation: Some(rotation),
            is_completed: Some(true),
        }
    }
}

/// State preservation failures.
#[derive(Clone, Debug, PartialEq)]
pub enum StateError {
    /// Zero-area or non-finite canvas: an upstream logic error.
    InvalidCanvas(CanvasSize),
    UnknownPiece(usize),
    NonFinite { index: usize },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCanvas(size) => write!(
                f,
                "canvas {}x{} has no usable area",
                size.width, size.height
            ),
            Self::UnknownPiece(index) => write!(f, "no absolute state for piece {index}"),
            Self::NonFinite { index } => write!(f, "non-finite update for piece {index}"),
        }
    }
}

impl std::error::Error for StateError {}

/// Snapshot store keyed by piece index.
#[derive(Clone, Debug, Default)]
pub struct StatePreservationEngine {
    states: BTreeMap<usize, AbsoluteState>,
    current_canvas: Option<CanvasSize>,
}

impl StatePreservationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every piece as laid out on `scatter_canvas_size`.
    ///
    /// A piece counts as completed if its own flag is set or its index is in
    /// `completed`. Replaces any earlier snapshot.
    pub fn save_absolute_states(
        &mut self,
        pieces: &[PuzzlePiece],
        scatter_canvas_size: CanvasSize,
        completed: &[usize],
    ) -> Result<(), StateError> {
        if !scatter_canvas_size.is_valid() {
            error!(?scatter_canvas_size, "refusing to snapshot against an invalid canvas");
            return Err(StateError::InvalidCanvas(scatter_canvas_size));
        }
        let now = now_millis();
        self.states = pieces
            .iter()
            .enumerate()
            .map(|(index, p)| {
                let state = AbsoluteState {
                    absolute_x: p.x,
                    absolute_y: p.y,
                    absolute_rotation: p.rotation,
                    is_completed: p.is_completed || completed.contains(&index),
                    scatter_canvas_size,
                    points: p.points.clone(),
                    timestamp: now,
                };
                (index, state)
            })
            .collect();
        self.current_canvas = Some(scatter_canvas_size);
        info!(
            pieces = self.states.len(),
            width = scatter_canvas_size.width,
            height = scatter_canvas_size.height,
            "absolute states saved"
        );
        Ok(())
    }

    /// Re-derive every piece for `new_canvas_size` from its snapshot.
    ///
    /// Pieces without a snapshot, or whose snapshot cannot be projected, are
    /// returned as given. An invalid canvas fails the pass and leaves the
    /// engine untouched.
    pub fn adapt_to_new_canvas_size(
        &mut self,
        current: &[PuzzlePiece],
        new_canvas_size: CanvasSize,
    ) -> Result<Vec<PuzzlePiece>, StateError> {
        if !new_canvas_size.is_valid() {
            error!(?new_canvas_size, "adaptation requested for a zero-area canvas");
            return Err(StateError::InvalidCanvas(new_canvas_size));
        }
        let out = current
            .iter()
            .enumerate()
            .map(|(index, piece)| {
                let Some(state) = self.states.get(&index) else {
                    warn!(index, "no absolute state; piece left unchanged");
                    return piece.clone();
                };
                match state.project(piece, new_canvas_size) {
                    Ok(p) => p,
                    Err(err) => {
                        warn!(index, %err, "snapshot could not be projected; piece left unchanged");
                        piece.clone()
                    }
                }
            })
            .collect();
        self.current_canvas = Some(new_canvas_size);
        debug!(
            pieces = current.len(),
            width = new_canvas_size.width,
            height = new_canvas_size.height,
            "pieces adapted from snapshot"
        );
        Ok(out)
    }

    /// Fold an intentional change into the snapshot, keeping it anchored to
    /// the scatter canvas.
    pub fn update_absolute_state(
        &mut self,
        index: usize,
        update: PieceUpdate,
    ) -> Result<(), StateError> {
        let current_canvas = self.current_canvas;
        let state = self
            .states
            .get_mut(&index)
            .ok_or(StateError::UnknownPiece(index))?;
        let finite = [update.x, update.y, update.rotation]
            .iter()
            .flatten()
            .all(|v| v.is_finite());
        if !finite {
            return Err(StateError::NonFinite { index });
        }
        if update.x.is_some() || update.y.is_some() {
            let canvas = current_canvas.unwrap_or(state.scatter_canvas_size);
            let to_current = CenterScale::between(state.scatter_canvas_size, canvas)
                .map_err(|_| StateError::InvalidCanvas(canvas))?;
            let mut shown = if to_current.is_identity() {
                state.position()
            } else {
                to_current.point(state.position())
            };
            if let Some(x) = update.x {
                shown.x = x;
            }
            if let Some(y) = update.y {
                shown.y = y;
            }
            let abs = if to_current.is_identity() {
                shown
            } else {
                to_current.inverse().point(shown)
            };
            state.absolute_x = abs.x;
            state.absolute_y = abs.y;
        }
        if let Some(r) = update.rotation {
            state.absolute_rotation = r;
        }
        if let Some(c) = update.is_completed {
            state.is_completed = c;
        }
        state.timestamp = now_millis();
        Ok(())
    }

    /// Drop every snapshot (game reset).
    pub fn clear(&mut self) {
        self.states.clear();
        self.current_canvas = None;
    }

    pub fn get(&self, index: usize) -> Option<&AbsoluteState> {
        self.states.get(&index)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Canvas of the last save or adaptation pass.
    pub fn current_canvas(&self) -> Option<CanvasSize> {
        self.current_canvas
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
