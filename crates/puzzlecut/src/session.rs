//! One game session: explicit owner of the generator, cutter and snapshot store.
//!
//! The solved layout is kept in the logical frame and never mutated. The
//! shape and untouched unscattered pieces are re-derived from it on every
//! resize; scattered pieces go through `StatePreservationEngine`. Completion
//! and player moves made before scatter are carried across resizes.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use crate::adapt::{adapt, AdaptError, CenterScale};
use crate::config::{ConfigError, EngineConfig};
use crate::cut::{CutType, CuttingEngine};
use crate::geom2::CanvasSize;
use crate::piece::{normalize_degrees, PuzzlePiece};
use crate::preserve::{PieceUpdate, StateError, StatePreservationEngine};
use crate::shape::{Shape, ShapeGenerator, ShapeType};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    Config(ConfigError),
    InvalidCanvas(CanvasSize),
    /// No round has been started (or it was reset).
    NoRound,
    PieceOutOfRange(usize),
    /// Completed pieces accept no further interaction.
    Locked(usize),
    Adapt(AdaptError),
    State(StateError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::InvalidCanvas(size) => {
                write!(f, "invalid canvas {}x{}", size.width, size.height)
            }
            Self::NoRound => write!(f, "no round in progress"),
            Self::PieceOutOfRange(i) => write!(f, "piece {i} does not exist"),
            Self::Locked(i) => write!(f, "piece {i} is completed and locked"),
            Self::Adapt(e) => write!(f, "adaptation failed: {e}"),
            Self::State(e) => write!(f, "state preservation failed: {e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Adapt(e) => Some(e),
            Self::State(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for SessionError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
impl From<AdaptError> for SessionError {
    fn from(e: AdaptError) -> Self {
        Self::Adapt(e)
    }
}
impl From<StateError> for SessionError {
    fn from(e: StateError) -> Self {
        Self::State(e)
    }
}

/// Per-round data.
#[derive(Clone, Debug)]
struct Round {
    logical_shape: Shape,
    logical_pieces: Vec<PuzzlePiece>,
    shape: Shape,
    pieces: Vec<PuzzlePiece>,
    scattered: bool,
    cut_attempts: u32,
}

pub struct PuzzleSession {
    cfg: EngineConfig,
    rng: StdRng,
    shapes: ShapeGenerator,
    cutter: CuttingEngine,
    states: StatePreservationEngine,
    canvas: CanvasSize,
    round: Option<Round>,
}

impl PuzzleSession {
    pub fn new(cfg: EngineConfig, canvas: CanvasSize, seed: u64) -> Result<Self, SessionError> {
        cfg.validate()?;
        if !canvas.is_valid() {
            return Err(SessionError::InvalidCanvas(canvas));
        }
        Ok(Self {
            shapes: ShapeGenerator::new(cfg.shape),
            cutter: CuttingEngine::new(cfg.cut),
            cfg,
            rng: StdRng::seed_from_u64(seed),
            states: StatePreservationEngine::new(),
            canvas,
            round: None,
        })
    }

    /// Generate, cut and lay out a fresh puzzle on the current canvas.
    pub fn start_round(
        &mut self,
        shape_type: ShapeType,
        cut_type: CutType,
        cut_count: usize,
    ) -> Result<&[PuzzlePiece], SessionError> {
        self.states.clear();
        let logical = self.cfg.shape.logical_canvas();
        let logical_shape = self.shapes.generate(shape_type, &mut self.rng);
        let report = self
            .cutter
            .cut(&logical_shape, cut_type, cut_count, &mut self.rng);
        let shape = adapt(std::slice::from_ref(&logical_shape), logical, self.canvas)?
            .into_iter()
            .next()
            .unwrap_or_else(|| logical_shape.clone());
        let pieces = adapt(&report.pieces, logical, self.canvas)?;
        info!(
            shape = %shape_type,
            cut = %cut_type,
            cut_count,
            pieces = pieces.len(),
            attempts = report.attempts,
            "round started"
        );
        let round = self.round.insert(Round {
            logical_shape,
            logical_pieces: report.pieces,
            shape,
            pieces,
            scattered: false,
            cut_attempts: report.attempts,
        });
        Ok(&round.pieces)
    }

    /// Randomize position and rotation of every unfinished piece, then freeze
    /// the result as the adaptation reference.
    pub fn scatter(&mut self) -> Result<&[PuzzlePiece], SessionError> {
        let round = self.round.as_mut().ok_or(SessionError::NoRound)?;
        let (w, h) = (self.canvas.width, self.canvas.height);
        let mx = w * self.cfg.scatter_margin_frac;
        let my = h * self.cfg.scatter_margin_frac;
        for piece in round.pieces.iter_mut().filter(|p| !p.is_completed) {
            piece.x = self.rng.gen_range(mx..=(w - mx));
            piece.y = self.rng.gen_range(my..=(h - my));
            piece.rotation = 90.0 * self.rng.gen_range(0..4) as f64;
            piece.original_rotation = piece.rotation;
        }
        let completed: Vec<usize> = round
            .pieces
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_completed)
            .map(|(i, _)| i)
            .collect();
        self.states
            .save_absolute_states(&round.pieces, self.canvas, &completed)?;
        round.scattered = true;
        info!(pieces = round.pieces.len(), "pieces scattered");
        Ok(&round.pieces)
    }

    /// Re-lay everything out for `canvas`.
    pub fn resize(&mut self, canvas: CanvasSize) -> Result<(), SessionError> {
        if !canvas.is_valid() {
            return Err(SessionError::InvalidCanvas(canvas));
        }
        let logical = self.cfg.shape.logical_canvas();
        if let Some(round) = self.round.as_mut() {
            if let Some(shape) = adapt(std::slice::from_ref(&round.logical_shape), logical, canvas)?
                .into_iter()
                .next()
            {
                round.shape = shape;
            }
            round.pieces = if round.scattered {
                self.states.adapt_to_new_canvas_size(&round.pieces, canvas)?
            } else {
                relayout_unscattered(round, logical, self.canvas, canvas)?
            };
        }
        debug!(width = canvas.width, height = canvas.height, "session resized");
        self.canvas = canvas;
        Ok(())
    }

    pub fn move_piece(&mut self, index: usize, x: f64, y: f64) -> Result<(), SessionError> {
        let scattered = self.live_piece(index)?.1;
        if scattered {
            self.states
                .update_absolute_state(index, PieceUpdate::moved_to(x, y))?;
        }
        let (piece, _) = self.live_piece(index)?;
        piece.x = x;
        piece.y = y;
        Ok(())
    }

    /// Rotate by `delta` degrees; the stored rotation stays in `[0, 360)`.
    pub fn rotate_piece(&mut self, index: usize, delta: f64) -> Result<f64, SessionError> {
        let (piece, scattered) = self.live_piece(index)?;
        let rotation = normalize_degrees(piece.rotation + delta);
        if scattered {
            self.states
                .update_absolute_state(index, PieceUpdate::rotated(rotation))?;
        }
        let (piece, _) = self.live_piece(index)?;
        piece.rotation = rotation;
        Ok(rotation)
    }

    /// Snap the piece onto its solved placement if it is close enough and
    /// upright. Returns whether the piece is now completed.
    pub fn try_complete(&mut self, index: usize) -> Result<bool, SessionError> {
        let target = self.target(index)?;
        let tolerance = self.snap_tolerance();
        let (piece, scattered) = self.live_piece(index)?;
        let off = (piece.position() - target.position()).norm();
        let rot = normalize_degrees(piece.rotation);
        let upright = rot < 1e-6 || (360.0 - rot) < 1e-6;
        if off > tolerance || !upright {
            debug!(index, off, rot, "piece not in place");
            return Ok(false);
        }
        if scattered {
            self.states.update_absolute_state(
                index,
                PieceUpdate::completed_at(target.x, target.y, 0.0),
            )?;
        }
        let (piece, _) = self.live_piece(index)?;
        piece.x = target.x;
        piece.y = target.y;
        piece.rotation = 0.0;
        piece.is_completed = true;
        info!(index, "piece completed");
        Ok(true)
    }

    /// Solved placement of piece `index` on the current canvas.
    pub fn target(&self, index: usize) -> Result<PuzzlePiece, SessionError> {
        let round = self.round.as_ref().ok_or(SessionError::NoRound)?;
        let piece = round
            .logical_pieces
            .get(index)
            .ok_or(SessionError::PieceOutOfRange(index))?;
        let logical = self.cfg.shape.logical_canvas();
        Ok(adapt(std::slice::from_ref(piece), logical, self.canvas)?
            .into_iter()
            .next()
            .unwrap_or_else(|| piece.clone()))
    }

    /// Drop the round and every snapshot.
    pub fn reset(&mut self) {
        self.states.clear();
        self.round = None;
        info!("session reset");
    }

    pub fn pieces(&self) -> &[PuzzlePiece] {
        self.round.as_ref().map(|r| r.pieces.as_slice()).unwrap_or(&[])
    }

    pub fn shape(&self) -> Option<&Shape> {
        self.round.as_ref().map(|r| &r.shape)
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn is_scattered(&self) -> bool {
        self.round.as_ref().is_some_and(|r| r.scattered)
    }

    pub fn cut_attempts(&self) -> Option<u32> {
        self.round.as_ref().map(|r| r.cut_attempts)
    }

    pub fn completed_count(&self) -> usize {
        self.pieces().iter().filter(|p| p.is_completed).count()
    }

    pub fn is_solved(&self) -> bool {
        let pieces = self.pieces();
        !pieces.is_empty() && pieces.iter().all(|p| p.is_completed)
    }

    pub fn states(&self) -> &StatePreservationEngine {
        &self.states
    }

    fn snap_tolerance(&self) -> f64 {
        self.cfg.snap_tolerance * self.canvas.min_edge() / self.cfg.shape.logical_canvas().min_edge()
    }

    /// Mutable live piece plus whether the round is scattered; rejects locked pieces.
    fn live_piece(&mut self, index: usize) -> Result<(&mut PuzzlePiece, bool), SessionError> {
        let round = self.round.as_mut().ok_or(SessionError::NoRound)?;
        let scattered = round.scattered;
        let piece = round
            .pieces
            .get_mut(index)
            .ok_or(SessionError::PieceOutOfRange(index))?;
        if piece.is_completed {
            return Err(SessionError::Locked(index));
        }
        Ok((piece, scattered))
    }
}

/// Solved layout on `to`, keeping what the player already did on `from`.
///
/// Untouched pieces come straight from the logical layout. Completed pieces
/// stay completed at their new target; moved or rotated ones keep their
/// rotation and have their position rescaled from `from`.
fn relayout_unscattered(
    round: &Round,
    logical: CanvasSize,
    from: CanvasSize,
    to: CanvasSize,
) -> Result<Vec<PuzzlePiece>, SessionError> {
    let before = adapt(&round.logical_pieces, logical, from)?;
    let mut fresh = adapt(&round.logical_pieces, logical, to)?;
    let cs = CenterScale::between(from, to)?;
    for ((next, live), solved) in fresh.iter_mut().zip(&round.pieces).zip(&before) {
        if live.is_completed {
            next.is_completed = true;
        } else if live.x != solved.x || live.y != solved.y || live.rotation != solved.rotation {
            if cs.is_identity() {
                next.set_position(live.position());
            } else {
                next.set_position(cs.point(live.position()));
            }
            next.rotation = live.rotation;
        }
    }
    Ok(fresh)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> PuzzleSession {
        PuzzleSession::new(EngineConfig::default(), CanvasSize::new(800.0, 600.0), 11).unwrap()
    }

    #[test]
    fn rejects_bad_construction() {
        assert!(matches!(
            PuzzleSession::new(EngineConfig::default(), CanvasSize::new(0.0, 10.0), 1),
            Err(SessionError::InvalidCanvas(_))
        ));
        let mut cfg = EngineConfig::default();
        cfg.cut.max_attempts = 0;
        assert!(matches!(
            PuzzleSession::new(cfg, CanvasSize::square(10.0), 1),
            Err(SessionError::Config(_))
        ));
    }

    #[test]
    fn interaction_needs_a_round() {
        let mut s = session();
        assert_eq!(s.scatter().unwrap_err(), SessionError::NoRound);
        assert_eq!(s.move_piece(0, 1.0, 1.0).unwrap_err(), SessionError::NoRound);
        assert!(s.pieces().is_empty());
        assert!(!s.is_solved());
    }

    #[test]
    fn round_is_laid_out_on_the_canvas() {
        let mut s = session();
        let n = s.start_round(ShapeType::Cloud, CutType::Straight, 4).unwrap().len();
        assert!(n >= 2);
        let b = s.shape().unwrap().bounds().unwrap();
        // 30% of the shorter edge, centered
        assert!((b.center_x - 400.0).abs() < 40.0 && (b.center_y - 300.0).abs() < 40.0);
        assert!(b.width() < 0.45 * 600.0 && b.width() > 0.2 * 600.0);
        assert!(!s.is_scattered());
        assert!(s.cut_attempts().unwrap() >= 1);
        for i in 0..n {
            assert_eq!(s.pieces()[i], s.target(i).unwrap());
        }
    }

    #[test]
    fn unscattered_resize_tracks_the_solved_layout() {
        let mut s = session();
        s.start_round(ShapeType::Polygon, CutType::Diagonal, 3).unwrap();
        for size in [CanvasSize::new(320.0, 480.0), CanvasSize::new(1600.0, 900.0)] {
            s.resize(size).unwrap();
            for (i, p) in s.pieces().iter().enumerate() {
                assert_eq!(*p, s.target(i).unwrap());
            }
        }
    }

    #[test]
    fn scatter_stays_inside_the_margin() {
        let mut s = session();
        s.start_round(ShapeType::Jagged, CutType::Curve, 5).unwrap();
        let pieces = s.scatter().unwrap().to_vec();
        for p in &pieces {
            assert!(p.x >= 80.0 && p.x <= 720.0);
            assert!(p.y >= 60.0 && p.y <= 540.0);
            assert_eq!(p.rotation % 90.0, 0.0);
            assert_eq!(p.rotation, p.original_rotation);
        }
        assert_eq!(s.states().len(), pieces.len());
        assert!(s.is_scattered());
    }

    #[test]
    fn completing_locks_and_survives_resizes() {
        let mut s = session();
        s.start_round(ShapeType::Polygon, CutType::Straight, 3).unwrap();
        s.scatter().unwrap();

        let t = s.target(0).unwrap();
        // far away: no snap
        s.move_piece(0, t.x + 200.0, t.y).unwrap();
        assert!(!s.try_complete(0).unwrap());
        // close but rotated
        s.move_piece(0, t.x + 3.0, t.y - 2.0).unwrap();
        let r = s.pieces()[0].rotation;
        if r != 0.0 {
            assert!(!s.try_complete(0).unwrap());
            s.rotate_piece(0, 360.0 - r).unwrap();
        }
        assert!(s.try_complete(0).unwrap());
        assert_eq!(s.completed_count(), 1);
        assert_eq!(s.move_piece(0, 1.0, 1.0).unwrap_err(), SessionError::Locked(0));
        assert_eq!(s.rotate_piece(0, 90.0).unwrap_err(), SessionError::Locked(0));

        for size in [CanvasSize::new(375.0, 812.0), CanvasSize::new(1440.0, 900.0)] {
            s.resize(size).unwrap();
            let p = &s.pieces()[0];
            let t = s.target(0).unwrap();
            assert!(p.is_completed && !p.is_selectable());
            assert_eq!(p.rotation, 0.0);
            assert!((p.x - t.x).abs() < 1e-9 && (p.y - t.y).abs() < 1e-9);
        }
    }

    #[test]
    fn moves_on_a_resized_canvas_survive_later_resizes() {
        let mut s = session();
        s.start_round(ShapeType::Polygon, CutType::Straight, 2).unwrap();
        s.scatter().unwrap();
        s.resize(CanvasSize::new(1600.0, 1200.0)).unwrap();
        s.move_piece(1, 1000.0, 500.0).unwrap();
        s.resize(CanvasSize::new(400.0, 300.0)).unwrap();
        s.resize(CanvasSize::new(1600.0, 1200.0)).unwrap();
        let p = &s.pieces()[1];
        assert!((p.x - 1000.0).abs() < 1e-9 && (p.y - 500.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_resize_changes_nothing() {
        let mut s = session();
        s.start_round(ShapeType::Cloud, CutType::Straight, 2).unwrap();
        s.scatter().unwrap();
        let before = s.pieces().to_vec();
        assert!(matches!(
            s.resize(CanvasSize::new(800.0, 0.0)),
            Err(SessionError::InvalidCanvas(_))
        ));
        assert_eq!(s.pieces(), before.as_slice());
        assert_eq!(s.canvas(), CanvasSize::new(800.0, 600.0));
    }

    #[test]
    fn completion_before_scatter_survives_resize() {
        let mut s = session();
        s.start_round(ShapeType::Polygon, CutType::Straight, 3).unwrap();
        assert!(s.try_complete(0).unwrap());
        s.resize(CanvasSize::new(1024.0, 768.0)).unwrap();
        let p = &s.pieces()[0];
        let t = s.target(0).unwrap();
        assert!(p.is_completed);
        assert_eq!((p.x, p.y, p.rotation), (t.x, t.y, 0.0));
        assert_eq!(s.move_piece(0, 1.0, 1.0).unwrap_err(), SessionError::Locked(0));

        // still locked after scatter
        s.scatter().unwrap();
        assert!(s.pieces()[0].is_completed);
        assert_eq!(s.completed_count(), 1);
    }

    #[test]
    fn moves_before_scatter_survive_resize() {
        let mut s = session();
        s.start_round(ShapeType::Polygon, CutType::Straight, 6).unwrap();
        s.move_piece(1, 10.0, 10.0).unwrap();
        s.rotate_piece(1, 90.0).unwrap();
        s.resize(CanvasSize::new(800.0, 600.0)).unwrap();
        let p = &s.pieces()[1];
        assert_eq!((p.x, p.y, p.rotation), (10.0, 10.0, 90.0));

        // 800x600 -> 1600x1200 doubles offsets from the center
        s.resize(CanvasSize::new(1600.0, 1200.0)).unwrap();
        let p = &s.pieces()[1];
        assert!((p.x - (800.0 + 2.0 * (10.0 - 400.0))).abs() < 1e-9);
        assert!((p.y - (600.0 + 2.0 * (10.0 - 300.0))).abs() < 1e-9);
        assert_eq!(p.rotation, 90.0);

        // untouched pieces still follow the solved layout
        assert_eq!(s.pieces()[2], s.target(2).unwrap());
    }

    #[test]
    fn reset_clears_round_and_snapshots() {
        let mut s = session();
        s.start_round(ShapeType::Polygon, CutType::Straight, 2).unwrap();
        s.scatter().unwrap();
        s.reset();
        assert!(s.pieces().is_empty());
        assert!(s.states().is_empty());
        assert!(s.shape().is_none());
    }
}
