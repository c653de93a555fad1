//! Shape → pieces, with bounded compensation when cuts under-fragment.
//!
//! Crossing or out-of-shape cuts can leave fewer fragments than `cut_count + 1`.
//! The engine then tops the best set up with fresh batches of compensating
//! cuts, keeping a batch only when it raises the count, until the target is
//! met or `max_attempts` is spent. Falling short is not an error: the best
//! set found is returned.

use std::ops::ControlFlow;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{build_extra_cuts, Cut, CutType};
use crate::geom2::{split_polygon, GeomCfg, Line, Point};
use crate::piece::PuzzlePiece;
use crate::shape::Shape;

/// Cutting configuration.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CutCfg {
    /// Attempts including the first split.
    pub max_attempts: u32,
    pub geom: GeomCfg,
}

impl Default for CutCfg {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            geom: GeomCfg::default(),
        }
    }
}

/// Outcome of one `cut` call.
#[derive(Clone, Debug, Serialize)]
pub struct CutReport {
    pub pieces: Vec<PuzzlePiece>,
    /// Attempts actually run (1 ..= `max_attempts`).
    pub attempts: u32,
    pub first_attempt_count: usize,
    /// `cut_count + 1`.
    pub target: usize,
    /// Every cut that ended up applied, including kept compensation batches.
    pub cuts: Vec<Cut>,
}

impl CutReport {
    pub fn reached_target(&self) -> bool {
        self.pieces.len() >= self.target
    }
}

/// Accumulator threaded through the retry loop.
struct Attempt {
    attempt: u32,
    fragments: Vec<Vec<Point>>,
    cuts: Vec<Cut>,
}

#[derive(Clone, Debug, Default)]
pub struct CuttingEngine {
    cfg: CutCfg,
}

impl CuttingEngine {
    pub fn new(cfg: CutCfg) -> Self {
        Self { cfg }
    }

    pub fn cfg(&self) -> &CutCfg {
        &self.cfg
    }

    pub fn cut<R: Rng>(
        &self,
        shape: &Shape,
        kind: CutType,
        cut_count: usize,
        rng: &mut R,
    ) -> CutReport {
        let target = cut_count + 1;
        let Some(bounds) = shape.bounds() else {
            // nothing to cut; hand back what we were given
            return CutReport {
                pieces: PuzzlePiece::from_world(&shape.points).into_iter().collect(),
                attempts: 0,
                first_attempt_count: 0,
                target,
                cuts: Vec::new(),
            };
        };

        let initial = build_extra_cuts(&bounds, kind, cut_count, 0, rng);
        let fragments = self.apply(vec![shape.points.clone()], &initial);
        let first_attempt_count = fragments.len();
        debug!(attempt = 1, pieces = first_attempt_count, target, "initial split");

        let start = Attempt {
            attempt: 1,
            fragments,
            cuts: initial,
        };
        let max = self.cfg.max_attempts.max(1);
        let flow = (2..=max).try_fold(start, |acc, attempt| {
            if acc.fragments.len() >= target {
                return ControlFlow::Break(acc);
            }
            let needed = target - acc.fragments.len();
            let batch = build_extra_cuts(&bounds, kind, needed, acc.cuts.len(), rng);
            let next = self.apply(acc.fragments.clone(), &batch);
            debug!(
                attempt,
                before = acc.fragments.len(),
                after = next.len(),
                needed,
                "compensation batch"
            );
            if next.len() > acc.fragments.len() {
                let mut cuts = acc.cuts;
                cuts.extend(batch);
                ControlFlow::Continue(Attempt {
                    attempt,
                    fragments: next,
                    cuts,
                })
            } else {
                ControlFlow::Continue(Attempt { attempt, ..acc })
            }
        });
        let done = match flow {
            ControlFlow::Break(a) | ControlFlow::Continue(a) => a,
        };

        let pieces: Vec<PuzzlePiece> = done
            .fragments
            .iter()
            .filter_map(|f| PuzzlePiece::from_world(f))
            .collect();
        info!(
            kind = %kind,
            cut_count,
            pieces = pieces.len(),
            attempts = done.attempt,
            "shape cut"
        );
        CutReport {
            pieces,
            attempts: done.attempt,
            first_attempt_count,
            target,
            cuts: done.cuts,
        }
    }

    fn apply(&self, fragments: Vec<Vec<Point>>, cuts: &[Cut]) -> Vec<Vec<Point>> {
        let lines: Vec<Line> = cuts.iter().filter_map(Cut::line).collect();
        split_polygon(fragments, &lines, &self.cfg.geom)
    }
}
