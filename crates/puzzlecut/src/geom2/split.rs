//! Splitting simple polygons along lines.
//!
//! Model
//! - Classify ring vertices by signed distance to the line, insert a crossing
//!   point on every edge that changes side, sort crossings along the line and
//!   pair them `(0,1), (2,3), …` into interior chords.
//! - Trace faces by walking the ring counterclockwise; on reaching a crossing,
//!   jump along its chord to the partner and keep walking.
//!
//! The pairing is only valid when every crossing is transversal, so a line
//! that touches a vertex is nudged along its normal first. Works for
//! non-convex rings (cloud and jagged contours) as long as they are simple.

use nalgebra::Vector2;
use tracing::debug;

use super::types::{GeomCfg, Point};
use super::util::{dedup_ring, signed_area};

/// Infinite line through `origin` with unit direction `dir`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub origin: Vector2<f64>,
    pub dir: Vector2<f64>,
}

impl Line {
    /// Line through two distinct points; `None` if they coincide or are non-finite.
    pub fn through(a: Vector2<f64>, b: Vector2<f64>) -> Option<Self> {
        let d = b - a;
        let norm = d.norm();
        if !norm.is_finite() || norm <= 0.0 || !a.x.is_finite() || !a.y.is_finite() {
            return None;
        }
        Some(Self {
            origin: a,
            dir: d / norm,
        })
    }
    /// Left-hand unit normal.
    #[inline]
    pub fn normal(&self) -> Vector2<f64> {
        Vector2::new(-self.dir.y, self.dir.x)
    }
    #[inline]
    fn shifted(&self, by: f64) -> Self {
        Self {
            origin: self.origin + self.normal() * by,
            dir: self.dir,
        }
    }
}

struct Node {
    pt: Point,
    crossing: bool,
}

/// Split one ring along `line`. Returns the input (as CCW) when the line
/// misses it or cannot be made transversal within `cfg.max_nudges` tries.
pub fn split_by_line(ring: &[Point], line: &Line, cfg: &GeomCfg) -> Vec<Vec<Point>> {
    let mut ccw: Vec<Point> = ring.to_vec();
    if signed_area(&ccw) < 0.0 {
        ccw.reverse();
    }
    if ccw.len() < 3 {
        return vec![ccw];
    }

    let Some((line, sides)) = transversal_sides(&ccw, line, cfg) else {
        debug!(vertices = ccw.len(), "cut stays degenerate after nudging; fragment kept whole");
        return vec![ccw];
    };
    if sides.iter().all(|s| *s > 0.0) || sides.iter().all(|s| *s < 0.0) {
        return vec![ccw];
    }

    let n = ccw.len();
    let mut nodes: Vec<Node> = Vec::with_capacity(n + 8);
    // (node index, coordinate along the line)
    let mut crossings: Vec<(usize, f64)> = Vec::new();
    for i in 0..n {
        let j = (i + 1) % n;
        nodes.push(Node {
            pt: ccw[i],
            crossing: false,
        });
        let (si, sj) = (sides[i], sides[j]);
        if (si > 0.0) != (sj > 0.0) {
            let t = si / (si - sj);
            let p = ccw[i].vec() + (ccw[j].vec() - ccw[i].vec()) * t;
            crossings.push((nodes.len(), line.dir.dot(&(p - line.origin))));
            nodes.push(Node {
                pt: Point::new(p.x, p.y),
                crossing: true,
            });
        }
    }
    if crossings.len() % 2 != 0 {
        debug!(crossings = crossings.len(), "odd crossing count; fragment kept whole");
        return vec![ccw];
    }
    crossings.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let m = nodes.len();
    let mut partner = vec![usize::MAX; m];
    for pair in crossings.chunks_exact(2) {
        partner[pair[0].0] = pair[1].0;
        partner[pair[1].0] = pair[0].0;
    }

    let mut visited = vec![false; m];
    let mut out: Vec<Vec<Point>> = Vec::new();
    for start in 0..m {
        if nodes[start].crossing || visited[start] {
            continue;
        }
        let mut piece: Vec<Point> = Vec::new();
        let mut cur = start;
        let mut steps = 0usize;
        loop {
            steps += 1;
            if steps > 2 * m + 2 {
                debug!("face walk did not close; fragment kept whole");
                return vec![ccw];
            }
            piece.push(nodes[cur].pt);
            if nodes[cur].crossing {
                let p = partner[cur];
                piece.push(nodes[p].pt);
                cur = (p + 1) % m;
            } else {
                visited[cur] = true;
                cur = (cur + 1) % m;
            }
            if cur == start {
                break;
            }
        }
        dedup_ring(&mut piece, cfg.eps_merge);
        if piece.len() >= 3 && signed_area(&piece).abs() >= cfg.min_area {
            out.push(piece);
        }
    }
    if out.is_empty() {
        return vec![ccw];
    }
    out
}

/// Signed side values for a line that no vertex touches, nudging as needed.
fn transversal_sides(ring: &[Point], line: &Line, cfg: &GeomCfg) -> Option<(Line, Vec<f64>)> {
    for k in 0..=cfg.max_nudges {
        // 0, +1, -1, +2, -2, ... multiples of a few tolerances
        let step = ((k + 1) / 2) as f64 * 4.0 * cfg.eps_on_line;
        let shift = if k % 2 == 1 { step } else { -step };
        let candidate = line.shifted(shift);
        let nrm = candidate.normal();
        let sides: Vec<f64> = ring
            .iter()
            .map(|p| nrm.dot(&(p.vec() - candidate.origin)))
            .collect();
        if sides.iter().all(|s| s.abs() > cfg.eps_on_line) {
            return Some((candidate, sides));
        }
    }
    None
}

/// Apply every line to every current fragment, in order.
pub fn split_polygon(polygons: Vec<Vec<Point>>, lines: &[Line], cfg: &GeomCfg) -> Vec<Vec<Point>> {
    lines.iter().fold(polygons, |frags, line| {
        frags
            .iter()
            .flat_map(|f| split_by_line(f, line, cfg))
            .collect()
    })
}
