use nalgebra::Vector2;

use super::types::Point;

#[inline]
pub(crate) fn cross(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Shoelace area; positive for counterclockwise rings.
pub fn signed_area(ring: &[Point]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut a = 0.0;
    for i in 0..ring.len() {
        let p = ring[i];
        let q = ring[(i + 1) % ring.len()];
        a += p.x * q.y - q.x * p.y;
    }
    a * 0.5
}

/// Area centroid; `None` for degenerate (near-zero area) rings.
pub fn area_centroid(ring: &[Point]) -> Option<Vector2<f64>> {
    if ring.len() < 3 {
        return None;
    }
    let mut a: f64 = 0.0;
    let mut cx: f64 = 0.0;
    let mut cy: f64 = 0.0;
    for i in 0..ring.len() {
        let p = ring[i];
        let q = ring[(i + 1) % ring.len()];
        let c = p.x * q.y - q.x * p.y;
        a += c;
        cx += (p.x + q.x) * c;
        cy += (p.y + q.y) * c;
    }
    a *= 0.5;
    if a.abs() < 1e-18 {
        return None;
    }
    Some(Vector2::new(cx / (6.0 * a), cy / (6.0 * a)))
}

/// Area centroid with a vertex-mean fallback for slivers.
pub fn centroid_or_mean(ring: &[Point]) -> Option<Vector2<f64>> {
    if ring.is_empty() {
        return None;
    }
    area_centroid(ring).or_else(|| {
        let sum = ring.iter().fold(Vector2::zeros(), |acc, p| acc + p.vec());
        Some(sum / ring.len() as f64)
    })
}

/// Even-odd ray cast. Boundary points may land on either side.
pub fn point_in_polygon(p: Vector2<f64>, ring: &[Point]) -> bool {
    let mut inside = false;
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);
        if (yi > p.y) != (yj > p.y) {
            let x_cross = (xj - xi) * (p.y - yi) / (yj - yi) + xi;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Euclidean distance from `p` to the segment `a`–`b`.
pub fn distance_to_segment(p: Vector2<f64>, a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 <= 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Distance from `p` to the closed ring's boundary.
pub fn distance_to_boundary(p: Vector2<f64>, ring: &[Point]) -> f64 {
    let n = ring.len();
    (0..n)
        .map(|i| distance_to_segment(p, ring[i].vec(), ring[(i + 1) % n].vec()))
        .fold(f64::INFINITY, f64::min)
}

/// Inside, or within `tol` of the boundary.
pub fn contains_with_tolerance(p: Vector2<f64>, ring: &[Point], tol: f64) -> bool {
    point_in_polygon(p, ring) || distance_to_boundary(p, ring) <= tol
}

/// Drop consecutive near-duplicates (including the wrap-around pair).
/// When two points merge, an original tag wins.
pub fn dedup_ring(ring: &mut Vec<Point>, eps: f64) {
    let mut out: Vec<Point> = Vec::with_capacity(ring.len());
    for p in ring.drain(..) {
        if let Some(last) = out.last_mut() {
            if (last.vec() - p.vec()).norm() <= eps {
                last.is_original |= p.is_original;
                continue;
            }
        }
        out.push(p);
    }
    while out.len() > 1 {
        let first = out[0];
        let last = out[out.len() - 1];
        if (first.vec() - last.vec()).norm() <= eps {
            out[0].is_original |= last.is_original;
            out.pop();
        } else {
            break;
        }
    }
    *ring = out;
}
