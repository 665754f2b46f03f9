//! Planar geometry helpers shared by the subdivision builder and the outline stitcher

use glam::DVec2;

use crate::config::Bounds;

/// Signed shoelace area; positive for counter-clockwise polygons
///
/// A closing vertex equal to the first one contributes nothing, so both open
/// and explicitly closed vertex lists are accepted.
pub fn signed_area(polygon: &[DVec2]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..polygon.len() {
        let a = polygon[i];
        let b = polygon[(i + 1) % polygon.len()];
        twice_area += a.perp_dot(b);
    }
    twice_area / 2.0
}

/// Circumcenter of a triangle, falling back to the centroid when the
/// triangle is (numerically) degenerate
pub(crate) fn circumcenter(a: DVec2, b: DVec2, c: DVec2) -> DVec2 {
    let ab = b - a;
    let ac = c - a;
    let d = 2.0 * ab.perp_dot(ac);
    if d.abs() < f64::EPSILON * (ab.length_squared() + ac.length_squared()) {
        return (a + b + c) / 3.0;
    }
    let ab2 = ab.length_squared();
    let ac2 = ac.length_squared();
    let offset = DVec2::new(ac.y * ab2 - ab.y * ac2, ab.x * ac2 - ac.x * ab2) / d;
    a + offset
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left(f64),
    Right(f64),
    Bottom(f64),
    Top(f64),
}

impl Side {
    #[inline]
    fn inside(self, p: DVec2) -> bool {
        match self {
            Side::Left(x) => p.x >= x,
            Side::Right(x) => p.x <= x,
            Side::Bottom(y) => p.y >= y,
            Side::Top(y) => p.y <= y,
        }
    }

    /// Crossing of segment `p`-`q` with this side
    ///
    /// Endpoints are put in lexicographic order first so that the two cells
    /// sharing a Voronoi edge compute bit-identical crossings.
    fn intersect(self, p: DVec2, q: DVec2) -> DVec2 {
        let (a, b) = if (p.x, p.y) <= (q.x, q.y) { (p, q) } else { (q, p) };
        match self {
            Side::Left(x) | Side::Right(x) => {
                let t = (x - a.x) / (b.x - a.x);
                DVec2::new(x, a.y + t * (b.y - a.y))
            }
            Side::Bottom(y) | Side::Top(y) => {
                let t = (y - a.y) / (b.y - a.y);
                DVec2::new(a.x + t * (b.x - a.x), y)
            }
        }
    }
}

#[inline]
fn sides(bounds: Bounds) -> [Side; 4] {
    [
        Side::Left(0.0),
        Side::Right(bounds.width),
        Side::Bottom(0.0),
        Side::Top(bounds.height),
    ]
}

/// Sutherland–Hodgman clip of a convex polygon to the canvas rectangle
///
/// Consecutive duplicate vertices are removed from the result.
pub(crate) fn clip_polygon(polygon: &[DVec2], bounds: Bounds) -> Vec<DVec2> {
    let mut output: Vec<DVec2> = polygon.to_vec();

    for side in sides(bounds) {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        for i in 0..input.len() {
            let current = input[i];
            let previous = input[(i + input.len() - 1) % input.len()];
            match (side.inside(previous), side.inside(current)) {
                (true, true) => output.push(current),
                (true, false) => output.push(side.intersect(previous, current)),
                (false, true) => {
                    output.push(side.intersect(previous, current));
                    output.push(current);
                }
                (false, false) => {}
            }
        }
    }

    output.dedup();
    while output.len() > 1 && output.first() == output.last() {
        output.pop();
    }
    output
}

/// Liang–Barsky clip of a segment to the canvas; `None` when it misses
pub(crate) fn clip_segment(a: DVec2, b: DVec2, bounds: Bounds) -> Option<(DVec2, DVec2)> {
    let d = b - a;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let checks = [
        (-d.x, a.x),
        (d.x, bounds.width - a.x),
        (-d.y, a.y),
        (d.y, bounds.height - a.y),
    ];
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((a + d * t0, a + d * t1))
}
