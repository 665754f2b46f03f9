//! Boundary stitching for unions of cells
//!
//! Every polygon edge of the member cells is counted under an
//! orientation-free key. Interior edges are seen twice (once from each side)
//! and drop out; what remains is the boundary, which is chained back into
//! closed loops.

use std::collections::{BTreeSet, HashMap};

use glam::DVec2;
use tracing::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::generation::{signed_area, Subdivision};
use crate::svg;

/// A vertex position snapped to an integer grid of `10^-decimals` units
///
/// Two cells compute their shared vertices independently; snapping absorbs
/// floating point jitter so the shared edge gets one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapKey {
    x: i64,
    y: i64,
}

impl SnapKey {
    /// Snap `p` at `scale` grid steps per unit
    #[inline]
    pub fn new(p: DVec2, scale: f64) -> Self {
        Self {
            x: (p.x * scale).round() as i64,
            y: (p.y * scale).round() as i64,
        }
    }
}

/// Grid steps per unit for `decimals` decimal places
#[inline]
pub fn snap_scale(decimals: u32) -> f64 {
    10f64.powi(decimals as i32)
}

/// Closed boundary loops of a set of cells
///
/// Each loop repeats its first vertex at the end. Outer boundaries run
/// counter-clockwise and holes clockwise, so `area` is the area of the union.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Outline {
    pub loops: Vec<Vec<DVec2>>,
}

impl Outline {
    /// Number of closed loops
    #[inline]
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Signed area enclosed by all loops
    pub fn area(&self) -> f64 {
        self.loops.iter().map(|l| signed_area(l)).sum()
    }

    /// `M x,y L x,y ... Z` per loop, loops joined by spaces
    pub fn to_svg_path(&self) -> String {
        let mut out = String::new();
        for points in &self.loops {
            svg::push_loop(&mut out, points);
        }
        out
    }
}

#[derive(Debug, Clone, Copy)]
struct Endpoint {
    key: SnapKey,
    position: DVec2,
}

#[derive(Debug, Clone, Copy)]
struct BoundaryEdge {
    from: Endpoint,
    to: Endpoint,
    count: u32,
}

/// Outline of the union of `cells`
///
/// Returns `None` for an empty set, or when no boundary edge survives (no
/// member cell has a polygon). Fragmented sets produce one loop per piece.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use voronoi_city::{generation::Subdivision, region::outline, Bounds};
///
/// let points = vec![DVec2::new(5.0, 5.0), DVec2::new(15.0, 5.0), DVec2::new(10.0, 15.0)];
/// let subdivision = Subdivision::build(&points, Bounds::new(20.0, 20.0)).unwrap();
///
/// // All cells together cover the canvas
/// let all = outline([0, 1, 2], &subdivision, 5).unwrap();
/// assert_eq!(all.loop_count(), 1);
/// assert!((all.area() - 400.0).abs() < 1e-6);
///
/// assert!(outline([], &subdivision, 5).is_none());
/// ```
pub fn outline<I>(cells: I, subdivision: &Subdivision, snap_decimals: u32) -> Option<Outline>
where
    I: IntoIterator<Item = usize>,
{
    let members: BTreeSet<usize> = cells.into_iter().collect();
    if members.is_empty() {
        return None;
    }
    let scale = snap_scale(snap_decimals);

    // Insertion order keeps the result deterministic
    let mut edges: Vec<BoundaryEdge> = Vec::new();
    let mut index: HashMap<(SnapKey, SnapKey), usize> = HashMap::new();

    for &cell in &members {
        let Some(polygon) = subdivision.cell_polygon(cell) else {
            continue;
        };
        for (i, &a) in polygon.iter().enumerate() {
            let b = polygon[(i + 1) % polygon.len()];
            let from = Endpoint {
                key: SnapKey::new(a, scale),
                position: a,
            };
            let to = Endpoint {
                key: SnapKey::new(b, scale),
                position: b,
            };
            if from.key == to.key {
                continue;
            }
            let key = if from.key < to.key {
                (from.key, to.key)
            } else {
                (to.key, from.key)
            };
            match index.get(&key) {
                Some(&slot) => edges[slot].count += 1,
                None => {
                    index.insert(key, edges.len());
                    edges.push(BoundaryEdge { from, to, count: 1 });
                }
            }
        }
    }

    let boundary: Vec<BoundaryEdge> = edges.into_iter().filter(|e| e.count == 1).collect();
    trace!(
        cells = members.len(),
        boundary_edges = boundary.len(),
        "outline edges counted"
    );
    if boundary.is_empty() {
        return None;
    }

    let loops = chain_loops(&boundary);
    Some(Outline { loops })
}

/// Chain boundary edges into loops
///
/// Continuing along an edge's own orientation is preferred, which keeps
/// loops consistently oriented; an edge touching the current end the other
/// way round is taken as a fallback.
fn chain_loops(edges: &[BoundaryEdge]) -> Vec<Vec<DVec2>> {
    let mut by_start: HashMap<SnapKey, Vec<usize>> = HashMap::new();
    let mut by_end: HashMap<SnapKey, Vec<usize>> = HashMap::new();
    for (i, edge) in edges.iter().enumerate() {
        by_start.entry(edge.from.key).or_default().push(i);
        by_end.entry(edge.to.key).or_default().push(i);
    }

    let take = |candidates: Option<&Vec<usize>>, used: &[bool]| -> Option<usize> {
        candidates?.iter().copied().find(|&i| !used[i])
    };

    let mut used = vec![false; edges.len()];
    let mut loops = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }
        used[first] = true;
        let start = edges[first].from.key;
        let mut points = vec![edges[first].from.position, edges[first].to.position];
        let mut current = edges[first].to.key;

        while current != start {
            if let Some(next) = take(by_start.get(&current), &used) {
                used[next] = true;
                points.push(edges[next].to.position);
                current = edges[next].to.key;
            } else if let Some(next) = take(by_end.get(&current), &used) {
                used[next] = true;
                points.push(edges[next].from.position);
                current = edges[next].from.key;
            } else {
                break;
            }
        }

        // Close on the exact first vertex
        if current == start {
            points.pop();
        }
        points.push(points[0]);
        loops.push(points);
    }

    loops
}
