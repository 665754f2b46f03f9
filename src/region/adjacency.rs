//! Region adjacency from the cell neighbour relation, and ward supply lines

use std::collections::{BTreeSet, HashMap};

use glam::DVec2;
use spade::{DelaunayTriangulation, Point2, Triangulation};
use tracing::warn;

use crate::generation::Subdivision;

/// Unordered pairs of regions whose cells share an edge
///
/// `region_of` maps a cell to its region, or `None` for cells outside every
/// region (water). Pairs are stored as `(min, max)` and self pairs are
/// skipped, so the set is symmetric without duplicates.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use voronoi_city::{generation::Subdivision, region::extract_adjacency, Bounds};
///
/// let points = vec![DVec2::new(5.0, 5.0), DVec2::new(15.0, 5.0), DVec2::new(10.0, 15.0)];
/// let subdivision = Subdivision::build(&points, Bounds::new(20.0, 20.0)).unwrap();
///
/// let regions = [7u32, 3, 7];
/// let pairs = extract_adjacency(&subdivision, |cell| regions.get(cell).copied());
/// assert_eq!(pairs.into_iter().collect::<Vec<_>>(), vec![(3, 7)]);
/// ```
pub fn extract_adjacency<R, F>(subdivision: &Subdivision, region_of: F) -> BTreeSet<(R, R)>
where
    R: Ord + Copy,
    F: Fn(usize) -> Option<R>,
{
    let mut pairs = BTreeSet::new();
    for cell in subdivision.live_cells() {
        let Some(a) = region_of(cell) else {
            continue;
        };
        for &neighbor in subdivision.neighbors(cell) {
            let Some(b) = region_of(neighbor) else {
                continue;
            };
            if a != b {
                pairs.insert(if a < b { (a, b) } else { (b, a) });
            }
        }
    }
    pairs
}

/// Delaunay edges over `points` as sorted `(min, max)` index pairs
///
/// Repeated positions collapse onto their first index. Fewer than two
/// distinct points give no edges.
pub fn supply_lines(points: &[DVec2]) -> Vec<(usize, usize)> {
    let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();
    let mut owner = HashMap::with_capacity(points.len());

    for (i, p) in points.iter().enumerate() {
        match triangulation.insert(Point2::new(p.x, p.y)) {
            Ok(handle) => {
                owner.entry(handle).or_insert(i);
            }
            Err(e) => warn!(point = i, error = %e, "skipping supply line endpoint"),
        }
    }

    let mut lines: Vec<(usize, usize)> = triangulation
        .undirected_edges()
        .filter_map(|edge| {
            let [a, b] = edge.vertices();
            let i = *owner.get(&a.fix())?;
            let j = *owner.get(&b.fix())?;
            Some((i.min(j), i.max(j)))
        })
        .collect();
    lines.sort_unstable();
    lines.dedup();
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Bounds;

    fn grid() -> Subdivision {
        let mut points = Vec::new();
        for y in [5.0, 15.0, 25.0] {
            for x in [5.0, 15.0, 25.0] {
                points.push(DVec2::new(x, y));
            }
        }
        Subdivision::build(&points, Bounds::new(30.0, 30.0)).unwrap()
    }

    #[test]
    fn test_adjacency_is_canonical() {
        let subdivision = grid();
        // Columns are regions 0, 1, 2
        let pairs = extract_adjacency(&subdivision, |cell| Some(cell % 3));

        assert_eq!(pairs.into_iter().collect::<Vec<_>>(), vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_adjacency_skips_unmapped_cells() {
        let subdivision = grid();
        // Middle column is water
        let pairs = extract_adjacency(&subdivision, |cell| match cell % 3 {
            1 => None,
            c => Some(c),
        });
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_adjacency_symmetry() {
        let subdivision = grid();
        let pairs = extract_adjacency(&subdivision, Some);
        for &(a, b) in &pairs {
            assert!(a < b);
            assert!(!pairs.contains(&(b, a)));
        }
        // Six horizontal and six vertical neighbours
        assert_eq!(pairs.len(), 12);
    }

    #[test]
    fn test_supply_lines() {
        let points = [
            DVec2::new(0.0, 0.0),
            DVec2::new(10.0, 0.0),
            DVec2::new(5.0, 8.0),
            DVec2::new(5.0, 3.0),
        ];
        let lines = supply_lines(&points);
        // Center point connects to all three corners
        assert_eq!(lines, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_supply_lines_degenerate() {
        assert!(supply_lines(&[]).is_empty());
        assert!(supply_lines(&[DVec2::ONE]).is_empty());
        assert!(supply_lines(&[DVec2::ONE, DVec2::ONE]).is_empty());
        assert_eq!(supply_lines(&[DVec2::ZERO, DVec2::ONE]), vec![(0, 1)]);
    }
}
