//! Spatial indexing for fast position-to-cell lookups
//!
//! This module is only available with the `spatial-index` feature.

use glam::DVec2;
use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// KD-tree over cell sites
///
/// The nearest site to a position is the Voronoi cell containing it, so this
/// answers "which cell is under the cursor" in O(log n). Only live cells are
/// indexed; `find_nearest` returns the caller's cell index, not the slot in
/// the tree.
#[derive(Clone)]
pub struct SpatialIndex {
    tree: ImmutableKdTree<f64, usize, 2, 32>,
    ids: Vec<usize>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.ids.len())
            .finish()
    }
}

impl SpatialIndex {
    /// Build an index from `(cell index, site)` pairs
    ///
    /// # Example
    ///
    /// ```
    /// use glam::DVec2;
    /// use voronoi_city::SpatialIndex;
    ///
    /// let index = SpatialIndex::new(&[
    ///     (0, DVec2::new(10.0, 10.0)),
    ///     (3, DVec2::new(90.0, 10.0)),
    /// ]);
    /// assert_eq!(index.find_nearest(DVec2::new(80.0, 20.0)), Some(3));
    /// ```
    pub fn new(sites: &[(usize, DVec2)]) -> Self {
        let points: Vec<[f64; 2]> = sites.iter().map(|(_, p)| [p.x, p.y]).collect();
        let ids = sites.iter().map(|(id, _)| *id).collect();

        Self {
            tree: ImmutableKdTree::new_from_slice(&points),
            ids,
        }
    }

    /// Number of indexed cells
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the index holds no cells
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Cell whose site is closest to `position`, or `None` for an empty index
    pub fn find_nearest(&self, position: DVec2) -> Option<usize> {
        if self.ids.is_empty() {
            return None;
        }
        let result = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[position.x, position.y]);
        self.ids.get(result.item as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spatial_index_basic() {
        let sites = vec![
            (0, DVec2::new(0.0, 0.0)),
            (1, DVec2::new(100.0, 0.0)),
            (2, DVec2::new(0.0, 100.0)),
            (3, DVec2::new(100.0, 100.0)),
        ];
        let index = SpatialIndex::new(&sites);

        assert_eq!(index.len(), 4);
        assert_eq!(index.find_nearest(DVec2::new(10.0, 5.0)), Some(0));
        assert_eq!(index.find_nearest(DVec2::new(95.0, 2.0)), Some(1));
        assert_eq!(index.find_nearest(DVec2::new(3.0, 70.0)), Some(2));
        assert_eq!(index.find_nearest(DVec2::new(60.0, 60.0)), Some(3));
    }

    #[test]
    fn test_spatial_index_maps_back_to_cell_ids() {
        // Cell 1 is missing from the index (a duplicate site, say)
        let sites = vec![(0, DVec2::new(0.0, 0.0)), (2, DVec2::new(50.0, 50.0))];
        let index = SpatialIndex::new(&sites);

        assert_eq!(index.find_nearest(DVec2::new(49.0, 49.0)), Some(2));
        assert_eq!(index.find_nearest(sites[0].1), Some(0));
    }
}
