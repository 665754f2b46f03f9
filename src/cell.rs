//! Terrain Cell Structure
//!
//! One classified Voronoi cell of a generated map, ready for background rendering.

use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MapGenError, Result};
use crate::generation::{signed_area, Subdivision};
use crate::svg;
use crate::terrain::{Biome, Classification, TerrainType};

/// A single classified cell of the map
///
/// # Design Notes
///
/// Cells are derived data: the same seed and point set always regenerate
/// the same cells, so callers persist the seed rather than the cells.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainCell {
    /// Index of the cell's site in the sampled point set
    ///
    /// Missing cells are skipped, so IDs are not necessarily contiguous.
    pub id: usize,

    /// Sample point the cell was grown from
    pub site: DVec2,

    /// Closed SVG path of the clipped polygon
    pub path: String,

    /// Water or land
    pub terrain: TerrainType,

    /// Display category
    pub biome: Biome,

    /// Elevation the classification was based on
    pub elevation: f64,

    /// IDs of cells sharing an edge with this one
    pub neighbors: Vec<usize>,

    /// Counter-clockwise polygon, without a repeated closing vertex
    pub vertices: Vec<DVec2>,
}

impl TerrainCell {
    /// Find cell `id` in a list sorted by ID
    ///
    /// # Errors
    ///
    /// Returns `CellNotFound` if no cell carries that ID, which includes
    /// sites whose polygon vanished.
    pub fn find(cells: &[TerrainCell], id: usize) -> Result<&TerrainCell> {
        cells
            .binary_search_by_key(&id, |c| c.id)
            .map(|i| &cells[i])
            .map_err(|_| MapGenError::CellNotFound(id))
    }

    /// Assemble cells from a subdivision and its classification
    ///
    /// Cells without a polygon or classification are skipped.
    pub fn collect(subdivision: &Subdivision, classes: &[Option<Classification>]) -> Vec<Self> {
        classes
            .iter()
            .enumerate()
            .filter_map(|(id, class)| {
                let class = (*class)?;
                let polygon = subdivision.cell_polygon(id)?;
                Some(Self {
                    id,
                    site: subdivision.site(id),
                    path: svg::polygon_path(polygon),
                    terrain: class.terrain,
                    biome: class.biome,
                    elevation: class.elevation,
                    neighbors: subdivision.neighbors(id).to_vec(),
                    vertices: polygon.to_vec(),
                })
            })
            .collect()
    }

    /// Get the number of neighboring cells
    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Check if this cell is a neighbor of another cell
    #[inline]
    pub fn is_neighbor_of(&self, other_cell_id: usize) -> bool {
        self.neighbors.contains(&other_cell_id)
    }

    #[inline]
    pub fn is_land(&self) -> bool {
        self.terrain.is_land()
    }

    /// Area of the clipped polygon
    pub fn area(&self) -> f64 {
        signed_area(&self.vertices)
    }

    /// Distance between the two cells' sites
    pub fn distance_to(&self, other: &TerrainCell) -> f64 {
        self.site.distance(other.site)
    }
}
