//! Immutable results of the generation pipelines

use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::TerrainCell;
use crate::error::Result;
use crate::skeleton::DistrictId;

/// Raw geometry of the skeleton pipeline
///
/// The point set and border list can be handed back to the full pipeline so
/// several attempts share one sampled skeleton.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonData {
    /// Sampled points, in sampling order
    pub points: Vec<DVec2>,
    /// Every triangulation edge as `M a L b` segments
    pub delaunay_path: String,
    /// One path per point; `None` where the cell vanished
    pub voronoi_cell_paths: Vec<Option<String>>,
    /// Cells with a polygon vertex within the margin of the canvas edge
    pub border_cell_indices: Vec<usize>,
}

/// A district with its generated geometry
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictGeometry {
    /// Caller ID, preserved
    pub id: DistrictId,
    pub name: String,
    /// Boundary of the member cells; `None` means nothing to draw
    pub svg_path: Option<String>,
    /// Final k-means centroid
    pub centroid: DVec2,
    /// Member cell indices, ascending
    pub cells: Vec<usize>,
}

/// A ward with its generated geometry
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct WardGeometry {
    pub id: String,
    pub name: String,
    /// Boundary of all member districts' cells
    pub svg_path: Option<String>,
    pub centroid: DVec2,
    pub districts: Vec<DistrictGeometry>,
}

impl WardGeometry {
    /// Cells of every district in this ward, ascending
    pub fn cells(&self) -> Vec<usize> {
        let mut cells: Vec<usize> = self
            .districts
            .iter()
            .flat_map(|d| d.cells.iter().copied())
            .collect();
        cells.sort_unstable();
        cells
    }
}

/// Flavour of a point of interest
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoiKind {
    Landmark,
    ResourceNode,
}

impl std::fmt::Display for PoiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PoiKind::Landmark => f.write_str("Landmark"),
            PoiKind::ResourceNode => f.write_str("Resource Node"),
        }
    }
}

/// A point of interest scattered onto a district
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    /// `poi-<district id>`
    pub id: String,
    pub district_id: DistrictId,
    pub kind: PoiKind,
    /// Cell under the district centroid, if any
    pub cell: Option<usize>,
}

/// Result of the full ("muscles") pipeline
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CityMap {
    /// Every classified cell, for background rendering
    pub terrain: Vec<TerrainCell>,
    pub wards: Vec<WardGeometry>,
    /// Districts sharing a cell edge, `(min, max)`, sorted
    pub connections: Vec<(DistrictId, DistrictId)>,
    /// Delaunay edges over ward centroids, as ward ID pairs
    pub supply_lines: Vec<(String, String)>,
    pub pois: Vec<PointOfInterest>,
}

impl CityMap {
    /// All districts, ward by ward
    pub fn districts(&self) -> impl Iterator<Item = &DistrictGeometry> + '_ {
        self.wards.iter().flat_map(|w| w.districts.iter())
    }

    /// Total number of districts
    pub fn district_count(&self) -> usize {
        self.wards.iter().map(|w| w.districts.len()).sum()
    }

    /// Look up a district by its caller ID
    pub fn district(&self, id: DistrictId) -> Option<&DistrictGeometry> {
        self.districts().find(|d| d.id == id)
    }

    /// The ward owning district `id`
    pub fn ward_of(&self, id: DistrictId) -> Option<&WardGeometry> {
        self.wards
            .iter()
            .find(|w| w.districts.iter().any(|d| d.id == id))
    }

    /// Whether two districts share a border
    pub fn is_adjacent(&self, a: DistrictId, b: DistrictId) -> bool {
        let key = if a < b { (a, b) } else { (b, a) };
        self.connections.binary_search(&key).is_ok()
    }

    /// Number of land cells
    pub fn land_cell_count(&self) -> usize {
        self.terrain.iter().filter(|c| c.is_land()).count()
    }

    /// Terrain cell `id`
    ///
    /// # Errors
    ///
    /// Returns `CellNotFound` for an ID with no cell.
    pub fn terrain_cell(&self, id: usize) -> Result<&TerrainCell> {
        TerrainCell::find(&self.terrain, id)
    }
}

/// Result of the legacy connectivity pipeline
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityMap {
    /// The caller's wards with geometry attached
    pub enriched_wards: Vec<WardGeometry>,
    /// Districts sharing a cell edge, `(min, max)`, sorted
    pub connections: Vec<(DistrictId, DistrictId)>,
}

impl ConnectivityMap {
    /// Whether two districts share a border
    pub fn is_adjacent(&self, a: DistrictId, b: DistrictId) -> bool {
        let key = if a < b { (a, b) } else { (b, a) };
        self.connections.binary_search(&key).is_ok()
    }
}

/// Result of the terrain-only pipeline
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMap {
    pub cells: Vec<TerrainCell>,
}

impl TerrainMap {
    /// # Errors
    ///
    /// Returns `CellNotFound` for an ID with no cell.
    pub fn cell(&self, id: usize) -> Result<&TerrainCell> {
        TerrainCell::find(&self.cells, id)
    }
}
