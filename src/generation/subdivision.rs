//! Planar subdivision: Delaunay triangulation and its clipped Voronoi dual
//!
//! The triangulation is built with `spade`. Four far-away ghost sites are
//! inserted first so that every real site is an interior vertex; its Voronoi
//! cell is then the closed ring of circumcenters of the triangles around it,
//! clipped to the canvas. Circumcenters are computed once per triangle, so
//! two neighbouring cells always share bit-identical vertices.

use std::collections::HashMap;
use std::time::Instant;

use glam::DVec2;
use spade::handles::{DirectedEdgeHandle, FixedFaceHandle, FixedVertexHandle, InnerTag};
use spade::{DelaunayTriangulation, Point2, Triangulation};
use tracing::{debug, warn};

use crate::config::Bounds;
use crate::error::{MapGenError, Result};
use crate::generation::geometry::{circumcenter, clip_polygon, clip_segment, signed_area};
#[cfg(feature = "spatial-index")]
use crate::spatial::SpatialIndex;
use crate::svg;

/// Ghost sites sit this many canvas perimeters away from the center
const GHOST_DISTANCE_FACTOR: f64 = 10.0;

/// Voronoi edges shorter than this (after clipping) do not make two cells neighbours
const MIN_SHARED_EDGE: f64 = 1e-9;

type Circumcenters = HashMap<FixedFaceHandle<InnerTag>, DVec2>;

/// A Voronoi diagram clipped to the canvas, with its Delaunay adjacency
///
/// Cells are identified by the index of their site in the input point slice.
/// A cell may be missing (`cell_polygon` returns `None`) when its site
/// duplicates an earlier one or its polygon degenerates after clipping.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use voronoi_city::{generation::Subdivision, Bounds};
///
/// let points = vec![
///     DVec2::new(25.0, 25.0),
///     DVec2::new(75.0, 25.0),
///     DVec2::new(50.0, 75.0),
/// ];
/// let subdivision = Subdivision::build(&points, Bounds::new(100.0, 100.0)).unwrap();
///
/// assert_eq!(subdivision.len(), 3);
/// assert_eq!(subdivision.neighbors(0), &[1, 2]);
/// ```
#[derive(Debug, Clone)]
pub struct Subdivision {
    bounds: Bounds,
    sites: Vec<DVec2>,
    cells: Vec<Option<Vec<DVec2>>>,
    neighbors: Vec<Vec<usize>>,
    edges: Vec<(usize, usize)>,
    #[cfg(feature = "spatial-index")]
    index: SpatialIndex,
}

impl Subdivision {
    /// Triangulate `points` and derive their clipped Voronoi cells
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if a point is not finite or lies outside the
    /// canvas, or if fewer than three distinct points remain.
    pub fn build(points: &[DVec2], bounds: Bounds) -> Result<Self> {
        let start = Instant::now();

        if let Some((i, p)) = points
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.is_finite() && bounds.contains(**p)))
        {
            return Err(MapGenError::InvalidInput(format!(
                "point {} at ({}, {}) lies outside the {}x{} canvas",
                i, p.x, p.y, bounds.width, bounds.height
            )));
        }

        let mut triangulation: DelaunayTriangulation<Point2<f64>> = DelaunayTriangulation::new();

        let center = bounds.center();
        let reach = GHOST_DISTANCE_FACTOR * (bounds.width + bounds.height);
        for (dx, dy) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            triangulation
                .insert(Point2::new(center.x + dx * reach, center.y + dy * reach))
                .map_err(|e| MapGenError::InvalidInput(format!("cannot place ghost site: {}", e)))?;
        }

        // Input index -> vertex, and vertex -> first input index that produced it
        let mut handles: Vec<Option<FixedVertexHandle>> = Vec::with_capacity(points.len());
        let mut owner: HashMap<FixedVertexHandle, usize> = HashMap::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            let handle = triangulation
                .insert(Point2::new(p.x, p.y))
                .map_err(|e| MapGenError::InvalidInput(format!("cannot insert point {}: {}", i, e)))?;
            if owner.contains_key(&handle) {
                handles.push(None);
            } else {
                owner.insert(handle, i);
                handles.push(Some(handle));
            }
        }

        if owner.len() < 3 {
            return Err(MapGenError::InvalidInput(format!(
                "need at least 3 distinct points, got {}",
                owner.len()
            )));
        }
        let duplicates = points.len() - owner.len();
        if duplicates > 0 {
            warn!(duplicates, "duplicate sites have no cell");
        }

        let mut circumcenters: Circumcenters = HashMap::with_capacity(triangulation.num_inner_faces());
        for face in triangulation.inner_faces() {
            let [a, b, c] = face.vertices().map(|v| to_dvec(v.position()));
            circumcenters.insert(face.fix(), circumcenter(a, b, c));
        }

        let mut cells = Vec::with_capacity(points.len());
        let mut neighbors = Vec::with_capacity(points.len());
        let mut degenerate = 0usize;

        for handle in &handles {
            let Some(handle) = handle else {
                cells.push(None);
                neighbors.push(Vec::new());
                continue;
            };
            let vertex = triangulation.vertex(*handle);

            // Out-edges run counter-clockwise, and so do the faces on their left
            let mut ring = Vec::new();
            let mut bounded = true;
            let mut adjacent = Vec::new();
            for edge in vertex.out_edges() {
                match edge
                    .face()
                    .as_inner()
                    .and_then(|face| circumcenters.get(&face.fix()))
                {
                    Some(c) => ring.push(*c),
                    None => bounded = false,
                }
                if let Some(&j) = owner.get(&edge.to().fix()) {
                    if dual_edge_visible(edge, &circumcenters, bounds) {
                        adjacent.push(j);
                    }
                }
            }
            adjacent.sort_unstable();
            adjacent.dedup();

            let polygon = if bounded {
                normalize_polygon(clip_polygon(&ring, bounds))
            } else {
                None
            };
            if polygon.is_none() {
                degenerate += 1;
            }
            cells.push(polygon);
            neighbors.push(adjacent);
        }

        if degenerate > 0 {
            warn!(degenerate, "cells vanished after clipping");
        }

        let mut edges: Vec<(usize, usize)> = triangulation
            .undirected_edges()
            .filter_map(|edge| {
                let [a, b] = edge.vertices();
                let i = *owner.get(&a.fix())?;
                let j = *owner.get(&b.fix())?;
                Some((i.min(j), i.max(j)))
            })
            .collect();
        edges.sort_unstable();

        let sites = points.to_vec();

        #[cfg(feature = "spatial-index")]
        let index = {
            let live: Vec<(usize, DVec2)> = cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.is_some())
                .map(|(i, _)| (i, sites[i]))
                .collect();
            SpatialIndex::new(&live)
        };

        debug!(
            sites = points.len(),
            triangles = circumcenters.len(),
            edges = edges.len(),
            elapsed = ?start.elapsed(),
            "subdivision built"
        );

        Ok(Self {
            bounds,
            sites,
            cells,
            neighbors,
            edges,
            #[cfg(feature = "spatial-index")]
            index,
        })
    }

    /// Canvas the cells are clipped to
    #[inline]
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Number of cells, including missing ones
    #[inline]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether the subdivision has no cells
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Site of cell `i`
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    #[inline]
    pub fn site(&self, i: usize) -> DVec2 {
        self.sites[i]
    }

    /// All sites in input order
    #[inline]
    pub fn sites(&self) -> &[DVec2] {
        &self.sites
    }

    /// Counter-clockwise polygon of cell `i`, without a repeated closing vertex
    pub fn cell_polygon(&self, i: usize) -> Option<&[DVec2]> {
        self.cells.get(i)?.as_deref()
    }

    /// Cells sharing a Voronoi edge of positive length with cell `i`, ascending
    pub fn neighbors(&self, i: usize) -> &[usize] {
        self.neighbors.get(i).map_or(&[], Vec::as_slice)
    }

    /// Area of cell `i`; zero for a missing cell
    pub fn cell_area(&self, i: usize) -> f64 {
        self.cell_polygon(i).map_or(0.0, signed_area)
    }

    /// Indices of cells that have a polygon
    pub fn live_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| cell.as_ref().map(|_| i))
    }

    /// Delaunay edges between real sites as `(min, max)` index pairs, sorted
    pub fn triangulation_edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Cells with any polygon vertex within `margin` of the canvas edge
    pub fn border_cells(&self, margin: f64) -> Vec<usize> {
        let max_x = self.bounds.width - margin;
        let max_y = self.bounds.height - margin;
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| {
                let polygon = cell.as_ref()?;
                polygon
                    .iter()
                    .any(|v| v.x <= margin || v.x >= max_x || v.y <= margin || v.y >= max_y)
                    .then_some(i)
            })
            .collect()
    }

    /// Path of cell `i`, or `None` for a missing cell
    pub fn render_cell(&self, i: usize) -> Option<String> {
        self.cell_polygon(i).map(svg::polygon_path)
    }

    /// One path per cell, in input order
    pub fn render_all_cells(&self) -> Vec<Option<String>> {
        (0..self.len()).map(|i| self.render_cell(i)).collect()
    }

    /// Every triangulation edge as an `M a L b` segment, in one path
    pub fn render_triangulation(&self) -> String {
        let mut out = String::new();
        for &(i, j) in &self.edges {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str("M ");
            svg::push_point(&mut out, self.sites[i]);
            out.push_str(" L ");
            svg::push_point(&mut out, self.sites[j]);
        }
        out
    }

    /// Live cell whose site is closest to `p`
    pub fn nearest_cell(&self, p: DVec2) -> Option<usize> {
        #[cfg(feature = "spatial-index")]
        {
            self.index.find_nearest(p)
        }
        #[cfg(not(feature = "spatial-index"))]
        {
            self.live_cells().min_by(|&a, &b| {
                self.sites[a]
                    .distance_squared(p)
                    .total_cmp(&self.sites[b].distance_squared(p))
            })
        }
    }

    /// Cell containing `p`, or `None` outside the canvas
    pub fn find_cell_at(&self, p: DVec2) -> Option<usize> {
        if !self.bounds.contains(p) {
            return None;
        }
        self.nearest_cell(p)
    }
}

#[inline]
fn to_dvec(p: Point2<f64>) -> DVec2 {
    DVec2::new(p.x, p.y)
}

/// Whether the Voronoi edge dual to `edge` keeps a positive length inside the canvas
fn dual_edge_visible(
    edge: DirectedEdgeHandle<'_, Point2<f64>, (), (), ()>,
    circumcenters: &Circumcenters,
    bounds: Bounds,
) -> bool {
    let left = edge
        .face()
        .as_inner()
        .and_then(|face| circumcenters.get(&face.fix()));
    let right = edge
        .rev()
        .face()
        .as_inner()
        .and_then(|face| circumcenters.get(&face.fix()));
    let (Some(&a), Some(&b)) = (left, right) else {
        return false;
    };
    clip_segment(a, b, bounds).is_some_and(|(p, q)| p.distance(q) > MIN_SHARED_EDGE)
}

/// Orient counter-clockwise; `None` if nothing with area is left
fn normalize_polygon(mut polygon: Vec<DVec2>) -> Option<Vec<DVec2>> {
    if polygon.len() < 3 {
        return None;
    }
    let area = signed_area(&polygon);
    if area < 0.0 {
        polygon.reverse();
    } else if area == 0.0 {
        return None;
    }
    Some(polygon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::sample_points;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn random_subdivision(count: usize, seed: u64) -> Subdivision {
        let bounds = Bounds::default();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let points = sample_points(count, bounds, 10.0, None, &mut rng).unwrap();
        Subdivision::build(&points, bounds).unwrap()
    }

    fn grid_points() -> Vec<DVec2> {
        let mut points = Vec::new();
        for y in [5.0, 15.0, 25.0] {
            for x in [5.0, 15.0, 25.0] {
                points.push(DVec2::new(x, y));
            }
        }
        points
    }

    #[test]
    fn test_cells_tile_the_canvas() {
        let subdivision = random_subdivision(300, 1);
        let total: f64 = (0..subdivision.len()).map(|i| subdivision.cell_area(i)).sum();
        assert!((total - 1000.0 * 750.0).abs() < 1e-6 * 1000.0 * 750.0);
    }

    #[test]
    fn test_polygons_are_ccw_and_clipped() {
        let subdivision = random_subdivision(200, 2);
        let bounds = subdivision.bounds();
        for i in subdivision.live_cells() {
            let polygon = subdivision.cell_polygon(i).unwrap();
            assert!(polygon.len() >= 3);
            assert!(signed_area(polygon) > 0.0, "cell {} is not counter-clockwise", i);
            for v in polygon {
                assert!(bounds.contains(*v), "vertex {:?} of cell {} escapes", v, i);
            }
        }
    }

    #[test]
    fn test_neighbors_are_symmetric_and_share_vertices() {
        let subdivision = random_subdivision(250, 3);
        for i in subdivision.live_cells() {
            let polygon = subdivision.cell_polygon(i).unwrap();
            for &j in subdivision.neighbors(i) {
                assert_ne!(i, j);
                assert!(subdivision.neighbors(j).contains(&i), "{} -> {} not mirrored", i, j);

                let other = subdivision.cell_polygon(j).unwrap();
                let shared = polygon.iter().filter(|v| other.contains(v)).count();
                assert!(shared >= 2, "cells {} and {} share {} vertices", i, j, shared);
            }
        }
    }

    #[test]
    fn test_grid_center_has_four_neighbors() {
        let subdivision = Subdivision::build(&grid_points(), Bounds::new(30.0, 30.0)).unwrap();
        // Diagonal neighbours only touch at a corner
        assert_eq!(subdivision.neighbors(4), &[1, 3, 5, 7]);
        assert!((subdivision.cell_area(4) - 100.0).abs() < 1e-9);
        assert_eq!(subdivision.border_cells(0.0), vec![0, 1, 2, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_duplicate_sites_have_no_cell() {
        let mut points = grid_points();
        points.push(points[4]);
        let subdivision = Subdivision::build(&points, Bounds::new(30.0, 30.0)).unwrap();

        assert_eq!(subdivision.len(), 10);
        assert!(subdivision.cell_polygon(9).is_none());
        assert!(subdivision.neighbors(9).is_empty());
        assert!(subdivision.render_cell(9).is_none());
        assert!(!subdivision.neighbors(4).contains(&9));
    }

    #[test]
    fn test_rejects_bad_input() {
        let bounds = Bounds::new(30.0, 30.0);
        let too_few = [DVec2::new(1.0, 1.0), DVec2::new(2.0, 2.0)];
        assert!(matches!(
            Subdivision::build(&too_few, bounds),
            Err(MapGenError::InvalidInput(_))
        ));

        let outside = [
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(40.0, 2.0),
        ];
        assert!(Subdivision::build(&outside, bounds).is_err());

        let nan = [
            DVec2::new(1.0, 1.0),
            DVec2::new(2.0, 2.0),
            DVec2::new(f64::NAN, 2.0),
        ];
        assert!(Subdivision::build(&nan, bounds).is_err());
    }

    #[test]
    fn test_find_cell_at() {
        let subdivision = random_subdivision(100, 4);
        for i in subdivision.live_cells() {
            assert_eq!(subdivision.find_cell_at(subdivision.site(i)), Some(i));
        }
        assert_eq!(subdivision.find_cell_at(DVec2::new(-5.0, 10.0)), None);
    }

    #[test]
    fn test_render_paths() {
        let subdivision = random_subdivision(50, 5);
        let cells = subdivision.render_all_cells();
        assert_eq!(cells.len(), 50);
        for path in cells.iter().flatten() {
            assert!(path.starts_with("M "));
            assert!(path.ends_with(" Z"));
        }

        let triangulation = subdivision.render_triangulation();
        assert_eq!(
            svg::loop_count(&triangulation),
            subdivision.triangulation_edges().len()
        );
    }

    #[test]
    fn test_border_cells_touch_margin() {
        let subdivision = random_subdivision(400, 6);
        let border = subdivision.border_cells(10.0);
        assert!(!border.is_empty());
        assert!(border.len() < subdivision.len());
        for i in border {
            let polygon = subdivision.cell_polygon(i).unwrap();
            assert!(polygon
                .iter()
                .any(|v| v.x <= 10.0 || v.x >= 990.0 || v.y <= 10.0 || v.y >= 740.0));
        }
    }
}
