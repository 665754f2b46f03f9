//! Core geometry of map generation
//!
//! Point sampling, the clipped Voronoi/Delaunay subdivision built from the
//! points, and the k-means clusterer that groups cells into regions.

mod geometry;
mod kmeans;
mod points;
mod subdivision;

pub use geometry::signed_area;
pub use kmeans::{kmeans, pick_seeds, ClusterOptions, Clustering};
pub use points::{sample_points, DensityField, DensityFn};
pub use subdivision::Subdivision;

use rand::Rng;

use crate::config::MapConfig;
use crate::error::Result;

/// Sample `count` points for `config`, density-weighted or uniform, and
/// build their subdivision
///
/// The density channel uses `terrain_seed + 2`, matching the biome density
/// field so both describe the same "busy" parts of the map.
pub fn sample_subdivision<R: Rng + ?Sized>(
    config: &MapConfig,
    count: usize,
    density_weighted: bool,
    rng: &mut R,
) -> Result<Subdivision> {
    let points = if density_weighted {
        let field = DensityField::new(
            config.terrain_seed.wrapping_add(2),
            config.terrain.density_scale,
        );
        let density = |nx: f64, ny: f64| field.density(nx, ny);
        sample_points(count, config.bounds, config.margin, Some(&density), rng)?
    } else {
        sample_points(count, config.bounds, config.margin, None, rng)?
    };
    Subdivision::build(&points, config.bounds)
}
