use std::time::Instant;

use tracing::info;

use super::{stream, Progress, ProgressSink, SkeletonRequest, STATUS_SAMPLING, STREAM_POINTS};
use crate::config::MapConfig;
use crate::error::Result;
use crate::generation::sample_subdivision;
use crate::map::SkeletonData;

/// Sample points and build the raw subdivision, without terrain or regions
///
/// The returned point set and border list can be passed back through
/// `PointSource::Reuse` so the full pipeline runs on the same cells.
///
/// # Errors
///
/// Returns `InvalidInput` for fewer than 3 points.
pub fn generate_skeleton(
    config: &MapConfig,
    request: &SkeletonRequest,
    progress: ProgressSink<'_>,
) -> Result<SkeletonData> {
    request.validate()?;
    let start = Instant::now();

    progress(Progress::status(STATUS_SAMPLING));
    let mut rng = stream(config.seed, STREAM_POINTS);
    let subdivision = sample_subdivision(
        config,
        request.num_points,
        request.density_weighted,
        &mut rng,
    )?;

    let data = SkeletonData {
        points: subdivision.sites().to_vec(),
        delaunay_path: subdivision.render_triangulation(),
        voronoi_cell_paths: subdivision.render_all_cells(),
        border_cell_indices: subdivision.border_cells(config.margin),
    };

    info!(
        points = data.points.len(),
        border = data.border_cell_indices.len(),
        elapsed = ?start.elapsed(),
        "skeleton generated"
    );
    Ok(data)
}
