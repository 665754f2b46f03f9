use std::time::Instant;

use tracing::info;

use super::{
    stream, Progress, ProgressSink, TerrainRequest, STATUS_CARVING, STATUS_SAMPLING, STREAM_POINTS,
};
use crate::cell::TerrainCell;
use crate::config::MapConfig;
use crate::error::Result;
use crate::generation::sample_subdivision;
use crate::map::TerrainMap;
use crate::terrain::{classify_cells, BiomeClassifier};

/// Sample uniform cells and classify them into city biomes
///
/// Cells touching the margin are forced to ocean. No districts or wards are
/// formed.
///
/// # Errors
///
/// Returns `InvalidInput` for fewer than 3 points.
pub fn generate_terrain(
    config: &MapConfig,
    request: &TerrainRequest,
    progress: ProgressSink<'_>,
) -> Result<TerrainMap> {
    request.validate()?;
    let start = Instant::now();

    progress(Progress::status(STATUS_SAMPLING));
    let mut rng = stream(config.seed, STREAM_POINTS);
    let subdivision = sample_subdivision(config, request.num_points, false, &mut rng)?;

    progress(Progress::status(STATUS_CARVING));
    let border = subdivision.border_cells(config.margin);
    let classes = classify_cells(&subdivision, &BiomeClassifier::from_config(config), &border);
    let cells = TerrainCell::collect(&subdivision, &classes);

    info!(
        cells = cells.len(),
        land = cells.iter().filter(|c| c.is_land()).count(),
        elapsed = ?start.elapsed(),
        "terrain generated"
    );
    Ok(TerrainMap { cells })
}
