use std::time::Instant;

use glam::DVec2;
use rand::Rng;
use tracing::{debug, info, warn};

use super::{
    stream, ClusterScope, IterationSnapshot, MusclesRequest, PointSource, Progress, ProgressSink,
    STATUS_BORDERS, STATUS_CARVING, STATUS_DISTRICTS, STATUS_FINALIZING, STATUS_WARDS,
    STREAM_DISTRICTS, STREAM_POINTS, STREAM_POIS, STREAM_WARDS,
};
use crate::cell::TerrainCell;
use crate::config::MapConfig;
use crate::error::{MapGenError, Result};
use crate::generation::{kmeans, pick_seeds, sample_subdivision, ClusterOptions, Subdivision};
use crate::map::{CityMap, DistrictGeometry, PoiKind, PointOfInterest, WardGeometry};
use crate::region::{extract_adjacency, outline, supply_lines};
use crate::skeleton::{DistrictId, WardLayout};
use crate::terrain::{classify_cells, IslandClassifier};

/// Names and IDs a ward hands to its districts, in slot-binding order
struct WardIdentity {
    id: String,
    name: String,
    districts: Vec<(DistrictId, String)>,
}

/// Run the full pipeline: island terrain, districts, wards, adjacency,
/// supply lines and points of interest
///
/// Progress arrives in order: `Carving landmass...`, `Forming districts...`
/// followed by one district snapshot per k-means iteration,
/// `Drawing borders...`, `Forming wards...` followed by the ward snapshots,
/// and `Finalizing...`.
///
/// With a `WardLayout::Skeleton`, ward clustering is capacity-bound so every
/// caller ward receives exactly as many districts as it lists, and those
/// districts keep the caller's IDs and names.
///
/// # Errors
///
/// Returns `InvalidInput` for a bad request and `InsufficientLand` when the
/// island has fewer land cells than requested districts.
///
/// # Example
///
/// ```
/// use voronoi_city::{generate_muscles, MapConfigBuilder, MusclesRequest, WardLayout};
///
/// let config = MapConfigBuilder::new().seed(7).build().unwrap();
/// let request = MusclesRequest::new(WardLayout::uniform(2, 2), 800);
/// let city = generate_muscles(&config, &request, &mut |_| {}).unwrap();
///
/// assert_eq!(city.wards.len(), 2);
/// assert_eq!(city.district_count(), 4);
/// ```
pub fn generate_muscles(
    config: &MapConfig,
    request: &MusclesRequest,
    progress: ProgressSink<'_>,
) -> Result<CityMap> {
    request.validate()?;
    let start = Instant::now();
    let num_districts = request.layout.district_count();
    let num_wards = request.layout.ward_count();
    let options = ClusterOptions {
        iterations: config.kmeans_iterations,
    };

    progress(Progress::status(STATUS_CARVING));
    let (subdivision, border) = match &request.points {
        PointSource::Sample {
            num_points,
            density_weighted,
        } => {
            let mut rng = stream(config.seed, STREAM_POINTS);
            let subdivision =
                sample_subdivision(config, *num_points, *density_weighted, &mut rng)?;
            let border = subdivision.border_cells(config.margin);
            (subdivision, border)
        }
        PointSource::Reuse(skeleton) => (
            Subdivision::build(&skeleton.points, config.bounds)?,
            skeleton.border_cell_indices.clone(),
        ),
    };

    let classes = classify_cells(&subdivision, &IslandClassifier::from_config(config), &border);
    let terrain = TerrainCell::collect(&subdivision, &classes);
    let land: Vec<usize> = classes
        .iter()
        .enumerate()
        .filter_map(|(i, class)| match class {
            Some(c) if c.terrain.is_land() => Some(i),
            _ => None,
        })
        .collect();
    if land.len() < num_districts {
        return Err(MapGenError::InsufficientLand {
            land_cells: land.len(),
            districts: num_districts,
        });
    }
    info!(
        cells = subdivision.len(),
        land = land.len(),
        elapsed = ?start.elapsed(),
        "landmass carved"
    );

    progress(Progress::status(STATUS_DISTRICTS));
    let positions: Vec<DVec2> = land.iter().map(|&i| subdivision.site(i)).collect();
    let seeds = pick_seeds(
        &positions,
        num_districts,
        &mut stream(config.seed, STREAM_DISTRICTS),
    )?;
    let districts = kmeans(&positions, seeds, options, None, |iteration, clustering| {
        progress(Progress::Iteration(IterationSnapshot::capture(
            ClusterScope::Districts,
            iteration,
            clustering,
            |m| land[m],
        )));
    })?;

    let mut district_cells: Vec<Vec<usize>> = vec![Vec::new(); num_districts];
    let mut district_of: Vec<Option<usize>> = vec![None; subdivision.len()];
    for (m, &slot) in districts.assignment.iter().enumerate() {
        district_cells[slot].push(land[m]);
        district_of[land[m]] = Some(slot);
    }

    progress(Progress::status(STATUS_BORDERS));
    let mut district_paths: Vec<Option<String>> = district_cells
        .iter()
        .enumerate()
        .map(|(slot, cells)| {
            let path = outline(cells.iter().copied(), &subdivision, config.snap_decimals)
                .map(|o| o.to_svg_path());
            if path.is_none() {
                warn!(slot, "district has no outline");
            }
            path
        })
        .collect();

    progress(Progress::status(STATUS_WARDS));
    let capacities: Option<Vec<usize>> = match &request.layout {
        WardLayout::Skeleton(wards) => Some(wards.iter().map(|w| w.districts.len()).collect()),
        WardLayout::Counts { .. } => None,
    };
    let ward_seeds = pick_seeds(
        &districts.centroids,
        num_wards,
        &mut stream(config.seed, STREAM_WARDS),
    )?;
    let wards = kmeans(
        &districts.centroids,
        ward_seeds,
        options,
        capacities.as_deref(),
        |iteration, clustering| {
            progress(Progress::Iteration(IterationSnapshot::capture(
                ClusterScope::Wards,
                iteration,
                clustering,
                |slot| slot,
            )));
        },
    )?;

    let mut ward_slots: Vec<Vec<usize>> = vec![Vec::new(); num_wards];
    for (slot, &w) in wards.assignment.iter().enumerate() {
        ward_slots[w].push(slot);
    }

    let identities: Vec<WardIdentity> = match &request.layout {
        WardLayout::Skeleton(skeleton) => skeleton
            .iter()
            .map(|w| WardIdentity {
                id: w.id.clone(),
                name: w.name.clone(),
                districts: w.districts.iter().map(|d| (d.id, d.name.clone())).collect(),
            })
            .collect(),
        WardLayout::Counts { .. } => ward_slots
            .iter()
            .enumerate()
            .map(|(w, slots)| WardIdentity {
                id: format!("ward-{}", w),
                name: format!("Ward {}", w + 1),
                districts: slots
                    .iter()
                    .map(|&slot| (DistrictId(slot as u32), format!("District {}", slot)))
                    .collect(),
            })
            .collect(),
    };

    let mut slot_ids = vec![DistrictId(0); num_districts];
    let mut ward_geometry = Vec::with_capacity(num_wards);
    for (w, identity) in identities.into_iter().enumerate() {
        let slots = &ward_slots[w];
        if slots.len() != identity.districts.len() {
            return Err(MapGenError::GenerationFailed(format!(
                "ward '{}' expects {} districts but clustering gave it {}",
                identity.id,
                identity.districts.len(),
                slots.len()
            )));
        }

        let svg_path = outline(
            slots.iter().flat_map(|&s| district_cells[s].iter().copied()),
            &subdivision,
            config.snap_decimals,
        )
        .map(|o| o.to_svg_path());

        let mut members = Vec::with_capacity(slots.len());
        for (&slot, (id, name)) in slots.iter().zip(identity.districts) {
            slot_ids[slot] = id;
            members.push(DistrictGeometry {
                id,
                name,
                svg_path: district_paths[slot].take(),
                centroid: districts.centroids[slot],
                cells: std::mem::take(&mut district_cells[slot]),
            });
        }
        debug!(ward = %identity.id, districts = members.len(), "ward bound");

        ward_geometry.push(WardGeometry {
            id: identity.id,
            name: identity.name,
            svg_path,
            centroid: wards.centroids[w],
            districts: members,
        });
    }

    progress(Progress::status(STATUS_FINALIZING));
    let connections: Vec<(DistrictId, DistrictId)> =
        extract_adjacency(&subdivision, |cell| district_of[cell].map(|s| slot_ids[s]))
            .into_iter()
            .collect();

    let supply_lines: Vec<(String, String)> = supply_lines(&wards.centroids)
        .into_iter()
        .map(|(a, b)| (ward_geometry[a].id.clone(), ward_geometry[b].id.clone()))
        .collect();

    let mut rng = stream(config.seed, STREAM_POIS);
    let mut pois = Vec::new();
    for district in ward_geometry.iter().flat_map(|w| &w.districts) {
        if rng.gen::<f64>() >= config.poi_probability {
            continue;
        }
        let kind = if rng.gen::<f64>() < 0.5 {
            PoiKind::Landmark
        } else {
            PoiKind::ResourceNode
        };
        pois.push(PointOfInterest {
            id: format!("poi-{}", district.id),
            district_id: district.id,
            kind,
            cell: subdivision.find_cell_at(district.centroid),
        });
    }

    info!(
        wards = ward_geometry.len(),
        districts = num_districts,
        connections = connections.len(),
        supply_lines = supply_lines.len(),
        pois = pois.len(),
        elapsed = ?start.elapsed(),
        "city generated"
    );

    Ok(CityMap {
        terrain,
        wards: ward_geometry,
        connections,
        supply_lines,
        pois,
    })
}
