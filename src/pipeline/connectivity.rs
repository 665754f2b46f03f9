use std::time::Instant;

use glam::DVec2;
use rand::Rng;
use tracing::{info, warn};

use super::{
    stream, ClusterScope, ConnectivityRequest, IterationSnapshot, Progress, ProgressSink,
    STATUS_BORDERS, STATUS_DISTRICTS, STATUS_FINALIZING, STATUS_SAMPLING, STREAM_DISTRICTS,
    STREAM_POINTS,
};
use crate::config::MapConfig;
use crate::error::Result;
use crate::generation::{kmeans, sample_subdivision, ClusterOptions};
use crate::map::{ConnectivityMap, DistrictGeometry, WardGeometry};
use crate::region::{extract_adjacency, outline};
use crate::skeleton::DistrictId;

/// Carve the caller's districts out of the whole canvas and report which
/// of them touch
///
/// There is no terrain: every cell belongs to some district. District
/// centroids start at uniformly random positions inside the margin and the
/// k-means clusters run over all cells. Districts are bound to centroids in
/// skeleton order, ward by ward.
///
/// # Errors
///
/// Returns `InvalidInput` for an invalid skeleton or point count.
pub fn generate_connectivity(
    config: &MapConfig,
    request: &ConnectivityRequest,
    progress: ProgressSink<'_>,
) -> Result<ConnectivityMap> {
    request.validate()?;
    let start = Instant::now();
    let num_districts: usize = request.wards.iter().map(|w| w.districts.len()).sum();

    progress(Progress::status(STATUS_SAMPLING));
    let subdivision = sample_subdivision(
        config,
        request.num_points,
        false,
        &mut stream(config.seed, STREAM_POINTS),
    )?;

    progress(Progress::status(STATUS_DISTRICTS));
    let cells: Vec<usize> = subdivision.live_cells().collect();
    let positions: Vec<DVec2> = cells.iter().map(|&i| subdivision.site(i)).collect();

    let mut rng = stream(config.seed, STREAM_DISTRICTS);
    let (min, max) = (
        DVec2::splat(config.margin),
        DVec2::new(
            config.bounds.width - config.margin,
            config.bounds.height - config.margin,
        ),
    );
    let seeds: Vec<DVec2> = (0..num_districts)
        .map(|_| DVec2::new(rng.gen_range(min.x..max.x), rng.gen_range(min.y..max.y)))
        .collect();

    let options = ClusterOptions {
        iterations: config.kmeans_iterations,
    };
    let clustering = kmeans(&positions, seeds, options, None, |iteration, clustering| {
        progress(Progress::Iteration(IterationSnapshot::capture(
            ClusterScope::Districts,
            iteration,
            clustering,
            |m| cells[m],
        )));
    })?;

    let mut district_cells: Vec<Vec<usize>> = vec![Vec::new(); num_districts];
    let mut district_of: Vec<Option<usize>> = vec![None; subdivision.len()];
    for (m, &slot) in clustering.assignment.iter().enumerate() {
        district_cells[slot].push(cells[m]);
        district_of[cells[m]] = Some(slot);
    }

    progress(Progress::status(STATUS_BORDERS));
    let mut slot_ids = Vec::with_capacity(num_districts);
    let mut enriched_wards = Vec::with_capacity(request.wards.len());
    for ward in &request.wards {
        let first = slot_ids.len();
        let mut districts = Vec::with_capacity(ward.districts.len());
        for (offset, district) in ward.districts.iter().enumerate() {
            let slot = first + offset;
            slot_ids.push(district.id);
            let svg_path = outline(
                district_cells[slot].iter().copied(),
                &subdivision,
                config.snap_decimals,
            )
            .map(|o| o.to_svg_path());
            if svg_path.is_none() {
                warn!(district = %district.id, "district has no outline");
            }
            districts.push(DistrictGeometry {
                id: district.id,
                name: district.name.clone(),
                svg_path,
                centroid: clustering.centroids[slot],
                cells: district_cells[slot].clone(),
            });
        }

        let svg_path = outline(
            districts.iter().flat_map(|d| d.cells.iter().copied()),
            &subdivision,
            config.snap_decimals,
        )
        .map(|o| o.to_svg_path());
        let centroid = districts.iter().map(|d| d.centroid).sum::<DVec2>() / districts.len() as f64;

        enriched_wards.push(WardGeometry {
            id: ward.id.clone(),
            name: ward.name.clone(),
            svg_path,
            centroid,
            districts,
        });
    }

    progress(Progress::status(STATUS_FINALIZING));
    let connections: Vec<(DistrictId, DistrictId)> =
        extract_adjacency(&subdivision, |cell| district_of[cell].map(|s| slot_ids[s]))
            .into_iter()
            .collect();

    info!(
        cells = cells.len(),
        districts = num_districts,
        connections = connections.len(),
        elapsed = ?start.elapsed(),
        "connectivity generated"
    );
    Ok(ConnectivityMap {
        enriched_wards,
        connections,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::config::{Bounds, MapConfigBuilder};
    use crate::error::MapGenError;
    use crate::skeleton::WardSkeleton;

    fn wards() -> Vec<WardSkeleton> {
        vec![
            WardSkeleton::new("north", "North")
                .with_district(10, "Harbor")
                .with_district(11, "Market"),
            WardSkeleton::new("south", "South")
                .with_district(20, "Mill")
                .with_district(21, "Chapel")
                .with_district(22, "Yards"),
        ]
    }

    #[test]
    fn test_enriched_wards_keep_caller_order() {
        let config = MapConfigBuilder::new().seed(3).build().unwrap();
        let request = ConnectivityRequest {
            wards: wards(),
            num_points: 1_500,
        };
        let map = generate_connectivity(&config, &request, &mut |_| {}).unwrap();

        let ids: Vec<Vec<u32>> = map
            .enriched_wards
            .iter()
            .map(|w| w.districts.iter().map(|d| d.id.0).collect())
            .collect();
        assert_eq!(ids, vec![vec![10, 11], vec![20, 21, 22]]);
        assert_eq!(map.enriched_wards[1].districts[2].name, "Yards");

        // Every cell is owned by exactly one district
        let mut seen = HashSet::new();
        for ward in &map.enriched_wards {
            for district in &ward.districts {
                for &cell in &district.cells {
                    assert!(seen.insert(cell));
                }
            }
        }
        assert_eq!(seen.len(), 1_500);
    }

    #[test]
    fn test_connections_reference_known_districts() {
        let config = MapConfigBuilder::new().seed(14).build().unwrap();
        let request = ConnectivityRequest {
            wards: wards(),
            num_points: 2_000,
        };
        let map = generate_connectivity(&config, &request, &mut |_| {}).unwrap();

        let known: HashSet<DistrictId> = map
            .enriched_wards
            .iter()
            .flat_map(|w| w.districts.iter().map(|d| d.id))
            .collect();
        assert!(!map.connections.is_empty());
        for &(a, b) in &map.connections {
            assert!(a < b);
            assert!(known.contains(&a) && known.contains(&b));
            assert!(map.is_adjacent(b, a));
        }
        assert!(map.connections.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_small_canvas() {
        let config = MapConfigBuilder::new()
            .seed(5)
            .bounds(1000.0, 750.0)
            .unwrap()
            .margin(10.0)
            .unwrap()
            .build()
            .unwrap();
        let points = 500;
        let request = ConnectivityRequest {
            wards: vec![WardSkeleton::new("w", "W").with_district(1, "Only")],
            num_points: points,
        };
        let map = generate_connectivity(&config, &request, &mut |_| {}).unwrap();
        let only = &map.enriched_wards[0].districts[0];

        assert_eq!(only.cells.len(), points);
        assert!(map.connections.is_empty());
        assert!(Bounds::new(1000.0, 750.0).contains(only.centroid));
    }

    #[test]
    fn test_zero_iterations_still_partition() {
        let built = MapConfigBuilder::new().seed(8).build().unwrap();
        let config = MapConfig {
            kmeans_iterations: 0,
            ..built
        };
        let request = ConnectivityRequest {
            wards: vec![WardSkeleton::new("w", "W")
                .with_district(1, "East")
                .with_district(2, "West")],
            num_points: 300,
        };
        let map = generate_connectivity(&config, &request, &mut |_| {}).unwrap();

        let sizes: Vec<usize> = map.enriched_wards[0]
            .districts
            .iter()
            .map(|d| d.cells.len())
            .collect();
        assert!(sizes.iter().all(|&n| n > 0), "sizes {:?}", sizes);
        assert_eq!(sizes.iter().sum::<usize>(), 300);
        assert!(map.is_adjacent(DistrictId(1), DistrictId(2)));
    }

    #[test]
    fn test_rejects_bad_skeleton() {
        let config = MapConfigBuilder::new().seed(1).build().unwrap();
        let request = ConnectivityRequest::new(vec![WardSkeleton::new("empty", "Empty")]);
        assert!(matches!(
            generate_connectivity(&config, &request, &mut |_| {}),
            Err(MapGenError::InvalidInput(_))
        ));
    }
}
