//! Sample one skeleton, then carve several cities from the same cells

use voronoi_city::*;

fn main() -> Result<()> {
    println!("Skeleton Demo\n");

    let config = MapConfigBuilder::new().seed(7).build()?;
    let skeleton = generate_skeleton(
        &config,
        &SkeletonRequest {
            num_points: 2_000,
            density_weighted: true,
        },
        &mut |_| {},
    )?;

    let cells = skeleton.voronoi_cell_paths.iter().flatten().count();
    println!("Points:        {}", skeleton.points.len());
    println!("Cells:         {}", cells);
    println!("Border cells:  {}", skeleton.border_cell_indices.len());
    println!("Delaunay path: {} bytes", skeleton.delaunay_path.len());

    println!("\n{:-<60}", "");
    for attempt in 0..3u64 {
        // Same cells, different coastline
        let attempt_config = MapConfig {
            terrain_seed: config.terrain_seed.wrapping_add(attempt * 101),
            ..config
        };
        let request = MusclesRequest::with_skeleton(WardLayout::uniform(4, 3), skeleton.clone());
        match generate_muscles(&attempt_config, &request, &mut |_| {}) {
            Ok(city) => println!(
                "Attempt {}: {} land cells, {} borders, {} supply lines",
                attempt,
                city.land_cell_count(),
                city.connections.len(),
                city.supply_lines.len()
            ),
            Err(e) => println!("Attempt {}: {}", attempt, e),
        }
    }
    Ok(())
}
