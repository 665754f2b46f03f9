//! Complete workflow demonstration for voronoi_city

use voronoi_city::*;

fn main() -> Result<()> {
    println!("=== voronoi_city Complete Demo ===\n");

    // Step 1: Configure the map
    println!("Step 1: Configuring map...");
    let config = MapConfigBuilder::new()
        .seed(12345)
        .kmeans_iterations(5)?
        .poi_probability(0.3)?
        .build()?;
    println!("  Seed: {}", config.seed);
    println!("  Canvas: {}x{}", config.bounds.width, config.bounds.height);

    // Step 2: Describe the wards
    let wards = vec![
        WardSkeleton::new("docks", "The Docks")
            .with_district(1, "Wharf")
            .with_district(2, "Fishmarket"),
        WardSkeleton::new("old-town", "Old Town")
            .with_district(3, "Cathedral")
            .with_district(4, "Guildhall")
            .with_district(5, "Tanners"),
        WardSkeleton::new("heights", "The Heights")
            .with_district(6, "Manors")
            .with_district(7, "Observatory"),
    ];

    // Step 3: Generate in the background, pacing snapshots for display
    println!("\nStep 2: Generating city...");
    let handle = spawn(GenerationJob::Muscles {
        config,
        request: MusclesRequest::new(WardLayout::Skeleton(wards), 3_000),
    })?;

    let mut animation = AnimationQueue::new(1);
    let mut city = None;
    for message in handle.messages() {
        match message {
            WorkerMessage::Progress(Progress::Status(status)) => println!("  {}", status),
            WorkerMessage::Progress(progress) => animation.push_progress(&progress),
            WorkerMessage::Complete { output, elapsed } => {
                println!("  Done in {:.2?}", elapsed);
                city = output.into_city();
            }
            WorkerMessage::Failed(e) => return Err(e),
        }
    }
    let city = city.ok_or_else(|| MapGenError::WorkerFailed("no city produced".to_string()))?;

    while let Some(frame) = animation.tick() {
        println!(
            "  frame: {:?} iteration {} ({} centroids)",
            frame.scope,
            frame.iteration,
            frame.centroids.len()
        );
    }

    // Step 4: Inspect the result
    println!("\nStep 3: Wards:");
    for ward in &city.wards {
        println!("  {} ({})", ward.name, ward.id);
        for district in &ward.districts {
            println!(
                "    #{} {:12} {:4} cells, centroid ({:.0}, {:.0})",
                district.id,
                district.name,
                district.cells.len(),
                district.centroid.x,
                district.centroid.y
            );
        }
    }

    println!("\nStep 4: Borders:");
    for (a, b) in &city.connections {
        let name = |id| city.district(id).map(|d| d.name.as_str()).unwrap_or("?");
        println!("  {} <-> {}", name(*a), name(*b));
    }

    println!("\nSupply lines:");
    for (a, b) in &city.supply_lines {
        println!("  {} -> {}", a, b);
    }

    println!("\nPoints of interest:");
    for poi in &city.pois {
        println!("  {} {} in district {}", poi.id, poi.kind, poi.district_id);
    }

    println!(
        "\nLand cells: {} of {}",
        city.land_cell_count(),
        city.terrain.len()
    );
    println!("\n=== Demo Complete ===");
    Ok(())
}
