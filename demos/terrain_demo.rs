//! Demonstration of the terrain classifiers

use std::collections::BTreeMap;

use voronoi_city::*;

fn main() -> Result<()> {
    println!("Terrain System Demo\n");

    let config = MapConfigBuilder::new().seed(42).build()?;

    println!("Island elevation along the horizontal midline:");
    println!("{:-<60}", "");
    let island = IslandClassifier::from_config(&config);
    let y = config.bounds.height / 2.0;
    for x in (0..=10).map(|i| i as f64 * config.bounds.width / 10.0) {
        let class = island.classify(DVec2::new(x, y));
        println!(
            "x = {:6.1} -> {:5.2} {:?}",
            x, class.elevation, class.terrain
        );
    }

    println!("\n{:-<60}", "");
    println!("Counting biomes over a generated map:");
    println!("{:-<60}", "");
    let map = generate_terrain(&config, &TerrainRequest { num_points: 4_000 }, &mut |_| {})?;

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for cell in &map.cells {
        *counts.entry(cell.biome.as_str()).or_insert(0) += 1;
    }
    for (biome, count) in counts {
        let percentage = count as f64 / map.cells.len() as f64 * 100.0;
        println!("{:14} : {:4} cells ({:5.1}%)", biome, count, percentage);
    }

    println!("\n{:-<60}", "");
    Ok(())
}
