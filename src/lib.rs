//! Voronoi-based city map generation
//!
//! Turns an abstract ward/district skeleton into a renderable polygonal city
//! map: sample points, build a clipped Voronoi subdivision, carve an island
//! with gradient noise, cluster land cells into districts and districts into
//! wards, then stitch region outlines and extract the adjacency graph.
//!
//! # Quick Start
//!
//! ```rust
//! use voronoi_city::*;
//!
//! let config = MapConfigBuilder::new()
//!     .seed(42)
//!     .kmeans_iterations(5).unwrap()
//!     .build().unwrap();
//!
//! // Three wards of two districts each, IDs 1..=6
//! let request = MusclesRequest::new(WardLayout::uniform(3, 2), 1_000);
//! let city = generate_muscles(&config, &request, &mut |progress| {
//!     if let Progress::Status(message) = progress {
//!         println!("{}", message);
//!     }
//! }).unwrap();
//!
//! for ward in &city.wards {
//!     println!("{}: {} districts", ward.name, ward.districts.len());
//! }
//! println!("{} district borders", city.connections.len());
//! ```
//!
//! Generation can also run in the background with [`spawn`], which streams
//! the same progress over a channel.
//!
//! # Features
//!
//! - `spatial-index` (default): O(log n) point-to-cell lookups using a KD-tree
//! - `serde`: Serialization support for configuration, requests and results

// Modules
pub mod error;
pub mod config;
pub mod cell;
pub mod generation;
pub mod terrain;
pub mod region;
pub mod skeleton;
pub mod map;
pub mod pipeline;
pub mod worker;
pub mod svg;

#[cfg(feature = "spatial-index")]
pub mod spatial;

// Re-export core types for convenience
pub use error::{MapGenError, Result};
pub use config::{Bounds, MapConfig, MapConfigBuilder, TerrainSettings};
pub use cell::TerrainCell;
pub use terrain::{
    classify_cells, Biome, BiomeClassifier, CellClassifier, Classification, IslandClassifier,
    NoiseField, TerrainType,
};
pub use skeleton::{DistrictId, DistrictSkeleton, WardLayout, WardSkeleton};
pub use map::{
    CityMap, ConnectivityMap, DistrictGeometry, PoiKind, PointOfInterest, SkeletonData,
    TerrainMap, WardGeometry,
};
pub use pipeline::{
    generate_connectivity, generate_muscles, generate_skeleton, generate_terrain, ClusterScope,
    ConnectivityRequest, IterationSnapshot, MusclesRequest, PointSource, Progress, ProgressSink,
    SkeletonRequest, TerrainRequest,
};
pub use worker::{spawn, AnimationQueue, GenerationHandle, GenerationJob, GenerationOutput, WorkerMessage};

#[cfg(feature = "spatial-index")]
pub use spatial::SpatialIndex;

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
