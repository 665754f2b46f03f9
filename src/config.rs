//! City Map Configuration and Builder
//!
//! This module provides configuration types for deterministic city map generation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::DVec2;

use crate::error::{MapGenError, Result};

/// Canvas rectangle `[0, 0, width, height]` every generated cell is clipped to
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Canvas width in map units
    pub width: f64,
    /// Canvas height in map units
    pub height: f64,
}

impl Bounds {
    /// Create bounds of the given size
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Center of the canvas
    #[inline]
    pub fn center(&self) -> DVec2 {
        DVec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Distance from the center to a corner
    #[inline]
    pub fn half_diagonal(&self) -> f64 {
        self.center().length()
    }

    /// Whether `p` lies inside the closed rectangle
    #[inline]
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Map a canvas position into `[0, 1]²`
    #[inline]
    pub fn normalize(&self, p: DVec2) -> DVec2 {
        DVec2::new(p.x / self.width, p.y / self.height)
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 750.0,
        }
    }
}

/// Tunable constants of the island terrain classifier
///
/// The defaults reproduce the reference look: one central island with
/// irregular bays, roughly half of the canvas above water.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSettings {
    /// Frequency of the elevation noise over normalized coordinates
    pub noise_scale: f64,
    /// Frequency of the low-frequency coastline distortion noise
    pub shape_scale: f64,
    /// z-offset of the distortion channel
    pub shape_offset: f64,
    /// Maximum relative warp of the radial distance (0.25 = ±25%)
    pub coast_distortion: f64,
    /// Exponent of the radial falloff `1 - (d / max_d)^p`
    pub falloff_power: f64,
    /// Elevation above which a cell is land
    pub land_threshold: f64,
    /// Frequency of the density noise used by weighted point sampling
    pub density_scale: f64,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            noise_scale: 2.5,
            shape_scale: 0.8,
            shape_offset: 0.5,
            coast_distortion: 0.25,
            falloff_power: 2.0,
            land_threshold: 0.25,
            density_scale: 3.0,
        }
    }
}

/// Configuration for deterministic city map generation
///
/// The same configuration with the same request always produces the identical
/// map, so a stored seed is enough to regenerate geometry on load.
///
/// # Example
///
/// ```rust
/// use voronoi_city::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(42)
///     .build()
///     .unwrap();
///
/// # #[cfg(feature = "serde")]
/// # {
/// let json = serde_json::to_string(&config).unwrap();
/// let restored: MapConfig = serde_json::from_str(&json).unwrap();
/// assert_eq!(config.seed, restored.seed);
/// # }
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapConfig {
    /// Seed for point placement, k-means seeding and points of interest
    pub seed: u64,

    /// Seed for the terrain noise channels (separate from placement)
    ///
    /// This allows the same cell layout with a different coastline.
    pub terrain_seed: u64,

    /// Canvas the map is generated on
    pub bounds: Bounds,

    /// Inset from the canvas edge; points are sampled inside it and cells
    /// touching it are forced to water
    pub margin: f64,

    /// Fixed number of k-means iterations for both clustering passes
    pub kmeans_iterations: usize,

    /// Probability that a district receives a point of interest
    pub poi_probability: f64,

    /// Decimal places kept when matching outline edge endpoints
    pub snap_decimals: u32,

    /// Island classifier constants
    pub terrain: TerrainSettings,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfigBuilder::new()
            .build()
            .expect("default map configuration is valid")
    }
}

/// Builder for creating MapConfig with validation
///
/// # Example
///
/// ```rust
/// use voronoi_city::*;
///
/// let config = MapConfigBuilder::new()
///     .seed(12345)
///     .bounds(800.0, 600.0)
///     .unwrap()
///     .kmeans_iterations(3)
///     .unwrap()
///     .terrain_seed(67890)
///     .build()
///     .unwrap();
/// assert_eq!(config.bounds.width, 800.0);
/// ```
#[derive(Debug, Clone)]
pub struct MapConfigBuilder {
    seed: Option<u64>,
    terrain_seed: Option<u64>,
    bounds: Bounds,
    margin: f64,
    kmeans_iterations: usize,
    poi_probability: f64,
    snap_decimals: u32,
    terrain: TerrainSettings,
}

impl MapConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - seed: Random
    /// - terrain_seed: Same as seed
    /// - bounds: 1000 × 750
    /// - margin: 10
    /// - kmeans_iterations: 5
    /// - poi_probability: 0.1
    /// - snap_decimals: 5
    pub fn new() -> Self {
        Self {
            seed: None,
            terrain_seed: None,
            bounds: Bounds::default(),
            margin: 10.0,
            kmeans_iterations: 5,
            poi_probability: 0.1,
            snap_decimals: 5,
            terrain: TerrainSettings::default(),
        }
    }

    /// Set the random seed for map generation
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set a separate terrain seed
    pub fn terrain_seed(mut self, seed: u64) -> Self {
        self.terrain_seed = Some(seed);
        self
    }

    /// Set the canvas size
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if either dimension is not a positive finite number
    pub fn bounds(mut self, width: f64, height: f64) -> Result<Self> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(MapGenError::InvalidConfig(format!(
                "Canvas must be positive (got {}x{})",
                width, height
            )));
        }
        self.bounds = Bounds::new(width, height);
        Ok(self)
    }

    /// Set the border margin
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the margin is negative
    pub fn margin(mut self, margin: f64) -> Result<Self> {
        if !(margin.is_finite() && margin >= 0.0) {
            return Err(MapGenError::InvalidConfig(format!(
                "Margin must be >= 0 (got {})",
                margin
            )));
        }
        self.margin = margin;
        Ok(self)
    }

    /// Set the number of k-means iterations
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if iterations is 0 or > 20
    pub fn kmeans_iterations(mut self, iterations: usize) -> Result<Self> {
        if iterations == 0 || iterations > 20 {
            return Err(MapGenError::InvalidConfig(format!(
                "k-means iterations must be in 1..=20 (got {})",
                iterations
            )));
        }
        self.kmeans_iterations = iterations;
        Ok(self)
    }

    /// Set the per-district point of interest probability
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if probability is outside `[0, 1]`
    pub fn poi_probability(mut self, probability: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&probability) {
            return Err(MapGenError::InvalidConfig(format!(
                "POI probability must be in [0, 1] (got {})",
                probability
            )));
        }
        self.poi_probability = probability;
        Ok(self)
    }

    /// Set the outline snapping precision in decimal places
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if decimals is outside `1..=9`
    pub fn snap_decimals(mut self, decimals: u32) -> Result<Self> {
        if !(1..=9).contains(&decimals) {
            return Err(MapGenError::InvalidConfig(format!(
                "Snap precision must be in 1..=9 decimals (got {})",
                decimals
            )));
        }
        self.snap_decimals = decimals;
        Ok(self)
    }

    /// Override the island classifier constants
    pub fn terrain(mut self, terrain: TerrainSettings) -> Self {
        self.terrain = terrain;
        self
    }

    /// Build the configuration
    ///
    /// If no seed was provided, generates a random seed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the margin leaves no room to sample points
    pub fn build(self) -> Result<MapConfig> {
        if self.margin * 2.0 >= self.bounds.width.min(self.bounds.height) {
            return Err(MapGenError::InvalidConfig(format!(
                "Margin {} leaves no interior on a {}x{} canvas",
                self.margin, self.bounds.width, self.bounds.height
            )));
        }

        let seed = self.seed.unwrap_or_else(rand::random);
        let terrain_seed = self.terrain_seed.unwrap_or(seed);

        Ok(MapConfig {
            seed,
            terrain_seed,
            bounds: self.bounds,
            margin: self.margin,
            kmeans_iterations: self.kmeans_iterations,
            poi_probability: self.poi_probability,
            snap_decimals: self.snap_decimals,
            terrain: self.terrain,
        })
    }
}

impl Default for MapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
