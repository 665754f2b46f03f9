//! Terrain sampling and classification
//!
//! Labels every cell of a subdivision as water or land. The island classifier
//! shapes one central landmass with an irregular coast; the biome classifier
//! is the simpler terrain-only variant that also assigns city biomes.

mod perlin;

pub use perlin::NoiseField;

use glam::DVec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::{Bounds, MapConfig, TerrainSettings};
use crate::generation::Subdivision;

/// Coarse terrain of a cell
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TerrainType {
    /// Ocean, including the forced border ring
    #[default]
    Water,
    /// Anything above the land threshold
    Land,
}

impl TerrainType {
    /// Check if this terrain is water
    pub fn is_water(&self) -> bool {
        matches!(self, TerrainType::Water)
    }

    /// Check if this terrain is land
    pub fn is_land(&self) -> bool {
        !self.is_water()
    }
}

/// Display category of a cell
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Biome {
    #[default]
    Ocean,
    /// Undifferentiated land of the island classifier
    Grassland,
    Docks,
    Industrial,
    Slums,
    Residential,
    Entertainment,
    Financial,
    Government,
}

impl Biome {
    /// Upper-case label used by renderers
    pub fn as_str(&self) -> &'static str {
        match self {
            Biome::Ocean => "OCEAN",
            Biome::Grassland => "GRASSLAND",
            Biome::Docks => "DOCKS",
            Biome::Industrial => "INDUSTRIAL",
            Biome::Slums => "SLUMS",
            Biome::Residential => "RESIDENTIAL",
            Biome::Entertainment => "ENTERTAINMENT",
            Biome::Financial => "FINANCIAL",
            Biome::Government => "GOVERNMENT",
        }
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one cell
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub terrain: TerrainType,
    pub biome: Biome,
    /// Elevation the decision was based on; `0.0` for forced border water
    pub elevation: f64,
}

impl Classification {
    /// Water that no noise value can turn into land
    pub const BORDER: Classification = Classification {
        terrain: TerrainType::Water,
        biome: Biome::Ocean,
        elevation: 0.0,
    };
}

/// Trait for classifying cells from their site position
pub trait CellClassifier {
    /// Classify the cell whose site is at `site`
    fn classify(&self, site: DVec2) -> Classification;

    /// Second pass over land cells once every cell's terrain is known
    ///
    /// `touches_water` is true if any neighbouring cell is water.
    fn refine(&self, site: DVec2, class: Classification, touches_water: bool) -> Classification {
        let _ = (site, touches_water);
        class
    }
}

/// Classify every cell of `subdivision`
///
/// Cells listed in `border` are forced to water regardless of noise. Missing
/// cells map to `None`. Deterministic for a fixed classifier and point set.
pub fn classify_cells<C: CellClassifier + ?Sized>(
    subdivision: &Subdivision,
    classifier: &C,
    border: &[usize],
) -> Vec<Option<Classification>> {
    let mut is_border = vec![false; subdivision.len()];
    for &i in border {
        if let Some(flag) = is_border.get_mut(i) {
            *flag = true;
        }
    }

    let mut classes: Vec<Option<Classification>> = (0..subdivision.len())
        .map(|i| {
            subdivision.cell_polygon(i)?;
            Some(if is_border[i] {
                Classification::BORDER
            } else {
                classifier.classify(subdivision.site(i))
            })
        })
        .collect();

    let refined: Vec<(usize, Classification)> = classes
        .iter()
        .enumerate()
        .filter_map(|(i, class)| {
            let class = (*class)?;
            if !class.terrain.is_land() {
                return None;
            }
            let touches_water = subdivision.neighbors(i).iter().any(|&j| {
                classes[j].is_some_and(|other| other.terrain.is_water())
            });
            Some((i, classifier.refine(subdivision.site(i), class, touches_water)))
        })
        .collect();
    for (i, class) in refined {
        classes[i] = Some(class);
    }

    classes
}

/// One central island with a noise-distorted coastline
///
/// Elevation is gradient noise multiplied by a radial falloff whose distance
/// is warped by a second, low-frequency noise channel.
#[derive(Debug, Clone)]
pub struct IslandClassifier {
    bounds: Bounds,
    settings: TerrainSettings,
    elevation: NoiseField,
    shape: NoiseField,
}

impl IslandClassifier {
    /// Elevation from `seed`, coastline shape from `seed + 1`
    pub fn new(seed: u64, bounds: Bounds, settings: TerrainSettings) -> Self {
        Self {
            bounds,
            settings,
            elevation: NoiseField::new(seed),
            shape: NoiseField::new(seed.wrapping_add(1)),
        }
    }

    /// Classifier for `config.terrain_seed`
    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(config.terrain_seed, config.bounds, config.terrain)
    }

    /// Falloff-scaled elevation in `[0, 1]`
    pub fn elevation(&self, site: DVec2) -> f64 {
        let s = &self.settings;
        let n = self.bounds.normalize(site);

        let e = self
            .elevation
            .sample01(n.x * s.noise_scale, n.y * s.noise_scale, 0.0);
        let warp = self
            .shape
            .sample(n.x * s.shape_scale, n.y * s.shape_scale, s.shape_offset);

        let distance = site.distance(self.bounds.center()) * (1.0 + s.coast_distortion * warp);
        let falloff = (1.0 - (distance / self.bounds.half_diagonal()).powf(s.falloff_power)).max(0.0);
        e * falloff
    }
}

impl CellClassifier for IslandClassifier {
    fn classify(&self, site: DVec2) -> Classification {
        let elevation = self.elevation(site);
        if elevation > self.settings.land_threshold {
            Classification {
                terrain: TerrainType::Land,
                biome: Biome::Grassland,
                elevation,
            }
        } else {
            Classification {
                terrain: TerrainType::Water,
                biome: Biome::Ocean,
                elevation,
            }
        }
    }
}

const BIOME_WATER_LEVEL: f64 = 0.25;
const BIOME_GOVERNMENT_ABOVE: f64 = 0.6;
const BIOME_DOCKS_BELOW: f64 = 0.30;

/// Terrain plus city biomes from elevation bands and a density channel
///
/// `elevation = 0.5 + 0.4 * noise(x/100, y/100) - (d / max_d)^1.5`, with
/// `max_d` measured from the center to the margin corner.
#[derive(Debug, Clone)]
pub struct BiomeClassifier {
    bounds: Bounds,
    max_distance: f64,
    elevation: NoiseField,
    density: NoiseField,
}

impl BiomeClassifier {
    /// Elevation from `seed`, density from `seed + 2`
    pub fn new(seed: u64, bounds: Bounds, margin: f64) -> Self {
        let center = bounds.center();
        Self {
            bounds,
            max_distance: (center - DVec2::splat(margin)).length(),
            elevation: NoiseField::new(seed),
            density: NoiseField::new(seed.wrapping_add(2)),
        }
    }

    /// Classifier for `config.terrain_seed`
    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(config.terrain_seed, config.bounds, config.margin)
    }

    pub fn elevation(&self, site: DVec2) -> f64 {
        let falloff = (site.distance(self.bounds.center()) / self.max_distance).powf(1.5);
        0.5 + self.elevation.sample01(site.x / 100.0, site.y / 100.0, 0.0) * 0.4 - falloff
    }

    fn density_biome(&self, site: DVec2) -> Biome {
        let density = self.density.sample01(site.x / 50.0, site.y / 50.0, 0.0);
        if density > 0.75 {
            Biome::Financial
        } else if density > 0.6 {
            Biome::Entertainment
        } else if density < 0.3 {
            Biome::Slums
        } else if density < 0.5 {
            Biome::Industrial
        } else {
            Biome::Residential
        }
    }
}

impl CellClassifier for BiomeClassifier {
    fn classify(&self, site: DVec2) -> Classification {
        let elevation = self.elevation(site);
        if elevation < BIOME_WATER_LEVEL {
            return Classification {
                terrain: TerrainType::Water,
                biome: Biome::Ocean,
                elevation,
            };
        }

        let biome = if elevation > BIOME_GOVERNMENT_ABOVE {
            Biome::Government
        } else if elevation < BIOME_DOCKS_BELOW {
            Biome::Docks
        } else {
            self.density_biome(site)
        };
        Classification {
            terrain: TerrainType::Land,
            biome,
            elevation,
        }
    }

    // Low land only becomes docks on the waterfront
    fn refine(&self, site: DVec2, class: Classification, touches_water: bool) -> Classification {
        if class.biome == Biome::Docks && !touches_water {
            Classification {
                biome: self.density_biome(site),
                ..class
            }
        } else {
            class
        }
    }
}
