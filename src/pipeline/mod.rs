//! Generation pipelines
//!
//! Four independently invokable pipelines share one shape: validate the
//! request, sample and subdivide, then classify and/or cluster, reporting
//! progress through a caller-supplied sink as they go.
//!
//! - [`generate_skeleton`]: points, triangulation and raw cells only
//! - [`generate_muscles`]: island terrain, districts, wards, adjacency
//! - [`generate_connectivity`]: the caller's districts over the whole canvas
//! - [`generate_terrain`]: biome terrain only
//!
//! Every pipeline is a pure function of its `MapConfig` and request: the
//! random streams are derived from `config.seed`, the noise channels from
//! `config.terrain_seed`.

mod connectivity;
mod muscles;
mod skeleton;
mod terrain;

pub use connectivity::generate_connectivity;
pub use muscles::generate_muscles;
pub use skeleton::generate_skeleton;
pub use terrain::generate_terrain;

use std::collections::BTreeMap;

use glam::DVec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MapGenError, Result};
use crate::generation::Clustering;
use crate::map::SkeletonData;
use crate::skeleton::{validate_wards, WardLayout, WardSkeleton};

/// Status line before terrain classification
pub const STATUS_CARVING: &str = "Carving landmass...";
/// Status line before district clustering
pub const STATUS_DISTRICTS: &str = "Forming districts...";
/// Status line before district outlines
pub const STATUS_BORDERS: &str = "Drawing borders...";
/// Status line before ward clustering
pub const STATUS_WARDS: &str = "Forming wards...";
/// Status line before adjacency, supply lines and points of interest
pub const STATUS_FINALIZING: &str = "Finalizing...";
/// Status line before point sampling
pub const STATUS_SAMPLING: &str = "Sampling points...";

/// Which clustering pass a snapshot belongs to
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterScope {
    /// Cells into districts
    Districts,
    /// Districts into wards
    Wards,
}

/// State of a clustering pass after one iteration
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct IterationSnapshot {
    pub scope: ClusterScope,
    /// Zero-based iteration within the pass
    pub iteration: usize,
    /// Centroid of every cluster
    pub centroids: Vec<DVec2>,
    /// Member → cluster index; members are cell indices for
    /// `Districts` and district slots for `Wards`
    pub assignment: BTreeMap<usize, usize>,
}

impl IterationSnapshot {
    pub(crate) fn capture<F>(
        scope: ClusterScope,
        iteration: usize,
        clustering: &Clustering,
        member_id: F,
    ) -> Self
    where
        F: Fn(usize) -> usize,
    {
        Self {
            scope,
            iteration,
            centroids: clustering.centroids.clone(),
            assignment: clustering
                .assignment
                .iter()
                .enumerate()
                .map(|(m, &c)| (member_id(m), c))
                .collect(),
        }
    }
}

/// A progress notification, emitted before the final result
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Human-readable phase description
    Status(String),
    /// Clustering snapshot for progressive rendering
    Iteration(IterationSnapshot),
}

impl Progress {
    pub(crate) fn status(message: &str) -> Self {
        Progress::Status(message.to_string())
    }
}

/// Receives progress in emission order
pub type ProgressSink<'a> = &'a mut dyn FnMut(Progress);

/// Independent random stream `k` of a run
///
/// `k` selects a ChaCha stream under the same key, so phases never overlap
/// across neighbouring seeds.
pub(crate) fn stream(seed: u64, k: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(k);
    rng
}

pub(crate) const STREAM_POINTS: u64 = 0;
pub(crate) const STREAM_DISTRICTS: u64 = 1;
pub(crate) const STREAM_WARDS: u64 = 2;
pub(crate) const STREAM_POIS: u64 = 3;

fn check_point_count(num_points: usize) -> Result<()> {
    if num_points < 3 {
        return Err(MapGenError::InvalidInput(format!(
            "need at least 3 points, got {}",
            num_points
        )));
    }
    Ok(())
}

/// Parameters of the skeleton pipeline
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonRequest {
    pub num_points: usize,
    /// Sample against the density field instead of uniformly
    pub density_weighted: bool,
}

impl Default for SkeletonRequest {
    fn default() -> Self {
        Self {
            num_points: 2_000,
            density_weighted: true,
        }
    }
}

impl SkeletonRequest {
    /// # Errors
    ///
    /// Returns `InvalidInput` for fewer than 3 points.
    pub fn validate(&self) -> Result<()> {
        check_point_count(self.num_points)
    }
}

/// Where the full pipeline gets its points from
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum PointSource {
    /// Sample a fresh point set
    Sample {
        num_points: usize,
        density_weighted: bool,
    },
    /// Reuse the points and border list of an earlier skeleton run
    Reuse(SkeletonData),
}

/// Parameters of the full pipeline
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MusclesRequest {
    pub layout: WardLayout,
    pub points: PointSource,
}

impl MusclesRequest {
    /// Sample `num_points` density-weighted points for `layout`
    pub fn new(layout: WardLayout, num_points: usize) -> Self {
        Self {
            layout,
            points: PointSource::Sample {
                num_points,
                density_weighted: true,
            },
        }
    }

    /// Reuse a skeleton's point set for `layout`
    pub fn with_skeleton(layout: WardLayout, skeleton: SkeletonData) -> Self {
        Self {
            layout,
            points: PointSource::Reuse(skeleton),
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid layout, fewer than 3 points, or
    /// a reused border list pointing past the point set.
    pub fn validate(&self) -> Result<()> {
        self.layout.validate()?;
        match &self.points {
            PointSource::Sample { num_points, .. } => check_point_count(*num_points),
            PointSource::Reuse(skeleton) => {
                check_point_count(skeleton.points.len())?;
                if let Some(&bad) = skeleton
                    .border_cell_indices
                    .iter()
                    .find(|&&i| i >= skeleton.points.len())
                {
                    return Err(MapGenError::InvalidInput(format!(
                        "border cell {} is out of range for {} points",
                        bad,
                        skeleton.points.len()
                    )));
                }
                Ok(())
            }
        }
    }
}

/// Parameters of the connectivity pipeline
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityRequest {
    pub wards: Vec<WardSkeleton>,
    pub num_points: usize,
}

impl ConnectivityRequest {
    /// Default cell budget of the connectivity pipeline
    pub const DEFAULT_POINTS: usize = 12_000;

    pub fn new(wards: Vec<WardSkeleton>) -> Self {
        Self {
            wards,
            num_points: Self::DEFAULT_POINTS,
        }
    }

    /// # Errors
    ///
    /// Returns `InvalidInput` for an invalid skeleton, fewer than 3 points,
    /// or more districts than points.
    pub fn validate(&self) -> Result<()> {
        validate_wards(&self.wards)?;
        check_point_count(self.num_points)?;
        let districts: usize = self.wards.iter().map(|w| w.districts.len()).sum();
        if districts > self.num_points {
            return Err(MapGenError::InvalidInput(format!(
                "{} districts cannot be carved from {} cells",
                districts, self.num_points
            )));
        }
        Ok(())
    }
}

/// Parameters of the terrain-only pipeline
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainRequest {
    pub num_points: usize,
}

impl Default for TerrainRequest {
    fn default() -> Self {
        Self { num_points: 4_000 }
    }
}

impl TerrainRequest {
    /// # Errors
    ///
    /// Returns `InvalidInput` for fewer than 3 points.
    pub fn validate(&self) -> Result<()> {
        check_point_count(self.num_points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        assert!(SkeletonRequest::default().validate().is_ok());
        assert!(SkeletonRequest {
            num_points: 2,
            density_weighted: false
        }
        .validate()
        .is_err());

        assert!(MusclesRequest::new(WardLayout::uniform(3, 2), 2_000)
            .validate()
            .is_ok());
        assert!(MusclesRequest::new(WardLayout::uniform(0, 2), 2_000)
            .validate()
            .is_err());

        let skeleton = SkeletonData {
            points: vec![DVec2::ONE, DVec2::X, DVec2::Y],
            delaunay_path: String::new(),
            voronoi_cell_paths: vec![None, None, None],
            border_cell_indices: vec![0, 5],
        };
        let request = MusclesRequest::with_skeleton(WardLayout::uniform(1, 1), skeleton);
        assert!(matches!(request.validate(), Err(MapGenError::InvalidInput(_))));

        let wards = vec![WardSkeleton::new("a", "A").with_district(1, "One")];
        assert!(ConnectivityRequest::new(wards.clone()).validate().is_ok());
        assert!(ConnectivityRequest {
            wards: wards.clone(),
            num_points: 1
        }
        .validate()
        .is_err());
        assert!(ConnectivityRequest::new(vec![]).validate().is_err());
        assert!(TerrainRequest { num_points: 0 }.validate().is_err());
    }

    #[test]
    fn test_snapshot_capture() {
        let clustering = Clustering {
            centroids: vec![DVec2::ZERO, DVec2::ONE],
            assignment: vec![1, 0, 1],
        };
        let snapshot =
            IterationSnapshot::capture(ClusterScope::Districts, 2, &clustering, |m| m * 10);
        assert_eq!(snapshot.iteration, 2);
        assert_eq!(
            snapshot.assignment.into_iter().collect::<Vec<_>>(),
            vec![(0, 1), (10, 0), (20, 1)]
        );
    }

    #[test]
    fn test_streams_are_independent() {
        use rand::Rng;
        let mut a = stream(5, STREAM_POINTS);
        let mut b = stream(5, STREAM_DISTRICTS);
        let mut a2 = stream(5, STREAM_POINTS);
        let x: u64 = a.gen();
        assert_eq!(x, a2.gen::<u64>());
        assert_ne!(x, b.gen::<u64>());
    }

    #[test]
    fn test_neighbouring_seeds_do_not_share_streams() {
        use rand::Rng;
        let mut districts: ChaCha8Rng = stream(5, STREAM_DISTRICTS);
        let mut points: ChaCha8Rng = stream(6, STREAM_POINTS);
        let a: [u64; 4] = districts.gen();
        let b: [u64; 4] = points.gen();
        assert_ne!(a, b);

        let mut pois = stream(4, STREAM_POIS);
        let mut wards = stream(5, STREAM_WARDS);
        assert_ne!(pois.gen::<u64>(), wards.gen::<u64>());
    }
}
