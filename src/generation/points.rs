//! Point sampling inside the canvas
//!
//! Uniform sampling, or rejection sampling against a density function so that
//! some parts of the map get smaller (more detailed) cells than others.

use glam::DVec2;
use rand::Rng;
use tracing::debug;

use crate::config::Bounds;
use crate::error::{MapGenError, Result};
use crate::terrain::NoiseField;

/// Give up on rejection sampling after this many candidates per requested point
const MAX_ATTEMPTS_PER_POINT: usize = 10_000;

/// Density in `[0, 1]` over normalized canvas coordinates
pub type DensityFn<'a> = &'a dyn Fn(f64, f64) -> f64;

/// Sample `count` points in `[margin, w - margin] × [margin, h - margin]`
///
/// With a density function each uniform candidate is accepted with
/// probability `density(x / w, y / h)`.
///
/// # Errors
///
/// Returns `InvalidInput` if the margin leaves no interior, and
/// `GenerationFailed` if the density function rejects (nearly) everything.
///
/// # Example
///
/// ```rust
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use voronoi_city::{generation::sample_points, Bounds};
///
/// let mut rng = ChaCha8Rng::seed_from_u64(1);
/// let points = sample_points(100, Bounds::default(), 10.0, None, &mut rng).unwrap();
/// assert_eq!(points.len(), 100);
/// ```
pub fn sample_points<R: Rng + ?Sized>(
    count: usize,
    bounds: Bounds,
    margin: f64,
    density: Option<DensityFn<'_>>,
    rng: &mut R,
) -> Result<Vec<DVec2>> {
    let min = DVec2::splat(margin);
    let max = DVec2::new(bounds.width - margin, bounds.height - margin);
    if max.x <= min.x || max.y <= min.y {
        return Err(MapGenError::InvalidInput(format!(
            "margin {} leaves no room on a {}x{} canvas",
            margin, bounds.width, bounds.height
        )));
    }

    let mut points = Vec::with_capacity(count);
    let Some(density) = density else {
        for _ in 0..count {
            points.push(uniform_point(min, max, rng));
        }
        return Ok(points);
    };

    let max_attempts = count.saturating_mul(MAX_ATTEMPTS_PER_POINT);
    let mut attempts = 0usize;
    while points.len() < count {
        if attempts >= max_attempts {
            return Err(MapGenError::GenerationFailed(format!(
                "density sampling accepted only {} of {} points after {} candidates",
                points.len(),
                count,
                attempts
            )));
        }
        attempts += 1;

        let candidate = uniform_point(min, max, rng);
        let normalized = bounds.normalize(candidate);
        let acceptance = density(normalized.x, normalized.y).clamp(0.0, 1.0);
        if rng.gen::<f64>() < acceptance {
            points.push(candidate);
        }
    }

    debug!(
        count,
        attempts,
        acceptance_rate = count as f64 / attempts.max(1) as f64,
        "density sampling finished"
    );
    Ok(points)
}

#[inline]
fn uniform_point<R: Rng + ?Sized>(min: DVec2, max: DVec2, rng: &mut R) -> DVec2 {
    DVec2::new(rng.gen_range(min.x..max.x), rng.gen_range(min.y..max.y))
}

/// Perlin-based sampling density
///
/// `f(nx, ny) = (noise(nx * scale, ny * scale, 0) + 1) / 2`
#[derive(Debug, Clone)]
pub struct DensityField {
    noise: NoiseField,
    scale: f64,
}

impl DensityField {
    /// Create a density field from its own noise seed
    pub fn new(seed: u64, scale: f64) -> Self {
        Self {
            noise: NoiseField::new(seed),
            scale,
        }
    }

    /// Density at normalized coordinates, in `[0, 1]`
    #[inline]
    pub fn density(&self, nx: f64, ny: f64) -> f64 {
        self.noise.sample01(nx * self.scale, ny * self.scale, 0.0)
    }
}
