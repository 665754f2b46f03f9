//! Seeded gradient noise
//!
//! Ken Perlin's improved noise with a permutation table shuffled from a seed,
//! so every `NoiseField` is a pure function of `(x, y, z, seed)`. Independent
//! channels (elevation, coastline shape, density) are separate instances
//! created from offset seeds.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A reproducible 3D gradient noise function
///
/// # Example
///
/// ```
/// use voronoi_city::NoiseField;
///
/// let a = NoiseField::new(7);
/// let b = NoiseField::new(7);
/// assert_eq!(a.sample(0.3, 1.7, 0.0), b.sample(0.3, 1.7, 0.0));
/// ```
#[derive(Clone)]
pub struct NoiseField {
    seed: u64,
    perm: [u8; 512],
}

impl std::fmt::Debug for NoiseField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoiseField").field("seed", &self.seed).finish()
    }
}

impl NoiseField {
    /// Build the permutation table for `seed`
    pub fn new(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut rng);

        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = table[i & 255];
        }
        Self { seed, perm }
    }

    /// Seed this field was built from
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Sample the field; the result is in `[-1, 1]`
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let xf = x.floor();
        let yf = y.floor();
        let zf = z.floor();
        let xi = (xf as i64 & 255) as usize;
        let yi = (yf as i64 & 255) as usize;
        let zi = (zf as i64 & 255) as usize;

        let x = x - xf;
        let y = y - yf;
        let z = z - zf;

        let u = fade(x);
        let v = fade(y);
        let w = fade(z);

        let p = &self.perm;
        let a = p[xi] as usize + yi;
        let aa = p[a] as usize + zi;
        let ab = p[a + 1] as usize + zi;
        let b = p[xi + 1] as usize + yi;
        let ba = p[b] as usize + zi;
        let bb = p[b + 1] as usize + zi;

        let value = lerp(
            w,
            lerp(
                v,
                lerp(u, grad(p[aa], x, y, z), grad(p[ba], x - 1.0, y, z)),
                lerp(u, grad(p[ab], x, y - 1.0, z), grad(p[bb], x - 1.0, y - 1.0, z)),
            ),
            lerp(
                v,
                lerp(
                    u,
                    grad(p[aa + 1], x, y, z - 1.0),
                    grad(p[ba + 1], x - 1.0, y, z - 1.0),
                ),
                lerp(
                    u,
                    grad(p[ab + 1], x, y - 1.0, z - 1.0),
                    grad(p[bb + 1], x - 1.0, y - 1.0, z - 1.0),
                ),
            ),
        );

        value.clamp(-1.0, 1.0)
    }

    /// Sample the field remapped to `[0, 1]`
    #[inline]
    pub fn sample01(&self, x: f64, y: f64, z: f64) -> f64 {
        (self.sample(x, y, z) + 1.0) / 2.0
    }

    /// Fractal Brownian motion over `octaves` layers, normalized to `[-1, 1]`
    pub fn fbm(
        &self,
        x: f64,
        y: f64,
        z: f64,
        octaves: usize,
        persistence: f64,
        lacunarity: f64,
    ) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves.max(1) {
            total += self.sample(x * frequency, y * frequency, z * frequency) * amplitude;
            max_value += amplitude;
            amplitude *= persistence;
            frequency *= lacunarity;
        }

        total / max_value
    }
}

/// Quintic smoothstep: 6t⁵ - 15t⁴ + 10t³
#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product with one of the 12 cube-edge gradients
#[inline]
fn grad(hash: u8, x: f64, y: f64, z: f64) -> f64 {
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    (if h & 1 == 0 { u } else { -u }) + (if h & 2 == 0 { v } else { -v })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let a = NoiseField::new(42);
        let b = NoiseField::new(42);
        for i in 0..100 {
            let x = i as f64 * 0.137;
            let y = i as f64 * 0.291;
            assert_eq!(a.sample(x, y, 0.5).to_bits(), b.sample(x, y, 0.5).to_bits());
        }
    }

    #[test]
    fn test_range() {
        let noise = NoiseField::new(12345);
        for i in 0..2_000 {
            let x = (i % 50) as f64 * 0.173 - 3.0;
            let y = (i / 50) as f64 * 0.219 - 2.0;
            let value = noise.sample(x, y, 0.25);
            assert!((-1.0..=1.0).contains(&value), "value {} out of range", value);
            let value01 = noise.sample01(x, y, 0.25);
            assert!((0.0..=1.0).contains(&value01));
        }
    }

    #[test]
    fn test_zero_at_lattice_points() {
        // Gradient noise vanishes on integer lattice points
        let noise = NoiseField::new(3);
        assert_eq!(noise.sample(2.0, 5.0, 0.0), 0.0);
        assert_eq!(noise.sample(-1.0, 0.0, 3.0), 0.0);
    }

    #[test]
    fn test_continuity_across_cell_boundary() {
        let noise = NoiseField::new(9);
        let eps = 1e-7;
        for i in 0..20 {
            let y = 0.05 + i as f64 * 0.09;
            let left = noise.sample(3.0 - eps, y, 0.3);
            let right = noise.sample(3.0 + eps, y, 0.3);
            assert!((left - right).abs() < 1e-5, "jump at x=3, y={}", y);
        }
    }

    #[test]
    fn test_different_seeds() {
        let a = NoiseField::new(42);
        let b = NoiseField::new(999);
        let differs = (0..50).any(|i| {
            let x = 0.31 + i as f64 * 0.41;
            (a.sample(x, 0.77, 0.0) - b.sample(x, 0.77, 0.0)).abs() > 1e-9
        });
        assert!(differs, "Different seeds should produce different fields");
    }

    #[test]
    fn test_fbm_range() {
        let noise = NoiseField::new(123);
        for i in 0..200 {
            let value = noise.fbm(i as f64 * 0.07, 0.5, 0.5, 4, 0.5, 2.0);
            assert!((-1.0..=1.0).contains(&value));
        }
    }
}
