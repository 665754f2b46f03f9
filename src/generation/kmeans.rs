//! Fixed-iteration k-means in the plane
//!
//! Used twice per map: land cells into districts, then district centroids
//! into wards. The iteration count is fixed rather than convergence-driven so
//! running time is predictable and region shapes stay slightly irregular.

use std::time::Instant;

use glam::DVec2;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{MapGenError, Result};

/// Options for the k-means clusterer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterOptions {
    /// Number of assign/update rounds to run
    pub iterations: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self { iterations: 5 }
    }
}

/// Current centroids and member → cluster assignment
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    /// One centroid per cluster
    pub centroids: Vec<DVec2>,
    /// `assignment[m]` is the cluster of member `m`
    pub assignment: Vec<usize>,
}

impl Clustering {
    /// Number of clusters
    #[inline]
    pub fn k(&self) -> usize {
        self.centroids.len()
    }

    /// Members assigned to `cluster`, ascending
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.assignment
            .iter()
            .enumerate()
            .filter_map(|(m, &c)| (c == cluster).then_some(m))
            .collect()
    }

    /// Member count of every cluster
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.k()];
        for &c in &self.assignment {
            sizes[c] += 1;
        }
        sizes
    }

    /// Number of clusters without members
    pub fn empty_clusters(&self) -> usize {
        self.cluster_sizes().iter().filter(|&&s| s == 0).count()
    }
}

/// Pick `k` seed positions among `positions`
///
/// Seeds are distinct members while `k <= n`; beyond that members are
/// drawn with replacement. No spacing is enforced between seeds.
///
/// # Errors
///
/// Returns `InvalidInput` if `positions` is empty or `k` is zero.
pub fn pick_seeds<R: Rng + ?Sized>(positions: &[DVec2], k: usize, rng: &mut R) -> Result<Vec<DVec2>> {
    if positions.is_empty() || k == 0 {
        return Err(MapGenError::InvalidInput(format!(
            "cannot pick {} seeds from {} positions",
            k,
            positions.len()
        )));
    }

    if k <= positions.len() {
        Ok(rand::seq::index::sample(rng, positions.len(), k)
            .into_iter()
            .map(|i| positions[i])
            .collect())
    } else {
        Ok((0..k)
            .map(|_| positions[rng.gen_range(0..positions.len())])
            .collect())
    }
}

/// Run k-means for a fixed number of iterations
///
/// Each iteration assigns every member to its nearest centroid (full scan,
/// ties to the lower cluster index) and moves every non-empty cluster's
/// centroid to the mean of its members. Empty clusters keep their centroid.
/// `on_iteration` sees the state after every iteration. At least one round
/// always runs, so every member ends up assigned to its nearest centroid.
///
/// With `capacities`, cluster `c` accepts at most `capacities[c]` members:
/// member/centroid pairs are taken greedily by ascending distance.
///
/// # Errors
///
/// Returns `InvalidInput` if there are no members or seeds, a seed is not
/// finite, or the capacities do not match `seeds` or cannot hold every member.
///
/// # Example
///
/// ```
/// use glam::DVec2;
/// use voronoi_city::generation::{kmeans, ClusterOptions};
///
/// let members = [
///     DVec2::new(0.0, 0.0),
///     DVec2::new(1.0, 0.0),
///     DVec2::new(10.0, 0.0),
///     DVec2::new(11.0, 0.0),
/// ];
/// let seeds = vec![members[0], members[2]];
/// let clustering = kmeans(&members, seeds, ClusterOptions::default(), None, |_, _| {}).unwrap();
///
/// assert_eq!(clustering.assignment, vec![0, 0, 1, 1]);
/// assert_eq!(clustering.centroids[1], DVec2::new(10.5, 0.0));
/// ```
pub fn kmeans<F>(
    members: &[DVec2],
    seeds: Vec<DVec2>,
    options: ClusterOptions,
    capacities: Option<&[usize]>,
    mut on_iteration: F,
) -> Result<Clustering>
where
    F: FnMut(usize, &Clustering),
{
    if members.is_empty() || seeds.is_empty() {
        return Err(MapGenError::InvalidInput(format!(
            "k-means needs members and seeds (got {} members, {} seeds)",
            members.len(),
            seeds.len()
        )));
    }
    if seeds.iter().any(|s| !s.is_finite()) {
        return Err(MapGenError::InvalidInput(
            "k-means seed is not finite".to_string(),
        ));
    }
    if let Some(capacities) = capacities {
        let total: usize = capacities.iter().sum();
        if capacities.len() != seeds.len() || total < members.len() {
            return Err(MapGenError::InvalidInput(format!(
                "{} capacities totalling {} cannot hold {} members in {} clusters",
                capacities.len(),
                total,
                members.len(),
                seeds.len()
            )));
        }
    }

    let start = Instant::now();
    let rounds = options.iterations.max(1);
    let mut clustering = Clustering {
        centroids: seeds,
        assignment: vec![0; members.len()],
    };

    for iteration in 0..rounds {
        match capacities {
            Some(capacities) => assign_capacitated(members, &mut clustering, capacities),
            None => assign_nearest(members, &mut clustering),
        }
        let moved = update_centroids(members, &mut clustering);

        debug!(
            iteration,
            moved,
            empty = clustering.empty_clusters(),
            "k-means iteration"
        );
        on_iteration(iteration, &clustering);
    }

    let empty = clustering.empty_clusters();
    if empty > 0 {
        warn!(empty, k = clustering.k(), "clusters ended without members");
    }
    debug!(
        members = members.len(),
        k = clustering.k(),
        iterations = rounds,
        elapsed = ?start.elapsed(),
        "k-means finished"
    );

    Ok(clustering)
}

fn nearest_centroid(p: DVec2, centroids: &[DVec2]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (c, centroid) in centroids.iter().enumerate() {
        let distance = p.distance_squared(*centroid);
        if distance < best_distance {
            best = c;
            best_distance = distance;
        }
    }
    best
}

fn assign_nearest(members: &[DVec2], clustering: &mut Clustering) {
    for (m, p) in members.iter().enumerate() {
        clustering.assignment[m] = nearest_centroid(*p, &clustering.centroids);
    }
}

fn assign_capacitated(members: &[DVec2], clustering: &mut Clustering, capacities: &[usize]) {
    let mut pairs: Vec<(f64, usize, usize)> = Vec::with_capacity(members.len() * clustering.k());
    for (m, p) in members.iter().enumerate() {
        for (c, centroid) in clustering.centroids.iter().enumerate() {
            pairs.push((p.distance_squared(*centroid), m, c));
        }
    }
    pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut remaining = capacities.to_vec();
    let mut assigned = vec![false; members.len()];
    let mut left = members.len();
    for (_, m, c) in pairs {
        if left == 0 {
            break;
        }
        if assigned[m] || remaining[c] == 0 {
            continue;
        }
        clustering.assignment[m] = c;
        assigned[m] = true;
        remaining[c] -= 1;
        left -= 1;
    }
}

/// Move centroids to their members' mean; returns the largest displacement
fn update_centroids(members: &[DVec2], clustering: &mut Clustering) -> f64 {
    let k = clustering.k();
    let mut sums = vec![DVec2::ZERO; k];
    let mut counts = vec![0usize; k];
    for (m, &c) in clustering.assignment.iter().enumerate() {
        sums[c] += members[m];
        counts[c] += 1;
    }

    let mut moved: f64 = 0.0;
    for c in 0..k {
        if counts[c] == 0 {
            continue;
        }
        let centroid = sums[c] / counts[c] as f64;
        moved = moved.max(centroid.distance(clustering.centroids[c]));
        clustering.centroids[c] = centroid;
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn blobs() -> Vec<DVec2> {
        let mut points = Vec::new();
        for i in 0..10 {
            let t = i as f64 * 0.1;
            points.push(DVec2::new(t, t * 0.5));
            points.push(DVec2::new(100.0 + t, 50.0 - t));
        }
        points
    }

    #[test]
    fn test_separates_two_blobs() {
        let members = blobs();
        // Both seeds start in the same blob
        let seeds = vec![members[0], members[2]];
        let clustering =
            kmeans(&members, seeds, ClusterOptions::default(), None, |_, _| {}).unwrap();

        let left = clustering.assignment[0];
        let right = clustering.assignment[1];
        assert_ne!(left, right);
        for (m, &c) in clustering.assignment.iter().enumerate() {
            assert_eq!(c, if m % 2 == 0 { left } else { right });
        }
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let members = blobs();
        let far = DVec2::new(5_000.0, 5_000.0);
        let seeds = vec![members[0], members[1], far];
        let clustering =
            kmeans(&members, seeds, ClusterOptions::default(), None, |_, _| {}).unwrap();

        assert_eq!(clustering.centroids[2], far);
        assert_eq!(clustering.empty_clusters(), 1);
        assert!(clustering.centroids.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_callback_runs_every_iteration() {
        let members = blobs();
        let seeds = vec![members[0], members[1]];
        let mut seen = Vec::new();
        kmeans(
            &members,
            seeds,
            ClusterOptions { iterations: 4 },
            None,
            |i, clustering| seen.push((i, clustering.assignment.len())),
        )
        .unwrap();

        assert_eq!(seen, vec![(0, 20), (1, 20), (2, 20), (3, 20)]);
    }

    #[test]
    fn test_zero_iterations_still_assigns() {
        let members = blobs();
        let seeds = vec![members[0], members[1]];
        let mut rounds = 0;
        let clustering = kmeans(
            &members,
            seeds,
            ClusterOptions { iterations: 0 },
            None,
            |_, _| rounds += 1,
        )
        .unwrap();

        assert_eq!(rounds, 1);
        assert_eq!(clustering.cluster_sizes(), vec![10, 10]);
        for (m, &c) in clustering.assignment.iter().enumerate() {
            assert_eq!(c, m % 2);
        }
    }

    #[test]
    fn test_capacities_are_respected() {
        // Five members crowd one corner, one member sits alone
        let members = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.5, 0.5),
            DVec2::new(50.0, 50.0),
        ];
        let seeds = vec![members[0], members[3], members[5]];
        let capacities = [2, 2, 2];
        let clustering = kmeans(
            &members,
            seeds,
            ClusterOptions::default(),
            Some(&capacities),
            |_, _| {},
        )
        .unwrap();

        assert_eq!(clustering.cluster_sizes(), vec![2, 2, 2]);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        let members = blobs();
        let options = ClusterOptions::default();
        assert!(kmeans(&members, vec![], options, None, |_, _| {}).is_err());
        assert!(kmeans(&[], vec![DVec2::ZERO], options, None, |_, _| {}).is_err());
        assert!(kmeans(&members, vec![DVec2::NAN], options, None, |_, _| {}).is_err());

        let small = [5, 5];
        let result = kmeans(&members, vec![members[0], members[1]], options, Some(&small), |_, _| {});
        assert!(matches!(result, Err(MapGenError::InvalidInput(_))));
    }

    #[test]
    fn test_pick_seeds_distinct() {
        let members = blobs();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let seeds = pick_seeds(&members, 20, &mut rng).unwrap();
        for (i, a) in seeds.iter().enumerate() {
            assert!(members.contains(a));
            assert!(seeds[i + 1..].iter().all(|b| b != a));
        }

        let more = pick_seeds(&members[..3], 5, &mut rng).unwrap();
        assert_eq!(more.len(), 5);
        assert!(pick_seeds(&members, 0, &mut rng).is_err());
        assert!(pick_seeds(&[], 2, &mut rng).is_err());
    }

    #[test]
    fn test_every_member_assigned_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let members: Vec<DVec2> = (0..500)
            .map(|_| DVec2::new(rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect();
        let seeds = pick_seeds(&members, 7, &mut rng).unwrap();
        let clustering =
            kmeans(&members, seeds, ClusterOptions::default(), None, |_, _| {}).unwrap();

        assert_eq!(clustering.assignment.len(), 500);
        assert_eq!(clustering.cluster_sizes().iter().sum::<usize>(), 500);
        assert!(clustering.assignment.iter().all(|&c| c < 7));
        assert!(clustering.centroids.iter().all(|c| c.is_finite()));
    }
}
