use std::collections::VecDeque;

use crate::pipeline::{IterationSnapshot, Progress};

/// Paces clustering snapshots for display
///
/// Snapshots arrive as fast as the worker produces them; the queue releases
/// one every `frames_per_step` calls to [`tick`](Self::tick) so each
/// iteration stays on screen for a while. Nothing is ever dropped.
///
/// # Example
///
/// ```
/// use voronoi_city::AnimationQueue;
///
/// let mut queue = AnimationQueue::new(3);
/// assert!(queue.tick().is_none());
/// assert!(queue.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct AnimationQueue {
    frames: VecDeque<IterationSnapshot>,
    frames_per_step: u32,
    ticks: u32,
}

impl Default for AnimationQueue {
    /// Six ticks per step, about 100 ms at 60 fps
    fn default() -> Self {
        Self::new(6)
    }
}

impl AnimationQueue {
    /// `frames_per_step` of 0 is treated as 1
    pub fn new(frames_per_step: u32) -> Self {
        Self {
            frames: VecDeque::new(),
            frames_per_step: frames_per_step.max(1),
            ticks: 0,
        }
    }

    pub fn push(&mut self, snapshot: IterationSnapshot) {
        self.frames.push_back(snapshot);
    }

    /// Queue the snapshot carried by `progress`; status lines are ignored
    pub fn push_progress(&mut self, progress: &Progress) {
        if let Progress::Iteration(snapshot) = progress {
            self.push(snapshot.clone());
        }
    }

    /// Advance one display frame, returning the snapshot to show next
    pub fn tick(&mut self) -> Option<IterationSnapshot> {
        if self.frames.is_empty() {
            self.ticks = 0;
            return None;
        }
        self.ticks += 1;
        if self.ticks < self.frames_per_step {
            return None;
        }
        self.ticks = 0;
        self.frames.pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Discard everything, e.g. when a new generation starts
    pub fn clear(&mut self) {
        self.frames.clear();
        self.ticks = 0;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::pipeline::ClusterScope;

    fn snapshot(iteration: usize) -> IterationSnapshot {
        IterationSnapshot {
            scope: ClusterScope::Districts,
            iteration,
            centroids: Vec::new(),
            assignment: BTreeMap::new(),
        }
    }

    #[test]
    fn test_releases_one_frame_per_step() {
        let mut queue = AnimationQueue::new(3);
        for i in 0..2 {
            queue.push(snapshot(i));
        }

        let released: Vec<Option<usize>> =
            (0..7).map(|_| queue.tick().map(|s| s.iteration)).collect();
        assert_eq!(
            released,
            vec![None, None, Some(0), None, None, Some(1), None]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_burst_is_not_dropped() {
        let mut queue = AnimationQueue::new(1);
        for i in 0..10 {
            queue.push_progress(&Progress::Iteration(snapshot(i)));
            queue.push_progress(&Progress::Status("ignored".to_string()));
        }
        assert_eq!(queue.len(), 10);

        let order: Vec<usize> = std::iter::from_fn(|| queue.tick())
            .map(|s| s.iteration)
            .collect();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_step_and_clear() {
        let mut queue = AnimationQueue::new(0);
        queue.push(snapshot(4));
        assert_eq!(queue.tick().map(|s| s.iteration), Some(4));

        queue.push(snapshot(5));
        queue.clear();
        assert!(queue.tick().is_none());
    }
}
