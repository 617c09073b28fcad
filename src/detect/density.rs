use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EventDetector, SaccadeRecord};
use crate::assembler::GazeSequence;
use crate::types::Point;

/// Cluster membership of an averaged sample: `Some(id)` for a dense group,
/// `None` for noise.
pub type ClusterLabel = Option<usize>;

/// Parameters for the density strategy, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityConfig {
    /// Neighborhood radius (inclusive).
    pub eps: f64,
    /// Neighborhood size, counting the point itself, that makes a core point.
    pub min_samples: usize,
    /// Consecutive averaged-position distance above which a saccade is reported.
    pub saccade_distance: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            eps: 15.0,
            min_samples: 5,
            saccade_distance: 5.0,
        }
    }
}

/// An averaged gaze position and the cluster it was assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabeledSample {
    pub index: usize,
    pub position: Point,
    pub cluster: ClusterLabel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DensityEvents {
    /// Only samples with an averaged position, in index order.
    pub samples: Vec<LabeledSample>,
    pub saccades: Vec<SaccadeRecord>,
    pub cluster_count: usize,
}

impl DensityEvents {
    /// Cluster assignment of the sample at `index`.
    ///
    /// Returns `None` if the sample had no averaged position (and therefore
    /// took no part in clustering), `Some(None)` if it is noise.
    pub fn cluster_of(&self, index: usize) -> Option<ClusterLabel> {
        self.samples
            .binary_search_by_key(&index, |s| s.index)
            .ok()
            .map(|i| self.samples[i].cluster)
    }

    pub fn noise_count(&self) -> usize {
        self.samples.iter().filter(|s| s.cluster.is_none()).count()
    }
}

/// Clusters averaged gaze positions into fixation groups and reports large
/// consecutive jumps as saccades. The two outputs are computed independently:
/// a jump inside one cluster is still a saccade.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DensityDetector {
    pub config: DensityConfig,
}

impl DensityDetector {
    pub fn new(config: DensityConfig) -> Self {
        Self { config }
    }
}

impl EventDetector for DensityDetector {
    type Output = DensityEvents;

    fn detect(&self, sequence: &GazeSequence) -> DensityEvents {
        let averaged: Vec<(usize, Point)> = sequence.averaged().collect();
        let positions: Vec<Point> = averaged.iter().map(|&(_, p)| p).collect();

        let labels = dbscan(&positions, self.config.eps, self.config.min_samples);
        let cluster_count = labels.iter().flatten().max().map_or(0, |&m| m + 1);

        let samples = averaged
            .iter()
            .zip(labels)
            .map(|(&(index, position), cluster)| LabeledSample {
                index,
                position,
                cluster,
            })
            .collect();

        let mut saccades = Vec::new();
        for pair in sequence.samples().windows(2) {
            if let (Some(start), Some(end)) = (pair[0].avg(), pair[1].avg()) {
                if start.distance(&end) > self.config.saccade_distance {
                    saccades.push(SaccadeRecord::new(start, end));
                }
            }
        }

        debug!(
            "density: {} averaged samples, {} clusters, {} saccades",
            positions.len(),
            cluster_count,
            saccades.len()
        );

        DensityEvents {
            samples,
            saccades,
            cluster_count,
        }
    }
}

/// Density-based spatial clustering (DBSCAN).
///
/// A point whose `eps`-neighborhood (inclusive radius, the point itself
/// included) holds at least `min_samples` points is a core point. Clusters are
/// grown from core points in input order and numbered in discovery order; a
/// border point joins the first cluster that reaches it. Everything else is
/// noise.
pub fn dbscan(points: &[Point], eps: f64, min_samples: usize) -> Vec<ClusterLabel> {
    let n = points.len();
    let mut labels: Vec<ClusterLabel> = vec![None; n];
    if n == 0 || n < min_samples {
        return labels;
    }

    let neighbors = neighborhoods(points, eps);
    let is_core: Vec<bool> = neighbors.iter().map(|nb| nb.len() >= min_samples).collect();

    let mut next_id = 0usize;
    let mut stack = Vec::new();

    for seed in 0..n {
        if labels[seed].is_some() || !is_core[seed] {
            continue;
        }

        labels[seed] = Some(next_id);
        stack.push(seed);

        while let Some(p) = stack.pop() {
            for &q in &neighbors[p] {
                if labels[q].is_none() {
                    labels[q] = Some(next_id);
                    if is_core[q] {
                        stack.push(q);
                    }
                }
            }
        }

        next_id += 1;
    }

    labels
}

/// Indices of all points within `eps` of each point, in ascending order.
fn neighborhoods(points: &[Point], eps: f64) -> Vec<Vec<usize>> {
    let eps_sq = eps * eps;
    points
        .par_iter()
        .map(|p| {
            points
                .iter()
                .enumerate()
                .filter(|(_, q)| {
                    let dx = p.x - q.x;
                    let dy = p.y - q.y;
                    dx * dx + dy * dy <= eps_sq
                })
                .map(|(j, _)| j)
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::GazeSample;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    /// Sequence whose averaged positions are `coords`; `None` entries are
    /// frames without a detected face.
    fn averaged_seq(coords: &[Option<(f64, f64)>]) -> GazeSequence {
        let mut seq = GazeSequence::new();
        for (i, c) in coords.iter().enumerate() {
            let (l, r) = match c {
                Some((x, y)) => (
                    Some(Point::new(x - 30.0, *y)),
                    Some(Point::new(x + 30.0, *y)),
                ),
                None => (None, None),
            };
            seq.push(GazeSample::new(i, l, r)).unwrap();
        }
        seq
    }

    #[test]
    fn dense_group_and_outlier() {
        let labels = dbscan(&pts(&[(0.0, 0.0), (1.0, 1.0), (0.0, 1.0), (50.0, 50.0)]), 5.0, 3);
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), None]);
    }

    #[test]
    fn too_few_points_are_all_noise() {
        let labels = dbscan(&pts(&[(0.0, 0.0), (0.5, 0.5)]), 5.0, 3);
        assert_eq!(labels, vec![None, None]);
        assert!(dbscan(&[], 5.0, 1).is_empty());
    }

    #[test]
    fn radius_is_inclusive() {
        let labels = dbscan(&pts(&[(0.0, 0.0), (3.0, 4.0)]), 5.0, 2);
        assert_eq!(labels, vec![Some(0), Some(0)]);
    }

    #[test]
    fn min_samples_one_makes_every_point_a_cluster() {
        let labels = dbscan(&pts(&[(0.0, 0.0), (100.0, 0.0), (0.0, 100.0)]), 5.0, 1);
        assert_eq!(labels, vec![Some(0), Some(1), Some(2)]);
    }

    #[test]
    fn ids_follow_discovery_order() {
        let labels = dbscan(
            &pts(&[
                (100.0, 100.0),
                (0.0, 0.0),
                (101.0, 100.0),
                (1.0, 0.0),
                (100.0, 101.0),
                (0.0, 1.0),
            ]),
            2.0,
            3,
        );
        assert_eq!(
            labels,
            vec![Some(0), Some(1), Some(0), Some(1), Some(0), Some(1)]
        );
    }

    #[test]
    fn chains_of_core_points_merge() {
        // Each point only reaches its immediate neighbours, yet all are reachable.
        let chain: Vec<(f64, f64)> = (0..10).map(|i| (i as f64 * 4.0, 0.0)).collect();
        let labels = dbscan(&pts(&chain), 4.0, 3);
        // Ends have only 2 points in range: border points of the same cluster.
        assert!(labels.iter().all(|l| *l == Some(0)));
    }

    #[test]
    fn border_point_joins_cluster_but_does_not_extend_it() {
        // (5,0) is a border point of the dense group; (8,0) is only within
        // reach of that border point.
        let labels = dbscan(
            &pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (1.0, 1.0), (5.0, 0.0), (8.0, 0.0)]),
            3.0,
            4,
        );
        assert_eq!(
            labels,
            vec![Some(0), Some(0), Some(0), Some(0), Some(0), None]
        );
    }

    #[test]
    fn partition_does_not_depend_on_input_order() {
        let coords = [
            (0.0, 0.0),
            (1.0, 1.0),
            (2.0, 0.0),
            (40.0, 40.0),
            (41.0, 40.0),
            (40.0, 42.0),
            (90.0, 10.0),
        ];
        let forward = dbscan(&pts(&coords), 3.0, 3);
        let mut reversed_coords = coords.to_vec();
        reversed_coords.reverse();
        let mut backward = dbscan(&pts(&reversed_coords), 3.0, 3);
        backward.reverse();

        // Same grouping, possibly different ids.
        for i in 0..coords.len() {
            for j in 0..coords.len() {
                let same_fwd = forward[i].is_some() && forward[i] == forward[j];
                let same_bwd = backward[i].is_some() && backward[i] == backward[j];
                assert_eq!(same_fwd, same_bwd, "points {} and {}", i, j);
            }
            assert_eq!(forward[i].is_none(), backward[i].is_none());
        }
    }

    #[test]
    fn revisited_region_shares_cluster_id() {
        let seq = averaged_seq(&[
            Some((0.0, 0.0)),
            Some((1.0, 0.0)),
            Some((0.0, 1.0)),
            Some((80.0, 80.0)),
            Some((81.0, 80.0)),
            Some((80.0, 81.0)),
            Some((1.0, 1.0)),
        ]);
        let events = DensityDetector::new(DensityConfig {
            eps: 5.0,
            min_samples: 3,
            saccade_distance: 5.0,
        })
        .detect(&seq);

        assert_eq!(events.cluster_count, 2);
        assert_eq!(events.cluster_of(6), Some(Some(0)));
        assert_eq!(events.cluster_of(3), Some(Some(1)));
    }

    #[test]
    fn saccades_ignore_cluster_membership() {
        let seq = averaged_seq(&[Some((0.0, 0.0)), Some((1.0, 1.0)), Some((50.0, 50.0))]);
        let events = DensityDetector::new(DensityConfig {
            eps: 100.0,
            min_samples: 1,
            saccade_distance: 5.0,
        })
        .detect(&seq);

        // One cluster holds all three points, yet the jump is reported.
        assert_eq!(events.cluster_count, 1);
        assert_eq!(events.saccades.len(), 1);
        let s = events.saccades[0];
        assert_eq!(s.start, Point::new(1.0, 1.0));
        assert_eq!(s.end, Point::new(50.0, 50.0));
        assert!((s.amplitude() - 69.296).abs() < 1e-3);
        assert_eq!(s.label, None);
    }

    #[test]
    fn missing_averages_are_excluded() {
        let seq = averaged_seq(&[
            Some((0.0, 0.0)),
            None,
            Some((60.0, 0.0)),
            Some((61.0, 0.0)),
        ]);
        let events = DensityDetector::new(DensityConfig {
            eps: 5.0,
            min_samples: 2,
            saccade_distance: 5.0,
        })
        .detect(&seq);

        assert_eq!(events.samples.len(), 3);
        assert_eq!(events.cluster_of(1), None);
        assert_eq!(events.cluster_of(0), Some(None));
        assert_eq!(events.cluster_of(2), Some(Some(0)));
        assert_eq!(events.noise_count(), 1);
        // 0 -> gap -> 2 is never compared; 2 -> 3 is below the threshold.
        assert!(events.saccades.is_empty());
    }

    #[test]
    fn partial_sample_has_no_average() {
        let mut seq = GazeSequence::new();
        seq.push(GazeSample::new(0, Some(Point::new(0.0, 0.0)), Some(Point::new(10.0, 0.0))))
            .unwrap();
        seq.push(GazeSample::new(1, Some(Point::new(90.0, 0.0)), None))
            .unwrap();
        seq.push(GazeSample::new(2, Some(Point::new(80.0, 0.0)), Some(Point::new(90.0, 0.0))))
            .unwrap();

        let events = DensityDetector::default().detect(&seq);
        assert_eq!(events.samples.len(), 2);
        assert!(events.saccades.is_empty());
    }
}
