//! Seeded Isolation Forest anomaly scoring.
//!
//! Each tree recursively splits a random subsample on a random feature at a
//! uniformly drawn threshold until points are isolated or the height limit
//! is reached. Anomalies isolate early, so short average path lengths map to
//! high scores. All randomness comes from one [`StdRng`] seeded by the
//! caller, which makes masks reproducible.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{CleaningError, CleaningResult};

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Parameters of the forest and of the flagging rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsolationForestParams {
    /// Fraction of records flagged as outliers, in `(0, 0.5]`.
    pub contamination: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_trees")]
    pub n_trees: usize,
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

fn default_seed() -> u64 {
    42
}

fn default_trees() -> usize {
    100
}

fn default_max_samples() -> usize {
    256
}

impl Default for IsolationForestParams {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            seed: default_seed(),
            n_trees: default_trees(),
            max_samples: default_max_samples(),
        }
    }
}

impl IsolationForestParams {
    pub fn validate(&self) -> CleaningResult<()> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(CleaningError::invalid_parameter(
                "isolation_contamination",
                format!("must be in (0, 0.5], got {}", self.contamination),
            ));
        }
        if self.n_trees == 0 {
            return Err(CleaningError::invalid_parameter(
                "isolation_trees",
                "must be at least 1",
            ));
        }
        if self.max_samples < 2 {
            return Err(CleaningError::invalid_parameter(
                "isolation_max_samples",
                "must be at least 2",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        size: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted forest.
#[derive(Debug, Clone)]
pub struct IsolationForest {
    trees: Vec<Node>,
    sample_size: usize,
}

impl IsolationForest {
    /// Fit on row-major `points` (every row has the same dimension).
    pub fn fit(points: &[Vec<f64>], params: &IsolationForestParams) -> Self {
        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = points.len();
        let sample_size = params.max_samples.min(n);
        if sample_size == 0 {
            return Self {
                trees: Vec::new(),
                sample_size,
            };
        }
        let height_limit = (sample_size as f64).log2().ceil().max(1.0) as usize;

        let trees = (0..params.n_trees)
            .map(|_| {
                let sample = index::sample(&mut rng, n, sample_size).into_vec();
                build_tree(points, sample, 0, height_limit, &mut rng)
            })
            .collect();

        Self { trees, sample_size }
    }

    /// Anomaly score in `(0, 1]`; values near 1 are anomalous, around 0.5
    /// or below are normal.
    pub fn score(&self, point: &[f64]) -> f64 {
        let expected = average_path_length(self.sample_size);
        if self.trees.is_empty() || expected <= 0.0 {
            return 0.5;
        }
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| path_length(tree, point, 0))
            .sum();
        let avg = total / self.trees.len() as f64;
        2f64.powf(-avg / expected)
    }

    pub fn scores(&self, points: &[Vec<f64>]) -> Vec<f64> {
        points.iter().map(|p| self.score(p)).collect()
    }
}

fn build_tree(
    points: &[Vec<f64>],
    indices: Vec<usize>,
    depth: usize,
    height_limit: usize,
    rng: &mut StdRng,
) -> Node {
    if depth >= height_limit || indices.len() <= 1 {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let dims = points[indices[0]].len();
    // Only features with spread inside this node can split it.
    let candidates: Vec<(usize, f64, f64)> = (0..dims)
        .filter_map(|feature| {
            let (lo, hi) = indices.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &i| {
                let v = points[i][feature];
                (lo.min(v), hi.max(v))
            });
            (hi > lo).then_some((feature, lo, hi))
        })
        .collect();

    if candidates.is_empty() {
        return Node::Leaf {
            size: indices.len(),
        };
    }

    let (feature, lo, hi) = candidates[rng.gen_range(0..candidates.len())];
    let threshold = split_threshold(lo, hi, rng);
    let (left, right): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| points[i][feature] < threshold);

    Node::Split {
        feature,
        threshold,
        left: Box::new(build_tree(points, left, depth + 1, height_limit, rng)),
        right: Box::new(build_tree(points, right, depth + 1, height_limit, rng)),
    }
}

/// Uniform draw in `[lo, hi)` that never forms `hi - lo`, which overflows
/// for columns spanning most of the `f64` range.
fn split_threshold(lo: f64, hi: f64, rng: &mut StdRng) -> f64 {
    let t: f64 = rng.gen();
    let threshold = lo + t * hi - t * lo;
    if threshold >= lo && threshold < hi {
        threshold
    } else {
        lo
    }
}

fn path_length(node: &Node, point: &[f64], depth: usize) -> f64 {
    match node {
        Node::Leaf { size } => depth as f64 + average_path_length(*size),
        Node::Split {
            feature,
            threshold,
            left,
            right,
        } => {
            let value = point.get(*feature).copied().unwrap_or(f64::NAN);
            if value < *threshold {
                path_length(left, point, depth + 1)
            } else {
                path_length(right, point, depth + 1)
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over `n` points.
fn average_path_length(n: usize) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Flag the `round(contamination * n)` highest-scoring points.
///
/// Ties are broken by position so the mask is a pure function of
/// `(points, params)`. Fewer than two points yield an all-false mask.
pub fn isolation_forest_mask(points: &[Vec<f64>], params: &IsolationForestParams) -> Vec<bool> {
    let n = points.len();
    let mut mask = vec![false; n];
    if n < 2 {
        return mask;
    }

    let forest = IsolationForest::fit(points, params);
    let scores = forest.scores(points);
    let flagged = ((params.contamination * n as f64).round() as usize).min(n);

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
    for &i in order.iter().take(flagged) {
        mask[i] = true;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_with_outlier() -> Vec<Vec<f64>> {
        let mut points: Vec<Vec<f64>> = (0..40)
            .map(|i| {
                let jitter = (i % 7) as f64 * 0.1;
                vec![10.0 + jitter, 20.0 - jitter]
            })
            .collect();
        points.push(vec![500.0, -300.0]);
        points
    }

    #[test]
    fn test_average_path_length() {
        assert_eq!(average_path_length(1), 0.0);
        assert_eq!(average_path_length(2), 1.0);
        let c256 = average_path_length(256);
        assert!(c256 > 9.0 && c256 < 11.0);
    }

    #[test]
    fn test_outlier_scores_highest() {
        let points = cluster_with_outlier();
        let forest = IsolationForest::fit(&points, &IsolationForestParams::default());
        let scores = forest.scores(&points);
        let outlier = scores[40];
        assert!(scores[..40].iter().all(|&s| s < outlier));
        assert!(outlier > 0.5);
    }

    #[test]
    fn test_mask_flags_contamination_share() {
        let points = cluster_with_outlier();
        let params = IsolationForestParams {
            contamination: 0.025,
            ..Default::default()
        };
        let mask = isolation_forest_mask(&points, &params);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
        assert!(mask[40]);
    }

    #[test]
    fn test_same_seed_same_mask() {
        let points = cluster_with_outlier();
        let params = IsolationForestParams {
            contamination: 0.1,
            seed: 7,
            ..Default::default()
        };
        assert_eq!(
            isolation_forest_mask(&points, &params),
            isolation_forest_mask(&points, &params)
        );
    }

    #[test]
    fn test_degenerate_inputs() {
        let params = IsolationForestParams::default();
        assert!(isolation_forest_mask(&[], &params).is_empty());
        assert_eq!(isolation_forest_mask(&[vec![1.0]], &params), vec![false]);

        // Identical points never split, so ties fall back to position.
        let flat = vec![vec![3.0, 3.0]; 20];
        let mask = isolation_forest_mask(&flat, &params);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
        assert!(mask[0]);
    }

    #[test]
    fn test_extreme_finite_values_split() {
        let mut points: Vec<Vec<f64>> = (0..20).map(|i| vec![i as f64 * 0.5]).collect();
        points.push(vec![1e308]);
        points.push(vec![-1e308]);

        let mask = isolation_forest_mask(&points, &IsolationForestParams::default());
        assert_eq!(mask.len(), 22);
        assert_eq!(mask.iter().filter(|&&m| m).count(), 1);
        assert!(mask[20] || mask[21]);
    }

    #[test]
    fn test_split_threshold_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for (lo, hi) in [(-1e308, 1e308), (f64::MIN, f64::MAX), (0.0, 1.0), (1.0, 1.0 + f64::EPSILON)] {
            for _ in 0..200 {
                let t = split_threshold(lo, hi, &mut rng);
                assert!(t >= lo && t < hi, "{} not in [{}, {})", t, lo, hi);
            }
        }
    }

    #[test]
    fn test_params_validation() {
        assert!(IsolationForestParams::default().validate().is_ok());
        for contamination in [0.0, -0.1, 0.6, f64::NAN] {
            let params = IsolationForestParams {
                contamination,
                ..Default::default()
            };
            assert!(params.validate().is_err());
        }
    }
}
