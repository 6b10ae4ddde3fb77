//! Seeded random-forest binary classifier.
//!
//! Ensemble of gini decision trees over bootstrap samples with
//! sqrt-feature subsampling. Every run with the same inputs and seed
//! produces the same probabilities; each tree derives its RNG from the
//! forest seed plus the tree index.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 10,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// Row-major training data: one feature vector per sample plus a binary
/// label.
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

impl Dataset {
    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }
}

enum Node {
    Leaf {
        p_up: f64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn predict(&self, row: &[f64]) -> f64 {
        match self {
            Node::Leaf { p_up } => *p_up,
            Node::Split {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                if row[*feature_idx] <= *threshold {
                    left.predict(row)
                } else {
                    right.predict(row)
                }
            }
        }
    }
}

struct DecisionTree {
    root: Node,
}

impl DecisionTree {
    fn fit(dataset: &Dataset, indices: &[usize], config: &ForestConfig, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let max_features = (dataset.n_features() as f64).sqrt().ceil() as usize;
        let root = build_node(dataset, indices, 0, config, max_features, &mut rng);
        Self { root }
    }

    fn predict_proba(&self, row: &[f64]) -> f64 {
        self.root.predict(row)
    }
}

fn p_up(dataset: &Dataset, indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.5;
    }
    let ups: usize = indices
        .iter()
        .filter(|&&i| dataset.labels[i] == 1)
        .count();
    ups as f64 / indices.len() as f64
}

fn gini(dataset: &Dataset, indices: &[usize]) -> f64 {
    let p = p_up(dataset, indices);
    1.0 - p * p - (1.0 - p) * (1.0 - p)
}

fn build_node(
    dataset: &Dataset,
    indices: &[usize],
    depth: usize,
    config: &ForestConfig,
    max_features: usize,
    rng: &mut ChaCha8Rng,
) -> Node {
    let p = p_up(dataset, indices);
    if depth >= config.max_depth
        || indices.len() < config.min_samples_split
        || p == 0.0
        || p == 1.0
    {
        return Node::Leaf { p_up: p };
    }

    let feature_pool: Vec<usize> = (0..dataset.n_features()).collect();
    let candidates: Vec<usize> = feature_pool
        .choose_multiple(rng, max_features.min(feature_pool.len()))
        .copied()
        .collect();

    let parent_gini = gini(dataset, indices);
    let mut best: Option<(f64, usize, f64)> = None; // (gain, feature, threshold)

    for &feature_idx in &candidates {
        let mut values: Vec<f64> = indices
            .iter()
            .map(|&i| dataset.features[i][feature_idx])
            .collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| dataset.features[i][feature_idx] <= threshold);
            if left.len() < config.min_samples_leaf || right.len() < config.min_samples_leaf {
                continue;
            }

            let n = indices.len() as f64;
            let weighted = gini(dataset, &left) * left.len() as f64 / n
                + gini(dataset, &right) * right.len() as f64 / n;
            let gain = parent_gini - weighted;
            if best.map_or(gain > 1e-12, |(g, _, _)| gain > g) {
                best = Some((gain, feature_idx, threshold));
            }
        }
    }

    let Some((_, feature_idx, threshold)) = best else {
        return Node::Leaf { p_up: p };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| dataset.features[i][feature_idx] <= threshold);

    Node::Split {
        feature_idx,
        threshold,
        left: Box::new(build_node(
            dataset, &left_idx, depth + 1, config, max_features, rng,
        )),
        right: Box::new(build_node(
            dataset, &right_idx, depth + 1, config, max_features, rng,
        )),
    }
}

pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on the dataset. Trees are trained in parallel; determinism is
    /// unaffected because each tree's RNG depends only on the forest seed
    /// and its index.
    pub fn fit(dataset: &Dataset, config: &ForestConfig) -> Self {
        let trees: Vec<DecisionTree> = (0..config.n_trees)
            .into_par_iter()
            .map(|i| {
                let tree_seed = config.seed.wrapping_add(i as u64);
                let indices = bootstrap_indices(dataset.n_samples(), tree_seed);
                DecisionTree::fit(dataset, &indices, config, tree_seed)
            })
            .collect();
        Self { trees }
    }

    /// Mean over trees of the leaf probability of an up move.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let total: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        total / self.trees.len() as f64
    }
}

fn bootstrap_indices(n_samples: usize, seed: u64) -> Vec<usize> {
    // Offset keeps the bootstrap stream distinct from the split-choice
    // stream seeded with the bare tree seed.
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15);
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}
