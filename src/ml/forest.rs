//! Seeded multi-output random forest classifier.
//!
//! Every tree is a CART classifier grown on a bootstrap sample with Gini
//! impurity averaged across all labels, so one tree predicts the whole label
//! vector at once. A leaf stores the weighted fraction of positive samples
//! per label; the forest's probability for a label is the mean of its trees'
//! leaf values.
//!
//! Per-tree seeds are drawn in sequence from the configured seed before any
//! tree is fitted, and trees are collected in index order, so the fitted
//! forest is identical regardless of how many threads do the work.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ml::MLError;

/// How many features a split considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))`
    #[default]
    Sqrt,
    /// `ceil(log2(n_features))`
    Log2,
    /// Every feature.
    All,
    /// A fixed count, capped at the number of features.
    Count(usize),
}

impl MaxFeatures {
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(k) => *k,
        };
        n.clamp(1, n_features.max(1))
    }
}

/// Forest hyperparameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub max_features: MaxFeatures,
    pub bootstrap: bool,
    pub seed: u64,
    /// Worker threads; `None` uses the global rayon pool.
    pub n_jobs: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        ForestParams {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
            n_jobs: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        values: Vec<f64>,
    },
}

/// A multi-output classification tree stored as a flat node arena.
///
/// Node 0 is the root. Children always have larger indices than their
/// parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<TreeNode>,
}

/// Training data borrowed for the duration of a fit.
struct TrainingSet<'a> {
    features: &'a [Vec<f64>],
    labels: &'a [Vec<bool>],
    n_features: usize,
    n_labels: usize,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl DecisionTree {
    fn fit(data: &TrainingSet<'_>, params: &ForestParams, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let n_samples = data.features.len();

        let mut weights = vec![0.0; n_samples];
        if params.bootstrap {
            for _ in 0..n_samples {
                weights[rng.random_range(0..n_samples)] += 1.0;
            }
        } else {
            weights.fill(1.0);
        }

        let indices: Vec<usize> = (0..n_samples).filter(|&i| weights[i] > 0.0).collect();
        let mut tree = DecisionTree { nodes: Vec::new() };
        let max_features = params.max_features.resolve(data.n_features);

        // Depth-first with an explicit stack; (node slot, samples, depth).
        tree.nodes.push(TreeNode::Leaf { values: Vec::new() });
        let mut stack = vec![(0usize, indices, 0usize)];

        while let Some((slot, samples, depth)) = stack.pop() {
            let values = leaf_values(data, &weights, &samples);
            let impurity = gini(&values);

            let can_split = samples.len() >= params.min_samples_split.max(2)
                && params.max_depth.is_none_or(|max| depth < max)
                && impurity > f64::EPSILON;

            let best = if can_split {
                best_split(data, &weights, &samples, max_features, &mut rng)
            } else {
                None
            };

            match best {
                Some(split) => {
                    let (left, right): (Vec<usize>, Vec<usize>) = samples
                        .iter()
                        .partition(|&&i| data.features[i][split.feature] <= split.threshold);

                    let left_slot = tree.nodes.len();
                    tree.nodes.push(TreeNode::Leaf { values: Vec::new() });
                    let right_slot = tree.nodes.len();
                    tree.nodes.push(TreeNode::Leaf { values: Vec::new() });

                    tree.nodes[slot] = TreeNode::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left: left_slot,
                        right: right_slot,
                    };
                    stack.push((right_slot, right, depth + 1));
                    stack.push((left_slot, left, depth + 1));
                }
                None => tree.nodes[slot] = TreeNode::Leaf { values },
            }
        }

        tree
    }

    /// Per-label positive probability for one feature row.
    pub fn predict(&self, row: &[f64]) -> &[f64] {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { values } => return values,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let x = row.get(*feature).copied().unwrap_or(0.0);
                    node = if x <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn validate(&self, n_features: usize, n_labels: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= n_features {
                        return Err(format!("node {i} splits on feature {feature}"));
                    }
                    if *left <= i || *right <= i || *left >= self.nodes.len() || *right >= self.nodes.len() {
                        return Err(format!("node {i} has invalid children"));
                    }
                }
                TreeNode::Leaf { values } => {
                    if values.len() != n_labels {
                        return Err(format!("leaf {i} has {} values", values.len()));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Weighted positive fraction per label over a sample set.
fn leaf_values(data: &TrainingSet<'_>, weights: &[f64], samples: &[usize]) -> Vec<f64> {
    let mut positives = vec![0.0; data.n_labels];
    let mut total = 0.0;
    for &i in samples {
        total += weights[i];
        for (p, &set) in positives.iter_mut().zip(&data.labels[i]) {
            if set {
                *p += weights[i];
            }
        }
    }
    if total > 0.0 {
        positives.iter_mut().for_each(|p| *p /= total);
    }
    positives
}

/// Gini impurity averaged across labels. For a binary label with positive
/// fraction p this is `2p(1-p)`.
fn gini(fractions: &[f64]) -> f64 {
    if fractions.is_empty() {
        return 0.0;
    }
    fractions.iter().map(|p| 2.0 * p * (1.0 - p)).sum::<f64>() / fractions.len() as f64
}

/// Search features in random order for the split with the lowest weighted
/// child impurity. At least `max_features` features are examined; the search
/// keeps going past that only while no valid split has been found.
fn best_split(
    data: &TrainingSet<'_>,
    weights: &[f64],
    samples: &[usize],
    max_features: usize,
    rng: &mut StdRng,
) -> Option<SplitCandidate> {
    let mut features: Vec<usize> = (0..data.n_features).collect();
    features.shuffle(rng);

    let mut best: Option<SplitCandidate> = None;
    for (visited, &feature) in features.iter().enumerate() {
        if visited >= max_features && best.is_some() {
            break;
        }
        if let Some(candidate) = best_split_on(data, weights, samples, feature)
            && best.as_ref().is_none_or(|b| candidate.impurity < b.impurity)
        {
            best = Some(candidate);
        }
    }
    best
}

fn best_split_on(
    data: &TrainingSet<'_>,
    weights: &[f64],
    samples: &[usize],
    feature: usize,
) -> Option<SplitCandidate> {
    let mut order: Vec<usize> = samples.to_vec();
    order.sort_by(|&a, &b| data.features[a][feature].total_cmp(&data.features[b][feature]));

    let total_weight: f64 = order.iter().map(|&i| weights[i]).sum();
    let mut total_pos = vec![0.0; data.n_labels];
    for &i in &order {
        for (p, &set) in total_pos.iter_mut().zip(&data.labels[i]) {
            if set {
                *p += weights[i];
            }
        }
    }

    let mut left_weight = 0.0;
    let mut left_pos = vec![0.0; data.n_labels];
    let mut best: Option<SplitCandidate> = None;

    for pair in order.windows(2) {
        let (i, next) = (pair[0], pair[1]);
        left_weight += weights[i];
        for (p, &set) in left_pos.iter_mut().zip(&data.labels[i]) {
            if set {
                *p += weights[i];
            }
        }

        let x = data.features[i][feature];
        let x_next = data.features[next][feature];
        if x_next <= x {
            continue;
        }

        let right_weight = total_weight - left_weight;
        let left_gini = gini_from_counts(&left_pos, left_weight);
        let right_pos: Vec<f64> = total_pos.iter().zip(&left_pos).map(|(t, l)| t - l).collect();
        let right_gini = gini_from_counts(&right_pos, right_weight);
        let impurity = (left_weight * left_gini + right_weight * right_gini) / total_weight;

        if best.as_ref().is_none_or(|b| impurity < b.impurity) {
            let mut threshold = x + (x_next - x) / 2.0;
            // The midpoint of two adjacent floats can round up to the larger one.
            if threshold >= x_next {
                threshold = x;
            }
            best = Some(SplitCandidate {
                feature,
                threshold,
                impurity,
            });
        }
    }
    best
}

fn gini_from_counts(positives: &[f64], weight: f64) -> f64 {
    if weight <= 0.0 {
        return 0.0;
    }
    let fractions: Vec<f64> = positives.iter().map(|p| p / weight).collect();
    gini(&fractions)
}

/// An ensemble of [`DecisionTree`]s predicting per-label probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    n_labels: usize,
}

impl RandomForest {
    /// Fit a forest on row-major features and a 0/1 label matrix.
    pub fn fit(features: &[Vec<f64>], labels: &[Vec<bool>], params: &ForestParams) -> Result<Self> {
        let training = |message: String| MLError::TrainingFailed { message };

        if features.is_empty() {
            return Err(training("no training samples".to_string()).into());
        }
        if features.len() != labels.len() {
            return Err(training(format!(
                "{} feature rows but {} label rows",
                features.len(),
                labels.len()
            ))
            .into());
        }
        if params.n_estimators == 0 {
            return Err(training("n_estimators must be at least 1".to_string()).into());
        }

        let n_features = features[0].len();
        let n_labels = labels[0].len();
        if features.iter().any(|r| r.len() != n_features) || labels.iter().any(|r| r.len() != n_labels) {
            return Err(training("ragged training matrix".to_string()).into());
        }
        if let Some(x) = features.iter().flatten().find(|x| !x.is_finite()) {
            return Err(training(format!("non-finite feature value {x}")).into());
        }

        let data = TrainingSet {
            features,
            labels,
            n_features,
            n_labels,
        };

        let mut seeder = StdRng::seed_from_u64(params.seed);
        let seeds: Vec<u64> = (0..params.n_estimators).map(|_| seeder.random()).collect();

        let grow = || -> Vec<DecisionTree> {
            seeds
                .par_iter()
                .map(|&seed| DecisionTree::fit(&data, params, seed))
                .collect()
        };

        let trees = match params.n_jobs {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| training(format!("failed to build thread pool: {e}")))?
                .install(grow),
            None => grow(),
        };

        Ok(RandomForest {
            trees,
            n_features,
            n_labels,
        })
    }

    /// Per-label probabilities for one row, averaged over trees.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features {
            return Err(MLError::InvalidFeatureVector {
                message: format!("expected {} features, got {}", self.n_features, row.len()),
            }
            .into());
        }

        let mut proba = vec![0.0; self.n_labels];
        for tree in &self.trees {
            for (p, v) in proba.iter_mut().zip(tree.predict(row)) {
                *p += v;
            }
        }
        let n = self.trees.len().max(1) as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        Ok(proba)
    }

    /// Probabilities for every row.
    pub fn predict_proba_all(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        rows.iter().map(|row| self.predict_proba(row)).collect()
    }

    /// Check structural consistency after deserialization.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, tree)| {
                tree.validate(self.n_features, self.n_labels)
                    .map_err(|e| format!("tree {i}: {e}"))
            })
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_labels(&self) -> usize {
        self.n_labels
    }
}
