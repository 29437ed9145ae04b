use std::{cmp::Ordering, collections::HashSet};

use derive_new::new;
use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::{vectorizer::SparseVector, ModelError};

/// Default number of trees
pub const DEFAULT_N_ESTIMATORS: u32 = 100;

/// Default minimum number of samples needed to split a node
pub const DEFAULT_MIN_SAMPLES_SPLIT: u32 = 2;

/// Random forest hyper-parameters
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, new, bitcode::Encode, bitcode::Decode,
)]
pub struct ForestParams {
    /// The number of trees in the forest
    #[new(value = "DEFAULT_N_ESTIMATORS")]
    pub n_estimators: u32,

    /// The minimum number of samples required to split an internal node
    #[new(value = "DEFAULT_MIN_SAMPLES_SPLIT")]
    pub min_samples_split: u32,

    /// Seed for bootstrap sampling and feature selection; random when unset
    #[new(default)]
    pub seed: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self::new()
    }
}

impl ForestParams {
    /// Use a different number of trees
    pub fn with_n_estimators(mut self, n_estimators: u32) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    /// Use a different minimum split size
    pub fn with_min_samples_split(mut self, min_samples_split: u32) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Use a fixed seed
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// A tree node; children are indices into the tree's node list
#[derive(Debug, Clone, PartialEq, bitcode::Encode, bitcode::Decode)]
enum Node {
    /// Send rows with `feature <= threshold` left, the rest right
    Split {
        feature: u32,
        threshold: f64,
        left: u32,
        right: u32,
    },

    /// The fraction of training rows positive for each label
    Leaf { value: Vec<f64> },
}

/// A multi-output classification tree
#[derive(Debug, Clone, PartialEq, bitcode::Encode, bitcode::Decode)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// The per-label positive fractions of the leaf a row falls into
    pub fn predict_row(&self, row: &SparseVector) -> &[f64] {
        let mut index = 0;

        loop {
            match &self.nodes[index] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row.get(*feature) <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                Node::Leaf { value } => return value,
            }
        }
    }

    /// The number of nodes, internal and leaf
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check that every split points forward to an existing node and every leaf holds one
    /// value per output. `predict_row` relies on both to terminate.
    pub fn validate(&self, n_outputs: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::CorruptArtifact("a tree has no nodes".to_string()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Split { left, right, .. } => {
                    for child in [*left as usize, *right as usize] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(ModelError::CorruptArtifact(format!(
                                "node {} points to node {} in a tree of {} nodes",
                                index,
                                child,
                                self.nodes.len()
                            )));
                        }
                    }
                }
                Node::Leaf { value } if value.len() != n_outputs => {
                    return Err(ModelError::CorruptArtifact(format!(
                        "leaf {} has {} values but the forest has {} outputs",
                        index,
                        value.len(),
                        n_outputs
                    )));
                }
                Node::Leaf { .. } => {}
            }
        }

        Ok(())
    }
}

/// A candidate split of a node's samples
struct Split {
    feature: u32,
    threshold: f64,
    impurity: f64,
}

/// Grows a single tree over a shared training set
struct TreeBuilder<'a> {
    rows: &'a [SparseVector],
    labels: &'a [Vec<bool>],
    n_outputs: usize,
    max_features: usize,
    min_samples_split: usize,
}

impl<'a> TreeBuilder<'a> {
    fn build(&self, samples: Vec<usize>, features: &mut [u32], rng: &mut StdRng) -> DecisionTree {
        let mut nodes = vec![Node::Leaf { value: Vec::new() }];
        let mut pending = vec![(0usize, samples)];

        while let Some((id, samples)) = pending.pop() {
            let positives = self.positives(&samples);

            let split = if samples.len() >= self.min_samples_split
                && gini(&positives, samples.len()) > 0.0
            {
                self.best_split(&samples, &positives, features, rng)
            } else {
                None
            };

            match split {
                Some(split) => {
                    let (left, right): (Vec<usize>, Vec<usize>) = samples
                        .into_iter()
                        .partition(|&sample| self.rows[sample].get(split.feature) <= split.threshold);

                    let left_id = nodes.len();
                    let right_id = left_id + 1;
                    nodes.push(Node::Leaf { value: Vec::new() });
                    nodes.push(Node::Leaf { value: Vec::new() });

                    nodes[id] = Node::Split {
                        feature: split.feature,
                        threshold: split.threshold,
                        left: left_id as u32,
                        right: right_id as u32,
                    };

                    pending.push((right_id, right));
                    pending.push((left_id, left));
                }
                None => {
                    let total = samples.len().max(1) as f64;
                    nodes[id] = Node::Leaf {
                        value: positives.iter().map(|&count| count as f64 / total).collect(),
                    };
                }
            }
        }

        DecisionTree { nodes }
    }

    /// Positive count per label over the given samples
    fn positives(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_outputs];

        for &sample in samples {
            for (count, &positive) in counts.iter_mut().zip(&self.labels[sample]) {
                *count += usize::from(positive);
            }
        }

        counts
    }

    /// Search randomly drawn features for the split with the lowest weighted impurity.
    ///
    /// At least `max_features` features are drawn, and drawing continues past that until a
    /// feature that varies across the samples is found or every feature has been tried.
    fn best_split(
        &self,
        samples: &[usize],
        positives: &[usize],
        features: &mut [u32],
        rng: &mut StdRng,
    ) -> Option<Split> {
        let present: HashSet<u32> = samples
            .iter()
            .flat_map(|&sample| self.rows[sample].indices().iter().copied())
            .collect();

        let mut best: Option<Split> = None;
        let mut visited = 0;

        // Partial Fisher-Yates shuffle: features[..drawn] are the draws so far
        for drawn in 0..features.len() {
            if visited >= self.max_features && best.is_some() {
                break;
            }

            let pick = rng.gen_range(drawn..features.len());
            features.swap(drawn, pick);
            let feature = features[drawn];
            visited += 1;

            // Features absent from every sample are constant zero
            if !present.contains(&feature) {
                continue;
            }

            if let Some(split) = self.split_on(feature, samples, positives) {
                if best
                    .as_ref()
                    .map_or(true, |current| split.impurity < current.impurity)
                {
                    best = Some(split);
                }
            }
        }

        best
    }

    /// The best threshold for one feature, if the feature varies across the samples
    fn split_on(&self, feature: u32, samples: &[usize], positives: &[usize]) -> Option<Split> {
        let mut values: Vec<(f64, usize)> = samples
            .iter()
            .map(|&sample| (self.rows[sample].get(feature), sample))
            .collect();
        values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let first = values.first()?.0;
        let last = values.last()?.0;
        if first >= last {
            return None;
        }

        let total = values.len();
        let mut left = vec![0usize; self.n_outputs];
        let mut right = vec![0usize; self.n_outputs];
        let mut best: Option<Split> = None;

        for position in 0..total - 1 {
            let (value, sample) = values[position];
            for (count, &positive) in left.iter_mut().zip(&self.labels[sample]) {
                *count += usize::from(positive);
            }

            let next = values[position + 1].0;
            if next <= value {
                continue;
            }

            let n_left = position + 1;
            let n_right = total - n_left;
            for ((count, &all), &l) in right.iter_mut().zip(positives).zip(&left) {
                *count = all - l;
            }

            let impurity =
                n_left as f64 * gini(&left, n_left) + n_right as f64 * gini(&right, n_right);

            if best
                .as_ref()
                .map_or(true, |current| impurity < current.impurity)
            {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }

                best = Some(Split {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }

        best
    }
}

/// Gini impurity averaged over outputs
fn gini(positives: &[usize], total: usize) -> f64 {
    if total == 0 || positives.is_empty() {
        return 0.0;
    }

    let total = total as f64;
    let sum: f64 = positives
        .iter()
        .map(|&count| {
            let p = count as f64 / total;
            2.0 * p * (1.0 - p)
        })
        .sum();

    sum / positives.len() as f64
}

/// An ensemble of bootstrapped multi-output decision trees that vote by averaging
#[derive(Debug, Clone, PartialEq, bitcode::Encode, bitcode::Decode)]
pub struct RandomForest {
    params: ForestParams,
    n_features: u32,
    n_outputs: u32,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Creates an unfitted forest
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            n_features: 0,
            n_outputs: 0,
            trees: Vec::new(),
        }
    }

    /// The forest's hyper-parameters
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    /// Returns true once trees have been grown
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// The number of labels predicted per row
    pub fn n_outputs(&self) -> usize {
        self.n_outputs as usize
    }

    /// Check every tree against the forest's output count
    pub fn validate(&self) -> Result<(), ModelError> {
        self.trees
            .iter()
            .try_for_each(|tree| tree.validate(self.n_outputs()))
    }

    /// Grow the forest. A label counts as positive when its value is greater than zero.
    pub fn fit(
        &mut self,
        rows: &[SparseVector],
        n_features: usize,
        labels: &[Vec<f64>],
    ) -> Result<(), ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }

        if rows.len() != labels.len() {
            return Err(ModelError::ShapeMismatch(format!(
                "{} rows but {} label rows",
                rows.len(),
                labels.len()
            )));
        }

        if self.params.n_estimators == 0 || self.params.min_samples_split < 2 {
            return Err(ModelError::Config(
                "a forest needs at least one tree and a minimum split size of at least 2"
                    .to_string(),
            ));
        }

        let n_outputs = labels[0].len();
        if labels.iter().any(|row| row.len() != n_outputs) {
            return Err(ModelError::ShapeMismatch(
                "label rows have different widths".to_string(),
            ));
        }

        let binary: Vec<Vec<bool>> = labels
            .iter()
            .map(|row| row.iter().map(|&value| value > 0.0).collect())
            .collect();

        let builder = TreeBuilder {
            rows,
            labels: &binary,
            n_outputs,
            max_features: ((n_features as f64).sqrt() as usize).max(1),
            min_samples_split: self.params.min_samples_split as usize,
        };

        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut features: Vec<u32> = (0..n_features as u32).collect();
        let n_samples = rows.len();

        self.trees = (0..self.params.n_estimators)
            .map(|_| {
                let mut tree_rng = StdRng::seed_from_u64(rng.gen());
                let bootstrap = (0..n_samples)
                    .map(|_| tree_rng.gen_range(0..n_samples))
                    .collect();

                builder.build(bootstrap, &mut features, &mut tree_rng)
            })
            .collect();

        self.n_features = n_features as u32;
        self.n_outputs = n_outputs as u32;

        debug!(
            "Grew {} trees with {} nodes in total",
            self.trees.len(),
            self.trees.iter().map(DecisionTree::node_count).sum::<usize>()
        );

        Ok(())
    }

    /// The mean per-label positive fraction across all trees
    pub fn predict_proba(&self, rows: &[SparseVector]) -> Result<Vec<Vec<f64>>, ModelError> {
        if !self.is_fitted() {
            return Err(ModelError::NotFitted);
        }

        let n_trees = self.trees.len() as f64;

        Ok(rows
            .iter()
            .map(|row| {
                let mut sum = vec![0.0; self.n_outputs as usize];

                for tree in &self.trees {
                    for (total, value) in sum.iter_mut().zip(tree.predict_row(row)) {
                        *total += value;
                    }
                }

                sum.into_iter().map(|total| total / n_trees).collect()
            })
            .collect())
    }

    /// Predict 1 for each label with a mean positive fraction above one half
    pub fn predict(&self, rows: &[SparseVector]) -> Result<Vec<Vec<u8>>, ModelError> {
        Ok(self
            .predict_proba(rows)?
            .into_iter()
            .map(|row| row.into_iter().map(|p| u8::from(p > 0.5)).collect())
            .collect())
    }
}
