//! Random forest binary classifier
//!
//! Bagged ensemble of CART trees grown on Gini impurity. Each tree is fitted
//! on a bootstrap sample and considers a random subset of features at every
//! split. The ensemble probability is the mean of the per-tree leaf positive
//! fractions.
//!
//! Trees are stored as flat node arenas so the fitted model serializes to
//! plain JSON without recursion.

use ndarray::ArrayView2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Hyperparameters for [`RandomForest::fit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    /// Features evaluated per split; `None` uses `floor(sqrt(n_features))`
    pub max_features: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 5,
            max_features: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn features_per_split(&self, n_features: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
            .clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        /// Fraction of positive samples reaching this leaf
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single fitted CART tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Positive-class probability for one feature row
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(Node::Leaf { value }) => return *value,
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = row.get(*feature).copied().unwrap_or(0.0);
                    index = if value <= *threshold { *left } else { *right };
                }
                None => return 0.0,
            }
        }
    }

    /// Number of nodes, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path, counted in edges
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes.get(index) {
                Some(Node::Split { left, right, .. }) => {
                    1 + walk(nodes, *left).max(walk(nodes, *right))
                }
                _ => 0,
            }
        }
        walk(&self.nodes, 0)
    }

    /// Children must sit after their parent in the arena, which rules out
    /// cycles and keeps traversal finite
    fn is_well_formed(&self) -> bool {
        let len = self.nodes.len();
        len > 0
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                Node::Leaf { value } => (0.0..=1.0).contains(value),
                Node::Split { left, right, .. } => {
                    *left > i && *right > i && *left < len && *right < len
                }
            })
    }
}

struct TreeBuilder<'a> {
    x: ArrayView2<'a, f64>,
    y: &'a [f64],
    params: &'a ForestParams,
    features_per_split: usize,
    rng: StdRng,
    nodes: Vec<Node>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

impl<'a> TreeBuilder<'a> {
    fn build(mut self, mut indices: Vec<usize>) -> DecisionTree {
        self.grow(&mut indices, 0);
        DecisionTree { nodes: self.nodes }
    }

    fn grow(&mut self, indices: &mut [usize], depth: usize) -> usize {
        let n = indices.len();
        let positives: f64 = indices.iter().map(|&i| self.y[i]).sum();
        let value = if n == 0 { 0.0 } else { positives / n as f64 };

        let pure = positives == 0.0 || positives == n as f64;
        if depth >= self.params.max_depth || n < self.params.min_samples_split || pure {
            return self.push(Node::Leaf { value });
        }

        let Some(split) = self.best_split(indices) else {
            return self.push(Node::Leaf { value });
        };

        let feature = split.feature;
        indices.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));
        let cut = indices.partition_point(|&i| self.x[[i, feature]] <= split.threshold);

        // Reserve the slot so children land after their parent
        let slot = self.push(Node::Leaf { value });
        let (left_indices, right_indices) = indices.split_at_mut(cut);
        let left = self.grow(left_indices, depth + 1);
        let right = self.grow(right_indices, depth + 1);
        self.nodes[slot] = Node::Split {
            feature,
            threshold: split.threshold,
            left,
            right,
        };
        slot
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Draws features in random order until enough non-constant ones have
    /// been evaluated; constant features do not count towards the budget.
    fn best_split(&mut self, indices: &[usize]) -> Option<SplitCandidate> {
        let mut features: Vec<usize> = (0..self.x.ncols()).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<SplitCandidate> = None;
        let mut evaluated = 0;
        let mut column: Vec<(f64, f64)> = Vec::with_capacity(indices.len());

        for feature in features {
            if evaluated >= self.features_per_split {
                break;
            }

            column.clear();
            column.extend(indices.iter().map(|&i| (self.x[[i, feature]], self.y[i])));
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let (Some(first), Some(last)) = (column.first(), column.last()) else {
                continue;
            };
            if first.0 == last.0 {
                continue;
            }
            evaluated += 1;

            if let Some(candidate) = self.scan_feature(feature, &column) {
                if best.as_ref().map_or(true, |b| candidate.impurity < b.impurity) {
                    best = Some(candidate);
                }
            }
        }

        best
    }

    /// Sweep sorted `(value, label)` pairs for the lowest weighted Gini
    fn scan_feature(&self, feature: usize, column: &[(f64, f64)]) -> Option<SplitCandidate> {
        let n = column.len();
        let total_positive: f64 = column.iter().map(|(_, y)| y).sum();
        let min_leaf = self.params.min_samples_leaf.max(1);

        let mut left_positive = 0.0;
        let mut best: Option<SplitCandidate> = None;

        for i in 0..n - 1 {
            left_positive += column[i].1;
            let (lower, upper) = (column[i].0, column[i + 1].0);
            if lower == upper {
                continue;
            }

            let n_left = i + 1;
            let n_right = n - n_left;
            if n_left < min_leaf || n_right < min_leaf {
                continue;
            }

            let impurity = n_left as f64 * gini(left_positive, n_left)
                + n_right as f64 * gini(total_positive - left_positive, n_right);

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = lower + (upper - lower) / 2.0;
                if threshold >= upper {
                    threshold = lower;
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
}

fn gini(positives: f64, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives / n as f64;
    2.0 * p * (1.0 - p)
}

/// Fitted ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub params: ForestParams,
    pub n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit on a `(samples, features)` matrix and 0/1 labels
    ///
    /// Callers validate shapes and labels; an empty matrix yields trees that
    /// always predict 0.
    pub fn fit(x: ArrayView2<'_, f64>, labels: &[u8], params: ForestParams) -> Self {
        let n_samples = x.nrows();
        let y: Vec<f64> = labels.iter().map(|&l| f64::from(l.min(1))).collect();
        let features_per_split = params.features_per_split(x.ncols());
        let mut master = StdRng::seed_from_u64(params.seed);

        let trees = (0..params.n_trees)
            .map(|_| {
                let mut rng = StdRng::seed_from_u64(master.gen());
                let bootstrap: Vec<usize> = if n_samples == 0 {
                    Vec::new()
                } else {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                };

                TreeBuilder {
                    x: x.reborrow(),
                    y: &y,
                    params: &params,
                    features_per_split,
                    rng,
                    nodes: Vec::new(),
                }
                .build(bootstrap)
            })
            .collect();

        tracing::debug!(
            trees = params.n_trees,
            samples = n_samples,
            features = x.ncols(),
            features_per_split,
            "Random forest fitted"
        );

        Self {
            params,
            n_features: x.ncols(),
            trees,
        }
    }

    /// Mean positive-class probability across trees
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    /// Probabilities for every row of a matrix
    pub fn predict_proba_batch(&self, x: ArrayView2<'_, f64>) -> Vec<f64> {
        x.rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.predict_proba(slice),
                None => self.predict_proba(&row.to_vec()),
            })
            .collect()
    }

    /// Hard 0/1 prediction, positive when probability exceeds 0.5
    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) > 0.5)
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Structural sanity check for deserialized models
    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(DecisionTree::is_well_formed)
    }
}
