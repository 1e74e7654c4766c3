//! Gradient-boosted regression trees.

use std::collections::BinaryHeap;

use crate::error::{Error, Result};

use super::Regressor;

/// L2 regularization on leaf weights.
const REG_LAMBDA: f64 = 1.0;

/// The order in which tree nodes are expanded during construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrowPolicy {
    /// Split nodes closest to the root first (depth-first by level).
    Depthwise,
    /// Split the node with the highest loss reduction first (best-first).
    Lossguide,
}

/// Hyperparameters of a gradient-boosted-trees regressor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoostedTreesConfig {
    /// Maximum depth of each tree.
    pub max_depth: usize,
    /// Number of boosting rounds (trees).
    pub n_estimators: usize,
    /// Learning rate (shrinkage) applied to each tree's contribution.
    pub eta: f64,
    /// Minimum loss reduction required to make a split.
    pub gamma: f64,
    /// Node expansion order.
    pub grow_policy: GrowPolicy,
}

/// Gradient-boosted regression trees with a squared-error objective.
///
/// Boosting starts from the training-target mean and fits each tree to the
/// negative gradients of the current predictions. Splits maximize the
/// second-order gain with L2-regularized leaf weights; a split is kept only
/// when its gain exceeds the minimum loss reduction `gamma`.
#[derive(Clone, Debug)]
pub struct BoostedTrees {
    config: BoostedTreesConfig,
    fitted: Option<Ensemble>,
}

#[derive(Clone, Debug)]
struct Ensemble {
    base_score: f64,
    trees: Vec<RegressionTree>,
}

#[derive(Clone, Debug)]
struct RegressionTree {
    nodes: Vec<TreeNode>,
}

#[derive(Clone, Debug)]
enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        weight: f64,
    },
}

/// A candidate split of one node.
#[derive(Clone, Debug)]
struct SplitCandidate {
    gain: f64,
    feature: usize,
    threshold: f64,
}

/// Heap entry for loss-guided growth, ordered by gain.
struct Expansion {
    candidate: SplitCandidate,
    node_slot: usize,
    indices: Vec<usize>,
    depth: usize,
}

impl PartialEq for Expansion {
    fn eq(&self, other: &Self) -> bool {
        self.candidate.gain == other.candidate.gain
    }
}

impl Eq for Expansion {}

impl PartialOrd for Expansion {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Expansion {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.candidate
            .gain
            .partial_cmp(&other.candidate.gain)
            .unwrap_or(core::cmp::Ordering::Equal)
    }
}

impl BoostedTrees {
    /// Creates an unfitted regressor with the given hyperparameters.
    #[must_use]
    pub fn new(config: BoostedTreesConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }

    /// Returns the hyperparameters this model was built with.
    #[must_use]
    pub fn config(&self) -> &BoostedTreesConfig {
        &self.config
    }

    /// Optimal leaf weight for the gradient sum `g` over `h` samples.
    #[allow(clippy::cast_precision_loss)]
    fn leaf_weight(gradient_sum: f64, n_samples: usize) -> f64 {
        -gradient_sum / (n_samples as f64 + REG_LAMBDA)
    }

    /// Loss reduction of a node's gradient statistics.
    #[allow(clippy::cast_precision_loss)]
    fn node_score(gradient_sum: f64, n_samples: usize) -> f64 {
        gradient_sum * gradient_sum / (n_samples as f64 + REG_LAMBDA)
    }

    /// Finds the best split of `indices`, if any exceeds the minimum loss
    /// reduction.
    fn best_split(
        x: &[Vec<f64>],
        gradients: &[f64],
        indices: &[usize],
        min_split_loss: f64,
    ) -> Option<SplitCandidate> {
        if indices.len() < 2 {
            return None;
        }

        let n_features = x[indices[0]].len();
        let total_gradient: f64 = indices.iter().map(|&i| gradients[i]).sum();
        let parent_score = Self::node_score(total_gradient, indices.len());

        let mut best: Option<SplitCandidate> = None;

        for feature in 0..n_features {
            let mut column: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (x[i][feature], gradients[i]))
                .collect();
            column.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(core::cmp::Ordering::Equal));

            let mut left_gradient = 0.0;
            for split_at in 1..column.len() {
                left_gradient += column[split_at - 1].1;

                // Only positions between distinct feature values are valid.
                if column[split_at].0 <= column[split_at - 1].0 {
                    continue;
                }

                let right_gradient = total_gradient - left_gradient;
                let gain = 0.5
                    * (Self::node_score(left_gradient, split_at)
                        + Self::node_score(right_gradient, column.len() - split_at)
                        - parent_score)
                    - min_split_loss;

                if gain > 0.0 && best.as_ref().is_none_or(|b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        gain,
                        feature,
                        threshold: (column[split_at - 1].0 + column[split_at].0) / 2.0,
                    });
                }
            }
        }

        best
    }

    fn partition(
        x: &[Vec<f64>],
        indices: &[usize],
        feature: usize,
        threshold: f64,
    ) -> (Vec<usize>, Vec<usize>) {
        let mut left = Vec::new();
        let mut right = Vec::new();
        for &i in indices {
            if x[i][feature] < threshold {
                left.push(i);
            } else {
                right.push(i);
            }
        }
        (left, right)
    }

    fn build_tree(&self, x: &[Vec<f64>], gradients: &[f64]) -> RegressionTree {
        let indices: Vec<usize> = (0..x.len()).collect();
        let mut nodes = Vec::new();

        match self.config.grow_policy {
            GrowPolicy::Depthwise => {
                self.expand_depthwise(x, gradients, &indices, 0, &mut nodes);
            }
            GrowPolicy::Lossguide => {
                self.expand_lossguide(x, gradients, indices, &mut nodes);
            }
        }

        RegressionTree { nodes }
    }

    /// Depth-first expansion: split every node until the depth limit or the
    /// gain threshold stops it.
    fn expand_depthwise(
        &self,
        x: &[Vec<f64>],
        gradients: &[f64],
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<TreeNode>,
    ) -> usize {
        let gradient_sum: f64 = indices.iter().map(|&i| gradients[i]).sum();

        let candidate = if depth < self.config.max_depth {
            Self::best_split(x, gradients, indices, self.config.gamma)
        } else {
            None
        };

        let Some(candidate) = candidate else {
            nodes.push(TreeNode::Leaf {
                weight: Self::leaf_weight(gradient_sum, indices.len()),
            });
            return nodes.len() - 1;
        };

        let (left_indices, right_indices) =
            Self::partition(x, indices, candidate.feature, candidate.threshold);

        let slot = nodes.len();
        nodes.push(TreeNode::Split {
            feature: candidate.feature,
            threshold: candidate.threshold,
            left: 0,
            right: 0,
        });

        let left = self.expand_depthwise(x, gradients, &left_indices, depth + 1, nodes);
        let right = self.expand_depthwise(x, gradients, &right_indices, depth + 1, nodes);

        nodes[slot] = TreeNode::Split {
            feature: candidate.feature,
            threshold: candidate.threshold,
            left,
            right,
        };
        slot
    }

    /// Best-first expansion: always split the leaf with the highest gain next.
    fn expand_lossguide(
        &self,
        x: &[Vec<f64>],
        gradients: &[f64],
        indices: Vec<usize>,
        nodes: &mut Vec<TreeNode>,
    ) {
        let gradient_sum: f64 = indices.iter().map(|&i| gradients[i]).sum();
        nodes.push(TreeNode::Leaf {
            weight: Self::leaf_weight(gradient_sum, indices.len()),
        });

        let mut heap = BinaryHeap::new();
        if let Some(candidate) = Self::best_split(x, gradients, &indices, self.config.gamma) {
            heap.push(Expansion {
                candidate,
                node_slot: 0,
                indices,
                depth: 0,
            });
        }

        while let Some(expansion) = heap.pop() {
            let (left_indices, right_indices) = Self::partition(
                x,
                &expansion.indices,
                expansion.candidate.feature,
                expansion.candidate.threshold,
            );

            let left_sum: f64 = left_indices.iter().map(|&i| gradients[i]).sum();
            let right_sum: f64 = right_indices.iter().map(|&i| gradients[i]).sum();

            let left_slot = nodes.len();
            nodes.push(TreeNode::Leaf {
                weight: Self::leaf_weight(left_sum, left_indices.len()),
            });
            let right_slot = nodes.len();
            nodes.push(TreeNode::Leaf {
                weight: Self::leaf_weight(right_sum, right_indices.len()),
            });

            nodes[expansion.node_slot] = TreeNode::Split {
                feature: expansion.candidate.feature,
                threshold: expansion.candidate.threshold,
                left: left_slot,
                right: right_slot,
            };

            let child_depth = expansion.depth + 1;
            if child_depth < self.config.max_depth {
                for (child_slot, child_indices) in
                    [(left_slot, left_indices), (right_slot, right_indices)]
                {
                    if let Some(candidate) =
                        Self::best_split(x, gradients, &child_indices, self.config.gamma)
                    {
                        heap.push(Expansion {
                            candidate,
                            node_slot: child_slot,
                            indices: child_indices,
                            depth: child_depth,
                        });
                    }
                }
            }
        }
    }
}

impl RegressionTree {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = 0;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { weight } => return *weight,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl Regressor for BoostedTrees {
    #[allow(clippy::cast_precision_loss)]
    fn fit(&mut self, x: &[Vec<f64>], y: &[f64]) -> Result<()> {
        if x.len() != y.len() {
            return Err(Error::SampleCountMismatch {
                features: x.len(),
                targets: y.len(),
            });
        }
        let n = x.len();
        if n == 0 {
            return Err(Error::EmptyTrainingSet);
        }

        let base_score = y.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base_score; n];
        let mut trees = Vec::with_capacity(self.config.n_estimators);

        for _ in 0..self.config.n_estimators {
            // Gradient of the squared-error objective at the current predictions.
            let gradients: Vec<f64> = predictions
                .iter()
                .zip(y)
                .map(|(pred, target)| pred - target)
                .collect();

            let tree = self.build_tree(x, &gradients);

            for (prediction, row) in predictions.iter_mut().zip(x) {
                *prediction += self.config.eta * tree.predict_row(row);
            }
            trees.push(tree);
        }

        self.fitted = Some(Ensemble { base_score, trees });
        Ok(())
    }

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<f64>> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;

        Ok(x.iter()
            .map(|row| {
                let tree_sum: f64 = fitted
                    .trees
                    .iter()
                    .map(|tree| tree.predict_row(row))
                    .sum();
                fitted.base_score + self.config.eta * tree_sum
            })
            .collect())
    }
}
