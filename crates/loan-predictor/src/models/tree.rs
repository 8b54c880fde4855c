//! CART regression tree shared by the forest and the boosted ensemble.
//!
//! Splits maximise the reduction in squared error of the per-row targets.
//! On `0/1` targets this ranks splits exactly like Gini impurity, so the
//! same builder serves classification trees. Leaf values are
//! `sum(target) / sum(hessian)`: with unit hessians that is the mean target,
//! with log-loss hessians it is the Newton step.

use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

const MIN_GAIN: f64 = 1e-10;
const MIN_HESSIAN: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split before accepting the best valid one.
    pub max_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A fitted tree stored as a flat node list; the root is node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<Node>,
}

/// Fitted tree together with the squared-error reduction credited to each feature.
pub(crate) struct GrownTree {
    pub tree: RegressionTree,
    pub importance: Vec<f64>,
}

impl RegressionTree {
    /// Grow a tree on the given `rows` (duplicates allowed, as in a bootstrap sample).
    pub(crate) fn grow<R: Rng>(
        x: ArrayView2<f64>,
        targets: &[f64],
        hessians: &[f64],
        rows: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> GrownTree {
        let mut builder = TreeBuilder {
            x,
            targets,
            hessians,
            params,
            rng,
            nodes: Vec::new(),
            importance: vec![0.0; x.ncols()],
        };
        builder.build(rows, 0);

        GrownTree {
            tree: RegressionTree {
                nodes: builder.nodes,
            },
            importance: builder.importance,
        }
    }

    /// Leaf value reached by one feature row.
    pub fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Check that every split reads a feature below `n_features` and points
    /// forward to existing nodes, so traversal always terminates in bounds.
    pub(crate) fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(format!("node {} has a non-finite leaf value", index));
                    }
                }
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} of {}",
                            index, feature, n_features
                        ));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has a NaN threshold", index));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(format!(
                                "node {} points to child {} outside ({}, {})",
                                index,
                                child,
                                index,
                                self.nodes.len()
                            ));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match &nodes[index] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Structural checks shared by the tree ensembles.
pub(crate) fn validate_ensemble(
    trees: &[RegressionTree],
    n_features: usize,
    importance_len: usize,
) -> Result<(), String> {
    if trees.is_empty() {
        return Err("ensemble has no trees".to_string());
    }
    if n_features == 0 {
        return Err("ensemble has no input features".to_string());
    }
    if importance_len != n_features {
        return Err(format!(
            "importance has {} entries for {} features",
            importance_len, n_features
        ));
    }
    for (i, tree) in trees.iter().enumerate() {
        tree.validate(n_features)
            .map_err(|reason| format!("tree {}: {}", i, reason))?;
    }
    Ok(())
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a, 'x, R> {
    x: ArrayView2<'x, f64>,
    targets: &'a [f64],
    hessians: &'a [f64],
    params: &'a TreeParams,
    rng: &'a mut R,
    nodes: Vec<Node>,
    importance: Vec<f64>,
}

impl<R: Rng> TreeBuilder<'_, '_, R> {
    fn build(&mut self, rows: Vec<usize>, depth: usize) -> usize {
        let index = self.nodes.len();
        self.nodes.push(Node::Leaf {
            value: self.leaf_value(&rows),
        });

        let depth_reached = self.params.max_depth.is_some_and(|max| depth >= max);
        if depth_reached || rows.len() < self.params.min_samples_split || self.is_pure(&rows) {
            return index;
        }

        let Some(split) = self.best_split(&rows) else {
            return index;
        };

        self.importance[split.feature] += split.gain;

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| self.x[[r, split.feature]] <= split.threshold);

        let left = self.build(left_rows, depth + 1);
        let right = self.build(right_rows, depth + 1);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        index
    }

    fn leaf_value(&self, rows: &[usize]) -> f64 {
        let sum_target: f64 = rows.iter().map(|&r| self.targets[r]).sum();
        let sum_hessian: f64 = rows.iter().map(|&r| self.hessians[r]).sum();
        if sum_hessian.abs() < MIN_HESSIAN {
            0.0
        } else {
            sum_target / sum_hessian
        }
    }

    fn is_pure(&self, rows: &[usize]) -> bool {
        let first = self.targets[rows[0]];
        rows.iter().all(|&r| self.targets[r] == first)
    }

    /// Scan features in random order; stop after `max_features` once a valid split exists.
    fn best_split(&mut self, rows: &[usize]) -> Option<SplitCandidate> {
        let n_features = self.x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        if self.params.max_features < n_features {
            features.shuffle(&mut *self.rng);
        }

        let n = rows.len();
        let total: f64 = rows.iter().map(|&r| self.targets[r]).sum();
        let parent_score = total * total / n as f64;
        let min_leaf = self.params.min_samples_leaf;

        let mut best: Option<SplitCandidate> = None;
        let mut sorted: Vec<(f64, f64)> = Vec::with_capacity(n);

        for (visited, &feature) in features.iter().enumerate() {
            if visited >= self.params.max_features && best.is_some() {
                break;
            }

            sorted.clear();
            sorted.extend(rows.iter().map(|&r| (self.x[[r, feature]], self.targets[r])));
            sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_sum = 0.0;
            for i in 0..n - 1 {
                left_sum += sorted[i].1;
                let (value, next) = (sorted[i].0, sorted[i + 1].0);
                if value == next {
                    continue;
                }

                let n_left = i + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let right_sum = total - left_sum;
                let gain = left_sum * left_sum / n_left as f64
                    + right_sum * right_sum / n_right as f64
                    - parent_score;

                if gain > MIN_GAIN && best.as_ref().is_none_or(|b| gain > b.gain) {
                    let mid = value + (next - value) / 2.0;
                    let threshold = if mid < next { mid } else { value };
                    best = Some(SplitCandidate {
                        feature,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn params(max_depth: Option<usize>) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: 2,
        }
    }

    #[test]
    fn test_fits_step_function() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
        let targets = [0.0, 0.0, 1.0, 1.0];
        let hessians = [1.0; 4];
        let mut rng = StdRng::seed_from_u64(0);

        let grown = RegressionTree::grow(
            x.view(),
            &targets,
            &hessians,
            (0..4).collect(),
            &params(None),
            &mut rng,
        );

        assert_eq!(grown.tree.depth(), 1);
        assert_eq!(grown.tree.predict_row(array![1.5, 5.0].view()), 0.0);
        assert_eq!(grown.tree.predict_row(array![3.5, 5.0].view()), 1.0);
        // Constant second feature can never split
        assert_eq!(grown.importance[1], 0.0);
        assert!(grown.importance[0] > 0.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let targets = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let hessians = [1.0; 6];
        let mut rng = StdRng::seed_from_u64(0);
        let single = TreeParams {
            max_features: 1,
            ..params(Some(1))
        };

        let grown = RegressionTree::grow(
            x.view(),
            &targets,
            &hessians,
            (0..6).collect(),
            &single,
            &mut rng,
        );

        assert!(grown.tree.depth() <= 1);
        assert!(grown.tree.n_nodes() <= 3);
    }

    #[test]
    fn test_leaf_value_uses_hessians() {
        let x = array![[1.0], [2.0]];
        let targets = [0.5, 0.5];
        let hessians = [0.25, 0.25];
        let mut rng = StdRng::seed_from_u64(0);

        let grown = RegressionTree::grow(
            x.view(),
            &targets,
            &hessians,
            vec![0, 1],
            &params(None),
            &mut rng,
        );

        // Pure node: single Newton leaf of 1.0 / 0.5
        assert_eq!(grown.tree.n_nodes(), 1);
        assert_eq!(grown.tree.predict_row(array![1.0].view()), 2.0);
    }

    #[test]
    fn test_validate_checks_node_structure() {
        let x = array![[1.0, 5.0], [2.0, 5.0], [3.0, 5.0], [4.0, 5.0]];
        let mut rng = StdRng::seed_from_u64(0);
        let grown = RegressionTree::grow(
            x.view(),
            &[0.0, 0.0, 1.0, 1.0],
            &[1.0; 4],
            (0..4).collect(),
            &params(None),
            &mut rng,
        );
        assert!(grown.tree.validate(2).is_ok());
        assert!(grown.tree.validate(0).is_err());

        let out_of_range = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature: 999,
                    threshold: 0.5,
                    left: 1,
                    right: 2,
                },
                Node::Leaf { value: 0.0 },
                Node::Leaf { value: 1.0 },
            ],
        };
        assert!(out_of_range.validate(2).unwrap_err().contains("feature 999"));

        let cycle = RegressionTree {
            nodes: vec![
                Node::Split {
                    feature: 0,
                    threshold: 0.5,
                    left: 0,
                    right: 1,
                },
                Node::Leaf { value: 1.0 },
            ],
        };
        assert!(cycle.validate(2).is_err());

        let dangling = RegressionTree {
            nodes: vec![Node::Split {
                feature: 0,
                threshold: 0.5,
                left: 1,
                right: 2,
            }],
        };
        assert!(dangling.validate(2).is_err());
        assert!(RegressionTree { nodes: Vec::new() }.validate(2).is_err());
    }
}
