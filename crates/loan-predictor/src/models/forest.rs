//! Random forest of bootstrap CART trees.

use super::tree::{RegressionTree, TreeParams, validate_ensemble};
use super::{BinaryClassifier, normalize};
use crate::config::ForestParams;
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bagged classification trees.
///
/// Each tree sees a bootstrap sample of the rows and considers a random
/// subset of `sqrt(n_features)` features per split. The approval probability
/// is the mean over trees of the positive fraction in the reached leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<RegressionTree>,
    n_features: usize,
    importance: Array1<f64>,
}

impl RandomForest {
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>, params: &ForestParams, seed: u64) -> Self {
        let n_rows = x.nrows();
        let n_features = x.ncols();
        let targets = y.to_vec();
        let hessians = vec![1.0; n_rows];

        let tree_params = TreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: params
                .max_features
                .unwrap_or_else(|| (n_features as f64).sqrt().floor() as usize)
                .clamp(1, n_features),
        };

        let mut rng = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut importance = Array1::<f64>::zeros(n_features);

        for _ in 0..params.n_estimators {
            let rows: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            let grown =
                RegressionTree::grow(x, &targets, &hessians, rows, &tree_params, &mut rng);

            importance += &normalize(Array1::from(grown.importance));
            trees.push(grown.tree);
        }

        let total_nodes: usize = trees.iter().map(RegressionTree::n_nodes).sum();
        debug!(
            "random forest grew {} trees ({} nodes, {} features per split)",
            trees.len(),
            total_nodes,
            tree_params.max_features
        );

        Self {
            trees,
            n_features,
            importance: normalize(importance),
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        validate_ensemble(&self.trees, self.n_features, self.importance.len())
    }
}

impl BinaryClassifier for RandomForest {
    fn predict_probability(&self, x: ArrayView2<f64>) -> Array1<f64> {
        let n_trees = self.trees.len() as f64;
        x.rows()
            .into_iter()
            .map(|row| {
                let votes: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
                (votes / n_trees).clamp(0.0, 1.0)
            })
            .collect()
    }

    fn feature_importance(&self) -> Option<Array1<f64>> {
        Some(self.importance.clone())
    }
}
