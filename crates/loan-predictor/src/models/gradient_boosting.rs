//! Gradient boosted regression trees on the binary log-loss.
//!
//! Starts from the prior log-odds and adds shallow trees fitted to the
//! negative gradient `y - p`. Each leaf takes the Newton step
//! `sum(y - p) / sum(p·(1 - p))` over its rows, shrunk by the learning rate.

use super::tree::{RegressionTree, TreeParams, validate_ensemble};
use super::{BinaryClassifier, normalize, sigmoid};
use crate::config::BoostingParams;
use ndarray::{Array1, ArrayView1, ArrayView2, Zip};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const PRIOR_EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoosting {
    base_score: f64,
    learning_rate: f64,
    trees: Vec<RegressionTree>,
    n_features: usize,
    importance: Array1<f64>,
}

impl GradientBoosting {
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>, params: &BoostingParams, seed: u64) -> Self {
        let n_rows = x.nrows();
        let n_features = x.ncols();

        let positive_rate = (y.sum() / n_rows as f64).clamp(PRIOR_EPS, 1.0 - PRIOR_EPS);
        let base_score = (positive_rate / (1.0 - positive_rate)).ln();

        let tree_params = TreeParams {
            max_depth: Some(params.max_depth),
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: n_features,
        };

        // Every feature is scanned per split, so the generator only breaks exact gain ties
        let mut rng = StdRng::seed_from_u64(seed);
        let mut raw = Array1::from_elem(n_rows, base_score);
        let mut trees = Vec::with_capacity(params.n_estimators);
        let mut importance = Array1::<f64>::zeros(n_features);
        let mut gradients = vec![0.0; n_rows];
        let mut hessians = vec![0.0; n_rows];

        for _ in 0..params.n_estimators {
            for (i, (score, label)) in raw.iter().zip(y.iter()).enumerate() {
                let p = sigmoid(*score);
                gradients[i] = label - p;
                hessians[i] = p * (1.0 - p);
            }

            let grown = RegressionTree::grow(
                x,
                &gradients,
                &hessians,
                (0..n_rows).collect(),
                &tree_params,
                &mut rng,
            );

            Zip::from(&mut raw).and(x.rows()).for_each(|score, row| {
                *score += params.learning_rate * grown.tree.predict_row(row);
            });

            importance += &Array1::from(grown.importance);
            trees.push(grown.tree);
        }

        let train_loss = raw
            .iter()
            .zip(y.iter())
            .map(|(score, label)| {
                let p = sigmoid(*score).clamp(PRIOR_EPS, 1.0 - PRIOR_EPS);
                -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
            })
            .sum::<f64>()
            / n_rows as f64;
        debug!(
            "gradient boosting fitted {} rounds, train log-loss {:.4}",
            trees.len(),
            train_loss
        );

        Self {
            base_score,
            learning_rate: params.learning_rate,
            trees,
            n_features,
            importance: normalize(importance),
        }
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(self.base_score.is_finite() && self.learning_rate.is_finite()) {
            return Err("boosting has a non-finite base score or learning rate".to_string());
        }
        validate_ensemble(&self.trees, self.n_features, self.importance.len())
    }

    /// Raw additive score (log-odds) for one row.
    fn raw_score(&self, row: ArrayView1<f64>) -> f64 {
        self.trees.iter().fold(self.base_score, |acc, tree| {
            acc + self.learning_rate * tree.predict_row(row)
        })
    }
}

impl BinaryClassifier for GradientBoosting {
    fn predict_probability(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.rows()
            .into_iter()
            .map(|row| sigmoid(self.raw_score(row)))
            .collect()
    }

    fn feature_importance(&self) -> Option<Array1<f64>> {
        Some(self.importance.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::separable;

    #[test]
    fn test_base_score_is_prior_log_odds() {
        let (x, mut y) = separable();
        y[0] = 1.0;
        let model = GradientBoosting::fit(
            x.view(),
            y.view(),
            &BoostingParams {
                n_estimators: 1,
                ..BoostingParams::default()
            },
            0,
        );
        assert!((model.base_score() - (6.0_f64 / 4.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_more_rounds_sharpen_probabilities() {
        let (x, y) = separable();
        let few = GradientBoosting::fit(
            x.view(),
            y.view(),
            &BoostingParams {
                n_estimators: 5,
                ..BoostingParams::default()
            },
            0,
        );
        let many = GradientBoosting::fit(x.view(), y.view(), &BoostingParams::default(), 0);

        let p_few = few.predict_probability(x.view());
        let p_many = many.predict_probability(x.view());
        assert!(p_many[9] > p_few[9]);
        assert!(p_many[0] < p_few[0]);
    }

    #[test]
    fn test_importance_normalized() {
        let (x, y) = separable();
        let model = GradientBoosting::fit(x.view(), y.view(), &BoostingParams::default(), 0);
        let importance = model.feature_importance().unwrap();
        assert!((importance.sum() - 1.0).abs() < 1e-9);
        assert!(importance[0] > importance[1]);
    }
}
