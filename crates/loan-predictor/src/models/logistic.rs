//! L2-regularised logistic regression.
//!
//! Fitted with `linfa-logistic` (L-BFGS on the summed log-loss plus
//! `||w||² / (2·C)`). Only the learned coefficients are kept, so the model
//! serializes as a plain weight vector and intercept.

use super::{BinaryClassifier, sigmoid};
use crate::config::LogisticParams;
use crate::error::{LoanPredictorError, Result};
use linfa::Dataset;
use linfa::traits::Fit;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    weights: Array1<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>, params: &LogisticParams) -> Result<Self> {
        // Class 1 is the larger label, so linfa reports its probability.
        let labels: Array1<usize> = y.iter().map(|v| usize::from(*v == 1.0)).collect();
        let dataset = Dataset::new(x.to_owned(), labels);

        let fitted = linfa_logistic::LogisticRegression::default()
            .alpha(1.0 / params.c)
            .max_iterations(params.max_iter as u64)
            .gradient_tolerance(params.tolerance)
            .fit(&dataset)
            .map_err(|e| LoanPredictorError::TrainingFailed(format!("logistic: {}", e)))?;

        let weights = fitted.params().to_owned();
        let intercept = fitted.intercept();
        debug!(
            "logistic regression fitted: intercept {:.4}, |w| {:.4}",
            intercept,
            weights.dot(&weights).sqrt()
        );

        Ok(Self { weights, intercept })
    }

    pub fn n_features(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Rejects coefficients that cannot produce a probability.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.weights.is_empty() {
            return Err("logistic model has no weights".to_string());
        }
        if !self.intercept.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err("logistic model has non-finite coefficients".to_string());
        }
        Ok(())
    }
}

impl BinaryClassifier for LogisticRegression {
    fn predict_probability(&self, x: ArrayView2<f64>) -> Array1<f64> {
        (x.dot(&self.weights) + self.intercept).mapv(sigmoid)
    }
}
