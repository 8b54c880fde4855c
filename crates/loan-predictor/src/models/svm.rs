//! C-support vector classifier with an RBF kernel.
//!
//! Backed by `linfa-svm`. Fitting against `Pr` targets makes linfa calibrate
//! a Platt sigmoid on the decision values, so the fitted model emits the
//! approval probability directly.

use super::BinaryClassifier;
use crate::config::SvmParams;
use crate::error::{LoanPredictorError, Result};
use linfa::Dataset;
use linfa::dataset::Pr;
use linfa::traits::{Fit, Predict};
use linfa_svm::Svm;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorClassifier {
    model: Svm<f64, Pr>,
    n_features: usize,
    gamma: f64,
}

impl SupportVectorClassifier {
    pub fn fit(x: ArrayView2<f64>, y: ArrayView1<f64>, params: &SvmParams) -> Result<Self> {
        let gamma = params.gamma.unwrap_or_else(|| scale_gamma(x));
        let targets: Array1<bool> = y.iter().map(|v| *v == 1.0).collect();
        let dataset = Dataset::new(x.to_owned(), targets);

        // linfa's Gaussian kernel is exp(-|a - b|² / eps)
        let svm_params = Svm::<f64, Pr>::params()
            .eps(params.tolerance)
            .pos_neg_weights(params.c, params.c)
            .gaussian_kernel(1.0 / gamma);

        let model = Fit::fit(&svm_params, &dataset)
            .map_err(|e| LoanPredictorError::TrainingFailed(format!("svm: {}", e)))?;

        debug!(
            "svm fitted with {} support vectors (gamma {:.5})",
            model.nsupport(),
            gamma
        );

        Ok(Self {
            model,
            n_features: x.ncols(),
            gamma,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_support_vectors(&self) -> usize {
        self.model.nsupport()
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Rejects solver state that cannot have come from a fit.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        if self.n_features == 0 {
            return Err("svm has no input features".to_string());
        }
        if !(self.gamma.is_finite() && self.gamma > 0.0) {
            return Err(format!("svm gamma must be positive, got {}", self.gamma));
        }
        if self.model.alpha.is_empty() {
            return Err("svm has no dual coefficients".to_string());
        }
        if !self.model.rho.is_finite() || self.model.alpha.iter().any(|a| !a.is_finite()) {
            return Err("svm has non-finite dual coefficients".to_string());
        }
        Ok(())
    }
}

impl BinaryClassifier for SupportVectorClassifier {
    fn predict_probability(&self, x: ArrayView2<f64>) -> Array1<f64> {
        let probabilities: Array1<Pr> = self.model.predict(&x);
        probabilities.mapv(|p| f64::from(*p).clamp(0.0, 1.0))
    }
}

/// `1 / (n_features · Var(X))` over every element of the training matrix.
fn scale_gamma(x: ArrayView2<f64>) -> f64 {
    let n = x.len() as f64;
    let mean = x.sum() / n;
    let variance = x.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    if variance > 0.0 {
        1.0 / (x.ncols() as f64 * variance)
    } else {
        1.0
    }
}
