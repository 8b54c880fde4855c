//! Candidate classifiers and the model registry.
//!
//! The registry is a closed set: [`ModelKind`] names each entry and
//! [`Classifier`] holds a fitted model of one kind. Every classifier works on
//! a dense `f64` feature matrix with `0.0` / `1.0` labels and reports the
//! probability of the positive (approved) class.

pub mod forest;
pub mod gradient_boosting;
pub mod logistic;
pub mod svm;
pub(crate) mod tree;

use crate::config::PredictorConfig;
use crate::error::{LoanPredictorError, Result};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use forest::RandomForest;
pub use gradient_boosting::GradientBoosting;
pub use logistic::LogisticRegression;
pub use svm::SupportVectorClassifier;

// =============================================================================
// Registry
// =============================================================================

/// A registered model type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Logistic,
    RandomForest,
    GradientBoosting,
    Svm,
}

impl ModelKind {
    /// Every registered kind, in registration order.
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Logistic,
        ModelKind::RandomForest,
        ModelKind::GradientBoosting,
        ModelKind::Svm,
    ];

    /// Registry name used in results and persisted bundles.
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Logistic => "logistic",
            ModelKind::RandomForest => "random_forest",
            ModelKind::GradientBoosting => "gradient_boosting",
            ModelKind::Svm => "svm",
        }
    }

    /// Whether the model must be trained and queried on standardized features.
    pub fn is_scale_sensitive(self) -> bool {
        matches!(self, ModelKind::Logistic | ModelKind::Svm)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = LoanPredictorError;

    fn from_str(s: &str) -> Result<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim().to_lowercase())
            .ok_or_else(|| {
                LoanPredictorError::InvalidConfig(format!(
                    "unknown model '{}'. Valid options: logistic, random_forest, gradient_boosting, svm",
                    s
                ))
            })
    }
}

// =============================================================================
// Fitted Classifier
// =============================================================================

/// Shared behaviour of every fitted model.
pub(crate) trait BinaryClassifier {
    /// Probability of the positive class for each row.
    fn predict_probability(&self, x: ArrayView2<f64>) -> Array1<f64>;

    /// Hard decision for each row.
    fn predict(&self, x: ArrayView2<f64>) -> Vec<bool> {
        self.predict_probability(x).iter().map(|p| *p > 0.5).collect()
    }

    /// Normalized per-feature importance, for models that track it.
    fn feature_importance(&self) -> Option<Array1<f64>> {
        None
    }
}

/// A fitted model of one registered kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    Logistic(LogisticRegression),
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
    Svm(SupportVectorClassifier),
}

impl Classifier {
    /// Fit a model of `kind` with the hyperparameters in `config`.
    ///
    /// `y` holds `1.0` for approved rows and `0.0` otherwise; both classes must be present.
    pub fn fit(
        kind: ModelKind,
        config: &PredictorConfig,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<Self> {
        check_training_input(kind, x, y)?;

        let model = match kind {
            ModelKind::Logistic => {
                Classifier::Logistic(LogisticRegression::fit(x, y, &config.logistic)?)
            }
            ModelKind::RandomForest => Classifier::RandomForest(RandomForest::fit(
                x,
                y,
                &config.forest,
                config.random_seed,
            )),
            ModelKind::GradientBoosting => Classifier::GradientBoosting(GradientBoosting::fit(
                x,
                y,
                &config.boosting,
                config.random_seed,
            )),
            ModelKind::Svm => Classifier::Svm(SupportVectorClassifier::fit(x, y, &config.svm)?),
        };
        Ok(model)
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Classifier::Logistic(_) => ModelKind::Logistic,
            Classifier::RandomForest(_) => ModelKind::RandomForest,
            Classifier::GradientBoosting(_) => ModelKind::GradientBoosting,
            Classifier::Svm(_) => ModelKind::Svm,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Number of input features the model was fitted on.
    pub fn n_features(&self) -> usize {
        match self {
            Classifier::Logistic(m) => m.n_features(),
            Classifier::RandomForest(m) => m.n_features(),
            Classifier::GradientBoosting(m) => m.n_features(),
            Classifier::Svm(m) => m.n_features(),
        }
    }

    /// Structural consistency of a deserialized model against its own
    /// feature count. Prediction may index out of bounds when this fails.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Classifier::Logistic(m) => m.validate(),
            Classifier::RandomForest(m) => m.validate(),
            Classifier::GradientBoosting(m) => m.validate(),
            Classifier::Svm(m) => m.validate(),
        }
    }

    /// Probability of approval for each row, in `[0, 1]`.
    pub fn predict_probability(&self, x: ArrayView2<f64>) -> Array1<f64> {
        self.as_classifier().predict_probability(x)
    }

    /// Approval decision for each row.
    pub fn predict(&self, x: ArrayView2<f64>) -> Vec<bool> {
        self.as_classifier().predict(x)
    }

    /// Normalized impurity-decrease importance; `None` for non-tree models.
    pub fn feature_importance(&self) -> Option<Array1<f64>> {
        self.as_classifier().feature_importance()
    }

    fn as_classifier(&self) -> &dyn BinaryClassifier {
        match self {
            Classifier::Logistic(m) => m,
            Classifier::RandomForest(m) => m,
            Classifier::GradientBoosting(m) => m,
            Classifier::Svm(m) => m,
        }
    }
}

fn check_training_input(kind: ModelKind, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(LoanPredictorError::TrainingFailed(format!(
            "{}: empty feature matrix",
            kind
        )));
    }
    if x.nrows() != y.len() {
        return Err(LoanPredictorError::TrainingFailed(format!(
            "{}: {} rows but {} labels",
            kind,
            x.nrows(),
            y.len()
        )));
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(LoanPredictorError::TrainingFailed(format!(
            "{}: feature matrix contains non-finite values",
            kind
        )));
    }
    let positives = y.iter().filter(|v| **v == 1.0).count();
    if positives == 0 || positives == y.len() {
        return Err(LoanPredictorError::TrainingFailed(format!(
            "{}: both classes must be present",
            kind
        )));
    }
    Ok(())
}

/// Numerically stable logistic function.
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Scale `values` to sum to one; all-zero input stays zero.
pub(crate) fn normalize(mut values: Array1<f64>) -> Array1<f64> {
    let total = values.sum();
    if total > 0.0 {
        values /= total;
    }
    values
}
