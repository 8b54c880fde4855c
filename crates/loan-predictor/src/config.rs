//! Configuration for the training pipeline.
//!
//! [`PredictorConfig`] holds the split ratio, seed, the registry subset to
//! train, and per-model hyperparameters. Use [`PredictorConfig::builder()`]
//! for validated construction.
//!
//! # Example
//!
//! ```
//! use loan_predictor::{ModelKind, PredictorConfig};
//!
//! let config = PredictorConfig::builder()
//!     .test_size(0.25)
//!     .random_seed(7)
//!     .models(vec![ModelKind::Logistic, ModelKind::RandomForest])
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::LoanPredictorError;
use crate::models::ModelKind;
use serde::{Deserialize, Serialize};

/// Hyperparameters for L2-regularised logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    /// Inverse regularisation strength (default: 1.0).
    pub c: f64,
    /// Maximum L-BFGS iterations (default: 100).
    pub max_iter: usize,
    /// Stop when the gradient norm falls below this (default: 1e-4).
    pub tolerance: f64,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 100,
            tolerance: 1e-4,
        }
    }
}

/// Hyperparameters for the random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    /// Number of bootstrap trees (default: 100).
    pub n_estimators: usize,
    /// Maximum tree depth; `None` grows until leaves are pure (default: None).
    pub max_depth: Option<usize>,
    /// Minimum samples required to split a node (default: 2).
    pub min_samples_split: usize,
    /// Minimum samples in each child (default: 1).
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` uses `sqrt(n_features)` (default: None).
    pub max_features: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// Hyperparameters for gradient boosted trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    /// Number of boosting rounds (default: 100).
    pub n_estimators: usize,
    /// Shrinkage applied to every tree (default: 0.1).
    pub learning_rate: f64,
    /// Depth of each regression tree (default: 3).
    pub max_depth: usize,
    /// Minimum samples required to split a node (default: 2).
    pub min_samples_split: usize,
    /// Minimum samples in each child (default: 1).
    pub min_samples_leaf: usize,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Hyperparameters for the RBF support vector classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmParams {
    /// Box constraint, applied to both classes (default: 1.0).
    pub c: f64,
    /// RBF width; `None` uses `1 / (n_features * Var(X))` (default: None).
    pub gamma: Option<f64>,
    /// Solver stopping tolerance (default: 1e-3).
    pub tolerance: f64,
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            gamma: None,
            tolerance: 1e-3,
        }
    }
}

/// Configuration for [`LoanPredictor`](crate::LoanPredictor).
///
/// # Validation
///
/// [`PredictorConfigBuilder::build`] checks:
/// - `test_size` is in `(0.0, 1.0)`
/// - `models` is non-empty and has no duplicates
/// - every hyperparameter count is at least 1 and every rate is positive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    /// Fraction of rows withheld for model selection (default: 0.2).
    pub test_size: f64,

    /// Seed for the split and for every stochastic model (default: 42).
    pub random_seed: u64,

    /// Registry entries to train, in registration order (default: all four).
    ///
    /// Ties in held-out accuracy go to the entry listed first.
    pub models: Vec<ModelKind>,

    pub logistic: LogisticParams,
    pub forest: ForestParams,
    pub boosting: BoostingParams,
    pub svm: SvmParams,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            random_seed: 42,
            models: ModelKind::ALL.to_vec(),
            logistic: LogisticParams::default(),
            forest: ForestParams::default(),
            boosting: BoostingParams::default(),
            svm: SvmParams::default(),
        }
    }
}

impl PredictorConfig {
    /// Create a new builder for `PredictorConfig`.
    #[must_use]
    pub fn builder() -> PredictorConfigBuilder {
        PredictorConfigBuilder::default()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), LoanPredictorError> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(LoanPredictorError::InvalidConfig(format!(
                "test_size must be between 0.0 and 1.0 (exclusive), got {}",
                self.test_size
            )));
        }

        if self.models.is_empty() {
            return Err(LoanPredictorError::InvalidConfig(
                "at least one model must be registered".to_string(),
            ));
        }

        for (i, kind) in self.models.iter().enumerate() {
            if self.models[..i].contains(kind) {
                return Err(LoanPredictorError::InvalidConfig(format!(
                    "model '{}' registered more than once",
                    kind
                )));
            }
        }

        let counts = [
            ("logistic.max_iter", self.logistic.max_iter),
            ("forest.n_estimators", self.forest.n_estimators),
            ("forest.min_samples_leaf", self.forest.min_samples_leaf),
            ("boosting.n_estimators", self.boosting.n_estimators),
            ("boosting.max_depth", self.boosting.max_depth),
            ("boosting.min_samples_leaf", self.boosting.min_samples_leaf),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(LoanPredictorError::InvalidConfig(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        if self.forest.min_samples_split < 2 || self.boosting.min_samples_split < 2 {
            return Err(LoanPredictorError::InvalidConfig(
                "min_samples_split must be at least 2".to_string(),
            ));
        }

        if self.forest.max_features == Some(0) {
            return Err(LoanPredictorError::InvalidConfig(
                "forest.max_features must be at least 1".to_string(),
            ));
        }

        let rates = [
            ("logistic.c", self.logistic.c),
            ("logistic.tolerance", self.logistic.tolerance),
            ("boosting.learning_rate", self.boosting.learning_rate),
            ("svm.c", self.svm.c),
            ("svm.tolerance", self.svm.tolerance),
            ("svm.gamma", self.svm.gamma.unwrap_or(1.0)),
        ];
        for (name, value) in rates {
            if !(value.is_finite() && value > 0.0) {
                return Err(LoanPredictorError::InvalidConfig(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Builder for [`PredictorConfig`].
#[derive(Debug, Clone, Default)]
pub struct PredictorConfigBuilder {
    config: PredictorConfig,
}

impl PredictorConfigBuilder {
    /// Set the held-out fraction.
    #[must_use]
    pub fn test_size(mut self, test_size: f64) -> Self {
        self.config.test_size = test_size;
        self
    }

    /// Set the random seed used for the split and stochastic models.
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Restrict the registry to these models, in this order.
    #[must_use]
    pub fn models(mut self, models: Vec<ModelKind>) -> Self {
        self.config.models = models;
        self
    }

    #[must_use]
    pub fn logistic(mut self, params: LogisticParams) -> Self {
        self.config.logistic = params;
        self
    }

    #[must_use]
    pub fn forest(mut self, params: ForestParams) -> Self {
        self.config.forest = params;
        self
    }

    #[must_use]
    pub fn boosting(mut self, params: BoostingParams) -> Self {
        self.config.boosting = params;
        self
    }

    #[must_use]
    pub fn svm(mut self, params: SvmParams) -> Self {
        self.config.svm = params;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> Result<PredictorConfig, LoanPredictorError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PredictorConfig::default();
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.random_seed, 42);
        assert_eq!(config.models, ModelKind::ALL.to_vec());
        assert_eq!(config.forest.n_estimators, 100);
        assert_eq!(config.boosting.max_depth, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = PredictorConfig::builder()
            .test_size(0.3)
            .random_seed(1)
            .models(vec![ModelKind::GradientBoosting])
            .build()
            .unwrap();

        assert_eq!(config.test_size, 0.3);
        assert_eq!(config.random_seed, 1);
        assert_eq!(config.models, vec![ModelKind::GradientBoosting]);
    }

    #[test]
    fn test_invalid_test_size() {
        for size in [0.0, 1.0, -0.1, f64::NAN] {
            let result = PredictorConfig::builder().test_size(size).build();
            assert!(matches!(result, Err(LoanPredictorError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_empty_and_duplicate_models_rejected() {
        assert!(PredictorConfig::builder().models(vec![]).build().is_err());
        assert!(
            PredictorConfig::builder()
                .models(vec![ModelKind::Svm, ModelKind::Svm])
                .build()
                .is_err()
        );
    }

    #[test]
    fn test_invalid_hyperparameters() {
        let result = PredictorConfig::builder()
            .forest(ForestParams {
                n_estimators: 0,
                ..ForestParams::default()
            })
            .build();
        assert!(result.is_err());

        let result = PredictorConfig::builder()
            .svm(SvmParams {
                gamma: Some(-1.0),
                ..SvmParams::default()
            })
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = PredictorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PredictorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
