//! The loan approval predictor.
//!
//! [`LoanPredictor`] owns the configuration and, once trained or loaded, the
//! complete fitted state as a single [`ModelBundle`]. Training builds a new
//! bundle off to the side and swaps it in only after every step succeeded;
//! loading does the same with a bundle read from disk. A failed call never
//! leaves the predictor half-updated.
//!
//! # Training
//!
//! 1. Check the dataset (label column, at least 10 rows, both classes)
//! 2. Preprocess and fit the categorical encoder
//! 3. Build the feature matrix in schema order and split it with a fixed seed
//! 4. Fit the standard scaler on the training partition
//! 5. Train every registered model; `logistic` and `svm` see scaled features
//! 6. Keep the model with the best held-out accuracy (first registered on ties)
//!
//! # Example
//!
//! ```no_run
//! use loan_predictor::{generate_sample_data, ApplicantRecord, LoanPredictor};
//!
//! let data = generate_sample_data(500, 42)?;
//! let mut predictor = LoanPredictor::default();
//! let accuracies = predictor.train_models(&data)?;
//! println!("{:?}", accuracies);
//!
//! let record = ApplicantRecord::new()
//!     .gender("Male")
//!     .married("Yes")
//!     .dependents(1)
//!     .education("Graduate")
//!     .self_employed("No")
//!     .applicant_income(6000.0)
//!     .coapplicant_income(2000.0)
//!     .loan_amount(120.0)
//!     .loan_amount_term(360.0)
//!     .credit_history(true)
//!     .property_area("Urban");
//!
//! let result = predictor.predict_loan(&record)?;
//! println!("approved: {} ({:.1}%)", result.approved, result.probability * 100.0);
//!
//! predictor.save_model("loan_predictor_model.json")?;
//! # Ok::<(), loan_predictor::LoanPredictorError>(())
//! ```

use crate::config::PredictorConfig;
use crate::dataset::{feature_matrix, labels, records_to_frame, train_test_split};
use crate::encoder::CategoricalEncoder;
use crate::error::{LoanPredictorError, Result};
use crate::models::Classifier;
use crate::persistence::{BestModel, BundleMetadata, FORMAT_VERSION, ModelBundle};
use crate::preprocessing::{NumericFallbacks, compute_fallbacks, preprocess};
use crate::scaler::StandardScaler;
use crate::schema::{self, LOAN_STATUS};
use crate::types::{ApplicantRecord, ModelComparison, PredictionResult, TrainingResult};
use crate::utils::accuracy;
use chrono::Local;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use polars::prelude::DataFrame;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Smallest dataset accepted for training.
pub const MIN_TRAINING_ROWS: usize = 10;

/// Trains candidate classifiers, keeps the best one, and scores applicants.
///
/// # Thread Safety
///
/// `LoanPredictor` is `Send + Sync` and has no interior mutability. Training
/// and loading take `&mut self`; prediction takes `&self`, so a shared
/// predictor behind a read-write lock serves concurrent readers.
#[derive(Debug, Clone, Default)]
pub struct LoanPredictor {
    config: PredictorConfig,
    state: Option<ModelBundle>,
}

static_assertions::assert_impl_all!(LoanPredictor: Send, Sync);

impl LoanPredictor {
    /// Creates an untrained predictor with a validated configuration.
    pub fn new(config: PredictorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: None,
        })
    }

    /// Creates a predictor from a bundle previously written by [`save_model`](Self::save_model).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut predictor = Self::default();
        predictor.load_model(path)?;
        Ok(predictor)
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Whether a fitted state is present.
    pub fn is_trained(&self) -> bool {
        self.state.is_some()
    }

    /// Registry name of the selected model.
    pub fn best_model_name(&self) -> Option<&str> {
        self.state.as_ref().map(|s| s.best_model.name.as_str())
    }

    /// The complete fitted state, if any.
    pub fn bundle(&self) -> Option<&ModelBundle> {
        self.state.as_ref()
    }

    /// Categories the fitted encoder accepts for `column`.
    pub fn known_categories(&self, column: &str) -> Option<Vec<&str>> {
        self.state.as_ref()?.encoder.categories(column)
    }

    // =========================================================================
    // Training
    // =========================================================================

    /// Trains every registered model and returns held-out accuracy by name.
    ///
    /// # Errors
    ///
    /// - [`LoanPredictorError::InvalidData`] if the dataset has no usable labels,
    ///   fewer than 10 rows, or a single class
    /// - [`LoanPredictorError::Validation`] if a column has no observed values
    /// - [`LoanPredictorError::TrainingFailed`] if a model cannot be fitted
    ///
    /// On error the previous fitted state is kept.
    pub fn train_models(&mut self, df: &DataFrame) -> Result<BTreeMap<String, f64>> {
        Ok(self.train_detailed(df)?.accuracies)
    }

    /// Like [`train_models`](Self::train_models) but also returns per-model
    /// train scores, timings and the selected model's feature importance.
    pub fn train_detailed(&mut self, df: &DataFrame) -> Result<TrainingResult> {
        let started = Instant::now();
        let y = check_dataset(df)?;

        info!("Preprocessing data...");
        let processed = preprocess(df, &NumericFallbacks::new())?;
        let mut encoder = CategoricalEncoder::new();
        let encoded = encoder.fit_transform(&processed)?;

        let feature_columns = schema::feature_columns();
        let x = feature_matrix(&encoded, &feature_columns)?;

        let (train_idx, test_idx) =
            train_test_split(x.nrows(), self.config.test_size, self.config.random_seed);
        let x_train = x.select(Axis(0), &train_idx);
        let x_test = x.select(Axis(0), &test_idx);
        let y_train = y.select(Axis(0), &train_idx);
        let y_test = y.select(Axis(0), &test_idx);
        debug!(
            "Split {} rows into {} train / {} test",
            x.nrows(),
            train_idx.len(),
            test_idx.len()
        );

        let scaler = StandardScaler::fit(x_train.view())?;
        let x_train_scaled = scaler.transform(x_train.view())?;
        let x_test_scaled = scaler.transform(x_test.view())?;

        let train_truth = as_bools(y_train.view());
        let test_truth = as_bools(y_test.view());

        info!("Training {} models...", self.config.models.len());
        let mut accuracies = BTreeMap::new();
        let mut comparison = Vec::with_capacity(self.config.models.len());
        let mut best: Option<(Classifier, f64)> = None;

        for &kind in &self.config.models {
            let (fit_x, eval_x) = if kind.is_scale_sensitive() {
                (&x_train_scaled, &x_test_scaled)
            } else {
                (&x_train, &x_test)
            };

            let model_started = Instant::now();
            let model = Classifier::fit(kind, &self.config, fit_x.view(), y_train.view())?;
            let elapsed = model_started.elapsed().as_secs_f64();

            let test_score = accuracy(&model.predict(eval_x.view()), &test_truth);
            let train_score = accuracy(&model.predict(fit_x.view()), &train_truth);
            info!("{} accuracy: {:.4} ({:.2}s)", kind, test_score, elapsed);

            accuracies.insert(kind.name().to_string(), test_score);
            comparison.push(ModelComparison {
                name: kind.name().to_string(),
                test_score,
                train_score,
                training_time_seconds: elapsed,
                scaled_input: kind.is_scale_sensitive(),
            });

            if is_new_best(best.as_ref().map(|(_, score)| *score), test_score) {
                best = Some((model, test_score));
            }
        }

        let (model, best_score) = best.ok_or_else(|| {
            LoanPredictorError::InvalidConfig("no models registered".to_string())
        })?;
        info!("Best model: {} with accuracy: {:.4}", model.name(), best_score);

        let bundle = ModelBundle {
            format_version: FORMAT_VERSION,
            metadata: BundleMetadata {
                created_at: Local::now().to_rfc3339(),
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
                accuracies: accuracies.clone(),
            },
            best_model: BestModel {
                name: model.name().to_string(),
                model,
            },
            encoder,
            scaler,
            numeric_fallbacks: compute_fallbacks(&processed)?,
            feature_columns,
        };

        let feature_importance = ranked_importance(&bundle);
        let result = TrainingResult {
            best_model_name: bundle.best_model.name.clone(),
            accuracies,
            model_comparison: comparison,
            feature_importance,
            train_rows: train_idx.len(),
            test_rows: test_idx.len(),
            training_time_seconds: started.elapsed().as_secs_f64(),
        };

        self.state = Some(bundle);
        Ok(result)
    }

    // =========================================================================
    // Inference
    // =========================================================================

    /// Scores one applicant with the selected model.
    ///
    /// # Errors
    ///
    /// - [`LoanPredictorError::NotTrained`] before training or loading
    /// - [`LoanPredictorError::Validation`] listing missing or non-finite attributes
    /// - [`LoanPredictorError::UnknownCategory`] for a value the encoder never saw
    pub fn predict_loan(&self, record: &ApplicantRecord) -> Result<PredictionResult> {
        let state = self.state.as_ref().ok_or(LoanPredictorError::NotTrained)?;
        record.validate()?;

        let x = features_for(state, record)?;
        let model = &state.best_model.model;
        let approved = model.predict(x.view())[0];
        let probability = model.predict_probability(x.view())[0].clamp(0.0, 1.0);

        debug!(
            "Prediction by {}: approved={} p={:.4}",
            state.best_model.name, approved, probability
        );

        Ok(PredictionResult {
            approved,
            probability,
            model_used: state.best_model.name.clone(),
        })
    }

    /// Scores each record independently; stops at the first failing record.
    pub fn predict_batch(&self, records: &[ApplicantRecord]) -> Result<Vec<PredictionResult>> {
        records.iter().map(|r| self.predict_loan(r)).collect()
    }

    /// Normalized importance of each feature in the selected model, highest first.
    ///
    /// Empty when the selected model is not a tree ensemble.
    pub fn feature_importance(&self) -> Result<Vec<(String, f64)>> {
        let state = self.state.as_ref().ok_or(LoanPredictorError::NotTrained)?;
        Ok(ranked_importance(state))
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Writes the fitted state to `path` atomically.
    pub fn save_model(&self, path: impl AsRef<Path>) -> Result<()> {
        let state = self.state.as_ref().ok_or(LoanPredictorError::NotTrained)?;
        state.save(path)
    }

    /// Replaces the fitted state with the bundle at `path`.
    ///
    /// On [`LoanPredictorError::CorruptBundle`] the current state is kept.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bundle = ModelBundle::load(path)?;
        self.state = Some(bundle);
        Ok(())
    }
}

/// Labels of a dataset that passes the training preconditions.
fn check_dataset(df: &DataFrame) -> Result<Array1<f64>> {
    if df.column(LOAN_STATUS).is_err() {
        return Err(LoanPredictorError::InvalidData(format!(
            "label column '{}' not found",
            LOAN_STATUS
        )));
    }
    if df.height() < MIN_TRAINING_ROWS {
        return Err(LoanPredictorError::InvalidData(format!(
            "at least {} rows are required for training, got {}",
            MIN_TRAINING_ROWS,
            df.height()
        )));
    }

    let y = labels(df)?;
    let positives = y.iter().filter(|v| **v == 1.0).count();
    if positives == 0 || positives == y.len() {
        return Err(LoanPredictorError::InvalidData(
            "both approved and rejected examples are required".to_string(),
        ));
    }
    Ok(y)
}

/// Model input for one record, scaled when the selected model needs it.
fn features_for(state: &ModelBundle, record: &ApplicantRecord) -> Result<Array2<f64>> {
    let frame = records_to_frame(std::slice::from_ref(record))?;
    let processed = preprocess(&frame, &state.numeric_fallbacks)?;
    let encoded = state.encoder.transform(&processed)?;
    let x = feature_matrix(&encoded, &state.feature_columns)?;

    if state.best_model.model.kind().is_scale_sensitive() {
        state.scaler.transform(x.view())
    } else {
        Ok(x)
    }
}

fn ranked_importance(state: &ModelBundle) -> Vec<(String, f64)> {
    let Some(importance) = state.best_model.model.feature_importance() else {
        return Vec::new();
    };
    let mut ranked: Vec<(String, f64)> = state
        .feature_columns
        .iter()
        .cloned()
        .zip(importance.iter().copied())
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Strictly greater wins, so a tie keeps the model registered first.
fn is_new_best(current: Option<f64>, score: f64) -> bool {
    current.is_none_or(|best| score > best)
}

fn as_bools(y: ArrayView1<f64>) -> Vec<bool> {
    y.iter().map(|v| *v == 1.0).collect()
}
