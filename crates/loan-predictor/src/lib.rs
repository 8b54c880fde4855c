//! Loan Approval Prediction Library
//!
//! Trains classical classifiers on applicant data, keeps the most accurate
//! one, and scores new applicants with it. Built on Polars for tabular data
//! and ndarray for the model math.
//!
//! # Overview
//!
//! - **Synthetic Data**: Reproducible labeled datasets via [`generate_sample_data`]
//! - **Preprocessing**: Batch imputation and engineered income features
//! - **Encoding**: Fitted categorical-to-integer mappings that reject unseen values
//! - **Model Selection**: Logistic regression, random forest, gradient boosting
//!   and an RBF support vector machine, compared on a held-out split
//! - **Persistence**: The whole fitted state saved and loaded as one JSON bundle
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use loan_predictor::{generate_sample_data, ApplicantRecord, LoanPredictor};
//!
//! let data = generate_sample_data(1000, 42)?;
//!
//! let mut predictor = LoanPredictor::default();
//! for (name, accuracy) in predictor.train_models(&data)? {
//!     println!("{name}: {accuracy:.4}");
//! }
//! predictor.save_model("loan_predictor_model.json")?;
//!
//! // Later, in another process
//! let predictor = LoanPredictor::from_file("loan_predictor_model.json")?;
//! let result = predictor.predict_loan(&applicant)?;
//! println!("approved: {}, p = {:.3}", result.approved, result.probability);
//! ```
//!
//! # Configuration
//!
//! Use [`PredictorConfig`] to change the split, the seed, the registered
//! models or their hyperparameters:
//!
//! ```rust,ignore
//! use loan_predictor::{ForestParams, LoanPredictor, ModelKind, PredictorConfig};
//!
//! let config = PredictorConfig::builder()
//!     .test_size(0.25)
//!     .models(vec![ModelKind::RandomForest, ModelKind::GradientBoosting])
//!     .forest(ForestParams { n_estimators: 200, ..ForestParams::default() })
//!     .build()?;
//!
//! let predictor = LoanPredictor::new(config)?;
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`LoanPredictorError`]. Caller mistakes
//! (missing attributes, unknown categories) are distinguishable through
//! [`LoanPredictorError::is_client_error`].

pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod models;
pub mod persistence;
pub mod predictor;
pub mod preprocessing;
pub mod scaler;
pub mod schema;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    BoostingParams, ForestParams, LogisticParams, PredictorConfig, PredictorConfigBuilder,
    SvmParams,
};
pub use dataset::{load_csv, write_csv};
pub use encoder::CategoricalEncoder;
pub use error::{LoanPredictorError, Result};
pub use generator::generate_sample_data;
pub use models::{Classifier, ModelKind};
pub use persistence::{FORMAT_VERSION, ModelBundle};
pub use predictor::LoanPredictor;
pub use preprocessing::{NumericFallbacks, preprocess};
pub use scaler::StandardScaler;
pub use types::{ApplicantRecord, ModelComparison, PredictionResult, TrainingResult};
