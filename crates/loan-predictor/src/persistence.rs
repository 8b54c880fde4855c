//! The persisted model bundle.
//!
//! [`ModelBundle`] is the complete fitted state of a
//! [`LoanPredictor`](crate::LoanPredictor): the selected classifier, the
//! categorical encoder, the scaler, the feature column order and the numeric
//! fallbacks, plus descriptive metadata. It only ever exists whole, which is
//! what makes save and load all-or-nothing.
//!
//! # Format
//!
//! Bundles are JSON documents tagged with [`FORMAT_VERSION`]:
//!
//! ```text
//! {
//!   "format_version": 1,
//!   "metadata": { "created_at": "...", "crate_version": "0.1.0", "accuracies": { ... } },
//!   "best_model": { "name": "random_forest", "model": { "kind": "random_forest", ... } },
//!   "encoder": { ... },
//!   "scaler": { ... },
//!   "feature_columns": [ ... ],
//!   "numeric_fallbacks": { ... }
//! }
//! ```
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so readers never observe a half-written bundle.

use crate::encoder::CategoricalEncoder;
use crate::error::{LoanPredictorError, Result};
use crate::models::Classifier;
use crate::preprocessing::NumericFallbacks;
use crate::scaler::StandardScaler;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

/// Version of the on-disk layout. Bumped on incompatible changes.
pub const FORMAT_VERSION: u32 = 1;

/// Descriptive information stored alongside the fitted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// RFC 3339 timestamp of the training run.
    pub created_at: String,
    /// Version of this crate that produced the bundle.
    pub crate_version: String,
    /// Held-out accuracy of every registered model.
    pub accuracies: BTreeMap<String, f64>,
}

/// The selected model and its registry name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestModel {
    pub name: String,
    pub model: Classifier,
}

/// Complete fitted state of a predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBundle {
    pub format_version: u32,
    pub metadata: BundleMetadata,
    pub best_model: BestModel,
    pub encoder: CategoricalEncoder,
    pub scaler: StandardScaler,
    pub feature_columns: Vec<String>,
    pub numeric_fallbacks: NumericFallbacks,
}

impl ModelBundle {
    /// Writes the bundle to `path` atomically, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`LoanPredictorError::Io`] if the destination directory does not
    /// exist or cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let bytes = self.to_bytes()?;
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| LoanPredictorError::Io(e.error))?;

        info!("Model saved to {}", path.display());
        Ok(())
    }

    /// Reads and checks a bundle from `path`.
    ///
    /// # Errors
    ///
    /// Every failure (missing file, malformed JSON, absent fields, wrong
    /// format version, inconsistent dimensions) is reported as
    /// [`LoanPredictorError::CorruptBundle`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let corrupt = |reason: String| LoanPredictorError::CorruptBundle {
            path: path.display().to_string(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| corrupt(e.to_string()))?;
        let bundle = Self::from_bytes(&bytes).map_err(|e| match e {
            LoanPredictorError::CorruptBundle { reason, .. } => corrupt(reason),
            other => corrupt(other.to_string()),
        })?;

        info!(
            "Model loaded from {} ({}, created {})",
            path.display(),
            bundle.best_model.name,
            bundle.metadata.created_at
        );
        Ok(bundle)
    }

    /// Serialized JSON form of the bundle.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parses and checks a bundle from its JSON form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let corrupt = |reason: String| LoanPredictorError::CorruptBundle {
            path: "<bytes>".to_string(),
            reason,
        };

        let bundle: ModelBundle =
            serde_json::from_slice(bytes).map_err(|e| corrupt(e.to_string()))?;
        bundle.check().map_err(corrupt)?;
        Ok(bundle)
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.format_version != FORMAT_VERSION {
            return Err(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, FORMAT_VERSION
            ));
        }
        if self.best_model.name != self.best_model.model.name() {
            return Err(format!(
                "best_model name '{}' does not match model kind '{}'",
                self.best_model.name,
                self.best_model.model.name()
            ));
        }

        let n_features = self.feature_columns.len();
        if n_features == 0 {
            return Err("feature_columns is empty".to_string());
        }
        if self.scaler.n_features() != n_features || self.best_model.model.n_features() != n_features
        {
            return Err(format!(
                "dimension mismatch: {} feature columns, scaler has {}, model has {}",
                n_features,
                self.scaler.n_features(),
                self.best_model.model.n_features()
            ));
        }
        self.best_model
            .model
            .validate()
            .map_err(|reason| format!("invalid {} model: {}", self.best_model.name, reason))?;
        self.encoder.validate()?;
        self.scaler.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PredictorConfig;
    use crate::models::ModelKind;
    use crate::schema::*;
    use ndarray::array;
    use polars::prelude::*;
    use serde_json::{Value, json};

    fn bundle() -> ModelBundle {
        bundle_with(ModelKind::Logistic)
    }

    fn bundle_with(kind: ModelKind) -> ModelBundle {
        let x = array![[0.0, 1.0], [1.0, 0.0], [0.2, 0.9], [0.9, 0.1]];
        let y = array![0.0, 1.0, 0.0, 1.0];
        let model = Classifier::fit(kind, &PredictorConfig::default(), x.view(), y.view()).unwrap();

        let mut encoder = CategoricalEncoder::new();
        encoder
            .fit_transform(
                &df![
                    GENDER => ["Male"],
                    MARRIED => ["Yes"],
                    EDUCATION => ["Graduate"],
                    SELF_EMPLOYED => ["No"],
                    PROPERTY_AREA => ["Urban"],
                ]
                .unwrap(),
            )
            .unwrap();

        ModelBundle {
            format_version: FORMAT_VERSION,
            metadata: BundleMetadata {
                created_at: "2026-01-01T00:00:00+00:00".to_string(),
                crate_version: env!("CARGO_PKG_VERSION").to_string(),
                accuracies: BTreeMap::from([(kind.name().to_string(), 1.0)]),
            },
            best_model: BestModel {
                name: kind.name().to_string(),
                model,
            },
            encoder,
            scaler: StandardScaler::fit(x.view()).unwrap(),
            feature_columns: vec!["a".to_string(), "b".to_string()],
            numeric_fallbacks: NumericFallbacks::new(),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");

        let original = bundle();
        original.save(&path).unwrap();
        let loaded = ModelBundle::load(&path).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_save_overwrites_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, b"old contents").unwrap();

        bundle().save(&path).unwrap();
        assert!(ModelBundle::load(&path).is_ok());
        // No temporary files left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_missing_file_is_corrupt_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let result = ModelBundle::load(dir.path().join("absent.json"));
        assert!(matches!(result, Err(LoanPredictorError::CorruptBundle { .. })));
    }

    #[test]
    fn test_incomplete_bundle_rejected() {
        let mut value = serde_json::to_value(bundle()).unwrap();
        value.as_object_mut().unwrap().remove("scaler");
        let bytes = serde_json::to_vec(&value).unwrap();

        match ModelBundle::from_bytes(&bytes) {
            Err(LoanPredictorError::CorruptBundle { reason, .. }) => {
                assert!(reason.contains("scaler"), "unexpected reason: {}", reason)
            }
            other => panic!("expected CorruptBundle, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_format_version_rejected() {
        let mut b = bundle();
        b.format_version = FORMAT_VERSION + 1;
        let bytes = serde_json::to_vec(&b).unwrap();
        assert!(matches!(
            ModelBundle::from_bytes(&bytes),
            Err(LoanPredictorError::CorruptBundle { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut b = bundle();
        b.feature_columns.push("c".to_string());
        let bytes = serde_json::to_vec(&b).unwrap();
        assert!(ModelBundle::from_bytes(&bytes).is_err());
    }

    /// Load reason for a bundle edited through its JSON form.
    fn rejection(value: &Value) -> String {
        let bytes = serde_json::to_vec(value).unwrap();
        match ModelBundle::from_bytes(&bytes) {
            Err(LoanPredictorError::CorruptBundle { reason, .. }) => reason,
            other => panic!("expected CorruptBundle, got {:?}", other),
        }
    }

    /// Apply `edit` to every split node of every tree in the bundle.
    fn edit_splits(value: &mut Value, edit: impl Fn(usize, &mut Value)) -> usize {
        let mut edited = 0;
        let trees = value["best_model"]["model"]["trees"].as_array_mut().unwrap();
        for tree in trees {
            let nodes = tree["nodes"].as_array_mut().unwrap();
            for (index, node) in nodes.iter_mut().enumerate() {
                if node["type"] == "split" {
                    edit(index, node);
                    edited += 1;
                }
            }
        }
        edited
    }

    #[test]
    fn test_tree_feature_out_of_range_rejected() {
        for kind in [ModelKind::RandomForest, ModelKind::GradientBoosting] {
            let mut value = serde_json::to_value(bundle_with(kind)).unwrap();
            let edited = edit_splits(&mut value, |_, node| node["feature"] = json!(999));
            assert!(edited > 0, "{} grew no splits", kind);

            let reason = rejection(&value);
            assert!(reason.contains("feature 999"), "unexpected reason: {}", reason);
        }
    }

    #[test]
    fn test_tree_backward_child_rejected() {
        let mut value = serde_json::to_value(bundle_with(ModelKind::GradientBoosting)).unwrap();
        let edited = edit_splits(&mut value, |index, node| node["left"] = json!(index));
        assert!(edited > 0);

        let reason = rejection(&value);
        assert!(reason.contains("child"), "unexpected reason: {}", reason);
    }

    #[test]
    fn test_tree_child_past_end_rejected() {
        let mut value = serde_json::to_value(bundle_with(ModelKind::RandomForest)).unwrap();
        edit_splits(&mut value, |_, node| node["right"] = json!(10_000));
        assert!(rejection(&value).contains("child 10000"));
    }

    #[test]
    fn test_partial_encoder_rejected() {
        let mut value = serde_json::to_value(bundle()).unwrap();
        let mut gender_only = serde_json::Map::new();
        gender_only.insert(
            GENDER.to_string(),
            value["encoder"]["mappings"][GENDER].clone(),
        );
        value["encoder"]["mappings"] = Value::Object(gender_only);

        let reason = rejection(&value);
        assert!(reason.contains(MARRIED), "unexpected reason: {}", reason);
    }

    #[test]
    fn test_empty_encoder_mapping_rejected() {
        let mut value = serde_json::to_value(bundle()).unwrap();
        value["encoder"]["mappings"][PROPERTY_AREA] = json!({});
        assert!(rejection(&value).contains(PROPERTY_AREA));
    }

    #[test]
    fn test_non_positive_scale_rejected() {
        let mut value = serde_json::to_value(bundle()).unwrap();
        value["scaler"]["scale"]["data"] = json!([0.0, 1.0]);
        assert!(rejection(&value).contains("scale must be positive"));

        value["scaler"]["scale"]["data"] = json!([1.0, -2.0]);
        assert!(rejection(&value).contains("scale must be positive"));
    }

    #[test]
    fn test_svm_bundle_roundtrip_and_bad_gamma() {
        let original = bundle_with(ModelKind::Svm);
        let bytes = serde_json::to_vec(&original).unwrap();
        assert_eq!(ModelBundle::from_bytes(&bytes).unwrap(), original);

        let mut value = serde_json::to_value(&original).unwrap();
        value["best_model"]["model"]["gamma"] = json!(-1.0);
        assert!(rejection(&value).contains("gamma"));
    }
}
