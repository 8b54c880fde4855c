//! Integration tests for the loan predictor.
//!
//! These tests train on synthetic data end to end and exercise the public API
//! the way the CLI and the HTTP server use it.

use loan_predictor::{
    ApplicantRecord, LoanPredictor, LoanPredictorError, ModelKind, PredictorConfig,
    generate_sample_data, load_csv, write_csv,
};
use pretty_assertions::assert_eq;
use std::sync::OnceLock;

// ============================================================================
// Helper Functions
// ============================================================================

/// A predictor trained once on 500 applicants with seed 42.
fn trained() -> &'static LoanPredictor {
    static PREDICTOR: OnceLock<LoanPredictor> = OnceLock::new();
    PREDICTOR.get_or_init(|| {
        let data = generate_sample_data(500, 42).unwrap();
        let mut predictor = LoanPredictor::default();
        predictor.train_models(&data).unwrap();
        predictor
    })
}

fn good_applicant() -> ApplicantRecord {
    ApplicantRecord::new()
        .gender("Male")
        .married("Yes")
        .dependents(1)
        .education("Graduate")
        .self_employed("No")
        .applicant_income(6000.0)
        .coapplicant_income(2000.0)
        .loan_amount(120.0)
        .loan_amount_term(360.0)
        .credit_history(true)
        .property_area("Urban")
}

fn poor_applicant() -> ApplicantRecord {
    ApplicantRecord::new()
        .gender("Female")
        .married("No")
        .dependents(0)
        .education("Not Graduate")
        .self_employed("No")
        .applicant_income(2000.0)
        .coapplicant_income(0.0)
        .loan_amount(150.0)
        .loan_amount_term(360.0)
        .credit_history(false)
        .property_area("Rural")
}

// ============================================================================
// Training
// ============================================================================

#[test]
fn test_train_models_reports_every_registered_model() {
    let data = generate_sample_data(300, 7).unwrap();
    let mut predictor = LoanPredictor::default();
    let accuracies = predictor.train_models(&data).unwrap();

    let names: Vec<&str> = accuracies.keys().map(String::as_str).collect();
    let mut expected: Vec<&str> = ModelKind::ALL.iter().map(|k| k.name()).collect();
    expected.sort_unstable();
    assert_eq!(names, expected);

    for (name, accuracy) in &accuracies {
        assert!(
            (0.0..=1.0).contains(accuracy),
            "{} accuracy out of range: {}",
            name,
            accuracy
        );
    }

    let best = predictor.best_model_name().unwrap();
    let best_accuracy = accuracies[best];
    assert!(accuracies.values().all(|a| *a <= best_accuracy));
}

#[test]
fn test_training_subset_of_models() {
    let config = PredictorConfig::builder()
        .models(vec![ModelKind::Logistic, ModelKind::GradientBoosting])
        .build()
        .unwrap();
    let mut predictor = LoanPredictor::new(config).unwrap();
    let accuracies = predictor
        .train_models(&generate_sample_data(200, 3).unwrap())
        .unwrap();

    assert_eq!(accuracies.len(), 2);
    assert!(accuracies.contains_key("logistic"));
    assert!(accuracies.contains_key("gradient_boosting"));
}

#[test]
fn test_training_from_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("loans.csv");
    let mut data = generate_sample_data(200, 11).unwrap();
    write_csv(&mut data, &path).unwrap();

    let loaded = load_csv(&path).unwrap();
    let mut predictor = LoanPredictor::default();
    predictor.train_models(&loaded).unwrap();

    let result = predictor.predict_loan(&good_applicant()).unwrap();
    assert!((0.0..=1.0).contains(&result.probability));
}

// ============================================================================
// Prediction
// ============================================================================

#[test]
fn test_good_applicant_approved() {
    let result = trained().predict_loan(&good_applicant()).unwrap();

    assert!(result.approved);
    assert!(
        result.probability > 0.6,
        "probability too low: {}",
        result.probability
    );
    assert_eq!(Some(result.model_used.as_str()), trained().best_model_name());
}

#[test]
fn test_poor_applicant_unlikely() {
    let result = trained().predict_loan(&poor_applicant()).unwrap();
    assert!(
        result.probability < 0.5,
        "probability too high: {}",
        result.probability
    );
}

#[test]
fn test_prediction_is_deterministic() {
    let first = trained().predict_loan(&good_applicant()).unwrap();
    let second = trained().predict_loan(&good_applicant()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_predict_batch_matches_single_predictions() {
    let records = vec![good_applicant(), poor_applicant()];
    let batch = trained().predict_batch(&records).unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch[0], trained().predict_loan(&records[0]).unwrap());
    assert_eq!(batch[1], trained().predict_loan(&records[1]).unwrap());
}

#[test]
fn test_zero_loan_amount_gives_finite_probability() {
    let record = good_applicant().loan_amount(0.0);
    let result = trained().predict_loan(&record).unwrap();
    assert!(result.probability.is_finite());
}

#[test]
fn test_unknown_category_rejected() {
    let record = good_applicant().property_area("Suburban");
    match trained().predict_loan(&record) {
        Err(LoanPredictorError::UnknownCategory { column, value }) => {
            assert_eq!(column, "Property_Area");
            assert_eq!(value, "Suburban");
        }
        other => panic!("expected UnknownCategory, got {:?}", other),
    }
}

#[test]
fn test_missing_field_rejected() {
    let mut record = good_applicant();
    record.credit_history = None;
    record.education = None;

    match trained().predict_loan(&record) {
        Err(LoanPredictorError::Validation { fields, .. }) => {
            assert_eq!(fields, vec!["Education", "Credit_History"]);
        }
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[test]
fn test_predict_without_model() {
    let predictor = LoanPredictor::default();
    assert!(matches!(
        predictor.predict_loan(&good_applicant()),
        Err(LoanPredictorError::NotTrained)
    ));
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_save_load_roundtrip_preserves_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    trained().save_model(&path).unwrap();

    let restored = LoanPredictor::from_file(&path).unwrap();
    assert_eq!(restored.best_model_name(), trained().best_model_name());

    for record in [good_applicant(), poor_applicant()] {
        assert_eq!(
            restored.predict_loan(&record).unwrap(),
            trained().predict_loan(&record).unwrap()
        );
    }
}

#[test]
fn test_corrupt_bundle_keeps_existing_state() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("model.json");
    let bad = dir.path().join("broken.json");
    trained().save_model(&good).unwrap();
    std::fs::write(&bad, b"{\"format_version\": 1}").unwrap();

    let mut predictor = LoanPredictor::from_file(&good).unwrap();
    let before = predictor.predict_loan(&good_applicant()).unwrap();

    let result = predictor.load_model(&bad);
    assert!(matches!(result, Err(LoanPredictorError::CorruptBundle { .. })));
    assert_eq!(predictor.predict_loan(&good_applicant()).unwrap(), before);
}

#[test]
fn test_save_without_model() {
    let dir = tempfile::tempdir().unwrap();
    let result = LoanPredictor::default().save_model(dir.path().join("model.json"));
    assert!(matches!(result, Err(LoanPredictorError::NotTrained)));
}
