//! Common types used throughout the loan-predictor crate.
//!
//! - [`ApplicantRecord`]: one applicant, input to [`LoanPredictor::predict_loan`](crate::LoanPredictor::predict_loan)
//! - [`PredictionResult`]: decision and probability for one applicant
//! - [`TrainingResult`]: accuracies and comparison data from a training run
//! - [`ModelComparison`]: per-model scores for one candidate

use crate::error::{LoanPredictorError, Result};
use crate::schema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attributes describing one loan applicant.
///
/// Every field is optional so partially filled input can be represented;
/// [`validate`](Self::validate) reports which attributes are missing before
/// any model code runs.
///
/// Units follow the training data: incomes are monthly, `loan_amount` is in
/// thousands, `loan_amount_term` is in months. Credit history is a boolean and
/// becomes `1.0` / `0.0` in the feature space.
///
/// # Example
///
/// ```
/// use loan_predictor::ApplicantRecord;
///
/// let record = ApplicantRecord::new()
///     .gender("Male")
///     .married("Yes")
///     .dependents(1)
///     .education("Graduate")
///     .self_employed("No")
///     .applicant_income(6000.0)
///     .coapplicant_income(2000.0)
///     .loan_amount(120.0)
///     .loan_amount_term(360.0)
///     .credit_history(true)
///     .property_area("Urban");
///
/// assert!(record.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    #[serde(rename = "Gender", default)]
    pub gender: Option<String>,
    #[serde(rename = "Married", default)]
    pub married: Option<String>,
    #[serde(rename = "Dependents", default)]
    pub dependents: Option<u32>,
    #[serde(rename = "Education", default)]
    pub education: Option<String>,
    #[serde(rename = "Self_Employed", default)]
    pub self_employed: Option<String>,
    #[serde(rename = "ApplicantIncome", default)]
    pub applicant_income: Option<f64>,
    #[serde(rename = "CoapplicantIncome", default)]
    pub coapplicant_income: Option<f64>,
    #[serde(rename = "LoanAmount", default)]
    pub loan_amount: Option<f64>,
    #[serde(rename = "Loan_Amount_Term", default)]
    pub loan_amount_term: Option<f64>,
    #[serde(rename = "Credit_History", default)]
    pub credit_history: Option<bool>,
    #[serde(rename = "Property_Area", default)]
    pub property_area: Option<String>,
}

impl ApplicantRecord {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gender(mut self, value: impl Into<String>) -> Self {
        self.gender = Some(value.into());
        self
    }

    pub fn married(mut self, value: impl Into<String>) -> Self {
        self.married = Some(value.into());
        self
    }

    pub fn dependents(mut self, value: u32) -> Self {
        self.dependents = Some(value);
        self
    }

    pub fn education(mut self, value: impl Into<String>) -> Self {
        self.education = Some(value.into());
        self
    }

    pub fn self_employed(mut self, value: impl Into<String>) -> Self {
        self.self_employed = Some(value.into());
        self
    }

    pub fn applicant_income(mut self, value: f64) -> Self {
        self.applicant_income = Some(value);
        self
    }

    pub fn coapplicant_income(mut self, value: f64) -> Self {
        self.coapplicant_income = Some(value);
        self
    }

    pub fn loan_amount(mut self, value: f64) -> Self {
        self.loan_amount = Some(value);
        self
    }

    pub fn loan_amount_term(mut self, value: f64) -> Self {
        self.loan_amount_term = Some(value);
        self
    }

    pub fn credit_history(mut self, value: bool) -> Self {
        self.credit_history = Some(value);
        self
    }

    pub fn property_area(mut self, value: impl Into<String>) -> Self {
        self.property_area = Some(value.into());
        self
    }

    /// Names of absent attributes, in schema order.
    pub fn missing_fields(&self) -> Vec<String> {
        let present = [
            (schema::GENDER, self.gender.is_some()),
            (schema::MARRIED, self.married.is_some()),
            (schema::DEPENDENTS, self.dependents.is_some()),
            (schema::EDUCATION, self.education.is_some()),
            (schema::SELF_EMPLOYED, self.self_employed.is_some()),
            (schema::APPLICANT_INCOME, self.applicant_income.is_some()),
            (schema::COAPPLICANT_INCOME, self.coapplicant_income.is_some()),
            (schema::LOAN_AMOUNT, self.loan_amount.is_some()),
            (schema::LOAN_AMOUNT_TERM, self.loan_amount_term.is_some()),
            (schema::CREDIT_HISTORY, self.credit_history.is_some()),
            (schema::PROPERTY_AREA, self.property_area.is_some()),
        ];
        present
            .iter()
            .filter(|(_, is_present)| !is_present)
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Check that every attribute is present and numeric values are finite.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(LoanPredictorError::missing_fields(missing));
        }

        let numeric = [
            (schema::APPLICANT_INCOME, self.applicant_income),
            (schema::COAPPLICANT_INCOME, self.coapplicant_income),
            (schema::LOAN_AMOUNT, self.loan_amount),
            (schema::LOAN_AMOUNT_TERM, self.loan_amount_term),
        ];
        for (name, value) in numeric {
            if value.is_some_and(|v| !v.is_finite()) {
                return Err(LoanPredictorError::invalid_field(name, "must be a finite number"));
            }
        }

        Ok(())
    }
}

/// Result of a single prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Whether the selected model approves the loan.
    pub approved: bool,

    /// Probability of approval (positive class), in `[0.0, 1.0]`.
    pub probability: f64,

    /// Registry name of the model that produced the prediction.
    pub model_used: String,
}

/// Scores for one candidate model from a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    /// Registry name (e.g. "random_forest").
    pub name: String,

    /// Accuracy on the held-out partition. This is the selection criterion.
    pub test_score: f64,

    /// Accuracy on the training partition.
    pub train_score: f64,

    /// Wall-clock time spent fitting this model.
    pub training_time_seconds: f64,

    /// Whether the model was trained on standardized features.
    pub scaled_input: bool,
}

/// Result of a training run.
///
/// Returned by [`LoanPredictor::train_detailed`](crate::LoanPredictor::train_detailed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    /// Name of the selected model.
    pub best_model_name: String,

    /// Held-out accuracy per registered model.
    pub accuracies: BTreeMap<String, f64>,

    /// Comparison data in registration order.
    pub model_comparison: Vec<ModelComparison>,

    /// Normalized feature importance of the selected model, highest first.
    ///
    /// Empty when the selected model is not a tree ensemble.
    pub feature_importance: Vec<(String, f64)>,

    /// Rows in the training and held-out partitions.
    pub train_rows: usize,
    pub test_rows: usize,

    /// Total wall-clock training time in seconds.
    pub training_time_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_record() -> ApplicantRecord {
        ApplicantRecord::new()
            .gender("Female")
            .married("No")
            .dependents(2)
            .education("Graduate")
            .self_employed("Yes")
            .applicant_income(4000.0)
            .coapplicant_income(1000.0)
            .loan_amount(100.0)
            .loan_amount_term(240.0)
            .credit_history(true)
            .property_area("Semiurban")
    }

    #[test]
    fn test_complete_record_validates() {
        assert!(complete_record().validate().is_ok());
        assert!(complete_record().missing_fields().is_empty());
    }

    #[test]
    fn test_missing_fields_in_schema_order() {
        let record = ApplicantRecord {
            gender: None,
            property_area: None,
            ..complete_record()
        };

        assert_eq!(record.missing_fields(), vec!["Gender", "Property_Area"]);

        match record.validate() {
            Err(LoanPredictorError::Validation { fields, .. }) => {
                assert_eq!(fields, vec!["Gender", "Property_Area"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_income_rejected() {
        let record = complete_record().applicant_income(f64::NAN);
        assert!(matches!(
            record.validate(),
            Err(LoanPredictorError::Validation { .. })
        ));
    }

    #[test]
    fn test_record_deserializes_from_dataset_keys() {
        let json = r#"{
            "Gender": "Male",
            "Married": "Yes",
            "Dependents": 1,
            "Education": "Graduate",
            "Self_Employed": "No",
            "ApplicantIncome": 6000,
            "CoapplicantIncome": 2000,
            "LoanAmount": 120,
            "Loan_Amount_Term": 360,
            "Credit_History": true,
            "Property_Area": "Urban"
        }"#;

        let record: ApplicantRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.gender.as_deref(), Some("Male"));
        assert_eq!(record.applicant_income, Some(6000.0));
        assert_eq!(record.credit_history, Some(true));
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_partial_record_deserializes() {
        let record: ApplicantRecord = serde_json::from_str(r#"{"Gender": "Male"}"#).unwrap();
        assert_eq!(record.missing_fields().len(), 10);
    }
}
