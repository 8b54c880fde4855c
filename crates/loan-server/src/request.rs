//! Request body parsing and unit conversion.
//!
//! Clients send snake_case keys with annual incomes and the loan amount in
//! dollars. The model was trained on monthly incomes and loan amounts in
//! thousands, so [`PredictRequest::to_record`] converts before scoring while
//! [`PredictRequest::applicant_data`] echoes the original units back.
//!
//! Values are accepted leniently: numbers may arrive as JSON numbers or
//! numeric strings, `dependents` may be `"3+"`, and `credit_history` may be a
//! boolean, `1`/`0`, `1.0`/`0.0`, or any of those as strings.

use crate::error::ApiError;
use loan_predictor::ApplicantRecord;
use serde::Serialize;
use serde_json::{Map, Value};

/// Keys every prediction request must carry, in report order.
pub const REQUIRED_FIELDS: [&str; 11] = [
    "gender",
    "married",
    "dependents",
    "education",
    "self_employed",
    "applicant_income",
    "coapplicant_income",
    "loan_amount",
    "loan_amount_term",
    "credit_history",
    "property_area",
];

const MONTHS_PER_YEAR: f64 = 12.0;
const LOAN_AMOUNT_UNIT: f64 = 1000.0;

/// A validated prediction request in client units.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictRequest {
    pub gender: String,
    pub married: String,
    pub dependents: u32,
    pub education: String,
    pub self_employed: String,
    /// Annual income.
    pub applicant_income: f64,
    /// Annual income.
    pub coapplicant_income: f64,
    /// Loan amount in dollars.
    pub loan_amount: f64,
    /// Term in months.
    pub loan_amount_term: f64,
    pub credit_history: bool,
    pub property_area: String,
    /// `dependents` exactly as sent, for echoing back.
    raw_dependents: Value,
}

/// Applicant attributes as echoed in a prediction response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantData {
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Married")]
    pub married: String,
    #[serde(rename = "Dependents")]
    pub dependents: Value,
    #[serde(rename = "Education")]
    pub education: String,
    #[serde(rename = "Self_Employed")]
    pub self_employed: String,
    #[serde(rename = "ApplicantIncome")]
    pub applicant_income: f64,
    #[serde(rename = "CoapplicantIncome")]
    pub coapplicant_income: f64,
    #[serde(rename = "LoanAmount")]
    pub loan_amount: f64,
    #[serde(rename = "Loan_Amount_Term")]
    pub loan_amount_term: f64,
    #[serde(rename = "Credit_History")]
    pub credit_history: f64,
    #[serde(rename = "Property_Area")]
    pub property_area: String,
}

impl PredictRequest {
    /// Parses a raw request body.
    ///
    /// # Errors
    ///
    /// - [`ApiError::BadRequest`] if the body is not a JSON object or a value
    ///   cannot be converted
    /// - [`ApiError::MissingFields`] listing every absent key
    pub fn from_json(body: &[u8]) -> Result<Self, ApiError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;
        let Value::Object(map) = value else {
            return Err(ApiError::BadRequest(
                "Request body must be a JSON object".to_string(),
            ));
        };
        Self::from_map(&map)
    }

    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ApiError> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|key| !map.contains_key(**key))
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ApiError::MissingFields(missing));
        }

        Ok(Self {
            gender: text(map, "gender")?,
            married: text(map, "married")?,
            dependents: dependents(&map["dependents"])?,
            education: text(map, "education")?,
            self_employed: text(map, "self_employed")?,
            applicant_income: number(map, "applicant_income")?,
            coapplicant_income: number(map, "coapplicant_income")?,
            loan_amount: number(map, "loan_amount")?,
            loan_amount_term: number(map, "loan_amount_term")?,
            credit_history: credit_history(&map["credit_history"])?,
            property_area: text(map, "property_area")?,
            raw_dependents: map["dependents"].clone(),
        })
    }

    /// The applicant in model units: monthly incomes, loan amount in thousands.
    pub fn to_record(&self) -> ApplicantRecord {
        ApplicantRecord::new()
            .gender(self.gender.clone())
            .married(self.married.clone())
            .dependents(self.dependents)
            .education(self.education.clone())
            .self_employed(self.self_employed.clone())
            .applicant_income(self.applicant_income / MONTHS_PER_YEAR)
            .coapplicant_income(self.coapplicant_income / MONTHS_PER_YEAR)
            .loan_amount(self.loan_amount / LOAN_AMOUNT_UNIT)
            .loan_amount_term(self.loan_amount_term)
            .credit_history(self.credit_history)
            .property_area(self.property_area.clone())
    }

    /// The applicant in the units the client sent.
    pub fn applicant_data(&self) -> ApplicantData {
        ApplicantData {
            gender: self.gender.clone(),
            married: self.married.clone(),
            dependents: self.raw_dependents.clone(),
            education: self.education.clone(),
            self_employed: self.self_employed.clone(),
            applicant_income: self.applicant_income,
            coapplicant_income: self.coapplicant_income,
            loan_amount: self.loan_amount,
            loan_amount_term: self.loan_amount_term,
            credit_history: if self.credit_history { 1.0 } else { 0.0 },
            property_area: self.property_area.clone(),
        }
    }
}

// =============================================================================
// Value Conversion
// =============================================================================

fn invalid(key: &str, expected: &str, value: &Value) -> ApiError {
    ApiError::BadRequest(format!("Invalid value for '{}': expected {}, got {}", key, expected, value))
}

fn text(map: &Map<String, Value>, key: &str) -> Result<String, ApiError> {
    match &map[key] {
        Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => Err(invalid(key, "a non-empty string", other)),
    }
}

fn number(map: &Map<String, Value>, key: &str) -> Result<f64, ApiError> {
    let value = &map[key];
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| invalid(key, "a number", value))
}

fn dependents(value: &Value) -> Result<u32, ApiError> {
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().trim_end_matches('+').parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid("dependents", "a non-negative integer or \"3+\"", value))
}

fn credit_history(value: &Value) -> Result<bool, ApiError> {
    let flag = match value {
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim() {
            "true" => Some(1.0),
            "false" => Some(0.0),
            other => other.parse::<f64>().ok(),
        },
        _ => None,
    };
    match flag {
        Some(f) if f == 1.0 => Ok(true),
        Some(f) if f == 0.0 => Ok(false),
        _ => Err(invalid("credit_history", "1 or 0", value)),
    }
}
