//! Batch preprocessing shared by training and inference.
//!
//! [`preprocess`] is pure: it returns a new frame and never mutates its input.
//!
//! # Steps
//!
//! 1. Missing categorical values take the batch mode (ties lexicographic).
//! 2. Missing numeric values take the batch median; the discrete attributes
//!    `Dependents`, `Loan_Amount_Term` and `Credit_History` take the batch mode.
//! 3. `Total_Income = ApplicantIncome + CoapplicantIncome`.
//! 4. `Income_to_Loan_Ratio = Total_Income / (LoanAmount * 1000)`, with a
//!    near-zero denominator masked and filled by the median of the finite ratios.
//! 5. Any remaining non-finite numeric value takes the median of the column's
//!    finite values, or the stored fallback when the batch has none.
//!
//! A batch of one row cannot impute from itself, so a missing value there is
//! a validation error, as is a column with no observed value at all.

use crate::error::{LoanPredictorError, Result};
use crate::schema::*;
use crate::utils::{median, numeric_mode, numeric_values, string_mode, string_values};
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Loan amounts are recorded in thousands.
const LOAN_AMOUNT_UNIT: f64 = 1000.0;
const MIN_DENOMINATOR: f64 = 1e-9;

/// Medians learned on a training batch, keyed by column name.
pub type NumericFallbacks = BTreeMap<String, f64>;

/// Clean `df` and append the engineered features.
///
/// Columns outside the schema (the label, identifiers) pass through untouched.
pub fn preprocess(df: &DataFrame, fallbacks: &NumericFallbacks) -> Result<DataFrame> {
    let mut out = df.clone();
    let height = df.height();

    // Step 1: categorical imputation
    for column in CATEGORICAL_COLUMNS {
        let values = string_values(df, column)?;
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            continue;
        }
        check_imputable(column, height, missing)?;

        let fill = string_mode(values.iter().flatten().map(String::as_str)).ok_or_else(|| {
            LoanPredictorError::invalid_field(column, "has no observed values")
        })?;
        trace!("Filling {} missing '{}' values with '{}'", missing, column, fill);

        let filled: Vec<String> = values
            .into_iter()
            .map(|v| v.unwrap_or_else(|| fill.clone()))
            .collect();
        out.with_column(Series::new(column.into(), filled))?;
    }

    // Step 2: numeric imputation, always materialized as Float64
    let mut numeric: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for column in NUMERIC_COLUMNS {
        let values = numeric_values(df, column)?;
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            check_imputable(column, height, missing)?;
        }

        let observed: Vec<f64> = values.iter().flatten().copied().collect();
        let filled = if missing == 0 {
            observed
        } else {
            let fill = if DISCRETE_COLUMNS.contains(&column) {
                numeric_mode(&observed)
            } else {
                median(&observed)
            }
            .or_else(|| fallbacks.get(column).copied())
            .ok_or_else(|| LoanPredictorError::invalid_field(column, "has no usable values"))?;
            trace!("Filling {} missing '{}' values with {}", missing, column, fill);

            values.into_iter().map(|v| v.unwrap_or(fill)).collect()
        };
        numeric.insert(column, filled);
    }

    // Step 3
    let total_income: Vec<f64> = numeric[APPLICANT_INCOME]
        .iter()
        .zip(&numeric[COAPPLICANT_INCOME])
        .map(|(a, c)| a + c)
        .collect();

    // Step 4: masked denominators become NaN here and are filled in step 5
    let ratio: Vec<f64> = total_income
        .iter()
        .zip(&numeric[LOAN_AMOUNT])
        .map(|(total, loan)| {
            let denominator = loan * LOAN_AMOUNT_UNIT;
            if denominator.abs() < MIN_DENOMINATOR {
                f64::NAN
            } else {
                total / denominator
            }
        })
        .collect();

    // Step 5
    let mut columns: Vec<(&str, Vec<f64>)> = numeric.into_iter().collect();
    columns.push((TOTAL_INCOME, total_income));
    columns.push((INCOME_TO_LOAN_RATIO, ratio));

    for (column, values) in columns {
        let values = fill_non_finite(column, values, fallbacks)?;
        out.with_column(Series::new(column.into(), values))?;
    }

    debug!("Preprocessed {} rows", height);
    Ok(out)
}

/// Medians of every numeric and engineered column of a preprocessed batch.
pub fn compute_fallbacks(df: &DataFrame) -> Result<NumericFallbacks> {
    let mut fallbacks = NumericFallbacks::new();
    for column in NUMERIC_COLUMNS.iter().chain(DERIVED_COLUMNS.iter()) {
        let values: Vec<f64> = numeric_values(df, column)?.into_iter().flatten().collect();
        if let Some(m) = median(&values) {
            fallbacks.insert(column.to_string(), m);
        }
    }
    Ok(fallbacks)
}

fn check_imputable(column: &str, height: usize, missing: usize) -> Result<()> {
    if height == 1 {
        return Err(LoanPredictorError::missing_fields(vec![column.to_string()]));
    }
    if missing == height {
        return Err(LoanPredictorError::invalid_field(column, "has no observed values"));
    }
    Ok(())
}

fn fill_non_finite(column: &str, mut values: Vec<f64>, fallbacks: &NumericFallbacks) -> Result<Vec<f64>> {
    if values.iter().all(|v| v.is_finite()) {
        return Ok(values);
    }

    let fill = median(&values)
        .or_else(|| fallbacks.get(column).copied())
        .ok_or_else(|| LoanPredictorError::invalid_field(column, "has no finite values"))?;
    trace!("Replacing non-finite '{}' values with {}", column, fill);

    for v in values.iter_mut().filter(|v| !v.is_finite()) {
        *v = fill;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn batch() -> DataFrame {
        df![
            GENDER => [Some("Male"), None, Some("Female"), Some("Male")],
            MARRIED => ["Yes", "No", "Yes", "No"],
            DEPENDENTS => [Some(0.0), Some(1.0), None, Some(1.0)],
            EDUCATION => ["Graduate", "Graduate", "Not Graduate", "Graduate"],
            SELF_EMPLOYED => ["No", "No", "Yes", "No"],
            APPLICANT_INCOME => [Some(5000.0), Some(3000.0), None, Some(4000.0)],
            COAPPLICANT_INCOME => [1000.0, 0.0, 500.0, 0.0],
            LOAN_AMOUNT => [100.0, 0.0, 150.0, 200.0],
            LOAN_AMOUNT_TERM => [360.0, 360.0, 180.0, 360.0],
            CREDIT_HISTORY => [1.0, 0.0, 1.0, 1.0],
            PROPERTY_AREA => ["Urban", "Rural", "Semiurban", "Urban"],
            LOAN_STATUS => ["Y", "N", "Y", "Y"],
        ]
        .unwrap()
    }

    #[test]
    fn test_imputes_missing_values() {
        let out = preprocess(&batch(), &NumericFallbacks::new()).unwrap();

        let gender = string_values(&out, GENDER).unwrap();
        assert_eq!(gender[1].as_deref(), Some("Male"));

        // Discrete column uses the mode
        assert_eq!(numeric_values(&out, DEPENDENTS).unwrap()[2], Some(1.0));
        // Continuous column uses the median of 3000, 4000, 5000
        assert_eq!(numeric_values(&out, APPLICANT_INCOME).unwrap()[2], Some(4000.0));
    }

    #[test]
    fn test_engineered_features() {
        let out = preprocess(&batch(), &NumericFallbacks::new()).unwrap();

        let total = numeric_values(&out, TOTAL_INCOME).unwrap();
        assert_eq!(total[0], Some(6000.0));

        let ratio = numeric_values(&out, INCOME_TO_LOAN_RATIO).unwrap();
        assert_eq!(ratio[0], Some(0.06));
        // Zero loan amount is masked and filled with the median of the other ratios
        let finite = [6000.0 / 100_000.0, 4500.0 / 150_000.0, 4000.0 / 200_000.0];
        assert_eq!(ratio[1], median(&finite));
        assert!(ratio.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn test_input_untouched_and_label_passes_through() {
        let input = batch();
        let out = preprocess(&input, &NumericFallbacks::new()).unwrap();

        assert!(input.column(TOTAL_INCOME).is_err());
        assert_eq!(input.column(GENDER).unwrap().null_count(), 1);
        assert_eq!(
            string_values(&out, LOAN_STATUS).unwrap(),
            string_values(&input, LOAN_STATUS).unwrap()
        );
    }

    #[test]
    fn test_single_row_zero_loan_uses_fallback() {
        let mut row = batch().slice(1, 1);
        row.with_column(Series::new(GENDER.into(), ["Male"])).unwrap();
        let mut fallbacks = NumericFallbacks::new();
        fallbacks.insert(INCOME_TO_LOAN_RATIO.to_string(), 0.04);

        let out = preprocess(&row, &fallbacks).unwrap();
        assert_eq!(numeric_values(&out, INCOME_TO_LOAN_RATIO).unwrap(), vec![Some(0.04)]);
    }

    #[test]
    fn test_single_row_with_missing_value_rejected() {
        let row = batch().slice(1, 1);
        match preprocess(&row, &NumericFallbacks::new()) {
            Err(LoanPredictorError::Validation { fields, .. }) => assert_eq!(fields, vec![GENDER]),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_all_null_column_rejected() {
        let mut df = batch();
        df.with_column(Series::new(
            LOAN_AMOUNT.into(),
            [None::<f64>, None, None, None],
        ))
        .unwrap();
        assert!(matches!(
            preprocess(&df, &NumericFallbacks::new()),
            Err(LoanPredictorError::Validation { .. })
        ));
    }

    #[test]
    fn test_compute_fallbacks() {
        let out = preprocess(&batch(), &NumericFallbacks::new()).unwrap();
        let fallbacks = compute_fallbacks(&out).unwrap();

        assert_eq!(fallbacks.len(), NUMERIC_COLUMNS.len() + DERIVED_COLUMNS.len());
        assert_eq!(fallbacks[LOAN_AMOUNT_TERM], 360.0);
    }
}
