//! Column names of the applicant schema.
//!
//! The schema is fixed: every dataset and record uses these names, and the
//! feature list produced by training is derived from them in this order.

pub const GENDER: &str = "Gender";
pub const MARRIED: &str = "Married";
pub const DEPENDENTS: &str = "Dependents";
pub const EDUCATION: &str = "Education";
pub const SELF_EMPLOYED: &str = "Self_Employed";
pub const APPLICANT_INCOME: &str = "ApplicantIncome";
pub const COAPPLICANT_INCOME: &str = "CoapplicantIncome";
pub const LOAN_AMOUNT: &str = "LoanAmount";
pub const LOAN_AMOUNT_TERM: &str = "Loan_Amount_Term";
pub const CREDIT_HISTORY: &str = "Credit_History";
pub const PROPERTY_AREA: &str = "Property_Area";

/// Label column, `"Y"` for approved and `"N"` otherwise.
pub const LOAN_STATUS: &str = "Loan_Status";

pub const TOTAL_INCOME: &str = "Total_Income";
pub const INCOME_TO_LOAN_RATIO: &str = "Income_to_Loan_Ratio";

/// Applicant attributes in schema order.
pub const RECORD_COLUMNS: [&str; 11] = [
    GENDER,
    MARRIED,
    DEPENDENTS,
    EDUCATION,
    SELF_EMPLOYED,
    APPLICANT_INCOME,
    COAPPLICANT_INCOME,
    LOAN_AMOUNT,
    LOAN_AMOUNT_TERM,
    CREDIT_HISTORY,
    PROPERTY_AREA,
];

/// Attributes encoded to integer codes by the categorical encoder.
pub const CATEGORICAL_COLUMNS: [&str; 5] =
    [GENDER, MARRIED, EDUCATION, SELF_EMPLOYED, PROPERTY_AREA];

/// Attributes stored as `Float64`.
pub const NUMERIC_COLUMNS: [&str; 6] = [
    DEPENDENTS,
    APPLICANT_INCOME,
    COAPPLICANT_INCOME,
    LOAN_AMOUNT,
    LOAN_AMOUNT_TERM,
    CREDIT_HISTORY,
];

/// Numeric attributes with a small discrete domain; imputed by mode, not median.
pub const DISCRETE_COLUMNS: [&str; 3] = [DEPENDENTS, LOAN_AMOUNT_TERM, CREDIT_HISTORY];

/// Engineered features appended by the preprocessor.
pub const DERIVED_COLUMNS: [&str; 2] = [TOTAL_INCOME, INCOME_TO_LOAN_RATIO];

/// Full feature list in model input order.
pub fn feature_columns() -> Vec<String> {
    RECORD_COLUMNS
        .iter()
        .chain(DERIVED_COLUMNS.iter())
        .map(|c| c.to_string())
        .collect()
}

/// Whether `column` is one of the categorical attributes.
pub fn is_categorical(column: &str) -> bool {
    CATEGORICAL_COLUMNS.contains(&column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_columns_order() {
        let cols = feature_columns();
        assert_eq!(cols.len(), 13);
        assert_eq!(cols[0], GENDER);
        assert_eq!(cols[10], PROPERTY_AREA);
        assert_eq!(cols[12], INCOME_TO_LOAN_RATIO);
        assert!(!cols.iter().any(|c| c == LOAN_STATUS));
    }

    #[test]
    fn test_categorical_and_numeric_partition_record() {
        for col in RECORD_COLUMNS {
            assert!(is_categorical(col) ^ NUMERIC_COLUMNS.contains(&col));
        }
    }
}
