//! Conversions between applicant records, polars frames and model matrices.

use crate::error::{LoanPredictorError, Result};
use crate::schema::*;
use crate::types::ApplicantRecord;
use crate::utils::{numeric_values, series, string_values};
use ndarray::{Array1, Array2};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

// =============================================================================
// Records
// =============================================================================

/// Build a frame with one row per record; absent attributes become nulls.
pub fn records_to_frame(records: &[ApplicantRecord]) -> Result<DataFrame> {
    let text = |name: &str, f: fn(&ApplicantRecord) -> Option<String>| -> Column {
        let values: Vec<Option<String>> = records.iter().map(f).collect();
        Series::new(name.into(), values).into()
    };
    let number = |name: &str, f: fn(&ApplicantRecord) -> Option<f64>| -> Column {
        let values: Vec<Option<f64>> = records.iter().map(f).collect();
        Series::new(name.into(), values).into()
    };

    let df = DataFrame::new(vec![
        text(GENDER, |r| r.gender.clone()),
        text(MARRIED, |r| r.married.clone()),
        number(DEPENDENTS, |r| r.dependents.map(f64::from)),
        text(EDUCATION, |r| r.education.clone()),
        text(SELF_EMPLOYED, |r| r.self_employed.clone()),
        number(APPLICANT_INCOME, |r| r.applicant_income),
        number(COAPPLICANT_INCOME, |r| r.coapplicant_income),
        number(LOAN_AMOUNT, |r| r.loan_amount),
        number(LOAN_AMOUNT_TERM, |r| r.loan_amount_term),
        number(CREDIT_HISTORY, |r| {
            r.credit_history.map(|c| if c { 1.0 } else { 0.0 })
        }),
        text(PROPERTY_AREA, |r| r.property_area.clone()),
    ])?;

    Ok(df)
}

// =============================================================================
// Model Inputs
// =============================================================================

/// Dense feature matrix in `feature_columns` order.
///
/// Columns absent from `df` are filled with zeros; every present column must
/// be numeric without nulls, which holds after preprocessing and encoding.
pub fn feature_matrix(df: &DataFrame, feature_columns: &[String]) -> Result<Array2<f64>> {
    let mut x = Array2::<f64>::zeros((df.height(), feature_columns.len()));

    for (j, column) in feature_columns.iter().enumerate() {
        if df.column(column).is_err() {
            debug!("Feature '{}' absent from input, defaulting to 0", column);
            continue;
        }
        for (i, value) in numeric_values(df, column)?.into_iter().enumerate() {
            x[[i, j]] = value.ok_or_else(|| {
                LoanPredictorError::InvalidData(format!(
                    "feature '{}' has a missing value at row {}",
                    column, i
                ))
            })?;
        }
    }

    Ok(x)
}

/// Binary labels from `Loan_Status`: `"Y"` → 1.0, `"N"` → 0.0.
pub fn labels(df: &DataFrame) -> Result<Array1<f64>> {
    string_values(df, LOAN_STATUS)?
        .into_iter()
        .enumerate()
        .map(|(i, status)| match status.as_deref().map(str::trim) {
            Some("Y") => Ok(1.0),
            Some("N") => Ok(0.0),
            other => Err(LoanPredictorError::InvalidData(format!(
                "{} must be 'Y' or 'N', got {:?} at row {}",
                LOAN_STATUS, other, i
            ))),
        })
        .collect()
}

/// Shuffle row indices with a seeded generator and split off `ceil(test_size · n)` test rows.
///
/// Both partitions are kept non-empty whenever `n >= 2`.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let max_test = n_rows.saturating_sub(1).max(1);
    let n_test = ((test_size * n_rows as f64).ceil() as usize).clamp(1, max_test);
    let train = indices.split_off(n_test);
    (train, indices)
}

// =============================================================================
// CSV
// =============================================================================

/// Read a loan dataset from CSV.
///
/// `Dependents` values such as `"3+"` become `3`; numeric schema columns are
/// cast to `Float64`, with unparsable entries becoming nulls.
pub fn load_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let mut df = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    if df.column(DEPENDENTS).is_ok() {
        let dependents: Vec<Option<f64>> = string_values(&df, DEPENDENTS)?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().trim_end_matches('+').parse::<f64>().ok()))
            .collect();
        df.with_column(Series::new(DEPENDENTS.into(), dependents))?;
    }

    for column in NUMERIC_COLUMNS {
        if df.column(column).is_ok() {
            let cast = series(&df, column)?.cast(&DataType::Float64)?;
            df.with_column(cast)?;
        }
    }

    info!(
        "Loaded {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(df)
}

/// Write `df` as CSV with a header row.
pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    info!("Dataset saved: {}", path.as_ref().display());
    Ok(())
}
