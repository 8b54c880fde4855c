//! Shared column access and statistics helpers.

use crate::error::{LoanPredictorError, Result};
use polars::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Column Access
// =============================================================================

/// Borrow a column as a materialized Series, reporting absent columns as invalid data.
pub fn series<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|c| c.as_materialized_series())
        .map_err(|_| LoanPredictorError::InvalidData(format!("column '{}' not found", name)))
}

/// Read a column as optional `f64` values, casting from any numeric dtype.
pub fn numeric_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let cast = series(df, name)?.cast(&DataType::Float64)?;
    let values = cast.f64()?;
    Ok(values.into_iter().collect())
}

/// Read a column as optional strings.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let cast = series(df, name)?.cast(&DataType::String)?;
    let values = cast.str()?;
    Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
}

// =============================================================================
// Statistics
// =============================================================================

/// Median of finite values; `None` when there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(|a, b| a.total_cmp(b));

    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some((finite[mid - 1] + finite[mid]) / 2.0)
    } else {
        Some(finite[mid])
    }
}

/// Most frequent finite value; ties go to the smallest value.
pub fn numeric_mode(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    finite.sort_by(|a, b| a.total_cmp(b));

    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < finite.len() {
        let mut j = i;
        while j < finite.len() && finite[j] == finite[i] {
            j += 1;
        }
        let count = j - i;
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((finite[i], count));
        }
        i = j;
    }

    best.map(|(value, _)| value)
}

/// Most frequent string; ties go to the lexicographically smallest value.
pub fn string_mode<'a>(values: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }

    best.map(|(value, _)| value.to_string())
}

/// Fraction of positions where `a` and `b` agree.
pub fn accuracy(predicted: &[bool], actual: &[bool]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(actual)
        .filter(|(p, a)| p == a)
        .count();
    correct as f64 / actual.len() as f64
}
