//! Categorical-to-integer encoding with fitted mappings.
//!
//! Codes are dense and assigned in lexicographic order of the distinct values
//! seen during fitting, so the same training data always yields the same
//! mapping. Inference reuses the mapping unchanged.

use crate::error::{LoanPredictorError, Result};
use crate::schema::CATEGORICAL_COLUMNS;
use crate::utils::string_values;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    mappings: BTreeMap<String, BTreeMap<String, u32>>,
}

impl CategoricalEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn a mapping for every categorical column, then encode `df` with it.
    ///
    /// Any previously fitted mapping is replaced.
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        let mut mappings = BTreeMap::new();

        for column in CATEGORICAL_COLUMNS {
            let values = string_values(df, column)?;
            let distinct: BTreeSet<&str> = values.iter().flatten().map(String::as_str).collect();
            let mapping: BTreeMap<String, u32> = distinct
                .into_iter()
                .enumerate()
                .map(|(code, value)| (value.to_string(), code as u32))
                .collect();

            debug!("Encoder for '{}': {} categories", column, mapping.len());
            mappings.insert(column.to_string(), mapping);
        }

        let fitted = Self { mappings };
        let encoded = fitted.transform(df)?;
        *self = fitted;
        Ok(encoded)
    }

    /// Replace each categorical column with its integer codes.
    ///
    /// Fails with `UnknownCategory` for a value absent from the fitted mapping.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut out = df.clone();

        for (column, mapping) in &self.mappings {
            let values = string_values(df, column)?;
            let codes = values
                .iter()
                .map(|value| match value {
                    Some(v) => mapping.get(v).copied().ok_or_else(|| {
                        LoanPredictorError::UnknownCategory {
                            column: column.clone(),
                            value: v.clone(),
                        }
                    }),
                    None => Err(LoanPredictorError::missing_fields(vec![column.clone()])),
                })
                .collect::<Result<Vec<u32>>>()?;

            out.with_column(Series::new(column.as_str().into(), codes))?;
        }

        Ok(out)
    }

    /// Code assigned to `value` in `column`.
    pub fn encode(&self, column: &str, value: &str) -> Result<u32> {
        self.mappings
            .get(column)
            .and_then(|mapping| mapping.get(value).copied())
            .ok_or_else(|| LoanPredictorError::UnknownCategory {
                column: column.to_string(),
                value: value.to_string(),
            })
    }

    /// Known categories of `column`, in code order.
    pub fn categories(&self, column: &str) -> Option<Vec<&str>> {
        self.mappings
            .get(column)
            .map(|mapping| mapping.keys().map(String::as_str).collect())
    }

    pub fn is_fitted(&self) -> bool {
        !self.mappings.is_empty()
    }

    /// Every categorical column must carry a non-empty mapping whose codes
    /// are exactly `0..n`.
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        for column in CATEGORICAL_COLUMNS {
            let mapping = self
                .mappings
                .get(column)
                .ok_or_else(|| format!("encoder has no mapping for '{}'", column))?;
            if mapping.is_empty() {
                return Err(format!("encoder mapping for '{}' is empty", column));
            }
            let codes: BTreeSet<u32> = mapping.values().copied().collect();
            if codes.len() != mapping.len() || codes.iter().any(|c| *c as usize >= mapping.len())
            {
                return Err(format!("encoder codes for '{}' are not dense", column));
            }
        }
        Ok(())
    }
}
