//! Synthetic loan dataset generation.
//!
//! The generator makes the pipeline self-contained when no real dataset is
//! wired in. Attribute distributions and the approval weights below are a
//! design choice for demonstration, not a model of real lending decisions:
//!
//! ```text
//! score = 0.3·[Credit_History = 1]
//!       + 0.2·[ApplicantIncome > 4000]
//!       + 0.1·[Education = Graduate]
//!       + 0.1·[Married = Yes]
//!       + 0.1·[Property_Area = Urban]
//!       + 0.2·U(0, 1)
//! Loan_Status = "Y" if score > 0.5 else "N"
//! ```
//!
//! Good credit plus any one other signal clears the threshold, so the label
//! is dominated by credit history with income as the next strongest signal.

use crate::error::{LoanPredictorError, Result};
use crate::schema::*;
use polars::prelude::*;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;
use tracing::debug;

const GENDERS: [&str; 2] = ["Male", "Female"];
const YES_NO: [&str; 2] = ["Yes", "No"];
const EDUCATION_LEVELS: [&str; 2] = ["Graduate", "Not Graduate"];
const PROPERTY_AREAS: [&str; 3] = ["Urban", "Semiurban", "Rural"];
const DEPENDENT_COUNTS: [f64; 4] = [0.0, 1.0, 2.0, 3.0];
const LOAN_TERMS: [f64; 4] = [360.0, 240.0, 180.0, 120.0];

const GOOD_CREDIT_PROBABILITY: f64 = 0.8;
const INCOME_SIGNAL_THRESHOLD: f64 = 4000.0;
const APPROVAL_THRESHOLD: f64 = 0.5;

/// Generate `n_samples` labeled applicant rows, reproducible for a given `seed`.
///
/// Columns are drawn one at a time from a single seeded generator, so the
/// same `(n_samples, seed)` pair always yields the same frame.
pub fn generate_sample_data(n_samples: usize, seed: u64) -> Result<DataFrame> {
    if n_samples == 0 {
        return Err(LoanPredictorError::InvalidConfig(
            "n_samples must be at least 1".to_string(),
        ));
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let gender = pick(&mut rng, &GENDERS, n_samples);
    let married = pick(&mut rng, &YES_NO, n_samples);
    let dependents = pick(&mut rng, &DEPENDENT_COUNTS, n_samples);
    let education = pick(&mut rng, &EDUCATION_LEVELS, n_samples);
    let self_employed = pick(&mut rng, &YES_NO, n_samples);
    let applicant_income = draw_amounts(&mut rng, 5000.0, 2000.0, n_samples)?;
    let coapplicant_income = draw_amounts(&mut rng, 2000.0, 1500.0, n_samples)?;
    let loan_amount = draw_amounts(&mut rng, 150.0, 50.0, n_samples)?;
    let loan_amount_term = pick(&mut rng, &LOAN_TERMS, n_samples);
    let credit_history: Vec<f64> = (0..n_samples)
        .map(|_| {
            if rng.gen_bool(GOOD_CREDIT_PROBABILITY) {
                1.0
            } else {
                0.0
            }
        })
        .collect();
    let property_area = pick(&mut rng, &PROPERTY_AREAS, n_samples);

    let loan_status: Vec<&str> = (0..n_samples)
        .map(|i| {
            let score = 0.3 * indicator(credit_history[i] == 1.0)
                + 0.2 * indicator(applicant_income[i] > INCOME_SIGNAL_THRESHOLD)
                + 0.1 * indicator(education[i] == "Graduate")
                + 0.1 * indicator(married[i] == "Yes")
                + 0.1 * indicator(property_area[i] == "Urban")
                + 0.2 * rng.r#gen::<f64>();
            if score > APPROVAL_THRESHOLD { "Y" } else { "N" }
        })
        .collect();

    let approved = loan_status.iter().filter(|s| **s == "Y").count();
    debug!(
        "Generated {} synthetic applicants ({} approved, seed {})",
        n_samples, approved, seed
    );

    let df = DataFrame::new(vec![
        Series::new(GENDER.into(), gender).into(),
        Series::new(MARRIED.into(), married).into(),
        Series::new(DEPENDENTS.into(), dependents).into(),
        Series::new(EDUCATION.into(), education).into(),
        Series::new(SELF_EMPLOYED.into(), self_employed).into(),
        Series::new(APPLICANT_INCOME.into(), applicant_income).into(),
        Series::new(COAPPLICANT_INCOME.into(), coapplicant_income).into(),
        Series::new(LOAN_AMOUNT.into(), loan_amount).into(),
        Series::new(LOAN_AMOUNT_TERM.into(), loan_amount_term).into(),
        Series::new(CREDIT_HISTORY.into(), credit_history).into(),
        Series::new(PROPERTY_AREA.into(), property_area).into(),
        Series::new(LOAN_STATUS.into(), loan_status).into(),
    ])?;

    Ok(df)
}

fn pick<T: Copy>(rng: &mut StdRng, choices: &[T], n: usize) -> Vec<T> {
    (0..n)
        .map(|_| choices[rng.gen_range(0..choices.len())])
        .collect()
}

/// Normal draws truncated toward zero to whole units and floored at zero.
fn draw_amounts(rng: &mut StdRng, mean: f64, std_dev: f64, n: usize) -> Result<Vec<f64>> {
    let normal = Normal::new(mean, std_dev)
        .map_err(|e| LoanPredictorError::InvalidConfig(e.to_string()))?;
    Ok((0..n)
        .map(|_| normal.sample(rng).trunc().max(0.0))
        .collect())
}

fn indicator(condition: bool) -> f64 {
    if condition { 1.0 } else { 0.0 }
}
