//! CLI entry point for training and querying the loan predictor.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use loan_predictor::{
    ApplicantRecord, LoanPredictor, PredictionResult, TrainingResult, generate_sample_data,
    load_csv, write_csv,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

const DEFAULT_MODEL_PATH: &str = "loan_predictor_model.json";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Loan approval prediction",
    long_about = "Train classical classifiers on loan applicant data and score new applicants.\n\n\
                  EXAMPLES:\n  \
                  # Train on 1000 synthetic applicants and save the model\n  \
                  loan-predictor train\n\n  \
                  # Train on a CSV dataset\n  \
                  loan-predictor train --data loans.csv -o model.json\n\n  \
                  # Score the canned demo applicants\n  \
                  loan-predictor demo\n\n  \
                  # Score one applicant given as JSON\n  \
                  loan-predictor predict --json '{\"Gender\": \"Male\", ...}'"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings and results)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Train every model, print the comparison and save the best one
    Train {
        /// Number of synthetic applicants to generate
        #[arg(short = 'n', long, default_value = "1000")]
        samples: usize,

        /// Seed for data generation
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Train on this CSV file instead of synthetic data
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Where to write the model bundle
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        output: PathBuf,
    },

    /// Score one applicant with a saved model
    Predict {
        /// Model bundle to load
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,

        /// Applicant as a JSON object keyed by dataset column names; overrides field flags
        #[arg(long)]
        json: Option<String>,

        #[command(flatten)]
        fields: Fields,
    },

    /// Score four canned applicant profiles
    Demo {
        /// Model bundle to load
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
    },

    /// Train on synthetic data, then prompt for applicants until 'quit'
    Interactive {
        /// Number of synthetic applicants to generate
        #[arg(short = 'n', long, default_value = "1000")]
        samples: usize,

        /// Where to write the model bundle
        #[arg(short, long, default_value = DEFAULT_MODEL_PATH)]
        output: PathBuf,
    },

    /// Write a synthetic dataset to CSV
    Generate {
        /// Number of synthetic applicants to generate
        #[arg(short = 'n', long, default_value = "1000")]
        samples: usize,

        /// Seed for data generation
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Destination CSV file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Applicant attributes given as individual flags.
#[derive(Args, Debug, Default)]
struct Fields {
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    married: Option<String>,
    #[arg(long)]
    dependents: Option<u32>,
    #[arg(long)]
    education: Option<String>,
    #[arg(long)]
    self_employed: Option<String>,
    /// Monthly applicant income
    #[arg(long)]
    applicant_income: Option<f64>,
    /// Monthly co-applicant income
    #[arg(long)]
    coapplicant_income: Option<f64>,
    /// Loan amount in thousands
    #[arg(long)]
    loan_amount: Option<f64>,
    /// Loan term in months
    #[arg(long)]
    loan_amount_term: Option<f64>,
    /// 1 for a good credit history, 0 otherwise
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
    credit_history: Option<u8>,
    #[arg(long)]
    property_area: Option<String>,
}

impl From<Fields> for ApplicantRecord {
    fn from(fields: Fields) -> Self {
        ApplicantRecord {
            gender: fields.gender,
            married: fields.married,
            dependents: fields.dependents,
            education: fields.education,
            self_employed: fields.self_employed,
            applicant_income: fields.applicant_income,
            coapplicant_income: fields.coapplicant_income,
            loan_amount: fields.loan_amount,
            loan_amount_term: fields.loan_amount_term,
            credit_history: fields.credit_history.map(|c| c == 1),
            property_area: fields.property_area,
        }
    }
}

/// Initialize the tracing subscriber for logging.
fn init_logging(level: &str, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.quiet);

    match cli.command {
        Command::Train {
            samples,
            seed,
            data,
            output,
        } => run_train(samples, seed, data.as_deref(), &output),
        Command::Predict {
            model,
            json,
            fields,
        } => run_predict(&model, json.as_deref(), fields),
        Command::Demo { model } => run_demo(&model),
        Command::Interactive { samples, output } => run_interactive(samples, &output),
        Command::Generate {
            samples,
            seed,
            output,
        } => {
            let mut df = generate_sample_data(samples, seed)?;
            write_csv(&mut df, &output)?;
            println!("Wrote {} applicants to {}", df.height(), output.display());
            Ok(())
        }
    }
}

// =============================================================================
// Subcommands
// =============================================================================

fn run_train(samples: usize, seed: u64, data: Option<&Path>, output: &Path) -> Result<()> {
    let df = match data {
        Some(path) => {
            if !path.exists() {
                return Err(anyhow!("Input file not found: {}", path.display()));
            }
            load_csv(path)?
        }
        None => {
            info!("Generating {} synthetic applicants (seed {})", samples, seed);
            generate_sample_data(samples, seed)?
        }
    };

    let mut predictor = LoanPredictor::default();
    let result = predictor.train_detailed(&df)?;
    print_training_summary(&result);

    predictor
        .save_model(output)
        .with_context(|| format!("failed to save model to {}", output.display()))?;
    println!("\nModel saved to {}", output.display());
    Ok(())
}

fn run_predict(model: &Path, json: Option<&str>, fields: Fields) -> Result<()> {
    let predictor = LoanPredictor::from_file(model)?;

    let record: ApplicantRecord = match json {
        Some(raw) => serde_json::from_str(raw).context("invalid applicant JSON")?,
        None => fields.into(),
    };

    let result = predictor.predict_loan(&record)?;
    print_prediction(&result);
    Ok(())
}

fn run_demo(model: &Path) -> Result<()> {
    let predictor = LoanPredictor::from_file(model)?;

    println!("LOAN PREDICTION DEMO");
    println!("{}", "=".repeat(50));

    for (name, record) in demo_profiles() {
        println!("\nApplicant: {}", name);
        println!("{}", "-".repeat(30));
        print_applicant(&record);

        match predictor.predict_loan(&record) {
            Ok(result) => print_prediction(&result),
            Err(e) => println!("Error making prediction: {}", e),
        }
        println!("{}", "=".repeat(50));
    }
    Ok(())
}

fn run_interactive(samples: usize, output: &Path) -> Result<()> {
    let df = generate_sample_data(samples, 42)?;
    let mut predictor = LoanPredictor::default();
    let result = predictor.train_detailed(&df)?;
    print_training_summary(&result);
    predictor.save_model(output)?;

    println!("\n{}", "=".repeat(50));
    println!("LOAN PREDICTION SYSTEM");
    println!("{}", "=".repeat(50));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("\nEnter applicant details (or 'quit' to exit):");
        let Some(answers) = prompt_applicant(&mut lines)? else {
            println!("Goodbye!");
            return Ok(());
        };

        let outcome = answers
            .to_record()
            .and_then(|record| Ok(predictor.predict_loan(&record)?));
        match outcome {
            Ok(result) => print_prediction(&result),
            Err(e) => println!("Error: {}", e),
        }
    }
}

// =============================================================================
// Interactive Input
// =============================================================================

/// Raw answers to the interactive prompts, one per applicant attribute.
#[derive(Debug)]
struct Answers {
    gender: String,
    married: String,
    dependents: String,
    education: String,
    self_employed: String,
    applicant_income: String,
    coapplicant_income: String,
    loan_amount: String,
    loan_amount_term: String,
    credit_history: String,
    property_area: String,
}

impl Answers {
    /// Blank answers become missing attributes; anything else must parse.
    fn to_record(&self) -> Result<ApplicantRecord> {
        Ok(ApplicantRecord {
            gender: text(&self.gender),
            married: text(&self.married),
            dependents: number("Number of Dependents", &self.dependents)?,
            education: text(&self.education),
            self_employed: text(&self.self_employed),
            applicant_income: number("Applicant Income", &self.applicant_income)?,
            coapplicant_income: number("Coapplicant Income", &self.coapplicant_income)?,
            loan_amount: number("Loan Amount", &self.loan_amount)?,
            loan_amount_term: number("Loan Amount Term", &self.loan_amount_term)?,
            credit_history: credit_history(&self.credit_history)?,
            property_area: text(&self.property_area),
        })
    }
}

fn text(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

fn number<T: FromStr>(label: &str, raw: &str) -> Result<Option<T>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| anyhow!("Invalid value for {}: '{}'", label, raw))
}

fn credit_history(raw: &str) -> Result<Option<bool>> {
    match raw.trim() {
        "" => Ok(None),
        "1" | "1.0" => Ok(Some(true)),
        "0" | "0.0" => Ok(Some(false)),
        other => Err(anyhow!(
            "Invalid value for Credit History: '{}' (expected 0 or 1)",
            other
        )),
    }
}

/// Reads one applicant from stdin. `None` on `quit` or end of input.
fn prompt_applicant(
    lines: &mut impl Iterator<Item = io::Result<String>>,
) -> Result<Option<Answers>> {
    let Some(gender) = prompt(lines, "Gender (Male/Female): ")? else {
        return Ok(None);
    };
    if gender.eq_ignore_ascii_case("quit") {
        return Ok(None);
    }

    let mut ask = |label: &str| -> Result<String> {
        prompt(lines, label)?.ok_or_else(|| anyhow!("unexpected end of input"))
    };

    Ok(Some(Answers {
        gender,
        married: ask("Married (Yes/No): ")?,
        dependents: ask("Number of Dependents (0-3): ")?,
        education: ask("Education (Graduate/Not Graduate): ")?,
        self_employed: ask("Self Employed (Yes/No): ")?,
        applicant_income: ask("Applicant Income: ")?,
        coapplicant_income: ask("Coapplicant Income: ")?,
        loan_amount: ask("Loan Amount (in thousands): ")?,
        loan_amount_term: ask("Loan Amount Term (in months): ")?,
        credit_history: ask("Credit History (0/1): ")?,
        property_area: ask("Property Area (Urban/Semiurban/Rural): ")?,
    }))
}

fn prompt(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    label: &str,
) -> Result<Option<String>> {
    print!("{}", label);
    io::stdout().flush()?;
    match lines.next() {
        Some(line) => Ok(Some(line?.trim().to_string())),
        None => Ok(None),
    }
}

// =============================================================================
// Output
// =============================================================================

fn print_training_summary(result: &TrainingResult) {
    println!("\n{}", "=".repeat(60));
    println!("MODEL COMPARISON");
    println!("{}", "=".repeat(60));
    println!(
        "{:<20} {:>10} {:>10} {:>10}",
        "Model", "Test", "Train", "Time (s)"
    );
    println!("{}", "-".repeat(60));
    for model in &result.model_comparison {
        println!(
            "{:<20} {:>10.4} {:>10.4} {:>10.3}",
            model.name, model.test_score, model.train_score, model.training_time_seconds
        );
    }
    println!("{}", "-".repeat(60));
    println!(
        "Best model: {} ({} train / {} test rows, {:.2}s)",
        result.best_model_name, result.train_rows, result.test_rows, result.training_time_seconds
    );

    if !result.feature_importance.is_empty() {
        println!("\nTop features:");
        for (name, importance) in result.feature_importance.iter().take(5) {
            println!("  {:<22} {:.4}", name, importance);
        }
    }
}

fn print_applicant(record: &ApplicantRecord) {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let number = |v: Option<f64>| v.unwrap_or_default();

    println!("Gender: {}, Married: {}", text(&record.gender), text(&record.married));
    println!(
        "Education: {}, Dependents: {}",
        text(&record.education),
        record.dependents.unwrap_or_default()
    );
    println!(
        "Income: ${:.0} + ${:.0}",
        number(record.applicant_income),
        number(record.coapplicant_income)
    );
    println!(
        "Loan Amount: ${:.0}k, Term: {:.0} months",
        number(record.loan_amount),
        number(record.loan_amount_term)
    );
    println!(
        "Credit History: {}",
        if record.credit_history.unwrap_or(false) { "Good" } else { "Poor" }
    );
    println!("Property Area: {}", text(&record.property_area));
}

fn print_prediction(result: &PredictionResult) {
    println!("\nPREDICTION RESULT:");
    println!(
        "Status: {}",
        if result.approved { "APPROVED" } else { "REJECTED" }
    );
    println!("Approval Probability: {:.1}%", result.probability * 100.0);
    println!("Model Used: {}", result.model_used);
}

fn demo_profiles() -> Vec<(&'static str, ApplicantRecord)> {
    vec![
        (
            "High Income Graduate",
            ApplicantRecord::new()
                .gender("Male")
                .married("Yes")
                .dependents(1)
                .education("Graduate")
                .self_employed("No")
                .applicant_income(8000.0)
                .coapplicant_income(3000.0)
                .loan_amount(150.0)
                .loan_amount_term(360.0)
                .credit_history(true)
                .property_area("Urban"),
        ),
        (
            "Low Income, Poor Credit",
            ApplicantRecord::new()
                .gender("Female")
                .married("No")
                .dependents(3)
                .education("Not Graduate")
                .self_employed("Yes")
                .applicant_income(2500.0)
                .coapplicant_income(0.0)
                .loan_amount(200.0)
                .loan_amount_term(240.0)
                .credit_history(false)
                .property_area("Rural"),
        ),
        (
            "Middle Class Family",
            ApplicantRecord::new()
                .gender("Male")
                .married("Yes")
                .dependents(2)
                .education("Graduate")
                .self_employed("No")
                .applicant_income(5000.0)
                .coapplicant_income(2500.0)
                .loan_amount(120.0)
                .loan_amount_term(360.0)
                .credit_history(true)
                .property_area("Semiurban"),
        ),
        (
            "Self-Employed Entrepreneur",
            ApplicantRecord::new()
                .gender("Female")
                .married("Yes")
                .dependents(0)
                .education("Graduate")
                .self_employed("Yes")
                .applicant_income(6000.0)
                .coapplicant_income(1500.0)
                .loan_amount(180.0)
                .loan_amount_term(300.0)
                .credit_history(true)
                .property_area("Urban"),
        ),
    ]
}
