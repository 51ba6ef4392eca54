use clap::Args;
use serde_json::Value;
use std::collections::BTreeMap;

use zscore_risk_core::batch::BatchOutput;
use zscore_risk_core::record::json_rows;
use zscore_risk_core::{ComputationOutput, EvaluationOptions};

use crate::context;
use crate::input::{self, stdin::StdinPayload};
use crate::GlobalArgs;

/// Arguments for portfolio scoring
#[derive(Args)]
pub struct BatchArgs {
    /// Path to CSV or JSON records (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Apply one industry to every record
    #[arg(long)]
    pub industry: Option<String>,

    /// Also compute the industry-weighted Z-Score
    #[arg(long)]
    pub z_score: bool,

    /// Exit with an error when any record fails
    #[arg(long)]
    pub fail_on_error: bool,
}

pub fn run_batch(
    args: BatchArgs,
    global: &GlobalArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let output = score(&args.input, args.industry.as_deref(), args.z_score, global)?;

    if args.fail_on_error {
        if let Some(first) = output.result.failures.first() {
            return Err(format!(
                "{} of {} records failed; first: {} ({})",
                output.result.summary.failed, output.result.summary.total, first.key, first.reason
            )
            .into());
        }
    }

    Ok(serde_json::to_value(&output)?)
}

/// Read rows from `--input` or stdin and score them with the batch engine.
pub(crate) fn score(
    input_path: &Option<String>,
    industry: Option<&str>,
    with_z_score: bool,
    global: &GlobalArgs,
) -> Result<ComputationOutput<BatchOutput>, Box<dyn std::error::Error>> {
    let rows = read_rows(input_path)?;
    let engine = context::load_engine(global, false)?;

    let mut options = EvaluationOptions::default();
    if with_z_score {
        options = options.with_z_score();
    }
    if let Some(industry) = industry {
        options = options.for_industry(industry);
    }

    Ok(engine.evaluate_rows(&rows, &options)?)
}

fn read_rows(
    input_path: &Option<String>,
) -> Result<Vec<BTreeMap<String, String>>, Box<dyn std::error::Error>> {
    if let Some(path) = input_path {
        if input::file::is_csv(path) {
            input::file::read_csv_rows(path)
        } else {
            Ok(json_rows(input::file::read_json_value(path)?)?)
        }
    } else {
        match input::stdin::read_stdin()? {
            Some(StdinPayload::Csv(rows)) => Ok(rows),
            Some(StdinPayload::Json(value)) => Ok(json_rows(value)?),
            None => Err("--input file is required (or pipe CSV/JSON on stdin)".into()),
        }
    }
}
