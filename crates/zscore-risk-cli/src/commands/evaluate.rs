use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use zscore_risk_core::{EvaluationOptions, FinancialRecord};

use crate::context;
use crate::input::{self, stdin::StdinPayload};
use crate::GlobalArgs;

/// Arguments for single-record evaluation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct EvaluateArgs {
    /// Path to JSON record file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Company ticker
    #[arg(long, alias = "tic")]
    pub ticker: Option<String>,

    /// Fiscal year
    #[arg(long, alias = "fyear")]
    pub fiscal_year: Option<i32>,

    /// Industry used for the Z-Score weights
    #[arg(long)]
    pub industry: Option<String>,

    /// Current assets
    #[arg(long)]
    pub current_assets: Option<Decimal>,

    /// Current liabilities
    #[arg(long)]
    pub current_liabilities: Option<Decimal>,

    /// Total assets
    #[arg(long)]
    pub total_assets: Option<Decimal>,

    /// Retained earnings
    #[arg(long)]
    pub retained_earnings: Option<Decimal>,

    /// Shareholders' equity (X2 numerator when configured)
    #[arg(long)]
    pub shareholders_equity: Option<Decimal>,

    /// Earnings before interest and taxes
    #[arg(long)]
    pub ebit: Option<Decimal>,

    /// Total sales
    #[arg(long, alias = "sales")]
    pub total_sales: Option<Decimal>,

    /// Total liabilities
    #[arg(long)]
    pub total_liabilities: Option<Decimal>,

    /// Long-term debt (X4 denominator when configured)
    #[arg(long)]
    pub long_term_debt: Option<Decimal>,

    /// Share price
    #[arg(long)]
    pub stock_price: Option<Decimal>,

    /// Shares outstanding
    #[arg(long)]
    pub shares_outstanding: Option<Decimal>,

    /// Pre-computed ratios X1..X5, comma separated (skips derivation)
    #[arg(long, value_delimiter = ',')]
    pub ratios: Option<Vec<Decimal>>,

    /// Also compute the industry-weighted Z-Score
    #[arg(long)]
    pub z_score: bool,

    /// Require total assets and the X4 denominator instead of substituting
    /// the placeholder
    #[arg(long)]
    pub strict: bool,

    /// Include the per-ratio Z-Score breakdown
    #[arg(long)]
    pub explain: bool,
}

pub fn run_evaluate(
    args: EvaluateArgs,
    global: &GlobalArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let record: FinancialRecord = if let Some(ref path) = args.input {
        FinancialRecord::from_json(input::file::read_json_value(path)?)?
    } else if let Some(payload) = input::stdin::read_stdin()? {
        match payload {
            StdinPayload::Json(data) => FinancialRecord::from_json(data)?,
            StdinPayload::Csv(rows) => match rows.as_slice() {
                [row] => FinancialRecord::from_row(row)?,
                _ => return Err("evaluate expects exactly one CSV row; use batch".into()),
            },
        }
    } else {
        record_from_flags(&args)?
    };

    let engine = context::load_engine(global, !args.strict)?;
    let mut options = EvaluationOptions::default();
    if args.z_score || args.explain {
        options = options.with_z_score();
    }
    if let Some(ref industry) = args.industry {
        options = options.for_industry(industry.clone());
    }

    let output = engine.evaluate(&record, &options)?;
    let mut value = serde_json::to_value(&output)?;

    if args.explain {
        let breakdown = engine.explain(&record, options.industry_override.as_deref())?;
        if let Value::Object(ref mut map) = value {
            map.insert("z_score_breakdown".into(), serde_json::to_value(breakdown)?);
        }
    }

    Ok(value)
}

fn record_from_flags(args: &EvaluateArgs) -> Result<FinancialRecord, Box<dyn std::error::Error>> {
    let record = FinancialRecord {
        industry: args.industry.clone(),
        current_assets: args.current_assets,
        current_liabilities: args.current_liabilities,
        total_assets: args.total_assets,
        retained_earnings: args.retained_earnings,
        shareholders_equity: args.shareholders_equity,
        ebit: args.ebit,
        total_sales: args.total_sales,
        total_liabilities: args.total_liabilities,
        long_term_debt: args.long_term_debt,
        stock_price: args.stock_price,
        shares_outstanding: args.shares_outstanding,
        ..FinancialRecord::new(
            args.ticker
                .clone()
                .ok_or("--ticker is required (or provide --input)")?,
            args.fiscal_year
                .ok_or("--fiscal-year is required (or provide --input)")?,
        )
    };

    Ok(match args.ratios.as_deref() {
        Some(&[x1, x2, x3, x4, x5]) => {
            record.with_ratios(zscore_risk_core::RatioVector::new(x1, x2, x3, x4, x5))
        }
        Some(_) => return Err("--ratios takes exactly five values: X1,X2,X3,X4,X5".into()),
        None => record,
    })
}
