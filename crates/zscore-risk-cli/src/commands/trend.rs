use clap::Args;
use serde_json::{json, Value};

use zscore_risk_core::portfolio::{PortfolioView, TrendQuery};

use crate::commands::batch;
use crate::GlobalArgs;

/// Arguments for the industry → company → year-range drill-down
#[derive(Args)]
pub struct TrendArgs {
    /// Path to CSV or JSON records (reads stdin when omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Industry to drill into; lists industries when omitted
    #[arg(long)]
    pub industry: Option<String>,

    /// Company ticker; lists the industry's companies when omitted
    #[arg(long, alias = "tic")]
    pub ticker: Option<String>,

    /// First fiscal year (inclusive)
    #[arg(long = "from")]
    pub from_year: Option<i32>,

    /// Last fiscal year (inclusive)
    #[arg(long = "to")]
    pub to_year: Option<i32>,
}

pub fn run_trend(
    args: TrendArgs,
    global: &GlobalArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let output = batch::score(&args.input, None, false, global)?;
    let view = PortfolioView::new(&output.result.scored);

    let result = match (args.industry, args.ticker) {
        (None, _) => {
            let industries: Vec<Value> = view
                .industries()
                .into_iter()
                .map(|industry| {
                    let companies = view.tickers(&industry).len();
                    json!({ "industry": industry, "companies": companies })
                })
                .collect();
            json!({ "industries": industries })
        }
        (Some(industry), None) => {
            let companies: Vec<Value> = view
                .tickers(&industry)
                .into_iter()
                .map(|ticker| {
                    let (first, last) = view.year_range(&industry, &ticker).unwrap_or_default();
                    json!({ "tic": ticker, "first_year": first, "last_year": last })
                })
                .collect();
            if companies.is_empty() {
                return Err(format!("no scored records in industry {industry}").into());
            }
            json!({ "industry": industry, "companies": companies })
        }
        (Some(industry), Some(ticker)) => {
            let trend = view.company_trend(&TrendQuery {
                industry,
                ticker,
                from_year: args.from_year,
                to_year: args.to_year,
            })?;
            serde_json::to_value(trend)?
        }
    };

    Ok(json!({
        "result": result,
        "methodology": "Risk trend: discriminant probability and zone per fiscal year",
        "warnings": output
            .result
            .failures
            .iter()
            .map(|f| format!("{} excluded: {}", f.key, f.reason))
            .collect::<Vec<_>>(),
        "metadata": output.metadata,
    }))
}
