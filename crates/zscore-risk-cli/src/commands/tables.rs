use clap::Args;
use serde_json::{json, Value};

use crate::context;
use crate::GlobalArgs;

/// Arguments for the zone table
#[derive(Args)]
pub struct ZonesArgs {
    /// Classify this probability instead of listing the bands
    #[arg(long)]
    pub probability: Option<rust_decimal::Decimal>,
}

/// Arguments for the weight table
#[derive(Args)]
pub struct WeightsArgs {
    /// Show a single industry
    #[arg(long)]
    pub industry: Option<String>,
}

pub fn run_zones(
    args: ZonesArgs,
    global: &GlobalArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let table = context::load_config(global)?.zone_table()?;

    if let Some(p) = args.probability {
        let zone = table.classify(p)?;
        return Ok(json!({ "result": { "probability": p, "risk_zone": zone } }));
    }

    let bands: Vec<Value> = table
        .bands()
        .iter()
        .map(|b| json!({ "risk_zone": b.zone, "probability": b.describe() }))
        .collect();
    Ok(json!({ "result": { "bands": bands, "thresholds": table.thresholds() } }))
}

pub fn run_weights(
    args: WeightsArgs,
    global: &GlobalArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    let weights = context::load_config(global)?.weight_table();

    let rows: Vec<Value> = match args.industry {
        Some(ref industry) => vec![weight_row(industry, weights.lookup(industry)?.as_array())],
        None => weights
            .industries()
            .map(|(industry, w)| weight_row(industry, w.as_array()))
            .collect(),
    };
    Ok(json!({ "result": { "weights": rows } }))
}

fn weight_row(industry: &str, weights: [rust_decimal::Decimal; 5]) -> Value {
    let mut row = serde_json::Map::new();
    row.insert("industry".into(), json!(industry));
    for (name, w) in ["X1", "X2", "X3", "X4", "X5"].iter().zip(weights) {
        row.insert((*name).into(), json!(w));
    }
    Value::Object(row)
}
