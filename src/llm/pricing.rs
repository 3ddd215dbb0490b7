//! Per-token pricing for the supported models, used to log an estimated cost
//! after each API call.

use crate::error::{PanelError, Result};
use serde_json::Value;

/// USD per 1M tokens.
#[derive(Debug, Clone, Copy)]
pub struct ModelPricing {
    pub input: f64,
    pub cached: f64,
    pub output: f64,
}

const PRICING: &[(&str, ModelPricing)] = &[
    ("gpt-5", ModelPricing { input: 1.250, cached: 0.125, output: 10.000 }),
    ("gpt-5-mini", ModelPricing { input: 0.250, cached: 0.025, output: 2.000 }),
    ("gpt-5-nano", ModelPricing { input: 0.050, cached: 0.005, output: 0.400 }),
];

pub fn pricing_for(model: &str) -> Result<ModelPricing> {
    PRICING
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, p)| *p)
        .ok_or_else(|| {
            let known: Vec<&str> = PRICING.iter().map(|(name, _)| *name).collect();
            PanelError::Config(format!(
                "unknown model '{model}', choose one of: {}",
                known.join(", ")
            ))
        })
}

/// Estimated cost in USD for one API response, from its `usage` block.
pub fn estimate_cost(model: &str, response: &Value) -> Result<f64> {
    let pricing = pricing_for(model)?;
    let usage = &response["usage"];
    let input = token_count(usage, "input_tokens");
    let output = token_count(usage, "output_tokens");
    let cached = usage["input_tokens_details"]["cached_tokens"]
        .as_f64()
        .or_else(|| usage["cached_tokens"].as_f64())
        .unwrap_or(0.0);

    Ok((input / 1_000_000.0) * pricing.input
        + (cached / 1_000_000.0) * pricing.cached
        + (output / 1_000_000.0) * pricing.output)
}

fn token_count(usage: &Value, field: &str) -> f64 {
    usage[field].as_f64().unwrap_or(0.0)
}
