//! Per-company stage machine and the sequential multi-company driver.
//!
//! Progress is persisted as artifact presence on disk: each stage writes one
//! file and a company's current stage is derived by inspecting which files
//! exist. Re-running is therefore cheap and idempotent.

use crate::config::Config;
use crate::error::Result;
use crate::llm::{self, pricing, prompts, ResponsesPort};
use crate::master;
use crate::panel::format;
use std::path::PathBuf;
use tracing::{error, info, instrument, warn};

/// Where a company currently stands in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompanyStage {
    AwaitingWebSearch,
    AwaitingStructuring,
    AwaitingFormatting,
    Complete,
}

/// The three artifacts that gate a company's stages.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    pub websearch: PathBuf,
    pub structured: PathBuf,
    pub panel: PathBuf,
}

impl ArtifactPaths {
    pub fn new(config: &Config, bvd_id: &str, model: &str) -> Self {
        Self {
            websearch: config.websearch_response_path(bvd_id, model),
            structured: config.structured_response_path(bvd_id, model),
            panel: config.panel_output_path(bvd_id, model),
        }
    }

    /// Derives the stage from which artifacts exist. The final panel alone
    /// marks a company complete, matching how re-runs skip finished work.
    pub fn stage(&self) -> CompanyStage {
        if self.panel.exists() {
            CompanyStage::Complete
        } else if !self.websearch.exists() {
            CompanyStage::AwaitingWebSearch
        } else if !self.structured.exists() {
            CompanyStage::AwaitingStructuring
        } else {
            CompanyStage::AwaitingFormatting
        }
    }
}

/// Web-search research call for one company; skips if the envelope exists.
#[instrument(skip(config, port))]
pub async fn run_web_search(
    config: &Config,
    port: &dyn ResponsesPort,
    bvd_id: &str,
    model: &str,
) -> Result<()> {
    let path = config.websearch_response_path(bvd_id, model);
    if path.exists() {
        println!("✓ Web search LLM response already exists: {}", path.display());
        return Ok(());
    }
    // Fail on an unknown model before paying for a call
    pricing::pricing_for(model)?;

    let context = master::company_context(&config.master_data_path, bvd_id)?;
    let company_name = first_non_empty(context.iter().map(|r| r.company_name.as_deref()));
    let international_name =
        first_non_empty(context.iter().map(|r| r.company_international_name.as_deref()));

    let prompt = prompts::web_search_prompt(&company_name, &international_name);
    let request = llm::client::web_search_request(model, &prompt);
    let response = port.create_response(&request).await?;
    log_cost(model, &response);

    llm::save_envelope(&path, &response)?;
    println!("✓ Web search response saved: {}", path.display());
    Ok(())
}

/// Structuring call: web-search text + structured rows -> panel JSON envelope.
#[instrument(skip(config, port))]
pub async fn run_structuring(
    config: &Config,
    port: &dyn ResponsesPort,
    bvd_id: &str,
    model: &str,
) -> Result<()> {
    let path = config.structured_response_path(bvd_id, model);
    if path.exists() {
        println!("✓ JSON LLM response already exists: {}", path.display());
        return Ok(());
    }
    pricing::pricing_for(model)?;

    let websearch = llm::load_envelope(&config.websearch_response_path(bvd_id, model))?;
    let llm_text = llm::extract_output_text(&websearch.response)?;
    let context = master::company_context(&config.master_data_path, bvd_id)?;

    let prompt = prompts::structuring_prompt(&llm_text, &context)?;
    let request = llm::client::structuring_request(model, &prompt);
    let response = port.create_response(&request).await?;
    log_cost(model, &response);

    llm::save_envelope(&path, &response)?;
    println!("✓ Structured response saved: {}", path.display());
    Ok(())
}

/// Formatting stage; skips if the panel CSV exists.
pub fn run_format(config: &Config, bvd_id: &str, model: &str) -> Result<()> {
    let path = config.panel_output_path(bvd_id, model);
    if path.exists() {
        println!("✓ Formatted output .csv file already exists.");
        return Ok(());
    }
    let written = format::format_company(config, bvd_id, model)?;
    println!("✓ Panel saved as {}", written.display());
    Ok(())
}

/// Advances one company through its remaining stages until complete.
pub async fn run_company(
    config: &Config,
    port: &dyn ResponsesPort,
    bvd_id: &str,
    model: &str,
) -> Result<()> {
    loop {
        let stage = ArtifactPaths::new(config, bvd_id, model).stage();
        match stage {
            CompanyStage::AwaitingWebSearch => run_web_search(config, port, bvd_id, model).await?,
            CompanyStage::AwaitingStructuring => {
                run_structuring(config, port, bvd_id, model).await?
            }
            CompanyStage::AwaitingFormatting => run_format(config, bvd_id, model)?,
            CompanyStage::Complete => return Ok(()),
        }
    }
}

/// Outcome of a full driver run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub already_complete: usize,
    pub processed: usize,
    pub failed: usize,
}

/// Sequential driver over every company in the master file. A failing stage
/// logs the error and moves on to the next company; artifact presence is the
/// sole resume mechanism.
#[instrument(skip(config, port))]
pub async fn run_all(
    config: &Config,
    port: &dyn ResponsesPort,
    model: &str,
    limit: Option<usize>,
) -> Result<RunSummary> {
    let ids = master::list_company_ids(&config.master_data_path)?;
    let mut summary = RunSummary {
        total: ids.len(),
        ..Default::default()
    };

    let (complete, mut pending): (Vec<String>, Vec<String>) = ids.into_iter().partition(|id| {
        ArtifactPaths::new(config, id, model).stage() == CompanyStage::Complete
    });
    summary.already_complete = complete.len();
    println!(
        "Already processed: {}/{} companies",
        summary.already_complete, summary.total
    );

    if let Some(limit) = limit {
        pending.truncate(limit);
        println!("Limiting to {limit} new companies (skipping already processed ones).");
    }

    for bvd_id in &pending {
        info!(bvd_id = %bvd_id, "processing company");
        println!("\n{}", "=".repeat(60));
        println!("Processing BVD_ID: {bvd_id}");
        println!("{}", "=".repeat(60));

        match run_company(config, port, bvd_id, model).await {
            Ok(()) => summary.processed += 1,
            Err(e) => {
                summary.failed += 1;
                error!(bvd_id = %bvd_id, error = %e, "company failed, moving on");
                println!("✗ {bvd_id} failed: {e}");
            }
        }
    }

    println!("\n{}", "=".repeat(60));
    println!("All processing complete!");
    println!("{}", "=".repeat(60));
    Ok(summary)
}

fn log_cost(model: &str, response: &serde_json::Value) {
    match pricing::estimate_cost(model, response) {
        Ok(cost) => {
            info!(model, cost_usd = cost, "API call estimated cost");
            println!("API call estimated cost: ${cost:.2}");
        }
        Err(e) => warn!(error = %e, "could not estimate API call cost"),
    }
}

fn first_non_empty<'a>(values: impl Iterator<Item = Option<&'a str>>) -> String {
    values
        .flatten()
        .find(|v| !v.is_empty())
        .unwrap_or_default()
        .to_string()
}
