use crate::error::{PanelError, Result};
use std::env;
use std::path::PathBuf;

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Pipeline configuration, loaded from the environment (a `.env` file is
/// picked up by the binary before this runs).
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the raw firms and Orbis CSV extracts.
    pub raw_data_path: PathBuf,
    /// Orbis controlling-firms extract used to build the name -> BVD_ID map.
    pub raw_ownership_data_path: PathBuf,
    /// Master company file produced by `merge-raw`.
    pub master_data_path: PathBuf,
    /// Directory for raw LLM response envelopes.
    pub llm_responses_data_path: PathBuf,
    /// Directory for per-company panel CSVs.
    pub company_folder_path: PathBuf,
    /// Directory for the concatenated processed master file.
    pub processed_data_path: PathBuf,
    /// OpenAI API key; only required by the LLM stages.
    pub chatgpt_key: Option<String>,
    pub openai_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            raw_data_path: require("RAW_DATA_PATH")?.into(),
            raw_ownership_data_path: require("RAW_OWNERSHIP_DATA_PATH")?.into(),
            master_data_path: require("MASTER_DATA_PATH")?.into(),
            llm_responses_data_path: require("LLM_RESPONSES_DATA_PATH")?.into(),
            company_folder_path: require("COMPANY_FOLDER_PATH")?.into(),
            processed_data_path: require("PROCESSED_DATA_PATH")?.into(),
            chatgpt_key: env::var("CHATGPT_KEY").ok().filter(|k| !k.trim().is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
        })
    }

    pub fn websearch_response_path(&self, bvd_id: &str, model: &str) -> PathBuf {
        self.llm_responses_data_path
            .join(format!("{bvd_id}_{model}_websearch.json"))
    }

    pub fn structured_response_path(&self, bvd_id: &str, model: &str) -> PathBuf {
        self.llm_responses_data_path
            .join(format!("{bvd_id}_{model}_json.json"))
    }

    pub fn panel_output_path(&self, bvd_id: &str, model: &str) -> PathBuf {
        self.company_folder_path
            .join(format!("{bvd_id}_{model}_panel.csv"))
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name)
        .map_err(|_| PanelError::Config(format!("environment variable {name} must be set")))
        .and_then(|v| {
            if v.trim().is_empty() {
                Err(PanelError::Config(format!(
                    "environment variable {name} must not be empty"
                )))
            } else {
                Ok(v)
            }
        })
}
