//! OpenAI Responses API client and the on-disk envelope format for raw
//! responses. Stages never re-call the API when an envelope already exists,
//! so the envelope is the durable artifact of each LLM stage.

use crate::config::Config;
use crate::error::{PanelError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Seam for the Responses API so stage logic can be driven by a stub in tests.
#[async_trait::async_trait]
pub trait ResponsesPort: Send + Sync {
    async fn create_response(&self, request: &Value) -> Result<Value>;
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config
            .chatgpt_key
            .clone()
            .ok_or_else(|| PanelError::Config("CHATGPT_KEY must be set for LLM calls".to_string()))?;
        Ok(Self::new(api_key, config.openai_base_url.clone()))
    }
}

#[async_trait::async_trait]
impl ResponsesPort for OpenAiClient {
    async fn create_response(&self, request: &Value) -> Result<Value> {
        let url = format!("{}/responses", self.base_url.trim_end_matches('/'));
        debug!(%url, "calling Responses API");
        let started = std::time::Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PanelError::Api {
                message: format!("Responses API returned {status}: {body}"),
            });
        }

        let body: Value = response.json().await?;
        info!(elapsed_secs = started.elapsed().as_secs_f64(), "Responses API call finished");
        Ok(body)
    }
}

/// Raw API response plus the moment it was captured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub timestamp: DateTime<Utc>,
    pub response: Value,
}

pub fn save_envelope(path: &Path, response: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let envelope = ResponseEnvelope {
        timestamp: Utc::now(),
        response: response.clone(),
    };
    fs::write(path, serde_json::to_string_pretty(&envelope)?)?;
    Ok(())
}

pub fn load_envelope(path: &Path) -> Result<ResponseEnvelope> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Pulls the model's output text out of a Responses API body: the first
/// `output[]` item carrying `content[0].text`. The response shape is a fixed
/// contract, so absence is a loud error.
pub fn extract_output_text(response: &Value) -> Result<String> {
    let output = response
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| PanelError::MissingField("response.output".to_string()))?;

    for item in output {
        if let Some(text) = item
            .get("content")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("text"))
            .and_then(Value::as_str)
        {
            return Ok(text.to_string());
        }
    }

    Err(PanelError::MissingField(
        "response.output[].content[0].text".to_string(),
    ))
}

/// Request body for the web-search research call.
pub fn web_search_request(model: &str, prompt: &str) -> Value {
    serde_json::json!({
        "model": model,
        "tools": [{"type": "web_search"}],
        "input": prompt,
    })
}

/// Request body for the structuring call (code-interpreter tool).
pub fn structuring_request(model: &str, prompt: &str) -> Value {
    serde_json::json!({
        "model": model,
        "tools": [{"type": "code_interpreter", "container": {"type": "auto"}}],
        "input": [{"role": "user", "content": prompt}],
    })
}
