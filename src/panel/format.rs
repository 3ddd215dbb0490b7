//! The formatting stage: structured LLM response -> cleaned per-company
//! panel CSV.

use crate::config::Config;
use crate::error::{PanelError, Result};
use crate::llm::{extract_output_text, load_envelope};
use crate::master;
use crate::panel::{clean, expand, guo, resolve};
use crate::types::{LlmPanelRecord, PanelRow};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// Runs the whole transformation for one company and writes
/// `{bvd_id}_{model}_panel.csv`. Returns the output path.
#[instrument(skip(config))]
pub fn format_company(config: &Config, bvd_id: &str, model: &str) -> Result<PathBuf> {
    let company_name = master::company_orbis_name(&config.master_data_path, bvd_id)?;
    let id_map = resolve::build_id_map(&config.raw_ownership_data_path)?;

    let envelope = load_envelope(&config.structured_response_path(bvd_id, model))?;
    let text = extract_output_text(&envelope.response)?;
    let records = parse_panel_records(&text)?;

    let expanded = expand::expand_records(records);
    let mut rows = resolve::map_ids(expanded, &id_map, bvd_id, &company_name);
    guo::favor_india(&mut rows, &id_map);
    clean::clean_rows(&mut rows);

    let output_path = config.panel_output_path(bvd_id, model);
    write_panel_csv(&output_path, &rows)?;
    info!(rows = rows.len(), path = %output_path.display(), "panel written");
    Ok(output_path)
}

pub fn write_panel_csv(path: &Path, rows: &[PanelRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Parses the structuring call's output text. The model is asked for plain
/// JSON; both a records array and a column-oriented object map are accepted.
pub fn parse_panel_records(text: &str) -> Result<Vec<LlmPanelRecord>> {
    let value: Value = serde_json::from_str(strip_code_fence(text))?;
    let records: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::Object(map) if map.values().all(Value::is_object) && !map.is_empty() => {
            pivot_columns(map)?
        }
        Value::Object(map) => vec![Value::Object(map)],
        other => {
            return Err(PanelError::Api {
                message: format!("panel JSON must be an array or object, got {other}"),
            })
        }
    };
    records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(PanelError::from))
        .collect()
}

/// Column-oriented form: `{"year": {"0": 1995, ...}, "company_name": {...}}`.
/// Row keys are ordered numerically where possible.
fn pivot_columns(columns: Map<String, Value>) -> Result<Vec<Value>> {
    let mut row_keys: Vec<String> = Vec::new();
    for column in columns.values() {
        if let Value::Object(cells) = column {
            for key in cells.keys() {
                if !row_keys.contains(key) {
                    row_keys.push(key.clone());
                }
            }
        }
    }
    row_keys.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    });

    let mut rows = Vec::with_capacity(row_keys.len());
    for row_key in &row_keys {
        let mut row = Map::new();
        for (column_name, column) in &columns {
            let cell = column.get(row_key).cloned().unwrap_or(Value::Null);
            row.insert(column_name.clone(), cell);
        }
        rows.push(Value::Object(row));
    }
    Ok(rows)
}

/// The model occasionally wraps its JSON in a markdown fence despite being
/// told not to; strip it rather than fail the company.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
