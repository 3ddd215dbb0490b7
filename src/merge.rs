//! Concatenates every per-company panel CSV into one processed master file.

use crate::config::Config;
use crate::error::Result;
use crate::types::PanelRow;
use std::fs;
use tracing::{info, instrument};

pub const PROCESSED_MASTER_NAME: &str = "processed_master_file";

/// Reads all `*.csv` files in the company folder (sorted by name for a
/// deterministic row order) and writes them as one CSV. Returns
/// (files merged, rows written).
#[instrument(skip(config))]
pub fn merge_processed(config: &Config) -> Result<(usize, usize)> {
    let mut files: Vec<_> = fs::read_dir(&config.company_folder_path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    files.sort();

    fs::create_dir_all(&config.processed_data_path)?;
    let output_path = config
        .processed_data_path
        .join(format!("{PROCESSED_MASTER_NAME}.csv"));
    let mut writer = csv::Writer::from_path(&output_path)?;

    let mut rows = 0;
    for file in &files {
        let mut reader = csv::Reader::from_path(file)?;
        for row in reader.deserialize() {
            let row: PanelRow = row?;
            writer.serialize(&row)?;
            rows += 1;
        }
    }
    writer.flush()?;

    info!(files = files.len(), rows, path = %output_path.display(), "processed master written");
    Ok((files.len(), rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::format::write_panel_csv;

    fn row(bvd_id: &str, year: i64) -> PanelRow {
        PanelRow {
            bvd_id: bvd_id.to_string(),
            year,
            establishment_year: Some(1990),
            company_name_orbis: Some("Acme Ltd".to_string()),
            company_name: None,
            company_international_name: None,
            parent_company_name_orbis: None,
            parent_bvd_id: None,
            parent_company_ownership_years: None,
            parent_company_country: None,
            jv: None,
            guo: None,
            guo_bvd_id: None,
            guo_country: None,
            guo_fav_india: None,
            guo_fav_india_bvd_id: None,
            sources: None,
        }
    }

    #[test]
    fn merges_per_company_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            raw_data_path: dir.path().to_path_buf(),
            raw_ownership_data_path: dir.path().join("ownership.csv"),
            master_data_path: dir.path().join("master.csv"),
            llm_responses_data_path: dir.path().join("responses"),
            company_folder_path: dir.path().join("companies"),
            processed_data_path: dir.path().join("processed"),
            chatgpt_key: None,
            openai_base_url: String::new(),
        };

        write_panel_csv(
            &config.company_folder_path.join("IN002_gpt-5_panel.csv"),
            &[row("IN002", 1995)],
        )
        .unwrap();
        write_panel_csv(
            &config.company_folder_path.join("IN001_gpt-5_panel.csv"),
            &[row("IN001", 1995), row("IN001", 1996)],
        )
        .unwrap();

        let (files, rows) = merge_processed(&config).unwrap();
        assert_eq!(files, 2);
        assert_eq!(rows, 3);

        let output = config.processed_data_path.join("processed_master_file.csv");
        let mut reader = csv::Reader::from_path(output).unwrap();
        let merged: Vec<PanelRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(merged[0].bvd_id, "IN001");
        assert_eq!(merged[2].bvd_id, "IN002");
    }
}
