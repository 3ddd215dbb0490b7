//! Master company file: built once from the two Bureau van Dijk extracts and
//! consulted by every later stage for company names and IDs.

use crate::config::Config;
use crate::error::{PanelError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, instrument};

/// One row of the master file: a (company, year) observation left-joined with
/// its ownership edges for that year. A company-year with several parents
/// appears once per parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterRecord {
    #[serde(rename = "BVD_ID")]
    pub bvd_id: String,
    pub year: Option<i64>,
    pub company_name: Option<String>,
    pub company_international_name: Option<String>,
    pub type_of_entity: Option<String>,
    pub category_public: Option<String>,
    #[serde(rename = "parent_BVD_ID")]
    pub parent_bvd_id: Option<String>,
    pub parent_company_name_orbis: Option<String>,
    pub parent_company_name: Option<String>,
    pub parent_company_start_year_ownership: Option<f64>,
    pub parent_company_end_year_ownership: Option<f64>,
}

/// Firms panel extract row (`ALL_BvDID_all_firms_update`), pipeline columns only.
#[derive(Debug, Clone, Deserialize)]
struct FirmsRow {
    bvd_id_number: Option<String>,
    year: Option<i64>,
    #[serde(rename = "CompanyName")]
    company_name: Option<String>,
    name_internat: Option<String>,
    type_of_entity: Option<String>,
    listed_delisted_unlisted: Option<String>,
}

/// Orbis controlling-firms extract row (`PANEL_controlling_firms_orbis`).
#[derive(Debug, Clone, Deserialize)]
pub struct OwnershipEdge {
    pub bvd_id_number: Option<String>,
    pub controlling_bvd_id: Option<String>,
    pub year_of_control: Option<f64>,
    #[serde(rename = "Orbis_controlling_name")]
    pub orbis_controlling_name: Option<String>,
    pub controlling_firm_name: Option<String>,
    pub start_year: Option<f64>,
    pub end_year: Option<f64>,
}

/// Builds the master company file by left-joining the firms panel with the
/// ownership edges on (BVD_ID, year). Returns the number of rows written.
#[instrument(skip(config))]
pub fn merge_raw(config: &Config, firms_file: &str, orbis_file: &str) -> Result<usize> {
    let firms_path = config.raw_data_path.join(firms_file);
    let orbis_path = config.raw_data_path.join(orbis_file);

    let mut firms: Vec<FirmsRow> = Vec::new();
    let mut reader = csv::Reader::from_path(&firms_path)?;
    for row in reader.deserialize() {
        let row: FirmsRow = row?;
        if row.bvd_id_number.is_none() {
            continue;
        }
        firms.push(row);
    }
    firms.sort_by(|a, b| {
        (a.bvd_id_number.as_deref(), a.year).cmp(&(b.bvd_id_number.as_deref(), b.year))
    });

    // Ownership edges keyed by (subsidiary, year of control); a company-year
    // can carry several concurrent parents.
    let mut edges: HashMap<(String, i64), Vec<OwnershipEdge>> = HashMap::new();
    let mut reader = csv::Reader::from_path(&orbis_path)?;
    for row in reader.deserialize() {
        let row: OwnershipEdge = row?;
        if row.orbis_controlling_name.as_deref().map_or(true, str::is_empty) {
            continue;
        }
        if let (Some(id), Some(year)) = (row.bvd_id_number.clone(), row.year_of_control) {
            edges.entry((id, year as i64)).or_default().push(row);
        }
    }

    if let Some(parent) = config.master_data_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(&config.master_data_path)?;
    let mut written = 0;
    for firm in &firms {
        let bvd_id = firm
            .bvd_id_number
            .clone()
            .ok_or_else(|| PanelError::MissingField("bvd_id_number".to_string()))?;
        let base = MasterRecord {
            bvd_id: bvd_id.clone(),
            year: firm.year,
            company_name: firm.company_name.clone(),
            company_international_name: firm.name_internat.clone(),
            type_of_entity: firm.type_of_entity.clone(),
            category_public: firm.listed_delisted_unlisted.clone(),
            parent_bvd_id: None,
            parent_company_name_orbis: None,
            parent_company_name: None,
            parent_company_start_year_ownership: None,
            parent_company_end_year_ownership: None,
        };
        let matches = firm
            .year
            .and_then(|year| edges.get(&(bvd_id.clone(), year)));
        match matches {
            Some(year_edges) => {
                for edge in year_edges {
                    let mut record = base.clone();
                    record.parent_bvd_id = edge.controlling_bvd_id.clone();
                    record.parent_company_name_orbis = edge.orbis_controlling_name.clone();
                    record.parent_company_name = edge.controlling_firm_name.clone();
                    record.parent_company_start_year_ownership = edge.start_year;
                    record.parent_company_end_year_ownership = edge.end_year;
                    writer.serialize(&record)?;
                    written += 1;
                }
            }
            None => {
                writer.serialize(&base)?;
                written += 1;
            }
        }
    }
    writer.flush()?;

    info!(rows = written, path = %config.master_data_path.display(), "master file written");
    Ok(written)
}

/// Canonical Orbis display name for a company, looked up by BVD_ID.
pub fn company_orbis_name(master_path: &Path, bvd_id: &str) -> Result<String> {
    let mut reader = csv::Reader::from_path(master_path)?;
    for row in reader.deserialize() {
        let row: MasterRecord = row?;
        if row.bvd_id == bvd_id {
            if let Some(name) = row.company_name {
                return Ok(name);
            }
        }
    }
    Err(PanelError::MissingField(format!(
        "company name for BVD_ID {bvd_id} in master file"
    )))
}

/// Distinct BVD_IDs from the master file, in first-appearance order.
pub fn list_company_ids(master_path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_path(master_path)?;
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::new();
    for row in reader.deserialize() {
        let row: MasterRecord = row?;
        if row.bvd_id.is_empty() {
            continue;
        }
        if seen.insert(row.bvd_id.clone()) {
            ids.push(row.bvd_id);
        }
    }
    Ok(ids)
}

/// The structured rows handed to the LLM as context for one company.
/// Ownership spans are composed into a "{start} - {end}" string; a span with
/// neither bound renders empty.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyContextRow {
    pub year: Option<i64>,
    pub company_name: Option<String>,
    pub company_international_name: Option<String>,
    pub parent_company_name_orbis: Option<String>,
    pub parent_company_start_year_ownership: Option<i64>,
    pub parent_company_end_year_ownership: Option<i64>,
    pub parent_company_ownership_years: String,
}

pub fn company_context(master_path: &Path, bvd_id: &str) -> Result<Vec<CompanyContextRow>> {
    let mut reader = csv::Reader::from_path(master_path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        let row: MasterRecord = row?;
        if row.bvd_id != bvd_id {
            continue;
        }
        rows.push(CompanyContextRow {
            year: row.year,
            company_name: row.company_name,
            company_international_name: row.company_international_name,
            parent_company_name_orbis: row.parent_company_name_orbis,
            parent_company_start_year_ownership: row
                .parent_company_start_year_ownership
                .map(|y| y as i64),
            parent_company_end_year_ownership: row
                .parent_company_end_year_ownership
                .map(|y| y as i64),
            parent_company_ownership_years: ownership_years(
                row.parent_company_start_year_ownership,
                row.parent_company_end_year_ownership,
            ),
        });
    }
    if rows.is_empty() {
        return Err(PanelError::MissingField(format!(
            "BVD_ID {bvd_id} in master file"
        )));
    }
    Ok(rows)
}

fn ownership_years(start: Option<f64>, end: Option<f64>) -> String {
    let start = start.map_or(0, |y| y as i64);
    let end = end.map_or(0, |y| y as i64);
    if start == 0 && end == 0 {
        String::new()
    } else {
        format!("{start} - {end}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MASTER_CSV: &str = "\
BVD_ID,year,company_name,company_international_name,type_of_entity,category_public,parent_BVD_ID,parent_company_name_orbis,parent_company_name,parent_company_start_year_ownership,parent_company_end_year_ownership
IN001,1995,Acme Ltd,Acme,Corporate,Listed,,,,,
IN001,1996,Acme Ltd,Acme,Corporate,Listed,IN900,Beta Corp,Beta,1996.0,2005.0
IN002,1995,Gamma Ltd,Gamma,Corporate,Unlisted,,,,,
";

    fn master_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(MASTER_CSV.as_bytes()).unwrap();
        file
    }

    #[test]
    fn looks_up_company_name_by_id() {
        let file = master_file();
        assert_eq!(company_orbis_name(file.path(), "IN001").unwrap(), "Acme Ltd");
        assert!(company_orbis_name(file.path(), "IN999").is_err());
    }

    #[test]
    fn lists_distinct_ids_in_order() {
        let file = master_file();
        assert_eq!(
            list_company_ids(file.path()).unwrap(),
            vec!["IN001".to_string(), "IN002".to_string()]
        );
    }

    #[test]
    fn composes_ownership_year_spans() {
        assert_eq!(ownership_years(Some(1998.0), Some(2005.0)), "1998 - 2005");
        assert_eq!(ownership_years(None, Some(2005.0)), "0 - 2005");
        assert_eq!(ownership_years(None, None), "");
    }

    #[test]
    fn merge_raw_left_joins_ownership_edges() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::config::Config {
            raw_data_path: dir.path().to_path_buf(),
            raw_ownership_data_path: dir.path().join("orbis.csv"),
            master_data_path: dir.path().join("master.csv"),
            llm_responses_data_path: dir.path().join("responses"),
            company_folder_path: dir.path().join("companies"),
            processed_data_path: dir.path().join("processed"),
            chatgpt_key: None,
            openai_base_url: String::new(),
        };

        fs::write(
            dir.path().join("firms.csv"),
            "\
bvd_id_number,old_bvdidnumber,CompanyCode,year,CompanyName,name_internat,type_of_entity,size_category,listed_delisted_unlisted
IN002,X2,C2,1995,Gamma Ltd,Gamma,Corporate,Large,Unlisted
IN001,X1,C1,1996,Acme Ltd,Acme,Corporate,Large,Listed
IN001,X1,C1,1995,Acme Ltd,Acme,Corporate,Large,Listed
",
        )
        .unwrap();
        fs::write(
            dir.path().join("orbis.csv"),
            "\
bvd_id_number,controlling_bvd_id,year_of_control,Orbis_controlling_name,controlling_firm_name,start_year,end_year
IN001,IN900,1996.0,Beta Corp,Beta,1996.0,2005.0
IN001,IN901,1996.0,Delta GmbH,Delta,1994.0,1999.0
IN001,IN902,1997.0,,NoName,1997.0,1998.0
",
        )
        .unwrap();

        let written = merge_raw(&config, "firms.csv", "orbis.csv").unwrap();
        // IN001/1995 and IN002/1995 unmatched, IN001/1996 matches two edges;
        // the edge with an empty Orbis name is dropped.
        assert_eq!(written, 4);

        let mut reader = csv::Reader::from_path(&config.master_data_path).unwrap();
        let rows: Vec<MasterRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        // Sorted by (BVD_ID, year)
        assert_eq!(rows[0].bvd_id, "IN001");
        assert_eq!(rows[0].year, Some(1995));
        assert_eq!(rows[0].parent_company_name_orbis, None);
        assert_eq!(rows[1].parent_company_name_orbis.as_deref(), Some("Beta Corp"));
        assert_eq!(rows[2].parent_company_name_orbis.as_deref(), Some("Delta GmbH"));
        assert_eq!(rows[1].parent_bvd_id.as_deref(), Some("IN900"));
        assert_eq!(rows[3].bvd_id, "IN002");
        assert_eq!(rows[3].category_public.as_deref(), Some("Unlisted"));
    }

    #[test]
    fn company_context_filters_and_composes() {
        let file = master_file();
        let rows = company_context(file.path(), "IN001").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].parent_company_ownership_years, "");
        assert_eq!(rows[1].parent_company_ownership_years, "1996 - 2005");
        assert_eq!(rows[1].parent_company_name_orbis.as_deref(), Some("Beta Corp"));
    }
}
