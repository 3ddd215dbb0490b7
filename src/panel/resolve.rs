//! Identifier resolver: exact-string lookup from company display names to
//! BVD identifiers, built once from the Orbis controlling-firms extract.

use crate::error::Result;
use crate::panel::expand::ExpandedRow;
use crate::types::PanelRow;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Name -> BVD_ID. A BTreeMap keeps iteration sorted by name, which makes the
/// map diffable across runs.
pub type IdMap = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
struct OwnershipSourceRow {
    bvd_id_number: Option<String>,
    #[serde(rename = "CompanyName")]
    company_name: Option<String>,
    controlling_bvd_id: Option<String>,
    #[serde(rename = "Orbis_controlling_name")]
    orbis_controlling_name: Option<String>,
}

/// Builds the identifier map from the ownership source table. Resolution
/// order is deliberate: subsidiary names (CompanyName -> bvd_id_number) are
/// loaded first, then controlling-owner names (Orbis_controlling_name ->
/// controlling_bvd_id) override them on key collision.
pub fn build_id_map(path: &Path) -> Result<IdMap> {
    let file = std::fs::File::open(path)?;
    let map = build_id_map_from_reader(file)?;
    debug!(entries = map.len(), "identifier map built");
    Ok(map)
}

pub fn build_id_map_from_reader<R: Read>(reader: R) -> Result<IdMap> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut subsidiaries: IdMap = BTreeMap::new();
    let mut controllers: IdMap = BTreeMap::new();
    for row in csv_reader.deserialize() {
        let row: OwnershipSourceRow = row?;
        if let (Some(name), Some(id)) = (
            non_empty(row.company_name),
            non_empty(row.bvd_id_number),
        ) {
            subsidiaries.insert(name, id);
        }
        if let (Some(name), Some(id)) = (
            non_empty(row.orbis_controlling_name),
            non_empty(row.controlling_bvd_id),
        ) {
            controllers.insert(name, id);
        }
    }

    let mut map = subsidiaries;
    map.extend(controllers);
    Ok(map)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Exact-string lookup; unmatched names stay unresolved, silently.
pub fn resolve_name(map: &IdMap, name: Option<&str>) -> Option<String> {
    name.and_then(|n| map.get(n).cloned())
}

/// Stamps company identity onto each expanded row and resolves parent and
/// ultimate-owner names to identifiers, independently per exploded row.
pub fn map_ids(
    rows: Vec<ExpandedRow>,
    map: &IdMap,
    bvd_id: &str,
    company_orbis_name: &str,
) -> Vec<PanelRow> {
    rows.into_iter()
        .map(|row| {
            let parent_bvd_id = resolve_name(map, row.parent_company_name_orbis.as_deref());
            let guo_bvd_id = resolve_name(map, row.guo.as_deref());
            PanelRow {
                bvd_id: bvd_id.to_string(),
                year: row.year,
                establishment_year: row.establishment_year,
                company_name_orbis: Some(company_orbis_name.to_string()),
                company_name: row.company_name,
                company_international_name: row.company_international_name,
                parent_company_name_orbis: row.parent_company_name_orbis,
                parent_bvd_id,
                parent_company_ownership_years: row.parent_company_ownership_years,
                parent_company_country: row.parent_company_country,
                jv: row.jv,
                guo: row.guo,
                guo_bvd_id,
                guo_country: row.guo_country,
                guo_fav_india: None,
                guo_fav_india_bvd_id: None,
                sources: row.sources,
            }
        })
        .collect()
}
