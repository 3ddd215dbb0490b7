//! Row normalizer: one record per company-year becomes one row per
//! (parent, ownership-span) tuple when a year lists several co-owners.

use crate::types::{nested_to_list, LlmPanelRecord};

/// A single company-year observation after the multi-valued columns have been
/// exploded; every nested column now holds at most one value.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedRow {
    pub year: i64,
    pub company_name: Option<String>,
    pub company_international_name: Option<String>,
    pub establishment_year: Option<i64>,
    pub jv: Option<i64>,
    pub sources: Option<String>,
    pub parent_company_name_orbis: Option<String>,
    pub parent_company_country: Option<String>,
    pub guo: Option<String>,
    pub guo_country: Option<String>,
    pub parent_company_ownership_years: Option<String>,
}

/// Cyclically repeats `values` up to `target_len`. An empty input becomes all
/// placeholders so the row's non-nested columns are never lost.
fn repeat_to_length(values: Vec<Option<String>>, target_len: usize) -> Vec<Option<String>> {
    if values.is_empty() {
        return vec![None; target_len];
    }
    values.into_iter().cycle().take(target_len).collect()
}

/// Explodes the five nested columns of each record together. Co-listed values
/// are treated as positionally aligned; shorter lists repeat cyclically up to
/// the per-row maximum length.
pub fn expand_records(records: Vec<LlmPanelRecord>) -> Vec<ExpandedRow> {
    let mut rows = Vec::new();
    for record in records {
        let parents = nested_to_list(record.parent_company_name_orbis);
        let parent_countries = nested_to_list(record.parent_company_country);
        let guos = nested_to_list(record.guo);
        let guo_countries = nested_to_list(record.guo_country);
        let spans = nested_to_list(record.parent_company_ownership_years);

        let max_len = [&parents, &parent_countries, &guos, &guo_countries, &spans]
            .iter()
            .map(|list| list.len())
            .max()
            .unwrap_or(1)
            .max(1);

        let parents = repeat_to_length(parents, max_len);
        let parent_countries = repeat_to_length(parent_countries, max_len);
        let guos = repeat_to_length(guos, max_len);
        let guo_countries = repeat_to_length(guo_countries, max_len);
        let spans = repeat_to_length(spans, max_len);

        let sources = join_sources(nested_to_list(record.sources));

        for i in 0..max_len {
            rows.push(ExpandedRow {
                year: record.year,
                company_name: record.company_name.clone(),
                company_international_name: record.company_international_name.clone(),
                establishment_year: record.establishment_year,
                jv: record.jv,
                sources: sources.clone(),
                parent_company_name_orbis: parents[i].clone(),
                parent_company_country: parent_countries[i].clone(),
                guo: guos[i].clone(),
                guo_country: guo_countries[i].clone(),
                parent_company_ownership_years: spans[i].clone(),
            });
        }
    }
    rows
}

/// Sources are informational, not positional; several URLs collapse into one
/// "; "-separated cell duplicated across the exploded rows.
fn join_sources(values: Vec<Option<String>>) -> Option<String> {
    let urls: Vec<String> = values.into_iter().flatten().collect();
    if urls.is_empty() {
        None
    } else {
        Some(urls.join("; "))
    }
}
