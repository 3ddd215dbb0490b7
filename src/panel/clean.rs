//! Final cleanup: null out pre-establishment rows the model may have
//! hallucinated, normalize "no data" markers, canonicalize country names.

use crate::types::{is_na_sentinel, PanelRow};

/// Applies the cleanup passes in order: pre-establishment nulling, sentinel
/// normalization, country canonicalization. Establishment year and the JV
/// flag were already coerced to nullable integers at parse time.
pub fn clean_rows(rows: &mut [PanelRow]) {
    for row in rows.iter_mut() {
        null_pre_establishment(row);
        normalize_sentinels(row);
        canonicalize_countries(row);
    }
}

/// A company cannot have owners before it existed. Strictly before the
/// establishment year every column except identifier, year, establishment
/// year, and sources goes missing.
fn null_pre_establishment(row: &mut PanelRow) {
    let Some(establishment_year) = row.establishment_year else {
        return;
    };
    if row.year >= establishment_year {
        return;
    }
    row.company_name_orbis = None;
    row.company_name = None;
    row.company_international_name = None;
    row.parent_company_name_orbis = None;
    row.parent_bvd_id = None;
    row.parent_company_ownership_years = None;
    row.parent_company_country = None;
    row.jv = None;
    row.guo = None;
    row.guo_bvd_id = None;
    row.guo_country = None;
    row.guo_fav_india = None;
    row.guo_fav_india_bvd_id = None;
}

fn normalize_sentinels(row: &mut PanelRow) {
    for field in string_fields(row) {
        if field.as_deref().is_some_and(is_na_sentinel) {
            *field = None;
        }
    }
}

fn canonicalize_countries(row: &mut PanelRow) {
    for country in [&mut row.parent_company_country, &mut row.guo_country] {
        if country.as_deref() == Some("USA") {
            *country = Some("United States".to_string());
        }
    }
}

fn string_fields(row: &mut PanelRow) -> [&mut Option<String>; 13] {
    [
        &mut row.company_name_orbis,
        &mut row.company_name,
        &mut row.company_international_name,
        &mut row.parent_company_name_orbis,
        &mut row.parent_bvd_id,
        &mut row.parent_company_ownership_years,
        &mut row.parent_company_country,
        &mut row.guo,
        &mut row.guo_bvd_id,
        &mut row.guo_country,
        &mut row.guo_fav_india,
        &mut row.guo_fav_india_bvd_id,
        &mut row.sources,
    ]
}
