//! India-favored ultimate owner: when a year lists several co-owners, surface
//! the India-headquartered one for downstream analysis.

use crate::panel::resolve::{resolve_name, IdMap};
use crate::types::PanelRow;
use std::collections::HashMap;

/// Fills `GUO_fav_India` and its identifier on every row. The year map is
/// last-write-wins when a year has several India-headquartered co-owners, so
/// one of them can shadow the others for that year.
pub fn favor_india(rows: &mut [PanelRow], map: &IdMap) {
    let mut india_by_year: HashMap<i64, Option<String>> = HashMap::new();
    for row in rows.iter() {
        if row.guo_country.as_deref() == Some("India") {
            india_by_year.insert(row.year, row.guo.clone());
        }
    }

    for row in rows.iter_mut() {
        let favored = india_by_year
            .get(&row.year)
            .and_then(Clone::clone)
            .or_else(|| row.guo.clone());
        row.guo_fav_india_bvd_id = resolve_name(map, favored.as_deref());
        row.guo_fav_india = favored;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn row(year: i64, guo: Option<&str>, guo_country: Option<&str>) -> PanelRow {
        PanelRow {
            bvd_id: "IN001".to_string(),
            year,
            establishment_year: None,
            company_name_orbis: None,
            company_name: None,
            company_international_name: None,
            parent_company_name_orbis: None,
            parent_bvd_id: None,
            parent_company_ownership_years: None,
            parent_company_country: None,
            jv: None,
            guo: guo.map(str::to_string),
            guo_bvd_id: None,
            guo_country: guo_country.map(str::to_string),
            guo_fav_india: None,
            guo_fav_india_bvd_id: None,
            sources: None,
        }
    }

    fn id_map() -> IdMap {
        let mut map = BTreeMap::new();
        map.insert("Desi Holdings".to_string(), "IN800".to_string());
        map
    }

    #[test]
    fn prefers_india_owner_from_a_co_owner_row_of_the_same_year() {
        let mut rows = vec![
            row(2000, Some("Foreign Corp"), Some("Germany")),
            row(2000, Some("Desi Holdings"), Some("India")),
        ];
        favor_india(&mut rows, &id_map());
        assert_eq!(rows[0].guo_fav_india.as_deref(), Some("Desi Holdings"));
        assert_eq!(rows[0].guo_fav_india_bvd_id.as_deref(), Some("IN800"));
        assert_eq!(rows[1].guo_fav_india.as_deref(), Some("Desi Holdings"));
    }

    #[test]
    fn falls_back_to_own_guo_when_no_india_owner_exists() {
        let mut rows = vec![
            row(2001, Some("Foreign Corp"), Some("Germany")),
            row(2002, None, None),
        ];
        favor_india(&mut rows, &id_map());
        assert_eq!(rows[0].guo_fav_india.as_deref(), Some("Foreign Corp"));
        assert_eq!(rows[0].guo_fav_india_bvd_id, None);
        assert_eq!(rows[1].guo_fav_india, None);
    }

    #[test]
    fn india_preference_is_scoped_per_year() {
        let mut rows = vec![
            row(2000, Some("Desi Holdings"), Some("India")),
            row(2001, Some("Foreign Corp"), Some("Germany")),
        ];
        favor_india(&mut rows, &id_map());
        assert_eq!(rows[0].guo_fav_india.as_deref(), Some("Desi Holdings"));
        assert_eq!(rows[1].guo_fav_india.as_deref(), Some("Foreign Corp"));
    }

    #[test]
    fn india_row_with_missing_guo_falls_back() {
        // A later India row with no GUO overwrites the year entry; the lookup
        // then yields nothing and the row's own GUO applies.
        let mut rows = vec![
            row(2000, Some("Desi Holdings"), Some("India")),
            row(2000, None, Some("India")),
            row(2000, Some("Foreign Corp"), Some("Germany")),
        ];
        favor_india(&mut rows, &id_map());
        assert_eq!(rows[2].guo_fav_india.as_deref(), Some("Foreign Corp"));
    }
}
