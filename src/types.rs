use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// String markers the LLM uses for "no data"; normalized to true missing values.
pub const NA_SENTINELS: &[&str] = &[
    "",
    "None",
    "NA (independent)",
    "NA",
    "N/A",
    "N/A (not yet incorporated)",
    "[]",
    "<NA>",
    "Not applicable (standalone)",
];

pub fn is_na_sentinel(s: &str) -> bool {
    NA_SENTINELS.contains(&s)
}

/// A JSON field that carries either one value or several co-occurring values
/// (joint ventures list multiple parents/owners in a single cell).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

/// Loosely-typed scalar as emitted by the model: establishment years arrive as
/// numbers or strings, JV flags occasionally as booleans.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    pub fn into_text(self) -> String {
        match self {
            ScalarValue::Bool(b) => if b { "1" } else { "0" }.to_string(),
            ScalarValue::Int(i) => i.to_string(),
            ScalarValue::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                (f as i64).to_string()
            }
            ScalarValue::Float(f) => f.to_string(),
            ScalarValue::Text(s) => s,
        }
    }
}

/// One of the five multi-valued columns: scalar, null, or list of scalars.
pub type NestedField = Option<OneOrMany<Option<ScalarValue>>>;

/// Normalizes a nested field to a sequence immediately on ingestion.
/// `null` becomes a length-1 placeholder; an empty list stays empty and is
/// padded out later during expansion.
pub fn nested_to_list(field: NestedField) -> Vec<Option<String>> {
    match field {
        None => vec![None],
        Some(OneOrMany::One(v)) => vec![v.map(ScalarValue::into_text)],
        Some(OneOrMany::Many(vs)) => {
            vs.into_iter().map(|v| v.map(ScalarValue::into_text)).collect()
        }
    }
}

/// One row per (company, year) as produced by the structuring LLM call.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmPanelRecord {
    #[serde(deserialize_with = "de_year")]
    pub year: i64,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub company_international_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_int")]
    pub establishment_year: Option<i64>,
    #[serde(default)]
    pub parent_company_name_orbis: NestedField,
    #[serde(default)]
    pub parent_company_country: NestedField,
    #[serde(default, rename = "JV", deserialize_with = "de_opt_int")]
    pub jv: Option<i64>,
    #[serde(default, rename = "GUO")]
    pub guo: NestedField,
    #[serde(default, rename = "GUO_country")]
    pub guo_country: NestedField,
    #[serde(default)]
    pub parent_company_ownership_years: NestedField,
    #[serde(default)]
    pub sources: NestedField,
}

/// Final per-company panel row. Field order here fixes the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelRow {
    #[serde(rename = "BVD_ID")]
    pub bvd_id: String,
    pub year: i64,
    pub establishment_year: Option<i64>,
    pub company_name_orbis: Option<String>,
    pub company_name: Option<String>,
    pub company_international_name: Option<String>,
    pub parent_company_name_orbis: Option<String>,
    #[serde(rename = "parent_BVD_ID")]
    pub parent_bvd_id: Option<String>,
    pub parent_company_ownership_years: Option<String>,
    pub parent_company_country: Option<String>,
    #[serde(rename = "JV")]
    pub jv: Option<i64>,
    #[serde(rename = "GUO")]
    pub guo: Option<String>,
    #[serde(rename = "GUO_BVD_ID")]
    pub guo_bvd_id: Option<String>,
    #[serde(rename = "GUO_country")]
    pub guo_country: Option<String>,
    #[serde(rename = "GUO_fav_India")]
    pub guo_fav_india: Option<String>,
    #[serde(rename = "GUO_fav_India_BVD_ID")]
    pub guo_fav_india_bvd_id: Option<String>,
    pub sources: Option<String>,
}

fn coerce_int(value: Value) -> std::result::Result<Option<i64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(i64::from(b))),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 {
                    Ok(Some(f as i64))
                } else {
                    Err(format!("non-integral number {f}"))
                }
            } else {
                Err(format!("unrepresentable number {n}"))
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if is_na_sentinel(trimmed) {
                return Ok(None);
            }
            let parsed: f64 = trimmed
                .parse()
                .map_err(|_| format!("non-numeric string {trimmed:?}"))?;
            if parsed.fract() == 0.0 {
                Ok(Some(parsed as i64))
            } else {
                Err(format!("non-integral number {trimmed:?}"))
            }
        }
        other => Err(format!("unexpected JSON value {other}")),
    }
}

/// Nullable integer that tolerates float-shaped JSON numbers ("2005.0") and
/// sentinel strings; anything else fails loudly.
fn de_opt_int<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<i64>, D::Error> {
    let value = Value::deserialize(d)?;
    coerce_int(value).map_err(serde::de::Error::custom)
}

fn de_year<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<i64, D::Error> {
    let value = Value::deserialize(d)?;
    coerce_int(value)
        .map_err(serde::de::Error::custom)?
        .ok_or_else(|| serde::de::Error::custom("year must not be null"))
}

fn de_opt_text<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    let value: Option<ScalarValue> = Option::deserialize(d)?;
    Ok(value.map(ScalarValue::into_text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_field_parses_scalar_list_and_null() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default)]
            field: NestedField,
        }

        let scalar: Row = serde_json::from_str(r#"{"field": "Acme Inc"}"#).unwrap();
        assert_eq!(nested_to_list(scalar.field), vec![Some("Acme Inc".to_string())]);

        let list: Row = serde_json::from_str(r#"{"field": ["A", null, 1998]}"#).unwrap();
        assert_eq!(
            nested_to_list(list.field),
            vec![Some("A".to_string()), None, Some("1998".to_string())]
        );

        let null: Row = serde_json::from_str(r#"{"field": null}"#).unwrap();
        assert_eq!(nested_to_list(null.field), vec![None]);

        let missing: Row = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(nested_to_list(missing.field), vec![None]);
    }

    #[test]
    fn scalar_value_renders_whole_floats_as_integers() {
        assert_eq!(ScalarValue::Float(1998.0).into_text(), "1998");
        assert_eq!(ScalarValue::Float(0.5).into_text(), "0.5");
        assert_eq!(ScalarValue::Int(2005).into_text(), "2005");
        assert_eq!(ScalarValue::Bool(true).into_text(), "1");
    }

    #[test]
    fn llm_record_coerces_establishment_year_and_jv() {
        let record: LlmPanelRecord = serde_json::from_str(
            r#"{"year": 2000, "establishment_year": 1907.0, "JV": "1"}"#,
        )
        .unwrap();
        assert_eq!(record.establishment_year, Some(1907));
        assert_eq!(record.jv, Some(1));

        let sentinel: LlmPanelRecord =
            serde_json::from_str(r#"{"year": 2000, "establishment_year": "N/A"}"#).unwrap();
        assert_eq!(sentinel.establishment_year, None);

        let bad = serde_json::from_str::<LlmPanelRecord>(
            r#"{"year": 2000, "establishment_year": "circa 1900"}"#,
        );
        assert!(bad.is_err());
    }
}
