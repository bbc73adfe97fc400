//! Data models for the QA record store.
//!
//! A department submits one record per fiscal month.  The record's
//! `data` holds the raw field values typed by the department together
//! with the computed indicators the engine derives from them.  These
//! types derive `Serialize` and `Deserialize` with camelCase names so
//! that the persisted JSON document and the HTTP bodies share a shape.
//!
//! Older documents and backups were written by hand-edited tooling, so
//! field values may be numbers, booleans or `null` where a string is
//! expected.  Deserialisation coerces scalars to strings rather than
//! rejecting the whole document.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Field key to string value.  Ordered so that serialising the same set
/// twice yields the same bytes.
pub type FieldSet = BTreeMap<String, String>;

/// String form of a JSON scalar, as a browser would print it.  `null`,
/// arrays and objects have none.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(u)) => u.to_string(),
            // f64 Display prints 2568.0 as "2568"
            _ => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Coerce a scalar to a string; `null` becomes empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(de::Error::custom(format!(
            "expected a string, found {}",
            value
        ))),
        scalar => Ok(scalar_to_string(&scalar).unwrap_or_default()),
    }
}

fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_string(deserializer)?;
    Ok(if value.is_empty() { None } else { Some(value) })
}

/// Coerce a field map.  Scalar values become strings, `null` and nested
/// values are dropped, and anything other than an object reads as empty.
fn lenient_fields<'de, D>(deserializer: D) -> Result<FieldSet, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map
            .into_iter()
            .filter_map(|(key, value)| scalar_to_string(&value).map(|v| (key, v)))
            .collect(),
        _ => FieldSet::new(),
    })
}

fn optional_fields<'de, D>(deserializer: D) -> Result<Option<FieldSet>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_fields(deserializer).map(Some)
}

/// The natural key of a record: one record per department, fiscal year
/// and month.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordKey {
    pub department_id: String,
    pub fiscal_year: String,
    pub month: String,
}

impl RecordKey {
    pub fn new(
        department_id: impl Into<String>,
        fiscal_year: impl Into<String>,
        month: impl Into<String>,
    ) -> Self {
        RecordKey {
            department_id: department_id.into(),
            fiscal_year: fiscal_year.into(),
            month: month.into(),
        }
    }

    /// Persisted identifier, `"{departmentId}-{fiscalYear}-{month}"`.
    pub fn id(&self) -> String {
        format!("{}-{}-{}", self.department_id, self.fiscal_year, self.month)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

/// A persisted monthly record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QaRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub department_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub department_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fiscal_year: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub month: String,
    #[serde(default, deserialize_with = "lenient_fields")]
    pub data: FieldSet,
    /// RFC 3339 timestamp of the last save.
    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_at: String,
}

impl QaRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(&self.department_id, &self.fiscal_year, &self.month)
    }
}

/// Body of a save request.  Missing strings deserialise as empty and are
/// rejected by the service rather than by the JSON layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(default, deserialize_with = "lenient_string")]
    pub department_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub department_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fiscal_year: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub month: String,
    #[serde(default, deserialize_with = "optional_fields")]
    pub fields: Option<FieldSet>,
}

/// A record as it appears in a backup file.  Identifiers and timestamps
/// are optional because restore regenerates both.  Fiscal years written
/// as JSON numbers are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_string"
    )]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub department_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub department_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub fiscal_year: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub month: String,
    #[serde(default, deserialize_with = "lenient_fields")]
    pub data: FieldSet,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_string"
    )]
    pub updated_at: Option<String>,
}

impl From<QaRecord> for BackupRecord {
    fn from(record: QaRecord) -> Self {
        BackupRecord {
            id: Some(record.id),
            department_id: record.department_id,
            department_name: record.department_name,
            fiscal_year: record.fiscal_year,
            month: record.month,
            data: record.data,
            updated_at: Some(record.updated_at),
        }
    }
}

/// A full export of the record store.  Entries are kept as raw JSON so
/// that restore can reject a malformed entry without losing the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_records: Option<usize>,
    pub records: Vec<Value>,
}

/// Outcome of restoring a backup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// One filled month in a department's year view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthEntry {
    pub id: String,
    pub updated_at: String,
    pub data: FieldSet,
}

/// Filled months keyed by Thai month name.  Serialises as a JSON object
/// whose keys keep fiscal order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthMap(Vec<(String, MonthEntry)>);

impl MonthMap {
    pub fn get(&self, month: &str) -> Option<&MonthEntry> {
        self.0.iter().find(|(m, _)| m == month).map(|(_, entry)| entry)
    }

    /// Month names in order.
    pub fn months(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(m, _)| m.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, MonthEntry)> for MonthMap {
    fn from_iter<I: IntoIterator<Item = (String, MonthEntry)>>(iter: I) -> Self {
        MonthMap(iter.into_iter().collect())
    }
}

impl Serialize for MonthMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (month, entry) in &self.0 {
            map.serialize_entry(month, entry)?;
        }
        map.end()
    }
}

/// A department's records for one fiscal year.  `months` holds the
/// filled months in fiscal order; `records` holds every matching record,
/// including any stored under an unrecognised month name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct YearView {
    pub months: MonthMap,
    pub records: Vec<QaRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_id_joins_natural_key() {
        let key = RecordKey::new("DEPT001", "2568", "ตุลาคม");
        assert_eq!(key.id(), "DEPT001-2568-ตุลาคม");
        assert_eq!(key.to_string(), key.id());
    }

    #[test]
    fn record_uses_camel_case() {
        let record = QaRecord {
            id: "OPD001-2568-มกราคม".into(),
            department_id: "OPD001".into(),
            department_name: "OPD ศัลยกรรม".into(),
            fiscal_year: "2568".into(),
            month: "มกราคม".into(),
            data: FieldSet::new(),
            updated_at: "2025-01-31T00:00:00+00:00".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["departmentId"], json!("OPD001"));
        assert_eq!(value["updatedAt"], json!("2025-01-31T00:00:00+00:00"));
        let back: QaRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back.key(), RecordKey::new("OPD001", "2568", "มกราคม"));
    }

    #[test]
    fn backup_accepts_numeric_fiscal_year() {
        let record: BackupRecord = serde_json::from_value(json!({
            "departmentId": "DEPT002",
            "departmentName": "ward",
            "fiscalYear": 2568,
            "month": "ตุลาคม",
            "data": {"s2_1": "1"}
        }))
        .unwrap();
        assert_eq!(record.fiscal_year, "2568");
        assert!(record.id.is_none());
    }

    #[test]
    fn scalar_values_are_coerced_to_strings() {
        let record: QaRecord = serde_json::from_value(json!({
            "id": "DEPT001-2568-ตุลาคม",
            "departmentId": "DEPT001",
            "departmentName": null,
            "fiscalYear": 2568.0,
            "month": "ตุลาคม",
            "data": {"s2_1": 3, "s2_2": 12.5, "flag": true, "note": null, "nested": {"a": 1}},
            "updatedAt": "2025-01-01T00:00:00+00:00"
        }))
        .unwrap();
        assert_eq!(record.fiscal_year, "2568");
        assert_eq!(record.department_name, "");
        assert_eq!(record.data["s2_1"], "3");
        assert_eq!(record.data["s2_2"], "12.5");
        assert_eq!(record.data["flag"], "true");
        assert!(!record.data.contains_key("note"));
        assert!(!record.data.contains_key("nested"));
    }

    #[test]
    fn null_data_reads_as_empty() {
        let record: BackupRecord = serde_json::from_value(json!({
            "departmentId": "DEPT001",
            "data": null
        }))
        .unwrap();
        assert!(record.data.is_empty());

        let request: SaveRequest = serde_json::from_value(json!({
            "departmentId": "DEPT001",
            "fields": {"s1_1": 2}
        }))
        .unwrap();
        assert_eq!(request.fields.unwrap()["s1_1"], "2");
    }

    #[test]
    fn structured_names_are_rejected() {
        let result: Result<BackupRecord, _> = serde_json::from_value(json!({
            "departmentId": {"id": "DEPT001"}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn month_map_serialises_as_ordered_object() {
        let entry = |id: &str| MonthEntry {
            id: id.into(),
            updated_at: String::new(),
            data: FieldSet::new(),
        };
        let months: MonthMap = vec![
            ("ตุลาคม".to_string(), entry("a")),
            ("มกราคม".to_string(), entry("b")),
        ]
        .into_iter()
        .collect();
        let text = serde_json::to_string(&months).unwrap();
        assert!(text.starts_with("{\"ตุลาคม\":{\"id\":\"a\""));
        assert!(text.find("ตุลาคม").unwrap() < text.find("มกราคม").unwrap());
        assert_eq!(months.get("มกราคม").unwrap().id, "b");
    }
}
