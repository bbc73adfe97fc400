//! Save, load and backup operations over a [`RecordStore`].
//!
//! Every path that hands records back to a caller re-runs the engine on
//! the stored data first, so values saved under an older formula set are
//! never shown stale.

use crate::calendar::month_order;
use crate::dashboard::{build_dashboard, Dashboard};
use crate::engine::{compute_fields, enrich_record, enrich_records};
use crate::error::{QaError, QaResult};
use crate::models::{
    Backup, BackupRecord, MonthEntry, MonthMap, QaRecord, RecordKey, RestoreReport, SaveRequest,
    YearView,
};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Application service shared by the HTTP handlers.
#[derive(Clone)]
pub struct QaService {
    store: Arc<dyn RecordStore>,
}

fn require(value: &str, name: &'static str) -> QaResult<()> {
    if value.is_empty() {
        Err(QaError::MissingField(name))
    } else {
        Ok(())
    }
}

/// Check that every part of a natural key is present.
pub fn validate_key(key: &RecordKey) -> QaResult<()> {
    require(&key.department_id, "departmentId")?;
    require(&key.fiscal_year, "fiscalYear")?;
    require(&key.month, "month")
}

/// Sort position of a month name.  Unrecognised names sort before
/// October.
fn month_rank(month: &str) -> i64 {
    month_order(month).map_or(-1, |i| i as i64)
}

impl QaService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        QaService { store }
    }

    /// Compute and upsert one department month.
    pub fn save(&self, request: SaveRequest) -> QaResult<QaRecord> {
        require(&request.department_id, "departmentId")?;
        require(&request.department_name, "departmentName")?;
        require(&request.fiscal_year, "fiscalYear")?;
        require(&request.month, "month")?;

        let raw = request.fields.unwrap_or_default();
        let data = compute_fields(
            &raw,
            &request.fiscal_year,
            &request.month,
            &request.department_id,
        );
        let key = RecordKey::new(request.department_id, request.fiscal_year, request.month);
        let record = QaRecord {
            id: key.id(),
            department_id: key.department_id,
            department_name: request.department_name,
            fiscal_year: key.fiscal_year,
            month: key.month,
            data,
            updated_at: Utc::now().to_rfc3339(),
        };
        self.store.put(record.clone())?;
        tracing::info!(id = %record.id, fields = record.data.len(), "saved record");
        Ok(record)
    }

    /// The record for one department month, if any.
    pub fn by_period(&self, key: &RecordKey) -> QaResult<Option<QaRecord>> {
        validate_key(key)?;
        Ok(self.store.get(key)?.map(|mut record| {
            enrich_record(&mut record);
            record
        }))
    }

    /// A department's records for one fiscal year.
    pub fn by_year(&self, department_id: &str, fiscal_year: &str) -> QaResult<YearView> {
        require(department_id, "departmentId")?;
        require(fiscal_year, "fiscalYear")?;
        let records: Vec<QaRecord> = self
            .store
            .list()?
            .into_iter()
            .filter(|r| r.department_id == department_id && r.fiscal_year == fiscal_year)
            .collect();
        let records = enrich_records(records);

        let mut filled: Vec<&QaRecord> = records
            .iter()
            .filter(|r| month_order(&r.month).is_some())
            .collect();
        filled.sort_by_key(|r| month_rank(&r.month));
        let months: MonthMap = filled
            .into_iter()
            .map(|r| {
                let entry = MonthEntry {
                    id: r.id.clone(),
                    updated_at: r.updated_at.clone(),
                    data: r.data.clone(),
                };
                (r.month.clone(), entry)
            })
            .collect();
        Ok(YearView { months, records })
    }

    /// Every record, optionally limited to one fiscal year, ordered by
    /// department id and then fiscal month.
    pub fn all_data(&self, fiscal_year: Option<&str>) -> QaResult<Vec<QaRecord>> {
        let mut records: Vec<QaRecord> = self
            .store
            .list()?
            .into_iter()
            .filter(|r| fiscal_year.map_or(true, |fy| r.fiscal_year == fy))
            .collect();
        records.sort_by(|a, b| {
            a.department_id
                .cmp(&b.department_id)
                .then_with(|| month_rank(&a.month).cmp(&month_rank(&b.month)))
        });
        Ok(enrich_records(records))
    }

    /// Dashboard over the stored records, optionally limited to one
    /// fiscal year.  `month` narrows the incident figures only.
    pub fn dashboard(&self, fiscal_year: Option<&str>, month: Option<&str>) -> QaResult<Dashboard> {
        let records: Vec<QaRecord> = self
            .store
            .list()?
            .into_iter()
            .filter(|r| fiscal_year.map_or(true, |fy| r.fiscal_year == fy))
            .collect();
        tracing::debug!(records = records.len(), ?fiscal_year, ?month, "building dashboard");
        Ok(build_dashboard(records, month))
    }

    pub fn delete(&self, key: &RecordKey) -> QaResult<()> {
        validate_key(key)?;
        if !self.store.delete(key)? {
            return Err(QaError::NotFound { id: key.id() });
        }
        tracing::info!(id = %key, "deleted record");
        Ok(())
    }

    /// Export every stored record as it is stored.
    pub fn backup(&self) -> QaResult<Backup> {
        let records = self
            .store
            .list()?
            .into_iter()
            .map(|record| serde_json::to_value(BackupRecord::from(record)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Backup {
            exported_at: Some(Utc::now().to_rfc3339()),
            total_records: Some(records.len()),
            records,
        })
    }

    /// Upsert every record of a backup.  Incomplete or failing entries
    /// are counted and described in the report; the rest are stored.
    pub fn restore(&self, backup: Backup) -> QaResult<RestoreReport> {
        if backup.records.is_empty() {
            return Err(QaError::EmptyBackup);
        }
        let mut report = RestoreReport {
            total: backup.records.len(),
            ..RestoreReport::default()
        };
        for (index, value) in backup.records.into_iter().enumerate() {
            let entry: BackupRecord = match serde_json::from_value(value) {
                Ok(entry) => entry,
                Err(err) => {
                    let message = format!("malformed record #{}: {}", index + 1, err);
                    tracing::warn!(%message, "skipping backup entry");
                    report.failed += 1;
                    report.errors.push(message);
                    continue;
                }
            };
            if entry.department_id.is_empty()
                || entry.department_name.is_empty()
                || entry.fiscal_year.is_empty()
                || entry.month.is_empty()
            {
                let message = format!(
                    "incomplete record: {} - {}",
                    or_unknown(&entry.department_name),
                    or_unknown(&entry.month)
                );
                tracing::warn!(%message, "skipping backup entry");
                report.failed += 1;
                report.errors.push(message);
                continue;
            }
            let label = format!("{} - {}", entry.department_name, entry.month);
            let request = SaveRequest {
                department_id: entry.department_id,
                department_name: entry.department_name,
                fiscal_year: entry.fiscal_year,
                month: entry.month,
                fields: Some(entry.data),
            };
            match self.save(request) {
                Ok(_) => report.success += 1,
                Err(err) => {
                    tracing::warn!(%label, error = %err, "failed to restore backup entry");
                    report.failed += 1;
                    report.errors.push(format!("{}: {}", label, err));
                }
            }
        }
        tracing::info!(
            total = report.total,
            success = report.success,
            failed = report.failed,
            "restored backup"
        );
        Ok(report)
    }
}

fn or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "Unknown"
    } else {
        value
    }
}

/// Download name for a backup taken at `now`, e.g. `qa-backup-20250131.json`.
pub fn backup_filename(now: DateTime<Utc>) -> String {
    format!("qa-backup-{}.json", now.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldSet;
    use serde_json::json;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn service() -> QaService {
        QaService::new(Arc::new(MemoryStore::new()))
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldSet {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn request(dept: &str, month: &str, pairs: &[(&str, &str)]) -> SaveRequest {
        SaveRequest {
            department_id: dept.into(),
            department_name: format!("name of {}", dept),
            fiscal_year: "2568".into(),
            month: month.into(),
            fields: Some(fields(pairs)),
        }
    }

    #[test]
    fn save_computes_and_upserts() {
        let svc = service();
        let first = svc
            .save(request("DEPT001", "ตุลาคม", &[("s2_1", "1"), ("s2_2", "10")]))
            .unwrap();
        assert_eq!(first.id, "DEPT001-2568-ตุลาคม");
        assert_eq!(first.data["readmissionRate"], "10.00%");

        svc.save(request("DEPT001", "ตุลาคม", &[("s2_1", "2"), ("s2_2", "10")]))
            .unwrap();
        let all = svc.all_data(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].data["readmissionRate"], "20.00%");
    }

    #[test]
    fn save_rejects_missing_fields() {
        let svc = service();
        let mut req = request("DEPT001", "ตุลาคม", &[]);
        req.department_name.clear();
        assert!(matches!(svc.save(req), Err(QaError::MissingField("departmentName"))));

        let req = request("DEPT001", "", &[]);
        assert!(matches!(svc.save(req), Err(QaError::MissingField("month"))));
    }

    #[test]
    fn save_without_fields_still_computes() {
        let svc = service();
        let mut req = request("SPECIAL004", "กุมภาพันธ์", &[]);
        req.fields = None;
        let record = svc.save(req).unwrap();
        assert_eq!(record.data["daysInMonth"], "28");
        assert_eq!(record.data["lr_2_productivity"], "0.00%");
    }

    #[test]
    fn loads_recompute_stale_values() {
        let store = Arc::new(MemoryStore::new());
        let key = RecordKey::new("DEPT005", "2568", "ตุลาคม");
        store
            .put(QaRecord {
                id: key.id(),
                department_id: "DEPT005".into(),
                department_name: "ward".into(),
                fiscal_year: "2568".into(),
                month: "ตุลาคม".into(),
                data: fields(&[("s1_6_1", "1"), ("s1_6_4", "100"), ("pressureUlcerRate", "1.00")]),
                updated_at: String::new(),
            })
            .unwrap();
        let svc = QaService::new(store);
        let record = svc.by_period(&key).unwrap().unwrap();
        assert_eq!(record.data["pressureUlcerRate"], "10.00");
        assert_eq!(record.data["daysInMonth"], "31");
        assert!(svc
            .by_period(&RecordKey::new("DEPT005", "2568", "มกราคม"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn year_view_is_in_fiscal_order() {
        let svc = service();
        for month in ["มีนาคม", "ตุลาคม", "มกราคม"] {
            svc.save(request("OPD003", month, &[])).unwrap();
        }
        svc.save(request("OPD004", "ตุลาคม", &[])).unwrap();
        let view = svc.by_year("OPD003", "2568").unwrap();
        let months: Vec<&str> = view.months.months().collect();
        assert_eq!(months, vec!["ตุลาคม", "มกราคม", "มีนาคม"]);
        assert_eq!(view.months.get("มกราคม").unwrap().id, "OPD003-2568-มกราคม");
        assert_eq!(view.records.len(), 3);
        assert!(svc.by_year("", "2568").is_err());
    }

    #[test]
    fn all_data_sorts_and_filters() {
        let svc = service();
        svc.save(request("DEPT002", "มกราคม", &[])).unwrap();
        svc.save(request("DEPT001", "ธันวาคม", &[])).unwrap();
        svc.save(request("DEPT001", "ตุลาคม", &[])).unwrap();
        let mut other_year = request("DEPT001", "ตุลาคม", &[]);
        other_year.fiscal_year = "2569".into();
        svc.save(other_year).unwrap();

        let ids: Vec<String> = svc
            .all_data(Some("2568"))
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(
            ids,
            vec!["DEPT001-2568-ตุลาคม", "DEPT001-2568-ธันวาคม", "DEPT002-2568-มกราคม"]
        );
        assert_eq!(svc.all_data(None).unwrap().len(), 4);
    }

    #[test]
    fn delete_reports_missing_records() {
        let svc = service();
        svc.save(request("DEPT001", "ตุลาคม", &[])).unwrap();
        let key = RecordKey::new("DEPT001", "2568", "ตุลาคม");
        svc.delete(&key).unwrap();
        assert!(matches!(svc.delete(&key), Err(QaError::NotFound { .. })));
    }

    #[test]
    fn restore_counts_failures_and_keeps_the_rest() {
        let svc = service();
        let backup = Backup {
            exported_at: None,
            total_records: None,
            records: vec![
                json!({
                    "departmentId": "DEPT001",
                    "departmentName": "ward",
                    "fiscalYear": 2568,
                    "month": "ตุลาคม",
                    "data": {"s2_1": "1", "s2_2": "4"}
                }),
                json!({"departmentId": "DEPT002", "month": "ตุลาคม"}),
            ],
        };
        let report = svc.restore(backup).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.success, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors, vec!["incomplete record: Unknown - ตุลาคม"]);

        let stored = svc
            .by_period(&RecordKey::new("DEPT001", "2568", "ตุลาคม"))
            .unwrap()
            .unwrap();
        assert_eq!(stored.data["readmissionRate"], "25.00%");
    }

    #[test]
    fn restore_tolerates_loosely_typed_entries() {
        let svc = service();
        let backup = Backup {
            exported_at: None,
            total_records: None,
            records: vec![
                json!({
                    "departmentId": "DEPT001",
                    "departmentName": "ward",
                    "fiscalYear": "2568",
                    "month": "ตุลาคม",
                    "data": null
                }),
                json!({
                    "departmentId": "DEPT002",
                    "departmentName": "ward",
                    "fiscalYear": "2568",
                    "month": "ตุลาคม",
                    "data": {"s2_1": 5, "s2_2": 20}
                }),
                json!({
                    "departmentId": {"id": "DEPT003"},
                    "departmentName": "ward",
                    "fiscalYear": "2568",
                    "month": "ตุลาคม"
                }),
                json!("not a record"),
            ],
        };
        let report = svc.restore(backup).unwrap();
        assert_eq!(report.total, 4);
        assert_eq!(report.success, 2);
        assert_eq!(report.failed, 2);
        assert!(report.errors[0].starts_with("malformed record #3"));
        assert!(report.errors[1].starts_with("malformed record #4"));

        let empty = svc
            .by_period(&RecordKey::new("DEPT001", "2568", "ตุลาคม"))
            .unwrap()
            .unwrap();
        assert_eq!(empty.data["readmissionRate"], "0.00%");
        let numeric = svc
            .by_period(&RecordKey::new("DEPT002", "2568", "ตุลาคม"))
            .unwrap()
            .unwrap();
        assert_eq!(numeric.data["s2_1"], "5");
        assert_eq!(numeric.data["readmissionRate"], "25.00%");
    }

    #[test]
    fn empty_backup_is_rejected() {
        let svc = service();
        let backup = Backup {
            exported_at: None,
            total_records: None,
            records: vec![],
        };
        assert!(matches!(svc.restore(backup), Err(QaError::EmptyBackup)));
    }

    #[test]
    fn backup_round_trips_through_restore() {
        let source = service();
        source.save(request("SPECIAL001", "ตุลาคม", &[("or_2_1", "1"), ("or_2_2", "2")])).unwrap();
        let backup = source.backup().unwrap();
        assert_eq!(backup.total_records, Some(1));

        let target = service();
        let report = target.restore(backup).unwrap();
        assert_eq!(report.success, 1);
        assert_eq!(target.all_data(None).unwrap()[0].data["or_2_3"], "50.00%");
    }

    #[test]
    fn dashboard_filters_by_year() {
        let svc = service();
        svc.save(request("DEPT001", "ตุลาคม", &[("s7_2", "2"), ("s7_3", "1")])).unwrap();
        let mut other_year = request("DEPT002", "ตุลาคม", &[("s7_2", "4"), ("s7_3", "4")]);
        other_year.fiscal_year = "2569".into();
        svc.save(other_year).unwrap();

        let all = svc.dashboard(None, None).unwrap();
        assert_eq!(all.summary.total_cpr, 5.0);
        let one_year = svc.dashboard(Some("2568"), None).unwrap();
        assert_eq!(one_year.summary.total_records, 1);
        assert_eq!(one_year.cpr.failed, 1);
    }

    #[test]
    fn backup_filename_uses_date() {
        let now = Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(backup_filename(now), "qa-backup-20250131.json");
    }
}
