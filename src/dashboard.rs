//! Dashboard aggregation.
//!
//! Records are re-enriched before anything is summed, so the figures
//! always follow the current formulas.  Averages of rates only count
//! records whose value is positive: a month with no patient days
//! reports `0.00`, which means "not measured" rather than zero.

use crate::calendar::ThaiMonth;
use crate::department::{find_department, DEPARTMENTS};
use crate::engine::enrich_records;
use crate::models::{FieldSet, QaRecord};
use crate::numeric::{format_fixed2, format_percent, round_fixed, to_number};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Incident fields summed into a month's incident total.
const INCIDENT_FIELDS: [&str; 7] = ["s1_1", "s1_2", "s1_3", "s1_4", "s1_5", "s1_7", "s1_8"];

/// Incident fields counted per department.
const DEPARTMENT_INCIDENT_FIELDS: [&str; 3] = ["s1_1", "s1_2", "s1_3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SafetyIncident {
    PatientMisidentification,
    WrongPatientTreatment,
    MedicationError,
    TransfusionError,
    Fall,
    PressureUlcer,
}

impl SafetyIncident {
    pub const ALL: [SafetyIncident; 6] = [
        SafetyIncident::PatientMisidentification,
        SafetyIncident::WrongPatientTreatment,
        SafetyIncident::MedicationError,
        SafetyIncident::TransfusionError,
        SafetyIncident::Fall,
        SafetyIncident::PressureUlcer,
    ];

    /// Raw field holding the monthly count.
    pub fn field(self) -> &'static str {
        match self {
            SafetyIncident::PatientMisidentification => "s1_1",
            SafetyIncident::WrongPatientTreatment => "s1_2",
            SafetyIncident::MedicationError => "s1_3",
            SafetyIncident::TransfusionError => "s1_4",
            SafetyIncident::Fall => "s1_7",
            SafetyIncident::PressureUlcer => "s1_6_3",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_departments: usize,
    pub departments_with_data: usize,
    pub total_records: usize,
    pub avg_productivity: String,
    pub avg_los: String,
    /// Sum of successful resuscitations; fractional entries are kept.
    pub total_cpr: f64,
    pub avg_pressure_ulcer: String,
}

/// Per-month averages for charting.  Rates are rounded to one decimal,
/// the pressure-ulcer rate to two.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrend {
    pub month: ThaiMonth,
    pub records: usize,
    pub productivity: f64,
    pub pressure_ulcer_rate: f64,
    pub readmission_rate: f64,
    pub avg_los: f64,
    pub incidents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyMetric {
    pub incident: SafetyIncident,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CprSummary {
    pub success: i64,
    pub failed: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PainManagement {
    pub with_medication: i64,
    pub without_medication: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPerformance {
    pub department_id: String,
    pub department_name: String,
    pub productivity: f64,
    pub incidents: i64,
    /// Filled fiscal months as a percentage of twelve.
    pub data_completeness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub summary: DashboardSummary,
    pub monthly_trends: Vec<MonthlyTrend>,
    pub safety_metrics: Vec<SafetyMetric>,
    pub cpr: CprSummary,
    pub pain_management: PainManagement,
    pub department_performance: Vec<DepartmentPerformance>,
}

fn value(data: &FieldSet, key: &str) -> f64 {
    to_number(data.get(key).map(String::as_str))
}

/// Integer part of a count field.
fn count(data: &FieldSet, key: &str) -> i64 {
    value(data, key).trunc() as i64
}

/// Mean of the strictly positive values, or zero when there are none.
pub fn mean_positive<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = values
        .into_iter()
        .filter(|v| *v > 0.0)
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Build the dashboard for `records`.  `month` limits the incident, CPR
/// and pain-management figures to one fiscal month; trends, summary and
/// department performance always cover every record.
pub fn build_dashboard(records: Vec<QaRecord>, month: Option<&str>) -> Dashboard {
    let records = enrich_records(records);
    let selected: Vec<&QaRecord> = records
        .iter()
        .filter(|r| month.map_or(true, |m| r.month == m))
        .collect();

    Dashboard {
        summary: summarize(&records),
        monthly_trends: monthly_trends(&records),
        safety_metrics: SafetyIncident::ALL
            .iter()
            .map(|&incident| SafetyMetric {
                incident,
                count: selected.iter().map(|r| count(&r.data, incident.field())).sum(),
            })
            .collect(),
        cpr: CprSummary {
            success: selected.iter().map(|r| count(&r.data, "s7_3")).sum(),
            failed: selected
                .iter()
                .map(|r| count(&r.data, "s7_2") - count(&r.data, "s7_3"))
                .sum(),
        },
        pain_management: PainManagement {
            with_medication: selected.iter().map(|r| count(&r.data, "s11_1_1")).sum(),
            without_medication: selected.iter().map(|r| count(&r.data, "s11_1_2")).sum(),
        },
        department_performance: department_performance(&records),
    }
}

fn summarize(records: &[QaRecord]) -> DashboardSummary {
    let departments: BTreeSet<&str> = records.iter().map(|r| r.department_id.as_str()).collect();
    DashboardSummary {
        total_departments: DEPARTMENTS.len(),
        departments_with_data: departments.len(),
        total_records: records.len(),
        avg_productivity: format_percent(mean_positive(
            records.iter().map(|r| value(&r.data, "productivityValue")),
        )),
        avg_los: format_fixed2(mean_positive(
            records.iter().map(|r| value(&r.data, "averageLOS")),
        )),
        total_cpr: records.iter().map(|r| value(&r.data, "s7_3")).sum(),
        avg_pressure_ulcer: format_fixed2(mean_positive(
            records.iter().map(|r| value(&r.data, "pressureUlcerRate")),
        )),
    }
}

fn monthly_trends(records: &[QaRecord]) -> Vec<MonthlyTrend> {
    ThaiMonth::ALL
        .iter()
        .map(|&month| {
            let in_month: Vec<&FieldSet> = records
                .iter()
                .filter(|r| r.month == month.thai_name())
                .map(|r| &r.data)
                .collect();
            let mean = |key: &str| mean_positive(in_month.iter().map(|d| value(d, key)));
            MonthlyTrend {
                month,
                records: in_month.len(),
                productivity: round_fixed(mean("productivityValue"), 1),
                pressure_ulcer_rate: round_fixed(mean("pressureUlcerRate"), 2),
                readmission_rate: round_fixed(mean("readmissionRate"), 1),
                avg_los: round_fixed(mean("averageLOS"), 1),
                incidents: in_month
                    .iter()
                    .map(|d| INCIDENT_FIELDS.iter().map(|k| count(d, k)).sum::<i64>())
                    .sum(),
            }
        })
        .collect()
}

/// Latest stored name, or the catalogue name when none was stored.
fn department_name(department_id: &str, records: &[&QaRecord]) -> String {
    records
        .iter()
        .rev()
        .map(|r| r.department_name.as_str())
        .find(|name| !name.is_empty())
        .or_else(|| find_department(department_id).map(|d| d.name))
        .unwrap_or_default()
        .to_string()
}

fn department_performance(records: &[QaRecord]) -> Vec<DepartmentPerformance> {
    let mut grouped: BTreeMap<&str, Vec<&QaRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.department_id.as_str()).or_default().push(record);
    }
    grouped
        .into_iter()
        .map(|(department_id, recs)| {
            let months: BTreeSet<&str> = recs.iter().map(|r| r.month.as_str()).collect();
            DepartmentPerformance {
                department_id: department_id.to_string(),
                department_name: department_name(department_id, &recs),
                productivity: mean_positive(recs.iter().map(|r| value(&r.data, "productivityValue"))),
                incidents: recs
                    .iter()
                    .map(|r| {
                        DEPARTMENT_INCIDENT_FIELDS
                            .iter()
                            .map(|k| count(&r.data, k))
                            .sum::<i64>()
                    })
                    .sum(),
                data_completeness: (months.len().min(12) as f64 / 12.0) * 100.0,
            }
        })
        .collect()
}
