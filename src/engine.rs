//! Derived-metrics computation engine.
//!
//! The `engine` module turns the raw fields of one department month into
//! the enriched field set that is stored, displayed and aggregated.  The
//! same function runs on save, on every load and before dashboard
//! aggregation, so stored values always reflect the current formulas.
//! It never fails: malformed numbers count as zero and undefined rates
//! render as zero.  Batches are re-enriched in parallel with [`rayon`].

use crate::calendar::days_in_month;
use crate::department::classify;
use crate::formulas::{formulas_for, DAYS_IN_MONTH};
use crate::models::{FieldSet, QaRecord};
use rayon::prelude::*;

/// Compute every derived field for one department month.
///
/// The input is cloned, `daysInMonth` is written for every department,
/// and then the formula set selected by `department_id` overwrites its
/// computed keys.  Fields belonging to other department types are
/// passed through untouched.  Applying the function to its own output
/// returns the same output.
pub fn compute_fields(raw: &FieldSet, fiscal_year: &str, month: &str, department_id: &str) -> FieldSet {
    let mut next = raw.clone();
    let days = days_in_month(month, fiscal_year);
    next.insert(DAYS_IN_MONTH.to_string(), days.to_string());

    let category = classify(department_id);
    tracing::debug!(department_id, ?category, days, "computing derived fields");
    for formula in formulas_for(category) {
        formula.apply(&mut next);
    }
    next
}

/// Recompute a stored record's derived fields in place.
pub fn enrich_record(record: &mut QaRecord) {
    record.data = compute_fields(
        &record.data,
        &record.fiscal_year,
        &record.month,
        &record.department_id,
    );
}

/// Recompute derived fields for a batch of records.  Order is preserved.
pub fn enrich_records(records: Vec<QaRecord>) -> Vec<QaRecord> {
    records
        .into_par_iter()
        .map(|mut record| {
            enrich_record(&mut record);
            record
        })
        .collect()
}
