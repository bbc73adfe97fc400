//! Department identifiers and the formula category they select.

use serde::{Deserialize, Serialize};

/// The formula set applied to a department's monthly record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DepartmentCategory {
    /// In-patient wards, including ICUs (`DEPT...`).
    Ipd,
    /// Out-patient clinics (`OPD...`).
    Opd,
    /// Operating room (`SPECIAL001`).
    Or,
    /// Emergency room (`SPECIAL002`).
    Er,
    /// Anesthesia nursing (`SPECIAL003`).
    Anesth,
    /// Labor room (`SPECIAL004`).
    LaborRoom,
    /// Anything else; only `daysInMonth` is computed.
    Other,
}

/// Classify a canonical department identifier.
///
/// Matching is case-sensitive: `"dept001"` is [`DepartmentCategory::Other`].
pub fn classify(department_id: &str) -> DepartmentCategory {
    if department_id.starts_with("DEPT") {
        return DepartmentCategory::Ipd;
    }
    if department_id.starts_with("OPD") {
        return DepartmentCategory::Opd;
    }
    match department_id {
        "SPECIAL001" => DepartmentCategory::Or,
        "SPECIAL002" => DepartmentCategory::Er,
        "SPECIAL003" => DepartmentCategory::Anesth,
        "SPECIAL004" => DepartmentCategory::LaborRoom,
        _ => DepartmentCategory::Other,
    }
}

/// Grouping shown on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepartmentKind {
    Ipd,
    Icu,
    Special,
    Opd,
}

/// An entry in the hospital's department catalogue.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Department {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: DepartmentKind,
}

const fn dept(id: &'static str, name: &'static str, kind: DepartmentKind) -> Department {
    Department { id, name, kind }
}

/// Departments that submit monthly records.  The administrator account
/// is not listed.
pub static DEPARTMENTS: &[Department] = &[
    dept("DEPT001", "หอผู้ป่วยอายุรกรรมชาย", DepartmentKind::Ipd),
    dept("DEPT002", "หอผู้ป่วยอายุรกรรมหญิง", DepartmentKind::Ipd),
    dept("DEPT003", "หอผู้ป่วยจิตเวช", DepartmentKind::Ipd),
    dept("DEPT004", "หอผู้ป่วยพิเศษรวมน้ำใจ", DepartmentKind::Ipd),
    dept("DEPT005", "หอผู้ป่วยศัลยกรรมชาย", DepartmentKind::Ipd),
    dept("DEPT006", "หอผู้ป่วยศัลยกรรมหญิง", DepartmentKind::Ipd),
    dept("DEPT007", "หอผู้ป่วยหนักอายุรกรรมชั้น 1 (ICU-MED_1)", DepartmentKind::Icu),
    dept("DEPT008", "หอผู้ป่วยหนักอายุรกรรมชั้น 2 (ICU-MED_2)", DepartmentKind::Icu),
    dept("DEPT009", "หอผู้ป่วยกระดูกและข้อ", DepartmentKind::Ipd),
    dept("DEPT010", "หอผู้ป่วยพิเศษอายุรกรรมชั้น 4", DepartmentKind::Ipd),
    dept("DEPT011", "หอผู้ป่วยพิเศษศัลยกรรมชั้น 4", DepartmentKind::Ipd),
    dept("DEPT012", "หอผู้ป่วยกุมารเวช", DepartmentKind::Ipd),
    dept("DEPT013", "หอผู้ป่วยอภิบาลสงฆ์", DepartmentKind::Ipd),
    dept("DEPT014", "หอผู้ป่วยโสต ศอ นาสิก", DepartmentKind::Ipd),
    dept("DEPT015", "หอผู้ป่วยพิเศษสูติ-นรีเวช ชั้น 5", DepartmentKind::Ipd),
    dept("DEPT016", "หอผู้ป่วยพิเศษสูติ-นรีเวช ชั้น 4", DepartmentKind::Ipd),
    dept("DEPT017", "หอผู้ป่วยพิเศษกุมารเวช", DepartmentKind::Ipd),
    dept("DEPT018", "หอผู้ป่วยศัลยกรรมระบบประสาทและสมอง", DepartmentKind::Ipd),
    dept("DEPT019", "หอผู้ป่วยหนักกุมารเวช (NICU)", DepartmentKind::Icu),
    dept("DEPT020", "หอผู้ป่วยสูติ-นรีเวช (PP)", DepartmentKind::Ipd),
    dept("DEPT021", "หอผู้ป่วยหนักรวม (ICU_รวม)", DepartmentKind::Icu),
    dept("SPECIAL001", "ห้องผ่าตัด (OR)", DepartmentKind::Special),
    dept("SPECIAL002", "ห้องอุบัติเหตุ ฉุกเฉิน (ER)", DepartmentKind::Special),
    dept("SPECIAL003", "วิสัญญีพยาบาล (Anesth)", DepartmentKind::Special),
    dept("SPECIAL004", "ห้องคลอด (LR)", DepartmentKind::Special),
    dept("OPD001", "OPD ศัลยกรรม", DepartmentKind::Opd),
    dept("OPD002", "OPD กุมารเวช", DepartmentKind::Opd),
    dept("OPD003", "OPD (Med+GP+Ortho+หัวใจ+พิเศษ)", DepartmentKind::Opd),
    dept("OPD004", "OPD ANC", DepartmentKind::Opd),
    dept("OPD005", "OPD Uro", DepartmentKind::Opd),
    dept("OPD006", "OPD Neuro", DepartmentKind::Opd),
    dept("OPD007", "OPD จักษุ", DepartmentKind::Opd),
    dept("OPD008", "OPD ENT", DepartmentKind::Opd),
    dept("OPD009", "OPD DM/HT", DepartmentKind::Opd),
    dept("OPD010", "OPD CAPD", DepartmentKind::Opd),
];

/// Look up a catalogue entry by identifier.
pub fn find_department(id: &str) -> Option<&'static Department> {
    DEPARTMENTS.iter().find(|d| d.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_and_exact_ids() {
        assert_eq!(classify("DEPT001"), DepartmentCategory::Ipd);
        assert_eq!(classify("DEPT021"), DepartmentCategory::Ipd);
        assert_eq!(classify("OPD001"), DepartmentCategory::Opd);
        assert_eq!(classify("OPD_GP"), DepartmentCategory::Opd);
        assert_eq!(classify("SPECIAL001"), DepartmentCategory::Or);
        assert_eq!(classify("SPECIAL002"), DepartmentCategory::Er);
        assert_eq!(classify("SPECIAL003"), DepartmentCategory::Anesth);
        assert_eq!(classify("SPECIAL004"), DepartmentCategory::LaborRoom);
    }

    #[test]
    fn everything_else_is_other() {
        assert_eq!(classify("SPECIAL005"), DepartmentCategory::Other);
        assert_eq!(classify("SPECIAL0011"), DepartmentCategory::Other);
        assert_eq!(classify("ADMIN"), DepartmentCategory::Other);
        assert_eq!(classify("dept001"), DepartmentCategory::Other);
        assert_eq!(classify(""), DepartmentCategory::Other);
    }

    #[test]
    fn catalogue_entries_classify_consistently() {
        for d in DEPARTMENTS {
            let category = classify(d.id);
            match d.kind {
                DepartmentKind::Ipd | DepartmentKind::Icu => {
                    assert_eq!(category, DepartmentCategory::Ipd)
                }
                DepartmentKind::Opd => assert_eq!(category, DepartmentCategory::Opd),
                DepartmentKind::Special => assert!(matches!(
                    category,
                    DepartmentCategory::Or
                        | DepartmentCategory::Er
                        | DepartmentCategory::Anesth
                        | DepartmentCategory::LaborRoom
                )),
            }
        }
        assert_eq!(find_department("SPECIAL004").map(|d| d.name), Some("ห้องคลอด (LR)"));
        assert!(find_department("ADMIN").is_none());
    }
}
