//! Per-department formula tables.
//!
//! Every department category owns an ordered list of [`Formula`]
//! entries.  Most entries are guarded ratios; the rest are sums, a fixed
//! placeholder and the in-patient staffing block whose outputs depend on
//! each other.  Formulas read their inputs from the field set being
//! enriched, which already carries `daysInMonth` when they run.

use crate::department::DepartmentCategory;
use crate::models::FieldSet;
use crate::numeric::{format_fixed2, format_whole, guarded_ratio, to_number};

/// Key holding the day count of the record's month.
pub const DAYS_IN_MONTH: &str = "daysInMonth";

/// Hours in one nursing shift.
pub const SHIFT_HOURS: f64 = 7.0;

/// Scale for rates reported as percentages.
pub const PERCENT: f64 = 100.0;

/// Scale for rates reported per thousand.
pub const PER_THOUSAND: f64 = 1000.0;

/// Scale applied to the pain-management completeness ratios that are
/// reported with a `%` suffix but were never multiplied by 100
/// (`opd_pain_3_result`, `lr_pm_3_3`, `lr_h2_1_6`).  Stored records
/// depend on this value; setting it to [`PERCENT`] reports them as true
/// percentages.
pub const UNSCALED_PERCENT_SCALE: f64 = 1.0;

/// Text appended to a rendered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suffix {
    None,
    Percent,
}

impl Suffix {
    fn render(self, mut value: String) -> String {
        if self == Suffix::Percent {
            value.push('%');
        }
        value
    }
}

/// How a sum is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SumFormat {
    /// Two decimals, e.g. `"7.00"`.
    Fixed2,
    /// No forced decimals, e.g. `"7"`.
    Whole,
}

/// One derived field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formula {
    /// `numerator / denominator * scale` to two decimals, `"0.00"` when
    /// the denominator is not positive.
    Ratio {
        output: &'static str,
        numerator: &'static str,
        denominator: &'static str,
        scale: f64,
        suffix: Suffix,
    },
    /// Sum of the listed fields.
    Sum {
        output: &'static str,
        addends: &'static [&'static str],
        format: SumFormat,
    },
    /// A value that is always written as-is.
    Constant {
        output: &'static str,
        value: &'static str,
    },
    /// Nursing hours, RN/auxiliary ratio, HPPD and productivity from
    /// staff per day (`s4_1`), patient days (`s4_2`) and TN/PN/AID
    /// staff (`s4_3`).
    Staffing,
}

const fn rate(output: &'static str, numerator: &'static str, denominator: &'static str) -> Formula {
    Formula::Ratio {
        output,
        numerator,
        denominator,
        scale: PERCENT,
        suffix: Suffix::Percent,
    }
}

const fn unscaled_rate(
    output: &'static str,
    numerator: &'static str,
    denominator: &'static str,
) -> Formula {
    Formula::Ratio {
        output,
        numerator,
        denominator,
        scale: UNSCALED_PERCENT_SCALE,
        suffix: Suffix::Percent,
    }
}

const fn scaled(
    output: &'static str,
    numerator: &'static str,
    denominator: &'static str,
    scale: f64,
) -> Formula {
    Formula::Ratio {
        output,
        numerator,
        denominator,
        scale,
        suffix: Suffix::None,
    }
}

const fn count(output: &'static str, addends: &'static [&'static str]) -> Formula {
    Formula::Sum {
        output,
        addends,
        format: SumFormat::Whole,
    }
}

const STAFFING_KEYS: [&str; 5] = ["rnHr", "auxHr", "ratioRnAux", "actualHPPD", "productivityValue"];

static IPD: &[Formula] = &[
    scaled("pressureUlcerRate", "s1_6_1", "s1_6_4", PER_THOUSAND),
    rate("readmissionRate", "s2_1", "s2_2"),
    scaled("averageLOS", "s3_1", DAYS_IN_MONTH, 1.0),
    Formula::Staffing,
    Formula::Sum {
        output: "s11_1_total",
        addends: &["s11_1_1", "s11_1_2"],
        format: SumFormat::Fixed2,
    },
    rate("s11_3_rate", "s11_3_1", "s11_3_2"),
];

static OPD: &[Formula] = &[
    rate("opd_cpr_rate", "opd_cpr_3", "opd_cpr_2"),
    unscaled_rate("opd_pain_3_result", "opd_pain_3_1", "opd_pain_3_2"),
];

static OR: &[Formula] = &[
    rate("or_2_3", "or_2_1", "or_2_2"),
    rate("or_h2_1_3", "or_h2_1_1", "or_h2_1_2"),
    rate("or_h2_3_3", "or_h2_3_1", "or_h2_3_2"),
];

static ER: &[Formula] = &[
    rate("er_2_3", "er_2_1", "er_2_2"),
    count("er_pm_1", &["er_pm_1_1", "er_pm_1_2"]),
    rate("er_pm_3_3", "er_pm_3_1", "er_pm_3_2"),
    rate("er_h3_1_3", "er_h3_1_1", "er_h3_1_2"),
    rate("er_h3_2_1_3", "er_h3_2_1_1", "er_h3_2_1_2"),
    rate("er_h3_3_3", "er_h3_3_1", "er_h3_3_2"),
];

static ANESTH: &[Formula] = &[
    rate("an_2_3", "an_2_1", "an_2_2"),
    count("an_h2_1_1", &["an_h2_1_2", "an_h2_1_3"]),
    rate("an_h2_3_3", "an_h2_3_1", "an_h2_3_2"),
    rate("an_h3_1_3", "an_h3_1_1", "an_h3_1_2"),
    rate("an_h3_3_3", "an_h3_3_1", "an_h3_3_2"),
    rate("an_h3_5_3", "an_h3_5_1", "an_h3_5_2"),
];

static LABOR_ROOM: &[Formula] = &[
    scaled("lr_1_6_5", "lr_1_6_3", "lr_1_6_4", PERCENT),
    Formula::Constant {
        output: "lr_2_productivity",
        value: "0.00%",
    },
    count("lr_pm_1", &["lr_pm_1_1", "lr_pm_1_2"]),
    unscaled_rate("lr_pm_3_3", "lr_pm_3_1", "lr_pm_3_2"),
    unscaled_rate("lr_h2_1_6", "lr_h2_1_6_1", "lr_h2_1_6_2"),
    scaled("lr_h2_3_3", "lr_h2_3_1", "lr_h2_3_2", PER_THOUSAND),
];

/// The formulas applied for a category, in evaluation order.
pub fn formulas_for(category: DepartmentCategory) -> &'static [Formula] {
    match category {
        DepartmentCategory::Ipd => IPD,
        DepartmentCategory::Opd => OPD,
        DepartmentCategory::Or => OR,
        DepartmentCategory::Er => ER,
        DepartmentCategory::Anesth => ANESTH,
        DepartmentCategory::LaborRoom => LABOR_ROOM,
        DepartmentCategory::Other => &[],
    }
}

/// Every key the engine writes for a category, `daysInMonth` first.
pub fn computed_keys(category: DepartmentCategory) -> Vec<&'static str> {
    let mut keys = vec![DAYS_IN_MONTH];
    for formula in formulas_for(category) {
        keys.extend_from_slice(formula.outputs());
    }
    keys
}

fn field(fields: &FieldSet, key: &str) -> f64 {
    to_number(fields.get(key).map(String::as_str))
}

impl Formula {
    /// Keys written by this formula.
    pub fn outputs(&self) -> &[&'static str] {
        match self {
            Formula::Ratio { output, .. }
            | Formula::Sum { output, .. }
            | Formula::Constant { output, .. } => std::slice::from_ref(output),
            Formula::Staffing => &STAFFING_KEYS,
        }
    }

    /// Evaluate against `fields` and overwrite the output keys.
    pub fn apply(&self, fields: &mut FieldSet) {
        match *self {
            Formula::Ratio {
                output,
                numerator,
                denominator,
                scale,
                suffix,
            } => {
                let value = guarded_ratio(field(fields, numerator), field(fields, denominator))
                    .map(|r| r * scale)
                    .unwrap_or(0.0);
                fields.insert(output.to_string(), suffix.render(format_fixed2(value)));
            }
            Formula::Sum {
                output,
                addends,
                format,
            } => {
                let total: f64 = addends.iter().map(|key| field(fields, key)).sum();
                let rendered = match format {
                    SumFormat::Fixed2 => format_fixed2(total),
                    SumFormat::Whole => format_whole(total),
                };
                fields.insert(output.to_string(), rendered);
            }
            Formula::Constant { output, value } => {
                fields.insert(output.to_string(), value.to_string());
            }
            Formula::Staffing => apply_staffing(fields),
        }
    }
}

fn apply_staffing(fields: &mut FieldSet) {
    let staff = field(fields, "s4_1");
    let patient_days = field(fields, "s4_2");
    let support_staff = field(fields, "s4_3");

    let rn_hours = staff * SHIFT_HOURS;
    let aux_hours = (staff + support_staff) * SHIFT_HOURS;
    let ratio = guarded_ratio(rn_hours, aux_hours).unwrap_or(0.0);

    let (hppd, productivity) = if patient_days > 0.0 {
        let hppd = (staff * SHIFT_HOURS) / patient_days;
        let productivity = guarded_ratio(patient_days * hppd * PERCENT, rn_hours).unwrap_or(0.0);
        (hppd, productivity)
    } else {
        (0.0, 0.0)
    };

    fields.insert("rnHr".to_string(), format_fixed2(rn_hours));
    fields.insert("auxHr".to_string(), format_fixed2(aux_hours));
    fields.insert("ratioRnAux".to_string(), format_fixed2(ratio));
    fields.insert("actualHPPD".to_string(), format_fixed2(hppd));
    fields.insert(
        "productivityValue".to_string(),
        Suffix::Percent.render(format_fixed2(productivity)),
    );
}
