//! Thai fiscal calendar.
//!
//! Fiscal years are written in the Buddhist Era (BE = Gregorian + 543)
//! and start in October.  Months are identified by their Thai names;
//! [`ThaiMonth`] fixes both the accepted spellings and the fiscal sort
//! order used when records are listed.

use serde::{Deserialize, Serialize};

/// Offset between a Buddhist Era year and its Gregorian counterpart.
pub const BUDDHIST_ERA_OFFSET: i64 = 543;

/// Day count returned for a month name that is not recognised.
pub const FALLBACK_DAYS: u32 = 30;

/// Which leap-year rule converts a fiscal year into a February length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeapYearRule {
    /// Divisible by 4, except centuries not divisible by 400.
    Gregorian,
    /// Divisible by 4 only.  Agrees with [`LeapYearRule::Gregorian`] for
    /// every year between 1901 and 2099.
    DivisibleByFour,
}

impl LeapYearRule {
    pub fn is_leap(self, gregorian_year: i64) -> bool {
        match self {
            LeapYearRule::Gregorian => {
                gregorian_year % 4 == 0 && (gregorian_year % 100 != 0 || gregorian_year % 400 == 0)
            }
            LeapYearRule::DivisibleByFour => gregorian_year % 4 == 0,
        }
    }
}

/// Rule used by [`days_in_month`].
pub const LEAP_YEAR_RULE: LeapYearRule = LeapYearRule::Gregorian;

/// The twelve fiscal months, declared in fiscal order starting with
/// October (ตุลาคม).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThaiMonth {
    #[serde(rename = "ตุลาคม")]
    October,
    #[serde(rename = "พฤศจิกายน")]
    November,
    #[serde(rename = "ธันวาคม")]
    December,
    #[serde(rename = "มกราคม")]
    January,
    #[serde(rename = "กุมภาพันธ์")]
    February,
    #[serde(rename = "มีนาคม")]
    March,
    #[serde(rename = "เมษายน")]
    April,
    #[serde(rename = "พฤษภาคม")]
    May,
    #[serde(rename = "มิถุนายน")]
    June,
    #[serde(rename = "กรกฎาคม")]
    July,
    #[serde(rename = "สิงหาคม")]
    August,
    #[serde(rename = "กันยายน")]
    September,
}

impl ThaiMonth {
    /// All months in fiscal order.
    pub const ALL: [ThaiMonth; 12] = [
        ThaiMonth::October,
        ThaiMonth::November,
        ThaiMonth::December,
        ThaiMonth::January,
        ThaiMonth::February,
        ThaiMonth::March,
        ThaiMonth::April,
        ThaiMonth::May,
        ThaiMonth::June,
        ThaiMonth::July,
        ThaiMonth::August,
        ThaiMonth::September,
    ];

    pub fn thai_name(self) -> &'static str {
        match self {
            ThaiMonth::October => "ตุลาคม",
            ThaiMonth::November => "พฤศจิกายน",
            ThaiMonth::December => "ธันวาคม",
            ThaiMonth::January => "มกราคม",
            ThaiMonth::February => "กุมภาพันธ์",
            ThaiMonth::March => "มีนาคม",
            ThaiMonth::April => "เมษายน",
            ThaiMonth::May => "พฤษภาคม",
            ThaiMonth::June => "มิถุนายน",
            ThaiMonth::July => "กรกฎาคม",
            ThaiMonth::August => "สิงหาคม",
            ThaiMonth::September => "กันยายน",
        }
    }

    /// Exact-match lookup; no trimming or normalisation is applied.
    pub fn from_name(name: &str) -> Option<ThaiMonth> {
        ThaiMonth::ALL.into_iter().find(|m| m.thai_name() == name)
    }

    /// Zero-based position within the fiscal year (October = 0).
    pub fn fiscal_index(self) -> usize {
        self as usize
    }

    /// Day count for this month in the given Gregorian year.
    pub fn days(self, gregorian_year: i64, rule: LeapYearRule) -> u32 {
        match self {
            ThaiMonth::February => {
                if rule.is_leap(gregorian_year) {
                    29
                } else {
                    28
                }
            }
            ThaiMonth::November | ThaiMonth::April | ThaiMonth::June | ThaiMonth::September => 30,
            _ => 31,
        }
    }
}

/// Fiscal position of a month name, or `None` for unknown names.  Used
/// to sort records in fiscal order; unknown names sort last.
pub fn month_order(name: &str) -> Option<usize> {
    ThaiMonth::from_name(name).map(ThaiMonth::fiscal_index)
}

/// Convert a Buddhist Era year string into a Gregorian year.
///
/// Any decimal spelling of a whole number is accepted (`"2567"`,
/// `"2567.0"`, `" 2567 "`).  Anything else, including fractional years,
/// is read as BE 0, which is never a leap year.
pub fn gregorian_year(fiscal_year: &str) -> i64 {
    let be = match fiscal_year.trim().parse::<f64>() {
        Ok(year) if year.is_finite() && year.fract() == 0.0 && year.abs() < 1e15 => year as i64,
        _ => 0,
    };
    be - BUDDHIST_ERA_OFFSET
}

/// Days in `month_name` for the Buddhist Era `fiscal_year`.
///
/// February's length follows the Gregorian year obtained by subtracting
/// 543, with no adjustment for the fiscal year starting in October.
/// Unknown month names yield [`FALLBACK_DAYS`].
pub fn days_in_month(month_name: &str, fiscal_year: &str) -> u32 {
    match ThaiMonth::from_name(month_name) {
        Some(month) => month.days(gregorian_year(fiscal_year), LEAP_YEAR_RULE),
        None => FALLBACK_DAYS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn february_follows_leap_years() {
        assert_eq!(days_in_month("กุมภาพันธ์", "2567"), 29);
        assert_eq!(days_in_month("กุมภาพันธ์", "2568"), 28);
        assert_eq!(days_in_month("กุมภาพันธ์", "2571"), 29);
    }

    #[test]
    fn fixed_lengths_for_other_months() {
        assert_eq!(days_in_month("ตุลาคม", "2568"), 31);
        assert_eq!(days_in_month("พฤศจิกายน", "2568"), 30);
        assert_eq!(days_in_month("กันยายน", "2568"), 30);
        assert_eq!(days_in_month("มกราคม", "2568"), 31);
        let total: u32 = ThaiMonth::ALL
            .iter()
            .map(|m| days_in_month(m.thai_name(), "2568"))
            .sum();
        assert_eq!(total, 365);
    }

    #[test]
    fn unknown_month_falls_back() {
        assert_eq!(days_in_month("October", "2568"), FALLBACK_DAYS);
        assert_eq!(days_in_month(" ตุลาคม", "2568"), FALLBACK_DAYS);
        assert_eq!(days_in_month("", ""), FALLBACK_DAYS);
    }

    #[test]
    fn century_years_differ_between_rules() {
        // BE 2443 is Gregorian 1900.
        assert!(!LeapYearRule::Gregorian.is_leap(gregorian_year("2443")));
        assert!(LeapYearRule::DivisibleByFour.is_leap(gregorian_year("2443")));
        assert!(LeapYearRule::Gregorian.is_leap(2000));
        for year in 1901..2100 {
            assert_eq!(
                LeapYearRule::Gregorian.is_leap(year),
                LeapYearRule::DivisibleByFour.is_leap(year)
            );
        }
    }

    #[test]
    fn fiscal_year_accepts_whole_number_spellings() {
        assert_eq!(gregorian_year("2567"), 2024);
        assert_eq!(gregorian_year("2567.0"), 2024);
        assert_eq!(gregorian_year(" 2567 "), 2024);
        assert_eq!(days_in_month("กุมภาพันธ์", "2567.0"), 29);
        assert_eq!(gregorian_year("2567.5"), -BUDDHIST_ERA_OFFSET);
        assert_eq!(gregorian_year("FY2567"), -BUDDHIST_ERA_OFFSET);
        assert_eq!(days_in_month("กุมภาพันธ์", "2567.5"), 28);
    }

    #[test]
    fn fiscal_order_starts_in_october() {
        assert_eq!(month_order("ตุลาคม"), Some(0));
        assert_eq!(month_order("มกราคม"), Some(3));
        assert_eq!(month_order("กันยายน"), Some(11));
        assert_eq!(month_order("unknown"), None);
        assert_eq!(ThaiMonth::from_name("กุมภาพันธ์"), Some(ThaiMonth::February));
    }
}
