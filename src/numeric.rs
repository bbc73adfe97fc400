//! Safe numeric primitives shared by every formula.
//!
//! Raw field values arrive as free-form strings typed by department
//! users.  Parsing never fails: anything that does not start with a
//! decimal number is treated as zero, and divisions by a non-positive
//! denominator collapse to zero instead of producing `NaN` or an
//! infinity.  Formatting reproduces the fixed two-decimal rendering the
//! stored records have always used, so re-running the engine over old
//! data yields byte-identical strings.

/// Parse the leading decimal number of `value`, returning `0.0` when
/// the value is absent, empty, unparseable or not finite.
///
/// Leading whitespace is skipped and trailing garbage is ignored, so
/// `"12 cases"` parses as `12.0` and `"5.00%"` as `5.0`.
pub fn to_number(value: Option<&str>) -> f64 {
    let Some(value) = value else {
        return 0.0;
    };
    let trimmed = value.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let prefix = &trimmed[..numeric_prefix_len(trimmed)];
    match prefix.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

/// Length in bytes of the longest prefix of `s` that forms a decimal
/// literal: optional sign, digits with an optional fraction, and an
/// optional exponent that is only consumed when it has digits.
fn numeric_prefix_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return 0;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

/// `numerator / denominator`, or `None` when the denominator is not
/// strictly positive.
pub fn guarded_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator > 0.0 {
        Some(numerator / denominator)
    } else {
        None
    }
}

/// Render `value` with exactly `decimals` decimals.
///
/// Exact halfway cases round away from zero (`0.125` to two decimals
/// becomes `"0.13"`).  Negative zero renders unsigned and non-finite
/// values render as zero.
pub fn format_fixed(value: f64, decimals: u32) -> String {
    let precision = decimals as usize;
    if !value.is_finite() || value == 0.0 {
        return format!("{:.*}", precision, 0.0);
    }
    let magnitude = value.abs();
    // A tie at `decimals` places is only representable as a multiple of
    // 2^-(decimals + 1).
    let grain = 2f64.powi(decimals as i32 + 1);
    let grains = magnitude * grain;
    if grains.fract() == 0.0 && grains < 9_007_199_254_740_992.0 {
        let shift = 10f64.powi(decimals as i32);
        let shifted = magnitude * shift;
        if shifted.fract() == 0.5 {
            let rounded = shifted.floor() + 1.0;
            let sign = if value < 0.0 { "-" } else { "" };
            return format!("{}{:.*}", sign, precision, rounded / shift);
        }
    }
    format!("{:.*}", precision, value)
}

/// Render `value` with exactly two decimals.  See [`format_fixed`].
pub fn format_fixed2(value: f64) -> String {
    format_fixed(value, 2)
}

/// `value` rounded the way [`format_fixed`] renders it.
pub fn round_fixed(value: f64, decimals: u32) -> f64 {
    format_fixed(value, decimals).parse().unwrap_or(0.0)
}

/// Render a two-decimal percentage such as `"12.34%"`.
pub fn format_percent(value: f64) -> String {
    let mut out = format_fixed2(value);
    out.push('%');
    out
}

/// Render a count without forced decimals: `7.0` becomes `"7"`, `3.5`
/// stays `"3.5"`.
pub fn format_whole(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}
