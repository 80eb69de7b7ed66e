//! Textual unit padding and value rounding.
//!
//! Rounding goes through the standard library's decimal formatting of the
//! exact binary value, so `0.123450001` becomes `0.1235` at 4 places because
//! it lies above the midpoint. Exact binary midpoints (e.g. `0.125`) follow
//! the formatter's tie rule.

/// Width every unit label is padded to.
pub const UNIT_WIDTH: usize = 2;

/// General path: left-pad the label with `'0'` to [`UNIT_WIDTH`] characters.
///
/// Padding is textual, not numeric: `"1"` becomes `"01"`, `"US"` and
/// `"06075"` are unchanged.
pub fn pad_unit(raw: &str) -> String {
    format!("{:0>width$}", raw.trim(), width = UNIT_WIDTH)
}

/// String-level zero-fill for free-form location text.
///
/// A leading `+`/`-` stays in front and zeros are inserted after it; the sign
/// counts toward `width`. For unsigned labels this agrees with [`pad_unit`].
pub fn zero_fill(raw: &str, width: usize) -> String {
    let s = raw.trim();
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let fill = "0".repeat(width - len);
    match s.chars().next() {
        Some(sign @ ('+' | '-')) => format!("{sign}{fill}{}", &s[1..]),
        _ => format!("{fill}{s}"),
    }
}

/// Round `value` to `places` decimal places.
///
/// Non-finite inputs are returned unchanged; callers reject them earlier.
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let text = format!("{:.*}", places as usize, value);
    text.parse::<f64>().unwrap_or(value)
}
