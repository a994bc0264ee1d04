//! Shared cell-level parsing utilities.
//!
//! Header normalization, the `-9` missing-value sentinel, and the lenient
//! numeric/flag/time parsers used by the loader and the reference parsers.

use std::sync::LazyLock;

use regex::Regex;

/// Upstream marker for "value not recorded".
pub const MISSING_SENTINEL: &str = "-9";

/// Standardized crash time.
static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}:\d{2}$").expect("valid regex"));

/// Collapses runs of whitespace (including embedded newlines).
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Normalizes a column header into a stable identifier.
///
/// Strips a UTF-8 byte-order mark, folds newlines and whitespace runs into
/// single spaces, trims, and lowercases. `"Bus  Involvement"` and
/// `"Bus\nInvolvement"` both become `"bus involvement"`.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    let without_bom = raw.trim_start_matches('\u{feff}');
    WHITESPACE_RE
        .replace_all(without_bom, " ")
        .trim()
        .to_lowercase()
}

/// Returns the trimmed cell, or `None` if it is empty or the `-9` sentinel.
#[must_use]
pub fn clean_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || is_sentinel(trimmed) {
        return None;
    }
    Some(trimmed.to_owned())
}

/// Whether a trimmed cell is the missing-value sentinel (`-9`, `-9.0`).
fn is_sentinel(trimmed: &str) -> bool {
    trimmed == MISSING_SENTINEL
        || trimmed
            .parse::<f64>()
            .is_ok_and(|v| (v - -9.0).abs() < f64::EPSILON)
}

/// Parses an integral value, accepting float renderings such as `"2010.0"`.
#[must_use]
pub fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let v = s.parse::<f64>().ok()?;
    #[allow(clippy::cast_possible_truncation)]
    (v.is_finite() && v.fract() == 0.0).then_some(v as i64)
}

/// Parses a year column value.
#[must_use]
pub fn parse_year(s: &str) -> Option<i32> {
    parse_integer(s).and_then(|v| i32::try_from(v).ok())
}

/// Parses a non-negative count column value.
#[must_use]
pub fn parse_count(s: &str) -> Option<u32> {
    parse_integer(s).and_then(|v| u32::try_from(v).ok())
}

/// Parses a vehicle-involvement style flag.
///
/// Accepts `yes/no`, `y/n`, `1/0`, and `true/false` in any case.
#[must_use]
pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "1" | "1.0" | "true" => Some(true),
        "no" | "n" | "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

/// Whether a token looks like a non-negative number: digits with at most
/// one decimal point.
#[must_use]
pub fn looks_numeric(token: &str) -> bool {
    let token = token.trim();
    let without_point = token.replacen('.', "", 1);
    !without_point.is_empty() && without_point.chars().all(|c| c.is_ascii_digit())
}

/// Parses a token accepted by [`looks_numeric`].
#[must_use]
pub fn parse_non_negative(token: &str) -> Option<f64> {
    if !looks_numeric(token) {
        return None;
    }
    token.trim().parse::<f64>().ok()
}

/// Standardizes a crash time to `HH:MM`.
///
/// Colons are removed, the digits are left-padded to four characters, and
/// a colon is inserted after the hour. Anything that still is not `HH:MM`
/// becomes `"00:00"`.
#[must_use]
pub fn standardize_time(raw: &str) -> String {
    let stripped: String = raw.trim().chars().filter(|c| *c != ':').collect();
    let padded = format!("{stripped:0>4}");
    let hours: String = padded.chars().take(2).collect();
    let minutes: String = padded.chars().skip(2).take(2).collect();
    let candidate = format!("{hours}:{minutes}");

    if TIME_RE.is_match(&candidate) {
        candidate
    } else {
        "00:00".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_headers() {
        assert_eq!(normalize_header("  Crash ID "), "crash id");
        assert_eq!(normalize_header("Bus  Involvement"), "bus involvement");
        assert_eq!(normalize_header("National LGA\nName 2021"), "national lga name 2021");
        assert_eq!(normalize_header("\u{feff}Crash ID"), "crash id");
    }

    #[test]
    fn sentinel_and_blank_cells_are_missing() {
        assert_eq!(clean_cell("-9"), None);
        assert_eq!(clean_cell(" -9.0 "), None);
        assert_eq!(clean_cell("   "), None);
        assert_eq!(clean_cell(" 17_to_25 "), Some("17_to_25".to_owned()));
        assert_eq!(clean_cell("-90"), Some("-90".to_owned()));
    }

    #[test]
    fn parses_integers_from_float_renderings() {
        assert_eq!(parse_integer("2010"), Some(2010));
        assert_eq!(parse_integer("2010.0"), Some(2010));
        assert_eq!(parse_integer("2010.5"), None);
        assert_eq!(parse_integer("n/a"), None);
        assert_eq!(parse_year(" 2023 "), Some(2023));
        assert_eq!(parse_count("-1"), None);
    }

    #[test]
    fn parses_flags() {
        assert_eq!(parse_flag("Yes"), Some(true));
        assert_eq!(parse_flag("N"), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("unknown"), None);
    }

    #[test]
    fn numeric_tokens() {
        assert!(looks_numeric("12345"));
        assert!(looks_numeric("12345.5"));
        assert!(!looks_numeric("1.2.3"));
        assert!(!looks_numeric("-5"));
        assert!(!looks_numeric("NSW"));
        assert!(!looks_numeric(""));
        assert_eq!(parse_non_negative(" 4200.0 "), Some(4200.0));
    }

    #[test]
    fn standardizes_times() {
        assert_eq!(standardize_time("14:30:00"), "14:30");
        assert_eq!(standardize_time("930"), "09:30");
        assert_eq!(standardize_time("9:05"), "09:05");
        assert_eq!(standardize_time("23:59"), "23:59");
        assert_eq!(standardize_time("abc"), "00:00");
    }
}
