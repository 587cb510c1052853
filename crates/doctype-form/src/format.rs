//! Value formatting shared by the renderer and the schema
//!
//! Numbers are displayed with thousands grouping and parsed back into plain
//! JSON numbers. Picked instants are stored in the string formats the backend
//! accepts; the backend's own storage formats are accepted when validating.

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Number, Value as JsonValue};

static FRACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\d{1,9}$").expect("valid regex"));
static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$").expect("valid regex")
});

/// Why typed text did not become a number
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseNumberError {
    /// Not numeric text
    #[error("not a number")]
    Invalid,
    /// Numeric text outside the storable range
    #[error("number out of range")]
    OutOfRange,
}

/// Display format of a grouped numeric input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NumberFormat {
    /// Maximum digits after the decimal point
    pub decimals: u8,
    /// Minus sign is dropped
    pub positive_only: bool,
}

impl NumberFormat {
    /// Int fields: grouping, no decimals, positive only
    pub const INT: Self = Self {
        decimals: 0,
        positive_only: true,
    };

    /// Float fields: grouping, two decimals, positive only
    pub const FLOAT: Self = Self {
        decimals: 2,
        positive_only: true,
    };

    /// Format a stored value for display
    ///
    /// Digits beyond `decimals` are truncated, trailing zeros are dropped.
    #[must_use]
    pub fn display(self, value: &JsonValue) -> String {
        let raw = match value {
            JsonValue::Number(n) => number_text(n, self.decimals),
            JsonValue::String(s) => s.replace(',', "").trim().to_string(),
            _ => return String::new(),
        };
        let Some((negative, int_part, frac_part)) = split_number(&raw) else {
            return raw;
        };

        let mut out = String::new();
        if negative && !self.positive_only {
            out.push('-');
        }
        out.push_str(&group_thousands(int_part));
        let frac: String = frac_part
            .chars()
            .take(usize::from(self.decimals))
            .collect::<String>()
            .trim_end_matches('0')
            .to_string();
        if !frac.is_empty() {
            out.push('.');
            out.push_str(&frac);
        }
        out
    }

    /// Parse typed text back into a plain JSON number
    ///
    /// Empty input yields an empty string so required checks still fire.
    ///
    /// # Errors
    /// - `ParseNumberError::Invalid` when the text is not a number
    /// - `ParseNumberError::OutOfRange` when a whole number overflows `i64`
    ///   and the format has no decimals to fall back on
    pub fn parse(self, input: &str) -> Result<JsonValue, ParseNumberError> {
        let cleaned: String = input.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
        if cleaned.is_empty() {
            return Ok(JsonValue::String(String::new()));
        }
        let (negative, int_part, frac_part) = split_number(&cleaned).ok_or(ParseNumberError::Invalid)?;
        let negative = negative && !self.positive_only;
        let int_part = if int_part.is_empty() { "0" } else { int_part };
        let frac: String = frac_part.chars().take(usize::from(self.decimals)).collect();

        if frac.trim_end_matches('0').is_empty() {
            // split_number checked the digits, so a failed parse is an overflow
            match int_part.parse::<i64>() {
                Ok(n) => return Ok(JsonValue::from(if negative { -n } else { n })),
                Err(_) if self.decimals == 0 => return Err(ParseNumberError::OutOfRange),
                Err(_) => {}
            }
        }
        let sign = if negative { "-" } else { "" };
        let text = if frac.is_empty() {
            format!("{sign}{int_part}")
        } else {
            format!("{sign}{int_part}.{frac}")
        };
        let f: f64 = text.parse().map_err(|_| ParseNumberError::Invalid)?;
        Number::from_f64(f)
            .map(JsonValue::Number)
            .ok_or(ParseNumberError::OutOfRange)
    }
}

/// Parse a plain (ungrouped, signed) number as typed into Currency, Percent
/// or Duration inputs
///
/// # Errors
/// - `ParseNumberError::Invalid` when the text is not a number
/// - `ParseNumberError::OutOfRange` when it does not fit a finite `f64`
pub fn parse_plain_number(input: &str) -> Result<JsonValue, ParseNumberError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(JsonValue::String(String::new()));
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(JsonValue::from(n));
    }
    let f: f64 = trimmed.parse().map_err(|_| ParseNumberError::Invalid)?;
    if !f.is_finite() {
        return Err(ParseNumberError::OutOfRange);
    }
    Number::from_f64(f)
        .map(JsonValue::Number)
        .ok_or(ParseNumberError::OutOfRange)
}

/// Whether a stored value reads as a number (grouping commas allowed)
#[must_use]
pub fn is_numeric_value(value: &JsonValue) -> bool {
    match value {
        JsonValue::Number(_) => true,
        JsonValue::String(s) => s
            .replace(',', "")
            .trim()
            .parse::<f64>()
            .is_ok_and(f64::is_finite),
        _ => false,
    }
}

fn number_text(n: &Number, decimals: u8) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    let f = n.as_f64().unwrap_or_default();
    let text = f.to_string();
    if text.contains('e') {
        format!("{:.*}", usize::from(decimals), f)
    } else {
        text
    }
}

/// Split `-1234.56` into `(true, "1234", "56")`; `None` if not numeric
fn split_number(raw: &str) -> Option<(bool, &str, &str)> {
    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !digits(int_part) || !digits(frac_part) {
        return None;
    }
    Some((negative, int_part, frac_part))
}

fn group_thousands(digits: &str) -> String {
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return "0".to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Picker precision of a temporal control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateMode {
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// Date and time
    Datetime,
}

/// Store a picked instant in a Date field: `YYYY-MM-DD`, shifted by
/// `day_offset` days
///
/// Returns `None` when the shifted day falls outside the calendar range.
#[must_use]
pub fn format_date(picked: NaiveDateTime, day_offset: i64) -> Option<String> {
    let days = Days::new(day_offset.unsigned_abs());
    let day = if day_offset >= 0 {
        picked.date().checked_add_days(days)
    } else {
        picked.date().checked_sub_days(days)
    }?;
    Some(day.format("%Y-%m-%d").to_string())
}

/// Store a picked instant in a Time field: `HH:MM:SS`
#[must_use]
pub fn format_time(picked: NaiveDateTime) -> String {
    picked.time().format("%H:%M:%S").to_string()
}

/// Store a picked instant in a Datetime field: ISO timestamp with millis
#[must_use]
pub fn format_datetime(picked: NaiveDateTime) -> String {
    Utc.from_utc_datetime(&picked)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts `YYYY-MM-DD`
#[must_use]
pub fn is_valid_date(text: &str) -> bool {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").is_ok()
}

/// Accepts `HH:MM:SS` with optional fractional seconds, or `HH:MM`
#[must_use]
pub fn is_valid_time(text: &str) -> bool {
    let text = FRACTION.replace(text.trim(), "");
    NaiveTime::parse_from_str(&text, "%H:%M:%S").is_ok()
        || NaiveTime::parse_from_str(&text, "%H:%M").is_ok()
}

/// Accepts RFC 3339 timestamps and the backend's `YYYY-MM-DD HH:MM:SS[.ffffff]`
#[must_use]
pub fn is_valid_datetime(text: &str) -> bool {
    let text = text.trim();
    if chrono::DateTime::parse_from_rfc3339(text).is_ok() {
        return true;
    }
    let text = FRACTION.replace(text, "");
    NaiveDateTime::parse_from_str(&text, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S").is_ok()
}

/// Whether text is valid for the given picker mode
#[must_use]
pub fn is_valid_temporal(mode: DateMode, text: &str) -> bool {
    match mode {
        DateMode::Date => is_valid_date(text),
        DateMode::Time => is_valid_time(text),
        DateMode::Datetime => is_valid_datetime(text),
    }
}

/// `#rgb`, `#rrggbb` or `#rrggbbaa`
#[must_use]
pub fn is_hex_color(text: &str) -> bool {
    HEX_COLOR.is_match(text.trim())
}

/// Display text of any scalar value
#[must_use]
pub fn value_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        other => other.to_string(),
    }
}

/// Truthiness of a Check value: `true`, non-zero numbers, `"1"`, `"true"`
#[must_use]
pub fn is_checked(value: &JsonValue) -> bool {
    match value {
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        JsonValue::String(s) => matches!(s.trim(), "1" | "true" | "True"),
        _ => false,
    }
}
