//! Timestamp parsing for `timestamp` fields.
//!
//! Field formats use moment.js-style tokens (`YYYY-MM-DD HH:mm:ss`); `x` and `X` mean epoch
//! milliseconds and epoch seconds respectively. All results are epoch milliseconds in UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tabula_table::Value;

const DEFAULT_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
];
const DEFAULT_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Convert a cell to epoch milliseconds. Returns `None` for nulls and unparsable values.
///
/// Translates `format` on every call; scans over a column should build one [`TimeParser`].
pub fn time_to_unix_milli(value: &Value, format: Option<&str>) -> Option<f64> {
    TimeParser::new(format).parse(value)
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum TimeFormat {
    EpochMillis,
    EpochSeconds,
    Pattern(String),
    Default,
}

/// Cell to epoch milliseconds converter for one field format, translated once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeParser {
    format: TimeFormat,
}

impl TimeParser {
    pub fn new(format: Option<&str>) -> Self {
        let format = match format {
            Some("x") => TimeFormat::EpochMillis,
            Some("X") => TimeFormat::EpochSeconds,
            Some(format) => TimeFormat::Pattern(moment_to_chrono(format)),
            None => TimeFormat::Default,
        };
        Self { format }
    }

    pub fn parse(&self, value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => {
                let n = n.0;
                if !n.is_finite() {
                    return None;
                }
                Some(match self.format {
                    TimeFormat::EpochSeconds => n * 1000.0,
                    _ => n,
                })
            }
            Value::String(s) => {
                let s = s.trim();
                match &self.format {
                    TimeFormat::EpochMillis => s.parse::<f64>().ok().filter(|n| n.is_finite()),
                    TimeFormat::EpochSeconds => s
                        .parse::<f64>()
                        .ok()
                        .filter(|n| n.is_finite())
                        .map(|n| n * 1000.0),
                    TimeFormat::Pattern(pattern) => parse_with_format(s, pattern),
                    TimeFormat::Default => parse_default(s),
                }
            }
            Value::Null | Value::Boolean(_) => None,
        }
    }
}

fn parse_with_format(s: &str, pattern: &str) -> Option<f64> {
    if pattern.contains("%z") || pattern.contains("%:z") {
        return DateTime::parse_from_str(s, pattern)
            .ok()
            .map(|dt| dt.timestamp_millis() as f64);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
        return Some(dt.and_utc().timestamp_millis() as f64);
    }
    NaiveDate::parse_from_str(s, pattern)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis() as f64)
}

fn parse_default(s: &str) -> Option<f64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis() as f64);
    }
    DEFAULT_DATETIME_FORMATS
        .iter()
        .chain(DEFAULT_DATE_FORMATS.iter())
        .find_map(|pattern| parse_with_format(s, pattern))
}

const MOMENT_TOKENS: [(&str, &str); 24] = [
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MMMM", "%B"),
    ("MMM", "%b"),
    ("MM", "%m"),
    ("M", "%m"),
    ("DD", "%d"),
    ("D", "%d"),
    ("dddd", "%A"),
    ("ddd", "%a"),
    ("HH", "%H"),
    ("H", "%H"),
    ("hh", "%I"),
    ("h", "%I"),
    ("mm", "%M"),
    ("m", "%M"),
    ("ss", "%S"),
    ("s", "%S"),
    ("SSS", "%3f"),
    ("A", "%p"),
    ("a", "%p"),
    ("ZZ", "%z"),
    ("Z", "%:z"),
    ("X", "%s"),
];

/// Translate a moment.js format string into a chrono pattern. `[...]` escapes literal text.
pub(crate) fn moment_to_chrono(format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut rest = format;
    'outer: while let Some(c) = rest.chars().next() {
        if c == '[' {
            let literal_end = rest.find(']').unwrap_or(rest.len());
            push_literal(&mut out, &rest[1..literal_end]);
            rest = rest.get(literal_end + 1..).unwrap_or("");
            continue;
        }
        for (token, pattern) in MOMENT_TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                out.push_str(pattern);
                rest = tail;
                continue 'outer;
            }
        }
        push_literal(&mut out, &rest[..c.len_utf8()]);
        rest = &rest[c.len_utf8()..];
    }
    out
}

fn push_literal(out: &mut String, literal: &str) {
    for c in literal.chars() {
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
    }
}
